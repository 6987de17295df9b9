use anyhow::{Context, Result};
use quick_xml::{events::Event, Reader};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const GAME_NAME: &str = "Noita";
const WORKSHOP_APP_ID: &str = "881100";

/// The three root paths everything else is resolved against. All of them are
/// user-supplied and persisted in manager.json; empty means "not set yet".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GamePaths {
    #[serde(default)]
    pub noita_root: String,
    #[serde(default)]
    pub noita_save: String,
    #[serde(default)]
    pub steam_root: String,
}

impl GamePaths {
    pub fn get(&self, kind: PathKind) -> &str {
        match kind {
            PathKind::NoitaRoot => &self.noita_root,
            PathKind::NoitaSave => &self.noita_save,
            PathKind::SteamRoot => &self.steam_root,
        }
    }

    pub fn set(&mut self, kind: PathKind, value: &str) {
        let slot = match kind {
            PathKind::NoitaRoot => &mut self.noita_root,
            PathKind::NoitaSave => &mut self.noita_save,
            PathKind::SteamRoot => &mut self.steam_root,
        };
        *slot = value.to_string();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    NoitaRoot,
    NoitaSave,
    SteamRoot,
}

impl PathKind {
    pub const ALL: [PathKind; 3] = [PathKind::NoitaRoot, PathKind::NoitaSave, PathKind::SteamRoot];

    pub fn key(self) -> &'static str {
        match self {
            PathKind::NoitaRoot => "noita_root",
            PathKind::NoitaSave => "noita_save",
            PathKind::SteamRoot => "steam_root",
        }
    }

    /// Entry that must exist directly under the configured path for it to
    /// count as complete.
    pub fn marker(self) -> &'static str {
        match self {
            PathKind::NoitaRoot => "noita.exe",
            PathKind::NoitaSave => "save00",
            PathKind::SteamRoot => "steamapps",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        PathKind::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

pub fn is_path_complete(kind: PathKind, value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    Path::new(value).join(kind.marker()).exists()
}

/// Gates every read/write of game-owned files.
pub fn all_paths_complete(paths: &GamePaths) -> bool {
    PathKind::ALL
        .into_iter()
        .all(|kind| is_path_complete(kind, paths.get(kind)))
}

pub fn mod_config_path(paths: &GamePaths) -> PathBuf {
    Path::new(&paths.noita_save)
        .join("save00")
        .join("mod_config.xml")
}

pub fn shared_config_path(paths: &GamePaths) -> PathBuf {
    Path::new(&paths.noita_save)
        .join("save_shared")
        .join("config.xml")
}

/// Workshop items live under the Steam content folder, local mods under the
/// game's own mods/ directory.
pub fn mod_folder(paths: &GamePaths, id: &str, workshop_item_id: u64) -> PathBuf {
    if workshop_item_id > 0 {
        Path::new(&paths.steam_root)
            .join("steamapps")
            .join("workshop")
            .join("content")
            .join(WORKSHOP_APP_ID)
            .join(workshop_item_id.to_string())
    } else {
        Path::new(&paths.noita_root).join("mods").join(id)
    }
}

pub fn workshop_url(workshop_item_id: u64) -> Option<String> {
    if workshop_item_id == 0 {
        return None;
    }
    Some(format!(
        "https://steamcommunity.com/sharedfiles/filedetails/?id={workshop_item_id}"
    ))
}

/// Reads the display name a mod declares in its own mod.xml. `Ok(None)` when
/// the manifest or its name attribute is absent; `Err` only on a manifest
/// that exists but does not parse.
pub fn manifest_display_name(folder: &Path) -> Result<Option<String>> {
    let manifest = folder.join("mod.xml");
    if !manifest.exists() {
        return Ok(None);
    }
    let bytes = fs::read(&manifest)
        .with_context(|| format!("read mod manifest {}", manifest.display()))?;

    let mut reader = Reader::from_reader(bytes.as_slice());
    reader.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(crate::mod_config::attr_value(&e, b"name"));
            }
            Ok(Event::Eof) => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("parse mod manifest {}", manifest.display()))
            }
            _ => {}
        }
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_never_complete() {
        assert!(!is_path_complete(PathKind::NoitaRoot, ""));
        assert!(!is_path_complete(PathKind::SteamRoot, ""));
    }

    #[test]
    fn path_completeness_requires_marker() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        assert!(!is_path_complete(PathKind::NoitaRoot, root));

        fs::write(dir.path().join("noita.exe"), b"").unwrap();
        assert!(is_path_complete(PathKind::NoitaRoot, root));
        // Marker tables are per-kind; noita.exe says nothing about Steam.
        assert!(!is_path_complete(PathKind::SteamRoot, root));
    }

    #[test]
    fn all_paths_complete_needs_all_three() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = GamePaths::default();
        for kind in PathKind::ALL {
            let root = dir.path().join(kind.key());
            fs::create_dir_all(root.join(kind.marker())).unwrap();
            paths.set(kind, root.to_str().unwrap());
        }
        assert!(all_paths_complete(&paths));

        paths.set(PathKind::NoitaSave, "");
        assert!(!all_paths_complete(&paths));
    }

    #[test]
    fn workshop_mods_resolve_to_steam_content() {
        let paths = GamePaths {
            noita_root: "/games/noita".to_string(),
            noita_save: String::new(),
            steam_root: "/steam".to_string(),
        };
        assert_eq!(
            mod_folder(&paths, "gun_mod", 513213397),
            PathBuf::from("/steam/steamapps/workshop/content/881100/513213397")
        );
        assert_eq!(
            mod_folder(&paths, "gun_mod", 0),
            PathBuf::from("/games/noita/mods/gun_mod")
        );
    }

    #[test]
    fn workshop_url_only_for_workshop_items() {
        assert_eq!(workshop_url(0), None);
        assert_eq!(
            workshop_url(513213397).as_deref(),
            Some("https://steamcommunity.com/sharedfiles/filedetails/?id=513213397")
        );
    }

    #[test]
    fn manifest_name_resolution() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(manifest_display_name(dir.path()).unwrap(), None);

        fs::write(
            dir.path().join("mod.xml"),
            br#"<Mod name="Gun Tweaks" description="more guns" />"#,
        )
        .unwrap();
        assert_eq!(
            manifest_display_name(dir.path()).unwrap().as_deref(),
            Some("Gun Tweaks")
        );
    }

    #[test]
    fn manifest_without_name_attribute_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mod.xml"), br#"<Mod description="x" />"#).unwrap();
        assert_eq!(manifest_display_name(dir.path()).unwrap(), None);
    }

    #[test]
    fn malformed_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mod.xml"), b"<Mod name=\"broken").unwrap();
        assert!(manifest_display_name(dir.path()).is_err());
    }
}
