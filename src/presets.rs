use crate::settings::ManagerSettings;
use anyhow::Result;
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetError {
    #[error("no preset named {0:?}")]
    NotFound(String),
}

/// Borrowing view over the preset table in [`ManagerSettings`]. Presets are
/// unordered uid sets; whether a uid is still installed is decided at apply
/// time, not here. Every mutation rewrites the settings file.
pub struct PresetStore<'a> {
    settings: &'a mut ManagerSettings,
    settings_path: &'a Path,
}

impl<'a> PresetStore<'a> {
    pub fn new(settings: &'a mut ManagerSettings, settings_path: &'a Path) -> Self {
        Self {
            settings,
            settings_path,
        }
    }

    pub fn list(&self) -> Vec<&str> {
        self.settings.presets.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Result<&BTreeSet<String>, PresetError> {
        self.settings
            .presets
            .get(name)
            .ok_or_else(|| PresetError::NotFound(name.to_string()))
    }

    /// Unconditional overwrite. Asking the user before clobbering an existing
    /// preset is the display layer's job.
    pub fn create_or_update(&mut self, name: &str, uids: BTreeSet<String>) -> Result<()> {
        self.settings.presets.insert(name.to_string(), uids);
        self.settings.save(self.settings_path)
    }

    /// Returns whether anything was removed; deleting a missing preset is a
    /// no-op, not an error.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        if self.settings.presets.remove(name).is_none() {
            return Ok(false);
        }
        self.settings.save(self.settings_path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uids(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn list_is_stable_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manager.json");
        let mut settings = ManagerSettings::default();
        let mut store = PresetStore::new(&mut settings, &path);

        store.create_or_update("zoo", uids(&["a"])).unwrap();
        store.create_or_update("base", uids(&["b"])).unwrap();
        assert_eq!(store.list(), ["base", "zoo"]);
    }

    #[test]
    fn get_unknown_preset_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manager.json");
        let mut settings = ManagerSettings::default();
        let store = PresetStore::new(&mut settings, &path);

        assert_eq!(
            store.get("ghost").unwrap_err(),
            PresetError::NotFound("ghost".to_string())
        );
    }

    #[test]
    fn create_or_update_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manager.json");
        let mut settings = ManagerSettings::default();
        let mut store = PresetStore::new(&mut settings, &path);

        store.create_or_update("run", uids(&["a", "b"])).unwrap();
        store.create_or_update("run", uids(&["c"])).unwrap();
        assert_eq!(store.get("run").unwrap(), &uids(&["c"]));
    }

    #[test]
    fn delete_missing_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manager.json");
        let mut settings = ManagerSettings::default();
        let mut store = PresetStore::new(&mut settings, &path);

        assert!(!store.delete("ghost").unwrap());
        store.create_or_update("real", uids(&["a"])).unwrap();
        assert!(store.delete("real").unwrap());
        assert!(store.list().is_empty());
    }

    #[test]
    fn every_mutation_persists_the_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manager.json");
        let mut settings = ManagerSettings::default();
        let mut store = PresetStore::new(&mut settings, &path);

        store.create_or_update("run", uids(&["a"])).unwrap();
        let on_disk = ManagerSettings::load(&path).unwrap();
        assert!(on_disk.presets.contains_key("run"));

        store.delete("run").unwrap();
        let on_disk = ManagerSettings::load(&path).unwrap();
        assert!(on_disk.presets.is_empty());
    }
}
