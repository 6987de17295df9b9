use crate::noita::GamePaths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::{fs, path::Path};

/// The manager-owned document: game paths plus named presets. Top-level keys
/// this version does not know about are carried through a rewrite untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagerSettings {
    #[serde(default)]
    pub paths: GamePaths,
    #[serde(default)]
    pub presets: BTreeMap<String, BTreeSet<String>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ManagerSettings {
    /// A missing file is a first run and loads defaults; a file that exists
    /// but does not parse is an error the caller downgrades to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read manager settings {}", path.display()))?;
        serde_json::from_str(&raw).context("parse manager settings")
    }

    /// Full-document rewrite; called after every paths/presets mutation.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("create manager settings dir")?;
        }
        let raw = serde_json::to_string_pretty(self).context("serialize manager settings")?;
        fs::write(path, raw)
            .with_context(|| format!("write manager settings {}", path.display()))?;
        Ok(())
    }
}
