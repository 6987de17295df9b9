use crate::mod_config;
use crate::noita::{self, PathKind};
use crate::presets::PresetStore;
use crate::registry::ModRegistry;
use crate::settings::ManagerSettings;
use crate::shared_config::{self, SharedConfig};
use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use std::io::Write;
use std::{
    fs,
    path::{Path, PathBuf},
};

const LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// The one context object everything hangs off: settings, the current mod
/// snapshot, the retained game config, and the log buffer. Constructed once
/// in main and handed around by reference.
pub struct App {
    pub settings: ManagerSettings,
    pub registry: ModRegistry,
    shared_config: Option<SharedConfig>,
    pub logs: Vec<LogEntry>,
    settings_path: PathBuf,
    log_path: PathBuf,
}

impl App {
    pub fn initialize() -> Result<Self> {
        let base = BaseDirs::new().context("resolve home dir")?;
        let data_dir = base.data_local_dir().join("wandsmith");
        Self::at_data_dir(&data_dir)
    }

    /// A settings file that exists but does not parse degrades to defaults
    /// with a warning; the broken file stays on disk until the next save.
    pub fn at_data_dir(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir).context("create app data dir")?;
        let mut app = Self {
            settings: ManagerSettings::default(),
            registry: ModRegistry::default(),
            shared_config: None,
            logs: Vec::new(),
            settings_path: data_dir.join("manager.json"),
            log_path: data_dir.join("wandsmith.log"),
        };
        match ManagerSettings::load(&app.settings_path) {
            Ok(settings) => app.settings = settings,
            Err(err) => app.log_warn(format!(
                "could not read {}: {err:#}; starting with defaults",
                app.settings_path.display()
            )),
        }
        Ok(app)
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    pub fn paths_complete(&self) -> bool {
        noita::all_paths_complete(&self.settings.paths)
    }

    /// Reads both game files and replaces the registry snapshot. A missing
    /// order file clears the registry with a warning; a malformed one errors
    /// out before any in-memory state is touched.
    pub fn load_all(&mut self) -> Result<()> {
        self.ensure_paths_complete()?;

        let order_path = noita::mod_config_path(&self.settings.paths);
        match mod_config::read(&order_path)? {
            Some(mut records) => {
                for record in &mut records {
                    record.folder =
                        noita::mod_folder(&self.settings.paths, &record.id, record.workshop_item_id);
                    record.display_name = match noita::manifest_display_name(&record.folder) {
                        Ok(Some(name)) => name,
                        Ok(None) => record.id.clone(),
                        Err(err) => {
                            self.log_warn(format!("{err:#}; using mod id instead"));
                            record.id.clone()
                        }
                    };
                }
                self.registry.load(records);
                self.log_info(format!(
                    "loaded {} mods from {}",
                    self.registry.len(),
                    order_path.display()
                ));
            }
            None => {
                self.registry.clear();
                self.log_warn(format!(
                    "no mod order file at {}; starting with no mods",
                    order_path.display()
                ));
            }
        }

        let config_path = noita::shared_config_path(&self.settings.paths);
        self.shared_config = shared_config::read(&config_path)?;
        if self.shared_config.is_none() {
            self.log_warn(format!(
                "no game config at {}; nothing to write back",
                config_path.display()
            ));
        }
        Ok(())
    }

    /// Writes the order file (atomically) and, if one was read, the retained
    /// game config.
    pub fn save_all(&mut self) -> Result<()> {
        self.ensure_paths_complete()?;

        let order_path = noita::mod_config_path(&self.settings.paths);
        mod_config::write(&order_path, self.registry.sorted_view())?;
        self.log_info(format!(
            "wrote {} mods to {}",
            self.registry.len(),
            order_path.display()
        ));

        if let Some(config) = &self.shared_config {
            let config_path = noita::shared_config_path(&self.settings.paths);
            shared_config::write(&config_path, config)?;
        }
        Ok(())
    }

    fn ensure_paths_complete(&self) -> Result<()> {
        if !self.paths_complete() {
            bail!("game paths are incomplete; set noita_root, noita_save and steam_root first");
        }
        Ok(())
    }

    pub fn presets(&mut self) -> PresetStore<'_> {
        PresetStore::new(&mut self.settings, &self.settings_path)
    }

    /// Snapshots the currently enabled uids under the given preset name.
    pub fn save_preset(&mut self, name: &str) -> Result<()> {
        let enabled = self.registry.enabled_uids();
        self.presets().create_or_update(name, enabled)?;
        self.log_info(format!("saved preset {name:?}"));
        Ok(())
    }

    pub fn apply_preset(&mut self, name: &str) -> Result<()> {
        let uids = self.presets().get(name)?.clone();
        self.registry.apply_preset(&uids);
        self.log_info(format!("applied preset {name:?}"));
        Ok(())
    }

    pub fn delete_preset(&mut self, name: &str) -> Result<bool> {
        let removed = self.presets().delete(name)?;
        if removed {
            self.log_info(format!("deleted preset {name:?}"));
        }
        Ok(removed)
    }

    pub fn set_path(&mut self, kind: PathKind, value: &str) -> Result<()> {
        self.settings.paths.set(kind, value);
        self.settings.save(&self.settings_path)?;
        if !noita::is_path_complete(kind, value) {
            self.log_warn(format!(
                "{} has no {} under {value:?}; path looks incomplete",
                kind.key(),
                kind.marker()
            ));
        }
        Ok(())
    }

    pub fn log_info(&mut self, message: String) {
        self.push_log(LogLevel::Info, message);
    }

    pub fn log_warn(&mut self, message: String) {
        self.push_log(LogLevel::Warn, message);
    }

    pub fn log_error(&mut self, message: String) {
        self.push_log(LogLevel::Error, message);
    }

    fn push_log(&mut self, level: LogLevel, message: String) {
        self.logs.push(LogEntry {
            level,
            message: message.clone(),
        });
        if self.logs.len() > LOG_CAPACITY {
            let overflow = self.logs.len() - LOG_CAPACITY;
            self.logs.drain(0..overflow);
        }
        let _ = append_log_file(&self.log_path, level, &message);
    }
}

pub fn log_level_label(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "INFO",
        LogLevel::Warn => "WARN",
        LogLevel::Error => "ERROR",
    }
}

fn append_log_file(path: &Path, level: LogLevel, message: &str) -> std::io::Result<()> {
    let label = log_level_label(level);
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "[{label}] {message}")
}
