use crate::domain::{
    config::WorkbenchSettings,
    error::{DualComError, DualComResult},
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CONFIG_DIR: &str = "dualcom";
const PROJECT_DIR: &str = ".dualcom";
const SETTINGS_FILE: &str = "settings.toml";

/// Locates, loads and stores the workbench settings file.
///
/// Lookup order: an explicit path, then `.dualcom/settings.toml` in the
/// current directory or any parent, then the per-user config directory.
pub struct ConfigManager {
    global_config_path: PathBuf,
    project_config_path: Option<PathBuf>,
    explicit_path: Option<PathBuf>,
}

impl ConfigManager {
    pub fn new() -> DualComResult<Self> {
        Ok(Self {
            global_config_path: Self::get_global_config_path()?,
            project_config_path: Self::find_project_config_path(),
            explicit_path: None,
        })
    }

    /// Use exactly this file for both loading and saving
    pub fn with_path(path: impl Into<PathBuf>) -> DualComResult<Self> {
        let mut manager = Self::new()?;
        manager.explicit_path = Some(path.into());
        Ok(manager)
    }

    /// The file `load_settings` reads and `save_settings` writes
    pub fn active_path(&self) -> &Path {
        if let Some(path) = &self.explicit_path {
            return path;
        }
        match &self.project_config_path {
            Some(path) => path,
            None => &self.global_config_path,
        }
    }

    /// Load the settings, falling back to defaults when no file exists yet
    pub fn load_settings(&self) -> DualComResult<WorkbenchSettings> {
        let path = self.active_path();
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(WorkbenchSettings::default());
        }
        self.load_settings_from_path(path)
    }

    pub fn save_settings(&self, settings: &WorkbenchSettings) -> DualComResult<()> {
        let path = self.active_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DualComError::config(format!("Failed to create config directory: {}", e))
            })?;
        }
        self.save_settings_to_path(path, settings)?;
        info!("Settings saved to {}", path.display());
        Ok(())
    }

    fn get_global_config_path() -> DualComResult<PathBuf> {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .ok_or_else(|| DualComError::config("Could not determine config directory"))?;
        Ok(base.join(CONFIG_DIR).join(SETTINGS_FILE))
    }

    fn find_project_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut path = current_dir.as_path();

        loop {
            let config_path = path.join(PROJECT_DIR).join(SETTINGS_FILE);
            if config_path.exists() {
                return Some(config_path);
            }
            path = path.parent()?;
        }
    }

    pub fn load_settings_from_path(&self, path: &Path) -> DualComResult<WorkbenchSettings> {
        let content = fs::read_to_string(path).map_err(|e| {
            DualComError::config(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            DualComError::config(format!(
                "Failed to parse settings file {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn save_settings_to_path(
        &self,
        path: &Path,
        settings: &WorkbenchSettings,
    ) -> DualComResult<()> {
        let content = toml::to_string_pretty(settings).map_err(|e| {
            DualComError::config(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, content).map_err(|e| {
            DualComError::config(format!(
                "Failed to write settings file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Write a default `.dualcom/settings.toml` under `dir`
    pub fn init_project_config(&self, dir: &Path) -> DualComResult<PathBuf> {
        let config_dir = dir.join(PROJECT_DIR);
        let config_file = config_dir.join(SETTINGS_FILE);

        if config_file.exists() {
            return Err(DualComError::config(format!(
                "Project settings already exist at {}",
                config_file.display()
            )));
        }

        fs::create_dir_all(&config_dir).map_err(|e| {
            DualComError::config(format!("Failed to create {} directory: {}", PROJECT_DIR, e))
        })?;

        let mut settings = WorkbenchSettings::default();
        settings.session1.port = default_port_name(0);
        settings.session2.port = default_port_name(1);
        self.save_settings_to_path(&config_file, &settings)?;
        Ok(config_file)
    }
}

#[cfg(windows)]
fn default_port_name(index: usize) -> String {
    format!("COM{}", index + 1)
}

#[cfg(not(windows))]
fn default_port_name(index: usize) -> String {
    format!("/dev/ttyUSB{}", index)
}
