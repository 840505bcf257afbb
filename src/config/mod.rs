use crate::errors::{AppError, AppResult};
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod migrate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default)]
    pub photos_dir: Option<String>,
    #[serde(default)]
    pub backups_dir: Option<String>,
    #[serde(default)]
    pub exports_dir: Option<String>,
    #[serde(default = "default_backup_interval_days")]
    pub backup_interval_days: i64,
    #[serde(default = "default_keep_backups")]
    pub keep_backups: usize,
    #[serde(default)]
    pub upload_dir: Option<String>,
    #[serde(default = "default_remote_folder")]
    pub remote_folder: String,
    #[serde(default)]
    pub ocr_command: Option<String>,
}

pub(crate) fn default_backup_interval_days() -> i64 {
    14
}
pub(crate) fn default_keep_backups() -> usize {
    10
}
pub(crate) fn default_remote_folder() -> String {
    "CPD Points".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::with_database(Self::database_file())
    }
}

impl Config {
    /// Build a default configuration bound to a specific database file.
    pub fn with_database<P: AsRef<Path>>(db: P) -> Self {
        Self {
            database: db.as_ref().to_string_lossy().to_string(),
            photos_dir: None,
            backups_dir: None,
            exports_dir: None,
            backup_interval_days: default_backup_interval_days(),
            keep_backups: default_keep_backups(),
            upload_dir: None,
            remote_folder: default_remote_folder(),
            ocr_command: None,
        }
    }

    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("cpdtracker")
        } else {
            let home = env::var("HOME")
                .map(PathBuf::from)
                .ok()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."));
            home.join(".cpdtracker")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("cpdtracker.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("cpdtracker.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        if path.exists() {
            let content =
                fs::read_to_string(&path).map_err(|e| AppError::ConfigLoad(e.to_string()))?;
            serde_yaml::from_str(&content).map_err(|e| AppError::ConfigLoad(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Write this configuration to the standard config file.
    pub fn save(&self) -> AppResult<()> {
        fs::create_dir_all(Self::config_dir())?;
        let yaml = serde_yaml::to_string(self).map_err(|e| AppError::ConfigSave(e.to_string()))?;
        let mut file = fs::File::create(Self::config_file())?;
        file.write_all(yaml.as_bytes())?;
        Ok(())
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_db: Option<String>, is_test: bool) -> AppResult<Self> {
        let dir = Self::config_dir();
        if !is_test {
            fs::create_dir_all(&dir)?;
        }

        // DB name: user provided or default
        let db_path = match custom_db {
            Some(name) => {
                let p = expand_tilde(&name);
                if p.is_absolute() { p } else { dir.join(p) }
            }
            None => Self::database_file(),
        };

        let config = Self::with_database(&db_path);

        if !is_test {
            config.save()?;
        }

        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        expand_tilde(&self.database)
    }

    /// Directory holding the database file; every derived folder lives here.
    fn data_dir(&self) -> PathBuf {
        self.database_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn resolve_dir(&self, configured: &Option<String>, fallback: &str) -> PathBuf {
        match configured {
            Some(p) if !p.trim().is_empty() => expand_tilde(p),
            _ => self.data_dir().join(fallback),
        }
    }

    pub fn photos_path(&self) -> PathBuf {
        self.resolve_dir(&self.photos_dir, "photos")
    }

    pub fn backups_path(&self) -> PathBuf {
        self.resolve_dir(&self.backups_dir, "backups")
    }

    pub fn exports_path(&self) -> PathBuf {
        self.resolve_dir(&self.exports_dir, "exports")
    }

    pub fn upload_path(&self) -> Option<PathBuf> {
        self.upload_dir
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(expand_tilde)
    }
}
