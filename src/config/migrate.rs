use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use serde_yaml::Value;
use std::fs;
use std::path::Path;

/// Keys every configuration file is expected to carry, with the YAML value
/// written when a key is missing.
fn expected_keys() -> Vec<(&'static str, Value)> {
    vec![
        (
            "database",
            Value::String(super::Config::database_file().to_string_lossy().to_string()),
        ),
        ("photos_dir", Value::Null),
        ("backups_dir", Value::Null),
        ("exports_dir", Value::Null),
        (
            "backup_interval_days",
            Value::Number(super::default_backup_interval_days().into()),
        ),
        (
            "keep_backups",
            Value::Number((super::default_keep_backups() as u64).into()),
        ),
        ("upload_dir", Value::Null),
        ("remote_folder", Value::String(super::default_remote_folder())),
        ("ocr_command", Value::Null),
    ]
}

fn read_mapping(path: &Path) -> AppResult<Value> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::ConfigLoad(format!("{}: {}", path.display(), e)))?;

    let yaml: Value = serde_yaml::from_str(&content)
        .map_err(|e| AppError::ConfigLoad(format!("{}: {}", path.display(), e)))?;

    if yaml.as_mapping().is_none() {
        return Err(AppError::ConfigLoad(format!(
            "{}: top level is not a mapping",
            path.display()
        )));
    }

    Ok(yaml)
}

/// Return the expected keys absent from the config file at `path`.
pub fn missing_keys(path: &Path) -> AppResult<Vec<&'static str>> {
    let yaml = read_mapping(path)?;
    let Some(map) = yaml.as_mapping() else {
        return Ok(Vec::new());
    };

    Ok(expected_keys()
        .into_iter()
        .map(|(k, _)| k)
        .filter(|k| !map.contains_key(*k))
        .collect())
}

/// Add every missing key with its default value.
///   Returns:
///   Ok(true)  → config updated
///   Ok(false) → no change needed
pub fn migrate_config_file(path: &Path) -> AppResult<bool> {
    let mut yaml = read_mapping(path)?;
    let Some(map) = yaml.as_mapping_mut() else {
        return Ok(false);
    };

    let mut added = Vec::new();
    for (key, default) in expected_keys() {
        if !map.contains_key(key) {
            map.insert(Value::String(key.to_string()), default);
            added.push(key);
        }
    }

    if added.is_empty() {
        info("Configuration is already up to date.");
        return Ok(false);
    }

    let serialized =
        serde_yaml::to_string(&yaml).map_err(|e| AppError::ConfigSave(e.to_string()))?;
    fs::write(path, serialized).map_err(|e| AppError::ConfigSave(e.to_string()))?;

    success(format!("Added missing config keys: {}", added.join(", ")));
    Ok(true)
}
