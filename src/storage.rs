//! Saved-configuration management
//!
//! Configurations are standalone JSON files containing a [`Document`].
//! They live in the application's data directory under `configurations/`.
//! Saves are atomic: the document is written to a temporary file in the
//! same directory and renamed over the target.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::error::StorageError;
use crate::core::model::Document;
use crate::utils::get_data_dir;

/// The canonical name of the initial configuration. Protected from
/// deletion and renaming so there is always something to load.
pub const DEFAULT_CONFIG_NAME: &str = "default";

/// Validates a configuration name for filesystem safety.
///
/// Alphanumeric, underscores, and hyphens only, max 64 chars; rejects
/// `.` and `..` to block path traversal.
pub fn validate_config_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() {
        return Err(StorageError::InvalidName("Name cannot be empty".into()));
    }

    if name.len() > 64 {
        return Err(StorageError::InvalidName(
            "Name too long (max 64 chars)".into(),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StorageError::InvalidName(
            "Name contains invalid characters (use only a-z, 0-9, _, -)".into(),
        ));
    }

    if name == "." || name == ".." {
        return Err(StorageError::InvalidName("Invalid name".into()));
    }

    Ok(())
}

/// Directory where configurations are stored, created on first use.
pub fn get_configs_dir() -> Result<PathBuf, StorageError> {
    let mut path = get_data_dir().ok_or(StorageError::DataDirUnavailable)?;
    path.push("configurations");
    if !path.exists() {
        fs::create_dir_all(&path)?;
    }
    Ok(path)
}

/// Path of a named configuration file, name validated first.
pub fn get_config_path(name: &str) -> Result<PathBuf, StorageError> {
    validate_config_name(name)?;
    let mut path = get_configs_dir()?;
    path.push(format!("{name}.json"));
    Ok(path)
}

/// Lists all saved configuration names, sorted.
pub fn list_configs() -> Result<Vec<String>, StorageError> {
    list_configs_in(&get_configs_dir()?)
}

/// Lists configuration names found in `dir`, sorted.
pub fn list_configs_in(dir: &Path) -> Result<Vec<String>, StorageError> {
    let mut configs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file()
            && path.extension().and_then(|s| s.to_str()) == Some("json")
            && let Some(name) = path.file_stem().and_then(|s| s.to_str())
        {
            configs.push(name.to_string());
        }
    }
    configs.sort();
    Ok(configs)
}

/// Loads a configuration by name.
pub fn load_config(name: &str) -> Result<Document, StorageError> {
    let path = get_config_path(name)?;
    if !path.exists() {
        return Err(StorageError::NotFound(name.to_string()));
    }
    load_document(&path)
}

/// Reads a document straight from `path`, for ad-hoc file checking.
pub fn load_document(path: &Path) -> Result<Document, StorageError> {
    let json = fs::read_to_string(path)?;
    let doc: Document = serde_json::from_str(&json)?;
    Ok(doc)
}

/// Saves a configuration atomically via temp file + rename.
pub fn save_config(name: &str, doc: &Document) -> Result<(), StorageError> {
    let path = get_config_path(name)?;
    save_document(&path, doc)?;
    info!(name, "configuration saved");
    Ok(())
}

/// Writes `doc` to `path` atomically.
///
/// The temp file is created in the target directory so the final rename
/// never crosses filesystems; on unix it is created with mode 0600.
pub fn save_document(path: &Path, doc: &Document) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(doc)?;
    let dir = path.parent().ok_or(StorageError::DataDirUnavailable)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(json.as_bytes())?;
    temp.flush()?;
    temp.persist(path).map_err(|e| StorageError::Io(e.error))?;
    Ok(())
}

/// Deletes a configuration. The default configuration cannot be deleted.
pub fn delete_config(name: &str) -> Result<(), StorageError> {
    if name == DEFAULT_CONFIG_NAME {
        return Err(StorageError::InvalidName(
            "Cannot delete default configuration".into(),
        ));
    }

    let path = get_config_path(name)?;
    if path.exists() {
        fs::remove_file(path)?;
        info!(name, "configuration deleted");
    } else {
        warn!(name, "configuration already absent");
    }
    Ok(())
}

/// Renames a configuration; the default configuration keeps its name.
pub fn rename_config(old_name: &str, new_name: &str) -> Result<(), StorageError> {
    validate_config_name(new_name)?;

    if old_name == DEFAULT_CONFIG_NAME {
        return Err(StorageError::InvalidName(
            "Cannot rename default configuration".into(),
        ));
    }

    let old_path = get_config_path(old_name)?;
    let new_path = get_config_path(new_name)?;

    if !old_path.exists() {
        return Err(StorageError::NotFound(old_name.to_string()));
    }
    if new_path.exists() {
        return Err(StorageError::InvalidName(
            "Configuration with new name already exists".into(),
        ));
    }

    fs::rename(old_path, new_path)?;
    Ok(())
}
