//! Initialize the configuration directory: create it, a default config, and an empty phonebook.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config;
use crate::phonebook::PhonebookStore;

/// Create the config directory and default files if they do not exist.
/// - Creates the config directory (parent of config file path).
/// - Writes the config file with `{}` if missing.
/// - Writes the phonebook (resolved from the config) with `{}` if missing.
///
/// Returns the config directory.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        std::fs::write(config_path, b"{}")
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    }

    let (config, _) = config::load_config(Some(config_path.to_path_buf()))?;
    let store = PhonebookStore::new(config::resolve_phonebook_path(&config, config_path));
    let created = store
        .ensure_exists()
        .with_context(|| format!("creating phonebook {}", store.path().display()))?;
    if created {
        log::info!("created empty phonebook at {}", store.path().display());
    } else {
        log::debug!("phonebook already exists at {}, skipping", store.path().display());
    }

    Ok(config_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_config_and_phonebook_and_is_idempotent() {
        let _env = config::ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = std::env::temp_dir().join(format!("mobilectl-init-{}", uuid::Uuid::new_v4()));
        let config_path = dir.join("nested").join("config.json");
        let out = init_config_dir(&config_path).unwrap();
        assert_eq!(out, dir.join("nested"));
        assert_eq!(std::fs::read_to_string(&config_path).unwrap(), "{}");
        let phonebook = dir.join("nested").join("phonebook.json");
        assert!(phonebook.exists());

        std::fs::write(&phonebook, r#"{"a":"1"}"#).unwrap();
        init_config_dir(&config_path).unwrap();
        assert_eq!(std::fs::read_to_string(&phonebook).unwrap(), r#"{"a":"1"}"#);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
