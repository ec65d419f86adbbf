//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.mobilectl/config.json`) and environment.
//! Every key is optional; a missing file yields the defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::platform::PlatformFamily;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP API settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Where the contact file lives.
    #[serde(default)]
    pub phonebook: PhonebookConfig,

    /// Force a platform family instead of detecting it from the build target.
    #[serde(default)]
    pub platform: Option<PlatformFamily>,
}

/// HTTP API bind, port, and request timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for HTTP (default 5000).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,

    /// When set, a request whose dispatch takes longer than this returns 504. The external
    /// command keeps running.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_server_port() -> u16 {
    5000
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonebookConfig {
    /// Contact file. Relative paths are resolved against the config file's parent.
    /// Default: `phonebook.json` next to the config file.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("MOBILECTL_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".mobilectl").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

fn config_dir(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Resolve the contact file: `phonebook.path` if set (relative to the config file's parent),
/// otherwise `phonebook.json` beside the config file.
pub fn resolve_phonebook_path(config: &Config, config_path: &Path) -> PathBuf {
    match &config.phonebook.path {
        Some(p) if !p.as_os_str().is_empty() => {
            if p.is_absolute() {
                p.clone()
            } else {
                config_dir(config_path).join(p)
            }
        }
        _ => config_dir(config_path).join("phonebook.json"),
    }
}

/// Platform family from config, falling back to the build target.
pub fn resolve_platform(config: &Config) -> Option<PlatformFamily> {
    config.platform.or_else(PlatformFamily::detect)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Apply MOBILECTL_HOST, MOBILECTL_PORT and MOBILECTL_PHONEBOOK on top of the file values.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(host) = non_empty_env("MOBILECTL_HOST") {
        config.server.bind = host;
    }
    if let Some(port) = non_empty_env("MOBILECTL_PORT") {
        match port.parse::<u16>() {
            Ok(p) => config.server.port = p,
            Err(_) => log::warn!("ignoring MOBILECTL_PORT={}: not a valid port", port),
        }
    }
    if let Some(path) = non_empty_env("MOBILECTL_PHONEBOOK") {
        config.phonebook.path = Some(PathBuf::from(path));
    }
}

/// Load config from the given path (or the default). Missing file => default config.
/// Environment overrides are applied. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    apply_env_overrides(&mut config);
    Ok((config, path))
}

/// Held by unit tests that read or change MOBILECTL_* variables; the environment is
/// shared by every test thread.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_port_and_bind() {
        let s = ServerConfig::default();
        assert_eq!(s.port, 5000);
        assert_eq!(s.bind, "127.0.0.1");
        assert_eq!(s.request_timeout_secs, None);
    }

    #[test]
    fn parse_camel_case_keys() {
        let config: Config = serde_json::from_str(
            r#"{ "server": { "port": 8080, "requestTimeoutSecs": 5 }, "platform": "linux" }"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.server.request_timeout_secs, Some(5));
        assert_eq!(config.platform, Some(PlatformFamily::Linux));
    }

    #[test]
    fn resolve_phonebook_path_default() {
        let config = Config::default();
        let path = Path::new("/home/user/.mobilectl/config.json");
        assert_eq!(
            resolve_phonebook_path(&config, path),
            PathBuf::from("/home/user/.mobilectl/phonebook.json")
        );
    }

    #[test]
    fn resolve_phonebook_path_override_relative() {
        let mut config = Config::default();
        config.phonebook.path = Some(PathBuf::from("data/contacts.json"));
        let path = Path::new("/home/user/.mobilectl/config.json");
        assert_eq!(
            resolve_phonebook_path(&config, path),
            PathBuf::from("/home/user/.mobilectl/data/contacts.json")
        );
    }

    #[test]
    fn resolve_phonebook_path_override_absolute() {
        let mut config = Config::default();
        config.phonebook.path = Some(PathBuf::from("/srv/phonebook.json"));
        let path = Path::new("/home/user/.mobilectl/config.json");
        assert_eq!(
            resolve_phonebook_path(&config, path),
            PathBuf::from("/srv/phonebook.json")
        );
    }

    #[test]
    fn bare_config_file_name_resolves_beside_it() {
        let config = Config::default();
        assert_eq!(
            resolve_phonebook_path(&config, Path::new("config.json")),
            PathBuf::from("./phonebook.json")
        );
    }

    #[test]
    fn configured_platform_wins_over_detection() {
        let mut config = Config::default();
        config.platform = Some(PlatformFamily::Windows);
        assert_eq!(resolve_platform(&config), Some(PlatformFamily::Windows));
    }

    #[test]
    fn loopback_binds() {
        assert!(is_loopback_bind("127.0.0.1"));
        assert!(is_loopback_bind(" localhost "));
        assert!(!is_loopback_bind("0.0.0.0"));
    }

    const ENV_KEYS: [&str; 3] = ["MOBILECTL_HOST", "MOBILECTL_PORT", "MOBILECTL_PHONEBOOK"];


    /// Run `f` with the given MOBILECTL_* variables set and the others cleared, then restore.
    fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved: Vec<(&str, Option<String>)> =
            ENV_KEYS.iter().map(|k| (*k, std::env::var(k).ok())).collect();
        for k in ENV_KEYS {
            std::env::remove_var(k);
        }
        for (k, v) in vars {
            std::env::set_var(k, v);
        }
        let out = f();
        for (k, v) in saved {
            match v {
                Some(v) => std::env::set_var(k, v),
                None => std::env::remove_var(k),
            }
        }
        out
    }

    #[test]
    fn env_overrides_host_port_and_phonebook() {
        let config = with_env(
            &[
                ("MOBILECTL_HOST", "0.0.0.0"),
                ("MOBILECTL_PORT", "8081"),
                ("MOBILECTL_PHONEBOOK", "/tmp/contacts.json"),
            ],
            || {
                let mut config = Config::default();
                apply_env_overrides(&mut config);
                config
            },
        );
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 8081);
        assert_eq!(
            config.phonebook.path,
            Some(PathBuf::from("/tmp/contacts.json"))
        );
    }

    #[test]
    fn invalid_env_port_keeps_configured_port() {
        let config = with_env(&[("MOBILECTL_PORT", "abc")], || {
            let mut config = Config::default();
            config.server.port = 6001;
            apply_env_overrides(&mut config);
            config
        });
        assert_eq!(config.server.port, 6001);
        assert_eq!(config.server.bind, "127.0.0.1");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let config = with_env(&[("MOBILECTL_HOST", "  "), ("MOBILECTL_PHONEBOOK", "")], || {
            let mut config = Config::default();
            apply_env_overrides(&mut config);
            config
        });
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.phonebook.path, None);
    }

    fn temp_config_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mobilectl-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn load_config_reads_file_then_env() {
        let dir = temp_config_dir();
        let path = dir.join("config.json");
        std::fs::write(
            &path,
            r#"{ "server": { "port": 7000 }, "phonebook": { "path": "book.json" } }"#,
        )
        .unwrap();

        let (config, used) = with_env(&[], || load_config(Some(path.clone()))).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.server.port, 7000);
        assert_eq!(resolve_phonebook_path(&config, &used), dir.join("book.json"));

        let (config, _) =
            with_env(&[("MOBILECTL_PORT", "7100")], || load_config(Some(path.clone()))).unwrap();
        assert_eq!(config.server.port, 7100);
        assert_eq!(config.phonebook.path, Some(PathBuf::from("book.json")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_config_missing_file_uses_defaults() {
        let dir = temp_config_dir();
        let path = dir.join("absent.json");
        let (config, used) = with_env(&[], || load_config(Some(path.clone()))).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.phonebook.path, None);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_config_rejects_malformed_file() {
        let dir = temp_config_dir();
        let path = dir.join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = with_env(&[], || load_config(Some(path.clone()))).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing config"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
