//! Contact store: a name -> {phone, alias} mapping persisted as a single JSON file.
//!
//! The file is read in full on every operation and rewritten in full on every mutation.
//! Older files store a bare phone string per name; those values are read as
//! `{ "phone": <string>, "alias": "" }` and stay in their original form on disk until
//! that key is written again. No locking: concurrent writers are last-writer-wins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ActionError;

/// One stored contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub phone: String,
    #[serde(default)]
    pub alias: String,
}

/// Full phonebook as returned by [`PhonebookStore::list`], ordered by name.
pub type Contacts = BTreeMap<String, Contact>;

/// Owns the phonebook file at one path.
#[derive(Debug, Clone)]
pub struct PhonebookStore {
    path: PathBuf,
}

impl PhonebookStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All contacts, with legacy entries upgraded in memory. Missing file => empty.
    pub fn list(&self) -> Result<Contacts, ActionError> {
        let raw = self.read_raw()?;
        raw.iter()
            .map(|(name, value)| Ok((name.clone(), normalize(name, value)?)))
            .collect()
    }

    /// Insert or overwrite `name`. Other entries keep their stored form.
    pub fn add(&self, name: &str, phone: &str, alias: &str) -> Result<Contact, ActionError> {
        if name.trim().is_empty() {
            return Err(ActionError::validation("contact name must not be empty"));
        }
        if phone.trim().is_empty() {
            return Err(ActionError::validation("phone number must not be empty"));
        }
        let mut raw = self.read_raw()?;
        let contact = Contact {
            phone: phone.to_string(),
            alias: alias.to_string(),
        };
        let value = serde_json::to_value(&contact)
            .map_err(|e| ActionError::Storage(format!("encoding contact '{}': {}", name, e)))?;
        raw.insert(name.to_string(), value);
        self.write_raw(&raw)?;
        log::debug!("phonebook: stored '{}' in {}", name, self.path.display());
        Ok(contact)
    }

    /// Remove `name` and return the removed record.
    pub fn delete(&self, name: &str) -> Result<Contact, ActionError> {
        if name.trim().is_empty() {
            return Err(ActionError::validation("contact name must not be empty"));
        }
        let mut raw = self.read_raw()?;
        let removed = match raw.get(name) {
            Some(value) => normalize(name, value)?,
            None => {
                return Err(ActionError::NotFound(format!(
                    "contact '{}' does not exist",
                    name
                )))
            }
        };
        raw.shift_remove(name);
        self.write_raw(&raw)?;
        log::debug!("phonebook: removed '{}' from {}", name, self.path.display());
        Ok(removed)
    }

    /// Create the file with an empty mapping if it does not exist yet.
    pub fn ensure_exists(&self) -> Result<bool, ActionError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.write_raw(&Map::new())?;
        Ok(true)
    }

    fn read_raw(&self) -> Result<Map<String, Value>, ActionError> {
        let s = match std::fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(ActionError::Storage(format!(
                    "reading phonebook {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        if s.trim().is_empty() {
            return Ok(Map::new());
        }
        let value: Value = serde_json::from_str(&s).map_err(|e| {
            ActionError::Storage(format!(
                "parsing phonebook {}: {}",
                self.path.display(),
                e
            ))
        })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(ActionError::Storage(format!(
                "phonebook {} must contain a JSON object",
                self.path.display()
            ))),
        }
    }

    /// Whole-file replacement: write a sibling temp file, then rename over the target.
    fn write_raw(&self, raw: &Map<String, Value>) -> Result<(), ActionError> {
        let storage_err = |what: &str, e: std::io::Error| {
            ActionError::Storage(format!("{} {}: {}", what, self.path.display(), e))
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| storage_err("creating directory for", e))?;
        }
        let json = serde_json::to_string_pretty(raw)
            .map_err(|e| ActionError::Storage(format!("encoding phonebook: {}", e)))?;
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "phonebook.json".to_string());
        let tmp = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));
        std::fs::write(&tmp, json).map_err(|e| storage_err("writing", e))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(storage_err("replacing", e));
        }
        Ok(())
    }
}

/// Read one stored value as a contact. Bare strings are the legacy phone-only form.
fn normalize(name: &str, value: &Value) -> Result<Contact, ActionError> {
    match value {
        Value::String(phone) => Ok(Contact {
            phone: phone.clone(),
            alias: String::new(),
        }),
        Value::Object(obj) => {
            let phone = obj.get("phone").and_then(|v| v.as_str()).ok_or_else(|| {
                ActionError::Storage(format!("contact '{}' has no phone number", name))
            })?;
            let alias = obj.get("alias").and_then(|v| v.as_str()).unwrap_or("");
            Ok(Contact {
                phone: phone.to_string(),
                alias: alias.to_string(),
            })
        }
        _ => Err(ActionError::Storage(format!(
            "contact '{}' has an unrecognized record format",
            name
        ))),
    }
}
