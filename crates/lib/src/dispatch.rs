//! Action dispatcher: the single entry point for both the CLI and the HTTP API.
//!
//! `dispatch(action, params)` validates every required parameter before touching the
//! phonebook or spawning a process, runs the action, and always returns an [`ActionResult`].
//! Errors never escape: each [`ActionError`] becomes a failed result with its kind attached.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::str::FromStr;

use crate::config::{self, Config};
use crate::error::{ActionError, ErrorKind};
use crate::exec::{CommandRunner, SystemRunner};
use crate::phonebook::PhonebookStore;
use crate::platform::{self, Platform, PlatformCommand, ThemeMode};

/// Flat parameter set for one action.
pub type Params = serde_json::Map<String, Value>;

const SMS_PREVIEW_CHARS: usize = 50;

/// Actions the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    PhonebookList,
    PhonebookAdd,
    PhonebookDelete,
    Call,
    Sms,
    Volume,
    Brightness,
    Theme,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::PhonebookList,
        Action::PhonebookAdd,
        Action::PhonebookDelete,
        Action::Call,
        Action::Sms,
        Action::Volume,
        Action::Brightness,
        Action::Theme,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::PhonebookList => "phonebook_list",
            Action::PhonebookAdd => "phonebook_add",
            Action::PhonebookDelete => "phonebook_delete",
            Action::Call => "call",
            Action::Sms => "sms",
            Action::Volume => "volume",
            Action::Brightness => "brightness",
            Action::Theme => "theme",
        }
    }

    /// Parameters that must be present (non-empty) for this action.
    pub fn required_params(self) -> &'static [&'static str] {
        match self {
            Action::PhonebookList => &[],
            Action::PhonebookAdd => &["contact_name", "phone_number"],
            Action::PhonebookDelete => &["contact_name"],
            Action::Call => &["phone_number"],
            Action::Sms => &["phone_number", "sms_message"],
            Action::Volume => &["volume_level"],
            Action::Brightness => &["brightness_level"],
            Action::Theme => &["theme_mode"],
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim())
            .ok_or_else(|| {
                let known: Vec<&str> = Action::ALL.iter().map(|a| a.as_str()).collect();
                ActionError::validation(format!(
                    "unknown action '{}' (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// Uniform outcome of every dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Set only on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            error: None,
        }
    }

    pub fn failed(err: &ActionError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            data: None,
            error: Some(err.kind()),
        }
    }
}

/// Routes actions to the phonebook or to the platform strategy + command runner.
pub struct Dispatcher {
    store: PhonebookStore,
    platform: Box<dyn Platform>,
    runner: Box<dyn CommandRunner>,
}

impl Dispatcher {
    pub fn new(
        store: PhonebookStore,
        platform: Box<dyn Platform>,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            store,
            platform,
            runner,
        }
    }

    /// Dispatcher for the host: configured phonebook path, configured or detected platform,
    /// real processes.
    pub fn from_config(config: &Config, config_path: &Path) -> Self {
        let store = PhonebookStore::new(config::resolve_phonebook_path(config, config_path));
        let platform = platform::resolve(config::resolve_platform(config));
        log::debug!(
            "dispatcher: phonebook {}, platform {}",
            store.path().display(),
            platform.name()
        );
        Self::new(store, platform, Box::new(SystemRunner))
    }

    pub fn store(&self) -> &PhonebookStore {
        &self.store
    }

    pub fn platform_name(&self) -> &'static str {
        self.platform.name()
    }

    /// Run one action. Never panics on bad input and never returns an error.
    pub fn dispatch(&self, action: &str, params: &Params) -> ActionResult {
        let outcome = action
            .parse::<Action>()
            .and_then(|a| self.execute(a, params));
        match outcome {
            Ok(result) => {
                log::info!("action {}: ok", action);
                result
            }
            Err(e) => {
                log::warn!("action {}: {:?}: {}", action, e.kind(), e);
                ActionResult::failed(&e)
            }
        }
    }

    fn execute(&self, action: Action, params: &Params) -> Result<ActionResult, ActionError> {
        if let Some(key) = action
            .required_params()
            .iter()
            .find(|key| !is_present(params.get(**key)))
        {
            return Err(missing(key));
        }
        match action {
            Action::PhonebookList => {
                let contacts = self.store.list()?;
                let message = if contacts.is_empty() {
                    "phonebook is empty".to_string()
                } else {
                    format!("found {} contact(s)", contacts.len())
                };
                Ok(ActionResult::ok(message, Some(to_data(&contacts)?)))
            }
            Action::PhonebookAdd => {
                let name = required_text(params, "contact_name")?;
                let phone = required_text(params, "phone_number")?;
                let alias = optional_text(params, "contact_alias")?.unwrap_or_default();
                let contact = self.store.add(&name, &phone, &alias)?;
                Ok(ActionResult::ok(
                    format!(
                        "added contact '{}'{}: {}",
                        name,
                        alias_suffix(&contact.alias),
                        contact.phone
                    ),
                    Some(named(&name, &contact)?),
                ))
            }
            Action::PhonebookDelete => {
                let name = required_text(params, "contact_name")?;
                let contact = self.store.delete(&name)?;
                Ok(ActionResult::ok(
                    format!(
                        "deleted contact '{}'{}: {}",
                        name,
                        alias_suffix(&contact.alias),
                        contact.phone
                    ),
                    Some(named(&name, &contact)?),
                ))
            }
            Action::Call => {
                let phone = required_text(params, "phone_number")?;
                let commands = self.platform.call(&phone)?;
                self.run_commands(action, &commands)?;
                Ok(ActionResult::ok(format!("calling {}", phone), None))
            }
            Action::Sms => {
                let phone = required_text(params, "phone_number")?;
                let message = required_text(params, "sms_message")?;
                let commands = self.platform.sms(&phone, &message)?;
                self.run_commands(action, &commands)?;
                Ok(ActionResult::ok(
                    format!("sending SMS to {}: {}", phone, preview(&message)),
                    None,
                ))
            }
            Action::Volume => {
                let level = required_level(params, "volume_level")?;
                let commands = self.platform.set_volume(level)?;
                self.run_commands(action, &commands)?;
                Ok(ActionResult::ok(
                    format!("volume set to {}%", level),
                    Some(json!({ "level": level })),
                ))
            }
            Action::Brightness => {
                let level = required_level(params, "brightness_level")?;
                let commands = self.platform.set_brightness(level)?;
                self.run_commands(action, &commands)?;
                Ok(ActionResult::ok(
                    format!("brightness set to {}%", level),
                    Some(json!({ "level": level })),
                ))
            }
            Action::Theme => {
                let raw = required_text(params, "theme_mode")?;
                let mode = raw.parse::<ThemeMode>().map_err(|_| {
                    ActionError::validation(format!(
                        "invalid theme mode '{}' (expected one of: {})",
                        raw,
                        ThemeMode::VALUES.join(", ")
                    ))
                })?;
                let commands = self.platform.set_theme(mode)?;
                self.run_commands(action, &commands)?;
                Ok(ActionResult::ok(
                    format!("theme set to {}", mode.as_str()),
                    Some(json!({ "mode": mode.as_str() })),
                ))
            }
        }
    }

    /// Run commands in order; the first failure stops the sequence.
    fn run_commands(&self, action: Action, commands: &[PlatformCommand]) -> Result<(), ActionError> {
        for cmd in commands {
            log::debug!("{} on {}: running {:?}", action, self.platform.name(), cmd.argv);
            let program = cmd.argv.first().map(String::as_str).unwrap_or("");
            let output = self.runner.run(&cmd.argv).map_err(|e| {
                let mut msg = format!("failed to launch {}: {}", program, e);
                if e.kind() == std::io::ErrorKind::NotFound {
                    if let Some(hint) = cmd.install_hint {
                        msg.push_str(&format!(" ({})", hint));
                    }
                }
                ActionError::Execution(msg)
            })?;
            if !output.success() {
                let status = match output.exit_code {
                    Some(code) => format!("exit code {}", code),
                    None => "termination by signal".to_string(),
                };
                let diagnostics = output.diagnostics();
                let mut msg = format!("{} failed with {}", program, status);
                if !diagnostics.is_empty() {
                    msg.push_str(": ");
                    msg.push_str(&diagnostics);
                }
                return Err(ActionError::Execution(msg));
            }
        }
        Ok(())
    }
}

fn to_data<T: Serialize>(value: &T) -> Result<Value, ActionError> {
    serde_json::to_value(value).map_err(|e| ActionError::Storage(format!("encoding result: {}", e)))
}

/// `{ name: record }` payload for add/delete results.
fn named<T: Serialize>(name: &str, record: &T) -> Result<Value, ActionError> {
    let mut data = Params::new();
    data.insert(name.to_string(), to_data(record)?);
    Ok(Value::Object(data))
}

fn alias_suffix(alias: &str) -> String {
    if alias.is_empty() {
        String::new()
    } else {
        format!(" (alias: {})", alias)
    }
}

/// First 50 characters, with `...` when the message was longer.
fn preview(message: &str) -> String {
    let mut chars = message.chars();
    let head: String = chars.by_ref().take(SMS_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Text parameter; numbers and booleans are rendered as text. Null or blank => absent.
fn optional_text(params: &Params, key: &str) -> Result<Option<String>, ActionError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(ActionError::validation(format!(
            "parameter '{}' must be a string",
            key
        ))),
    }
}

fn required_text(params: &Params, key: &str) -> Result<String, ActionError> {
    optional_text(params, key)?.ok_or_else(|| missing(key))
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

fn missing(key: &str) -> ActionError {
    ActionError::validation(format!("missing required parameter '{}'", key))
}

/// Clamp any integer level into 0..=100.
pub fn clamp_level(level: i64) -> u8 {
    level.clamp(0, 100) as u8
}

/// Numeric level from an integer, a float (truncated) or a numeric string, clamped to 0..=100.
fn required_level(params: &Params, key: &str) -> Result<u8, ActionError> {
    let invalid = || {
        ActionError::validation(format!("parameter '{}' must be an integer from 0 to 100", key))
    };
    let level = match params.get(key) {
        None | Some(Value::Null) => return Err(missing(key)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => i,
            None => float_level(n.as_f64()).ok_or_else(invalid)?,
        },
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(missing(key));
            }
            match s.parse::<i64>() {
                Ok(i) => i,
                Err(_) => float_level(s.parse::<f64>().ok()).ok_or_else(invalid)?,
            }
        }
        Some(_) => return Err(invalid()),
    };
    let clamped = clamp_level(level);
    if i64::from(clamped) != level {
        log::info!("{}: clamped {} to {}", key, level, clamped);
    }
    Ok(clamped)
}

fn float_level(f: Option<f64>) -> Option<i64> {
    f.filter(|f| f.is_finite()).map(|f| f.trunc() as i64)
}

/// Parse `key=value` command-line arguments. Values stay strings; the dispatcher coerces them.
pub fn parse_cli_params<S: AsRef<str>>(args: &[S]) -> Result<Params, ActionError> {
    let mut params = Params::new();
    for arg in args {
        let arg = arg.as_ref();
        let (key, value) = arg.split_once('=').ok_or_else(|| {
            ActionError::validation(format!("expected key=value argument, got '{}'", arg))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ActionError::validation(format!(
                "empty parameter name in '{}'",
                arg
            )));
        }
        params.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(params)
}
