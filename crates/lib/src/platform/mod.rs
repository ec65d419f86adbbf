//! Platform strategies: map communication and system-control actions to OS-specific
//! command lines. One strategy per supported OS family; any action a strategy does not
//! map fails with [`ActionError::UnsupportedPlatform`].

mod linux;
mod macos;
mod windows;

pub use linux::Linux;
pub use macos::MacOs;
pub use windows::Windows;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ActionError;

/// Supported OS families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    Macos,
    Windows,
    Linux,
}

impl PlatformFamily {
    /// Family of the OS this binary was built for, if supported.
    pub fn detect() -> Option<Self> {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Option<Self> {
        match os {
            "macos" => Some(Self::Macos),
            "windows" => Some(Self::Windows),
            "linux" => Some(Self::Linux),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Macos => "macos",
            Self::Windows => "windows",
            Self::Linux => "linux",
        }
    }

    pub fn strategy(self) -> Box<dyn Platform> {
        match self {
            Self::Macos => Box::new(MacOs),
            Self::Windows => Box::new(Windows),
            Self::Linux => Box::new(Linux),
        }
    }
}

impl FromStr for PlatformFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "macos" | "darwin" | "mac" => Ok(Self::Macos),
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// Strategy for the given family, or one that maps nothing when the OS is unsupported.
pub fn resolve(family: Option<PlatformFamily>) -> Box<dyn Platform> {
    match family {
        Some(f) => f.strategy(),
        None => Box::new(Unmapped(std::env::consts::OS)),
    }
}

/// Theme modes accepted by the `theme` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    Auto,
}

impl ThemeMode {
    pub const VALUES: [&'static str; 3] = ["light", "dark", "auto"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Auto => "auto",
        }
    }
}

impl FromStr for ThemeMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "auto" => Ok(Self::Auto),
            _ => Err(()),
        }
    }
}

/// One external command line, plus what to install when its binary is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCommand {
    pub argv: Vec<String>,
    pub install_hint: Option<&'static str>,
}

impl PlatformCommand {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            install_hint: None,
        }
    }

    pub fn with_hint(mut self, hint: &'static str) -> Self {
        self.install_hint = Some(hint);
        self
    }
}

/// Builds the command lines for each device action. Levels are already clamped to 0..=100.
/// An action may need several commands; they run in order.
pub trait Platform: Send + Sync {
    fn name(&self) -> &'static str;

    fn call(&self, _phone: &str) -> Result<Vec<PlatformCommand>, ActionError> {
        Err(unsupported(self.name(), "call"))
    }

    fn sms(&self, _phone: &str, _message: &str) -> Result<Vec<PlatformCommand>, ActionError> {
        Err(unsupported(self.name(), "sms"))
    }

    fn set_volume(&self, _level: u8) -> Result<Vec<PlatformCommand>, ActionError> {
        Err(unsupported(self.name(), "volume"))
    }

    fn set_brightness(&self, _level: u8) -> Result<Vec<PlatformCommand>, ActionError> {
        Err(unsupported(self.name(), "brightness"))
    }

    fn set_theme(&self, _mode: ThemeMode) -> Result<Vec<PlatformCommand>, ActionError> {
        Err(unsupported(self.name(), "theme"))
    }
}

/// Characters escaped in the `body=` value of an `sms:` URL.
const SMS_BODY: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'`');

/// Percent-encode a message for an `sms:` URL. Non-ASCII text is encoded as UTF-8.
pub(crate) fn sms_body(message: &str) -> String {
    utf8_percent_encode(message, SMS_BODY).to_string()
}

pub(crate) fn unsupported(platform: &str, action: &str) -> ActionError {
    ActionError::UnsupportedPlatform(format!(
        "action '{}' is not supported on platform '{}'",
        action, platform
    ))
}

/// Strategy for an OS outside the supported families: every action is unsupported.
struct Unmapped(&'static str);

impl Platform for Unmapped {
    fn name(&self) -> &'static str {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sms_body_escapes_url_delimiters() {
        assert_eq!(sms_body("a&b #c"), "a%26b%20%23c");
        assert_eq!(sms_body("50%? x=1"), "50%25%3F%20x%3D1");
        assert_eq!(sms_body("你好"), "%E4%BD%A0%E5%A5%BD");
        assert_eq!(sms_body("plain"), "plain");
    }

    #[test]
    fn from_os_maps_three_families() {
        assert_eq!(PlatformFamily::from_os("macos"), Some(PlatformFamily::Macos));
        assert_eq!(PlatformFamily::from_os("windows"), Some(PlatformFamily::Windows));
        assert_eq!(PlatformFamily::from_os("linux"), Some(PlatformFamily::Linux));
        assert_eq!(PlatformFamily::from_os("freebsd"), None);
    }

    #[test]
    fn parse_accepts_darwin_alias() {
        assert_eq!("Darwin".parse::<PlatformFamily>(), Ok(PlatformFamily::Macos));
        assert!("beos".parse::<PlatformFamily>().is_err());
    }

    #[test]
    fn unmapped_platform_rejects_everything() {
        let p = Unmapped("plan9");
        assert!(matches!(p.call("1"), Err(ActionError::UnsupportedPlatform(_))));
        assert!(matches!(p.set_volume(10), Err(ActionError::UnsupportedPlatform(_))));
        assert!(matches!(
            p.set_theme(ThemeMode::Dark),
            Err(ActionError::UnsupportedPlatform(_))
        ));
    }

    #[test]
    fn theme_mode_parse_is_exact() {
        assert_eq!("dark".parse::<ThemeMode>(), Ok(ThemeMode::Dark));
        assert!("Dark".parse::<ThemeMode>().is_err());
        assert!("sepia".parse::<ThemeMode>().is_err());
    }
}
