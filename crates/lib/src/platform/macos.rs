//! macOS: `open` for tel:/sms: URLs, AppleScript for volume and appearance,
//! the third-party `brightness` tool for the display.

use super::{sms_body, unsupported, Platform, PlatformCommand, ThemeMode};
use crate::error::ActionError;

pub struct MacOs;

impl Platform for MacOs {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn call(&self, phone: &str) -> Result<Vec<PlatformCommand>, ActionError> {
        Ok(vec![PlatformCommand::new(["open".to_string(), format!("tel:{}", phone)])])
    }

    fn sms(&self, phone: &str, message: &str) -> Result<Vec<PlatformCommand>, ActionError> {
        Ok(vec![PlatformCommand::new([
            "open".to_string(),
            format!("sms:{}&body={}", phone, sms_body(message)),
        ])])
    }

    fn set_volume(&self, level: u8) -> Result<Vec<PlatformCommand>, ActionError> {
        Ok(vec![PlatformCommand::new([
            "osascript".to_string(),
            "-e".to_string(),
            format!("set volume output volume {}", level),
        ])])
    }

    fn set_brightness(&self, level: u8) -> Result<Vec<PlatformCommand>, ActionError> {
        Ok(vec![PlatformCommand::new([
            "brightness".to_string(),
            format!("{:.2}", f64::from(level) / 100.0),
        ])
        .with_hint("install the `brightness` tool (e.g. `brew install brightness`) to control macOS brightness")])
    }

    fn set_theme(&self, mode: ThemeMode) -> Result<Vec<PlatformCommand>, ActionError> {
        let dark = match mode {
            ThemeMode::Dark => true,
            ThemeMode::Light => false,
            ThemeMode::Auto => return Err(unsupported(self.name(), "theme auto")),
        };
        Ok(vec![PlatformCommand::new([
            "osascript".to_string(),
            "-e".to_string(),
            format!(
                "tell application \"System Events\" to tell appearance preferences to set dark mode to {}",
                dark
            ),
        ])])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_uses_output_volume_percent() {
        let cmds = MacOs.set_volume(40).unwrap();
        assert_eq!(cmds[0].argv, vec!["osascript", "-e", "set volume output volume 40"]);
    }

    #[test]
    fn brightness_is_a_fraction() {
        let cmds = MacOs.set_brightness(75).unwrap();
        assert_eq!(cmds[0].argv, vec!["brightness", "0.75"]);
        assert!(cmds[0].install_hint.is_some());
    }

    #[test]
    fn sms_url_uses_ampersand_body() {
        let cmds = MacOs.sms("10086", "hi there").unwrap();
        assert_eq!(cmds[0].argv, vec!["open", "sms:10086&body=hi%20there"]);
    }

    #[test]
    fn dark_theme_toggles_appearance() {
        let cmds = MacOs.set_theme(ThemeMode::Dark).unwrap();
        assert!(cmds[0].argv[2].ends_with("set dark mode to true"));
        assert!(matches!(
            MacOs.set_theme(ThemeMode::Auto),
            Err(ActionError::UnsupportedPlatform(_))
        ));
    }
}
