//! Linux: `xdg-open` for tel:/sms: URLs, ALSA `amixer`, `brightnessctl`, and GNOME `gsettings`.

use super::{sms_body, unsupported, Platform, PlatformCommand, ThemeMode};
use crate::error::ActionError;

pub struct Linux;

impl Platform for Linux {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn call(&self, phone: &str) -> Result<Vec<PlatformCommand>, ActionError> {
        Ok(vec![PlatformCommand::new(["xdg-open".to_string(), format!("tel:{}", phone)])
            .with_hint("install xdg-utils to open tel: links")])
    }

    fn sms(&self, phone: &str, message: &str) -> Result<Vec<PlatformCommand>, ActionError> {
        Ok(vec![PlatformCommand::new([
            "xdg-open".to_string(),
            format!("sms:{}?body={}", phone, sms_body(message)),
        ])
        .with_hint("install xdg-utils to open sms: links")])
    }

    fn set_volume(&self, level: u8) -> Result<Vec<PlatformCommand>, ActionError> {
        Ok(vec![PlatformCommand::new([
            "amixer".to_string(),
            "sset".to_string(),
            "Master".to_string(),
            format!("{}%", level),
        ])
        .with_hint("install alsa-utils to control Linux volume")])
    }

    fn set_brightness(&self, level: u8) -> Result<Vec<PlatformCommand>, ActionError> {
        Ok(vec![PlatformCommand::new([
            "brightnessctl".to_string(),
            "set".to_string(),
            format!("{}%", level),
        ])
        .with_hint("install brightnessctl to control Linux brightness")])
    }

    fn set_theme(&self, mode: ThemeMode) -> Result<Vec<PlatformCommand>, ActionError> {
        let theme = match mode {
            ThemeMode::Dark => "Adwaita-dark",
            ThemeMode::Light => "Adwaita",
            ThemeMode::Auto => return Err(unsupported(self.name(), "theme auto")),
        };
        Ok(vec![PlatformCommand::new([
            "gsettings",
            "set",
            "org.gnome.desktop.interface",
            "gtk-theme",
            theme,
        ])
        .with_hint("a GNOME desktop with gsettings is required to change the theme")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_opens_tel_url() {
        let cmds = Linux.call("13800138000").unwrap();
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].argv, vec!["xdg-open", "tel:13800138000"]);
    }

    #[test]
    fn sms_body_keeps_ampersand_and_hash() {
        let cmds = Linux.sms("10086", "fish & chips #2").unwrap();
        assert_eq!(
            cmds[0].argv,
            vec!["xdg-open", "sms:10086?body=fish%20%26%20chips%20%232"]
        );
    }

    #[test]
    fn volume_sets_master_percent() {
        let cmds = Linux.set_volume(35).unwrap();
        assert_eq!(cmds[0].argv, vec!["amixer", "sset", "Master", "35%"]);
    }

    #[test]
    fn light_theme_is_adwaita() {
        let cmds = Linux.set_theme(ThemeMode::Light).unwrap();
        assert_eq!(cmds[0].argv.last().map(String::as_str), Some("Adwaita"));
    }

    #[test]
    fn auto_theme_is_unsupported() {
        assert!(matches!(
            Linux.set_theme(ThemeMode::Auto),
            Err(ActionError::UnsupportedPlatform(_))
        ));
    }
}
