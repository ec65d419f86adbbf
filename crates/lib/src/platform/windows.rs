//! Windows: URL protocol handler for tel:/sms:, NirCmd for volume, WMI via PowerShell for
//! brightness, and the Personalize registry keys for the theme.

use super::{sms_body, unsupported, Platform, PlatformCommand, ThemeMode};
use crate::error::ActionError;

const PERSONALIZE_KEY: &str = r"HKCU\SOFTWARE\Microsoft\Windows\CurrentVersion\Themes\Personalize";

pub struct Windows;

/// Opens a URL with its registered handler without going through `cmd`.
fn open_url(url: String) -> PlatformCommand {
    PlatformCommand::new([
        "rundll32".to_string(),
        "url.dll,FileProtocolHandler".to_string(),
        url,
    ])
}

fn set_personalize(value_name: &str, light: bool) -> PlatformCommand {
    PlatformCommand::new([
        "reg",
        "add",
        PERSONALIZE_KEY,
        "/v",
        value_name,
        "/t",
        "REG_DWORD",
        "/d",
        if light { "1" } else { "0" },
        "/f",
    ])
}

impl Platform for Windows {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn call(&self, phone: &str) -> Result<Vec<PlatformCommand>, ActionError> {
        Ok(vec![open_url(format!("tel:{}", phone))])
    }

    fn sms(&self, phone: &str, message: &str) -> Result<Vec<PlatformCommand>, ActionError> {
        Ok(vec![open_url(format!("sms:{}?body={}", phone, sms_body(message)))])
    }

    fn set_volume(&self, level: u8) -> Result<Vec<PlatformCommand>, ActionError> {
        let raw = u32::from(level) * 65535 / 100;
        Ok(vec![PlatformCommand::new([
            "nircmd.exe".to_string(),
            "setsysvolume".to_string(),
            raw.to_string(),
        ])
        .with_hint("install NirCmd (nircmd.exe on PATH) to control Windows volume")])
    }

    fn set_brightness(&self, level: u8) -> Result<Vec<PlatformCommand>, ActionError> {
        Ok(vec![PlatformCommand::new([
            "powershell".to_string(),
            "-Command".to_string(),
            format!(
                "(Get-WmiObject -Namespace root/WMI -Class WmiMonitorBrightnessMethods).WmiSetBrightness(1, {})",
                level
            ),
        ])
        .with_hint("Windows brightness control needs administrator rights or a WMI-capable display")])
    }

    fn set_theme(&self, mode: ThemeMode) -> Result<Vec<PlatformCommand>, ActionError> {
        let light = match mode {
            ThemeMode::Light => true,
            ThemeMode::Dark => false,
            ThemeMode::Auto => return Err(unsupported(self.name(), "theme auto")),
        };
        Ok(vec![
            set_personalize("AppsUseLightTheme", light),
            set_personalize("SystemUsesLightTheme", light),
        ])
    }
}
