use serde::Deserialize;
use serde::Serialize;

pub const DEFAULT_PLATFORM: &str = "android";
pub const DEFAULT_LAUNCH_ACTIVITY: &str = ".MainActivity";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub platform_version: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub is_connected: bool,
}

impl Device {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.device_id)
    }
}

/// Result of analysing an application package against a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApkInfo {
    pub package_name: String,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "activity")]
    pub launch_activity: Option<String>,
    #[serde(default)]
    pub already_installed: bool,
}

impl ApkInfo {
    pub fn activity_or_default(&self) -> &str {
        self.launch_activity
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_LAUNCH_ACTIVITY)
    }
}

/// Progress reported while a package installs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallProgress {
    pub device_id: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apk_info_parses_check_response() {
        let info: ApkInfo = serde_json::from_value(json!({
            "package_name": "com.example.shop",
            "app_name": "Shop",
            "version": "2.1.0",
            "already_installed": true,
            "activity": ".ui.LaunchActivity",
            "apk_path": "/tmp/shop.apk"
        }))
        .unwrap();
        assert_eq!(info.package_name, "com.example.shop");
        assert!(info.already_installed);
        assert_eq!(info.activity_or_default(), ".ui.LaunchActivity");
    }

    #[test]
    fn test_missing_activity_uses_default() {
        let info: ApkInfo =
            serde_json::from_value(json!({"package_name": "com.example"})).unwrap();
        assert_eq!(info.activity_or_default(), DEFAULT_LAUNCH_ACTIVITY);
        assert!(!info.already_installed);
    }

    #[test]
    fn test_device_display_name_falls_back_to_id() {
        let device: Device = serde_json::from_value(json!({
            "device_id": "emulator-5554",
            "name": "",
            "is_connected": true
        }))
        .unwrap();
        assert_eq!(device.display_name(), "emulator-5554");
    }
}
