//! Devices command handler

use crate::commands::DevicesArgs;
use crate::error::CliResult;
use crate::handlers::synthetic_backend;
use crate::output::OutputFormat;
use serde::Serialize;
use shutterbox::config::CaptureConfig;
use shutterbox::device::{default_selection, CaptureDeviceManager, DeviceId, DeviceInfo};
use std::fmt::Write as _;
use std::sync::Arc;

/// Enumeration plus the device a session would stream from
#[derive(Debug, Serialize)]
pub struct DeviceListing {
    /// Attached devices
    pub devices: Vec<DeviceInfo>,
    /// Device a session would stream from
    pub selected: Option<DeviceId>,
}

impl DeviceListing {
    /// Resolve the selection the way the capture manager does
    #[must_use]
    pub fn new(devices: Vec<DeviceInfo>, capture: &CaptureConfig) -> Self {
        let preferred = capture
            .preferred_device
            .as_deref()
            .and_then(|id| devices.iter().find(|d| d.id.as_str() == id))
            .map(|d| d.id.clone());
        let selected =
            preferred.or_else(|| default_selection(&devices, &capture.preferred_signature));
        Self { devices, selected }
    }
}

/// Execute the devices command
pub async fn execute_devices(capture: &CaptureConfig, args: &DevicesArgs) -> CliResult<()> {
    let backend = Arc::new(synthetic_backend(&args.devices));
    let mut manager = CaptureDeviceManager::new(backend, capture.clone());
    let devices = manager.list_devices().await?.to_vec();
    let listing = DeviceListing::new(devices, capture);

    match OutputFormat::from(args.format) {
        OutputFormat::Text => print!("{}", render_device_table(&listing)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
    }
    Ok(())
}

/// Plain-text device table; the selected device is starred
#[must_use]
pub fn render_device_table(listing: &DeviceListing) -> String {
    if listing.devices.is_empty() {
        return "No capture devices found\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "  {:<14} {:<28} {:>11} {:>4}", "ID", "LABEL", "MAX", "FPS");
    for device in &listing.devices {
        let marker = if listing.selected.as_ref() == Some(&device.id) {
            '*'
        } else {
            ' '
        };
        let cap = device.capability;
        let _ = writeln!(
            out,
            "{marker} {:<14} {:<28} {:>11} {:>4}",
            device.id.as_str(),
            device.label,
            format!("{}x{}", cap.max_width, cap.max_height),
            cap.frame_rate
        );
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use shutterbox::device::DeviceCapability;

    fn device(id: &str, label: &str) -> DeviceInfo {
        DeviceInfo {
            id: DeviceId::new(id),
            label: label.to_string(),
            capability: DeviceCapability::default(),
        }
    }

    #[test]
    fn test_signature_match_is_selected() {
        let devices = vec![device("a", "Built-in"), device("b", "OBS Virtual Camera")];
        let listing = DeviceListing::new(devices, &CaptureConfig::default());
        assert_eq!(listing.selected, Some(DeviceId::new("b")));
    }

    #[test]
    fn test_preferred_device_wins_when_attached() {
        let capture = CaptureConfig {
            preferred_device: Some("a".to_string()),
            ..CaptureConfig::default()
        };
        let devices = vec![device("a", "Built-in"), device("b", "OBS Virtual Camera")];
        assert_eq!(
            DeviceListing::new(devices, &capture).selected,
            Some(DeviceId::new("a"))
        );
    }

    #[test]
    fn test_missing_preferred_device_falls_back() {
        let capture = CaptureConfig {
            preferred_device: Some("gone".to_string()),
            ..CaptureConfig::default()
        };
        let devices = vec![device("a", "Built-in")];
        assert_eq!(
            DeviceListing::new(devices, &capture).selected,
            Some(DeviceId::new("a"))
        );
    }

    #[test]
    fn test_table_marks_selection() {
        let listing = DeviceListing::new(
            vec![device("a", "Built-in"), device("b", "OBS Virtual Camera")],
            &CaptureConfig::default(),
        );
        let table = render_device_table(&listing);
        let starred: Vec<&str> = table.lines().filter(|l| l.starts_with('*')).collect();
        assert_eq!(starred.len(), 1);
        assert!(starred[0].contains("OBS Virtual Camera"));
        assert!(table.contains("1920x1080"));
    }

    #[test]
    fn test_empty_table() {
        let listing = DeviceListing::new(Vec::new(), &CaptureConfig::default());
        assert_eq!(render_device_table(&listing), "No capture devices found\n");
        assert!(listing.selected.is_none());
    }
}
