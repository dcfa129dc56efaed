//! Shared helpers for scanner integration tests.
//!
//! Builders return a [`BarcodeInput`] over a [`MockCamera`] together with
//! the mock's handle and the event receiver, so a test can script the
//! platform and observe what the host would see.

#![allow(dead_code)]

use tillscan_hardware::CaptureDevice;
use tillscan_hardware::mock::{MockCamera, MockCameraHandle};
use tillscan_scanner::{BarcodeInput, KeyEvent, ScanSource, ScannerConfig, ScannerEvent, ScannerEvents};

pub type Scanner = BarcodeInput<MockCamera>;

/// Front and back camera, as on a phone or tablet.
pub fn handset() -> Vec<CaptureDevice> {
    vec![
        CaptureDevice::new("cam-front", "Front Camera"),
        CaptureDevice::new("cam-back", "Back Camera"),
    ]
}

/// A single USB webcam with no facing in its label.
pub fn webcam() -> Vec<CaptureDevice> {
    vec![CaptureDevice::new("usb-046d-0825", "HD Webcam C270")]
}

pub fn scanner(devices: Vec<CaptureDevice>) -> (Scanner, MockCameraHandle, ScannerEvents) {
    scanner_with(devices, ScannerConfig::default())
}

pub fn scanner_with(
    devices: Vec<CaptureDevice>,
    config: ScannerConfig,
) -> (Scanner, MockCameraHandle, ScannerEvents) {
    let (camera, handle) = MockCamera::with_devices(devices);
    let (input, events) = BarcodeInput::new(camera, config).expect("valid scanner config");
    (input, handle, events)
}

/// Scans received so far, as (text, source).
pub fn scans(events: &mut ScannerEvents) -> Vec<(String, ScanSource)> {
    events
        .drain()
        .iter()
        .filter_map(ScannerEvent::as_scan)
        .map(|scan| (scan.text().to_owned(), scan.source))
        .collect()
}

/// Error messages received so far.
pub fn errors(events: &[ScannerEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            ScannerEvent::Error(message) => Some(message.as_str()),
            _ => None,
        })
        .collect()
}

/// Feed every character of `text` with no delay between keys.
pub fn type_burst(input: &Scanner, text: &str) {
    for c in text.chars() {
        assert!(input.press_key(KeyEvent::char(c)), "panel should accept keys");
    }
}
