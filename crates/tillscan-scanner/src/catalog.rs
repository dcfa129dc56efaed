//! Capture device catalog.
//!
//! The catalog is read once per panel open. It classifies devices as front or
//! back facing from their labels and picks how the camera is selected:
//!
//! - **LogicalFacing** when at least one front and one back camera exist
//!   (typical handset). The default is the back camera.
//! - **ExplicitDevice** otherwise. The default is the first enumerated device.
//!
//! Loading the catalog never opens a capture session.

use std::fmt;

use serde::{Deserialize, Serialize};
use tillscan_hardware::{CameraPlatform, CaptureDevice, CaptureTarget, Facing};
use tracing::debug;

use crate::error::CatalogError;

/// How the camera is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// A concrete device id.
    ExplicitDevice,

    /// A logical front/back selector.
    LogicalFacing,
}

impl SelectionMode {
    /// Mode implied by a capture target.
    pub fn of(target: &CaptureTarget) -> Self {
        match target {
            CaptureTarget::Device(_) => Self::ExplicitDevice,
            CaptureTarget::Facing(_) => Self::LogicalFacing,
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExplicitDevice => write!(f, "explicit device"),
            Self::LogicalFacing => write!(f, "logical facing"),
        }
    }
}

/// Devices available for one panel session plus the default choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCatalog {
    devices: Vec<CaptureDevice>,
    mode: SelectionMode,
    default_target: CaptureTarget,
}

impl DeviceCatalog {
    /// Enumerate devices from the platform and classify them.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if enumeration fails or finds no devices.
    pub async fn load<P: CameraPlatform>(platform: &P) -> Result<Self, CatalogError> {
        let devices = platform.list_devices().await?;
        Self::from_devices(devices)
    }

    /// Build a catalog from an already enumerated device list.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NoDeviceFound` if the list is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use tillscan_hardware::{CaptureDevice, CaptureTarget, Facing};
    /// use tillscan_scanner::catalog::{DeviceCatalog, SelectionMode};
    ///
    /// let catalog = DeviceCatalog::from_devices(vec![
    ///     CaptureDevice::new("a", "Front Camera"),
    ///     CaptureDevice::new("b", "Back Camera"),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(catalog.mode(), SelectionMode::LogicalFacing);
    /// assert_eq!(catalog.default_target(), &CaptureTarget::Facing(Facing::Back));
    /// ```
    pub fn from_devices(devices: Vec<CaptureDevice>) -> Result<Self, CatalogError> {
        let first = devices.first().ok_or(CatalogError::NoDeviceFound)?;

        let has_front = devices.iter().any(|d| d.facing() == Some(Facing::Front));
        let has_back = devices.iter().any(|d| d.facing() == Some(Facing::Back));

        let (mode, default_target) = if has_front && has_back {
            (SelectionMode::LogicalFacing, CaptureTarget::Facing(Facing::Back))
        } else {
            (
                SelectionMode::ExplicitDevice,
                CaptureTarget::Device(first.id.clone()),
            )
        };

        debug!(count = devices.len(), %mode, %default_target, "device catalog loaded");

        Ok(Self {
            devices,
            mode,
            default_target,
        })
    }

    /// Enumerated devices, in platform order.
    pub fn devices(&self) -> &[CaptureDevice] {
        &self.devices
    }

    /// Selection mode chosen at load time.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Target used when the user has not chosen one.
    pub fn default_target(&self) -> &CaptureTarget {
        &self.default_target
    }

    /// Whether a device with this id was enumerated.
    pub fn contains(&self, id: &str) -> bool {
        self.devices.iter().any(|d| d.id == id)
    }

    /// Whether targets can be expressed as a facing on this hardware.
    pub fn supports_facing(&self) -> bool {
        self.mode == SelectionMode::LogicalFacing
    }

    /// Devices classified as facing the given way.
    pub fn facing(&self, facing: Facing) -> impl Iterator<Item = &CaptureDevice> {
        self.devices
            .iter()
            .filter(move |d| d.facing() == Some(facing))
    }

    /// Pick the target to open: `preferred` if it still makes sense for
    /// these devices, the default otherwise.
    pub fn resolve(&self, preferred: Option<&CaptureTarget>) -> CaptureTarget {
        match preferred {
            Some(CaptureTarget::Device(id)) if self.contains(id) => CaptureTarget::Device(id.clone()),
            Some(CaptureTarget::Facing(facing)) if self.supports_facing() => {
                CaptureTarget::Facing(*facing)
            }
            _ => self.default_target.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tillscan_hardware::PlatformError;
    use tillscan_hardware::mock::MockCamera;

    fn handset() -> Vec<CaptureDevice> {
        vec![
            CaptureDevice::new("cam-f", "Front Camera"),
            CaptureDevice::new("cam-b", "Back Camera"),
        ]
    }

    #[test]
    fn test_front_and_back_selects_logical_facing() {
        let catalog = DeviceCatalog::from_devices(handset()).unwrap();
        assert_eq!(catalog.mode(), SelectionMode::LogicalFacing);
        assert_eq!(catalog.default_target(), &CaptureTarget::Facing(Facing::Back));
        assert_eq!(catalog.facing(Facing::Front).count(), 1);
    }

    #[test]
    fn test_single_unclassified_selects_explicit_device() {
        let catalog =
            DeviceCatalog::from_devices(vec![CaptureDevice::new("usb-1", "HD Webcam")]).unwrap();
        assert_eq!(catalog.mode(), SelectionMode::ExplicitDevice);
        assert_eq!(catalog.default_target(), &CaptureTarget::device("usb-1"));
    }

    #[test]
    fn test_two_back_cameras_stay_explicit() {
        let catalog = DeviceCatalog::from_devices(vec![
            CaptureDevice::new("wide", "Back Wide Camera"),
            CaptureDevice::new("tele", "Back Telephoto Camera"),
        ])
        .unwrap();
        assert_eq!(catalog.mode(), SelectionMode::ExplicitDevice);
        assert_eq!(catalog.default_target(), &CaptureTarget::device("wide"));
    }

    #[test]
    fn test_empty_list_is_no_device() {
        assert_eq!(
            DeviceCatalog::from_devices(Vec::new()),
            Err(CatalogError::NoDeviceFound)
        );
    }

    #[test]
    fn test_resolve_prefers_valid_choice() {
        let catalog = DeviceCatalog::from_devices(handset()).unwrap();

        let front = CaptureTarget::Facing(Facing::Front);
        assert_eq!(catalog.resolve(Some(&front)), front);

        let device = CaptureTarget::device("cam-f");
        assert_eq!(catalog.resolve(Some(&device)), device);

        let gone = CaptureTarget::device("cam-x");
        assert_eq!(catalog.resolve(Some(&gone)), CaptureTarget::Facing(Facing::Back));
        assert_eq!(catalog.resolve(None), CaptureTarget::Facing(Facing::Back));
    }

    #[test]
    fn test_resolve_drops_facing_without_pair() {
        let catalog =
            DeviceCatalog::from_devices(vec![CaptureDevice::new("usb-1", "HD Webcam")]).unwrap();
        let front = CaptureTarget::Facing(Facing::Front);
        assert_eq!(catalog.resolve(Some(&front)), CaptureTarget::device("usb-1"));
    }

    #[tokio::test]
    async fn test_load_maps_platform_errors() {
        let (camera, handle) = MockCamera::new();

        handle.fail_enumeration(PlatformError::permission_denied("NotAllowedError"));
        assert_eq!(
            DeviceCatalog::load(&camera).await,
            Err(CatalogError::PermissionDenied)
        );

        handle.fail_enumeration(PlatformError::other("bridge unavailable"));
        assert_eq!(
            DeviceCatalog::load(&camera).await,
            Err(CatalogError::Platform("bridge unavailable".into()))
        );

        handle.clear_enumeration_failure();
        handle.set_devices(Vec::new());
        assert_eq!(
            DeviceCatalog::load(&camera).await,
            Err(CatalogError::NoDeviceFound)
        );
    }

    #[tokio::test]
    async fn test_load_does_not_open_sessions() {
        let (camera, handle) = MockCamera::with_devices(handset());
        let catalog = DeviceCatalog::load(&camera).await.unwrap();
        assert_eq!(catalog.devices().len(), 2);
        assert_eq!(handle.acquire_count(), 0);
        assert_eq!(handle.enumeration_count(), 1);
    }
}
