//! Camera access seam.
//!
//! The session never touches real devices. The runtime asks a
//! [`MediaDevices`] implementation for the camera when video is switched
//! on; a refusal becomes a notice and the interview carries on.

use async_trait::async_trait;
use thiserror::Error;

/// Why the camera could not be opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    /// The user or platform refused permission
    #[error("camera permission denied")]
    PermissionDenied,
}

/// Access to local media devices.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Requests the camera.
    ///
    /// # Errors
    ///
    /// Returns a [`MediaError`] when access is refused.
    async fn request_camera(&self) -> Result<(), MediaError>;
}

/// Media devices with a fixed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticMediaDevices {
    granted: bool,
}

impl StaticMediaDevices {
    /// Devices that grant every request.
    #[must_use]
    pub const fn granting() -> Self {
        Self { granted: true }
    }

    /// Devices that refuse every request.
    #[must_use]
    pub const fn denying() -> Self {
        Self { granted: false }
    }
}

#[async_trait]
impl MediaDevices for StaticMediaDevices {
    async fn request_camera(&self) -> Result<(), MediaError> {
        if self.granted {
            Ok(())
        } else {
            Err(MediaError::PermissionDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_devices_answer_as_configured() {
        assert_eq!(StaticMediaDevices::granting().request_camera().await, Ok(()));
        assert_eq!(
            StaticMediaDevices::denying().request_camera().await,
            Err(MediaError::PermissionDenied)
        );
    }
}
