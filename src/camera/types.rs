//! Camera types and data structures.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

/// Native frame size reported by the video source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Bytes in one packed RGB frame of this size.
    pub fn rgb_frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A captured camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data in packed RGB format
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl Frame {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// Whether the capture button can be used.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CameraStatus {
    /// No stream yet (start-up, or between a retake and the new stream).
    #[default]
    Off,
    /// Live preview is running and capture is enabled.
    Ready,
    /// Acquisition failed; capture stays disabled until the next retake.
    Unavailable { message: String },
}

impl CameraStatus {
    pub fn capture_enabled(&self) -> bool {
        matches!(self, CameraStatus::Ready)
    }
}

/// Errors that can occur during camera and upload operations.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("No camera found")]
    NoDevice,

    #[error("Camera is busy")]
    DeviceBusy,

    #[error("FFmpeg not found")]
    FfmpegNotFound,

    #[error("Camera failed: {0}")]
    Failed(String),

    #[error("No active camera stream")]
    NoActiveStream,

    #[error("No frame received from camera yet")]
    NoFrame,

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Not a supported image file: {}", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CameraError {
    /// Message shown on the camera screen, distinguished by failure reason.
    pub fn user_message(&self) -> String {
        match self {
            CameraError::PermissionDenied => {
                "Camera access denied by user. Please enable it in your system settings and retry."
                    .to_string()
            }
            CameraError::NoDevice => "No camera found on this device.".to_string(),
            CameraError::DeviceBusy => {
                "Camera is already in use by another application.".to_string()
            }
            CameraError::FfmpegNotFound => {
                "FFmpeg not found. Please install it to use the camera.".to_string()
            }
            CameraError::NoActiveStream => {
                "The camera is off. Retake to turn it back on.".to_string()
            }
            CameraError::NoFrame => {
                "The camera is still warming up. Please try again.".to_string()
            }
            CameraError::Encode(_) | CameraError::UnsupportedFile(_) | CameraError::Io(_) => {
                format!("Could not read the photo: {}", self)
            }
            CameraError::Failed(_) => {
                "Camera access denied. Please allow camera permissions and retry.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_display() {
        assert_eq!(Resolution::new(640, 480).to_string(), "640x480");
    }

    #[test]
    fn test_rgb_frame_len() {
        assert_eq!(Resolution::new(2, 3).rgb_frame_len(), 18);
    }

    #[test]
    fn test_camera_status_default_is_off() {
        let status = CameraStatus::default();
        assert_eq!(status, CameraStatus::Off);
        assert!(!status.capture_enabled());
    }

    #[test]
    fn test_only_ready_enables_capture() {
        assert!(CameraStatus::Ready.capture_enabled());
        assert!(!CameraStatus::Unavailable {
            message: "x".to_string()
        }
        .capture_enabled());
    }

    #[test]
    fn test_user_message_by_reason() {
        assert!(CameraError::PermissionDenied
            .user_message()
            .contains("denied by user"));
        assert_eq!(
            CameraError::NoDevice.user_message(),
            "No camera found on this device."
        );
        assert!(CameraError::DeviceBusy
            .user_message()
            .contains("already in use"));
        assert!(CameraError::Failed("boom".to_string())
            .user_message()
            .contains("allow camera permissions"));
    }

    #[test]
    fn test_camera_error_display() {
        assert_eq!(CameraError::NoActiveStream.to_string(), "No active camera stream");
        assert_eq!(
            CameraError::UnsupportedFile(PathBuf::from("/tmp/a.txt")).to_string(),
            "Not a supported image file: /tmp/a.txt"
        );
    }
}
