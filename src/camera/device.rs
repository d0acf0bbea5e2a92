//! Platform camera surface.
//!
//! The capture manager only talks to cameras through these traits, so the
//! kiosk runs the same way against ffmpeg, a test double, or anything else
//! that can hand out frames.

use super::types::{CameraError, Frame, Resolution};

/// Source of live video tracks.
#[allow(async_fn_in_trait)]
pub trait MediaDevices {
    type Track: VideoTrack;

    /// Request any video source. No resolution or device constraints are
    /// applied beyond what the implementation was configured with.
    async fn get_user_media(&mut self) -> Result<Self::Track, CameraError>;
}

/// A single live video track.
pub trait VideoTrack {
    /// Human-readable label for logs.
    fn label(&self) -> &str;

    /// Native frame size, once the stream metadata is known.
    fn resolution(&self) -> Option<Resolution>;

    /// Begin delivering frames. Must be called explicitly after metadata is
    /// available; tracks do not start on their own.
    fn start_playback(&mut self) -> Result<(), CameraError>;

    /// Latest frame at native resolution.
    fn grab_frame(&mut self) -> Result<Frame, CameraError>;

    /// Stop the track and release the device.
    fn stop(&mut self);
}
