//! Capture manager: owns the single active camera stream and turns either a
//! camera snapshot or an uploaded file into a [`Capture`].

use std::path::Path;

use reqwest::Url;

use super::device::{MediaDevices, VideoTrack};
use super::frame_utils::{file_to_capture, frame_to_capture};
use super::stream::MediaStream;
use super::types::{CameraError, CameraStatus};
use crate::photo::Capture;

/// Warning shown when the kiosk origin cannot be trusted with a camera.
pub const INSECURE_ORIGIN_WARNING: &str =
    "Camera access requires a secure connection (HTTPS or localhost). Camera access may be refused.";

/// Result of a camera (re)initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraInit {
    pub status: CameraStatus,
    /// Non-fatal warning to show the user, if any.
    pub warning: Option<String>,
}

/// Returns true for `https` origins and loopback hosts.
pub fn is_secure_origin(origin: &Url) -> bool {
    if origin.scheme() == "https" {
        return true;
    }
    matches!(
        origin.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]") | Some("::1")
    )
}

/// Acquires camera streams and produces still captures.
pub struct CaptureManager<D: MediaDevices> {
    devices: D,
    stream: Option<MediaStream<D::Track>>,
    origin: Option<Url>,
}

impl<D: MediaDevices> CaptureManager<D> {
    pub fn new(devices: D) -> Self {
        Self {
            devices,
            stream: None,
            origin: None,
        }
    }

    /// Set the origin the kiosk is served from, used for the secure-context check.
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn devices(&self) -> &D {
        &self.devices
    }

    /// Whether a live stream is currently held.
    pub fn is_streaming(&self) -> bool {
        self.stream.as_ref().is_some_and(MediaStream::is_live)
    }

    /// Acquire a video source and start the live preview.
    ///
    /// Any existing stream is released first. Failures never propagate: they
    /// come back as [`CameraStatus::Unavailable`] with a message for the user.
    pub async fn init_camera(&mut self) -> CameraInit {
        let warning = match &self.origin {
            Some(origin) if !is_secure_origin(origin) => {
                log::warn!("Camera may not work on non-secure origin: {}", origin);
                Some(INSECURE_ORIGIN_WARNING.to_string())
            }
            _ => None,
        };

        self.release();

        let status = match self.open_stream().await {
            Ok(stream) => {
                log::info!("Camera stream ready: {}", stream.track().label());
                self.stream = Some(stream);
                CameraStatus::Ready
            }
            Err(e) => {
                log::error!("Camera access error: {}", e);
                CameraStatus::Unavailable {
                    message: e.user_message(),
                }
            }
        };

        CameraInit { status, warning }
    }

    async fn open_stream(&mut self) -> Result<MediaStream<D::Track>, CameraError> {
        let track = self.devices.get_user_media().await?;
        let mut stream = MediaStream::new(track);

        // Playback does not start by itself; kick it once metadata is known.
        if stream.track().resolution().is_none() {
            return Err(CameraError::Failed(
                "video stream has no metadata".to_string(),
            ));
        }
        stream.start_playback()?;
        Ok(stream)
    }

    /// Snapshot the current frame as a lossless PNG capture and turn the
    /// camera off.
    pub fn capture_photo(&mut self) -> Result<Capture, CameraError> {
        let stream = self
            .stream
            .as_mut()
            .filter(|s| s.is_live())
            .ok_or(CameraError::NoActiveStream)?;

        let frame = stream.grab_frame()?;
        let capture = frame_to_capture(&frame)?;
        log::info!(
            "Captured photo at {} ({} bytes encoded)",
            frame.resolution(),
            capture.data_uri().len()
        );

        self.release();
        Ok(capture)
    }

    /// Read a user-selected file, bypassing the camera.
    ///
    /// `None` (nothing chosen) is a silent no-op. On success the camera is
    /// released, same as after a snapshot.
    pub fn handle_file_upload(
        &mut self,
        path: Option<&Path>,
    ) -> Result<Option<Capture>, CameraError> {
        let Some(path) = path else {
            return Ok(None);
        };

        let capture = file_to_capture(path)?;
        log::info!("Loaded photo from {}", path.display());
        self.release();
        Ok(Some(capture))
    }

    /// Stop all tracks of the active stream. Returns `true` if a stream was
    /// released by this call.
    pub fn release(&mut self) -> bool {
        match self.stream.take() {
            Some(mut stream) => stream.stop_tracks(),
            None => false,
        }
    }
}

impl<D: MediaDevices> Drop for CaptureManager<D> {
    fn drop(&mut self) {
        self.release();
    }
}
