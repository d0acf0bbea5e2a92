//! Ownership of the single active camera stream.

use super::device::VideoTrack;
use super::types::{CameraError, Frame};

/// Handle to a live stream. Tracks are stopped exactly once, either by
/// [`MediaStream::stop_tracks`] or when the handle is dropped.
#[derive(Debug)]
pub struct MediaStream<T: VideoTrack> {
    track: T,
    stopped: bool,
}

impl<T: VideoTrack> MediaStream<T> {
    pub fn new(track: T) -> Self {
        Self {
            track,
            stopped: false,
        }
    }

    pub fn track(&self) -> &T {
        &self.track
    }

    pub fn is_live(&self) -> bool {
        !self.stopped
    }

    pub fn start_playback(&mut self) -> Result<(), CameraError> {
        if self.stopped {
            return Err(CameraError::NoActiveStream);
        }
        self.track.start_playback()
    }

    /// Snapshot the current frame.
    pub fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        if self.stopped {
            return Err(CameraError::NoActiveStream);
        }
        self.track.grab_frame()
    }

    /// Stop all tracks. Returns `true` if this call released the device.
    pub fn stop_tracks(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        log::debug!("Stopping camera track: {}", self.track.label());
        self.track.stop();
        self.stopped = true;
        true
    }
}

impl<T: VideoTrack> Drop for MediaStream<T> {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}
