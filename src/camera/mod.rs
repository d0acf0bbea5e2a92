//! Capture manager: camera access and still-photo capture.
//!
//! This module provides:
//! - The platform camera surface via [`MediaDevices`] and [`VideoTrack`]
//! - An ffmpeg-backed camera via [`FfmpegCamera`]
//! - Stream ownership and capture via [`CaptureManager`]

mod capture;
mod capture_loop;
mod device;
mod frame_utils;
mod manager;
mod stream;
mod types;

pub use capture::{
    classify_ffmpeg_error, default_device, default_input_format, parse_stream_resolution,
    FfmpegCamera, FfmpegSettings, FfmpegTrack,
};
pub use device::{MediaDevices, VideoTrack};
pub use frame_utils::{encode_png, file_to_capture, frame_to_capture};
pub use manager::{is_secure_origin, CameraInit, CaptureManager, INSECURE_ORIGIN_WARNING};
pub use stream::MediaStream;
pub use types::{CameraError, CameraStatus, Frame, Resolution};
