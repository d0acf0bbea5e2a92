//! ffmpeg-backed camera.
//!
//! Opening a track runs a one-frame probe to learn the native resolution
//! (or classify why the device is unusable). Playback then spawns a second
//! ffmpeg process that streams packed `rgb24` frames into a latest-frame
//! buffer on a background thread.

use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use super::capture_loop::run_capture_loop;
use super::device::{MediaDevices, VideoTrack};
use super::types::{CameraError, Frame, Resolution};

/// Default ffmpeg input format for this platform.
pub fn default_input_format() -> &'static str {
    if cfg!(target_os = "macos") {
        "avfoundation"
    } else if cfg!(target_os = "windows") {
        "dshow"
    } else {
        "v4l2"
    }
}

/// Default capture device for this platform.
pub fn default_device() -> &'static str {
    if cfg!(target_os = "macos") {
        "0"
    } else if cfg!(target_os = "windows") {
        "video=Integrated Camera"
    } else {
        "/dev/video0"
    }
}

/// Settings for the ffmpeg camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegSettings {
    /// ffmpeg executable
    pub ffmpeg: String,
    /// Input demuxer (`v4l2`, `avfoundation`, `dshow`)
    pub input_format: String,
    /// Device name or path for the demuxer
    pub device: String,
}

impl Default for FfmpegSettings {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            input_format: default_input_format().to_string(),
            device: default_device().to_string(),
        }
    }
}

impl FfmpegSettings {
    fn input_args(&self) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-f".to_string(),
            self.input_format.clone(),
            "-i".to_string(),
            self.device.clone(),
        ]
    }

    /// Arguments for the metadata probe: decode one frame and discard it.
    pub fn probe_args(&self) -> Vec<String> {
        let mut args = self.input_args();
        args.extend(
            ["-frames:v", "1", "-f", "null", "-"]
                .iter()
                .map(|s| s.to_string()),
        );
        args
    }

    /// Arguments for the live stream: raw RGB frames at native size on stdout.
    pub fn stream_args(&self) -> Vec<String> {
        let mut args = self.input_args();
        args.extend(
            [
                "-loglevel", "error", "-an", "-f", "rawvideo", "-pix_fmt", "rgb24", "-",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args
    }
}

/// Camera reached through the ffmpeg command-line tool.
#[derive(Debug, Clone, Default)]
pub struct FfmpegCamera {
    settings: FfmpegSettings,
}

impl FfmpegCamera {
    pub fn new(settings: FfmpegSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FfmpegSettings {
        &self.settings
    }
}

impl MediaDevices for FfmpegCamera {
    type Track = FfmpegTrack;

    async fn get_user_media(&mut self) -> Result<FfmpegTrack, CameraError> {
        log::info!(
            "Opening camera {} ({})",
            self.settings.device,
            self.settings.input_format
        );

        let output = tokio::process::Command::new(&self.settings.ffmpeg)
            .args(self.settings.probe_args())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CameraError::FfmpegNotFound
                } else {
                    CameraError::Io(e)
                }
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(classify_ffmpeg_error(&stderr));
        }

        let resolution = parse_stream_resolution(&stderr).ok_or_else(|| {
            CameraError::Failed("could not read video stream metadata".to_string())
        })?;
        log::info!("Camera stream metadata: {}", resolution);

        Ok(FfmpegTrack {
            settings: self.settings.clone(),
            resolution,
            child: None,
            frame_buffer: Arc::new(Mutex::new(None)),
            stop_signal: Arc::new(AtomicBool::new(false)),
            reader: None,
        })
    }
}

/// A live ffmpeg video track.
pub struct FfmpegTrack {
    settings: FfmpegSettings,
    resolution: Resolution,
    child: Option<Child>,
    /// Latest captured frame (shared with reader thread)
    frame_buffer: Arc<Mutex<Option<Frame>>>,
    stop_signal: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for FfmpegTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegTrack")
            .field("device", &self.settings.device)
            .field("resolution", &self.resolution)
            .field("is_playing", &self.child.is_some())
            .finish_non_exhaustive()
    }
}

impl VideoTrack for FfmpegTrack {
    fn label(&self) -> &str {
        &self.settings.device
    }

    fn resolution(&self) -> Option<Resolution> {
        Some(self.resolution)
    }

    fn start_playback(&mut self) -> Result<(), CameraError> {
        if self.child.is_some() {
            return Ok(());
        }

        let mut child = Command::new(&self.settings.ffmpeg)
            .args(self.settings.stream_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CameraError::FfmpegNotFound
                } else {
                    CameraError::Io(e)
                }
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CameraError::Failed("ffmpeg stdout unavailable".to_string()))?;

        self.stop_signal.store(false, Ordering::SeqCst);
        let buffer = Arc::clone(&self.frame_buffer);
        let stop = Arc::clone(&self.stop_signal);
        let resolution = self.resolution;
        self.reader = Some(thread::spawn(move || {
            run_capture_loop(stdout, resolution, buffer, stop);
        }));
        self.child = Some(child);
        Ok(())
    }

    fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        self.frame_buffer
            .lock()
            .ok()
            .and_then(|buf| buf.clone())
            .ok_or(CameraError::NoFrame)
    }

    fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

impl Drop for FfmpegTrack {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Map ffmpeg's stderr from a failed open to a camera error reason.
pub fn classify_ffmpeg_error(stderr: &str) -> CameraError {
    let lower = stderr.to_lowercase();

    if lower.contains("permission denied") || lower.contains("not authorized") {
        CameraError::PermissionDenied
    } else if lower.contains("device or resource busy") || lower.contains("in use") {
        CameraError::DeviceBusy
    } else if lower.contains("no such file or directory")
        || lower.contains("no such device")
        || lower.contains("could not find video device")
        || lower.contains("video device not found")
    {
        CameraError::NoDevice
    } else {
        let last = stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("unknown ffmpeg error");
        CameraError::Failed(last.trim().to_string())
    }
}

/// Find the `WIDTHxHEIGHT` token on ffmpeg's input video stream line.
///
/// Example line:
/// `  Stream #0:0: Video: rawvideo (YUY2 / 0x32595559), yuyv422, 640x480, 60 tbr`
pub fn parse_stream_resolution(stderr: &str) -> Option<Resolution> {
    stderr
        .lines()
        .filter(|line| line.contains("Stream #") && line.contains("Video:"))
        .flat_map(|line| line.split([',', ' ']))
        .find_map(|token| {
            let (w, h) = token.split_once('x')?;
            let width: u32 = w.parse().ok()?;
            let height: u32 = h.parse().ok()?;
            (width > 0 && height > 0).then(|| Resolution::new(width, height))
        })
}
