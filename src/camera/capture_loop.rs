//! Background frame reader for the ffmpeg camera.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::types::{Frame, Resolution};

/// Read packed RGB frames from `source` until it closes or `stop` is set,
/// keeping only the latest one in `buffer`.
pub fn run_capture_loop<R: Read>(
    mut source: R,
    resolution: Resolution,
    buffer: Arc<Mutex<Option<Frame>>>,
    stop: Arc<AtomicBool>,
) {
    let frame_len = resolution.rgb_frame_len();
    let mut data = vec![0u8; frame_len];

    while !stop.load(Ordering::Relaxed) {
        if let Err(e) = source.read_exact(&mut data) {
            if !stop.load(Ordering::Relaxed) {
                log::warn!("Camera stream ended: {}", e);
            }
            break;
        }

        let frame = Frame {
            data: data.clone(),
            width: resolution.width,
            height: resolution.height,
            timestamp: Instant::now(),
        };

        if let Ok(mut buf) = buffer.lock() {
            *buf = Some(frame);
        }
    }
}
