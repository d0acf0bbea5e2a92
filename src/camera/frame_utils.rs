//! Frame and file encoding into captures.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, RgbImage};

use super::types::{CameraError, Frame};
use crate::photo::{Capture, CaptureSource};

/// Encode a frame losslessly as PNG.
pub fn encode_png(frame: &Frame) -> Result<Vec<u8>, CameraError> {
    let image = RgbImage::from_raw(frame.width, frame.height, frame.data.clone()).ok_or_else(
        || {
            CameraError::Encode(format!(
                "frame buffer of {} bytes does not match {}",
                frame.data.len(),
                frame.resolution()
            ))
        },
    )?;

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| CameraError::Encode(e.to_string()))?;
    Ok(png.into_inner())
}

/// Snapshot a frame into a PNG capture at its native resolution.
pub fn frame_to_capture(frame: &Frame) -> Result<Capture, CameraError> {
    let png = encode_png(frame)?;
    Ok(Capture::from_bytes(
        ImageFormat::Png.to_mime_type(),
        &png,
        CaptureSource::Camera,
    ))
}

/// Read a local image file into a capture, keeping its original encoding.
///
/// The format is sniffed from the file contents, not the extension.
pub fn file_to_capture(path: &Path) -> Result<Capture, CameraError> {
    let bytes = std::fs::read(path)?;
    let format =
        image::guess_format(&bytes).map_err(|_| CameraError::UnsupportedFile(path.to_path_buf()))?;
    Ok(Capture::from_bytes(
        format.to_mime_type(),
        &bytes,
        CaptureSource::Upload,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn frame(width: u32, height: u32) -> Frame {
        Frame {
            data: vec![128; (width * height * 3) as usize],
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn test_encode_png_keeps_native_resolution() {
        let png = encode_png(&frame(4, 3)).unwrap();
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 3);
    }

    #[test]
    fn test_encode_png_rejects_short_buffer() {
        let mut bad = frame(4, 3);
        bad.data.truncate(5);
        assert!(matches!(encode_png(&bad), Err(CameraError::Encode(_))));
    }

    #[test]
    fn test_frame_to_capture_is_png_data_uri() {
        let capture = frame_to_capture(&frame(2, 2)).unwrap();
        assert!(capture.data_uri().starts_with("data:image/png;base64,"));
        assert_eq!(capture.source(), CaptureSource::Camera);
    }

    #[test]
    fn test_file_to_capture_sniffs_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.bin");
        std::fs::write(&path, encode_png(&frame(2, 2)).unwrap()).unwrap();

        let capture = file_to_capture(&path).unwrap();
        assert_eq!(capture.mime(), "image/png");
        assert_eq!(capture.source(), CaptureSource::Upload);
    }

    #[test]
    fn test_file_to_capture_rejects_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        assert!(matches!(
            file_to_capture(&path),
            Err(CameraError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn test_file_to_capture_missing_file_is_io_error() {
        let result = file_to_capture(Path::new("/nonexistent/photo.png"));
        assert!(matches!(result, Err(CameraError::Io(_))));
    }
}
