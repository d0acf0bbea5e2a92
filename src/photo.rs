//! Still photos handed from the capture step to the swap step.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Where a capture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    /// Snapshot of the live camera feed.
    Camera,
    /// Local file chosen by the user.
    Upload,
}

/// An encoded still image, stored as a `data:` URI.
///
/// Captures are immutable. A retake replaces the capture instead of
/// mutating it, so clones share the same encoded payload.
#[derive(Clone, PartialEq, Eq)]
pub struct Capture {
    data_uri: Arc<str>,
    mime: &'static str,
    source: CaptureSource,
}

impl Capture {
    /// Encode raw image bytes as a capture with the given MIME type.
    pub fn from_bytes(mime: &'static str, bytes: &[u8], source: CaptureSource) -> Self {
        let data_uri = format!("data:{};base64,{}", mime, STANDARD.encode(bytes));
        Self {
            data_uri: data_uri.into(),
            mime,
            source,
        }
    }

    /// The full `data:<mime>;base64,<payload>` string sent to the service.
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn source(&self) -> CaptureSource {
        self.source
    }

    /// The base64 payload after the comma.
    pub fn payload(&self) -> &str {
        self.data_uri
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or_default()
    }

    /// Decode the payload back into image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.payload())
    }
}

// Data URIs run to megabytes; keep Debug output readable.
impl fmt::Debug for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capture")
            .field("mime", &self.mime)
            .field("source", &self.source)
            .field("len", &self.data_uri.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_builds_data_uri() {
        let capture = Capture::from_bytes("image/png", b"abc", CaptureSource::Camera);
        assert_eq!(capture.data_uri(), "data:image/png;base64,YWJj");
        assert_eq!(capture.payload(), "YWJj");
        assert_eq!(capture.mime(), "image/png");
        assert_eq!(capture.source(), CaptureSource::Camera);
    }

    #[test]
    fn test_decode_returns_original_bytes() {
        let capture = Capture::from_bytes("image/jpeg", &[0xff, 0xd8, 0xff], CaptureSource::Upload);
        assert_eq!(capture.decode().unwrap(), vec![0xff, 0xd8, 0xff]);
    }

    #[test]
    fn test_clones_share_payload() {
        let capture = Capture::from_bytes("image/png", &[1, 2, 3], CaptureSource::Camera);
        let clone = capture.clone();
        assert!(Arc::ptr_eq(&capture.data_uri, &clone.data_uri));
    }

    #[test]
    fn test_debug_omits_payload() {
        let capture = Capture::from_bytes("image/png", &[0; 64], CaptureSource::Upload);
        let debug = format!("{:?}", capture);
        assert!(debug.contains("image/png"));
        assert!(!debug.contains("base64"));
    }
}
