//! ResultCache - disk cache for downloaded swap results, used for printing.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Extensions the cache treats as result images.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Cache size limit used unless configured otherwise.
pub const DEFAULT_CACHE_MAX_MB: u64 = 200;

/// Persistent disk cache for finished swap images, keyed by result URL.
#[derive(Debug, Clone)]
pub struct ResultCache {
    cache_dir: PathBuf,
}

impl ResultCache {
    /// Create a ResultCache with the given cache directory.
    /// Does not create the directory - call `ensure_dir_exists()` to create it.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Create a ResultCache with the default cache directory.
    /// Default: ~/.cache/photobooth-kiosk/results/
    pub fn with_default_dir() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("photobooth-kiosk")
            .join("results");
        Self::new(cache_dir)
    }

    /// Ensure the cache directory exists, creating it if necessary.
    pub fn ensure_dir_exists(&self) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&self.cache_dir)
    }

    /// Get the cache directory path.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path the result at `url` is (or would be) stored under.
    pub fn path_for(&self, url: &str) -> PathBuf {
        let hash = Self::hash_url(url);
        self.cache_dir
            .join(format!("{}.{}", hash, Self::extension_for(url)))
    }

    /// Get a cached result by URL, if it was downloaded before.
    pub fn get(&self, url: &str) -> Option<PathBuf> {
        let path = self.path_for(url);
        path.is_file().then_some(path)
    }

    /// Deterministic SHA256 hash of the URL.
    /// Returns a 32-character hex string (first 16 bytes of SHA256).
    pub fn hash_url(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16])
    }

    /// Image extension taken from the URL path, `png` when unknown.
    fn extension_for(url: &str) -> &'static str {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let ext = path
            .rsplit('/')
            .next()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        IMAGE_EXTENSIONS
            .iter()
            .find(|known| ext.as_deref() == Some(**known))
            .copied()
            .unwrap_or("png")
    }

    fn is_cached_image(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e))
    }

    /// Remove old files if cache exceeds max size.
    /// Deletes oldest files first (by modification time) until under limit.
    pub fn cleanup_if_needed(&self, max_size_mb: u64) -> Result<(), std::io::Error> {
        let max_size_bytes = max_size_mb * 1024 * 1024;

        let mut files: Vec<(PathBuf, std::fs::Metadata)> = Vec::new();
        let mut total_size: u64 = 0;

        if !self.cache_dir.exists() {
            return Ok(());
        }

        for entry in std::fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            let path = entry.path();

            if Self::is_cached_image(&path) {
                if let Ok(metadata) = entry.metadata() {
                    if metadata.is_file() {
                        total_size += metadata.len();
                        files.push((path, metadata));
                    }
                }
            }
        }

        if total_size <= max_size_bytes {
            return Ok(());
        }

        // Oldest first
        files.sort_by(|a, b| {
            let time_a = a.1.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
            let time_b = b.1.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
            time_a.cmp(&time_b)
        });

        for (path, metadata) in files {
            if total_size <= max_size_bytes {
                break;
            }

            let file_size = metadata.len();
            if std::fs::remove_file(&path).is_ok() {
                log::debug!("Evicted cached result {}", path.display());
                total_size = total_size.saturating_sub(file_size);
            }
        }

        Ok(())
    }

    /// Get total size of all cached results in bytes.
    pub fn total_size_bytes(&self) -> Result<u64, std::io::Error> {
        let mut total: u64 = 0;

        if !self.cache_dir.exists() {
            return Ok(0);
        }

        for entry in std::fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            if Self::is_cached_image(&entry.path()) {
                if let Ok(metadata) = entry.metadata() {
                    if metadata.is_file() {
                        total += metadata.len();
                    }
                }
            }
        }

        Ok(total)
    }
}
