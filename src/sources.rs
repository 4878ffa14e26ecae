//! Registry for source images: uploads and camera captures persisted under
//! the app data directory, plus an LRU cache of decoded rasters so
//! re-opening a crop session on the same photo never decodes twice.

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use image::{DynamicImage, GenericImageView};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editor::raster;

const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tif", "tiff", "gif"];
const DECODED_CACHE_CAPACITY: usize = 8;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read source image: {0}")]
    Io(String),
    #[error("failed to decode source image: {0}")]
    Decode(String),
    #[error("failed to store upload: {0}")]
    UploadWrite(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUpload {
    /// Key accepted by `resolve` and by the editor; also the path the
    /// frontend displays through the asset protocol.
    pub key: String,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadEntry {
    pub key: String,
    pub file_name: String,
}

pub struct SourceLibrary {
    uploads_dir: PathBuf,
    cache: Mutex<LruCache<String, Arc<DynamicImage>>>,
}

impl SourceLibrary {
    pub fn new(uploads_dir: PathBuf) -> Result<Self, SourceError> {
        fs::create_dir_all(&uploads_dir).map_err(|err| SourceError::Io(err.to_string()))?;
        Ok(Self {
            uploads_dir,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(DECODED_CACHE_CAPACITY).expect("cache capacity"),
            )),
        })
    }

    /// Decode a source key into a shared read-only raster. `data:` URLs are
    /// decoded in memory; everything else is treated as a filesystem path.
    pub fn resolve(&self, key: &str) -> Result<Arc<DynamicImage>, SourceError> {
        if let Some(hit) = self.cache.lock().expect("poisoned").get(key) {
            return Ok(hit.clone());
        }

        let decoded = if raster::is_data_url(key) {
            let bytes =
                raster::decode_data_url(key).map_err(|err| SourceError::Decode(err.to_string()))?;
            image::load_from_memory(&bytes).map_err(|err| SourceError::Decode(err.to_string()))?
        } else {
            let path = Path::new(key);
            if !path.exists() {
                return Err(SourceError::NotFound(path.to_path_buf()));
            }
            image::open(path).map_err(|err| SourceError::Decode(err.to_string()))?
        };

        let raster = Arc::new(decoded);
        self.cache
            .lock()
            .expect("poisoned")
            .put(key.to_string(), raster.clone());
        Ok(raster)
    }

    /// Persist an uploaded or camera-captured image, handed over by the
    /// frontend as a data URL, and return the key to open sessions with.
    pub fn store_upload(&self, file_name: &str, data_url: &str) -> Result<StoredUpload, SourceError> {
        let bytes =
            raster::decode_data_url(data_url).map_err(|err| SourceError::Decode(err.to_string()))?;
        let decoded =
            image::load_from_memory(&bytes).map_err(|err| SourceError::Decode(err.to_string()))?;
        let (width, height) = decoded.dimensions();

        let stamped = format!(
            "{}-{:04x}-{}",
            Utc::now().format("%Y%m%d%H%M%S%3f"),
            rand::random::<u16>(),
            sanitize_file_name(file_name),
        );
        let path = self.uploads_dir.join(&stamped);
        fs::write(&path, &bytes).map_err(|err| SourceError::UploadWrite(err.to_string()))?;

        let key = path.to_string_lossy().to_string();
        self.cache
            .lock()
            .expect("poisoned")
            .put(key.clone(), Arc::new(decoded));

        Ok(StoredUpload {
            key,
            file_name: stamped,
            width,
            height,
        })
    }

    /// Stored uploads, newest first (names are timestamp-prefixed).
    pub fn list_uploads(&self) -> Result<Vec<UploadEntry>, SourceError> {
        let mut entries = Vec::new();
        let dir = fs::read_dir(&self.uploads_dir).map_err(|err| SourceError::Io(err.to_string()))?;
        for entry in dir {
            let entry = entry.map_err(|err| SourceError::Io(err.to_string()))?;
            let path = entry.path();
            if !path.is_file() || !is_supported_image(&path) {
                continue;
            }
            let file_name = match path.file_name().and_then(|name| name.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            entries.push(UploadEntry {
                key: path.to_string_lossy().to_string(),
                file_name,
            });
        }
        entries.sort_by(|a, b| b.file_name.cmp(&a.file_name));
        Ok(entries)
    }
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload.png".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    fn sample_data_url(width: u32, height: u32) -> String {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([120, 40, 60, 255]),
        ));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        raster::encode_data_url(&png)
    }

    #[test]
    fn store_upload_persists_and_lists_newest_first() {
        let temp = tempdir().unwrap();
        let library = SourceLibrary::new(temp.path().join("uploads")).unwrap();

        let first = library
            .store_upload("kitchen photo.png", &sample_data_url(12, 8))
            .unwrap();
        assert_eq!(first.width, 12);
        assert_eq!(first.height, 8);
        assert!(Path::new(&first.key).exists());
        assert!(!first.file_name.contains(' '));

        // Stored names are millisecond-stamped; keep the second upload in a
        // later bucket so the ordering assertion is deterministic.
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = library
            .store_upload("later.png", &sample_data_url(4, 4))
            .unwrap();

        let listed = library.list_uploads().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].key, second.key);
        assert_eq!(listed[1].key, first.key);
    }

    #[test]
    fn resolve_caches_decoded_rasters() {
        let temp = tempdir().unwrap();
        let library = SourceLibrary::new(temp.path().join("uploads")).unwrap();
        let stored = library
            .store_upload("cache.png", &sample_data_url(6, 6))
            .unwrap();

        let a = library.resolve(&stored.key).unwrap();
        let b = library.resolve(&stored.key).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn resolve_accepts_data_urls_and_rejects_missing_paths() {
        let temp = tempdir().unwrap();
        let library = SourceLibrary::new(temp.path().join("uploads")).unwrap();

        let inline = library.resolve(&sample_data_url(3, 5)).unwrap();
        assert_eq!(inline.dimensions(), (3, 5));

        let missing = temp.path().join("nope.png");
        assert!(matches!(
            library.resolve(&missing.to_string_lossy()),
            Err(SourceError::NotFound(_))
        ));
    }
}
