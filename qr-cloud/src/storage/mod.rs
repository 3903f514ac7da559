//! File-system image store
//!
//! Uploads are content-addressed: `{root}/{restaurant_id}/{kind}/{sha256}.{ext}`.
//! Uploading the same bytes twice yields the same URL.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use sha2::{Digest, Sha256};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::util::random_token;

/// Accepted extensions; `jpeg` is stored as `jpg`
const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Logo,
    Menu,
}

impl UploadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadKind::Logo => "logo",
            UploadKind::Menu => "menu",
        }
    }
}

impl FromStr for UploadKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logo" => Ok(UploadKind::Logo),
            "menu" => Ok(UploadKind::Menu),
            other => Err(AppError::invalid_request(format!(
                "Unknown upload kind: {other}"
            ))),
        }
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredImage {
    pub url: String,
    pub hash: String,
    pub size: usize,
    pub format: String,
}

#[derive(Clone)]
pub struct ImageStore {
    root: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn ensure_root(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Check size, extension and content. Returns the normalized extension.
    pub fn validate(&self, data: &[u8], filename: &str) -> AppResult<&'static str> {
        if data.is_empty() {
            return Err(AppError::new(ErrorCode::EmptyFile));
        }
        if data.len() > self.max_bytes {
            return Err(AppError::with_message(
                ErrorCode::FileTooLarge,
                format!(
                    "File too large: {} bytes (max {})",
                    data.len(),
                    self.max_bytes
                ),
            ));
        }

        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::InvalidFileExtension,
                    format!("Invalid file extension for: {filename}"),
                )
            })?;
        if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
            return Err(AppError::with_message(
                ErrorCode::UnsupportedFileFormat,
                format!(
                    "Unsupported format '{ext}'. Supported: {}",
                    SUPPORTED_FORMATS.join(", ")
                ),
            ));
        }

        // The bytes must really be one of the accepted formats
        let detected = image::guess_format(data).map_err(|_| {
            AppError::with_message(ErrorCode::InvalidImageFile, "Unrecognized image data")
        })?;
        let detected_ext = match detected {
            image::ImageFormat::Png => "png",
            image::ImageFormat::Jpeg => "jpg",
            image::ImageFormat::WebP => "webp",
            other => {
                return Err(AppError::with_message(
                    ErrorCode::UnsupportedFileFormat,
                    format!("Unsupported image format: {other:?}"),
                ));
            }
        };
        if let Err(e) = image::load_from_memory_with_format(data, detected) {
            return Err(AppError::with_message(
                ErrorCode::InvalidImageFile,
                format!("Invalid image file ({ext}): {e}"),
            ));
        }
        Ok(detected_ext)
    }

    /// Write validated bytes, returning the public URL
    pub async fn store(
        &self,
        restaurant_id: i64,
        kind: UploadKind,
        data: &[u8],
        ext: &str,
    ) -> AppResult<StoredImage> {
        let hash = calculate_hash(data);
        let dir = self
            .root
            .join(restaurant_id.to_string())
            .join(kind.as_str());
        let file_name = format!("{hash}.{ext}");
        let path = dir.join(&file_name);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(path = %path.display(), "Upload already stored");
        } else {
            tokio::fs::create_dir_all(&dir).await.map_err(storage_error)?;
            // Write then rename so readers never see a partial file. Each
            // writer gets its own temp file; identical uploads racing here
            // rename the same bytes onto the same name.
            let tmp = dir.join(format!(".{file_name}.{}.tmp", random_token(12)));
            tokio::fs::write(&tmp, data).await.map_err(storage_error)?;
            tokio::fs::rename(&tmp, &path).await.map_err(storage_error)?;
            tracing::info!(restaurant_id, kind = kind.as_str(), hash = %hash, "Image stored");
        }

        Ok(StoredImage {
            url: format!("/uploads/{restaurant_id}/{}/{file_name}", kind.as_str()),
            hash,
            size: data.len(),
            format: ext.to_string(),
        })
    }

    /// Map a request path onto the store. Anything but `{sha256}.{ext}` is rejected.
    pub fn resolve(&self, restaurant_id: i64, kind: &str, file: &str) -> AppResult<PathBuf> {
        let kind: UploadKind = kind.parse().map_err(|_| invalid_path(file))?;
        if !is_stored_file_name(file) {
            return Err(invalid_path(file));
        }
        Ok(self
            .root
            .join(restaurant_id.to_string())
            .join(kind.as_str())
            .join(file))
    }

    /// Read a stored file and its content type
    pub async fn read(
        &self,
        restaurant_id: i64,
        kind: &str,
        file: &str,
    ) -> AppResult<(Vec<u8>, String)> {
        let path = self.resolve(restaurant_id, kind, file)?;
        let data = match tokio::fs::read(&path).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::not_found("File"));
            }
            Err(e) => return Err(storage_error(e)),
        };
        let mime = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok((data, mime))
    }
}

fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn is_stored_file_name(file: &str) -> bool {
    let Some((stem, ext)) = file.split_once('.') else {
        return false;
    };
    stem.len() == 64
        && stem.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        && SUPPORTED_FORMATS.contains(&ext)
}

fn invalid_path(file: &str) -> AppError {
    AppError::with_message(ErrorCode::InvalidFilePath, format!("Invalid file path: {file}"))
}

fn storage_error(e: std::io::Error) -> AppError {
    tracing::error!("Image storage error: {e}");
    AppError::new(ErrorCode::FileStorageFailed)
}

#[cfg(test)]
pub(crate) fn tiny_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 30, 30]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> ImageStore {
        ImageStore::new(dir.path(), 1024 * 1024)
    }

    #[test]
    fn test_validate_accepts_png() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store(&dir).validate(&tiny_png(), "Logo.PNG").unwrap(), "png");
    }

    #[test]
    fn test_validate_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);
        assert_eq!(s.validate(&[], "a.png").unwrap_err().code, ErrorCode::EmptyFile);
        assert_eq!(
            s.validate(b"%PDF-1.7", "menu.pdf").unwrap_err().code,
            ErrorCode::UnsupportedFileFormat
        );
        assert_eq!(
            s.validate(b"plain text", "fake.png").unwrap_err().code,
            ErrorCode::InvalidImageFile
        );
        assert_eq!(
            s.validate(&tiny_png(), "noext").unwrap_err().code,
            ErrorCode::InvalidFileExtension
        );

        let small = ImageStore::new(dir.path(), 10);
        let err = small.validate(&tiny_png(), "a.png").unwrap_err();
        assert_eq!(err.code, ErrorCode::FileTooLarge);
        assert_eq!(err.http_status(), http::StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_store_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);
        let png = tiny_png();

        let stored = s.store(7, UploadKind::Menu, &png, "png").await.unwrap();
        assert_eq!(stored.url, format!("/uploads/7/menu/{}.png", stored.hash));

        // Same content, same address
        let again = s.store(7, UploadKind::Menu, &png, "png").await.unwrap();
        assert_eq!(again.url, stored.url);

        let file = format!("{}.png", stored.hash);
        let (data, mime) = s.read(7, "menu", &file).await.unwrap();
        assert_eq!(data, png);
        assert_eq!(mime, "image/png");

        // Other restaurants do not see it
        assert_eq!(
            s.read(8, "menu", &file).await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_concurrent_identical_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);
        let png = tiny_png();

        let results = futures::future::join_all(
            (0..8).map(|_| s.store(7, UploadKind::Menu, &png, "png")),
        )
        .await;
        let urls: Vec<String> = results.into_iter().map(|r| r.unwrap().url).collect();
        assert!(urls.iter().all(|u| *u == urls[0]));

        // One stored file and no temp files left behind
        let mut entries = tokio::fs::read_dir(dir.path().join("7").join("menu")).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names.len(), 1);
        assert!(!names[0].starts_with('.'));
    }

    #[test]
    fn test_path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);
        for bad in ["../../etc/passwd", "..%2F..%2Fsecret.png", "abc.png", ".hidden"] {
            assert_eq!(
                s.resolve(1, "menu", bad).unwrap_err().code,
                ErrorCode::InvalidFilePath,
                "{bad}"
            );
        }
        let good = format!("{}.webp", "a".repeat(64));
        assert_eq!(
            s.resolve(1, "../menu", &good).unwrap_err().code,
            ErrorCode::InvalidFilePath
        );
        assert!(s.resolve(1, "logo", &good).is_ok());
    }
}
