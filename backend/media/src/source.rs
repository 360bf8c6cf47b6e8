//! Image source: turns a file on disk or an uploaded body into a verified [`ImageInput`].

use std::path::Path;

use bytes::Bytes;
use photocritic_core::{ImageError, ImageFormat, ImageInput};
use tracing::debug;

use crate::mime_detect::{format_from_extension, format_from_mime, sniff_format};

/// Read and verify an image file.
pub async fn load_image(path: &Path, max_bytes: usize) -> Result<ImageInput, ImageError> {
    let declared = format_from_extension(path).ok_or_else(|| {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_else(|| "file without extension".to_string());
        ImageError::Unsupported(ext)
    })?;

    let io_err = |source| ImageError::Io {
        path: path.display().to_string(),
        source,
    };
    let size = tokio::fs::metadata(path).await.map_err(io_err)?.len();
    if size > max_bytes as u64 {
        return Err(ImageError::TooLarge {
            size: usize::try_from(size).unwrap_or(usize::MAX),
            limit: max_bytes,
        });
    }
    let data = tokio::fs::read(path).await.map_err(io_err)?;

    debug!(path = %path.display(), bytes = data.len(), format = %declared, "Loaded image");
    verify(Some(declared), Bytes::from(data), max_bytes)
}

/// Verify an uploaded body with an optional declared `Content-Type`.
///
/// A missing or `application/octet-stream` type leaves the decision to the
/// file signature.
pub fn image_from_upload(
    data: Bytes,
    content_type: Option<&str>,
    max_bytes: usize,
) -> Result<ImageInput, ImageError> {
    let declared = match content_type.map(str::trim) {
        None | Some("") => None,
        Some(ct) if ct.starts_with("application/octet-stream") => None,
        Some(ct) => Some(format_from_mime(ct).ok_or_else(|| ImageError::Unsupported(ct.to_string()))?),
    };
    verify(declared, data, max_bytes)
}

fn verify(
    declared: Option<ImageFormat>,
    data: Bytes,
    max_bytes: usize,
) -> Result<ImageInput, ImageError> {
    if data.is_empty() {
        return Err(ImageError::NoImage);
    }
    if data.len() > max_bytes {
        return Err(ImageError::TooLarge {
            size: data.len(),
            limit: max_bytes,
        });
    }
    let format = match (declared, sniff_format(&data)) {
        (Some(declared), Some(sniffed)) if declared == sniffed => declared,
        (Some(declared), _) => return Err(ImageError::SignatureMismatch { declared }),
        (None, Some(sniffed)) => sniffed,
        (None, None) => return Err(ImageError::Unsupported("unrecognized content".to_string())),
    };
    Ok(ImageInput::new(format, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    async fn write_temp(name: &str, data: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("photocritic-media-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join(name);
        tokio::fs::write(&path, data).await.unwrap();
        path
    }

    #[tokio::test]
    async fn loads_png_file() {
        let path = write_temp("me.png", PNG).await;
        let image = load_image(&path, 1024).await.unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.len(), PNG.len());
    }

    #[tokio::test]
    async fn rejects_unsupported_extension() {
        let path = write_temp("me.gif", b"GIF89a").await;
        let err = load_image(&path, 1024).await.unwrap_err();
        assert!(matches!(err, ImageError::Unsupported(ext) if ext == ".gif"));
    }

    #[tokio::test]
    async fn rejects_renamed_file() {
        let path = write_temp("me.png", JPEG).await;
        let err = load_image(&path, 1024).await.unwrap_err();
        assert!(matches!(err, ImageError::SignatureMismatch { declared: ImageFormat::Png }));
    }

    #[tokio::test]
    async fn rejects_oversized_file() {
        let path = write_temp("me.jpg", JPEG).await;
        let err = load_image(&path, 4).await.unwrap_err();
        assert!(matches!(err, ImageError::TooLarge { size: 6, limit: 4 }));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = load_image(Path::new("/nonexistent/photocritic/me.jpg"), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::Io { .. }));
    }

    #[test]
    fn empty_upload_means_no_image() {
        let err = image_from_upload(Bytes::new(), Some("image/png"), 1024).unwrap_err();
        assert!(matches!(err, ImageError::NoImage));
    }

    #[test]
    fn upload_without_type_is_sniffed() {
        let image = image_from_upload(Bytes::from_static(JPEG), None, 1024).unwrap();
        assert_eq!(image.format, ImageFormat::Jpeg);
        let image =
            image_from_upload(Bytes::from_static(PNG), Some("application/octet-stream"), 1024)
                .unwrap();
        assert_eq!(image.format, ImageFormat::Png);
    }

    #[test]
    fn upload_with_unsupported_type_is_rejected() {
        let err = image_from_upload(Bytes::from_static(PNG), Some("image/gif"), 1024).unwrap_err();
        assert!(matches!(err, ImageError::Unsupported(ct) if ct == "image/gif"));
    }
}
