//! Image type detection.
//!
//! Only PNG, JPEG and WEBP are accepted; everything else is rejected before
//! any bytes leave the machine.

use std::path::Path;

use photocritic_core::ImageFormat;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Classify by file extension.
pub fn format_from_extension(path: &Path) -> Option<ImageFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "png"          => Some(ImageFormat::Png),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "webp"         => Some(ImageFormat::Webp),
        _              => None,
    }
}

/// Classify by declared MIME type; parameters such as `; charset=` are ignored.
pub fn format_from_mime(mime: &str) -> Option<ImageFormat> {
    let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
    match essence.as_str() {
        "image/png"                => Some(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        "image/webp"               => Some(ImageFormat::Webp),
        _                          => None,
    }
}

/// Classify by magic bytes.
pub fn sniff_format(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(PNG_SIGNATURE) {
        Some(ImageFormat::Png)
    } else if data.starts_with(JPEG_SIGNATURE) {
        Some(ImageFormat::Jpeg)
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some(ImageFormat::Webp)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_extensions_case_insensitively() {
        assert_eq!(format_from_extension(&PathBuf::from("me.JPG")), Some(ImageFormat::Jpeg));
        assert_eq!(format_from_extension(&PathBuf::from("me.webp")), Some(ImageFormat::Webp));
        assert_eq!(format_from_extension(&PathBuf::from("me.gif")), None);
        assert_eq!(format_from_extension(&PathBuf::from("noext")), None);
    }

    #[test]
    fn detects_mime_with_parameters() {
        assert_eq!(format_from_mime("image/png; q=1"), Some(ImageFormat::Png));
        assert_eq!(format_from_mime("IMAGE/JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(format_from_mime("image/gif"), None);
    }

    #[test]
    fn sniffs_signatures() {
        assert_eq!(sniff_format(b"\x89PNG\r\n\x1a\nrest"), Some(ImageFormat::Png));
        assert_eq!(sniff_format(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(sniff_format(b"RIFF\x10\x00\x00\x00WEBPVP8 "), Some(ImageFormat::Webp));
        assert_eq!(sniff_format(b"GIF89a"), None);
        assert_eq!(sniff_format(b""), None);
    }
}
