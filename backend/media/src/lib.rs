//! Image source for photocritic: PNG/JPEG/WEBP gating and loading.

pub mod mime_detect;
pub mod source;

pub use mime_detect::{format_from_extension, format_from_mime, sniff_format};
pub use source::{image_from_upload, load_image};
