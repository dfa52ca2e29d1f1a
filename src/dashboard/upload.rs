//! Profile picture upload: validation and local preview.

use std::fmt;

use base64::Engine;
use image::ImageFormat;

/// Largest accepted avatar, in bytes.
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

pub const ACCEPTED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// A file picked by the user.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    /// Type announced by the browser, if any
    pub declared_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        UploadedFile { name: name.into(), declared_type: None, bytes }
    }

    /// The media type, sniffed from the content. Content that isn't recognized falls back to
    /// the declared type, and then to the file extension.
    pub fn media_type(&self) -> Option<String> {
        if let Ok(format) = image::guess_format(&self.bytes) {
            return Some(format_media_type(format).to_string());
        }
        if let Some(declared) = self.declared_type.as_ref().filter(|t| !t.is_empty()) {
            return Some(declared.to_ascii_lowercase());
        }
        mime_guess::from_path(&self.name).first().map(|m| m.essence_str().to_string())
    }
}

fn format_media_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Png => "image/png",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        // Recognized, but not one we accept
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRejection {
    InvalidType,
    TooLarge,
}

impl fmt::Display for UploadRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UploadRejection::InvalidType => "Please upload a valid image file (JPG, PNG, GIF or WebP).",
            UploadRejection::TooLarge => "File size must be less than 2MB.",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Accepted { media_type: String, data_url: String },
    Rejected(UploadRejection),
}

/// Checks type first, then size.
pub fn validate(file: &UploadedFile) -> Result<String, UploadRejection> {
    let media_type = file.media_type()
        .filter(|t| ACCEPTED_TYPES.contains(&t.as_str()))
        .ok_or(UploadRejection::InvalidType)?;

    if file.bytes.len() > MAX_AVATAR_BYTES {
        return Err(UploadRejection::TooLarge);
    }
    Ok(media_type)
}

pub fn data_url(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, base64::engine::general_purpose::STANDARD.encode(bytes))
}

#[cfg(test)]
mod test {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_type_is_sniffed() {
        let png = UploadedFile::new("avatar.jpg", PNG_HEADER.to_vec());
        assert_eq!(Some("image/png".to_string()), png.media_type());

        let text = UploadedFile::new("notes.txt", b"hello".to_vec());
        assert_eq!(Err(UploadRejection::InvalidType), validate(&text));

        // Unrecognized content falls back to the extension
        let webp = UploadedFile::new("me.webp", b"????".to_vec());
        assert_eq!(Ok("image/webp".to_string()), validate(&webp));
    }

    #[test]
    fn test_size_limit() {
        let mut bytes = PNG_HEADER.to_vec();
        bytes.resize(MAX_AVATAR_BYTES, 0);
        assert!(validate(&UploadedFile::new("a.png", bytes.clone())).is_ok());

        bytes.push(0);
        let err = validate(&UploadedFile::new("a.png", bytes)).unwrap_err();
        assert_eq!("File size must be less than 2MB.", err.to_string());
    }

    #[test]
    fn test_data_url() {
        assert_eq!("data:image/gif;base64,R0lGODlh", data_url("image/gif", b"GIF89a"));
    }
}
