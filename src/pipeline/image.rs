//! Image normalisation: any accepted input form → bare base64 + media type.
//!
//! VLM APIs accept images as base64 data-URIs in the request body, so the
//! canonical form kept here is the bare base64 string plus a declared media
//! type; the boundary reassembles the data-URI. No resizing, compression,
//! or content validation happens — a corrupt image is the provider's
//! problem to reject, and it reports that through the normal transport
//! error path.

use crate::error::ExtractError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use tracing::debug;

/// An image heading into the pipeline.
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Raw image bytes (upload buffer, camera frame).
    Bytes(Vec<u8>),
    /// An already-encoded string: either a `data:image/...;base64,` URI or
    /// bare base64.
    Encoded(String),
    /// Path to an image file on disk.
    Path(PathBuf),
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        ImageInput::Bytes(bytes)
    }
}

impl From<&str> for ImageInput {
    fn from(s: &str) -> Self {
        ImageInput::Encoded(s.to_string())
    }
}

impl From<String> for ImageInput {
    fn from(s: String) -> Self {
        ImageInput::Encoded(s)
    }
}

impl From<PathBuf> for ImageInput {
    fn from(p: PathBuf) -> Self {
        ImageInput::Path(p)
    }
}

/// Canonical payload: bare base64 and the media type it claims to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub data: String,
    pub media_type: String,
}

impl ImagePayload {
    /// Reassemble the data-URI form the HTTP boundary embeds in requests.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

static RE_DATA_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:([a-zA-Z0-9.+-]+/[a-zA-Z0-9.+-]+);base64,").unwrap());

/// Normalise any accepted input into an [`ImagePayload`].
pub fn normalize_image(input: ImageInput) -> Result<ImagePayload, ExtractError> {
    match input {
        ImageInput::Bytes(bytes) => {
            if bytes.is_empty() {
                return Err(ExtractError::InvalidImageInput {
                    detail: "image byte buffer is empty".into(),
                });
            }
            let media_type = sniff_media_type(&bytes).to_string();
            let data = STANDARD.encode(&bytes);
            debug!("Encoded {} bytes → {} bytes base64", bytes.len(), data.len());
            Ok(ImagePayload { data, media_type })
        }
        ImageInput::Encoded(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(ExtractError::InvalidImageInput {
                    detail: "encoded image string is empty".into(),
                });
            }
            // A recognised data-URI prefix is stripped and its media type
            // kept; anything else passes through unchanged as bare base64.
            if let Some(caps) = RE_DATA_URI.captures(s) {
                let media_type = caps[1].to_string();
                let data = s[caps[0].len()..].to_string();
                if data.is_empty() {
                    return Err(ExtractError::InvalidImageInput {
                        detail: "data URI has no payload after the base64 marker".into(),
                    });
                }
                Ok(ImagePayload { data, media_type })
            } else {
                Ok(ImagePayload {
                    data: s.to_string(),
                    media_type: "image/jpeg".to_string(),
                })
            }
        }
        ImageInput::Path(path) => {
            let bytes = std::fs::read(&path).map_err(|source| ExtractError::ImageRead {
                path: path.clone(),
                source,
            })?;
            let media_type = media_type_for_path(&path)
                .unwrap_or_else(|| sniff_media_type(&bytes))
                .to_string();
            let data = STANDARD.encode(&bytes);
            debug!(
                "Read '{}' ({} bytes) → {} bytes base64",
                path.display(),
                bytes.len(),
                data.len()
            );
            Ok(ImagePayload { data, media_type })
        }
    }
}

/// Media type from the file extension, when recognised.
fn media_type_for_path(path: &std::path::Path) -> Option<&'static str> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => Some("image/png"),
        Some("jpg") | Some("jpeg") => Some("image/jpeg"),
        Some("webp") => Some("image/webp"),
        Some("gif") => Some("image/gif"),
        _ => None,
    }
}

/// Media type from magic bytes. Photographed documents are JPEG in
/// practice, so that is the fallback declaration.
fn sniff_media_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn bytes_are_encoded_and_sniffed() {
        let payload = normalize_image(ImageInput::Bytes(PNG_MAGIC.to_vec())).unwrap();
        assert_eq!(payload.media_type, "image/png");
        let decoded = STANDARD.decode(&payload.data).expect("valid base64");
        assert_eq!(decoded, PNG_MAGIC);
    }

    #[test]
    fn data_uri_prefix_is_stripped_and_media_type_kept() {
        let payload =
            normalize_image(ImageInput::Encoded("data:image/png;base64,QUJD".into())).unwrap();
        assert_eq!(payload.data, "QUJD");
        assert_eq!(payload.media_type, "image/png");
    }

    #[test]
    fn bare_base64_passes_through_unchanged() {
        let payload = normalize_image(ImageInput::Encoded("QUJDREVG".into())).unwrap();
        assert_eq!(payload.data, "QUJDREVG");
        assert_eq!(payload.media_type, "image/jpeg");
    }

    #[test]
    fn unreadable_path_is_an_image_read_error() {
        let err = normalize_image(ImageInput::Path(PathBuf::from(
            "/definitely/not/a/real/receipt.jpg",
        )))
        .unwrap_err();
        assert!(matches!(err, ExtractError::ImageRead { .. }));
    }

    #[test]
    fn file_read_uses_extension_for_media_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, b"\xFF\xD8\xFFnot-actually-jpeg").unwrap();
        // Extension wins over magic bytes for the declared type.
        let payload = normalize_image(ImageInput::Path(path)).unwrap();
        assert_eq!(payload.media_type, "image/png");
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert!(matches!(
            normalize_image(ImageInput::Bytes(vec![])),
            Err(ExtractError::InvalidImageInput { .. })
        ));
        assert!(matches!(
            normalize_image(ImageInput::Encoded("   ".into())),
            Err(ExtractError::InvalidImageInput { .. })
        ));
    }

    #[test]
    fn data_uri_round_trips_through_payload() {
        let payload = ImagePayload {
            data: "QUJD".into(),
            media_type: "image/webp".into(),
        };
        assert_eq!(payload.to_data_uri(), "data:image/webp;base64,QUJD");
    }
}
