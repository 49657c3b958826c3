//! Image encoding for transport
//!
//! Turns a user-selected file into a base64 payload plus a displayable
//! `data:` URI. The media kind is checked before any bytes are read;
//! anything that is not `image/*` is rejected up front.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Image encoder errors
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Declared media kind is not an image
    #[error("Unsupported media kind: {0}")]
    UnsupportedMediaKind(String),

    /// File could not be read
    #[error("Failed to read image file: {0}")]
    Read(#[from] std::io::Error),
}

/// Where a selected file's bytes live
#[derive(Debug, Clone)]
enum FileSource {
    Path(PathBuf),
    Memory(Vec<u8>),
}

/// A file chosen by the user, not yet read
#[derive(Debug, Clone)]
pub struct SelectedFile {
    /// Display name (file name without directories)
    pub name: String,
    /// Declared media type, e.g. `image/jpeg`
    pub media_type: String,
    source: FileSource,
}

impl SelectedFile {
    /// Select a file on disk; the media type is guessed from its extension
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            name,
            media_type,
            source: FileSource::Path(path.to_path_buf()),
        }
    }

    /// Select in-memory bytes with an explicitly declared media type
    pub fn from_bytes(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            source: FileSource::Memory(bytes),
        }
    }
}

/// Transport-ready image
///
/// Immutable once created; dropped when its workflow resets or another
/// file is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedImage {
    /// Normalised media type, e.g. `image/png`
    pub mime_kind: String,
    /// Standard base64 of the file bytes
    #[serde(skip)]
    pub payload: String,
    /// `data:<mime>;base64,<payload>` for previews
    pub preview_uri: String,
    /// Original file name, for display
    pub file_name: String,
    /// Original file size in bytes, for display
    pub size_bytes: u64,
}

/// True when `media_type` names an image kind (`image/<subtype>`)
pub fn is_image_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.strip_prefix("image/") {
        Some(subtype) => !subtype.is_empty(),
        None => false,
    }
}

/// Encode a selected file
///
/// Deterministic: identical bytes always give an identical payload.
pub async fn encode(file: &SelectedFile) -> Result<EncodedImage, EncodeError> {
    if !is_image_media_type(&file.media_type) {
        return Err(EncodeError::UnsupportedMediaKind(file.media_type.clone()));
    }

    let bytes = match &file.source {
        FileSource::Path(path) => tokio::fs::read(path).await?,
        FileSource::Memory(bytes) => bytes.clone(),
    };

    let mime_kind = file
        .media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    let payload = STANDARD.encode(&bytes);
    let preview_uri = format!("data:{};base64,{}", mime_kind, payload);

    debug!(
        file = %file.name,
        mime = %mime_kind,
        size_bytes = bytes.len(),
        "Encoded image"
    );

    Ok(EncodedImage {
        mime_kind,
        payload,
        preview_uri,
        file_name: file.name.clone(),
        size_bytes: bytes.len() as u64,
    })
}
