//! Inlining uploaded files into document records.
//!
//! Files are stored as `data:<mime>;base64,<payload>` strings. Large textual
//! files first pass through a lossy whitespace collapse. The capacity ceiling
//! applies to the encoded string, so the effective raw limit is roughly three
//! quarters of [`MAX_ENCODED_LEN`].

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Attachment, AttachmentPayload};

/// Ceiling on the encoded data URI length (5 MiB).
pub const MAX_ENCODED_LEN: usize = 5 * 1024 * 1024;
/// Raw size above which textual files are whitespace-collapsed (1 MiB).
pub const COMPRESSION_THRESHOLD: u64 = 1024 * 1024;

const FALLBACK_MIME: &str = "application/octet-stream";
const TEXTUAL_MIME_TYPES: &[&str] = &[
    "application/json",
    "application/xml",
    "application/javascript",
    "image/svg+xml",
];

/// Failures raised while inlining or decoding a file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestionError {
    /// The encoded payload is larger than the local slot accepts.
    #[error(
        "file {file_name} is too large to store locally: encoded size {encoded_len} bytes exceeds the {limit} byte (5 MiB) limit"
    )]
    CapacityExceeded {
        /// Offending file.
        file_name: String,
        /// Encoded length that was rejected.
        encoded_len: usize,
        /// Configured ceiling.
        limit: usize,
    },
    /// The stored string is not a base64 data URI.
    #[error("stored payload is not a base64 data URI: {message}")]
    MalformedDataUri {
        /// Parse failure description.
        message: String,
    },
}

/// A file handed to the portal for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Original file name including extension.
    pub file_name: String,
    /// Declared MIME type; may be empty.
    pub mime_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Raw byte size.
    pub fn size(&self) -> u64 {
        u64::try_from(self.bytes.len()).unwrap_or(u64::MAX)
    }

    /// Declared MIME type, or `application/octet-stream` when blank.
    pub fn effective_mime_type(&self) -> &str {
        let trimmed = self.mime_type.trim();
        if trimmed.is_empty() {
            FALLBACK_MIME
        } else {
            trimmed
        }
    }
}

/// Result of inlining a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedFile {
    /// Encoded data URI.
    pub data_uri: String,
    /// Whether the whitespace collapse was applied.
    pub compressed: bool,
    /// Raw size before any transform.
    pub original_size: u64,
}

impl IngestedFile {
    /// Build the attachment describing `upload` stored locally.
    pub fn into_attachment(self, upload: &FileUpload) -> Attachment {
        Attachment {
            name: upload.file_name.clone(),
            mime_type: upload.effective_mime_type().to_owned(),
            size: self.original_size,
            payload: AttachmentPayload::Local {
                data: self.data_uri,
                compressed: self.compressed,
                original_size: self.compressed.then_some(self.original_size),
            },
        }
    }
}

/// Encode `upload` for inline storage.
///
/// # Errors
///
/// Returns [`IngestionError::CapacityExceeded`] when the encoded payload is
/// longer than [`MAX_ENCODED_LEN`].
///
/// # Examples
/// ```
/// use portal::domain::{FileUpload, ingest_local};
///
/// let upload = FileUpload {
///     file_name: "hello.txt".into(),
///     mime_type: "text/plain".into(),
///     bytes: b"hi".to_vec(),
/// };
/// let ingested = ingest_local(&upload).unwrap();
/// assert_eq!(ingested.data_uri, "data:text/plain;base64,aGk=");
/// assert!(!ingested.compressed);
/// ```
pub fn ingest_local(upload: &FileUpload) -> Result<IngestedFile, IngestionError> {
    ingest_with_limits(upload, COMPRESSION_THRESHOLD, MAX_ENCODED_LEN)
}

fn ingest_with_limits(
    upload: &FileUpload,
    compression_threshold: u64,
    max_encoded_len: usize,
) -> Result<IngestedFile, IngestionError> {
    let original_size = upload.size();
    let mime_type = upload.effective_mime_type();

    let collapsed = if original_size > compression_threshold && is_textual(mime_type) {
        collapse_whitespace(&upload.bytes)
    } else {
        None
    };
    let compressed = collapsed.is_some();
    let payload = collapsed.as_deref().unwrap_or(upload.bytes.as_slice());

    let data_uri = format!("data:{mime_type};base64,{}", STANDARD.encode(payload));
    if data_uri.len() > max_encoded_len {
        return Err(IngestionError::CapacityExceeded {
            file_name: upload.file_name.clone(),
            encoded_len: data_uri.len(),
            limit: max_encoded_len,
        });
    }

    debug!(
        file_name = %upload.file_name,
        original_size,
        encoded_len = data_uri.len(),
        compressed,
        "file inlined"
    );
    Ok(IngestedFile {
        data_uri,
        compressed,
        original_size,
    })
}

/// Split a data URI into its MIME type and decoded bytes.
///
/// # Errors
///
/// Returns [`IngestionError::MalformedDataUri`] when the string lacks the
/// `data:<mime>;base64,` prefix or the payload is not valid base64.
pub fn decode_data_uri(data_uri: &str) -> Result<(String, Vec<u8>), IngestionError> {
    let rest = data_uri
        .strip_prefix("data:")
        .ok_or_else(|| malformed("missing `data:` prefix"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| malformed("missing `,` separator"))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| malformed("only base64 payloads are supported"))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|err| malformed(err.to_string()))?;
    Ok((mime_type.to_owned(), bytes))
}

fn malformed(message: impl Into<String>) -> IngestionError {
    IngestionError::MalformedDataUri {
        message: message.into(),
    }
}

fn is_textual(mime_type: &str) -> bool {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("text/") || TEXTUAL_MIME_TYPES.contains(&essence.as_str())
}

/// Collapse whitespace runs to single spaces. `None` when the bytes are not
/// UTF-8; callers then keep the raw payload.
fn collapse_whitespace(bytes: &[u8]) -> Option<Vec<u8>> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(
            text.split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .into_bytes(),
        ),
        Err(err) => {
            debug!(error = %err, "whitespace collapse skipped for non UTF-8 payload");
            None
        }
    }
}
