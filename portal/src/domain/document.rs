//! Document records and their attachment payloads.
//!
//! The persisted JSON shape is the wire contract of the `documents` slot:
//! camelCase fields, `createdAt` as `YYYY-MM-DD`, and an optional `file`
//! object whose `storage` tag selects exactly one payload variant.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 8;

/// Validation failures for document inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentValidationError {
    /// Identifier was blank.
    #[error("document id must not be empty")]
    EmptyId,
    /// Title was blank once trimmed.
    #[error("document title must not be empty")]
    EmptyTitle,
}

/// Identifier of a document within the collection.
///
/// Generated ids combine the creation instant in milliseconds with a random
/// base36 suffix. Uniqueness is checked by nobody after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(pub(crate) String);

impl DocumentId {
    /// Validate and wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, DocumentValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DocumentValidationError::EmptyId);
        }
        Ok(Self(id))
    }

    /// Generate a fresh identifier for `now`.
    pub fn generate(now: DateTime<Utc>, rng: &mut impl Rng) -> Self {
        Self(format!(
            "{}-{}",
            now.timestamp_millis(),
            base36_suffix(rng, ID_SUFFIX_LEN)
        ))
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DocumentId> for String {
    fn from(value: DocumentId) -> Self {
        value.0
    }
}

impl TryFrom<String> for DocumentId {
    type Error = DocumentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Random lowercase base36 string of `len` characters.
pub(crate) fn base36_suffix(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| {
            let index = rng.gen_range(0..BASE36.len());
            BASE36.get(index).copied().map_or('0', char::from)
        })
        .collect()
}

/// Where an attachment's bytes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Inlined into the persisted record as a data URI.
    Local,
    /// Uploaded to the remote object store.
    RemoteObjectStore,
    /// Static file shipped with the application.
    BundledAsset,
}

impl StorageKind {
    /// Wire name used in the `storage` tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::RemoteObjectStore => "remote-object-store",
            Self::BundledAsset => "bundled-asset",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage-specific attachment fields. Exactly one variant applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "storage", rename_all = "kebab-case")]
pub enum AttachmentPayload {
    /// Bytes inlined as a `data:` URI.
    Local {
        /// Encoded payload, `data:<mime>;base64,<bytes>`.
        data: String,
        /// Whether the whitespace-collapsing transform was applied.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        compressed: bool,
        /// Byte size before the transform, recorded when `compressed`.
        #[serde(
            rename = "originalSize",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        original_size: Option<u64>,
    },
    /// Object stored in the remote bucket.
    RemoteObjectStore {
        /// Object key within the bucket.
        path: String,
        /// Public URL derived from the key.
        url: String,
    },
    /// Static asset bundled with the application.
    BundledAsset {
        /// Asset path.
        path: String,
    },
}

impl AttachmentPayload {
    /// Storage kind of this payload.
    pub const fn kind(&self) -> StorageKind {
        match self {
            Self::Local { .. } => StorageKind::Local,
            Self::RemoteObjectStore { .. } => StorageKind::RemoteObjectStore,
            Self::BundledAsset { .. } => StorageKind::BundledAsset,
        }
    }
}

/// File attached to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Original file name.
    pub name: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// Raw byte size of the uploaded file.
    pub size: u64,
    /// Storage-specific fields.
    #[serde(flatten)]
    pub payload: AttachmentPayload,
}

impl Attachment {
    /// Storage kind of the payload.
    pub const fn storage_kind(&self) -> StorageKind {
        self.payload.kind()
    }

    /// Remote object key when the payload lives in the object store.
    pub fn remote_path(&self) -> Option<&str> {
        match &self.payload {
            AttachmentPayload::RemoteObjectStore { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }
}

/// Persisted document record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Collection-unique identifier.
    pub id: DocumentId,
    /// Display title.
    pub title: String,
    /// Free-text body.
    pub content: String,
    /// Creation date.
    pub created_at: NaiveDate,
    /// Optional attached file.
    #[serde(rename = "file", default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

/// Document contents before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDraft {
    title: String,
    content: String,
    created_at: Option<NaiveDate>,
    attachment: Option<Attachment>,
}

impl DocumentDraft {
    /// Start a draft with a non-blank title.
    ///
    /// # Examples
    /// ```
    /// use portal::domain::DocumentDraft;
    ///
    /// let draft = DocumentDraft::new("Report", "Q1 results").unwrap();
    /// assert_eq!(draft.title(), "Report");
    /// assert!(DocumentDraft::new("  ", "").is_err());
    /// ```
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, DocumentValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DocumentValidationError::EmptyTitle);
        }
        Ok(Self {
            title,
            content: content.into(),
            created_at: None,
            attachment: None,
        })
    }

    /// Use an explicit creation date instead of today.
    #[must_use]
    pub fn with_created_at(mut self, created_at: NaiveDate) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Attach a stored file.
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Draft title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Caller-supplied creation date, if any.
    pub fn created_at(&self) -> Option<NaiveDate> {
        self.created_at
    }

    /// Finalise into a [`Document`], defaulting the date to `today`.
    pub fn into_document(self, id: DocumentId, today: NaiveDate) -> Document {
        Document {
            id,
            title: self.title,
            content: self.content,
            created_at: self.created_at.unwrap_or(today),
            attachment: self.attachment,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Serialisation contract of the persisted slot.

    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rstest::rstest;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[rstest]
    fn generated_ids_embed_millis_and_suffix() {
        let now = Utc
            .with_ymd_and_hms(2026, 10, 19, 8, 30, 0)
            .single()
            .expect("valid instant");
        let mut rng = SmallRng::seed_from_u64(7);
        let id = DocumentId::generate(now, &mut rng);
        let (millis, suffix) = id.as_ref().split_once('-').expect("dash separator");
        assert_eq!(millis, now.timestamp_millis().to_string());
        assert_eq!(suffix.len(), ID_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[rstest]
    fn consecutive_ids_differ() {
        let now = Utc::now();
        let mut rng = SmallRng::seed_from_u64(1);
        let first = DocumentId::generate(now, &mut rng);
        let second = DocumentId::generate(now, &mut rng);
        assert_ne!(first, second);
    }

    #[rstest]
    fn local_payload_uses_storage_tag() {
        let document = Document {
            id: DocumentId::new("doc-1").expect("id"),
            title: "Notes".to_owned(),
            content: "body".to_owned(),
            created_at: date(2026, 1, 2),
            attachment: Some(Attachment {
                name: "notes.txt".to_owned(),
                mime_type: "text/plain".to_owned(),
                size: 2_000_000,
                payload: AttachmentPayload::Local {
                    data: "data:text/plain;base64,aGk=".to_owned(),
                    compressed: true,
                    original_size: Some(2_000_000),
                },
            }),
        };

        let value = serde_json::to_value(&document).expect("serialises");
        assert_eq!(
            value,
            json!({
                "id": "doc-1",
                "title": "Notes",
                "content": "body",
                "createdAt": "2026-01-02",
                "file": {
                    "name": "notes.txt",
                    "mimeType": "text/plain",
                    "size": 2_000_000,
                    "storage": "local",
                    "data": "data:text/plain;base64,aGk=",
                    "compressed": true,
                    "originalSize": 2_000_000
                }
            })
        );
    }

    #[rstest]
    fn remote_payload_round_trips_from_json() {
        let raw = json!({
            "id": "doc-2",
            "title": "Scan",
            "content": "",
            "createdAt": "2025-12-31",
            "file": {
                "name": "scan.pdf",
                "mimeType": "application/pdf",
                "size": 42,
                "storage": "remote-object-store",
                "path": "1700000000000_abc.pdf",
                "url": "https://example.invalid/storage/v1/object/public/document-files/1700000000000_abc.pdf"
            }
        });
        let document: Document = serde_json::from_value(raw).expect("decodes");
        let attachment = document.attachment.expect("attachment present");
        assert_eq!(attachment.storage_kind(), StorageKind::RemoteObjectStore);
        assert_eq!(attachment.remote_path(), Some("1700000000000_abc.pdf"));
    }

    #[rstest]
    fn documents_without_file_omit_the_field() {
        let document = DocumentDraft::new("Report", "Q1 results")
            .expect("draft")
            .into_document(DocumentId::new("x").expect("id"), date(2026, 10, 19));
        let value = serde_json::to_value(&document).expect("serialises");
        assert!(value.get("file").is_none());
    }

    #[rstest]
    fn draft_date_overrides_today() {
        let document = DocumentDraft::new("Report", "")
            .expect("draft")
            .with_created_at(date(2020, 5, 1))
            .into_document(DocumentId::new("x").expect("id"), date(2026, 10, 19));
        assert_eq!(document.created_at, date(2020, 5, 1));
    }

    #[rstest]
    fn unknown_storage_tag_is_rejected() {
        let raw = json!({
            "name": "a", "mimeType": "text/plain", "size": 1, "storage": "floppy"
        });
        assert!(serde_json::from_value::<Attachment>(raw).is_err());
    }
}
