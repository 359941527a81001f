//! Built-in fixtures: the demo user table and the default document
//! collection seeded into an absent `documents` slot.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{
    Attachment, AttachmentPayload, Document, DocumentId, Role, User, UserId, UserValidationError,
    Username,
};

/// Identifier of the bundled certificate document.
pub const CERTIFICATE_DOCUMENT_ID: &str = "certificate";
/// Static asset path of the bundled certificate.
pub const CERTIFICATE_ASSET_PATH: &str = "/assets/certificate.pdf";
const CERTIFICATE_ASSET_SIZE: u64 = 184_320;

/// The bundled "certificate" document.
pub fn certificate_document() -> Document {
    Document {
        id: DocumentId(CERTIFICATE_DOCUMENT_ID.to_owned()),
        title: "Certificate".to_owned(),
        content: "Certificate of completion shipped with the portal.".to_owned(),
        created_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
        attachment: Some(Attachment {
            name: "certificate.pdf".to_owned(),
            mime_type: "application/pdf".to_owned(),
            size: CERTIFICATE_ASSET_SIZE,
            payload: AttachmentPayload::BundledAsset {
                path: CERTIFICATE_ASSET_PATH.to_owned(),
            },
        }),
    }
}

/// Collection written to the slot when it is absent.
pub fn default_documents() -> Vec<Document> {
    vec![certificate_document()]
}

/// Demo accounts available before any admin adds users.
///
/// `admin` / `admin123` holds the admin role, `user1` / `user123` does not.
pub fn demo_users() -> Result<Vec<User>, UserValidationError> {
    [
        ("8d3c1c1e-3a6b-4f0e-9a51-0f5b6f3f7a01", "admin", "admin123", Role::Admin),
        ("1f0e7a52-6c2d-4d8b-8b0e-5b0c6d9e2a02", "user1", "user123", Role::User),
    ]
    .into_iter()
    .map(|(id, username, password, role)| {
        let id = Uuid::parse_str(id).map_err(|_| UserValidationError::InvalidId)?;
        User::new(UserId::from_uuid(id), Username::new(username)?, password, role)
    })
    .collect()
}
