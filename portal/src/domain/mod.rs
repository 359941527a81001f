//! Domain primitives, services and ports.
//!
//! Purpose: Define the document portal's entities and the services that own
//! its persisted state. Adapters live in `crate::outbound` and reach the
//! domain only through the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport agnostic failure with a stable code.
//! - User, Role, LoginCredentials: directory entries and login inputs.
//! - Document, Attachment, DocumentDraft: persisted records and their inputs.
//! - DocumentStore: single accessor of the `documents` slot.
//! - RemoteStorage: bucket operations behind validated configuration.
//! - DocumentPublisher: admin publishing with the remote fallback policy.
//! - UserDirectory, SessionStore: authentication and the login session.

pub mod auth;
pub mod change_feed;
pub mod document;
pub mod document_store;
pub mod error;
pub mod ingestion;
pub mod ports;
pub mod publishing;
pub mod remote_storage;
pub mod seed;
pub mod session;
pub mod user;
pub mod user_directory;

pub use self::auth::{LoginCredentials, LoginValidationError, ensure_admin};
pub use self::change_feed::{ChangeNotifier, DocumentsChanged, Subscription};
pub use self::document::{
    Attachment, AttachmentPayload, Document, DocumentDraft, DocumentId, DocumentValidationError,
    StorageKind,
};
pub use self::document_store::{DOCUMENTS_KEY, DocumentStore};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ingestion::{FileUpload, IngestedFile, IngestionError, decode_data_uri, ingest_local};
pub use self::publishing::{DocumentPublisher, PublishOutcome, PublishRequest, StoragePreference};
pub use self::remote_storage::{
    ConnectionReport, DEFAULT_BUCKET, RemoteStorage, RemoteStorageConfig, RemoteStorageError,
    StoredObject, ValidatedRemoteConfig,
};
pub use self::session::{SESSION_KEY, SessionStore, SessionUser};
pub use self::user::{NewUser, Role, User, UserId, UserValidationError, Username};
pub use self::user_directory::UserDirectory;

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use portal::domain::{DomainResult, Error};
///
/// fn guard() -> DomainResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(guard().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
