//! Remote storage of document attachments in an object storage bucket.
//!
//! [`RemoteStorage`] can only be built from a [`ValidatedRemoteConfig`], so a
//! missing or placeholder credential is rejected before any request is made.
//! Provider failures arrive already classified by the outbound adapter and
//! are turned into user-facing [`RemoteStorageError`]s here.

use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;
use zeroize::Zeroizing;

use crate::domain::document::base36_suffix;
use crate::domain::ports::{ObjectStorage, ObjectStorageError, ObjectUpload};
use crate::domain::{Attachment, AttachmentPayload, FileUpload};

/// Bucket used when none is configured.
pub const DEFAULT_BUCKET: &str = "document-files";

const ENDPOINT_PLACEHOLDER: &str = "your-project-url";
const ANON_KEY_PLACEHOLDER: &str = "your-anon-key";
const OBJECT_SUFFIX_LEN: usize = 11;

/// Failures reported by [`RemoteStorage`] and its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteStorageError {
    /// Endpoint or key missing, placeholder, or malformed.
    #[error("remote storage is not configured: {reason}")]
    NotConfigured {
        /// What is wrong with the configuration.
        reason: String,
    },
    /// Listing buckets failed.
    #[error("could not list storage buckets: {message}")]
    BucketCheck {
        /// Provider message, verbatim.
        message: String,
    },
    /// The configured bucket does not exist.
    #[error(
        "storage bucket `{bucket}` does not exist; create it in the storage dashboard \
         (Storage > New bucket, name `{bucket}`, enable \"Public bucket\") and retry"
    )]
    BucketMissing {
        /// Configured bucket name.
        bucket: String,
    },
    /// An access policy rejected the upload.
    #[error(
        "upload rejected by the access policy of bucket `{bucket}`: {message}; \
         add a policy allowing inserts for the anon role"
    )]
    PolicyDenied {
        /// Configured bucket name.
        bucket: String,
        /// Provider message.
        message: String,
    },
    /// The anonymous key was rejected.
    #[error("storage authentication failed: {message}; check the configured anon key")]
    Unauthorized {
        /// Provider message.
        message: String,
    },
    /// Any other upload failure.
    #[error("upload failed: {message}")]
    Upload {
        /// Provider message, verbatim.
        message: String,
    },
    /// Object removal failed.
    #[error("failed to delete `{path}`: {message}")]
    Delete {
        /// Object key.
        path: String,
        /// Provider message.
        message: String,
    },
}

impl RemoteStorageError {
    fn not_configured(reason: impl Into<String>) -> Self {
        Self::NotConfigured {
            reason: reason.into(),
        }
    }

    fn from_upload(bucket: &str, err: ObjectStorageError) -> Self {
        match err {
            ObjectStorageError::BucketNotFound { .. } => Self::BucketMissing {
                bucket: bucket.to_owned(),
            },
            ObjectStorageError::PolicyDenied { message } => Self::PolicyDenied {
                bucket: bucket.to_owned(),
                message,
            },
            ObjectStorageError::Unauthorized { message } => Self::Unauthorized { message },
            other => Self::Upload {
                message: other.message().to_owned(),
            },
        }
    }
}

/// Raw remote storage settings as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteStorageConfig {
    /// Service base URL.
    pub endpoint: Option<String>,
    /// Anonymous access key.
    pub anon_key: Option<String>,
    /// Bucket name; [`DEFAULT_BUCKET`] when unset.
    pub bucket: Option<String>,
}

impl RemoteStorageConfig {
    /// Check that both credentials are present and not placeholders.
    ///
    /// # Examples
    /// ```
    /// use portal::domain::RemoteStorageConfig;
    ///
    /// let config = RemoteStorageConfig {
    ///     endpoint: Some("https://your-project-url.supabase.co".into()),
    ///     anon_key: Some("secret".into()),
    ///     bucket: None,
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(self) -> Result<ValidatedRemoteConfig, RemoteStorageError> {
        let endpoint = required(self.endpoint, "endpoint")?;
        let anon_key = Zeroizing::new(required(self.anon_key, "anon key")?);
        if endpoint.contains(ENDPOINT_PLACEHOLDER) {
            return Err(RemoteStorageError::not_configured(
                "endpoint still holds the `your-project-url` placeholder",
            ));
        }
        if anon_key.contains(ANON_KEY_PLACEHOLDER) {
            return Err(RemoteStorageError::not_configured(
                "anon key still holds the `your-anon-key` placeholder",
            ));
        }
        let endpoint = Url::parse(&endpoint).map_err(|err| {
            RemoteStorageError::not_configured(format!("endpoint is not a valid URL: {err}"))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(RemoteStorageError::not_configured(
                "endpoint must be an http(s) base URL",
            ));
        }
        let bucket = self
            .bucket
            .map(|bucket| bucket.trim().to_owned())
            .filter(|bucket| !bucket.is_empty())
            .unwrap_or_else(|| DEFAULT_BUCKET.to_owned());
        Ok(ValidatedRemoteConfig {
            endpoint,
            anon_key,
            bucket,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, RemoteStorageError> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| RemoteStorageError::not_configured(format!("{name} is missing")))
}

/// Remote storage settings that passed [`RemoteStorageConfig::validate`].
#[derive(Clone)]
pub struct ValidatedRemoteConfig {
    endpoint: Url,
    anon_key: Zeroizing<String>,
    bucket: String,
}

impl ValidatedRemoteConfig {
    /// Service base URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Anonymous access key.
    pub fn anon_key(&self) -> &str {
        self.anon_key.as_str()
    }

    /// Target bucket.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl std::fmt::Debug for ValidatedRemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedRemoteConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("anon_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// Location of an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object key within the bucket.
    pub path: String,
    /// Public URL of the object.
    pub public_url: String,
}

impl StoredObject {
    /// Attachment describing `upload` stored at this location.
    pub fn into_attachment(self, upload: &FileUpload) -> Attachment {
        Attachment {
            name: upload.file_name.clone(),
            mime_type: upload.effective_mime_type().to_owned(),
            size: upload.size(),
            payload: AttachmentPayload::RemoteObjectStore {
                path: self.path,
                url: self.public_url,
            },
        }
    }
}

/// Outcome of [`RemoteStorage::check_connection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReport {
    /// Configured bucket.
    pub bucket: String,
    /// Whether the bucket serves public URLs.
    pub bucket_public: bool,
    /// Number of buckets visible to the key.
    pub total_buckets: usize,
}

/// Bucket operations for document attachments.
#[derive(Clone)]
pub struct RemoteStorage<S> {
    storage: Arc<S>,
    bucket: String,
    clock: Arc<dyn Clock>,
}

impl<S> RemoteStorage<S>
where
    S: ObjectStorage,
{
    /// Bind `storage` to the bucket named in `config`.
    pub fn new(storage: Arc<S>, config: &ValidatedRemoteConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            bucket: config.bucket().to_owned(),
            clock,
        }
    }

    /// Configured bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Whether the configured bucket exists.
    pub async fn bucket_exists(&self) -> Result<bool, RemoteStorageError> {
        let buckets = self.storage.list_buckets().await.map_err(|err| {
            warn!(bucket = %self.bucket, error = %err, "bucket listing failed");
            RemoteStorageError::BucketCheck {
                message: err.message().to_owned(),
            }
        })?;
        Ok(buckets.iter().any(|bucket| bucket.name == self.bucket))
    }

    /// Upload `file` under a fresh object name.
    pub async fn upload(&self, file: &FileUpload) -> Result<StoredObject, RemoteStorageError> {
        if !self.bucket_exists().await? {
            warn!(bucket = %self.bucket, "upload target bucket missing");
            return Err(RemoteStorageError::BucketMissing {
                bucket: self.bucket.clone(),
            });
        }

        let key = self.object_name(&file.file_name);
        let request = ObjectUpload {
            key: key.clone(),
            content_type: file.effective_mime_type().to_owned(),
            bytes: file.bytes.clone(),
        };
        let path = self
            .storage
            .upload_object(&self.bucket, request)
            .await
            .map_err(|err| {
                warn!(bucket = %self.bucket, key = %key, error = %err, "upload failed");
                RemoteStorageError::from_upload(&self.bucket, err)
            })?;

        let public_url = self.public_url(&path);
        info!(bucket = %self.bucket, path = %path, size = file.size(), "object uploaded");
        Ok(StoredObject { path, public_url })
    }

    /// Public URL of the object at `path`.
    pub fn public_url(&self, path: &str) -> String {
        self.storage.public_url(&self.bucket, path)
    }

    /// Remove the object at `path`.
    pub async fn delete(&self, path: &str) -> Result<(), RemoteStorageError> {
        self.storage
            .remove_objects(&self.bucket, &[path.to_owned()])
            .await
            .map_err(|err| RemoteStorageError::Delete {
                path: path.to_owned(),
                message: err.message().to_owned(),
            })?;
        info!(bucket = %self.bucket, path, "object deleted");
        Ok(())
    }

    /// Confirm the credentials work and the bucket exists.
    pub async fn check_connection(&self) -> Result<ConnectionReport, RemoteStorageError> {
        let buckets = self
            .storage
            .list_buckets()
            .await
            .map_err(|err| RemoteStorageError::BucketCheck {
                message: err.message().to_owned(),
            })?;
        let bucket = buckets
            .iter()
            .find(|bucket| bucket.name == self.bucket)
            .ok_or_else(|| RemoteStorageError::BucketMissing {
                bucket: self.bucket.clone(),
            })?;
        if !bucket.public {
            warn!(bucket = %self.bucket, "bucket is private; public URLs will not resolve");
        }
        Ok(ConnectionReport {
            bucket: bucket.name.clone(),
            bucket_public: bucket.public,
            total_buckets: buckets.len(),
        })
    }

    fn object_name(&self, file_name: &str) -> String {
        let millis = self.clock.utc().timestamp_millis();
        let suffix = {
            let mut rng = rand::thread_rng();
            base36_suffix(&mut rng, OBJECT_SUFFIX_LEN)
        };
        match object_extension(file_name) {
            Some(ext) => format!("{millis}_{suffix}.{ext}"),
            None => format!("{millis}_{suffix}"),
        }
    }
}

/// Text after the last dot, so dotfiles such as `.env` keep `env`.
fn object_extension(file_name: &str) -> Option<&str> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}
