//! Port abstraction for the external object storage service.
//!
//! Adapters classify provider failures into [`ObjectStorageError`] at the
//! point where the raw response is received, so domain services never parse
//! provider message text.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Classified failures reported by object storage adapters.
    pub enum ObjectStorageError {
        /// The target bucket does not exist.
        BucketNotFound { message: String } => "bucket not found: {message}",
        /// An access policy (row-level security) rejected the request.
        PolicyDenied { message: String } => "storage policy rejected the request: {message}",
        /// Credentials were missing, expired, or rejected.
        Unauthorized { message: String } => "storage authentication failed: {message}",
        /// The request never completed (connection, TLS, timeout).
        Transport { message: String } => "storage transport failed: {message}",
        /// The provider answered with a payload the adapter could not decode.
        Decode { message: String } => "storage response could not be decoded: {message}",
        /// Any other provider-reported failure.
        Provider { message: String } => "storage request failed: {message}",
    }
}

/// Bucket metadata returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketInfo {
    /// Bucket name.
    pub name: String,
    /// Whether objects are readable through public URLs.
    pub public: bool,
}

/// Object upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUpload {
    /// Object key within the bucket.
    pub key: String,
    /// Content type sent with the object.
    pub content_type: String,
    /// Raw object bytes.
    pub bytes: Vec<u8>,
}

/// Bucket and object operations consumed by the remote storage adapter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// List every bucket visible to the configured credentials.
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, ObjectStorageError>;

    /// Upload one object and return the stored key.
    async fn upload_object(
        &self,
        bucket: &str,
        upload: ObjectUpload,
    ) -> Result<String, ObjectStorageError>;

    /// Derive the public URL of `key`. Performs no I/O.
    fn public_url(&self, bucket: &str, key: &str) -> String;

    /// Remove the given objects from `bucket`.
    async fn remove_objects(&self, bucket: &str, keys: &[String])
    -> Result<(), ObjectStorageError>;
}

impl ObjectStorageError {
    /// Provider or transport message carried by the error, without the
    /// classification prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::BucketNotFound { message }
            | Self::PolicyDenied { message }
            | Self::Unauthorized { message }
            | Self::Transport { message }
            | Self::Decode { message }
            | Self::Provider { message } => message,
        }
    }
}
