//! Reqwest-backed object storage adapter for the Supabase Storage REST API.
//!
//! This adapter owns transport details only: authentication headers, URL
//! construction, timeouts and the classification of provider failures into
//! [`ObjectStorageError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{BucketDto, ErrorBodyDto, RemoveObjectsDto, UploadResponseDto};
use crate::domain::ValidatedRemoteConfig;
use crate::domain::ports::{BucketInfo, ObjectStorage, ObjectStorageError, ObjectUpload};

const API_KEY_HEADER: &str = "apikey";
const UPSERT_HEADER: &str = "x-upsert";
const OBJECT_CACHE_CONTROL: &str = "max-age=3600";

/// Object storage adapter talking to one storage service.
pub struct HttpObjectStorage {
    client: Client,
    endpoint: Url,
    anon_key: Zeroizing<String>,
}

impl HttpObjectStorage {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: &ValidatedRemoteConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint().clone(),
            anon_key: Zeroizing::new(config.anon_key().to_owned()),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        // Validated endpoints are always base URLs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorised(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, self.anon_key.as_str())
            .header(AUTHORIZATION, format!("Bearer {}", self.anon_key.as_str()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, ObjectStorageError> {
        let response = self
            .authorised(request)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, ObjectStorageError> {
        let url = self.url(&["storage", "v1", "bucket"]);
        let body = self.send(self.client.get(url)).await?;
        let buckets: Vec<BucketDto> = serde_json::from_slice(&body).map_err(|err| {
            ObjectStorageError::decode(format!("invalid bucket list payload: {err}"))
        })?;
        debug!(count = buckets.len(), "listed buckets");
        Ok(buckets.into_iter().map(BucketInfo::from).collect())
    }

    async fn upload_object(
        &self,
        bucket: &str,
        upload: ObjectUpload,
    ) -> Result<String, ObjectStorageError> {
        let url = self.url(&["storage", "v1", "object", bucket, upload.key.as_str()]);
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, upload.content_type.as_str())
            .header(CACHE_CONTROL, OBJECT_CACHE_CONTROL)
            .header(UPSERT_HEADER, "false")
            .body(upload.bytes);
        let body = self.send(request).await?;
        Ok(stored_key(bucket, &upload.key, &body))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.url(&["storage", "v1", "object", "public", bucket, key])
            .to_string()
    }

    async fn remove_objects(
        &self,
        bucket: &str,
        keys: &[String],
    ) -> Result<(), ObjectStorageError> {
        let url = self.url(&["storage", "v1", "object", bucket]);
        let request = self
            .client
            .delete(url)
            .json(&RemoveObjectsDto { prefixes: keys });
        self.send(request).await?;
        Ok(())
    }
}

/// Object key reported by the service, falling back to the requested key.
fn stored_key(bucket: &str, requested: &str, body: &[u8]) -> String {
    serde_json::from_slice::<UploadResponseDto>(body)
        .ok()
        .and_then(|dto| dto.key)
        .map(|key| {
            key.strip_prefix(bucket)
                .and_then(|rest| rest.strip_prefix('/'))
                .map_or_else(|| key.clone(), str::to_owned)
        })
        .unwrap_or_else(|| requested.to_owned())
}

fn map_transport_error(error: reqwest::Error) -> ObjectStorageError {
    ObjectStorageError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ObjectStorageError {
    let envelope: ErrorBodyDto = serde_json::from_slice(body).unwrap_or_default();
    let message = envelope
        .message()
        .map(str::to_owned)
        .unwrap_or_else(|| body_preview(body));
    let message = if message.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        message
    };
    let provider_status = envelope.status_code().unwrap_or(status.as_u16());
    classify(provider_status, message)
}

/// Classify a provider failure from its reported status and message.
///
/// The service reports row-level security denials as 400/403 and missing
/// buckets as 400/404, so the message text decides where status is ambiguous.
fn classify(status: u16, message: String) -> ObjectStorageError {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("bucket not found") {
        ObjectStorageError::bucket_not_found(message)
    } else if lowered.contains("policy") || lowered.contains("row-level security") {
        ObjectStorageError::policy_denied(message)
    } else if status == 401
        || lowered.contains("jwt")
        || lowered.contains("authentication")
        || lowered.contains("invalid api key")
    {
        ObjectStorageError::unauthorized(message)
    } else if status == 403 {
        ObjectStorageError::policy_denied(message)
    } else {
        ObjectStorageError::provider(message)
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
