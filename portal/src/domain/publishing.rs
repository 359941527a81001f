//! Admin document publishing across the store and the attachment backends.
//!
//! Attachments are either inlined into the record or uploaded to the remote
//! bucket. A failed remote upload may fall back to inline storage when the
//! publisher is configured to allow it; a missing remote configuration never
//! falls back. Any error leaves the collection untouched.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::ports::{KeyValueStore, ObjectStorage};
use crate::domain::{
    Attachment, Document, DocumentDraft, DocumentId, DocumentStore, DocumentValidationError,
    Error, FileUpload, IngestionError, RemoteStorage, RemoteStorageError, Role, ensure_admin,
    ingest_local,
};

/// Where a new attachment should be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoragePreference {
    /// Inline into the persisted record.
    #[default]
    Local,
    /// Upload to the remote bucket.
    Remote,
}

/// Input of [`DocumentPublisher::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    /// Document title.
    pub title: String,
    /// Document body.
    pub content: String,
    /// Explicit creation date; today when `None`.
    pub created_at: Option<NaiveDate>,
    /// Optional attachment.
    pub file: Option<FileUpload>,
    /// Requested attachment backend.
    pub storage: StoragePreference,
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// The created record.
    pub document: Document,
    /// Why a remote upload was replaced by inline storage, if it was.
    pub fallback_reason: Option<String>,
}

impl From<DocumentValidationError> for Error {
    fn from(err: DocumentValidationError) -> Self {
        Error::invalid_request(err.to_string())
    }
}

impl From<IngestionError> for Error {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::CapacityExceeded { .. } => Error::payload_too_large(err.to_string()),
            IngestionError::MalformedDataUri { .. } => Error::invalid_request(err.to_string()),
        }
    }
}

impl From<RemoteStorageError> for Error {
    fn from(err: RemoteStorageError) -> Self {
        match err {
            RemoteStorageError::NotConfigured { .. } => Error::misconfigured(err.to_string()),
            _ => Error::service_unavailable(err.to_string()),
        }
    }
}

/// Orchestrates document creation and removal for administrators.
pub struct DocumentPublisher<K, S> {
    store: DocumentStore<K>,
    remote: Result<RemoteStorage<S>, RemoteStorageError>,
    remote_fallback: bool,
}

impl<K, S> DocumentPublisher<K, S>
where
    K: KeyValueStore,
    S: ObjectStorage,
{
    /// Create a publisher. `remote` carries the configuration error when the
    /// remote backend could not be built.
    pub fn new(
        store: DocumentStore<K>,
        remote: Result<RemoteStorage<S>, RemoteStorageError>,
        remote_fallback: bool,
    ) -> Self {
        Self {
            store,
            remote,
            remote_fallback,
        }
    }

    /// Underlying store.
    pub fn store(&self) -> &DocumentStore<K> {
        &self.store
    }

    /// Remote backend, or the reason it is unavailable.
    pub fn remote(&self) -> Result<&RemoteStorage<S>, Error> {
        self.remote.as_ref().map_err(|err| Error::from(err.clone()))
    }

    /// Create a document, storing its attachment as requested.
    pub async fn publish(&self, actor: Role, request: PublishRequest) -> Result<PublishOutcome, Error> {
        ensure_admin(actor)?;
        let mut draft = DocumentDraft::new(request.title, request.content)?;
        if let Some(created_at) = request.created_at {
            draft = draft.with_created_at(created_at);
        }

        let mut fallback_reason = None;
        if let Some(file) = request.file {
            let attachment = match request.storage {
                StoragePreference::Local => ingest_local(&file)?.into_attachment(&file),
                StoragePreference::Remote => {
                    let (attachment, reason) = self.store_remotely(&file).await?;
                    fallback_reason = reason;
                    attachment
                }
            };
            draft = draft.with_attachment(attachment);
        }

        let document = self.store.add(draft).await;
        info!(
            id = %document.id,
            storage = document
                .attachment
                .as_ref()
                .map_or("none", |file| file.storage_kind().as_str()),
            fallback = fallback_reason.is_some(),
            "document published"
        );
        Ok(PublishOutcome {
            document,
            fallback_reason,
        })
    }

    async fn store_remotely(
        &self,
        file: &FileUpload,
    ) -> Result<(Attachment, Option<String>), Error> {
        let remote = self.remote()?;
        match remote.upload(file).await {
            Ok(stored) => Ok((stored.into_attachment(file), None)),
            Err(err) if self.remote_fallback => {
                warn!(file_name = %file.file_name, error = %err, "remote upload failed; storing inline");
                let attachment = ingest_local(file)?.into_attachment(file);
                Ok((attachment, Some(err.to_string())))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Remove a document, deleting its remote object on a best-effort basis.
    ///
    /// Returns whether a record was removed.
    pub async fn unpublish(&self, actor: Role, id: &DocumentId) -> Result<bool, Error> {
        ensure_admin(actor)?;
        let remote_path = self
            .store
            .get(id)
            .await
            .and_then(|doc| doc.attachment)
            .and_then(|file| file.remote_path().map(str::to_owned));

        if let Some(path) = remote_path {
            match &self.remote {
                Ok(remote) => {
                    if let Err(err) = remote.delete(&path).await {
                        warn!(%id, path = %path, error = %err, "remote object left behind");
                    }
                }
                Err(err) => {
                    warn!(%id, path = %path, error = %err, "remote storage unavailable; object left behind");
                }
            }
        }

        Ok(self.store.remove(id).await)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{
        BucketInfo, MockKeyValueStore, MockObjectStorage, ObjectStorageError,
    };
    use crate::domain::{
        AttachmentPayload, ChangeNotifier, ErrorCode, RemoteStorageConfig, StorageKind,
    };
    use chrono::{TimeZone, Utc};
    use mockable::{Clock, MockClock};
    use rstest::rstest;
    use std::sync::{Arc, Mutex};

    fn clock() -> Arc<dyn Clock> {
        let mut clock = MockClock::new();
        clock
            .expect_utc()
            .return_const(Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).single().expect("instant"));
        Arc::new(clock)
    }

    fn slots(initial: &str) -> (MockKeyValueStore, Arc<Mutex<String>>) {
        let state = Arc::new(Mutex::new(initial.to_owned()));
        let mut slots = MockKeyValueStore::new();
        let reader = Arc::clone(&state);
        slots
            .expect_get()
            .returning(move |_| Ok(Some(reader.lock().expect("state").clone())));
        let writer = Arc::clone(&state);
        slots.expect_set().returning(move |_, value| {
            *writer.lock().expect("state") = value.to_owned();
            Ok(())
        });
        (slots, state)
    }

    fn remote(storage: MockObjectStorage) -> RemoteStorage<MockObjectStorage> {
        let config = RemoteStorageConfig {
            endpoint: Some("https://demo.supabase.co".to_owned()),
            anon_key: Some("anon".to_owned()),
            bucket: None,
        }
        .validate()
        .expect("valid config");
        RemoteStorage::new(Arc::new(storage), &config, clock())
    }

    fn publisher(
        slots: MockKeyValueStore,
        remote: Result<RemoteStorage<MockObjectStorage>, RemoteStorageError>,
        fallback: bool,
    ) -> DocumentPublisher<MockKeyValueStore, MockObjectStorage> {
        let store = DocumentStore::new(Arc::new(slots), ChangeNotifier::new(), clock());
        DocumentPublisher::new(store, remote, fallback)
    }

    fn request(storage: StoragePreference) -> PublishRequest {
        PublishRequest {
            title: "Report".to_owned(),
            content: "Q1 results".to_owned(),
            created_at: None,
            file: Some(FileUpload {
                file_name: "report.txt".to_owned(),
                mime_type: "text/plain".to_owned(),
                bytes: b"numbers".to_vec(),
            }),
            storage,
        }
    }

    fn failing_upload_storage() -> MockObjectStorage {
        let mut storage = MockObjectStorage::new();
        storage.expect_list_buckets().returning(|| {
            Ok(vec![BucketInfo {
                name: "document-files".to_owned(),
                public: true,
            }])
        });
        storage
            .expect_upload_object()
            .returning(|_, _| Err(ObjectStorageError::policy_denied("row-level security")));
        storage
    }

    fn stored_count(state: &Arc<Mutex<String>>) -> usize {
        serde_json::from_str::<Vec<Document>>(&state.lock().expect("state"))
            .expect("decode")
            .len()
    }

    #[rstest]
    #[tokio::test]
    async fn local_publish_inlines_the_file() {
        let (slots, state) = slots("[]");
        let publisher = publisher(slots, Err(RemoteStorageError::NotConfigured { reason: "unset".into() }), true);

        let outcome = publisher
            .publish(Role::Admin, request(StoragePreference::Local))
            .await
            .expect("published");

        let file = outcome.document.attachment.expect("attachment");
        assert_eq!(file.storage_kind(), StorageKind::Local);
        assert!(outcome.fallback_reason.is_none());
        assert_eq!(stored_count(&state), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn non_admins_cannot_publish() {
        let (slots, state) = slots("[]");
        let publisher = publisher(slots, Err(RemoteStorageError::NotConfigured { reason: "unset".into() }), true);
        let err = publisher
            .publish(Role::User, request(StoragePreference::Local))
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
        assert_eq!(stored_count(&state), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn remote_publish_records_object_location() {
        let (slots, _state) = slots("[]");
        let mut storage = MockObjectStorage::new();
        storage.expect_list_buckets().returning(|| {
            Ok(vec![BucketInfo {
                name: "document-files".to_owned(),
                public: true,
            }])
        });
        storage
            .expect_upload_object()
            .returning(|_, upload| Ok(upload.key));
        storage
            .expect_public_url()
            .returning(|bucket, key| format!("https://cdn/{bucket}/{key}"));
        let publisher = publisher(slots, Ok(remote(storage)), false);

        let outcome = publisher
            .publish(Role::Admin, request(StoragePreference::Remote))
            .await
            .expect("published");

        let file = outcome.document.attachment.expect("attachment");
        match file.payload {
            AttachmentPayload::RemoteObjectStore { path, url } => {
                assert!(path.ends_with(".txt"));
                assert_eq!(url, format!("https://cdn/document-files/{path}"));
            }
            other => panic!("expected remote payload, got {other:?}"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn failed_upload_falls_back_when_allowed() {
        let (slots, state) = slots("[]");
        let publisher = publisher(slots, Ok(remote(failing_upload_storage())), true);

        let outcome = publisher
            .publish(Role::Admin, request(StoragePreference::Remote))
            .await
            .expect("published inline");

        let file = outcome.document.attachment.expect("attachment");
        assert_eq!(file.storage_kind(), StorageKind::Local);
        let reason = outcome.fallback_reason.expect("fallback recorded");
        assert!(reason.contains("access policy"));
        assert_eq!(stored_count(&state), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_upload_without_fallback_leaves_collection_untouched() {
        let (slots, state) = slots("[]");
        let publisher = publisher(slots, Ok(remote(failing_upload_storage())), false);

        let err = publisher
            .publish(Role::Admin, request(StoragePreference::Remote))
            .await
            .expect_err("upload fails");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
        assert_eq!(stored_count(&state), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_configuration_never_falls_back() {
        let (slots, state) = slots("[]");
        let publisher = publisher(
            slots,
            Err(RemoteStorageError::NotConfigured {
                reason: "endpoint is missing".into(),
            }),
            true,
        );

        let err = publisher
            .publish(Role::Admin, request(StoragePreference::Remote))
            .await
            .expect_err("not configured");

        assert_eq!(err.code(), ErrorCode::Misconfigured);
        assert_eq!(stored_count(&state), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn oversized_file_is_rejected_without_writing() {
        let (slots, state) = slots("[]");
        let publisher = publisher(slots, Err(RemoteStorageError::NotConfigured { reason: "unset".into() }), true);
        let mut request = request(StoragePreference::Local);
        request.file = Some(FileUpload {
            file_name: "huge.bin".to_owned(),
            mime_type: "application/octet-stream".to_owned(),
            bytes: vec![0; 4 * 1024 * 1024],
        });

        let err = publisher
            .publish(Role::Admin, request)
            .await
            .expect_err("too large");

        assert_eq!(err.code(), ErrorCode::PayloadTooLarge);
        assert_eq!(stored_count(&state), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn unpublish_removes_record_even_when_remote_delete_fails() {
        let existing = serde_json::json!([{
            "id": "remote-doc",
            "title": "Scan",
            "content": "",
            "createdAt": "2024-05-01",
            "file": {
                "name": "scan.pdf",
                "mimeType": "application/pdf",
                "size": 10,
                "storage": "remote-object-store",
                "path": "1_abc.pdf",
                "url": "https://cdn/1_abc.pdf"
            }
        }]);
        let (slots, state) = slots(&existing.to_string());
        let mut storage = MockObjectStorage::new();
        storage
            .expect_remove_objects()
            .times(1)
            .withf(|_, keys| keys == ["1_abc.pdf".to_owned()])
            .returning(|_, _| Err(ObjectStorageError::transport("offline")));
        let publisher = publisher(slots, Ok(remote(storage)), true);

        let removed = publisher
            .unpublish(Role::Admin, &DocumentId::new("remote-doc").expect("id"))
            .await
            .expect("unpublished");

        assert!(removed);
        assert_eq!(stored_count(&state), 0);
    }
}
