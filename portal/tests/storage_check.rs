//! Connection checks and object naming against a scripted object store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use portal::domain::ports::ObjectStorageError;
use portal::domain::{FileUpload, RemoteStorage, RemoteStorageConfig, RemoteStorageError};
use portal::test_support::{MutableClock, StubObjectStorage};
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> Arc<MutableClock> {
    Arc::new(MutableClock::new(
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
            .single()
            .expect("valid instant"),
    ))
}

fn remote(storage: StubObjectStorage, clock: Arc<MutableClock>) -> RemoteStorage<StubObjectStorage> {
    let config = RemoteStorageConfig {
        endpoint: Some("https://demo.supabase.co".to_owned()),
        anon_key: Some("anon-key".to_owned()),
        bucket: None,
    }
    .validate()
    .expect("valid remote config");
    RemoteStorage::new(Arc::new(storage), &config, clock)
}

fn upload(name: &str) -> FileUpload {
    FileUpload {
        file_name: name.to_owned(),
        mime_type: "text/plain".to_owned(),
        bytes: b"hello".to_vec(),
    }
}

#[rstest]
#[tokio::test]
async fn check_reports_bucket_visibility(clock: Arc<MutableClock>) {
    let storage = StubObjectStorage::with_buckets([("avatars", true), ("document-files", false)]);
    let report = remote(storage, clock)
        .check_connection()
        .await
        .expect("connection ok");
    assert_eq!(report.bucket, "document-files");
    assert!(!report.bucket_public);
    assert_eq!(report.total_buckets, 2);
}

#[rstest]
#[tokio::test]
async fn check_surfaces_the_provider_message(clock: Arc<MutableClock>) {
    let storage = StubObjectStorage::failing_listing(ObjectStorageError::unauthorized("Invalid JWT"));
    let err = remote(storage, clock)
        .check_connection()
        .await
        .expect_err("listing fails");
    assert_eq!(
        err,
        RemoteStorageError::BucketCheck {
            message: "Invalid JWT".to_owned()
        }
    );
}

#[rstest]
#[tokio::test]
async fn object_names_follow_the_clock(clock: Arc<MutableClock>) {
    let storage = StubObjectStorage::with_buckets([("document-files", true)]);
    let remote = remote(storage, Arc::clone(&clock));

    let first = remote.upload(&upload("notes.txt")).await.expect("first upload");
    clock.advance(Duration::from_millis(1500));
    let second = remote.upload(&upload("README")).await.expect("second upload");

    assert!(first.path.starts_with("1741944600000_"));
    assert!(first.path.ends_with(".txt"));
    assert!(second.path.starts_with("1741944601500_"));
    assert!(!second.path.contains('.'));
    assert_eq!(
        second.public_url,
        format!("https://stub.test/storage/v1/object/public/document-files/{}", second.path)
    );
}
