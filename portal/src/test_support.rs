//! Test utilities shared by unit tests (in `src/`) and integration tests (in
//! `tests/`). Compiled only for tests or with the `test-support` feature.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use camino::Utf8PathBuf;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use tempfile::TempDir;

use crate::domain::ports::{BucketInfo, ObjectStorage, ObjectStorageError, ObjectUpload};
use crate::outbound::persistence::FileKeyValueStore;

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{what} mutex"),
    }
}

/// Clock whose instant only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *lock(&self.0, "clock") += delta;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0, "clock")
    }
}

/// Scripted object store recording every upload and removal.
///
/// Bucket listings and upload outcomes are fixed at construction; public URLs
/// follow the provider's `/storage/v1/object/public/<bucket>/<key>` layout.
pub struct StubObjectStorage {
    buckets: Result<Vec<BucketInfo>, ObjectStorageError>,
    upload_error: Option<ObjectStorageError>,
    uploads: Mutex<Vec<(String, ObjectUpload)>>,
    removals: Mutex<Vec<(String, Vec<String>)>>,
}

impl StubObjectStorage {
    /// Store that lists `buckets` and accepts every upload.
    pub fn with_buckets(buckets: impl IntoIterator<Item = (&'static str, bool)>) -> Self {
        Self {
            buckets: Ok(buckets
                .into_iter()
                .map(|(name, public)| BucketInfo {
                    name: name.to_owned(),
                    public,
                })
                .collect()),
            upload_error: None,
            uploads: Mutex::new(Vec::new()),
            removals: Mutex::new(Vec::new()),
        }
    }

    /// Store whose bucket listing fails with `error`.
    pub fn failing_listing(error: ObjectStorageError) -> Self {
        Self {
            buckets: Err(error),
            ..Self::with_buckets([])
        }
    }

    /// Reject every upload with `error`.
    #[must_use]
    pub fn rejecting_uploads(mut self, error: ObjectStorageError) -> Self {
        self.upload_error = Some(error);
        self
    }

    /// Uploads received so far, as `(bucket, upload)` pairs.
    pub fn uploads(&self) -> Vec<(String, ObjectUpload)> {
        lock(&self.uploads, "uploads").clone()
    }

    /// Removals received so far, as `(bucket, keys)` pairs.
    pub fn removals(&self) -> Vec<(String, Vec<String>)> {
        lock(&self.removals, "removals").clone()
    }
}

#[async_trait]
impl ObjectStorage for StubObjectStorage {
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, ObjectStorageError> {
        self.buckets.clone()
    }

    async fn upload_object(
        &self,
        bucket: &str,
        upload: ObjectUpload,
    ) -> Result<String, ObjectStorageError> {
        if let Some(error) = &self.upload_error {
            return Err(error.clone());
        }
        let key = upload.key.clone();
        lock(&self.uploads, "uploads").push((bucket.to_owned(), upload));
        Ok(key)
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://stub.test/storage/v1/object/public/{bucket}/{key}")
    }

    async fn remove_objects(&self, bucket: &str, keys: &[String]) -> Result<(), ObjectStorageError> {
        lock(&self.removals, "removals").push((bucket.to_owned(), keys.to_vec()));
        Ok(())
    }
}

/// Temporary data directory with a [`FileKeyValueStore`] rooted in it.
pub struct TempDataDir {
    dir: TempDir,
}

impl TempDataDir {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// UTF-8 path of the directory.
    pub fn path(&self) -> Utf8PathBuf {
        match Utf8PathBuf::from_path_buf(self.dir.path().to_path_buf()) {
            Ok(path) => path,
            Err(path) => panic!("temporary directory is not UTF-8: {}", path.display()),
        }
    }

    /// Open a fresh store over the directory.
    pub fn store(&self) -> std::io::Result<FileKeyValueStore> {
        FileKeyValueStore::open(&self.path())
    }
}
