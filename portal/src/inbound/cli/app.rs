//! Composition root wiring services to their adapters.

use std::sync::Arc;

use camino::Utf8PathBuf;
use mockable::{Clock, DefaultClock};
use tracing::debug;

use crate::domain::ports::{KeyValueStore, ObjectStorage};
use crate::domain::{
    ChangeNotifier, DocumentPublisher, DocumentStore, RemoteStorage, RemoteStorageError,
    SessionStore, UserDirectory,
};
use crate::outbound::object_storage::HttpObjectStorage;
use crate::outbound::persistence::{FileKeyValueStore, SlotUserRepository};
use crate::settings::PortalSettings;

use super::CliError;

/// Services used by the CLI commands.
pub struct Portal<K, S> {
    pub(crate) sessions: SessionStore<K>,
    pub(crate) directory: UserDirectory,
    pub(crate) publisher: DocumentPublisher<K, S>,
}

impl<K, S> Portal<K, S>
where
    K: KeyValueStore + 'static,
    S: ObjectStorage,
{
    /// Wire services over `slots` and an optional remote backend.
    pub fn new(
        slots: Arc<K>,
        remote: Result<RemoteStorage<S>, RemoteStorageError>,
        remote_fallback: bool,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = DocumentStore::new(Arc::clone(&slots), ChangeNotifier::new(), clock);
        let directory = UserDirectory::new(Arc::new(SlotUserRepository::new(Arc::clone(&slots))));
        Self {
            sessions: SessionStore::new(slots),
            directory,
            publisher: DocumentPublisher::new(store, remote, remote_fallback),
        }
    }

    /// Document store shared by every command.
    pub fn store(&self) -> &DocumentStore<K> {
        self.publisher.store()
    }
}

impl Portal<FileKeyValueStore, HttpObjectStorage> {
    /// Build the production wiring from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Setup`] when the data directory cannot be opened or
    /// the HTTP client cannot be built. Remote configuration problems are not
    /// fatal here; they surface when a command needs remote storage.
    pub fn from_settings(settings: &PortalSettings) -> Result<Self, CliError> {
        let data_dir = Utf8PathBuf::try_from(settings.data_dir())
            .map_err(|err| CliError::Setup(format!("data directory must be UTF-8: {err}")))?;
        let slots = FileKeyValueStore::open(&data_dir).map_err(|err| {
            CliError::Setup(format!("open data directory '{data_dir}': {err}"))
        })?;
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

        let remote = match settings.remote_config().validate() {
            Ok(config) => {
                let http = HttpObjectStorage::new(&config, settings.request_timeout())
                    .map_err(|err| CliError::Setup(format!("build HTTP client: {err}")))?;
                debug!(bucket = config.bucket(), "remote storage configured");
                Ok(RemoteStorage::new(Arc::new(http), &config, Arc::clone(&clock)))
            }
            Err(err) => {
                debug!(error = %err, "remote storage disabled");
                Err(err)
            }
        };

        Ok(Self::new(
            Arc::new(slots),
            remote,
            settings.remote_fallback,
            clock,
        ))
    }
}
