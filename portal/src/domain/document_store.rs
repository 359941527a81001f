//! Single accessor of the persisted document collection.
//!
//! The whole collection lives as one JSON array under the `documents` slot of
//! a [`KeyValueStore`]. Every mutation reads the current collection, rewrites
//! it, and then signals listeners through the shared [`ChangeNotifier`].
//! There is no locking: concurrent writers race and the last write wins.
//!
//! Storage failures never surface to callers. Reads fall back to the default
//! collection and failed writes are logged and skipped, in which case no
//! change is signalled.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::KeyValueStore;
use crate::domain::seed::{CERTIFICATE_DOCUMENT_ID, certificate_document, default_documents};
use crate::domain::{ChangeNotifier, Document, DocumentDraft, DocumentId, Subscription};

/// Slot holding the serialised collection.
pub const DOCUMENTS_KEY: &str = "documents";

/// Document collection service.
pub struct DocumentStore<K> {
    slots: Arc<K>,
    notifier: ChangeNotifier,
    clock: Arc<dyn Clock>,
}

impl<K> Clone for DocumentStore<K> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
            notifier: self.notifier.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<K> DocumentStore<K>
where
    K: KeyValueStore,
{
    /// Create a store over `slots`, signalling changes through `notifier`.
    pub fn new(slots: Arc<K>, notifier: ChangeNotifier, clock: Arc<dyn Clock>) -> Self {
        Self {
            slots,
            notifier,
            clock,
        }
    }

    /// Current collection in insertion order.
    ///
    /// An absent slot is seeded with the default collection. An unreadable
    /// slot yields the default collection without touching storage.
    pub async fn list(&self) -> Vec<Document> {
        let raw = match self.slots.get(DOCUMENTS_KEY).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "documents slot unreadable; serving defaults");
                return default_documents();
            }
        };

        let Some(raw) = raw else {
            let defaults = default_documents();
            if self.persist(&defaults).await {
                info!(count = defaults.len(), "seeded default documents");
            }
            return defaults;
        };

        match serde_json::from_str::<Vec<Document>>(&raw) {
            Ok(documents) => documents,
            Err(err) => {
                warn!(error = %err, "documents slot corrupt; serving defaults");
                default_documents()
            }
        }
    }

    /// Look up one record by id.
    pub async fn get(&self, id: &DocumentId) -> Option<Document> {
        self.list().await.into_iter().find(|doc| &doc.id == id)
    }

    /// Append `draft` as a new record and return it.
    pub async fn add(&self, draft: DocumentDraft) -> Document {
        let now = self.clock.utc();
        let id = {
            let mut rng = rand::thread_rng();
            DocumentId::generate(now, &mut rng)
        };
        let document = draft.into_document(id, now.date_naive());

        let mut documents = self.list().await;
        documents.push(document.clone());
        if self.persist(&documents).await {
            self.notifier.notify();
            info!(id = %document.id, title = %document.title, "document added");
        }
        document
    }

    /// Remove every record with `id`. Returns whether anything matched.
    pub async fn remove(&self, id: &DocumentId) -> bool {
        let mut documents = self.list().await;
        let before = documents.len();
        documents.retain(|doc| &doc.id != id);
        if documents.len() == before {
            debug!(%id, "remove ignored unknown document");
            return false;
        }
        if self.persist(&documents).await {
            self.notifier.notify();
            info!(%id, "document removed");
        }
        true
    }

    /// Discard the collection and reseed the defaults.
    pub async fn reset_to_default(&self) {
        if let Err(err) = self.slots.remove(DOCUMENTS_KEY).await {
            warn!(error = %err, "failed to clear documents slot");
        }
        if self.persist(&default_documents()).await {
            self.notifier.notify();
            info!("documents reset to defaults");
        }
    }

    /// Append the certificate document when no record carries its id.
    ///
    /// Returns whether the document was inserted.
    pub async fn ensure_seed_document_exists(&self) -> bool {
        let mut documents = self.list().await;
        if documents
            .iter()
            .any(|doc| doc.id.as_ref() == CERTIFICATE_DOCUMENT_ID)
        {
            return false;
        }
        documents.push(certificate_document());
        if self.persist(&documents).await {
            self.notifier.notify();
            info!("certificate document restored");
        }
        true
    }

    /// Register a change listener.
    pub fn subscribe(&self) -> Subscription {
        self.notifier.subscribe()
    }

    /// Shared notifier, for wiring other producers into the same channel.
    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    async fn persist(&self, documents: &[Document]) -> bool {
        let encoded = match serde_json::to_string(documents) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(error = %err, "failed to encode documents");
                return false;
            }
        };
        match self.slots.set(DOCUMENTS_KEY, &encoded).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, bytes = encoded.len(), "failed to persist documents");
                false
            }
        }
    }
}
