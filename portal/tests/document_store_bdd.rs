//! Behaviour tests for the document collection kept in the `documents` slot.

use std::cell::RefCell;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use portal::domain::ports::KeyValueStore;
use portal::domain::{
    ChangeNotifier, DOCUMENTS_KEY, Document, DocumentDraft, DocumentId, DocumentStore,
    Subscription,
};
use portal::outbound::persistence::InMemoryKeyValueStore;
use portal::test_support::MutableClock;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

const CORRUPT_SLOT: &str = "{not json";

struct DocumentStoreWorld {
    slots: RefCell<Arc<InMemoryKeyValueStore>>,
    store: RefCell<Option<DocumentStore<InMemoryKeyValueStore>>>,
    subscription: RefCell<Option<Subscription>>,
    listed: RefCell<Vec<Document>>,
}

impl DocumentStoreWorld {
    fn new() -> Self {
        Self {
            slots: RefCell::new(Arc::new(InMemoryKeyValueStore::new())),
            store: RefCell::new(None),
            subscription: RefCell::new(None),
            listed: RefCell::new(Vec::new()),
        }
    }

    fn use_slots(&self, slots: InMemoryKeyValueStore) {
        let slots = Arc::new(slots);
        let clock = Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
                .single()
                .expect("valid instant"),
        ));
        *self.store.borrow_mut() = Some(DocumentStore::new(
            Arc::clone(&slots),
            ChangeNotifier::new(),
            clock,
        ));
        *self.slots.borrow_mut() = slots;
    }

    fn store(&self) -> DocumentStore<InMemoryKeyValueStore> {
        self.store
            .borrow()
            .as_ref()
            .expect("slot configured by a given step")
            .clone()
    }

    fn raw_slot(&self) -> Option<String> {
        let slots = Arc::clone(&self.slots.borrow());
        futures::executor::block_on(slots.get(DOCUMENTS_KEY)).expect("slot read")
    }

    fn refresh(&self) {
        let documents = futures::executor::block_on(self.store().list());
        *self.listed.borrow_mut() = documents;
    }
}

#[fixture]
fn world() -> DocumentStoreWorld {
    DocumentStoreWorld::new()
}

#[given("an empty documents slot")]
fn an_empty_documents_slot(world: &DocumentStoreWorld) {
    world.use_slots(InMemoryKeyValueStore::new());
}

#[given("a documents slot containing corrupt data")]
fn a_corrupt_documents_slot(world: &DocumentStoreWorld) {
    world.use_slots(InMemoryKeyValueStore::with_entries([(
        DOCUMENTS_KEY,
        CORRUPT_SLOT,
    )]));
}

#[given("a subscriber to collection changes")]
fn a_subscriber(world: &DocumentStoreWorld) {
    *world.subscription.borrow_mut() = Some(world.store().subscribe());
}

#[when("the collection is listed")]
fn the_collection_is_listed(world: &DocumentStoreWorld) {
    world.refresh();
}

#[when("a document titled {title} is added")]
fn a_document_is_added(world: &DocumentStoreWorld, title: String) {
    let draft = DocumentDraft::new(title, "Figures for the quarter").expect("valid draft");
    futures::executor::block_on(world.store().add(draft));
    world.refresh();
}

#[when("the certificate document is removed")]
fn the_certificate_is_removed(world: &DocumentStoreWorld) {
    let id = DocumentId::new("certificate").expect("valid id");
    assert!(futures::executor::block_on(world.store().remove(&id)));
    world.refresh();
    assert!(world.listed.borrow().is_empty());
}

#[when("the seed document is ensured")]
fn the_seed_document_is_ensured(world: &DocumentStoreWorld) {
    assert!(futures::executor::block_on(
        world.store().ensure_seed_document_exists()
    ));
    world.refresh();
}

#[then("the collection holds only the certificate document")]
fn only_the_certificate(world: &DocumentStoreWorld) {
    let listed = world.listed.borrow();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id.as_ref(), "certificate");
}

#[then("the collection holds {count} documents")]
fn the_collection_holds(world: &DocumentStoreWorld, count: usize) {
    assert_eq!(world.listed.borrow().len(), count);
}

#[then("the newest document id starts with the current timestamp")]
fn newest_id_is_time_based(world: &DocumentStoreWorld) {
    let listed = world.listed.borrow();
    let newest = listed.last().expect("at least one document");
    assert!(newest.id.as_ref().starts_with("1741944600000-"));
    assert_eq!(newest.created_at.to_string(), "2025-03-14");
}

#[then("the subscriber was notified")]
fn the_subscriber_was_notified(world: &DocumentStoreWorld) {
    let mut subscription = world.subscription.borrow_mut();
    let subscription = subscription.as_mut().expect("subscribed");
    assert!(subscription.try_changed());
}

#[then("the documents slot has been written")]
fn the_slot_has_been_written(world: &DocumentStoreWorld) {
    let raw = world.raw_slot().expect("slot written");
    assert!(raw.contains("\"certificate\""));
}

#[then("the documents slot still contains the corrupt data")]
fn the_slot_is_untouched(world: &DocumentStoreWorld) {
    assert_eq!(world.raw_slot().as_deref(), Some(CORRUPT_SLOT));
}

#[scenario(path = "tests/features/document_store.feature")]
fn document_store_scenarios(world: DocumentStoreWorld) {
    drop(world);
}
