//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: key-value slots on disk or in memory
//! - **object_storage**: reqwest client for the remote storage REST API
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod object_storage;
pub mod persistence;
