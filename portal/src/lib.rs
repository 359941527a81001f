//! Document portal library.
//!
//! A user directory with a persisted login session, a document collection
//! kept in one key-value slot, inline file ingestion, and an adapter for a
//! Supabase-compatible object store. The `portal` binary drives these
//! through [`inbound::cli`].

pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod settings;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
