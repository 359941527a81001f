//! Object storage outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `ObjectStorage`
//! port for Supabase-compatible storage services.

mod dto;
mod http_storage;

pub use http_storage::HttpObjectStorage;
