//! Persistence layer for the configuration store.
//!
//! The [`ConfigStore`] trait is the port every backend implements; the
//! embedded [`MemoryStore`] ships in-crate. A write goes through one
//! transaction that covers the entry mutation, its version snapshot, and its
//! audit row, so the three commit or roll back together. Values pass through
//! a [`ValueCodec`] on their way to and from storage.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod audit;
mod codec;
mod error;
mod memory;
mod traits;
mod version;

#[cfg(test)]
mod tests;

pub use codec::{Base64Codec, JsonCodec, ValueCodec};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use traits::{ConfigStore, SaveRequest, SortDirection, SortField, VersionSort};
