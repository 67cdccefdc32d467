//! In-memory implementations of the Drumbeat store traits.
//!
//! Backed by `tokio::sync::RwLock` maps. Used by tests and by embedders
//! that have not wired a database; the production persistence layer
//! implements the same traits externally.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod memory;

pub use memory::{
    MemoryAccountStore, MemoryContentStore, MemoryKeywordStore, MemoryQueueStore, MemoryRunStore,
    MemoryTokenStore,
};
