//! Catalog storage: the authoritative collections and their indices.
//!
//! # Storage Layout
//!
//! ```text
//! ~/.cinedb/
//! ├── content.jsonl     # one Content per line
//! └── users.jsonl       # one User per line
//! ```
//!
//! Both files are rewritten in full after every mutation that touches
//! them.

pub mod catalog;
pub mod index;
pub mod persistence;

pub use catalog::{CatalogStats, CatalogStore, ContentScope, StoreError, UserScope};
pub use index::SubsetIndex;
pub use persistence::{JsonlPersistence, MemoryPersistence, Persistence, PersistenceError};
