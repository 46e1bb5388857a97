//! cinedb - in-memory catalog of movies, series and their users
//!
//! Content and users form a small graph: content links to related content
//! and carries one review per user; subscribers keep a set of favorite
//! content. A single [`CatalogStore`] owns both collections, maintains the
//! derived subsets (viewable / movies / series, admins / subscribers) and
//! rewrites its JSONL files after each mutation.
//!
//! # Modules
//!
//! - `domain`: Entities (Content, User, Review) and their ids
//! - `store`: CatalogStore, subset indices, persistence
//! - `search`: Query parsing, criteria, ranked search
//! - `config`: Layered path configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Movies rated 4 or better mentioning "heat"
//! cinedb search category movies minrating 4 heat
//!
//! # List series
//! cinedb list --scope series
//!
//! # Remove an entry and every reference to it
//! cinedb remove <content-id>
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod search;
pub mod store;

// Re-export main types at crate root for convenience
pub use domain::{
    Content, ContentDetails, ContentId, ContentKind, ContentSubset, Episode, Genre, Review, Role,
    Season, User, UserId, UserRole, Viewing,
};
pub use search::{CriteriaRegistry, Query, QueryError, SearchEngine, SearchHit};
pub use store::{
    CatalogStats, CatalogStore, ContentScope, JsonlPersistence, MemoryPersistence, Persistence,
    PersistenceError, StoreError, UserScope,
};
