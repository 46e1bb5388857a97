//! Domain types for the catalog.
//!
//! This module contains the entity graph:
//! - Content: generic entries, viewable content, movies, series
//! - User: admins and subscribers
//! - Review: one per user per content
//!
//! Entities refer to each other by id only.

pub mod content;
pub mod review;
pub mod user;

pub use content::{
    Content, ContentDetails, ContentId, ContentKind, ContentSubset, Episode, Genre, Season,
    Viewing,
};
pub use review::Review;
pub use user::{Role, User, UserId, UserRole};
