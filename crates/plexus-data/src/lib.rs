//! # plexus-data
//!
//! Training-data feeds for Plexus: the [`Feed`] contract yielding
//! `{sample, label}` pairs with cursor semantics, and an in-memory
//! implementation with optional seeded shuffling.

pub mod feed;

pub use feed::{Feed, FeedItem, InMemoryFeed};
