//! # Current
//!
//! A personal RSS/Atom feed reader backed by SQLite.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Normalizer → Domain → Store
//!                 ↑                  ↓
//!                 └──── Reader ──────┘
//! ```
//!
//! Remote documents are parsed by `feed-rs` and mapped into immutable
//! [`Entry`](domain::Entry) values with derived fields (stable id, slug,
//! summary, featured image). Entries, feeds, subscriptions and collections
//! are persisted through per-table stores sharing one [`Database`](store::Database).
//!
//! ## Quick Start
//!
//! ```bash
//! # Subscribe to a feed
//! current subscribe https://blog.rust-lang.org/feed.xml
//!
//! # Fetch everything and print the post list
//! current refresh
//!
//! # Read a feed page
//! current feed rust-blog
//! ```

/// Subscribe, refresh and read workflows, plus the application error type.
pub mod app;

/// Command-line interface using clap.
///
/// - `subscribe <url>` / `unsubscribe <feed-id>`
/// - `feeds`, `refresh`, `feed <slug>`
/// - `show <id>`, `read <id>`, `unread <id>`
/// - `list [--status read|unread]`, `collections`
pub mod cli;

/// Configuration loaded from `~/.config/current/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Entry`](domain::Entry): normalized feed entry with a SHA-256 id
/// - [`Feed`](domain::Feed): feed metadata and cache validators
/// - [`Subscription`](domain::Subscription), [`Collection`](domain::Collection)
pub mod domain;

/// HTTP fetching with conditional request support.
pub mod fetcher;

/// Feed parsing and derived-field helpers.
pub mod normalizer;

/// SQLite persistence layer.
///
/// Every operation returns a [`store::Result`]; storage failures are
/// translated into [`StoreError`](store::StoreError) at the boundary.
pub mod store;
