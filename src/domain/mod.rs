pub mod collection;
pub mod entry;
pub mod feed;
pub mod media;
pub(crate) mod record;
pub mod subscription;

/// Parsed remote documents as produced by `feed-rs`.
pub use feed_rs::model::{Entry as RemoteEntry, Feed as RemoteFeed};

pub use collection::{Collection, CollectionEntry, Membership, READ_COLLECTION};
pub use entry::{sort_newest_first, Entry, EntryRecord, ReadStatus};
pub use feed::{Feed, FeedRecord};
pub use media::{Author, EntryContent, Image, Media, MediaContent};
pub use subscription::Subscription;
