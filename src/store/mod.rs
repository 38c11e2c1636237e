pub mod collections;
pub mod entries;
pub mod error;
pub mod feeds;
pub mod sqlite;
pub mod subscriptions;

pub use collections::CollectionStore;
pub use entries::EntryStore;
pub use error::{Result, StoreError};
pub use feeds::FeedStore;
pub use sqlite::Database;
pub use subscriptions::SubscriptionStore;

/// Operations shared by every id-addressed store.
///
/// Failures never escape as panics; each call yields a [`StoreError`].
pub trait Repository<T> {
    type Id: ?Sized;

    /// Insert `item`, returning the stored value (with any assigned id).
    fn create(&self, item: &T) -> Result<T>;

    /// Replace the stored row with the same id. `NotFound` if absent.
    fn update(&self, item: &T) -> Result<T>;

    fn delete(&self, id: &Self::Id) -> Result<()>;

    fn find_by_id(&self, id: &Self::Id) -> Result<T>;
}
