use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use url::Url;

use crate::app::error::{AppError, Result};
use crate::config::Config;
use crate::domain::{
    sort_newest_first, Collection, Entry, Feed, ReadStatus, READ_COLLECTION,
};
use crate::fetcher::{FetchResult, Fetcher, HttpFetcher, Validators};
use crate::normalizer::Normalizer;
use crate::store::{
    CollectionStore, Database, EntryStore, FeedStore, Repository, StoreError,
    SubscriptionStore,
};

/// Result of refreshing every subscription of a user.
#[derive(Debug, Default)]
pub struct Refresh {
    /// Entries of all refreshed feeds, newest first
    pub posts: Vec<Entry>,
    /// One line per feed that could not be refreshed
    pub notices: Vec<String>,
}

/// Subscribe, refresh and read workflows on top of the stores.
///
/// Each remote fetch is bounded by `timeout`; feeds are refreshed one after
/// another.
#[derive(Clone)]
pub struct Reader {
    feeds: FeedStore,
    entries: EntryStore,
    subscriptions: SubscriptionStore,
    collections: CollectionStore,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    timeout: Duration,
}

impl Reader {
    pub fn new(db: Database, fetcher: Arc<dyn Fetcher + Send + Sync>, timeout: Duration) -> Self {
        Self {
            feeds: FeedStore::new(db.clone()),
            entries: EntryStore::new(db.clone()),
            subscriptions: SubscriptionStore::new(db.clone()),
            collections: CollectionStore::new(db),
            fetcher,
            normalizer: Normalizer::new(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let db = Database::open(config.database_path()?)?;
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetch)?);
        Ok(Self::new(
            db,
            fetcher,
            Duration::from_secs(config.fetch.timeout_secs),
        ))
    }

    /// Subscribe `user_id` to the feed at `feed_url`.
    ///
    /// A feed seen for the first time is fetched and stored with its entries.
    /// Subscribing twice is a no-op.
    pub async fn subscribe(&self, user_id: i64, feed_url: &str) -> Result<Feed> {
        let feed_url = feed_url.trim();
        Url::parse(feed_url)?;

        let feed = match self.feeds.find_by_url(feed_url)? {
            Some(feed) => feed,
            None => self.add_feed(feed_url).await?,
        };

        if self.subscriptions.exists(user_id, feed.id)? {
            tracing::info!("User {} already subscribed to {}", user_id, feed.feed_link);
        } else {
            self.subscriptions.create(user_id, feed.id)?;
            tracing::info!("User {} subscribed to {}", user_id, feed.feed_link);
        }

        Ok(feed)
    }

    /// Drop the subscription and the user's collection memberships for the
    /// feed's entries. The feed and its entries stay for other subscribers.
    pub fn unsubscribe(&self, user_id: i64, feed_id: i64) -> Result<()> {
        self.subscriptions.delete(user_id, feed_id)?;
        let cleared = self.collections.remove_entries_by_feed_id(user_id, feed_id)?;
        tracing::info!(
            "User {} unsubscribed from feed {} ({} collection entries cleared)",
            user_id,
            feed_id,
            cleared
        );
        Ok(())
    }

    /// Fetch every subscribed feed and return the combined post list.
    ///
    /// A feed that fails to fetch, parse or store is skipped and reported
    /// in [`Refresh::notices`].
    pub async fn refresh_all(&self, user_id: i64) -> Result<Refresh> {
        let subscriptions = self.subscriptions.get_subscriptions_by_user_id(user_id)?;
        let mut refresh = Refresh::default();

        for subscription in subscriptions {
            let feed = match self.feeds.find_by_id(&subscription.feed_id) {
                Ok(feed) => feed,
                Err(e) => {
                    refresh
                        .notices
                        .push(format!("Feed {} unavailable: {}", subscription.feed_id, e));
                    continue;
                }
            };

            let stored = match self.refresh_feed(&feed).await {
                Ok(_) => self.entries.find_by_feed_id(feed.id).map_err(AppError::from),
                Err(e) => Err(e),
            };

            match stored {
                Ok(entries) => refresh.posts.extend(entries),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", feed.feed_link, e);
                    refresh
                        .notices
                        .push(format!("Could not refresh {}: {}", feed.display_title(), e));
                }
            }
        }

        refresh.posts = self.flag_read(user_id, refresh.posts);
        sort_newest_first(&mut refresh.posts);
        Ok(refresh)
    }

    /// Feed addressed by `slug` with its stored entries attached.
    pub fn feed_page(&self, user_id: i64, slug: &str) -> Result<Feed> {
        let mut feed = self.feeds.find_by_slug(slug)?;
        let mut entries = self.flag_read(user_id, self.entries.find_by_feed_id(feed.id)?);
        sort_newest_first(&mut entries);
        feed.entries = entries;
        Ok(feed)
    }

    pub fn entry(&self, user_id: i64, entry_id: &str) -> Result<Entry> {
        let entry = self.entries.find_by_id(entry_id)?;
        Ok(self.with_read_flag(user_id, entry))
    }

    /// Read state is per user: it lives in the user's `Read` collection and
    /// never in the shared entry row.
    pub fn mark_read(&self, user_id: i64, entry_id: &str) -> Result<Entry> {
        let entry = self.entries.find_by_id(entry_id)?;
        let read = self.collections.find_or_create(user_id, READ_COLLECTION)?;
        self.collections.add_entry(entry.id(), entry.feed_id(), read.id)?;
        Ok(entry.with_read(true))
    }

    pub fn mark_unread(&self, user_id: i64, entry_id: &str) -> Result<Entry> {
        let entry = self.entries.find_by_id(entry_id)?;
        match self
            .collections
            .remove_entry_by_collection_title(entry.id(), user_id, READ_COLLECTION)
        {
            Ok(()) | Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(entry.with_read(false))
    }

    pub fn subscribed_feeds(&self, user_id: i64) -> Result<Vec<Feed>> {
        self.subscriptions
            .get_subscriptions_by_user_id(user_id)?
            .iter()
            .map(|s| self.feeds.find_by_id(&s.feed_id).map_err(AppError::from))
            .collect()
    }

    pub fn entries_by_status(&self, user_id: i64, status: ReadStatus) -> Result<Vec<Entry>> {
        Ok(self.entries.find_by_user_status(user_id, status)?)
    }

    /// The user's collections with their entry counts.
    pub fn user_collections(&self, user_id: i64) -> Result<Vec<(Collection, usize)>> {
        let mut counted = Vec::new();
        for collection in self.collections.find_collections_by_user_id(user_id)? {
            let count = self.collections.get_collection_entry_ids(collection.id)?.len();
            counted.push((collection, count));
        }
        Ok(counted)
    }

    async fn add_feed(&self, feed_url: &str) -> Result<Feed> {
        let (body, validators) = match self.fetch(feed_url, &Validators::none()).await? {
            FetchResult::Fetched { body, validators } => (body, validators),
            FetchResult::NotModified => {
                return Err(AppError::FetchFailed {
                    url: feed_url.to_string(),
                    reason: "not modified on first fetch".into(),
                })
            }
        };
        let remote = self.normalizer.parse(&body)?;

        let mut feed = Feed::from_remote(&remote, feed_url);
        feed.etag = validators.etag;
        feed.last_modified = validators.last_modified;
        feed.last_fetched_at = Some(Utc::now());
        let feed = self.feeds.create(&feed)?;

        let entries = feed.entries_from_remote(&remote);
        let inserted = self.entries.insert_new(&entries)?;
        tracing::info!("Added feed {} with {} entries", feed.display_title(), inserted);
        Ok(feed)
    }

    /// Conditional fetch of one feed. Returns the number of new entries.
    async fn refresh_feed(&self, feed: &Feed) -> Result<usize> {
        let mut updated = feed.clone();
        updated.last_fetched_at = Some(Utc::now());

        let inserted = match self.fetch(&feed.feed_link, &Validators::from_feed(feed)).await? {
            FetchResult::NotModified => {
                tracing::debug!("{} not modified", feed.feed_link);
                self.feeds.update(&updated)?;
                0
            }
            FetchResult::Fetched { body, validators } => {
                let remote = self.normalizer.parse(&body)?;
                updated.apply_remote(&remote);
                updated.etag = validators.etag;
                updated.last_modified = validators.last_modified;
                let updated = self.feeds.update(&updated)?;
                self.entries.insert_new(&updated.entries_from_remote(&remote))?
            }
        };

        if inserted > 0 {
            tracing::info!("{} new entries from {}", inserted, feed.display_title());
        }
        Ok(inserted)
    }

    async fn fetch(&self, url: &str, validators: &Validators) -> Result<FetchResult> {
        match tokio::time::timeout(self.timeout, self.fetcher.fetch(url, validators)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::FetchFailed {
                url: url.to_string(),
                reason: format!("timed out after {:?}", self.timeout),
            }),
        }
    }

    fn with_read_flag(&self, user_id: i64, entry: Entry) -> Entry {
        let read = self
            .collections
            .is_entry_in_collection(entry.id(), user_id, READ_COLLECTION);
        entry.with_read(read)
    }

    fn flag_read(&self, user_id: i64, entries: Vec<Entry>) -> Vec<Entry> {
        entries
            .into_iter()
            .map(|e| self.with_read_flag(user_id, e))
            .collect()
    }
}
