use rusqlite::{named_params, OptionalExtension, Row};

use crate::domain::{Collection, CollectionEntry, Membership};
use crate::store::sqlite::query_all;
use crate::store::{Database, Repository, Result, StoreError};

/// Per-user collections and their entry memberships.
#[derive(Clone)]
pub struct CollectionStore {
    db: Database,
}

impl CollectionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Collection `title` owned by `user_id`.
    pub fn find_by_title(&self, title: &str, user_id: i64) -> Result<Collection> {
        self.find_user_collection_by_title(user_id, title)
    }

    pub fn find_user_collection_by_title(&self, user_id: i64, title: &str) -> Result<Collection> {
        let collection = self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT * FROM collections WHERE user_id = :user_id AND title = :title",
                    named_params! { ":user_id": user_id, ":title": title },
                    collection_row,
                )
                .optional()?)
        })?;
        collection.ok_or_else(|| {
            StoreError::NotFound(format!("collection {} of user {}", title, user_id))
        })
    }

    pub fn find_collections_by_user_id(&self, user_id: i64) -> Result<Vec<Collection>> {
        self.db.with_conn(|conn| {
            query_all(
                conn,
                "SELECT * FROM collections WHERE user_id = :user_id ORDER BY title",
                named_params! { ":user_id": user_id },
                collection_row,
            )
        })
    }

    /// Collections are created lazily, the first time they are needed.
    pub fn find_or_create(&self, user_id: i64, title: &str) -> Result<Collection> {
        match self.find_user_collection_by_title(user_id, title) {
            Err(StoreError::NotFound(_)) => {
                tracing::debug!("Creating collection {} for user {}", title, user_id);
                self.create(&Collection::new(title, user_id))
            }
            other => other,
        }
    }

    /// Add an entry to a collection. Adding an existing membership is a no-op.
    pub fn add_entry(&self, entry_id: &str, feed_id: i64, collection_id: i64) -> Result<CollectionEntry> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO collection_entries (entry_id, feed_id, collection_id)
                 VALUES (:entry_id, :feed_id, :collection_id)",
                named_params! {
                    ":entry_id": entry_id,
                    ":feed_id": feed_id,
                    ":collection_id": collection_id,
                },
            )?;
            Ok(CollectionEntry {
                entry_id: entry_id.to_string(),
                feed_id,
                collection_id,
            })
        })
    }

    pub fn add_entry_to_collection_by_title(
        &self,
        entry_id: &str,
        user_id: i64,
        feed_id: i64,
        title: &str,
    ) -> Result<CollectionEntry> {
        let collection = self.find_user_collection_by_title(user_id, title)?;
        self.add_entry(entry_id, feed_id, collection.id)
    }

    /// Remove an entry from every collection. Returns the number of rows removed.
    pub fn remove_entry(&self, entry_id: &str) -> Result<usize> {
        self.db.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM collection_entries WHERE entry_id = :entry_id",
                named_params! { ":entry_id": entry_id },
            )?)
        })
    }

    pub fn remove_entry_by_collection_id(&self, entry_id: &str, collection_id: i64) -> Result<()> {
        let removed = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM collection_entries
                 WHERE entry_id = :entry_id AND collection_id = :collection_id",
                named_params! { ":entry_id": entry_id, ":collection_id": collection_id },
            )?)
        })?;
        if removed == 0 {
            return Err(StoreError::NotFound(format!(
                "entry {} in collection {}",
                entry_id, collection_id
            )));
        }
        Ok(())
    }

    pub fn remove_entry_by_collection_title(&self, entry_id: &str, user_id: i64, title: &str) -> Result<()> {
        let collection = self.find_user_collection_by_title(user_id, title)?;
        self.remove_entry_by_collection_id(entry_id, collection.id)
    }

    /// Clear memberships of `feed_id`'s entries from all of `user_id`'s
    /// collections. Other users and feeds are untouched.
    pub fn remove_entries_by_feed_id(&self, user_id: i64, feed_id: i64) -> Result<usize> {
        self.db.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM collection_entries
                 WHERE feed_id = :feed_id
                   AND collection_id IN (SELECT id FROM collections WHERE user_id = :user_id)",
                named_params! { ":feed_id": feed_id, ":user_id": user_id },
            )?)
        })
    }

    pub fn get_collection_entry_ids(&self, collection_id: i64) -> Result<Vec<String>> {
        self.db.with_conn(|conn| {
            query_all(
                conn,
                "SELECT entry_id FROM collection_entries WHERE collection_id = :collection_id",
                named_params! { ":collection_id": collection_id },
                |row| row.get(0),
            )
        })
    }

    pub fn membership(&self, entry_id: &str, user_id: i64, title: &str) -> Membership {
        let result = self.db.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT ce.entry_id
                     FROM collection_entries ce
                     JOIN collections c ON c.id = ce.collection_id
                     WHERE c.user_id = :user_id AND c.title = :title AND ce.entry_id = :entry_id",
                    named_params! { ":user_id": user_id, ":title": title, ":entry_id": entry_id },
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(found.is_some())
        });

        match result {
            Ok(true) => Membership::Member,
            Ok(false) => Membership::NotMember,
            Err(e) => {
                tracing::warn!("Membership lookup for entry {} failed: {}", entry_id, e);
                Membership::Unknown
            }
        }
    }

    /// `true` only when membership is confirmed; any failure reads as `false`.
    pub fn is_entry_in_collection(&self, entry_id: &str, user_id: i64, title: &str) -> bool {
        self.membership(entry_id, user_id, title).is_member()
    }
}

impl Repository<Collection> for CollectionStore {
    type Id = i64;

    /// A second collection with the same `(user_id, title)` is a
    /// `ConstraintViolation`.
    fn create(&self, collection: &Collection) -> Result<Collection> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row(
                "INSERT INTO collections (title, user_id) VALUES (:title, :user_id) RETURNING *",
                named_params! { ":title": collection.title, ":user_id": collection.user_id },
                collection_row,
            )?)
        })
    }

    fn update(&self, collection: &Collection) -> Result<Collection> {
        let updated = self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "UPDATE collections SET title = :title, user_id = :user_id
                     WHERE id = :id RETURNING *",
                    named_params! {
                        ":id": collection.id,
                        ":title": collection.title,
                        ":user_id": collection.user_id,
                    },
                    collection_row,
                )
                .optional()?)
        })?;
        updated.ok_or_else(|| StoreError::NotFound(format!("collection {}", collection.id)))
    }

    fn delete(&self, id: &i64) -> Result<()> {
        let deleted = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM collections WHERE id = :id",
                named_params! { ":id": id },
            )?)
        })?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("collection {}", id)));
        }
        Ok(())
    }

    fn find_by_id(&self, id: &i64) -> Result<Collection> {
        let collection = self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT * FROM collections WHERE id = :id",
                    named_params! { ":id": id },
                    collection_row,
                )
                .optional()?)
        })?;
        collection.ok_or_else(|| StoreError::NotFound(format!("collection {}", id)))
    }
}

fn collection_row(row: &Row<'_>) -> rusqlite::Result<Collection> {
    Ok(Collection {
        id: row.get("id")?,
        title: row.get("title")?,
        user_id: row.get("user_id")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entry, Feed, READ_COLLECTION};
    use crate::store::{EntryStore, FeedStore};
    use feed_rs::parser;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <item><title>One</title><guid>one</guid><pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate></item>
    <item><title>Two</title><guid>two</guid><pubDate>Tue, 02 Jan 2024 00:00:00 GMT</pubDate></item>
  </channel>
</rss>"#;

    struct Fixture {
        collections: CollectionStore,
        feed_a: Feed,
        feed_b: Feed,
        entries_a: Vec<Entry>,
        entries_b: Vec<Entry>,
    }

    fn fixture() -> Fixture {
        let db = Database::in_memory().unwrap();
        let feeds = FeedStore::new(db.clone());
        let entries = EntryStore::new(db.clone());

        let remote = parser::parse(RSS_SAMPLE.as_bytes()).unwrap();
        let feed_a = feeds
            .create(&Feed::from_remote(&remote, "https://a.example/feed.xml"))
            .unwrap();
        let feed_b = feeds
            .create(&Feed::from_remote(&remote, "https://b.example/feed.xml"))
            .unwrap();

        // Same guids in both feeds hash to the same id, so give feed B its own.
        let entries_a = feed_a.entries_from_remote(&remote);
        let remote_b = parser::parse(RSS_SAMPLE.replace("<guid>", "<guid>b-").as_bytes()).unwrap();
        let entries_b = feed_b.entries_from_remote(&remote_b);
        entries.insert_new(&entries_a).unwrap();
        entries.insert_new(&entries_b).unwrap();

        Fixture {
            collections: CollectionStore::new(db),
            feed_a,
            feed_b,
            entries_a,
            entries_b,
        }
    }

    #[test]
    fn test_create_and_find() {
        let f = fixture();
        let created = f.collections.create(&Collection::new("Favorites", 1)).unwrap();
        assert!(created.id > 0);

        assert_eq!(f.collections.find_by_id(&created.id).unwrap(), created);
        assert_eq!(f.collections.find_by_title("Favorites", 1).unwrap(), created);
        assert_eq!(
            f.collections.find_user_collection_by_title(1, "Favorites").unwrap(),
            created
        );
        assert!(f
            .collections
            .find_user_collection_by_title(2, "Favorites")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_duplicate_title_per_user_is_constraint_violation() {
        let f = fixture();
        f.collections.create(&Collection::new(READ_COLLECTION, 1)).unwrap();
        let err = f
            .collections
            .create(&Collection::new(READ_COLLECTION, 1))
            .unwrap_err();
        assert!(err.is_constraint_violation());

        // Another user may reuse the title.
        f.collections.create(&Collection::new(READ_COLLECTION, 2)).unwrap();
    }

    #[test]
    fn test_find_or_create_is_lazy_and_stable() {
        let f = fixture();
        let first = f.collections.find_or_create(1, READ_COLLECTION).unwrap();
        let second = f.collections.find_or_create(1, READ_COLLECTION).unwrap();
        assert_eq!(first, second);
        assert_eq!(f.collections.find_collections_by_user_id(1).unwrap().len(), 1);
    }

    #[test]
    fn test_update_and_delete() {
        let f = fixture();
        let mut collection = f.collections.create(&Collection::new("Later", 1)).unwrap();
        collection.title = "Someday".into();
        assert_eq!(f.collections.update(&collection).unwrap().title, "Someday");

        f.collections.delete(&collection.id).unwrap();
        assert!(f.collections.find_by_id(&collection.id).unwrap_err().is_not_found());
        assert!(f.collections.delete(&collection.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_add_entry_is_idempotent() {
        let f = fixture();
        let read = f.collections.find_or_create(1, READ_COLLECTION).unwrap();
        let entry = &f.entries_a[0];

        f.collections.add_entry(entry.id(), f.feed_a.id, read.id).unwrap();
        f.collections.add_entry(entry.id(), f.feed_a.id, read.id).unwrap();

        let ids = f.collections.get_collection_entry_ids(read.id).unwrap();
        assert_eq!(ids, vec![entry.id().to_string()]);
    }

    #[test]
    fn test_add_entry_by_title() {
        let f = fixture();
        let entry = &f.entries_a[0];
        assert!(f
            .collections
            .add_entry_to_collection_by_title(entry.id(), 1, f.feed_a.id, "Missing")
            .unwrap_err()
            .is_not_found());

        f.collections.find_or_create(1, READ_COLLECTION).unwrap();
        f.collections
            .add_entry_to_collection_by_title(entry.id(), 1, f.feed_a.id, READ_COLLECTION)
            .unwrap();
        assert!(f.collections.is_entry_in_collection(entry.id(), 1, READ_COLLECTION));
    }

    #[test]
    fn test_membership_states() {
        let f = fixture();
        let entry = &f.entries_a[0];
        assert_eq!(
            f.collections.membership(entry.id(), 1, READ_COLLECTION),
            Membership::NotMember
        );
        assert!(!f.collections.is_entry_in_collection(entry.id(), 1, READ_COLLECTION));

        let read = f.collections.find_or_create(1, READ_COLLECTION).unwrap();
        f.collections.add_entry(entry.id(), f.feed_a.id, read.id).unwrap();
        assert_eq!(
            f.collections.membership(entry.id(), 1, READ_COLLECTION),
            Membership::Member
        );
        assert!(!f.collections.is_entry_in_collection(entry.id(), 2, READ_COLLECTION));
    }

    #[test]
    fn test_lookup_failure_reads_as_not_member() {
        let f = fixture();
        f.collections
            .db
            .with_conn(|conn| {
                conn.execute_batch("DROP TABLE collection_entries")?;
                Ok(())
            })
            .unwrap();

        assert_eq!(
            f.collections.membership("anything", 1, READ_COLLECTION),
            Membership::Unknown
        );
        assert!(!f.collections.is_entry_in_collection("anything", 1, READ_COLLECTION));
    }

    #[test]
    fn test_remove_entry_variants() {
        let f = fixture();
        let read = f.collections.find_or_create(1, READ_COLLECTION).unwrap();
        let favs = f.collections.find_or_create(1, "Favorites").unwrap();
        let entry = &f.entries_a[0];

        f.collections.add_entry(entry.id(), f.feed_a.id, read.id).unwrap();
        f.collections.add_entry(entry.id(), f.feed_a.id, favs.id).unwrap();

        f.collections
            .remove_entry_by_collection_title(entry.id(), 1, "Favorites")
            .unwrap();
        assert!(!f.collections.is_entry_in_collection(entry.id(), 1, "Favorites"));
        assert!(f.collections.is_entry_in_collection(entry.id(), 1, READ_COLLECTION));

        assert!(f
            .collections
            .remove_entry_by_collection_id(entry.id(), favs.id)
            .unwrap_err()
            .is_not_found());

        f.collections.add_entry(entry.id(), f.feed_a.id, favs.id).unwrap();
        assert_eq!(f.collections.remove_entry(entry.id()).unwrap(), 2);
        assert!(f.collections.get_collection_entry_ids(read.id).unwrap().is_empty());
    }

    #[test]
    fn test_remove_entries_by_feed_id_is_scoped() {
        let f = fixture();
        let read_1 = f.collections.find_or_create(1, READ_COLLECTION).unwrap();
        let favs_1 = f.collections.find_or_create(1, "Favorites").unwrap();
        let read_2 = f.collections.find_or_create(2, READ_COLLECTION).unwrap();

        for entry in &f.entries_a {
            f.collections.add_entry(entry.id(), f.feed_a.id, read_1.id).unwrap();
            f.collections.add_entry(entry.id(), f.feed_a.id, favs_1.id).unwrap();
            f.collections.add_entry(entry.id(), f.feed_a.id, read_2.id).unwrap();
        }
        for entry in &f.entries_b {
            f.collections.add_entry(entry.id(), f.feed_b.id, read_1.id).unwrap();
        }

        let removed = f.collections.remove_entries_by_feed_id(1, f.feed_a.id).unwrap();
        assert_eq!(removed, 4);

        let remaining_read_1 = f.collections.get_collection_entry_ids(read_1.id).unwrap();
        let expected_b: Vec<String> = f.entries_b.iter().map(|e| e.id().to_string()).collect();
        assert_eq!(remaining_read_1.len(), 2);
        assert!(remaining_read_1.iter().all(|id| expected_b.contains(id)));
        assert!(f.collections.get_collection_entry_ids(favs_1.id).unwrap().is_empty());
        assert_eq!(f.collections.get_collection_entry_ids(read_2.id).unwrap().len(), 2);
    }
}
