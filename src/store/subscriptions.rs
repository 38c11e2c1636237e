use rusqlite::{named_params, Row};

use crate::domain::record::{decode_time, encode_time};
use crate::domain::Subscription;
use crate::store::sqlite::query_all;
use crate::store::{Database, Result, StoreError};

/// User ↔ feed links. Removing a subscription never removes the feed.
#[derive(Clone)]
pub struct SubscriptionStore {
    db: Database,
}

impl SubscriptionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Subscribe `user_id` to `feed_id`. A repeated subscription is a
    /// `ConstraintViolation`.
    pub fn create(&self, user_id: i64, feed_id: i64) -> Result<Subscription> {
        let subscription = Subscription::new(user_id, feed_id);
        let created_at = encode_time(Some(&subscription.created_at));
        let record = self.db.with_conn(|conn| {
            Ok(conn.query_row(
                "INSERT INTO subscriptions (user_id, feed_id, created_at)
                 VALUES (:user_id, :feed_id, :created_at)
                 RETURNING *",
                named_params! {
                    ":user_id": subscription.user_id,
                    ":feed_id": subscription.feed_id,
                    ":created_at": created_at,
                },
                subscription_record,
            )?)
        })?;
        record.into_subscription()
    }

    pub fn delete(&self, user_id: i64, feed_id: i64) -> Result<()> {
        let deleted = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM subscriptions WHERE user_id = :user_id AND feed_id = :feed_id",
                named_params! { ":user_id": user_id, ":feed_id": feed_id },
            )?)
        })?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!(
                "subscription of user {} to feed {}",
                user_id, feed_id
            )));
        }
        Ok(())
    }

    pub fn get_subscriptions_by_user_id(&self, user_id: i64) -> Result<Vec<Subscription>> {
        let records = self.db.with_conn(|conn| {
            query_all(
                conn,
                "SELECT * FROM subscriptions WHERE user_id = :user_id ORDER BY created_at, feed_id",
                named_params! { ":user_id": user_id },
                subscription_record,
            )
        })?;
        records
            .into_iter()
            .map(SubscriptionRecord::into_subscription)
            .collect()
    }

    pub fn exists(&self, user_id: i64, feed_id: i64) -> Result<bool> {
        self.db.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM subscriptions WHERE user_id = :user_id AND feed_id = :feed_id",
                named_params! { ":user_id": user_id, ":feed_id": feed_id },
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }
}

struct SubscriptionRecord {
    user_id: i64,
    feed_id: i64,
    created_at: String,
}

impl SubscriptionRecord {
    fn into_subscription(self) -> Result<Subscription> {
        let created_at = decode_time("created_at", Some(&self.created_at))?
            .ok_or_else(|| StoreError::Serialization("created_at: missing".into()))?;
        Ok(Subscription {
            user_id: self.user_id,
            feed_id: self.feed_id,
            created_at,
        })
    }
}

fn subscription_record(row: &Row<'_>) -> rusqlite::Result<SubscriptionRecord> {
    Ok(SubscriptionRecord {
        user_id: row.get("user_id")?,
        feed_id: row.get("feed_id")?,
        created_at: row.get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Feed;
    use crate::store::{FeedStore, Repository};

    fn setup() -> (SubscriptionStore, FeedStore, i64) {
        let db = Database::in_memory().unwrap();
        let feeds = FeedStore::new(db.clone());
        let feed = feeds
            .create(&Feed::new("https://example.com/feed.xml".into()))
            .unwrap();
        (SubscriptionStore::new(db), feeds, feed.id)
    }

    #[test]
    fn test_subscribe_and_list() {
        let (store, _, feed_id) = setup();
        store.create(1, feed_id).unwrap();

        let subs = store.get_subscriptions_by_user_id(1).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].feed_id, feed_id);
        assert!(store.get_subscriptions_by_user_id(2).unwrap().is_empty());
        assert!(store.exists(1, feed_id).unwrap());
        assert!(!store.exists(2, feed_id).unwrap());
    }

    #[test]
    fn test_duplicate_subscription_is_constraint_violation() {
        let (store, _, feed_id) = setup();
        store.create(1, feed_id).unwrap();
        assert!(store.create(1, feed_id).unwrap_err().is_constraint_violation());
        store.create(2, feed_id).unwrap();
    }

    #[test]
    fn test_unsubscribe_keeps_feed() {
        let (store, feeds, feed_id) = setup();
        store.create(1, feed_id).unwrap();
        store.create(2, feed_id).unwrap();

        store.delete(1, feed_id).unwrap();
        assert!(!store.exists(1, feed_id).unwrap());
        assert!(store.exists(2, feed_id).unwrap());
        assert!(feeds.find_by_id(&feed_id).is_ok());

        assert!(store.delete(1, feed_id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_malformed_created_at_is_serialization_error() {
        let (store, _, feed_id) = setup();
        store.create(1, feed_id).unwrap();
        store
            .db
            .with_conn(|conn| {
                conn.execute("UPDATE subscriptions SET created_at = 'last tuesday'", [])?;
                Ok(())
            })
            .unwrap();

        let err = store.get_subscriptions_by_user_id(1).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(ref msg) if msg.starts_with("created_at")));
    }

    #[test]
    fn test_subscribe_unknown_feed_fails() {
        let (store, _, feed_id) = setup();
        assert!(store
            .create(1, feed_id + 1)
            .unwrap_err()
            .is_constraint_violation());
    }
}
