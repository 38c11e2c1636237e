use chrono::{DateTime, Utc};

/// A user's link to a feed. Unique per `(user_id, feed_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub user_id: i64,
    pub feed_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(user_id: i64, feed_id: i64) -> Self {
        Self {
            user_id,
            feed_id,
            created_at: Utc::now(),
        }
    }
}
