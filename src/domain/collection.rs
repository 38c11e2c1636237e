/// Title of the per-user collection that records read entries.
pub const READ_COLLECTION: &str = "Read";

/// A named, per-user grouping of entries. Unique per `(user_id, title)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: i64,
    pub title: String,
    pub user_id: i64,
}

impl Collection {
    pub fn new(title: impl Into<String>, user_id: i64) -> Self {
        Self {
            id: 0,
            title: title.into(),
            user_id,
        }
    }
}

/// Membership row linking an entry (and its feed) to a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionEntry {
    pub entry_id: String,
    pub feed_id: i64,
    pub collection_id: i64,
}

/// Result of a membership lookup that may itself fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Member,
    NotMember,
    /// The lookup failed (missing collection or storage error).
    Unknown,
}

impl Membership {
    pub fn is_member(self) -> bool {
        self == Membership::Member
    }
}
