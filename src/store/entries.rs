use rusqlite::{named_params, OptionalExtension, Row};

use crate::domain::{Entry, EntryRecord, ReadStatus, READ_COLLECTION};
use crate::store::sqlite::{query_all, NamedParams};
use crate::store::{Database, Repository, Result, StoreError};

const INSERT_ENTRY: &str = "
    INSERT INTO entries (
        id, remote_id, feed_id, title, updated_at, published_at, authors, content,
        links, summary, categories, media, feed_title, feed_logo, feed_icon, read,
        slug, featured_image
    )
    VALUES (
        :id, :remote_id, :feed_id, :title, :updated_at, :published_at, :authors, :content,
        :links, :summary, :categories, :media, :feed_title, :feed_logo, :feed_icon, :read,
        :slug, :featured_image
    )";

const UPDATE_ENTRY: &str = "
    UPDATE entries
    SET
        remote_id = :remote_id,
        feed_id = :feed_id,
        title = :title,
        updated_at = :updated_at,
        published_at = :published_at,
        authors = :authors,
        content = :content,
        links = :links,
        summary = :summary,
        categories = :categories,
        media = :media,
        feed_title = :feed_title,
        feed_logo = :feed_logo,
        feed_icon = :feed_icon,
        read = :read,
        slug = :slug,
        featured_image = :featured_image
    WHERE id = :id
    RETURNING *";

const ORDER_NEWEST: &str = "ORDER BY published_at DESC NULLS LAST, id";

/// Persistence for normalized entries.
#[derive(Clone)]
pub struct EntryStore {
    db: Database,
}

impl EntryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert entries not already stored, ignoring known ids.
    ///
    /// Returns the number of rows actually inserted.
    pub fn insert_new(&self, entries: &[Entry]) -> Result<usize> {
        let records = entries
            .iter()
            .map(Entry::to_record)
            .collect::<Result<Vec<_>>>()?;
        let sql = INSERT_ENTRY.replacen("INSERT INTO", "INSERT OR IGNORE INTO", 1);

        let inserted = self.db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut count = 0;
            {
                let mut stmt = tx.prepare(&sql)?;
                for record in &records {
                    count += stmt.execute(bind(record).as_slice())?;
                }
            }
            tx.commit()?;
            Ok(count)
        })?;

        tracing::debug!("Inserted {} of {} entries", inserted, entries.len());
        Ok(inserted)
    }

    pub fn find_by_feed_id(&self, feed_id: i64) -> Result<Vec<Entry>> {
        let sql = format!("SELECT * FROM entries WHERE feed_id = :feed_id {}", ORDER_NEWEST);
        self.query(&sql, named_params! { ":feed_id": feed_id })
    }

    pub fn find_all(&self) -> Result<Vec<Entry>> {
        let sql = format!("SELECT * FROM entries {}", ORDER_NEWEST);
        self.query(&sql, &[])
    }

    pub fn find_by_status(&self, status: ReadStatus) -> Result<Vec<Entry>> {
        let sql = format!("SELECT * FROM entries WHERE read = :read {}", ORDER_NEWEST);
        self.query(&sql, named_params! { ":read": status.is_read() })
    }

    /// Entries by `user_id`'s own read state, taken from membership in their
    /// `Read` collection. The returned entries carry that flag.
    pub fn find_by_user_status(&self, user_id: i64, status: ReadStatus) -> Result<Vec<Entry>> {
        let filter = if status.is_read() { "EXISTS" } else { "NOT EXISTS" };
        let sql = format!(
            "SELECT * FROM entries e
             WHERE {} (
                SELECT 1
                FROM collection_entries ce
                JOIN collections c ON c.id = ce.collection_id
                WHERE ce.entry_id = e.id AND c.user_id = :user_id AND c.title = :title
             )
             {}",
            filter, ORDER_NEWEST
        );
        let entries = self.query(
            &sql,
            named_params! { ":user_id": user_id, ":title": READ_COLLECTION },
        )?;
        Ok(entries
            .into_iter()
            .map(|e| e.with_read(status.is_read()))
            .collect())
    }

    fn query(&self, sql: &str, params: &[(&str, &dyn rusqlite::ToSql)]) -> Result<Vec<Entry>> {
        let records = self
            .db
            .with_conn(|conn| query_all(conn, sql, params, entry_record))?;
        records.into_iter().map(Entry::from_record).collect()
    }
}

impl Repository<Entry> for EntryStore {
    type Id = str;

    fn create(&self, entry: &Entry) -> Result<Entry> {
        let record = entry.to_record()?;
        let sql = format!("{} RETURNING *", INSERT_ENTRY);
        let stored = self
            .db
            .with_conn(|conn| Ok(conn.query_row(&sql, bind(&record).as_slice(), entry_record)?))?;
        Entry::from_record(stored)
    }

    fn update(&self, entry: &Entry) -> Result<Entry> {
        let record = entry.to_record()?;
        let stored = self.db.with_conn(|conn| {
            Ok(conn
                .query_row(UPDATE_ENTRY, bind(&record).as_slice(), entry_record)
                .optional()?)
        })?;
        let stored = stored.ok_or_else(|| StoreError::NotFound(format!("entry {}", entry.id())))?;
        Entry::from_record(stored)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let deleted = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM entries WHERE id = :id",
                named_params! { ":id": id },
            )?)
        })?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("entry {}", id)));
        }
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> Result<Entry> {
        let record = self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT * FROM entries WHERE id = :id",
                    named_params! { ":id": id },
                    entry_record,
                )
                .optional()?)
        })?;
        let record = record.ok_or_else(|| StoreError::NotFound(format!("entry {}", id)))?;
        Entry::from_record(record)
    }
}

fn bind(record: &EntryRecord) -> NamedParams<'_> {
    vec![
        (":id", &record.id),
        (":remote_id", &record.remote_id),
        (":feed_id", &record.feed_id),
        (":title", &record.title),
        (":updated_at", &record.updated_at),
        (":published_at", &record.published_at),
        (":authors", &record.authors),
        (":content", &record.content),
        (":links", &record.links),
        (":summary", &record.summary),
        (":categories", &record.categories),
        (":media", &record.media),
        (":feed_title", &record.feed_title),
        (":feed_logo", &record.feed_logo),
        (":feed_icon", &record.feed_icon),
        (":read", &record.read),
        (":slug", &record.slug),
        (":featured_image", &record.featured_image),
    ]
}

fn entry_record(row: &Row<'_>) -> rusqlite::Result<EntryRecord> {
    Ok(EntryRecord {
        id: row.get("id")?,
        remote_id: row.get("remote_id")?,
        feed_id: row.get("feed_id")?,
        title: row.get("title")?,
        updated_at: row.get("updated_at")?,
        published_at: row.get("published_at")?,
        authors: row.get("authors")?,
        content: row.get("content")?,
        links: row.get("links")?,
        summary: row.get("summary")?,
        categories: row.get("categories")?,
        media: row.get("media")?,
        feed_title: row.get("feed_title")?,
        feed_logo: row.get("feed_logo")?,
        feed_icon: row.get("feed_icon")?,
        read: row.get("read")?,
        slug: row.get("slug")?,
        featured_image: row.get("featured_image")?,
    })
}
