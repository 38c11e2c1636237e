use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::domain::{Feed, FeedRecord};
use crate::store::sqlite::{query_all, NamedParams};
use crate::store::{Database, Repository, Result, StoreError};

#[derive(Clone)]
pub struct FeedStore {
    db: Database,
}

impl FeedStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn find_by_slug(&self, slug: &str) -> Result<Feed> {
        self.find_one(
            "SELECT * FROM feeds WHERE slug = :slug",
            named_params! { ":slug": slug },
        )?
        .ok_or_else(|| StoreError::NotFound(format!("feed with slug {}", slug)))
    }

    /// Lookup before insert: `None` when no feed has this `feed_link`.
    pub fn find_by_url(&self, feed_link: &str) -> Result<Option<Feed>> {
        self.find_one(
            "SELECT * FROM feeds WHERE feed_link = :feed_link",
            named_params! { ":feed_link": feed_link },
        )
    }

    pub fn find_all(&self) -> Result<Vec<Feed>> {
        let records = self.db.with_conn(|conn| {
            query_all(
                conn,
                "SELECT * FROM feeds ORDER BY title, feed_link",
                &[],
                feed_record,
            )
        })?;
        records.into_iter().map(Feed::from_record).collect()
    }

    fn find_one(&self, sql: &str, params: &[(&str, &dyn rusqlite::ToSql)]) -> Result<Option<Feed>> {
        let record = self
            .db
            .with_conn(|conn| Ok(conn.query_row(sql, params, feed_record).optional()?))?;
        record.map(Feed::from_record).transpose()
    }
}

impl Repository<Feed> for FeedStore {
    type Id = i64;

    /// Insert a new feed. A slug already held by another feed gets a numeric
    /// suffix (`blog`, `blog-2`, ...).
    fn create(&self, feed: &Feed) -> Result<Feed> {
        let mut record = feed.to_record()?;

        let stored = self.db.with_conn(|conn| {
            record.slug = available_slug(conn, &record.slug, 0)?;
            let mut params = bind(&record);
            params.retain(|(name, _)| *name != ":id");
            Ok(conn.query_row(
                "INSERT INTO feeds (
                    slug, title, feed_link, site_link, description, logo, icon,
                    etag, last_modified, last_fetched_at, created_at
                )
                VALUES (
                    :slug, :title, :feed_link, :site_link, :description, :logo, :icon,
                    :etag, :last_modified, :last_fetched_at, :created_at
                )
                RETURNING *",
                params.as_slice(),
                feed_record,
            )?)
        })?;
        Feed::from_record(stored)
    }

    fn update(&self, feed: &Feed) -> Result<Feed> {
        let mut record = feed.to_record()?;
        let stored = self.db.with_conn(|conn| {
            record.slug = available_slug(conn, &record.slug, record.id)?;
            Ok(conn
                .query_row(
                    "UPDATE feeds
                     SET
                        slug = :slug,
                        title = :title,
                        feed_link = :feed_link,
                        site_link = :site_link,
                        description = :description,
                        logo = :logo,
                        icon = :icon,
                        etag = :etag,
                        last_modified = :last_modified,
                        last_fetched_at = :last_fetched_at,
                        created_at = :created_at
                     WHERE id = :id
                     RETURNING *",
                    bind(&record).as_slice(),
                    feed_record,
                )
                .optional()?)
        })?;
        let stored = stored.ok_or_else(|| StoreError::NotFound(format!("feed {}", feed.id)))?;
        Feed::from_record(stored)
    }

    /// Deleting a feed cascades to its entries and subscriptions.
    fn delete(&self, id: &i64) -> Result<()> {
        let deleted = self.db.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM feeds WHERE id = :id", named_params! { ":id": id })?)
        })?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("feed {}", id)));
        }
        Ok(())
    }

    fn find_by_id(&self, id: &i64) -> Result<Feed> {
        self.find_one("SELECT * FROM feeds WHERE id = :id", named_params! { ":id": id })?
            .ok_or_else(|| StoreError::NotFound(format!("feed {}", id)))
    }
}

/// `slug`, or the first `slug-N` (N >= 2) not held by a feed other than
/// `own_id`.
fn available_slug(conn: &Connection, slug: &str, own_id: i64) -> Result<String> {
    let mut candidate = slug.to_string();
    let mut suffix = 1;
    loop {
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM feeds WHERE slug = :slug AND id != :id)",
            named_params! { ":slug": candidate, ":id": own_id },
            |row| row.get(0),
        )?;
        if !taken {
            return Ok(candidate);
        }
        suffix += 1;
        candidate = format!("{}-{}", slug, suffix);
    }
}

fn bind(record: &FeedRecord) -> NamedParams<'_> {
    vec![
        (":id", &record.id),
        (":slug", &record.slug),
        (":title", &record.title),
        (":feed_link", &record.feed_link),
        (":site_link", &record.site_link),
        (":description", &record.description),
        (":logo", &record.logo),
        (":icon", &record.icon),
        (":etag", &record.etag),
        (":last_modified", &record.last_modified),
        (":last_fetched_at", &record.last_fetched_at),
        (":created_at", &record.created_at),
    ]
}

fn feed_record(row: &Row<'_>) -> rusqlite::Result<FeedRecord> {
    Ok(FeedRecord {
        id: row.get("id")?,
        slug: row.get("slug")?,
        title: row.get("title")?,
        feed_link: row.get("feed_link")?,
        site_link: row.get("site_link")?,
        description: row.get("description")?,
        logo: row.get("logo")?,
        icon: row.get("icon")?,
        etag: row.get("etag")?,
        last_modified: row.get("last_modified")?,
        last_fetched_at: row.get("last_fetched_at")?,
        created_at: row.get("created_at")?,
    })
}
