use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use html_escape::decode_html_entities;

use super::media::{Author, EntryContent, Image, Media, TEXT_HTML};
use super::record::{decode_opt, decode_seq, decode_time, encode_opt, encode_seq, encode_time};
use super::RemoteEntry;
use crate::normalizer::derive;
use crate::store::Result;

/// A normalized feed entry.
///
/// Entries are immutable; read state changes produce a new value through
/// [`Entry::with_read`].
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    id: String,
    remote_id: String,
    feed_id: i64,
    title: Option<String>,
    updated_at: Option<DateTime<Utc>>,
    published_at: Option<DateTime<Utc>>,
    authors: Vec<Author>,
    content: Option<EntryContent>,
    links: Vec<String>,
    summary: Option<String>,
    categories: Vec<String>,
    media: Vec<Media>,
    feed_title: Option<String>,
    feed_logo: Option<Image>,
    feed_icon: Option<Image>,
    read: bool,
    slug: String,
    featured_image: Option<String>,
}

/// Flat, text-column form of an [`Entry`], one field per `entries` column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryRecord {
    pub id: String,
    pub remote_id: String,
    pub feed_id: i64,
    pub title: Option<String>,
    pub updated_at: Option<String>,
    pub published_at: Option<String>,
    pub authors: Option<String>,
    pub content: Option<String>,
    pub links: Option<String>,
    pub summary: Option<String>,
    pub categories: Option<String>,
    pub media: Option<String>,
    pub feed_title: Option<String>,
    pub feed_logo: Option<String>,
    pub feed_icon: Option<String>,
    pub read: bool,
    pub slug: String,
    pub featured_image: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    Read,
    Unread,
}

impl ReadStatus {
    pub fn is_read(self) -> bool {
        self == ReadStatus::Read
    }
}

impl FromStr for ReadStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "read" => Ok(ReadStatus::Read),
            "unread" => Ok(ReadStatus::Unread),
            other => Err(format!("Invalid status: {}. Use 'read' or 'unread'", other)),
        }
    }
}

impl fmt::Display for ReadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadStatus::Read => write!(f, "read"),
            ReadStatus::Unread => write!(f, "unread"),
        }
    }
}

impl Entry {
    /// Normalize a parsed remote entry belonging to feed `feed_id`.
    ///
    /// The feed display fields are copied so later feed edits do not
    /// rewrite already ingested entries.
    pub fn from_remote(
        remote: &RemoteEntry,
        feed_id: i64,
        feed_title: Option<&str>,
        feed_logo: Option<&Image>,
        feed_icon: Option<&Image>,
    ) -> Self {
        let id = derive::stable_id(&remote.id);
        let title = remote
            .title
            .as_ref()
            .map(|t| decode_html_entities(&t.content).to_string());
        let links: Vec<String> = remote.links.iter().map(|l| l.href.clone()).collect();
        let content = remote.content.as_ref().map(EntryContent::from_remote);

        let summary = match (&remote.summary, &content) {
            (Some(text), _) if text.content_type.essence().to_string() == TEXT_HTML => {
                Some(derive::inner_text(&text.content))
            }
            (Some(text), _) => Some(text.content.clone()),
            (None, Some(EntryContent { body: Some(body), .. })) => {
                Some(derive::first_paragraph(body))
            }
            _ => None,
        };

        let featured_image = content
            .as_ref()
            .filter(|c| c.is_html())
            .and_then(|c| c.body.as_deref())
            .and_then(|body| {
                let origin = links.first().and_then(|l| derive::link_origin(l));
                derive::featured_image(body, origin.as_ref())
            });

        let slug = derive::slug(title.as_deref(), &id);

        Self {
            remote_id: remote.id.clone(),
            feed_id,
            updated_at: remote.updated,
            published_at: remote.published.or(remote.updated),
            authors: remote.authors.iter().map(Author::from_remote).collect(),
            content,
            links,
            summary,
            categories: remote.categories.iter().map(|c| c.term.clone()).collect(),
            media: Media::all_from_remote(remote),
            feed_title: feed_title.map(str::to_string),
            feed_logo: feed_logo.cloned(),
            feed_icon: feed_icon.cloned(),
            read: false,
            featured_image,
            title,
            slug,
            id,
        }
    }

    pub fn with_read(self, read: bool) -> Self {
        Self { read, ..self }
    }

    pub fn to_record(&self) -> Result<EntryRecord> {
        Ok(EntryRecord {
            id: self.id.clone(),
            remote_id: self.remote_id.clone(),
            feed_id: self.feed_id,
            title: self.title.clone(),
            updated_at: encode_time(self.updated_at.as_ref()),
            published_at: encode_time(self.published_at.as_ref()),
            authors: encode_seq(&self.authors)?,
            content: encode_opt(self.content.as_ref())?,
            links: encode_seq(&self.links)?,
            summary: self.summary.clone(),
            categories: encode_seq(&self.categories)?,
            media: encode_seq(&self.media)?,
            feed_title: self.feed_title.clone(),
            feed_logo: encode_opt(self.feed_logo.as_ref())?,
            feed_icon: encode_opt(self.feed_icon.as_ref())?,
            read: self.read,
            slug: self.slug.clone(),
            featured_image: self.featured_image.clone(),
        })
    }

    pub fn from_record(record: EntryRecord) -> Result<Self> {
        Ok(Self {
            updated_at: decode_time("updated_at", record.updated_at.as_deref())?,
            published_at: decode_time("published_at", record.published_at.as_deref())?,
            authors: decode_seq("authors", record.authors.as_deref())?,
            content: decode_opt("content", record.content.as_deref())?,
            links: decode_seq("links", record.links.as_deref())?,
            categories: decode_seq("categories", record.categories.as_deref())?,
            media: decode_seq("media", record.media.as_deref())?,
            feed_logo: decode_opt("feed_logo", record.feed_logo.as_deref())?,
            feed_icon: decode_opt("feed_icon", record.feed_icon.as_deref())?,
            id: record.id,
            remote_id: record.remote_id,
            feed_id: record.feed_id,
            title: record.title,
            summary: record.summary,
            feed_title: record.feed_title,
            read: record.read,
            slug: record.slug,
            featured_image: record.featured_image,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }

    pub fn feed_id(&self) -> i64 {
        self.feed_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn display_title(&self) -> &str {
        self.title().unwrap_or("(Untitled)")
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Publication time, falling back to the update time.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn content(&self) -> Option<&EntryContent> {
        self.content.as_ref()
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }

    pub fn link(&self) -> Option<&str> {
        self.links.first().map(String::as_str)
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn media(&self) -> &[Media] {
        &self.media
    }

    pub fn feed_title(&self) -> Option<&str> {
        self.feed_title.as_deref()
    }

    pub fn feed_logo(&self) -> Option<&Image> {
        self.feed_logo.as_ref()
    }

    pub fn feed_icon(&self) -> Option<&Image> {
        self.feed_icon.as_ref()
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn featured_image(&self) -> Option<&str> {
        self.featured_image.as_deref()
    }
}

/// Newest first; entries without a date sort last.
pub fn sort_newest_first(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}
