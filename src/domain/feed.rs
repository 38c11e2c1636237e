use chrono::{DateTime, Utc};
use html_escape::decode_html_entities;

use super::entry::Entry;
use super::media::Image;
use super::record::{decode_opt, decode_time, encode_opt, encode_time};
use super::RemoteFeed;
use crate::normalizer::derive;
use crate::store::{Result, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub id: i64,
    pub slug: String,
    pub title: Option<String>,
    /// Canonical URL of the feed document; unique per stored feed.
    pub feed_link: String,
    pub site_link: Option<String>,
    pub description: Option<String>,
    pub logo: Option<Image>,
    pub icon: Option<Image>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Attached at query time, never stored with the feed row.
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedRecord {
    pub id: i64,
    pub slug: String,
    pub title: Option<String>,
    pub feed_link: String,
    pub site_link: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub icon: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub last_fetched_at: Option<String>,
    pub created_at: String,
}

impl Feed {
    pub fn new(feed_link: String) -> Self {
        let slug = Self::fallback_slug(&feed_link);
        Self {
            id: 0,
            slug,
            title: None,
            feed_link,
            site_link: None,
            description: None,
            logo: None,
            icon: None,
            etag: None,
            last_modified: None,
            last_fetched_at: None,
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Feed metadata from a parsed remote document fetched from `feed_link`.
    pub fn from_remote(remote: &RemoteFeed, feed_link: &str) -> Self {
        let mut feed = Self::new(feed_link.to_string());
        feed.apply_remote(remote);
        feed
    }

    /// Refresh display metadata from a newer copy of the remote document.
    pub fn apply_remote(&mut self, remote: &RemoteFeed) {
        if let Some(title) = &remote.title {
            self.title = Some(decode_html_entities(&title.content).to_string());
        }
        if let Some(description) = &remote.description {
            self.description = Some(decode_html_entities(&description.content).to_string());
        }
        if let Some(link) = remote.links.iter().find(|l| l.href != self.feed_link) {
            self.site_link = Some(link.href.clone());
        }
        if let Some(logo) = &remote.logo {
            self.logo = Some(Image::from_remote(logo));
        }
        if let Some(icon) = &remote.icon {
            self.icon = Some(Image::from_remote(icon));
        }
        let fallback = Self::fallback_slug(&self.feed_link);
        self.slug = derive::slug(self.title.as_deref(), &fallback);
    }

    /// Normalize every entry of `remote` as belonging to this feed.
    pub fn entries_from_remote(&self, remote: &RemoteFeed) -> Vec<Entry> {
        remote
            .entries
            .iter()
            .map(|entry| {
                Entry::from_remote(
                    entry,
                    self.id,
                    self.title.as_deref(),
                    self.logo.as_ref(),
                    self.icon.as_ref(),
                )
            })
            .collect()
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.feed_link)
    }

    fn fallback_slug(feed_link: &str) -> String {
        let host = url::Url::parse(feed_link)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
        derive::kebab_case(host.as_deref().unwrap_or(feed_link))
    }

    pub fn to_record(&self) -> Result<FeedRecord> {
        Ok(FeedRecord {
            id: self.id,
            slug: self.slug.clone(),
            title: self.title.clone(),
            feed_link: self.feed_link.clone(),
            site_link: self.site_link.clone(),
            description: self.description.clone(),
            logo: encode_opt(self.logo.as_ref())?,
            icon: encode_opt(self.icon.as_ref())?,
            etag: self.etag.clone(),
            last_modified: self.last_modified.clone(),
            last_fetched_at: encode_time(self.last_fetched_at.as_ref()),
            created_at: encode_time(Some(&self.created_at)).unwrap_or_default(),
        })
    }

    pub fn from_record(record: FeedRecord) -> Result<Self> {
        let created_at = decode_time("created_at", Some(&record.created_at))?
            .ok_or_else(|| StoreError::Serialization("created_at: missing".into()))?;

        Ok(Self {
            logo: decode_opt("logo", record.logo.as_deref())?,
            icon: decode_opt("icon", record.icon.as_deref())?,
            last_fetched_at: decode_time("last_fetched_at", record.last_fetched_at.as_deref())?,
            created_at,
            id: record.id,
            slug: record.slug,
            title: record.title,
            feed_link: record.feed_link,
            site_link: record.site_link,
            description: record.description,
            etag: record.etag,
            last_modified: record.last_modified,
            entries: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_rs::parser;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Rust &amp; Friends</title>
    <link>https://example.com/</link>
    <description>A test feed</description>
    <image>
      <url>https://example.com/logo.png</url>
      <title>Rust &amp; Friends</title>
      <link>https://example.com/</link>
    </image>
    <item>
      <title>Test Item 1</title>
      <link>https://example.com/item1</link>
      <guid>item-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>This is item 1</description>
    </item>
    <item>
      <title>Test Item 2</title>
      <link>https://example.com/item2</link>
      <guid>item-2</guid>
      <description>This is item 2</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_from_remote_rss() {
        let remote = parser::parse(RSS_SAMPLE.as_bytes()).unwrap();
        let feed = Feed::from_remote(&remote, "https://example.com/feed.xml");

        assert_eq!(feed.title.as_deref(), Some("Rust & Friends"));
        assert_eq!(feed.slug, "rust-friends");
        assert_eq!(feed.feed_link, "https://example.com/feed.xml");
        assert_eq!(feed.site_link.as_deref(), Some("https://example.com/"));
        assert_eq!(feed.description.as_deref(), Some("A test feed"));
        assert_eq!(
            feed.logo.as_ref().map(|l| l.uri.as_str()),
            Some("https://example.com/logo.png")
        );
        assert!(feed.entries.is_empty());
    }

    #[test]
    fn test_entries_copy_feed_metadata() {
        let remote = parser::parse(RSS_SAMPLE.as_bytes()).unwrap();
        let mut feed = Feed::from_remote(&remote, "https://example.com/feed.xml");
        feed.id = 42;

        let entries = feed.entries_from_remote(&remote);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.feed_id() == 42));
        assert!(entries.iter().all(|e| e.feed_title() == Some("Rust & Friends")));
        assert_eq!(entries[0].feed_logo(), feed.logo.as_ref());
        assert_ne!(entries[0].id(), entries[1].id());

        feed.title = Some("Renamed".into());
        assert_eq!(entries[0].feed_title(), Some("Rust & Friends"));
    }

    #[test]
    fn test_untitled_feed_slugs_from_host() {
        let feed = Feed::new("https://blog.example.org/atom.xml".into());
        assert_eq!(feed.slug, "blog-example-org");
        assert_eq!(feed.display_title(), "https://blog.example.org/atom.xml");
    }

    #[test]
    fn test_record_round_trip() {
        let remote = parser::parse(RSS_SAMPLE.as_bytes()).unwrap();
        let mut feed = Feed::from_remote(&remote, "https://example.com/feed.xml");
        feed.id = 5;
        feed.etag = Some("\"abc\"".into());
        feed.last_fetched_at = Some(Utc::now());

        let restored = Feed::from_record(feed.to_record().unwrap()).unwrap();
        assert_eq!(restored, feed);
    }
}
