use serde::{Deserialize, Serialize};

use super::RemoteEntry;

pub const TEXT_HTML: &str = "text/html";

/// Feed logo or icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub uri: String,
    pub title: Option<String>,
    pub link: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub description: Option<String>,
}

impl Image {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: None,
            link: None,
            width: None,
            height: None,
            description: None,
        }
    }

    pub fn from_remote(image: &feed_rs::model::Image) -> Self {
        Self {
            uri: image.uri.clone(),
            title: image.title.clone(),
            link: image.link.as_ref().map(|l| l.href.clone()),
            width: image.width,
            height: image.height,
            description: image.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: Option<String>,
    pub uri: Option<String>,
    pub email: Option<String>,
}

impl Author {
    pub fn from_remote(person: &feed_rs::model::Person) -> Self {
        Self {
            name: Some(person.name.trim().to_string()).filter(|n| !n.is_empty()),
            uri: person.uri.clone(),
            email: person.email.clone(),
        }
    }
}

/// Entry body with its media type, e.g. `text/html`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryContent {
    pub content_type: String,
    pub body: Option<String>,
}

impl EntryContent {
    pub fn from_remote(content: &feed_rs::model::Content) -> Self {
        Self {
            content_type: content.content_type.essence().to_string(),
            body: content.body.clone(),
        }
    }

    pub fn is_html(&self) -> bool {
        self.content_type == TEXT_HTML
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaContent {
    pub url: Option<String>,
    pub content_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A media attachment (podcast enclosure, `media:group`, YouTube video...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub contents: Vec<MediaContent>,
    #[serde(default)]
    pub thumbnails: Vec<String>,
}

impl Media {
    pub fn from_remote(media: &feed_rs::model::MediaObject) -> Self {
        Self {
            title: media.title.as_ref().map(|t| t.content.clone()),
            description: media.description.as_ref().map(|d| d.content.clone()),
            contents: media
                .content
                .iter()
                .map(|c| MediaContent {
                    url: c.url.as_ref().map(|u| u.to_string()),
                    content_type: c.content_type.as_ref().map(|m| m.essence().to_string()),
                    width: c.width,
                    height: c.height,
                })
                .collect(),
            thumbnails: media
                .thumbnails
                .iter()
                .map(|t| t.image.uri.clone())
                .collect(),
        }
    }

    pub(crate) fn all_from_remote(entry: &RemoteEntry) -> Vec<Self> {
        entry.media.iter().map(Self::from_remote).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_rs::parser;

    const PODCAST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
<channel>
<title>Clips</title>
<item>
<title>Launch</title>
<guid>clip-1</guid>
<media:content url="https://cdn.example.com/launch.mp4" type="video/mp4" width="640" height="360"/>
</item>
</channel>
</rss>"#;

    const ATOM_HTML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
<title>Notes</title>
<id>urn:notes</id>
<updated>2024-03-01T00:00:00Z</updated>
<entry>
<title>Marked up</title>
<id>urn:notes:1</id>
<updated>2024-03-01T00:00:00Z</updated>
<content type="html">&lt;p&gt;Hello&lt;/p&gt;</content>
</entry>
<entry>
<title>Plain</title>
<id>urn:notes:2</id>
<updated>2024-03-01T00:00:00Z</updated>
<content type="text">Hello</content>
</entry>
</feed>"#;

    #[test]
    fn test_content_type_is_bare_essence() {
        let feed = parser::parse(ATOM_HTML.as_bytes()).unwrap();
        let html = EntryContent::from_remote(feed.entries[0].content.as_ref().unwrap());
        let plain = EntryContent::from_remote(feed.entries[1].content.as_ref().unwrap());

        assert_eq!(html.content_type, TEXT_HTML);
        assert!(html.is_html());
        assert_eq!(plain.content_type, "text/plain");
        assert!(!plain.is_html());
    }

    #[test]
    fn test_media_content_type() {
        let feed = parser::parse(PODCAST.as_bytes()).unwrap();
        let media = Media::all_from_remote(&feed.entries[0]);

        assert_eq!(media.len(), 1);
        let content = &media[0].contents[0];
        assert_eq!(content.content_type.as_deref(), Some("video/mp4"));
        assert_eq!(content.width, Some(640));
        assert_eq!(content.url.as_deref(), Some("https://cdn.example.com/launch.mp4"));
    }
}
