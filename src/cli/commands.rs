use crate::app::{Reader, Result};
use crate::domain::{Entry, ReadStatus};

pub async fn subscribe(reader: &Reader, user_id: i64, url: &str) -> Result<()> {
    let feed = reader.subscribe(user_id, url).await?;
    println!("Subscribed to {} [{}]", feed.display_title(), feed.id);
    println!("  slug: {}", feed.slug);
    Ok(())
}

pub fn unsubscribe(reader: &Reader, user_id: i64, feed_id: i64) -> Result<()> {
    reader.unsubscribe(user_id, feed_id)?;
    println!("Unsubscribed from feed {}", feed_id);
    Ok(())
}

pub fn list_feeds(reader: &Reader, user_id: i64) -> Result<()> {
    let feeds = reader.subscribed_feeds(user_id)?;

    if feeds.is_empty() {
        println!("No subscriptions");
        return Ok(());
    }

    for feed in feeds {
        println!(
            "[{}] {} ({})\n  {}",
            feed.id,
            feed.display_title(),
            feed.slug,
            feed.feed_link
        );
    }

    Ok(())
}

pub async fn refresh(reader: &Reader, user_id: i64) -> Result<()> {
    let refresh = reader.refresh_all(user_id).await?;

    for notice in &refresh.notices {
        eprintln!("  ! {}", notice);
    }
    print_entries(&refresh.posts);

    println!(
        "Refresh complete: {} posts, {} errors",
        refresh.posts.len(),
        refresh.notices.len()
    );
    Ok(())
}

pub fn feed_page(reader: &Reader, user_id: i64, slug: &str) -> Result<()> {
    let feed = reader.feed_page(user_id, slug)?;

    println!("{}", feed.display_title());
    if let Some(description) = &feed.description {
        println!("{}", description);
    }
    if let Some(site) = &feed.site_link {
        println!("{}", site);
    }
    println!();
    print_entries(&feed.entries);
    Ok(())
}

pub fn show_entry(reader: &Reader, user_id: i64, id: &str) -> Result<()> {
    let entry = reader.entry(user_id, id)?;

    println!("{}", entry.display_title());
    if let Some(feed) = entry.feed_title() {
        println!("from {}", feed);
    }
    if let Some(date) = entry.published_at() {
        println!("{}", date.format("%Y-%m-%d %H:%M"));
    }
    let authors: Vec<&str> = entry
        .authors()
        .iter()
        .filter_map(|a| a.name.as_deref())
        .collect();
    if !authors.is_empty() {
        println!("by {}", authors.join(", "));
    }
    if let Some(link) = entry.link() {
        println!("{}", link);
    }
    if let Some(image) = entry.featured_image() {
        println!("image: {}", image);
    }
    println!("status: {}", status_of(&entry));
    if let Some(summary) = entry.summary() {
        println!("\n{}", summary);
    }

    Ok(())
}

pub fn mark(reader: &Reader, user_id: i64, id: &str, status: ReadStatus) -> Result<()> {
    let entry = match status {
        ReadStatus::Read => reader.mark_read(user_id, id)?,
        ReadStatus::Unread => reader.mark_unread(user_id, id)?,
    };
    println!("Marked {} as {}", entry.display_title(), status);
    Ok(())
}

pub fn list_entries(reader: &Reader, user_id: i64, status: Option<ReadStatus>) -> Result<()> {
    let entries = match status {
        Some(status) => reader.entries_by_status(user_id, status)?,
        None => {
            let mut all = reader.entries_by_status(user_id, ReadStatus::Unread)?;
            all.extend(reader.entries_by_status(user_id, ReadStatus::Read)?);
            crate::domain::sort_newest_first(&mut all);
            all
        }
    };

    print_entries(&entries);
    Ok(())
}

pub fn list_collections(reader: &Reader, user_id: i64) -> Result<()> {
    let collections = reader.user_collections(user_id)?;

    if collections.is_empty() {
        println!("No collections");
        return Ok(());
    }

    for (collection, count) in collections {
        println!("[{}] {} ({} entries)", collection.id, collection.title, count);
    }

    Ok(())
}

fn status_of(entry: &Entry) -> ReadStatus {
    if entry.is_read() {
        ReadStatus::Read
    } else {
        ReadStatus::Unread
    }
}

fn print_entries(entries: &[Entry]) {
    if entries.is_empty() {
        println!("No entries");
        return;
    }

    for entry in entries {
        let read_marker = if entry.is_read() { " " } else { "●" };

        let date = entry
            .published_at()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "          ".to_string());

        println!(
            "{} {} {}  {}",
            read_marker,
            date,
            entry.display_title(),
            entry.id()
        );
    }
}
