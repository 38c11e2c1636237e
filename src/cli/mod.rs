pub mod commands;

use clap::{Parser, Subcommand};

use crate::domain::ReadStatus;

#[derive(Parser)]
#[command(name = "current")]
#[command(about = "A personal RSS/Atom feed reader", long_about = None)]
pub struct Cli {
    /// Act as this user instead of the configured one
    #[arg(short, long, global = true)]
    pub user: Option<i64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Subscribe to a feed
    Subscribe {
        /// URL of the feed document
        url: String,
    },
    /// Unsubscribe from a feed
    Unsubscribe {
        /// Numeric id shown by `feeds`
        feed_id: i64,
    },
    /// List subscribed feeds
    Feeds,
    /// Fetch all subscribed feeds and print the combined post list
    Refresh,
    /// Show a feed page
    Feed {
        /// Feed slug, e.g. `this-week-in-rust`
        slug: String,
    },
    /// Show one entry
    Show {
        /// Entry id
        id: String,
    },
    /// Mark an entry as read
    Read {
        /// Entry id
        id: String,
    },
    /// Mark an entry as unread
    Unread {
        /// Entry id
        id: String,
    },
    /// List stored entries
    List {
        /// Only entries with this status (`read` or `unread`)
        #[arg(long)]
        status: Option<ReadStatus>,
    },
    /// List collections with their entry counts
    Collections,
}
