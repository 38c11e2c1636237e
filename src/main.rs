use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use current::app::Reader;
use current::cli::{commands, Cli, Commands};
use current::config::Config;
use current::domain::ReadStatus;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let reader = Reader::from_config(&config)?;
    let user_id = cli.user.unwrap_or(config.user.id);

    match cli.command {
        Commands::Subscribe { url } => {
            commands::subscribe(&reader, user_id, &url).await?;
        }
        Commands::Unsubscribe { feed_id } => {
            commands::unsubscribe(&reader, user_id, feed_id)?;
        }
        Commands::Feeds => {
            commands::list_feeds(&reader, user_id)?;
        }
        Commands::Refresh => {
            commands::refresh(&reader, user_id).await?;
        }
        Commands::Feed { slug } => {
            commands::feed_page(&reader, user_id, &slug)?;
        }
        Commands::Show { id } => {
            commands::show_entry(&reader, user_id, &id)?;
        }
        Commands::Read { id } => {
            commands::mark(&reader, user_id, &id, ReadStatus::Read)?;
        }
        Commands::Unread { id } => {
            commands::mark(&reader, user_id, &id, ReadStatus::Unread)?;
        }
        Commands::List { status } => {
            commands::list_entries(&reader, user_id, status)?;
        }
        Commands::Collections => {
            commands::list_collections(&reader, user_id)?;
        }
    }

    Ok(())
}
