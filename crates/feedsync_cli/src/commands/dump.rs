//! Dump command implementation.

use super::{open_existing, CommandError, OutputFormat};
use feedsync_protocol::FeedItem;
use feedsync_store::{FileStore, LocalStore, PersistedItem};
use std::path::Path;

/// Runs the dump command.
pub async fn run(
    path: &Path,
    hidden: bool,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<(), CommandError> {
    let store = open_existing(path).await?;
    let items = select(&store, hidden, limit).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
        OutputFormat::Text => print_text_output(&items, hidden),
    }
    Ok(())
}

/// Returns up to `limit` visible (or hidden) items, newest first.
pub async fn select(
    store: &FileStore,
    hidden: bool,
    limit: Option<usize>,
) -> Result<Vec<FeedItem>, CommandError> {
    let records = if hidden {
        store.hidden().await?
    } else {
        store.visible().await?
    };

    Ok(records
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(PersistedItem::into_item)
        .collect())
}

fn print_text_output(items: &[FeedItem], hidden: bool) {
    let label = if hidden { "staged" } else { "visible" };
    println!("{} {} item(s)", items.len(), label);

    for item in items {
        let liked = if item.liked_by_me { "*" } else { " " };
        println!(
            "#{:<8} {} {:>5} likes  {}: {}",
            item.id.get(),
            liked,
            item.like_count,
            item.author,
            first_line(&item.content)
        );
        if let Some(attachment) = &item.attachment {
            println!("          attachment: {}", attachment.url);
        }
    }
}

fn first_line(content: &str) -> &str {
    content.lines().next().unwrap_or("")
}
