//! Inspect command implementation.

use super::{open_existing, CommandError, OutputFormat};
use feedsync_store::{FileStore, LocalStore};
use serde::Serialize;
use std::path::Path;

/// Cache inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Cache file path.
    pub path: String,
    /// Snapshot file size in bytes.
    pub file_size: u64,
    /// Number of records.
    pub total_count: usize,
    /// Number of visible records.
    pub visible_count: usize,
    /// Number of staged records.
    pub hidden_count: usize,
    /// Highest identifier in the cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_id: Option<i64>,
}

/// Runs the inspect command.
pub async fn run(path: &Path, format: OutputFormat) -> Result<(), CommandError> {
    let store = open_existing(path).await?;
    let result = inspect(&store).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_text_output(&result),
    }
    Ok(())
}

/// Collects statistics about an open cache.
pub async fn inspect(store: &FileStore) -> Result<InspectResult, CommandError> {
    let visible = store.visible().await?;
    let hidden = store.hidden().await?;
    let newest_id = visible
        .iter()
        .chain(hidden.iter())
        .map(|record| record.id().get())
        .max();
    let file_size = tokio::fs::metadata(store.path())
        .await
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(InspectResult {
        path: store.path().display().to_string(),
        file_size,
        total_count: visible.len() + hidden.len(),
        visible_count: visible.len(),
        hidden_count: hidden.len(),
        newest_id,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("feedsync Cache Inspection");
    println!("=========================");
    println!();
    println!("Path: {}", result.path);
    println!("Size: {}", format_size(result.file_size));
    println!();
    println!("Items:");
    println!("  Visible: {}", result.visible_count);
    println!("  Staged:  {}", result.hidden_count);
    println!("  Total:   {}", result.total_count);
    match result.newest_id {
        Some(id) => println!("  Newest:  #{id}"),
        None => println!("  Newest:  -"),
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync_protocol::FeedItem;
    use feedsync_store::PersistedItem;
    use tempfile::tempdir;

    #[tokio::test]
    async fn inspect_counts_visibility() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(&dir.path().join("feed.bin")).unwrap();
        store
            .upsert(vec![
                PersistedItem::visible(FeedItem::draft("a", "one").with_id(1)),
                PersistedItem::hidden(FeedItem::draft("a", "two").with_id(4)),
            ])
            .await
            .unwrap();

        let result = inspect(&store).await.unwrap();
        assert_eq!(result.total_count, 2);
        assert_eq!(result.visible_count, 1);
        assert_eq!(result.hidden_count, 1);
        assert_eq!(result.newest_id, Some(4));
        assert!(result.file_size > 0);
    }

    #[tokio::test]
    async fn missing_cache_is_not_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.bin");

        let result = run(&path, OutputFormat::Text).await;
        assert!(matches!(result, Err(CommandError::NotFound(_))));
        assert!(!path.exists());
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
    }
}
