//! Show-all command implementation.

use super::{open_existing, CommandError};
use feedsync_store::LocalStore;
use std::path::Path;
use tracing::info;

/// Runs the show-all command.
pub async fn run(path: &Path) -> Result<usize, CommandError> {
    let store = open_existing(path).await?;
    let promoted = store.promote_all_hidden().await?;

    info!(path = %path.display(), promoted, "promoted staged items");
    println!("{} staged item(s) now visible", promoted);
    Ok(promoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync_protocol::FeedItem;
    use feedsync_store::FileStore;
    use tempfile::tempdir;

    #[tokio::test]
    async fn promotes_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feed.bin");
        {
            let store = FileStore::open(&path).unwrap();
            store
                .stage(vec![
                    FeedItem::draft("a", "one").with_id(1),
                    FeedItem::draft("a", "two").with_id(2),
                ])
                .await
                .unwrap();
        }

        assert_eq!(run(&path).await.unwrap(), 2);
        assert_eq!(run(&path).await.unwrap(), 0);

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.visible().await.unwrap().len(), 2);
    }
}
