//! Upload storage under the media root

use crate::config::DETECTION_IMAGES_DIR;
use crate::Result;
use std::path::{Component, Path};
use tracing::{debug, warn};
use uuid::Uuid;

/// Write an accepted upload to `<media_root>/detection_images/<uuid>.<ext>`
///
/// Returns the path relative to the media root, with `/` separators.
pub async fn store_upload(media_root: &Path, extension: &str, bytes: &[u8]) -> Result<String> {
    let dir = media_root.join(DETECTION_IMAGES_DIR);
    tokio::fs::create_dir_all(&dir).await?;

    let file_name = format!("{}.{}", Uuid::new_v4(), extension);
    tokio::fs::write(dir.join(&file_name), bytes).await?;

    let relative = format!("{}/{}", DETECTION_IMAGES_DIR, file_name);
    debug!("Stored upload at {}", relative);
    Ok(relative)
}

/// Remove a stored upload; failures are logged and ignored
pub async fn remove_upload(media_root: &Path, relative: &str) {
    let relative_path = Path::new(relative);
    // Only plain relative paths below the media root
    if relative_path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        warn!("Refusing to remove upload outside media root: {}", relative);
        return;
    }

    if let Err(e) = tokio::fs::remove_file(media_root.join(relative_path)).await {
        warn!("Failed to remove upload {}: {}", relative, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_and_remove() {
        let media = TempDir::new().unwrap();

        let relative = store_upload(media.path(), "png", b"fake png").await.unwrap();
        assert!(relative.starts_with("detection_images/"));
        assert!(relative.ends_with(".png"));

        let absolute = media.path().join(&relative);
        assert_eq!(std::fs::read(&absolute).unwrap(), b"fake png");

        remove_upload(media.path(), &relative).await;
        assert!(!absolute.exists());
    }

    #[tokio::test]
    async fn test_unique_names() {
        let media = TempDir::new().unwrap();
        let a = store_upload(media.path(), "jpg", b"a").await.unwrap();
        let b = store_upload(media.path(), "jpg", b"b").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_remove_rejects_parent_components() {
        let root = TempDir::new().unwrap();
        let media = root.path().join("media");
        std::fs::create_dir_all(&media).unwrap();
        let outside = root.path().join("keep.txt");
        std::fs::write(&outside, b"keep").unwrap();

        remove_upload(&media, "../keep.txt").await;
        assert!(outside.exists());
    }
}
