//! Profile-photo retrieval and persistence.
//!
//! One write per successful registration:
//! `<static>/images/user_<chat_id>_<remote_filename>`. The account row stores
//! the path relative to the static root so the web side can serve it as
//! `/static/images/...`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::transport::ChatTransport;

pub struct PhotoStore {
    static_root: PathBuf,
}

impl PhotoStore {
    pub fn new(static_root: PathBuf) -> Self {
        Self { static_root }
    }

    /// Download the participant's current profile photo and persist it.
    ///
    /// Picks the highest-resolution variant (last) of the most recent photo
    /// set (first). Returns the stored web-relative path, or `None` when the
    /// participant has no profile photos at all.
    pub async fn save_profile_photo(
        &self,
        transport: &dyn ChatTransport,
        chat_id: i64,
    ) -> Result<Option<String>> {
        let photo_sets = transport.profile_photos(chat_id).await?;
        let Some(best) = photo_sets.first().and_then(|set| set.last()) else {
            debug!(chat_id, "participant has no profile photos");
            return Ok(None);
        };

        let (remote_name, bytes) = transport.download_file(&best.file_id).await?;

        let images_dir = self.static_root.join("images");
        fs::create_dir_all(&images_dir)
            .await
            .with_context(|| format!("creating {}", images_dir.display()))?;

        let filename = format!("user_{chat_id}_{remote_name}");
        let path = images_dir.join(&filename);
        fs::write(&path, &bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        info!(chat_id, path = %path.display(), "stored profile photo");

        // The account row keeps the path minus the static root.
        let reference = path
            .strip_prefix(&self.static_root)
            .unwrap_or(&path)
            .to_string_lossy()
            .into_owned();
        Ok(Some(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::PhotoSize;
    use async_trait::async_trait;

    struct OnePhoto;

    #[async_trait]
    impl ChatTransport for OnePhoto {
        async fn send_message(&self, _chat_id: i64, _text: &str) -> Result<()> {
            Ok(())
        }

        async fn profile_photos(&self, _user_id: i64) -> Result<Vec<Vec<PhotoSize>>> {
            Ok(vec![vec![
                PhotoSize {
                    file_id: "small".into(),
                    width: 90,
                    height: 90,
                },
                PhotoSize {
                    file_id: "large".into(),
                    width: 640,
                    height: 640,
                },
            ]])
        }

        async fn download_file(&self, file_id: &str) -> Result<(String, Vec<u8>)> {
            assert_eq!(file_id, "large", "should pick the largest variant");
            Ok(("photo.jpg".to_string(), vec![0xFF, 0xD8, 0xFF]))
        }
    }

    struct NoPhotos;

    #[async_trait]
    impl ChatTransport for NoPhotos {
        async fn send_message(&self, _chat_id: i64, _text: &str) -> Result<()> {
            Ok(())
        }

        async fn profile_photos(&self, _user_id: i64) -> Result<Vec<Vec<PhotoSize>>> {
            Ok(vec![])
        }

        async fn download_file(&self, _file_id: &str) -> Result<(String, Vec<u8>)> {
            panic!("nothing to download");
        }
    }

    fn temp_static_root() -> PathBuf {
        std::env::temp_dir().join(format!("portico-photos-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn saves_largest_variant_and_strips_static_root() {
        let root = temp_static_root();
        let store = PhotoStore::new(root.clone());

        let reference = store.save_profile_photo(&OnePhoto, 555).await.unwrap();
        assert_eq!(reference.as_deref(), Some("images/user_555_photo.jpg"));

        let on_disk = root.join("images/user_555_photo.jpg");
        assert_eq!(fs::read(&on_disk).await.unwrap(), vec![0xFF, 0xD8, 0xFF]);

        fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn no_photos_yields_none() {
        let root = temp_static_root();
        let store = PhotoStore::new(root.clone());

        let reference = store.save_profile_photo(&NoPhotos, 555).await.unwrap();
        assert_eq!(reference, None);
        // Nothing written.
        assert!(fs::metadata(root.join("images")).await.is_err());
    }
}
