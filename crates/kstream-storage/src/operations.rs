//! High-level storage operations for subtitles and artwork.

use chrono::Utc;
use uuid::Uuid;

use crate::client::BlobClient;
use crate::error::{StorageError, StorageResult};

/// Build the object key for a subtitle file.
///
/// Keys are namespaced by content id and language so re-uploading a track
/// for the same language overwrites the previous file.
pub fn subtitle_key(content_id: &str, lang: &str) -> String {
    format!("subtitles/{}/{}.vtt", sanitize_segment(content_id), sanitize_segment(lang))
}

/// Build the object key for an uploaded image (thumbnails, posters).
pub fn image_key(content_id: &str, filename: &str) -> String {
    let ext = filename
        .rsplit('.')
        .next()
        .filter(|e| e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("jpg");
    format!(
        "images/{}/{}-{}.{}",
        sanitize_segment(content_id),
        Utc::now().format("%Y%m%d"),
        Uuid::new_v4(),
        ext.to_ascii_lowercase()
    )
}

/// Strip path separators and control characters from a key segment.
fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

impl BlobClient {
    /// Upload a converted VTT subtitle file and return its public URL.
    pub async fn upload_subtitle(
        &self,
        content_id: &str,
        lang: &str,
        vtt: &str,
    ) -> StorageResult<String> {
        if vtt.trim().is_empty() {
            return Err(StorageError::upload_failed("subtitle file is empty"));
        }
        let key = subtitle_key(content_id, lang);
        self.upload_bytes(vtt.as_bytes().to_vec(), &key, "text/vtt")
            .await?;
        self.public_url(&key).await
    }

    /// Upload an image and return its public URL.
    pub async fn upload_image(
        &self,
        content_id: &str,
        filename: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        if data.is_empty() {
            return Err(StorageError::upload_failed("image payload is empty"));
        }
        let key = image_key(content_id, filename);
        self.upload_bytes(data, &key, content_type).await?;
        self.public_url(&key).await
    }
}
