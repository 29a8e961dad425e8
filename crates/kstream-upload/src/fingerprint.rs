//! Source file fingerprinting for duplicate detection.
//!
//! Files up to 64 MiB are hashed in full. Larger files are fingerprinted
//! from three 2 MiB windows (head, middle, tail), which is stable for a
//! given file while keeping hashing O(1) in file size. When the file cannot
//! be read at all, a degenerate fingerprint over `name:size:lastModified`
//! still allows exact re-upload detection from the same machine.

use std::io::SeekFrom;
use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::warn;

use kstream_models::Fingerprint;

use crate::error::{UploadError, UploadResult};

/// Files at or below this size are hashed in full.
pub const FULL_HASH_LIMIT: u64 = 64 * 1024 * 1024;

/// Window size used when sampling large files.
pub const SAMPLE_WINDOW: u64 = 2 * 1024 * 1024;

const READ_CHUNK: usize = 1024 * 1024;

/// Fingerprint an in-memory payload.
pub fn fingerprint_bytes(data: &[u8]) -> Fingerprint {
    let size = data.len() as u64;
    let mut hasher = Sha256::new();

    if size <= FULL_HASH_LIMIT {
        hasher.update(data);
    } else {
        for (start, len) in sample_windows(size) {
            let end = (start + len).min(size) as usize;
            hasher.update(&data[start as usize..end]);
        }
    }

    Fingerprint::new(hex::encode(hasher.finalize()), size)
}

/// Fingerprint a file on disk.
///
/// Falls back to the degenerate name/size/mtime fingerprint when the file
/// exists but cannot be read.
pub async fn fingerprint_file(path: impl AsRef<Path>) -> UploadResult<Fingerprint> {
    let path = path.as_ref();
    let meta = tokio::fs::metadata(path).await.map_err(|e| {
        UploadError::Fingerprint(format!("cannot stat {}: {}", path.display(), e))
    })?;
    let size = meta.len();

    match hash_file_contents(path, size).await {
        Ok(digest) => Ok(Fingerprint::new(digest, size)),
        Err(e) => {
            warn!(
                path = %path.display(),
                "Content hashing failed, using degenerate fingerprint: {}",
                e
            );
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let modified_ms = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as i64)
                .unwrap_or(0);
            Ok(degenerate_fingerprint(&name, size, modified_ms))
        }
    }
}

/// Fingerprint built from file identity alone, for unreadable files.
pub fn degenerate_fingerprint(name: &str, size: u64, last_modified_ms: i64) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(format!("{name}:{size}:{last_modified_ms}").as_bytes());
    Fingerprint::new(hex::encode(hasher.finalize()), size)
}

async fn hash_file_contents(path: &Path, size: u64) -> std::io::Result<String> {
    let mut file = File::open(path).await?;
    let mut hasher = Sha256::new();

    if size <= FULL_HASH_LIMIT {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
    } else {
        for (start, len) in sample_windows(size) {
            file.seek(SeekFrom::Start(start)).await?;
            let mut remaining = len.min(size - start) as usize;
            let mut buf = vec![0u8; READ_CHUNK.min(remaining.max(1))];
            while remaining > 0 {
                let want = remaining.min(buf.len());
                let n = file.read(&mut buf[..want]).await?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
                remaining -= n;
            }
        }
    }

    Ok(hex::encode(hasher.finalize()))
}

/// The three (offset, length) windows sampled from a large file.
fn sample_windows(size: u64) -> [(u64, u64); 3] {
    let tail_start = size.saturating_sub(SAMPLE_WINDOW);
    let middle_start = (size / 2)
        .saturating_sub(SAMPLE_WINDOW / 2)
        .min(tail_start);
    [
        (0, SAMPLE_WINDOW),
        (middle_start, SAMPLE_WINDOW),
        (tail_start, SAMPLE_WINDOW),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_small_payload_hashes_full_content() {
        let a = fingerprint_bytes(b"hello world");
        let b = fingerprint_bytes(b"hello world");
        let c = fingerprint_bytes(b"hello worl\xD0\xB5"); // differs in one byte
        assert_eq!(a, b);
        assert_ne!(a.sha256, c.sha256);
        assert_eq!(a.size, 11);
    }

    #[test]
    fn test_sample_windows_cover_head_middle_tail() {
        let size = 200 * 1024 * 1024;
        let [head, middle, tail] = sample_windows(size);
        assert_eq!(head.0, 0);
        assert_eq!(middle.0, size / 2 - SAMPLE_WINDOW / 2);
        assert_eq!(tail.0, size - SAMPLE_WINDOW);
    }

    #[test]
    fn test_degenerate_fingerprint_is_stable() {
        let a = degenerate_fingerprint("movie.mp4", 123, 1_700_000_000_000);
        let b = degenerate_fingerprint("movie.mp4", 123, 1_700_000_000_000);
        let c = degenerate_fingerprint("movie.mp4", 123, 1_700_000_000_001);
        assert_eq!(a, b);
        assert_ne!(a.sha256, c.sha256);
    }

    #[tokio::test]
    async fn test_file_and_bytes_agree_for_small_files() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"some video bytes").unwrap();
        tmp.flush().unwrap();

        let from_file = fingerprint_file(tmp.path()).await.unwrap();
        let from_bytes = fingerprint_bytes(b"some video bytes");
        assert_eq!(from_file, from_bytes);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let result = fingerprint_file("/definitely/not/here.mp4").await;
        assert!(matches!(result, Err(UploadError::Fingerprint(_))));
    }

    #[test]
    fn test_sampled_hash_ignores_unsampled_middle_bytes() {
        // Two payloads over the limit that differ only outside the three
        // sampled windows must produce the same digest.
        let size = (FULL_HASH_LIMIT + 16 * 1024 * 1024) as usize;
        let mut a = vec![0u8; size];
        let mut b = vec![0u8; size];
        // Mutate a region between head and middle windows.
        let off = (SAMPLE_WINDOW as usize) + 1024;
        a[off] = 1;
        b[off] = 2;
        assert_eq!(fingerprint_bytes(&a).sha256, fingerprint_bytes(&b).sha256);

        // Mutating inside the head window must change the digest.
        b[0] = 7;
        assert_ne!(fingerprint_bytes(&a).sha256, fingerprint_bytes(&b).sha256);
    }
}
