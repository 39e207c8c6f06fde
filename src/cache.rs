//! Persisted record of the last observed address.

use crate::error::{MailerError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Plain-text file holding exactly the last recorded address.
#[derive(Debug, Clone)]
pub struct AddressCache {
    path: PathBuf,
}

impl AddressCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached address.
    ///
    /// Returns `Ok(None)` when the file does not exist yet (first run).
    /// Any other read failure is an error. Invalid UTF-8 is replaced rather
    /// than rejected, so a damaged file reads as a different address and is
    /// overwritten on the next change.
    pub async fn read(&self) -> Result<Option<String>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Cache file {} does not exist", self.path.display());
                Ok(None)
            }
            Err(source) => Err(MailerError::Cache {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Replace the cached address with `address`, byte for byte.
    pub async fn write(&self, address: &str) -> Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await.map_err(|source| self.error(source))?;
        file.write_all(address.as_bytes())
            .await
            .map_err(|source| self.error(source))?;
        file.flush().await.map_err(|source| self.error(source))?;
        Ok(())
    }

    fn error(&self, source: std::io::Error) -> MailerError {
        MailerError::Cache {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache_in(dir: &TempDir) -> AddressCache {
        AddressCache::new(dir.path().join("ip.cache"))
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);

        assert_eq!(cache.read().await.unwrap(), None);
        assert!(!cache.path().exists());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);

        cache.write(" 1.2.3.4\r\n").await.unwrap();
        assert_eq!(cache.read().await.unwrap().as_deref(), Some(" 1.2.3.4\r\n"));
    }

    #[tokio::test]
    async fn test_write_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);

        cache.write("2001:db8::ffff:1").await.unwrap();
        cache.write("5.6.7.8").await.unwrap();

        let on_disk = std::fs::read_to_string(cache.path()).unwrap();
        assert_eq!(on_disk, "5.6.7.8");
    }

    #[tokio::test]
    async fn test_non_utf8_content_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        std::fs::write(cache.path(), [0x31, 0xff]).unwrap();

        let cached = cache.read().await.unwrap().unwrap();
        assert_eq!(cached, "1\u{FFFD}");
        assert_ne!(cached, "1");

        cache.write("5.6.7.8").await.unwrap();
        assert_eq!(cache.read().await.unwrap().as_deref(), Some("5.6.7.8"));
    }

    #[tokio::test]
    async fn test_unreadable_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory exists at the path but cannot be read as a file.
        let cache = AddressCache::new(dir.path());

        let err = cache.read().await.unwrap_err();
        assert!(matches!(err, MailerError::Cache { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_new_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        cache.write("1.2.3.4").await.unwrap();

        let mode = std::fs::metadata(cache.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
