//! Exclusive lock for the job list file
//!
//! The lock is a sibling file `<name>.lock` created with `create_new`, so
//! acquisition is atomic across processes. It is removed when the guard drops.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::StoreError;

const INITIAL_BACKOFF: Duration = Duration::from_millis(10);
const MAX_BACKOFF: Duration = Duration::from_millis(200);

/// Held lock on a file; released on drop
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
}

impl FileLock {
    /// Path of the lock file guarding `target`
    pub fn lock_path(target: &Path) -> PathBuf {
        let mut name = target
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("jobs"));
        name.push(".lock");
        target.with_file_name(name)
    }

    /// Acquire the lock for `target`, waiting at most `timeout`
    ///
    /// Retries with exponential backoff (10ms doubling up to 200ms) while
    /// another process holds the lock.
    ///
    /// # Returns
    /// The guard, or `StoreError::LockTimeout` once `timeout` has passed
    pub async fn acquire(target: &Path, timeout: Duration) -> Result<Self, StoreError> {
        let path = Self::lock_path(target);
        let deadline = Instant::now() + timeout;
        let mut backoff = INITIAL_BACKOFF;

        loop {
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    // Owner pid is informational only
                    let _ = file
                        .write_all(std::process::id().to_string().as_bytes())
                        .await;
                    debug!(lock = %path.display(), "Acquired job list lock");
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(StoreError::LockTimeout {
                            path: target.to_path_buf(),
                            waited: timeout,
                        });
                    }
                    tokio::time::sleep(backoff.min(deadline - now)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                Err(source) => return Err(StoreError::Lock { path, source }),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    // Synchronous so the lock is free the moment the guard goes away
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), "Failed to release job list lock: {}", e);
        } else {
            debug!(lock = %self.path.display(), "Released job list lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lock_is_exclusive_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("jobs.json");

        let held = FileLock::acquire(&target, Duration::from_millis(50)).await.unwrap();
        assert!(held.path().exists());

        let err = FileLock::acquire(&target, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout { .. }));

        drop(held);
        assert!(!FileLock::lock_path(&target).exists());
        assert!(FileLock::acquire(&target, Duration::from_millis(50)).await.is_ok());
    }

    #[test]
    fn test_lock_path_is_sibling() {
        let path = FileLock::lock_path(Path::new("/home/user/.gridctl/jobs.json"));
        assert_eq!(path, PathBuf::from("/home/user/.gridctl/jobs.json.lock"));
    }
}
