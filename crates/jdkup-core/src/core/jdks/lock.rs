use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use fs4::FileExt;

use crate::ToolchainError;

/// Exclusive lock on `<target>.lock`, held until dropped.
///
/// The lock is an OS file lock, so it excludes other processes as well as
/// other threads of this one.
#[derive(Debug)]
pub struct WriteLock {
    file: File,
    path: PathBuf,
}

impl WriteLock {
    /// Blocks until the lock guarding `target` is acquired.
    ///
    /// # Errors
    /// Returns [`ToolchainError::Lock`] if the lock file cannot be opened or locked.
    pub fn acquire(target: &Path, operation: &str) -> Result<Self, ToolchainError> {
        let path = lock_path(target);
        let file = open_lock_file(&path).map_err(|cause| ToolchainError::Lock {
            path: path.clone(),
            cause,
        })?;
        match try_lock(&file) {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(
                    lock = %path.display(),
                    "waiting for another process to finish {operation}"
                );
                file.lock_exclusive()
                    .map_err(|cause| ToolchainError::Lock {
                        path: path.clone(),
                        cause,
                    })?;
            }
            Err(cause) => return Err(ToolchainError::Lock { path, cause }),
        }
        tracing::debug!(lock = %path.display(), operation, "acquired write lock");
        Ok(Self { file, path })
    }

    /// Acquires the lock only if nobody else holds it.
    ///
    /// # Errors
    /// Returns [`ToolchainError::Lock`] if the lock file cannot be opened or locked.
    pub fn try_acquire(target: &Path) -> Result<Option<Self>, ToolchainError> {
        let path = lock_path(target);
        let file = open_lock_file(&path).map_err(|cause| ToolchainError::Lock {
            path: path.clone(),
            cause,
        })?;
        match try_lock(&file) {
            Ok(true) => Ok(Some(Self { file, path })),
            Ok(false) => Ok(None),
            Err(cause) => Err(ToolchainError::Lock { path, cause }),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[must_use]
pub fn lock_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".lock");
    target.with_file_name(name)
}

fn open_lock_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
}

fn try_lock(file: &File) -> io::Result<bool> {
    match file.try_lock_exclusive() {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(false),
        #[cfg(windows)]
        Err(err) if matches!(err.raw_os_error(), Some(32 | 33)) => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn lock_file_sits_next_to_target() {
        assert_eq!(
            lock_path(Path::new("/cache/jdks/jdk-17.tar.gz")),
            PathBuf::from("/cache/jdks/jdk-17.tar.gz.lock")
        );
    }

    #[test]
    fn second_holder_is_excluded_until_release() {
        let temp = tempdir().expect("tempdir");
        let target = temp.path().join("jdk.zip");
        let first = WriteLock::acquire(&target, "test").expect("first lock");
        assert!(WriteLock::try_acquire(&target).expect("try").is_none());
        drop(first);
        assert!(WriteLock::try_acquire(&target).expect("try").is_some());
    }

    #[test]
    fn acquire_blocks_while_held() {
        let temp = tempdir().expect("tempdir");
        let target = temp.path().join("jdk.zip");
        let held = WriteLock::acquire(&target, "test").expect("held");
        let released = Arc::new(AtomicBool::new(false));

        let waiter = {
            let target = target.clone();
            let released = Arc::clone(&released);
            thread::spawn(move || {
                let _lock = WriteLock::acquire(&target, "test").expect("waiter lock");
                released.load(Ordering::SeqCst)
            })
        };
        thread::sleep(Duration::from_millis(200));
        released.store(true, Ordering::SeqCst);
        drop(held);
        assert!(waiter.join().expect("join"), "waiter ran before release");
    }
}
