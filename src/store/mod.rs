//! Persistence of bruteforce sessions, recovered PINs and reports.
//!
//! Files are small text files written under an exclusive `flock`.

mod result_store;
mod session_store;

pub use result_store::{CredentialRecord, ResultStore};
pub use session_store::SessionStore;

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

use crate::error::StoreError;

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Acquire an exclusive lock on a file (Unix only)
#[cfg(unix)]
fn lock_file_exclusive(file: &File, path: &Path) -> Result<(), StoreError> {
    use libc::{flock, LOCK_EX};
    let fd = file.as_raw_fd();
    let result = unsafe { flock(fd, LOCK_EX) };
    if result != 0 {
        return Err(StoreError::Lock(path.to_path_buf()));
    }
    Ok(())
}

/// Release a file lock (Unix only)
#[cfg(unix)]
fn unlock_file(file: &File, path: &Path) -> Result<(), StoreError> {
    use libc::{flock, LOCK_UN};
    let fd = file.as_raw_fd();
    let result = unsafe { flock(fd, LOCK_UN) };
    if result != 0 {
        return Err(StoreError::Lock(path.to_path_buf()));
    }
    Ok(())
}

/// No-op lock for non-Unix platforms
#[cfg(not(unix))]
fn lock_file_exclusive(_file: &File, _path: &Path) -> Result<(), StoreError> {
    Ok(())
}

/// No-op unlock for non-Unix platforms
#[cfg(not(unix))]
fn unlock_file(_file: &File, _path: &Path) -> Result<(), StoreError> {
    Ok(())
}

/// Write `content` to `path` under lock, creating parent directories.
fn write_locked(path: &Path, content: &str, append: bool) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }

    // Truncated only once the lock is held, so readers never see it empty.
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(false)
        .open(path)
        .map_err(io_error(path))?;

    lock_file_exclusive(&file, path)?;
    let written = if append { Ok(()) } else { file.set_len(0) }
        .and_then(|_| (&file).write_all(content.as_bytes()))
        .and_then(|_| (&file).flush());
    unlock_file(&file, path)?;
    written.map_err(io_error(path))
}

/// Read a whole file; a missing file is `None`.
fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path)(e)),
    }
}

/// Remove a file; a missing file is not an error.
fn remove_optional(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error(path)(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c.txt");
        write_locked(&path, "hello", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_write_truncates_or_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.txt");
        write_locked(&path, "long content", false).unwrap();
        write_locked(&path, "short", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
        write_locked(&path, "+more", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "short+more");
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_waits_for_lock_before_truncating() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("0001.run");
        write_locked(&path, "0042", false).unwrap();

        let holder = File::open(&path).unwrap();
        lock_file_exclusive(&holder, &path).unwrap();

        let writer_path = path.clone();
        let writer = std::thread::spawn(move || write_locked(&writer_path, "0043", false));
        std::thread::sleep(std::time::Duration::from_millis(100));
        assert_eq!(fs::read_to_string(&path).unwrap(), "0042");

        unlock_file(&holder, &path).unwrap();
        writer.join().unwrap().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0043");
    }

    #[test]
    fn test_missing_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing");
        assert!(read_optional(&path).unwrap().is_none());
        remove_optional(&path).unwrap();
    }
}
