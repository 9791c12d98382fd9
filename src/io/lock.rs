use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Name of the lock file inside the board directory. It is never removed:
/// every writer must flock the same inode.
pub const LOCK_FILE: &str = ".lock";

/// Exclusive hold on a board directory for one load-modify-save.
///
/// flock on Unix, so the TUI and concurrent `cb` runs take turns writing
/// board.json. The holder's pid is written into the lock file for the
/// timeout message.
#[derive(Debug)]
pub struct BoardLock {
    // Released when the file closes
    _file: File,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("board {path} is busy{}", holder_suffix(.holder))]
    Timeout { path: PathBuf, holder: Option<u32> },
    #[error("lock error: {0}")]
    IoError(#[from] std::io::Error),
}

fn holder_suffix(holder: &Option<u32>) -> String {
    match holder {
        Some(pid) => format!(" (held by pid {})", pid),
        None => String::new(),
    }
}

impl BoardLock {
    /// Lock `board_dir`, retrying until `timeout` runs out.
    pub fn acquire(board_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = board_dir.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::CreateError {
                path: path.clone(),
                source,
            })?;

        let deadline = Instant::now() + timeout;
        while try_flock(&file).is_err() {
            if Instant::now() >= deadline {
                return Err(LockError::Timeout {
                    holder: holder_pid(&path),
                    path,
                });
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        // Best effort; the flock is what counts
        let _ = record_holder(&mut file);
        Ok(BoardLock { _file: file })
    }

    /// Acquire with the default 5 second timeout
    pub fn acquire_default(board_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(board_dir, Duration::from_secs(5))
    }
}

fn record_holder(file: &mut File) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    write!(file, "{}", std::process::id())
}

/// Pid written by the current (or last) holder
fn holder_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Non-blocking exclusive flock
#[cfg(unix)]
pub(crate) fn try_flock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub(crate) fn try_flock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_file_outlives_the_lock() {
        let tmp = TempDir::new().unwrap();
        let lock = BoardLock::acquire_default(tmp.path()).unwrap();
        drop(lock);
        let path = tmp.path().join(LOCK_FILE);
        assert!(path.exists());
        assert_eq!(holder_pid(&path), Some(std::process::id()));
        assert!(BoardLock::acquire_default(tmp.path()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_contention_times_out_naming_holder() {
        let tmp = TempDir::new().unwrap();
        let _held = BoardLock::acquire_default(tmp.path()).unwrap();
        let err = BoardLock::acquire(tmp.path(), Duration::from_millis(50)).unwrap_err();
        match err {
            LockError::Timeout { holder, .. } => assert_eq!(holder, Some(std::process::id())),
            other => panic!("expected timeout, got {}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_waiter_and_newcomer_share_one_lock() {
        let tmp = TempDir::new().unwrap();
        let first = BoardLock::acquire_default(tmp.path()).unwrap();
        // A waiter that opened the lock file while it was held
        let waiter = OpenOptions::new()
            .write(true)
            .open(tmp.path().join(LOCK_FILE))
            .unwrap();
        drop(first);

        let _newcomer = BoardLock::acquire(tmp.path(), Duration::from_millis(50)).unwrap();
        assert!(try_flock(&waiter).is_err());
    }
}
