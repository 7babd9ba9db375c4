//! The shared job file and the protocol for claiming work from it.
//!
//! The job file is the only state workers share. Claiming is serialized by
//! an exclusive whole-file `flock`:
//! - a worker opens the file and blocks until it holds the lock;
//! - the full contents are read as one snapshot;
//! - the first line is claimed and the remainder is written back in place;
//! - the lock is released when the descriptor closes.
//!
//! The rewrite happens inside the same lock acquisition that read the
//! claimed line, so no two workers can ever claim the same job and the file
//! is never observable half-written. The lock is never held while a job
//! runs.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

pub(crate) struct JobQueue {
    path: PathBuf,
}

impl JobQueue {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Claim the first line of the job file, removing it from the file.
    ///
    /// Returns `Ok(None)` when the file is empty. Any line, including a
    /// blank one, is a claimable job; the text is returned verbatim minus
    /// its terminating newline. Errors are fatal for the calling worker:
    /// an open/lock/read failure means the queue is unusable, and a failed
    /// rewrite may have left the file truncated, so continuing could drop
    /// or duplicate jobs.
    pub(crate) fn dequeue(&self) -> Result<Option<String>, String> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|err| format!("Failed to open job file {}: {}", self.path.display(), err))?;

        lock_exclusive(&file)
            .map_err(|err| format!("Failed to lock job file {}: {}", self.path.display(), err))?;

        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .map_err(|err| format!("Failed to read job file {}: {}", self.path.display(), err))?;

        if buffer.is_empty() {
            return Ok(None);
        }

        let (line, remainder) = match buffer.iter().position(|byte| *byte == b'\n') {
            Some(index) => (&buffer[..index], &buffer[index + 1..]),
            None => (&buffer[..], &buffer[..0]),
        };
        let job = String::from_utf8_lossy(line).into_owned();

        self.write_back(&mut file, remainder)?;

        // `file` drops here, closing the descriptor and releasing the lock.
        Ok(Some(job))
    }

    /// Replace the file contents with `remainder`. Must complete before the
    /// lock is released: the old contents and the claimed job must never be
    /// visible to another locker at the same time.
    fn write_back(&self, file: &mut File, remainder: &[u8]) -> Result<(), String> {
        file.seek(SeekFrom::Start(0)).map_err(|err| {
            format!("Failed to rewind job file {}: {}", self.path.display(), err)
        })?;
        file.set_len(0).map_err(|err| {
            format!("Failed to truncate job file {}: {}", self.path.display(), err)
        })?;
        file.write_all(remainder).map_err(|err| {
            format!(
                "Failed to rewrite job file {} (queue may be corrupted): {}",
                self.path.display(),
                err
            )
        })
    }
}

/// Acquire a blocking exclusive flock on the whole file.
///
/// The lock conflicts with every other holder of the same file on the same
/// filesystem, across independent processes. Blocking is deliberate: a
/// contended claim waits its turn rather than failing. The OS releases the
/// lock when the descriptor closes, including on abnormal process death.
#[cfg(unix)]
fn lock_exclusive(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    loop {
        // SAFETY: flock is a standard POSIX call and fd is a valid
        // descriptor owned by `file` for the duration of the call.
        let result = unsafe { libc::flock(fd, libc::LOCK_EX) };
        if result == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        // A signal (e.g. the ctrl-c handler) can interrupt the wait.
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err);
    }
}

#[cfg(not(unix))]
fn lock_exclusive(file: &File) -> io::Result<()> {
    // No advisory locking off unix; a single local worker is still correct.
    let _ = file;
    Ok(())
}
