// ABOUTME: Up lock to prevent concurrent ups of the same project.
// ABOUTME: Uses atomic file creation with lock info stored in ~/.local/state/flotilla/.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::types::ServiceName;

/// Information about who holds an up lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// Project being brought up.
    pub project: String,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(project: &ServiceName) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            project: project.to_string(),
        }
    }

    /// Check if this lock is stale (older than 1 hour).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }

    /// Path to the lock file for a project.
    pub fn lock_path(project: &ServiceName) -> PathBuf {
        state_dir().join(format!("{}.lock", project))
    }
}

fn state_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".local/state/flotilla"),
        None => std::env::temp_dir().join("flotilla-state"),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("held by {holder} (pid {pid}) since {started_at}")]
    Held {
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A held up lock that releases on drop.
#[derive(Debug)]
pub struct UpLock {
    path: PathBuf,
}

impl UpLock {
    /// Acquire the up lock for a project.
    ///
    /// Uses `create_new` for atomic acquisition (no TOCTOU race). A lock
    /// older than 1 hour, an unreadable lock file, or `force` breaks the
    /// existing lock with a warning.
    ///
    /// # Errors
    ///
    /// Returns `LockError::Held` when another live process holds the lock.
    pub fn acquire(project: &ServiceName, force: bool) -> Result<Self, LockError> {
        let path = LockInfo::lock_path(project);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let info = LockInfo::new(project);

        match Self::try_create(&path, &info) {
            Ok(()) => Ok(Self { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let existing: Option<LockInfo> = std::fs::read_to_string(&path)
                    .ok()
                    .and_then(|s| serde_json::from_str(&s).ok());

                let breakable = force
                    || match &existing {
                        Some(info) => info.is_stale(),
                        // Unreadable lock info carries no proof of a live holder
                        None => true,
                    };

                if !breakable {
                    let held = existing.expect("non-breakable lock has info");
                    return Err(LockError::Held {
                        holder: held.holder,
                        pid: held.pid,
                        started_at: held.started_at,
                    });
                }

                tracing::warn!(path = %path.display(), "breaking stale up lock");
                std::fs::remove_file(&path)?;
                Self::try_create(&path, &info)?;
                Ok(Self { path })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn try_create(path: &Path, info: &LockInfo) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        let json = serde_json::to_string(info).expect("lock info serializes");
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UpLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), "failed to release up lock: {}", e);
        }
    }
}
