//! Background removal of expired cache files.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{CACHE_STATE_FILE, CACHE_SWEEP_SAMPLE, SECS_PER_DAY};

/// Persisted cache bookkeeping, stored as JSON in the cache folder.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SweepState {
    /// When the last sweep started
    pub last_sweep: Option<DateTime<Utc>>,
}

impl SweepState {
    /// Loads the state file; a missing or unreadable file yields an empty state.
    pub(crate) fn load(path: &Path) -> Self {
        match std::fs::read(path) {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                warn!("Ignoring malformed cache state {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}

/// Decides when a sweep is due and launches it.
pub(crate) struct Sweeper {
    dir: PathBuf,
    retain: Duration,
    interval: Duration,
    state: Mutex<SweepState>,
    cancel: CancellationToken,
}

impl Sweeper {
    pub(crate) fn new(dir: PathBuf, retain: Duration, interval: Duration) -> Self {
        let state = SweepState::load(&dir.join(CACHE_STATE_FILE));
        Self {
            dir,
            retain,
            interval,
            state: Mutex::new(state),
            cancel: CancellationToken::new(),
        }
    }

    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the last sweep is older than the sweep interval (or never ran).
    pub(crate) fn is_due(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.last_sweep {
            None => true,
            Some(last) => (Utc::now() - last)
                .to_std()
                .map_or(false, |elapsed| elapsed > self.interval),
        }
    }

    /// Starts a detached sweep if one is due.
    ///
    /// The sweep time is recorded and persisted before the task is spawned, so
    /// the next call does not start a second one. The caller does not wait for
    /// the task; [`Sweeper::cancel`] stops it between files.
    pub(crate) async fn maybe_sweep(&self) -> Option<JoinHandle<()>> {
        if !self.is_due() {
            return None;
        }
        let snapshot = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.last_sweep = Some(Utc::now());
            state.clone()
        };
        let state_path = self.dir.join(CACHE_STATE_FILE);
        match serde_json::to_vec_pretty(&snapshot) {
            Ok(raw) => {
                if let Err(e) = tokio::fs::write(&state_path, raw).await {
                    warn!("Failed to save cache state {}: {}", state_path.display(), e);
                }
            }
            Err(e) => warn!("Failed to encode cache state: {}", e),
        }

        warn!("Cache sweep of {} started in the background", self.dir.display());
        Some(tokio::spawn(sweep(
            self.dir.clone(),
            self.retain,
            self.cancel.clone(),
        )))
    }

    /// Stops a running sweep and prevents new ones from doing any work.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Deletes files of `dir` whose modification time is older than `retain`.
///
/// Linux uses a single `find` invocation; elsewhere, or if `find` fails, a
/// random sample of at most `CACHE_SWEEP_SAMPLE` files is inspected. Failures
/// are logged and never propagated.
pub(crate) async fn sweep(dir: PathBuf, retain: Duration, cancel: CancellationToken) {
    if cfg!(target_os = "linux") {
        let outcome = tokio::select! {
            result = sweep_with_find(&dir, retain) => result,
            _ = cancel.cancelled() => return,
        };
        match outcome {
            Ok(()) => {
                info!("Cache sweep of {} completed", dir.display());
                return;
            }
            Err(e) => warn!("find-based cache sweep failed, scanning instead: {}", e),
        }
    }
    match sweep_sampled(&dir, retain, &cancel).await {
        Ok(removed) => info!(
            "Cache sweep of {} completed, {} files removed",
            dir.display(),
            removed
        ),
        Err(e) => error!("Cache sweep of {} failed: {}", dir.display(), e),
    }
}

async fn sweep_with_find(dir: &Path, retain: Duration) -> io::Result<()> {
    // find counts whole days, so one day is added to stay on the safe side
    let days = (retain.as_secs_f64() / SECS_PER_DAY) as u64 + 1;
    let status = tokio::process::Command::new("find")
        .arg(dir)
        .args(["-maxdepth", "1", "-type", "f", "-mtime"])
        .arg(format!("+{days}"))
        .arg("-delete")
        .kill_on_drop(true)
        .status()
        .await?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("find exited with {status}")))
    }
}

/// Scans a random sample of the folder and removes expired files.
///
/// Returns the number of files removed.
pub(crate) async fn sweep_sampled(
    dir: &Path,
    retain: Duration,
    cancel: &CancellationToken,
) -> io::Result<usize> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    if files.len() > CACHE_SWEEP_SAMPLE {
        files.shuffle(&mut rand::rng());
        files.truncate(CACHE_SWEEP_SAMPLE);
    }

    let mut removed = 0;
    for path in files {
        if cancel.is_cancelled() {
            break;
        }
        let Ok(modified) = tokio::fs::metadata(&path).await.and_then(|m| m.modified()) else {
            continue;
        };
        if modified.elapsed().unwrap_or_default() > retain {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
    Ok(removed)
}
