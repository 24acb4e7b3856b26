//! Browsing history.
//!
//! Every completed access is recorded as a (request, response) pair. A cursor
//! marks the current page: `back`/`forward` move it, and a new visit made
//! while positioned in the past drops the "forward" entries, as browsers do.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::config::HistoryLimit;
use crate::error_handling::FetchError;
use crate::fetch::{Request, Response};
use crate::handler::{Handler, Next};

/// One recorded access.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// The request as it entered this stage
    pub request: Request,
    /// The response returned by the rest of the chain
    pub response: Response,
}

#[derive(Default)]
struct Log {
    entries: VecDeque<HistoryEntry>,
    /// Number of entries at or before the current page
    current: usize,
}

/// Records accesses that pass through it and supports back/forward navigation.
pub struct History {
    log: Mutex<Log>,
    max_len: Option<usize>,
}

impl History {
    /// Creates an empty history bounded by `limit`.
    pub fn new(limit: HistoryLimit) -> Self {
        Self {
            log: Mutex::new(Log::default()),
            max_len: limit.max_len(),
        }
    }

    fn log(&self) -> std::sync::MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entry after the current one, dropping any "forward" entries
    /// and evicting the oldest ones if the log is full.
    pub fn push(&self, entry: HistoryEntry) {
        let mut log = self.log();
        let current = log.current;
        log.entries.truncate(current);
        if let Some(max) = self.max_len {
            if log.entries.len() >= max {
                if max > 1 {
                    let excess = log.entries.len() - (max - 1);
                    log.entries.drain(..excess);
                } else {
                    log.entries.clear();
                }
            }
        }
        log.entries.push_back(entry);
        log.current = log.entries.len();
    }

    /// Current entry, without moving the cursor.
    pub fn last(&self) -> Option<HistoryEntry> {
        let log = self.log();
        log.current
            .checked_sub(1)
            .and_then(|i| log.entries.get(i))
            .cloned()
    }

    /// Moves one step back and returns the entry there, or `None` at the
    /// first entry.
    pub fn back(&self) -> Option<HistoryEntry> {
        let mut log = self.log();
        if log.current > 1 {
            log.current -= 1;
            log.entries.get(log.current - 1).cloned()
        } else {
            None
        }
    }

    /// Moves one step forward and returns the entry there, or `None` at the
    /// most recent entry.
    pub fn forward(&self) -> Option<HistoryEntry> {
        let mut log = self.log();
        if log.current < log.entries.len() {
            log.current += 1;
            log.entries.get(log.current - 1).cloned()
        } else {
            None
        }
    }

    /// Forgets everything.
    pub fn reset(&self) {
        let mut log = self.log();
        log.entries.clear();
        log.current = 0;
    }

    /// Number of recorded entries, including "forward" ones.
    pub fn len(&self) -> usize {
        self.log().entries.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity, `None` when unbounded.
    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(HistoryLimit::default())
    }
}

#[async_trait]
impl Handler for History {
    fn name(&self) -> &str {
        "history"
    }

    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response, FetchError> {
        let recorded = request.clone();
        let response = next.run(request).await?;
        self.push(HistoryEntry {
            request: recorded,
            response: response.clone(),
        });
        Ok(response)
    }
}
