//! Durable session state.
//!
//! # Responsibilities
//! - Hold the auth cookie, request/error counters and start time
//! - Survive restarts: loaded once at startup, written after every mutation
//!
//! # Design Decisions
//! - Write-through, no batching; at most the last mutation is lost on a crash
//! - The file is rewritten under the state lock so writes land in order
//! - Persistence faults are logged, never returned; the in-memory state stays
//!   authoritative

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Error log entries retained.
pub const ERROR_LOG_LIMIT: usize = 100;

/// One recorded upstream error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Unix timestamp, seconds.
    pub timestamp: u64,
    pub message: String,
}

/// Persisted session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub auth_cookie: Option<String>,
    pub request_count: u64,
    /// Unix timestamp of the last request, seconds.
    pub last_activity: Option<u64>,
    pub error_log: Vec<ErrorEntry>,
    /// Unix timestamp of the first start, seconds.
    pub start_time: u64,
}

/// Session counters as exposed to status and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total_requests: u64,
    pub last_activity: Option<u64>,
    pub uptime_secs: u64,
    pub error_count: usize,
}

/// File-backed session store.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    state: Mutex<SessionState>,
}

impl SessionStore {
    /// Load the session at `path`, or start a fresh one.
    ///
    /// An unreadable or corrupt file is logged and replaced.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let mut state = match load_state(&path) {
            Ok(Some(state)) => {
                tracing::info!(
                    path = %path.display(),
                    requests = state.request_count,
                    "Loaded session state"
                );
                state
            }
            Ok(None) => SessionState::default(),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to load session state, starting fresh");
                SessionState::default()
            }
        };

        if state.start_time == 0 {
            state.start_time = unix_now();
        }

        let store = Self {
            path,
            state: Mutex::new(state),
        };
        store.mutate(|_| {});
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn auth_cookie(&self) -> Option<String> {
        self.lock().auth_cookie.clone()
    }

    pub fn update_cookie(&self, cookie: &str) {
        self.mutate(|state| state.auth_cookie = Some(cookie.to_string()));
        tracing::info!("Auth cookie updated");
    }

    pub fn record_request(&self) {
        self.mutate(|state| {
            state.request_count += 1;
            state.last_activity = Some(unix_now());
        });
    }

    pub fn record_error(&self, message: &str) {
        self.mutate(|state| {
            state.error_log.push(ErrorEntry {
                timestamp: unix_now(),
                message: message.to_string(),
            });
            if state.error_log.len() > ERROR_LOG_LIMIT {
                let excess = state.error_log.len() - ERROR_LOG_LIMIT;
                state.error_log.drain(..excess);
            }
        });
    }

    pub fn stats(&self) -> SessionStats {
        let state = self.lock();
        SessionStats {
            total_requests: state.request_count,
            last_activity: state.last_activity,
            uptime_secs: unix_now().saturating_sub(state.start_time),
            error_count: state.error_log.len(),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<F: FnOnce(&mut SessionState)>(&self, f: F) {
        let mut state = self.lock();
        f(&mut state);
        if let Err(e) = save_state(&self.path, &state) {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to persist session state");
        }
    }
}

fn load_state(path: &Path) -> std::io::Result<Option<SessionState>> {
    if !path.exists() {
        return Ok(None);
    }
    let reader = BufReader::new(File::open(path)?);
    let state = serde_json::from_reader(reader)?;
    Ok(Some(state))
}

fn save_state(path: &Path, state: &SessionState) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, state)?;
    writer.flush()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
