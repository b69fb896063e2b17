//! Persisted relay state.
//!
//! Tracks the last announced version/build and a short most-recent-first
//! history of detected builds. Persisted as pretty-printed JSON (default
//! `data.json`) using the camelCase key layout of older state files, so a
//! file written before the history list existed still loads.

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Maximum number of builds kept in [`PersistedState::last_builds_data`].
pub const HISTORY_CAPACITY: usize = 5;

/// Build identifier as published upstream.
///
/// PaperMC returns numbers, but state files may hold strings (including the
/// empty string for "unknown"). Two ids are equal when they render the same.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildId {
    Number(u64),
    Text(String),
}

impl BuildId {
    /// Returns `true` if no build has been recorded.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl Default for BuildId {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl PartialEq for BuildId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl Eq for BuildId {}

impl From<u64> for BuildId {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for BuildId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl std::fmt::Display for BuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One detected build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRecord {
    /// Release line, e.g. `1.20.4`.
    pub version: String,
    /// Build within the release line.
    pub build: BuildId,
    /// Display-ready change lines (at most three).
    pub changelog: Vec<String>,
    /// Display timestamp. Not parsed back.
    pub time: String,
    /// Artifact download URL.
    pub download_url: String,
}

/// Everything the relay remembers between restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedState {
    /// Last announced version, empty until the first detection.
    pub last_version: String,
    /// Last announced build, empty until the first detection.
    pub last_build: BuildId,
    /// Most-recent-first history, capped at [`HISTORY_CAPACITY`].
    pub last_builds_data: Vec<BuildRecord>,
}

impl PersistedState {
    /// Returns `true` if `record` differs from the last announced build.
    pub fn is_new_build(&self, record: &BuildRecord) -> bool {
        self.last_version != record.version || self.last_build != record.build
    }

    /// Record `record` as the latest build: update the top-level fields and
    /// prepend it to the history, dropping the oldest entries past capacity.
    pub fn record_build(&mut self, record: BuildRecord) {
        self.last_version = record.version.clone();
        self.last_build = record.build.clone();
        self.last_builds_data.insert(0, record);
        self.last_builds_data.truncate(HISTORY_CAPACITY);
    }

    /// Most recent history entry, if any.
    pub fn latest(&self) -> Option<&BuildRecord> {
        self.last_builds_data.first()
    }

    /// Returns `true` if neither a version nor a build is known.
    pub fn is_empty(&self) -> bool {
        self.last_version.is_empty() && self.last_build.is_empty()
    }

    /// Read state from `path`.
    ///
    /// A missing file yields the default state.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] if the file exists but cannot be
    /// read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(RelayError::Persistence(format!(
                    "cannot read state from {}: {e}",
                    path.display()
                )));
            }
        };

        let mut state: Self = serde_json::from_slice(&bytes).map_err(|e| {
            RelayError::Persistence(format!("cannot parse state in {}: {e}", path.display()))
        })?;
        state.last_builds_data.truncate(HISTORY_CAPACITY);
        Ok(state)
    }

    /// Write the full state to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] if the parent directory cannot be
    /// created or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                RelayError::Persistence(format!(
                    "cannot create state directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| RelayError::Persistence(format!("cannot serialize state: {e}")))?;

        std::fs::write(path, json).map_err(|e| {
            RelayError::Persistence(format!("cannot write state to {}: {e}", path.display()))
        })
    }
}

/// Shared handle to the process-wide [`PersistedState`].
///
/// Writers replace the state inside one critical section, so readers see
/// either the whole update or none of it.
#[derive(Debug)]
pub struct StateStore {
    path: Option<PathBuf>,
    state: RwLock<PersistedState>,
}

impl StateStore {
    /// Load the store from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match PersistedState::load_from(&path) {
            Ok(state) => {
                tracing::info!(
                    path = %path.display(),
                    version = %state.last_version,
                    build = %state.last_build,
                    "loaded persisted state"
                );
                state
            }
            Err(e) => {
                tracing::error!("{e}; starting from empty state");
                PersistedState::default()
            }
        };
        Self {
            path: Some(path),
            state: RwLock::new(state),
        }
    }

    /// In-memory store that never touches disk.
    pub fn in_memory(state: PersistedState) -> Self {
        Self {
            path: None,
            state: RwLock::new(state),
        }
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> PersistedState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record `record` if it differs from the last known build.
    ///
    /// Returns the updated state when a change was applied, `None` when the
    /// build was already known.
    pub fn apply_if_new(&self, record: &BuildRecord) -> Option<PersistedState> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !guard.is_new_build(record) {
            return None;
        }
        guard.record_build(record.clone());
        Some(guard.clone())
    }

    /// Write `state` to the backing file.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] on write failure. In-memory stores
    /// always succeed.
    pub fn persist(&self, state: &PersistedState) -> Result<()> {
        match &self.path {
            Some(path) => state.save_to(path),
            None => Ok(()),
        }
    }
}
