//! JSON state file for the position tracker.
//!
//! Single document holding the per-symbol trade log, the P&L cache, and
//! the corporate-action ledger. Loaded on construction, saved on every
//! mutation. Writes go to a sibling temp file first and are renamed into
//! place, so a crash mid-write never truncates existing state.
//!
//! Single-writer only: concurrent writers from multiple processes are not
//! supported (no file locking).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::records::{CachedPnl, TradeRecord};
use crate::corporate_actions::CorporateActionLedger;

/// Errors from state persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("state file I/O error at {path}: {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// State file exists but does not parse.
    #[error("state file {path} is corrupt: {message}")]
    Corrupt {
        /// Path involved.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

/// Persisted tracker state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerState {
    /// Ordered trade log per symbol.
    #[serde(default)]
    pub positions_history: BTreeMap<String, Vec<TradeRecord>>,
    /// Cached derived P&L figures, cleared per symbol on mutation.
    #[serde(default)]
    pub pnl_cache: BTreeMap<String, CachedPnl>,
    /// Corporate actions per symbol.
    #[serde(default)]
    pub corporate_actions: CorporateActionLedger,
    /// Timestamp of the last save.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Load state from disk; a missing file yields empty state.
pub fn load(path: &Path) -> Result<TrackerState, StoreError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no state file yet, starting empty");
        return Ok(TrackerState::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let state: TrackerState =
        serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    tracing::info!(
        path = %path.display(),
        symbols = state.positions_history.len(),
        actions = state.corporate_actions.len(),
        "loaded position tracking state"
    );

    Ok(state)
}

/// Save state to disk via temp-file-and-rename.
pub fn save(path: &Path, state: &mut TrackerState) -> Result<(), StoreError> {
    state.last_updated = Some(Utc::now());

    let json = serde_json::to_string_pretty(state).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|source| StoreError::Io {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "position tracking state saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::positions::records::TradeKind;

    #[test]
    fn missing_file_loads_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = load(&dir.path().join("missing.json")).unwrap();
        assert!(state.positions_history.is_empty());
        assert!(state.last_updated.is_none());
    }

    #[test]
    fn state_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut state = TrackerState::default();
        state.positions_history.entry("AAPL".to_string()).or_default().push(
            TradeRecord::new(TradeKind::Buy, dec!(10), dec!(150), Utc::now(), Some("o-1".into())),
        );

        save(&path, &mut state).unwrap();
        assert!(state.last_updated.is_some());

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.positions_history["AAPL"].len(), 1);
        assert_eq!(loaded.positions_history["AAPL"][0].quantity, dec!(10));
        assert_eq!(loaded.last_updated, state.last_updated);
    }

    #[test]
    fn corrupt_file_is_an_error_not_a_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn save_replaces_rather_than_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut state = TrackerState::default();
        save(&path, &mut state).unwrap();
        save(&path, &mut state).unwrap();

        // No stray temp file left behind.
        assert!(!path.with_extension("json.tmp").exists());
        assert!(path.exists());
    }
}
