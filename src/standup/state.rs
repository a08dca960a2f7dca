//! Persistent state document for the bot.
//!
//! A single JSON file holds everything the bot remembers: the bound chat,
//! the roster and the per-chat member cache. Every mutation is a full
//! load-modify-save cycle so concurrent handlers always start from the
//! latest persisted document (last save wins, see DESIGN.md).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The persisted document.
///
/// All fields default individually so documents written by older versions
/// load with the missing fields filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Chat the scheduled announcements go to. Absent until /setchat.
    #[serde(default)]
    pub chat_id: Option<i64>,
    /// Roster of candidate hosts, in insertion order. No two entries share
    /// an identity key.
    #[serde(default)]
    pub participants: Vec<String>,
    /// chat id -> member id -> last seen display name. Keys are stringified
    /// for the JSON object layout; sorted maps keep import order stable.
    #[serde(default)]
    pub known_users: BTreeMap<String, BTreeMap<String, String>>,
}

impl State {
    /// Remembered display names for a chat, in deterministic order.
    pub fn known_names(&self, chat_id: i64) -> Vec<String> {
        self.known_users
            .get(&chat_id.to_string())
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }
}

/// File-backed store for the state document.
#[derive(Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current document. A missing, unreadable or corrupt file is
    /// treated as an empty document, never an error.
    pub fn load(&self) -> State {
        if !self.path.exists() {
            return State::default();
        }
        match self.try_load() {
            Ok(state) => state,
            Err(e) => {
                warn!("Failed to read state file: {e}");
                State::default()
            }
        }
    }

    fn try_load(&self) -> Result<State, String> {
        let json = std::fs::read_to_string(&self.path)
            .map_err(|e| format!("Failed to read {}: {e}", self.path.display()))?;
        serde_json::from_str(&json)
            .map_err(|e| format!("Failed to parse {}: {e}", self.path.display()))
    }

    /// Persist the document. Write failures are logged and swallowed;
    /// callers never observe them.
    pub fn save(&self, state: &State) {
        if let Err(e) = self.try_save(state) {
            warn!("Failed to write state file: {e}");
        }
    }

    fn try_save(&self, state: &State) -> Result<(), String> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create {}: {e}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| format!("Failed to serialize: {e}"))?;
        std::fs::write(&self.path, json)
            .map_err(|e| format!("Failed to write {}: {e}", self.path.display()))?;
        Ok(())
    }

    /// Load-modify-save in one call.
    pub fn update(&self, mutate: impl FnOnce(&mut State)) -> State {
        let mut state = self.load();
        mutate(&mut state);
        self.save(&state);
        state
    }
}

/// Log what was found on disk at startup.
pub fn log_startup(store: &StateStore) {
    let state = store.load();
    info!(
        "Loaded state from {:?} ({} participants, chat {})",
        store.path(),
        state.participants.len(),
        state
            .chat_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unbound".to_string()),
    );
}
