//! Roster operations: bind the announcement chat, add/remove candidates,
//! bulk-import remembered members.
//!
//! Every operation is a full read-modify-write against the state store, so
//! two bot processes pointed at the same file see each other's changes.

use crate::standup::names::identity_key;
use crate::standup::state::{State, StateStore};
use std::collections::HashSet;
use tracing::info;

/// Outcome of an add: which names went in and which were already present.
#[derive(Debug, Default, PartialEq)]
pub struct AddReport {
    pub added: Vec<String>,
    pub already_present: Vec<String>,
}

/// Outcome of a remove: which names matched and which did not.
#[derive(Debug, Default, PartialEq)]
pub struct RemoveReport {
    pub removed: Vec<String>,
    pub not_found: Vec<String>,
}

/// Manages the participant roster and the bound chat.
#[derive(Clone)]
pub struct RosterManager {
    store: StateStore,
}

impl RosterManager {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Bind the chat scheduled announcements go to. Rebinding overwrites.
    pub fn bind_chat(&self, chat_id: i64) {
        self.store.update(|state| state.chat_id = Some(chat_id));
        info!("Announcement chat set to {chat_id}");
    }

    /// Add names to the roster, skipping identity-key collisions.
    /// Input order is preserved for the appended entries.
    pub fn add(&self, names: &[String]) -> AddReport {
        let mut report = AddReport::default();
        self.store.update(|state| {
            report = add_names(state, names);
        });
        report
    }

    /// Remove names from the roster by identity key.
    pub fn remove(&self, names: &[String]) -> RemoveReport {
        let mut report = RemoveReport::default();
        self.store.update(|state| {
            for name in names {
                let key = identity_key(name);
                let before = state.participants.len();
                state.participants.retain(|p| identity_key(p) != key);
                if state.participants.len() < before {
                    report.removed.push(name.clone());
                } else {
                    report.not_found.push(name.clone());
                }
            }
        });
        report
    }

    /// Add every remembered member of `chat_id` that is not already on the
    /// roster. Returns the names actually added; an unknown chat adds nothing.
    pub fn import_known(&self, chat_id: i64) -> Vec<String> {
        let mut added = Vec::new();
        self.store.update(|state| {
            let names = state.known_names(chat_id);
            added = add_names(state, &names).added;
        });
        added
    }

    /// The roster, in stored order.
    pub fn list(&self) -> Vec<String> {
        self.store.load().participants
    }
}

fn add_names(state: &mut State, names: &[String]) -> AddReport {
    let mut report = AddReport::default();
    let mut existing: HashSet<String> =
        state.participants.iter().map(|p| identity_key(p)).collect();

    for name in names {
        let key = identity_key(name);
        if existing.contains(&key) {
            report.already_present.push(name.clone());
            continue;
        }
        existing.insert(key);
        state.participants.push(name.clone());
        report.added.push(name.clone());
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> RosterManager {
        RosterManager::new(StateStore::new(dir.path().join("state.json")))
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let roster = manager(&dir);

        let first = roster.add(&names(&["@alice"]));
        assert_eq!(first.added, names(&["@alice"]));

        let second = roster.add(&names(&["@alice"]));
        assert!(second.added.is_empty());
        assert_eq!(second.already_present, names(&["@alice"]));
        assert_eq!(roster.list(), names(&["@alice"]));
    }

    #[test]
    fn test_add_dedup_ignores_case_and_marker() {
        let dir = TempDir::new().unwrap();
        let roster = manager(&dir);

        roster.add(&names(&["Alice"]));
        let report = roster.add(&names(&["alice", "@ALICE"]));
        assert!(report.added.is_empty());

        // First spelling wins.
        assert_eq!(roster.list(), names(&["Alice"]));
    }

    #[test]
    fn test_remove_missing_leaves_roster_unchanged() {
        let dir = TempDir::new().unwrap();
        let roster = manager(&dir);
        roster.add(&names(&["a", "b"]));

        let report = roster.remove(&names(&["c"]));
        assert_eq!(report.not_found, names(&["c"]));
        assert!(report.removed.is_empty());
        assert_eq!(roster.list(), names(&["a", "b"]));
    }

    #[test]
    fn test_remove_preserves_relative_order() {
        let dir = TempDir::new().unwrap();
        let roster = manager(&dir);
        roster.add(&names(&["a", "b", "c"]));

        let report = roster.remove(&names(&["@B"]));
        assert_eq!(report.removed, names(&["@B"]));
        assert_eq!(roster.list(), names(&["a", "c"]));
    }

    #[test]
    fn test_bind_chat_overwrites() {
        let dir = TempDir::new().unwrap();
        let roster = manager(&dir);

        roster.bind_chat(-1);
        roster.bind_chat(-2);

        let store = StateStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().chat_id, Some(-2));
    }

    #[test]
    fn test_import_known_dedups_against_roster() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store.update(|state| {
            let members = state.known_users.entry("-5".to_string()).or_default();
            members.insert("1".to_string(), "@alice".to_string());
            members.insert("2".to_string(), "Bob".to_string());
        });

        let roster = RosterManager::new(store);
        roster.add(&names(&["@ALICE"]));

        let added = roster.import_known(-5);
        assert_eq!(added, names(&["Bob"]));
        assert_eq!(roster.list(), names(&["@ALICE", "Bob"]));
    }

    #[test]
    fn test_import_unknown_chat_is_noop() {
        let dir = TempDir::new().unwrap();
        let roster = manager(&dir);
        assert!(roster.import_known(-99).is_empty());
        assert!(roster.list().is_empty());
    }
}
