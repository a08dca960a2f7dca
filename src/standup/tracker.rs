//! Member tracking: remember everyone seen in a chat for /addall.

use crate::standup::state::StateStore;
use tracing::debug;

/// Records chat members as they are observed via messages or membership
/// updates. Entries are upserted per (chat, member) and never expire.
#[derive(Clone)]
pub struct MemberTracker {
    store: StateStore,
}

impl MemberTracker {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Remember `display_name` as the last seen name of `member_id` in `chat_id`.
    pub fn observe(&self, chat_id: i64, member_id: i64, display_name: &str) {
        debug!("Observed {display_name} ({member_id}) in chat {chat_id}");
        self.store.update(|state| {
            state
                .known_users
                .entry(chat_id.to_string())
                .or_default()
                .insert(member_id.to_string(), display_name.to_string());
        });
    }
}
