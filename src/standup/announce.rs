//! Announcement formatting and delivery.

use crate::standup::select::choose_host;
use crate::standup::state::StateStore;
use crate::standup::telegram::TelegramClient;
use std::sync::Arc;
use teloxide::utils::html;
use tracing::info;

/// Notice sent (and replied to /list) when the roster has nobody on it.
pub const EMPTY_ROSTER_NOTICE: &str = "The roster is empty. Add people with /add.";

/// Picks a host from the current roster and announces it to a chat.
pub struct Announcer {
    store: StateStore,
    telegram: Arc<TelegramClient>,
    meeting_link: String,
}

impl Announcer {
    pub fn new(store: StateStore, telegram: Arc<TelegramClient>, meeting_link: String) -> Self {
        Self {
            store,
            telegram,
            meeting_link,
        }
    }

    /// Announce today's host to `chat_id`. One outbound message per call;
    /// an empty roster gets the notice instead of a host.
    pub async fn announce(&self, chat_id: i64) {
        let state = self.store.load();
        match choose_host(&state.participants) {
            Some(host) => {
                info!("Chose {host} out of {} participants", state.participants.len());
                let text = render_announcement(host, &self.meeting_link);
                self.telegram.send_message(chat_id, &text, None).await.ok();
            }
            None => {
                info!("Roster empty, announcing the notice instead");
                self.telegram
                    .send_message(chat_id, EMPTY_ROSTER_NOTICE, None)
                    .await
                    .ok();
            }
        }
    }
}

/// HTML message naming the host, with the meeting link as a hyperlink.
fn render_announcement(host: &str, link: &str) -> String {
    format!(
        "Today's daily host: {}\nJoin: <a href=\"{}\">link</a>",
        html::escape(host),
        link
    )
}
