//! Standup host picker: roster state, member tracking, scheduling and
//! announcements.

pub mod announce;
pub mod names;
pub mod roster;
pub mod schedule;
pub mod select;
pub mod state;
pub mod telegram;
pub mod tracker;

pub use announce::{Announcer, EMPTY_ROSTER_NOTICE};
pub use roster::RosterManager;
pub use schedule::Scheduler;
pub use state::StateStore;
pub use telegram::TelegramClient;
pub use tracker::MemberTracker;
