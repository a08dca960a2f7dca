//! Scheduling: the weekday 10:00 recurring trigger and one-off test triggers.
//!
//! The recurring rule is a cron expression evaluated in the configured
//! timezone. Each iteration computes the next fire instant strictly after
//! the previous one, sleeps until it arrives, then fires; instants missed
//! while the process was down are skipped, never backfilled.

use crate::standup::announce::Announcer;
use crate::standup::state::StateStore;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Weekday announcement rule, 7-field cron: sec min hour dom month dow year.
pub const DAILY_CRON: &str = "0 0 10 * * Mon,Tue,Wed,Thu,Fri *";

/// Default one-off delay when the argument is missing or unparseable.
const DEFAULT_DELAY_SECS: u64 = 5;
/// One-off delays are clamped to [1, MAX_DELAY_SECS].
const MAX_DELAY_SECS: u64 = 3600;

/// The next fire instant strictly after `after`, in `after`'s zone.
pub fn next_fire(schedule: &Schedule, after: DateTime<Tz>) -> Option<DateTime<Tz>> {
    schedule.after(&after).next()
}

/// Parse a one-off delay argument: integer seconds clamped to
/// [1, 3600], defaulting to 5.
pub fn parse_delay(args: &str) -> u64 {
    args.trim()
        .parse::<i64>()
        .map(|n| n.clamp(1, MAX_DELAY_SECS as i64) as u64)
        .unwrap_or(DEFAULT_DELAY_SECS)
}

/// Run a future once after a delay.
fn run_after<F>(delay: Duration, fut: F) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        sleep(delay).await;
        fut.await;
    })
}

/// Arms the recurring weekday trigger and ad-hoc one-off triggers.
///
/// The bound chat is re-read from the store at every fire, so rebinding
/// between arm and fire is honored.
#[derive(Clone)]
pub struct Scheduler {
    tz: Tz,
    schedule: Schedule,
    store: StateStore,
    announcer: Arc<Announcer>,
}

impl Scheduler {
    pub fn new(
        tz: Tz,
        store: StateStore,
        announcer: Arc<Announcer>,
    ) -> Result<Self, cron::error::Error> {
        let schedule = Schedule::from_str(DAILY_CRON)?;
        Ok(Self {
            tz,
            schedule,
            store,
            announcer,
        })
    }

    /// Spawn the recurring trigger task. Runs for the process lifetime.
    pub fn spawn_recurring(&self) {
        let tz = self.tz;
        let schedule = self.schedule.clone();
        let store = self.store.clone();
        let announcer = self.announcer.clone();

        tokio::spawn(async move {
            let mut after = Utc::now().with_timezone(&tz);
            loop {
                let Some(next) = next_fire(&schedule, after) else {
                    warn!("Daily schedule has no future fire instant, stopping");
                    return;
                };
                info!("Next host announcement at {next}");

                let wait = (next - Utc::now().with_timezone(&tz))
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                sleep(wait).await;

                match store.load().chat_id {
                    Some(chat_id) => announcer.announce(chat_id).await,
                    None => info!("Skipping scheduled announcement: no chat bound"),
                }
                after = next;
            }
        });
        info!("Scheduled weekday announcements at 10:00 {}", self.tz);
    }

    /// Spawn a one-off trigger firing once after `delay_secs`. Independent
    /// of the recurring schedule. Falls back to `fallback_chat_id` when no
    /// chat is bound at fire time.
    pub fn spawn_one_off(&self, delay_secs: u64, fallback_chat_id: i64) {
        let store = self.store.clone();
        let announcer = self.announcer.clone();

        info!("One-off announcement scheduled in {delay_secs}s");
        run_after(Duration::from_secs(delay_secs), async move {
            let chat_id = store.load().chat_id.unwrap_or(fallback_chat_id);
            announcer.announce(chat_id).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike, Weekday};
    use chrono_tz::Europe::Moscow;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn schedule() -> Schedule {
        Schedule::from_str(DAILY_CRON).unwrap()
    }

    #[test]
    fn test_fires_same_day_before_ten() {
        // 2024-01-02 is a Tuesday.
        let after = Moscow.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        let next = next_fire(&schedule(), after).unwrap();
        assert_eq!(next, Moscow.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_friday_after_ten_skips_to_monday() {
        // 2024-01-05 is a Friday.
        let after = Moscow.with_ymd_and_hms(2024, 1, 5, 10, 1, 0).unwrap();
        let next = next_fire(&schedule(), after).unwrap();
        assert_eq!(next, Moscow.with_ymd_and_hms(2024, 1, 8, 10, 0, 0).unwrap());
        assert_eq!(next.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_weekend_never_fires() {
        // 2024-01-06 is a Saturday.
        let after = Moscow.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap();
        let next = next_fire(&schedule(), after).unwrap();
        assert_eq!(next.weekday(), Weekday::Mon);
        assert_eq!(next.hour(), 10);
        assert_eq!(next.minute(), 0);
    }

    #[test]
    fn test_exact_ten_oclock_is_not_refired() {
        // `after` is exclusive: arming exactly at a fire instant moves on.
        let at_ten = Moscow.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        let next = next_fire(&schedule(), at_ten).unwrap();
        assert_eq!(next, Moscow.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_delay_clamps_and_defaults() {
        assert_eq!(parse_delay("2"), 2);
        assert_eq!(parse_delay(" 30 "), 30);
        assert_eq!(parse_delay("0"), 1);
        assert_eq!(parse_delay("-5"), 1);
        assert_eq!(parse_delay("4000"), 3600);
        assert_eq!(parse_delay(""), 5);
        assert_eq!(parse_delay("soon"), 5);
    }

    #[tokio::test]
    async fn test_run_after_fires_exactly_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        run_after(Duration::from_millis(50), async move {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        sleep(Duration::from_millis(60)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
