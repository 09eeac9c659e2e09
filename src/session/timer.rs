//! Rest countdown backed by a persisted absolute deadline
//!
//! The deadline (not a remaining-seconds counter) is what gets stored, so a
//! countdown started before the process was suspended or killed picks up at
//! the right point: remaining time is always wall-clock arithmetic against
//! the stored end time.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

/// Where countdown deadlines are persisted, keyed by timer identity.
/// Implemented by [`crate::db::Database`]; tests use an in-memory store.
pub trait TimerStore {
    fn timer_end(&self, key: &str) -> Result<Option<DateTime<Utc>>>;
    fn set_timer_end(&self, key: &str, end: DateTime<Utc>) -> Result<()>;
    fn clear_timer_end(&self, key: &str) -> Result<()>;
}

/// Outcome of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No countdown running
    Idle,
    Running { remaining_secs: i64 },
    /// The countdown just hit zero; reported exactly once
    Finished,
}

pub struct CountdownTimer {
    key: String,
    end: Option<DateTime<Utc>>,
}

impl CountdownTimer {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), end: None }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_running(&self) -> bool {
        self.end.is_some()
    }

    /// Begin counting `duration_secs` down from `now`. If a deadline for
    /// this key survived an interrupted prior run, resume from it instead
    /// of starting over.
    pub fn start(
        &mut self,
        store: &dyn TimerStore,
        duration_secs: u32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let end = match store.timer_end(&self.key)? {
            Some(end) => end,
            None => {
                let end = now + Duration::seconds(i64::from(duration_secs));
                store.set_timer_end(&self.key, end)?;
                end
            }
        };
        self.end = Some(end);
        Ok(())
    }

    /// Recompute remaining time from the deadline. Reports [`Tick::Finished`]
    /// once when the deadline passes, clearing the stored end time.
    pub fn tick(&mut self, store: &dyn TimerStore, now: DateTime<Utc>) -> Result<Tick> {
        let Some(end) = self.end else {
            return Ok(Tick::Idle);
        };
        let remaining = (end - now).num_seconds();
        if remaining <= 0 {
            self.end = None;
            store.clear_timer_end(&self.key)?;
            Ok(Tick::Finished)
        } else {
            Ok(Tick::Running { remaining_secs: remaining })
        }
    }

    /// Re-read the persisted deadline after the process was away. Remaining
    /// time comes from the store, never from a cached counter, since the
    /// wall clock may have advanced arbitrarily in between.
    pub fn resume(&mut self, store: &dyn TimerStore, now: DateTime<Utc>) -> Result<Tick> {
        self.end = store.timer_end(&self.key)?;
        self.tick(store, now)
    }

    /// Cancel the countdown and clear the persisted deadline. Safe when idle.
    pub fn stop(&mut self, store: &dyn TimerStore) -> Result<()> {
        self.end = None;
        store.clear_timer_end(&self.key)
    }

    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        self.end.map(|end| (end - now).num_seconds().max(0))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryTimerStore;
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_counts_down_from_duration() {
        let store = MemoryTimerStore::default();
        let mut timer = CountdownTimer::new("rest");
        let now = t0();

        timer.start(&store, 60, now).unwrap();
        assert_eq!(
            timer.tick(&store, now + Duration::seconds(10)).unwrap(),
            Tick::Running { remaining_secs: 50 }
        );
    }

    #[test]
    fn test_completion_fires_exactly_once() {
        let store = MemoryTimerStore::default();
        let mut timer = CountdownTimer::new("rest");
        let now = t0();

        timer.start(&store, 5, now).unwrap();
        assert_eq!(timer.tick(&store, now + Duration::seconds(5)).unwrap(), Tick::Finished);
        assert_eq!(timer.tick(&store, now + Duration::seconds(6)).unwrap(), Tick::Idle);
        assert!(store.timer_end("rest").unwrap().is_none());
    }

    #[test]
    fn test_resume_after_suspension_past_deadline() {
        // Start 60s, "suspend" for 70s of wall clock, resume: already done.
        let store = MemoryTimerStore::default();
        let mut timer = CountdownTimer::new("rest");
        let now = t0();
        timer.start(&store, 60, now).unwrap();

        let mut resumed = CountdownTimer::new("rest");
        let later = now + Duration::seconds(70);
        assert_eq!(resumed.resume(&store, later).unwrap(), Tick::Finished);
        assert_eq!(resumed.remaining_secs(later), None);
        // Completion already reported; nothing left to fire
        assert_eq!(resumed.tick(&store, later + Duration::seconds(1)).unwrap(), Tick::Idle);
    }

    #[test]
    fn test_resume_mid_countdown() {
        let store = MemoryTimerStore::default();
        let mut timer = CountdownTimer::new("rest");
        let now = t0();
        timer.start(&store, 60, now).unwrap();

        let mut resumed = CountdownTimer::new("rest");
        assert_eq!(
            resumed.resume(&store, now + Duration::seconds(45)).unwrap(),
            Tick::Running { remaining_secs: 15 }
        );
    }

    #[test]
    fn test_start_resumes_surviving_deadline() {
        // A deadline left over from an interrupted run wins over a restart
        let store = MemoryTimerStore::default();
        let mut timer = CountdownTimer::new("rest");
        let now = t0();
        timer.start(&store, 60, now).unwrap();

        let mut second = CountdownTimer::new("rest");
        second.start(&store, 60, now + Duration::seconds(30)).unwrap();
        assert_eq!(second.remaining_secs(now + Duration::seconds(30)), Some(30));
    }

    #[test]
    fn test_stop_clears_store_and_is_idempotent() {
        let store = MemoryTimerStore::default();
        let mut timer = CountdownTimer::new("rest");
        timer.start(&store, 60, t0()).unwrap();

        timer.stop(&store).unwrap();
        assert!(!timer.is_running());
        assert!(store.timer_end("rest").unwrap().is_none());
        timer.stop(&store).unwrap();
    }

    #[test]
    fn test_keys_are_independent() {
        let store = MemoryTimerStore::default();
        let mut a = CountdownTimer::new("a");
        let mut b = CountdownTimer::new("b");
        let now = t0();
        a.start(&store, 10, now).unwrap();
        b.start(&store, 99, now).unwrap();

        a.stop(&store).unwrap();
        assert_eq!(store.timer_end("b").unwrap(), Some(now + Duration::seconds(99)));
    }
}
