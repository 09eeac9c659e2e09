//! Local notification scheduling
//!
//! The session engine schedules a "rest over" reminder under a stable
//! identifier and cancels it by that identifier when the rest is skipped or
//! restarted. Delivery is in-process: the TUI polls [`PendingNotifications`]
//! on its tick and shows whatever has come due.

use chrono::{DateTime, Duration, Utc};

/// Scheduler contract: fire-after scheduling plus cancel-by-identifier.
/// Scheduling under an identifier that is already pending replaces it.
pub trait NotificationScheduler {
    fn schedule(
        &mut self,
        id: &str,
        fire_after_secs: u32,
        title: &str,
        body: &str,
        now: DateTime<Utc>,
    );
    fn cancel(&mut self, id: &str);
}

/// A delivered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: String,
}

struct Pending {
    notification: Notification,
    due: DateTime<Utc>,
}

/// In-process pending queue
#[derive(Default)]
pub struct PendingNotifications {
    pending: Vec<Pending>,
}

impl PendingNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything due at `now`, oldest first
    pub fn due(&mut self, now: DateTime<Utc>) -> Vec<Notification> {
        let mut fired: Vec<Pending> = Vec::new();
        let mut rest: Vec<Pending> = Vec::new();
        for p in self.pending.drain(..) {
            if p.due <= now {
                fired.push(p);
            } else {
                rest.push(p);
            }
        }
        self.pending = rest;
        fired.sort_by_key(|p| p.due);
        fired.into_iter().map(|p| p.notification).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self, id: &str) -> bool {
        self.pending.iter().any(|p| p.notification.id == id)
    }
}

impl NotificationScheduler for PendingNotifications {
    fn schedule(
        &mut self,
        id: &str,
        fire_after_secs: u32,
        title: &str,
        body: &str,
        now: DateTime<Utc>,
    ) {
        self.cancel(id);
        self.pending.push(Pending {
            notification: Notification {
                id: id.to_string(),
                title: title.to_string(),
                body: body.to_string(),
            },
            due: now + Duration::seconds(i64::from(fire_after_secs)),
        });
    }

    fn cancel(&mut self, id: &str) {
        self.pending.retain(|p| p.notification.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_fires_when_due() {
        let mut queue = PendingNotifications::new();
        let now = t0();
        queue.schedule("rest", 90, "Rest over", "Next: Squat", now);

        assert!(queue.due(now + Duration::seconds(89)).is_empty());
        let fired = queue.due(now + Duration::seconds(90));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].title, "Rest over");
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_cancel_by_identifier() {
        let mut queue = PendingNotifications::new();
        let now = t0();
        queue.schedule("rest", 90, "Rest over", "", now);
        queue.cancel("rest");
        assert!(queue.due(now + Duration::seconds(120)).is_empty());
    }

    #[test]
    fn test_reschedule_replaces_same_id() {
        let mut queue = PendingNotifications::new();
        let now = t0();
        queue.schedule("rest", 90, "Rest over", "Next: Squat", now);
        queue.schedule("rest", 60, "Rest over", "Next: Curl", now + Duration::seconds(5));

        assert_eq!(queue.pending_count(), 1);
        let fired = queue.due(now + Duration::seconds(65));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].body, "Next: Curl");
    }

    #[test]
    fn test_independent_ids_fire_oldest_first() {
        let mut queue = PendingNotifications::new();
        let now = t0();
        queue.schedule("b", 30, "B", "", now);
        queue.schedule("a", 10, "A", "", now);

        let fired = queue.due(now + Duration::seconds(60));
        let titles: Vec<&str> = fired.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }
}
