//! Workout session - walking a workout's sets one at a time
//!
//! A session holds a position into the flattened slot sequence plus the rest
//! state. It never owns the workout: the slot sequence is rebuilt from the
//! workout on every operation, and the remembered position is clamped when a
//! structural edit shrinks the sequence underneath it.

pub mod sequencer;
pub mod timer;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::model::Workout;
use crate::notify::NotificationScheduler;
use crate::surface::{RestCard, RestSurface};
use sequencer::{SessionSlot, build_slots, clamp_index, rest_owed_after};
use timer::{CountdownTimer, Tick, TimerStore};

/// Stable identity shared by the rest countdown and its reminder, so a new
/// rest period cancels the previous reminder instead of stacking a duplicate
pub const REST_TIMER_KEY: &str = "rest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    InProgress { resting: bool },
    Complete,
}

/// Collaborators the session drives at its boundaries. Constructed by the
/// owner (TUI) and passed into each operation.
pub struct SessionHooks<'a> {
    pub timers: &'a dyn TimerStore,
    pub notifier: &'a mut dyn NotificationScheduler,
    pub surface: &'a mut dyn RestSurface,
}

pub struct WorkoutSession {
    phase: SessionPhase,
    index: usize,
    timer: CountdownTimer,
}

impl Default for WorkoutSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkoutSession {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::NotStarted,
            index: 0,
            timer: CountdownTimer::new(REST_TIMER_KEY),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_resting(&self) -> bool {
        matches!(self.phase, SessionPhase::InProgress { resting: true })
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    /// Begin at the first slot
    pub fn start(&mut self) {
        self.phase = SessionPhase::InProgress { resting: false };
        self.index = 0;
        info!("session started");
    }

    /// Current position, clamped against the workout as it is now
    pub fn position(&self, workout: &Workout) -> usize {
        clamp_index(self.index, build_slots(workout).len())
    }

    pub fn current_slot(&self, workout: &Workout) -> Option<SessionSlot> {
        if !matches!(self.phase, SessionPhase::InProgress { .. }) {
            return None;
        }
        let slots = build_slots(workout);
        slots.get(clamp_index(self.index, slots.len())).copied()
    }

    pub fn next_slot(&self, workout: &Workout) -> Option<SessionSlot> {
        if !matches!(self.phase, SessionPhase::InProgress { .. }) {
            return None;
        }
        let slots = build_slots(workout);
        slots.get(clamp_index(self.index, slots.len()) + 1).copied()
    }

    pub fn rest_remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        self.timer.remaining_secs(now)
    }

    /// The current set was performed. Either advances straight to the next
    /// slot or enters the rest state, starting the countdown and scheduling
    /// the "rest over" reminder.
    pub fn finish_set(
        &mut self,
        workout: &Workout,
        hooks: &mut SessionHooks,
        now: DateTime<Utc>,
    ) -> Result<()> {
        match self.phase {
            SessionPhase::InProgress { resting: false } => {}
            SessionPhase::InProgress { resting: true } => {
                warn!("finish_set ignored while resting");
                return Ok(());
            }
            _ => return Ok(()),
        }

        let slots = build_slots(workout);
        self.index = clamp_index(self.index, slots.len());
        let Some(slot) = slots.get(self.index).copied() else {
            return Ok(());
        };

        let owed_secs = rest_owed_after(workout, &slot);
        if owed_secs == 0 {
            self.advance(slot.is_final);
            return Ok(());
        }

        self.phase = SessionPhase::InProgress { resting: true };
        hooks.notifier.cancel(REST_TIMER_KEY);
        self.timer.start(hooks.timers, owed_secs, now)?;

        let body = match slots.get(self.index + 1).and_then(|s| describe_slot(workout, s)) {
            Some(next) => format!("Next up: {next}"),
            None => "Back to it".to_string(),
        };
        hooks.notifier.schedule(REST_TIMER_KEY, owed_secs, "Rest over", &body, now);

        if let Some(card) = slots
            .get(self.index + 1)
            .and_then(|s| rest_card(workout, s, now, owed_secs))
        {
            hooks.surface.show(card);
        }
        info!(rest_secs = owed_secs, "rest started");
        Ok(())
    }

    /// Cut the rest short and move on
    pub fn skip_rest(
        &mut self,
        workout: &Workout,
        hooks: &mut SessionHooks,
        _now: DateTime<Utc>,
    ) -> Result<()> {
        if !self.is_resting() {
            return Ok(());
        }
        hooks.notifier.cancel(REST_TIMER_KEY);
        self.timer.stop(hooks.timers)?;
        hooks.surface.clear();

        let slots = build_slots(workout);
        self.index = clamp_index(self.index, slots.len());
        let was_final = slots.get(self.index).is_some_and(|s| s.is_final);
        self.advance(was_final);
        info!("rest skipped");
        Ok(())
    }

    /// Drive the countdown. On natural completion the session advances, same
    /// as a skip; the already-due reminder is left to deliver on its own.
    pub fn tick(
        &mut self,
        workout: &Workout,
        hooks: &mut SessionHooks,
        now: DateTime<Utc>,
    ) -> Result<Tick> {
        if !self.is_resting() {
            return Ok(Tick::Idle);
        }
        let tick = self.timer.tick(hooks.timers, now)?;
        if tick == Tick::Finished {
            hooks.surface.clear();
            let slots = build_slots(workout);
            self.index = clamp_index(self.index, slots.len());
            let was_final = slots.get(self.index).is_some_and(|s| s.is_final);
            self.advance(was_final);
            info!("rest finished");
        }
        Ok(tick)
    }

    /// Recompute the countdown from its persisted deadline after the process
    /// was away; wall clock may have moved arbitrarily far.
    pub fn resume(
        &mut self,
        workout: &Workout,
        hooks: &mut SessionHooks,
        now: DateTime<Utc>,
    ) -> Result<Tick> {
        if !self.is_resting() {
            return Ok(Tick::Idle);
        }
        let tick = self.timer.resume(hooks.timers, now)?;
        if tick == Tick::Finished {
            hooks.surface.clear();
            let slots = build_slots(workout);
            self.index = clamp_index(self.index, slots.len());
            let was_final = slots.get(self.index).is_some_and(|s| s.is_final);
            self.advance(was_final);
        }
        Ok(tick)
    }

    /// Step back one slot, clearing any active rest first
    pub fn regress(
        &mut self,
        workout: &Workout,
        hooks: &mut SessionHooks,
        _now: DateTime<Utc>,
    ) -> Result<()> {
        if !matches!(self.phase, SessionPhase::InProgress { .. }) {
            return Ok(());
        }
        if self.is_resting() {
            hooks.notifier.cancel(REST_TIMER_KEY);
            self.timer.stop(hooks.timers)?;
            hooks.surface.clear();
            self.phase = SessionPhase::InProgress { resting: false };
        }
        self.index = clamp_index(self.index, build_slots(workout).len());
        if self.index > 0 {
            self.index -= 1;
            info!(index = self.index, "stepped back");
        }
        Ok(())
    }

    /// Discard all session state; the workout itself is untouched
    pub fn stop(&mut self, hooks: &mut SessionHooks) -> Result<()> {
        hooks.notifier.cancel(REST_TIMER_KEY);
        self.timer.stop(hooks.timers)?;
        hooks.surface.clear();
        self.phase = SessionPhase::NotStarted;
        self.index = 0;
        info!("session stopped");
        Ok(())
    }

    fn advance(&mut self, was_final: bool) {
        self.index += 1;
        self.phase = if was_final {
            info!("workout complete");
            SessionPhase::Complete
        } else {
            SessionPhase::InProgress { resting: false }
        };
    }
}

/// "Bench Press - set 2: 5 x 80.0 kg"
fn describe_slot(workout: &Workout, slot: &SessionSlot) -> Option<String> {
    let exercise = slot.exercise(workout)?;
    let set = slot.set(workout)?;
    Some(format!(
        "{} - set {}: {} x {:.1} kg",
        exercise.def,
        slot.set_index + 1,
        set.reps,
        set.weight_kg
    ))
}

fn rest_card(
    workout: &Workout,
    next: &SessionSlot,
    now: DateTime<Utc>,
    rest_secs: u32,
) -> Option<RestCard> {
    let exercise = next.exercise(workout)?;
    let set = next.set(workout)?;
    Some(RestCard {
        started_at: now,
        ends_at: now + Duration::seconds(i64::from(rest_secs)),
        next_exercise: exercise.def.clone(),
        next_set_number: next.set_index as u32 + 1,
        next_reps: set.reps,
        next_weight_kg: set.weight_kg,
    })
}

#[cfg(test)]
mod tests {
    use super::timer::testing::MemoryTimerStore;
    use super::*;
    use crate::model::{Exercise, ExerciseSet, Superset, WorkoutItem};
    use crate::notify::PendingNotifications;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn exercise(def: &str, rest_secs: u32, set_count: usize) -> Exercise {
        Exercise {
            def: def.to_string(),
            rest_secs,
            sets: (0..set_count)
                .map(|_| ExerciseSet { reps: 8, weight_kg: 40.0 })
                .collect(),
        }
    }

    fn workout(items: Vec<WorkoutItem>) -> Workout {
        Workout {
            id: None,
            name: "test".to_string(),
            date: t0(),
            notes: None,
            items,
        }
    }

    /// Surface that records the last card it was shown
    #[derive(Default)]
    struct RecordingSurface {
        card: Option<RestCard>,
        shows: usize,
        clears: usize,
    }

    impl RestSurface for RecordingSurface {
        fn show(&mut self, card: RestCard) {
            self.card = Some(card);
            self.shows += 1;
        }
        fn clear(&mut self) {
            self.card = None;
            self.clears += 1;
        }
    }

    struct Fixture {
        store: MemoryTimerStore,
        notifications: PendingNotifications,
        surface: RecordingSurface,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: MemoryTimerStore::default(),
                notifications: PendingNotifications::new(),
                surface: RecordingSurface::default(),
            }
        }

        fn hooks(&mut self) -> SessionHooks<'_> {
            SessionHooks {
                timers: &self.store,
                notifier: &mut self.notifications,
                surface: &mut self.surface,
            }
        }
    }

    #[test]
    fn test_walk_to_completion_without_rest() {
        let w = workout(vec![
            WorkoutItem::Single(exercise("Squat", 0, 2)),
            WorkoutItem::Single(exercise("Plank", 0, 1)),
        ]);
        let mut fx = Fixture::new();
        let mut session = WorkoutSession::new();
        session.start();

        for _ in 0..3 {
            assert!(!session.is_complete());
            session.finish_set(&w, &mut fx.hooks(), t0()).unwrap();
        }
        assert!(session.is_complete());
        assert_eq!(session.current_slot(&w), None);
    }

    #[test]
    fn test_rest_entered_and_timer_scheduled() {
        let w = workout(vec![WorkoutItem::Single(exercise("Squat", 90, 2))]);
        let mut fx = Fixture::new();
        let mut session = WorkoutSession::new();
        session.start();

        session.finish_set(&w, &mut fx.hooks(), t0()).unwrap();
        assert!(session.is_resting());
        assert_eq!(session.rest_remaining_secs(t0()), Some(90));
        assert!(fx.notifications.has_pending(REST_TIMER_KEY));
        assert_eq!(fx.surface.card.as_ref().unwrap().next_exercise, "Squat");
        assert_eq!(fx.surface.card.as_ref().unwrap().next_set_number, 2);
    }

    #[test]
    fn test_tick_completion_advances() {
        let w = workout(vec![WorkoutItem::Single(exercise("Squat", 90, 2))]);
        let mut fx = Fixture::new();
        let mut session = WorkoutSession::new();
        session.start();
        session.finish_set(&w, &mut fx.hooks(), t0()).unwrap();

        let mid = session
            .tick(&w, &mut fx.hooks(), t0() + Duration::seconds(30))
            .unwrap();
        assert_eq!(mid, Tick::Running { remaining_secs: 60 });

        let done = session
            .tick(&w, &mut fx.hooks(), t0() + Duration::seconds(90))
            .unwrap();
        assert_eq!(done, Tick::Finished);
        assert!(!session.is_resting());
        assert_eq!(session.current_slot(&w).unwrap().set_index, 1);
        assert_eq!(fx.surface.clears, 1);
    }

    #[test]
    fn test_skip_rest_cancels_reminder() {
        let w = workout(vec![WorkoutItem::Single(exercise("Squat", 90, 2))]);
        let mut fx = Fixture::new();
        let mut session = WorkoutSession::new();
        session.start();
        session.finish_set(&w, &mut fx.hooks(), t0()).unwrap();

        session
            .skip_rest(&w, &mut fx.hooks(), t0() + Duration::seconds(10))
            .unwrap();
        assert!(!session.is_resting());
        assert_eq!(fx.notifications.pending_count(), 0);
        // The skipped reminder never fires
        assert!(fx.notifications.due(t0() + Duration::seconds(120)).is_empty());
        assert_eq!(session.current_slot(&w).unwrap().set_index, 1);
    }

    #[test]
    fn test_new_rest_replaces_previous_reminder() {
        let w = workout(vec![WorkoutItem::Single(exercise("Squat", 90, 3))]);
        let mut fx = Fixture::new();
        let mut session = WorkoutSession::new();
        session.start();

        session.finish_set(&w, &mut fx.hooks(), t0()).unwrap();
        session.skip_rest(&w, &mut fx.hooks(), t0() + Duration::seconds(5)).unwrap();
        session
            .finish_set(&w, &mut fx.hooks(), t0() + Duration::seconds(40))
            .unwrap();

        // Exactly one pending reminder under the stable key
        assert_eq!(fx.notifications.pending_count(), 1);
    }

    #[test]
    fn test_final_slot_completes_despite_rest_config() {
        let w = workout(vec![WorkoutItem::Single(exercise("Squat", 180, 1))]);
        let mut fx = Fixture::new();
        let mut session = WorkoutSession::new();
        session.start();

        session.finish_set(&w, &mut fx.hooks(), t0()).unwrap();
        assert!(session.is_complete());
        assert!(!fx.notifications.has_pending(REST_TIMER_KEY));
    }

    #[test]
    fn test_regress_clears_rest_and_steps_back() {
        let w = workout(vec![WorkoutItem::Single(exercise("Squat", 90, 3))]);
        let mut fx = Fixture::new();
        let mut session = WorkoutSession::new();
        session.start();

        session.finish_set(&w, &mut fx.hooks(), t0()).unwrap();
        session.skip_rest(&w, &mut fx.hooks(), t0()).unwrap();
        session.finish_set(&w, &mut fx.hooks(), t0()).unwrap();
        assert!(session.is_resting());
        assert_eq!(session.position(&w), 1);

        session.regress(&w, &mut fx.hooks(), t0()).unwrap();
        assert!(!session.is_resting());
        assert_eq!(session.position(&w), 0);
        assert_eq!(fx.notifications.pending_count(), 0);
        assert!(fx.store.timer_end(REST_TIMER_KEY).unwrap().is_none());
    }

    #[test]
    fn test_regress_at_start_is_a_no_op() {
        let w = workout(vec![WorkoutItem::Single(exercise("Squat", 90, 2))]);
        let mut fx = Fixture::new();
        let mut session = WorkoutSession::new();
        session.start();

        session.regress(&w, &mut fx.hooks(), t0()).unwrap();
        assert_eq!(session.position(&w), 0);
    }

    #[test]
    fn test_structural_edit_clamps_position() {
        // 5 slots, position at the last one; the workout shrinks to 2 slots
        let mut w = workout(vec![WorkoutItem::Single(exercise("Squat", 0, 5))]);
        let mut fx = Fixture::new();
        let mut session = WorkoutSession::new();
        session.start();
        for _ in 0..4 {
            session.finish_set(&w, &mut fx.hooks(), t0()).unwrap();
        }
        assert_eq!(session.position(&w), 4);

        w.items = vec![WorkoutItem::Single(exercise("Squat", 0, 2))];
        assert_eq!(session.position(&w), 1);
        assert_eq!(session.current_slot(&w).unwrap().set_index, 1);
    }

    #[test]
    fn test_superset_session_rests_once_per_round() {
        let w = workout(vec![
            WorkoutItem::Superset(Superset {
                rest_secs: 60,
                exercises: vec![exercise("Curl", 0, 2), exercise("Pushdown", 0, 2)],
            }),
            WorkoutItem::Single(exercise("Plank", 0, 1)),
        ]);
        let mut fx = Fixture::new();
        let mut session = WorkoutSession::new();
        session.start();

        // First exercise of the round: straight to the partner exercise
        session.finish_set(&w, &mut fx.hooks(), t0()).unwrap();
        assert!(!session.is_resting());
        // Round closed: rest
        session.finish_set(&w, &mut fx.hooks(), t0()).unwrap();
        assert!(session.is_resting());
    }

    #[test]
    fn test_stop_discards_state() {
        let w = workout(vec![WorkoutItem::Single(exercise("Squat", 90, 2))]);
        let mut fx = Fixture::new();
        let mut session = WorkoutSession::new();
        session.start();
        session.finish_set(&w, &mut fx.hooks(), t0()).unwrap();

        session.stop(&mut fx.hooks()).unwrap();
        assert_eq!(session.phase(), SessionPhase::NotStarted);
        assert_eq!(session.current_slot(&w), None);
        assert_eq!(fx.notifications.pending_count(), 0);
    }

    #[test]
    fn test_resume_after_suspension_completes_rest() {
        let w = workout(vec![WorkoutItem::Single(exercise("Squat", 60, 2))]);
        let mut fx = Fixture::new();
        let mut session = WorkoutSession::new();
        session.start();
        session.finish_set(&w, &mut fx.hooks(), t0()).unwrap();

        // 70s of wall clock pass while nothing ticks
        let tick = session
            .resume(&w, &mut fx.hooks(), t0() + Duration::seconds(70))
            .unwrap();
        assert_eq!(tick, Tick::Finished);
        assert!(!session.is_resting());
        assert_eq!(session.current_slot(&w).unwrap().set_index, 1);
    }
}
