//! Flattening a workout into the ordered run of sets a session walks through
//!
//! Items keep their stored order. A plain exercise contributes its sets in
//! order. A superset contributes its sets round-robin: round 0 of every
//! exercise, then round 1, and so on; an exercise with fewer sets than the
//! round index is skipped for that round.

use crate::model::{Exercise, ExerciseSet, Workout, WorkoutItem};

/// One position in the flattened sequence. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSlot {
    pub item_index: usize,
    /// Index within the superset's exercises; 0 for a plain exercise
    pub exercise_index: usize,
    pub set_index: usize,
    pub in_superset: bool,
    /// Last slot of its superset round (rest is charged here)
    pub last_in_round: bool,
    /// Last slot of the whole workout
    pub is_final: bool,
}

impl SessionSlot {
    /// Resolve this slot's exercise against the workout it was built from
    pub fn exercise<'a>(&self, workout: &'a Workout) -> Option<&'a Exercise> {
        match workout.items.get(self.item_index)? {
            WorkoutItem::Single(e) => Some(e),
            WorkoutItem::Superset(s) => s.exercises.get(self.exercise_index),
        }
    }

    pub fn set<'a>(&self, workout: &'a Workout) -> Option<&'a ExerciseSet> {
        self.exercise(workout)?.sets.get(self.set_index)
    }
}

/// Flatten a workout into its slot sequence. Pure; an empty workout yields
/// an empty sequence.
pub fn build_slots(workout: &Workout) -> Vec<SessionSlot> {
    let mut slots = Vec::new();

    for (item_index, item) in workout.items.iter().enumerate() {
        match item {
            WorkoutItem::Single(exercise) => {
                for set_index in 0..exercise.sets.len() {
                    slots.push(SessionSlot {
                        item_index,
                        exercise_index: 0,
                        set_index,
                        in_superset: false,
                        last_in_round: false,
                        is_final: false,
                    });
                }
            }
            WorkoutItem::Superset(superset) => {
                let rounds = superset
                    .exercises
                    .iter()
                    .map(|e| e.sets.len())
                    .max()
                    .unwrap_or(0);

                for round in 0..rounds {
                    let members: Vec<usize> = superset
                        .exercises
                        .iter()
                        .enumerate()
                        .filter(|(_, e)| round < e.sets.len())
                        .map(|(i, _)| i)
                        .collect();

                    for (nth, &exercise_index) in members.iter().enumerate() {
                        slots.push(SessionSlot {
                            item_index,
                            exercise_index,
                            set_index: round,
                            in_superset: true,
                            last_in_round: nth + 1 == members.len(),
                            is_final: false,
                        });
                    }
                }
            }
        }
    }

    if let Some(last) = slots.last_mut() {
        last.is_final = true;
    }
    slots
}

/// Rest owed after completing `slot`, in seconds. Zero on the final slot of
/// the workout. Superset rest is charged once per round, after the round's
/// last slot; a plain exercise charges its own rest after every set.
pub fn rest_owed_after(workout: &Workout, slot: &SessionSlot) -> u32 {
    if slot.is_final {
        return 0;
    }
    match workout.items.get(slot.item_index) {
        Some(WorkoutItem::Superset(superset)) => {
            if slot.last_in_round {
                superset.rest_secs
            } else {
                0
            }
        }
        Some(WorkoutItem::Single(exercise)) => exercise.rest_secs,
        None => 0,
    }
}

/// Clamp a remembered index after the workout was edited mid-session
pub fn clamp_index(index: usize, len: usize) -> usize {
    if len == 0 { 0 } else { index.min(len - 1) }
}
