//! Stats module - history analytics and progress prediction
//!
//! Features:
//! - Volume and frequency summaries over the workout log
//! - Per-exercise top-set history (chart data)
//! - Progress prediction using linear regression (linfa)

pub mod predictor;

pub use predictor::ProgressPredictor;

use chrono::{DateTime, Utc};

use crate::model::Workout;

/// Workout history analytics
pub struct Analytics {
    /// Chronological, oldest first
    workouts: Vec<Workout>,
}

impl Analytics {
    pub fn new(mut workouts: Vec<Workout>) -> Self {
        workouts.sort_by_key(|w| w.date);
        Self { workouts }
    }

    pub fn workout_count(&self) -> usize {
        self.workouts.len()
    }

    pub fn total_sets(&self) -> usize {
        self.workouts.iter().map(Workout::total_sets).sum()
    }

    pub fn total_volume_kg(&self) -> f64 {
        self.workouts.iter().map(Workout::total_volume_kg).sum()
    }

    /// Get workout frequency (sessions per week)
    pub fn weekly_frequency(&self) -> f64 {
        if self.workouts.len() < 2 {
            return 0.0;
        }

        let first = self.workouts.first().unwrap().date;
        let last = self.workouts.last().unwrap().date;
        let days = (last - first).num_days() as f64;

        if days == 0.0 {
            return self.workouts.len() as f64;
        }

        (self.workouts.len() as f64 / days) * 7.0
    }

    /// Per-workout volume, chronological; feeds the TUI sparkline
    pub fn volume_series(&self) -> Vec<u64> {
        self.workouts
            .iter()
            .map(|w| w.total_volume_kg().round().max(0.0) as u64)
            .collect()
    }

    /// Heaviest set per workout for one exercise, chronological
    pub fn top_set_history(&self, exercise: &str) -> Vec<(DateTime<Utc>, f64)> {
        self.workouts
            .iter()
            .filter_map(|w| {
                let top = w
                    .exercises()
                    .filter(|e| e.def.eq_ignore_ascii_case(exercise))
                    .flat_map(|e| e.sets.iter())
                    .map(|s| s.weight_kg)
                    .fold(f64::NEG_INFINITY, f64::max);
                (top > f64::NEG_INFINITY).then_some((w.date, top))
            })
            .collect()
    }

    /// Heaviest set ever for one exercise: (weight, reps at that weight)
    pub fn personal_record(&self, exercise: &str) -> Option<(f64, u32)> {
        self.workouts
            .iter()
            .flat_map(|w| w.exercises())
            .filter(|e| e.def.eq_ignore_ascii_case(exercise))
            .flat_map(|e| e.sets.iter())
            .map(|s| (s.weight_kg, s.reps))
            .max_by(|a, b| a.0.total_cmp(&b.0))
    }

    /// The exercise appearing in the most workouts
    pub fn most_frequent_exercise(&self) -> Option<String> {
        let mut counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
        for workout in &self.workouts {
            let mut seen: Vec<&str> = Vec::new();
            for exercise in workout.exercises() {
                if !seen.contains(&exercise.def.as_str()) {
                    seen.push(&exercise.def);
                    *counts.entry(exercise.def.clone()).or_insert(0) += 1;
                }
            }
        }
        counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(def, _)| def)
    }

    /// Suggest the next top-set load (simple moving average plus a nudge)
    pub fn suggest_next_load(&self, exercise: &str) -> Option<(u32, f64)> {
        let history = self.top_set_history(exercise);
        if history.is_empty() {
            return None;
        }

        let recent: Vec<f64> = history.iter().rev().take(5).map(|(_, kg)| *kg).collect();
        let avg_kg = recent.iter().sum::<f64>() / recent.len() as f64;

        let avg_reps = {
            let reps: Vec<u32> = self
                .workouts
                .iter()
                .flat_map(|w| w.exercises())
                .filter(|e| e.def.eq_ignore_ascii_case(exercise))
                .flat_map(|e| e.sets.iter())
                .map(|s| s.reps)
                .collect();
            reps.iter().sum::<u32>() / reps.len() as u32
        };

        // Slight progression suggestion
        Some((avg_reps, avg_kg + 2.5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Exercise, ExerciseSet, WorkoutItem};
    use chrono::Duration;

    fn single(def: &str, weight_kg: f64, reps: u32) -> WorkoutItem {
        WorkoutItem::Single(Exercise {
            def: def.to_string(),
            rest_secs: 90,
            sets: vec![ExerciseSet { reps, weight_kg }],
        })
    }

    fn workout_days_ago(items: Vec<WorkoutItem>, days_ago: i64) -> Workout {
        Workout {
            id: None,
            name: "test".to_string(),
            date: Utc::now() - Duration::days(days_ago),
            notes: None,
            items,
        }
    }

    #[test]
    fn test_empty_history() {
        let analytics = Analytics::new(vec![]);
        assert_eq!(analytics.workout_count(), 0);
        assert_eq!(analytics.weekly_frequency(), 0.0);
        assert!(analytics.personal_record("Squat").is_none());
        assert!(analytics.most_frequent_exercise().is_none());
    }

    #[test]
    fn test_totals() {
        let analytics = Analytics::new(vec![workout_days_ago(
            vec![single("Squat", 100.0, 5), single("Plank", 0.0, 1)],
            0,
        )]);
        assert_eq!(analytics.total_sets(), 2);
        assert_eq!(analytics.total_volume_kg(), 500.0);
    }

    #[test]
    fn test_weekly_frequency_over_week() {
        let analytics = Analytics::new(vec![
            workout_days_ago(vec![single("Squat", 100.0, 5)], 7),
            workout_days_ago(vec![single("Squat", 102.5, 5)], 0),
        ]);
        let freq = analytics.weekly_frequency();
        assert!((freq - 2.0).abs() < 0.1, "Expected ~2, got {}", freq);
    }

    #[test]
    fn test_top_set_history_chronological() {
        let analytics = Analytics::new(vec![
            workout_days_ago(vec![single("Squat", 105.0, 5)], 0),
            workout_days_ago(vec![single("Squat", 100.0, 5)], 14),
            workout_days_ago(vec![single("Bench Press", 80.0, 5)], 7),
        ]);
        let history = analytics.top_set_history("squat");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].1, 100.0);
        assert_eq!(history[1].1, 105.0);
    }

    #[test]
    fn test_personal_record() {
        let analytics = Analytics::new(vec![
            workout_days_ago(vec![single("Squat", 100.0, 5)], 14),
            workout_days_ago(vec![single("Squat", 110.0, 3)], 7),
            workout_days_ago(vec![single("Squat", 105.0, 5)], 0),
        ]);
        assert_eq!(analytics.personal_record("Squat"), Some((110.0, 3)));
    }

    #[test]
    fn test_most_frequent_exercise_counts_workouts_not_sets() {
        let twice = Exercise {
            def: "Squat".to_string(),
            rest_secs: 90,
            sets: vec![
                ExerciseSet { reps: 5, weight_kg: 100.0 },
                ExerciseSet { reps: 5, weight_kg: 100.0 },
            ],
        };
        let analytics = Analytics::new(vec![
            workout_days_ago(vec![WorkoutItem::Single(twice)], 7),
            workout_days_ago(
                vec![single("Bench Press", 80.0, 5), single("Bench Press", 82.5, 5)],
                0,
            ),
        ]);
        // Squat: 1 workout; Bench Press: 1 workout; tie broken by name
        assert_eq!(analytics.most_frequent_exercise().as_deref(), Some("Bench Press"));
    }

    #[test]
    fn test_suggest_next_load() {
        let analytics = Analytics::new(vec![
            workout_days_ago(vec![single("Squat", 100.0, 5)], 7),
            workout_days_ago(vec![single("Squat", 105.0, 5)], 0),
        ]);
        let (reps, kg) = analytics.suggest_next_load("Squat").unwrap();
        assert_eq!(reps, 5);
        assert_eq!(kg, 105.0);
    }

    #[test]
    fn test_suggest_next_load_unknown_exercise() {
        let analytics = Analytics::new(vec![]);
        assert!(analytics.suggest_next_load("Squat").is_none());
    }
}
