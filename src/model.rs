//! Domain model - workouts, supersets, sets and templates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conversion factor for displaying stored kilograms as pounds
pub const LB_PER_KG: f64 = 2.204622;

/// Display unit for weights; storage is always kilograms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightUnit {
    Kg,
    Lb,
}

impl WeightUnit {
    pub fn label(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "kg" => Some(WeightUnit::Kg),
            "lb" | "lbs" => Some(WeightUnit::Lb),
            _ => None,
        }
    }

    /// Convert a stored kilogram value into this unit
    pub fn from_kg(&self, kg: f64) -> f64 {
        match self {
            WeightUnit::Kg => kg,
            WeightUnit::Lb => kg * LB_PER_KG,
        }
    }

    /// Convert a value entered in this unit into stored kilograms
    pub fn to_kg(&self, value: f64) -> f64 {
        match self {
            WeightUnit::Kg => value,
            WeightUnit::Lb => value / LB_PER_KG,
        }
    }

    /// Format a stored kilogram value for display, e.g. "62.5 kg"
    pub fn format(&self, kg: f64) -> String {
        format!("{:.1} {}", self.from_kg(kg), self.label())
    }
}

/// A single set: target reps at a target weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub reps: u32,
    pub weight_kg: f64,
}

/// An exercise within a workout: a catalog definition name, its rest time
/// and an ordered list of sets. `rest_secs` applies only outside supersets;
/// inside a superset the superset's shared rest wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub def: String,
    pub rest_secs: u32,
    pub sets: Vec<ExerciseSet>,
}

/// Exercises performed round-robin, sharing one rest duration per round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Superset {
    pub rest_secs: u32,
    pub exercises: Vec<Exercise>,
}

/// One entry in a workout: a plain exercise or a superset. Position is the
/// index in the owning `Workout::items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkoutItem {
    Single(Exercise),
    Superset(Superset),
}

impl WorkoutItem {
    pub fn exercises(&self) -> impl Iterator<Item = &Exercise> {
        match self {
            WorkoutItem::Single(e) => std::slice::from_ref(e).iter(),
            WorkoutItem::Superset(s) => s.exercises.iter(),
        }
    }

    pub fn set_count(&self) -> usize {
        self.exercises().map(|e| e.sets.len()).sum()
    }

    /// Short label for lists, e.g. "Bench Press" or "Superset: Curl + Dip"
    pub fn label(&self) -> String {
        match self {
            WorkoutItem::Single(e) => e.def.clone(),
            WorkoutItem::Superset(s) => {
                let names: Vec<&str> = s.exercises.iter().map(|e| e.def.as_str()).collect();
                format!("Superset: {}", names.join(" + "))
            }
        }
    }
}

/// A logged (or planned) workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: Option<i64>,
    pub name: String,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub items: Vec<WorkoutItem>,
}

impl Workout {
    pub fn exercises(&self) -> impl Iterator<Item = &Exercise> {
        self.items.iter().flat_map(WorkoutItem::exercises)
    }

    pub fn total_sets(&self) -> usize {
        self.items.iter().map(WorkoutItem::set_count).sum()
    }

    /// Total volume in kilograms: sum of reps x weight over every set
    pub fn total_volume_kg(&self) -> f64 {
        self.exercises()
            .flat_map(|e| e.sets.iter())
            .map(|s| s.reps as f64 * s.weight_kg)
            .sum()
    }
}

/// A reusable workout plan; same item shape as a workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: Option<i64>,
    pub name: String,
    pub items: Vec<WorkoutItem>,
}

impl Template {
    /// Create a fresh workout for `date` from this plan
    pub fn instantiate(&self, date: DateTime<Utc>) -> Workout {
        Workout {
            id: None,
            name: self.name.clone(),
            date,
            notes: None,
            items: self.items.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bench_3x5() -> Exercise {
        Exercise {
            def: "Bench Press".to_string(),
            rest_secs: 120,
            sets: vec![
                ExerciseSet { reps: 5, weight_kg: 80.0 },
                ExerciseSet { reps: 5, weight_kg: 80.0 },
                ExerciseSet { reps: 5, weight_kg: 80.0 },
            ],
        }
    }

    #[test]
    fn test_unit_conversion() {
        assert_eq!(WeightUnit::Kg.from_kg(100.0), 100.0);
        let lb = WeightUnit::Lb.from_kg(100.0);
        assert!((lb - 220.4622).abs() < 1e-9, "got {}", lb);
    }

    #[test]
    fn test_unit_round_trip() {
        let kg = WeightUnit::Lb.to_kg(225.0);
        assert!((WeightUnit::Lb.from_kg(kg) - 225.0).abs() < 1e-9);
    }

    #[test]
    fn test_unit_format() {
        assert_eq!(WeightUnit::Kg.format(62.5), "62.5 kg");
        assert_eq!(WeightUnit::Lb.format(100.0), "220.5 lb");
    }

    #[test]
    fn test_unit_from_label() {
        assert_eq!(WeightUnit::from_label("KG"), Some(WeightUnit::Kg));
        assert_eq!(WeightUnit::from_label("lbs"), Some(WeightUnit::Lb));
        assert_eq!(WeightUnit::from_label("stone"), None);
    }

    #[test]
    fn test_item_set_count() {
        let single = WorkoutItem::Single(bench_3x5());
        assert_eq!(single.set_count(), 3);

        let superset = WorkoutItem::Superset(Superset {
            rest_secs: 90,
            exercises: vec![bench_3x5(), bench_3x5()],
        });
        assert_eq!(superset.set_count(), 6);
    }

    #[test]
    fn test_workout_volume() {
        let workout = Workout {
            id: None,
            name: "Push day".to_string(),
            date: Utc::now(),
            notes: None,
            items: vec![WorkoutItem::Single(bench_3x5())],
        };
        // 3 sets x 5 reps x 80 kg
        assert_eq!(workout.total_volume_kg(), 1200.0);
        assert_eq!(workout.total_sets(), 3);
    }

    #[test]
    fn test_template_instantiate() {
        let template = Template {
            id: Some(1),
            name: "Push day".to_string(),
            items: vec![WorkoutItem::Single(bench_3x5())],
        };
        let date = Utc::now();
        let workout = template.instantiate(date);

        assert_eq!(workout.id, None);
        assert_eq!(workout.name, "Push day");
        assert_eq!(workout.date, date);
        assert_eq!(workout.items, template.items);
    }
}
