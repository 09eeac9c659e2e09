//! Built-in exercise definitions

use serde::{Deserialize, Serialize};

/// Muscle groups, used to group the catalog in pickers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Core,
    Quads,
    Hamstrings,
    Glutes,
    Calves,
}

impl MuscleGroup {
    pub fn name(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "chest",
            MuscleGroup::Back => "back",
            MuscleGroup::Shoulders => "shoulders",
            MuscleGroup::Biceps => "biceps",
            MuscleGroup::Triceps => "triceps",
            MuscleGroup::Core => "core",
            MuscleGroup::Quads => "quads",
            MuscleGroup::Hamstrings => "hamstrings",
            MuscleGroup::Glutes => "glutes",
            MuscleGroup::Calves => "calves",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            MuscleGroup::Chest | MuscleGroup::Shoulders | MuscleGroup::Triceps => "💪",
            MuscleGroup::Back | MuscleGroup::Biceps => "🏋️",
            MuscleGroup::Core => "🎯",
            MuscleGroup::Quads
            | MuscleGroup::Hamstrings
            | MuscleGroup::Glutes
            | MuscleGroup::Calves => "🦵",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExerciseDef {
    pub id: &'static str,
    pub name: &'static str,
    pub group: MuscleGroup,
    /// Default rest between sets, seconds
    pub default_rest_secs: u32,
}

pub const BUILTIN_EXERCISES: &[ExerciseDef] = &[
    ExerciseDef { id: "bench_press", name: "Bench Press", group: MuscleGroup::Chest, default_rest_secs: 150 },
    ExerciseDef { id: "incline_db_press", name: "Incline Dumbbell Press", group: MuscleGroup::Chest, default_rest_secs: 120 },
    ExerciseDef { id: "squat", name: "Squat", group: MuscleGroup::Quads, default_rest_secs: 180 },
    ExerciseDef { id: "leg_press", name: "Leg Press", group: MuscleGroup::Quads, default_rest_secs: 120 },
    ExerciseDef { id: "deadlift", name: "Deadlift", group: MuscleGroup::Hamstrings, default_rest_secs: 180 },
    ExerciseDef { id: "romanian_deadlift", name: "Romanian Deadlift", group: MuscleGroup::Hamstrings, default_rest_secs: 120 },
    ExerciseDef { id: "overhead_press", name: "Overhead Press", group: MuscleGroup::Shoulders, default_rest_secs: 150 },
    ExerciseDef { id: "lateral_raise", name: "Lateral Raise", group: MuscleGroup::Shoulders, default_rest_secs: 60 },
    ExerciseDef { id: "barbell_row", name: "Barbell Row", group: MuscleGroup::Back, default_rest_secs: 120 },
    ExerciseDef { id: "pull_up", name: "Pull-Up", group: MuscleGroup::Back, default_rest_secs: 120 },
    ExerciseDef { id: "lat_pulldown", name: "Lat Pulldown", group: MuscleGroup::Back, default_rest_secs: 90 },
    ExerciseDef { id: "biceps_curl", name: "Biceps Curl", group: MuscleGroup::Biceps, default_rest_secs: 60 },
    ExerciseDef { id: "triceps_pushdown", name: "Triceps Pushdown", group: MuscleGroup::Triceps, default_rest_secs: 60 },
    ExerciseDef { id: "dip", name: "Dip", group: MuscleGroup::Triceps, default_rest_secs: 90 },
    ExerciseDef { id: "hip_thrust", name: "Hip Thrust", group: MuscleGroup::Glutes, default_rest_secs: 120 },
    ExerciseDef { id: "calf_raise", name: "Calf Raise", group: MuscleGroup::Calves, default_rest_secs: 60 },
    ExerciseDef { id: "plank", name: "Plank", group: MuscleGroup::Core, default_rest_secs: 60 },
    ExerciseDef { id: "hanging_leg_raise", name: "Hanging Leg Raise", group: MuscleGroup::Core, default_rest_secs: 60 },
];

pub fn find(id: &str) -> Option<&'static ExerciseDef> {
    BUILTIN_EXERCISES.iter().find(|d| d.id == id)
}

/// Find a definition by display name, case-insensitive
pub fn find_by_name(name: &str) -> Option<&'static ExerciseDef> {
    BUILTIN_EXERCISES
        .iter()
        .find(|d| d.name.eq_ignore_ascii_case(name))
}
