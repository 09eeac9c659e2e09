//! Rest surface - a countdown card for an external display
//!
//! The surface renders independently from its own copy of the interval; the
//! session only pushes a fresh card when the rest state or the upcoming set
//! changes, and clears it when the rest ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload describing the running rest period and what comes next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestCard {
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub next_exercise: String,
    /// 1-based set number within the next exercise
    pub next_set_number: u32,
    pub next_reps: u32,
    pub next_weight_kg: f64,
}

pub trait RestSurface {
    fn show(&mut self, card: RestCard);
    fn clear(&mut self);
}

/// Surface that drops everything, for headless paths
#[derive(Default)]
pub struct NullSurface;

impl RestSurface for NullSurface {
    fn show(&mut self, _card: RestCard) {}
    fn clear(&mut self) {}
}
