//! Strength trend prediction using linear regression (linfa)

use chrono::{DateTime, Utc};
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};

use crate::model::Workout;
use crate::stats::Analytics;

/// Minimum data points required for training
const MIN_DATA_POINTS: usize = 3;

/// Top-set weight trend for one exercise
pub struct ProgressPredictor {
    slope: f64,
    intercept: f64,
    r2_score: f64,
    data_points: usize,
    first_date: DateTime<Utc>,
}

/// Prediction result for display
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Expected weight change per week, kg
    pub weekly_gain_kg: f64,
    pub week_prediction_kg: f64,
    pub month_prediction_kg: f64,
    pub r2_score: f64,
    pub data_points: usize,
}

impl ProgressPredictor {
    /// Fit a trend over the top-set history of `exercise`
    pub fn train(workouts: &[Workout], exercise: &str) -> Option<Self> {
        let history = Analytics::new(workouts.to_vec()).top_set_history(exercise);
        if history.len() < MIN_DATA_POINTS {
            return None;
        }

        let first_date = history.first().map(|(date, _)| *date)?;

        // X = days since first workout, Y = top-set weight
        let mut x_data: Vec<f64> = Vec::new();
        let mut y_data: Vec<f64> = Vec::new();
        for (date, weight_kg) in &history {
            x_data.push((*date - first_date).num_days() as f64);
            y_data.push(*weight_kg);
        }

        let n_samples = x_data.len();
        let records = Array2::from_shape_vec((n_samples, 1), x_data).ok()?;
        let targets = Array1::from_vec(y_data);
        let dataset = Dataset::new(records, targets);

        let model = LinearRegression::default().fit(&dataset).ok()?;
        let slope = model.params()[0];
        let intercept = model.intercept();

        let predictions = model.predict(&dataset);
        let r2_score = predictions.r2(&dataset).unwrap_or(0.0);

        Some(Self {
            slope,
            intercept,
            r2_score,
            data_points: n_samples,
            first_date,
        })
    }

    /// Predict the top-set weight a number of days ahead from now
    pub fn predict_weight_kg(&self, days_ahead: i32) -> f64 {
        let now = Utc::now();
        let days_from_start = (now - self.first_date).num_days() as f64;
        self.slope * (days_from_start + f64::from(days_ahead)) + self.intercept
    }

    pub fn current_level_kg(&self) -> f64 {
        self.predict_weight_kg(0)
    }

    /// Weight change per week (slope x 7)
    pub fn weekly_gain_kg(&self) -> f64 {
        self.slope * 7.0
    }

    /// Model fit quality, 0-1
    pub fn r2_score(&self) -> f64 {
        self.r2_score
    }

    pub fn data_points(&self) -> usize {
        self.data_points
    }

    pub fn get_prediction(&self) -> Prediction {
        Prediction {
            weekly_gain_kg: self.weekly_gain_kg(),
            week_prediction_kg: self.predict_weight_kg(7),
            month_prediction_kg: self.predict_weight_kg(30),
            r2_score: self.r2_score,
            data_points: self.data_points,
        }
    }

    /// Format the trend for CLI and bot output
    pub fn format_summary(&self, exercise: &str) -> String {
        let pred = self.get_prediction();
        let gain = if pred.weekly_gain_kg >= 0.0 {
            format!("+{:.1}", pred.weekly_gain_kg)
        } else {
            format!("{:.1}", pred.weekly_gain_kg)
        };
        format!(
            "--- Trend: {} ---\n\
             Gain: {} kg/week\n\
             In a week: {:.1} kg\n\
             In a month: {:.1} kg\n\
             Fit: R2 {:.2} over {} workouts",
            exercise, gain, pred.week_prediction_kg, pred.month_prediction_kg,
            pred.r2_score, pred.data_points
        )
    }
}
