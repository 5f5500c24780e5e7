use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One form submission. Field names on the wire match the feature names
/// the classifier was trained on.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawObservation {
    pub date: NaiveDate,
    pub location: String,
    pub min_temp: f32,
    pub max_temp: f32,
    pub humidity_9am: f32,
    pub humidity_3pm: f32,
    pub pressure_9am: f32,
    pub pressure_3pm: f32,
    pub wind_gust_dir: String,
    pub wind_gust_speed: f32,
    pub wind_speed_9am: f32,
    pub wind_speed_3pm: f32,
    pub rain_today: String,
}

/// Inclusive range a numeric form field is allowed to take.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f32,
    pub max: f32,
}

pub const TEMP_BOUNDS: Bounds = Bounds { min: -10.0, max: 50.0 };
pub const HUMIDITY_BOUNDS: Bounds = Bounds { min: 0.0, max: 100.0 };
pub const NON_NEGATIVE: Bounds = Bounds { min: 0.0, max: f32::MAX };

impl RawObservation {
    /// Numeric fields with their wire names, in form order.
    pub fn numeric_fields(&self) -> [(&'static str, f32); 9] {
        [
            ("MinTemp", self.min_temp),
            ("MaxTemp", self.max_temp),
            ("Humidity9am", self.humidity_9am),
            ("Humidity3pm", self.humidity_3pm),
            ("Pressure9am", self.pressure_9am),
            ("Pressure3pm", self.pressure_3pm),
            ("WindGustSpeed", self.wind_gust_speed),
            ("WindSpeed9am", self.wind_speed_9am),
            ("WindSpeed3pm", self.wind_speed_3pm),
        ]
    }

    /// Collection-layer bounds. The normalizer itself never re-validates.
    pub fn check_bounds(&self) -> Result<()> {
        for (name, value) in self.numeric_fields() {
            if !value.is_finite() {
                bail!("{} is not a finite number", name);
            }
            let bounds = field_bounds(name);
            if value < bounds.min || value > bounds.max {
                bail!(
                    "{} = {} is outside [{}, {}]",
                    name,
                    value,
                    bounds.min,
                    bounds.max
                );
            }
        }
        Ok(())
    }
}

pub fn field_bounds(name: &str) -> Bounds {
    match name {
        "MinTemp" | "MaxTemp" => TEMP_BOUNDS,
        "Humidity9am" | "Humidity3pm" => HUMIDITY_BOUNDS,
        _ => NON_NEGATIVE,
    }
}

/// Presentation bucket for a rain probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RainTier {
    LikelyDry,
    ModerateChance,
    HighChance,
}

/// Probability of the rain class, always within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    pub probability: f32,
}

/// What the result panel shows for one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub tier: RainTier,
    pub message: String,
    pub probability: f32,
    pub dry_probability: f32,
    /// Value for the linear progress indicator.
    pub progress: f32,
    pub caption: String,
}
