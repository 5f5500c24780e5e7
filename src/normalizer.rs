//! Raw form submission -> fixed-order feature vector.

use chrono::Datelike;
use std::collections::HashMap;

use crate::error::{RainError, RainResult};
use crate::types::RawObservation;

/// Fields label-encoded before scoring.
pub const CATEGORICAL_FIELDS: [&str; 3] = ["Location", "WindGustDir", "RainToday"];

/// Per-field label vocabularies. A label's code is its position in the list.
#[derive(Debug, Clone, Default)]
pub struct EncodingTable {
    classes: HashMap<String, Vec<String>>,
}

impl EncodingTable {
    pub fn new(classes: HashMap<String, Vec<String>>) -> Self {
        Self { classes }
    }

    /// Known labels for `field`, in code order.
    pub fn classes(&self, field: &str) -> RainResult<&[String]> {
        match self.classes.get(field) {
            Some(c) if !c.is_empty() => Ok(c),
            Some(_) => Err(RainError::schema(format!(
                "label encoder for {} has no classes",
                field
            ))),
            None => Err(RainError::schema(format!("no label encoder for {}", field))),
        }
    }

    /// Code for `label`. Labels the encoder never saw take the first
    /// class's code instead of failing.
    pub fn encode(&self, field: &str, label: &str) -> RainResult<f32> {
        let classes = self.classes(field)?;
        let code = classes.iter().position(|c| c == label).unwrap_or_else(|| {
            tracing::debug!("unknown {} {:?}; falling back to {:?}", field, label, classes[0]);
            0
        });
        Ok(code as f32)
    }
}

/// Ordered numeric input for the scaler and classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(pub Vec<f32>);

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

fn order_from_flat(map: &HashMap<&str, f32>, feat_list: &[String]) -> Vec<f32> {
    let mut v = Vec::with_capacity(feat_list.len());
    for k in feat_list {
        v.push(*map.get(k.as_str()).unwrap_or(&0.0));
    }
    v
}

/// Encode categoricals, pass numerics through, derive `Year`/`Month`/`Day`,
/// then lay everything out in `feat_list` order. Features the observation
/// does not produce are zero.
pub fn normalize(
    obs: &RawObservation,
    table: &EncodingTable,
    feat_list: &[String],
) -> RainResult<FeatureVector> {
    let mut flat: HashMap<&str, f32> = HashMap::with_capacity(feat_list.len());

    let labels = [
        (CATEGORICAL_FIELDS[0], obs.location.as_str()),
        (CATEGORICAL_FIELDS[1], obs.wind_gust_dir.as_str()),
        (CATEGORICAL_FIELDS[2], obs.rain_today.as_str()),
    ];
    for (field, label) in labels {
        flat.insert(field, table.encode(field, label)?);
    }

    flat.extend(obs.numeric_fields());

    flat.insert("Year", obs.date.year() as f32);
    flat.insert("Month", obs.date.month() as f32);
    flat.insert("Day", obs.date.day() as f32);

    Ok(FeatureVector(order_from_flat(&flat, feat_list)))
}
