#![allow(dead_code)]

use rain_predictor::{artifacts::Artifacts, types::RawObservation, Predictor};
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

pub const FEATURES: [&str; 17] = [
    "Location", "MinTemp", "MaxTemp", "Rainfall", "WindGustDir", "WindGustSpeed",
    "WindSpeed9am", "WindSpeed3pm", "Humidity9am", "Humidity3pm", "Pressure9am",
    "Pressure3pm", "Temp3pm", "RainToday", "Year", "Month", "Day",
];

pub fn meta_json() -> serde_json::Value {
    json!({
        "feature_names": FEATURES,
        "label_encoders": {
            "Location": ["Adelaide", "Albury", "Brisbane", "Melbourne", "Sydney"],
            "WindGustDir": ["E", "N", "NE", "S", "W"],
            "RainToday": ["No", "Yes"]
        },
        "scaler": {
            "mean": [2.0, 12.0, 23.0, 2.3, 2.0, 40.0, 14.0, 18.0, 68.0, 51.0, 1017.0, 1015.0, 21.0, 0.2, 2012.0, 6.5, 15.7],
            "scale": [1.4, 6.4, 7.1, 8.4, 1.4, 13.6, 8.9, 8.8, 19.0, 20.8, 7.1, 7.0, 6.9, 0.4, 2.5, 3.4, 8.8]
        }
    })
}

/// Logistic weights that lean on afternoon humidity and today's rain.
pub fn model_json() -> serde_json::Value {
    json!({
        "coef": [0.0, 0.1, -0.2, 0.3, 0.0, 0.8, 0.0, -0.1, 0.2, 1.4, 0.6, -1.1, 0.0, 0.4, 0.0, 0.0, 0.0],
        "intercept": -1.6
    })
}

/// Writes `meta.json` and `model.json` into a fresh temp dir.
pub fn write_artifacts(meta: &serde_json::Value, model: &serde_json::Value) -> (TempDir, String, String) {
    let dir = tempfile::tempdir().unwrap();
    let meta_path = dir.path().join("meta.json");
    let model_path = dir.path().join("model.json");
    std::fs::write(&meta_path, serde_json::to_vec_pretty(meta).unwrap()).unwrap();
    std::fs::write(&model_path, serde_json::to_vec_pretty(model).unwrap()).unwrap();
    (dir, path_str(&model_path), path_str(&meta_path))
}

fn path_str(p: &Path) -> String {
    p.to_str().unwrap().to_string()
}

pub fn predictor() -> Predictor {
    let (_dir, model_path, meta_path) = write_artifacts(&meta_json(), &model_json());
    Predictor::new(Artifacts::load(&model_path, &meta_path).unwrap())
}

pub fn sydney() -> RawObservation {
    serde_json::from_value(json!({
        "Date": "2024-01-15",
        "Location": "Sydney",
        "MinTemp": 14,
        "MaxTemp": 22,
        "Humidity9am": 70,
        "Humidity3pm": 50,
        "Pressure9am": 1013,
        "Pressure3pm": 1010,
        "WindGustDir": "N",
        "WindGustSpeed": 33,
        "WindSpeed9am": 11,
        "WindSpeed3pm": 19,
        "RainToday": "No"
    }))
    .unwrap()
}

pub fn index_of(name: &str) -> usize {
    FEATURES.iter().position(|f| *f == name).unwrap()
}
