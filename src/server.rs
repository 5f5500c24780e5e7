use anyhow::anyhow;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::{collections::BTreeMap, sync::Arc};

use crate::error::{RainError, RainResult};
use crate::inference::Predictor;
use crate::normalizer::{EncodingTable, FeatureVector};
use crate::types::{field_bounds, Bounds, Prediction, RawObservation};

#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub log_pred: bool,
}

type Rejection = (StatusCode, Json<serde_json::Value>);

/// What the form needs to draw itself: selectable labels, starting values
/// and numeric limits.
#[derive(Debug, Serialize)]
pub struct FormOptions {
    pub locations: Vec<String>,
    pub wind_gust_dirs: Vec<String>,
    pub rain_today: Vec<String>,
    pub defaults: RawObservation,
    pub bounds: BTreeMap<&'static str, Bounds>,
}

/// Starting values of the form: today, the first known label of each
/// categorical, and typical readings.
pub fn form_defaults(enc: &EncodingTable) -> RainResult<RawObservation> {
    Ok(RawObservation {
        date: chrono::Local::now().date_naive(),
        location: enc.classes("Location")?[0].clone(),
        min_temp: 14.0,
        max_temp: 22.0,
        humidity_9am: 70.0,
        humidity_3pm: 50.0,
        pressure_9am: 1013.0,
        pressure_3pm: 1010.0,
        wind_gust_dir: enc.classes("WindGustDir")?[0].clone(),
        wind_gust_speed: 33.0,
        wind_speed_9am: 11.0,
        wind_speed_3pm: 19.0,
        rain_today: enc.classes("RainToday")?[0].clone(),
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/options", get(options))
        .route("/predict", post(predict))
        .route("/healthz", get(healthz))
        .with_state(state)
}

fn reject(err: RainError) -> Rejection {
    if let Some(cause) = err.cause() {
        tracing::warn!("prediction failed: {:#}", cause);
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": format!("Prediction error: {:#}", cause),
                "hint": "Please check your inputs and try again",
            })),
        );
    }
    tracing::error!("artifact schema mismatch while serving: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
}

fn log_vector(obs: &RawObservation, x: &FeatureVector, feat_list: &[String]) {
    let vec = x.as_slice();
    let nz = vec.iter().filter(|v| **v != 0.0).count();
    let mean = if vec.is_empty() { 0.0 } else { vec.iter().sum::<f32>() / (vec.len() as f32) };
    let std = if vec.len() < 2 {
        0.0
    } else {
        (vec.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / (vec.len() as f32)).sqrt()
    };
    let sample: Vec<String> = feat_list
        .iter()
        .zip(vec)
        .take(6)
        .map(|(name, v)| format!("{}={:.3}", name, v))
        .collect();
    tracing::info!(
        "recv location={} date={} in_dim={} nonzero={} mean={:.3} std={:.3} sample=[{}]",
        obs.location, obs.date, vec.len(), nz, mean, std, sample.join(", ")
    );
}

/// Malformed bodies (wrong types, impossible dates) take the same
/// recoverable path as out-of-range readings.
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<RawObservation>, JsonRejection>,
) -> Result<Json<Prediction>, Rejection> {
    let Json(obs) =
        payload.map_err(|rej| reject(RainError::prediction(anyhow!(rej.body_text()))))?;
    obs.check_bounds()
        .map_err(|e| reject(RainError::prediction(e)))?;

    let out = state
        .predictor
        .predict_inspect(&obs, |x| {
            if state.log_pred {
                log_vector(&obs, x, state.predictor.feature_names());
            }
        })
        .map_err(reject)?;
    tracing::debug!(tier = ?out.tier, probability = out.probability, "scored");
    Ok(Json(out))
}

pub async fn options(State(state): State<AppState>) -> Result<Json<FormOptions>, Rejection> {
    let enc = state.predictor.encoders();
    let defaults = form_defaults(enc).map_err(reject)?;
    let locations = enc.classes("Location").map_err(reject)?.to_vec();
    let wind_gust_dirs = enc.classes("WindGustDir").map_err(reject)?.to_vec();
    let rain_today = enc.classes("RainToday").map_err(reject)?.to_vec();

    let bounds = defaults
        .numeric_fields()
        .iter()
        .map(|(name, _)| (*name, field_bounds(name)))
        .collect();

    Ok(Json(FormOptions {
        locations,
        wind_gust_dirs,
        rain_today,
        defaults,
        bounds,
    }))
}

async fn healthz() -> &'static str {
    "ok"
}
