use anyhow::{anyhow, Context};

use crate::artifacts::{Artifacts, Classifier, Scaler};
use crate::error::{RainError, RainResult};
use crate::normalizer::{normalize, EncodingTable, FeatureVector};
use crate::types::{Prediction, RainTier, RawObservation, ScoreResult};

/// Scale, then ask the classifier for the rain-class probability.
pub fn score(
    x: &FeatureVector,
    scaler: &dyn Scaler,
    classifier: &dyn Classifier,
) -> RainResult<ScoreResult> {
    let scaled = scaler
        .transform(x.as_slice())
        .context("scaling failed")
        .map_err(RainError::prediction)?;
    let p = classifier
        .probability_of_class(&scaled)
        .context("scoring failed")
        .map_err(RainError::prediction)?;
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(RainError::prediction(anyhow!(
            "classifier returned {} outside [0, 1]",
            p
        )));
    }
    Ok(ScoreResult { probability: p })
}

/// 0.5 itself is dry, 0.75 itself is moderate.
pub fn classify(p: f32) -> RainTier {
    if p > 0.75 {
        RainTier::HighChance
    } else if p > 0.5 {
        RainTier::ModerateChance
    } else {
        RainTier::LikelyDry
    }
}

pub fn render(score: ScoreResult) -> Prediction {
    let p = score.probability;
    let tier = classify(p);
    let message = match tier {
        RainTier::ModerateChance => format!("Chance of rain ({:.1}%)", p * 100.0),
        RainTier::HighChance => format!("High rain probability ({:.1}%)", p * 100.0),
        RainTier::LikelyDry => format!("Likely sunny ({:.1}% dry probability)", (1.0 - p) * 100.0),
    };
    Prediction {
        tier,
        message,
        probability: p,
        dry_probability: 1.0 - p,
        progress: p.clamp(0.0, 1.0),
        caption: format!("Model confidence: {:.1}% rain probability", p * 100.0),
    }
}

/// Immutable per-process context: built once from the artifacts, shared by
/// every request.
pub struct Predictor {
    artifacts: Artifacts,
}

impl Predictor {
    pub fn new(artifacts: Artifacts) -> Self {
        Self { artifacts }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.artifacts.feature_names
    }

    pub fn encoders(&self) -> &EncodingTable {
        &self.artifacts.encoders
    }

    pub fn normalize(&self, obs: &RawObservation) -> RainResult<FeatureVector> {
        normalize(obs, &self.artifacts.encoders, &self.artifacts.feature_names)
    }

    pub fn score(&self, x: &FeatureVector) -> RainResult<ScoreResult> {
        score(
            x,
            self.artifacts.scaler.as_ref(),
            self.artifacts.classifier.as_ref(),
        )
    }

    /// One submission end to end. Single shot; nothing is retried.
    pub fn predict(&self, obs: &RawObservation) -> RainResult<Prediction> {
        self.predict_inspect(obs, |_| {})
    }

    /// `predict`, handing the normalized vector to `inspect` before scoring.
    pub fn predict_inspect(
        &self,
        obs: &RawObservation,
        inspect: impl FnOnce(&FeatureVector),
    ) -> RainResult<Prediction> {
        let x = self.normalize(obs)?;
        inspect(&x);
        let s = self.score(&x)?;
        Ok(render(s))
    }
}
