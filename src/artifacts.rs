use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

use crate::error::{RainError, RainResult};
use crate::normalizer::{EncodingTable, CATEGORICAL_FIELDS};

/// Numeric normalization applied to a feature vector before scoring.
/// Parameters are fixed at load time.
pub trait Scaler: Send + Sync {
    /// Width the transform expects, if it is fixed.
    fn input_dim(&self) -> Option<usize>;
    fn transform(&self, x: &[f32]) -> Result<Vec<f32>>;
}

/// Probability of the positive ("rain") class for one scaled vector.
pub trait Classifier: Send + Sync {
    fn input_dim(&self) -> Option<usize>;
    fn probability_of_class(&self, x: &[f32]) -> Result<f32>;
}

#[derive(Deserialize)]
struct MetaJson {
    feature_names: Vec<String>,
    label_encoders: HashMap<String, Vec<String>>,
    scaler: Option<StandardScaler>,
}

/// Standardization: `(x - mean) / scale`, per feature.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

impl Scaler for StandardScaler {
    fn input_dim(&self) -> Option<usize> {
        Some(self.mean.len())
    }

    fn transform(&self, x: &[f32]) -> Result<Vec<f32>> {
        if x.len() != self.mean.len() {
            bail!(
                "scaler width mismatch: got {}, expected {}",
                x.len(),
                self.mean.len()
            );
        }
        Ok(x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| {
                // constant features are exported with scale 0
                let s = if *s == 0.0 { 1.0 } else { *s };
                (v - m) / s
            })
            .collect())
    }
}

/// Used when the meta file ships no scaler.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityScaler;

impl Scaler for IdentityScaler {
    fn input_dim(&self) -> Option<usize> {
        None
    }

    fn transform(&self, x: &[f32]) -> Result<Vec<f32>> {
        Ok(x.to_vec())
    }
}

/// Binary logistic regression exported as plain coefficients.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticModel {
    pub coef: Vec<f32>,
    pub intercept: f32,
}

impl Classifier for LogisticModel {
    fn input_dim(&self) -> Option<usize> {
        Some(self.coef.len())
    }

    fn probability_of_class(&self, x: &[f32]) -> Result<f32> {
        if x.len() != self.coef.len() {
            bail!(
                "feature length mismatch: got {}, expected {}",
                x.len(),
                self.coef.len()
            );
        }
        let z: f32 = self.intercept + x.iter().zip(&self.coef).map(|(a, b)| a * b).sum::<f32>();
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

#[cfg(feature = "torch")]
pub use torch::TorchModel;

#[cfg(feature = "torch")]
mod torch {
    use anyhow::{bail, Context, Result};
    use tch::{kind::Kind, CModule, Device, IndexOp, Tensor};

    use super::Classifier;

    /// TorchScript classifier. Output is either `[1, 2]` class probabilities
    /// or a single `[1, 1]` logit.
    pub struct TorchModel {
        model: CModule,
        device: Device,
        in_dim: usize,
        two_class: bool,
    }

    impl TorchModel {
        pub fn load(model_path: &str, in_dim: usize) -> Result<Self> {
            let device = Device::Cpu;
            let model = CModule::load_on_device(model_path, device)
                .with_context(|| format!("failed to load TorchScript {}", model_path))?;

            // Probe output shape with a dummy forward
            let dummy = Tensor::zeros([1, in_dim as i64], (Kind::Float, device));
            let t = model.forward_ts(&[dummy])?;
            let sz = t.size();
            let two_class = match sz.as_slice() {
                [1, 2] => true,
                [1, 1] => false,
                _ => bail!("unexpected model output size: {:?}", sz),
            };

            Ok(Self {
                model,
                device,
                in_dim,
                two_class,
            })
        }
    }

    impl Classifier for TorchModel {
        fn input_dim(&self) -> Option<usize> {
            Some(self.in_dim)
        }

        fn probability_of_class(&self, x: &[f32]) -> Result<f32> {
            if x.len() != self.in_dim {
                bail!(
                    "feature length mismatch: got {}, expected {}",
                    x.len(),
                    self.in_dim
                );
            }
            let input = Tensor::from_slice(x)
                .reshape([1, self.in_dim as i64])
                .to_device(self.device);
            let t = self.model.forward_ts(&[input])?.to_kind(Kind::Float);
            let p = if self.two_class {
                t.i((0, 1))
            } else {
                t.i((0, 0)).sigmoid()
            };
            Ok(p.double_value(&[]) as f32)
        }
    }
}

/// Everything loaded once at startup. Versioned together; `from_parts`
/// refuses combinations that disagree with each other.
pub struct Artifacts {
    pub feature_names: Vec<String>,
    pub encoders: EncodingTable,
    pub scaler: Box<dyn Scaler>,
    pub classifier: Box<dyn Classifier>,
}

impl Artifacts {
    pub fn load(model_path: &str, meta_path: &str) -> Result<Self> {
        // Load meta.json to get feature ordering, encoders and scaler
        let meta_txt = fs::read_to_string(Path::new(meta_path))
            .with_context(|| format!("failed to read meta at {}", meta_path))?;
        let meta: MetaJson = serde_json::from_str(&meta_txt)
            .with_context(|| format!("failed to parse meta at {}", meta_path))?;

        let scaler: Box<dyn Scaler> = match meta.scaler {
            Some(s) if s.mean.len() != s.scale.len() => {
                return Err(RainError::schema(format!(
                    "scaler has {} means but {} scales",
                    s.mean.len(),
                    s.scale.len()
                ))
                .into());
            }
            Some(s) => Box::new(s),
            None => {
                tracing::warn!("meta has no scaler; features are scored unscaled");
                Box::new(IdentityScaler)
            }
        };
        let classifier = load_classifier(model_path, meta.feature_names.len())?;

        let artifacts = Self::from_parts(
            meta.feature_names,
            EncodingTable::new(meta.label_encoders),
            scaler,
            classifier,
        )?;
        Ok(artifacts)
    }

    pub fn from_parts(
        feature_names: Vec<String>,
        encoders: EncodingTable,
        scaler: Box<dyn Scaler>,
        classifier: Box<dyn Classifier>,
    ) -> RainResult<Self> {
        if feature_names.is_empty() {
            return Err(RainError::schema("feature list is empty"));
        }
        let mut seen = std::collections::HashSet::new();
        for name in &feature_names {
            if !seen.insert(name.as_str()) {
                return Err(RainError::schema(format!("duplicate feature {:?}", name)));
            }
        }
        for field in CATEGORICAL_FIELDS {
            encoders.classes(field)?;
        }
        let n = feature_names.len();
        if let Some(d) = scaler.input_dim() {
            if d != n {
                return Err(RainError::schema(format!(
                    "scaler expects {} features, feature list has {}",
                    d, n
                )));
            }
        }
        if let Some(d) = classifier.input_dim() {
            if d != n {
                return Err(RainError::schema(format!(
                    "classifier expects {} features, feature list has {}",
                    d, n
                )));
            }
        }
        Ok(Self {
            feature_names,
            encoders,
            scaler,
            classifier,
        })
    }
}

fn load_classifier(model_path: &str, in_dim: usize) -> Result<Box<dyn Classifier>> {
    let is_torchscript = Path::new(model_path)
        .extension()
        .is_some_and(|ext| ext == "pt" || ext == "pts");

    if is_torchscript {
        #[cfg(feature = "torch")]
        {
            return Ok(Box::new(TorchModel::load(model_path, in_dim)?));
        }
        #[cfg(not(feature = "torch"))]
        {
            let _ = in_dim;
            bail!(
                "{} is a TorchScript model; rebuild with the `torch` feature",
                model_path
            );
        }
    }

    let txt = fs::read_to_string(model_path)
        .with_context(|| format!("failed to read model at {}", model_path))?;
    let model: LogisticModel = serde_json::from_str(&txt)
        .with_context(|| format!("failed to parse model at {}", model_path))?;
    Ok(Box::new(model))
}
