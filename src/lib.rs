pub mod artifacts;
pub mod config;
pub mod error;
pub mod inference;
pub mod normalizer;
pub mod server;
pub mod types;

pub use error::{RainError, RainResult};
pub use inference::Predictor;
