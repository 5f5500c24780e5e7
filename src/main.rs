use std::sync::Arc;

use rain_predictor::{
    artifacts::Artifacts,
    config::AppConfig,
    server::{self, AppState},
    Predictor,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = AppConfig::from_env()?;

    // Schema mismatches abort here, before anything is served
    let artifacts = Artifacts::load(&cfg.model_path, &cfg.meta_path)?;
    tracing::info!(
        "loaded artifacts; feature_names[{}]: {:?}",
        artifacts.feature_names.len(),
        &artifacts.feature_names
    );
    let predictor = Predictor::new(artifacts);

    // Warmup with the form's first labels so a broken scorer fails at startup
    let warm = server::form_defaults(predictor.encoders())?;
    let out = predictor.predict(&warm)?;
    tracing::info!("warmup prediction ok: {}", out.message);

    let state = AppState {
        predictor: Arc::new(predictor),
        log_pred: cfg.log_pred,
    };
    let app = server::router(state);

    let addr = cfg.addr();
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
