use anyhow::{Context, Result};
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_path: String,
    pub meta_path: String,
    pub bind_ip: IpAddr,
    pub port: u16,
    /// Per-request feature vector statistics at info level.
    pub log_pred: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let model_path = get("MODEL_PATH").context("MODEL_PATH not set")?;
        let meta_path = get("META_PATH").context("META_PATH not set")?;
        let bind_ip = match get("BIND_ADDR") {
            Some(s) => s
                .parse()
                .with_context(|| format!("BIND_ADDR {:?} is not an IP address", s))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let port: u16 = get("PORT").and_then(|s| s.parse().ok()).unwrap_or(8080);
        let log_pred = get("LOG_PRED").as_deref() == Some("1");

        Ok(Self {
            model_path,
            meta_path,
            bind_ip,
            port,
            log_pred,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_optional_vars_absent() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("MODEL_PATH", "model.json"),
            ("META_PATH", "meta.json"),
        ]))
        .unwrap();
        assert_eq!(cfg.addr().to_string(), "0.0.0.0:8080");
        assert!(!cfg.log_pred);
    }

    #[test]
    fn reads_overrides() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("MODEL_PATH", "m.json"),
            ("META_PATH", "meta.json"),
            ("BIND_ADDR", "127.0.0.1"),
            ("PORT", "9090"),
            ("LOG_PRED", "1"),
        ]))
        .unwrap();
        assert_eq!(cfg.addr().to_string(), "127.0.0.1:9090");
        assert!(cfg.log_pred);
    }

    #[test]
    fn model_path_is_required() {
        let err = AppConfig::from_lookup(lookup(&[("META_PATH", "meta.json")])).unwrap_err();
        assert!(err.to_string().contains("MODEL_PATH"));
    }
}
