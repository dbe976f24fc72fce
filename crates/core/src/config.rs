use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::AnalysisError;
use crate::performance::StubMetricsSupplier;

pub const CONFIG_FILE_NAME: &str = "webeco.toml";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Host treated as first-party; overrides the host of the analyzed URL.
    pub own_host: Option<String>,
    pub resolve_image_sizes: Option<bool>,
    /// kg CO2e per kWh.
    pub carbon_intensity: Option<f64>,
    pub http_timeout_secs: Option<u64>,
    /// Overrides for the stub metrics supplier.
    pub metrics: StubMetricsSupplier,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("validate {}", path.display()))?;
        Ok(config)
    }

    /// `webeco.toml` in the working directory, if present and valid.
    pub fn discover() -> Option<Self> {
        Self::discover_in(Path::new("."))
    }

    /// A config file in `dir` that fails to load is reported and skipped.
    pub fn discover_in(dir: &Path) -> Option<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return None;
        }
        match Config::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("ignoring {}: {e:#}", path.display());
                None
            }
        }
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if let Some(intensity) = self.carbon_intensity {
            if !intensity.is_finite() || intensity < 0.0 {
                return Err(AnalysisError::Config(format!(
                    "carbon_intensity must be a non-negative number, got {intensity}"
                )));
            }
        }
        if self.http_timeout_secs == Some(0) {
            return Err(AnalysisError::Config(
                "http_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
