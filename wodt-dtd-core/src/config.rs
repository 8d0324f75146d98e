use std::collections::HashSet;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::dtd::TwinSettings;
use crate::model::{ExtractedModel, ThingModelElement};
use crate::ontology::MappedOntology;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: String,
    pub core: CoreConfig,
    pub twin: TwinConfig,
    pub ontology: MappedOntology,
    /// Platforms the twin starts out registered to.
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub expose: ExposeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoreConfig {
    pub bind_http: String,
    /// `user:password` required on descriptor routes when set.
    #[serde(default)]
    pub basic_auth: Option<String>,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { metrics_path: default_metrics_path() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwinConfig {
    pub uri: String,
    pub physical_asset_id: String,
    pub port: u16,
    pub base_url: String,
    #[serde(flatten)]
    pub model: ExtractedModel,
}

impl TwinConfig {
    pub fn settings(&self) -> TwinSettings {
        TwinSettings {
            digital_twin_uri: self.uri.clone(),
            physical_asset_id: self.physical_asset_id.clone(),
            port: self.port,
            base_url: self.base_url.clone(),
        }
    }
}

/// Raw element names registered at startup.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExposeConfig {
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
}

impl Config {
    pub fn from_path(path: &str) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)?;
        let cfg: Self = serde_yaml::from_slice(&bytes)?;
        cfg.validate().with_context(|| format!("invalid config {path}"))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.twin.base_url.trim().is_empty() {
            bail!("twin.base_url must not be empty");
        }
        check_unique("twin.properties", &self.twin.model.properties)?;
        check_unique("twin.actions", &self.twin.model.actions)?;
        check_unique("twin.events", &self.twin.model.events)?;
        Ok(())
    }
}

fn check_unique(section: &str, elements: &[ThingModelElement]) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    for e in elements {
        if !seen.insert(e) {
            bail!("{section}: duplicate element '{}' (feature {:?})", e.name, e.feature);
        }
    }
    Ok(())
}
