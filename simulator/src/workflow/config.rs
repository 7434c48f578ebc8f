use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use artwalkcore::catalog::Catalog;
use artwalkcore::prelude::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalkConfig {
    /// JSON array of artworks.
    pub catalog: PathBuf,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl WalkConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading walk config {}", path_ref.display()))?;
        let config: WalkConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing walk config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(catalog: PathBuf, step_goal: u64, seed: u64) -> Self {
        Self {
            catalog,
            engine: EngineConfig {
                step_goal,
                ..Default::default()
            },
            generator: GeneratorConfig {
                seed,
                ..Default::default()
            },
            bind: default_bind(),
        }
    }

    pub fn load_catalog(&self) -> anyhow::Result<Catalog> {
        let contents = fs::read_to_string(&self.catalog)
            .with_context(|| format!("reading catalog {}", self.catalog.display()))?;
        let catalog = Catalog::from_json(&contents)
            .with_context(|| format!("parsing catalog {}", self.catalog.display()))?;
        Ok(catalog)
    }
}
