use crate::error::{CliError, Result};
use graphprot::engine::config::EdgeAggregation;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub rounds: Option<usize>,
    pub weight_column: Option<usize>,
    pub use_preloaded: Option<bool>,
    pub clustering: Option<FileClusteringConfig>,
    pub pooling: Option<FilePoolingConfig>,
}

/// Method name plus the parameters of either method; parameters that do not
/// belong to the chosen method are rejected when the configuration is built.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileClusteringConfig {
    pub method: Option<String>,
    pub expansion: Option<u32>,
    pub inflation: Option<f64>,
    pub loop_value: Option<f64>,
    pub iterations: Option<usize>,
    pub pruning_threshold: Option<f64>,
    pub tolerance: Option<f64>,
    pub resolution: Option<f64>,
    pub seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilePoolingConfig {
    pub edge_aggregation: Option<EdgeAggregation>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
