use super::clustering::ClusteringMethod;
use crate::core::features::contact::ContactFeatureOptions;
use crate::core::forcefield::potentials::Screening;
use crate::core::graph::GraphLevel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResidueSpecifier {
    pub chain_id: char,
    pub residue_number: isize,
    #[serde(default)]
    pub insertion_code: Option<char>,
}

impl ResidueSpecifier {
    pub fn new(chain_id: char, residue_number: isize) -> Self {
        Self {
            chain_id,
            residue_number,
            insertion_code: None,
        }
    }
}

/// Residues that become graph nodes (or whose atoms do).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResidueSelection {
    #[default]
    All,
    List {
        include: Vec<ResidueSpecifier>,
        #[serde(default)]
        exclude: Vec<ResidueSpecifier>,
    },
    /// A residue together with every residue that has an atom within `radius`.
    Neighborhood {
        center: ResidueSpecifier,
        radius: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GraphConfig {
    pub level: GraphLevel,
    /// Maximum interatomic distance, in Angstroms, for two entities to be in contact.
    pub contact_cutoff: f64,
    #[serde(default)]
    pub contact_features: ContactFeatureOptions,
}

#[derive(Default)]
pub struct GraphConfigBuilder {
    level: Option<GraphLevel>,
    contact_cutoff: Option<f64>,
    contact_features: Option<ContactFeatureOptions>,
}

impl GraphConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: GraphLevel) -> Self {
        self.level = Some(level);
        self
    }
    pub fn contact_cutoff(mut self, cutoff: f64) -> Self {
        self.contact_cutoff = Some(cutoff);
        self
    }
    pub fn contact_features(mut self, options: ContactFeatureOptions) -> Self {
        self.contact_features = Some(options);
        self
    }

    pub fn build(self) -> Result<GraphConfig, ConfigError> {
        let config = GraphConfig {
            level: self.level.ok_or(ConfigError::MissingParameter("level"))?,
            contact_cutoff: self
                .contact_cutoff
                .ok_or(ConfigError::MissingParameter("contact_cutoff"))?,
            contact_features: self.contact_features.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl GraphConfig {
    /// Checks every distance and dielectric setting, including those of
    /// deserialized configurations that never went through the builder.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive_distance("contact_cutoff", self.contact_cutoff)?;
        let options = &self.contact_features;
        positive_distance("covalent_cutoff", options.covalent_cutoff)?;
        let dielectric = options.electrostatics.dielectric;
        if !(dielectric.is_finite() && dielectric > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "dielectric",
                reason: format!("{dielectric} is not a positive constant"),
            });
        }
        if let Screening::Shifted { cutoff } = options.electrostatics.screening {
            positive_distance("screening_cutoff", cutoff)?;
        }
        Ok(())
    }
}

fn positive_distance(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("{value} is not a positive distance"),
        })
    }
}

/// How the attributes of parallel edges are combined when pooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeAggregation {
    #[default]
    Sum,
    Mean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PoolingConfig {
    pub edge_aggregation: EdgeAggregation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CoarseningConfig {
    /// Number of cluster-and-pool rounds.
    pub rounds: usize,
    #[serde(default)]
    pub clustering: ClusteringMethod,
    #[serde(default)]
    pub pooling: PoolingConfig,
    /// Edge attribute column used as clustering weight; unweighted when `None`.
    #[serde(default)]
    pub weight_column: Option<usize>,
    /// Use the graphs' precomputed cluster assignments when they are present.
    #[serde(default)]
    pub use_preloaded: bool,
}

#[derive(Default)]
pub struct CoarseningConfigBuilder {
    rounds: Option<usize>,
    clustering: Option<ClusteringMethod>,
    pooling: Option<PoolingConfig>,
    weight_column: Option<usize>,
    use_preloaded: bool,
}

impl CoarseningConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rounds(mut self, rounds: usize) -> Self {
        self.rounds = Some(rounds);
        self
    }
    pub fn clustering(mut self, method: ClusteringMethod) -> Self {
        self.clustering = Some(method);
        self
    }
    pub fn pooling(mut self, pooling: PoolingConfig) -> Self {
        self.pooling = Some(pooling);
        self
    }
    pub fn weight_column(mut self, column: usize) -> Self {
        self.weight_column = Some(column);
        self
    }
    pub fn use_preloaded(mut self, use_preloaded: bool) -> Self {
        self.use_preloaded = use_preloaded;
        self
    }

    pub fn build(self) -> Result<CoarseningConfig, ConfigError> {
        let rounds = self.rounds.ok_or(ConfigError::MissingParameter("rounds"))?;
        if rounds == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "rounds",
                reason: "at least one round is required".to_string(),
            });
        }
        let clustering = self
            .clustering
            .ok_or(ConfigError::MissingParameter("clustering"))?;
        clustering
            .validate()
            .map_err(|e| ConfigError::InvalidParameter {
                name: "clustering",
                reason: e.to_string(),
            })?;
        Ok(CoarseningConfig {
            rounds,
            clustering,
            pooling: self.pooling.unwrap_or_default(),
            weight_column: self.weight_column,
            use_preloaded: self.use_preloaded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clustering::LouvainParams;

    #[test]
    fn graph_config_requires_level_and_cutoff() {
        assert_eq!(
            GraphConfigBuilder::new().level(GraphLevel::Atomic).build(),
            Err(ConfigError::MissingParameter("contact_cutoff"))
        );
        assert_eq!(
            GraphConfigBuilder::new().contact_cutoff(4.5).build(),
            Err(ConfigError::MissingParameter("level"))
        );

        let config = GraphConfigBuilder::new()
            .level(GraphLevel::Residue)
            .contact_cutoff(8.5)
            .build()
            .unwrap();
        assert_eq!(config.contact_features, ContactFeatureOptions::default());
    }

    #[test]
    fn graph_config_rejects_non_positive_cutoff() {
        let result = GraphConfigBuilder::new()
            .level(GraphLevel::Residue)
            .contact_cutoff(-1.0)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "contact_cutoff",
                ..
            })
        ));
    }

    fn graph_config_with(options: ContactFeatureOptions) -> Result<GraphConfig, ConfigError> {
        GraphConfigBuilder::new()
            .level(GraphLevel::Atomic)
            .contact_cutoff(4.5)
            .contact_features(options)
            .build()
    }

    #[test]
    fn graph_config_rejects_invalid_covalent_cutoff() {
        for cutoff in [f64::NAN, 0.0, -2.1] {
            let options = ContactFeatureOptions {
                covalent_cutoff: cutoff,
                ..Default::default()
            };
            assert!(matches!(
                graph_config_with(options),
                Err(ConfigError::InvalidParameter {
                    name: "covalent_cutoff",
                    ..
                })
            ));
        }
    }

    #[test]
    fn graph_config_rejects_invalid_screening_cutoff() {
        for cutoff in [f64::NAN, -5.0, 0.0] {
            let mut options = ContactFeatureOptions::default();
            options.electrostatics.screening = Screening::Shifted { cutoff };
            assert!(matches!(
                graph_config_with(options),
                Err(ConfigError::InvalidParameter {
                    name: "screening_cutoff",
                    ..
                })
            ));
        }
    }

    #[test]
    fn graph_config_rejects_invalid_dielectric() {
        let mut options = ContactFeatureOptions::default();
        options.electrostatics.dielectric = f64::INFINITY;
        assert!(matches!(
            graph_config_with(options),
            Err(ConfigError::InvalidParameter {
                name: "dielectric",
                ..
            })
        ));
    }

    #[test]
    fn deserialized_graph_config_is_validated_on_demand() {
        let config: GraphConfig = toml::from_str(
            r#"
            level = "atomic"
            contact-cutoff = 4.5

            [contact-features]
            covalent-cutoff = -1.0

            [contact-features.electrostatics]
            dielectric = 4.0
            screening = { kind = "distance-dependent" }
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                name: "covalent_cutoff",
                ..
            })
        ));
    }

    #[test]
    fn coarsening_config_validates_rounds_and_method() {
        assert!(matches!(
            CoarseningConfigBuilder::new()
                .rounds(0)
                .clustering(ClusteringMethod::default())
                .build(),
            Err(ConfigError::InvalidParameter { name: "rounds", .. })
        ));

        let bad_louvain = ClusteringMethod::Louvain(LouvainParams {
            resolution: -1.0,
            seed: None,
        });
        assert!(matches!(
            CoarseningConfigBuilder::new()
                .rounds(2)
                .clustering(bad_louvain)
                .build(),
            Err(ConfigError::InvalidParameter {
                name: "clustering",
                ..
            })
        ));
    }

    #[test]
    fn coarsening_config_deserializes_from_toml() {
        let text = r#"
            rounds = 2
            weight-column = 0
            use-preloaded = false

            [clustering]
            method = "louvain"
            resolution = 1.5
            seed = 42

            [pooling]
            edge-aggregation = "mean"
        "#;
        let config: CoarseningConfig = toml::from_str(text).unwrap();
        assert_eq!(config.rounds, 2);
        assert_eq!(config.weight_column, Some(0));
        assert_eq!(
            config.clustering,
            ClusteringMethod::Louvain(LouvainParams {
                resolution: 1.5,
                seed: Some(42)
            })
        );
        assert_eq!(config.pooling.edge_aggregation, EdgeAggregation::Mean);
    }

    #[test]
    fn residue_selection_defaults_to_all() {
        assert_eq!(ResidueSelection::default(), ResidueSelection::All);
    }
}
