mod defaults;
mod file;

use crate::cli::CoarsenArgs;
use crate::error::{CliError, Result};
use defaults::DefaultsConfig;
use file::{FileClusteringConfig, FileConfig};
use graphprot::engine::clustering::{ClusteringError, ClusteringMethod};
use graphprot::engine::config::{
    CoarseningConfig, CoarseningConfigBuilder, EdgeAggregation, PoolingConfig,
};
use tracing::debug;

/// Merges defaults, the optional config file, `--set` values and the
/// dedicated flags (in increasing priority) into a coarsening configuration.
pub fn build_coarsening_config(args: &CoarsenArgs) -> Result<CoarseningConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let mut file_config = apply_set_values(file_config, &args.set_values)?;
    debug!("Configuration after --set overrides: {:?}", file_config);

    let mut clustering_file = file_config.clustering.take().unwrap_or_default();
    if let Some(seed) = args.seed {
        clustering_file.seed = Some(seed);
    }
    let method_name = args
        .method
        .as_deref()
        .or(clustering_file.method.as_deref())
        .unwrap_or(defaults.method);
    let clustering = clustering_method(method_name, &clustering_file)?;

    let pooling = PoolingConfig {
        edge_aggregation: file_config
            .pooling
            .and_then(|p| p.edge_aggregation)
            .unwrap_or_default(),
    };

    let mut builder = CoarseningConfigBuilder::new()
        .rounds(args.rounds.or(file_config.rounds).unwrap_or(defaults.rounds))
        .clustering(clustering)
        .pooling(pooling)
        .use_preloaded(
            args.use_preloaded || file_config.use_preloaded.unwrap_or(defaults.use_preloaded),
        );
    if let Some(column) = args.weight_column.or(file_config.weight_column) {
        builder = builder.weight_column(column);
    }
    builder.build().map_err(|e| CliError::Config(e.to_string()))
}

fn clustering_method(name: &str, file: &FileClusteringConfig) -> Result<ClusteringMethod> {
    let method: ClusteringMethod = name
        .parse()
        .map_err(|e: ClusteringError| CliError::Config(e.to_string()))?;

    let misplaced = |key: &str| {
        Err(CliError::Config(format!(
            "'clustering.{key}' does not apply to the '{}' method",
            method.name()
        )))
    };

    match method {
        ClusteringMethod::Mcl(mut params) => {
            if file.resolution.is_some() {
                return misplaced("resolution");
            }
            if file.seed.is_some() {
                return misplaced("seed");
            }
            params.expansion = file.expansion.unwrap_or(params.expansion);
            params.inflation = file.inflation.unwrap_or(params.inflation);
            params.loop_value = file.loop_value.unwrap_or(params.loop_value);
            params.iterations = file.iterations.unwrap_or(params.iterations);
            params.pruning_threshold = file.pruning_threshold.unwrap_or(params.pruning_threshold);
            params.tolerance = file.tolerance.unwrap_or(params.tolerance);
            Ok(ClusteringMethod::Mcl(params))
        }
        ClusteringMethod::Louvain(mut params) => {
            let mcl_keys = [
                ("expansion", file.expansion.is_some()),
                ("inflation", file.inflation.is_some()),
                ("loop-value", file.loop_value.is_some()),
                ("iterations", file.iterations.is_some()),
                ("pruning-threshold", file.pruning_threshold.is_some()),
                ("tolerance", file.tolerance.is_some()),
            ];
            if let Some(&(key, _)) = mcl_keys.iter().find(|(_, set)| *set) {
                return misplaced(key);
            }
            params.resolution = file.resolution.unwrap_or(params.resolution);
            params.seed = file.seed.or(params.seed);
            Ok(ClusteringMethod::Louvain(params))
        }
    }
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();
        let value_str = value_str.trim();

        match key {
            "rounds" => config.rounds = Some(parse(key, value_str)?),
            "weight-column" => config.weight_column = Some(parse(key, value_str)?),
            "use-preloaded" => config.use_preloaded = Some(parse(key, value_str)?),
            "clustering.method" => {
                config.clustering.get_or_insert_with(Default::default).method =
                    Some(value_str.to_string())
            }
            "clustering.expansion" => {
                config.clustering.get_or_insert_with(Default::default).expansion =
                    Some(parse(key, value_str)?)
            }
            "clustering.inflation" => {
                config.clustering.get_or_insert_with(Default::default).inflation =
                    Some(parse(key, value_str)?)
            }
            "clustering.loop-value" => {
                config.clustering.get_or_insert_with(Default::default).loop_value =
                    Some(parse(key, value_str)?)
            }
            "clustering.iterations" => {
                config.clustering.get_or_insert_with(Default::default).iterations =
                    Some(parse(key, value_str)?)
            }
            "clustering.pruning-threshold" => {
                config.clustering.get_or_insert_with(Default::default).pruning_threshold =
                    Some(parse(key, value_str)?)
            }
            "clustering.tolerance" => {
                config.clustering.get_or_insert_with(Default::default).tolerance =
                    Some(parse(key, value_str)?)
            }
            "clustering.resolution" => {
                config.clustering.get_or_insert_with(Default::default).resolution =
                    Some(parse(key, value_str)?)
            }
            "clustering.seed" => {
                config.clustering.get_or_insert_with(Default::default).seed =
                    Some(parse(key, value_str)?)
            }
            "pooling.edge-aggregation" => {
                let aggregation = match value_str {
                    "sum" => EdgeAggregation::Sum,
                    "mean" => EdgeAggregation::Mean,
                    _ => {
                        return Err(CliError::Config(format!(
                            "Invalid value for {}: {} (expected 'sum' or 'mean')",
                            key, value_str
                        )));
                    }
                };
                config.pooling.get_or_insert_with(Default::default).edge_aggregation =
                    Some(aggregation);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unknown configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphprot::engine::clustering::{LouvainParams, MclParams};
    use std::fs;
    use std::path::PathBuf;

    fn args() -> CoarsenArgs {
        CoarsenArgs {
            input: PathBuf::from("in.json"),
            output: PathBuf::from("out.json"),
            config: None,
            method: None,
            rounds: None,
            seed: None,
            weight_column: None,
            use_preloaded: false,
            set_values: Vec::new(),
        }
    }

    #[test]
    fn defaults_give_one_round_of_mcl() {
        let config = build_coarsening_config(&args()).unwrap();
        assert_eq!(config.rounds, 1);
        assert_eq!(config.clustering, ClusteringMethod::Mcl(MclParams::default()));
        assert_eq!(config.weight_column, None);
        assert_eq!(config.pooling.edge_aggregation, EdgeAggregation::Sum);
    }

    #[test]
    fn file_values_are_overridden_by_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coarsen.toml");
        fs::write(
            &path,
            r#"
            rounds = 3
            weight-column = 1

            [clustering]
            method = "louvain"
            resolution = 0.8
            seed = 1

            [pooling]
            edge-aggregation = "mean"
            "#,
        )
        .unwrap();

        let mut args = args();
        args.config = Some(path);
        args.rounds = Some(2);
        args.seed = Some(99);

        let config = build_coarsening_config(&args).unwrap();
        assert_eq!(config.rounds, 2);
        assert_eq!(config.weight_column, Some(1));
        assert_eq!(
            config.clustering,
            ClusteringMethod::Louvain(LouvainParams {
                resolution: 0.8,
                seed: Some(99),
            })
        );
        assert_eq!(config.pooling.edge_aggregation, EdgeAggregation::Mean);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coarsen.toml");
        fs::write(&path, "round = 3\n").unwrap();

        let mut args = args();
        args.config = Some(path);
        assert!(matches!(
            build_coarsening_config(&args),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn set_values_reach_the_clustering_parameters() {
        let mut args = args();
        args.set_values = vec![
            "clustering.inflation=3.0".to_string(),
            "clustering.iterations = 20".to_string(),
        ];
        let config = build_coarsening_config(&args).unwrap();
        let ClusteringMethod::Mcl(params) = config.clustering else {
            panic!("expected Markov clustering");
        };
        assert_eq!(params.inflation, 3.0);
        assert_eq!(params.iterations, 20);
    }

    #[test]
    fn parameters_of_the_other_method_are_rejected() {
        let mut mcl_args = args();
        mcl_args.seed = Some(3);
        let error = build_coarsening_config(&mcl_args).unwrap_err();
        assert!(error.to_string().contains("seed"));

        let mut louvain_args = args();
        louvain_args.method = Some("louvain".to_string());
        louvain_args.set_values = vec!["clustering.inflation=2.5".to_string()];
        assert!(matches!(
            build_coarsening_config(&louvain_args),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn invalid_set_values_are_rejected() {
        for bad in ["rounds", "rounds=two", "clustering.colour=red", "pooling.edge-aggregation=max"] {
            let mut args = args();
            args.set_values = vec![bad.to_string()];
            assert!(
                matches!(build_coarsening_config(&args), Err(CliError::Config(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn unsupported_method_is_a_configuration_error() {
        let mut args = args();
        args.method = Some("spectral".to_string());
        assert!(matches!(
            build_coarsening_config(&args),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn zero_rounds_are_rejected() {
        let mut args = args();
        args.rounds = Some(0);
        assert!(matches!(
            build_coarsening_config(&args),
            Err(CliError::Config(_))
        ));
    }
}
