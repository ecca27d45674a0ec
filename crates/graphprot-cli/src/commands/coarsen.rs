use crate::cli::CoarsenArgs;
use crate::config::build_coarsening_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use graphprot::core::graph::GraphData;
use graphprot::core::io::archive::GraphArchive;
use graphprot::engine::error::EngineError;
use graphprot::engine::progress::ProgressReporter;
use graphprot::workflows;
use tracing::{info, warn};

pub fn run(args: CoarsenArgs, progress: CliProgressHandler) -> Result<()> {
    let config = build_coarsening_config(&args)?;
    info!(
        "Coarsening with {} for {} round(s).",
        config.clustering, config.rounds
    );

    let archive = GraphArchive::read_from_path(&args.input).map_err(|source| CliError::Archive {
        path: args.input.clone(),
        source,
    })?;
    if archive.is_empty() {
        return Err(CliError::Argument(format!(
            "Archive '{}' contains no graphs.",
            args.input.display()
        )));
    }
    info!("Loaded {} graph(s) from {:?}", archive.len(), &args.input);

    let names: Vec<String> = archive.iter().map(|(name, _)| name.clone()).collect();
    let graphs: Vec<GraphData> = archive.iter().map(|(_, graph)| graph.clone()).collect();
    let batch = GraphData::collate(&graphs).map_err(EngineError::from)?;

    let reporter = ProgressReporter::with_callback(progress.get_callback());
    let result = workflows::coarsen::run(&batch, &config, &reporter)?;

    for warning in &result.warnings {
        warn!("{}", warning);
    }

    let Some(coarsest) = result.coarsest() else {
        return Err(CliError::Config("No coarsening rounds were run.".to_string()));
    };
    let pooled = coarsest.split().map_err(EngineError::from)?;
    if pooled.len() != names.len() {
        return Err(CliError::Argument(format!(
            "Expected {} pooled graphs but found {}; empty graphs at the end of the archive cannot be coarsened.",
            names.len(),
            pooled.len()
        )));
    }

    let mut output = GraphArchive::new();
    for (name, graph) in names.into_iter().zip(pooled) {
        output.insert(name, graph).map_err(EngineError::from)?;
    }
    output
        .write_to_path(&args.output)
        .map_err(|source| CliError::Archive {
            path: args.output.clone(),
            source,
        })?;

    println!(
        "Coarsened {} graph(s) over {} level(s); wrote {}",
        output.len(),
        result.levels.len(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphprot::core::graph::EdgeIndex;
    use nalgebra::DMatrix;
    use std::path::Path;

    fn ring() -> GraphData {
        let edge_index = EdgeIndex::from_pairs([(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]);
        let edge_attr = DMatrix::from_column_slice(6, 1, &[1.0, 1.0, 0.1, 1.0, 1.0, 0.1]);
        GraphData::new(DMatrix::from_element(6, 2, 1.0), edge_index, edge_attr)
    }

    fn args(input: &Path, output: &Path) -> CoarsenArgs {
        CoarsenArgs {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            config: None,
            method: Some("louvain".to_string()),
            rounds: Some(1),
            seed: Some(11),
            weight_column: Some(0),
            use_preloaded: false,
            set_values: Vec::new(),
        }
    }

    #[test]
    fn coarsened_archive_keeps_group_names() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("graphs.json");
        let output = dir.path().join("coarse.json");

        let mut archive = GraphArchive::new();
        archive.insert("1ABC", ring()).unwrap();
        archive.insert("2XYZ", ring()).unwrap();
        archive.write_to_path(&input).unwrap();

        run(args(&input, &output), CliProgressHandler::hidden()).unwrap();

        let coarse = GraphArchive::read_from_path(&output).unwrap();
        let names: Vec<_> = coarse.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["1ABC", "2XYZ"]);
        for (_, graph) in coarse.iter() {
            assert_eq!(graph.node_count(), 2);
            assert_eq!(graph.batch, vec![0, 0]);
        }
    }

    #[test]
    fn missing_input_is_an_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(
            args(&dir.path().join("missing.json"), &dir.path().join("out.json")),
            CliProgressHandler::hidden(),
        );
        assert!(matches!(result, Err(CliError::Archive { .. })));
    }

    #[test]
    fn empty_archive_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.json");
        GraphArchive::new().write_to_path(&input).unwrap();

        let result = run(
            args(&input, &dir.path().join("out.json")),
            CliProgressHandler::hidden(),
        );
        assert!(matches!(result, Err(CliError::Argument(_))));
    }
}
