use crate::core::contacts::enumeration::{atomic_contacts, residue_contacts, residues_near};
use crate::core::contacts::pair::Contact;
use crate::core::features::contact::add_contact_features;
use crate::core::features::names;
use crate::core::features::residue::{Variant, add_node_features};
use crate::core::forcefield::energy::ElectrostaticsConfig;
use crate::core::forcefield::parameterization::{ParameterizationSummary, Parameterizer};
use crate::core::forcefield::params::Forcefield;
use crate::core::graph::{Edge, Graph, GraphBuilder, GraphData, GraphLevel, Node, NodeId};
use crate::core::io::archive::GraphArchive;
use crate::core::models::ids::{AtomId, ResidueId};
use crate::core::models::residue::{Residue, ResidueType};
use crate::core::models::system::MolecularSystem;
use crate::engine::config::{GraphConfig, ResidueSelection, ResidueSpecifier};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A residue substitution named by its position in the structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VariantSpec {
    pub residue: ResidueSpecifier,
    pub variant_type: ResidueType,
}

/// One graph to build from a structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Query {
    /// Group name of the graph in the output archive.
    pub id: String,
    /// Overrides the level of the [`GraphConfig`] when set.
    #[serde(default)]
    pub level: Option<GraphLevel>,
    #[serde(default)]
    pub selection: ResidueSelection,
    #[serde(default)]
    pub variant: Option<VariantSpec>,
    #[serde(default)]
    pub targets: BTreeMap<String, f64>,
}

impl Query {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            level: None,
            selection: ResidueSelection::All,
            variant: None,
            targets: BTreeMap::new(),
        }
    }

    pub fn level_or(&self, config: &GraphConfig) -> GraphLevel {
        self.level.unwrap_or(config.level)
    }
}

/// Types the atoms of `system` with `forcefield` and adopts its dielectric constant.
///
/// Atoms the force field does not know keep their previous data; they only
/// cause errors later if a descriptor needs them.
#[instrument(skip_all, name = "parameterize")]
pub fn parameterize(
    system: &mut MolecularSystem,
    forcefield: &Forcefield,
    config: &mut GraphConfig,
) -> Result<ParameterizationSummary, EngineError> {
    let summary = Parameterizer::new(forcefield).parameterize_system(system)?;
    config.contact_features.electrostatics = ElectrostaticsConfig {
        screening: config.contact_features.electrostatics.screening,
        ..ElectrostaticsConfig::from_forcefield(forcefield)
    };
    config.validate()?;
    info!(
        parameterized = summary.parameterized,
        unknown = summary.unknown,
        dielectric = config.contact_features.electrostatics.dielectric,
        "Applied force field."
    );
    Ok(summary)
}

/// Builds the feature graph of one query.
///
/// Nodes are the selected residues (or their atoms) in structure order; edges
/// are their contacts within the configured cutoff. Residues without atoms are
/// left out.
#[instrument(skip_all, name = "build_graph", fields(query = %query.id))]
pub fn build_graph(
    system: &MolecularSystem,
    query: &Query,
    config: &GraphConfig,
) -> Result<Graph, EngineError> {
    config.validate()?;
    let level = query.level_or(config);
    let residues = resolve_selection(system, &query.selection)?;
    let variant = query
        .variant
        .map(|spec| {
            Ok::<_, EngineError>(Variant {
                residue: resolve_specifier(system, &spec.residue)?,
                variant_type: spec.variant_type,
            })
        })
        .transpose()?;

    let mut builder = GraphBuilder::new(query.id.clone());
    match level {
        GraphLevel::Residue => {
            for &residue_id in &residues {
                builder.add_node(Node::new(
                    NodeId::Residue(residue_id),
                    residue_label(system, residue_id),
                ));
            }
            for contact in residue_contacts(system, &residues, config.contact_cutoff)? {
                builder.add_edge(Edge::new(Contact::from(contact)));
            }
        }
        GraphLevel::Atomic => {
            let atoms: Vec<AtomId> = residues
                .iter()
                .filter_map(|&id| system.residue(id))
                .flat_map(|residue| residue.atoms().iter().copied())
                .collect();
            for &atom_id in &atoms {
                builder.add_node(Node::new(NodeId::Atom(atom_id), atom_label(system, atom_id)));
            }
            for contact in atomic_contacts(system, &atoms, config.contact_cutoff)? {
                builder.add_edge(Edge::new(Contact::from(contact)));
            }
        }
    }

    add_node_features(&mut builder, system, variant.as_ref())?;
    add_contact_features(&mut builder, system, &config.contact_features)?;
    for (name, &value) in &query.targets {
        builder.set_target(name, value);
    }

    Ok(builder.finalize()?)
}

/// Builds every query independently; results keep the order of `queries`.
#[instrument(skip_all, name = "build_graphs", fields(queries = queries.len()))]
pub fn build_graphs(
    system: &MolecularSystem,
    queries: &[Query],
    config: &GraphConfig,
    reporter: &ProgressReporter,
) -> Vec<Result<Graph, EngineError>> {
    reporter.report(Progress::TaskStart {
        total_steps: queries.len() as u64,
    });

    let build = |query: &Query| {
        let result = build_graph(system, query, config);
        reporter.report(Progress::TaskIncrement);
        result
    };

    #[cfg(feature = "parallel")]
    let results: Vec<_> = queries.par_iter().map(build).collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = queries.iter().map(build).collect();

    reporter.report(Progress::TaskFinish);
    results
}

/// Exports a built graph with the standard feature columns of its level.
pub fn export(graph: &Graph, level: GraphLevel, with_variant: bool) -> Result<GraphData, EngineError> {
    let node_features = names::node_features(level, with_variant);
    let edge_features = names::edge_features(level);
    Ok(graph.to_graph_data(&node_features, &edge_features)?)
}

/// Builds and exports every query into a single archive.
///
/// Stops at the first query that fails.
#[instrument(skip_all, name = "build_archive")]
pub fn build_archive(
    system: &MolecularSystem,
    queries: &[Query],
    config: &GraphConfig,
    reporter: &ProgressReporter,
) -> Result<GraphArchive, EngineError> {
    let graphs = reporter.phase("Graph construction", || {
        build_graphs(system, queries, config, reporter)
    });

    let mut archive = GraphArchive::new();
    for (query, graph) in queries.iter().zip(graphs) {
        let data = export(&graph?, query.level_or(config), query.variant.is_some())?;
        archive.insert(query.id.clone(), data)?;
    }

    info!(graphs = archive.len(), "Built graph archive.");
    Ok(archive)
}

fn resolve_specifier(
    system: &MolecularSystem,
    spec: &ResidueSpecifier,
) -> Result<ResidueId, EngineError> {
    system
        .find_chain_by_id(spec.chain_id)
        .and_then(|chain| system.find_residue(chain, spec.residue_number, spec.insertion_code))
        .ok_or(EngineError::ResidueNotFound { spec: *spec })
}

/// Selected residues with at least one atom, in structure order.
fn resolve_selection(
    system: &MolecularSystem,
    selection: &ResidueSelection,
) -> Result<Vec<ResidueId>, EngineError> {
    let selected: HashSet<ResidueId> = match selection {
        ResidueSelection::All => system.residues_iter().map(|(id, _)| id).collect(),
        ResidueSelection::List { include, exclude } => {
            let mut selected: HashSet<ResidueId> = if include.is_empty() {
                system.residues_iter().map(|(id, _)| id).collect()
            } else {
                include
                    .iter()
                    .map(|spec| resolve_specifier(system, spec))
                    .collect::<Result<_, _>>()?
            };
            for spec in exclude {
                if let Ok(residue_id) = resolve_specifier(system, spec) {
                    selected.remove(&residue_id);
                }
            }
            selected
        }
        ResidueSelection::Neighborhood { center, radius } => {
            let center = resolve_specifier(system, center)?;
            let mut selected: HashSet<ResidueId> =
                residues_near(system, center, *radius)?.into_iter().collect();
            selected.insert(center);
            selected
        }
    };

    Ok(structure_order(system)
        .filter(|(id, residue)| selected.contains(id) && !residue.atoms().is_empty())
        .map(|(id, _)| id)
        .collect())
}

/// Residues chain by chain, each chain in insertion order.
fn structure_order(system: &MolecularSystem) -> impl Iterator<Item = (ResidueId, &Residue)> {
    system
        .chains_iter()
        .flat_map(|(_, chain)| chain.residues().iter().copied())
        .filter_map(|id| system.residue(id).map(|residue| (id, residue)))
}

fn residue_label(system: &MolecularSystem, residue_id: ResidueId) -> String {
    let Some(residue) = system.residue(residue_id) else {
        return format!("{residue_id:?}");
    };
    let chain = system
        .chain(residue.chain_id)
        .map_or('?', |chain| chain.id);
    let insertion = residue.insertion_code.map(String::from).unwrap_or_default();
    format!(
        "{chain}:{}{insertion}:{}",
        residue.residue_number, residue.name
    )
}

fn atom_label(system: &MolecularSystem, atom_id: AtomId) -> String {
    match system.atom(atom_id) {
        Some(atom) => format!("{}:{}", residue_label(system, atom.residue_id), atom.name),
        None => format!("{atom_id:?}"),
    }
}
