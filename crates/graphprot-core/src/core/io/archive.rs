use crate::core::graph::{GraphData, GraphError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Archive serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Group '{0}' already exists in the archive")]
    DuplicateGroup(String),
    #[error("Group '{group}' is inconsistent: {source}")]
    InvalidGroup { group: String, source: GraphError },
}

/// A collection of graphs keyed by query identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphArchive {
    graphs: BTreeMap<String, GraphData>,
}

impl GraphArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a graph under a new group name.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::DuplicateGroup`] if the name is taken, or
    /// [`ArchiveError::InvalidGroup`] if the graph tensors are inconsistent.
    pub fn insert(&mut self, group: impl Into<String>, graph: GraphData) -> Result<(), ArchiveError> {
        let group = group.into();
        if self.graphs.contains_key(&group) {
            return Err(ArchiveError::DuplicateGroup(group));
        }
        graph
            .validate()
            .map_err(|source| ArchiveError::InvalidGroup {
                group: group.clone(),
                source,
            })?;
        self.graphs.insert(group, graph);
        Ok(())
    }

    pub fn get(&self, group: &str) -> Option<&GraphData> {
        self.graphs.get(group)
    }

    /// Iterates over groups in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &GraphData)> {
        self.graphs.iter()
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Moves every group of `other` into this archive.
    ///
    /// Nothing is moved if any group name collides.
    pub fn merge(&mut self, other: GraphArchive) -> Result<(), ArchiveError> {
        if let Some(group) = other.graphs.keys().find(|g| self.graphs.contains_key(*g)) {
            return Err(ArchiveError::DuplicateGroup(group.clone()));
        }
        self.graphs.extend(other.graphs);
        Ok(())
    }

    /// Reads an archive from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not a valid archive or any group is inconsistent.
    pub fn read_from(reader: &mut impl BufRead) -> Result<Self, ArchiveError> {
        let archive: GraphArchive = serde_json::from_reader(reader)?;
        for (group, graph) in &archive.graphs {
            graph
                .validate()
                .map_err(|source| ArchiveError::InvalidGroup {
                    group: group.clone(),
                    source,
                })?;
        }
        Ok(archive)
    }

    pub fn write_to(&self, writer: &mut impl Write) -> Result<(), ArchiveError> {
        serde_json::to_writer(&mut *writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ArchiveError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
    }
}

/// Combines partial archives written by independent workers into one.
///
/// All inputs are read before anything is written. Partial archives are
/// deleted only after the merged archive has been written successfully, and
/// never when a partial path is the output path itself.
///
/// # Return
///
/// Returns the number of groups in the merged archive.
pub fn merge_archives<P: AsRef<Path>>(
    inputs: &[P],
    output: &Path,
    delete_partials: bool,
) -> Result<usize, ArchiveError> {
    let mut merged = GraphArchive::new();
    for input in inputs {
        let partial = GraphArchive::read_from_path(input)?;
        debug!(
            path = %input.as_ref().display(),
            groups = partial.len(),
            "Read partial archive."
        );
        merged.merge(partial)?;
    }

    merged.write_to_path(output)?;
    info!(
        partials = inputs.len(),
        groups = merged.len(),
        output = %output.display(),
        "Merged archives."
    );

    if delete_partials {
        for input in inputs {
            if input.as_ref() != output {
                fs::remove_file(input)?;
            }
        }
    }
    Ok(merged.len())
}
