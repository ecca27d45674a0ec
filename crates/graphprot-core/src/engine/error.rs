use thiserror::Error;

use super::clustering::ClusteringError;
use super::config::{ConfigError, ResidueSpecifier};
use super::pooling::PoolingError;
use crate::core::contacts::ContactError;
use crate::core::features::FeatureError;
use crate::core::forcefield::energy::EnergyError;
use crate::core::forcefield::parameterization::ParameterizationError;
use crate::core::forcefield::params::ParamLoadError;
use crate::core::graph::GraphError;
use crate::core::io::archive::ArchiveError;

/// Broad category of a failure, used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid settings: unknown method, bad parameter, missing value.
    Configuration,
    /// The input data cannot be processed: missing coordinates or parameters.
    Data,
    /// Tensors or graphs whose parts disagree with each other.
    StructuralConsistency,
    Io,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Residue not found in system: {spec:?}")]
    ResidueNotFound { spec: ResidueSpecifier },

    #[error("Force-field parameters could not be loaded: {0}")]
    Parameters(#[from] ParamLoadError),

    #[error("Parameterization failed: {0}")]
    Parameterization(#[from] ParameterizationError),

    #[error("Contact evaluation failed: {0}")]
    Contact(#[from] ContactError),

    #[error("Feature computation failed: {0}")]
    Feature(#[from] FeatureError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Community detection failed: {0}")]
    Clustering(#[from] ClusteringError),

    #[error("Pooling failed: {0}")]
    Pooling(#[from] PoolingError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Config(_) => ErrorKind::Configuration,
            EngineError::ResidueNotFound { .. } => ErrorKind::Data,
            EngineError::Parameters(_) => ErrorKind::Io,
            EngineError::Parameterization(_) => ErrorKind::Data,
            EngineError::Contact(e) => contact_kind(e),
            EngineError::Feature(FeatureError::Contact(e)) => contact_kind(e),
            EngineError::Feature(FeatureError::Graph(_)) | EngineError::Graph(_) => {
                ErrorKind::StructuralConsistency
            }
            EngineError::Clustering(e) => match e {
                ClusteringError::UnsupportedMethod(_) | ClusteringError::InvalidParameter { .. } => {
                    ErrorKind::Configuration
                }
                ClusteringError::InvalidWeight { .. } => ErrorKind::Data,
                ClusteringError::NodeIndexOutOfRange { .. }
                | ClusteringError::WeightCountMismatch { .. }
                | ClusteringError::BatchLengthMismatch { .. }
                | ClusteringError::CrossBatchEdge { .. } => ErrorKind::StructuralConsistency,
            },
            EngineError::Pooling(_) => ErrorKind::StructuralConsistency,
            EngineError::Archive(e) => match e {
                ArchiveError::Io(_) | ArchiveError::Json(_) => ErrorKind::Io,
                ArchiveError::DuplicateGroup(_) => ErrorKind::Data,
                ArchiveError::InvalidGroup { .. } => ErrorKind::StructuralConsistency,
            },
        }
    }
}

fn contact_kind(error: &ContactError) -> ErrorKind {
    match error {
        ContactError::InvalidCutoff(_) => ErrorKind::Configuration,
        ContactError::Energy(
            EnergyError::InvalidDielectric(_) | EnergyError::InvalidScreeningCutoff(_),
        ) => ErrorKind::Configuration,
        _ => ErrorKind::Data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_method_is_a_configuration_error() {
        let error: EngineError = ClusteringError::UnsupportedMethod("spectral".into()).into();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn missing_coordinates_are_a_data_error() {
        let error: EngineError =
            FeatureError::Contact(ContactError::Energy(EnergyError::MissingPosition(7))).into();
        assert_eq!(error.kind(), ErrorKind::Data);
    }

    #[test]
    fn shape_problems_are_structural() {
        let error: EngineError = PoolingError::ClusterLengthMismatch {
            expected: 3,
            found: 2,
        }
        .into();
        assert_eq!(error.kind(), ErrorKind::StructuralConsistency);

        let error: EngineError = GraphError::CrossBatchEdge { edge: 0 }.into();
        assert_eq!(error.kind(), ErrorKind::StructuralConsistency);
    }
}
