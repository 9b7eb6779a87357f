//! Error types for autoguide.

use std::fmt;
use thiserror::Error;

/// Which half of the vertex-box computation failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexBoxStage {
    /// Extent query, min/max extraction or numeric normalization.
    Extraction,
    /// Building the 8 corner points from the normalized range.
    Corners,
}

impl fmt::Display for VertexBoxStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extraction => f.write_str("extracting extents"),
            Self::Corners => f.write_str("defining vertex points"),
        }
    }
}

/// Main error type for autoguide operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Source scene does not exist in the store
    #[error("The file: {0} does not exist")]
    SourceNotFound(String),

    /// Node path did not resolve
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// World-bound query failed
    #[error("Error computing extent of {path}: {source}")]
    ExtentComputation {
        path: String,
        #[source]
        source: Box<Error>,
    },

    /// Vertex box derivation failed
    #[error("Error in vertex box when {stage}: {source}")]
    VertexBox {
        stage: VertexBoxStage,
        #[source]
        source: Box<Error>,
    },

    /// Guide mesh assembly failed
    #[error("Error building guide mesh at {path}: {source}")]
    MeshBuild {
        path: String,
        #[source]
        source: Box<Error>,
    },

    /// Umbrella for pipeline failures
    #[error("Error generating guide: {source}")]
    GuideGeneration {
        #[source]
        source: Box<Error>,
    },

    /// Malformed scene document
    #[error("Parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// Type mismatch when reading or writing an attribute
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Malformed node path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Geometry that cannot be bounded
    #[error("Invalid geometry at {path}: {message}")]
    InvalidGeometry { path: String, message: String },

    /// Reference chain loops back on itself
    #[error("Reference cycle through {0}")]
    ReferenceCycle(String),

    /// Subtree has no geometry that passes the filters
    #[error("No renderable geometry under {0}")]
    EmptyBound(String),

    /// Stage is frozen and cannot be modified
    #[error("Stage {0} is frozen and cannot be modified")]
    Frozen(String),

    /// Configuration could not be loaded
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid geometry error.
    pub fn geometry(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn mismatch(expected: impl fmt::Display, actual: impl fmt::Display) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Walk the wrapping layers down to the innermost cause.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::ExtentComputation { source, .. }
            | Self::VertexBox { source, .. }
            | Self::MeshBuild { source, .. }
            | Self::GuideGeneration { source } => source.root_cause(),
            _ => self,
        }
    }
}

/// Result type alias for autoguide operations.
pub type Result<T> = std::result::Result<T, Error>;
