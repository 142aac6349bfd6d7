//! Error types for acorn-solver

use acorn_model::MeshError;
use thiserror::Error;

use crate::backend::BackendError;

pub type Result<T> = std::result::Result<T, SolverError>;

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("meshes have {meshes} faces but the solver returned {stresses} stress entries")]
    ElementCountMismatch { meshes: usize, stresses: usize },

    #[error("{layer} layer stress columns have different lengths")]
    MisalignedStressColumns { layer: &'static str },

    #[error("stress catalog is empty")]
    EmptyModel,

    #[error("percentile {0} outside [0, 100]")]
    PercentileOutOfRange(f64),

    #[error("extremal selection is empty")]
    EmptyResultSet,

    #[error("record refers to mesh {mesh} face {face} which does not exist")]
    MeshIndexOutOfRange { mesh: usize, face: usize },

    #[error("invalid load pattern: {0}")]
    InvalidPattern(String),

    #[error("{what} of vector {id} has {found} values, expected {expected}")]
    DimensionMismatch {
        id: usize,
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Cannot find component: {}", .0.join(", "))]
    MissingOperations(Vec<String>),

    #[error("operation {operation} returned an unexpected value: {message}")]
    UnexpectedOutput { operation: String, message: String },

    #[error("no surface hit below or above face {face} of mesh {mesh}")]
    MissingSurfaceHit { mesh: usize, face: usize },

    #[error("mesh error: {0}")]
    Mesh(#[from] MeshError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
