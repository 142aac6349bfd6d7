//! Error types for acorn-fab

use acorn_model::MeshError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FabError>;

#[derive(Error, Debug)]
pub enum FabError {
    #[error("no geometry to fit")]
    EmptyGeometry,

    #[error("angular resolution must be in (0, 180] degrees, got {0}")]
    InvalidResolution(f64),

    #[error("module size must be positive, got {width} x {depth}")]
    InvalidModuleSize { width: f64, depth: f64 },

    #[error("maximum pin length must be positive, got {0}")]
    InvalidPinLength(f64),

    #[error("spring distance must be positive, got {0}")]
    InvalidSpringDistance(f64),

    #[error("segment {0} outline is not a closed polygon")]
    OpenSegment(usize),

    #[error("no modules given")]
    NoModules,

    #[error("keystone needs {needed} stress line intersections, found {found}")]
    InsufficientIntersections { needed: usize, found: usize },

    #[error("mesh error: {0}")]
    Mesh(#[from] MeshError),
}
