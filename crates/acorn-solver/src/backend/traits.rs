//! Backend trait definitions for the external shell solver.
//!
//! The structural solver is opaque. These traits expose only what the
//! post-processing needs: the analysed meshes, a principal stress query per
//! layer and load case, and the analysis runs that produce a solved model.

use acorn_model::{PrincipalStressField, ShellMesh};
use serde::{Deserialize, Serialize};

/// Message of a solver call that did not complete.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendError(pub String);

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BackendError {}

impl From<String> for BackendError {
    fn from(s: String) -> Self {
        BackendError(s)
    }
}

impl From<&str> for BackendError {
    fn from(s: &str) -> Self {
        BackendError(s.to_string())
    }
}

/// Shell cross-section layer where stresses are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layer {
    Top,
    Bottom,
}

impl Layer {
    /// Layer offset in the solver convention (+1 top, -1 bottom).
    pub fn offset(self) -> f64 {
        match self {
            Layer::Top => 1.0,
            Layer::Bottom => -1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Layer::Top => "top",
            Layer::Bottom => "bottom",
        }
    }
}

/// Principal stress request for one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct StressQuery {
    pub load_case: usize,
    pub layer: Layer,
    /// Load case superposition factors
    pub superposition: Vec<f64>,
}

impl StressQuery {
    pub fn new(load_case: usize, layer: Layer) -> Self {
        Self {
            load_case,
            layer,
            superposition: vec![1.0],
        }
    }
}

/// A solved model the stress tools can read.
///
/// Stress entries must follow the concatenation of the faces of
/// [`StressSource::meshes`], mesh by mesh.
pub trait StressSource {
    fn meshes(&self) -> &[ShellMesh];

    fn load_case_count(&self) -> usize;

    fn principal_stresses(&self, query: &StressQuery) -> Result<PrincipalStressField, BackendError>;
}

/// Second-order (geometrically nonlinear) analysis controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondOrderConfig {
    /// Number of load increments, negative lets the solver choose
    pub load_increments: i32,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub use_displacement_control: bool,
}

impl Default for SecondOrderConfig {
    fn default() -> Self {
        Self {
            load_increments: -1,
            tolerance: 1e-7,
            max_iterations: 50,
            use_displacement_control: false,
        }
    }
}

/// Buckling eigen-analysis controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucklingConfig {
    pub from_mode: usize,
    pub mode_count: usize,
    pub max_iterations: usize,
    pub eps: f64,
    pub load_case_count: usize,
}

impl Default for BucklingConfig {
    fn default() -> Self {
        Self {
            from_mode: 1,
            mode_count: 1,
            max_iterations: 300,
            eps: 1e-7,
            load_case_count: 1,
        }
    }
}

/// Raw outcome of one solver run. Displacement in m.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutput {
    pub max_displacement: f64,
    pub messages: Vec<String>,
}

/// Buckling load factors as reported by the solver, any sign.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucklingOutput {
    pub load_factors: Vec<f64>,
    pub messages: Vec<String>,
}

/// Shell solver able to run the analysis stages.
pub trait StructuralSolver {
    type Model: StressSource + Clone;

    /// Solver name used in log records.
    fn name(&self) -> &str;

    fn analyze_first_order(
        &self,
        model: &Self::Model,
    ) -> Result<(Self::Model, RunOutput), BackendError>;

    fn analyze_second_order(
        &self,
        model: &Self::Model,
        config: &SecondOrderConfig,
    ) -> Result<(Self::Model, RunOutput), BackendError>;

    fn buckling_modes(
        &self,
        model: &Self::Model,
        config: &BucklingConfig,
    ) -> Result<(Self::Model, BucklingOutput), BackendError>;
}
