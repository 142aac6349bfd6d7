//! Structural post-processing for segmented concrete shells.
//!
//! Stresses come from a [`backend::StressSource`]; the [`stress`] module turns
//! them into a per-element catalog, extracts the extremal elements for a
//! percentile and probes the nearest element to a point. [`loads`] builds the
//! patterned live load cases, [`analysis`] drives a [`backend::StructuralSolver`]
//! through first/second-order and buckling runs.

pub mod analysis;
pub mod backend;
pub mod design_space;
pub mod error;
pub mod form_finding;
pub mod loads;
pub mod report;
pub mod section;
pub mod stress;

pub use analysis::{AnalysisConfig, AnalysisPipeline, AnalysisResults, AnalysisStage, SolverWarning};
pub use backend::{
    BackendError, Layer, RecordedModel, RecordedSolver, StressQuery, StressSource,
    StructuralSolver, default_backend,
};
pub use design_space::{DesignSpace, DesignTables, DesignVector};
pub use error::{Result, SolverError};
pub use form_finding::{FormFindConfig, FormFindRequest, FormFindResult, FormFinder, IgaEngine};
pub use loads::{LoadCase, LoadPattern, PatternRule, ShellLoadConfig, build_load_cases};
pub use report::{format_summary, save_stress_report, write_stress_report};
pub use section::{ElementThickness, element_thickness};
pub use stress::{
    ElementStressRecord, ExtremalSelection, Percentile, ProbeResult, StressCatalog, StressSummary,
    build_extremal_meshes, probe_nearest, select_extremes,
};
