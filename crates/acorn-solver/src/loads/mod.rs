//! Patterned live loads.

pub mod pattern;
pub mod shell_loads;

pub use pattern::{LoadPattern, PatternClassification, PatternRule, classify_faces, polar_angle};
pub use shell_loads::{
    FaceLoads, LimitState, LoadCase, LoadFactors, MeshLoad, ShellLoadConfig, build_load_cases,
};
