//! Persistence for solved shell models.
//!
//! A [`ModelSnapshot`] records the meshes and per-load-case principal stress
//! output of a structural solver so the post-processing tools can be run
//! again later, or in tests, without the solver.

pub mod error;
pub mod snapshot;

pub use error::{IoError, Result};
pub use snapshot::{
    AnalysisRecord, LoadCaseStresses, ModelSnapshot, SNAPSHOT_SCHEMA_VERSION, load_json,
    load_snapshot, save_json, save_snapshot,
};
