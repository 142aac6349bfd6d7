//! Element stress post-processing: catalog, extremal selection, extremal
//! meshes and the nearest-element probe.

pub mod catalog;
pub mod extremal;
pub mod extremal_mesh;
pub mod probe;

pub use catalog::{ElementStressRecord, LayerStress, StressCatalog};
pub use extremal::{ExtremalSelection, Percentile, StressSummary, select_extremes};
pub use extremal_mesh::build_extremal_meshes;
pub use probe::{ProbeResult, probe_nearest};
