//! Structural solver abstraction layer.
//!
//! The FEA engine is reached only through [`StressSource`] and
//! [`StructuralSolver`], so everything downstream can run against recorded
//! or mock backends.
//!
//! # Backends
//!
//! - **Recorded** (default): replays a JSON [`acorn_io::ModelSnapshot`].
//! - Live engines implement the same traits outside this crate.

pub mod recorded;
pub mod traits;

pub use recorded::{RecordedModel, RecordedSolver};
pub use traits::*;

/// Returns the default solver backend.
pub fn default_backend() -> RecordedSolver {
    RecordedSolver
}
