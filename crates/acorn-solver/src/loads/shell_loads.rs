//! Load cases for patterned live load on a segmented shell.

use acorn_model::{Point3, ShellMesh, Vector3};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::pattern::{LoadPattern, PatternRule, classify_faces};
use crate::error::Result;

/// Partial safety factors applied at the ultimate limit state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadFactors {
    pub dead: f64,
    pub live: f64,
}

impl Default for LoadFactors {
    fn default() -> Self {
        Self {
            dead: 1.35,
            live: 1.50,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitState {
    /// Ultimate limit state, factored loads
    #[default]
    Uls,
    /// Serviceability limit state, characteristic loads
    Sls,
}

/// Area loads in kN/m2, acting downward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellLoadConfig {
    pub dead_load: f64,
    pub live_load: f64,
    pub limit_state: LimitState,
    pub factors: LoadFactors,
    pub rule: PatternRule,
}

impl Default for ShellLoadConfig {
    fn default() -> Self {
        Self {
            dead_load: 1.0,
            live_load: 2.0,
            limit_state: LimitState::Uls,
            factors: LoadFactors::default(),
            rule: PatternRule::Periodic,
        }
    }
}

impl ShellLoadConfig {
    fn dead_factor(&self) -> f64 {
        match self.limit_state {
            LimitState::Uls => self.factors.dead,
            LimitState::Sls => 1.0,
        }
    }

    fn live_factor(&self) -> f64 {
        match self.limit_state {
            LimitState::Uls => self.factors.live,
            LimitState::Sls => 1.0,
        }
    }
}

/// Uniform projected load on a whole mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeshLoad {
    pub mesh_index: usize,
    pub load: Vector3<f64>,
}

/// Per-face projected load on one mesh, zero on unloaded faces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceLoads {
    pub mesh_index: usize,
    pub loads: Vec<Vector3<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadCase {
    pub index: usize,
    pub pattern: LoadPattern,
    /// Self-weight multiplier as a gravity vector
    pub gravity: Vector3<f64>,
    pub dead_loads: Vec<MeshLoad>,
    pub live_loads: Vec<FaceLoads>,
    /// Centers of the faces carrying live load
    pub check_points: Vec<Point3<f64>>,
}

/// One load case per pattern: factored self weight, dead load on every
/// mesh, live load on the faces inside the pattern.
pub fn build_load_cases(
    meshes: &[ShellMesh],
    patterns: &[LoadPattern],
    config: &ShellLoadConfig,
) -> Result<Vec<LoadCase>> {
    let gravity = Vector3::new(0.0, 0.0, -config.dead_factor());
    let dead = Vector3::new(0.0, 0.0, -config.dead_load * config.dead_factor());
    let live = Vector3::new(0.0, 0.0, -config.live_load * config.live_factor());

    let mut cases = Vec::with_capacity(patterns.len());
    for (index, pattern) in patterns.iter().enumerate() {
        let classification = classify_faces(meshes, pattern, config.rule)?;
        let dead_loads = (0..meshes.len())
            .map(|mesh_index| MeshLoad {
                mesh_index,
                load: dead,
            })
            .collect();
        let live_loads = classification
            .loaded
            .iter()
            .enumerate()
            .map(|(mesh_index, flags)| FaceLoads {
                mesh_index,
                loads: flags
                    .iter()
                    .map(|&on| if on { live } else { Vector3::zeros() })
                    .collect(),
            })
            .collect();
        cases.push(LoadCase {
            index,
            pattern: *pattern,
            gravity,
            dead_loads,
            live_loads,
            check_points: classification.check_points,
        });
    }

    info!(
        cases = cases.len(),
        limit_state = ?config.limit_state,
        "built patterned load cases"
    );
    Ok(cases)
}
