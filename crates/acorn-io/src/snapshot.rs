use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use acorn_model::{PrincipalStressField, ShellMesh};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{IoError, Result};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Top and bottom layer stresses of one load case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadCaseStresses {
    pub name: String,
    pub top: PrincipalStressField,
    pub bottom: PrincipalStressField,
}

/// Outcome of one recorded analysis run. Displacements in m.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub max_displacement: f64,
    #[serde(default)]
    pub messages: Vec<String>,
}

/// Everything needed to replay a solved shell model without the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub schema_version: u32,
    pub meshes: Vec<ShellMesh>,
    pub load_cases: Vec<LoadCaseStresses>,
    #[serde(default)]
    pub first_order: Option<AnalysisRecord>,
    #[serde(default)]
    pub second_order: Option<AnalysisRecord>,
    #[serde(default)]
    pub buckling_factors: Vec<f64>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Default for ModelSnapshot {
    fn default() -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            meshes: Vec::new(),
            load_cases: Vec::new(),
            first_order: None,
            second_order: None,
            buckling_factors: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }
}

impl ModelSnapshot {
    pub fn validate(&self) -> Result<()> {
        if self.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(IoError::UnsupportedSchema {
                found: self.schema_version,
                expected: SNAPSHOT_SCHEMA_VERSION,
            });
        }
        for (mesh, m) in self.meshes.iter().enumerate() {
            m.validate()
                .map_err(|source| IoError::InvalidMesh { mesh, source })?;
        }
        Ok(())
    }

    pub fn total_faces(&self) -> usize {
        self.meshes.iter().map(ShellMesh::face_count).sum()
    }
}

/// Writes any serializable value as pretty JSON, creating parent directories.
pub fn save_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(path, bytes)?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn save_snapshot(path: impl AsRef<Path>, snapshot: &ModelSnapshot) -> Result<()> {
    save_json(path, snapshot)
}

/// Loads and validates a snapshot.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<ModelSnapshot> {
    let snapshot: ModelSnapshot = load_json(path)?;
    snapshot.validate()?;
    Ok(snapshot)
}
