//! Nearest-element stress probe.

use acorn_model::Point3;
use acorn_model::units::kn_per_cm2_to_mpa;
use serde::Serialize;

use super::catalog::{ElementStressRecord, StressCatalog};
use crate::error::{Result, SolverError};

/// Stresses of the element closest to a query point, in MPa.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbeResult {
    pub element_index: usize,
    pub mesh_index: usize,
    pub face_index: usize,
    pub distance: f64,
    pub element_center: Point3<f64>,
    pub top_principal1: f64,
    pub top_principal2: f64,
    pub bottom_principal1: f64,
    pub bottom_principal2: f64,
}

impl ProbeResult {
    fn from_record(record: &ElementStressRecord, distance: f64) -> Self {
        Self {
            element_index: record.element_index,
            mesh_index: record.mesh_index,
            face_index: record.face_index,
            distance,
            element_center: record.top.origin,
            top_principal1: kn_per_cm2_to_mpa(record.top.principal1_val),
            top_principal2: kn_per_cm2_to_mpa(record.top.principal2_val),
            bottom_principal1: kn_per_cm2_to_mpa(record.bottom.principal1_val),
            bottom_principal2: kn_per_cm2_to_mpa(record.bottom.principal2_val),
        }
    }
}

/// Element whose top-layer origin is closest to `point`. The first of
/// several equally close elements wins.
pub fn probe_nearest(catalog: &StressCatalog, point: &Point3<f64>) -> Result<ProbeResult> {
    let mut best: Option<(&ElementStressRecord, f64)> = None;
    for record in &catalog.records {
        let distance = (record.top.origin - point).norm();
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((record, distance));
        }
    }
    let (record, distance) = best.ok_or(SolverError::EmptyModel)?;
    Ok(ProbeResult::from_record(record, distance))
}
