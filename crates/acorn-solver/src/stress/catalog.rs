//! Per-element stress catalog built from a solved model.

use acorn_model::{Point3, PrincipalStressField, ShellMesh, Vector3};
use serde::Serialize;
use tracing::debug;

use crate::backend::{Layer, StressQuery, StressSource};
use crate::error::{Result, SolverError};

/// Principal stresses on one layer of a shell element, in kN/cm2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerStress {
    pub origin: Point3<f64>,
    pub principal1_dir: Vector3<f64>,
    pub principal1_val: f64,
    pub principal2_dir: Vector3<f64>,
    pub principal2_val: f64,
}

/// Stress state of one finite element, located by mesh and face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElementStressRecord {
    /// Running index over the faces of all meshes
    pub element_index: usize,
    pub mesh_index: usize,
    pub face_index: usize,
    pub top: LayerStress,
    pub bottom: LayerStress,
}

impl ElementStressRecord {
    fn values(&self) -> [f64; 4] {
        [
            self.top.principal1_val,
            self.top.principal2_val,
            self.bottom.principal1_val,
            self.bottom.principal2_val,
        ]
    }

    /// Most compressive principal value over both layers.
    pub fn max_compression(&self) -> f64 {
        self.values().into_iter().fold(f64::INFINITY, f64::min)
    }

    /// Most tensile principal value over both layers.
    pub fn max_tension(&self) -> f64 {
        self.values().into_iter().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Element stress records plus the meshes they refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct StressCatalog {
    pub records: Vec<ElementStressRecord>,
    pub meshes: Vec<ShellMesh>,
}

impl StressCatalog {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Zips top and bottom fields onto the faces of `meshes`.
    ///
    /// Stress entries are matched to faces by position: entry `i` belongs to
    /// the `i`-th face of the concatenated meshes.
    pub fn from_fields(
        meshes: Vec<ShellMesh>,
        top: &PrincipalStressField,
        bottom: &PrincipalStressField,
    ) -> Result<Self> {
        let n_top = top.aligned_len().ok_or(SolverError::MisalignedStressColumns {
            layer: Layer::Top.name(),
        })?;
        let n_bottom = bottom
            .aligned_len()
            .ok_or(SolverError::MisalignedStressColumns {
                layer: Layer::Bottom.name(),
            })?;
        let total_faces: usize = meshes.iter().map(ShellMesh::face_count).sum();
        if n_top != total_faces || n_bottom != total_faces {
            return Err(SolverError::ElementCountMismatch {
                meshes: total_faces,
                stresses: if n_top != total_faces { n_top } else { n_bottom },
            });
        }

        let locators = meshes
            .iter()
            .enumerate()
            .flat_map(|(m, mesh)| (0..mesh.face_count()).map(move |f| (m, f)));
        let records = locators
            .enumerate()
            .map(|(i, (mesh_index, face_index))| ElementStressRecord {
                element_index: i,
                mesh_index,
                face_index,
                top: layer_at(top, i),
                bottom: layer_at(bottom, i),
            })
            .collect::<Vec<_>>();

        debug!(
            elements = records.len(),
            meshes = meshes.len(),
            "built stress catalog"
        );
        Ok(Self { records, meshes })
    }

    /// Queries top and bottom stresses of `load_case` and builds the catalog.
    pub fn build(source: &impl StressSource, load_case: usize) -> Result<Self> {
        let top = source.principal_stresses(&StressQuery::new(load_case, Layer::Top))?;
        let bottom = source.principal_stresses(&StressQuery::new(load_case, Layer::Bottom))?;
        Self::from_fields(source.meshes().to_vec(), &top, &bottom)
    }
}

fn layer_at(field: &PrincipalStressField, i: usize) -> LayerStress {
    LayerStress {
        origin: field.origins[i],
        principal1_dir: field.principal1_dirs[i],
        principal1_val: field.principal1_values[i],
        principal2_dir: field.principal2_dirs[i],
        principal2_val: field.principal2_values[i],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acorn_model::MeshFace;
    use approx::assert_relative_eq;

    fn strip(faces: usize) -> ShellMesh {
        let mut mesh = ShellMesh::new();
        for i in 0..=faces {
            mesh.add_vertex(Point3::new(i as f64, 0.0, 0.0));
            mesh.add_vertex(Point3::new(i as f64, 1.0, 0.0));
        }
        for i in 0..faces {
            let a = 2 * i;
            mesh.add_face(MeshFace::Quad([a, a + 2, a + 3, a + 1])).expect("face");
        }
        mesh
    }

    fn field(values: &[f64]) -> PrincipalStressField {
        let mut field = PrincipalStressField::default();
        for (i, v) in values.iter().enumerate() {
            field.push(Point3::new(i as f64, 0.0, 0.0), Vector3::x(), *v, Vector3::y(), v - 1.0);
        }
        field
    }

    #[test]
    fn record_extrema_cover_both_layers() {
        let catalog = StressCatalog::from_fields(vec![strip(1)], &field(&[0.5]), &field(&[-0.2]))
            .expect("catalog");
        let record = catalog.records[0];
        assert_relative_eq!(record.max_compression(), -1.2);
        assert_relative_eq!(record.max_tension(), 0.5);
    }

    #[test]
    fn empty_meshes_are_skipped_when_assigning_faces() {
        let meshes = vec![strip(1), ShellMesh::new(), strip(2)];
        let values = [1.0, 2.0, 3.0];
        let catalog =
            StressCatalog::from_fields(meshes, &field(&values), &field(&values)).expect("catalog");
        let locators: Vec<_> = catalog
            .records
            .iter()
            .map(|r| (r.element_index, r.mesh_index, r.face_index))
            .collect();
        assert_eq!(locators, vec![(0, 0, 0), (1, 2, 0), (2, 2, 1)]);
    }

    #[test]
    fn count_mismatch_is_reported() {
        let err = StressCatalog::from_fields(vec![strip(2)], &field(&[1.0, 2.0]), &field(&[1.0]))
            .expect_err("bottom is short");
        assert!(matches!(
            err,
            SolverError::ElementCountMismatch {
                meshes: 2,
                stresses: 1
            }
        ));

        let mut bad = field(&[1.0, 2.0]);
        bad.principal1_dirs.pop();
        let err = StressCatalog::from_fields(vec![strip(2)], &bad, &field(&[1.0, 2.0]))
            .expect_err("ragged columns");
        assert!(matches!(err, SolverError::MisalignedStressColumns { layer: "top" }));
    }
}
