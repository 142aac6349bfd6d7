//! Variable shell thickness sampled per analysis element.
//!
//! Each face of the medial analysis mesh gets the distance between the top and
//! bottom surfaces measured vertically through its center, corrected by the
//! inclination of the face: `t = |z_top - z_bottom| * cos(angle(Z, normal))`.

use acorn_model::{Point3, ShellMesh, Vector3};
use tracing::debug;

use crate::error::{Result, SolverError};

/// Per-face thickness of every analysis mesh, in m.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementThickness {
    pub per_mesh: Vec<Vec<f64>>,
}

impl ElementThickness {
    pub fn min(&self) -> Option<f64> {
        self.per_mesh.iter().flatten().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.per_mesh.iter().flatten().copied().reduce(f64::max)
    }
}

fn nearest_vertical_hit(surface: &ShellMesh, at: &Point3<f64>) -> Option<f64> {
    surface
        .intersect_line(at, &Vector3::z())
        .into_iter()
        .min_by(|a, b| a.parameter.abs().total_cmp(&b.parameter.abs()))
        .map(|hit| hit.point.z)
}

pub fn element_thickness(
    analysis_meshes: &[ShellMesh],
    top: &ShellMesh,
    bottom: &ShellMesh,
) -> Result<ElementThickness> {
    let mut per_mesh = Vec::with_capacity(analysis_meshes.len());
    for (mesh_index, mesh) in analysis_meshes.iter().enumerate() {
        let mut values = Vec::with_capacity(mesh.face_count());
        for face in 0..mesh.face_count() {
            let center = mesh.face_center(face)?;
            let normal = mesh.face_normal(face)?;
            let missing = || SolverError::MissingSurfaceHit {
                mesh: mesh_index,
                face,
            };
            let z_top = nearest_vertical_hit(top, &center).ok_or_else(missing)?;
            let z_bottom = nearest_vertical_hit(bottom, &center).ok_or_else(missing)?;
            values.push((z_top - z_bottom).abs() * normal.z.abs());
        }
        per_mesh.push(values);
    }
    debug!(meshes = per_mesh.len(), "sampled element thickness");
    Ok(ElementThickness { per_mesh })
}

#[cfg(test)]
mod tests {
    use super::*;
    use acorn_model::MeshFace;
    use approx::assert_relative_eq;

    fn tilted_plate(z0: f64, slope: f64) -> ShellMesh {
        let mut mesh = ShellMesh::new();
        for (x, y) in [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)] {
            mesh.add_vertex(Point3::new(x, y, z0 + slope * x));
        }
        mesh.add_face(MeshFace::Quad([0, 1, 2, 3])).expect("face");
        mesh
    }

    #[test]
    fn flat_slab_thickness_is_vertical_gap() {
        let result = element_thickness(
            &[tilted_plate(0.1, 0.0)],
            &tilted_plate(0.2, 0.0),
            &tilted_plate(0.0, 0.0),
        )
        .expect("thickness");
        assert_relative_eq!(result.per_mesh[0][0], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn inclined_slab_is_corrected_by_normal() {
        let slope = 1.0;
        let result = element_thickness(
            &[tilted_plate(0.1, slope)],
            &tilted_plate(0.2, slope),
            &tilted_plate(0.0, slope),
        )
        .expect("thickness");
        let expected = 0.2 / 2.0_f64.sqrt();
        assert_relative_eq!(result.per_mesh[0][0], expected, epsilon = 1e-12);
        assert_eq!(result.min(), result.max());
    }

    #[test]
    fn face_outside_surfaces_is_reported() {
        let mut far = tilted_plate(0.1, 0.0);
        far.map_vertices(|p| Point3::new(p.x + 10.0, p.y, p.z));
        let err = element_thickness(&[far], &tilted_plate(0.2, 0.0), &tilted_plate(0.0, 0.0))
            .expect_err("no hit");
        assert!(matches!(err, SolverError::MissingSurfaceHit { mesh: 0, face: 0 }));
    }
}
