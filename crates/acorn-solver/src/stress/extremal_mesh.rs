//! Display meshes rebuilt from a set of stress records.

use acorn_model::ShellMesh;

use super::catalog::ElementStressRecord;
use crate::error::{Result, SolverError};

/// One output mesh per source mesh holding only the faces named by
/// `records`. Unused vertices are dropped. Outputs may be empty.
pub fn build_extremal_meshes(
    meshes: &[ShellMesh],
    records: &[ElementStressRecord],
) -> Result<Vec<ShellMesh>> {
    let mut out: Vec<ShellMesh> = meshes.iter().map(ShellMesh::with_vertices_of).collect();

    for record in records {
        let out_of_range = SolverError::MeshIndexOutOfRange {
            mesh: record.mesh_index,
            face: record.face_index,
        };
        let Some(source) = meshes.get(record.mesh_index) else {
            return Err(out_of_range);
        };
        let face = *source.face(record.face_index).map_err(|_| out_of_range)?;
        out[record.mesh_index].add_face(face)?;
    }

    for mesh in &mut out {
        mesh.compute_normals();
        mesh.compact();
    }
    Ok(out)
}
