//! Polygon meshes for shell surfaces.
//!
//! A [`ShellMesh`] is the display and analysis geometry of one shell segment:
//! a shared vertex list and triangle or quad faces referring into it. Multi
//! segment shells are handled as `Vec<ShellMesh>` and addressed by
//! `(mesh_index, face_index)`.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{BoundingBox, ZERO_TOLERANCE};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("face {face} references vertex {vertex} but the mesh has {count} vertices")]
    VertexIndexOutOfRange {
        face: usize,
        vertex: usize,
        count: usize,
    },

    #[error("face {face} out of range for mesh with {count} faces")]
    FaceIndexOutOfRange { face: usize, count: usize },

    #[error("face repeats vertex {0}")]
    DegenerateFace(usize),
}

/// Face connectivity. Quads are assumed planar enough to split along 0-2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshFace {
    Triangle([usize; 3]),
    Quad([usize; 4]),
}

impl MeshFace {
    pub fn indices(&self) -> &[usize] {
        match self {
            MeshFace::Triangle(v) => v,
            MeshFace::Quad(v) => v,
        }
    }

    pub fn is_quad(&self) -> bool {
        matches!(self, MeshFace::Quad(_))
    }

    /// Fan triangles covering the face.
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        match *self {
            MeshFace::Triangle(t) => vec![t],
            MeshFace::Quad([a, b, c, d]) => vec![[a, b, c], [a, c, d]],
        }
    }

    fn remapped(&self, map: &[usize]) -> MeshFace {
        match *self {
            MeshFace::Triangle([a, b, c]) => MeshFace::Triangle([map[a], map[b], map[c]]),
            MeshFace::Quad([a, b, c, d]) => MeshFace::Quad([map[a], map[b], map[c], map[d]]),
        }
    }
}

/// Hit of an infinite line with a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineHit {
    /// Parameter along the line direction (negative behind the origin).
    pub parameter: f64,
    pub point: Point3<f64>,
    pub face_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShellMesh {
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<MeshFace>,
    /// Unit face normals, filled by [`ShellMesh::compute_normals`].
    #[serde(default)]
    pub face_normals: Vec<Vector3<f64>>,
}

impl ShellMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty mesh sharing the vertex list of `source`.
    pub fn with_vertices_of(source: &ShellMesh) -> Self {
        Self {
            vertices: source.vertices.clone(),
            faces: Vec::new(),
            face_normals: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn add_vertex(&mut self, p: Point3<f64>) -> usize {
        self.vertices.push(p);
        self.vertices.len() - 1
    }

    /// Appends a face after checking its vertex references.
    pub fn add_face(&mut self, face: MeshFace) -> Result<usize, MeshError> {
        let index = self.faces.len();
        let indices = face.indices();
        for (i, &v) in indices.iter().enumerate() {
            if v >= self.vertices.len() {
                return Err(MeshError::VertexIndexOutOfRange {
                    face: index,
                    vertex: v,
                    count: self.vertices.len(),
                });
            }
            if indices[..i].contains(&v) {
                return Err(MeshError::DegenerateFace(v));
            }
        }
        self.faces.push(face);
        self.face_normals.clear();
        Ok(index)
    }

    /// Checks every face reference, for meshes that did not come through
    /// [`ShellMesh::add_face`].
    pub fn validate(&self) -> Result<(), MeshError> {
        for (index, face) in self.faces.iter().enumerate() {
            if let Some(&vertex) = face.indices().iter().find(|&&v| v >= self.vertices.len()) {
                return Err(MeshError::VertexIndexOutOfRange {
                    face: index,
                    vertex,
                    count: self.vertices.len(),
                });
            }
        }
        Ok(())
    }

    pub fn face(&self, index: usize) -> Result<&MeshFace, MeshError> {
        self.faces.get(index).ok_or(MeshError::FaceIndexOutOfRange {
            face: index,
            count: self.faces.len(),
        })
    }

    pub fn face_points(&self, index: usize) -> Result<Vec<Point3<f64>>, MeshError> {
        Ok(self
            .face(index)?
            .indices()
            .iter()
            .map(|&v| self.vertices[v])
            .collect())
    }

    /// Vertex average of the face.
    pub fn face_center(&self, index: usize) -> Result<Point3<f64>, MeshError> {
        let pts = self.face_points(index)?;
        let sum = pts.iter().fold(Vector3::<f64>::zeros(), |acc, p| acc + p.coords);
        Ok(Point3::from(sum / pts.len() as f64))
    }

    pub fn face_centers(&self) -> Vec<Point3<f64>> {
        (0..self.faces.len())
            .filter_map(|i| self.face_center(i).ok())
            .collect()
    }

    /// Newell normal of the face, unit length (zero for degenerate faces).
    pub fn face_normal(&self, index: usize) -> Result<Vector3<f64>, MeshError> {
        let pts = self.face_points(index)?;
        let mut n = Vector3::<f64>::zeros();
        for (i, a) in pts.iter().enumerate() {
            let b = pts[(i + 1) % pts.len()];
            n.x += (a.y - b.y) * (a.z + b.z);
            n.y += (a.z - b.z) * (a.x + b.x);
            n.z += (a.x - b.x) * (a.y + b.y);
        }
        Ok(n.try_normalize(ZERO_TOLERANCE).unwrap_or_else(Vector3::zeros))
    }

    pub fn face_area(&self, index: usize) -> Result<f64, MeshError> {
        let face = self.face(index)?;
        Ok(face
            .triangles()
            .iter()
            .map(|&[a, b, c]| {
                let (pa, pb, pc) = (self.vertices[a], self.vertices[b], self.vertices[c]);
                0.5 * (pb - pa).cross(&(pc - pa)).norm()
            })
            .sum())
    }

    pub fn area(&self) -> f64 {
        (0..self.faces.len())
            .filter_map(|i| self.face_area(i).ok())
            .sum()
    }

    pub fn compute_normals(&mut self) {
        self.face_normals = (0..self.faces.len())
            .map(|i| self.face_normal(i).unwrap_or_else(|_| Vector3::zeros()))
            .collect();
    }

    /// Drops vertices no face refers to and renumbers the faces.
    pub fn compact(&mut self) {
        let mut used = vec![false; self.vertices.len()];
        for face in &self.faces {
            for &v in face.indices() {
                used[v] = true;
            }
        }
        let mut map = vec![usize::MAX; self.vertices.len()];
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for (old, keep) in used.iter().enumerate() {
            if *keep {
                map[old] = vertices.len();
                vertices.push(self.vertices[old]);
            }
        }
        self.vertices = vertices;
        self.faces = self.faces.iter().map(|f| f.remapped(&map)).collect();
    }

    /// Copy with every quad split into two triangles.
    pub fn triangulated(&self) -> ShellMesh {
        let mut mesh = ShellMesh::with_vertices_of(self);
        mesh.faces = self
            .faces
            .iter()
            .flat_map(|f| f.triangles())
            .map(MeshFace::Triangle)
            .collect();
        mesh.compute_normals();
        mesh
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.vertices)
    }

    /// Union box of several meshes, `None` when all are empty.
    pub fn union_bounding_box(meshes: &[ShellMesh]) -> Option<BoundingBox> {
        meshes
            .iter()
            .filter_map(ShellMesh::bounding_box)
            .reduce(|a, b| a.union(&b))
    }

    /// Appends `other`, offsetting its vertex references.
    pub fn append(&mut self, other: &ShellMesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        let map: Vec<usize> = (0..other.vertices.len()).map(|i| i + offset).collect();
        self.faces.extend(other.faces.iter().map(|f| f.remapped(&map)));
        self.face_normals.clear();
    }

    pub fn map_vertices(&mut self, f: impl Fn(&Point3<f64>) -> Point3<f64>) {
        for v in &mut self.vertices {
            *v = f(v);
        }
        if !self.face_normals.is_empty() {
            self.compute_normals();
        }
    }

    /// All intersections of the infinite line `origin + t * direction` with
    /// the mesh, sorted by `t`.
    pub fn intersect_line(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Vec<LineHit> {
        let mut hits = Vec::new();
        for (face_index, face) in self.faces.iter().enumerate() {
            for [a, b, c] in face.triangles() {
                if let Some(t) = intersect_triangle(
                    origin,
                    direction,
                    &self.vertices[a],
                    &self.vertices[b],
                    &self.vertices[c],
                ) {
                    hits.push(LineHit {
                        parameter: t,
                        point: origin + direction * t,
                        face_index,
                    });
                    break;
                }
            }
        }
        hits.sort_by(|a, b| a.parameter.total_cmp(&b.parameter));
        hits
    }
}

/// Moller-Trumbore without a range restriction on `t`.
fn intersect_triangle(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Option<f64> {
    let e1 = b - a;
    let e2 = c - a;
    let p = direction.cross(&e2);
    let det = e1.dot(&p);
    if det.abs() < 1e-12 {
        return None;
    }
    let inv = 1.0 / det;
    let s = origin - a;
    let u = s.dot(&p) * inv;
    if !(-1e-9..=1.0 + 1e-9).contains(&u) {
        return None;
    }
    let q = s.cross(&e1);
    let v = direction.dot(&q) * inv;
    if v < -1e-9 || u + v > 1.0 + 1e-9 {
        return None;
    }
    Some(e2.dot(&q) * inv)
}
