//! Geometry and mesh types for segmented concrete shells.

pub mod field;
pub mod geometry;
pub mod mesh;
pub mod units;

pub use field::PrincipalStressField;
pub use geometry::{
    BoundingBox, BoxFace, Interval, Line, OrientedBox, Plane, Polyline, Rectangle3,
    ZERO_TOLERANCE,
};
pub use mesh::{LineHit, MeshError, MeshFace, ShellMesh};
pub use nalgebra::{Point3, Vector3};
