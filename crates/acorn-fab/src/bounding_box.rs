//! Minimum-volume oriented bounding box of a shell segment.
//!
//! Brute force over rotations of the box frame at a fixed angular
//! resolution. Each round rotates about the current X, Y and Z axes in turn
//! (Z only for planar fitting) and keeps the best angle; volumes for all
//! candidate angles of one axis are evaluated in parallel.
//!
//! The winning box is re-oriented for fabrication: the lower of its two
//! largest faces becomes the base plane, normal pointing up.

use acorn_model::{OrientedBox, Plane, Point3, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FabError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxConfig {
    /// Angular step in degrees
    pub resolution_deg: f64,
    /// Also rotate about the in-plane axes
    pub rotate_3d: bool,
    pub iterations: usize,
}

impl Default for BoundingBoxConfig {
    fn default() -> Self {
        Self {
            resolution_deg: 10.0,
            rotate_3d: false,
            iterations: 1,
        }
    }
}

fn fitted(plane: Plane, points: &[Point3<f64>]) -> Result<OrientedBox> {
    OrientedBox::from_points(plane, points).ok_or(FabError::EmptyGeometry)
}

/// Best rotation of `plane` about `axis` through its origin.
fn best_rotation(
    plane: &Plane,
    axis: Vector3<f64>,
    step: f64,
    steps: usize,
    points: &[Point3<f64>],
) -> Option<(Plane, f64)> {
    let volumes: Vec<f64> = (0..steps)
        .into_par_iter()
        .map(|i| {
            let candidate = plane.rotated(i as f64 * step, axis, plane.origin);
            OrientedBox::from_points(candidate, points).map_or(f64::INFINITY, |b| b.volume())
        })
        .collect();
    let (best, volume) = volumes
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    Some((plane.rotated(best as f64 * step, axis, plane.origin), *volume))
}

/// Re-fits `bbox` in the plane of the lower of its two largest faces.
fn reorient(bbox: &OrientedBox, points: &[Point3<f64>]) -> Result<OrientedBox> {
    let mut faces = bbox.faces().to_vec();
    faces.sort_by(|a, b| b.area.total_cmp(&a.area));
    let base = faces[..2]
        .iter()
        .min_by(|a, b| a.plane.origin.z.total_cmp(&b.plane.origin.z))
        .map(|f| f.plane)
        .ok_or(FabError::EmptyGeometry)?;
    let base = if base.normal().z < 0.0 { base.flipped() } else { base };
    fitted(base, points)
}

/// Fits the minimum-volume box around `points`.
pub fn fit_bounding_box(points: &[Point3<f64>], config: &BoundingBoxConfig) -> Result<OrientedBox> {
    if points.is_empty() {
        return Err(FabError::EmptyGeometry);
    }
    if !(config.resolution_deg > 0.0 && config.resolution_deg <= 180.0) {
        return Err(FabError::InvalidResolution(config.resolution_deg));
    }
    let step = config.resolution_deg.to_radians();
    let steps = (180.0 / config.resolution_deg).ceil() as usize;

    let centroid = Point3::from(
        points.iter().fold(Vector3::<f64>::zeros(), |acc, p| acc + p.coords) / points.len() as f64,
    );
    let mut plane = Plane::world_xy().translated(centroid.coords);
    let mut volume = fitted(plane, points)?.volume();

    for _ in 0..config.iterations.max(1) {
        for _ in 0..2 {
            let axes = if config.rotate_3d {
                vec![plane.x_axis, plane.y_axis, plane.normal()]
            } else {
                vec![plane.normal()]
            };
            for axis in axes {
                if let Some((candidate, v)) = best_rotation(&plane, axis, step, steps, points)
                    && v < volume
                {
                    plane = candidate;
                    volume = v;
                }
            }
        }
    }
    debug!(volume, points = points.len(), "fitted bounding box");

    reorient(&fitted(plane, points)?, points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Corners of a 4 x 2 x 0.5 slab turned 30 degrees in plan.
    fn turned_slab() -> Vec<Point3<f64>> {
        let (s, c) = 30f64.to_radians().sin_cos();
        let mut points = Vec::new();
        for z in [1.0, 1.5] {
            for (x, y) in [(0.0, 0.0), (4.0, 0.0), (4.0, 2.0), (0.0, 2.0)] {
                points.push(Point3::new(c * x - s * y, s * x + c * y, z));
            }
        }
        points
    }

    #[test]
    fn planar_fit_finds_the_turned_slab() {
        let config = BoundingBoxConfig {
            resolution_deg: 1.0,
            ..Default::default()
        };
        let bbox = fit_bounding_box(&turned_slab(), &config).expect("box");
        assert_relative_eq!(bbox.volume(), 4.0, epsilon = 1e-9);
        assert!(bbox.plane.normal().z > 0.0);
        assert_relative_eq!(bbox.z.t0.min(bbox.z.t1), 0.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.point_at(0.5, 0.5, 0.0).z, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn spatial_fit_is_never_worse_than_axis_aligned() {
        let points = turned_slab();
        let aligned = OrientedBox::from_points(Plane::world_xy(), &points).expect("box");
        let config = BoundingBoxConfig {
            resolution_deg: 5.0,
            rotate_3d: true,
            iterations: 2,
        };
        let bbox = fit_bounding_box(&points, &config).expect("box");
        assert!(bbox.volume() <= aligned.volume() + 1e-9);
        assert!(bbox.plane.normal().z > 0.0);
    }

    #[test]
    fn invalid_input_is_rejected() {
        assert!(matches!(
            fit_bounding_box(&[], &BoundingBoxConfig::default()),
            Err(FabError::EmptyGeometry)
        ));
        let config = BoundingBoxConfig {
            resolution_deg: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            fit_bounding_box(&turned_slab(), &config),
            Err(FabError::InvalidResolution(_))
        ));
    }
}
