//! Segmentation lines and keystone from two families of stress lines.

use std::f64::consts::TAU;

use acorn_model::{Point3, Polyline, ShellMesh, Vector3, ZERO_TOLERANCE};
use serde::Serialize;
use tracing::debug;

use crate::error::{FabError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeystonePlan {
    /// One polyline per stress line through its sorted intersections
    pub segment_lines: Vec<Polyline>,
    /// Intersections along the first family, line by line
    pub intersections: Vec<Point3<f64>>,
    /// Closed polygon around the shell centroid
    pub keystone: Polyline,
}

/// Area-weighted centroid of the shell faces.
pub fn shell_centroid(shell: &ShellMesh) -> Option<Point3<f64>> {
    let mut weighted = Vector3::<f64>::zeros();
    let mut total = 0.0;
    for face in 0..shell.face_count() {
        let (Ok(center), Ok(area)) = (shell.face_center(face), shell.face_area(face)) else {
            continue;
        };
        weighted += center.coords * area;
        total += area;
    }
    (total > ZERO_TOLERANCE).then(|| Point3::from(weighted / total))
}

/// Point at a polyline parameter: integer part is the segment index.
fn polyline_point_at(line: &Polyline, parameter: f64) -> Option<Point3<f64>> {
    let last = line.segment_count().checked_sub(1)?;
    let index = (parameter.floor().max(0.0) as usize).min(last);
    line.segments()
        .nth(index)
        .map(|s| s.point_at(parameter - index as f64))
}

/// Plan intersection parameters between `a` and `b`, on each line.
fn crossings(a: &Polyline, b: &Polyline) -> Vec<(f64, f64)> {
    let mut out = Vec::new();
    for (i, sa) in a.segments().enumerate() {
        for (j, sb) in b.segments().enumerate() {
            if let Some((t, s)) = sa.intersect_xy(&sb) {
                out.push((i as f64 + t, j as f64 + s));
            }
        }
    }
    out
}

fn sorted_unique(mut parameters: Vec<f64>) -> Vec<f64> {
    parameters.sort_by(f64::total_cmp);
    parameters.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    parameters
}

fn plan_angle(centre: &Point3<f64>, p: &Point3<f64>) -> f64 {
    (p.y - centre.y).atan2(p.x - centre.x).rem_euclid(TAU)
}

/// Intersects the two stress line families in plan and builds the keystone
/// from the intersections closest to the shell centroid, one per boundary
/// edge, ordered counter-clockwise.
pub fn keystone_plan(
    shell: &ShellMesh,
    boundary: &Polyline,
    family1: &[Polyline],
    family2: &[Polyline],
) -> Result<KeystonePlan> {
    let centroid = shell_centroid(shell).ok_or(FabError::EmptyGeometry)?;

    let mut params1 = vec![Vec::new(); family1.len()];
    let mut params2 = vec![Vec::new(); family2.len()];
    for (i, a) in family1.iter().enumerate() {
        for (j, b) in family2.iter().enumerate() {
            for (pa, pb) in crossings(a, b) {
                params1[i].push(pa);
                params2[j].push(pb);
            }
        }
    }

    let mut segment_lines = Vec::with_capacity(family1.len() + family2.len());
    let mut intersections = Vec::new();
    for (line, params) in family1.iter().zip(params1) {
        let points: Vec<Point3<f64>> = sorted_unique(params)
            .into_iter()
            .filter_map(|t| polyline_point_at(line, t))
            .collect();
        intersections.extend(points.iter().copied());
        segment_lines.push(Polyline::new(points));
    }
    for (line, params) in family2.iter().zip(params2) {
        let points = sorted_unique(params)
            .into_iter()
            .filter_map(|t| polyline_point_at(line, t))
            .collect();
        segment_lines.push(Polyline::new(points));
    }

    let needed = boundary.segment_count();
    if intersections.len() < needed {
        return Err(FabError::InsufficientIntersections {
            needed,
            found: intersections.len(),
        });
    }
    let mut nearest = intersections.clone();
    nearest.sort_by(|a, b| (a - centroid).norm().total_cmp(&(b - centroid).norm()));
    nearest.truncate(needed);
    nearest.sort_by(|a, b| plan_angle(&centroid, a).total_cmp(&plan_angle(&centroid, b)));

    debug!(
        intersections = intersections.len(),
        keystone_corners = nearest.len(),
        "built keystone plan"
    );
    Ok(KeystonePlan {
        segment_lines,
        intersections,
        keystone: Polyline::closed(nearest),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use acorn_model::MeshFace;
    use approx::assert_relative_eq;

    fn plate() -> (ShellMesh, Polyline) {
        let corners = [(-2.0, -2.0), (2.0, -2.0), (2.0, 2.0), (-2.0, 2.0)];
        let mut mesh = ShellMesh::new();
        for (x, y) in corners {
            mesh.add_vertex(Point3::new(x, y, 0.0));
        }
        mesh.add_face(MeshFace::Quad([0, 1, 2, 3])).expect("face");
        let boundary =
            Polyline::closed(corners.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect());
        (mesh, boundary)
    }

    fn grid_lines(vertical: bool) -> Vec<Polyline> {
        [-1.5, -0.5, 0.5, 1.5]
            .iter()
            .map(|&c| {
                let (a, b) = if vertical {
                    (Point3::new(c, -2.0, 0.0), Point3::new(c, 2.0, 0.0))
                } else {
                    (Point3::new(-2.0, c, 0.0), Point3::new(2.0, c, 0.0))
                };
                Polyline::new(vec![a, b])
            })
            .collect()
    }

    #[test]
    fn grid_keystone_is_the_central_cell() {
        let (shell, boundary) = plate();
        let plan = keystone_plan(&shell, &boundary, &grid_lines(true), &grid_lines(false))
            .expect("plan");
        assert_eq!(plan.intersections.len(), 16);
        assert_eq!(plan.segment_lines.len(), 8);
        assert!(plan.segment_lines.iter().all(|l| l.points.len() == 4));

        let corners = plan.keystone.corners();
        assert!(plan.keystone.is_closed());
        assert_eq!(corners.len(), 4);
        let expected = [(0.5, 0.5), (-0.5, 0.5), (-0.5, -0.5), (0.5, -0.5)];
        for (p, (x, y)) in corners.iter().zip(expected) {
            assert_relative_eq!(p.x, x, epsilon = 1e-12);
            assert_relative_eq!(p.y, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn segment_lines_are_sorted_along_each_line() {
        let (shell, boundary) = plate();
        let plan = keystone_plan(&shell, &boundary, &grid_lines(true), &grid_lines(false))
            .expect("plan");
        let ys: Vec<f64> = plan.segment_lines[0].points.iter().map(|p| p.y).collect();
        assert!(ys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn too_few_crossings_are_reported() {
        let (shell, boundary) = plate();
        let err = keystone_plan(&shell, &boundary, &grid_lines(true)[..1], &grid_lines(false)[..2])
            .expect_err("two crossings for four edges");
        assert!(matches!(
            err,
            FabError::InsufficientIntersections { needed: 4, found: 2 }
        ));
    }
}
