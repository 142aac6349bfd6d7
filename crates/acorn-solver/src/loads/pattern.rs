//! Asymmetric angular live-load patterns.
//!
//! A pattern `(arc, offset)` loads the wedges `[offset + 2k*arc, offset +
//! 2k*arc + arc]` around the plan centroid of the shell. Faces are assigned
//! by the polar angle of their center.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use acorn_model::{Point3, ShellMesh};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SolverError};

/// Slack on wedge boundaries, in radians.
pub const ANGLE_TOLERANCE: f64 = 1e-9;

/// How angles near the 0/2pi seam are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternRule {
    /// Angle arithmetic modulo `2 * arc`.
    #[default]
    Periodic,
    /// Wedges are walked from `offset` up to 2pi, and angles up to
    /// `offset - arc` are admitted as the wrapped-around wedge.
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadPattern {
    pub arc: f64,
    pub offset: f64,
}

impl LoadPattern {
    pub fn new(arc: f64, offset: f64) -> Result<Self> {
        if !arc.is_finite() || arc <= 0.0 {
            return Err(SolverError::InvalidPattern(format!(
                "arc must be positive, got {arc}"
            )));
        }
        if !offset.is_finite() {
            return Err(SolverError::InvalidPattern(format!(
                "offset must be finite, got {offset}"
            )));
        }
        Ok(Self { arc, offset })
    }

    /// Production patterns 1 to 7: 1 loads nothing, 7 loads everything.
    pub fn predefined(number: u8) -> Result<Self> {
        let (arc, offset) = match number {
            1 => (TAU, TAU),
            2 => (PI, FRAC_PI_2),
            3 => (PI, FRAC_PI_4),
            4 => (FRAC_PI_2, FRAC_PI_2),
            5 => (FRAC_PI_2, FRAC_PI_4),
            6 => (FRAC_PI_4, 0.0),
            7 => (TAU, 0.0),
            _ => {
                return Err(SolverError::InvalidPattern(format!(
                    "no predefined pattern {number}, expected 1 to 7"
                )));
            }
        };
        Self::new(arc, offset)
    }

    /// Membership of a polar angle in `[0, 2pi)`. Wedge ends are closed,
    /// within [`ANGLE_TOLERANCE`]. A pattern whose first wedge starts at
    /// or beyond 2pi loads nothing under either rule.
    pub fn contains_angle(&self, angle: f64, rule: PatternRule) -> bool {
        if self.offset >= TAU - ANGLE_TOLERANCE {
            return false;
        }
        match rule {
            PatternRule::Periodic => {
                let period = 2.0 * self.arc;
                let r = (angle - self.offset).rem_euclid(period);
                r <= self.arc + ANGLE_TOLERANCE || r >= period - ANGLE_TOLERANCE
            }
            PatternRule::Legacy => {
                let mut start = self.offset;
                while start < TAU {
                    if (angle >= start - ANGLE_TOLERANCE
                        && angle <= start + self.arc + ANGLE_TOLERANCE)
                        || angle <= self.offset - self.arc + ANGLE_TOLERANCE
                    {
                        return true;
                    }
                    start += 2.0 * self.arc;
                }
                false
            }
        }
    }
}

/// Polar angle of `p` around `centre` in the XY plane, in `[0, 2pi)`.
pub fn polar_angle(centre: &Point3<f64>, p: &Point3<f64>) -> f64 {
    let angle = (p.y - centre.y).atan2(p.x - centre.x);
    if angle < 0.0 { angle + TAU } else { angle }
}

/// Per-face pattern membership of a multi-mesh shell.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternClassification {
    pub centroid: Point3<f64>,
    /// `loaded[mesh][face]`
    pub loaded: Vec<Vec<bool>>,
    /// Centers of loaded faces, mesh by mesh
    pub check_points: Vec<Point3<f64>>,
}

impl PatternClassification {
    pub fn loaded_count(&self) -> usize {
        self.loaded.iter().flatten().filter(|&&l| l).count()
    }
}

/// Classifies every face center against `pattern` around the center of
/// the union bounding box of `meshes`.
pub fn classify_faces(
    meshes: &[ShellMesh],
    pattern: &LoadPattern,
    rule: PatternRule,
) -> Result<PatternClassification> {
    let centroid = ShellMesh::union_bounding_box(meshes)
        .ok_or(SolverError::EmptyModel)?
        .center();

    let mut loaded = Vec::with_capacity(meshes.len());
    let mut check_points = Vec::new();
    for mesh in meshes {
        let mut flags = Vec::with_capacity(mesh.face_count());
        for center in mesh.face_centers() {
            let inside = pattern.contains_angle(polar_angle(&centroid, &center), rule);
            if inside {
                check_points.push(center);
            }
            flags.push(inside);
        }
        loaded.push(flags);
    }

    debug!(
        arc = pattern.arc,
        offset = pattern.offset,
        loaded = check_points.len(),
        "classified faces against load pattern"
    );
    Ok(PatternClassification {
        centroid,
        loaded,
        check_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use acorn_model::MeshFace;

    fn sample_angles() -> impl Iterator<Item = f64> {
        // Half-step offset keeps samples off every pi/4 boundary.
        (0..72).map(|i| (2.5 + 5.0 * i as f64).to_radians())
    }

    #[test]
    fn half_plane_pattern() {
        let pattern = LoadPattern::new(PI, 0.0).expect("valid");
        for rule in [PatternRule::Periodic, PatternRule::Legacy] {
            assert!(pattern.contains_angle(0.0, rule));
            assert!(pattern.contains_angle(FRAC_PI_2, rule));
            assert!(pattern.contains_angle(PI, rule));
            assert!(!pattern.contains_angle(PI + 0.01, rule));
            assert!(!pattern.contains_angle(TAU - 0.01, rule));
        }
    }

    #[test]
    fn periodic_rule_repeats_every_two_arcs() {
        let pattern = LoadPattern::new(FRAC_PI_4, 0.3).expect("valid");
        for angle in sample_angles() {
            let shifted = angle + 2.0 * pattern.arc;
            assert_eq!(
                pattern.contains_angle(angle, PatternRule::Periodic),
                pattern.contains_angle(shifted, PatternRule::Periodic)
            );
        }
    }

    fn seam_angles() -> impl Iterator<Item = f64> {
        (0..8).map(|i| i as f64 * FRAC_PI_4)
    }

    #[test]
    fn rules_agree_on_predefined_patterns() {
        for number in 1..=7 {
            let pattern = LoadPattern::predefined(number).expect("predefined");
            for angle in sample_angles().chain(seam_angles()) {
                assert_eq!(
                    pattern.contains_angle(angle, PatternRule::Periodic),
                    pattern.contains_angle(angle, PatternRule::Legacy),
                    "pattern {number} at {angle}"
                );
            }
        }
    }

    #[test]
    fn predefined_extremes_load_nothing_or_everything() {
        let none = LoadPattern::predefined(1).expect("predefined");
        let all = LoadPattern::predefined(7).expect("predefined");
        for angle in sample_angles().chain(seam_angles()) {
            for rule in [PatternRule::Periodic, PatternRule::Legacy] {
                assert!(!none.contains_angle(angle, rule), "pattern 1 at {angle}");
                assert!(all.contains_angle(angle, rule), "pattern 7 at {angle}");
            }
        }
        assert!(LoadPattern::predefined(8).is_err());
    }

    #[test]
    fn wedge_ends_are_closed_at_seams() {
        let quarter = LoadPattern::predefined(4).expect("predefined");
        for rule in [PatternRule::Periodic, PatternRule::Legacy] {
            assert!(quarter.contains_angle(0.0, rule));
            assert!(quarter.contains_angle(FRAC_PI_2, rule));
            assert!(quarter.contains_angle(PI, rule));
            assert!(!quarter.contains_angle(FRAC_PI_4, rule));
            assert!(quarter.contains_angle(7.0 * FRAC_PI_4, rule));
        }
    }

    /// Three quads along X with face centers on the X axis through the
    /// bounding box center; the middle center coincides with it.
    fn axis_strip() -> ShellMesh {
        let mut mesh = ShellMesh::new();
        for x in [-1.5, -0.5, 0.5, 1.5] {
            mesh.add_vertex(Point3::new(x, -0.5, 0.0));
            mesh.add_vertex(Point3::new(x, 0.5, 0.0));
        }
        for i in 0..3 {
            let a = 2 * i;
            mesh.add_face(MeshFace::Quad([a, a + 2, a + 3, a + 1])).expect("face");
        }
        mesh
    }

    #[test]
    fn empty_pattern_loads_no_face_on_the_seam() {
        let meshes = [axis_strip()];
        let none = LoadPattern::predefined(1).expect("predefined");
        let all = LoadPattern::predefined(7).expect("predefined");
        for rule in [PatternRule::Periodic, PatternRule::Legacy] {
            let empty = classify_faces(&meshes, &none, rule).expect("classified");
            assert_eq!(empty.loaded_count(), 0);
            assert!(empty.check_points.is_empty());
            let full = classify_faces(&meshes, &all, rule).expect("classified");
            assert_eq!(full.loaded_count(), 3);
        }
    }

    #[test]
    fn legacy_wraparound_overreaches_for_large_offsets() {
        let pattern = LoadPattern::new(FRAC_PI_4, PI).expect("valid");
        let angle = 3.0 * PI / 8.0;
        assert!(pattern.contains_angle(angle, PatternRule::Legacy));
        assert!(!pattern.contains_angle(angle, PatternRule::Periodic));
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        assert!(LoadPattern::new(0.0, 0.0).is_err());
        assert!(LoadPattern::new(-1.0, 0.0).is_err());
        assert!(LoadPattern::new(1.0, f64::NAN).is_err());
    }

    #[test]
    fn polar_angle_is_normalised() {
        let c = Point3::origin();
        assert!((polar_angle(&c, &Point3::new(0.0, -1.0, 0.0)) - 1.5 * PI).abs() < 1e-12);
        assert_eq!(polar_angle(&c, &Point3::new(1.0, 0.0, 5.0)), 0.0);
    }
}
