//! Interface springs between adjacent shell segments.
//!
//! Segment outlines are closed polygons. Every outline edge is divided into
//! spring locations; segments are shrunk by half the joint gap and each
//! location is pulled onto the shrunk outline of the segments it touches.
//! Edges shared by two segments get a spring line across the gap.

use acorn_model::{Line, Plane, Point3, Polyline};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FabError, Result};

/// Element identifier given to spring beams in the structural model.
pub const SPRING_ELEMENT_ID: &str = "ACORNSPRING";

const TRANSLATIONAL_STIFFNESS: f64 = 1.0e7;
const ROTATIONAL_STIFFNESS: f64 = 1.0e3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    /// Approximate spacing of springs along an edge, in m
    pub target_distance: f64,
    /// Joint width between segments, in m
    pub gap: f64,
    /// Distance below which edge end points are merged
    pub tolerance: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            target_distance: 0.5,
            gap: 0.005,
            tolerance: 1e-6,
        }
    }
}

/// Outline edge with the segments on either side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpringInterface {
    pub edge: Line,
    /// One entry for a free edge, two for a joint
    pub segments: Vec<usize>,
    pub locations: Vec<Point3<f64>>,
    /// Lines across the gap, joints only
    pub lines: Vec<Line>,
}

impl SpringInterface {
    pub fn is_joint(&self) -> bool {
        self.segments.len() == 2
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpringLayout {
    pub offset_segments: Vec<Polyline>,
    /// Spring locations pulled onto each offset segment
    pub segment_locations: Vec<Vec<Point3<f64>>>,
    pub interfaces: Vec<SpringInterface>,
    pub gap: f64,
}

impl SpringLayout {
    pub fn spring_lines(&self) -> impl Iterator<Item = &Line> {
        self.interfaces.iter().flat_map(|i| i.lines.iter())
    }
}

/// Six spring stiffnesses: translations X, Y, Z in kN/m, then rotations X,
/// Y, Z in kNm/rad. Y runs along the interface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringCrossSection {
    pub stiffness: [f64; 6],
}

impl SpringCrossSection {
    pub fn new(rotational_stiffness_y: f64) -> Self {
        Self {
            stiffness: [
                TRANSLATIONAL_STIFFNESS,
                TRANSLATIONAL_STIFFNESS,
                TRANSLATIONAL_STIFFNESS,
                ROTATIONAL_STIFFNESS,
                rotational_stiffness_y,
                ROTATIONAL_STIFFNESS,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpringElement {
    pub id: String,
    pub line: Line,
    pub cross_section: SpringCrossSection,
    /// Offset of the element axis from the line
    pub eccentricity: f64,
}

fn same_point(a: &Point3<f64>, b: &Point3<f64>, tolerance: f64) -> bool {
    (a - b).norm() <= tolerance
}

/// Unique outline edges and the segments using them.
fn collect_edges(segments: &[Polyline], tolerance: f64) -> Vec<(Line, Vec<usize>)> {
    let mut edges: Vec<(Line, Vec<usize>)> = Vec::new();
    for (s, outline) in segments.iter().enumerate() {
        for line in outline.segments() {
            let existing = edges.iter_mut().find(|(e, _)| {
                let forward = same_point(&e.from, &line.from, tolerance)
                    && same_point(&e.to, &line.to, tolerance);
                let backward = same_point(&e.from, &line.to, tolerance)
                    && same_point(&e.to, &line.from, tolerance);
                forward || backward
            });
            match existing {
                Some((_, owners)) => {
                    if !owners.contains(&s) {
                        owners.push(s);
                    }
                }
                None => edges.push((line, vec![s])),
            }
        }
    }
    edges
}

/// Lays out springs on the outlines of `segments`, measured in plan.
pub fn make_springs(segments: &[Polyline], config: &SpringConfig) -> Result<SpringLayout> {
    if !(config.target_distance > 0.0) {
        return Err(FabError::InvalidSpringDistance(config.target_distance));
    }
    if let Some(open) = segments.iter().position(|s| !s.is_closed()) {
        return Err(FabError::OpenSegment(open));
    }

    let plan = Plane::world_xy();
    let offset_segments: Vec<Polyline> = segments
        .iter()
        .map(|s| s.offset_in(&plan, config.gap / 2.0))
        .collect();

    let mut interfaces: Vec<SpringInterface> = collect_edges(segments, config.tolerance)
        .into_iter()
        .map(|(edge, owners)| {
            let count = (edge.length() / config.target_distance).ceil() as usize;
            SpringInterface {
                edge,
                segments: owners,
                locations: edge.divide(count),
                lines: Vec::new(),
            }
        })
        .collect();

    let mut segment_locations = vec![Vec::new(); segments.len()];
    for interface in &interfaces {
        for &s in &interface.segments {
            segment_locations[s].extend(
                interface
                    .locations
                    .iter()
                    .filter_map(|p| offset_segments[s].closest_point(p)),
            );
        }
    }

    for interface in interfaces.iter_mut().filter(|i| i.is_joint()) {
        let a = &offset_segments[interface.segments[0]];
        let b = &offset_segments[interface.segments[1]];
        interface.lines = interface
            .locations
            .iter()
            .filter_map(|p| Some(Line::new(a.closest_point(p)?, b.closest_point(p)?)))
            .collect();
    }

    let joints = interfaces.iter().filter(|i| i.is_joint()).count();
    debug!(
        segments = segments.len(),
        edges = interfaces.len(),
        joints,
        "laid out interface springs"
    );
    Ok(SpringLayout {
        offset_segments,
        segment_locations,
        interfaces,
        gap: config.gap,
    })
}

/// One spring beam per spring line, offset by half the gap.
pub fn spring_elements(
    layout: &SpringLayout,
    cross_section: &SpringCrossSection,
) -> Vec<SpringElement> {
    layout
        .spring_lines()
        .map(|line| SpringElement {
            id: SPRING_ELEMENT_ID.to_string(),
            line: *line,
            cross_section: *cross_section,
            eccentricity: layout.gap / 2.0,
        })
        .collect()
}
