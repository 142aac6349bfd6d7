//! Euclidean geometry primitives shared by the analysis and fabrication crates.
//!
//! Everything here is plain nalgebra arithmetic: planes are orthonormal frames,
//! boxes are intervals measured in a frame, polylines are point lists.

use nalgebra::{Point2, Point3, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};

/// Absolute tolerance used for degeneracy checks.
pub const ZERO_TOLERANCE: f64 = 1e-9;

/// Closed numeric interval `[t0, t1]`. May be decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub t0: f64,
    pub t1: f64,
}

impl Interval {
    pub fn new(t0: f64, t1: f64) -> Self {
        Self { t0, t1 }
    }

    /// Smallest interval containing every value, `None` for an empty input.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut iter = values.into_iter();
        let first = iter.next()?;
        let mut interval = Self::new(first, first);
        for value in iter {
            interval.grow(value);
        }
        Some(interval)
    }

    pub fn grow(&mut self, value: f64) {
        if value < self.t0 {
            self.t0 = value;
        }
        if value > self.t1 {
            self.t1 = value;
        }
    }

    pub fn length(&self) -> f64 {
        self.t1 - self.t0
    }

    pub fn mid(&self) -> f64 {
        0.5 * (self.t0 + self.t1)
    }

    /// Parameter at normalized position `t` (0 gives `t0`, 1 gives `t1`).
    pub fn parameter_at(&self, t: f64) -> f64 {
        self.t0 + t * self.length()
    }

    pub fn includes(&self, value: f64) -> bool {
        let (lo, hi) = if self.t0 <= self.t1 {
            (self.t0, self.t1)
        } else {
            (self.t1, self.t0)
        };
        value >= lo && value <= hi
    }
}

/// Axis-aligned bounding box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bbox.include(p);
        }
        Some(bbox)
    }

    pub fn include(&mut self, p: &Point3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn diagonal(&self) -> Vector3<f64> {
        self.max - self.min
    }
}

/// Right-handed orthonormal frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3<f64>,
    pub x_axis: Vector3<f64>,
    pub y_axis: Vector3<f64>,
}

impl Plane {
    pub fn world_xy() -> Self {
        Self {
            origin: Point3::origin(),
            x_axis: Vector3::x(),
            y_axis: Vector3::y(),
        }
    }

    /// Builds a frame from two in-plane directions. The y direction is
    /// re-orthogonalized against x. Returns `None` when the directions are
    /// parallel or zero.
    pub fn new(origin: Point3<f64>, x_dir: Vector3<f64>, y_dir: Vector3<f64>) -> Option<Self> {
        let x_axis = x_dir.try_normalize(ZERO_TOLERANCE)?;
        let y_perp = y_dir - x_axis * y_dir.dot(&x_axis);
        let y_axis = y_perp.try_normalize(ZERO_TOLERANCE)?;
        Some(Self {
            origin,
            x_axis,
            y_axis,
        })
    }

    /// Frame with the given normal and an arbitrary but stable x axis.
    pub fn from_normal(origin: Point3<f64>, normal: Vector3<f64>) -> Option<Self> {
        let n = normal.try_normalize(ZERO_TOLERANCE)?;
        let helper = if n.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let x_dir = helper - n * helper.dot(&n);
        let x_axis = x_dir.try_normalize(ZERO_TOLERANCE)?;
        Some(Self {
            origin,
            x_axis,
            y_axis: n.cross(&x_axis),
        })
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.x_axis.cross(&self.y_axis)
    }

    pub fn point_at(&self, u: f64, v: f64, w: f64) -> Point3<f64> {
        self.origin + self.x_axis * u + self.y_axis * v + self.normal() * w
    }

    /// Coordinates of `p` in this frame.
    pub fn local(&self, p: &Point3<f64>) -> Vector3<f64> {
        let d = p - self.origin;
        Vector3::new(d.dot(&self.x_axis), d.dot(&self.y_axis), d.dot(&self.normal()))
    }

    pub fn local_2d(&self, p: &Point3<f64>) -> Point2<f64> {
        let l = self.local(p);
        Point2::new(l.x, l.y)
    }

    pub fn project(&self, p: &Point3<f64>) -> Point3<f64> {
        let l = self.local(p);
        self.point_at(l.x, l.y, 0.0)
    }

    pub fn translated(&self, offset: Vector3<f64>) -> Self {
        Self {
            origin: self.origin + offset,
            ..*self
        }
    }

    /// Rotates the frame about `axis` through `center`. A zero axis leaves the
    /// frame unchanged.
    pub fn rotated(&self, angle: f64, axis: Vector3<f64>, center: Point3<f64>) -> Self {
        let Some(axis) = Unit::try_new(axis, ZERO_TOLERANCE) else {
            return *self;
        };
        let rotation = Rotation3::from_axis_angle(&axis, angle);
        Self {
            origin: center + rotation * (self.origin - center),
            x_axis: rotation * self.x_axis,
            y_axis: rotation * self.y_axis,
        }
    }

    /// Swaps the in-plane axes, which reverses the normal.
    pub fn flipped(&self) -> Self {
        Self {
            origin: self.origin,
            x_axis: self.y_axis,
            y_axis: self.x_axis,
        }
    }
}

/// One face of an [`OrientedBox`]; the plane normal points outward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxFace {
    pub plane: Plane,
    pub area: f64,
}

/// Box whose edges follow the axes of `plane`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    pub plane: Plane,
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl OrientedBox {
    /// Tightest box around `points` aligned with `plane`.
    pub fn from_points<'a>(
        plane: Plane,
        points: impl IntoIterator<Item = &'a Point3<f64>>,
    ) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = plane.local(iter.next()?);
        let mut x = Interval::new(first.x, first.x);
        let mut y = Interval::new(first.y, first.y);
        let mut z = Interval::new(first.z, first.z);
        for p in iter {
            let l = plane.local(p);
            x.grow(l.x);
            y.grow(l.y);
            z.grow(l.z);
        }
        Some(Self { plane, x, y, z })
    }

    pub fn volume(&self) -> f64 {
        (self.x.length() * self.y.length() * self.z.length()).abs()
    }

    /// Point at normalized box coordinates, `(0.5, 0.5, 0.0)` is the base center.
    pub fn point_at(&self, tx: f64, ty: f64, tz: f64) -> Point3<f64> {
        self.plane.point_at(
            self.x.parameter_at(tx),
            self.y.parameter_at(ty),
            self.z.parameter_at(tz),
        )
    }

    pub fn center(&self) -> Point3<f64> {
        self.point_at(0.5, 0.5, 0.5)
    }

    /// Faces in the order +X, -X, +Y, -Y, +Z, -Z.
    pub fn faces(&self) -> [BoxFace; 6] {
        let (ex, ey, ez) = (self.plane.x_axis, self.plane.y_axis, self.plane.normal());
        let (lx, ly, lz) = (self.x.length(), self.y.length(), self.z.length());
        let face = |center: Point3<f64>, a: Vector3<f64>, b: Vector3<f64>, area: f64| BoxFace {
            plane: Plane {
                origin: center,
                x_axis: a,
                y_axis: b,
            },
            area: area.abs(),
        };
        [
            face(self.point_at(1.0, 0.5, 0.5), ey, ez, ly * lz),
            face(self.point_at(0.0, 0.5, 0.5), ez, ey, ly * lz),
            face(self.point_at(0.5, 1.0, 0.5), ez, ex, lx * lz),
            face(self.point_at(0.5, 0.0, 0.5), ex, ez, lx * lz),
            face(self.point_at(0.5, 0.5, 1.0), ex, ey, lx * ly),
            face(self.point_at(0.5, 0.5, 0.0), ey, ex, lx * ly),
        ]
    }
}

/// Planar rectangle measured in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle3 {
    pub plane: Plane,
    pub x: Interval,
    pub y: Interval,
}

impl Rectangle3 {
    pub fn new(plane: Plane, width: f64, height: f64) -> Self {
        Self {
            plane,
            x: Interval::new(0.0, width),
            y: Interval::new(0.0, height),
        }
    }

    pub fn width(&self) -> f64 {
        self.x.length().abs()
    }

    pub fn height(&self) -> f64 {
        self.y.length().abs()
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn point_at(&self, tx: f64, ty: f64) -> Point3<f64> {
        self.plane
            .point_at(self.x.parameter_at(tx), self.y.parameter_at(ty), 0.0)
    }

    pub fn center(&self) -> Point3<f64> {
        self.point_at(0.5, 0.5)
    }

    /// Corner loop, counter-clockwise about the plane normal, closed.
    pub fn to_polyline(&self) -> Polyline {
        Polyline::new(vec![
            self.point_at(0.0, 0.0),
            self.point_at(1.0, 0.0),
            self.point_at(1.0, 1.0),
            self.point_at(0.0, 1.0),
            self.point_at(0.0, 0.0),
        ])
    }

    /// True when the projection of `p` onto the rectangle plane falls inside.
    pub fn contains_projection(&self, p: &Point3<f64>) -> bool {
        let l = self.plane.local(p);
        self.x.includes(l.x) && self.y.includes(l.y)
    }

    pub fn translated(&self, offset: Vector3<f64>) -> Self {
        Self {
            plane: self.plane.translated(offset),
            ..*self
        }
    }
}

/// Straight segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub from: Point3<f64>,
    pub to: Point3<f64>,
}

impl Line {
    pub fn new(from: Point3<f64>, to: Point3<f64>) -> Self {
        Self { from, to }
    }

    pub fn direction(&self) -> Vector3<f64> {
        self.to - self.from
    }

    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    pub fn point_at(&self, t: f64) -> Point3<f64> {
        self.from + self.direction() * t
    }

    pub fn mid_point(&self) -> Point3<f64> {
        self.point_at(0.5)
    }

    /// Parameter of the closest point, clamped to the segment.
    pub fn closest_parameter(&self, p: &Point3<f64>) -> f64 {
        let d = self.direction();
        let len2 = d.norm_squared();
        if len2 < ZERO_TOLERANCE * ZERO_TOLERANCE {
            return 0.0;
        }
        ((p - self.from).dot(&d) / len2).clamp(0.0, 1.0)
    }

    pub fn closest_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.point_at(self.closest_parameter(p))
    }

    /// `count + 1` evenly spaced points from start to end.
    pub fn divide(&self, count: usize) -> Vec<Point3<f64>> {
        let count = count.max(1);
        (0..=count)
            .map(|i| self.point_at(i as f64 / count as f64))
            .collect()
    }

    /// Intersection of the XY projections of two segments, as parameters
    /// on `self` and `other`.
    pub fn intersect_xy(&self, other: &Line) -> Option<(f64, f64)> {
        let d1 = self.direction();
        let d2 = other.direction();
        let denom = d1.x * d2.y - d1.y * d2.x;
        if denom.abs() < ZERO_TOLERANCE {
            return None;
        }
        let w = other.from - self.from;
        let t = (w.x * d2.y - w.y * d2.x) / denom;
        let s = (w.x * d1.y - w.y * d1.x) / denom;
        let range = -ZERO_TOLERANCE..=1.0 + ZERO_TOLERANCE;
        (range.contains(&t) && range.contains(&s)).then_some((t, s))
    }
}

/// Ordered point list. Closed when the last point repeats the first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point3<f64>>,
}

impl Polyline {
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    /// Closes the loop by repeating the first point if needed.
    pub fn closed(mut points: Vec<Point3<f64>>) -> Self {
        if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied())
            && (first - last).norm() > ZERO_TOLERANCE
        {
            points.push(first);
        }
        Self { points }
    }

    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) => self.points.len() > 2 && (a - b).norm() <= ZERO_TOLERANCE,
            _ => false,
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = Line> + '_ {
        self.points.windows(2).map(|w| Line::new(w[0], w[1]))
    }

    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn length(&self) -> f64 {
        self.segments().map(|s| s.length()).sum()
    }

    /// Vertices without the closing duplicate.
    pub fn corners(&self) -> &[Point3<f64>] {
        if self.is_closed() {
            &self.points[..self.points.len() - 1]
        } else {
            &self.points
        }
    }

    pub fn closest_point(&self, p: &Point3<f64>) -> Option<Point3<f64>> {
        self.segments()
            .map(|s| s.closest_point(p))
            .min_by(|a, b| (a - p).norm().total_cmp(&(b - p).norm()))
    }

    /// Vertex average, ignoring the closing duplicate.
    pub fn center(&self) -> Option<Point3<f64>> {
        let corners = self.corners();
        if corners.is_empty() {
            return None;
        }
        let sum = corners
            .iter()
            .fold(Vector3::<f64>::zeros(), |acc, p| acc + p.coords);
        Some(Point3::from(sum / corners.len() as f64))
    }

    /// Signed shoelace area of the loop measured in `plane`.
    pub fn signed_area_in(&self, plane: &Plane) -> f64 {
        let pts: Vec<Point2<f64>> = self.corners().iter().map(|p| plane.local_2d(p)).collect();
        let n = pts.len();
        if n < 3 {
            return 0.0;
        }
        0.5 * (0..n)
            .map(|i| {
                let a = pts[i];
                let b = pts[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
    }

    pub fn area_in(&self, plane: &Plane) -> f64 {
        self.signed_area_in(plane).abs()
    }

    /// Offsets a closed loop inside `plane`. Positive `distance` moves the
    /// loop toward its interior, whatever its winding. Corners coinciding in
    /// plan with their predecessor are dropped first.
    pub fn offset_in(&self, plane: &Plane, distance: f64) -> Polyline {
        let mut local: Vec<Point2<f64>> = Vec::new();
        let mut heights: Vec<f64> = Vec::new();
        for p in self.corners() {
            let q = plane.local_2d(p);
            if local.last().is_some_and(|last| (q - last).norm() <= ZERO_TOLERANCE) {
                continue;
            }
            local.push(q);
            heights.push(plane.local(p).z);
        }
        while local.len() > 1 && (local[0] - local[local.len() - 1]).norm() <= ZERO_TOLERANCE {
            local.pop();
            heights.pop();
        }
        let n = local.len();
        if n < 3 {
            return self.clone();
        }
        let orientation = self.signed_area_in(plane).signum();
        // Left normal of a counter-clockwise edge points inward.
        let inward = |a: Point2<f64>, b: Point2<f64>| {
            let d = (b - a)
                .try_normalize(ZERO_TOLERANCE)
                .unwrap_or_else(nalgebra::Vector2::zeros);
            nalgebra::Vector2::new(-d.y, d.x) * orientation
        };

        let mut out = Vec::with_capacity(n + 1);
        for i in 0..n {
            let prev = local[(i + n - 1) % n];
            let cur = local[i];
            let next = local[(i + 1) % n];
            let n0 = inward(prev, cur);
            let n1 = inward(cur, next);
            let bisector = n0 + n1;
            let cos_half = bisector.norm() / 2.0;
            let shift = if cos_half > 1e-6 {
                bisector.normalize() * (distance / cos_half)
            } else {
                n0 * distance
            };
            let q = cur + shift;
            out.push(plane.point_at(q.x, q.y, heights[i]));
        }
        Polyline::closed(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Polyline {
        Polyline::closed(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn plane_local_inverts_point_at() {
        let plane = Plane::new(
            Point3::new(1.0, 2.0, 3.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        )
        .expect("valid plane");
        let p = plane.point_at(0.3, -1.2, 2.5);
        let l = plane.local(&p);
        assert_relative_eq!(l.x, 0.3, epsilon = 1e-12);
        assert_relative_eq!(l.y, -1.2, epsilon = 1e-12);
        assert_relative_eq!(l.z, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn flipped_plane_reverses_normal() {
        let plane = Plane::world_xy();
        assert_relative_eq!(plane.flipped().normal(), -Vector3::z());
    }

    #[test]
    fn rotated_plane_keeps_orthonormal_axes() {
        let plane = Plane::world_xy().rotated(0.7, Vector3::new(1.0, 2.0, 0.5), Point3::origin());
        assert_relative_eq!(plane.x_axis.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.x_axis.dot(&plane.y_axis), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn oriented_box_faces_point_outward() {
        let pts = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 3.0, 4.0)];
        let bbox = OrientedBox::from_points(Plane::world_xy(), pts.iter()).expect("box");
        assert_relative_eq!(bbox.volume(), 24.0);
        let center = bbox.center();
        for face in bbox.faces() {
            let outward = face.plane.origin - center;
            assert!(outward.dot(&face.plane.normal()) > 0.0);
        }
        assert_relative_eq!(bbox.faces()[4].area, 6.0);
    }

    #[test]
    fn square_area_and_inward_offset() {
        let square = unit_square();
        assert_relative_eq!(square.area_in(&Plane::world_xy()), 1.0);

        let inset = square.offset_in(&Plane::world_xy(), 0.1);
        assert_relative_eq!(inset.area_in(&Plane::world_xy()), 0.64, epsilon = 1e-12);

        let reversed = Polyline::closed(square.corners().iter().rev().copied().collect());
        let inset = reversed.offset_in(&Plane::world_xy(), 0.1);
        assert_relative_eq!(inset.area_in(&Plane::world_xy()), 0.64, epsilon = 1e-12);
    }

    #[test]
    fn repeated_corners_offset_like_the_clean_loop() {
        let plane = Plane::world_xy();
        let clean = unit_square().offset_in(&plane, 0.1);
        let repeated = Polyline::closed(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
        .offset_in(&plane, 0.1);

        assert_eq!(repeated.corners().len(), 4);
        for (a, b) in repeated.corners().iter().zip(clean.corners()) {
            assert!(a.coords.iter().all(|v| v.is_finite()));
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
        assert_relative_eq!(repeated.area_in(&plane), 0.64, epsilon = 1e-12);
    }

    #[test]
    fn collapsed_loop_is_returned_unchanged() {
        let sliver = Polyline::closed(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ]);
        let offset = sliver.offset_in(&Plane::world_xy(), 0.1);
        assert_eq!(offset, sliver);
    }

    #[test]
    fn crossing_lines_intersect_in_plan() {
        let a = Line::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 1.0));
        let b = Line::new(Point3::new(0.0, 2.0, 5.0), Point3::new(2.0, 0.0, 5.0));
        let (t, s) = a.intersect_xy(&b).expect("lines cross");
        assert_relative_eq!(t, 0.5, epsilon = 1e-12);
        assert_relative_eq!(s, 0.5, epsilon = 1e-12);
        let parallel = Line::new(Point3::new(0.0, 1.0, 0.0), Point3::new(2.0, 3.0, 0.0));
        assert!(a.intersect_xy(&parallel).is_none());
    }

    #[test]
    fn closest_point_on_polyline() {
        let square = unit_square();
        let hit = square.closest_point(&Point3::new(0.5, -2.0, 0.0)).expect("non-empty");
        assert_relative_eq!(hit, Point3::new(0.5, 0.0, 0.0));
    }
}
