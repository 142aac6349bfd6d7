//! Pinbed module tiling and its material efficiency.

use acorn_model::{Interval, OrientedBox, Polyline, Rectangle3};
use tracing::debug;

use crate::error::{FabError, Result};

/// Tiles the base of `bbox` with `width` x `depth` modules.
///
/// Extents are reduced by `exp(-tolerance_level)` before rounding up, so a
/// box that is an exact multiple of the module size does not get an extra
/// row. The tiling is centered on the base center of the box. Rectangles are
/// ordered by width index, then depth index.
pub fn fit_modules(
    bbox: &OrientedBox,
    width: f64,
    depth: f64,
    tolerance_level: f64,
) -> Result<Vec<Rectangle3>> {
    if !(width > 0.0 && depth > 0.0) {
        return Err(FabError::InvalidModuleSize { width, depth });
    }
    let tol = (-tolerance_level).exp();
    let count = |extent: f64, size: f64| ((extent.abs() - tol) / size).ceil().max(0.0) as usize;
    let in_width = count(bbox.x.length(), width);
    let in_depth = count(bbox.y.length(), depth);

    let base_center = bbox.point_at(0.5, 0.5, 0.0);
    let mut plane = bbox.plane;
    plane.origin = base_center;
    plane.origin = plane.point_at(
        -(in_width as f64) * width / 2.0,
        -(in_depth as f64) * depth / 2.0,
        0.0,
    );

    let mut modules = Vec::with_capacity(in_width * in_depth);
    for w in 0..in_width {
        for d in 0..in_depth {
            modules.push(Rectangle3 {
                plane,
                x: Interval::new(w as f64 * width, (w + 1) as f64 * width),
                y: Interval::new(d as f64 * depth, (d + 1) as f64 * depth),
            });
        }
    }
    debug!(in_width, in_depth, "fitted pinbed modules");
    Ok(modules)
}

/// Segment outline area projected onto the module plane over the total
/// module area.
pub fn area_efficiency(segment: &Polyline, modules: &[Rectangle3]) -> Result<f64> {
    let first = modules.first().ok_or(FabError::NoModules)?;
    let total: f64 = modules.iter().map(Rectangle3::area).sum();
    Ok(segment.area_in(&first.plane) / total)
}
