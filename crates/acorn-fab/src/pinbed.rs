//! Pinbed mould simulation.
//!
//! Each module is a rectangle under one shell segment. Modules are lowered or
//! raised to the lowest point of the shell above their footprint, either one
//! by one or with a single height shared by all modules of a segment. Every
//! module carries a regular grid of pins whose tips are projected along the
//! module normal onto the shell.

use acorn_model::{Line, Plane, Point3, Rectangle3, ShellMesh};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{FabError, Result};

const MIN_HUE: f64 = 0.33;
const MAX_HUE: f64 = 0.16;
const PIN_SATURATION: f64 = 1.0;
const PIN_LIGHTNESS: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinbedConfig {
    pub pins_x: usize,
    pub pins_y: usize,
    /// Let modules of the same segment sit at different heights
    pub variable_height: bool,
    /// Longest pin the mould can extend, in m
    pub max_pin_length: f64,
    /// Segment indices to simulate, all when empty
    pub selected_segments: Vec<usize>,
}

impl Default for PinbedConfig {
    fn default() -> Self {
        Self {
            pins_x: 3,
            pins_y: 3,
            variable_height: false,
            max_pin_length: 0.5,
            selected_segments: Vec::new(),
        }
    }
}

/// 8-bit RGB display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };

    /// Converts hue, saturation and lightness, all in `[0, 1]`.
    pub fn from_hsl(hue: f64, saturation: f64, lightness: f64) -> Self {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        if saturation <= 0.0 {
            let v = channel(lightness);
            return Self { r: v, g: v, b: v };
        }
        let q = if lightness < 0.5 {
            lightness * (1.0 + saturation)
        } else {
            lightness + saturation - lightness * saturation
        };
        let p = 2.0 * lightness - q;
        let hue_to_rgb = |t: f64| {
            let t = t.rem_euclid(1.0);
            if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            }
        };
        Self {
            r: channel(hue_to_rgb(hue + 1.0 / 3.0)),
            g: channel(hue_to_rgb(hue)),
            b: channel(hue_to_rgb(hue - 1.0 / 3.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pin {
    /// From the module plane to the shell; zero length when the shell was missed
    pub axis: Line,
    pub length: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModulePins {
    pub segment: usize,
    pub module: usize,
    /// Module after height adjustment
    pub rectangle: Rectangle3,
    /// Row-major from the module origin: `j * pins_x + i`
    pub pins: Vec<Pin>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PinbedLayout {
    pub modules: Vec<ModulePins>,
}

impl PinbedLayout {
    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.modules.iter().flat_map(|m| m.pins.iter())
    }

    pub fn max_pin_length(&self) -> Option<f64> {
        self.pins().map(|p| p.length).reduce(f64::max)
    }
}

/// Nearest shell point along the normal of `plane` through `p`.
fn project_to_shell(shell: &ShellMesh, plane: &Plane, p: &Point3<f64>) -> Option<Point3<f64>> {
    shell
        .intersect_line(p, &plane.normal())
        .into_iter()
        .min_by(|a, b| a.parameter.abs().total_cmp(&b.parameter.abs()))
        .map(|hit| hit.point)
}

/// Shell points above the footprint of `module`: vertices inside it plus the
/// projections of its corners and center.
fn footprint_points(shell: &ShellMesh, module: &Rectangle3) -> Vec<Point3<f64>> {
    let mut points: Vec<Point3<f64>> = shell
        .vertices
        .iter()
        .filter(|v| module.contains_projection(v))
        .copied()
        .collect();
    let probes = [
        module.point_at(0.0, 0.0),
        module.point_at(1.0, 0.0),
        module.point_at(1.0, 1.0),
        module.point_at(0.0, 1.0),
        module.center(),
    ];
    points.extend(
        probes
            .iter()
            .filter_map(|p| project_to_shell(shell, &module.plane, p)),
    );
    points
}

/// Lowest height of `points` measured along the normal of `plane`.
fn lowest_offset<'a>(
    plane: &Plane,
    points: impl IntoIterator<Item = &'a Point3<f64>>,
) -> Option<f64> {
    points.into_iter().map(|p| plane.local(p).z).reduce(f64::min)
}

fn pin_color(length: f64, max_length: f64) -> Color {
    if length > max_length {
        Color::RED
    } else {
        let hue = MIN_HUE + length / max_length * (MAX_HUE - MIN_HUE);
        Color::from_hsl(hue, PIN_SATURATION, PIN_LIGHTNESS)
    }
}

fn place_pins(shell: &ShellMesh, module: &Rectangle3, config: &PinbedConfig) -> Vec<Pin> {
    let mut pins = Vec::with_capacity(config.pins_x * config.pins_y);
    for j in 0..config.pins_y {
        for i in 0..config.pins_x {
            let start = module.point_at(
                (i as f64 + 0.5) / config.pins_x as f64,
                (j as f64 + 0.5) / config.pins_y as f64,
            );
            let pin = match project_to_shell(shell, &module.plane, &start) {
                Some(end) => {
                    let axis = Line::new(start, end);
                    let length = axis.length();
                    Pin {
                        axis,
                        length,
                        color: pin_color(length, config.max_pin_length),
                    }
                }
                None => Pin {
                    axis: Line::new(start, start),
                    length: 0.0,
                    color: Color::from_hsl(MIN_HUE, PIN_SATURATION, PIN_LIGHTNESS),
                },
            };
            pins.push(pin);
        }
    }
    pins
}

/// Simulates the mould for `modules[segment][module]` under `shell`.
pub fn simulate_pinbed(
    shell: &ShellMesh,
    modules: &[Vec<Rectangle3>],
    config: &PinbedConfig,
) -> Result<PinbedLayout> {
    if !(config.max_pin_length > 0.0) {
        return Err(FabError::InvalidPinLength(config.max_pin_length));
    }
    let selected = |segment: usize| {
        config.selected_segments.is_empty() || config.selected_segments.contains(&segment)
    };

    let mut layout = PinbedLayout::default();
    for (segment, segment_modules) in modules.iter().enumerate() {
        if !selected(segment) || segment_modules.is_empty() {
            continue;
        }
        let footprints: Vec<Vec<Point3<f64>>> = segment_modules
            .iter()
            .map(|m| footprint_points(shell, m))
            .collect();

        // Shared height: lowest point of the whole segment in the first module's plane.
        let first_plane = segment_modules[0].plane;
        let shared = lowest_offset(&first_plane, footprints.iter().flatten())
            .map(|offset| first_plane.normal() * offset);

        for (index, (module, footprint)) in segment_modules.iter().zip(&footprints).enumerate() {
            let adjustment = if config.variable_height {
                lowest_offset(&module.plane, footprint).map(|offset| module.plane.normal() * offset)
            } else {
                shared
            };
            let rectangle = match adjustment {
                Some(adjustment) => module.translated(adjustment),
                None => {
                    warn!(segment, module = index, "module footprint misses the shell");
                    *module
                }
            };
            let pins = place_pins(shell, &rectangle, config);
            debug!(segment, module = index, pins = pins.len(), "placed pins");
            layout.modules.push(ModulePins {
                segment,
                module: index,
                rectangle,
                pins,
            });
        }
    }

    info!(
        modules = layout.modules.len(),
        max_pin_length = layout.max_pin_length().unwrap_or(0.0),
        "simulated pinbed"
    );
    Ok(layout)
}
