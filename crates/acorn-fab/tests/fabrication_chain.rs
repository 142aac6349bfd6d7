//! End-to-end fabrication workflow for one shell segment
//!
//! segment mesh → bounding box → modules → pinbed simulation / area efficiency
use acorn_fab::{
    BoundingBoxConfig, PinbedConfig, area_efficiency, fit_bounding_box, fit_modules,
    simulate_pinbed,
};
use acorn_model::{MeshFace, Plane, Point3, Polyline, ShellMesh, Vector3};
use approx::assert_relative_eq;

const TURN_DEG: f64 = 20.0;

fn turn(x: f64, y: f64, z: f64) -> Point3<f64> {
    let (s, c) = TURN_DEG.to_radians().sin_cos();
    Point3::new(c * x - s * y, s * x + c * y, z)
}

/// Arched 2 x 1 segment, `z = 0.5 + 0.1 x (2 - x)`, turned in plan.
fn arched_segment() -> ShellMesh {
    let (nx, ny) = (8, 4);
    let mut mesh = ShellMesh::new();
    for j in 0..=ny {
        for i in 0..=nx {
            let x = 2.0 * i as f64 / nx as f64;
            let y = j as f64 / ny as f64;
            mesh.add_vertex(turn(x, y, 0.5 + 0.1 * x * (2.0 - x)));
        }
    }
    for j in 0..ny {
        for i in 0..nx {
            let a = j * (nx + 1) + i;
            let quad = MeshFace::Quad([a, a + 1, a + nx + 2, a + nx + 1]);
            mesh.add_face(quad).expect("face");
        }
    }
    mesh
}

fn outline() -> Polyline {
    Polyline::closed(vec![
        turn(0.0, 0.0, 0.5),
        turn(2.0, 0.0, 0.5),
        turn(2.0, 1.0, 0.5),
        turn(0.0, 1.0, 0.5),
    ])
}

#[test]
fn test_segment_to_pinbed() {
    let segment = arched_segment();
    let config = BoundingBoxConfig {
        resolution_deg: 1.0,
        ..Default::default()
    };
    let bbox = fit_bounding_box(&segment.vertices, &config).expect("bounding box");
    assert_relative_eq!(bbox.volume(), 2.0 * 1.0 * 0.1, epsilon = 1e-9);
    assert_relative_eq!(bbox.plane.normal(), Vector3::z(), epsilon = 1e-9);

    let modules = fit_modules(&bbox, 0.5, 0.5, 3.0).expect("modules");
    assert_eq!(modules.len(), 8);
    let efficiency = area_efficiency(&outline(), &modules).expect("efficiency");
    assert_relative_eq!(efficiency, 1.0, epsilon = 1e-9);

    let layout =
        simulate_pinbed(&segment, &[modules], &PinbedConfig::default()).expect("pinbed");
    assert_eq!(layout.modules.len(), 8);
    assert_eq!(layout.pins().count(), 72);
    for module in &layout.modules {
        assert_relative_eq!(module.rectangle.plane.origin.z, 0.5, epsilon = 1e-9);
    }
    for pin in layout.pins() {
        assert!(pin.length > 0.0);
        assert!(pin.length <= 0.1 + 1e-9);
    }
}

#[test]
fn test_modules_follow_the_segment_orientation() {
    let segment = arched_segment();
    let config = BoundingBoxConfig {
        resolution_deg: 1.0,
        ..Default::default()
    };
    let bbox = fit_bounding_box(&segment.vertices, &config).expect("bounding box");
    let modules = fit_modules(&bbox, 0.5, 0.5, 3.0).expect("modules");

    let plan = Plane::world_xy();
    let total: f64 = modules.iter().map(|m| m.to_polyline().area_in(&plan)).sum();
    assert_relative_eq!(total, 2.0, epsilon = 1e-9);

    let sum = modules
        .iter()
        .fold(Vector3::zeros(), |acc, m| acc + m.center().coords);
    let mean = Point3::from(sum / modules.len() as f64);
    assert_relative_eq!(mean, bbox.point_at(0.5, 0.5, 0.0), epsilon = 1e-9);
    assert_relative_eq!(mean, turn(1.0, 0.5, 0.5), epsilon = 1e-9);
}
