//! Isogeometric form finding through a dynamically resolved engine.
//!
//! The IGA engine exposes named operations taking and returning untyped
//! argument lists. All operations are resolved up front; a missing one is a
//! fatal error. The solve runs in a temporary working directory and the
//! deformed shell is scaled vertically to the target rise.

use std::collections::HashMap;
use std::sync::Arc;

use acorn_model::{Line, Point3, Polyline, ShellMesh, Vector3, ZERO_TOLERANCE};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisStage, SolverWarning};
use crate::backend::BackendError;
use crate::error::{Result, SolverError};

/// One engine operation: flat argument list in, output list out.
pub type Operation = dyn Fn(&[Value]) -> std::result::Result<Vec<Value>, String> + Send + Sync;

pub const MATERIAL_DEFAULTS: &str = "Kiwi3d.MaterialDefaults";
pub const SURFACE_REFINEMENT: &str = "Kiwi3d.SurfaceRefinement";
pub const SHELL_ELEMENT: &str = "Kiwi3d.ShellElement";
pub const SUPPORT_POINT: &str = "Kiwi3d.SupportPoint";
pub const SUPPORT_CURVE: &str = "Kiwi3d.SupportCurve";
pub const SURFACE_LOAD: &str = "Kiwi3d.SurfaceLoad";
pub const LINEAR_ANALYSIS: &str = "Kiwi3d.LinearAnalysis";
pub const ANALYSIS_MODEL: &str = "Kiwi3d.AnalysisModel";
pub const IGA_SOLVER: &str = "Kiwi3d.IGASolver";
pub const DEFORMED_MODEL: &str = "Kiwi3d.DeformedModel";

pub const REQUIRED_OPERATIONS: [&str; 10] = [
    MATERIAL_DEFAULTS,
    SURFACE_REFINEMENT,
    SHELL_ELEMENT,
    SUPPORT_POINT,
    SUPPORT_CURVE,
    SURFACE_LOAD,
    LINEAR_ANALYSIS,
    ANALYSIS_MODEL,
    IGA_SOLVER,
    DEFORMED_MODEL,
];

/// Source of named IGA operations.
pub trait IgaEngine {
    fn find_operation(&self, name: &str) -> Option<Arc<Operation>>;
}

/// In-process engine assembled from closures.
#[derive(Default, Clone)]
pub struct OperationRegistry {
    operations: HashMap<String, Arc<Operation>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, operation: F) -> &mut Self
    where
        F: Fn(&[Value]) -> std::result::Result<Vec<Value>, String> + Send + Sync + 'static,
    {
        self.operations.insert(name.into(), Arc::new(operation));
        self
    }
}

impl IgaEngine for OperationRegistry {
    fn find_operation(&self, name: &str) -> Option<Arc<Operation>> {
        self.operations.get(name).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormFindConfig {
    /// Engine material preset (5 is concrete)
    pub material: i64,
    pub surface_degree: u32,
    /// Refinement per direction, 0 selects the default of 10
    pub subdivisions: u32,
    pub output_flags: Vec<u32>,
    /// Shell thickness as a multiple of the rise
    pub thickness_factor: f64,
    /// Support corner edges along their length instead of at points
    pub curve_supports: bool,
    /// Let the engine scale the deformation instead of scaling the result
    pub scale_in_engine: bool,
    pub support_divisions: usize,
    /// Upward surface load driving the form
    pub load_magnitude: f64,
}

impl Default for FormFindConfig {
    fn default() -> Self {
        Self {
            material: 5,
            surface_degree: 3,
            subdivisions: 10,
            output_flags: vec![1, 2, 3],
            thickness_factor: 1.0,
            curve_supports: false,
            scale_in_engine: false,
            support_divisions: 100,
            load_magnitude: 100.0,
        }
    }
}

/// Flat plan of the shell and its outline.
#[derive(Debug, Clone, PartialEq)]
pub struct FormFindRequest {
    pub plan: ShellMesh,
    pub boundary: Polyline,
    /// Target rise in m
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormFindResult {
    /// `None` when the engine produced no deformed shape
    pub shell: Option<ShellMesh>,
    pub warnings: Vec<SolverWarning>,
}

/// Splits an outline into its shorter half ("corners", supported) and its
/// longer half (free edges).
pub fn split_shell_edges(boundary: &Polyline) -> (Vec<Line>, Vec<Line>) {
    let mut segments: Vec<Line> = boundary.segments().collect();
    segments.sort_by(|a, b| a.length().total_cmp(&b.length()));
    let edges = segments.split_off(segments.len() / 2);
    (segments, edges)
}

pub struct FormFinder {
    operations: HashMap<&'static str, Arc<Operation>>,
    config: FormFindConfig,
}

impl FormFinder {
    /// Looks up every required operation.
    pub fn resolve(engine: &impl IgaEngine, config: FormFindConfig) -> Result<Self> {
        let mut operations = HashMap::new();
        let mut missing = Vec::new();
        for name in REQUIRED_OPERATIONS {
            match engine.find_operation(name) {
                Some(op) => {
                    operations.insert(name, op);
                }
                None => missing.push(name.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(SolverError::MissingOperations(missing));
        }
        Ok(Self { operations, config })
    }

    fn call(&self, name: &'static str, args: Vec<Value>) -> Result<Vec<Value>> {
        let op = self
            .operations
            .get(name)
            .ok_or_else(|| SolverError::MissingOperations(vec![name.to_string()]))?;
        debug!(operation = name, args = args.len(), "calling IGA operation");
        op(&args).map_err(|message| BackendError(format!("{name}: {message}")).into())
    }

    fn output(&self, name: &'static str, args: Vec<Value>, index: usize) -> Result<Value> {
        self.call(name, args)?
            .into_iter()
            .nth(index)
            .ok_or_else(|| SolverError::UnexpectedOutput {
                operation: name.to_string(),
                message: format!("missing output {index}"),
            })
    }

    fn decode_shell(value: Value) -> Result<Option<ShellMesh>> {
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|err| SolverError::UnexpectedOutput {
                operation: DEFORMED_MODEL.to_string(),
                message: err.to_string(),
            })
    }

    pub fn form_find(&self, request: &FormFindRequest) -> Result<FormFindResult> {
        let cfg = &self.config;
        let subdivisions = if cfg.subdivisions == 0 { 10 } else { cfg.subdivisions };
        let (corners, _) = split_shell_edges(&request.boundary);
        let workdir = tempfile::Builder::new().prefix("acorn-iga").tempdir()?;
        let plan = serde_json::to_value(&request.plan)?;
        let thickness = request.height * cfg.thickness_factor;

        let material = self.output(MATERIAL_DEFAULTS, vec![json!(cfg.material)], 0)?;
        let refinement = self.output(
            SURFACE_REFINEMENT,
            vec![
                json!(cfg.surface_degree),
                json!(cfg.surface_degree),
                json!(subdivisions),
                json!(subdivisions),
            ],
            0,
        )?;
        let shell = self.output(
            SHELL_ELEMENT,
            vec![
                plan.clone(),
                material,
                json!(thickness),
                refinement,
                Value::Null,
                json!(false),
            ],
            0,
        )?;

        let mut supports = Vec::new();
        for corner in &corners {
            if cfg.curve_supports {
                let curve = serde_json::to_value(corner)?;
                supports.push(self.output(
                    SUPPORT_CURVE,
                    vec![curve, json!(true), json!(true), json!(true), json!(false)],
                    0,
                )?);
            } else {
                for p in corner.divide(cfg.support_divisions) {
                    let point = serde_json::to_value(p)?;
                    supports.push(self.output(
                        SUPPORT_POINT,
                        vec![
                            point,
                            json!(true),
                            json!(true),
                            json!(true),
                            json!(false),
                            json!(false),
                        ],
                        0,
                    )?);
                }
            }
        }

        let load = self.output(
            SURFACE_LOAD,
            vec![
                plan,
                json!("1"),
                serde_json::to_value(Vector3::<f64>::z())?,
                json!(cfg.load_magnitude),
                Value::Null,
                Value::Null,
                json!(1),
            ],
            0,
        )?;
        let options = self.output(LINEAR_ANALYSIS, vec![json!(cfg.output_flags)], 0)?;
        let model = self.output(
            ANALYSIS_MODEL,
            vec![options, shell, Value::Array(supports), load],
            0,
        )?;

        let workdir_path = workdir.path().to_string_lossy().into_owned();
        let mut solved = self
            .call(IGA_SOLVER, vec![model, json!(workdir_path), json!(true)])?
            .into_iter();
        let result = solved.next().ok_or_else(|| SolverError::UnexpectedOutput {
            operation: IGA_SOLVER.to_string(),
            message: "missing solved model".to_string(),
        })?;
        let mut warnings = Vec::new();
        if let Some(Value::String(message)) = solved.next()
            && !message.is_empty()
        {
            warn!(%message, "IGA solver reported errors");
            warnings.push(SolverWarning::new(AnalysisStage::FormFinding, message));
        }

        let deformed = self.output(DEFORMED_MODEL, vec![result.clone()], 1)?;
        let Some(mut shell) = Self::decode_shell(deformed)? else {
            warnings.push(SolverWarning::new(
                AnalysisStage::FormFinding,
                "engine returned no deformed shell",
            ));
            return Ok(FormFindResult {
                shell: None,
                warnings,
            });
        };

        if let Some(bounds) = shell.bounding_box() {
            let rise = bounds.max.z - bounds.min.z;
            if rise > ZERO_TOLERANCE {
                let scale = request.height / rise;
                if cfg.scale_in_engine {
                    let rescaled =
                        self.output(DEFORMED_MODEL, vec![result, Value::Null, json!(scale)], 1)?;
                    if let Some(s) = Self::decode_shell(rescaled)? {
                        shell = s;
                    }
                } else {
                    let base = bounds.min.z;
                    shell.map_vertices(|p| Point3::new(p.x, p.y, base + (p.z - base) * scale));
                }
            } else {
                warnings.push(SolverWarning::new(
                    AnalysisStage::FormFinding,
                    "deformed shell is flat, not scaled",
                ));
            }
        }

        info!(
            corners = corners.len(),
            warnings = warnings.len(),
            "form finding finished"
        );
        Ok(FormFindResult {
            shell: Some(shell),
            warnings,
        })
    }
}
