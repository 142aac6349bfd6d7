//! Analysis pipeline over a structural solver backend.
//!
//! Fast mode runs a first-order analysis and falls back to second order if
//! the solver rejects it. The full mode runs second-order analysis followed by
//! buckling mode extraction. Solver messages are carried as warnings on the
//! result, never as errors.

use acorn_model::units::m_to_cm;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::{BucklingConfig, SecondOrderConfig, StructuralSolver};
use crate::error::Result;

/// Stage of the pipeline a warning came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStage {
    FirstOrder,
    SecondOrder,
    Buckling,
    FormFinding,
}

/// Non-fatal message reported by the solver or the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverWarning {
    pub stage: AnalysisStage,
    pub message: String,
}

impl SolverWarning {
    pub fn new(stage: AnalysisStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Run mode of one shell analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// First-order analysis only, no buckling
    pub fast: bool,
    pub second_order: SecondOrderConfig,
    pub buckling: BucklingConfig,
}

/// Solved shell with its displacement, buckling factors and warnings.
#[derive(Debug, Clone)]
pub struct AnalysisResults<M> {
    pub model: M,
    /// Model after buckling analysis, absent in fast mode or when it failed
    pub buckling_model: Option<M>,
    /// Maximum displacement in cm
    pub max_displacement_cm: f64,
    /// Positive buckling load factors
    pub buckling_factors: Vec<f64>,
    pub warnings: Vec<SolverWarning>,
}

impl<M> AnalysisResults<M> {
    pub fn min_buckling_factor(&self) -> Option<f64> {
        self.buckling_factors.iter().copied().reduce(f64::min)
    }
}

/// Drives a [`StructuralSolver`] through the analysis stages.
pub struct AnalysisPipeline {
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    /// Pipeline running in the given mode.
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Fast-mode pipeline that skips buckling.
    pub fn fast() -> Self {
        Self::new(AnalysisConfig {
            fast: true,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Runs the configured stages on `model`.
    pub fn run<S: StructuralSolver>(
        &self,
        solver: &S,
        model: &S::Model,
    ) -> Result<AnalysisResults<S::Model>> {
        let mut warnings = Vec::new();
        info!(backend = solver.name(), fast = self.config.fast, "running shell analysis");

        let (analysed, output, stage) = if self.config.fast {
            match solver.analyze_first_order(model) {
                Ok((m, out)) => (m, out, AnalysisStage::FirstOrder),
                Err(err) => {
                    warn!(error = %err, "first-order analysis failed, retrying with second order");
                    warnings.push(SolverWarning::new(
                        AnalysisStage::FirstOrder,
                        format!("first-order analysis failed, used second order: {err}"),
                    ));
                    let (m, out) = solver.analyze_second_order(model, &self.config.second_order)?;
                    (m, out, AnalysisStage::SecondOrder)
                }
            }
        } else {
            let (m, out) = solver.analyze_second_order(model, &self.config.second_order)?;
            (m, out, AnalysisStage::SecondOrder)
        };
        warnings.extend(
            output
                .messages
                .iter()
                .map(|msg| SolverWarning::new(stage, msg.clone())),
        );

        let mut buckling_model = None;
        let mut buckling_factors = Vec::new();
        if !self.config.fast {
            match solver.buckling_modes(&analysed, &self.config.buckling) {
                Ok((m, out)) => {
                    buckling_factors = out.load_factors.into_iter().filter(|&f| f > 0.0).collect();
                    warnings.extend(
                        out.messages
                            .into_iter()
                            .map(|msg| SolverWarning::new(AnalysisStage::Buckling, msg)),
                    );
                    buckling_model = Some(m);
                }
                Err(err) => {
                    warn!(error = %err, "buckling analysis failed");
                    warnings.push(SolverWarning::new(AnalysisStage::Buckling, err.to_string()));
                }
            }
        }

        let max_displacement_cm = m_to_cm(output.max_displacement);
        info!(
            max_displacement_cm,
            buckling_modes = buckling_factors.len(),
            warnings = warnings.len(),
            "analysis finished"
        );
        Ok(AnalysisResults {
            model: analysed,
            buckling_model,
            max_displacement_cm,
            buckling_factors,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{RecordedModel, RecordedSolver};
    use acorn_io::{AnalysisRecord, ModelSnapshot};
    use approx::assert_relative_eq;

    fn recorded(first: Option<f64>, second: Option<f64>, buckling: Vec<f64>) -> RecordedModel {
        let record = |d: f64| AnalysisRecord {
            max_displacement: d,
            messages: vec!["converged".to_string()],
        };
        RecordedModel::new(ModelSnapshot {
            first_order: first.map(record),
            second_order: second.map(record),
            buckling_factors: buckling,
            ..Default::default()
        })
    }

    #[test]
    fn fast_mode_reports_first_order_displacement() {
        let model = recorded(Some(0.012), None, Vec::new());
        let results = AnalysisPipeline::fast().run(&RecordedSolver, &model).expect("analysis");
        assert_relative_eq!(results.max_displacement_cm, 1.2, epsilon = 1e-12);
        assert!(results.buckling_model.is_none());
        assert_eq!(results.warnings.len(), 1);
        assert_eq!(results.warnings[0].stage, AnalysisStage::FirstOrder);
    }

    #[test]
    fn fast_mode_falls_back_to_second_order() {
        let model = recorded(None, Some(0.02), Vec::new());
        let results = AnalysisPipeline::fast().run(&RecordedSolver, &model).expect("analysis");
        assert_relative_eq!(results.max_displacement_cm, 2.0, epsilon = 1e-12);
        assert_eq!(results.warnings[0].stage, AnalysisStage::FirstOrder);
        assert_eq!(results.warnings[1].stage, AnalysisStage::SecondOrder);
    }

    #[test]
    fn full_mode_keeps_positive_buckling_factors() {
        let model = recorded(None, Some(0.03), vec![-2.0, 7.5]);
        let config = AnalysisConfig {
            buckling: BucklingConfig {
                mode_count: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        let results = AnalysisPipeline::new(config)
            .run(&RecordedSolver, &model)
            .expect("analysis");
        assert_eq!(results.buckling_factors, vec![7.5]);
        assert_eq!(results.min_buckling_factor(), Some(7.5));
        assert!(results.buckling_model.is_some());
    }

    #[test]
    fn buckling_failure_is_a_warning_and_second_order_failure_is_fatal() {
        let model = recorded(None, Some(0.03), Vec::new());
        let results = AnalysisPipeline::new(AnalysisConfig::default())
            .run(&RecordedSolver, &model)
            .expect("analysis");
        assert!(results.buckling_factors.is_empty());
        assert!(results.warnings.iter().any(|w| w.stage == AnalysisStage::Buckling));

        let model = recorded(Some(0.01), None, Vec::new());
        let err = AnalysisPipeline::new(AnalysisConfig::default()).run(&RecordedSolver, &model);
        assert!(err.is_err());
    }
}
