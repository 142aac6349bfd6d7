//! Replay backend driven by a [`ModelSnapshot`].
//!
//! Serves the stress output and analysis results stored in a snapshot. Used
//! by the CLI and by tests in place of a live solver.

use acorn_io::ModelSnapshot;
use acorn_model::{PrincipalStressField, ShellMesh};

use super::traits::{
    BackendError, BucklingConfig, BucklingOutput, Layer, RunOutput, SecondOrderConfig,
    StressQuery, StressSource, StructuralSolver,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedModel {
    snapshot: ModelSnapshot,
}

impl RecordedModel {
    pub fn new(snapshot: ModelSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &ModelSnapshot {
        &self.snapshot
    }

    fn layer_field(
        &self,
        load_case: usize,
        layer: Layer,
    ) -> Result<&PrincipalStressField, BackendError> {
        let case = self.snapshot.load_cases.get(load_case).ok_or_else(|| {
            BackendError(format!(
                "load case {load_case} not recorded ({} available)",
                self.snapshot.load_cases.len()
            ))
        })?;
        Ok(match layer {
            Layer::Top => &case.top,
            Layer::Bottom => &case.bottom,
        })
    }
}

impl StressSource for RecordedModel {
    fn meshes(&self) -> &[ShellMesh] {
        &self.snapshot.meshes
    }

    fn load_case_count(&self) -> usize {
        self.snapshot.load_cases.len()
    }

    /// A single factor scales the requested case. Several factors combine
    /// the recorded cases value by value, keeping the geometry of the
    /// requested case.
    fn principal_stresses(
        &self,
        query: &StressQuery,
    ) -> Result<PrincipalStressField, BackendError> {
        let mut field = self.layer_field(query.load_case, query.layer)?.clone();
        match query.superposition.as_slice() {
            [] => {}
            [factor] => {
                field.principal1_values.iter_mut().for_each(|v| *v *= factor);
                field.principal2_values.iter_mut().for_each(|v| *v *= factor);
            }
            factors => {
                field.principal1_values.iter_mut().for_each(|v| *v = 0.0);
                field.principal2_values.iter_mut().for_each(|v| *v = 0.0);
                for (case, &factor) in factors.iter().enumerate() {
                    let other = self.layer_field(case, query.layer)?;
                    if other.len() != field.len() {
                        return Err(BackendError(format!(
                            "load case {case} has {} entries, expected {}",
                            other.len(),
                            field.len()
                        )));
                    }
                    for (v, o) in field.principal1_values.iter_mut().zip(&other.principal1_values) {
                        *v += factor * o;
                    }
                    for (v, o) in field.principal2_values.iter_mut().zip(&other.principal2_values) {
                        *v += factor * o;
                    }
                }
            }
        }
        Ok(field)
    }
}

/// Solver that replays the analysis results stored in the snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedSolver;

impl StructuralSolver for RecordedSolver {
    type Model = RecordedModel;

    fn name(&self) -> &str {
        "recorded"
    }

    fn analyze_first_order(
        &self,
        model: &RecordedModel,
    ) -> Result<(RecordedModel, RunOutput), BackendError> {
        let record = model
            .snapshot
            .first_order
            .as_ref()
            .ok_or_else(|| BackendError::from("no first-order result recorded"))?;
        Ok((
            model.clone(),
            RunOutput {
                max_displacement: record.max_displacement,
                messages: record.messages.clone(),
            },
        ))
    }

    fn analyze_second_order(
        &self,
        model: &RecordedModel,
        _config: &SecondOrderConfig,
    ) -> Result<(RecordedModel, RunOutput), BackendError> {
        let record = model
            .snapshot
            .second_order
            .as_ref()
            .ok_or_else(|| BackendError::from("no second-order result recorded"))?;
        Ok((
            model.clone(),
            RunOutput {
                max_displacement: record.max_displacement,
                messages: record.messages.clone(),
            },
        ))
    }

    fn buckling_modes(
        &self,
        model: &RecordedModel,
        config: &BucklingConfig,
    ) -> Result<(RecordedModel, BucklingOutput), BackendError> {
        if model.snapshot.buckling_factors.is_empty() {
            return Err(BackendError::from("no buckling factors recorded"));
        }
        let load_factors = model
            .snapshot
            .buckling_factors
            .iter()
            .copied()
            .skip(config.from_mode.saturating_sub(1))
            .take(config.mode_count)
            .collect();
        Ok((
            model.clone(),
            BucklingOutput {
                load_factors,
                messages: Vec::new(),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acorn_io::LoadCaseStresses;
    use acorn_model::{Point3, Vector3};

    fn two_case_model() -> RecordedModel {
        let case = |scale: f64| {
            let mut top = PrincipalStressField::default();
            top.push(Point3::origin(), Vector3::x(), scale, Vector3::y(), -2.0 * scale);
            LoadCaseStresses {
                name: format!("x{scale}"),
                top: top.clone(),
                bottom: top,
            }
        };
        RecordedModel::new(ModelSnapshot {
            load_cases: vec![case(1.0), case(3.0)],
            buckling_factors: vec![-1.0, 4.0, 6.0],
            ..Default::default()
        })
    }

    #[test]
    fn superposition_combines_recorded_cases() {
        let model = two_case_model();
        let mut query = StressQuery::new(0, Layer::Top);
        query.superposition = vec![1.35, 1.5];
        let field = model.principal_stresses(&query).expect("combined field");
        assert!((field.principal1_values[0] - (1.35 + 4.5)).abs() < 1e-12);

        query.superposition = vec![2.0];
        let field = model.principal_stresses(&query).expect("scaled field");
        assert_eq!(field.principal2_values, vec![-4.0]);
    }

    #[test]
    fn missing_records_are_backend_errors() {
        let model = two_case_model();
        assert!(model.principal_stresses(&StressQuery::new(5, Layer::Bottom)).is_err());
        assert!(RecordedSolver.analyze_first_order(&model).is_err());

        let config = BucklingConfig {
            mode_count: 2,
            ..Default::default()
        };
        let (_, output) = RecordedSolver.buckling_modes(&model, &config).expect("factors");
        assert_eq!(output.load_factors, vec![-1.0, 4.0]);
    }
}
