//! Sampled parametric design spaces.
//!
//! A [`DesignSpace`] owns its dimension labels; every vector inside it has
//! exactly one value per label.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};

/// One sampled design: parameter coordinates and the resulting objectives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignVector {
    pub id: usize,
    pub design_map: Vec<f64>,
    pub objective_values: Vec<f64>,
}

impl DesignVector {
    /// Euclidean distance between the design maps. Extra trailing
    /// coordinates of the longer map are ignored.
    pub fn distance(&self, other: &[f64]) -> f64 {
        self.design_map
            .iter()
            .zip(other)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignSpace {
    design_map_labels: Vec<String>,
    objective_labels: Vec<String>,
    vectors: Vec<DesignVector>,
}

/// Column tables of a design space, one row per vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignTables {
    pub ids: Vec<usize>,
    pub design_map: Vec<Vec<f64>>,
    pub objective_values: Vec<Vec<f64>>,
    pub design_map_labels: Vec<String>,
    pub objective_labels: Vec<String>,
}

impl DesignSpace {
    pub fn new(
        design_map_labels: Vec<String>,
        objective_labels: Vec<String>,
        vectors: Vec<DesignVector>,
    ) -> Result<Self> {
        for v in &vectors {
            check_len(v.id, "design map", design_map_labels.len(), v.design_map.len())?;
            check_len(v.id, "objective values", objective_labels.len(), v.objective_values.len())?;
        }
        Ok(Self {
            design_map_labels,
            objective_labels,
            vectors,
        })
    }

    /// Builds vectors from parallel rows; row `i` becomes vector `i`.
    pub fn from_tables(
        design_map: Vec<Vec<f64>>,
        objective_values: Vec<Vec<f64>>,
        design_map_labels: Vec<String>,
        objective_labels: Vec<String>,
    ) -> Result<Self> {
        if design_map.len() != objective_values.len() {
            return Err(SolverError::DimensionMismatch {
                id: design_map.len().min(objective_values.len()),
                what: "objective table",
                expected: design_map.len(),
                found: objective_values.len(),
            });
        }
        let vectors = design_map
            .into_iter()
            .zip(objective_values)
            .enumerate()
            .map(|(id, (design_map, objective_values))| DesignVector {
                id,
                design_map,
                objective_values,
            })
            .collect();
        Self::new(design_map_labels, objective_labels, vectors)
    }

    pub fn design_map_labels(&self) -> &[String] {
        &self.design_map_labels
    }

    pub fn objective_labels(&self) -> &[String] {
        &self.objective_labels
    }

    pub fn vectors(&self) -> &[DesignVector] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Back to column tables.
    pub fn explode(&self) -> DesignTables {
        DesignTables {
            ids: self.vectors.iter().map(|v| v.id).collect(),
            design_map: self.vectors.iter().map(|v| v.design_map.clone()).collect(),
            objective_values: self
                .vectors
                .iter()
                .map(|v| v.objective_values.clone())
                .collect(),
            design_map_labels: self.design_map_labels.clone(),
            objective_labels: self.objective_labels.clone(),
        }
    }

    /// Vector nearest to `reference` with its distance; the first of equally
    /// close vectors wins.
    pub fn closest(&self, reference: &[f64]) -> Result<(&DesignVector, f64)> {
        check_len(usize::MAX, "reference", self.design_map_labels.len(), reference.len())?;
        let mut best: Option<(&DesignVector, f64)> = None;
        for v in &self.vectors {
            let d = v.distance(reference);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((v, d));
            }
        }
        best.ok_or(SolverError::EmptyModel)
    }

    /// Sub-space of the vectors matching `reference` within `tolerance` on
    /// every dimension except the `free` ones.
    pub fn section(
        &self,
        reference: &[f64],
        free: &[usize],
        tolerance: f64,
    ) -> Result<DesignSpace> {
        check_len(usize::MAX, "reference", self.design_map_labels.len(), reference.len())?;
        let vectors = self
            .vectors
            .iter()
            .filter(|v| {
                v.design_map
                    .iter()
                    .zip(reference)
                    .enumerate()
                    .all(|(i, (a, b))| free.contains(&i) || (a - b).abs() <= tolerance)
            })
            .cloned()
            .collect();
        Ok(DesignSpace {
            design_map_labels: self.design_map_labels.clone(),
            objective_labels: self.objective_labels.clone(),
            vectors,
        })
    }
}

fn check_len(id: usize, what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(SolverError::DimensionMismatch {
            id,
            what,
            expected,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn grid_space() -> DesignSpace {
        let mut design_map = Vec::new();
        let mut objectives = Vec::new();
        for height in [2.0, 3.0, 4.0] {
            for thickness in [0.05, 0.08] {
                design_map.push(vec![height, thickness]);
                objectives.push(vec![height * thickness]);
            }
        }
        DesignSpace::from_tables(
            design_map,
            objectives,
            labels(&["height", "thickness"]),
            labels(&["volume"]),
        )
        .expect("valid space")
    }

    #[test]
    fn labels_must_match_vector_lengths() {
        let err = DesignSpace::from_tables(
            vec![vec![1.0, 2.0]],
            vec![vec![3.0]],
            labels(&["a"]),
            labels(&["o"]),
        )
        .expect_err("two coordinates for one label");
        assert!(matches!(
            err,
            SolverError::DimensionMismatch {
                id: 0,
                what: "design map",
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn closest_prefers_first_of_ties() {
        let space = grid_space();
        let (v, d) = space.closest(&[2.5, 0.05]).expect("closest");
        assert_eq!(v.id, 0);
        assert!((d - 0.5).abs() < 1e-12);
        assert!(space.closest(&[1.0]).is_err());
    }

    #[test]
    fn section_fixes_all_but_free_dimensions() {
        let space = grid_space();
        let section = space.section(&[0.0, 0.08], &[0], 1e-9).expect("section");
        let ids: Vec<usize> = section.vectors().iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        assert_eq!(section.design_map_labels(), space.design_map_labels());
    }

    #[test]
    fn explode_returns_the_tables() {
        let space = grid_space();
        let tables = space.explode();
        assert_eq!(tables.ids, (0..6).collect::<Vec<_>>());
        assert_eq!(tables.design_map[3], vec![3.0, 0.08]);
        assert_eq!(tables.objective_labels, vec!["volume".to_string()]);
    }
}
