//! Principal stress samples as returned by a shell solver for one layer.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Column-wise principal stress output, one entry per finite element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrincipalStressField {
    pub origins: Vec<Point3<f64>>,
    pub principal1_dirs: Vec<Vector3<f64>>,
    pub principal1_values: Vec<f64>,
    pub principal2_dirs: Vec<Vector3<f64>>,
    pub principal2_values: Vec<f64>,
}

impl PrincipalStressField {
    /// Common column length, `None` when the columns disagree.
    pub fn aligned_len(&self) -> Option<usize> {
        let n = self.origins.len();
        let lens = [
            self.principal1_dirs.len(),
            self.principal1_values.len(),
            self.principal2_dirs.len(),
            self.principal2_values.len(),
        ];
        lens.iter().all(|&l| l == n).then_some(n)
    }

    /// Shortest column length.
    pub fn len(&self) -> usize {
        [
            self.origins.len(),
            self.principal1_dirs.len(),
            self.principal1_values.len(),
            self.principal2_dirs.len(),
            self.principal2_values.len(),
        ]
        .into_iter()
        .min()
        .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(
        &mut self,
        origin: Point3<f64>,
        dir1: Vector3<f64>,
        val1: f64,
        dir2: Vector3<f64>,
        val2: f64,
    ) {
        self.origins.push(origin);
        self.principal1_dirs.push(dir1);
        self.principal1_values.push(val1);
        self.principal2_dirs.push(dir2);
        self.principal2_values.push(val2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misaligned_columns_are_detected() {
        let mut field = PrincipalStressField::default();
        field.push(Point3::origin(), Vector3::x(), 1.0, Vector3::y(), -1.0);
        assert_eq!(field.aligned_len(), Some(1));

        field.principal2_values.push(3.0);
        assert_eq!(field.aligned_len(), None);
        assert_eq!(field.len(), 1);
    }
}
