//! Unit conventions: lengths in m, forces in kN, stresses computed in kN/cm2
//! and reported in MPa.

/// kN/cm2 to MPa.
pub const KN_PER_CM2_TO_MPA: f64 = 10.0;

/// m to cm, used for reported displacements.
pub const M_TO_CM: f64 = 100.0;

pub fn kn_per_cm2_to_mpa(value: f64) -> f64 {
    value * KN_PER_CM2_TO_MPA
}

pub fn m_to_cm(value: f64) -> f64 {
    value * M_TO_CM
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn stress_and_length_conversions() {
        assert_relative_eq!(kn_per_cm2_to_mpa(-4.6), -46.0, epsilon = 1e-12);
        assert_relative_eq!(m_to_cm(0.012), 1.2, epsilon = 1e-12);
    }
}
