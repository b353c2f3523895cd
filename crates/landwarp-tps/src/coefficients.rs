use std::fmt;

use glam::{DMat3, DVec3};

/// A single radial term of the fitted spline: `weight * U(||control_point - p||)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TpsNonAffineTerm3D {
    /// Per-dimension weight of the term.
    pub weight: DVec3,
    /// Source position of the control landmark.
    pub control_point: DVec3,
}

impl TpsNonAffineTerm3D {
    /// Create a new non-affine term.
    pub fn new(weight: DVec3, control_point: DVec3) -> Self {
        Self {
            weight,
            control_point,
        }
    }
}

impl fmt::Display for TpsNonAffineTerm3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TpsNonAffineTerm3D{{weight = {}, control_point = {}}}",
            self.weight, self.control_point
        )
    }
}

/// Coefficients of a fitted 3D thin-plate spline.
///
/// The spline evaluates, for all three output dimensions at once:
///
/// `f(p) = a1 + a2*p.x + a3*p.y + a4*p.z + sum_i(w_i * U(||c_i - p||))`
///
/// where `a1` is the bias and `a2`, `a3`, `a4` are the columns of the linear part.
/// Instances are produced by [`crate::solve_coefficients`] and are never
/// modified afterwards, so they can be shared freely between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct TpsCoefficients3D {
    a1: DVec3,
    a2: DVec3,
    a3: DVec3,
    a4: DVec3,
    non_affine_terms: Vec<TpsNonAffineTerm3D>,
}

impl TpsCoefficients3D {
    pub(crate) fn new(
        affine: [DVec3; 4],
        non_affine_terms: Vec<TpsNonAffineTerm3D>,
    ) -> Self {
        let [a1, a2, a3, a4] = affine;
        Self {
            a1,
            a2,
            a3,
            a4,
            non_affine_terms,
        }
    }

    /// The affine bias (translation) term.
    #[inline]
    pub fn bias(&self) -> DVec3 {
        self.a1
    }

    /// The linear part of the affine term, with columns `a2`, `a3` and `a4`.
    #[inline]
    pub fn linear(&self) -> DMat3 {
        DMat3::from_cols(self.a2, self.a3, self.a4)
    }

    /// The radial terms, one per control landmark.
    #[inline]
    pub fn non_affine_terms(&self) -> &[TpsNonAffineTerm3D] {
        &self.non_affine_terms
    }

    /// The number of control landmarks.
    #[inline]
    pub fn num_control_points(&self) -> usize {
        self.non_affine_terms.len()
    }

    /// Iterate over the control landmark source positions, in fitting order.
    pub fn control_points(&self) -> impl Iterator<Item = DVec3> + '_ {
        self.non_affine_terms.iter().map(|t| t.control_point)
    }
}

impl fmt::Display for TpsCoefficients3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TpsCoefficients3D{{a1 = {}, a2 = {}, a3 = {}, a4 = {}",
            self.a1, self.a2, self.a3, self.a4
        )?;
        for (i, term) in self.non_affine_terms.iter().enumerate() {
            write!(f, ", w{i} = {term}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let coefs = TpsCoefficients3D::new(
            [DVec3::new(1.0, 2.0, 3.0), DVec3::X, DVec3::Y, DVec3::Z],
            vec![TpsNonAffineTerm3D::new(DVec3::ZERO, DVec3::ONE)],
        );

        assert_eq!(coefs.bias(), DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(coefs.linear(), DMat3::IDENTITY);
        assert_eq!(coefs.num_control_points(), 1);
        assert_eq!(coefs.control_points().collect::<Vec<_>>(), vec![DVec3::ONE]);
    }

    #[test]
    fn test_display() {
        let coefs = TpsCoefficients3D::new(
            [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z],
            vec![
                TpsNonAffineTerm3D::new(DVec3::ZERO, DVec3::ONE),
                TpsNonAffineTerm3D::new(DVec3::ZERO, DVec3::ZERO),
            ],
        );
        let s = coefs.to_string();
        assert!(s.starts_with("TpsCoefficients3D{a1 = "));
        assert!(s.contains("w0 = TpsNonAffineTerm3D{"));
        assert!(s.contains("w1 = "));
        assert!(s.ends_with('}'));
    }
}
