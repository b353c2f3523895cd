use glam::DVec3;

/// Evaluate the thin-plate spline radial basis `U(||control - p||)`.
///
/// Uses the 3D biharmonic kernel `U(r) = r`. The same kernel is used when
/// fitting and when evaluating, so coefficients are only meaningful with it.
#[inline]
pub fn radial_basis(control_point: DVec3, p: DVec3) -> f64 {
    control_point.distance(p)
}
