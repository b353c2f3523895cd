use glam::{DMat3, DVec3, Vec3};
use rayon::prelude::*;

use crate::coefficients::{TpsCoefficients3D, TpsNonAffineTerm3D};
use crate::config::WarpConfiguration;
use crate::kernel::radial_basis;

/// Point buffers at least this large are warped in parallel.
const PARALLEL_MIN_POINTS: usize = 8192;

/// The coefficients as they are applied for one particular configuration.
struct GatedWarp<'a> {
    bias: DVec3,
    linear: DMat3,
    non_affine_terms: &'a [TpsNonAffineTerm3D],
}

impl<'a> GatedWarp<'a> {
    fn new(coefs: &'a TpsCoefficients3D, config: &WarpConfiguration) -> Self {
        let bias = if config.apply_translation {
            coefs.bias()
        } else {
            DVec3::ZERO
        };

        let linear = coefs.linear();
        let mut cols = [linear.x_axis, linear.y_axis, linear.z_axis];

        // drop the scaling by normalizing each column
        if !config.apply_scale {
            cols = cols.map(DVec3::normalize_or_zero);
        }

        // drop the rotation by keeping only the per-axis magnitudes
        if !config.apply_rotation {
            cols = [
                DVec3::new(cols[0].length(), 0.0, 0.0),
                DVec3::new(0.0, cols[1].length(), 0.0),
                DVec3::new(0.0, 0.0, cols[2].length()),
            ];
        }

        let non_affine_terms: &[TpsNonAffineTerm3D] = if config.apply_non_affine_warp {
            coefs.non_affine_terms()
        } else {
            &[]
        };

        Self {
            bias,
            linear: DMat3::from_cols(cols[0], cols[1], cols[2]),
            non_affine_terms,
        }
    }

    fn ungated(coefs: &'a TpsCoefficients3D) -> Self {
        Self {
            bias: coefs.bias(),
            linear: coefs.linear(),
            non_affine_terms: coefs.non_affine_terms(),
        }
    }

    #[inline]
    fn evaluate(&self, p: DVec3) -> DVec3 {
        // affine terms: a1 + a2*x + a3*y + a4*z
        let affine = self.bias + self.linear * p;

        // non-affine terms: sum(w_i * U(||c_i - p||))
        self.non_affine_terms
            .iter()
            .fold(affine, |acc, term| {
                acc + term.weight * radial_basis(term.control_point, p)
            })
    }

    #[inline]
    fn apply(&self, p: Vec3, config: &WarpConfiguration) -> Vec3 {
        let p = p.as_dvec3() * config.source_prescale as f64;
        let warped = self.evaluate(p);
        p.lerp(warped, config.blend_factor as f64).as_vec3()
    }
}

/// Evaluate the fitted spline at a point, with every part of the warp applied.
///
/// No blending, gating or prescaling is performed.
pub fn warp_point(coefs: &TpsCoefficients3D, p: Vec3) -> Vec3 {
    GatedWarp::ungated(coefs).evaluate(p.as_dvec3()).as_vec3()
}

/// Warp a single point according to a [`WarpConfiguration`].
///
/// The point is multiplied by `config.source_prescale`, evaluated with the gated
/// coefficients and then blended with the prescaled input by `config.blend_factor`.
pub fn warp_point_with_config(
    coefs: &TpsCoefficients3D,
    p: Vec3,
    config: &WarpConfiguration,
) -> Vec3 {
    GatedWarp::new(coefs, config).apply(p, config)
}

/// Warp a buffer of points in place.
///
/// The coefficients are only read, so many buffers can be warped concurrently
/// against the same coefficients. Large buffers are split across the rayon
/// thread pool.
///
/// # Arguments
///
/// * `coefs` - The fitted spline.
/// * `points` - The points to warp, overwritten with the result.
/// * `config` - Blend factor, gates and prescale to apply.
///
/// Example:
///
/// ```
/// use glam::Vec3;
/// use landwarp_landmarks::LandmarkPair3D;
/// use landwarp_tps::{solve_coefficients, warp_in_place, WarpConfiguration};
///
/// let pairs = [
///     LandmarkPair3D::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
///     LandmarkPair3D::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)),
///     LandmarkPair3D::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)),
///     LandmarkPair3D::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 1.0)),
/// ];
/// let coefs = solve_coefficients(&pairs).unwrap();
///
/// let mut points = vec![Vec3::new(0.5, 0.5, 0.5)];
/// warp_in_place(&coefs, &mut points, &WarpConfiguration::default());
/// assert!((points[0] - Vec3::new(1.5, 0.5, 0.5)).length() < 1e-4);
/// ```
pub fn warp_in_place(coefs: &TpsCoefficients3D, points: &mut [Vec3], config: &WarpConfiguration) {
    let gated = GatedWarp::new(coefs, config);

    if points.len() >= PARALLEL_MIN_POINTS {
        points
            .par_iter_mut()
            .for_each(|p| *p = gated.apply(*p, config));
    } else {
        points.iter_mut().for_each(|p| *p = gated.apply(*p, config));
    }
}

/// Warp a slice of points, returning the warped copies.
pub fn warp_points(
    coefs: &TpsCoefficients3D,
    points: &[Vec3],
    config: &WarpConfiguration,
) -> Vec<Vec3> {
    let mut warped = points.to_vec();
    warp_in_place(coefs, &mut warped, config);
    warped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::solve_coefficients;
    use approx::assert_relative_eq;
    use landwarp_landmarks::LandmarkPair3D;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn assert_vec3_eq(a: Vec3, b: Vec3, epsilon: f32) {
        assert_relative_eq!(a.x, b.x, epsilon = epsilon);
        assert_relative_eq!(a.y, b.y, epsilon = epsilon);
        assert_relative_eq!(a.z, b.z, epsilon = epsilon);
    }

    fn cube_corners() -> Vec<Vec3> {
        let mut corners = Vec::with_capacity(8);
        for x in [0.0, 1.0] {
            for y in [0.0, 1.0] {
                for z in [0.0, 1.0] {
                    corners.push(Vec3::new(x, y, z));
                }
            }
        }
        corners
    }

    fn random_points(rng: &mut impl Rng, n: usize) -> Vec<Vec3> {
        (0..n)
            .map(|_| {
                Vec3::new(
                    rng.random_range(-1.0..1.0),
                    rng.random_range(-1.0..1.0),
                    rng.random_range(-1.0..1.0),
                )
            })
            .collect()
    }

    // a smooth non-affine deformation of the cube plus its centre
    fn bent_cube_pairs() -> Vec<LandmarkPair3D> {
        let mut sources = cube_corners();
        sources.push(Vec3::splat(0.5));
        sources
            .into_iter()
            .map(|s| {
                let d = Vec3::new(s.x + 0.2 * s.y * s.y, s.y - 0.1 * s.z, s.z + 0.3 * s.x * s.y);
                LandmarkPair3D::new(s, d)
            })
            .collect()
    }

    #[test]
    fn test_interpolates_control_points() -> Result<(), Box<dyn std::error::Error>> {
        let pairs = bent_cube_pairs();
        let coefs = solve_coefficients(&pairs)?;

        for pair in &pairs {
            assert_vec3_eq(warp_point(&coefs, pair.source), pair.destination, 1e-4);
        }

        let sources = pairs.iter().map(|p| p.source).collect::<Vec<_>>();
        let warped = warp_points(&coefs, &sources, &WarpConfiguration::default());
        for (w, pair) in warped.iter().zip(&pairs) {
            assert_vec3_eq(*w, pair.destination, 1e-4);
        }
        Ok(())
    }

    #[test]
    fn test_interpolates_random_landmarks() -> Result<(), Box<dyn std::error::Error>> {
        let mut rng = StdRng::seed_from_u64(1);
        let sources = random_points(&mut rng, 20);
        let destinations = random_points(&mut rng, 20);
        let pairs = sources
            .iter()
            .zip(&destinations)
            .map(|(s, d)| LandmarkPair3D::new(*s, *s + 0.1 * *d))
            .collect::<Vec<_>>();

        let coefs = solve_coefficients(&pairs)?;

        for pair in &pairs {
            assert_vec3_eq(warp_point(&coefs, pair.source), pair.destination, 1e-3);
        }
        Ok(())
    }

    #[test]
    fn test_zero_blend_is_identity() -> Result<(), Box<dyn std::error::Error>> {
        let coefs = solve_coefficients(&bent_cube_pairs())?;
        let config = WarpConfiguration::default().with_blend_factor(0.0);

        let mut rng = StdRng::seed_from_u64(2);
        let points = random_points(&mut rng, 64);
        let warped = warp_points(&coefs, &points, &config);

        assert_eq!(warped, points);
        Ok(())
    }

    #[test]
    fn test_half_blend_is_midpoint() -> Result<(), Box<dyn std::error::Error>> {
        let coefs = solve_coefficients(&bent_cube_pairs())?;
        let p = Vec3::new(0.3, 0.6, 0.2);

        let full = warp_point(&coefs, p);
        let half =
            warp_point_with_config(&coefs, p, &WarpConfiguration::default().with_blend_factor(0.5));

        assert_vec3_eq(half, (p + full) * 0.5, 1e-5);
        Ok(())
    }

    #[test]
    fn test_identity_fit_returns_same_point() -> Result<(), Box<dyn std::error::Error>> {
        let mut points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
        ];
        let pairs = points
            .iter()
            .map(|p| LandmarkPair3D::new(*p, *p))
            .collect::<Vec<_>>();
        let coefs = solve_coefficients(&pairs)?;

        points.push(Vec3::new(0.25, 0.8, 0.0));
        points.push(Vec3::new(-3.0, 7.5, 0.0));
        points.push(Vec3::new(0.3, 0.3, 2.0));
        for p in points {
            assert_vec3_eq(warp_point(&coefs, p), p, 1e-4);
        }
        Ok(())
    }

    #[test]
    fn test_translation_only_gate() -> Result<(), Box<dyn std::error::Error>> {
        let offset = Vec3::new(1.0, 2.0, 3.0);
        let pairs = cube_corners()
            .into_iter()
            .map(|p| LandmarkPair3D::new(p + offset, p))
            .collect::<Vec<_>>();
        let coefs = solve_coefficients(&pairs)?;

        let config = WarpConfiguration::default()
            .with_rotation(false)
            .with_scale(false);

        let mut rng = StdRng::seed_from_u64(3);
        let points = random_points(&mut rng, 16);
        let warped = warp_points(&coefs, &points, &config);

        for (w, p) in warped.iter().zip(&points) {
            assert_vec3_eq(*w, *p - offset, 1e-4);
        }
        Ok(())
    }

    #[test]
    fn test_translation_gate_suppresses_bias() -> Result<(), Box<dyn std::error::Error>> {
        let offset = Vec3::new(-4.0, 0.5, 2.0);
        let pairs = bent_cube_pairs();
        let shifted = pairs
            .iter()
            .map(|p| LandmarkPair3D::new(p.source, p.destination + offset))
            .collect::<Vec<_>>();

        let coefs = solve_coefficients(&pairs)?;
        let coefs_shifted = solve_coefficients(&shifted)?;

        let config = WarpConfiguration::default()
            .with_translation(false)
            .with_rotation(false)
            .with_scale(false);

        let mut rng = StdRng::seed_from_u64(4);
        let points = random_points(&mut rng, 32);
        let a = warp_points(&coefs, &points, &config);
        let b = warp_points(&coefs_shifted, &points, &config);

        for (pa, pb) in a.iter().zip(&b) {
            assert_vec3_eq(*pa, *pb, 1e-4);
        }
        Ok(())
    }

    #[test]
    fn test_scale_and_rotation_gates() -> Result<(), Box<dyn std::error::Error>> {
        // destination = 2 * R_z(90deg) * source
        let pairs = cube_corners()
            .into_iter()
            .map(|p| LandmarkPair3D::new(p, 2.0 * Vec3::new(-p.y, p.x, p.z)))
            .collect::<Vec<_>>();
        let coefs = solve_coefficients(&pairs)?;
        let p = Vec3::new(0.5, 0.25, 1.0);

        // rotation only
        let no_scale = WarpConfiguration::default().with_scale(false);
        assert_vec3_eq(
            warp_point_with_config(&coefs, p, &no_scale),
            Vec3::new(-p.y, p.x, p.z),
            1e-4,
        );

        // scale only
        let no_rotation = WarpConfiguration::default().with_rotation(false);
        assert_vec3_eq(
            warp_point_with_config(&coefs, p, &no_rotation),
            2.0 * p,
            1e-4,
        );

        // neither
        let neither = no_scale.with_rotation(false);
        assert_vec3_eq(warp_point_with_config(&coefs, p, &neither), p, 1e-4);
        Ok(())
    }

    #[test]
    fn test_non_affine_gate() -> Result<(), Box<dyn std::error::Error>> {
        let coefs = solve_coefficients(&bent_cube_pairs())?;
        let p = Vec3::new(0.2, 0.7, 0.4);

        let config = WarpConfiguration::default().with_non_affine_warp(false);
        let affine_only = warp_point_with_config(&coefs, p, &config);

        let expected = (coefs.bias() + coefs.linear() * p.as_dvec3()).as_vec3();
        assert_vec3_eq(affine_only, expected, 1e-5);
        Ok(())
    }

    #[test]
    fn test_source_prescale() -> Result<(), Box<dyn std::error::Error>> {
        let coefs = solve_coefficients(&bent_cube_pairs())?;
        let p = Vec3::new(300.0, 600.0, 200.0);

        let config = WarpConfiguration::default().with_prescale(0.001, 1.0);
        let warped = warp_point_with_config(&coefs, p, &config);

        assert_vec3_eq(warped, warp_point(&coefs, p * 0.001), 1e-5);

        let unblended = warp_point_with_config(&coefs, p, &config.with_blend_factor(0.0));
        assert_vec3_eq(unblended, p * 0.001, 1e-6);
        Ok(())
    }

    #[test]
    fn test_parallel_matches_serial() -> Result<(), Box<dyn std::error::Error>> {
        let coefs = solve_coefficients(&bent_cube_pairs())?;
        let config = WarpConfiguration::default().with_blend_factor(0.75);

        let mut rng = StdRng::seed_from_u64(5);
        let points = random_points(&mut rng, PARALLEL_MIN_POINTS + 10);

        let mut parallel = points.clone();
        warp_in_place(&coefs, &mut parallel, &config);

        let serial = points
            .iter()
            .map(|p| warp_point_with_config(&coefs, *p, &config))
            .collect::<Vec<_>>();

        assert_eq!(parallel, serial);
        Ok(())
    }

    #[test]
    fn test_concurrent_warps_share_coefficients() -> Result<(), Box<dyn std::error::Error>> {
        let coefs = std::sync::Arc::new(solve_coefficients(&bent_cube_pairs())?);
        let config = WarpConfiguration::default();

        let handles = (0..4)
            .map(|i| {
                let coefs = coefs.clone();
                std::thread::spawn(move || {
                    let mut points = vec![Vec3::splat(i as f32 * 0.1); 100];
                    warp_in_place(&coefs, &mut points, &config);
                    points
                })
            })
            .collect::<Vec<_>>();

        for (i, handle) in handles.into_iter().enumerate() {
            let points = handle.join().map_err(|_| "warp thread panicked")?;
            let expected = warp_point(&coefs, Vec3::splat(i as f32 * 0.1));
            for p in points {
                assert_vec3_eq(p, expected, 1e-5);
            }
        }
        Ok(())
    }
}
