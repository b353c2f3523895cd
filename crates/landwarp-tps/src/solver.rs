use faer::Mat;
use glam::{DMat3, DVec3};
use landwarp_landmarks::LandmarkPair3D;

use crate::coefficients::{TpsCoefficients3D, TpsNonAffineTerm3D};
use crate::error::SolveError;
use crate::kernel::radial_basis;

/// Landmarks are single precision, anything finer than this is noise.
const INPUT_EPSILON: f64 = f32::EPSILON as f64;

/// Number of affine unknowns per output dimension: `[1, x, y, z]`.
const NUM_AFFINE_TERMS: usize = 4;

/// Singular values at or below this are treated as zero.
///
/// Scaled by the largest singular value and the matrix dimension, so systems
/// that are only invertible below single precision count as singular.
fn rank_tolerance(s: faer::ColRef<'_, f64>, dim: usize) -> f64 {
    let s_max = (0..s.nrows()).map(|i| s.read(i)).fold(0.0, f64::max);
    s_max * INPUT_EPSILON * dim as f64
}

/// Count the singular values of `s` that are numerically non-zero.
fn numerical_rank(s: faer::ColRef<'_, f64>, dim: usize) -> usize {
    let tol = rank_tolerance(s, dim);
    (0..s.nrows()).filter(|&i| s.read(i) > tol).count()
}

/// Solve the thin-plate spline coefficients for a set of correspondences.
///
/// Builds the classic `(n+4) x (n+4)` system
///
/// ```text
/// | K   P | | w |   | v |
/// | P^T 0 | | a | = | 0 |
/// ```
///
/// where `K[i][j] = U(||s_i - s_j||)`, `P` holds `[1, x, y, z]` for every source
/// point `s_i` and `v` holds the displacements `d_i - s_i`. The matrix is
/// decomposed once (SVD) and solved for the x, y and z right-hand sides, and the
/// identity is added back to the linear part.
///
/// When the source points span fewer than three dimensions (e.g. fewer than four
/// points, or all points on a plane) the affine part is under-determined. The
/// minimum-norm displacement is returned, so directions the landmarks do not
/// constrain are left untouched.
///
/// # Arguments
///
/// * `correspondences` - Fully paired source/destination positions.
///
/// # Returns
///
/// The fitted coefficients, or an error if there are no correspondences or the
/// source points are degenerate (e.g. duplicated or closer than single precision
/// can tell apart).
///
/// Example:
///
/// ```
/// use glam::Vec3;
/// use landwarp_landmarks::LandmarkPair3D;
/// use landwarp_tps::solve_coefficients;
///
/// let pairs = [
///     LandmarkPair3D::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
///     LandmarkPair3D::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)),
///     LandmarkPair3D::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)),
///     LandmarkPair3D::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 1.0)),
/// ];
/// let coefs = solve_coefficients(&pairs).unwrap();
/// assert_eq!(coefs.num_control_points(), 4);
/// ```
pub fn solve_coefficients(
    correspondences: &[LandmarkPair3D],
) -> Result<TpsCoefficients3D, SolveError> {
    let n = correspondences.len();
    if n == 0 {
        return Err(SolveError::NoCorrespondences);
    }

    let now = std::time::Instant::now();

    let sources = correspondences
        .iter()
        .map(|c| c.source.as_dvec3())
        .collect::<Vec<_>>();
    let displacements = correspondences
        .iter()
        .map(|c| c.destination.as_dvec3() - c.source.as_dvec3())
        .collect::<Vec<_>>();

    let size = n + NUM_AFFINE_TERMS;

    // construct matrix L, the bottom-right 4x4 block stays zero
    let mut mat_l = Mat::<f64>::zeros(size, size);
    for (row, pi) in sources.iter().enumerate() {
        // K block (upper-left)
        for (col, pj) in sources.iter().enumerate() {
            mat_l.write(row, col, radial_basis(*pi, *pj));
        }

        // P block (upper-right) and its transpose (bottom-left)
        let basis = [1.0, pi.x, pi.y, pi.z];
        for (k, value) in basis.into_iter().enumerate() {
            mat_l.write(row, n + k, value);
            mat_l.write(n + k, row, value);
        }
    }

    // one right-hand side column per output dimension, padded with zeros
    let mut rhs = Mat::<f64>::zeros(size, 3);
    for (row, d) in displacements.iter().enumerate() {
        rhs.write(row, 0, d.x);
        rhs.write(row, 1, d.y);
        rhs.write(row, 2, d.z);
    }

    // the affine block alone may be rank deficient (coplanar points), the
    // radial block must not be (duplicated points)
    let mat_p = Mat::<f64>::from_fn(n, NUM_AFFINE_TERMS, |i, j| mat_l.read(i, n + j));
    let rank_p = numerical_rank(mat_p.svd().s_diagonal(), n.max(NUM_AFFINE_TERMS));

    let svd = mat_l.svd();
    let s = svd.s_diagonal();
    let rank_l = numerical_rank(s, size);
    let expected = n + rank_p;

    log::debug!(
        "tps system: {} correspondences, size {}x{}, rank {} (expected {})",
        n,
        size,
        size,
        rank_l,
        expected
    );

    if rank_l < expected {
        return Err(SolveError::SingularSystem {
            rank: rank_l,
            expected,
        });
    }

    // minimum-norm solve: x = V * S^+ * U^T * b
    let (u, v) = (svd.u(), svd.v());
    let tol = rank_tolerance(s, size);

    let mut solution = Mat::<f64>::zeros(size, 3);
    for k in 0..s.nrows() {
        let sk = s.read(k);
        if sk <= tol {
            continue;
        }
        for dim in 0..3 {
            let ut_b = (0..size).map(|i| u.read(i, k) * rhs.read(i, dim)).sum::<f64>();
            let scale = ut_b / sk;
            for i in 0..size {
                solution.write(i, dim, solution.read(i, dim) + v.read(i, k) * scale);
            }
        }
    }

    let coef = |i: usize| {
        DVec3::new(
            solution.read(i, 0),
            solution.read(i, 1),
            solution.read(i, 2),
        )
    };

    // each column of the solution is [w_1, ..., w_n, a1, a2, a3, a4] of the
    // displacement field
    let affine = [
        coef(n),
        coef(n + 1) + DMat3::IDENTITY.x_axis,
        coef(n + 2) + DMat3::IDENTITY.y_axis,
        coef(n + 3) + DMat3::IDENTITY.z_axis,
    ];
    let non_affine_terms = sources
        .iter()
        .enumerate()
        .map(|(i, control_point)| TpsNonAffineTerm3D::new(coef(i), *control_point))
        .collect::<Vec<_>>();

    let all_finite = affine.iter().all(|a| a.is_finite())
        && non_affine_terms.iter().all(|t| t.weight.is_finite());
    if !all_finite {
        return Err(SolveError::SingularSystem {
            rank: rank_l,
            expected,
        });
    }

    log::debug!("tps solve elapsed: {:?}", now.elapsed());

    Ok(TpsCoefficients3D::new(affine, non_affine_terms))
}
