use thiserror::Error;

/// Errors that can occur while fitting a thin-plate spline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SolveError {
    /// No fully paired landmarks were provided.
    #[error("no landmark correspondences were provided, at least one fully paired landmark is required")]
    NoCorrespondences,

    /// The assembled linear system is singular, e.g. two source landmarks share a position.
    #[error("thin-plate spline system is singular (numerical rank {rank}, expected {expected}), check for duplicate or degenerate source landmarks")]
    SingularSystem {
        /// The numerical rank of the system matrix.
        rank: usize,
        /// The rank required for a unique radial part.
        expected: usize,
    },
}
