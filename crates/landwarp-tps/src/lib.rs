#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Fitted thin-plate spline coefficients.
pub mod coefficients;

/// Warp evaluation configuration.
pub mod config;

/// Error types for the thin-plate spline solver.
pub mod error;

/// Radial basis kernel shared by fitting and evaluation.
pub mod kernel;

/// Thin-plate spline coefficient solver.
pub mod solver;

/// Thin-plate spline evaluation.
pub mod warp;

pub use coefficients::{TpsCoefficients3D, TpsNonAffineTerm3D};
pub use config::WarpConfiguration;
pub use error::SolveError;
pub use solver::solve_coefficients;
pub use warp::{warp_in_place, warp_point, warp_point_with_config, warp_points};
