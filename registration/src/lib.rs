//! Point cloud registration collaborator
//!
//! The keypoint extraction and robust transformation solver live outside
//! this workspace. This crate defines how the rest of the workspace talks
//! to them:
//! - [`RegistrationSolver`]: corner extraction + transform estimation
//! - [`KcpParams`]: solver configuration (`k`, TEASER noise bound, ...)
//! - [`RegistrationSolution`]: transform, initial correspondences, inliers
//! - [`PrecomputedSolver`]: replays a solution exported by an external run
//! - [`evaluate_solution`]: residual statistics of a solution

pub mod evaluation;
pub mod params;
pub mod precomputed;
pub mod solver;

pub use evaluation::{evaluate_solution, SolutionReport};
pub use params::{KcpParams, RotationEstimationAlgorithm, TeaserParams};
pub use precomputed::{read_solution, write_solution, PrecomputedSolver};
pub use solver::{RegistrationSolution, RegistrationSolver};

use std::path::PathBuf;

/// Registration error types
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Solver unavailable: {reason} ({path})")]
    Unavailable { path: PathBuf, reason: String },

    #[error("Invalid solution: {0}")]
    InvalidSolution(String),

    #[error(transparent)]
    Core(#[from] cv_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SolverError>;
