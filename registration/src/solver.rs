use crate::Result;
use cv_core::{CorrespondenceSet, InlierIndexSet, PointCloud, RigidTransform};
use std::fmt;

/// Everything a solver run hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationSolution {
    /// Maps the source frame onto the target frame.
    pub transform: RigidTransform,
    /// Candidate correspondences built from the feature clouds.
    pub initial_correspondences: CorrespondenceSet,
    /// Indices into `initial_correspondences` that survived outlier pruning.
    pub inlier_indices: InlierIndexSet,
}

impl fmt::Display for RegistrationSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} initial correspondences, {} inliers",
            self.initial_correspondences.len(),
            self.inlier_indices.len()
        )?;
        write!(f, "{}", self.transform)
    }
}

/// External keypoint-based registration solver.
///
/// Implementations wrap a native KCP-TEASER build, a service, or a recorded
/// run. Construction is where an unavailable back-end must be reported.
pub trait RegistrationSolver {
    /// Reduce a dense cloud to its salient corner points.
    fn extract_corner_points(&self, cloud: &PointCloud) -> Result<PointCloud>;

    /// Estimate the transform taking `source` onto `target`.
    fn solve(
        &mut self,
        source: &PointCloud,
        target: &PointCloud,
        source_features: &PointCloud,
        target_features: &PointCloud,
    ) -> Result<RegistrationSolution>;
}
