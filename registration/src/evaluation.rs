use crate::solver::RegistrationSolution;

/// Residual statistics of a solution's correspondences under its own transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolutionReport {
    pub num_correspondences: usize,
    pub num_inliers: usize,
    /// Fraction of correspondences flagged as inliers (0-1).
    pub inlier_ratio: f32,
    /// RMSE of `‖T·source_i − target_i‖` over the inlier set.
    pub inlier_rmse: f32,
    /// Inliers whose residual is within the noise bound.
    pub within_noise_bound: usize,
}

/// Evaluate registration
///
/// Inlier indices outside the correspondence set are ignored here; the
/// overlay builders are responsible for rejecting them.
pub fn evaluate_solution(solution: &RegistrationSolution, noise_bound: f32) -> SolutionReport {
    let corr = &solution.initial_correspondences;

    let mut total_error = 0.0;
    let mut counted = 0;
    let mut within = 0;
    for idx in solution.inlier_indices.iter() {
        let Some((src, tgt)) = corr.pair(idx) else {
            continue;
        };
        let dist = (solution.transform.transform_point(&src) - tgt).norm();
        total_error += dist * dist;
        counted += 1;
        if dist <= noise_bound {
            within += 1;
        }
    }

    let inlier_ratio = if corr.is_empty() {
        0.0
    } else {
        solution.inlier_indices.len() as f32 / corr.len() as f32
    };
    let inlier_rmse = if counted > 0 {
        (total_error / counted as f32).sqrt()
    } else {
        0.0
    };

    SolutionReport {
        num_correspondences: corr.len(),
        num_inliers: solution.inlier_indices.len(),
        inlier_ratio,
        inlier_rmse,
        within_noise_bound: within,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cv_core::{CorrespondenceSet, InlierIndexSet, RigidTransform};
    use nalgebra::{Point3, Rotation3, Vector3};

    #[test]
    fn translation_only_solution_has_zero_inlier_error() {
        let shift = Vector3::new(0.0, 0.0, 1.0);
        let source = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(5.0, 5.0, 5.0),
        ];
        let mut target: Vec<_> = source.iter().map(|p| p + shift).collect();
        target[3] = Point3::new(-3.0, 0.0, 0.0);

        let solution = RegistrationSolution {
            transform: RigidTransform::from_rotation_translation(&Rotation3::identity(), &shift),
            initial_correspondences: CorrespondenceSet::new(source, target).unwrap(),
            inlier_indices: InlierIndexSet::new(vec![0, 1, 2]),
        };

        let report = evaluate_solution(&solution, 0.06);
        assert_eq!(report.num_correspondences, 4);
        assert_eq!(report.num_inliers, 3);
        assert_eq!(report.within_noise_bound, 3);
        assert_relative_eq!(report.inlier_ratio, 0.75);
        assert_relative_eq!(report.inlier_rmse, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn empty_solution_reports_zeros() {
        let solution = RegistrationSolution {
            transform: RigidTransform::identity(),
            initial_correspondences: CorrespondenceSet::default(),
            inlier_indices: InlierIndexSet::default(),
        };
        let report = evaluate_solution(&solution, 0.06);
        assert_eq!(report.inlier_ratio, 0.0);
        assert_eq!(report.inlier_rmse, 0.0);
    }
}
