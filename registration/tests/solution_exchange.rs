use cv_core::{CorrespondenceSet, InlierIndexSet, RigidTransform};
use cv_registration::{
    read_solution, write_solution, KcpParams, PrecomputedSolver, RegistrationSolution,
    RegistrationSolver,
};
use nalgebra::{Point3, Rotation3, Vector3};

fn sample_solution() -> RegistrationSolution {
    let correspondences = CorrespondenceSet::new(
        vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)],
        vec![Point3::new(0.0, 0.0, 1.0), Point3::new(2.0, 2.0, 2.0)],
    )
    .unwrap()
    .with_indices(vec![10, 11], vec![20, 21])
    .unwrap();

    RegistrationSolution {
        transform: RigidTransform::from_rotation_translation(
            &Rotation3::from_axis_angle(&Vector3::z_axis(), 0.25),
            &Vector3::new(1.0, -2.0, 0.5),
        ),
        initial_correspondences: correspondences,
        inlier_indices: InlierIndexSet::new(vec![1]),
    }
}

#[test]
fn test_exported_solution_is_replayed_by_precomputed_solver() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kcp_solution.json");
    let params = KcpParams::default();
    let solution = sample_solution();

    write_solution(&path, &solution, Some(&params)).unwrap();

    let (read_back, recorded) = read_solution(&path).unwrap();
    assert_eq!(recorded, Some(params.clone()));
    assert_eq!(
        read_back.initial_correspondences.indices(),
        Some((&[10usize, 11][..], &[20usize, 21][..]))
    );

    let mut solver = PrecomputedSolver::open(&path, &params).unwrap();
    let replayed = solver
        .solve(
            &Default::default(),
            &Default::default(),
            &Default::default(),
            &Default::default(),
        )
        .unwrap();
    assert_eq!(replayed.inlier_indices, solution.inlier_indices);
    assert_eq!(
        replayed.initial_correspondences.source(),
        solution.initial_correspondences.source()
    );
    approx::assert_relative_eq!(
        *replayed.transform.matrix(),
        *solution.transform.matrix(),
        epsilon = 1e-6
    );
}

#[test]
fn test_solution_display_mentions_counts() {
    let text = sample_solution().to_string();
    assert!(text.starts_with("2 initial correspondences, 1 inliers"));
}
