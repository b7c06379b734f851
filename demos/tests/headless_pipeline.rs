use cv_core::{CorrespondenceSet, InlierIndexSet, PointCloud, RigidTransform};
use cv_registration::{write_solution, KcpParams, RegistrationSolution, SolverError};
use cv_viewer::ViewerError;
use kcp_demos::{prepare, run, Args, DemoError};
use nalgebra::{Point3, Rotation3, Vector3};
use std::path::Path;
use tempfile::TempDir;

fn write_inputs(dir: &Path, inliers: Vec<usize>) -> Args {
    let source = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(3.0, 0.0, 0.0),
    ];
    let target = vec![
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(2.0, 2.0, 2.0),
        Point3::new(3.0, 0.0, 1.0),
    ];

    let args = Args {
        source: dir.join("source.pcd"),
        target: dir.join("target.pcd"),
        solution: dir.join("solution.json"),
        render_options: dir.join("render_option.json"),
        snapshot: dir.join("snapshot.png"),
        k: 2,
        noise_bound: 0.06,
        no_preprocess: true,
        headless: true,
        log_level: None,
        threads: None,
    };

    cv_io::write_point_cloud(&args.source, &PointCloud::new(source.clone())).unwrap();
    cv_io::write_point_cloud(&args.target, &PointCloud::new(target.clone())).unwrap();

    let solution = RegistrationSolution {
        transform: RigidTransform::from_rotation_translation(
            &Rotation3::identity(),
            &Vector3::new(0.0, 0.0, 1.0),
        ),
        initial_correspondences: CorrespondenceSet::new(source, target).unwrap(),
        inlier_indices: InlierIndexSet::new(inliers),
    };
    write_solution(&args.solution, &solution, Some(&KcpParams::new(2, 0.06))).unwrap();

    std::fs::write(
        &args.render_options,
        r#"{ "background_color": [1.0, 1.0, 1.0], "point_size": 2.0, "width": 64, "height": 48 }"#,
    )
    .unwrap();

    args
}

#[test]
fn headless_run_writes_snapshot() {
    let dir = TempDir::new().unwrap();
    let args = write_inputs(dir.path(), vec![0, 2]);

    run(&args).unwrap();

    let image = image_dimensions(&args.snapshot);
    assert_eq!(image, (64, 48));
}

#[test]
fn prepared_session_starts_on_final_result() {
    let dir = TempDir::new().unwrap();
    let args = write_inputs(dir.path(), vec![1]);

    let (machine, display, options) = prepare(&args).unwrap();
    assert_eq!(machine.current_state(), Some(cv_viewer::ViewState::ResultFinal));
    assert_eq!(display.geometries().len(), 2);
    assert_eq!(options.width, 64);
    assert_eq!(
        machine.context().source_transformed().points[1],
        Point3::new(1.0, 1.0, 2.0)
    );
}

#[test]
fn missing_solution_reports_unavailable_solver() {
    let dir = TempDir::new().unwrap();
    let mut args = write_inputs(dir.path(), vec![1]);
    args.solution = dir.path().join("absent.json");

    let err = run(&args).unwrap_err();
    assert!(matches!(
        err,
        DemoError::Solver(SolverError::Unavailable { .. })
    ));
    assert!(!args.snapshot.exists());
}

#[test]
fn missing_render_options_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut args = write_inputs(dir.path(), vec![1]);
    args.render_options = dir.path().join("absent.json");

    let err = run(&args).unwrap_err();
    assert!(matches!(err, DemoError::Viewer(ViewerError::RenderOptions { .. })));
}

#[test]
fn out_of_range_inlier_aborts_setup() {
    let dir = TempDir::new().unwrap();
    let args = write_inputs(dir.path(), vec![1, 3]);

    let err = run(&args).unwrap_err();
    assert!(matches!(
        err,
        DemoError::Viewer(ViewerError::IndexOutOfRange { index: 3, len: 3 })
    ));
}

#[test]
fn unreadable_cloud_names_the_file() {
    let dir = TempDir::new().unwrap();
    let mut args = write_inputs(dir.path(), vec![1]);
    args.source = dir.path().join("source.ply");

    let err = run(&args).unwrap_err();
    assert!(matches!(err, DemoError::Load { .. }));
    assert!(err.to_string().contains("source.ply"));
}

fn image_dimensions(path: &Path) -> (u32, u32) {
    let bytes = std::fs::read(path).unwrap();
    // PNG IHDR: width and height are the big-endian u32s at offsets 16 and 20.
    assert_eq!(&bytes[1..4], b"PNG");
    let be = |at: usize| u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
    (be(16), be(20))
}
