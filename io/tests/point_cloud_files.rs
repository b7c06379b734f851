use cv_core::{Error, PointCloud};
use cv_io::{read_point_cloud, write_point_cloud};
use nalgebra::Point3;

#[test]
fn pcd_extension_is_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.PCD");
    let cloud = PointCloud::new(vec![Point3::new(1.5, -2.0, 0.25), Point3::new(0.0, 0.0, 0.0)])
        .with_uniform_color(Point3::new(1.0, 0.2, 0.2));

    write_point_cloud(&path, &cloud).unwrap();
    let back = read_point_cloud(&path).unwrap();

    assert_eq!(back.points, cloud.points);
    assert_eq!(back.len(), 2);
    assert!(back.colors.is_some());
}

#[test]
fn unknown_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_point_cloud(dir.path().join("scan.xyz")).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_point_cloud(dir.path().join("absent.pcd")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
