use cv_core::{CorrespondenceSet, PointCloud, RigidTransform};
use nalgebra::{Point3, Rotation3, Vector3};

#[test]
fn test_point_cloud_attribute_counts() {
    let cloud = PointCloud::new(vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)]);

    let colored = cloud
        .clone()
        .with_colors(vec![Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)]);
    assert!(colored.is_ok());

    let bad_colors = cloud.clone().with_colors(vec![Point3::new(1.0, 0.0, 0.0)]);
    assert!(bad_colors.unwrap_err().to_string().contains("Color count"));

    let bad_normals = cloud.with_normals(vec![Vector3::new(0.0, 0.0, 1.0)]);
    assert!(bad_normals.unwrap_err().to_string().contains("Normal count"));
}

#[test]
fn test_transformed_cloud_keeps_uniform_color() {
    let red = Point3::new(1.0, 0.2, 0.2);
    let cloud = PointCloud::new(vec![Point3::new(1.0, 0.0, 0.0); 4]).with_uniform_color(red);
    let t = RigidTransform::from_rotation_translation(
        &Rotation3::identity(),
        &Vector3::new(0.0, 0.0, 5.0),
    );

    let moved = t.apply(&cloud);
    assert_eq!(moved.len(), 4);
    assert!(moved.points.iter().all(|p| *p == Point3::new(1.0, 0.0, 5.0)));
    assert_eq!(moved.colors, Some(vec![red; 4]));
}

#[test]
fn test_correspondence_length_mismatch_message() {
    let err = CorrespondenceSet::new(vec![Point3::origin()], Vec::new()).unwrap_err();
    assert!(err.to_string().contains("Length mismatch"));
}
