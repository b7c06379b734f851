//! Integration tests for the preprocessing crate

use cv_core::PointCloud;
use cv_point_cloud::{preprocess, PreprocessConfig};
use nalgebra::Point3;

#[test]
fn test_preprocessing_a_ring_scan() {
    // A ring of returns around the sensor at three heights.
    let mut points = Vec::new();
    for i in 0..36 {
        let angle = (i as f32 * 10.0).to_radians();
        for (radius, z) in [(0.5, 0.0), (10.0, -1.8), (10.0, 0.5)] {
            points.push(Point3::new(radius * angle.cos(), radius * angle.sin(), z));
        }
    }
    let cloud = PointCloud::new(points);

    let cleaned = preprocess(&cloud, &PreprocessConfig::nuscenes());
    assert_eq!(cleaned.len(), 36);
    assert!(cleaned.points.iter().all(|p| p.z == 0.5));
}

#[test]
fn test_default_config_is_nuscenes() {
    let config = PreprocessConfig::default();
    assert_eq!(config, PreprocessConfig::nuscenes());
    assert!(config.is_enabled());
}
