//! Mask-based point filters.

use cv_core::PointCloud;
use nalgebra::Point3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Closed axis-aligned box given by its min and max corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisAlignedBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl AxisAlignedBox {
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: &Point3<f32>) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }
}

/// Drop every point inside `region` (boundary included).
pub fn remove_inside_box(cloud: &PointCloud, region: &AxisAlignedBox) -> PointCloud {
    let mask: Vec<bool> = cloud.points.par_iter().map(|p| !region.contains(p)).collect();
    cloud.select(&mask)
}

/// Drop every point with `z <= height`.
pub fn remove_below_height(cloud: &PointCloud, height: f32) -> PointCloud {
    let mask: Vec<bool> = cloud.points.par_iter().map(|p| p.z > height).collect();
    cloud.select(&mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_boundary_counts_as_inside() {
        let region = AxisAlignedBox::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        assert!(region.contains(&Point3::new(1.0, 0.5, 0.0)));
        assert!(!region.contains(&Point3::new(1.01, 0.5, 0.0)));
    }

    #[test]
    fn filters_keep_colors_aligned() {
        let cloud = PointCloud::new(vec![Point3::new(0.0, 0.0, -3.0), Point3::new(0.0, 0.0, 3.0)])
            .with_colors(vec![Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0)])
            .unwrap();
        let above = remove_below_height(&cloud, 0.0);
        assert_eq!(above.colors, Some(vec![Point3::new(0.0, 0.0, 1.0)]));
    }
}
