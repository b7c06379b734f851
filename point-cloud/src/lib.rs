//! Point cloud preprocessing
//!
//! Scans straight from a vehicle-mounted LiDAR carry two kinds of clutter
//! that hurt keypoint extraction: returns from the ego vehicle itself and the
//! ground plane. This crate removes both before clouds reach the solver.
//!
//! ```ignore
//! use cv_point_cloud::{preprocess, PreprocessConfig};
//!
//! let cleaned = preprocess(&cloud, &PreprocessConfig::nuscenes());
//! ```

pub mod filtering;

pub use filtering::{remove_below_height, remove_inside_box, AxisAlignedBox};

use cv_core::PointCloud;
use serde::{Deserialize, Serialize};

/// Which preprocessing steps to run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Points inside this box (in the sensor frame) are dropped.
    pub ego_box: Option<AxisAlignedBox>,
    /// Points with `z` at or below this height are dropped.
    pub ground_height: Option<f32>,
}

impl PreprocessConfig {
    /// Settings for nuScenes LIDAR_TOP sweeps.
    pub fn nuscenes() -> Self {
        Self {
            ego_box: Some(AxisAlignedBox::new([-0.62, -1.10, f32::NEG_INFINITY], [0.62, 1.87, f32::INFINITY])),
            ground_height: Some(-1.5),
        }
    }

    pub fn disabled() -> Self {
        Self {
            ego_box: None,
            ground_height: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ego_box.is_some() || self.ground_height.is_some()
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self::nuscenes()
    }
}

/// Run every enabled step of `config` on `cloud`.
pub fn preprocess(cloud: &PointCloud, config: &PreprocessConfig) -> PointCloud {
    let before = cloud.len();
    let mut out = cloud.clone();

    if let Some(ego_box) = config.ego_box {
        out = remove_inside_box(&out, &ego_box);
    }
    if let Some(height) = config.ground_height {
        out = remove_below_height(&out, height);
    }

    tracing::debug!("preprocessing kept {} of {} points", out.len(), before);
    out
}
