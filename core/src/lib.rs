//! Core types shared by the registration inspection workspace.
//!
//! - [`PointCloud`]: ordered 3-D points with optional colors and normals
//! - [`RigidTransform`]: homogeneous 4×4 rotation + translation
//! - [`CorrespondenceSet`] / [`InlierIndexSet`]: solver output consumed by the viewer

pub mod correspondence;
pub mod error;
pub mod geometry;
pub mod point_cloud;

pub use correspondence::{CorrespondenceSet, InlierIndexSet};
pub use error::{Error, Result};
pub use geometry::RigidTransform;
pub use point_cloud::{PointCloud, PointCloudf32, PointCloudf64};
