//! KCP registration inspection toolkit.
//!
//! Umbrella crate re-exporting the workspace members.

pub use cv_core as core;
pub use cv_io as io;
pub use cv_point_cloud as point_cloud;
pub use cv_registration as registration;
pub use cv_viewer as viewer;
