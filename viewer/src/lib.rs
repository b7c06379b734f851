//! Interactive inspection of a point-cloud registration result.
//!
//! Overlay geometry is built once from the solver output ([`overlay`]), the
//! five inspection views are composed from it ([`scene`]), and a key-driven
//! state machine swaps them on a [`ViewerBackend`].

pub mod backend;
pub mod color;
pub mod mesh;
pub mod overlay;
pub mod primitives;
pub mod raster;
pub mod render_options;
pub mod scene;
pub mod state_machine;

#[cfg(not(target_arch = "wasm32"))]
pub mod native_viewer;

pub use backend::{DisplayList, ViewerBackend};
pub use color::Color;
pub use mesh::TriangleMesh;
pub use overlay::{build_initial_overlay, build_inlier_overlay, InlierOverlay};
pub use primitives::{build_cylinder, build_sphere, Cylinder, LineSet, Sphere};
pub use raster::{Camera, Rasterizer};
pub use render_options::RenderOptions;
pub use scene::{Geometry, Scene, SceneContext, SceneStyle, ViewState};
pub use state_machine::{Control, KeyMap, Trigger, ViewStateMachine};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("Degenerate segment: start and end coincide at {at:?}")]
    DegenerateSegment { at: [f32; 3] },

    #[error("No correspondences to draw")]
    EmptyCorrespondences,

    #[error("Inlier index {index} out of range for {len} correspondences")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("View '{state}' needs {missing}, which was not built")]
    GeometryNotBuilt {
        state: ViewState,
        missing: &'static str,
    },

    #[error("Render options {path}: {reason}")]
    RenderOptions { path: PathBuf, reason: String },

    #[error("Snapshot {path}: {reason}")]
    Snapshot { path: PathBuf, reason: String },

    #[error("Window error: {0}")]
    Window(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
