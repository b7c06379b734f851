//! The surface views are drawn on.

use crate::raster::{Camera, Rasterizer};
use crate::render_options::RenderOptions;
use crate::scene::Geometry;
use crate::{Result, ViewerError};
use image::RgbImage;
use std::path::Path;

/// Geometry sink driven by the view-state machine.
pub trait ViewerBackend {
    /// Remove everything currently displayed.
    fn clear_geometry(&mut self);

    fn add_geometry(&mut self, geometry: &Geometry);

    /// Write the current frame to `path`, replacing any existing file.
    fn capture_frame(&mut self, path: &Path) -> Result<()>;
}

/// Retained geometry list rendered with the software rasterizer.
///
/// Used directly for headless runs and as the model behind the native window.
#[derive(Debug, Clone)]
pub struct DisplayList {
    geometries: Vec<Geometry>,
    camera: Camera,
    rasterizer: Rasterizer,
    revision: u64,
}

impl DisplayList {
    pub fn new(options: &RenderOptions) -> Self {
        Self {
            geometries: Vec::new(),
            camera: Camera::default(),
            rasterizer: Rasterizer::new(options),
            revision: 0,
        }
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        self.revision += 1;
        &mut self.camera
    }

    /// Bumped whenever the rendered frame would change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.rasterizer.size() != (width.max(1), height.max(1)) {
            self.rasterizer = self.rasterizer.clone().with_size(width, height);
            self.revision += 1;
        }
    }

    pub fn render(&self) -> RgbImage {
        self.rasterizer.render(&self.camera, &self.geometries)
    }
}

impl ViewerBackend for DisplayList {
    fn clear_geometry(&mut self) {
        self.geometries.clear();
        self.revision += 1;
    }

    fn add_geometry(&mut self, geometry: &Geometry) {
        self.geometries.push(geometry.clone());
        // Reframe on the new bounds but keep the orbit angles.
        let fitted = Camera::fit(&self.geometries);
        self.camera.target = fitted.target;
        self.camera.distance = fitted.distance;
        self.camera.scene_radius = fitted.scene_radius;
        self.revision += 1;
    }

    fn capture_frame(&mut self, path: &Path) -> Result<()> {
        let image = self.render();
        image.save(path).map_err(|e| ViewerError::Snapshot {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::info!("saved snapshot to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::primitives::build_sphere;
    use cv_core::PointCloud;
    use nalgebra::Point3;
    use std::sync::Arc;

    fn options() -> RenderOptions {
        RenderOptions {
            width: 40,
            height: 30,
            ..Default::default()
        }
    }

    #[test]
    fn clear_then_add_replaces_contents() {
        let mut list = DisplayList::new(&options());
        let cloud = Geometry::PointCloud(Arc::new(PointCloud::new(vec![Point3::origin()])));
        list.add_geometry(&cloud);
        list.add_geometry(&cloud);
        assert_eq!(list.geometries().len(), 2);

        let before = list.revision();
        list.clear_geometry();
        assert!(list.geometries().is_empty());
        assert!(list.revision() > before);
    }

    #[test]
    fn capture_writes_png_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.png");
        let mut list = DisplayList::new(&options());
        list.add_geometry(&Geometry::Sphere(Arc::new(build_sphere(
            Point3::origin(),
            0.2,
            Color::INLIER,
        ))));

        list.capture_frame(&path).unwrap();
        list.capture_frame(&path).unwrap();

        let image = image::open(&path).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (40, 30));
        assert_eq!(list.geometries().len(), 1);
    }

    #[test]
    fn capture_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = DisplayList::new(&options());
        let err = list
            .capture_frame(&dir.path().join("missing").join("snapshot.png"))
            .unwrap_err();
        assert!(matches!(err, ViewerError::Snapshot { .. }));
    }
}
