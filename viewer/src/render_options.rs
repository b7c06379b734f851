//! Render options loaded from an Open3D-style JSON file.

use crate::color::Color;
use crate::{Result, ViewerError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest point splat or line width, in pixels.
pub const MAX_PIXEL_SIZE: f32 = 64.0;
/// Largest window side, in pixels.
pub const MAX_WINDOW_SIDE: u32 = 16384;

/// Pixel sizes below one, above [`MAX_PIXEL_SIZE`] or non-finite are pulled into range.
pub(crate) fn clamp_pixel_size(size: f32) -> f32 {
    if size.is_finite() {
        size.clamp(1.0, MAX_PIXEL_SIZE)
    } else {
        1.0
    }
}

/// Subset of Open3D's `RenderOption` that the software renderer honors.
///
/// Keys not listed here are ignored, so files saved by Open3D load as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub background_color: Color,
    /// Point splat edge length in pixels.
    pub point_size: f32,
    pub line_width: f32,
    pub show_coordinate_frame: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            background_color: Color::WHITE,
            point_size: 1.0,
            line_width: 1.0,
            show_coordinate_frame: false,
            width: 1280,
            height: 720,
        }
    }
}

impl RenderOptions {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let err = |reason: String| ViewerError::RenderOptions {
            path: path.to_path_buf(),
            reason,
        };

        let text = std::fs::read_to_string(path).map_err(|e| err(e.to_string()))?;
        let mut options: Self = serde_json::from_str(&text).map_err(|e| err(e.to_string()))?;
        if options.width == 0 || options.height == 0 {
            return Err(err(format!(
                "window size {}x{} is empty",
                options.width, options.height
            )));
        }
        if options.width > MAX_WINDOW_SIDE || options.height > MAX_WINDOW_SIDE {
            return Err(err(format!(
                "window size {}x{} exceeds {MAX_WINDOW_SIDE} pixels per side",
                options.width, options.height
            )));
        }

        for (name, size) in [
            ("point_size", &mut options.point_size),
            ("line_width", &mut options.line_width),
        ] {
            let clamped = clamp_pixel_size(*size);
            if clamped != *size {
                tracing::warn!("{name} {} clamped to {clamped}", *size);
                *size = clamped;
            }
        }

        tracing::debug!("loaded render options from {}", path.display());
        Ok(options)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self).map_err(|e| ViewerError::RenderOptions {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
