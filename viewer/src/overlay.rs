//! Correspondence overlays: every candidate pair as a thin line, and the
//! inlier subset as cylinders with end-point markers.

use crate::color::Color;
use crate::primitives::{build_cylinder, build_sphere, Cylinder, LineSet, Sphere};
use crate::{Result, ViewerError};
use cv_core::{CorrespondenceSet, InlierIndexSet};

/// Cylinders and markers for the inlier correspondences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlierOverlay {
    /// One per inlier, in inlier order, minus the degenerate ones.
    pub cylinders: Vec<Cylinder>,
    /// One per inlier, in inlier order, centered on the target point.
    pub spheres: Vec<Sphere>,
    /// Inlier indices whose source and target points coincide.
    pub skipped: Vec<usize>,
}

/// Line set joining `source()[i]` (vertex `i`) to `target()[i]` (vertex `i + N`).
pub fn build_initial_overlay(corr: &CorrespondenceSet) -> Result<LineSet> {
    if corr.is_empty() {
        return Err(ViewerError::EmptyCorrespondences);
    }

    let n = corr.len();
    let mut points = Vec::with_capacity(2 * n);
    points.extend_from_slice(corr.source());
    points.extend_from_slice(corr.target());
    let lines = (0..n).map(|i| [i, i + n]).collect();

    Ok(LineSet::new(points, lines, Color::CORRESPONDENCE))
}

/// Build one cylinder (source→target) and one sphere (at target) per inlier.
///
/// Every index is range-checked before anything is built. A coincident pair
/// cannot be drawn as a cylinder; it is logged, recorded in
/// [`InlierOverlay::skipped`], and still gets its marker.
pub fn build_inlier_overlay(
    corr: &CorrespondenceSet,
    inliers: &InlierIndexSet,
    line_radius: f32,
    sphere_radius: f32,
    color: Color,
) -> Result<InlierOverlay> {
    if let Some(index) = inliers.first_out_of_range(corr.len()) {
        return Err(ViewerError::IndexOutOfRange {
            index,
            len: corr.len(),
        });
    }

    let mut overlay = InlierOverlay {
        cylinders: Vec::with_capacity(inliers.len()),
        spheres: Vec::with_capacity(inliers.len()),
        skipped: Vec::new(),
    };

    for idx in inliers.iter() {
        let start = corr.source()[idx];
        let end = corr.target()[idx];

        match build_cylinder(start, end, line_radius, color) {
            Ok(cylinder) => overlay.cylinders.push(cylinder),
            Err(err @ ViewerError::DegenerateSegment { .. }) => {
                tracing::warn!("inlier correspondence {idx} skipped: {err}");
                overlay.skipped.push(idx);
            }
            Err(err) => return Err(err),
        }
        overlay.spheres.push(build_sphere(end, sphere_radius, color));
    }

    tracing::debug!(
        "inlier overlay: {} cylinders, {} markers, {} skipped",
        overlay.cylinders.len(),
        overlay.spheres.len(),
        overlay.skipped.len()
    );
    Ok(overlay)
}
