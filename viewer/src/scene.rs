//! Inspection scenes and the geometry they reference.

use crate::color::Color;
use crate::overlay::{build_initial_overlay, build_inlier_overlay, InlierOverlay};
use crate::primitives::{Cylinder, LineSet, Sphere};
use crate::{Result, ViewerError};
use cv_core::{CorrespondenceSet, InlierIndexSet, PointCloud, RigidTransform};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The five inspection views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewState {
    /// Source and target clouds, untransformed.
    RawClouds,
    /// Raw clouds plus every candidate correspondence.
    RawWithInitialCorrespondences,
    /// Raw clouds, candidate correspondences and inlier cylinders.
    RawWithInlierCorrespondences,
    /// Transformed source, target and inlier markers.
    ResultWithInlierMarkers,
    /// Transformed source and target only.
    ResultFinal,
}

impl ViewState {
    pub const ALL: [ViewState; 5] = [
        ViewState::RawClouds,
        ViewState::RawWithInitialCorrespondences,
        ViewState::RawWithInlierCorrespondences,
        ViewState::ResultWithInlierMarkers,
        ViewState::ResultFinal,
    ];

    /// 1-based position, used as the default key.
    pub fn number(self) -> u8 {
        match self {
            ViewState::RawClouds => 1,
            ViewState::RawWithInitialCorrespondences => 2,
            ViewState::RawWithInlierCorrespondences => 3,
            ViewState::ResultWithInlierMarkers => 4,
            ViewState::ResultFinal => 5,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.number() == n)
    }

    pub fn description(self) -> &'static str {
        match self {
            ViewState::RawClouds => "initial clouds",
            ViewState::RawWithInitialCorrespondences => "initial k closest points correspondences",
            ViewState::RawWithInlierCorrespondences => {
                "inlier correspondences by the maximum clique pruning method"
            }
            ViewState::ResultWithInlierMarkers => "registration result with inlier correspondences",
            ViewState::ResultFinal => "registration result",
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.number(), self.description())
    }
}

/// Shared handle to a piece of displayable geometry.
///
/// Equality is identity: two handles are equal when they point at the same
/// allocation, which is what scene comparisons care about.
#[derive(Debug, Clone)]
pub enum Geometry {
    PointCloud(Arc<PointCloud>),
    LineSet(Arc<LineSet>),
    Cylinder(Arc<Cylinder>),
    Sphere(Arc<Sphere>),
}

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::PointCloud(_) => "point cloud",
            Geometry::LineSet(_) => "line set",
            Geometry::Cylinder(_) => "cylinder",
            Geometry::Sphere(_) => "sphere",
        }
    }

    /// Vertices of the geometry, used for camera fitting.
    pub fn points(&self) -> &[Point3<f32>] {
        match self {
            Geometry::PointCloud(pc) => &pc.points,
            Geometry::LineSet(lines) => &lines.points,
            Geometry::Cylinder(c) => &c.mesh.vertices,
            Geometry::Sphere(s) => &s.mesh.vertices,
        }
    }
}

impl PartialEq for Geometry {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Geometry::PointCloud(a), Geometry::PointCloud(b)) => Arc::ptr_eq(a, b),
            (Geometry::LineSet(a), Geometry::LineSet(b)) => Arc::ptr_eq(a, b),
            (Geometry::Cylinder(a), Geometry::Cylinder(b)) => Arc::ptr_eq(a, b),
            (Geometry::Sphere(a), Geometry::Sphere(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// What is on screen: a view state and the geometry it shows, in draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    state: ViewState,
    geometries: Vec<Geometry>,
}

impl Scene {
    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    pub fn count(&self, kind: &str) -> usize {
        self.geometries.iter().filter(|g| g.kind() == kind).count()
    }
}

/// Colors and sizes used when building scene geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneStyle {
    pub source_color: Color,
    pub target_color: Color,
    pub correspondence_color: Color,
    pub inlier_color: Color,
    pub inlier_line_radius: f32,
    pub inlier_marker_radius: f32,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            source_color: Color::SOURCE,
            target_color: Color::TARGET,
            correspondence_color: Color::CORRESPONDENCE,
            inlier_color: Color::INLIER,
            inlier_line_radius: 0.08,
            inlier_marker_radius: 0.2,
        }
    }
}

/// All geometry the views draw from, built once before the event loop.
///
/// Overlays are optional so that a context can exist before (or without)
/// them; a view that needs a missing overlay refuses to compose.
#[derive(Debug, Clone)]
pub struct SceneContext {
    source: Arc<PointCloud>,
    source_transformed: Arc<PointCloud>,
    target: Arc<PointCloud>,
    initial_correspondences: Option<Arc<LineSet>>,
    inlier_lines: Option<Vec<Arc<Cylinder>>>,
    inlier_markers: Option<Vec<Arc<Sphere>>>,
}

impl SceneContext {
    /// Color the clouds and precompute the transformed source. No overlays.
    pub fn new(
        source: &PointCloud,
        target: &PointCloud,
        transform: &RigidTransform,
        style: &SceneStyle,
    ) -> Self {
        let source = source.clone().with_uniform_color(style.source_color.to_point());
        let target = target.clone().with_uniform_color(style.target_color.to_point());
        let source_transformed = transform.apply(&source);

        Self {
            source: Arc::new(source),
            source_transformed: Arc::new(source_transformed),
            target: Arc::new(target),
            initial_correspondences: None,
            inlier_lines: None,
            inlier_markers: None,
        }
    }

    /// Clouds plus every overlay, built eagerly.
    ///
    /// An empty correspondence set becomes an empty line set; an out-of-range
    /// inlier index aborts.
    pub fn build(
        source: &PointCloud,
        target: &PointCloud,
        transform: &RigidTransform,
        correspondences: &CorrespondenceSet,
        inliers: &InlierIndexSet,
        style: &SceneStyle,
    ) -> Result<Self> {
        let mut lines = match build_initial_overlay(correspondences) {
            Ok(lines) => lines,
            Err(ViewerError::EmptyCorrespondences) => {
                tracing::warn!("solver returned no correspondences; overlays will be empty");
                LineSet::default()
            }
            Err(err) => return Err(err),
        };
        lines.paint_uniform_color(style.correspondence_color);

        let inlier_overlay = build_inlier_overlay(
            correspondences,
            inliers,
            style.inlier_line_radius,
            style.inlier_marker_radius,
            style.inlier_color,
        )?;

        tracing::info!(
            "built overlays: {} correspondences, {} inlier cylinders, {} inlier markers",
            lines.lines.len(),
            inlier_overlay.cylinders.len(),
            inlier_overlay.spheres.len()
        );

        Ok(Self::new(source, target, transform, style)
            .with_initial_overlay(lines)
            .with_inlier_overlay(inlier_overlay))
    }

    pub fn with_initial_overlay(mut self, lines: LineSet) -> Self {
        self.initial_correspondences = Some(Arc::new(lines));
        self
    }

    pub fn with_inlier_overlay(mut self, overlay: InlierOverlay) -> Self {
        self.inlier_lines = Some(overlay.cylinders.into_iter().map(Arc::new).collect());
        self.inlier_markers = Some(overlay.spheres.into_iter().map(Arc::new).collect());
        self
    }

    pub fn source(&self) -> &PointCloud {
        &self.source
    }

    pub fn source_transformed(&self) -> &PointCloud {
        &self.source_transformed
    }

    pub fn target(&self) -> &PointCloud {
        &self.target
    }

    /// Assemble the geometry list for `state`.
    pub fn compose(&self, state: ViewState) -> Result<Scene> {
        let geometries = match state {
            ViewState::RawClouds => self.raw_clouds(),
            ViewState::RawWithInitialCorrespondences => {
                let mut g = self.raw_clouds();
                g.push(self.initial_lines(state)?);
                g
            }
            ViewState::RawWithInlierCorrespondences => {
                let mut g = self.raw_clouds();
                g.push(self.initial_lines(state)?);
                g.extend(self.cylinders(state)?);
                g
            }
            ViewState::ResultWithInlierMarkers => {
                let mut g = self.result_clouds();
                g.extend(self.markers(state)?);
                g
            }
            ViewState::ResultFinal => self.result_clouds(),
        };

        Ok(Scene { state, geometries })
    }

    fn raw_clouds(&self) -> Vec<Geometry> {
        vec![
            Geometry::PointCloud(Arc::clone(&self.source)),
            Geometry::PointCloud(Arc::clone(&self.target)),
        ]
    }

    fn result_clouds(&self) -> Vec<Geometry> {
        vec![
            Geometry::PointCloud(Arc::clone(&self.source_transformed)),
            Geometry::PointCloud(Arc::clone(&self.target)),
        ]
    }

    fn initial_lines(&self, state: ViewState) -> Result<Geometry> {
        self.initial_correspondences
            .as_ref()
            .map(|l| Geometry::LineSet(Arc::clone(l)))
            .ok_or(ViewerError::GeometryNotBuilt {
                state,
                missing: "initial correspondence lines",
            })
    }

    fn cylinders(&self, state: ViewState) -> Result<impl Iterator<Item = Geometry> + '_> {
        let lines = self.inlier_lines.as_ref().ok_or(ViewerError::GeometryNotBuilt {
            state,
            missing: "inlier correspondence cylinders",
        })?;
        Ok(lines.iter().map(|c| Geometry::Cylinder(Arc::clone(c))))
    }

    fn markers(&self, state: ViewState) -> Result<impl Iterator<Item = Geometry> + '_> {
        let markers = self.inlier_markers.as_ref().ok_or(ViewerError::GeometryNotBuilt {
            state,
            missing: "inlier correspondence markers",
        })?;
        Ok(markers.iter().map(|s| Geometry::Sphere(Arc::clone(s))))
    }
}
