//! Renderable overlay primitives: cylinders standing in for line segments,
//! spheres marking points, and plain line sets.

use crate::color::Color;
use crate::mesh::TriangleMesh;
use crate::{Result, ViewerError};
use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
use std::f32::consts::PI;

/// Sides of every segment cylinder.
pub const CYLINDER_RESOLUTION: usize = 8;

/// Latitude bands of every marker sphere.
pub const SPHERE_RESOLUTION: usize = 20;

/// Below this the segment direction is treated as exactly (anti-)parallel to +Z.
const AXIS_TOLERANCE: f32 = 1e-6;

/// Cylinder spanning `start`→`end`.
///
/// `mesh.vertices[0]` sits on `start` and `mesh.vertices[1]` on `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    pub start: Point3<f32>,
    pub end: Point3<f32>,
    pub radius: f32,
    pub color: Color,
    pub mesh: TriangleMesh,
}

impl Cylinder {
    pub fn length(&self) -> f32 {
        (self.start - self.end).norm()
    }

    pub fn midpoint(&self) -> Point3<f32> {
        nalgebra::center(&self.start, &self.end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub center: Point3<f32>,
    pub radius: f32,
    pub color: Color,
    pub mesh: TriangleMesh,
}

/// Vertices plus index pairs, drawn as thin lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineSet {
    pub points: Vec<Point3<f32>>,
    pub lines: Vec<[usize; 2]>,
    pub color: Color,
}

impl LineSet {
    pub fn new(points: Vec<Point3<f32>>, lines: Vec<[usize; 2]>, color: Color) -> Self {
        Self {
            points,
            lines,
            color,
        }
    }

    pub fn paint_uniform_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// End points of every line.
    pub fn segments(&self) -> impl Iterator<Item = (Point3<f32>, Point3<f32>)> + '_ {
        self.lines
            .iter()
            .map(|&[a, b]| (self.points[a], self.points[b]))
    }
}

/// Minimal rotation taking +Z onto `direction`.
///
/// The rotation axis `Ẑ × direction` vanishes when `direction` is parallel or
/// anti-parallel to +Z. Parallel yields the identity; anti-parallel yields a
/// half turn about +X.
pub fn rotation_from_z(direction: &Unit<Vector3<f32>>) -> UnitQuaternion<f32> {
    let z = Vector3::z();
    let direction: &Vector3<f32> = direction.as_ref();
    let cos_angle = z.dot(direction).clamp(-1.0, 1.0);

    if cos_angle >= 1.0 - AXIS_TOLERANCE {
        return UnitQuaternion::identity();
    }
    if cos_angle <= -1.0 + AXIS_TOLERANCE {
        return UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI);
    }

    let axis = Unit::new_normalize(z.cross(direction));
    UnitQuaternion::from_axis_angle(&axis, cos_angle.acos())
}

/// Build a cylinder whose axis spans `start`→`end`.
///
/// The mesh is generated along +Z with [`CYLINDER_RESOLUTION`] sides, rotated
/// so +Z maps to `(start - end) / length`, then moved to the segment midpoint.
pub fn build_cylinder(
    start: Point3<f32>,
    end: Point3<f32>,
    radius: f32,
    color: Color,
) -> Result<Cylinder> {
    let offset = start - end;
    let length = offset.norm();
    if length <= f32::EPSILON {
        return Err(ViewerError::DegenerateSegment {
            at: [start.x, start.y, start.z],
        });
    }

    let direction = Unit::new_unchecked(offset / length);
    let mut mesh = TriangleMesh::create_cylinder(radius, length, CYLINDER_RESOLUTION);
    mesh.rotate(&rotation_from_z(&direction));
    mesh.translate(&nalgebra::center(&start, &end).coords);
    mesh.paint_uniform_color(color);

    Ok(Cylinder {
        start,
        end,
        radius,
        color,
        mesh,
    })
}

/// Build a sphere marker at `center`.
pub fn build_sphere(center: Point3<f32>, radius: f32, color: Color) -> Sphere {
    let mut mesh = TriangleMesh::create_sphere(radius, SPHERE_RESOLUTION);
    mesh.translate(&center.coords);
    mesh.paint_uniform_color(color);

    Sphere {
        center,
        radius,
        color,
        mesh,
    }
}
