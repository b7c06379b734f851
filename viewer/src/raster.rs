//! Software z-buffer renderer for scene snapshots and the window texture.

use crate::color::Color;
use crate::mesh::TriangleMesh;
use crate::primitives::LineSet;
use crate::render_options::{clamp_pixel_size, RenderOptions};
use crate::scene::Geometry;
use cv_core::PointCloud;
use image::{Rgb, RgbImage};
use nalgebra::{Isometry3, Matrix4, Perspective3, Point3, Vector3};
use rayon::prelude::*;
use std::f32::consts::FRAC_PI_2;

const MAX_PITCH: f32 = FRAC_PI_2 - 0.05;
const MIN_DISTANCE: f32 = 1e-3;
/// Color of points in clouds that carry no colors.
const DEFAULT_POINT_COLOR: Color = Color::new(0.5, 0.5, 0.5);

/// Orbit camera looking at `target`, with +Z up.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub target: Point3<f32>,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub fov_y: f32,
    /// Radius of the framed content, used for the clip planes.
    pub scene_radius: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            target: Point3::origin(),
            yaw: -FRAC_PI_2,
            pitch: 0.6,
            distance: 5.0,
            fov_y: 60f32.to_radians(),
            scene_radius: 1.0,
        }
    }
}

impl Camera {
    /// Frame everything in `geometries`.
    pub fn fit(geometries: &[Geometry]) -> Self {
        let mut points = geometries.iter().flat_map(|g| g.points().iter());
        let Some(first) = points.next() else {
            return Self::default();
        };
        let (min, max) = points.fold((*first, *first), |(lo, hi), p| {
            (lo.inf(p), hi.sup(p))
        });

        let radius = ((max - min).norm() * 0.5).max(MIN_DISTANCE);
        let camera = Self::default();
        Self {
            target: nalgebra::center(&min, &max),
            distance: radius / (camera.fov_y * 0.5).sin() * 1.1,
            scene_radius: radius,
            ..camera
        }
    }

    pub fn eye(&self) -> Point3<f32> {
        let dir = Vector3::new(
            self.pitch.cos() * self.yaw.cos(),
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
        );
        self.target + dir * self.distance
    }

    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Scale the eye distance; `factor < 1` moves closer.
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.distance = (self.distance * factor).max(MIN_DISTANCE);
        }
    }

    pub fn view(&self) -> Isometry3<f32> {
        Isometry3::look_at_rh(&self.eye(), &self.target, &Vector3::z())
    }

    pub fn projection(&self, aspect: f32) -> Perspective3<f32> {
        let near = (self.distance * 0.01).max(1e-4);
        let far = self.distance + self.scene_radius * 4.0 + near;
        Perspective3::new(aspect.max(1e-3), self.fov_y, near, far)
    }

    pub fn view_projection(&self, aspect: f32) -> Matrix4<f32> {
        self.projection(aspect).as_matrix() * self.view().to_homogeneous()
    }
}

/// Color and depth buffers.
struct Target {
    image: RgbImage,
    depth: Vec<f32>,
}

impl Target {
    fn new(width: u32, height: u32, background: Color) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Rgb(background.to_rgb8())),
            depth: vec![f32::INFINITY; width as usize * height as usize],
        }
    }

    fn plot(&mut self, x: i64, y: i64, depth: f32, color: [u8; 3]) {
        let (w, h) = self.image.dimensions();
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            return;
        }
        let idx = y as usize * w as usize + x as usize;
        if depth < self.depth[idx] {
            self.depth[idx] = depth;
            self.image.put_pixel(x as u32, y as u32, Rgb(color));
        }
    }

    fn splat(&mut self, p: &Point3<f32>, size: i64, color: [u8; 3]) {
        let x0 = (p.x - size as f32 * 0.5).round() as i64;
        let y0 = (p.y - size as f32 * 0.5).round() as i64;
        for dy in 0..size {
            for dx in 0..size {
                self.plot(x0 + dx, y0 + dy, p.z, color);
            }
        }
    }
}

/// Renders geometry lists into RGB images.
#[derive(Clone, Debug)]
pub struct Rasterizer {
    width: u32,
    height: u32,
    options: RenderOptions,
}

impl Rasterizer {
    pub fn new(options: &RenderOptions) -> Self {
        Self {
            width: options.width.max(1),
            height: options.height.max(1),
            options: options.clone(),
        }
    }

    /// Override the output size, e.g. to match a window viewport.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn render(&self, camera: &Camera, geometries: &[Geometry]) -> RgbImage {
        let mut target = Target::new(self.width, self.height, self.options.background_color);
        let vp = camera.view_projection(self.width as f32 / self.height as f32);
        let light = (camera.eye() - camera.target).normalize();

        for geometry in geometries {
            match geometry {
                Geometry::PointCloud(pc) => self.draw_points(&mut target, &vp, pc),
                Geometry::LineSet(lines) => self.draw_lines(&mut target, &vp, lines),
                Geometry::Cylinder(c) => self.draw_mesh(&mut target, &vp, &light, &c.mesh),
                Geometry::Sphere(s) => self.draw_mesh(&mut target, &vp, &light, &s.mesh),
            }
        }

        if self.options.show_coordinate_frame {
            let origin = Point3::origin();
            for (axis, color) in [
                (Vector3::x(), Color::new(1.0, 0.0, 0.0)),
                (Vector3::y(), Color::new(0.0, 1.0, 0.0)),
                (Vector3::z(), Color::new(0.0, 0.0, 1.0)),
            ] {
                self.draw_segment(&mut target, &vp, &origin, &(origin + axis), color.to_rgb8());
            }
        }

        target.image
    }

    /// Clip-space to pixel coordinates; `z` keeps the NDC depth.
    fn project(&self, vp: &Matrix4<f32>, p: &Point3<f32>) -> Option<Point3<f32>> {
        let clip = vp * p.to_homogeneous();
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        if !(-1.0..=1.0).contains(&ndc.z) {
            return None;
        }
        Some(Point3::new(
            (ndc.x + 1.0) * 0.5 * self.width as f32,
            (1.0 - ndc.y) * 0.5 * self.height as f32,
            ndc.z,
        ))
    }

    fn draw_points(&self, target: &mut Target, vp: &Matrix4<f32>, pc: &PointCloud) {
        let projected: Vec<Option<Point3<f32>>> =
            pc.points.par_iter().map(|p| self.project(vp, p)).collect();
        let size = clamp_pixel_size(self.options.point_size).round() as i64;

        for (i, p) in projected.iter().enumerate() {
            let Some(p) = p else { continue };
            let color = pc
                .colors
                .as_ref()
                .map(|c| Color::from_point(&c[i]))
                .unwrap_or(DEFAULT_POINT_COLOR);
            target.splat(p, size, color.to_rgb8());
        }
    }

    fn draw_lines(&self, target: &mut Target, vp: &Matrix4<f32>, lines: &LineSet) {
        let color = lines.color.to_rgb8();
        for (a, b) in lines.segments() {
            self.draw_segment(target, vp, &a, &b, color);
        }
    }

    fn draw_segment(
        &self,
        target: &mut Target,
        vp: &Matrix4<f32>,
        a: &Point3<f32>,
        b: &Point3<f32>,
        color: [u8; 3],
    ) {
        let (Some(pa), Some(pb)) = (self.project(vp, a), self.project(vp, b)) else {
            return;
        };
        let width = clamp_pixel_size(self.options.line_width).round() as i64;
        let steps = (pb.x - pa.x).abs().max((pb.y - pa.y).abs()).ceil().max(1.0) as usize;
        // Screen spans are bounded by the viewport unless an end point is far outside it.
        let steps = steps.min(4 * (self.width + self.height) as usize);

        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            target.splat(&pa.lerp(&pb, t), width, color);
        }
    }

    fn draw_mesh(
        &self,
        target: &mut Target,
        vp: &Matrix4<f32>,
        light: &Vector3<f32>,
        mesh: &TriangleMesh,
    ) {
        let projected: Vec<Option<Point3<f32>>> =
            mesh.vertices.iter().map(|v| self.project(vp, v)).collect();
        let normals = mesh.compute_face_normals();

        for (face, normal) in mesh.faces.iter().zip(normals) {
            let (Some(a), Some(b), Some(c)) = (
                projected[face[0]],
                projected[face[1]],
                projected[face[2]],
            ) else {
                continue;
            };

            let base = mesh
                .colors
                .as_ref()
                .map(|colors| {
                    let sum = colors[face[0]].coords + colors[face[1]].coords + colors[face[2]].coords;
                    Color::from_point(&Point3::from(sum / 3.0))
                })
                .unwrap_or(DEFAULT_POINT_COLOR);
            let shade = 0.35 + 0.65 * normal.dot(light).abs();
            fill_triangle(target, &a, &b, &c, base.scaled(shade).to_rgb8());
        }
    }
}

fn edge(a: &Point3<f32>, b: &Point3<f32>, x: f32, y: f32) -> f32 {
    (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x)
}

fn fill_triangle(target: &mut Target, a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>, color: [u8; 3]) {
    let area = edge(a, b, c.x, c.y);
    if area.abs() <= f32::EPSILON {
        return;
    }

    let (w, h) = target.image.dimensions();
    let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as i64;
    let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as i64;
    let max_x = a.x.max(b.x).max(c.x).ceil().min(w as f32 - 1.0) as i64;
    let max_y = a.y.max(b.y).max(c.y).ceil().min(h as f32 - 1.0) as i64;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(b, c, px, py) / area;
            let w1 = edge(c, a, px, py) / area;
            let w2 = edge(a, b, px, py) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }
            target.plot(x, y, w0 * a.z + w1 * b.z + w2 * c.z, color);
        }
    }
}
