//! Triangle Mesh Data Structure
//!
//! Only what the overlay primitives need: parametric cylinder and sphere
//! generation, rigid placement and uniform coloring.

use crate::color::Color;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use std::f32::consts::PI;

/// Triangle mesh with vertices and face indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3<f32>>,
    pub faces: Vec<[usize; 3]>,
    pub colors: Option<Vec<Point3<f32>>>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vertices_and_faces(vertices: Vec<Point3<f32>>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            colors: None,
        }
    }

    /// Closed cylinder centered at the origin with its axis along +Z.
    ///
    /// Vertex 0 is the top cap center `(0, 0, height/2)`, vertex 1 the bottom
    /// cap center, followed by the top and bottom rings of `resolution`
    /// vertices each. Faces wind counter-clockwise seen from outside.
    pub fn create_cylinder(radius: f32, height: f32, resolution: usize) -> Self {
        let resolution = resolution.max(3);
        let half = height * 0.5;

        let mut vertices = Vec::with_capacity(2 + 2 * resolution);
        vertices.push(Point3::new(0.0, 0.0, half));
        vertices.push(Point3::new(0.0, 0.0, -half));
        for z in [half, -half] {
            for j in 0..resolution {
                let theta = 2.0 * PI * j as f32 / resolution as f32;
                vertices.push(Point3::new(radius * theta.cos(), radius * theta.sin(), z));
            }
        }

        let top = 2;
        let bottom = 2 + resolution;
        let mut faces = Vec::with_capacity(4 * resolution);
        for j in 0..resolution {
            let next = (j + 1) % resolution;
            faces.push([0, top + j, top + next]);
            faces.push([1, bottom + next, bottom + j]);
            faces.push([top + j, bottom + j, bottom + next]);
            faces.push([top + j, bottom + next, top + next]);
        }

        Self::with_vertices_and_faces(vertices, faces)
    }

    /// UV sphere centered at the origin.
    ///
    /// Vertex 0 is the north pole, vertex 1 the south pole, then
    /// `resolution - 1` latitude rings of `2 * resolution` vertices.
    pub fn create_sphere(radius: f32, resolution: usize) -> Self {
        let resolution = resolution.max(2);
        let ring = 2 * resolution;

        let mut vertices = Vec::with_capacity(2 + (resolution - 1) * ring);
        vertices.push(Point3::new(0.0, 0.0, radius));
        vertices.push(Point3::new(0.0, 0.0, -radius));
        for i in 1..resolution {
            let phi = PI * i as f32 / resolution as f32;
            for j in 0..ring {
                let theta = 2.0 * PI * j as f32 / ring as f32;
                vertices.push(Point3::new(
                    radius * phi.sin() * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                    radius * phi.cos(),
                ));
            }
        }

        let last_ring = 2 + (resolution - 2) * ring;
        let mut faces = Vec::with_capacity(2 * ring * (resolution - 1));
        for j in 0..ring {
            let next = (j + 1) % ring;
            faces.push([0, 2 + j, 2 + next]);
            faces.push([1, last_ring + next, last_ring + j]);
        }
        for i in 0..resolution - 2 {
            let upper = 2 + i * ring;
            let lower = upper + ring;
            for j in 0..ring {
                let next = (j + 1) % ring;
                faces.push([upper + j, lower + j, lower + next]);
                faces.push([upper + j, lower + next, upper + next]);
            }
        }

        Self::with_vertices_and_faces(vertices, faces)
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Rotate every vertex about the origin.
    pub fn rotate(&mut self, rotation: &UnitQuaternion<f32>) {
        for v in &mut self.vertices {
            *v = rotation * *v;
        }
    }

    pub fn translate(&mut self, offset: &Vector3<f32>) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    pub fn paint_uniform_color(&mut self, color: Color) {
        self.colors = Some(vec![color.to_point(); self.vertices.len()]);
    }

    /// Compute face normals
    pub fn compute_face_normals(&self) -> Vec<Vector3<f32>> {
        self.faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let e1 = self.vertices[face[1]] - v0;
                let e2 = self.vertices[face[2]] - v0;
                e1.cross(&e2).try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros)
            })
            .collect()
    }

    /// Calculate surface area
    pub fn surface_area(&self) -> f32 {
        self.faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let e1 = self.vertices[face[1]] - v0;
                let e2 = self.vertices[face[2]] - v0;
                e1.cross(&e2).norm() * 0.5
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cylinder_topology() {
        let mesh = TriangleMesh::create_cylinder(0.5, 2.0, 8);
        assert_eq!(mesh.num_vertices(), 18);
        assert_eq!(mesh.num_faces(), 32);
        assert_eq!(mesh.vertices[0], Point3::new(0.0, 0.0, 1.0));
        assert_eq!(mesh.vertices[1], Point3::new(0.0, 0.0, -1.0));
        assert!(mesh.faces.iter().flatten().all(|&i| i < mesh.num_vertices()));
    }

    #[test]
    fn cylinder_normals_point_outward() {
        let mesh = TriangleMesh::create_cylinder(1.0, 2.0, 16);
        for (face, normal) in mesh.faces.iter().zip(mesh.compute_face_normals()) {
            let centroid = face
                .iter()
                .fold(Vector3::zeros(), |acc, &i| acc + mesh.vertices[i].coords)
                / 3.0;
            assert!(normal.dot(&centroid) > 0.0);
        }
    }

    #[test]
    fn sphere_vertices_lie_on_surface() {
        let mesh = TriangleMesh::create_sphere(0.2, 20);
        assert_eq!(mesh.num_vertices(), 2 + 19 * 40);
        assert_eq!(mesh.num_faces(), 2 * 40 * 19);
        for v in &mesh.vertices {
            assert_relative_eq!(v.coords.norm(), 0.2, epsilon = 1e-5);
        }
        let exact = 4.0 * PI * 0.2 * 0.2;
        assert!((mesh.surface_area() - exact).abs() / exact < 0.02);
    }

    #[test]
    fn paint_covers_all_vertices() {
        let mut mesh = TriangleMesh::create_sphere(1.0, 4);
        mesh.paint_uniform_color(Color::INLIER);
        assert_eq!(mesh.colors.as_ref().map(Vec::len), Some(mesh.num_vertices()));
    }
}
