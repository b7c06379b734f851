use crate::point_cloud::PointCloud;
use crate::{Error, Result};
use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, Vector3};
use rayon::prelude::*;
use std::fmt;

/// Tolerance used when checking that a solver-provided matrix is a proper rigid motion.
const RIGIDITY_TOLERANCE: f32 = 1e-3;

/// Homogeneous 4×4 rigid transformation (rotation in SO(3) + translation).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    matrix: Matrix4<f32>,
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    pub fn from_rotation_translation(rotation: &Rotation3<f32>, translation: &Vector3<f32>) -> Self {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation.matrix());
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
        Self { matrix: m }
    }

    /// Wrap a homogeneous matrix, rejecting anything that is not a rigid motion.
    pub fn from_matrix(matrix: Matrix4<f32>) -> Result<Self> {
        let bottom = matrix.fixed_view::<1, 4>(3, 0);
        let expected_bottom = nalgebra::RowVector4::new(0.0, 0.0, 0.0, 1.0);
        if (bottom - expected_bottom).abs().max() > RIGIDITY_TOLERANCE {
            return Err(Error::InvalidInput(
                format!("transform bottom row must be [0 0 0 1], got {}", bottom).into(),
            ));
        }

        let r = Matrix3::from(matrix.fixed_view::<3, 3>(0, 0));
        let orthogonality = (r.transpose() * r - Matrix3::identity()).abs().max();
        if orthogonality > RIGIDITY_TOLERANCE || (r.determinant() - 1.0).abs() > RIGIDITY_TOLERANCE {
            return Err(Error::InvalidInput(
                "transform rotation block is not in SO(3)".into(),
            ));
        }

        Ok(Self { matrix })
    }

    /// Build from 16 row-major values, as solvers usually print them.
    pub fn from_row_major(rows: &[[f32; 4]; 4]) -> Result<Self> {
        let matrix = Matrix4::from_fn(|r, c| rows[r][c]);
        Self::from_matrix(matrix)
    }

    pub fn matrix(&self) -> &Matrix4<f32> {
        &self.matrix
    }

    pub fn to_row_major(&self) -> [[f32; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.matrix[(r, c)];
            }
        }
        rows
    }

    pub fn rotation(&self) -> Matrix3<f32> {
        Matrix3::from(self.matrix.fixed_view::<3, 3>(0, 0))
    }

    pub fn translation(&self) -> Vector3<f32> {
        Vector3::from(self.matrix.fixed_view::<3, 1>(0, 3))
    }

    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        self.matrix.transform_point(point)
    }

    pub fn transform_vector(&self, vector: &Vector3<f32>) -> Vector3<f32> {
        self.rotation() * vector
    }

    /// Apply to every point (and normal) of a cloud; colors are carried over unchanged.
    pub fn apply(&self, cloud: &PointCloud) -> PointCloud {
        let points = cloud
            .points
            .par_iter()
            .map(|p| self.transform_point(p))
            .collect();
        let rotation = self.rotation();
        let normals = cloud
            .normals
            .as_ref()
            .map(|n| n.par_iter().map(|v| rotation * v).collect());

        PointCloud {
            points,
            colors: cloud.colors.clone(),
            normals,
        }
    }

    pub fn inverse(&self) -> Self {
        let r_inv = self.rotation().transpose();
        let t_inv = -r_inv * self.translation();
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&r_inv);
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&t_inv);
        Self { matrix: m }
    }

    pub fn compose(&self, other: &RigidTransform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for RigidTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..4 {
            writeln!(
                f,
                "[{:>10.6}, {:>10.6}, {:>10.6}, {:>10.6}]",
                self.matrix[(r, 0)],
                self.matrix[(r, 1)],
                self.matrix[(r, 2)],
                self.matrix[(r, 3)]
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn quarter_turn_about_z() -> RigidTransform {
        RigidTransform::from_rotation_translation(
            &Rotation3::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
            &Vector3::new(1.0, 2.0, 3.0),
        )
    }

    #[test]
    fn apply_rotates_then_translates() {
        let t = quarter_turn_about_z();
        let cloud = PointCloud::new(vec![Point3::new(1.0, 0.0, 0.0)])
            .with_normals(vec![Vector3::new(1.0, 0.0, 0.0)])
            .unwrap();
        let moved = t.apply(&cloud);

        assert_relative_eq!(moved.points[0], Point3::new(1.0, 3.0, 3.0), epsilon = 1e-6);
        assert_relative_eq!(
            moved.normals.unwrap()[0],
            Vector3::new(0.0, 1.0, 0.0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn inverse_undoes_transform() {
        let t = quarter_turn_about_z();
        let round_trip = t.compose(&t.inverse());
        assert_relative_eq!(*round_trip.matrix(), Matrix4::identity(), epsilon = 1e-6);
    }

    #[test]
    fn rejects_non_rigid_matrices() {
        let scaled = Matrix4::new_scaling(2.0);
        assert!(RigidTransform::from_matrix(scaled).is_err());

        let mut projective = Matrix4::identity();
        projective[(3, 0)] = 0.5;
        assert!(RigidTransform::from_matrix(projective).is_err());

        let rows = quarter_turn_about_z().to_row_major();
        assert!(RigidTransform::from_row_major(&rows).is_ok());
    }

    #[test]
    fn display_prints_four_rows() {
        let text = RigidTransform::identity().to_string();
        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("[  1.000000"));
    }
}
