use nalgebra::{Point3, RealField, Scalar, Vector3};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud<T: Scalar = f32> {
    pub points: Vec<Point3<T>>,
    pub colors: Option<Vec<Point3<T>>>,
    pub normals: Option<Vec<Vector3<T>>>,
}

impl<T: Scalar> PointCloud<T> {
    pub fn new(points: Vec<Point3<T>>) -> Self {
        Self {
            points,
            colors: None,
            normals: None,
        }
    }

    pub fn with_colors(mut self, colors: Vec<Point3<T>>) -> crate::Result<Self> {
        if colors.len() == self.points.len() {
            self.colors = Some(colors);
            Ok(self)
        } else {
            Err(crate::Error::InvalidInput(
                format!(
                    "Color count {} does not match point count {}",
                    colors.len(),
                    self.points.len()
                )
                .into(),
            ))
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vector3<T>>) -> crate::Result<Self> {
        if normals.len() == self.points.len() {
            self.normals = Some(normals);
            Ok(self)
        } else {
            Err(crate::Error::InvalidInput(
                format!(
                    "Normal count {} does not match point count {}",
                    normals.len(),
                    self.points.len()
                )
                .into(),
            ))
        }
    }

    /// Paint every point with the same color, replacing existing colors.
    pub fn with_uniform_color(mut self, color: Point3<T>) -> Self {
        self.colors = Some(vec![color; self.points.len()]);
        self
    }

    /// Keep only the points (and their attributes) for which `keep` returns true.
    pub fn retain_points<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&Point3<T>) -> bool,
    {
        let mask: Vec<bool> = self.points.iter().map(|p| keep(p)).collect();
        self.select(&mask)
    }

    /// Keep the points whose mask entry is true. Entries past the end of
    /// `mask` count as false.
    pub fn select(&self, mask: &[bool]) -> Self {
        Self {
            points: select_masked(&self.points, mask),
            colors: self.colors.as_ref().map(|c| select_masked(c, mask)),
            normals: self.normals.as_ref().map(|n| select_masked(n, mask)),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl<T: Scalar + RealField + Copy> PointCloud<T> {
    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty cloud.
    pub fn bounds(&self) -> Option<(Point3<T>, Point3<T>)> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold((first, first), |(lo, hi), p| {
            (
                Point3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Point3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        }))
    }

    pub fn centroid(&self) -> Option<Point3<T>> {
        if self.points.is_empty() {
            return None;
        }
        let sum = self
            .points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        let n = T::from_usize(self.points.len())?;
        Some(Point3::from(sum / n))
    }
}

fn select_masked<V: Clone>(values: &[V], mask: &[bool]) -> Vec<V> {
    values
        .iter()
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|(v, _)| v.clone())
        .collect()
}

pub type PointCloudf32 = PointCloud<f32>;
pub type PointCloudf64 = PointCloud<f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retain_keeps_attributes_aligned() {
        let cloud = PointCloud::new(vec![
            Point3::new(0.0f32, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ])
        .with_colors(vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ])
        .unwrap();

        let kept = cloud.retain_points(|p| p.x != 1.0);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept.points[1], Point3::new(2.0, 0.0, 0.0));
        assert_eq!(kept.colors.unwrap()[1], Point3::new(0.0, 0.0, 1.0));
        assert!(kept.normals.is_none());
    }

    #[test]
    fn bounds_and_centroid() {
        let cloud = PointCloud::new(vec![
            Point3::new(-1.0f32, 2.0, 0.0),
            Point3::new(3.0, -2.0, 4.0),
        ]);
        let (lo, hi) = cloud.bounds().unwrap();
        assert_eq!(lo, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(hi, Point3::new(3.0, 2.0, 4.0));
        assert_eq!(cloud.centroid().unwrap(), Point3::new(1.0, 0.0, 2.0));

        let empty: PointCloud = PointCloud::default();
        assert!(empty.bounds().is_none());
        assert!(empty.centroid().is_none());
    }
}
