//! Solver-produced correspondence data.

use crate::{Error, Result};
use nalgebra::Point3;

/// Two parallel point lists: `source()[i]` corresponds to `target()[i]`.
///
/// The equal-length invariant is enforced at construction, so every index
/// below [`len`](Self::len) is valid on both sides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrespondenceSet {
    source: Vec<Point3<f32>>,
    target: Vec<Point3<f32>>,
    indices: Option<(Vec<usize>, Vec<usize>)>,
}

impl CorrespondenceSet {
    pub fn new(source: Vec<Point3<f32>>, target: Vec<Point3<f32>>) -> Result<Self> {
        if source.len() != target.len() {
            return Err(Error::LengthMismatch {
                what: "correspondence source/target points",
                left: source.len(),
                right: target.len(),
            });
        }
        Ok(Self {
            source,
            target,
            indices: None,
        })
    }

    /// Attach the cloud indices each correspondence was drawn from.
    pub fn with_indices(mut self, source: Vec<usize>, target: Vec<usize>) -> Result<Self> {
        for (what, len) in [("source indices", source.len()), ("target indices", target.len())] {
            if len != self.len() {
                return Err(Error::LengthMismatch {
                    what,
                    left: len,
                    right: self.len(),
                });
            }
        }
        self.indices = Some((source, target));
        Ok(self)
    }

    pub fn source(&self) -> &[Point3<f32>] {
        &self.source
    }

    pub fn target(&self) -> &[Point3<f32>] {
        &self.target
    }

    pub fn indices(&self) -> Option<(&[usize], &[usize])> {
        self.indices
            .as_ref()
            .map(|(s, t)| (s.as_slice(), t.as_slice()))
    }

    pub fn pair(&self, idx: usize) -> Option<(Point3<f32>, Point3<f32>)> {
        Some((*self.source.get(idx)?, *self.target.get(idx)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Point3<f32>, &Point3<f32>)> {
        self.source.iter().zip(self.target.iter())
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

/// Indices into a [`CorrespondenceSet`] that the solver trusts.
///
/// Iteration follows insertion order; duplicate indices are dropped, keeping
/// the first occurrence. Range checking happens where the set is consumed,
/// since only the consumer knows which correspondence set it refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlierIndexSet {
    indices: Vec<usize>,
}

impl InlierIndexSet {
    pub fn new(indices: Vec<usize>) -> Self {
        indices.into_iter().collect()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.indices.contains(&idx)
    }

    /// First index that is not below `len`, if any.
    pub fn first_out_of_range(&self, len: usize) -> Option<usize> {
        self.iter().find(|&idx| idx >= len)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl FromIterator<usize> for InlierIndexSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut seen = std::collections::HashSet::new();
        let indices = iter
            .into_iter()
            .filter(|&idx| {
                let first = seen.insert(idx);
                if !first {
                    tracing::debug!("duplicate inlier index {idx} dropped");
                }
                first
            })
            .collect();
        Self { indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unequal_sides() {
        let err = CorrespondenceSet::new(
            vec![Point3::origin(), Point3::origin()],
            vec![Point3::origin()],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                left: 2,
                right: 1,
                ..
            }
        ));
    }

    #[test]
    fn pair_lookup() {
        let corr = CorrespondenceSet::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)],
            vec![Point3::new(0.0, 0.0, 1.0), Point3::new(2.0, 2.0, 2.0)],
        )
        .unwrap();
        assert_eq!(
            corr.pair(1),
            Some((Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 2.0, 2.0)))
        );
        assert_eq!(corr.pair(2), None);
        assert_eq!(corr.iter().count(), 2);
    }

    #[test]
    fn indices_must_match_length() {
        let corr = CorrespondenceSet::new(vec![Point3::origin()], vec![Point3::origin()]).unwrap();
        assert!(corr.clone().with_indices(vec![3], vec![7]).is_ok());
        assert!(corr.with_indices(vec![3, 4], vec![7]).is_err());
    }

    #[test]
    fn inliers_keep_order_and_drop_duplicates() {
        let inliers = InlierIndexSet::new(vec![2, 0, 5, 0]);
        assert_eq!(inliers.as_slice(), &[2, 0, 5]);
        assert_eq!(inliers.first_out_of_range(6), None);
        assert_eq!(inliers.first_out_of_range(5), Some(5));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn dropped_duplicates_are_logged() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();

        let inliers =
            tracing::subscriber::with_default(subscriber, || InlierIndexSet::new(vec![4, 1, 4, 4]));

        assert_eq!(inliers.as_slice(), &[4, 1]);
        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text.matches("duplicate inlier index 4 dropped").count(), 2);
        assert!(!text.contains("index 1"));
    }
}
