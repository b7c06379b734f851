//! Replaying solutions exported by an external KCP-TEASER run.
//!
//! File layout (JSON):
//!
//! ```json
//! {
//!   "params": { "k": 2, "teaser": { "noise_bound": 0.06 } },
//!   "transform": [[1,0,0,0],[0,1,0,0],[0,0,1,0],[0,0,0,1]],
//!   "initial_correspondences": {
//!     "source": [[0.0, 0.0, 0.0]],
//!     "target": [[0.0, 0.0, 1.0]]
//!   },
//!   "inlier_indices": [0]
//! }
//! ```

use crate::params::KcpParams;
use crate::solver::{RegistrationSolution, RegistrationSolver};
use crate::{Result, SolverError};
use cv_core::{CorrespondenceSet, InlierIndexSet, PointCloud, RigidTransform};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct SolutionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    params: Option<KcpParams>,
    transform: [[f32; 4]; 4],
    initial_correspondences: CorrespondenceRecord,
    inlier_indices: Vec<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CorrespondenceRecord {
    source: Vec<[f32; 3]>,
    target: Vec<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_indices: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_indices: Option<Vec<usize>>,
}

impl SolutionFile {
    fn into_solution(self) -> Result<(RegistrationSolution, Option<KcpParams>)> {
        let to_points = |v: Vec<[f32; 3]>| v.into_iter().map(Point3::from).collect::<Vec<_>>();

        let record = self.initial_correspondences;
        let mut correspondences =
            CorrespondenceSet::new(to_points(record.source), to_points(record.target))?;
        match (record.source_indices, record.target_indices) {
            (Some(s), Some(t)) => correspondences = correspondences.with_indices(s, t)?,
            (None, None) => {}
            _ => {
                return Err(SolverError::InvalidSolution(
                    "source_indices and target_indices must be given together".to_string(),
                ))
            }
        }

        let solution = RegistrationSolution {
            transform: RigidTransform::from_row_major(&self.transform)?,
            initial_correspondences: correspondences,
            inlier_indices: InlierIndexSet::new(self.inlier_indices),
        };
        Ok((solution, self.params))
    }

    fn from_solution(solution: &RegistrationSolution, params: Option<&KcpParams>) -> Self {
        let to_arrays = |v: &[Point3<f32>]| v.iter().map(|p| [p.x, p.y, p.z]).collect::<Vec<_>>();
        let corr = &solution.initial_correspondences;
        let (source_indices, target_indices) = match corr.indices() {
            Some((s, t)) => (Some(s.to_vec()), Some(t.to_vec())),
            None => (None, None),
        };

        Self {
            params: params.cloned(),
            transform: solution.transform.to_row_major(),
            initial_correspondences: CorrespondenceRecord {
                source: to_arrays(corr.source()),
                target: to_arrays(corr.target()),
                source_indices,
                target_indices,
            },
            inlier_indices: solution.inlier_indices.as_slice().to_vec(),
        }
    }
}

/// Read a solution file, validating the correspondence and transform invariants.
pub fn read_solution<P: AsRef<Path>>(path: P) -> Result<(RegistrationSolution, Option<KcpParams>)> {
    let file = File::open(path)?;
    let raw: SolutionFile = serde_json::from_reader(BufReader::new(file))?;
    raw.into_solution()
}

/// Write a solution file in the layout [`read_solution`] accepts.
pub fn write_solution<P: AsRef<Path>>(
    path: P,
    solution: &RegistrationSolution,
    params: Option<&KcpParams>,
) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &SolutionFile::from_solution(solution, params))?;
    Ok(())
}

/// Solver back-end that hands out a recorded solution.
///
/// Corner extraction is the identity: the recorded run already worked on
/// corner points, and its correspondences are replayed verbatim.
#[derive(Debug, Clone)]
pub struct PrecomputedSolver {
    path: PathBuf,
    solution: RegistrationSolution,
}

impl PrecomputedSolver {
    /// Load the recorded solution at `path`.
    ///
    /// A missing file means the external solver never ran, which is reported
    /// as [`SolverError::Unavailable`].
    pub fn open<P: AsRef<Path>>(path: P, params: &KcpParams) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(SolverError::Unavailable {
                path,
                reason: "no recorded solution; run the external KCP solver first".to_string(),
            });
        }

        let (solution, recorded) = read_solution(&path)?;
        match recorded {
            Some(recorded) if recorded != *params => tracing::warn!(
                "solution in {} was recorded with k={} noise_bound={}, requested k={} noise_bound={}",
                path.display(),
                recorded.k,
                recorded.teaser.noise_bound,
                params.k,
                params.teaser.noise_bound
            ),
            _ => {}
        }

        tracing::info!(
            "loaded recorded solution from {} ({} correspondences)",
            path.display(),
            solution.initial_correspondences.len()
        );
        Ok(Self { path, solution })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegistrationSolver for PrecomputedSolver {
    fn extract_corner_points(&self, cloud: &PointCloud) -> Result<PointCloud> {
        Ok(cloud.clone())
    }

    fn solve(
        &mut self,
        source: &PointCloud,
        target: &PointCloud,
        source_features: &PointCloud,
        target_features: &PointCloud,
    ) -> Result<RegistrationSolution> {
        tracing::debug!(
            "replaying solution for source={} target={} (features {} / {})",
            source.len(),
            target.len(),
            source_features.len(),
            target_features.len()
        );
        Ok(self.solution.clone())
    }
}
