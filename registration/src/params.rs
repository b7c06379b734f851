use serde::{Deserialize, Serialize};

/// Rotation estimation back-end used by the TEASER stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationEstimationAlgorithm {
    GncTls,
    Fgr,
}

/// Parameters forwarded to the TEASER++ robust registration stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeaserParams {
    /// Distance threshold for classifying a correspondence as inlier.
    pub noise_bound: f64,
    pub cbar2: f64,
    pub estimate_scaling: bool,
    pub rotation_gnc_factor: f64,
    pub rotation_estimation_algorithm: RotationEstimationAlgorithm,
    pub rotation_max_iterations: usize,
    pub rotation_cost_threshold: f64,
    pub kcore_heuristic_threshold: f64,
    pub use_max_clique: bool,
    pub max_clique_exact_solution: bool,
    /// Seconds.
    pub max_clique_time_limit: f64,
}

impl Default for TeaserParams {
    fn default() -> Self {
        Self {
            noise_bound: 0.06,
            cbar2: 1.0,
            estimate_scaling: false,
            rotation_gnc_factor: 1.4,
            rotation_estimation_algorithm: RotationEstimationAlgorithm::GncTls,
            rotation_max_iterations: 100,
            rotation_cost_threshold: 1e-6,
            kcore_heuristic_threshold: 0.5,
            use_max_clique: true,
            max_clique_exact_solution: true,
            max_clique_time_limit: 3600.0,
        }
    }
}

/// KCP-TEASER configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KcpParams {
    /// Number of closest target points paired with each source point.
    pub k: usize,
    pub teaser: TeaserParams,
}

impl KcpParams {
    pub fn new(k: usize, noise_bound: f64) -> Self {
        Self {
            k,
            teaser: TeaserParams {
                noise_bound,
                ..TeaserParams::default()
            },
        }
    }
}

impl Default for KcpParams {
    fn default() -> Self {
        Self {
            k: 2,
            teaser: TeaserParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let params: KcpParams =
            serde_json::from_str(r#"{"k": 3, "teaser": {"noise_bound": 0.1}}"#).unwrap();
        assert_eq!(params.k, 3);
        assert_eq!(params.teaser.noise_bound, 0.1);
        assert_eq!(params.teaser.rotation_max_iterations, 100);
        assert_eq!(
            params.teaser.rotation_estimation_algorithm,
            RotationEstimationAlgorithm::GncTls
        );
    }

    #[test]
    fn new_overrides_only_k_and_noise_bound() {
        let params = KcpParams::new(4, 0.2);
        assert_eq!(params.k, 4);
        assert_eq!(params.teaser.noise_bound, 0.2);
        assert!(params.teaser.use_max_clique);
    }
}
