//! Driver for the KCP registration inspection viewer.
//!
//! Loads two scans, asks the registration solver for a transform and its
//! correspondences, builds the inspection scenes and hands them to either the
//! native window or a headless snapshot.

use clap::Parser;
use cv_core::PointCloud;
use cv_point_cloud::{preprocess, PreprocessConfig};
use cv_registration::{
    evaluate_solution, KcpParams, PrecomputedSolver, RegistrationSolution, RegistrationSolver,
    SolverError,
};
use cv_viewer::{
    DisplayList, RenderOptions, SceneContext, SceneStyle, Trigger, ViewState, ViewStateMachine,
    ViewerError,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: cv_core::Error,
    },

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Viewer(#[from] ViewerError),
}

pub type Result<T> = std::result::Result<T, DemoError>;

/// Inspect a KCP-TEASER registration of two LiDAR scans.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Source scan (PCD).
    #[arg(long, default_value = "data/1531883530.949817000.pcd")]
    pub source: PathBuf,

    /// Target scan (PCD).
    #[arg(long, default_value = "data/1531883530.449377000.pcd")]
    pub target: PathBuf,

    /// Solution JSON exported by the external KCP solver.
    #[arg(long, default_value = "solution.json")]
    pub solution: PathBuf,

    /// Open3D-style render options.
    #[arg(long, default_value = "render_option.json")]
    pub render_options: PathBuf,

    /// Where the snapshot key writes its image.
    #[arg(long, default_value = "snapshot.png")]
    pub snapshot: PathBuf,

    /// Nearest neighbours per feature point.
    #[arg(long, default_value_t = 2)]
    pub k: usize,

    /// TEASER noise bound in meters.
    #[arg(long, default_value_t = 0.06)]
    pub noise_bound: f64,

    /// Skip ego-vehicle and ground removal.
    #[arg(long)]
    pub no_preprocess: bool,

    /// Write a snapshot of the initial view instead of opening a window.
    #[arg(long)]
    pub headless: bool,

    /// Log filter, e.g. `debug` or `cv_viewer=trace`. Falls back to RUST_LOG, then `info`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Worker threads for cloud transforms and filtering. Rayon picks when unset.
    #[arg(long, env = "KCP_CPU_THREADS")]
    pub threads: Option<usize>,
}

impl Args {
    pub fn params(&self) -> KcpParams {
        KcpParams::new(self.k, self.noise_bound)
    }

    pub fn preprocess_config(&self) -> PreprocessConfig {
        if self.no_preprocess {
            PreprocessConfig::disabled()
        } else {
            PreprocessConfig::nuscenes()
        }
    }
}

/// Size the global rayon pool. Only the first call in a process takes effect.
pub fn init_thread_pool(threads: Option<usize>) {
    let Some(threads) = threads else {
        return;
    };
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
        Ok(()) => tracing::debug!("rayon pool sized to {threads} threads"),
        Err(e) => tracing::warn!("keeping existing thread pool: {e}"),
    }
}

/// Install the global fmt subscriber.
pub fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn load_cloud(path: &Path, config: &PreprocessConfig) -> Result<PointCloud> {
    let cloud = cv_io::read_point_cloud(path).map_err(|source| DemoError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("loaded {} points from {}", cloud.len(), path.display());

    if !config.is_enabled() {
        return Ok(cloud);
    }
    let cleaned = preprocess(&cloud, config);
    tracing::info!(
        "preprocessing removed {} points from {}",
        cloud.len() - cleaned.len(),
        path.display()
    );
    if cleaned.is_empty() {
        tracing::warn!("{} has no points left after preprocessing", path.display());
    }
    Ok(cleaned)
}

/// Corner extraction on both clouds, then a solve with the corners as features.
pub fn register(
    solver: &mut dyn RegistrationSolver,
    source: &PointCloud,
    target: &PointCloud,
) -> Result<RegistrationSolution> {
    let source_corners = solver.extract_corner_points(source)?;
    let target_corners = solver.extract_corner_points(target)?;
    tracing::info!(
        "corner points: source {}, target {}",
        source_corners.len(),
        target_corners.len()
    );

    let solution = solver.solve(&source_corners, &target_corners, &source_corners, &target_corners)?;
    Ok(solution)
}

/// Everything up to the event loop: load, register, build scenes, show the
/// initial view and print the legend.
pub fn prepare(args: &Args) -> Result<(ViewStateMachine, DisplayList, RenderOptions)> {
    let config = args.preprocess_config();
    let source = load_cloud(&args.source, &config)?;
    let target = load_cloud(&args.target, &config)?;

    let params = args.params();
    let mut solver = PrecomputedSolver::open(&args.solution, &params)?;
    let solution = register(&mut solver, &source, &target)?;
    println!("{solution}");

    let report = evaluate_solution(&solution, params.teaser.noise_bound as f32);
    tracing::info!(
        "inlier ratio {:.3}, inlier rmse {:.4}, {} of {} inliers within noise bound",
        report.inlier_ratio,
        report.inlier_rmse,
        report.within_noise_bound,
        report.num_inliers
    );

    let context = SceneContext::build(
        &source,
        &target,
        &solution.transform,
        &solution.initial_correspondences,
        &solution.inlier_indices,
        &SceneStyle::default(),
    )?;
    let options = RenderOptions::load(&args.render_options)?;

    let mut display = DisplayList::new(&options);
    let mut machine = ViewStateMachine::new(context, &args.snapshot);
    machine.activate(ViewState::ResultFinal, &mut display)?;

    println!();
    print!("{}", machine.keymap().legend());
    Ok((machine, display, options))
}

pub fn run(args: &Args) -> Result<()> {
    init_thread_pool(args.threads);

    let (mut machine, mut display, options) = prepare(args)?;
    if args.headless {
        machine.handle(Trigger::Snapshot, &mut display)?;
        return Ok(());
    }
    cv_viewer::native_viewer::run_native_viewer(machine, display, &options)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_run() {
        let args = Args::parse_from(["kcp_viewer"]);
        assert_eq!(args.source, PathBuf::from("data/1531883530.949817000.pcd"));
        assert_eq!(args.target, PathBuf::from("data/1531883530.449377000.pcd"));
        assert_eq!(args.render_options, PathBuf::from("render_option.json"));
        assert_eq!(args.snapshot, PathBuf::from("snapshot.png"));
        assert_eq!(args.params(), KcpParams::new(2, 0.06));
        assert_eq!(args.preprocess_config(), PreprocessConfig::nuscenes());
        assert!(!args.headless);
        assert_eq!(args.threads, None);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "kcp_viewer",
            "--k",
            "3",
            "--noise-bound",
            "0.1",
            "--no-preprocess",
            "--headless",
            "--log-level",
            "debug",
            "--threads",
            "3",
        ]);
        assert_eq!(args.params().k, 3);
        assert_eq!(args.params().teaser.noise_bound, 0.1);
        assert_eq!(args.preprocess_config(), PreprocessConfig::disabled());
        assert!(args.headless);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.threads, Some(3));
    }

    #[test]
    fn thread_count_must_be_a_number() {
        let err = Args::try_parse_from(["kcp_viewer", "--threads", "many"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn repeated_pool_setup_is_harmless() {
        init_thread_pool(None);
        init_thread_pool(Some(2));
        init_thread_pool(Some(4));
        assert!(rayon::current_num_threads() >= 1);
    }
}
