//! Point cloud file I/O
//!
//! Supports the PCL Point Cloud Data format (`.pcd`), ASCII and binary.

pub mod pcd;

pub use pcd::{read_pcd, write_pcd, PcdData, PcdHeader};

pub use cv_core::{Error, Result};

use cv_core::PointCloud;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Read a point cloud, picking the reader from the file extension.
pub fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("pcd") => {
            let file = File::open(path)?;
            let cloud = read_pcd(BufReader::new(file))?;
            tracing::debug!("read {} points from {}", cloud.len(), path.display());
            Ok(cloud)
        }
        other => Err(Error::UnsupportedFormat(format!(
            "cannot read point cloud with extension {:?} ({})",
            other.unwrap_or(""),
            path.display()
        ))),
    }
}

/// Write a point cloud, picking the writer from the file extension.
pub fn write_point_cloud<P: AsRef<Path>>(path: P, cloud: &PointCloud) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("pcd") => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_pcd(&mut writer, cloud)
        }
        other => Err(Error::UnsupportedFormat(format!(
            "cannot write point cloud with extension {:?} ({})",
            other.unwrap_or(""),
            path.display()
        ))),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
