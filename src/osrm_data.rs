//! OSRM dataset preparation for integration tests.
//!
//! Downloads a Geofabrik extract and runs the `osrm-backend` docker
//! pipeline (extract, partition, customize) so a test can boot a live
//! `osrm-routed` against real road data. Artifacts are cached on disk and
//! reused across runs.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("extract download failed: {0}")]
    Download(#[from] reqwest::Error),
    #[error("{tool} exited with {status}")]
    Preprocess { tool: String, status: String },
}

/// Which Geofabrik extract to prepare and where to keep it.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Geofabrik region path, e.g. "europe/monaco".
    pub region: String,
    /// Root directory for downloaded and preprocessed artifacts.
    pub data_root: PathBuf,
}

impl ExtractConfig {
    pub fn new(region: impl Into<String>, data_root: impl Into<PathBuf>) -> Self {
        Self {
            region: region.into(),
            data_root: data_root.into(),
        }
    }

    /// Last path segment, used for file and directory names.
    fn region_name(&self) -> &str {
        self.region.rsplit('/').next().unwrap_or("region")
    }

    fn pbf_url(&self) -> String {
        format!("https://download.geofabrik.de/{}-latest.osm.pbf", self.region)
    }
}

/// A ready-to-serve OSRM dataset on disk.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    /// Directory holding the pbf and all .osrm.* artifacts.
    pub data_dir: PathBuf,
    /// Base path of the .osrm graph files.
    pub graph_base: PathBuf,
    /// Graph file name relative to `data_dir`, as `osrm-routed` wants it.
    pub graph_file: String,
}

impl PreparedDataset {
    /// Ensures the extract is downloaded and preprocessed (MLD pipeline),
    /// doing nothing for steps whose artifacts already exist.
    pub fn ensure(config: &ExtractConfig) -> Result<Self, DatasetError> {
        let data_root = if config.data_root.is_absolute() {
            config.data_root.clone()
        } else {
            std::env::current_dir()?.join(&config.data_root)
        };
        let data_dir = data_root.join(config.region_name());
        fs::create_dir_all(&data_dir)?;

        let pbf_name = format!("{}-latest.osm.pbf", config.region_name());
        let pbf_path = data_dir.join(&pbf_name);
        if !pbf_path.exists() {
            info!(url = %config.pbf_url(), "downloading extract");
            download(&config.pbf_url(), &pbf_path)?;
        }

        let graph_file = format!("{}-latest.osrm", config.region_name());
        let graph_base = data_dir.join(&graph_file);
        if !graph_base.exists() {
            docker_osrm(
                &["osrm-extract", "-p", "/opt/car.lua", &format!("/data/{pbf_name}")],
                &data_dir,
            )?;
        }
        if !mld_artifacts_ready(&graph_base) {
            docker_osrm(&["osrm-partition", &format!("/data/{graph_file}")], &data_dir)?;
            docker_osrm(&["osrm-customize", &format!("/data/{graph_file}")], &data_dir)?;
        }

        Ok(Self {
            data_dir,
            graph_base,
            graph_file,
        })
    }
}

fn download(url: &str, dest: &Path) -> Result<(), DatasetError> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let bytes = response.bytes()?;
    // Write to a temp name first so an interrupted download never looks
    // like a complete extract.
    let tmp_path = dest.with_extension("download");
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    fs::rename(tmp_path, dest)?;
    Ok(())
}

fn mld_artifacts_ready(graph_base: &Path) -> bool {
    ["osrm.partition", "osrm.mldgr", "osrm.cells"]
        .iter()
        .all(|ext| graph_base.with_extension(ext).exists())
}

fn docker_osrm(args: &[&str], data_dir: &Path) -> Result<(), DatasetError> {
    info!(tool = args[0], "running osrm preprocessing step");
    let status = Command::new("docker")
        .args(["run", "--rm", "-t", "-v"])
        .arg(format!("{}:/data", data_dir.display()))
        .arg("osrm/osrm-backend")
        .args(args)
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(DatasetError::Preprocess {
            tool: args[0].to_string(),
            status: status.to_string(),
        })
    }
}
