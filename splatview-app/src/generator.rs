//! Scene generation through the external SHARP model.
//!
//! The model runs as a separate process (`sharp predict`) that turns one image
//! into a point-cloud file. It is treated as an opaque producer: it either
//! leaves a `.ply` in the output directory or fails.

use crate::browser::is_ply;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::info;

pub const DEFAULT_SHARP_BIN: &str = "sharp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub image: PathBuf,
    pub output_dir: PathBuf,
    pub sharp_bin: PathBuf,
}

impl GenerateRequest {
    pub fn new(image: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            output_dir: output_dir.into(),
            sharp_bin: PathBuf::from(DEFAULT_SHARP_BIN),
        }
    }

    pub fn with_sharp_bin(mut self, sharp_bin: impl Into<PathBuf>) -> Self {
        self.sharp_bin = sharp_bin.into();
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Input image not found: {}", .0.display())]
    ImageNotFound(PathBuf),
    #[error("Failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to run {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("SHARP failed ({status}): {stderr}")]
    Failed { status: ExitStatus, stderr: String },
    #[error("Failed to scan {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No .ply file generated in {}", .0.display())]
    NoOutput(PathBuf),
}

/// Run the model on one image and return the generated scene file.
///
/// No retries: a failed run is reported with the tool's stderr.
#[tracing::instrument(skip_all, fields(image = %request.image.display()))]
pub fn generate_scene(request: &GenerateRequest) -> Result<PathBuf, GenerateError> {
    if !request.image.is_file() {
        return Err(GenerateError::ImageNotFound(request.image.clone()));
    }
    fs::create_dir_all(&request.output_dir).map_err(|source| GenerateError::OutputDir {
        path: request.output_dir.clone(),
        source,
    })?;

    info!(status = "starting", "Running {}", request.sharp_bin.display());
    let output = Command::new(&request.sharp_bin)
        .arg("predict")
        .arg("-i")
        .arg(&request.image)
        .arg("-o")
        .arg(&request.output_dir)
        .output()
        .map_err(|source| GenerateError::Spawn {
            program: request.sharp_bin.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(GenerateError::Failed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let scene = find_first_ply(&request.output_dir)?
        .ok_or_else(|| GenerateError::NoOutput(request.output_dir.clone()))?;
    info!(status = "complete", "Generated {}", scene.display());
    Ok(scene)
}

/// First `*.ply` directly inside `dir`, by file name.
pub fn find_first_ply(dir: &Path) -> Result<Option<PathBuf>, GenerateError> {
    let scan_error = |source| GenerateError::Scan {
        path: dir.to_path_buf(),
        source,
    };
    let mut plys = Vec::new();
    for entry in fs::read_dir(dir).map_err(scan_error)? {
        let path = entry.map_err(scan_error)?.path();
        if is_ply(&path) {
            plys.push(path);
        }
    }
    plys.sort();
    Ok(plys.into_iter().next())
}
