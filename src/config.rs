//! Command line configuration for the `dicom-mpr` tool.
//!
//! # Commands
//!
//! - `inspect <FILE> [--json]` - list the elements of a DICOM file
//! - `decode <FILE> [--frame N] --output <PNG>` - decode one frame to PNG
//! - `slice <FILES...> --plane <PLANE> [--index N] [--thick M] --output <PNG>`
//!   - assemble a volume and write one reformatted slice
//!
//! # Environment Variables
//!
//! - `DICOM_MPR_WORKERS` - Concurrent decode jobs (default: 4)

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::volume::{Plane, DEFAULT_WORKERS};

/// Upper bound on decode workers.
pub const MAX_WORKERS: usize = 256;

// =============================================================================
// CLI Arguments
// =============================================================================

/// dicom-mpr - DICOM parsing, pixel decoding and multi-planar reformatting.
#[derive(Parser, Debug, Clone)]
#[command(name = "dicom-mpr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Number of concurrent decode jobs.
    #[arg(long, global = true, default_value_t = DEFAULT_WORKERS, env = "DICOM_MPR_WORKERS")]
    pub workers: usize,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Parse a file and list its elements.
    Inspect(InspectArgs),

    /// Decode one frame and write it as an 8-bit PNG.
    Decode(DecodeArgs),

    /// Assemble a volume from files and write one plane slice as PNG.
    Slice(SliceArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct InspectArgs {
    /// DICOM file to inspect.
    pub file: PathBuf,

    /// Print a JSON summary instead of the element listing.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DecodeArgs {
    /// DICOM file to decode.
    pub file: PathBuf,

    /// Frame index (0-based).
    #[arg(long, default_value_t = 0)]
    pub frame: usize,

    /// Output PNG path.
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SliceArgs {
    /// DICOM files of one series (single- or multi-frame).
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Plane to extract.
    #[arg(long, value_enum, default_value_t = PlaneArg::Axial)]
    pub plane: PlaneArg,

    /// Slice index within the plane; defaults to the middle slice.
    #[arg(long)]
    pub index: Option<usize>,

    /// Average this many axial layers per slab (must be greater than 1).
    #[arg(long)]
    pub thick: Option<usize>,

    /// Output PNG path.
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Plane selector for the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneArg {
    Axial,
    Sagittal,
    Coronal,
}

impl From<PlaneArg> for Plane {
    fn from(arg: PlaneArg) -> Self {
        match arg {
            PlaneArg::Axial => Plane::Axial,
            PlaneArg::Sagittal => Plane::Sagittal,
            PlaneArg::Coronal => Plane::Coronal,
        }
    }
}

impl Cli {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(format!("workers must be between 1 and {}", MAX_WORKERS));
        }

        if let Command::Slice(args) = &self.command {
            if let Some(thick) = args.thick {
                if thick <= 1 {
                    return Err("thick must be greater than 1".to_string());
                }
            }
        }

        let output = match &self.command {
            Command::Inspect(_) => None,
            Command::Decode(args) => Some(&args.output),
            Command::Slice(args) => Some(&args.output),
        };
        if let Some(output) = output {
            let is_png = output
                .extension()
                .map(|e| e.eq_ignore_ascii_case("png"))
                .unwrap_or(false);
            if !is_png {
                return Err(format!("output {} must have a .png extension", output.display()));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
