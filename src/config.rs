use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::window::FramePolicy;

/// Command-line arguments for converting a CVAT export to a DeepLabCut project.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// CVAT exported XML annotation file
    pub xml_file: PathBuf,

    /// Original video file
    pub video_file: PathBuf,

    /// Output project directory
    pub output_dir: PathBuf,

    /// Project name
    #[arg(long = "project", default_value = "BeePoseEstimation")]
    pub project_name: String,

    /// Scorer name
    #[arg(long = "scorer", default_value = "manual")]
    pub scorer: String,

    /// Frame selection mode: all frames or an explicit range
    #[arg(long = "frames", value_enum, default_value = "full")]
    pub frames: FrameSelection,

    /// First frame of the range (zero-based, inclusive)
    #[arg(long = "start", required_if_eq("frames", "range"))]
    pub start: Option<u32>,

    /// Last frame of the range (zero-based, inclusive)
    #[arg(long = "end", required_if_eq("frames", "range"))]
    pub end: Option<u32>,

    /// Skip the external CSV-to-HDF5 table conversion
    #[arg(long = "skip-table-conversion")]
    pub skip_table_conversion: bool,

    /// Timeout in seconds for the external table converter
    #[arg(long = "tool-timeout", default_value_t = 120)]
    pub tool_timeout: u64,
}

// Frame selection mode exposed on the command line
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum FrameSelection {
    /// Use every frame of the video
    Full,
    /// Use the frame range given by --start/--end
    Range,
}

impl FrameSelection {
    pub fn policy(self) -> FramePolicy {
        match self {
            FrameSelection::Full => FramePolicy::Full,
            FrameSelection::Range => FramePolicy::Range,
        }
    }
}
