//! CVAT to DeepLabCut dataset converter
//!
//! This library converts a CVAT video-annotation XML export plus its source
//! video into a DeepLabCut-format pose-estimation training project: extracted
//! frame images, a `CollectedData_<scorer>.csv` annotation table, a
//! `config.yaml` project descriptor and a copy of the video.

pub mod config;
pub mod convert;
pub mod cvat;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod project;
pub mod types;
pub mod utils;
pub mod video;
pub mod window;

// Re-export commonly used types and functions
pub use config::{Args, FrameSelection};
pub use convert::{convert_annotation_table, ConvertOptions, ToolOutcome};
pub use error::{
    AssemblyError, ExtractError, ParseError, PipelineError, ProbeError, RangeError,
};
pub use pipeline::{PipelineRun, RunConfig};
pub use types::{AnnotationIndex, FrameAnnotation, RunReport, VideoDescriptor};
pub use window::{FramePolicy, FrameWindow};
