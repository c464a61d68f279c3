use std::path::PathBuf;

use thiserror::Error;

/// Failure while reading or decoding the CVAT XML export.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read annotation file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CVAT XML in {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::DeError,
    },
}

/// Failure while opening the source video or reading its properties.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("cannot open video file {0}")]
    CannotOpen(PathBuf),
    #[error("video {0} reports no decodable frames")]
    NoFrames(PathBuf),
    #[error("video backend error: {0}")]
    Backend(#[from] opencv::Error),
}

/// User-supplied frame bounds that do not fit the probed video.
#[derive(Debug, Error)]
#[error("invalid frame range {start}-{end}: must satisfy 0 <= start <= end <= {max_frame}")]
pub struct RangeError {
    pub start: u32,
    pub end: u32,
    pub max_frame: u32,
}

/// Failure while decoding frames or persisting them to disk.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot open video file {0}")]
    CannotOpen(PathBuf),
    #[error("failed to write frame image {0}")]
    ImageWrite(PathBuf),
    #[error("video backend error: {0}")]
    Backend(#[from] opencv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure while emitting the annotation table or project descriptor.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("no annotated frames inside window {start}-{end}")]
    EmptyWindow { start: u32, end: u32 },
    #[error("failed to write annotation table: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Top-level pipeline failure, tagged with the stage that produced it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("annotation parsing failed: {0}")]
    Parse(#[from] ParseError),
    #[error("video probing failed: {0}")]
    Probe(#[from] ProbeError),
    #[error("frame window selection failed: {0}")]
    Range(#[from] RangeError),
    #[error("frame extraction failed: {0}")]
    Extract(#[from] ExtractError),
    #[error("dataset assembly failed: {0}")]
    Assembly(#[from] AssemblyError),
    #[error("project materialization failed: {0}")]
    Io(#[from] std::io::Error),
}
