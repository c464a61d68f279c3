use log::{debug, info};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::ParseError;
use crate::types::{AnnotationIndex, FrameAnnotation, JobMeta};

// Serde view of a CVAT "annotations" export. Attributes are `@`-prefixed per
// quick-xml's serde convention; unknown elements are ignored.
#[derive(Debug, Deserialize)]
struct CvatExport {
    meta: Option<Meta>,
    #[serde(default, rename = "track")]
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    job: Option<Job>,
}

#[derive(Debug, Deserialize)]
struct Job {
    size: Option<u32>,
    start_frame: Option<u32>,
    stop_frame: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Track {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@label")]
    label: String,
    #[serde(default, rename = "box")]
    boxes: Vec<BoxShape>,
    #[serde(default, rename = "points")]
    points: Vec<PointShape>,
}

#[derive(Debug, Deserialize)]
struct BoxShape {
    #[serde(rename = "@frame")]
    frame: u32,
    #[serde(rename = "@xtl")]
    xtl: f64,
    #[serde(rename = "@ytl")]
    ytl: f64,
    #[serde(rename = "@xbr")]
    xbr: f64,
    #[serde(rename = "@ybr")]
    ybr: f64,
}

#[derive(Debug, Deserialize)]
struct PointShape {
    #[serde(rename = "@frame")]
    frame: u32,
    #[serde(rename = "@points")]
    points: String,
}

/// Parse a CVAT XML export into a frame-indexed annotation table.
///
/// Box annotations become a `<label>_center` keypoint at the box midpoint;
/// point annotations become a `<label>` keypoint at their first coordinate
/// pair. Tracks sharing a frame accumulate into that frame's annotation.
pub fn parse(path: &Path) -> Result<AnnotationIndex, ParseError> {
    info!("Parsing CVAT XML file: {}", path.display());

    let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let export: CvatExport =
        quick_xml::de::from_str(&content).map_err(|source| ParseError::Xml {
            path: path.to_path_buf(),
            source,
        })?;

    let job = export.meta.and_then(|m| m.job).map(|job| JobMeta {
        size: job.size,
        start_frame: job.start_frame,
        stop_frame: job.stop_frame,
    });
    if let Some(job) = &job {
        info!(
            "Job metadata: size={:?}, start_frame={:?}, stop_frame={:?}",
            job.size, job.start_frame, job.stop_frame
        );
    }

    let mut frames: BTreeMap<u32, FrameAnnotation> = BTreeMap::new();
    for track in &export.tracks {
        debug!("Processing track {}: {}", track.id, track.label);

        for shape in &track.boxes {
            let center_x = (shape.xtl + shape.xbr) / 2.0;
            let center_y = (shape.ytl + shape.ybr) / 2.0;
            frames
                .entry(shape.frame)
                .or_default()
                .insert(format!("{}_center", track.label), (center_x, center_y));
        }

        for shape in &track.points {
            // Multi-point encodings are truncated to their first pair; CVAT
            // only supplies one point per record for this shape.
            if let Some((x, y)) = parse_first_point(&shape.points) {
                frames
                    .entry(shape.frame)
                    .or_default()
                    .insert(track.label.clone(), (x, y));
            }
        }
    }

    let index = AnnotationIndex::new(frames, job);
    info!(
        "Parsed {} annotated frames, {} bodyparts: {}",
        index.annotated_frame_count(),
        index.bodyparts().len(),
        index.bodyparts().join(", ")
    );
    Ok(index)
}

/// Take the first two comma-separated numeric components of a `points` string.
fn parse_first_point(points: &str) -> Option<(f64, f64)> {
    let mut parts = points.split(',');
    let x = parts.next()?.trim().parse::<f64>().ok()?;
    let y = parts.next()?.trim().parse::<f64>().ok()?;
    Some((x, y))
}
