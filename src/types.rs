use std::collections::BTreeMap;
use std::path::PathBuf;

/// Keypoints annotated on a single frame, keyed by bodypart name.
pub type FrameAnnotation = BTreeMap<String, (f64, f64)>;

/// Frame-count metadata from the export's `<meta><job>` block. Only used as a
/// fallback when the video backend cannot report its own frame count.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobMeta {
    pub size: Option<u32>,
    pub start_frame: Option<u32>,
    pub stop_frame: Option<u32>,
}

/// Frame-indexed annotation data parsed from a CVAT export.
///
/// Built once by [`crate::cvat::parse`] and read-only afterwards; the bodypart
/// vocabulary is the sorted, de-duplicated union of every keypoint name seen
/// across all tracks.
#[derive(Debug, Default)]
pub struct AnnotationIndex {
    frames: BTreeMap<u32, FrameAnnotation>,
    bodyparts: Vec<String>,
    job: Option<JobMeta>,
}

impl AnnotationIndex {
    pub fn new(frames: BTreeMap<u32, FrameAnnotation>, job: Option<JobMeta>) -> Self {
        let mut bodyparts: Vec<String> = frames
            .values()
            .flat_map(|ann| ann.keys().cloned())
            .collect();
        bodyparts.sort();
        bodyparts.dedup();
        Self {
            frames,
            bodyparts,
            job,
        }
    }

    /// Sorted bodypart vocabulary, fixed at parse time.
    pub fn bodyparts(&self) -> &[String] {
        &self.bodyparts
    }

    pub fn frames(&self) -> &BTreeMap<u32, FrameAnnotation> {
        &self.frames
    }

    pub fn frame(&self, frame: u32) -> Option<&FrameAnnotation> {
        self.frames.get(&frame)
    }

    pub fn job_meta(&self) -> Option<&JobMeta> {
        self.job.as_ref()
    }

    pub fn annotated_frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Properties of the source video as reported by the decode backend.
#[derive(Debug, Clone)]
pub struct VideoDescriptor {
    pub path: PathBuf,
    pub total_frames: u32,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoDescriptor {
    /// Video filename without extension, sanitized for use as a directory name.
    pub fn stem(&self) -> String {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        sanitize_filename::sanitize(stem)
    }

    /// Video filename including extension.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string())
    }
}

// Paths of the output project tree, created before extraction starts.
#[derive(Debug, Clone)]
pub struct ProjectDirs {
    pub root: PathBuf,
    pub labeled_data_dir: PathBuf,
    pub videos_dir: PathBuf,
}

/// Row statistics from writing the annotation table.
#[derive(Debug, Clone, Copy)]
pub struct TableStats {
    pub rows: usize,
    pub bodyparts: usize,
}

/// End-of-run report: what was produced plus every non-fatal warning.
#[derive(Debug, Default)]
pub struct RunReport {
    pub output_dir: PathBuf,
    pub extracted_frames: usize,
    pub table_rows: usize,
    pub bodyparts: Vec<String>,
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn print_summary(&self) {
        log::info!("=== Conversion Summary ===");
        log::info!("Output project: {}", self.output_dir.display());
        log::info!("Extracted frames: {}", self.extracted_frames);
        log::info!("Annotation rows: {}", self.table_rows);
        log::info!(
            "Bodyparts ({}): {}",
            self.bodyparts.len(),
            self.bodyparts.join(", ")
        );
        if self.warnings.is_empty() {
            log::info!("Completed without warnings.");
        } else {
            for warning in &self.warnings {
                log::warn!("{}", warning);
            }
            log::warn!("Completed with {} warning(s).", self.warnings.len());
        }
    }
}
