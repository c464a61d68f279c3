use chrono::Local;
use log::{info, warn};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::dataset::{annotated_frames_in_window, collected_data_name};
use crate::types::{AnnotationIndex, ProjectDirs, VideoDescriptor};
use crate::utils::ensure_directory;
use crate::window::FrameWindow;

/// Set up the DeepLabCut project tree under `output_dir`. Directories are
/// created incrementally; existing contents are preserved.
pub fn setup_project_directories(
    output_dir: &Path,
    video_stem: &str,
) -> std::io::Result<ProjectDirs> {
    let root = ensure_directory(output_dir)?;
    let labeled_data_dir = ensure_directory(&root.join("labeled-data").join(video_stem))?;
    let videos_dir = ensure_directory(&root.join("videos"))?;
    Ok(ProjectDirs {
        root,
        labeled_data_dir,
        videos_dir,
    })
}

/// Copy the source video byte-for-byte into `videos/`, preserving its name.
pub fn copy_video(video_path: &Path, videos_dir: &Path) -> std::io::Result<PathBuf> {
    let file_name = video_path
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "video path has no filename"))?;
    let destination = videos_dir.join(file_name);
    fs::copy(video_path, &destination)?;
    info!("Copied video to {}", destination.display());
    Ok(destination)
}

/// Write `dataset_summary.txt`. Pure reporting: any failure is logged as a
/// warning and returned as a message, never propagated as a pipeline error.
pub fn write_summary(
    output_dir: &Path,
    project_name: &str,
    scorer: &str,
    descriptor: &VideoDescriptor,
    index: &AnnotationIndex,
    window: FrameWindow,
) -> Option<String> {
    match try_write_summary(output_dir, project_name, scorer, descriptor, index, window) {
        Ok(path) => {
            info!("Dataset summary saved: {}", path.display());
            None
        }
        Err(e) => {
            let message = format!("failed to write dataset summary: {}", e);
            warn!("{}", message);
            Some(message)
        }
    }
}

fn try_write_summary(
    output_dir: &Path,
    project_name: &str,
    scorer: &str,
    descriptor: &VideoDescriptor,
    index: &AnnotationIndex,
    window: FrameWindow,
) -> std::io::Result<PathBuf> {
    let summary_path = output_dir.join("dataset_summary.txt");
    let mut w = BufWriter::new(File::create(&summary_path)?);
    let video_stem = descriptor.stem();
    let annotated_in_window = annotated_frames_in_window(index, window).len();

    writeln!(w, "DeepLabCut Dataset Summary")?;
    writeln!(w, "{}", "=".repeat(50))?;
    writeln!(w)?;
    writeln!(w, "Project Name: {}", project_name)?;
    writeln!(w, "Scorer: {}", scorer)?;
    writeln!(
        w,
        "Processing Time: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(w)?;
    writeln!(w, "Source Data Information:")?;
    writeln!(w, "  Video File: {}", descriptor.path.display())?;
    writeln!(
        w,
        "  Video Resolution: {}x{}",
        descriptor.width, descriptor.height
    )?;
    writeln!(w, "  Video FPS: {:.2} FPS", descriptor.fps)?;
    writeln!(w, "  Total Video Frames: {}", descriptor.total_frames)?;
    writeln!(w)?;
    writeln!(w, "Processing Configuration:")?;
    writeln!(
        w,
        "  Selected Frame Range: {}-{} (total {} frames)",
        window.start(),
        window.end(),
        window.frame_count()
    )?;
    writeln!(w, "  Valid Annotation Frames: {}", annotated_in_window)?;
    writeln!(w)?;
    writeln!(w, "Keypoint Information:")?;
    writeln!(w, "  Number of Keypoints: {}", index.bodyparts().len())?;
    writeln!(w, "  Keypoint List: {}", index.bodyparts().join(", "))?;
    writeln!(w)?;
    writeln!(w, "Output Files:")?;
    writeln!(w, "  Project Directory: {}", output_dir.display())?;
    writeln!(
        w,
        "  Annotation CSV: labeled-data/{}/{}",
        video_stem,
        collected_data_name(scorer)
    )?;
    writeln!(w, "  Configuration File: config.yaml")?;
    writeln!(w, "  Video File: videos/{}", descriptor.file_name())?;
    writeln!(w, "  Images Directory: labeled-data/{}/", video_stem)?;
    w.flush()?;
    Ok(summary_path)
}
