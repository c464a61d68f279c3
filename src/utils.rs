use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;

/// Build the image filename for a zero-based frame index.
///
/// This rule is shared verbatim between frame extraction and the annotation
/// table: every table row must name an image written under exactly this name.
pub fn frame_image_name(frame: u32) -> String {
    format!("frame_{:04}.png", frame)
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Create a directory (and parents) if it does not already exist. Existing
/// contents are left untouched so no stage can clobber another stage's output.
pub fn ensure_directory(path: &Path) -> std::io::Result<std::path::PathBuf> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(path.to_path_buf())
}

/// Format a coordinate for the annotation table. Debug formatting keeps the
/// trailing `.0` on whole-number coordinates (`12.0`, not `12`).
pub fn fmt_coord(value: f64) -> String {
    format!("{:?}", value)
}
