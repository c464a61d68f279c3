use log::{info, warn};
use opencv::core::{Mat, Vector};
use opencv::prelude::*;
use opencv::{imgcodecs, videoio};
use std::path::Path;

use crate::error::{ExtractError, ProbeError};
use crate::types::{JobMeta, VideoDescriptor};
use crate::utils::{create_progress_bar, ensure_directory, frame_image_name};
use crate::window::FrameWindow;

/// Open the video and read its frame count, fps and resolution.
///
/// When the backend cannot report a frame count but the annotation export's
/// job metadata carries one, the job size is used instead of failing.
pub fn probe(path: &Path, job_meta: Option<&JobMeta>) -> Result<VideoDescriptor, ProbeError> {
    info!("Probing video: {}", path.display());

    let capture = videoio::VideoCapture::from_file(
        path.to_string_lossy().as_ref(),
        videoio::CAP_ANY,
    )?;
    if !capture.is_opened()? {
        return Err(ProbeError::CannotOpen(path.to_path_buf()));
    }

    let reported = capture.get(videoio::CAP_PROP_FRAME_COUNT)? as i64;
    let fps = capture.get(videoio::CAP_PROP_FPS)?;
    let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
    let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;

    let total_frames = resolve_total_frames(reported, job_meta, path)?;

    let descriptor = VideoDescriptor {
        path: path.to_path_buf(),
        total_frames,
        fps,
        width,
        height,
    };
    info!(
        "Video info: {} frames, {:.2} FPS, {}x{}",
        descriptor.total_frames, descriptor.fps, descriptor.width, descriptor.height
    );
    Ok(descriptor)
}

/// Pick the usable frame count: the backend's report when positive, else a
/// positive job size from the export's metadata. A zero-frame job size is no
/// better than a zero-frame report and stays a [`ProbeError::NoFrames`].
fn resolve_total_frames(
    reported: i64,
    job_meta: Option<&JobMeta>,
    path: &Path,
) -> Result<u32, ProbeError> {
    if reported > 0 {
        return Ok(reported as u32);
    }
    match job_meta.and_then(|job| job.size).filter(|&size| size > 0) {
        Some(size) => {
            warn!(
                "Backend reports no frame count for {}; falling back to job size {}",
                path.display(),
                size
            );
            Ok(size)
        }
        None => Err(ProbeError::NoFrames(path.to_path_buf())),
    }
}

/// Decode the video sequentially and write every frame inside `window` as a
/// lossless PNG named `frame_<NNNN>.png` under `frames_dir`.
///
/// Decoding always starts at frame 0; seeking is not frame-exact for all
/// codecs, so frames before the window are read and discarded. Returns the
/// number of frames actually written, which may fall short of the window if
/// the stream exhausts early.
pub fn extract(
    video_path: &Path,
    window: FrameWindow,
    frames_dir: &Path,
) -> Result<usize, ExtractError> {
    info!(
        "Extracting frames {}-{} to {}",
        window.start(),
        window.end(),
        frames_dir.display()
    );
    ensure_directory(frames_dir)?;

    let mut capture = videoio::VideoCapture::from_file(
        video_path.to_string_lossy().as_ref(),
        videoio::CAP_ANY,
    )?;
    if !capture.is_opened()? {
        return Err(ExtractError::CannotOpen(video_path.to_path_buf()));
    }

    let pb = create_progress_bar(window.frame_count() as u64, "Extract");
    let mut frame = Mat::default();
    let mut frame_idx: u32 = 0;
    let mut extracted: usize = 0;

    loop {
        if !capture.read(&mut frame)? || frame.empty() {
            break;
        }
        if window.contains(frame_idx) {
            let frame_path = frames_dir.join(frame_image_name(frame_idx));
            let written = imgcodecs::imwrite(
                frame_path.to_string_lossy().as_ref(),
                &frame,
                &Vector::new(),
            )?;
            if !written {
                return Err(ExtractError::ImageWrite(frame_path));
            }
            extracted += 1;
            pb.inc(1);
        }
        if frame_idx >= window.end() {
            break;
        }
        frame_idx += 1;
    }
    pb.finish_and_clear();

    if extracted < window.frame_count() as usize {
        warn!(
            "Stream exhausted early: extracted {} of {} requested frames",
            extracted,
            window.frame_count()
        );
    }
    info!("Extracted {} frames to {}", extracted, frames_dir.display());
    Ok(extracted)
}
