use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use opencv::core::{Mat, Scalar, Size, CV_8UC3};
use opencv::prelude::*;
use opencv::videoio::VideoWriter;

use cvat2dlc::dataset::{annotated_frames_in_window, write_collected_data, write_config_yaml};
use cvat2dlc::error::AssemblyError;
use cvat2dlc::project::{setup_project_directories, write_summary};
use cvat2dlc::types::{AnnotationIndex, FrameAnnotation, VideoDescriptor};
use cvat2dlc::utils::frame_image_name;
use cvat2dlc::video::{extract, probe};
use cvat2dlc::window::{FramePolicy, FrameWindow};
use cvat2dlc::{cvat, ParseError};

const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<annotations>
  <version>1.1</version>
  <meta>
    <job>
      <size>10</size>
      <start_frame>0</start_frame>
      <stop_frame>9</stop_frame>
    </job>
  </meta>
  <track id="0" label="Bee">
    <points frame="5" points="12.0,8.0" outside="0" occluded="0"/>
  </track>
</annotations>
"#;

const MIXED_TRACKS_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<annotations>
  <track id="0" label="Queen">
    <box frame="3" xtl="10.0" ytl="20.0" xbr="30.0" ybr="40.0" outside="0"/>
  </track>
  <track id="1" label="Worker">
    <points frame="3" points="5.5,6.5" outside="0"/>
    <points frame="7" points="1.0,2.0,9.0,9.0" outside="0"/>
  </track>
</annotations>
"#;

fn write_xml(content: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotations.xml");
    fs::write(&path, content).unwrap();
    (dir, path)
}

/// Encode a short Motion-JPEG clip with the given number of frames.
fn write_test_video(dir: &Path, frames: i32) -> PathBuf {
    let path = dir.join("clip.avi");
    let fourcc = VideoWriter::fourcc('M', 'J', 'P', 'G').unwrap();
    let mut writer = VideoWriter::new(
        path.to_string_lossy().as_ref(),
        fourcc,
        10.0,
        Size::new(64, 48),
        true,
    )
    .unwrap();
    assert!(writer.is_opened().unwrap());
    for i in 0..frames {
        let frame =
            Mat::new_rows_cols_with_default(48, 64, CV_8UC3, Scalar::all(f64::from(i * 20 % 255)))
                .unwrap();
        writer.write(&frame).unwrap();
    }
    writer.release().unwrap();
    path
}

fn png_names(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".png"))
        .collect()
}

#[test]
fn test_parse_point_track() {
    let (_dir, path) = write_xml(SAMPLE_XML);
    let index = cvat::parse(&path).unwrap();

    assert_eq!(index.bodyparts(), ["Bee".to_string()]);
    assert_eq!(index.annotated_frame_count(), 1);
    assert_eq!(index.frame(5).unwrap()["Bee"], (12.0, 8.0));

    let job = index.job_meta().unwrap();
    assert_eq!(job.size, Some(10));
    assert_eq!(job.start_frame, Some(0));
    assert_eq!(job.stop_frame, Some(9));
}

#[test]
fn test_parse_mixed_tracks_accumulate_per_frame() {
    let (_dir, path) = write_xml(MIXED_TRACKS_XML);
    let index = cvat::parse(&path).unwrap();

    // Vocabulary is the sorted union of box-derived and point-derived names.
    assert_eq!(
        index.bodyparts(),
        ["Queen_center".to_string(), "Worker".to_string()]
    );

    let frame = index.frame(3).unwrap();
    assert_eq!(frame["Queen_center"], (20.0, 30.0));
    assert_eq!(frame["Worker"], (5.5, 6.5));

    // Multi-point records are truncated to their first coordinate pair.
    assert_eq!(index.frame(7).unwrap()["Worker"], (1.0, 2.0));
}

#[test]
fn test_parse_errors() {
    let (dir, path) = write_xml("not xml at all <<<");
    assert!(matches!(
        cvat::parse(&path),
        Err(ParseError::Xml { .. })
    ));
    assert!(matches!(
        cvat::parse(&dir.path().join("missing.xml")),
        Err(ParseError::Io { .. })
    ));
}

#[test]
fn test_frame_image_name_rule() {
    assert_eq!(frame_image_name(0), "frame_0000.png");
    assert_eq!(frame_image_name(5), "frame_0005.png");
    assert_eq!(frame_image_name(37), "frame_0037.png");
    assert_eq!(frame_image_name(12345), "frame_12345.png");
}

#[test]
fn test_collected_data_single_point_scenario() {
    let (_dir, path) = write_xml(SAMPLE_XML);
    let index = cvat::parse(&path).unwrap();
    let window = FrameWindow::resolve(FramePolicy::Full, 10, None).unwrap();

    let out = tempfile::tempdir().unwrap();
    let stats = write_collected_data(&index, window, "video", "manual", out.path()).unwrap();
    assert_eq!(stats.rows, 1);
    assert_eq!(stats.bodyparts, 1);

    let content = fs::read_to_string(out.path().join("CollectedData_manual.csv")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "scorer,,,manual,manual");
    assert_eq!(lines[1], "bodyparts,,,Bee,Bee");
    assert_eq!(lines[2], "coords,,,x,y");
    assert_eq!(lines[3], "labeled-data,video,frame_0005.png,12.0,8.0");
    assert_eq!(lines.len(), 4);
}

#[test]
fn test_collected_data_missing_keypoints_are_nan() {
    let mut frames: BTreeMap<u32, FrameAnnotation> = BTreeMap::new();
    let mut full = FrameAnnotation::new();
    full.insert("A".to_string(), (1.0, 2.0));
    full.insert("B".to_string(), (3.0, 4.0));
    frames.insert(0, full);
    let mut partial = FrameAnnotation::new();
    partial.insert("B".to_string(), (7.25, 8.5));
    frames.insert(2, partial);
    let index = AnnotationIndex::new(frames, None);

    let window = FrameWindow::resolve(FramePolicy::Full, 5, None).unwrap();
    let out = tempfile::tempdir().unwrap();
    let stats = write_collected_data(&index, window, "vid", "s1", out.path()).unwrap();
    assert_eq!(stats.rows, 2);

    let content = fs::read_to_string(out.path().join("CollectedData_s1.csv")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[3], "labeled-data,vid,frame_0000.png,1.0,2.0,3.0,4.0");
    assert_eq!(lines[4], "labeled-data,vid,frame_0002.png,nan,nan,7.25,8.5");
}

#[test]
fn test_collected_data_empty_window_is_assembly_failure() {
    let (_dir, path) = write_xml(SAMPLE_XML);
    let index = cvat::parse(&path).unwrap();

    // Annotation sits on frame 5; the window misses it entirely.
    let window = FrameWindow::resolve(FramePolicy::Range, 10, Some((0, 2))).unwrap();
    let out = tempfile::tempdir().unwrap();
    let err = write_collected_data(&index, window, "video", "manual", out.path()).unwrap_err();
    assert!(matches!(
        err,
        AssemblyError::EmptyWindow { start: 0, end: 2 }
    ));
    // The row check runs before the writer opens, so no file appears.
    assert!(!out.path().join("CollectedData_manual.csv").exists());
}

#[test]
fn test_single_frame_window_row() {
    let (_dir, path) = write_xml(SAMPLE_XML);
    let index = cvat::parse(&path).unwrap();

    let window = FrameWindow::resolve(FramePolicy::Range, 10, Some((5, 5))).unwrap();
    let out = tempfile::tempdir().unwrap();
    let stats = write_collected_data(&index, window, "video", "manual", out.path()).unwrap();
    assert_eq!(stats.rows, 1);

    // Same single-frame window without annotations fails assembly.
    let window = FrameWindow::resolve(FramePolicy::Range, 10, Some((4, 4))).unwrap();
    assert!(write_collected_data(&index, window, "video", "manual", out.path()).is_err());
}

#[test]
fn test_table_rows_reference_window_filenames() {
    let (_dir, path) = write_xml(MIXED_TRACKS_XML);
    let index = cvat::parse(&path).unwrap();
    let window = FrameWindow::resolve(FramePolicy::Full, 10, None).unwrap();

    let out = tempfile::tempdir().unwrap();
    write_collected_data(&index, window, "vid", "manual", out.path()).unwrap();

    let content = fs::read_to_string(out.path().join("CollectedData_manual.csv")).unwrap();
    for line in content.lines().skip(3) {
        let image = line.split(',').nth(2).unwrap();
        let frame: u32 = image
            .strip_prefix("frame_")
            .and_then(|s| s.strip_suffix(".png"))
            .unwrap()
            .parse()
            .unwrap();
        assert!(window.contains(frame));
        assert_eq!(image, frame_image_name(frame));
    }
}

#[test]
fn test_table_and_descriptor_are_idempotent() {
    let (_dir, path) = write_xml(MIXED_TRACKS_XML);
    let index = cvat::parse(&path).unwrap();
    let window = FrameWindow::resolve(FramePolicy::Full, 10, None).unwrap();
    let out = tempfile::tempdir().unwrap();

    write_collected_data(&index, window, "vid", "manual", out.path()).unwrap();
    let first = fs::read(out.path().join("CollectedData_manual.csv")).unwrap();
    write_collected_data(&index, window, "vid", "manual", out.path()).unwrap();
    let second = fs::read(out.path().join("CollectedData_manual.csv")).unwrap();
    assert_eq!(first, second);

    write_config_yaml(out.path(), "Proj", "manual", "vid.mp4", index.bodyparts()).unwrap();
    let first = fs::read(out.path().join("config.yaml")).unwrap();
    write_config_yaml(out.path(), "Proj", "manual", "vid.mp4", index.bodyparts()).unwrap();
    let second = fs::read(out.path().join("config.yaml")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_config_yaml_contents() {
    let out = tempfile::tempdir().unwrap();
    let bodyparts = vec!["Queen_center".to_string(), "Worker".to_string()];
    let config_path =
        write_config_yaml(out.path(), "BeePoseEstimation", "manual", "bees.mp4", &bodyparts)
            .unwrap();

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("Task: BeePoseEstimation"));
    assert!(content.contains("scorer: manual"));
    assert!(content.contains("project_path:"));
    assert!(content.contains("video_sets:\n  bees.mp4:\n    crop: false"));
    assert!(content.contains("bodyparts:\n- Queen_center\n- Worker"));
    assert!(content.contains("TrainingFraction: [0.95]"));
    assert!(content.contains("default_net_type: resnet_50"));
    assert!(content.contains("engine: pytorch"));
    assert!(content.contains("project_name: BeePoseEstimation"));
}

#[test]
fn test_project_directories_and_summary() {
    let out = tempfile::tempdir().unwrap();
    let dirs = setup_project_directories(out.path(), "bees").unwrap();
    assert!(dirs.labeled_data_dir.ends_with("labeled-data/bees"));
    assert!(dirs.videos_dir.is_dir());

    // Re-running must not disturb existing output.
    let marker = dirs.labeled_data_dir.join("frame_0000.png");
    fs::write(&marker, b"png").unwrap();
    setup_project_directories(out.path(), "bees").unwrap();
    assert_eq!(fs::read(&marker).unwrap(), b"png");

    let (_dir, path) = write_xml(SAMPLE_XML);
    let index = cvat::parse(&path).unwrap();
    let descriptor = VideoDescriptor {
        path: PathBuf::from("/data/bees.mp4"),
        total_frames: 10,
        fps: 30.0,
        width: 640,
        height: 480,
    };
    let window = FrameWindow::resolve(FramePolicy::Full, 10, None).unwrap();
    let warning = write_summary(out.path(), "Proj", "manual", &descriptor, &index, window);
    assert!(warning.is_none());

    let summary = fs::read_to_string(out.path().join("dataset_summary.txt")).unwrap();
    assert!(summary.contains("Project Name: Proj"));
    assert!(summary.contains("Selected Frame Range: 0-9 (total 10 frames)"));
    assert!(summary.contains("Valid Annotation Frames: 1"));
    assert!(summary.contains("Keypoint List: Bee"));
    assert!(summary.contains("Annotation CSV: labeled-data/bees/CollectedData_manual.csv"));
}

#[test]
fn test_annotated_frames_in_window() {
    let (_dir, path) = write_xml(MIXED_TRACKS_XML);
    let index = cvat::parse(&path).unwrap();

    let full = FrameWindow::resolve(FramePolicy::Full, 10, None).unwrap();
    assert_eq!(annotated_frames_in_window(&index, full), vec![3, 7]);

    let narrow = FrameWindow::resolve(FramePolicy::Range, 10, Some((4, 9))).unwrap();
    assert_eq!(annotated_frames_in_window(&index, narrow), vec![7]);
}

#[test]
fn test_video_descriptor_names() {
    let descriptor = VideoDescriptor {
        path: PathBuf::from("/data/bee colony.mp4"),
        total_frames: 1,
        fps: 30.0,
        width: 1,
        height: 1,
    };
    assert_eq!(descriptor.stem(), "bee colony");
    assert_eq!(descriptor.file_name(), "bee colony.mp4");
}

#[test]
fn test_probe_reports_video_properties() {
    let dir = tempfile::tempdir().unwrap();
    let video = write_test_video(dir.path(), 10);

    let descriptor = probe(&video, None).unwrap();
    assert_eq!(descriptor.total_frames, 10);
    assert_eq!(descriptor.width, 64);
    assert_eq!(descriptor.height, 48);
    assert!(descriptor.fps > 0.0);
    assert_eq!(descriptor.stem(), "clip");
}

#[test]
fn test_probe_rejects_non_video_file() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("not_a_video.avi");
    fs::write(&bogus, b"plain text").unwrap();
    assert!(probe(&bogus, None).is_err());
}

#[test]
fn test_extract_writes_exactly_window_filenames() {
    let dir = tempfile::tempdir().unwrap();
    let video = write_test_video(dir.path(), 10);
    let descriptor = probe(&video, None).unwrap();

    let window =
        FrameWindow::resolve(FramePolicy::Range, descriptor.total_frames, Some((2, 4))).unwrap();
    let frames_dir = dir.path().join("frames");
    let extracted = extract(&video, window, &frames_dir).unwrap();
    assert_eq!(extracted, 3);

    let expected: BTreeSet<String> = (2..=4).map(frame_image_name).collect();
    assert_eq!(png_names(&frames_dir), expected);
}

#[test]
fn test_extract_tolerates_early_exhaustion() {
    let dir = tempfile::tempdir().unwrap();
    let video = write_test_video(dir.path(), 6);

    // Window resolved against a stale larger frame count; the stream ends at
    // frame 5 and extraction reports what it actually wrote.
    let window = FrameWindow::resolve(FramePolicy::Range, 10, Some((4, 8))).unwrap();
    let frames_dir = dir.path().join("frames");
    let extracted = extract(&video, window, &frames_dir).unwrap();
    assert_eq!(extracted, 2);

    let expected: BTreeSet<String> = (4..=5).map(frame_image_name).collect();
    assert_eq!(png_names(&frames_dir), expected);
}

#[test]
fn test_table_rows_reference_extracted_images() {
    let dir = tempfile::tempdir().unwrap();
    let video = write_test_video(dir.path(), 10);
    let (_xml_dir, xml) = write_xml(MIXED_TRACKS_XML);

    let index = cvat::parse(&xml).unwrap();
    let descriptor = probe(&video, None).unwrap();
    let window = FrameWindow::resolve(FramePolicy::Full, descriptor.total_frames, None).unwrap();

    let labeled_dir = dir.path().join("labeled-data").join(descriptor.stem());
    let extracted = extract(&video, window, &labeled_dir).unwrap();
    assert_eq!(extracted, 10);

    write_collected_data(&index, window, &descriptor.stem(), "manual", &labeled_dir).unwrap();
    let images = png_names(&labeled_dir);
    let content = fs::read_to_string(labeled_dir.join("CollectedData_manual.csv")).unwrap();
    let mut rows = 0;
    for line in content.lines().skip(3) {
        let image = line.split(',').nth(2).unwrap();
        assert!(images.contains(image), "{} missing from extraction", image);
        rows += 1;
    }
    assert_eq!(rows, 2);
}
