use chrono::Local;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::AssemblyError;
use crate::types::{AnnotationIndex, TableStats};
use crate::utils::{fmt_coord, frame_image_name};
use crate::window::FrameWindow;

/// Annotation table filename for a scorer.
pub fn collected_data_name(scorer: &str) -> String {
    format!("CollectedData_{}.csv", scorer)
}

/// Frames inside the window that carry at least one keypoint, in ascending
/// frame order. Frames with no annotation are skipped, never zero-filled.
pub fn annotated_frames_in_window(index: &AnnotationIndex, window: FrameWindow) -> Vec<u32> {
    index
        .frames()
        .range(window.start()..=window.end())
        .filter(|(_, ann)| !ann.is_empty())
        .map(|(frame, _)| *frame)
        .collect()
}

/// Write the `CollectedData_<scorer>.csv` annotation table.
///
/// Layout follows the DeepLabCut convention: a three-row header (scorer,
/// bodyparts, coords) over two columns per bodypart, then one data row per
/// annotated frame referencing its extracted image by the shared
/// `frame_<NNNN>.png` rule. Absent keypoints are written as `nan`.
pub fn write_collected_data(
    index: &AnnotationIndex,
    window: FrameWindow,
    video_stem: &str,
    scorer: &str,
    labeled_data_dir: &Path,
) -> Result<TableStats, AssemblyError> {
    let valid_frames = annotated_frames_in_window(index, window);
    if valid_frames.is_empty() {
        return Err(AssemblyError::EmptyWindow {
            start: window.start(),
            end: window.end(),
        });
    }
    info!(
        "Found {} annotated frames in window {}-{}",
        valid_frames.len(),
        window.start(),
        window.end()
    );

    let bodyparts = index.bodyparts();
    let csv_path = labeled_data_dir.join(collected_data_name(scorer));
    let mut writer = csv::Writer::from_path(&csv_path)?;

    let mut scorer_row = vec!["scorer".to_string(), String::new(), String::new()];
    scorer_row.extend(std::iter::repeat(scorer.to_string()).take(bodyparts.len() * 2));
    writer.write_record(&scorer_row)?;

    let mut bodyparts_row = vec!["bodyparts".to_string(), String::new(), String::new()];
    for bodypart in bodyparts {
        bodyparts_row.push(bodypart.clone());
        bodyparts_row.push(bodypart.clone());
    }
    writer.write_record(&bodyparts_row)?;

    let mut coords_row = vec!["coords".to_string(), String::new(), String::new()];
    for _ in bodyparts {
        coords_row.push("x".to_string());
        coords_row.push("y".to_string());
    }
    writer.write_record(&coords_row)?;

    for (frame, annotation) in index
        .frames()
        .range(window.start()..=window.end())
        .filter(|(_, ann)| !ann.is_empty())
    {
        let mut row = vec![
            "labeled-data".to_string(),
            video_stem.to_string(),
            frame_image_name(*frame),
        ];
        for bodypart in bodyparts {
            match annotation.get(bodypart) {
                Some(&(x, y)) => {
                    row.push(fmt_coord(x));
                    row.push(fmt_coord(y));
                }
                None => {
                    row.push("nan".to_string());
                    row.push("nan".to_string());
                }
            }
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;

    info!(
        "Wrote annotation table: {} ({} rows, {} bodyparts)",
        csv_path.display(),
        valid_frames.len(),
        bodyparts.len()
    );
    Ok(TableStats {
        rows: valid_frames.len(),
        bodyparts: bodyparts.len(),
    })
}

/// Write the DeepLabCut `config.yaml` project descriptor.
///
/// Task, scorer, date, project path, video set and bodyparts are derived from
/// the run; everything else is the trainer's static default catalogue
/// (training fraction, network, augmenter, plotting and skeleton settings) and
/// is reproduced as-is rather than recomputed.
pub fn write_config_yaml(
    output_dir: &Path,
    project_name: &str,
    scorer: &str,
    video_filename: &str,
    bodyparts: &[String],
) -> Result<PathBuf, AssemblyError> {
    let config_path = output_dir.join("config.yaml");
    let project_path = output_dir
        .canonicalize()
        .unwrap_or_else(|_| output_dir.to_path_buf());
    let date = Local::now().format("%b%d");

    let mut writer = BufWriter::new(File::create(&config_path)?);

    writeln!(writer, "# Project definitions (do not edit)")?;
    writeln!(writer, "Task: {}", project_name)?;
    writeln!(writer, "scorer: {}", scorer)?;
    writeln!(writer, "date: {}", date)?;
    writeln!(writer, "multianimalproject:")?;
    writeln!(writer, "identity:")?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(writer, "# Project path (change when moving around)")?;
    writeln!(writer, "project_path: {}", project_path.display())?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(
        writer,
        "# Default DeepLabCut engine to use for shuffle creation (either pytorch or tensorflow)"
    )?;
    writeln!(writer, "engine: pytorch")?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(
        writer,
        "# Annotation data set configuration (and individual video cropping parameters)"
    )?;
    writeln!(writer, "video_sets:")?;
    writeln!(writer, "  {}:", video_filename)?;
    writeln!(writer, "    crop: false")?;
    writeln!(writer)?;
    writeln!(writer, "# Other settings")?;
    writeln!(writer, "bodyparts:")?;
    for bodypart in bodyparts {
        writeln!(writer, "- {}", bodypart)?;
    }
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(writer, "start: 0")?;
    writeln!(writer, "stop: 1")?;
    writeln!(writer, "numframes2pick: 20")?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(writer, "# Plotting configuration")?;
    writeln!(writer, "skeleton:")?;
    writeln!(writer, "  # Queen bee skeleton")?;
    writeln!(writer, "  - [Q_Head, Q_Neck]")?;
    writeln!(writer, "  - [Q_Neck, Q_Tail]")?;
    writeln!(writer, "  - [Q_Antenna_L1, Q_Antenna_L2]")?;
    writeln!(writer, "  - [Q_Antenna_L2, Q_Antenna_L3]")?;
    writeln!(writer, "  - [Q_Antenna_L3, Q_Head]")?;
    writeln!(writer, "  - [Q_Antenna_R1, Q_Antenna_R2]")?;
    writeln!(writer, "  - [Q_Antenna_R2, Q_Antenna_R3]")?;
    writeln!(writer, "  - [Q_Antenna_R3, Q_Head]")?;
    writeln!(writer)?;
    writeln!(writer, "  # Other bee skeleton (template individual)")?;
    writeln!(writer, "  - [O_Head, O_Neck]")?;
    writeln!(writer, "  - [O_Neck, O_Tail]")?;
    writeln!(writer, "  - [O_Antenna_L1, O_Antenna_L2]")?;
    writeln!(writer, "  - [O_Antenna_L2, O_Antenna_L3]")?;
    writeln!(writer, "  - [O_Antenna_L3, O_Head]")?;
    writeln!(writer, "  - [O_Antenna_R1, O_Antenna_R2]")?;
    writeln!(writer, "  - [O_Antenna_R2, O_Antenna_R3]")?;
    writeln!(writer, "  - [O_Antenna_R3, O_Head]")?;
    writeln!(writer, "skeleton_color: blue")?;
    writeln!(writer, "pcutoff: 0.4")?;
    writeln!(writer, "dotsize: 12")?;
    writeln!(writer, "alphavalue: 0.7")?;
    writeln!(writer, "colormap: plasma")?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(writer, "# Training,Evaluation and Analysis configuration")?;
    writeln!(writer, "TrainingFraction: [0.95]")?;
    writeln!(writer, "iteration: 0")?;
    writeln!(writer, "default_net_type: resnet_50")?;
    writeln!(writer, "default_augmenter: imgaug")?;
    writeln!(writer, "snapshotindex: -1")?;
    writeln!(writer, "detector_snapshotindex: -1")?;
    writeln!(writer, "batch_size: 8")?;
    writeln!(writer, "detector_batch_size: 1")?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(
        writer,
        "# Cropping Parameters (for analysis and outlier frame detection)"
    )?;
    writeln!(writer, "cropping:")?;
    writeln!(
        writer,
        "#if cropping is true for analysis, then set the values here:"
    )?;
    writeln!(writer, "x1:")?;
    writeln!(writer, "x2:")?;
    writeln!(writer, "y1:")?;
    writeln!(writer, "y2:")?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(
        writer,
        "# Refinement configuration (parameters from annotation dataset configuration also relevant in this stage)"
    )?;
    writeln!(writer, "corner2move2:")?;
    writeln!(writer, "move2corner:")?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(writer, "# Conversion tables to fine-tune SuperAnimal weights")?;
    writeln!(writer, "SuperAnimalConversionTables:")?;
    writeln!(writer, "project_name: {}", project_name)?;
    writer.flush()?;

    info!("Wrote project descriptor: {}", config_path.display());
    Ok(config_path)
}
