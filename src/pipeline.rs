use log::info;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Args;
use crate::convert::{convert_annotation_table, ConvertOptions};
use crate::error::PipelineError;
use crate::types::RunReport;
use crate::window::{FramePolicy, FrameWindow};
use crate::{cvat, dataset, project, video};

/// Everything a single conversion run needs as input.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub xml_file: PathBuf,
    pub video_file: PathBuf,
    pub output_dir: PathBuf,
    pub project_name: String,
    pub scorer: String,
    pub policy: FramePolicy,
    pub bounds: Option<(u32, u32)>,
    pub convert_table: bool,
    pub tool_timeout: Duration,
}

impl From<&Args> for RunConfig {
    fn from(args: &Args) -> Self {
        Self {
            xml_file: args.xml_file.clone(),
            video_file: args.video_file.clone(),
            output_dir: args.output_dir.clone(),
            project_name: args.project_name.clone(),
            scorer: args.scorer.clone(),
            policy: args.frames.policy(),
            bounds: match (args.start, args.end) {
                (Some(start), Some(end)) => Some((start, end)),
                _ => None,
            },
            convert_table: !args.skip_table_conversion,
            tool_timeout: Duration::from_secs(args.tool_timeout),
        }
    }
}

/// One conversion run. Stage outputs accumulate here; no stage rewrites a
/// field another stage populated, and the frame window is resolved exactly
/// once and handed by value to extraction, assembly and the summary.
pub struct PipelineRun {
    config: RunConfig,
    warnings: Vec<String>,
}

impl PipelineRun {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            warnings: Vec::new(),
        }
    }

    /// Execute the full conversion, halting on the first fatal stage failure.
    pub fn run(mut self) -> Result<RunReport, PipelineError> {
        let config = self.config.clone();

        let index = cvat::parse(&config.xml_file)?;
        let descriptor = video::probe(&config.video_file, index.job_meta())?;

        let window = FrameWindow::resolve(config.policy, descriptor.total_frames, config.bounds)?;
        info!(
            "Frame window fixed: {}-{} ({} frames)",
            window.start(),
            window.end(),
            window.frame_count()
        );

        let video_stem = descriptor.stem();
        let dirs = project::setup_project_directories(&config.output_dir, &video_stem)?;

        let extracted = video::extract(&config.video_file, window, &dirs.labeled_data_dir)?;

        let stats = dataset::write_collected_data(
            &index,
            window,
            &video_stem,
            &config.scorer,
            &dirs.labeled_data_dir,
        )?;
        let config_path = dataset::write_config_yaml(
            &dirs.root,
            &config.project_name,
            &config.scorer,
            &descriptor.file_name(),
            index.bodyparts(),
        )?;

        project::copy_video(&config.video_file, &dirs.videos_dir)?;

        if config.convert_table {
            let options = ConvertOptions {
                timeout: config.tool_timeout,
                auto_confirm: true,
            };
            let outcome = convert_annotation_table(&config_path, &config.scorer, &options);
            if let Some(reason) = outcome.warning() {
                self.warnings.push(reason.to_string());
            }
        }

        if let Some(warning) = project::write_summary(
            &dirs.root,
            &config.project_name,
            &config.scorer,
            &descriptor,
            &index,
            window,
        ) {
            self.warnings.push(warning);
        }

        Ok(RunReport {
            output_dir: dirs.root,
            extracted_frames: extracted,
            table_rows: stats.rows,
            bodyparts: index.bodyparts().to_vec(),
            warnings: self.warnings,
        })
    }
}
