use clap::Parser;
use log::{error, info};

use cvat2dlc::pipeline::{PipelineRun, RunConfig};
use cvat2dlc::Args;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if !args.xml_file.exists() {
        error!("XML file does not exist: {}", args.xml_file.display());
        std::process::exit(1);
    }
    if !args.video_file.exists() {
        error!("Video file does not exist: {}", args.video_file.display());
        std::process::exit(1);
    }

    info!("CVAT to DeepLabCut conversion pipeline");
    let config = RunConfig::from(&args);
    match PipelineRun::new(config).run() {
        Ok(report) => {
            report.print_summary();
            info!(
                "You can now use {} as a DeepLabCut project for training.",
                report.output_dir.display()
            );
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
