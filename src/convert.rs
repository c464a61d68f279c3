use log::{info, warn};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Options for the external CSV-to-HDF5 table converter call.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Hard deadline for the foreign process.
    pub timeout: Duration,
    /// Feed an affirmative answer to the converter's confirmation prompt.
    pub auto_confirm: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            auto_confirm: true,
        }
    }
}

/// Result of the best-effort external converter call. `Skipped` is a benign
/// outcome: the CSV table and config.yaml are the authoritative artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Converted,
    Skipped(String),
}

impl ToolOutcome {
    pub fn warning(&self) -> Option<&str> {
        match self {
            ToolOutcome::Converted => None,
            ToolOutcome::Skipped(reason) => Some(reason),
        }
    }
}

/// Invoke DeepLabCut's `convertcsv2h5` through a spawned interpreter.
///
/// One explicit call with a bounded timeout. The converter's confirmation
/// prompt ("Do you want to convert the csv file ...?") is answered through
/// the child's stdin, not by patching any global input state or injecting
/// undocumented environment switches. A missing interpreter, missing
/// deeplabcut package, nonzero exit or timeout all downgrade to
/// [`ToolOutcome::Skipped`].
pub fn convert_annotation_table(
    config_path: &Path,
    scorer: &str,
    options: &ConvertOptions,
) -> ToolOutcome {
    info!("Converting annotation table to HDF5 via deeplabcut...");

    let outcome = run_with_timeout(converter_command(config_path, scorer), options);
    match &outcome {
        ToolOutcome::Converted => info!("Annotation table converted to HDF5"),
        ToolOutcome::Skipped(reason) => {
            warn!("{}", reason);
            warn!(
                "Run deeplabcut.convertcsv2h5({:?}, scorer={:?}) manually if the HDF5 table is needed",
                config_path.to_string_lossy(),
                scorer
            );
        }
    }
    outcome
}

/// Build the interpreter invocation for the converter.
fn converter_command(config_path: &Path, scorer: &str) -> Command {
    let script = format!(
        "import deeplabcut; deeplabcut.convertcsv2h5({:?}, scorer={:?})",
        config_path.to_string_lossy(),
        scorer
    );
    let mut command = Command::new("python3");
    command
        .arg("-c")
        .arg(script)
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    command
}

/// Spawn `command` and wait for it, polling against the configured deadline.
fn run_with_timeout(mut command: Command, options: &ConvertOptions) -> ToolOutcome {
    if options.auto_confirm {
        command.stdin(Stdio::piped());
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            return ToolOutcome::Skipped(format!(
                "table converter unavailable ({:?} not found: {})",
                command.get_program(),
                e
            ));
        }
    };

    if options.auto_confirm {
        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(b"yes\n");
        }
    }

    let deadline = Instant::now() + options.timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return ToolOutcome::Converted,
            Ok(Some(status)) => {
                return ToolOutcome::Skipped(format!("table converter exited with {}", status));
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return ToolOutcome::Skipped(format!(
                        "table converter timed out after {:?}; primary artifacts are unaffected",
                        options.timeout
                    ));
                }
                std::thread::sleep(Duration::from_millis(100));
            }
            Err(e) => {
                return ToolOutcome::Skipped(format!(
                    "failed to wait for table converter: {}",
                    e
                ));
            }
        }
    }
}
