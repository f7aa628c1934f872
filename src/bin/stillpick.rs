use std::time::Duration;

#[cfg(feature = "ffmpeg")]
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use serde_json::json;
use stillpick::planner::{self, Planner};

#[cfg(feature = "ffmpeg")]
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(feature = "ffmpeg")]
use stillpick::{
    ExportOptions, FfmpegLogLevel, FfmpegSource, FrameId, ProgressCallback, ProgressInfo,
    SamplingOptions, SamplingRun, Session,
};

const CLI_AFTER_HELP: &str = "Examples:\n  stillpick plan 10 --target 30\n  stillpick plan 1:30:00 --rate 2 --json\n  stillpick extract input.mp4 --out stills.zip --progress\n  stillpick extract input.mp4 --out stills.zip --rate 1 --deselect 1,2 --remove 5\n  stillpick completions zsh > _stillpick";

#[derive(Debug, Parser)]
#[command(
    name = "stillpick",
    version,
    about = "Sample still frames from a video and package a selection as a zip archive",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while sampling.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting an existing output archive.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, clap::Args)]
struct BudgetArgs {
    /// Desired sampling rate in frames per second.
    #[arg(long)]
    rate: Option<f64>,

    /// Frames to aim for when no rate is given.
    #[arg(long, default_value_t = 30)]
    target: u32,

    /// Hard limit on frames per run.
    #[arg(long, default_value_t = 600)]
    ceiling: u32,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the sampling plan for a duration.
    #[command(
        about = "Show the sampling plan for a video duration",
        after_help = "Examples:\n  stillpick plan 10\n  stillpick plan 00:02:30 --rate 4 --json\n  stillpick plan inf"
    )]
    Plan {
        /// Duration in seconds or [hh:]mm:ss; `inf` and `nan` model broken metadata.
        duration: String,

        #[command(flatten)]
        budget: BudgetArgs,

        /// List every target timestamp.
        #[arg(long)]
        list: bool,

        /// Output the plan as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    #[cfg(feature = "ffmpeg")]
    /// Sample a video and write the selected stills to a zip archive.
    #[command(
        about = "Sample stills from a video into a zip archive",
        after_help = "Frame numbers for --select, --deselect and --remove are 1-based, in sampling order.\n\nExamples:\n  stillpick extract input.mp4 --out stills.zip\n  stillpick extract input.mp4 --out stills.zip --unselected --select 3,7,9"
    )]
    Extract {
        /// Input video path.
        input: PathBuf,

        /// Output archive path.
        #[arg(long)]
        out: PathBuf,

        #[command(flatten)]
        budget: BudgetArgs,

        /// Start with every frame deselected.
        #[arg(long)]
        unselected: bool,

        /// Frames to select.
        #[arg(long, value_delimiter = ',')]
        select: Vec<usize>,

        /// Frames to deselect.
        #[arg(long, value_delimiter = ',')]
        deselect: Vec<usize>,

        /// Frames to delete before export.
        #[arg(long, value_delimiter = ',')]
        remove: Vec<usize>,

        /// Archive entry prefix.
        #[arg(long, default_value = "frame")]
        prefix: String,

        /// Per-step seek timeout in milliseconds.
        #[arg(long)]
        step_timeout_ms: Option<u64>,

        /// Print a machine-readable summary.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse seconds or a `[hh:]mm:ss[.fff]` timecode into raw seconds.
///
/// Non-finite values pass through so broken metadata can be modelled.
fn parse_seconds(value: &str) -> Result<f64, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("duration cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return Ok(seconds);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!("invalid time format: {trimmed}").into());
    }

    let (hours, minutes, seconds_str) = if parts.len() == 3 {
        (parts[0].parse::<u64>()?, parts[1].parse::<u64>()?, parts[2])
    } else {
        (0_u64, parts[0].parse::<u64>()?, parts[1])
    };

    let seconds = seconds_str.parse::<f64>()?;
    Ok((hours as f64 * 3600.0) + (minutes as f64 * 60.0) + seconds)
}

/// All target timestamps of a plan, bounded by the step ceiling.
fn target_timestamps(plan: &stillpick::SamplingPlan, duration: Duration, ceiling: u32) -> Vec<Duration> {
    let mut timestamps = Vec::new();
    let mut current = plan.start_offset;
    while current < duration && timestamps.len() < ceiling.max(1) as usize {
        timestamps.push(current);
        current = current.saturating_add(plan.interval);
    }
    timestamps
}

/// Map 1-based frame numbers onto frame ids, rejecting unknown numbers.
#[cfg(feature = "ffmpeg")]
fn resolve_frame_numbers(
    run: &SamplingRun,
    numbers: &[usize],
) -> Result<Vec<FrameId>, Box<dyn std::error::Error>> {
    numbers
        .iter()
        .map(|&number| {
            number
                .checked_sub(1)
                .and_then(|index| run.frames().get(index))
                .map(|frame| frame.id())
                .ok_or_else(|| -> Box<dyn std::error::Error> {
                    format!("frame {number} does not exist (run has {} frames)", run.len()).into()
                })
        })
        .collect()
}

#[cfg(feature = "ffmpeg")]
fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(global.verbose);

    #[cfg(feature = "ffmpeg")]
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        stillpick::set_ffmpeg_log_level(parsed);
    }

    #[cfg(not(feature = "ffmpeg"))]
    if global.log_level.is_some() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            "--log-level requires building with the `ffmpeg` feature".yellow()
        );
    }

    Ok(())
}

#[cfg(feature = "ffmpeg")]
struct TerminalProgress {
    bar: ProgressBar,
}

#[cfg(feature = "ffmpeg")]
impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(100);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos:>3}% {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

#[cfg(feature = "ffmpeg")]
impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(u64::from(info.percent));
        self.bar
            .set_message(format!("{} frame(s)", info.frames_captured));
        if info.percent >= 100 {
            self.bar.finish_with_message(format!("{} frame(s)", info.frames_captured));
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Plan {
            duration,
            budget,
            list,
            json,
        } => {
            let reported = parse_seconds(&duration)?;
            let effective = planner::effective_duration(Some(reported));
            let plan = Planner::default().plan(effective, budget.rate, budget.target, budget.ceiling);
            let frame_count = plan
                .implied_frame_count(effective)
                .min(u64::from(budget.ceiling.max(1)));
            let timestamps = target_timestamps(&plan, effective, budget.ceiling);

            if json {
                let mut payload = json!({
                    "reported_duration_seconds": reported.is_finite().then_some(reported),
                    "duration_seconds": effective.as_secs_f64(),
                    "interval_seconds": plan.interval.as_secs_f64(),
                    "start_offset_seconds": plan.start_offset.as_secs_f64(),
                    "frame_count": frame_count,
                });
                if list {
                    payload["timestamps"] = json!(
                        timestamps
                            .iter()
                            .map(Duration::as_secs_f64)
                            .collect::<Vec<_>>()
                    );
                }
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                if effective.as_secs_f64() != reported {
                    eprintln!(
                        "{} {}",
                        "warning:".yellow().bold(),
                        format!(
                            "unusable duration {reported}, planning for {:.3}s",
                            effective.as_secs_f64()
                        )
                        .yellow()
                    );
                }
                println!("Duration: {:.3}s", effective.as_secs_f64());
                println!("Interval: {:.3}s", plan.interval.as_secs_f64());
                println!("Start offset: {:.3}s", plan.start_offset.as_secs_f64());
                println!("Frames: {frame_count}");
                if list {
                    for (index, timestamp) in timestamps.iter().enumerate() {
                        println!(
                            "{:>4}  {}",
                            index + 1,
                            stillpick::frame::format_timestamp(*timestamp)
                        );
                    }
                }
            }
        }
        #[cfg(feature = "ffmpeg")]
        Commands::Extract {
            input,
            out,
            budget,
            unselected,
            select,
            deselect,
            remove,
            prefix,
            step_timeout_ms,
            json,
        } => {
            ensure_writable_path(&out, cli.global.overwrite)?;

            let mut options = SamplingOptions::new()
                .with_target_count(budget.target)
                .with_hard_ceiling(budget.ceiling)
                .with_default_selected(!unselected);
            if let Some(rate) = budget.rate {
                options = options.with_desired_rate(rate);
            }
            if let Some(milliseconds) = step_timeout_ms {
                options = options.with_step_timeout(Duration::from_millis(milliseconds));
            }
            if cli.global.progress {
                options = options.with_progress(Arc::new(TerminalProgress::new()?));
            }

            let source = FfmpegSource::new(&input);
            let mut session = Session::new(options)
                .with_export_options(ExportOptions::new().with_prefix(prefix));

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()?;
            let loaded = runtime.block_on(session.load(source));
            // A timed-out open may still hold a blocking thread.
            runtime.shutdown_background();
            loaded?;

            let sampled = session.run().len();
            let to_select = resolve_frame_numbers(session.run(), &select)?;
            let to_deselect = resolve_frame_numbers(session.run(), &deselect)?;
            let to_remove = resolve_frame_numbers(session.run(), &remove)?;

            for id in to_select {
                if session.run().get(id).is_some_and(|frame| !frame.is_selected()) {
                    session.run_mut().toggle(id);
                }
            }
            for id in to_deselect {
                if session.run().get(id).is_some_and(|frame| frame.is_selected()) {
                    session.run_mut().toggle(id);
                }
            }
            for id in to_remove {
                session.remove(id);
            }

            if session.run().is_exhausted() {
                return Err("every frame was removed; nothing to export".into());
            }

            let archive = session.export()?;
            std::fs::write(&out, &archive)?;

            let exported = session.run().selected_count();
            if json {
                let payload = json!({
                    "input": input.display().to_string(),
                    "output": out.display().to_string(),
                    "sampled": sampled,
                    "kept": session.run().len(),
                    "exported": exported,
                    "interval_seconds": session.run().interval().map(|interval| interval.as_secs_f64()),
                    "archive_bytes": archive.len(),
                    "frames": session.run().selected().map(|frame| json!({
                        "id": frame.id().to_string(),
                        "timestamp_seconds": frame.timestamp().as_secs_f64(),
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                if cli.global.verbose {
                    for frame in session.run().selected() {
                        eprintln!("kept {} at {}", frame.id(), frame.label());
                    }
                }
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "Exported {exported} of {sampled} sampled frame(s) to {}",
                        out.display()
                    )
                    .green()
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "stillpick", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
