use std::{io, sync::Arc};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use shotsplit::{
    DEFAULT_MIN_RUN, DEFAULT_PREFETCH_DEPTH, FlagSource, FrameDecoder, OperationType,
    PipelineOptions, ProgressCallback, ProgressInfo, SceneSpan, Segmenter, ShotsplitError,
};

const CLI_AFTER_HELP: &str = "Examples:\n  shotsplit-cli segment cuts.txt --min-run 11\n  shotsplit-cli segment cuts.json --fps 23.976 --json\n  detector --flags | shotsplit-cli segment - --max-scene-length 500 --progress\n  shotsplit-cli check cuts.txt --prefetch-depth 96\n  shotsplit-cli completions zsh > _shotsplit-cli";

#[derive(Debug, Parser)]
#[command(
    name = "shotsplit-cli",
    version,
    about = "Group per-frame boundary flags into scenes",
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
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while frames are fetched.
    #[arg(long, global = true)]
    progress: bool,
}

#[derive(Debug, Args, Clone)]
struct PipelineArgs {
    /// Maximum number of frame fetches in flight.
    #[arg(long, default_value_t = DEFAULT_PREFETCH_DEPTH)]
    prefetch_depth: usize,

    /// Frames after an accepted cut during which further cuts are ignored.
    #[arg(long, default_value_t = DEFAULT_MIN_RUN)]
    min_run: usize,

    /// Force a cut after this many frames.
    #[arg(long)]
    max_scene_length: Option<usize>,

    /// Frames each scene keeps regardless of cuts.
    #[arg(long, default_value_t = 1)]
    min_scene_length: usize,

    /// Frames buffered ahead of the current scene.
    #[arg(long, default_value_t = 1)]
    lookahead: usize,

    /// Decoder worker threads (defaults to the prefetch depth).
    #[arg(long)]
    threads: Option<usize>,
}

impl PipelineArgs {
    fn to_options(&self) -> PipelineOptions {
        let mut options = PipelineOptions::new()
            .with_prefetch_depth(self.prefetch_depth)
            .with_min_run(self.min_run)
            .with_max_scene_length(self.max_scene_length)
            .with_min_scene_length(self.min_scene_length)
            .with_lookahead(self.lookahead);

        if let Some(threads) = self.threads {
            options = options.with_decoder_threads(threads);
        }
        options
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Split a boundary-flag stream into scenes.
    #[command(
        about = "Print the scenes of a boundary-flag stream",
        after_help = "Input is a JSON array of booleans or 0/1, or whitespace separated 0/1 tokens.\nUse '-' to read from stdin."
    )]
    Segment {
        /// Flags file, or '-' for stdin.
        input: String,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Frame rate used to print scene start times.
        #[arg(long, value_parser = parse_frame_rate)]
        fps: Option<f64>,

        /// Output scenes as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check pipeline options against an input and print a report.
    #[command(about = "Validate options for an input")]
    Check {
        /// Flags file, or '-' for stdin.
        input: String,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn load_flags(input: &str) -> Result<FlagSource, ShotsplitError> {
    if input == "-" {
        FlagSource::from_reader(io::stdin().lock())
    } else {
        FlagSource::from_path(input)
    }
}

#[cfg(feature = "rayon")]
fn segment_spans(
    flags: FlagSource,
    options: &PipelineOptions,
) -> Result<Vec<SceneSpan>, ShotsplitError> {
    let source = shotsplit::PooledSource::with_options(flags, options)?;
    Segmenter::from_source(source, options)?.collect_spans()
}

#[cfg(not(feature = "rayon"))]
fn segment_spans(
    flags: FlagSource,
    options: &PipelineOptions,
) -> Result<Vec<SceneSpan>, ShotsplitError> {
    let source = shotsplit::InlineSource::new(flags);
    Segmenter::from_source(source, options)?.collect_spans()
}

/// Format a frame position as `HH:MM:SS.mmm`.
fn parse_frame_rate(value: &str) -> Result<f64, String> {
    let rate: f64 = value
        .parse()
        .map_err(|error| format!("invalid frame rate '{value}': {error}"))?;
    if !(rate.is_finite() && rate > 0.0) {
        return Err(format!("frame rate must be a positive finite number, got {value}"));
    }
    Ok(rate)
}

fn format_timestamp(frame: u64, frames_per_second: f64) -> String {
    let total_millis = (frame as f64 / frames_per_second * 1000.0).round() as u64;
    let (hours, rest) = (total_millis / 3_600_000, total_millis % 3_600_000);
    let (minutes, rest) = (rest / 60_000, rest % 60_000);
    let (seconds, millis) = (rest / 1000, rest % 1000);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

struct BarProgress {
    bar: ProgressBar,
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        match info.operation {
            OperationType::FrameFetch => self.bar.set_position(info.current),
            OperationType::SceneSegmentation => {
                self.bar.set_message(format!("{} scene(s)", info.current));
            }
            _ => {}
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Segment {
            input,
            pipeline,
            fps,
            json,
        } => {
            let flags = load_flags(&input)?;
            let frame_count = flags.frame_count();
            let mut options = pipeline.to_options();

            if cli.global.verbose {
                eprintln!("loaded {frame_count} flag(s) from {input}");
                eprintln!("{options:?}");
            }

            let progress_bar = if cli.global.progress {
                let bar = ProgressBar::new(frame_count);
                let style = ProgressStyle::with_template(
                    "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
                )?;
                bar.set_style(style.progress_chars("##-"));
                options = options.with_progress(Arc::new(BarProgress { bar: bar.clone() }));
                Some(bar)
            } else {
                None
            };

            let spans = segment_spans(flags, &options)?;

            if let Some(bar) = progress_bar {
                bar.finish_with_message("done");
            }

            if json {
                let payload: Vec<_> = spans
                    .iter()
                    .map(|span| {
                        json!({
                            "ordinal": span.ordinal,
                            "scene_id": span.scene_id,
                            "start": span.start,
                            "end": span.end(),
                            "frames": span.len,
                            "start_seconds": fps.map(|rate| span.start as f64 / rate),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
                return Ok(());
            }

            for span in &spans {
                let timing = fps
                    .map(|rate| format!("  @ {}", format_timestamp(span.start, rate)))
                    .unwrap_or_default();
                println!(
                    "scene {:>4}  id {:>4}  frames {:>7}..{:<7} ({} frames){timing}",
                    span.ordinal,
                    span.scene_id,
                    span.start,
                    span.end(),
                    span.len,
                );
            }

            println!(
                "{} {}",
                "success:".green().bold(),
                format!("Found {} scene(s) in {frame_count} frame(s)", spans.len()).green()
            );
        }
        Commands::Check { input, pipeline } => {
            let flags = load_flags(&input)?;
            let report = pipeline.to_options().report(flags.frame_count());
            print!("{report}");

            if !report.is_valid() {
                return Err(format!("{} configuration error(s)", report.errors.len()).into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "shotsplit-cli", &mut io::stdout());
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

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands, format_timestamp, parse_frame_rate};

    #[test]
    fn timestamp_formatting() {
        assert_eq!(format_timestamp(0, 25.0), "00:00:00.000");
        assert_eq!(format_timestamp(25, 25.0), "00:00:01.000");
        assert_eq!(format_timestamp(90_000, 25.0), "01:00:00.000");
        assert_eq!(format_timestamp(1, 24.0), "00:00:00.042");
    }

    #[test]
    fn frame_rate_must_be_positive_and_finite() {
        assert_eq!(parse_frame_rate("23.976"), Ok(23.976));
        for bad in ["0", "-25", "NaN", "inf", "-inf", "fast"] {
            assert!(parse_frame_rate(bad).is_err(), "accepted {bad}");
        }

        let rejected = Cli::try_parse_from(["shotsplit-cli", "segment", "cuts.txt", "--fps", "nan"]);
        assert!(rejected.is_err());
    }

    #[test]
    fn segment_defaults() {
        let cli = Cli::try_parse_from(["shotsplit-cli", "segment", "cuts.txt"]).unwrap();
        match cli.command {
            Commands::Segment { pipeline, json, .. } => {
                let options = pipeline.to_options();
                assert_eq!(options.prefetch_depth(), 48);
                assert_eq!(options.min_run(), 11);
                assert_eq!(options.max_scene_length(), None);
                assert!(!json);
            }
            other => panic!("Expected segment command, got {other:?}"),
        }
    }

    #[test]
    fn segment_overrides() {
        let cli = Cli::try_parse_from([
            "shotsplit-cli",
            "segment",
            "-",
            "--prefetch-depth",
            "8",
            "--min-run",
            "0",
            "--max-scene-length",
            "100",
            "--json",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.global.verbose);
        match cli.command {
            Commands::Segment {
                input,
                pipeline,
                json,
                ..
            } => {
                assert_eq!(input, "-");
                let options = pipeline.to_options();
                assert_eq!(options.prefetch_depth(), 8);
                assert_eq!(options.min_run(), 0);
                assert_eq!(options.max_scene_length(), Some(100));
                assert!(json);
            }
            other => panic!("Expected segment command, got {other:?}"),
        }
    }
}
