use clap::Parser;
use md_config::Config;
use md_core::{telemetry, time::frames_per_second, MonotonicTimer};
use md_vision::{
    utils::{create_moving_square_frame, create_uniform_frame},
    LogSink, MotionDetectionService, MotionReport,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::{fs, process};

const SYNTHETIC_WIDTH: u32 = 128;
const SYNTHETIC_HEIGHT: u32 = 96;

/// Block-based motion detector over a stream of frames
#[derive(Debug, Parser)]
#[command(name = "motion-detector", version)]
struct Cli {
    /// Configuration file (toml, yaml or json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of image frames, processed in file-name order
    #[arg(
        short,
        long,
        conflicts_with = "synthetic",
        required_unless_present_any = ["synthetic", "print_config"]
    )]
    input: Option<PathBuf>,

    /// Run a built-in moving-square scene of this many frames
    #[arg(long)]
    synthetic: Option<u32>,

    /// Print a JSON run summary to stdout
    #[arg(long)]
    summary: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

/// Counters for one run
#[derive(Debug, Default, Serialize)]
struct RunSummary {
    frames_ingested: u64,
    frames_evaluated: u64,
    frames_rejected: u64,
    motion_frames: u64,
    state_changes: u64,
    final_motion: bool,
}

struct Runner {
    service: MotionDetectionService,
    heartbeat_frames: u64,
    heartbeat_timer: MonotonicTimer,
    summary: RunSummary,
}

impl Runner {
    fn new(config: &Config) -> md_core::Result<Self> {
        let sink = LogSink::new(config.app.service_name.clone());
        Ok(Self {
            service: MotionDetectionService::with_sink(config.detector.clone(), Box::new(sink))?,
            heartbeat_frames: config.app.heartbeat_frames,
            heartbeat_timer: MonotonicTimer::new(),
            summary: RunSummary::default(),
        })
    }

    fn record(&mut self, report: &MotionReport) {
        self.summary.frames_ingested += 1;
        if report.evaluated {
            self.summary.frames_evaluated += 1;
        }
        if report.motion_detected {
            self.summary.motion_frames += 1;
        }
        self.summary.final_motion = report.motion_detected;

        if self.summary.frames_ingested % self.heartbeat_frames == 0 {
            let window = self.heartbeat_timer.lap();
            tracing::info!(
                frames = self.summary.frames_ingested,
                fps = %format!("{:.1}", frames_per_second(self.heartbeat_frames, window)),
                motion = report.motion_detected,
                "MotionDetector still running"
            );
        }
    }

    fn run_directory(&mut self, dir: &Path) -> md_core::Result<()> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        tracing::info!(dir = %dir.display(), frames = paths.len(), "Processing frame directory");

        for path in paths {
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Skipping unreadable frame: {}", e);
                    self.summary.frames_rejected += 1;
                    continue;
                }
            };

            match self.service.detect_motion_from_bytes(&bytes) {
                Ok(report) => {
                    tracing::debug!(path = %path.display(), ?report, "Frame processed");
                    self.record(&report);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Skipping frame: {}", e);
                    self.summary.frames_rejected += 1;
                }
            }
        }

        Ok(())
    }

    /// Still background for the first third, then a sliding square
    fn run_synthetic(&mut self, frames: u32) -> md_core::Result<()> {
        tracing::info!(frames, "Running synthetic scene");
        let still_frames = frames / 3;

        for i in 0..frames {
            let frame = if i < still_frames {
                create_uniform_frame(SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT, 64)
            } else {
                create_moving_square_frame(SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT, i - still_frames, 24, 6)
            };
            let report =
                self.service
                    .detect_motion_from_frame(frame.as_raw(), SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT)?;
            self.record(&report);
        }

        Ok(())
    }

    fn finish(mut self) -> RunSummary {
        self.summary.state_changes = self.service.published_count();
        self.summary
    }
}

fn main() {
    let cli = Cli::parse();

    // Load configuration - exit with non-zero if invalid
    let config = match Config::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            telemetry::init_tracing("development", "motion-detector");
            tracing::error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    telemetry::init_tracing(&config.app.environment, &config.app.service_name);
    tracing::debug!(?config, "Configuration loaded successfully");

    if cli.print_config {
        match config.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                tracing::error!("{}", e);
                process::exit(1);
            }
        }
        return;
    }

    let mut runner = match Runner::new(&config) {
        Ok(runner) => runner,
        Err(e) => {
            tracing::error!("Failed to create detector: {}", e);
            process::exit(1);
        }
    };

    tracing::info!(
        sensor = %config.app.service_name,
        pixel_diff_threshold = config.detector.pixel_diff_threshold,
        motion_blocks_threshold = config.detector.motion_blocks_threshold,
        frame_skip = config.detector.frame_skip,
        "MotionDetector setup complete"
    );

    let result = match (&cli.input, cli.synthetic) {
        (Some(dir), _) => runner.run_directory(dir),
        (None, Some(frames)) => runner.run_synthetic(frames),
        (None, None) => unreachable!("clap requires --input or --synthetic"),
    };

    if let Err(e) = result {
        tracing::error!("Run failed: {}", e);
        process::exit(1);
    }

    let summary = runner.finish();
    tracing::info!(
        frames = summary.frames_ingested,
        evaluated = summary.frames_evaluated,
        rejected = summary.frames_rejected,
        state_changes = summary.state_changes,
        "Run complete"
    );

    if cli.summary {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                tracing::error!("Failed to serialize summary: {}", e);
                process::exit(1);
            }
        }
    }
}
