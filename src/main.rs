//! IIoT Vibration Agent CLI
//!
//! Windowed spectral features and classification for 9-axis vibration sensors.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use iiot_vibration_agent::{
    classifier::{Classifier, ProcessClassifier},
    config::Config,
    core::{sample::Axis, SpectralFeaturePipeline, WindowingController},
    ingest::{csv_window, forward_samples, open_source, SensorFusion},
    runtime::PipelineRuntime,
    sink::{JsonLinesSink, ResultSink},
    stats::{create_shared_stats_with_persistence, PersistedStats, STATS_FILE},
    VERSION,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Samples buffered between the input reader and the controller.
const SAMPLE_QUEUE_CAPACITY: usize = 1024;

#[derive(Parser)]
#[command(name = "vibration-agent")]
#[command(version = VERSION)]
#[command(about = "Windowed vibration classification for 9-axis IIoT sensors", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long = "config", global = true)]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a stream of `topic payload` sensor messages
    Run {
        /// Message file, or `-` for stdin
        #[arg(long, short, default_value = "-")]
        input: PathBuf,

        /// Model runner executable
        #[arg(long)]
        runner: PathBuf,

        /// Extra argument passed to the runner (repeatable)
        #[arg(long = "runner-arg", allow_hyphen_values = true)]
        runner_args: Vec<String>,

        /// Append status lines to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print the feature vector of a recorded CSV window
    Features {
        /// CSV file with nine columns per row
        #[arg(long, short)]
        input: PathBuf,

        /// Print named per-axis features instead of the flat vector
        #[arg(long)]
        per_axis: bool,
    },

    /// Show statistics from previous sessions
    Status,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the loaded configuration
    Show,
    /// Validate the configuration and report derived values
    Check,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config_file.as_deref();

    let result = match cli.command {
        Commands::Run {
            input,
            runner,
            runner_args,
            output,
        } => cmd_run(config_path, &input, runner, runner_args, output).await,
        Commands::Features { input, per_axis } => cmd_features(config_path, &input, per_axis),
        Commands::Status => cmd_status(config_path),
        Commands::Config { action } => cmd_config(config_path, action),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_path);
    Config::load_from(&path).with_context(|| format!("Failed to load config from {path:?}"))
}

async fn cmd_run(
    config_path: Option<&Path>,
    input: &Path,
    runner: PathBuf,
    runner_args: Vec<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;
    if let Err(e) = config.ensure_directories() {
        tracing::warn!(error = %e, "Could not create data directory");
    }

    // Status lines may go to stdout, so the banner goes to stderr
    eprintln!("IIoT Vibration Agent v{VERSION}");
    eprintln!();
    eprintln!("  Input: {}", input.display());
    eprintln!("  Runner: {}", runner.display());
    eprintln!(
        "  Window: {} samples ({} kept after classification)",
        config.windowing.target_size,
        config.windowing.retained_after_classification()
    );
    eprintln!(
        "  Features: {} ({} axes × fft {})",
        config.dsp.expected_feature_count, config.dsp.axis_count, config.dsp.fft_length
    );
    eprintln!(
        "  Classification timeout: {}ms",
        config.windowing.classify_timeout.as_millis()
    );
    eprintln!();
    eprintln!("Press Ctrl+C to stop");
    eprintln!();

    let controller = WindowingController::from_config(&config)?;
    let classifier: Arc<dyn Classifier> = Arc::new(ProcessClassifier::new(runner, runner_args));
    let sink: Arc<dyn ResultSink> = match output {
        Some(path) => Arc::new(
            JsonLinesSink::create(config.topics.status.clone(), &path)
                .await
                .with_context(|| format!("Failed to open output {path:?}"))?,
        ),
        None => Arc::new(JsonLinesSink::stdout(config.topics.status.clone())),
    };
    let stats = create_shared_stats_with_persistence(config.data_path.join(STATS_FILE));

    let (tx, rx) = mpsc::channel(SAMPLE_QUEUE_CAPACITY);
    let runtime = PipelineRuntime::new(
        controller,
        classifier,
        sink,
        Arc::clone(&stats),
        config.windowing.classify_timeout,
    );
    let runtime_handle = tokio::spawn(runtime.run(rx));

    let mut source = open_source(input)
        .await
        .with_context(|| format!("Failed to open input {input:?}"))?;
    let mut fusion = SensorFusion::new(&config.topics);

    let input_result = tokio::select! {
        result = forward_samples(&mut source, &mut fusion, &tx, &stats) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nShutting down...");
            Ok(0)
        }
    };

    // Closing the queue lets the runtime finish the window in flight
    drop(tx);
    let summary = runtime_handle.await.context("Pipeline task failed")?;

    if let Err(e) = stats.save() {
        tracing::warn!(error = %e, "Could not save pipeline stats");
    }

    eprintln!();
    eprintln!(
        "Session: {} samples, {} windows classified, {} failures, {} buffered",
        summary.samples_ingested,
        summary.windows_classified,
        summary.classification_failures,
        summary.controller.window().len()
    );
    eprintln!("{}", stats.summary());

    input_result.context("Input stream failed")?;
    Ok(())
}

fn cmd_features(config_path: Option<&Path>, input: &Path, per_axis: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let pipeline = SpectralFeaturePipeline::new(config.dsp.clone())?;

    let flat = csv_window::load_flat(input)
        .with_context(|| format!("Failed to load recorded window {input:?}"))?;

    let json = if per_axis {
        let named: BTreeMap<_, _> = Axis::ALL
            .iter()
            .map(|axis| axis.name())
            .zip(pipeline.extract_axes(&flat))
            .collect();
        serde_json::to_string_pretty(&named)?
    } else {
        serde_json::to_string_pretty(&pipeline.extract(&flat))?
    };

    println!("{json}");
    Ok(())
}

fn cmd_status(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    println!("IIoT Vibration Agent Status");
    println!("===========================");
    println!();

    println!("Configuration:");
    println!("  Accelerometer topic: {}", config.topics.accel);
    println!("  Combined topic: {}", config.topics.combined);
    println!("  Status topic: {}", config.topics.status);
    println!("  Window size: {} samples", config.windowing.target_size);
    println!("  Sample rate: {} Hz", config.dsp.sample_rate);
    println!();

    let stats_path = config.data_path.join(STATS_FILE);
    match PersistedStats::read(&stats_path)
        .with_context(|| format!("Failed to read {stats_path:?}"))?
    {
        Some(stats) => {
            println!("Cumulative Statistics:");
            println!("  Samples ingested: {}", stats.samples_ingested);
            println!("  Messages dropped: {}", stats.messages_dropped);
            println!("  Windows classified: {}", stats.windows_classified);
            println!("  Classification failures: {}", stats.classification_failures);
            println!("  Results published: {}", stats.results_published);
            println!("  Last updated: {}", stats.last_updated);
        }
        None => println!("No previous session data found."),
    }

    Ok(())
}

fn cmd_config(config_path: Option<&Path>, action: ConfigAction) -> Result<()> {
    let config = load_config(config_path)?;

    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Check => {
            // Loading already validated every section; the controller adds its own checks
            WindowingController::from_config(&config)?;

            let derived = config.dsp.derived_feature_count();
            println!("Configuration OK");
            println!("  Derived features: {derived}");
            println!("  Expected features: {}", config.dsp.expected_feature_count);
            if derived != config.dsp.expected_feature_count {
                println!("  Note: feature vectors will be padded or truncated to the expected count");
            }
            println!(
                "  FFT bin width: {:.4} Hz",
                config.dsp.sample_rate / config.dsp.fft_length as f64
            );
        }
    }

    Ok(())
}
