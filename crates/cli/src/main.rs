use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use detparse_core::detection::domain::detection_params::DetectionParams;
use detparse_core::detection::infrastructure::box_decoder::BoxDecoder;
use detparse_core::detection::infrastructure::face_decoder::FaceDecoder;
use detparse_core::detection::infrastructure::face_extractor::{FaceExtractor, ResolutionContext};
use detparse_core::embedding::embedding_summarizer;
use detparse_core::pipeline::batch_executor::BatchExecutor;
use detparse_core::pipeline::decode_dump_use_case::DecodeDumpUseCase;
use detparse_core::pipeline::dump_decoder::DumpDecoder;
use detparse_core::pipeline::infrastructure::sequential_batch_executor::SequentialBatchExecutor;
use detparse_core::pipeline::infrastructure::threaded_batch_executor::ThreadedBatchExecutor;
use detparse_core::pipeline::pipeline_logger::LoggingPipelineLogger;
use detparse_core::shared::config::DecoderConfig;
use detparse_core::shared::constants::DEBUG_ENV_VAR;

/// Decode captured detector output tensors into detections.
#[derive(Parser)]
#[command(name = "detparse", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Decoder config file (JSON). Falls back to the per-user config, then defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Single-class confidence threshold; replaces the configured table.
    #[arg(long, global = true)]
    threshold: Option<f32>,

    /// Network input width in pixels.
    #[arg(long, global = true)]
    network_width: Option<u32>,

    /// Network input height in pixels.
    #[arg(long, global = true)]
    network_height: Option<u32>,

    /// Decode worker threads (1 = decode on the main thread).
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Log every candidate row at debug level.
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a generic object detector dump (count, boxes, scores, classes).
    Boxes {
        /// Tensor dump (JSON).
        input: PathBuf,
        /// Output file; stdout when omitted.
        output: Option<PathBuf>,
    },
    /// Decode a face detector dump (adds a landmark layer).
    Faces {
        input: PathBuf,
        output: Option<PathBuf>,
        /// Pixels added on every side of each face box.
        #[arg(long)]
        margin: Option<i32>,
    },
    /// Extract faces as the live pipeline does (margin 0, resolution context).
    Extract {
        input: PathBuf,
        output: Option<PathBuf>,
        /// Use the cropped-face resolution context instead of full frame.
        #[arg(long)]
        cropped: bool,
    },
    /// Split a 512-value embedding (JSON array) into labelled chunks.
    Embedding { input: PathBuf },
}

impl Command {
    fn input(&self) -> &Path {
        match self {
            Command::Boxes { input, .. }
            | Command::Faces { input, .. }
            | Command::Extract { input, .. }
            | Command::Embedding { input } => input,
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    init_logging(config.verbose);

    match &cli.command {
        Command::Boxes { input, output } => {
            let decoder = BoxDecoder::new().with_verbose(config.verbose);
            run_decode(Box::new(decoder), input, output.as_deref(), &config)
        }
        Command::Faces {
            input,
            output,
            margin,
        } => {
            let margin = margin.unwrap_or(config.margin);
            let decoder = FaceDecoder::new(margin).with_verbose(config.verbose);
            run_decode(Box::new(decoder), input, output.as_deref(), &config)
        }
        Command::Extract {
            input,
            output,
            cropped,
        } => {
            let context = if *cropped {
                ResolutionContext::Cropped
            } else {
                config.resolution
            };
            let extractor = FaceExtractor::new(context).with_verbose(config.verbose);
            run_decode(Box::new(extractor), input, output.as_deref(), &config)
        }
        Command::Embedding { input } => run_embedding(input),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

/// Config file (explicit or per-user) with command-line overrides applied.
fn build_config(cli: &Cli) -> Result<DecoderConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => DecoderConfig::load(path)?,
        None => DecoderConfig::load_or_default()?,
    };
    if let Some(threshold) = cli.threshold {
        config.class_thresholds = vec![threshold];
    }
    if let Some(width) = cli.network_width {
        config.network_width = width;
    }
    if let Some(height) = cli.network_height {
        config.network_height = height;
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    config.verbose |= cli.verbose || std::env::var_os(DEBUG_ENV_VAR).is_some();
    config.validate()?;
    Ok(config)
}

fn run_decode(
    decoder: Box<dyn DumpDecoder>,
    input: &Path,
    output: Option<&Path>,
    config: &DecoderConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let params: DetectionParams = config.detection_params()?;
    let executor: Box<dyn BatchExecutor> = if config.workers > 1 {
        Box::new(ThreadedBatchExecutor::new(config.workers))
    } else {
        Box::new(SequentialBatchExecutor)
    };
    let mut use_case =
        DecodeDumpUseCase::new(executor, decoder, Box::new(LoggingPipelineLogger::default()));

    match output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            use_case.execute(input, &params, &mut writer)?;
            writer.flush()?;
            log::info!("Output written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            use_case.execute(input, &params, &mut writer)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn run_embedding(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(input)?;
    let embedding: Vec<f32> = serde_json::from_str(&json)?;
    let attributes = embedding_summarizer::summarize(&embedding)?;

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    serde_json::to_writer_pretty(&mut writer, &attributes)?;
    writeln!(writer)?;
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let input = cli.command.input();
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    if let Some(path) = &cli.config {
        if !path.is_file() {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
    }
    if let Some(t) = cli.threshold {
        if !(0.0..=1.0).contains(&t) {
            return Err(format!("Threshold must be between 0.0 and 1.0, got {t}").into());
        }
    }
    if cli.network_width == Some(0) || cli.network_height == Some(0) {
        return Err("Network width and height must be positive".into());
    }
    if cli.workers == Some(0) {
        return Err("Workers must be at least 1".into());
    }
    if let Command::Faces {
        margin: Some(m), ..
    } = &cli.command
    {
        if *m < 0 {
            return Err(format!("Margin must not be negative, got {m}").into());
        }
    }
    Ok(())
}
