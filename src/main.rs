use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ocr_consensus::extract::collect_inputs;
use ocr_consensus::pipeline::{build_extractor, run_all, run_consensus, run_extraction, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "ocr-consensus")]
#[command(version, about = "Multi-engine OCR with edit-distance consensus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// TOML configuration file
    #[arg(short, long, env = "OCR_CONSENSUS_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of input images
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for result files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Process items in parallel above this many items (0 = always)
    #[arg(long)]
    parallel: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one engine over every input image
    Extract {
        /// Engine name: tesseract, or any engine served by the bridge script
        engine: String,

        #[command(flatten)]
        common: CommonArgs,

        /// Path to the tesseract binary
        #[arg(long)]
        tesseract_cmd: Option<PathBuf>,

        /// Interpreter for the bridge script
        #[arg(long)]
        python: Option<PathBuf>,

        /// Bridge script for Python-hosted engines (not bundled; you must provide it)
        #[arg(long)]
        script: Option<PathBuf>,

        /// Per-image timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Reconcile engine results into one text per image
    Consensus {
        #[command(flatten)]
        common: CommonArgs,

        /// Engines to reconcile, in tie-break order
        #[arg(short, long, value_delimiter = ',')]
        engines: Vec<String>,

        /// Also write consensus_report.json with per-engine scores
        #[arg(short, long)]
        debug: bool,
    },

    /// Extract with every configured engine, then reconcile
    Run {
        #[command(flatten)]
        common: CommonArgs,

        #[arg(short, long, value_delimiter = ',')]
        engines: Vec<String>,

        #[arg(short, long)]
        debug: bool,
    },

    /// Show input images and which result sets exist
    Info {
        #[command(flatten)]
        common: CommonArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Extract {
            engine,
            common,
            tesseract_cmd,
            python,
            script,
            timeout,
        } => {
            let mut config = load_config(&common)?;
            if let Some(cmd) = tesseract_cmd {
                config.engines.tesseract_cmd = cmd;
            }
            if let Some(python) = python {
                config.engines.python = python;
            }
            if let Some(script) = script {
                config.engines.bridge_script = script;
            }
            if let Some(timeout) = timeout {
                config.engines.timeout_secs = timeout;
            }
            extract(&config, &engine)
        }
        Commands::Consensus {
            common,
            engines,
            debug,
        } => {
            let config = with_engines(load_config(&common)?, engines);
            consensus(&config, debug)
        }
        Commands::Run {
            common,
            engines,
            debug,
        } => {
            let config = with_engines(load_config(&common)?, engines);
            println!("[*] Engines: {}", config.engine_names.join(", "));
            let path = run_all(&config, debug).context("pipeline run failed")?;
            println!("\n[✓] Done! Consensus saved to: {}", path.display());
            Ok(())
        }
        Commands::Info { common } => show_info(&load_config(&common)?),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(common: &CommonArgs) -> Result<PipelineConfig> {
    let mut config = match &common.config {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(input) = &common.input {
        config.input_dir = input.clone();
    }
    if let Some(output) = &common.output {
        config.output_dir = output.clone();
    }
    if let Some(threshold) = common.parallel {
        config.parallel_threshold = Some(threshold);
    }
    Ok(config)
}

fn with_engines(mut config: PipelineConfig, engines: Vec<String>) -> PipelineConfig {
    if !engines.is_empty() {
        config.engine_names = engines;
    }
    config
}

fn extract(config: &PipelineConfig, engine: &str) -> Result<()> {
    config.validate()?;
    if !config.input_dir.is_dir() {
        anyhow::bail!("Input directory does not exist: {}", config.input_dir.display());
    }

    println!("[*] Engine: {engine}");
    println!("[*] Input: {}", config.input_dir.display());
    println!("[*] Output: {}", config.output_dir.display());

    let extractor = build_extractor(config, engine);
    let path = run_extraction(config, extractor.as_ref())
        .with_context(|| format!("Extraction with '{engine}' failed"))?;

    println!("\n[✓] Done! Results saved to: {}", path.display());
    Ok(())
}

fn consensus(config: &PipelineConfig, debug: bool) -> Result<()> {
    println!("[*] Engines: {}", config.engine_names.join(", "));
    println!("[*] Results: {}", config.output_dir.display());

    let path = run_consensus(config, debug).context("Consensus run failed")?;

    println!("\n[✓] Done! Consensus saved to: {}", path.display());
    Ok(())
}

fn show_info(config: &PipelineConfig) -> Result<()> {
    let items = collect_inputs(&config.input_dir)
        .with_context(|| format!("Failed to list: {}", config.input_dir.display()))?;
    let store = config.store();

    println!("OCR Consensus");
    println!("=============");
    println!("Input: {}", config.input_dir.display());
    println!("Images: {}", items.len());
    println!("Output: {}", config.output_dir.display());
    for engine in &config.engine_names {
        let status = if store.has_results(engine) { "present" } else { "missing" };
        println!("- {engine}: {status} ({})", store.result_path(engine).display());
    }
    let consensus = if store.consensus_path().is_file() { "present" } else { "missing" };
    println!("Consensus: {consensus}");

    Ok(())
}
