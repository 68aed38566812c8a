//! DesignTree CLI - Bridge interface for the API layer
//!
//! Commands: tokens, structure, bundle
//! Outputs JSON to stdout, logs to stderr
//! Exit codes: 1 I/O or usage, 2 malformed input, 3 resource exhaustion

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use designtree_core::{
    extract_tokens_with, normalize_with, DesignFile, ExtractError,
    ExtractRequest, ExtractionPipeline, FileSource, Framework, ReaderSource, TraversalLimits,
};

#[derive(Parser)]
#[command(name = "designtree-cli")]
#[command(about = "DesignTree CLI - design token extraction and structure normalization")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file with traversal limits
    #[arg(long, global = true)]
    limits: Option<PathBuf>,

    /// Maximum child depth below the root
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Maximum number of nodes visited
    #[arg(long, global = true)]
    max_nodes: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract color and typography tokens
    Tokens {
        /// Design file JSON, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,
    },

    /// Normalize the component tree
    Structure {
        /// Design file JSON, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,
    },

    /// Tokens, structure and image references in one bundle
    Bundle {
        /// Design file JSON, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Restrict to the subtree rooted at this node id
        #[arg(short, long)]
        node: Option<String>,

        /// Target framework hint
        #[arg(short, long, default_value = "react")]
        framework: Framework,

        /// Skip image reference collection
        #[arg(long)]
        no_images: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let limits = match resolve_limits(&cli) {
        Ok(l) => l,
        Err(e) => return fail(&e),
    };
    let pipeline = ExtractionPipeline::new(limits);

    let result = match cli.command {
        Commands::Tokens { input } => load(&pipeline, &input).and_then(|file| {
            let tokens = extract_tokens_with(&file.document, pipeline.limits())?;
            Ok(serde_json::json!({"success": true, "design_tokens": tokens}))
        }),

        Commands::Structure { input } => load(&pipeline, &input).and_then(|file| {
            let structure = normalize_with(&file.document, pipeline.limits())?;
            Ok(serde_json::json!({"success": true, "structure": structure}))
        }),

        Commands::Bundle {
            input,
            node,
            framework,
            no_images,
        } => load(&pipeline, &input).and_then(|file| {
            let request = ExtractRequest {
                node_id: node,
                framework,
                include_images: !no_images,
            };
            let bundle = pipeline.run(&file, &request)?;
            Ok(serde_json::json!({"success": true, "bundle": bundle}))
        }),
    };

    match result {
        Ok(output) => {
            emit(&output);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_limits(cli: &Cli) -> Result<TraversalLimits, ExtractError> {
    let mut limits = match &cli.limits {
        Some(path) => TraversalLimits::load(path)?,
        None => TraversalLimits::default(),
    };
    if let Some(depth) = cli.max_depth {
        limits = limits.with_max_depth(depth);
    }
    if let Some(nodes) = cli.max_nodes {
        limits = limits.with_max_nodes(nodes);
    }
    Ok(limits)
}

fn load(pipeline: &ExtractionPipeline, input: &str) -> Result<DesignFile, ExtractError> {
    if input == "-" {
        pipeline.load(&ReaderSource::new("stdin", std::io::stdin()))
    } else {
        pipeline.load(&FileSource::new(input))
    }
}

fn emit(output: &serde_json::Value) {
    match serde_json::to_string_pretty(output) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("failed to encode output: {}", e),
    }
}

fn fail(error: &ExtractError) -> ExitCode {
    tracing::warn!(code = error.code(), "{}", error);
    emit(&serde_json::json!({"success": false, "error": error}));
    if error.is_resource_exhaustion() {
        ExitCode::from(3)
    } else if error.is_malformed() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}
