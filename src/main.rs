//! sqy - inspect sqeazy volume containers from the command line.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sqeazy_io::{
    utils::format_bytes, ContainerHeader, ImageMetadata, ReaderConfig, ReferenceCodec, SqyFormat,
    SqyReader,
};

/// Inspect sqeazy (.sqy) compressed volume containers.
#[derive(Parser, Debug)]
#[command(name = "sqy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Thread-count hint passed to the decoder.
    #[arg(long, env = "SQY_DECODE_THREADS", global = true)]
    decode_threads: Option<usize>,

    /// JSON file with reader configuration.
    #[arg(long, env = "SQY_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report whether a file is a sqeazy container.
    Check {
        /// Path or file:// URL.
        file: String,
    },

    /// Print header metadata.
    Info {
        /// Path or file:// URL.
        file: String,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Decode the volume and write one raw plane.
    Plane {
        /// Path or file:// URL.
        file: String,

        /// Plane index along Z.
        #[arg(short, long, default_value_t = 0)]
        index: usize,

        /// Destination for the raw plane bytes.
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct InfoReport<'a> {
    file: &'a str,
    header: &'a ContainerHeader,
    image: ImageMetadata,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let format = match build_format(&cli) {
        Ok(format) => format,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match &cli.command {
        Command::Check { file } => run_check(&format, file),
        Command::Info { file, json } => run_info(format, file, *json),
        Command::Plane {
            file,
            index,
            output,
        } => run_plane(format, file, *index, output),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "sqeazy_io=debug,sqy=debug"
    } else {
        "sqeazy_io=warn,sqy=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_format(cli: &Cli) -> anyhow::Result<SqyFormat> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ReaderConfig::from_json_str(&json)?
        }
        None => ReaderConfig::default(),
    };
    if let Some(threads) = cli.decode_threads {
        config.decode_threads = threads;
    }
    Ok(SqyFormat::new(Arc::new(ReferenceCodec), config)?)
}

fn run_check(format: &SqyFormat, file: &str) -> anyhow::Result<ExitCode> {
    if format.is_format_at(file) {
        println!("{}: {} container", file, format.name());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{}: not a {} container", file, format.name());
        Ok(ExitCode::FAILURE)
    }
}

fn run_info(format: SqyFormat, file: &str, json: bool) -> anyhow::Result<ExitCode> {
    let reader = SqyReader::open_at(format, file).with_context(|| format!("opening {}", file))?;
    let header = reader.header();

    if json {
        let report = InfoReport {
            file,
            header,
            image: reader.image_metadata(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("File:      {}", file);
    println!("Shape:     {} (rank {})", header.shape, header.rank());
    println!("Type:      {}", header.element_width);
    println!(
        "Pipeline:  {}",
        header.pipeline.as_deref().unwrap_or("unknown")
    );
    println!("Header:    {}", format_bytes(header.header_len));
    println!("Layout:    {}", header.layout.summary());
    Ok(ExitCode::SUCCESS)
}

fn run_plane(
    format: SqyFormat,
    file: &str,
    index: usize,
    output: &Path,
) -> anyhow::Result<ExitCode> {
    let reader = SqyReader::open_at(format, file).with_context(|| format!("opening {}", file))?;
    let plane = reader
        .open_plane(index)
        .with_context(|| format!("reading plane {} of {}", index, file))?;

    std::fs::write(output, &plane).with_context(|| format!("writing {}", output.display()))?;
    info!(
        plane = index,
        bytes = plane.len(),
        output = %output.display(),
        "wrote plane"
    );
    Ok(ExitCode::SUCCESS)
}
