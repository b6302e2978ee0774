use std::fs::File;
use std::io::{stderr, stdin, stdout, BufReader, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tsmeta::psi::TableKind;
use tsmeta::render::{JsonRenderer, Render, TextRenderer};
use tsmeta::{Config, Stats, StreamProcessor};

#[derive(Debug, Clone)]
enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

/// Show PAT, NIT and EIT metadata from an MPEG-2 transport stream.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Input transport stream file, or - to read stdin.
    input: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: Format,

    /// Tables to decode.
    #[arg(short, long, value_name = "csv", value_delimiter = ',', default_value = "pat,nit,eit")]
    tables: Vec<TableKind>,

    /// Stop after reading this many units.
    #[arg(short, long, value_name = "count")]
    limit: Option<usize>,

    /// Log debug messages. RUST_LOG takes precedence when set.
    #[arg(short, long, action)]
    verbose: bool,
}

fn open(input: &PathBuf) -> Result<Box<dyn Read>> {
    if input.as_os_str() == "-" {
        return Ok(Box::new(stdin().lock()));
    }
    let file = File::open(input).with_context(|| format!("opening input {input:?}"))?;
    Ok(Box::new(BufReader::new(file)))
}

fn run<W: Render>(config: Config, renderer: W, reader: impl Read) -> Result<Stats> {
    let mut processor = StreamProcessor::new(config, renderer);
    processor.run(reader).context("processing stream")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = Config::builder()
        .tables(cli.tables.clone())
        .unit_limit(cli.limit)
        .build();
    debug!("{config:?}");

    let reader = open(&cli.input)?;
    let out = stdout().lock();
    let stats = match cli.format {
        Format::Json => run(config, JsonRenderer::new(out), reader)?,
        Format::Text => run(config, TextRenderer::new(out), reader)?,
    };
    debug!("{stats:?}");

    Ok(())
}
