#![forbid(unsafe_code)]
//! # cooc CLI
//!
//! Command-line front end for the `cooc` crate. Reads a tab-separated file of
//! `row<TAB>column` records and prints, for each column symbol, the symbols
//! that significantly cooccur with it.
//!
//! ## Example
//! ```bash
//! cargo run --release -- data.tsv --max-row-count 500 --max-related 50 --seed 7
//! ```
//!
//! Set `RUST_LOG=info` to follow progress. See `--help` for all options.

use std::io;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use log::{error, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use cooc::{
    AcceptPolicy, AnalysisOptions, ExportFormat, InputSource, ScorePolicy, analyze, check_cap,
    collect_records, save_records, write_records,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AcceptArg {
    /// One draw against the smaller of the row and column rates
    Minimum,
    /// Independent draws for row and column rates
    Product,
}

impl From<AcceptArg> for AcceptPolicy {
    fn from(arg: AcceptArg) -> Self {
        match arg {
            AcceptArg::Minimum => AcceptPolicy::Minimum,
            AcceptArg::Product => AcceptPolicy::Product,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Tab-separated input file, or `-` for stdin
    path: String,

    /// Downsample each row symbol to about this many records (`inf` for no cap)
    #[arg(long, default_value_t = 500.0, value_parser = parse_cap)]
    max_row_count: f64,

    /// Downsample each column symbol to about this many records (`inf` for no cap)
    #[arg(long, default_value_t = 500.0, value_parser = parse_cap)]
    max_column_count: f64,

    /// Maximum number of related items retained per item
    #[arg(long, default_value_t = 100)]
    max_related: usize,

    /// How row and column sample rates combine
    #[arg(long, value_enum, default_value = "minimum")]
    accept_policy: AcceptArg,

    /// Keep related items with zero or negative scores
    #[arg(long, default_value_t = false)]
    keep_non_positive: bool,

    /// Remember at most this many origin rows per pair (counts stay exact)
    #[arg(long)]
    max_origins: Option<usize>,

    /// Seed for downsampling; a random seed is used and logged if omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for the scratch file (default: system temp dir)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Output format (txt, tsv, csv, json)
    #[arg(long, default_value = "txt")]
    export_format: ExportFormat,

    /// Write a timestamped result file into this directory instead of stdout
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

fn parse_cap(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    check_cap("cap", value)
        .map_err(|_| format!("{s} is not a positive number (use inf for no cap)"))
}

fn run(cli: Cli) -> cooc::Result<()> {
    let input = if cli.path == "-" {
        InputSource::from_reader(io::stdin().lock())?
    } else {
        InputSource::from_path(&cli.path)
    };

    let seed = cli.seed.unwrap_or_else(rand::random);
    info!("Sampling seed {}", seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let options = AnalysisOptions {
        max_row_count: cli.max_row_count,
        max_column_count: cli.max_column_count,
        max_related: cli.max_related,
        accept_policy: cli.accept_policy.into(),
        score_policy: if cli.keep_non_positive {
            ScorePolicy::All
        } else {
            ScorePolicy::PositiveOnly
        },
        max_origins: cli.max_origins,
        scratch_dir: cli.scratch_dir,
    };

    let analysis = analyze(&input, &options, &mut rng)?;
    let records = collect_records(&analysis)?;

    match cli.out_dir {
        Some(dir) => {
            let stem = Path::new(&cli.path)
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| *s != "-")
                .unwrap_or("stdin");
            let path = save_records(&records, cli.export_format, &dir, stem)?;
            println!("{}", path.display());
        }
        None => {
            write_records(
                &records,
                cli.export_format,
                io::stdout().lock(),
                Path::new("<stdout>"),
            )?;
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("Error: {}", e);
        process::exit(1);
    }
}
