use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tabdim::csv_reader;
use tabdim::runtime::{build_bar_layout, summarize};
use tabdim::{BarAggregation, BarSpec, Dataset, DimensionRef, LoadOptions, RangeFilter};

#[derive(Parser, Debug)]
#[command(name = "tabdim")]
#[command(about = "Load delimited text into normalized dimensions and query them", long_about = None)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Field separator. Detected from the header line when omitted.
    #[arg(short, long, global = true)]
    delimiter: Option<char>,

    /// Treat double quotes as ordinary characters
    #[arg(long, global = true)]
    no_quoting: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the dimensions and metadata of a file
    Describe {
        /// Input file, or `-` for stdin
        file: PathBuf,
    },
    /// Map a normalized position back to an original value
    Value {
        file: PathBuf,
        /// Dimension identifier or index
        dimension: String,
        /// Position on [0, 1]
        normalized: f32,
        /// Do not snap string dimensions to the closest category
        #[arg(long)]
        precise: bool,
    },
    /// Compute a bar layout
    Bars {
        file: PathBuf,
        /// JSON bar specification; the flags below override it
        #[arg(long)]
        spec: Option<PathBuf>,
        #[arg(long)]
        x: Option<String>,
        #[arg(long)]
        y: Option<String>,
        #[arg(long)]
        z: Option<String>,
        #[arg(long)]
        x_bins: Option<usize>,
        #[arg(long)]
        z_bins: Option<usize>,
        #[arg(long)]
        aggregation: Option<BarAggregation>,
    },
}

#[derive(Serialize)]
struct ValueOutput<'a> {
    dimension: &'a str,
    normalized: f32,
    value: tabdim::Value,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let options = |file: &Path| LoadOptions {
        name: Some(file.display().to_string()),
        delimiter: args.delimiter,
        quoting: !args.no_quoting,
    };

    match &args.command {
        Command::Describe { file } => {
            let dataset = load(file, options(file))?;
            print_json(&summarize(&dataset))
        }
        Command::Value {
            file,
            dimension,
            normalized,
            precise,
        } => {
            let dataset = load(file, options(file))?;
            let target = lookup_target(&dataset, dimension);
            let value = if *precise {
                dataset.get_value_precise(*normalized, target)
            } else {
                dataset.get_value_approximate(*normalized, target)
            };
            let Some(value) = value else {
                bail!("No value for dimension '{}' in {}", dimension, dataset.name());
            };
            print_json(&ValueOutput {
                dimension,
                normalized: *normalized,
                value,
            })
        }
        Command::Bars {
            file,
            spec,
            x,
            y,
            z,
            x_bins,
            z_bins,
            aggregation,
        } => {
            let mut bar_spec = match spec {
                Some(path) => {
                    let json = fs::read_to_string(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    BarSpec::from_json(&json)?
                }
                None => BarSpec::default(),
            };
            if let Some(name) = x {
                bar_spec.set_x(RangeFilter::new(name));
            }
            if let Some(name) = y {
                bar_spec.set_y(RangeFilter::new(name));
            }
            if let Some(name) = z {
                bar_spec.set_z(RangeFilter::new(name));
            }
            if let Some(bins) = x_bins {
                bar_spec.set_x_bins(*bins);
            }
            if let Some(bins) = z_bins {
                bar_spec.set_z_bins(*bins);
            }
            if let Some(aggregation) = aggregation {
                bar_spec.set_aggregation(*aggregation);
            }

            let dataset = load(file, options(file))?;
            let layout = build_bar_layout(&dataset, &bar_spec).context("Failed to lay out bars")?;
            print_json(&layout)
        }
    }
}

fn load(file: &Path, options: LoadOptions) -> Result<Dataset> {
    let text = if file == Path::new("-") {
        csv_reader::read_csv_from_stdin()?
    } else {
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?
    };

    let mut dataset = Dataset::with_options(options);
    dataset
        .load(&text)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    Ok(dataset)
}

/// Identifiers take precedence; a bare number that names no dimension is an index.
fn lookup_target<'a>(dataset: &Dataset, dimension: &'a str) -> DimensionRef<'a> {
    match dimension.parse::<usize>() {
        Ok(index) if dataset.index_of(dimension).is_none() => DimensionRef::Index(index),
        _ => DimensionRef::Identifier(dimension),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}
