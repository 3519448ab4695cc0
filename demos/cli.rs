//! Reads numbers from stdin, one per line, and reports on their distribution.
use std::io::{self, BufRead, Write};

use clap::{App, Arg, ArgMatches, SubCommand};
use thiserror::Error;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use hdrcore::{Format, Histogram};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let default_max = format!("{}", u64::max_value());
    let histogram_args = [
        Arg::with_name("min")
            .long("min")
            .help("Lowest discernible value")
            .takes_value(true)
            .default_value("1"),
        Arg::with_name("max")
            .long("max")
            .help("Highest trackable value")
            .takes_value(true)
            .default_value(default_max.as_str()),
        Arg::with_name("sigfig")
            .long("sigfig")
            .help("Number of significant digits")
            .takes_value(true)
            .default_value("3"),
        Arg::with_name("interval")
            .short("i")
            .long("expected-interval")
            .help("Expected interval between samples, for coordinated omission correction")
            .takes_value(true)
            .default_value("0"),
    ];

    let matches = App::new("hdrcore cli")
        .subcommand(
            SubCommand::with_name("percentiles")
                .about("Print the percentile distribution of number-per-line input from stdin")
                .args(&histogram_args)
                .arg(
                    Arg::with_name("ticks")
                        .short("t")
                        .long("ticks-per-half")
                        .takes_value(true)
                        .default_value("5")
                        .help("Ticks per half distance"),
                )
                .arg(
                    Arg::with_name("scale")
                        .short("s")
                        .long("value-scale")
                        .takes_value(true)
                        .default_value("1.0")
                        .help("Divide printed values by this"),
                )
                .arg(
                    Arg::with_name("csv")
                        .long("csv")
                        .help("Write comma-separated values"),
                ),
        )
        .subcommand(
            SubCommand::with_name("summary")
                .about("Print summary statistics of number-per-line input from stdin")
                .args(&histogram_args),
        )
        .get_matches();

    let stdin = io::stdin();
    let stdin = stdin.lock();

    let stdout = io::stdout();
    let stdout = stdout.lock();

    let res = match matches.subcommand() {
        ("percentiles", Some(sub_matches)) => percentiles(stdin, stdout, sub_matches),
        ("summary", Some(sub_matches)) => summary(stdin, stdout, sub_matches),
        _ => Err(CliError::Usage(matches.usage().to_string())),
    };

    if let Err(e) = res {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn percentiles<R: BufRead, W: Write>(
    reader: R,
    mut writer: W,
    args: &ArgMatches<'_>,
) -> Result<(), CliError> {
    let h = read_histogram(reader, args)?;

    let ticks: u32 = parse_arg(args, "ticks")?;
    if ticks == 0 {
        return Err(CliError::InvalidArgument {
            name: "ticks",
            value: "0".to_string(),
        });
    }
    let scale: f64 = parse_arg(args, "scale")?;
    let format = if args.is_present("csv") {
        Format::Csv
    } else {
        Format::Classic
    };

    h.print_percentiles(&mut writer, ticks, scale, format)?;
    Ok(())
}

fn summary<R: BufRead, W: Write>(
    reader: R,
    mut writer: W,
    args: &ArgMatches<'_>,
) -> Result<(), CliError> {
    let h = read_histogram(reader, args)?;

    let percentiles = [50.0, 90.0, 99.0, 99.9];
    let mut values = [0_u64; 4];
    h.values_at_percentiles(&percentiles, &mut values)?;

    writeln!(writer, "count  {}", h.len())?;
    writeln!(writer, "min    {}", h.min())?;
    writeln!(writer, "max    {}", h.max())?;
    writeln!(writer, "mean   {:.2}", h.mean())?;
    writeln!(writer, "stdev  {:.2}", h.stdev())?;
    for (p, v) in percentiles.iter().zip(values.iter()) {
        writeln!(writer, "p{:<5} {}", p, v)?;
    }
    Ok(())
}

/// Record every line of `reader` into a histogram built from the command line bounds.
fn read_histogram<R: BufRead>(reader: R, args: &ArgMatches<'_>) -> Result<Histogram, CliError> {
    let min: u64 = parse_arg(args, "min")?;
    let max: u64 = parse_arg(args, "max")?;
    let sigfig: u8 = parse_arg(args, "sigfig")?;
    let interval: u64 = parse_arg(args, "interval")?;

    let mut h = Histogram::new_with_bounds(min, max, sigfig)?;

    let mut dropped = 0_u64;
    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: u64 = line.parse().map_err(|_| CliError::Parse {
            line: line_number + 1,
            text: line.to_string(),
        })?;
        if h.record_correct(value, interval).is_err() {
            dropped += 1;
        }
    }

    if dropped > 0 {
        warn!(dropped, highest_trackable_value = max, "Dropped out-of-range values.");
    }
    debug!(total_count = h.len(), "Finished reading values.");
    Ok(h)
}

fn parse_arg<T: std::str::FromStr>(args: &ArgMatches<'_>, name: &'static str) -> Result<T, CliError> {
    let value = args.value_of(name).unwrap_or_default();
    value.parse().map_err(|_| CliError::InvalidArgument {
        name,
        value: value.to_string(),
    })
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Histogram(#[from] hdrcore::Error),
    #[error("invalid value '{value}' for --{name}")]
    InvalidArgument { name: &'static str, value: String },
    #[error("line {line}: '{text}' is not an unsigned integer")]
    Parse { line: usize, text: String },
    #[error("a subcommand is required\n{0}")]
    Usage(String),
}
