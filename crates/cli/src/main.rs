use anyhow::Context;
use clap::{Parser, Subcommand};
use ehr_core::form::{format_datetime_local, parse_datetime_input};
use ehr_core::reference_ranges::CatalogueEntry;
use ehr_core::{LoincCode, ReferenceBounds, ReferenceRangeCatalogue};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ehr")]
#[command(about = "EHR clinical data CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpret a lab value as Low, Normal or High
    Interpret {
        /// Measured value
        #[arg(allow_hyphen_values = true)]
        value: f64,
        /// Lower reference bound (inclusive)
        #[arg(long, allow_hyphen_values = true)]
        low: Option<f64>,
        /// Upper reference bound (inclusive)
        #[arg(long, allow_hyphen_values = true)]
        high: Option<f64>,
        /// LOINC code to look the reference range up by
        #[arg(long)]
        loinc: Option<String>,
        /// Reference range YAML file (defaults to the bundled catalogue)
        #[arg(long)]
        ranges: Option<PathBuf>,
    },
    /// List the reference range catalogue
    Ranges {
        /// Reference range YAML file (defaults to the bundled catalogue)
        #[arg(long)]
        ranges: Option<PathBuf>,
    },
    /// Normalise a date/time to datetime-local form (YYYY-MM-DDTHH:MM, UTC)
    FormatDatetime {
        /// RFC 3339 or datetime-local input
        input: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Interpret {
            value,
            low,
            high,
            loinc,
            ranges,
        }) => {
            let explicit = ReferenceBounds::new(low, high);
            let bounds = match loinc {
                Some(code) if explicit.is_unbounded() => {
                    let code = LoincCode::parse(&code)?;
                    let catalogue = load_catalogue(ranges.as_deref())?;
                    catalogue
                        .bounds_for(&code)
                        .with_context(|| format!("no reference range for LOINC code {code}"))?
                }
                _ => explicit,
            };
            let interpretation = bounds.try_interpret(value)?;
            println!("{}", interpretation);
        }
        Some(Commands::Ranges { ranges }) => {
            let catalogue = load_catalogue(ranges.as_deref())?;
            if catalogue.is_empty() {
                println!("No reference ranges found.");
            } else {
                for entry in catalogue.entries() {
                    println!("{}", describe_entry(entry));
                }
            }
        }
        Some(Commands::FormatDatetime { input }) => {
            let dt = parse_datetime_input(&input)?;
            println!("{}", format_datetime_local(&dt));
        }
        None => {
            println!("Use 'ehr --help' for commands");
        }
    }

    Ok(())
}

fn load_catalogue(path: Option<&Path>) -> anyhow::Result<ReferenceRangeCatalogue> {
    match path {
        Some(path) => ReferenceRangeCatalogue::from_path(path)
            .with_context(|| format!("loading reference ranges from {}", path.display())),
        None => Ok(ReferenceRangeCatalogue::bundled()?),
    }
}

fn describe_entry(entry: &CatalogueEntry) -> String {
    let range = &entry.range;
    let bound = |b: Option<f64>| b.map_or_else(|| "-".to_string(), |v| v.to_string());
    format!(
        "{:<8} {:<24} {} .. {} {}",
        range.loinc_code.as_str(),
        entry.name.as_deref().unwrap_or(""),
        bound(range.low),
        bound(range.high),
        range.unit.as_deref().unwrap_or("")
    )
    .trim_end()
    .to_string()
}
