use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use carrier_scraper::carriers::builtin_carriers;
use carrier_scraper::report::{customer_to_json, store_to_json};
use carrier_scraper::settings::Settings;
use carrier_scraper::{Aggregator, CarrierAdapter, HttpFetcher, RunReport};

#[derive(Parser)]
#[command(
    name = "carrier_scraper",
    about = "Customer, agent and policy extraction from carrier portals"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in carriers
    List,
    /// Scrape carriers and print the aggregate store as JSON
    Run {
        /// Only this carrier (system name, e.g. MOCK_INDEMNITY)
        #[arg(short, long)]
        carrier: Option<String>,
        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Scrape one carrier and print one customer with agent and policies
    Show {
        #[arg(short, long)]
        carrier: String,
        #[arg(long)]
        customer: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load().context("Failed to read CARRIER_* settings")?;
    let carriers = builtin_carriers().context("Invalid carrier configuration")?;

    let result = match cli.command {
        Commands::List => {
            let width = carriers
                .iter()
                .map(|c| c.system_name.len())
                .max()
                .unwrap_or(0)
                .max("System name".len());
            println!("{:<width$} | {}", "System name", "Name / source");
            for c in &carriers {
                println!("{:<width$} | {} ({})", c.system_name, c.name, c.source);
            }
            Ok(())
        }
        Commands::Run { carrier, pretty } => {
            let selected = select(&carriers, carrier.as_deref())?;
            let report = scrape(&settings, &selected)?;
            let json = store_to_json(&report.store)?;
            if pretty {
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                println!("{}", json);
            }
            ensure_complete(&report, selected.len())
        }
        Commands::Show { carrier, customer } => {
            let selected = select(&carriers, Some(carrier.as_str()))?;
            let report = scrape(&settings, &selected)?;
            ensure_complete(&report, selected.len())?;
            match report.store.customer(&carrier, &customer) {
                Some(c) => {
                    println!("{}", serde_json::to_string_pretty(&customer_to_json(c)?)?);
                    Ok(())
                }
                None => bail!("No customer {} for carrier {}", customer, carrier),
            }
        }
    };

    info!(elapsed = ?t0.elapsed(), ok = result.is_ok(), "finished");

    result
}

fn select(
    carriers: &[CarrierAdapter],
    system_name: Option<&str>,
) -> anyhow::Result<Vec<CarrierAdapter>> {
    let Some(name) = system_name else {
        return Ok(carriers.to_vec());
    };
    let selected: Vec<_> = carriers
        .iter()
        .filter(|c| c.system_name == name)
        .cloned()
        .collect();
    if selected.is_empty() {
        bail!("Unknown carrier {}. Run 'list' to see the built-in carriers.", name);
    }
    Ok(selected)
}

fn scrape(settings: &Settings, carriers: &[CarrierAdapter]) -> anyhow::Result<RunReport> {
    let fetcher = HttpFetcher::new(&settings.user_agent, settings.timeout())
        .context("Failed to build HTTP client")?;
    Ok(run(&Aggregator::new(&fetcher), carriers, settings.parallel))
}

#[cfg(feature = "rayon")]
fn run(
    aggregator: &Aggregator<'_, HttpFetcher>,
    carriers: &[CarrierAdapter],
    parallel: bool,
) -> RunReport {
    if parallel {
        aggregator.run_all_parallel(carriers)
    } else {
        aggregator.run_all(carriers)
    }
}

#[cfg(not(feature = "rayon"))]
fn run(
    aggregator: &Aggregator<'_, HttpFetcher>,
    carriers: &[CarrierAdapter],
    parallel: bool,
) -> RunReport {
    if parallel {
        tracing::warn!("built without rayon, scraping carriers sequentially");
    }
    aggregator.run_all(carriers)
}

/// Fails when any carrier failed, so a partial run exits non-zero. The
/// store of the carriers that succeeded has already been printed.
fn ensure_complete(report: &RunReport, attempted: usize) -> anyhow::Result<()> {
    if report.is_complete() {
        return Ok(());
    }
    let failed: Vec<String> = report
        .failures
        .iter()
        .map(|f| format!("{}: {}", f.system_name, f.error))
        .collect();
    bail!(
        "{} of {} carrier(s) failed\n  {}",
        failed.len(),
        attempted,
        failed.join("\n  ")
    )
}

#[cfg(test)]
mod tests {
    use carrier_scraper::error::{ScrapeError, TransportError};
    use carrier_scraper::AdapterFailure;

    use super::*;

    #[test]
    fn complete_run_succeeds() {
        assert!(ensure_complete(&RunReport::default(), 2).is_ok());
    }

    #[test]
    fn failed_carrier_fails_the_run() {
        let mut report = RunReport::default();
        report.failures.push(AdapterFailure {
            system_name: "MOCK_INDEMNITY".into(),
            error: ScrapeError::Transport(TransportError::Status {
                uri: "https://carrier.example/c".into(),
                status: 503,
            }),
        });

        let err = ensure_complete(&report, 2).unwrap_err().to_string();
        assert!(err.starts_with("1 of 2 carrier(s) failed"), "{err}");
        assert!(err.contains("MOCK_INDEMNITY"), "{err}");
    }
}
