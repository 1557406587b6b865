mod catalog;
mod dates;
mod output;
mod roundtrip;
mod scan;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use farescout_core::AirportCode;
use farescout_engine::{BlackoutCalendar, BookingClient, CancelFlag, Discovery};

#[derive(Debug, Parser)]
#[command(name = "farescout")]
#[command(about = "Discount fare discovery across routes and dates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// One-way search from an origin over one or more dates
    Scan(ScanArgs),
    /// Outbound and return searches compiled into round trips
    Roundtrip(RoundtripArgs),
    /// List the destination catalog and blackout dates
    Destinations {
        /// Only destinations marked popular
        #[arg(long)]
        popular: bool,
    },
}

/// Which destinations a run covers.
#[derive(Debug, Clone, Args)]
struct DestinationArgs {
    /// Explicit destination codes, comma separated (e.g. DEN,LAS)
    #[arg(long = "dest", value_delimiter = ',')]
    destinations: Vec<AirportCode>,
    /// Only destinations marked popular in the program file
    #[arg(long, conflicts_with = "destinations")]
    popular: bool,
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Departure airport
    #[arg(long, default_value = "SFO")]
    origin: AirportCode,
    /// Dates to search (YYYY-MM-DD, MM/DD/YYYY, MM-DD-YYYY or YYYY/MM/DD)
    #[arg(value_parser = dates::parse_date, required_unless_present = "from")]
    dates: Vec<NaiveDate>,
    /// First date of an inclusive range
    #[arg(long, value_parser = dates::parse_date, requires = "to", conflicts_with = "dates")]
    from: Option<NaiveDate>,
    /// Last date of an inclusive range
    #[arg(long, value_parser = dates::parse_date, requires = "from")]
    to: Option<NaiveDate>,
    #[command(flatten)]
    targets: DestinationArgs,
    /// Print the reports as JSON instead of a console summary
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct RoundtripArgs {
    /// Home airport; outbound legs leave from here and return legs land here
    #[arg(long, default_value = "SFO")]
    origin: AirportCode,
    /// Outbound dates, comma separated
    #[arg(long = "out", value_parser = dates::parse_date, value_delimiter = ',', required = true)]
    outbound: Vec<NaiveDate>,
    /// Return dates, comma separated
    #[arg(long = "ret", value_parser = dates::parse_date, value_delimiter = ',', required = true)]
    returns: Vec<NaiveDate>,
    #[command(flatten)]
    targets: DestinationArgs,
    /// Number of best deals to highlight
    #[arg(long, default_value = "10")]
    top: usize,
    /// Print the report as JSON instead of a console summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = farescout_core::load_app_config().context("failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let program = farescout_core::load_program(&config.program_path).with_context(|| {
        format!(
            "failed to load program file {}",
            config.program_path.display()
        )
    })?;

    if let Commands::Destinations { popular } = cli.command {
        output::print_catalog(&program, popular);
        return Ok(());
    }

    let cancel = CancelFlag::new();
    spawn_interrupt_handler(cancel.clone());

    let blackouts = BlackoutCalendar::new(program.blackout_dates.iter().copied());
    tracing::debug!(blackout_dates = blackouts.len(), "blackout calendar loaded");
    let discovery = Discovery::from_config(&config, blackouts);
    let client = BookingClient::from_config(&config).context("failed to build HTTP client")?;
    client.warm_up().await;

    tracing::info!(env = %config.env, "farescout starting");
    match cli.command {
        Commands::Scan(args) => scan::run_scan(&discovery, &client, &program, &args, &cancel).await,
        Commands::Roundtrip(args) => {
            roundtrip::run_roundtrip(&discovery, &client, &program, &args, &cancel).await
        }
        Commands::Destinations { .. } => Ok(()),
    }
}

/// Raises `cancel` on the first Ctrl-C so the run stops after the request
/// in flight and still prints what it found.
fn spawn_interrupt_handler(cancel: CancelFlag) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("interrupt received; finishing current request");
                cancel.cancel();
            }
            Err(e) => tracing::error!(error = %e, "failed to install Ctrl-C handler"),
        }
    });
}
