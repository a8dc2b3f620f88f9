//! Meteor Relay CLI
//!
//! Streams meteorite landings to a durable AMQP queue, one message at a time.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use meteor_relay::{
    error::{AppError, Result},
    models::{Config, GeoPoint},
    pipeline,
    services::{AmqpPublisher, DatasetClient},
};

/// Meteor Relay - meteorite landings to a work queue
#[derive(Parser, Debug)]
#[command(name = "meteor-relay", version, about = "Meteorite landing queue producer")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

/// Values that take precedence over the configuration file
#[derive(Args, Debug)]
struct Overrides {
    /// Broker host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Broker port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Target queue name
    #[arg(long, global = true)]
    queue: Option<String>,

    /// Reference latitude in decimal degrees
    #[arg(long, global = true, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Reference longitude in decimal degrees
    #[arg(long, global = true, allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Maximum number of records to fetch and publish
    #[arg(long, global = true)]
    limit: Option<usize>,

    /// Delay between messages in milliseconds
    #[arg(long, global = true)]
    pace_ms: Option<u64>,
}

impl Overrides {
    fn apply(self, config: &mut Config) -> Result<()> {
        if let Some(host) = self.host {
            config.broker.host = host;
        }
        if let Some(port) = self.port {
            config.broker.port = port;
        }
        if let Some(queue) = self.queue {
            config.broker.queue = queue;
        }
        if let Some(limit) = self.limit {
            config.dataset.limit = limit;
        }
        if let Some(pace_ms) = self.pace_ms {
            config.pipeline.pace_ms = pace_ms;
        }

        config.pipeline.reference = match (self.lat, self.lon, config.pipeline.reference) {
            (Some(lat), Some(lon), _) => Some(GeoPoint::new(lat, lon)),
            (Some(lat), None, Some(current)) => Some(GeoPoint::new(lat, current.longitude)),
            (None, Some(lon), Some(current)) => Some(GeoPoint::new(current.latitude, lon)),
            (Some(_), None, None) | (None, Some(_), None) => {
                return Err(AppError::config("--lat and --lon must be given together"));
            }
            (None, None, current) => current,
        };

        Ok(())
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, enrich and publish every record
    Run,

    /// Fetch and format messages without publishing
    Preview,

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// A missing file means defaults; an unreadable or invalid one is fatal.
fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load(path).map_err(|e| AppError::config(format!("{}: {e}", path.display())))
    } else {
        Ok(Config::default())
    }
}

async fn run(cli: Cli, mut config: Config) -> Result<()> {
    if cli.config.exists() {
        log::info!("Loaded configuration from {}", cli.config.display());
    } else {
        log::info!("No configuration at {}, using defaults", cli.config.display());
    }
    cli.overrides.apply(&mut config)?;

    match cli.command {
        Command::Run => {
            let source = DatasetClient::new(&config.dataset)?;
            let publisher = AmqpPublisher::new(&config.broker)?;
            pipeline::run_relay(&config, &source, &publisher).await?;
        }

        Command::Preview => {
            let source = DatasetClient::new(&config.dataset)?;
            let messages = pipeline::preview(&config, &source).await?;
            for message in &messages {
                println!("{}", message.body());
            }
            log::info!(
                "{} messages would be sent to '{}'",
                messages.len(),
                config.broker.queue
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            pipeline::run_validate(&config)?;
        }
    }

    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let loaded = load_config(&cli.config);

    let level = loaded
        .as_ref()
        .map_or("info", |config| config.logging.level.as_str());
    init_logging(cli.verbose, level);

    let result = match loaded {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            log::info!("Done!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("meteor-relay").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let cli = parse(&["run", "--host", "rabbit", "--lat", "-33.9", "--lon", "151.2", "--pace-ms", "0"]);
        let mut config = Config::default();
        cli.overrides.apply(&mut config).unwrap();

        assert_eq!(config.broker.host, "rabbit");
        assert_eq!(config.pipeline.reference, Some(GeoPoint::new(-33.9, 151.2)));
        assert_eq!(config.pipeline.pace_ms, 0);
        assert!(matches!(cli.command, Command::Run));
    }

    #[test]
    fn test_single_coordinate_needs_existing_reference() {
        let cli = parse(&["validate", "--lat", "10"]);
        let mut config = Config::default();
        assert!(matches!(
            cli.overrides.apply(&mut config),
            Err(AppError::Config(_))
        ));

        let cli = parse(&["validate", "--lat", "10"]);
        config.pipeline.reference = Some(GeoPoint::new(1.0, 2.0));
        cli.overrides.apply(&mut config).unwrap();
        assert_eq!(config.pipeline.reference, Some(GeoPoint::new(10.0, 2.0)));
    }
}
