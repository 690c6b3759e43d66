use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crystaldex_core::pipeline::{
    self, GYM_LEADERS_FILE, ITEMS_FILE, LocationSources, NPC_TRADES_FILE, RunSummary,
};
use crystaldex_core::{ExtractConfig, Variant};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(
    name = "crystaldex",
    version = "0.1.0",
    about = "CLI tool for extracting Polished Crystal disassembly data into JSON",
    long_about = None
)]
struct Cli {
    /// Root of the disassembly checkout
    #[arg(long, global = true, env = "CRYSTALDEX_SOURCE_DIR")]
    source_dir: Option<PathBuf>,

    /// Directory for JSON and CSV output
    #[arg(long, global = true, env = "CRYSTALDEX_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read the faithful side of conditional blocks
    #[arg(long, global = true, default_value_t = false)]
    faithful: bool,

    /// Path to log file
    #[arg(long, global = true, default_value = "/tmp/crystaldex.log")]
    log_file: PathBuf,

    /// Verbosity level (warnings are always shown; repeat for more verbose output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract item descriptions, attributes and names
    ExtractItems {
        /// Quiet mode (0=show messages/warnings, 1=suppress messages, 2=suppress both)
        #[arg(long, default_value_t = 0)]
        quiet: u8,
    },

    /// Extract items and attach Poké Mart locations
    ExtractMarts {
        /// Quiet mode
        #[arg(long, default_value_t = 0)]
        quiet: u8,
    },

    /// Extract items and attach Pickup, Rock Smash, fishing and prize locations
    ExtractAcquisitions {
        /// Quiet mode
        #[arg(long, default_value_t = 0)]
        quiet: u8,
    },

    /// Extract trainer parties and generic trainers by location
    ExtractTrainers {
        /// Quiet mode
        #[arg(long, default_value_t = 0)]
        quiet: u8,
    },

    /// Extract gym leaders with their parties
    ExtractGymLeaders {
        /// Quiet mode
        #[arg(long, default_value_t = 0)]
        quiet: u8,
    },

    /// Extract map events by location
    ExtractEvents {
        /// Quiet mode
        #[arg(long, default_value_t = 0)]
        quiet: u8,
    },

    /// Extract in-game NPC trades
    ExtractTrades {
        /// Quiet mode
        #[arg(long, default_value_t = 0)]
        quiet: u8,
    },

    /// Run every extractor in order and write every output file
    ExtractAll {
        /// Quiet mode (0=show messages/warnings, 1=suppress messages, 2=suppress both)
        #[arg(long, default_value_t = 0)]
        quiet: u8,
    },
}

/// Missing sources and unmatched items are reported as warnings, so the
/// quietest level still shows them.
fn verbosity_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

fn setup_logging(verbose: u8, log_file: &std::path::Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter_level = verbosity_level(verbose);
    let filter = EnvFilter::from_default_env().add_directive(filter_level.into());

    let file_appender = tracing_appender::rolling::never(
        log_file.parent().unwrap_or(std::path::Path::new(".")),
        log_file.file_name().unwrap_or(std::ffi::OsStr::new("crystaldex.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::Layer::new().with_writer(std::io::stderr).with_ansi(true))
        .with(fmt::Layer::new().with_writer(non_blocking).with_ansi(false));

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

/// Config file first, then command-line overrides.
fn load_config(cli: &Cli) -> Result<ExtractConfig> {
    let mut config = match &cli.config {
        Some(path) => ExtractConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => ExtractConfig::default(),
    };
    if let Some(source_dir) = &cli.source_dir {
        config.source_root = source_dir.clone();
    }
    if let Some(output_dir) = &cli.output_dir {
        config.output_dir = output_dir.clone();
    }
    if cli.faithful {
        config.variant = Variant::Faithful;
    }

    if !config.source_root.is_dir() {
        warn!(
            "Source directory not found: {:?}, every extractor will produce empty output",
            config.source_root
        );
    }
    Ok(config)
}

fn report_items(summary: &RunSummary, config: &ExtractConfig, quiet: u8) {
    if quiet == 0 {
        info!(
            "Wrote {} items with {} locations to {:?}",
            summary.items,
            summary.item_locations,
            config.output(ITEMS_FILE)
        );
    }
    if quiet < 2 && summary.unmatched > 0 {
        warn!(
            "{} item references could not be matched ({} matched), see match_report.csv",
            summary.unmatched,
            summary.matched
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = setup_logging(cli.verbose, &cli.log_file)?;

    info!("Starting crystaldex CLI");

    let config = load_config(&cli)?;
    let mut summary = RunSummary::default();

    match cli.command {
        Commands::ExtractItems { quiet } => {
            pipeline::run_items(&config, LocationSources::NONE, &mut summary)?;
            report_items(&summary, &config, quiet);
        }
        Commands::ExtractMarts { quiet } => {
            let sources = LocationSources {
                marts: true,
                ..LocationSources::NONE
            };
            pipeline::run_items(&config, sources, &mut summary)?;
            report_items(&summary, &config, quiet);
        }
        Commands::ExtractAcquisitions { quiet } => {
            let sources = LocationSources {
                acquisitions: true,
                ..LocationSources::NONE
            };
            pipeline::run_items(&config, sources, &mut summary)?;
            report_items(&summary, &config, quiet);
        }
        Commands::ExtractTrainers { quiet } => {
            pipeline::run_trainers(&config, &mut summary)?;
            if quiet == 0 {
                info!(
                    "Wrote {} trainer parties and {} placed trainers",
                    summary.trainer_parties, summary.location_trainers
                );
            }
        }
        Commands::ExtractGymLeaders { quiet } => {
            pipeline::run_gym_leaders(&config, &mut summary)?;
            if quiet == 0 {
                info!(
                    "Wrote {} gym leaders to {:?}",
                    summary.gym_leaders,
                    config.output(GYM_LEADERS_FILE)
                );
            }
        }
        Commands::ExtractEvents { quiet } => {
            pipeline::run_events(&config, &mut summary)?;
            if quiet == 0 {
                info!("Wrote events for {} locations", summary.event_locations);
            }
        }
        Commands::ExtractTrades { quiet } => {
            pipeline::run_trades(&config, &mut summary)?;
            if quiet == 0 {
                info!(
                    "Wrote {} NPC trades to {:?}",
                    summary.npc_trades,
                    config.output(NPC_TRADES_FILE)
                );
            }
        }
        Commands::ExtractAll { quiet } => {
            let summary = pipeline::run_all(&config)?;
            report_items(&summary, &config, quiet);
            if quiet == 0 {
                info!("--- Summary ---");
                info!("Trainer parties: {}", summary.trainer_parties);
                info!("Placed trainers: {}", summary.location_trainers);
                info!("Gym leaders: {}", summary.gym_leaders);
                info!("Locations with events: {}", summary.event_locations);
                info!("NPC trades: {}", summary.npc_trades);
            }
        }
    }

    info!("Crystaldex CLI finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn test_default_verbosity_shows_warnings() {
        assert_eq!(verbosity_level(0), tracing::Level::WARN);
        assert_eq!(verbosity_level(1), tracing::Level::INFO);
        assert_eq!(verbosity_level(2), tracing::Level::DEBUG);
        assert_eq!(verbosity_level(7), tracing::Level::TRACE);
    }

    #[test]
    fn test_missing_source_dir_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("polishedcrystal");
        let output = dir.path().join("output");
        let args: Vec<OsString> = vec![
            "crystaldex".into(),
            "--source-dir".into(),
            missing.clone().into(),
            "--output-dir".into(),
            output.clone().into(),
            "--faithful".into(),
            "extract-all".into(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        let config = load_config(&cli).unwrap();
        assert_eq!(config.source_root, missing);
        assert_eq!(config.output_dir, output);
        assert_eq!(config.variant, Variant::Faithful);
    }

    #[test]
    fn test_config_file_then_flag_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("crystaldex.toml");
        std::fs::write(&config_path, "source_root = \"rom\"\noutput_dir = \"site/data\"\n").unwrap();
        let args: Vec<OsString> = vec![
            "crystaldex".into(),
            "--config".into(),
            config_path.into(),
            "--output-dir".into(),
            "out".into(),
            "extract-items".into(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        let config = load_config(&cli).unwrap();
        assert_eq!(config.source_root, PathBuf::from("rom"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.variant, Variant::Polished);
    }
}
