use std::path::PathBuf;

use clap::Parser;
use config::{DEFAULT_CONFIG_PATH, Settings};
use error::Error;
use monitor::{Monitor, wireguard::WireguardMonitor};
use notifier::{Notifier, matrix::MatrixNotifier, stdout::StdoutNotifier};

mod config;
mod cronvisio;
pub(crate) mod error;
mod monitor;
mod notifier;
mod resolve;
mod wg;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Args {
    /// Settings file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Ask monitors for a status report even when nothing is wrong
    #[arg(short, long)]
    force: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Error> {
    let args = Args::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let settings = Settings::load(&args.config)?;
    let monitors = monitors(&settings)?;
    let notifiers = notifiers(&settings)?;

    let msg = cronvisio::run(&monitors, &notifiers, args.force);
    if msg.is_empty() {
        log::info!("nothing to report");
    }

    Ok(())
}

fn monitors(settings: &Settings) -> Result<Vec<Box<dyn Monitor>>, Error> {
    let mut monitors: Vec<Box<dyn Monitor>> = Vec::new();

    if let Some(wireguard) = &settings.wireguard {
        let monitor =
            WireguardMonitor::new(wireguard.interfaces.0.iter().cloned(), wireguard.timeout())?;
        log::info!(
            "watching {} wireguard interfaces, timeout {:?}",
            monitor.interfaces().len(),
            wireguard.timeout()
        );
        monitors.push(Box::new(monitor));
    }

    Ok(monitors)
}

fn notifiers(settings: &Settings) -> Result<Vec<Box<dyn Notifier>>, Error> {
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();

    if let Some(matrix) = &settings.matrix {
        notifiers.push(Box::new(MatrixNotifier::new(matrix.clone())?));
    }
    if settings.stdout {
        notifiers.push(Box::new(StdoutNotifier::default()));
    }

    Ok(notifiers)
}
