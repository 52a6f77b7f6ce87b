//! hotconf watcher
//!
//! Builds a configuration registry from a settings file, registers the
//! declared sources and logs every change on the observed paths.
//!
//! ```text
//! hotconf --settings hotconf.toml          watch until Ctrl-C / SIGTERM
//! hotconf --settings hotconf.toml --print  dump the merged tree and exit
//! ```

use std::path::PathBuf;

use clap::Parser;

use hotconf::lifecycle::signals;
use hotconf::observability::{logging, metrics};
use hotconf::settings::{load_settings, Settings};
use hotconf::{Config, Value};

#[derive(Parser)]
#[command(name = "hotconf")]
#[command(about = "Watch a layered configuration and log its changes", long_about = None)]
struct Cli {
    /// Settings file (TOML).
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Print the merged configuration as JSON and exit.
    #[arg(long)]
    print: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };

    if let Err(e) = logging::init_logging(&settings.observability) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    tracing::info!("hotconf v{} starting", env!("CARGO_PKG_VERSION"));

    if settings.observability.metrics_enabled {
        if let Ok(addr) = settings.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let config = Config::new(settings.registry.clone())?;
    for source in &settings.sources {
        config.add_source(source.id.clone(), source.priority, source.build()?)?;
    }

    tracing::info!(
        sources = settings.sources.len(),
        observed_paths = settings.observe.len(),
        "Configuration loaded"
    );

    if cli.print {
        println!("{}", serde_json::to_string_pretty(&*config.snapshot())?);
        config.close();
        return Ok(());
    }

    for path in &settings.observe {
        let observed = path.clone();
        config.add_observer(path.clone(), move |old, new| {
            tracing::info!(
                path = %observed,
                old = %describe(old),
                new = %describe(new),
                "Configuration value changed"
            );
        });
    }

    signals::run_until_shutdown(&config).await?;

    config.close();
    tracing::info!("Shutdown complete");
    Ok(())
}

fn describe(value: Option<&Value>) -> String {
    value.map_or_else(|| "<none>".to_string(), ToString::to_string)
}
