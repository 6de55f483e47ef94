//! fsuipc-monitor: print FSUIPC offsets as they change
//!
//! # Usage
//!
//! ```bash
//! # Poll the fields of a configuration file
//! fsuipc-monitor --config position.yaml
//!
//! # Read once and exit
//! fsuipc-monitor --config position.yaml --once
//!
//! # Try a configuration without a simulator
//! fsuipc-monitor --config position.yaml --simulate
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use fsuipc::{ClientConfig, Connection, DynLink, Fsuipc, Monitor, Sample, UpdateRate};

#[derive(Parser)]
#[command(name = "fsuipc-monitor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Poll FSUIPC offsets and print their values")]
struct Cli {
    /// YAML file listing the offsets to poll
    #[arg(short, long)]
    config: PathBuf,

    /// Print at most this many samples per second (overrides the config)
    #[arg(short, long)]
    rate: Option<u32>,

    /// Read once, print and exit
    #[arg(long)]
    once: bool,

    /// Use an in-memory offset space instead of the FSUIPC SDK
    #[arg(long)]
    simulate: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let cli = Cli::parse();
    let config = ClientConfig::load(&cli.config)
        .with_context(|| format!("Loading {}", cli.config.display()))?;

    let simulator = config.simulator;
    let simulated = cli.simulate.then(|| config.simulated_link());
    let connect = move || -> fsuipc::Result<Connection<DynLink>> {
        match simulated {
            Some(link) => Fsuipc::open_with(Box::new(link) as DynLink, simulator),
            None => Fsuipc::connect(simulator),
        }
    };

    if cli.once {
        let connection = connect().context("Connecting to FSUIPC")?;
        info!(fsuipc = %connection.client_version(), library = %connection.library_version(), "Connected");
        let values = connection.read(&config.fields).context("Reading offsets")?;
        for (field, value) in config.fields.fields().iter().zip(&values) {
            println!("{} = {}", label(field), value);
        }
        connection.close();
        return Ok(());
    }

    let rate = cli.rate.map(UpdateRate::Max).unwrap_or(config.update_rate);
    let monitor = Monitor::spawn(connect, config.fields.clone(), config.poll_interval());
    info!(%rate, "Streaming samples");
    let mut samples = monitor.subscribe(rate);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            sample = samples.next() => match sample {
                Some(sample) => print_sample(&sample),
                None => break,
            },
        }
    }

    let count = monitor.stop().await.context("Monitor stopped with an error")?;
    info!("Monitor read {} samples", count);
    Ok(())
}

fn print_sample(sample: &Sample) {
    let line: Vec<String> = sample
        .specification()
        .fields()
        .iter()
        .zip(&sample.values)
        .map(|(field, value)| format!("{}={}", label(field), value))
        .collect();
    println!("#{} {}", sample.sequence, line.join(" "));
}

fn label(field: &fsuipc::Field) -> String {
    field.name.clone().unwrap_or_else(|| format!("0x{:04x}", field.offset))
}
