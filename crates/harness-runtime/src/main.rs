//! # qh-harness
//!
//! Command-line entry point for Quorum-Harness.
//!
//! ## Subcommands
//!
//! | Command | Effect |
//! |---------|--------|
//! | `up` | Bring a topology file up, hold until Ctrl-C, tear down |
//! | `extra-data` | Print genesis `extraData` for validator public keys |
//! | `inspect` | Print the validators embedded in an `extraData` blob |
//! | `plan-subnets` | Print the candidate `/24` blocks the allocator would try |

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use harness_runtime::commands::{extra_data_for_keys, inspect_extra_data, plan_subnets};
use harness_runtime::{Harness, HarnessConfig};
use harness_telemetry::{
    init_telemetry, log_event, record_command, render_metrics, HistogramTimer, TelemetryConfig,
};
use qh_01_subnet_allocation::SubnetRange;
use qh_02_extra_data::ConsensusFamily;

/// Quorum-Harness: disposable multi-node test networks
#[derive(Parser, Debug)]
#[command(name = "qh-harness", version)]
#[command(about = "Bring up, verify and tear down multi-node blockchain topologies")]
struct Cli {
    /// Log filter directive (overrides QH_LOG_LEVEL / RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print Prometheus metrics to stdout before exiting
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a topology and keep it running until interrupted
    Up {
        /// Topology file
        #[arg(default_value = "topology.toml")]
        config: PathBuf,

        /// Tear down as soon as the topology is verified
        #[arg(long)]
        once: bool,
    },

    /// Encode genesis extra data for the given validator public keys
    ExtraData {
        #[arg(long, default_value = "ibft2")]
        family: ConsensusFamily,

        /// Hex public keys (33, 64 or 65 bytes)
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Decode the validator addresses from genesis extra data
    Inspect {
        #[arg(long, default_value = "ibft2")]
        family: ConsensusFamily,

        /// Hex extra data
        extra_data: String,
    },

    /// List the subnets an allocator would try, in order
    PlanSubnets {
        #[arg(long, default_value = "172.29")]
        prefix: SubnetRange,

        #[arg(long, default_value_t = 0)]
        start: u32,

        #[arg(short = 'n', long, default_value_t = 5)]
        count: u32,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Up { .. } => "up",
            Command::ExtraData { .. } => "extra-data",
            Command::Inspect { .. } => "inspect",
            Command::PlanSubnets { .. } => "plan-subnets",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if let Some(level) = &cli.log_level {
        telemetry = telemetry.with_log_level(level.clone());
    }
    telemetry.json_logs |= cli.json_logs;
    let _guard = init_telemetry(telemetry).context("Failed to initialise telemetry")?;

    let command = cli.command.name();
    let outcome = {
        let _timer = HistogramTimer::for_command(command);
        run(cli.command).await
    };
    record_command(command, if outcome.is_ok() { "success" } else { "failure" });

    if cli.print_metrics {
        print!("{}", render_metrics()?);
    }
    outcome
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Up { config, once } => up(config, once).await,
        Command::ExtraData { family, keys } => {
            println!("{}", extra_data_for_keys(family, &keys)?);
            Ok(())
        }
        Command::Inspect { family, extra_data } => {
            for validator in inspect_extra_data(family, &extra_data)? {
                println!("{validator:?}");
            }
            Ok(())
        }
        Command::PlanSubnets {
            prefix,
            start,
            count,
        } => {
            for block in plan_subnets(prefix, start, count) {
                println!("{block}");
            }
            Ok(())
        }
    }
}

async fn up(path: PathBuf, once: bool) -> Result<()> {
    let config = HarnessConfig::load(&path)
        .with_context(|| format!("Failed to load topology file {}", path.display()))?;
    let mut harness = Harness::docker(config)?;

    if let Err(error) = harness.up().await {
        // Start already rolled back what it could; close anything it kept.
        if let Err(cleanup) = harness.down().await {
            log_event!(warn, "runtime", "Cleanup after failed start failed", error = %cleanup);
        }
        return Err(error);
    }

    for line in harness.summary() {
        println!("{line}");
    }

    if !once {
        log_event!(info, "runtime", "Topology running, press Ctrl-C to stop");
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;
        log_event!(info, "runtime", "Shutdown requested");
    }

    harness.down().await
}
