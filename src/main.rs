//! # blepos CLI
//!
//! Command-line interface for Bluetooth LE receipt printers.
//!
//! ## Usage
//!
//! ```bash
//! # Scan for everything nearby
//! blepos --scan
//!
//! # Scan for peripherals whose name or address contains "PT-"
//! blepos --scan PT-
//!
//! # List the characteristics of a printer
//! blepos --list AA:BB:CC:DD:EE:FF
//!
//! # Print the demo receipt to the first writable characteristic
//! blepos AA:BB:CC:DD:EE:FF
//!
//! # Print a JSON job to characteristic 3
//! blepos --job receipt.json AA:BB:CC:DD:EE:FF 3
//! ```
//!
//! Exit status is 0 on success, 2 when the printer has no writable
//! characteristic, and 1 for every other failure.

use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use blepos::{
    BlePosError, BtleRadio, EscPosCodec, PrintJob, PrinterProfile,
    config::{
        Action, DEFAULT_MAX_WRITE_LEN, DEFAULT_SCAN_DURATION, DEFAULT_SETTLE_DELAY,
        DEFAULT_TIMEOUT, DEFAULT_WRITE_DELAY, RadioConfig, RunConfig,
    },
    discovery,
    job::demo_job,
    resolver::{self, EndpointPolicy, FirstWithCapability, Preference, ResolveMode, Resolution},
    transmit::transmit,
    transport::{Capability, PeripheralRef},
};

/// blepos - Bluetooth LE receipt printer utility
#[derive(Parser, Debug)]
#[command(name = "blepos")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Printer address, or a name/address filter with --scan
    device: Option<String>,

    /// Characteristic handle to write to (skips the search)
    characteristic: Option<u16>,

    /// Scan for peripherals and print the matches
    #[arg(short, long)]
    scan: bool,

    /// List the characteristics of DEVICE
    #[arg(short, long)]
    list: bool,

    /// Print a JSON job instead of the demo receipt
    #[arg(long, value_name = "FILE")]
    job: Option<PathBuf>,

    /// Capability to search for, in order of preference (repeatable)
    #[arg(long, value_name = "TAG")]
    prefer: Vec<Capability>,

    /// Scan duration in seconds
    #[arg(long, default_value_t = DEFAULT_SCAN_DURATION.as_secs())]
    scan_secs: u64,

    /// Connect and write timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Maximum bytes per GATT write
    #[arg(long, default_value_t = DEFAULT_MAX_WRITE_LEN)]
    chunk_size: usize,

    /// Pause between chunks of one frame, in milliseconds
    #[arg(long, default_value_t = millis(DEFAULT_WRITE_DELAY))]
    write_delay_ms: u64,

    /// Wait for unacknowledged writes to drain before disconnecting, in milliseconds
    #[arg(long, default_value_t = millis(DEFAULT_SETTLE_DELAY))]
    settle_ms: u64,

    /// Bluetooth adapter index
    #[arg(long, default_value_t = 0)]
    adapter: usize,

    /// Print width in dots
    #[arg(long, default_value_t = PrinterProfile::MM58.width_dots)]
    width_dots: u16,

    /// Feed and cut the paper after the job
    #[arg(long)]
    cut: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_soft() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), BlePosError> {
    let run_config = RunConfig::from_args(cli.device.clone(), cli.characteristic, cli.scan, cli.list);
    let action = run_config.action();

    if action == Action::Usage {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    }

    let radio_config = RadioConfig {
        scan_duration: Duration::from_secs(cli.scan_secs),
        timeout: Duration::from_secs(cli.timeout_secs),
        max_write_len: cli.chunk_size.max(1),
        write_delay: Duration::from_millis(cli.write_delay_ms),
        settle_delay: Duration::from_millis(cli.settle_ms),
        adapter_index: cli.adapter,
    };
    let radio = BtleRadio::new(radio_config)
        .await
        .map_err(BlePosError::TransportUnavailable)?;

    match action {
        Action::Usage => Ok(()),
        Action::Scan { filter } => {
            let found = discovery::scan(&radio, filter.as_deref()).await?;
            for peripheral in &found {
                println!("{}", peripheral);
            }
            Ok(())
        }
        Action::List { device } => {
            let peripheral = PeripheralRef::from_address(&device);
            if let Resolution::Listed(endpoints) =
                resolver::enumerate(&radio, &peripheral, ResolveMode::List).await?
            {
                for endpoint in &endpoints {
                    println!("{}", endpoint);
                }
            }
            Ok(())
        }
        Action::Print { device, endpoint } => {
            let job = match &cli.job {
                Some(path) => PrintJob::from_json(&std::fs::read_to_string(path)?)?,
                None => demo_job(),
            };
            let codec = EscPosCodec::new(PrinterProfile::with_width(cli.width_dots))
                .cut_on_close(cli.cut);
            let policy = policy_for(&cli.prefer);
            let peripheral = PeripheralRef::from_address(&device);

            println!("Printing to {}...", peripheral);
            let sent = transmit(&radio, &codec, &peripheral, endpoint, &job, policy.as_ref()).await?;
            println!(
                "Printed successfully! ({} bytes to handle {})",
                sent.bytes, sent.endpoint
            );
            Ok(())
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn policy_for(prefer: &[Capability]) -> Box<dyn EndpointPolicy> {
    match prefer {
        [] => Box::new(FirstWithCapability::default()),
        [only] => Box::new(FirstWithCapability(*only)),
        ranked => Box::new(Preference(ranked.to_vec())),
    }
}
