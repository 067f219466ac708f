//! ids-monitor - interactive terminal shell for the detection loop
//!
//! Usage:
//!   ids-monitor [--config ids.json] [--interval-ms 2000] [--window-size 10]
//!               [--threshold 70] [--policy growing|sliding] [--seed N] [--autostart]
//!
//! Commands on stdin: start, stop, history [--json], status, help, quit

use clap::{Parser, ValueEnum};
use ids_core::{
    ChannelPresenter, Dashboard, DetectionLoop, DetectorConfig, IdsError, ShellMessage,
    WindowPolicy, metrics,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ids-monitor")]
#[command(about = "Intrusion detection monitor over a synthetic network activity signal")]
struct Cli {
    /// JSON config file (defaults < file < IDS_* env < flags)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tick interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Samples required before the first anomaly scan
    #[arg(long)]
    window_size: Option<usize>,

    /// Activity level above which a sample is classified as an intrusion
    #[arg(long)]
    threshold: Option<u8>,

    /// Window retention policy
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Start detecting immediately
    #[arg(long)]
    autostart: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Growing,
    Sliding,
}

impl From<PolicyArg> for WindowPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Growing => WindowPolicy::Growing,
            PolicyArg::Sliding => WindowPolicy::Sliding,
        }
    }
}

fn load_config(cli: &Cli) -> Result<DetectorConfig, IdsError> {
    let mut config = match &cli.config {
        Some(path) => DetectorConfig::from_file(path)?,
        None => DetectorConfig::default(),
    }
    .with_env_overrides()?;

    if let Some(ms) = cli.interval_ms {
        config.tick_interval_ms = ms;
    }
    if let Some(size) = cli.window_size {
        config.window_size = size;
    }
    if let Some(threshold) = cli.threshold {
        config.activity_threshold = threshold;
    }
    if let Some(policy) = cli.policy {
        config.window_policy = policy.into();
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    config.validate()?;
    Ok(config)
}

/// Read stdin on a plain thread. A blocking read parked on the runtime's
/// blocking pool would keep the process alive after Ctrl-C; this thread is
/// simply abandoned at exit.
fn spawn_stdin_reader() -> std::io::Result<mpsc::UnboundedReceiver<std::io::Result<String>>> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("ids-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok(rx)
}

fn print_help() {
    println!("Commands:");
    println!("  start           start the intruder detection system");
    println!("  stop            stop the intruder detection system");
    println!("  history [--json] display recorded attacks");
    println!("  status          show run state and counters");
    println!("  quit            stop and exit");
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration rejected");
            return ExitCode::FAILURE;
        }
    };

    metrics::init();

    let dashboard = Arc::new(Dashboard::new());
    let (presenter, rx) = ChannelPresenter::new();

    // Foreground side of the hand-off: print log lines and keep the dashboard current.
    let printer_dashboard = Arc::clone(&dashboard);
    let printer = match thread::Builder::new()
        .name("ids-printer".into())
        .spawn(move || {
            while let Ok(msg) = rx.recv() {
                if let ShellMessage::Log(line) = &msg {
                    println!("{}", line);
                }
                printer_dashboard.apply(msg);
            }
        }) {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = %e, "Failed to spawn printer thread");
            return ExitCode::FAILURE;
        }
    };

    let ids = match DetectionLoop::new(config, Arc::new(presenter)) {
        Ok(ids) => ids,
        Err(e) => {
            error!(error = %e, "Failed to build detection loop");
            return ExitCode::FAILURE;
        }
    };

    info!(config = ?ids.config(), "ids-monitor ready (type 'help' for commands)");

    if cli.autostart {
        if let Err(e) = ids.start() {
            error!(error = %e, "Failed to start detection loop");
        }
    }

    let mut lines = match spawn_stdin_reader() {
        Ok(rx) => rx,
        Err(e) => {
            error!(error = %e, "Failed to spawn stdin reader");
            return ExitCode::FAILURE;
        }
    };

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            line = lines.recv() => {
                let line = match line {
                    Some(Ok(line)) => line,
                    None => break,
                    Some(Err(e)) => {
                        error!(error = %e, "Failed to read stdin");
                        break;
                    }
                };

                let mut parts = line.split_whitespace();
                match (parts.next(), parts.next()) {
                    (Some("start"), _) => {
                        if let Err(e) = ids.start() {
                            error!(error = %e, "Failed to start detection loop");
                        }
                    }
                    (Some("stop"), _) => {
                        ids.stop();
                    }
                    (Some("history"), Some("--json")) => match dashboard.history_json() {
                        Ok(json) => println!("{}", json),
                        Err(e) => error!(error = %e, "Failed to serialize history"),
                    },
                    (Some("history"), _) => {
                        for line in dashboard.display_history() {
                            println!("{}", line);
                        }
                    }
                    (Some("status"), _) => {
                        println!(
                            "running: {}, run: {}, ticks: {}, recorded attacks: {}",
                            ids.is_running(),
                            ids.run_id()
                                .map(|id| id.to_string())
                                .unwrap_or_else(|| "-".into()),
                            ids.ticks(),
                            dashboard.history().len()
                        );
                        print!("{}", metrics::render());
                    }
                    (Some("help"), _) => print_help(),
                    (Some("quit") | Some("exit"), _) => break,
                    (None, _) => {}
                    (Some(other), _) => println!("Unknown command '{}' (type 'help')", other),
                }
            }
        }
    }

    ids.stop();
    // Dropping the loop releases the last sender and lets the printer drain.
    drop(ids);
    if printer.join().is_err() {
        error!("Printer thread panicked");
    }
    info!("ids-monitor stopped");
    ExitCode::SUCCESS
}
