mod collectors;
mod config;
mod error;
mod models;
mod pipeline;
mod preflight;
mod selftest;
mod util;

use anyhow::Result;
use clap::Parser;
use collectors::exec::SystemRunner;
use pipeline::RunOptions;
use selftest::ThreadSleeper;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "baydiag", about = "SMART self-test and surface-scan runner for dual-bay USB enclosures", version)]
struct Cli {
    /// Seconds between self-test status polls
    #[arg(short, long)]
    interval: Option<u64>,

    /// Maximum byte difference when matching a drive to a block device
    #[arg(long)]
    tolerance: Option<u64>,

    /// Run a read-only badblocks pass over each mapped drive
    #[arg(long, conflicts_with = "no_scan")]
    scan: bool,

    /// Skip the surface scan even if enabled in the config file
    #[arg(long)]
    no_scan: bool,

    /// Directory for per-drive log files
    #[arg(short = 'o', long)]
    log_dir: Option<PathBuf>,

    /// Bridge device to query (repeatable); skips `smartctl --scan`
    #[arg(long = "bridge", value_name = "DEV")]
    bridges: Vec<String>,

    /// smartctl -d base type of the bridge chipset (bay index is appended)
    #[arg(long)]
    dev_type: Option<String>,

    /// Discover drives and show the block-device mapping, then exit
    #[arg(long)]
    list: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,

    /// Print config file path and current values, then exit
    #[arg(long)]
    config: bool,

    /// Debug-level diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::Config::load();
    if cli.config {
        return run_print_config(&cfg);
    }

    let opts = resolve_options(&cli, &cfg);
    run_diagnostics(&opts, cli.json)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "baydiag=debug" } else { "baydiag=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_options(cli: &Cli, cfg: &config::Config) -> RunOptions {
    let scan_enabled = if cli.scan { true } else if cli.no_scan { false } else { cfg.scan.enabled };
    RunOptions {
        bridges:           cli.bridges.clone(),
        bridge_filter:     cfg.discovery.bridge_filter.clone(),
        dev_type:          cli.dev_type.clone().unwrap_or_else(|| cfg.discovery.dev_type.clone()),
        bays:              cfg.discovery.bays.clone(),
        poll_interval:     Duration::from_secs(cli.interval.unwrap_or(cfg.general.poll_interval_sec).max(1)),
        max_poll_failures: cfg.general.max_poll_failures,
        tolerance_bytes:   cli.tolerance.unwrap_or(cfg.scan.tolerance_bytes),
        scan_enabled:      scan_enabled && !cli.list,
        list_only:         cli.list,
        log_dir:           cli.log_dir.clone().unwrap_or_else(|| cfg.general.log_dir.clone()),
    }
}

fn run_diagnostics(opts: &RunOptions, json: bool) -> Result<()> {
    preflight::check_tools(opts.scan_enabled)?;
    preflight::warn_if_not_root();

    println!(
        "baydiag: poll every {}s, tolerance {}, surface scan {}",
        opts.poll_interval.as_secs(),
        util::human::fmt_bytes(opts.tolerance_bytes),
        if opts.scan_enabled { "enabled" } else { "disabled" },
    );

    let report = pipeline::run(&SystemRunner, &mut ThreadSleeper, opts)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&util::report::to_json(&report))?);
    } else {
        println!();
        print!("{}", util::report::generate(&report));
    }
    Ok(())
}

fn run_print_config(cfg: &config::Config) -> Result<()> {
    let path = config::Config::config_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(unknown)".to_string());
    println!("Config: {}", path);
    println!();
    println!("[general]");
    println!("  poll_interval_sec = {}", cfg.general.poll_interval_sec);
    println!("  log_dir           = {}", cfg.general.log_dir.display());
    let failures = match cfg.general.max_poll_failures {
        0 => "unlimited".to_string(),
        n => n.to_string(),
    };
    println!("  max_poll_failures = {}", failures);
    println!();
    println!("[discovery]");
    println!("  dev_type      = {}", cfg.discovery.dev_type);
    println!("  bays          = {:?}", cfg.discovery.bays);
    println!("  bridge_filter = {:?}", cfg.discovery.bridge_filter);
    println!();
    println!("[scan]");
    println!("  enabled         = {}", cfg.scan.enabled);
    println!("  tolerance_bytes = {} ({})", cfg.scan.tolerance_bytes, util::human::fmt_bytes(cfg.scan.tolerance_bytes));
    Ok(())
}
