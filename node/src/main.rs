use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use nfid_registry::NfidRegistry;
use nfid_rpc::{start_server, AppState};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod settings;
mod version;

use settings::AppConfig;
use version::{git_commit_hash, NFID_VERSION};

fn build_cli() -> Command {
    Command::new("nfid-node")
        .version(NFID_VERSION)
        .about("NFID identity registry node")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .action(ArgAction::SetTrue)
                .help("Validate the configuration, print it, then exit"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .help("Override the log level"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .value_parser(["pretty", "json"])
                .help("Select log output format"),
        )
        .arg(
            Arg::new("rpc-host")
                .long("rpc-host")
                .value_name("HOST")
                .help("Override RPC bind host"),
        )
        .arg(
            Arg::new("rpc-port")
                .long("rpc-port")
                .value_name("PORT")
                .value_parser(value_parser!(u16))
                .help("Override RPC port"),
        )
        .arg(
            Arg::new("disable-metrics")
                .long("disable-metrics")
                .action(ArgAction::SetTrue)
                .help("Disable the Prometheus recorder"),
        )
}

fn load_config_with_overrides(matches: &clap::ArgMatches) -> Result<AppConfig> {
    let config_path = matches
        .get_one::<String>("config")
        .map(|value| value.as_str());
    let mut config = AppConfig::load(config_path)?;
    apply_overrides(matches, &mut config);
    Ok(config)
}

fn apply_overrides(matches: &clap::ArgMatches, config: &mut AppConfig) {
    if let Some(log_level) = matches.get_one::<String>("log-level") {
        config.log_level = log_level.clone();
    }

    if let Some(log_format) = matches.get_one::<String>("log-format") {
        config.log_format = log_format.clone();
    }

    if let Some(rpc_host) = matches.get_one::<String>("rpc-host") {
        config.rpc_host = rpc_host.clone();
    }

    if let Some(rpc_port) = matches.get_one::<u16>("rpc-port") {
        config.rpc_port = *rpc_port;
    }

    if matches.get_flag("disable-metrics") {
        config.prometheus_enabled = false;
    }
}

fn print_check_report(config: &AppConfig) {
    println!("NFID node {} (commit {})", NFID_VERSION, git_commit_hash());
    match &config.config_path {
        Some(path) => println!("config file:      {}", path.display()),
        None => println!("config file:      <none, defaults + environment>"),
    }
    println!("node id:          {}", config.node_id);
    println!("rpc address:      {}", config.rpc_addr());
    println!("request timeout:  {}ms", config.request_timeout.as_millis());
    println!("remint policy:    {}", config.registry.remint);
    println!("burn policy:      {}", config.registry.burn);
    println!("allow zero id:    {}", config.registry.allow_zero_id);
    println!("event capacity:   {}", config.registry.event_capacity);
    println!("prometheus:       {}", config.prometheus_enabled);
    println!("log:              {} ({})", config.log_level, config.log_format);
    println!("configuration OK");
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let config = load_config_with_overrides(&matches)?;

    if matches.get_flag("check") {
        print_check_report(&config);
        return Ok(());
    }

    init_logging(&config)?;

    info!(
        "Starting NFID node {} (commit {})",
        NFID_VERSION,
        git_commit_hash()
    );
    if let Some(path) = &config.config_path {
        info!("Loaded configuration from {}", path.display());
    }
    info!(
        remint = %config.registry.remint,
        burn = %config.registry.burn,
        allow_zero_id = config.registry.allow_zero_id,
        event_capacity = config.registry.event_capacity,
        "Registry policy"
    );

    let metrics_handle = init_metrics(&config);
    let registry = Arc::new(NfidRegistry::new(config.registry.clone()));

    let mut state = AppState::new(Arc::clone(&registry), config.node_id.clone());
    state.metrics = metrics_handle;
    state.request_timeout = config.request_timeout;

    let rpc_addr = config.rpc_addr();
    info!("RPC API available at: http://{}", rpc_addr);
    info!("Node ID: {}", config.node_id);

    if let Err(err) = start_server(state, &rpc_addr, shutdown_signal()).await {
        error!("RPC server failed: {err:#}");
        return Err(err);
    }

    info!(
        active_identities = registry.active_count(),
        last_event_seq = registry.last_event_seq(),
        "NFID node stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down NFID node"),
        Err(err) => warn!("Failed to listen for shutdown signal: {}", err),
    }
}

fn init_metrics(config: &AppConfig) -> Option<PrometheusHandle> {
    if !config.prometheus_enabled {
        info!("Prometheus metrics exporter disabled via configuration");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            info!("Prometheus metrics exporter registered");
            describe_counter!("nfid_mint_total", "Successful mint operations");
            describe_counter!("nfid_burn_total", "Successful burn operations");
            describe_counter!(
                "nfid_rejected_total",
                "Registry operations rejected by validation or policy"
            );
            describe_gauge!(
                "nfid_active_identities",
                "Addresses currently holding an NFID"
            );
            Some(handle)
        }
        Err(err) => {
            warn!("Failed to install Prometheus metrics exporter: {}", err);
            None
        }
    }
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()?;
    }

    Ok(())
}
