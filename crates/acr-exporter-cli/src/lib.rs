// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Startup and task wiring for the `acr-exporter` binary
//!
//! Settings are layered defaults < config file < environment < flags, then
//! validated before anything is spawned.

use acr_exporter_config::{Config, ConfigLoader, Validator};
use acr_exporter_metrics::{Aggregator, ExporterMetrics, MetricsServer, Scheduler, SnapshotStore};
use acr_exporter_observability::{init_tracing_with_config, LogConfig, LogFormat};
use acr_exporter_registry::{AzCliRegistry, RegistryClient};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How long shutdown waits for an in-flight scrape cycle
const SCHEDULER_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Command-line arguments
#[derive(Parser, Debug, Default)]
#[command(name = "acr-exporter")]
#[command(version, about = "Prometheus exporter for Azure Container Registry storage usage")]
#[command(
    long_about = "Periodically lists the repositories of an Azure Container Registry, sums the
manifest sizes of each one and serves the totals on /metrics in the Prometheus text format.

Settings come from an optional config file, then the environment (ACR_NAME,
REFRESH_INTERVAL, METRICS_PORT, ...), then these flags."
)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Registry to scrape
    #[arg(short, long, value_name = "NAME")]
    pub registry: Option<String>,

    /// Seconds between scrape cycles (minimum 5)
    #[arg(long, value_name = "SECS")]
    pub refresh_interval: Option<u64>,

    /// Port for the metrics endpoint
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log format (pretty, compact, json)
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<String>,

    /// Run a single cycle, print the snapshot and exit
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    /// Apply flag values on top of a loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(registry) = &self.registry {
            config.registry.name = registry.clone();
        }
        if let Some(secs) = self.refresh_interval {
            config.scrape.refresh_interval_secs = secs;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.observability.log_format = format.clone();
        }
    }
}

/// Load, override and validate the configuration
pub async fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = ConfigLoader::without_validation()
        .load_with_overrides(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Install the global tracing subscriber
pub fn init_logging(config: &Config) -> Result<()> {
    let format: LogFormat = config.observability.log_format.parse()?;
    let logging = LogConfig::new(format).with_filter(config.observability.log_level.as_str());
    init_tracing_with_config(&logging)?;
    Ok(())
}

/// Log in with the configured service principal, if any
pub async fn login(client: &AzCliRegistry, config: &Config) -> Result<()> {
    match &config.registry.credentials {
        Some(principal) => {
            client
                .login(principal)
                .await
                .context("Azure login failed")?;
            info!("Azure login successful");
        }
        None => info!("No service principal configured, using the existing az session"),
    }
    Ok(())
}

/// Run the exporter until interrupted, or a single cycle with `--once`
pub async fn run(cli: &Cli) -> Result<ExitCode> {
    let config = load_config(cli).await?;
    init_logging(&config)?;
    info!(
        registry = %config.registry.name,
        refresh_interval_secs = config.scrape.refresh_interval_secs,
        bind = %config.server.bind_addr(),
        "Starting ACR exporter"
    );

    let client = AzCliRegistry::from_config(&config.registry);
    login(&client, &config).await?;
    let client: Arc<dyn RegistryClient> = Arc::new(client);

    if cli.once {
        let published = run_once(&config, client).await;
        return Ok(if published {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }
    serve(&config, client).await?;
    Ok(ExitCode::SUCCESS)
}

/// Run one cycle and print the snapshot to stdout
///
/// Returns whether a snapshot was published.
pub async fn run_once(config: &Config, client: Arc<dyn RegistryClient>) -> bool {
    let store = SnapshotStore::new();
    let scheduler = Scheduler::new(
        Aggregator::new(client, config.registry.name.clone(), store.clone()),
        config.scrape.refresh_interval(),
    );

    let published = scheduler
        .run_once()
        .await
        .is_some_and(|report| report.is_published());
    print!("{}", store.read());

    if !published {
        error!(error = %store.get_error(), "Scrape cycle failed");
    }
    published
}

/// Serve metrics and run the scheduler until SIGINT or SIGTERM
pub async fn serve(config: &Config, client: Arc<dyn RegistryClient>) -> Result<()> {
    let store = SnapshotStore::new();
    let mut aggregator = Aggregator::new(client, config.registry.name.clone(), store.clone());
    let mut server = MetricsServer::from_config(store, &config.server);
    if config.server.exporter_metrics {
        let metrics = ExporterMetrics::new().context("Failed to register exporter metrics")?;
        aggregator = aggregator.with_metrics(metrics.clone());
        server = server.with_exporter_metrics(metrics);
    }

    let shutdown = CancellationToken::new();
    let scheduler = Scheduler::new(aggregator, config.scrape.refresh_interval());
    let mut scheduler_task = tokio::spawn({
        let token = shutdown.clone();
        async move { scheduler.run(token).await }
    });

    let _signals = tokio::spawn({
        let token = shutdown.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            token.cancel();
        }
    });

    let served = server.serve(shutdown.clone()).await;
    shutdown.cancel();

    match tokio::time::timeout(SCHEDULER_SHUTDOWN_GRACE, &mut scheduler_task).await {
        Ok(joined) => joined.context("Scheduler task failed")?,
        Err(_) => {
            warn!("Scrape cycle still running at shutdown, abandoning it");
            scheduler_task.abort();
        }
    }

    served.context("Metrics server failed")?;
    info!("ACR exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
