//! VertexKV - An In-Memory Key-Value Store
//!
//! This is the main entry point for the VertexKV server.
//! It loads configuration, restores the last snapshot, starts the listener
//! and the snapshot scheduler, and saves once more on shutdown.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use vertexkv::config::Config;
use vertexkv::connection::ConnectionStats;
use vertexkv::persistence::{Gateway, SnapshotScheduler};
use vertexkv::server::Server;
use vertexkv::storage::Datastore;

/// VertexKV server
#[derive(Parser, Debug)]
#[command(name = "vertexkv-server")]
#[command(about = "In-memory key-value store with snapshot persistence")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "VERTEX_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Address to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Require mutual TLS using the configured certificates
    #[arg(long)]
    tls: bool,

    /// Directory holding the snapshot file
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Seconds between periodic snapshots
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Maximum number of keys
    #[arg(long)]
    max_entries: Option<usize>,

    /// Do not load or save snapshots
    #[arg(long)]
    no_persistence: bool,
}

impl Args {
    /// Applies command-line overrides on top of the file configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.address = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.tls {
            config.server.tls.enabled = true;
        }
        if let Some(dir) = &self.data_dir {
            config.persistence.path = dir.clone();
        }
        if let Some(secs) = self.snapshot_interval {
            config.persistence.snapshot_interval_secs = secs;
        }
        if let Some(max) = self.max_entries {
            config.store.max_entries = max;
        }
        if self.no_persistence {
            config.persistence.enabled = false;
        }
    }
}

fn print_banner(config: &Config) {
    println!(
        r#"
VertexKV v{} - In-Memory Key-Value Store
──────────────────────────────────────────────────────────────
Listening on {} (TLS: {})
Snapshots:   {}

Use Ctrl+C to shutdown gracefully.
"#,
        vertexkv::VERSION,
        config.bind_address(),
        if config.server.tls.enabled { "on" } else { "off" },
        if config.persistence.enabled {
            format!(
                "{} every {}s",
                config.persistence.path.display(),
                config.persistence.snapshot_interval_secs
            )
        } else {
            "disabled".to_string()
        },
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let mut config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    // Restore the last snapshot
    let gateway = config.persistence.enabled.then(|| Gateway::from_config(&config));
    let store = match &gateway {
        Some(gateway) => gateway.load_or_empty(),
        None => Datastore::with_limits(config.store.limits()),
    };
    let store = Arc::new(store);
    info!(keys = store.len(), "Datastore ready");

    // Bind the listener; failure here is fatal
    let connection_stats = Arc::new(ConnectionStats::new());
    let server = Server::bind(&config.server, Arc::clone(&store), Arc::clone(&connection_stats))
        .await
        .context("failed to start server")?;

    print_banner(&config);

    let scheduler = gateway.as_ref().map(|gateway| {
        SnapshotScheduler::start(
            Arc::clone(&store),
            gateway.clone(),
            config.snapshot_interval(),
        )
    });

    // Set up graceful shutdown
    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, stopping server..."),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
        }
    };

    tokio::select! {
        _ = server.run() => {}
        _ = shutdown => {}
    }

    if let Some(scheduler) = scheduler {
        scheduler.stop().await;
    }

    if let Some(gateway) = &gateway {
        match gateway.save_in_background(Arc::clone(&store)).await {
            Ok(()) => info!(path = %gateway.path().display(), keys = store.len(), "Final snapshot saved"),
            Err(e) => warn!(error = %e, "Final snapshot failed"),
        }
    }

    let store_stats = store.stats();
    info!(
        keys = store_stats.keys,
        gets = store_stats.get_ops,
        sets = store_stats.set_ops,
        updates = store_stats.update_ops,
        deletes = store_stats.del_ops,
        rejected = store_stats.rejected,
        "Datastore statistics"
    );
    info!(
        accepted = connection_stats.connections_accepted.load(Ordering::Relaxed),
        commands = connection_stats.commands_processed.load(Ordering::Relaxed),
        bytes_read = connection_stats.bytes_read.load(Ordering::Relaxed),
        bytes_written = connection_stats.bytes_written.load(Ordering::Relaxed),
        "Connection statistics"
    );

    info!("Server shutdown complete");
    Ok(())
}
