//! WhatsApp gateway CLI entry point.
//!
//! `serve` (the default) bootstraps the WhatsApp session and runs the HTTP
//! API; `show-qr` prints the cached pairing code.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};

use whatsapp_gateway::adapter::EventAdapter;
use whatsapp_gateway::api::{self, AppState};
use whatsapp_gateway::config::GatewayConfig;
use whatsapp_gateway::logging;
use whatsapp_gateway::qr::{QrError, QrStore};
use whatsapp_gateway::webhook::WebhookClient;
use whatsapp_gateway::whatsapp::events::spawn_event_listener;
use whatsapp_gateway::whatsapp::session::{bootstrap, SessionTracker};
use whatsapp_gateway::whatsapp::{BridgeClient, MessagingClient};

/// Buffered events between the bridge listener and the adapter.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// WhatsApp gateway: HTTP sends in, webhook events out.
#[derive(Parser)]
#[command(name = "whatsapp-gateway", version, about)]
struct Cli {
    /// Subcommand to execute (defaults to `serve`).
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Connect to WhatsApp and serve the HTTP API.
    Serve {
        /// Listen port (overrides `PORT`).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the cached pairing code and exit.
    ShowQr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = GatewayConfig::load();

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => handle_serve(config, port).await,
        Command::ShowQr => handle_show_qr(&config).await,
    }
}

/// Bootstrap the session, then serve until a shutdown signal arrives.
async fn handle_serve(mut config: GatewayConfig, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.port = port;
    }

    let _logging_guard = logging::init(config.log_dir.as_deref())?;
    config.report_warnings();

    info!(version = env!("CARGO_PKG_VERSION"), "starting WhatsApp gateway");

    let client = Arc::new(BridgeClient::new(config.bridge_url.clone()));
    let qr = QrStore::new(config.storage_dir.clone());
    let tracker = SessionTracker::new();

    // Events must flow before connecting so pairing codes are cached.
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let listener_task = spawn_event_listener(client.base_url().to_owned(), event_tx);
    let webhook = WebhookClient::new(config.webhook_url.clone(), config.webhook_secret.clone());
    info!(
        webhook = webhook.url().unwrap_or("disabled"),
        "forwarding inbound events"
    );
    let adapter = EventAdapter::new(webhook, qr.clone(), tracker.clone(), config.forward_receipts);
    let adapter_task = tokio::spawn(adapter.run(event_rx));

    let state = bootstrap(client.as_ref(), &tracker, config.connect_retry())
        .await
        .context("failed to connect to WhatsApp")?;
    info!(?state, "session bootstrapped");

    let app = api::create_router(AppState::new(client.clone(), qr));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "WhatsApp gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("shutting down");
    client.disconnect().await;
    listener_task.abort();
    adapter_task.abort();
    Ok(())
}

/// Print the cached pairing code.
async fn handle_show_qr(config: &GatewayConfig) -> anyhow::Result<()> {
    let _logging_guard = logging::init(None)?;
    config.report_warnings();

    match QrStore::new(config.storage_dir.clone()).load().await {
        Ok(code) => {
            println!("{code}");
            Ok(())
        }
        Err(QrError::NotFound) => anyhow::bail!("no QR code has been generated yet"),
        Err(e) => Err(e.into()),
    }
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("received shutdown signal");
}
