use std::sync::Arc;

use anyhow::Result;
use lib_kiosk::loggers::{setup_logging, LoggerLocalOptions};
use lib_kiosk::retrieve::ApiClient;
use lib_kiosk::utils::MediaResolver;
use lib_kiosk::DisplaySession;
use tokio::signal;

mod kiosk_logic;
use kiosk_logic::config::{self, RenderMode};
use kiosk_logic::{probe, render};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment overrides may live in a .env file next to the binary.
    let _ = dotenvy::dotenv();

    let settings = config::load_config()?;
    setup_logging(&LoggerLocalOptions {
        app_name: "stop_display".to_string(),
        log_dir: settings.log_dir.clone(),
        level: settings.log_level,
        to_stdout: settings.render == RenderMode::Log,
    })?;
    log::info!(
        "Stop {} via {} (arrivals every {}s, content every {}s)",
        settings.stop_id,
        settings.api_base_url,
        settings.arrivals_interval.as_secs(),
        settings.content_interval.as_secs()
    );

    let client = Arc::new(ApiClient::new(settings.api_base_url.as_str(), settings.request_timeout)?);
    let media = MediaResolver::new(Some(settings.media_base_url.clone()));

    let session = DisplaySession::start(client.clone(), client.clone(), settings.session_config(media.clone()));
    let probe = probe::spawn_image_probe(client, session.content(), media);

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let renderer = tokio::spawn(render::run(settings.render, session.frames(), shutdown_tx.subscribe()));

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = terminate() => {
            log::info!("SIGTERM received, initiating shutdown.");
        }
    }

    // Send shutdown signal to the renderer, then stop every loop
    let _ = shutdown_tx.send(());
    let _ = renderer.await;
    probe.stop().await;
    session.stop().await;

    log::info!("Shutdown complete.");
    Ok(())
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut term_signal) => {
            term_signal.recv().await;
        }
        Err(e) => {
            log::warn!("Cannot listen for SIGTERM: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    // On non-unix platforms, just wait forever.
    std::future::pending::<()>().await;
}
