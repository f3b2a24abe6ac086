//! sim-modem - serves an emulated SIM card over a serial port
//!
//! Usage: `sim-modem [settings.json]`
//!
//! Without an argument, settings are read from
//! `$XDG_CONFIG_HOME/sim-modem/settings.json`.

mod settings;

use std::path::PathBuf;

use anyhow::Context;
use sim_card::{run_modem_task, CardStatusEvent, ModemCommand, SimCard, SimDispatcher};
use tokio::sync::{broadcast, mpsc};
use tokio_serial::SerialPortBuilderExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sim_modem=info,sim_card=info,sim_protocol=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting sim-modem");

    let settings_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::load(settings_path.as_deref());

    let card = SimCard::from_config(&settings.card).context("Invalid card configuration")?;
    let dispatcher = SimDispatcher::from_config(&settings.card);

    let stream = tokio_serial::new(&settings.port, settings.baud_rate)
        .open_native_async()
        .with_context(|| format!("Failed to open serial port {}", settings.port))?;

    tracing::info!(
        "Serving SIM on {} @ {} baud",
        settings.port,
        settings.baud_rate
    );

    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (event_tx, mut event_rx) = broadcast::channel::<CardStatusEvent>(32);

    // Log card status changes
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            tracing::info!(
                "SIM status: {} ({} failed attempts)",
                event.status.name(),
                event.pin_retries
            );
        }
    });

    let shutdown_tx = cmd_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, shutting down");
            let _ = shutdown_tx.send(ModemCommand::Shutdown).await;
        }
    });

    run_modem_task(stream, card, dispatcher, cmd_rx, event_tx)
        .await
        .context("Serial port error")?;

    // Keep the command channel open until the task is done
    drop(cmd_tx);

    tracing::info!("sim-modem stopped");
    Ok(())
}
