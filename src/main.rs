mod classifier;
mod config;
mod controller;
mod controls;
mod error;
mod log_view;
mod parser;
mod poller;
mod render;
mod scheduler;
mod session;
mod types;
mod watermark;

use anyhow::Result;
use clap::Parser;
use controls::ControlCommand;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()?;

    info!("Starting proxy-logwatch");

    // Parse command-line arguments
    let cli = config::Cli::parse();

    // Load configuration
    let config = config::load_config(&cli)?;
    info!("Configuration loaded successfully");

    // Shared session credential
    let session = Arc::new(session::SessionStore::new(config.token.clone()));
    let client = session::SessionClient::new(config.api_base.clone(), Arc::clone(&session));

    // Log view state
    let sink = render::TableSink::new(std::io::stdout(), !config.no_color);
    let view = log_view::LogView::new(config.criteria(), sink);
    let scheduler = scheduler::PollScheduler::new(config.refresh, config.presets());
    let mut controller = controller::LogController::new(client, view, scheduler);

    // User controls from stdin
    let (command_tx, mut command_rx) = mpsc::channel::<ControlCommand>(16);
    tokio::spawn(read_controls(command_tx));

    let mut session_rx = session.subscribe();

    controller.activate().await;
    println!("{}", controls::HELP);
    let mut controls_open = true;

    loop {
        tokio::select! {
            changed = session_rx.changed() => {
                if changed.is_err() || controller.on_session_change() {
                    controller.deactivate();
                    anyhow::bail!("Session expired; log in again and update the token");
                }
            }
            command = command_rx.recv(), if controls_open => {
                let Some(command) = command else {
                    info!("Control input closed, press Ctrl-C to exit");
                    controls_open = false;
                    continue;
                };
                if !controller.handle(command).await {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    controller.deactivate();
    info!("Log view closed");

    Ok(())
}

async fn read_controls(command_tx: mpsc::Sender<ControlCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match controls::parse_command(&line) {
                Ok(command) => {
                    if command_tx.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("{}", e),
            },
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read control input: {}", e);
                break;
            }
        }
    }
}
