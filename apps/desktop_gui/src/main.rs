mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::{ConverterApp, PersistedSettings, DEFAULT_SERVER_URL, SETTINGS_STORAGE_KEY};

/// Desktop client for the PCAP voice conversion service.
#[derive(Debug, Parser)]
#[command(name = "pcap-voice-converter", version, about)]
struct Cli {
    /// Base URL of the conversion service. Defaults to the last-used URL,
    /// or http://127.0.0.1:8888 on a fresh profile.
    #[arg(long)]
    server_url: Option<String>,

    /// Tracing filter, e.g. "info" or "desktop_gui=debug".
    #[arg(long, default_value = "info")]
    log_filter: String,
}

fn main() -> eframe::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter)
        .init();

    let server_url_from_cli = cli.server_url.is_some();
    let launch_server_url = cli
        .server_url
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(launch_server_url.clone(), cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("PCAP Voice Converter")
            .with_inner_size([720.0, 780.0])
            .with_min_inner_size([560.0, 620.0]),
        ..Default::default()
    };
    eframe::run_native(
        "PCAP Voice Converter",
        options,
        Box::new(move |cc| {
            let persisted = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedSettings>(&text).ok())
            });
            Ok(Box::new(ConverterApp::new(
                cmd_tx,
                ui_rx,
                launch_server_url,
                server_url_from_cli,
                persisted,
            )))
        }),
    )
}
