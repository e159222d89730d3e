//! Backend worker: a dedicated thread owning the tokio runtime and the
//! service client. Commands arrive over the crossbeam queue; every
//! submission settles with exactly one `OperationSettled` event, whatever
//! the branch.

use std::path::Path;
use std::thread;

use client_core::{AnalyzeSuccess, CaptureUpload, ConvertSuccess, ConverterClient, ServiceError};
use crossbeam_channel::{Receiver, Sender};
use shared::domain::{Codec, Framing, OperationOutcome};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

pub fn launch(server_url: String, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Warning(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let mut client = match ConverterClient::new(&server_url) {
                Ok(client) => client,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Warning(format!(
                        "backend worker startup failure: invalid server URL '{server_url}': {err}"
                    )));
                    tracing::error!("invalid server URL '{server_url}': {err}");
                    return;
                }
            };
            probe_health(&client, &ui_tx).await;

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::UpdateServerUrl { server_url } => {
                        match ConverterClient::new(&server_url) {
                            Ok(rebound) => {
                                client = rebound;
                                tracing::info!(server_url = client.base_url(), "rebound service client");
                                probe_health(&client, &ui_tx).await;
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Warning(format!(
                                    "Invalid server URL '{server_url}': {err}"
                                )));
                            }
                        }
                    }
                    BackendCommand::Convert {
                        path,
                        codec,
                        framing,
                        generation,
                    } => {
                        tracing::info!(
                            path = %path.display(),
                            codec = codec.as_str(),
                            framing = framing.as_str(),
                            "backend: convert"
                        );
                        let outcome = run_convert(&client, &path, codec, framing).await;
                        settle(&ui_tx, generation, outcome);
                    }
                    BackendCommand::Analyze { path, generation } => {
                        tracing::info!(path = %path.display(), "backend: analyze");
                        let outcome = run_analyze(&client, &path).await;
                        settle(&ui_tx, generation, outcome);
                    }
                }
            }
        });
    });
}

async fn probe_health(client: &ConverterClient, ui_tx: &Sender<UiEvent>) {
    match client.health().await {
        Ok(health) => {
            tracing::info!(status = %health.status, version = %health.version, "conversion service reachable");
            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Service {} (v{}) at {}",
                health.status,
                health.version,
                client.base_url()
            )));
        }
        Err(err) => {
            tracing::warn!("conversion service health probe failed: {err}");
            let _ = ui_tx.try_send(UiEvent::Warning(format!(
                "Conversion service not reachable at {}: {err}",
                client.base_url()
            )));
        }
    }
}

async fn run_convert(
    client: &ConverterClient,
    path: &Path,
    codec: Codec,
    framing: Framing,
) -> OperationOutcome {
    let upload = match stage_upload(path).await {
        Ok(upload) => upload,
        Err(outcome) => return outcome,
    };
    match client.convert(upload, codec, framing).await {
        Ok(ConvertSuccess {
            message,
            output_file,
            stats,
        }) => OperationOutcome::ConvertSucceeded {
            message,
            output_file,
            stats,
        },
        Err(err) => outcome_from_error(err),
    }
}

async fn run_analyze(client: &ConverterClient, path: &Path) -> OperationOutcome {
    let upload = match stage_upload(path).await {
        Ok(upload) => upload,
        Err(outcome) => return outcome,
    };
    match client.analyze(upload).await {
        Ok(AnalyzeSuccess { analysis, warnings }) => OperationOutcome::AnalyzeSucceeded {
            analysis,
            warnings,
        },
        Err(err) => outcome_from_error(err),
    }
}

/// Read the selected capture from disk. A file that cannot be read settles
/// the submission before the wire, in the transport class.
async fn stage_upload(path: &Path) -> Result<CaptureUpload, OperationOutcome> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("capture.pcap")
        .to_string();
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let mime_type = mime_guess::from_path(path).first_raw().map(str::to_string);
            Ok(CaptureUpload {
                filename,
                mime_type,
                bytes,
            })
        }
        Err(err) => Err(OperationOutcome::TransportError {
            message: format!("could not read {}: {err}", path.display()),
        }),
    }
}

fn outcome_from_error(err: ServiceError) -> OperationOutcome {
    match err {
        ServiceError::Domain(message) => OperationOutcome::DomainError { message },
        transport @ ServiceError::Transport(_) => OperationOutcome::TransportError {
            message: transport.to_string(),
        },
    }
}

fn settle(ui_tx: &Sender<UiEvent>, generation: u64, outcome: OperationOutcome) {
    match &outcome {
        OperationOutcome::DomainError { message }
        | OperationOutcome::TransportError { message } => {
            tracing::warn!(%message, "backend: operation failed")
        }
        _ => tracing::info!("backend: operation succeeded"),
    }
    let _ = ui_tx.try_send(UiEvent::OperationSettled {
        generation,
        outcome,
    });
}
