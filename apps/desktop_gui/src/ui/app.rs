//! Application shell: renders the converter surface and feeds user
//! interaction into the controller reducer.

use std::path::Path;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use serde::{Deserialize, Serialize};
use shared::domain::{CaptureFile, Codec, Framing, OperationOutcome};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::dispatch_backend_command;
use crate::controller::reducer::{
    self, ControllerEvent, ControllerState, Effect, ResultPanel,
};

pub const SETTINGS_STORAGE_KEY: &str = "pcap_voice_converter_settings";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8888";

/// Fixed guidance appended to every analysis result; not derived from the
/// response.
const ANALYZE_NEXT_STEPS: [&str; 3] = [
    "If the analysis shows AMR, AMR-WB, or EVS streams, convert with the detected codec.",
    "G.711 (PCMU/PCMA) streams cannot be converted by this tool; use a general audio tool instead.",
    "If no supported codec shows up, the capture probably carries no voice RTP streams.",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedSettings {
    pub server_url: String,
    pub codec: Codec,
    pub framing: Framing,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            codec: Codec::default(),
            framing: Framing::default(),
        }
    }
}

pub struct ConverterApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    state: ControllerState,

    /// What the user is typing in the server field.
    server_url_draft: String,
    /// The URL the worker's client is currently bound to.
    applied_server_url: String,

    status: String,
}

impl ConverterApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        launch_server_url: String,
        server_url_from_cli: bool,
        persisted: Option<PersistedSettings>,
    ) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            state: ControllerState::default(),
            server_url_draft: launch_server_url.clone(),
            applied_server_url: launch_server_url,
            status: "Starting backend worker...".to_string(),
        };

        if let Some(persisted) = persisted {
            app.state.codec = persisted.codec;
            app.state.framing = persisted.framing;
            // A CLI-provided URL wins over whatever the last session used.
            if !server_url_from_cli && persisted.server_url != app.applied_server_url {
                app.server_url_draft = persisted.server_url.clone();
                app.rebind_server(persisted.server_url);
            }
        }

        app
    }

    fn rebind_server(&mut self, server_url: String) {
        if dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::UpdateServerUrl {
                server_url: server_url.clone(),
            },
            &mut self.status,
        ) {
            self.applied_server_url = server_url;
        }
    }

    /// Run one controller event and perform the effects it asks for.
    fn apply(&mut self, event: ControllerEvent) {
        for effect in reducer::apply(&mut self.state, event) {
            match effect {
                Effect::Dispatch(command) => {
                    let generation = command.generation();
                    if !dispatch_backend_command(&self.cmd_tx, command, &mut self.status) {
                        if let Some(generation) = generation {
                            // Settle locally so the gate re-enables.
                            reducer::apply(
                                &mut self.state,
                                ControllerEvent::OperationSettled {
                                    generation,
                                    outcome: OperationOutcome::TransportError {
                                        message: self.status.clone(),
                                    },
                                },
                            );
                        }
                    }
                }
            }
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Warning(message) => {
                    tracing::warn!(%message, "backend warning");
                    self.status = message;
                }
                UiEvent::OperationSettled {
                    generation,
                    outcome,
                } => {
                    self.apply(ControllerEvent::OperationSettled {
                        generation,
                        outcome,
                    });
                }
            }
        }
    }

    fn handle_drag_and_drop(&mut self, ctx: &egui::Context) {
        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
        if hovering != self.state.drag_active {
            self.apply(if hovering {
                ControllerEvent::DragEntered
            } else {
                ControllerEvent::DragLeft
            });
        }

        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if !dropped.is_empty() {
            let files: Vec<CaptureFile> = dropped
                .iter()
                .filter_map(|file| file.path.as_deref().map(capture_from_path))
                .collect();
            self.apply(ControllerEvent::FilesOffered(files));
        }
    }

    fn pick_file(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter("Packet captures", &["pcap", "pcapng"])
            .add_filter("All files", &["*"])
            .pick_file();
        if let Some(path) = picked {
            let file = capture_from_path(&path);
            self.apply(ControllerEvent::FilesOffered(vec![file]));
        }
    }

    fn show_main_surface(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.weak(&self.status);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(12.0);
            ui.vertical_centered(|ui| {
                ui.set_width(ui.available_width().clamp(440.0, 620.0));
                ui.style_mut().spacing.item_spacing = egui::vec2(8.0, 8.0);

                ui.heading("PCAP Voice Converter");
                ui.weak("Extract and convert voice audio from packet captures.");
                ui.add_space(4.0);

                self.show_server_row(ui);
                ui.add_space(4.0);
                self.show_drop_zone(ui);
                self.show_file_info(ui);
                self.show_options_row(ui);
                self.show_action_row(ui);
                self.show_progress(ui);
                self.show_result(ui);
            });
        });
    }

    fn show_server_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Service");
            let field = egui::TextEdit::singleline(&mut self.server_url_draft)
                .hint_text(DEFAULT_SERVER_URL)
                .desired_width(280.0);
            ui.add_enabled(!self.state.is_submitting(), field);
            let dirty = self.server_url_draft != self.applied_server_url;
            let apply = ui.add_enabled(
                dirty && !self.state.is_submitting(),
                egui::Button::new("Apply"),
            );
            if apply.clicked() {
                let server_url = self.server_url_draft.clone();
                self.rebind_server(server_url);
            }
        });
    }

    fn show_drop_zone(&mut self, ui: &mut egui::Ui) {
        let (fill, stroke) = if self.state.drag_active {
            (
                ui.visuals().selection.bg_fill.gamma_multiply(0.3),
                ui.visuals().selection.stroke,
            )
        } else {
            (
                ui.visuals().faint_bg_color,
                ui.visuals().widgets.noninteractive.bg_stroke,
            )
        };

        let inner = egui::Frame::NONE
            .fill(fill)
            .stroke(stroke)
            .corner_radius(10.0)
            .inner_margin(egui::Margin::symmetric(16, 24))
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new("📂").size(28.0));
                    ui.label("Drop a .pcap / .pcapng capture here");
                    ui.weak("or click to browse");
                });
            });

        let response = inner.response.interact(egui::Sense::click());
        if response.clicked() {
            self.pick_file();
        }
    }

    fn show_file_info(&mut self, ui: &mut egui::Ui) {
        let Some(selection) = self.state.selection.clone() else {
            return;
        };
        // Metadata is withheld for a rejected extension; the error panel
        // carries the message instead.
        if !selection.valid {
            return;
        }

        egui::Frame::NONE
            .fill(ui.visuals().faint_bg_color)
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(12, 8))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.strong("Selected file:");
                    ui.label(&selection.file.name);
                });
                ui.horizontal(|ui| {
                    ui.strong("Size:");
                    ui.label(selection.file.size_display());
                });
                ui.horizontal(|ui| {
                    ui.strong("Type:");
                    ui.label(selection.file.extension_display());
                });
            });
    }

    fn show_options_row(&mut self, ui: &mut egui::Ui) {
        let mut codec_choice = self.state.codec;
        let mut framing_choice = self.state.framing;

        ui.horizontal(|ui| {
            ui.label("Codec");
            egui::ComboBox::from_id_salt("codec_select")
                .selected_text(codec_choice.label())
                .show_ui(ui, |ui| {
                    for codec in Codec::ALL {
                        ui.selectable_value(&mut codec_choice, codec, codec.label());
                    }
                });

            ui.add_space(12.0);

            ui.label("Framing");
            egui::ComboBox::from_id_salt("framing_select")
                .selected_text(framing_choice.label())
                .show_ui(ui, |ui| {
                    for framing in Framing::ALL {
                        ui.selectable_value(&mut framing_choice, framing, framing.label());
                    }
                });
        });

        if codec_choice != self.state.codec {
            self.apply(ControllerEvent::CodecChosen(codec_choice));
        }
        if framing_choice != self.state.framing {
            self.apply(ControllerEvent::FramingChosen(framing_choice));
        }
    }

    fn show_action_row(&mut self, ui: &mut egui::Ui) {
        let gate_open = self.state.actions_enabled();
        let mut convert_clicked = false;
        let mut analyze_clicked = false;

        ui.horizontal(|ui| {
            convert_clicked = ui
                .add_enabled(gate_open, egui::Button::new("🎵 Convert to audio"))
                .clicked();
            analyze_clicked = ui
                .add_enabled(gate_open, egui::Button::new("🔍 Analyze PCAP"))
                .clicked();
        });

        if convert_clicked {
            self.apply(ControllerEvent::ConvertRequested);
        }
        if analyze_clicked {
            self.apply(ControllerEvent::AnalyzeRequested);
        }
    }

    fn show_progress(&mut self, ui: &mut egui::Ui) {
        if let Some(message) = self.state.progress {
            ui.horizontal(|ui| {
                ui.add(egui::Spinner::new());
                ui.label(message);
            });
        }
    }

    fn show_result(&mut self, ui: &mut egui::Ui) {
        let result = self.state.result.clone();
        match &result {
            ResultPanel::Hidden => {}
            ResultPanel::Rejected { message } => self.show_error_panel(ui, message),
            ResultPanel::Outcome(outcome) => match outcome {
                OperationOutcome::ConvertSucceeded {
                    message,
                    output_file,
                    stats,
                } => self.show_convert_success(ui, message, output_file, stats),
                OperationOutcome::AnalyzeSucceeded { analysis, warnings } => {
                    self.show_analysis(ui, analysis, warnings.as_deref())
                }
                OperationOutcome::DomainError { message }
                | OperationOutcome::TransportError { message } => {
                    self.show_error_panel(ui, message)
                }
            },
        }
    }

    fn show_convert_success(
        &mut self,
        ui: &mut egui::Ui,
        message: &str,
        output_file: &str,
        stats: &[(String, String)],
    ) {
        let download_url = download_url_for(&self.applied_server_url, output_file);
        success_frame().show(ui, |ui| {
            ui.label(egui::RichText::new("✅ Conversion successful").strong());
            ui.label(message);
            ui.hyperlink_to(format!("⬇ Download {output_file}"), download_url);
            if !stats.is_empty() {
                ui.add_space(4.0);
                for (label, value) in stats {
                    ui.horizontal(|ui| {
                        ui.strong(format!("{label}:"));
                        ui.label(value);
                    });
                }
            }
        });
    }

    fn show_analysis(&mut self, ui: &mut egui::Ui, analysis: &str, warnings: Option<&str>) {
        success_frame().show(ui, |ui| {
            ui.label(egui::RichText::new("📊 PCAP analysis results").strong());
            egui::Frame::NONE
                .fill(ui.visuals().extreme_bg_color)
                .corner_radius(6.0)
                .inner_margin(egui::Margin::symmetric(8, 6))
                .show(ui, |ui| {
                    ui.label(egui::RichText::new(analysis).monospace());
                });
            if let Some(warnings) = warnings {
                ui.label(
                    egui::RichText::new(format!("Warnings: {warnings}"))
                        .color(ui.visuals().warn_fg_color),
                );
            }
            ui.add_space(4.0);
            ui.strong("Next steps");
            for step in ANALYZE_NEXT_STEPS {
                ui.horizontal_wrapped(|ui| {
                    ui.label("•");
                    ui.label(step);
                });
            }
        });
    }

    fn show_error_panel(&mut self, ui: &mut egui::Ui, message: &str) {
        egui::Frame::NONE
            .fill(egui::Color32::from_rgb(111, 53, 53))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(12, 10))
            .show(ui, |ui| {
                ui.label(
                    egui::RichText::new("❌ Request failed")
                        .strong()
                        .color(egui::Color32::WHITE),
                );
                ui.label(egui::RichText::new(message).color(egui::Color32::WHITE));
            });
    }
}

impl eframe::App for ConverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.handle_drag_and_drop(ctx);
        self.show_main_surface(ctx);

        // Keep draining worker events while idle.
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedSettings {
            server_url: self.applied_server_url.clone(),
            codec: self.state.codec,
            framing: self.state.framing,
        };
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

fn success_frame() -> egui::Frame {
    egui::Frame::NONE
        .fill(egui::Color32::from_rgb(47, 92, 60))
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(96, 175, 118)))
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(12, 10))
}

fn capture_from_path(path: &Path) -> CaptureFile {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let size_bytes = std::fs::metadata(path).map(|meta| meta.len()).unwrap_or(0);
    CaptureFile {
        name,
        size_bytes,
        path: path.to_path_buf(),
    }
}

fn download_url_for(base_url: &str, output_file: &str) -> String {
    format!(
        "{}/api/download/{output_file}",
        base_url.trim_end_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_download_links_from_the_applied_base_url() {
        assert_eq!(
            download_url_for("http://127.0.0.1:8888/", "call.wav"),
            "http://127.0.0.1:8888/api/download/call.wav"
        );
        assert_eq!(
            download_url_for("https://converter.example.com", "a_converted.3ga"),
            "https://converter.example.com/api/download/a_converted.3ga"
        );
    }

    #[test]
    fn persisted_settings_round_trip_as_json() {
        let settings = PersistedSettings {
            server_url: "http://10.0.0.5:8888".to_string(),
            codec: Codec::AmrWb,
            framing: Framing::Iu,
        };
        let serialized = serde_json::to_string(&settings).expect("serialize");
        let restored: PersistedSettings = serde_json::from_str(&serialized).expect("deserialize");
        assert_eq!(restored, settings);
    }

    #[test]
    fn unknown_persisted_fields_fall_back_to_defaults() {
        let restored: PersistedSettings = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(restored, PersistedSettings::default());
    }

    #[test]
    fn capture_metadata_comes_from_the_path() {
        let file = capture_from_path(Path::new("/nonexistent/dir/call.pcap"));
        assert_eq!(file.name, "call.pcap");
        // Unreadable paths still produce a selection; the submission will
        // settle with the read failure.
        assert_eq!(file.size_bytes, 0);
    }
}
