//! The interaction state machine: selection, validation, the action gate,
//! and the progress/result presentation, expressed as a pure transition
//! function so it can be exercised without a rendering surface. Side
//! effects come back to the caller as [`Effect`]s.

use shared::domain::{CaptureFile, Codec, Framing, OperationOutcome};

use crate::backend_bridge::commands::BackendCommand;

pub const SELECT_FILE_FIRST: &str = "Please select a file first.";
pub const INVALID_CAPTURE_FILE: &str = "Please select a valid PCAP or PCAPNG file.";
pub const CONVERT_PROGRESS: &str = "Converting audio...";
pub const ANALYZE_PROGRESS: &str = "Analyzing PCAP structure...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Convert,
    Analyze,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
}

/// The result region. At most one of the success/error renderings is
/// visible; progress is tracked separately because a new selection clears
/// the result without touching an in-flight submission's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultPanel {
    Hidden,
    Outcome(OperationOutcome),
    /// Local precondition and validation errors; they share the error
    /// presentation with settled failures.
    Rejected { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub file: CaptureFile,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    /// The one candidate file; replaced wholesale by any new selection.
    pub selection: Option<Selection>,
    /// Bumped on every selection; submissions are stamped with it so a
    /// settlement for a superseded selection can be told apart.
    pub generation: u64,
    pub codec: Codec,
    pub framing: Framing,
    pub phase: Phase,
    pub progress: Option<&'static str>,
    pub result: ResultPanel,
    pub drag_active: bool,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            selection: None,
            generation: 0,
            codec: Codec::default(),
            framing: Framing::default(),
            phase: Phase::Idle,
            progress: None,
            result: ResultPanel::Hidden,
            drag_active: false,
        }
    }
}

impl ControllerState {
    /// Convert/analyze are triggerable: a valid selection is held and no
    /// request is in flight.
    pub fn actions_enabled(&self) -> bool {
        matches!(self.phase, Phase::Idle)
            && self.selection.as_ref().is_some_and(|selection| selection.valid)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, Phase::Submitting)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// Files offered by the chooser or a drop; only the first is taken,
    /// and an empty set changes nothing.
    FilesOffered(Vec<CaptureFile>),
    DragEntered,
    DragLeft,
    CodecChosen(Codec),
    FramingChosen(Framing),
    ConvertRequested,
    AnalyzeRequested,
    OperationSettled {
        generation: u64,
        outcome: OperationOutcome,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Dispatch(BackendCommand),
}

pub fn apply(state: &mut ControllerState, event: ControllerEvent) -> Vec<Effect> {
    match event {
        ControllerEvent::FilesOffered(files) => {
            let Some(file) = files.into_iter().next() else {
                return Vec::new();
            };
            let valid = file.is_supported();
            state.generation += 1;
            state.selection = Some(Selection { file, valid });
            state.result = if valid {
                ResultPanel::Hidden
            } else {
                ResultPanel::Rejected {
                    message: INVALID_CAPTURE_FILE.to_string(),
                }
            };
            Vec::new()
        }
        ControllerEvent::DragEntered => {
            state.drag_active = true;
            Vec::new()
        }
        ControllerEvent::DragLeft => {
            state.drag_active = false;
            Vec::new()
        }
        ControllerEvent::CodecChosen(codec) => {
            state.codec = codec;
            Vec::new()
        }
        ControllerEvent::FramingChosen(framing) => {
            state.framing = framing;
            Vec::new()
        }
        ControllerEvent::ConvertRequested => submit(state, Operation::Convert),
        ControllerEvent::AnalyzeRequested => submit(state, Operation::Analyze),
        ControllerEvent::OperationSettled {
            generation,
            outcome,
        } => {
            if !state.is_submitting() {
                tracing::debug!("ignoring settlement with no submission in flight");
                return Vec::new();
            }
            state.phase = Phase::Idle;
            state.progress = None;
            if generation == state.generation {
                state.result = ResultPanel::Outcome(outcome);
            } else {
                tracing::debug!(
                    settled = generation,
                    current = state.generation,
                    "discarding settlement for a superseded selection"
                );
            }
            Vec::new()
        }
    }
}

fn submit(state: &mut ControllerState, operation: Operation) -> Vec<Effect> {
    if state.is_submitting() {
        return Vec::new();
    }
    let Some(selection) = &state.selection else {
        state.result = ResultPanel::Rejected {
            message: SELECT_FILE_FIRST.to_string(),
        };
        return Vec::new();
    };
    if !selection.valid {
        state.result = ResultPanel::Rejected {
            message: INVALID_CAPTURE_FILE.to_string(),
        };
        return Vec::new();
    }

    let command = match operation {
        Operation::Convert => BackendCommand::Convert {
            path: selection.file.path.clone(),
            codec: state.codec,
            framing: state.framing,
            generation: state.generation,
        },
        Operation::Analyze => BackendCommand::Analyze {
            path: selection.file.path.clone(),
            generation: state.generation,
        },
    };
    state.phase = Phase::Submitting;
    state.progress = Some(match operation {
        Operation::Convert => CONVERT_PROGRESS,
        Operation::Analyze => ANALYZE_PROGRESS,
    });
    state.result = ResultPanel::Hidden;
    vec![Effect::Dispatch(command)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn capture(name: &str, size_bytes: u64) -> CaptureFile {
        CaptureFile {
            name: name.to_string(),
            size_bytes,
            path: PathBuf::from(format!("/tmp/{name}")),
        }
    }

    fn select(state: &mut ControllerState, name: &str) {
        let effects = apply(state, ControllerEvent::FilesOffered(vec![capture(name, 2_621_440)]));
        assert!(effects.is_empty());
    }

    fn settled_ok(generation: u64) -> ControllerEvent {
        ControllerEvent::OperationSettled {
            generation,
            outcome: OperationOutcome::ConvertSucceeded {
                message: "Converted".to_string(),
                output_file: "call.wav".to_string(),
                stats: vec![("frames".to_string(), "120".to_string())],
            },
        }
    }

    #[test]
    fn actions_start_disabled() {
        let state = ControllerState::default();
        assert!(!state.actions_enabled());
    }

    #[test]
    fn empty_file_set_changes_nothing() {
        let mut state = ControllerState::default();
        let before = state.clone();
        assert!(apply(&mut state, ControllerEvent::FilesOffered(Vec::new())).is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn valid_selection_enables_actions_and_clears_result() {
        let mut state = ControllerState::default();
        state.result = ResultPanel::Rejected {
            message: "stale".to_string(),
        };
        select(&mut state, "call.pcap");

        assert!(state.actions_enabled());
        assert_eq!(state.result, ResultPanel::Hidden);
        let selection = state.selection.as_ref().expect("selection held");
        assert!(selection.valid);
        assert_eq!(selection.file.name, "call.pcap");
        assert_eq!(selection.file.size_display(), "2.50 MB");
        assert_eq!(selection.file.extension_display(), "PCAP");
    }

    #[test]
    fn invalid_extension_keeps_selection_but_gate_stays_closed() {
        let mut state = ControllerState::default();
        select(&mut state, "trace.txt");

        assert!(!state.actions_enabled());
        assert!(state.selection.as_ref().is_some_and(|s| !s.valid));
        assert_eq!(
            state.result,
            ResultPanel::Rejected {
                message: INVALID_CAPTURE_FILE.to_string()
            }
        );
    }

    #[test]
    fn reselecting_the_same_file_is_idempotent() {
        let mut state = ControllerState::default();
        select(&mut state, "call.pcap");
        let first = state.selection.clone();
        select(&mut state, "call.pcap");
        assert_eq!(state.selection, first);
        assert_eq!(state.result, ResultPanel::Hidden);
    }

    #[test]
    fn convert_without_selection_rejects_locally() {
        let mut state = ControllerState::default();
        let effects = apply(&mut state, ControllerEvent::ConvertRequested);

        assert!(effects.is_empty(), "no command may reach the backend");
        assert_eq!(
            state.result,
            ResultPanel::Rejected {
                message: SELECT_FILE_FIRST.to_string()
            }
        );
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn convert_dispatches_with_chosen_options_and_closes_gate() {
        let mut state = ControllerState::default();
        select(&mut state, "call.pcap");
        apply(&mut state, ControllerEvent::CodecChosen(Codec::AmrWb));
        apply(&mut state, ControllerEvent::FramingChosen(Framing::Iu));

        let effects = apply(&mut state, ControllerEvent::ConvertRequested);
        assert_eq!(
            effects,
            vec![Effect::Dispatch(BackendCommand::Convert {
                path: PathBuf::from("/tmp/call.pcap"),
                codec: Codec::AmrWb,
                framing: Framing::Iu,
                generation: state.generation,
            })]
        );
        assert!(!state.actions_enabled());
        assert!(state.is_submitting());
        assert_eq!(state.progress, Some(CONVERT_PROGRESS));
        assert_eq!(state.result, ResultPanel::Hidden);
    }

    #[test]
    fn analyze_dispatches_file_only() {
        let mut state = ControllerState::default();
        select(&mut state, "trace.pcapng");

        let effects = apply(&mut state, ControllerEvent::AnalyzeRequested);
        assert_eq!(
            effects,
            vec![Effect::Dispatch(BackendCommand::Analyze {
                path: PathBuf::from("/tmp/trace.pcapng"),
                generation: state.generation,
            })]
        );
        assert_eq!(state.progress, Some(ANALYZE_PROGRESS));
    }

    #[test]
    fn second_request_while_submitting_is_ignored() {
        let mut state = ControllerState::default();
        select(&mut state, "call.pcap");
        assert_eq!(apply(&mut state, ControllerEvent::ConvertRequested).len(), 1);

        assert!(apply(&mut state, ControllerEvent::AnalyzeRequested).is_empty());
        assert!(apply(&mut state, ControllerEvent::ConvertRequested).is_empty());
        assert_eq!(state.progress, Some(CONVERT_PROGRESS));
    }

    #[test]
    fn settlement_reopens_gate_and_shows_outcome() {
        let mut state = ControllerState::default();
        select(&mut state, "call.pcap");
        apply(&mut state, ControllerEvent::ConvertRequested);

        let generation = state.generation;
        apply(&mut state, settled_ok(generation));

        assert!(state.actions_enabled());
        assert_eq!(state.progress, None);
        match &state.result {
            ResultPanel::Outcome(OperationOutcome::ConvertSucceeded {
                message,
                output_file,
                stats,
            }) => {
                assert_eq!(message, "Converted");
                assert_eq!(output_file, "call.wav");
                assert_eq!(stats, &[("frames".to_string(), "120".to_string())]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn settlement_reopens_gate_on_every_error_branch() {
        for outcome in [
            OperationOutcome::DomainError {
                message: "Unsupported codec".to_string(),
            },
            OperationOutcome::TransportError {
                message: "Network error: connection refused".to_string(),
            },
        ] {
            let mut state = ControllerState::default();
            select(&mut state, "call.pcap");
            apply(&mut state, ControllerEvent::ConvertRequested);

            let generation = state.generation;
            apply(
                &mut state,
                ControllerEvent::OperationSettled {
                    generation,
                    outcome: outcome.clone(),
                },
            );

            assert!(state.actions_enabled());
            assert_eq!(state.progress, None);
            assert_eq!(state.result, ResultPanel::Outcome(outcome));
        }
    }

    #[test]
    fn stale_settlement_reopens_gate_but_keeps_presentation() {
        let mut state = ControllerState::default();
        select(&mut state, "old.pcap");
        apply(&mut state, ControllerEvent::ConvertRequested);
        let submitted_generation = state.generation;

        // A new selection lands while the request is in flight.
        select(&mut state, "new.pcap");
        apply(&mut state, settled_ok(submitted_generation));

        assert!(state.actions_enabled(), "gate re-enables unconditionally");
        assert_eq!(state.progress, None);
        assert_eq!(
            state.result,
            ResultPanel::Hidden,
            "superseded outcome must not surface"
        );
    }

    #[test]
    fn drag_state_follows_enter_and_leave() {
        let mut state = ControllerState::default();
        apply(&mut state, ControllerEvent::DragEntered);
        assert!(state.drag_active);
        apply(&mut state, ControllerEvent::DragLeft);
        assert!(!state.drag_active);
    }
}
