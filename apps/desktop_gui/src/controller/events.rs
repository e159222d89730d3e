//! Events flowing from the backend worker to the UI thread.

use shared::domain::OperationOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Status-line notes: worker lifecycle, health probe results.
    Info(String),
    Warning(String),
    /// One convert or analyze submission settled. `generation` is the
    /// selection generation the submission was made for; the reducer
    /// discards outcomes that no longer match the current selection.
    OperationSettled {
        generation: u64,
        outcome: OperationOutcome,
    },
}
