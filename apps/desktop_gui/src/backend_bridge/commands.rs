//! Backend commands queued from UI to backend worker.

use std::path::PathBuf;

use shared::domain::{Codec, Framing};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    /// Rebind the worker's client to a new service base URL and re-probe it.
    UpdateServerUrl { server_url: String },
    Convert {
        path: PathBuf,
        codec: Codec,
        framing: Framing,
        generation: u64,
    },
    Analyze {
        path: PathBuf,
        generation: u64,
    },
}

impl BackendCommand {
    /// Selection generation the settlement for this command will carry,
    /// if the command opens a submission at all.
    pub fn generation(&self) -> Option<u64> {
        match self {
            BackendCommand::Convert { generation, .. }
            | BackendCommand::Analyze { generation, .. } => Some(*generation),
            BackendCommand::UpdateServerUrl { .. } => None,
        }
    }
}
