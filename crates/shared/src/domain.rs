use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Capture-file extensions the client accepts; checked case-insensitively
/// against the part after the final `.` in the file name.
pub const SUPPORTED_CAPTURE_EXTENSIONS: [&str; 2] = ["pcap", "pcapng"];

/// Voice codec the conversion service should extract; the value set is
/// fixed by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Codec {
    #[default]
    Guess,
    Amr,
    AmrWb,
    Evs,
}

impl Codec {
    pub const ALL: [Codec; 4] = [Codec::Guess, Codec::Amr, Codec::AmrWb, Codec::Evs];

    /// Wire value sent in the `codec` multipart field.
    pub fn as_str(self) -> &'static str {
        match self {
            Codec::Guess => "guess",
            Codec::Amr => "amr",
            Codec::AmrWb => "amr-wb",
            Codec::Evs => "evs",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Codec::Guess => "Auto-detect",
            Codec::Amr => "AMR",
            Codec::AmrWb => "AMR-WB",
            Codec::Evs => "EVS",
        }
    }
}

/// Payload framing convention applied to extracted codec frames; the value
/// set is fixed by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    #[default]
    Ietf,
    Iu,
}

impl Framing {
    pub const ALL: [Framing; 2] = [Framing::Ietf, Framing::Iu];

    /// Wire value sent in the `framing` multipart field.
    pub fn as_str(self) -> &'static str {
        match self {
            Framing::Ietf => "ietf",
            Framing::Iu => "iu",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Framing::Ietf => "IETF (RFC 4867)",
            Framing::Iu => "Iu",
        }
    }
}

/// The currently selected capture file. At most one exists at a time; a new
/// selection replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFile {
    pub name: String,
    pub size_bytes: u64,
    pub path: PathBuf,
}

impl CaptureFile {
    /// Lowercased extension after the final `.`, if any.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.name.rsplit_once('.')?;
        Some(ext.to_ascii_lowercase())
    }

    pub fn is_supported(&self) -> bool {
        self.extension()
            .is_some_and(|ext| SUPPORTED_CAPTURE_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Size in megabytes, two decimals, e.g. "2.50 MB".
    pub fn size_display(&self) -> String {
        format!("{:.2} MB", self.size_bytes as f64 / 1024.0 / 1024.0)
    }

    /// Uppercased extension for the info region, empty if the name has none.
    pub fn extension_display(&self) -> String {
        self.extension().unwrap_or_default().to_ascii_uppercase()
    }
}

/// Terminal settlement of one convert or analyze submission. Exactly one
/// outcome is held at a time and drives the result presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    ConvertSucceeded {
        message: String,
        output_file: String,
        /// Labeled statistics in the order the service reported them.
        stats: Vec<(String, String)>,
    },
    AnalyzeSucceeded {
        analysis: String,
        warnings: Option<String>,
    },
    /// The service executed and reported failure.
    DomainError { message: String },
    /// The call itself could not complete (send or decode failure).
    TransportError { message: String },
}

impl OperationOutcome {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            OperationOutcome::DomainError { .. } | OperationOutcome::TransportError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(name: &str, size_bytes: u64) -> CaptureFile {
        CaptureFile {
            name: name.to_string(),
            size_bytes,
            path: PathBuf::from(name),
        }
    }

    #[test]
    fn accepts_supported_extensions_case_insensitively() {
        assert!(capture("call.pcap", 10).is_supported());
        assert!(capture("call.PCAP", 10).is_supported());
        assert!(capture("trace.pcapng", 10).is_supported());
        assert!(capture("trace.PcapNG", 10).is_supported());
    }

    #[test]
    fn rejects_other_extensions_without_panicking() {
        assert!(!capture("trace.txt", 10).is_supported());
        assert!(!capture("archive.pcap.gz", 10).is_supported());
        assert!(!capture("noextension", 10).is_supported());
        assert!(!capture("trailingdot.", 10).is_supported());
    }

    #[test]
    fn extension_uses_final_dot_only() {
        assert_eq!(capture("a.b.pcap", 0).extension().as_deref(), Some("pcap"));
        assert_eq!(capture("noextension", 0).extension(), None);
    }

    #[test]
    fn formats_size_in_megabytes_with_two_decimals() {
        assert_eq!(capture("call.pcap", 2_621_440).size_display(), "2.50 MB");
        assert_eq!(capture("tiny.pcap", 0).size_display(), "0.00 MB");
        assert_eq!(capture("odd.pcap", 1_572_864).size_display(), "1.50 MB");
    }

    #[test]
    fn displays_uppercased_extension() {
        assert_eq!(capture("call.pcap", 0).extension_display(), "PCAP");
        assert_eq!(capture("trace.pcapng", 0).extension_display(), "PCAPNG");
    }

    #[test]
    fn codec_and_framing_wire_values_match_service_set() {
        let codecs: Vec<&str> = Codec::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(codecs, ["guess", "amr", "amr-wb", "evs"]);
        let framings: Vec<&str> = Framing::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(framings, ["ietf", "iu"]);
        assert_eq!(Codec::default(), Codec::Guess);
        assert_eq!(Framing::default(), Framing::Ietf);
    }
}
