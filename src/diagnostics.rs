//! Diagnostic channel for degraded-but-not-failed operations.
//!
//! Some operations deliberately keep going when they hit something they
//! cannot handle: interpolation falls back to identity for unknown types and
//! the format registry turns codec failures into `false`. Those events are
//! reported to an injected [`Diagnostics`] collaborator so callers (and tests)
//! can observe them.
//!
//! ```
//! use std::sync::Arc;
//! use meshmux::attribute::InterpolationRegistry;
//! use meshmux::diagnostics::{CollectingDiagnostics, Diagnostic};
//!
//! let sink = Arc::new(CollectingDiagnostics::new());
//! let registry = InterpolationRegistry::new().with_diagnostics(sink.clone());
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Label(&'static str);
//!
//! let out = registry.lerp(&Label("a"), &Label("b"), 0.5);
//! assert_eq!(out, Label("a"));
//! assert!(matches!(sink.take()[0], Diagnostic::UnsupportedInterpolation { .. }));
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

/// An event worth surfacing that did not abort the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// `lerp` was requested for a type with no registered provider; the
    /// `from` value was returned unchanged.
    UnsupportedInterpolation {
        /// Rust type name of the value.
        type_name: &'static str,
    },

    /// No codec claims the file's extension.
    FormatUnrecognized {
        /// The file that was requested.
        path: PathBuf,
    },

    /// A codec was selected but reported failure.
    CodecFailed {
        /// Codec display name.
        codec: String,
        /// The file that was being read or written.
        path: PathBuf,
        /// The underlying error message.
        message: String,
    },
}

impl Diagnostic {
    pub(crate) fn codec_failed(
        codec: &str,
        file: &crate::fs::FileRef,
        error: &crate::error::MeshError,
    ) -> Self {
        Diagnostic::CodecFailed {
            codec: codec.to_string(),
            path: file.path().to_path_buf(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnsupportedInterpolation { type_name } => {
                write!(f, "no interpolation provider for {type_name}, returning `from` unchanged")
            }
            Diagnostic::FormatUnrecognized { path } => {
                write!(f, "no codec registered for {}", path.display())
            }
            Diagnostic::CodecFailed {
                codec,
                path,
                message,
            } => write!(f, "{codec} failed on {}: {message}", path.display()),
        }
    }
}

/// Receiver for [`Diagnostic`] events.
pub trait Diagnostics: Send + Sync {
    /// Handle one diagnostic.
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the `log` facade.
///
/// Interpolation fallbacks are warnings; codec failures are expected in batch
/// processing and are logged at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::UnsupportedInterpolation { .. } => log::warn!("{}", diagnostic),
            Diagnostic::FormatUnrecognized { .. } | Diagnostic::CodecFailed { .. } => {
                log::debug!("{}", diagnostic)
            }
        }
    }
}

/// Records diagnostics in memory.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    events: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of diagnostics recorded so far.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drain all recorded diagnostics.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        self.events.lock().push(diagnostic);
    }
}

/// The default sink used when none is injected.
pub(crate) fn default_sink() -> Arc<dyn Diagnostics> {
    Arc::new(LogDiagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_diagnostics_take_drains() {
        let sink = CollectingDiagnostics::new();
        sink.report(Diagnostic::FormatUnrecognized {
            path: PathBuf::from("a.xyz"),
        });
        assert_eq!(sink.len(), 1);

        let events = sink.take();
        assert_eq!(events.len(), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::CodecFailed {
            codec: "OFF".to_string(),
            path: PathBuf::from("m.off"),
            message: "bad header".to_string(),
        };
        assert_eq!(d.to_string(), "OFF failed on m.off: bad header");
    }
}
