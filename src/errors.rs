//! Unified error type for the analysis pipeline.
//!
//! Mirrors the taxonomy in `spec.md` §7: each kind carries enough context to
//! explain itself without a generic wrapped string, and each maps to a
//! specific propagation policy (absorbed, surfaced, or fatal). Analyzers
//! never panic on data-dependent conditions — they return typed
//! `Result`s or mark a result `Available = false`; this enum is reserved for
//! configuration errors, whole-load parse failures, and internal invariant
//! violations.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(&'static str);

impl ErrorCode {
    pub const IO: ErrorCode = ErrorCode("E001");
    pub const PARSE_FILE: ErrorCode = ErrorCode("E010");
    pub const PARSE_LOAD: ErrorCode = ErrorCode("E011");
    pub const CONFIG: ErrorCode = ErrorCode("E020");
    pub const ANALYSIS: ErrorCode = ErrorCode("E030");
    pub const EXTERNAL_PROCESS: ErrorCode = ErrorCode("E031");
    pub const DEADLINE: ErrorCode = ErrorCode("E032");
    pub const INVARIANT: ErrorCode = ErrorCode("E040");
    pub const CLI: ErrorCode = ErrorCode("E050");

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unified error type for agent-readiness analysis operations.
#[derive(Debug, Clone, Error)]
pub enum AgentReadinessError {
    #[error("[{code}] I/O error: {message}{path_suffix}", path_suffix = path.as_ref().map(|p| format!(" (path: {})", p.display())).unwrap_or_default())]
    Io {
        code: ErrorCode,
        message: String,
        path: Option<PathBuf>,
    },

    /// Whole-load parse failure: the affected analyzer's result is absent
    /// and every metric in that category is scored unavailable.
    #[error("[{code}] failed to load {language} sources under {}: {message}", root.display())]
    ParseLoad {
        code: ErrorCode,
        message: String,
        language: String,
        root: PathBuf,
    },

    #[error("[{code}] configuration error: {message}")]
    Config {
        code: ErrorCode,
        message: String,
    },

    #[error("[{code}] analysis error: {message}")]
    Analysis {
        code: ErrorCode,
        message: String,
    },

    #[error("[{code}] external process '{program}' failed: {message}")]
    ExternalProcess {
        code: ErrorCode,
        program: String,
        message: String,
    },

    #[error("[{code}] deadline exceeded after {seconds}s running '{program}'")]
    DeadlineExceeded {
        code: ErrorCode,
        program: String,
        seconds: u64,
    },

    /// An internal invariant didn't hold. Fatal in debug builds; in release
    /// the caller logs and substitutes the corrected value.
    #[error("[{code}] internal invariant violated: {message}")]
    Invariant {
        code: ErrorCode,
        message: String,
    },

    #[error("[{code}] {message}")]
    Cli {
        code: ErrorCode,
        message: String,
    },
}

impl AgentReadinessError {
    pub fn io(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Io {
            code: ErrorCode::IO,
            message: message.into(),
            path,
        }
    }

    pub fn parse_load(
        message: impl Into<String>,
        language: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self::ParseLoad {
            code: ErrorCode::PARSE_LOAD,
            message: message.into(),
            language: language.into(),
            root: root.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::CONFIG,
            message: message.into(),
        }
    }

    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis {
            code: ErrorCode::ANALYSIS,
            message: message.into(),
        }
    }

    pub fn external_process(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalProcess {
            code: ErrorCode::EXTERNAL_PROCESS,
            program: program.into(),
            message: message.into(),
        }
    }

    pub fn deadline_exceeded(program: impl Into<String>, seconds: u64) -> Self {
        Self::DeadlineExceeded {
            code: ErrorCode::DEADLINE,
            program: program.into(),
            seconds,
        }
    }

    pub fn cli(message: impl Into<String>) -> Self {
        Self::Cli {
            code: ErrorCode::CLI,
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            code: ErrorCode::INVARIANT,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Io { code, .. }
            | Self::ParseLoad { code, .. }
            | Self::Config { code, .. }
            | Self::Analysis { code, .. }
            | Self::ExternalProcess { code, .. }
            | Self::DeadlineExceeded { code, .. }
            | Self::Invariant { code, .. }
            | Self::Cli { code, .. } => *code,
        }
    }

    /// Configuration errors are fatal and surfaced before analysis starts;
    /// every other kind is either absorbed by the analyzer that raised it
    /// or already terminal by the time it reaches the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Cli { .. })
    }
}

impl From<std::io::Error> for AgentReadinessError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string(), None)
    }
}

/// Enforce an internal invariant. In debug builds a violation panics
/// (the invariant itself is tested); in release builds it is logged and the
/// caller-supplied `fallback` is substituted, per `spec.md` §7.
pub fn check_invariant<T>(condition: bool, message: &str, fallback: impl FnOnce() -> T) -> Option<T>
where
    T: Sized,
{
    if condition {
        None
    } else {
        debug_assert!(condition, "{}", message);
        tracing::error!(invariant = %message, "internal invariant violated, substituting fallback");
        Some(fallback())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_and_cli_errors_are_fatal() {
        assert!(AgentReadinessError::config("bad").is_fatal());
        assert!(AgentReadinessError::Cli {
            code: ErrorCode::CLI,
            message: "bad arg".into()
        }
        .is_fatal());
    }

    #[test]
    fn analysis_errors_are_not_fatal() {
        assert!(!AgentReadinessError::analysis("oops").is_fatal());
        assert!(!AgentReadinessError::external_process("git", "exit 1").is_fatal());
    }

    #[test]
    fn check_invariant_returns_fallback_when_violated() {
        let result = check_invariant(false, "score out of range", || 5);
        assert_eq!(result, Some(5));
        let result = check_invariant(true, "score out of range", || 5);
        assert_eq!(result, None);
    }
}
