//! Error taxonomy and the central error handler.
//!
//! Two kinds of failure exist in the toolkit:
//!
//! - **Fatal construction** (the native backend hands back no window or no
//!   drawing surface). These are reported to an [`ErrorHandler`], which may
//!   end the process with the kind's exit code.
//! - **Recoverable registration** (duplicate names, missing entries on
//!   remove). These are logged at `warn` and the operation is a no-op; they
//!   never surface as a `Result`.
//!
//! [`UiError`] is what blocking window accessors return when the window they
//! wait on can never become usable.

use std::fmt;
use std::sync::Arc;

use log::error;
use thiserror::Error;

// =============================================================================
// Error Kinds
// =============================================================================

/// Kinds of errors reported through the [`ErrorHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Anything not covered by another kind.
    Unknown,
    /// The native backend could not be initialized.
    BackendInit,
    /// The backend returned no window handle.
    WindowGenerationFailed,
    /// The backend returned no drawing surface for a window.
    ContextMissing,
    /// The concurrent window-thread limit was reached.
    ThreadLimitReached,
    /// A lookup expected a component and found none.
    NoComponent,
}

impl ErrorKind {
    const ALL: [ErrorKind; 6] = [
        ErrorKind::Unknown,
        ErrorKind::BackendInit,
        ErrorKind::WindowGenerationFailed,
        ErrorKind::ContextMissing,
        ErrorKind::ThreadLimitReached,
        ErrorKind::NoComponent,
    ];

    /// Numeric code, used as the process exit status for terminating kinds.
    pub const fn code(self) -> i32 {
        match self {
            ErrorKind::Unknown => 1,
            ErrorKind::BackendInit => 10,
            ErrorKind::WindowGenerationFailed => 11,
            ErrorKind::ContextMissing => 12,
            ErrorKind::ThreadLimitReached => 13,
            ErrorKind::NoComponent => 20,
        }
    }

    /// Whether the handler should stop the process for this kind.
    pub const fn is_terminating(self) -> bool {
        match self {
            ErrorKind::Unknown | ErrorKind::ThreadLimitReached => false,
            ErrorKind::BackendInit
            | ErrorKind::WindowGenerationFailed
            | ErrorKind::ContextMissing
            | ErrorKind::NoComponent => true,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            ErrorKind::Unknown => "an unexpected error occurred",
            ErrorKind::BackendInit => "the native backend could not be initialized",
            ErrorKind::WindowGenerationFailed => "the native backend returned no window handle",
            ErrorKind::ContextMissing => "the window has no drawing surface",
            ErrorKind::ThreadLimitReached => "the window thread limit is reached",
            ErrorKind::NoComponent => "the requested element is not a component",
        }
    }

    /// Map a numeric code back to its kind. Unknown codes map to `Unknown`.
    pub fn from_code(code: i32) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .unwrap_or(ErrorKind::Unknown)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.description(), self.code())
    }
}

// =============================================================================
// Caller-visible Errors
// =============================================================================

/// Errors returned by accessors that depend on a built native window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UiError {
    /// The window's build phase failed; it will never become usable.
    #[error("window `{window}` failed to build: {kind}")]
    BuildFailed { window: String, kind: ErrorKind },

    /// The window never got a thread (thread limit or spawn failure).
    #[error("window `{0}` was never started")]
    NotStarted(String),

    /// The window has already run its destroy phase.
    #[error("window `{0}` has been destroyed")]
    Destroyed(String),

    /// A bounded wait for the build phase ran out.
    #[error("timed out waiting for window `{0}` to build")]
    Timeout(String),
}

pub type Result<T> = std::result::Result<T, UiError>;

// =============================================================================
// Error Handler
// =============================================================================

/// Hook invoked with the exit code of a terminating error.
pub type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

/// Central handler for fatal-construction errors.
///
/// Cheap to clone; every window of a toolkit shares the same hook.
#[derive(Clone)]
pub struct ErrorHandler {
    exit: ExitHook,
    terminate: bool,
}

impl ErrorHandler {
    /// Handler that exits the process on terminating kinds.
    pub fn new() -> Self {
        Self {
            exit: Arc::new(|code| std::process::exit(code)),
            terminate: true,
        }
    }

    /// Handler that calls `hook` instead of exiting the process.
    pub fn with_exit_hook(hook: impl Fn(i32) + Send + Sync + 'static) -> Self {
        Self {
            exit: Arc::new(hook),
            terminate: true,
        }
    }

    /// Handler that only logs, whatever the kind.
    pub fn logging_only() -> Self {
        Self {
            exit: Arc::new(|_| {}),
            terminate: false,
        }
    }

    /// Report an error. Terminating kinds call the exit hook.
    pub fn handle(&self, kind: ErrorKind) {
        if kind.is_terminating() && self.terminate {
            error!("Fatal error {}: {}", kind.code(), kind.description());
            (self.exit)(kind.code());
            return;
        }
        error!("Handled error {}", kind.code());
        error!("Description of {} - {}", kind.code(), kind.description());
    }

    /// Report an error by numeric code.
    pub fn handle_code(&self, code: i32) {
        self.handle(ErrorKind::from_code(code));
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("terminate", &self.terminate)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_code_round_trip() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::from_code(kind.code()), kind);
        }
        assert_eq!(ErrorKind::from_code(424242), ErrorKind::Unknown);
    }

    #[test]
    fn test_terminating_kind_calls_exit_hook() {
        let codes = Arc::new(Mutex::new(Vec::new()));
        let codes_clone = codes.clone();
        let handler = ErrorHandler::with_exit_hook(move |code| {
            codes_clone.lock().unwrap().push(code);
        });

        handler.handle(ErrorKind::WindowGenerationFailed);
        handler.handle(ErrorKind::ThreadLimitReached);
        handler.handle_code(ErrorKind::ContextMissing.code());

        assert_eq!(
            *codes.lock().unwrap(),
            vec![
                ErrorKind::WindowGenerationFailed.code(),
                ErrorKind::ContextMissing.code()
            ]
        );
    }

    #[test]
    fn test_logging_only_never_exits() {
        // Would end the test process if the hook were the default one
        let handler = ErrorHandler::logging_only();
        handler.handle(ErrorKind::WindowGenerationFailed);
        handler.handle(ErrorKind::Unknown);
    }

    #[test]
    fn test_ui_error_messages() {
        let err = UiError::BuildFailed {
            window: "main".to_string(),
            kind: ErrorKind::ContextMissing,
        };
        assert!(err.to_string().contains("main"));
        assert!(err.to_string().contains("code 12"));
        assert_eq!(
            UiError::Timeout("w".into()).to_string(),
            "timed out waiting for window `w` to build"
        );
    }
}
