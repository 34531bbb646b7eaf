//! Exit codes for the probcalc CLI.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors (numerical faults, I/O, bugs)

use pc_common::{Error, ErrorCategory};

/// Exit codes for probcalc operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    /// Invalid arguments or rejected input
    ArgsError = 10,

    /// Configuration could not be loaded or is invalid
    ConfigError = 11,

    /// Internal error (computation failure, bind failure)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_user_error(self) -> bool {
        (10..20).contains(&self.as_i32())
    }

    pub fn is_internal_error(self) -> bool {
        self.as_i32() >= 20
    }

    /// Pick the exit code for a failed command.
    pub fn from_error(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Validation => ExitCode::ArgsError,
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Io => ExitCode::IoError,
            ErrorCategory::Computation | ErrorCategory::Server => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}
