//! Exit codes for the ticketdash CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.

/// Exit codes for ticketdash commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command completed
    Clean = 0,

    /// Settings or config file error
    ConfigError = 10,

    /// The export could not be read or parsed
    LoadError = 11,

    /// I/O error (bind, stdout)
    IoError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }

    /// Check if this exit code indicates an error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Map a crate error onto its exit code.
    pub fn for_error(err: &td_common::Error) -> Self {
        use td_common::Error;
        match err {
            Error::Config(_) | Error::InvalidSettings { .. } => ExitCode::ConfigError,
            Error::NoColumns | Error::FormatUndetected { .. } | Error::DataFileMissing { .. } => {
                ExitCode::LoadError
            }
            Error::Bind { .. } | Error::Io(_) => ExitCode::IoError,
            Error::Json(_) => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}
