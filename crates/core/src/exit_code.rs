//! Process exit codes for the blobsync binary.
//!
//! Every way a run can end maps to one of these codes, so scripts can
//! distinguish "nothing to do" from "some files failed" from "could not
//! even start". Batch-level partial failure is [`ExitCode::Partial`];
//! failures that abort before any batch runs map through
//! [`ClientError`](crate::ClientError).

use std::fmt;

/// Exit codes returned by blobsync runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful completion, every requested operation succeeded.
    Ok = 0,

    /// Syntax or usage error.
    ///
    /// Returned for invalid command-line arguments, an unloadable or
    /// invalid project configuration, or a missing signing secret.
    Usage = 1,

    /// Error selecting the publication source.
    ///
    /// Returned when the scan root does not exist, is not a directory,
    /// or cannot be enumerated.
    SourceSelect = 3,

    /// Error talking to the pointer directory.
    ///
    /// Returned when the published-record listing fails, leaving nothing
    /// to diff against.
    Network = 10,

    /// Partial publication.
    ///
    /// The batch ran to completion but some files failed to upload or
    /// some stale records could not be retracted.
    Partial = 23,
}

impl ExitCode {
    /// Returns the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns a short description of this exit code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Usage => "syntax or usage error",
            Self::SourceSelect => "error selecting the publication source",
            Self::Network => "error talking to the pointer directory",
            Self::Partial => "partial publication",
        }
    }

    /// Returns `true` if this represents a successful exit.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Creates an exit code from an i32 value.
    ///
    /// Returns `None` if the value doesn't correspond to a known code.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::Usage),
            3 => Some(Self::SourceSelect),
            10 => Some(Self::Network),
            23 => Some(Self::Partial),
            _ => None,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        // Clamp to u8 range for std::process::ExitCode
        let value = code.as_i32().clamp(0, 255) as u8;
        Self::from(value)
    }
}
