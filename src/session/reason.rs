//! Stop result codes

use std::fmt;

use crate::error::Error;

/// Why a host output stopped, decoded from its `stop` result code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `0`: clean stop
    Success,
    /// `-1`: malformed server address
    BadPath,
    /// `-2`: could not connect
    ConnectFailed,
    /// `-3`: connection dropped mid-stream
    CommunicationFailed,
    /// `-4`: server refused the stream
    Rejected,
    /// Any other code
    Unknown(i64),
}

impl StopReason {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => StopReason::Success,
            -1 => StopReason::BadPath,
            -2 => StopReason::ConnectFailed,
            -3 => StopReason::CommunicationFailed,
            -4 => StopReason::Rejected,
            other => StopReason::Unknown(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            StopReason::Success => 0,
            StopReason::BadPath => -1,
            StopReason::ConnectFailed => -2,
            StopReason::CommunicationFailed => -3,
            StopReason::Rejected => -4,
            StopReason::Unknown(code) => code,
        }
    }

    pub fn is_failure(self) -> bool {
        self != StopReason::Success
    }

    /// User-facing message; `None` for a clean stop
    pub fn message(self) -> Option<&'static str> {
        match self {
            StopReason::Success => None,
            StopReason::BadPath => Some("Invalid RTMP server address"),
            StopReason::ConnectFailed => Some("Failed to connect to server"),
            StopReason::CommunicationFailed => Some("Lost communication with server"),
            StopReason::Rejected => Some("Stream rejected by server"),
            StopReason::Unknown(_) => Some("Unknown error"),
        }
    }

    /// The failure as an [`Error`], `None` for a clean stop
    pub fn as_error(self) -> Option<Error> {
        self.is_failure().then_some(Error::StreamFailure(self))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Success => f.write_str("stopped"),
            StopReason::Unknown(code) => write!(f, "Unknown error (code {})", code),
            other => f.write_str(other.message().unwrap_or_default()),
        }
    }
}
