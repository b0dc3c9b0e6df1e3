//! Outbound RPC reply and status codes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Status of an action reply.
///
/// Serialized as its numeric code on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum StatusCode {
    /// The action completed
    #[default]
    Ok,
    /// The action was aborted
    Aborted,
    /// The agent or action is not known
    UnknownAction,
    /// Required input was missing
    MissingData,
    /// Input failed validation
    InvalidData,
    /// Any other failure
    UnknownError,
}

impl StatusCode {
    /// Returns the numeric wire code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Aborted => 1,
            Self::UnknownAction => 2,
            Self::MissingData => 3,
            Self::InvalidData => 4,
            Self::UnknownError => 5,
        }
    }
}

impl From<StatusCode> for u8 {
    fn from(code: StatusCode) -> Self {
        code.code()
    }
}

impl TryFrom<u8> for StatusCode {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Ok),
            1 => Ok(Self::Aborted),
            2 => Ok(Self::UnknownAction),
            3 => Ok(Self::MissingData),
            4 => Ok(Self::InvalidData),
            5 => Ok(Self::UnknownError),
            other => Err(format!("unknown status code {other}")),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Ok => "OK",
            Self::Aborted => "Aborted",
            Self::UnknownAction => "Unknown Action",
            Self::MissingData => "Missing Data",
            Self::InvalidData => "Invalid Data",
            Self::UnknownError => "Unknown Error",
        };
        f.write_str(text)
    }
}

/// The reply produced for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Outcome of the action
    #[serde(rename = "statuscode")]
    pub status_code: StatusCode,
    /// Human readable status
    #[serde(rename = "statusmsg")]
    pub status_message: String,
    /// Output fields
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Reply {
    /// Creates a successful reply carrying `data`.
    #[must_use]
    pub fn ok(data: Map<String, Value>) -> Self {
        Self {
            status_code: StatusCode::Ok,
            status_message: StatusCode::Ok.to_string(),
            data,
        }
    }

    /// Creates a reply with the given status, message and no data.
    #[must_use]
    pub fn with_status(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code,
            status_message: message.into(),
            data: Map::new(),
        }
    }

    /// Creates an aborted reply.
    #[must_use]
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::Aborted, message)
    }

    /// Creates an unknown action reply.
    #[must_use]
    pub fn unknown_action(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::UnknownAction, message)
    }

    /// Returns true if the action completed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status_code == StatusCode::Ok
    }
}

impl Default for Reply {
    fn default() -> Self {
        Self::ok(Map::new())
    }
}
