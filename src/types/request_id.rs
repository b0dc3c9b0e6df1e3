//! Identifiers for requests built in-process.
//!
//! Format: `req_01h455vb4pex5vsknk084sn02q`. Requests decoded from the
//! wire keep the sender's `requestid` string as it arrived.

use mti::prelude::*;
use std::fmt;

/// A TypeID minted for a request this crate creates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(MagicTypeId);

impl RequestId {
    /// TypeID prefix of minted request ids.
    pub const PREFIX: &'static str = "req";

    /// Mints a time-sortable (UUIDv7) id.
    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
