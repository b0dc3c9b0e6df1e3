//! Request and reply values exchanged with the host agent manager.
//!
//! These mirror the RPC wire shapes; the transport itself lives elsewhere.

mod reply;
mod request;

pub use reply::{Reply, StatusCode};
pub use request::{Filter, PayloadError, Request, DEFAULT_TTL};
