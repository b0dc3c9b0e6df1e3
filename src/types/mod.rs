//! Core type definitions.
//!
//! - `RequestId`: TypeID identifiers for requests minted in-process
//! - `validate_name`: agent and action name rules

mod name;
mod request_id;

pub use name::{validate_name, InvalidName, MAX_NAME_LEN};
pub use request_id::RequestId;
