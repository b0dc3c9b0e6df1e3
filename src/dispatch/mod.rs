//! Scripted action dispatch.

mod dispatcher;
mod state;

pub use dispatcher::{ActionDispatcher, DEFAULT_TIMEOUT};
pub use state::DispatchState;
