//! Outbound command dispatch
//!
//! - [`wait::bounded_wait`] - polling primitive with an injectable delay
//! - [`CommandDispatcher`] - mailbox + strobe handshake with the host

pub mod dispatcher;
pub mod wait;

pub use dispatcher::{CommandDispatcher, DispatchError, DispatchTiming};
pub use wait::{bounded_wait, WaitTimeout};
