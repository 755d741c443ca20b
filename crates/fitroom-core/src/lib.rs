//! Fitroom core domain.
//!
//! Pure domain model for live collaborative shopping sessions ("calls"):
//! participants, control arbitration, synchronized browsing state, cart
//! events, and the port traits that connect the core to the rest of the
//! platform. All I/O lives behind the traits in [`ports`] and
//! [`call::CallRepository`]; the domain itself only mutates state and
//! returns typed events.

pub mod call;
pub mod error;
pub mod ports;

// Re-export common error type
pub use error::{FitroomError, Result};
