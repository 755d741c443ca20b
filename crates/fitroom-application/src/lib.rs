//! Fitroom application layer.
//!
//! Orchestrates the call domain against its collaborators: per-call
//! serialization, persistence, realtime event publication, notifications,
//! and auto-expiry scheduling.

mod call_usecase;
mod expiry;
mod locks;

pub use call_usecase::CallUseCase;
pub use expiry::ExpiryScheduler;
pub use locks::CallLocks;
