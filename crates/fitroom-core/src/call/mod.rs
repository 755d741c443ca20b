//! Call domain module.
//!
//! This module contains the live collaborative shopping session domain:
//! the `Call` aggregate, participant membership, control arbitration, the
//! shared browsing cursor, the cart event log, typed domain events, and the
//! repository interface.
//!
//! # Module Structure
//!
//! - `model`: the `Call` aggregate and its value types
//! - `participants`: join/leave/status and host handover
//! - `control`: control request/approve/deny arbitration
//! - `browsing`: shared browsing cursor synchronization
//! - `cart`: cart event log and wardrobe bookkeeping
//! - `event`: typed domain events (`CallEvent`)
//! - `repository`: repository trait for call persistence

mod browsing;
mod cart;
mod control;
mod event;
mod model;
mod participants;
mod repository;

// Re-export public API
pub use browsing::{
    BrowseSnapshot, BrowseUpdate, BrowsingState, SortBy, SortOrder, CART_LOG_RETAINED,
    HISTORY_RETAINED,
};
pub use cart::{CartUpdate, WardrobeChange};
pub use event::{CallEvent, CartAction, EndReason};
pub use model::{
    Call, CallDuration, CallStatus, ControlRequest, Controller, Participant, ParticipantRole,
    RequestStatus, DEFAULT_MAX_DURATION_MINUTES, DEFAULT_MIN_DURATION_MINUTES, MAX_PARTICIPANTS,
};
pub use participants::LeaveOutcome;
pub use repository::CallRepository;
