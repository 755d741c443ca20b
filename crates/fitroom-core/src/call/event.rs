//! Typed domain events emitted by call operations.
//!
//! Every mutation of a call produces one or more `CallEvent`s. The lifecycle
//! layer publishes them to the realtime transport only after the state change
//! has been committed, so subscribers never observe an event for a state a
//! subsequent query cannot return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::browsing::{SortBy, SortOrder};
use crate::ports::Product;

/// Why a call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The host ended the call explicitly.
    HostEnded,
    /// The call ran past its maximum duration.
    Expired,
    /// The last active participant left.
    Emptied,
}

/// Cart actions a participant can take during a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartAction {
    Added,
    Removed,
}

/// Events produced by call operations, serialized for realtime fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallEvent {
    CallStarted {
        call_id: String,
        room_id: String,
        host_id: String,
        started_at: DateTime<Utc>,
    },
    ParticipantJoined {
        call_id: String,
        user_id: String,
        participant_count: usize,
        joined_at: DateTime<Utc>,
    },
    ParticipantLeft {
        call_id: String,
        user_id: String,
        /// Present when the departure transferred the host role.
        new_host_id: Option<String>,
        participant_count: usize,
        left_at: DateTime<Utc>,
    },
    ParticipantStatusUpdated {
        call_id: String,
        user_id: String,
        is_muted: bool,
        is_speaking: bool,
    },
    ControlRequested {
        call_id: String,
        requester_id: String,
        /// Controller at the time of the request, to be notified.
        controller_id: String,
        message: String,
        requested_at: DateTime<Utc>,
    },
    ControlChanged {
        call_id: String,
        new_controller_id: String,
        previous_controller_id: String,
        changed_at: DateTime<Utc>,
    },
    ControlDenied {
        call_id: String,
        requester_id: String,
        denied_at: DateTime<Utc>,
    },
    BrowseUpdated {
        call_id: String,
        user_id: String,
        current_product_id: Option<String>,
        search_query: String,
        sort_by: SortBy,
        sort_order: SortOrder,
        page: u32,
        total_pages: u32,
        total_products: u64,
        scroll_position: f64,
        updated_at: DateTime<Utc>,
    },
    CartUpdated {
        call_id: String,
        user_id: String,
        action: CartAction,
        /// Enriched from the product catalog for display.
        product: Product,
        updated_at: DateTime<Utc>,
    },
    WardrobeItemAdded {
        call_id: String,
        user_id: String,
        product_id: String,
    },
    WardrobeItemRemoved {
        call_id: String,
        user_id: String,
        product_id: String,
    },
    CallEnded {
        call_id: String,
        reason: EndReason,
        ended_at: DateTime<Utc>,
    },
}

impl CallEvent {
    /// The realtime topic this event is broadcast under.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CallStarted { .. } => "call-started",
            Self::ParticipantJoined { .. } => "user-joined-call",
            Self::ParticipantLeft { .. } => "user-left-call",
            Self::ParticipantStatusUpdated { .. } => "participant-status-updated",
            Self::ControlRequested { .. } => "call:control-requested",
            Self::ControlChanged { .. } => "call:control-changed",
            Self::ControlDenied { .. } => "call:control-denied",
            Self::BrowseUpdated { .. } => "call:browse-update",
            Self::CartUpdated { .. } => "call:cart-update",
            Self::WardrobeItemAdded { .. } => "wardrobe-item-added",
            Self::WardrobeItemRemoved { .. } => "wardrobe-item-removed",
            Self::CallEnded { .. } => "call-ended",
        }
    }

    /// A second topic the event is also broadcast under, if any.
    ///
    /// Older clients subscribe to `call:participant-joined` for joins, so the
    /// transport emits both names for the same event.
    pub fn alias(&self) -> Option<&'static str> {
        match self {
            Self::ParticipantJoined { .. } => Some("call:participant-joined"),
            _ => None,
        }
    }
}
