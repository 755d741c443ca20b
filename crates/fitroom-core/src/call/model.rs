//! Call domain model.
//!
//! A `Call` is one live, time-bounded, collaborative shopping session tied to
//! a room: its participants, the single browsing controller, queued control
//! requests, the shared browsing cursor, the cart event log, and the shared
//! wardrobe items. This is the pure domain model that the arbitration and
//! synchronization logic operates on, independent of storage or transport.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::browsing::BrowsingState;
use super::event::{CallEvent, EndReason};
use crate::error::{FitroomError, Result};

/// Maximum number of simultaneously active participants in a call.
pub const MAX_PARTICIPANTS: usize = 5;

/// Default call duration cap, in minutes.
pub const DEFAULT_MAX_DURATION_MINUTES: i64 = 30;

/// Minimum call duration, in minutes.
pub const DEFAULT_MIN_DURATION_MINUTES: i64 = 1;

/// Lifecycle status of a call. `Ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Active,
    Ended,
}

/// Role of a participant within a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Host,
    Member,
}

/// One user's membership record in a call.
///
/// Records are unique by `user_id` for the lifetime of the call; a user who
/// leaves and rejoins re-activates their existing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: String,
    pub role: ParticipantRole,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_muted: bool,
    pub is_speaking: bool,
}

impl Participant {
    fn new(user_id: impl Into<String>, role: ParticipantRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            joined_at: Utc::now(),
            left_at: None,
            is_active: true,
            is_muted: false,
            is_speaking: false,
        }
    }
}

/// The participant currently driving the shared browsing cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Controller {
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Controller {
    pub(crate) fn assign(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            started_at: Utc::now(),
            expires_at: None,
        }
    }
}

/// Resolution status of a control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
}

/// A participant's ask to become the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlRequest {
    pub user_id: String,
    pub message: String,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Wall-clock bounds of a call.
///
/// `max_duration_minutes` drives the auto-expiry task scheduled by the
/// lifecycle layer when the call starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDuration {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub max_duration_minutes: i64,
    pub min_duration_minutes: i64,
}

impl CallDuration {
    /// The instant at which the call must be force-ended if still active.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(self.max_duration_minutes)
    }
}

/// A live collaborative shopping session.
///
/// At most one `Active` call exists per room at a time; that invariant is
/// enforced by the lifecycle layer when starting a call, under its
/// serialization boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    /// Unique call identifier (UUID format)
    pub id: String,
    /// The room this call belongs to
    pub room_id: String,
    /// Current host. Hands over deterministically when the host leaves.
    pub host_id: String,
    pub status: CallStatus,
    /// Membership records, unique by `user_id`, in first-join order.
    pub participants: Vec<Participant>,
    pub current_controller: Controller,
    pub control_requests: Vec<ControlRequest>,
    /// The synchronized browsing cursor shared by all participants.
    pub session_data: BrowsingState,
    /// Product ids shared into the session wardrobe, deduplicated.
    pub wardrobe_items: Vec<String>,
    pub duration: CallDuration,
    /// Monotonic persistence version; the repository rejects stale saves.
    #[serde(default)]
    pub version: u64,
}

impl Call {
    /// Creates a new active call with the host as sole participant and
    /// initial controller.
    pub fn new(
        room_id: impl Into<String>,
        host_id: impl Into<String>,
        max_duration_minutes: i64,
    ) -> Self {
        let host_id = host_id.into();
        Self {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.into(),
            host_id: host_id.clone(),
            status: CallStatus::Active,
            participants: vec![Participant::new(host_id.clone(), ParticipantRole::Host)],
            current_controller: Controller::assign(host_id),
            control_requests: Vec::new(),
            session_data: BrowsingState::default(),
            wardrobe_items: Vec::new(),
            duration: CallDuration {
                start_time: Utc::now(),
                end_time: None,
                max_duration_minutes,
                min_duration_minutes: DEFAULT_MIN_DURATION_MINUTES,
            },
            version: 0,
        }
    }

    /// Returns whether the call is still active.
    pub fn is_active(&self) -> bool {
        self.status == CallStatus::Active
    }

    /// Looks up a participant record by user id.
    pub fn participant(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    pub(crate) fn participant_mut(&mut self, user_id: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.user_id == user_id)
    }

    /// Active participants, in first-join order.
    pub fn active_participants(&self) -> Vec<&Participant> {
        self.participants.iter().filter(|p| p.is_active).collect()
    }

    /// Number of active participants.
    pub fn active_participant_count(&self) -> usize {
        self.participants.iter().filter(|p| p.is_active).count()
    }

    /// Returns whether `user_id` is an active participant.
    pub fn is_active_participant(&self, user_id: &str) -> bool {
        self.participant(user_id).is_some_and(|p| p.is_active)
    }

    /// Returns whether `user_id` is the current host.
    pub fn is_host(&self, user_id: &str) -> bool {
        self.host_id == user_id
    }

    /// Returns whether `user_id` currently holds control.
    pub fn is_controller(&self, user_id: &str) -> bool {
        self.current_controller.user_id == user_id
    }

    /// Pending control requests, in request order.
    pub fn pending_requests(&self) -> Vec<&ControlRequest> {
        self.control_requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .collect()
    }

    /// Fails with `Conflict` when the call has already ended.
    pub(crate) fn ensure_call_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(FitroomError::conflict("call has already ended"))
        }
    }

    /// Fails with `Forbidden` when `user_id` is not an active participant.
    pub(crate) fn ensure_active_participant(&self, user_id: &str) -> Result<()> {
        if self.is_active_participant(user_id) {
            Ok(())
        } else {
            Err(FitroomError::forbidden(format!(
                "user '{user_id}' is not an active participant of this call"
            )))
        }
    }

    /// Fails with `Forbidden` when `user_id` has never been a participant of
    /// this call. Read APIs use this so that past participants can still
    /// reconcile after a call ends.
    pub fn ensure_participant_read(&self, user_id: &str) -> Result<()> {
        if self.participant(user_id).is_some() {
            Ok(())
        } else {
            Err(FitroomError::forbidden(format!(
                "user '{user_id}' is not a participant of this call"
            )))
        }
    }

    /// Ends the call.
    ///
    /// Idempotent: ending an already-ended call returns `None` instead of an
    /// error so that racing end triggers (explicit end, emptied room, expiry)
    /// tolerate each other.
    pub fn end(&mut self, reason: EndReason) -> Option<CallEvent> {
        if !self.is_active() {
            return None;
        }
        let now = Utc::now();
        self.status = CallStatus::Ended;
        self.duration.end_time = Some(now);
        for participant in self.participants.iter_mut().filter(|p| p.is_active) {
            participant.is_active = false;
            participant.is_speaking = false;
            participant.left_at = Some(now);
        }
        Some(CallEvent::CallEnded {
            call_id: self.id.clone(),
            reason,
            ended_at: now,
        })
    }
}
