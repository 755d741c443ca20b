//! Participant membership: join, leave, status, and host handover.

use chrono::Utc;

use super::model::{Call, Controller, Participant, ParticipantRole, MAX_PARTICIPANTS};
use super::event::CallEvent;
use crate::error::{FitroomError, Result};

/// What happened when a participant left.
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    /// `ParticipantLeft`, plus `ControlChanged` when control moved.
    pub events: Vec<CallEvent>,
    /// True when no active participants remain; the lifecycle layer must end
    /// the call.
    pub emptied: bool,
}

impl Call {
    /// Adds `user_id` as an active member.
    ///
    /// A user who previously left re-activates their existing record instead
    /// of appearing twice.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the call has ended, is full, or the user is already an
    ///   active participant
    pub fn join(&mut self, user_id: &str) -> Result<CallEvent> {
        self.ensure_call_active()?;

        if self.is_active_participant(user_id) {
            return Err(FitroomError::conflict(format!(
                "user '{user_id}' has already joined this call"
            )));
        }
        if self.active_participant_count() >= MAX_PARTICIPANTS {
            return Err(FitroomError::conflict(format!(
                "call is full ({MAX_PARTICIPANTS} participants)"
            )));
        }

        let now = Utc::now();
        match self.participant_mut(user_id) {
            Some(participant) => {
                participant.is_active = true;
                participant.left_at = None;
                participant.joined_at = now;
                participant.role = ParticipantRole::Member;
            }
            None => {
                self.participants.push(Participant {
                    user_id: user_id.to_string(),
                    role: ParticipantRole::Member,
                    joined_at: now,
                    left_at: None,
                    is_active: true,
                    is_muted: false,
                    is_speaking: false,
                });
            }
        }

        Ok(CallEvent::ParticipantJoined {
            call_id: self.id.clone(),
            user_id: user_id.to_string(),
            participant_count: self.active_participant_count(),
            joined_at: now,
        })
    }

    /// Removes `user_id` from the active participants.
    ///
    /// When the host leaves and other active participants remain, the host
    /// role transfers to the first remaining active participant in join
    /// order. Control follows the departing user to the (possibly new) host
    /// whenever the departing user held it, keeping the controller an active
    /// participant at all times.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the call has ended
    /// - `Forbidden` if `user_id` is not an active participant
    pub fn leave(&mut self, user_id: &str) -> Result<LeaveOutcome> {
        self.ensure_call_active()?;
        self.ensure_active_participant(user_id)?;

        let now = Utc::now();
        let was_controller = self.is_controller(user_id);
        let was_host = self.is_host(user_id);

        {
            let participant = self
                .participant_mut(user_id)
                .ok_or_else(|| FitroomError::internal("participant vanished during leave"))?;
            participant.is_active = false;
            participant.is_speaking = false;
            participant.left_at = Some(now);
            if was_host {
                participant.role = ParticipantRole::Member;
            }
        }

        let next_host = self
            .participants
            .iter()
            .find(|p| p.is_active)
            .map(|p| p.user_id.clone());

        let mut events = Vec::new();
        let mut new_host_id = None;

        match next_host {
            Some(successor) => {
                if was_host {
                    self.host_id = successor.clone();
                    if let Some(p) = self.participant_mut(&successor) {
                        p.role = ParticipantRole::Host;
                    }
                    new_host_id = Some(successor.clone());
                }
                if was_controller {
                    let previous = self.current_controller.user_id.clone();
                    self.current_controller = Controller::assign(self.host_id.clone());
                    events.push(CallEvent::ControlChanged {
                        call_id: self.id.clone(),
                        new_controller_id: self.host_id.clone(),
                        previous_controller_id: previous,
                        changed_at: now,
                    });
                }
            }
            None => {
                // Nobody left; the lifecycle layer ends the call.
            }
        }

        let emptied = self.active_participant_count() == 0;
        events.insert(
            0,
            CallEvent::ParticipantLeft {
                call_id: self.id.clone(),
                user_id: user_id.to_string(),
                new_host_id,
                participant_count: self.active_participant_count(),
                left_at: now,
            },
        );

        Ok(LeaveOutcome { events, emptied })
    }

    /// Updates a participant's own mute/speaking flags.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the call has ended
    /// - `Forbidden` if `user_id` is not an active participant
    pub fn update_participant_status(
        &mut self,
        user_id: &str,
        is_muted: Option<bool>,
        is_speaking: Option<bool>,
    ) -> Result<CallEvent> {
        self.ensure_call_active()?;
        self.ensure_active_participant(user_id)?;

        let call_id = self.id.clone();
        let participant = self
            .participant_mut(user_id)
            .ok_or_else(|| FitroomError::internal("participant vanished during status update"))?;
        if let Some(is_muted) = is_muted {
            participant.is_muted = is_muted;
        }
        if let Some(is_speaking) = is_speaking {
            participant.is_speaking = is_speaking;
        }

        Ok(CallEvent::ParticipantStatusUpdated {
            call_id,
            user_id: user_id.to_string(),
            is_muted: participant.is_muted,
            is_speaking: participant.is_speaking,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::EndReason;

    #[test]
    fn test_join_until_full() {
        let mut call = Call::new("room-1", "hanna", 30);
        for user in ["amir", "bea", "chen", "dara"] {
            call.join(user).unwrap();
        }
        assert_eq!(call.active_participant_count(), MAX_PARTICIPANTS);

        let err = call.join("eli").unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(call.active_participant_count(), MAX_PARTICIPANTS);
    }

    #[test]
    fn test_double_join_conflicts() {
        let mut call = Call::new("room-1", "hanna", 30);
        call.join("amir").unwrap();
        assert!(call.join("amir").unwrap_err().is_conflict());
    }

    #[test]
    fn test_rejoin_reactivates_existing_record() {
        let mut call = Call::new("room-1", "hanna", 30);
        call.join("amir").unwrap();
        call.leave("amir").unwrap();
        call.join("amir").unwrap();

        assert_eq!(call.participants.len(), 2);
        let amir = call.participant("amir").unwrap();
        assert!(amir.is_active);
        assert!(amir.left_at.is_none());
    }

    #[test]
    fn test_host_handover_is_deterministic() {
        let mut call = Call::new("room-1", "hanna", 30);
        call.join("amir").unwrap();
        call.join("bea").unwrap();

        let outcome = call.leave("hanna").unwrap();
        assert!(!outcome.emptied);
        assert_eq!(call.host_id, "amir");
        assert_eq!(
            call.participant("amir").unwrap().role,
            ParticipantRole::Host
        );
        // Control followed the departing host controller.
        assert_eq!(call.current_controller.user_id, "amir");
        assert!(matches!(
            outcome.events[0],
            CallEvent::ParticipantLeft {
                new_host_id: Some(ref h),
                ..
            } if h == "amir"
        ));
    }

    #[test]
    fn test_host_leave_keeps_foreign_controller() {
        let mut call = Call::new("room-1", "hanna", 30);
        call.join("amir").unwrap();
        call.join("bea").unwrap();
        call.request_control("bea", "my turn").unwrap();
        call.approve_control("bea", "hanna").unwrap();

        let outcome = call.leave("hanna").unwrap();
        assert_eq!(call.host_id, "amir");
        // Controller was bea, not the departing host, so it stays.
        assert_eq!(call.current_controller.user_id, "bea");
        assert_eq!(outcome.events.len(), 1);
    }

    #[test]
    fn test_controller_leave_hands_control_to_host() {
        let mut call = Call::new("room-1", "hanna", 30);
        call.join("amir").unwrap();
        call.request_control("amir", "").unwrap();
        call.approve_control("amir", "hanna").unwrap();

        call.leave("amir").unwrap();
        assert_eq!(call.current_controller.user_id, "hanna");
        let controller = call.current_controller.user_id.clone();
        assert!(call.is_active_participant(&controller));
    }

    #[test]
    fn test_last_leave_reports_emptied() {
        let mut call = Call::new("room-1", "hanna", 30);
        let outcome = call.leave("hanna").unwrap();
        assert!(outcome.emptied);
        // The domain leaves the call active; ending is the lifecycle
        // layer's call.
        assert!(call.is_active());
        call.end(EndReason::Emptied).unwrap();
    }

    #[test]
    fn test_status_update_merges_flags() {
        let mut call = Call::new("room-1", "hanna", 30);
        call.update_participant_status("hanna", Some(true), None)
            .unwrap();
        let event = call
            .update_participant_status("hanna", None, Some(true))
            .unwrap();
        assert!(matches!(
            event,
            CallEvent::ParticipantStatusUpdated {
                is_muted: true,
                is_speaking: true,
                ..
            }
        ));
    }

    #[test]
    fn test_status_update_rejects_non_participant() {
        let mut call = Call::new("room-1", "hanna", 30);
        let err = call
            .update_participant_status("stranger", Some(true), None)
            .unwrap_err();
        assert!(err.is_forbidden());
    }
}
