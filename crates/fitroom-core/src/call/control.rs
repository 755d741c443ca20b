//! Control arbitration: exactly one participant drives the shared browsing
//! cursor at a time; everyone else may ask for the wheel.

use chrono::Utc;

use super::event::CallEvent;
use super::model::{Call, Controller, ControlRequest, RequestStatus};
use crate::error::{FitroomError, Result};

impl Call {
    /// Queues a pending control request from an active participant.
    ///
    /// Returns immediately; notifying the current controller is the
    /// lifecycle layer's job and is fire-and-forget.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the call has ended, or the user already has a pending
    ///   request
    /// - `Forbidden` if `user_id` is not an active participant
    pub fn request_control(&mut self, user_id: &str, message: &str) -> Result<CallEvent> {
        self.ensure_call_active()?;
        self.ensure_active_participant(user_id)?;

        if self
            .pending_requests()
            .iter()
            .any(|r| r.user_id == user_id)
        {
            return Err(FitroomError::conflict(format!(
                "user '{user_id}' already has a pending control request"
            )));
        }

        let now = Utc::now();
        self.control_requests.push(ControlRequest {
            user_id: user_id.to_string(),
            message: message.to_string(),
            status: RequestStatus::Pending,
            requested_at: now,
            resolved_at: None,
        });

        Ok(CallEvent::ControlRequested {
            call_id: self.id.clone(),
            requester_id: user_id.to_string(),
            controller_id: self.current_controller.user_id.clone(),
            message: message.to_string(),
            requested_at: now,
        })
    }

    /// Approves a pending control request and hands control to the
    /// requester.
    ///
    /// All of the requester's pending requests are resolved at once; other
    /// requesters' entries stay pending for the new controller to resolve.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the call has ended or the requester is no longer an
    ///   active participant
    /// - `Forbidden` unless `approver_id` is the current controller
    /// - `NotFound` if the requester has no pending request
    pub fn approve_control(&mut self, requester_id: &str, approver_id: &str) -> Result<CallEvent> {
        self.ensure_call_active()?;
        self.ensure_current_controller(approver_id)?;
        if !self.is_active_participant(requester_id) {
            return Err(FitroomError::conflict(format!(
                "user '{requester_id}' is no longer an active participant"
            )));
        }

        let resolved = self.resolve_requests(requester_id, RequestStatus::Approved);
        if resolved == 0 {
            return Err(FitroomError::not_found(
                "control request",
                requester_id.to_string(),
            ));
        }

        let previous = self.current_controller.user_id.clone();
        self.current_controller = Controller::assign(requester_id);

        Ok(CallEvent::ControlChanged {
            call_id: self.id.clone(),
            new_controller_id: requester_id.to_string(),
            previous_controller_id: previous,
            changed_at: self.current_controller.started_at,
        })
    }

    /// Denies a pending control request; control does not move.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the call has ended
    /// - `Forbidden` unless `approver_id` is the current controller
    /// - `NotFound` if the requester has no pending request
    pub fn deny_control(&mut self, requester_id: &str, approver_id: &str) -> Result<CallEvent> {
        self.ensure_call_active()?;
        self.ensure_current_controller(approver_id)?;

        let resolved = self.resolve_requests(requester_id, RequestStatus::Denied);
        if resolved == 0 {
            return Err(FitroomError::not_found(
                "control request",
                requester_id.to_string(),
            ));
        }

        Ok(CallEvent::ControlDenied {
            call_id: self.id.clone(),
            requester_id: requester_id.to_string(),
            denied_at: Utc::now(),
        })
    }

    fn ensure_current_controller(&self, user_id: &str) -> Result<()> {
        if self.is_controller(user_id) {
            Ok(())
        } else {
            Err(FitroomError::forbidden(format!(
                "user '{user_id}' is not the current controller"
            )))
        }
    }

    /// Marks all of `user_id`'s pending requests with `status`, returning
    /// how many were resolved.
    fn resolve_requests(&mut self, user_id: &str, status: RequestStatus) -> usize {
        let now = Utc::now();
        let mut resolved = 0;
        for request in self
            .control_requests
            .iter_mut()
            .filter(|r| r.user_id == user_id && r.status == RequestStatus::Pending)
        {
            request.status = status;
            request.resolved_at = Some(now);
            resolved += 1;
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_with_members() -> Call {
        let mut call = Call::new("room-1", "hanna", 30);
        call.join("amir").unwrap();
        call.join("bea").unwrap();
        call
    }

    #[test]
    fn test_request_then_approve_hands_over_control() {
        let mut call = call_with_members();
        call.request_control("amir", "let me drive").unwrap();

        let event = call.approve_control("amir", "hanna").unwrap();
        assert_eq!(call.current_controller.user_id, "amir");
        assert!(matches!(
            event,
            CallEvent::ControlChanged {
                ref new_controller_id,
                ref previous_controller_id,
                ..
            } if new_controller_id == "amir" && previous_controller_id == "hanna"
        ));
        assert_eq!(
            call.control_requests[0].status,
            RequestStatus::Approved
        );
        assert!(call.control_requests[0].resolved_at.is_some());
    }

    #[test]
    fn test_only_controller_can_resolve() {
        let mut call = call_with_members();
        call.request_control("amir", "").unwrap();

        assert!(call.approve_control("amir", "bea").unwrap_err().is_forbidden());
        assert!(call.deny_control("amir", "amir").unwrap_err().is_forbidden());
    }

    #[test]
    fn test_deny_keeps_controller() {
        let mut call = call_with_members();
        call.request_control("amir", "").unwrap();

        let event = call.deny_control("amir", "hanna").unwrap();
        assert_eq!(call.current_controller.user_id, "hanna");
        assert!(matches!(event, CallEvent::ControlDenied { .. }));
        assert_eq!(call.control_requests[0].status, RequestStatus::Denied);
    }

    #[test]
    fn test_resolving_absent_request_is_not_found() {
        let mut call = call_with_members();
        assert!(call.approve_control("amir", "hanna").unwrap_err().is_not_found());
        assert!(call.deny_control("amir", "hanna").unwrap_err().is_not_found());
    }

    #[test]
    fn test_other_requesters_stay_pending() {
        let mut call = call_with_members();
        call.request_control("amir", "").unwrap();
        call.request_control("bea", "").unwrap();

        call.approve_control("amir", "hanna").unwrap();
        let pending = call.pending_requests();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].user_id, "bea");

        // The new controller resolves the remaining request.
        call.deny_control("bea", "amir").unwrap();
        assert!(call.pending_requests().is_empty());
    }

    #[test]
    fn test_duplicate_pending_request_conflicts() {
        let mut call = call_with_members();
        call.request_control("amir", "first").unwrap();
        assert!(call.request_control("amir", "second").unwrap_err().is_conflict());
    }

    #[test]
    fn test_request_resolves_exactly_once() {
        let mut call = call_with_members();
        call.request_control("amir", "").unwrap();
        call.approve_control("amir", "hanna").unwrap();

        // The approved entry cannot be re-resolved.
        assert!(call.deny_control("amir", "amir").unwrap_err().is_not_found());
        assert_eq!(call.control_requests.len(), 1);
        assert_eq!(call.control_requests[0].status, RequestStatus::Approved);
    }
}
