//! Tracing-backed NotificationDispatcher implementation.
//!
//! Actual delivery (push, in-app) belongs to the notification subsystem;
//! this adapter records the dispatch and logs it so operators can follow
//! invitation and control-request traffic.

use async_trait::async_trait;
use fitroom_core::ports::NotificationDispatcher;
use fitroom_core::Result;
use tokio::sync::Mutex;

/// A dispatched notification, kept for inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    CallInvitation {
        user_id: String,
        call_id: String,
        room_id: String,
        host_id: String,
    },
    ControlRequest {
        controller_id: String,
        call_id: String,
        requester_id: String,
    },
}

/// Records notifications and logs them via `tracing`.
#[derive(Default)]
pub struct TracingNotificationDispatcher {
    sent: Mutex<Vec<Notification>>,
}

impl TracingNotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications dispatched so far.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationDispatcher for TracingNotificationDispatcher {
    async fn call_invitation(
        &self,
        user_id: &str,
        call_id: &str,
        room_id: &str,
        host_id: &str,
    ) -> Result<()> {
        tracing::info!(
            "[Notifications] inviting {user_id} to call {call_id} in room {room_id} (host {host_id})"
        );
        self.sent.lock().await.push(Notification::CallInvitation {
            user_id: user_id.to_string(),
            call_id: call_id.to_string(),
            room_id: room_id.to_string(),
            host_id: host_id.to_string(),
        });
        Ok(())
    }

    async fn control_request(
        &self,
        controller_id: &str,
        call_id: &str,
        requester_id: &str,
    ) -> Result<()> {
        tracing::info!(
            "[Notifications] {requester_id} requested control of call {call_id}; notifying {controller_id}"
        );
        self.sent.lock().await.push(Notification::ControlRequest {
            controller_id: controller_id.to_string(),
            call_id: call_id.to_string(),
            requester_id: requester_id.to_string(),
        });
        Ok(())
    }
}
