//! Call lifecycle use case.
//!
//! `CallUseCase` orchestrates the live session domain against its
//! collaborators: it serializes mutations per call, persists through the
//! repository, publishes committed domain events to the realtime transport,
//! schedules/cancels auto-expiry, and enriches cart events from the product
//! catalog.
//!
//! # Ordering
//!
//! Events are published only after the repository save succeeds, so a
//! subscriber that reacts to an event and immediately queries the call state
//! observes the mutation (read-after-write). A persistence failure aborts the
//! operation before anything is broadcast.

use std::sync::{Arc, Weak};

use fitroom_core::call::{
    BrowseUpdate, BrowsingState, Call, CallEvent, CallRepository, CartAction, EndReason,
    WardrobeChange, DEFAULT_MAX_DURATION_MINUTES,
};
use fitroom_core::ports::{
    EventPublisher, NotificationDispatcher, Product, ProductCatalog, RoomDirectory, WardrobeStore,
};
use fitroom_core::{FitroomError, Result};

use crate::expiry::ExpiryScheduler;
use crate::locks::CallLocks;

/// Use case for managing live collaborative shopping calls.
///
/// # Thread Safety
///
/// All collaborators are injected as `Arc<dyn Trait>`; per-call mutual
/// exclusion is provided by [`CallLocks`], so the use case itself can be
/// shared freely across request handlers.
pub struct CallUseCase {
    /// Repository for call persistence
    repository: Arc<dyn CallRepository>,
    /// Room membership lookups
    rooms: Arc<dyn RoomDirectory>,
    /// Invitation and control-request notifications (fire-and-forget)
    notifications: Arc<dyn NotificationDispatcher>,
    /// Read-only product lookups for cart event enrichment
    catalog: Arc<dyn ProductCatalog>,
    /// Persistent sink for shared wardrobe items
    wardrobe: Arc<dyn WardrobeStore>,
    /// Realtime event fan-out
    publisher: Arc<dyn EventPublisher>,
    /// Per-call serialization boundary
    locks: CallLocks,
    /// Auto-expiry tasks, one per active call
    expiry: ExpiryScheduler,
    /// Maximum call duration applied to new calls
    max_duration_minutes: i64,
}

impl CallUseCase {
    pub fn new(
        repository: Arc<dyn CallRepository>,
        rooms: Arc<dyn RoomDirectory>,
        notifications: Arc<dyn NotificationDispatcher>,
        catalog: Arc<dyn ProductCatalog>,
        wardrobe: Arc<dyn WardrobeStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            rooms,
            notifications,
            catalog,
            wardrobe,
            publisher,
            locks: CallLocks::new(),
            expiry: ExpiryScheduler::new(),
            max_duration_minutes: DEFAULT_MAX_DURATION_MINUTES,
        }
    }

    /// Overrides the maximum call duration (minutes) applied to new calls.
    pub fn with_max_duration(mut self, minutes: i64) -> Self {
        self.max_duration_minutes = minutes;
        self
    }

    /// Starts a new call in a room with `host_id` as host and initial
    /// controller, and schedules its expiry task.
    ///
    /// Other room members receive a call invitation, fire-and-forget.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the host is not a room member
    /// - `Conflict` if the room already has an active call
    pub async fn start_call(self: &Arc<Self>, room_id: &str, host_id: &str) -> Result<Call> {
        if !self.rooms.is_member(room_id, host_id).await? {
            return Err(FitroomError::forbidden(format!(
                "user '{host_id}' is not a member of room '{room_id}'"
            )));
        }

        // Starting is serialized per room so two racing starts cannot both
        // pass the single-active-call check.
        let _guard = self.locks.acquire(&format!("room:{room_id}")).await;

        if self.repository.find_active_by_room(room_id).await?.is_some() {
            return Err(FitroomError::conflict(format!(
                "room '{room_id}' already has an active call"
            )));
        }

        let mut call = Call::new(room_id, host_id, self.max_duration_minutes);
        self.repository.save(&mut call).await?;
        tracing::info!(
            "[CallUseCase] call {} started in room {} by {}",
            call.id,
            room_id,
            host_id
        );

        self.publish(
            &call,
            &CallEvent::CallStarted {
                call_id: call.id.clone(),
                room_id: call.room_id.clone(),
                host_id: call.host_id.clone(),
                started_at: call.duration.start_time,
            },
        )
        .await;

        let weak: Weak<Self> = Arc::downgrade(self);
        self.expiry
            .schedule(call.id.clone(), call.duration.deadline(), move |call_id| {
                let weak = weak.clone();
                async move {
                    match weak.upgrade() {
                        Some(usecase) => usecase.expire_call(&call_id).await,
                        None => Ok(()),
                    }
                }
            })
            .await;

        self.send_invitations(&call).await;
        Ok(call)
    }

    /// Adds a user to an active call.
    pub async fn join_call(&self, call_id: &str, user_id: &str) -> Result<Call> {
        let _guard = self.locks.acquire(call_id).await;
        let mut call = self.load(call_id).await?;

        if !self.rooms.is_member(&call.room_id, user_id).await? {
            return Err(FitroomError::forbidden(format!(
                "user '{user_id}' is not a member of room '{}'",
                call.room_id
            )));
        }

        let event = call.join(user_id)?;
        self.repository.save(&mut call).await?;
        self.publish(&call, &event).await;
        Ok(call)
    }

    /// Removes a user from a call; ends the call when it empties.
    pub async fn leave_call(&self, call_id: &str, user_id: &str) -> Result<Call> {
        let guard = self.locks.acquire(call_id).await;
        let mut call = self.load(call_id).await?;

        let mut outcome = call.leave(user_id)?;
        if outcome.emptied {
            if let Some(end_event) = call.end(EndReason::Emptied) {
                outcome.events.push(end_event);
            }
            self.expiry.cancel(call_id).await;
        }

        self.repository.save(&mut call).await?;
        for event in &outcome.events {
            self.publish(&call, event).await;
        }
        if outcome.emptied {
            // Our own guard must go first or the entry looks in use.
            drop(guard);
            self.locks.remove(call_id).await;
        }
        Ok(call)
    }

    /// Ends a call explicitly. Only the host may do this.
    ///
    /// Idempotent: ending an already-ended call returns the terminal state
    /// without raising.
    pub async fn end_call(&self, call_id: &str, user_id: &str) -> Result<Call> {
        let guard = self.locks.acquire(call_id).await;
        let mut call = self.load(call_id).await?;

        if !call.is_host(user_id) {
            return Err(FitroomError::forbidden(format!(
                "user '{user_id}' is not the host of this call"
            )));
        }

        if let Some(event) = call.end(EndReason::HostEnded) {
            self.repository.save(&mut call).await?;
            self.expiry.cancel(call_id).await;
            self.publish(&call, &event).await;
            drop(guard);
            self.locks.remove(call_id).await;
        }
        Ok(call)
    }

    /// Ends a call whose maximum duration elapsed. Invoked by the expiry
    /// task; a no-op when the call already ended by other means.
    pub async fn expire_call(&self, call_id: &str) -> Result<()> {
        let guard = self.locks.acquire(call_id).await;
        let Some(mut call) = self.repository.find_by_id(call_id).await? else {
            tracing::warn!("[CallUseCase] expiry fired for unknown call {call_id}");
            return Ok(());
        };

        if let Some(event) = call.end(EndReason::Expired) {
            self.repository.save(&mut call).await?;
            tracing::info!("[CallUseCase] call {call_id} expired");
            self.publish(&call, &event).await;
            drop(guard);
            self.locks.remove(call_id).await;
        }
        Ok(())
    }

    /// Updates a participant's own mute/speaking flags. Self only.
    pub async fn update_participant_status(
        &self,
        call_id: &str,
        caller_id: &str,
        user_id: &str,
        is_muted: Option<bool>,
        is_speaking: Option<bool>,
    ) -> Result<Call> {
        if caller_id != user_id {
            return Err(FitroomError::forbidden(
                "participants may only update their own status",
            ));
        }

        let _guard = self.locks.acquire(call_id).await;
        let mut call = self.load(call_id).await?;
        let event = call.update_participant_status(user_id, is_muted, is_speaking)?;
        self.repository.save(&mut call).await?;
        self.publish(&call, &event).await;
        Ok(call)
    }

    /// Queues a control request and notifies the current controller.
    pub async fn request_control(
        &self,
        call_id: &str,
        user_id: &str,
        message: &str,
    ) -> Result<Call> {
        let _guard = self.locks.acquire(call_id).await;
        let mut call = self.load(call_id).await?;

        let event = call.request_control(user_id, message)?;
        self.repository.save(&mut call).await?;
        self.publish(&call, &event).await;

        // Fire-and-forget: the requester does not wait on the controller.
        if let Err(e) = self
            .notifications
            .control_request(&call.current_controller.user_id, call_id, user_id)
            .await
        {
            tracing::warn!("[CallUseCase] control request notification failed: {e}");
        }
        Ok(call)
    }

    /// Approves a pending control request; the approver must be the current
    /// controller.
    pub async fn approve_control(
        &self,
        call_id: &str,
        requester_id: &str,
        approver_id: &str,
    ) -> Result<Call> {
        let _guard = self.locks.acquire(call_id).await;
        let mut call = self.load(call_id).await?;

        let event = call.approve_control(requester_id, approver_id)?;
        self.repository.save(&mut call).await?;
        self.publish(&call, &event).await;
        Ok(call)
    }

    /// Denies a pending control request; the approver must be the current
    /// controller.
    pub async fn deny_control(
        &self,
        call_id: &str,
        requester_id: &str,
        approver_id: &str,
    ) -> Result<Call> {
        let _guard = self.locks.acquire(call_id).await;
        let mut call = self.load(call_id).await?;

        let event = call.deny_control(requester_id, approver_id)?;
        self.repository.save(&mut call).await?;
        self.publish(&call, &event).await;
        Ok(call)
    }

    /// Applies a browsing update from any active participant and fans the
    /// new cursor out to the call.
    pub async fn sync_browse(
        &self,
        call_id: &str,
        user_id: &str,
        update: BrowseUpdate,
    ) -> Result<Call> {
        let _guard = self.locks.acquire(call_id).await;
        let mut call = self.load(call_id).await?;

        let event = call.sync_browse(user_id, update)?;
        self.repository.save(&mut call).await?;
        self.publish(&call, &event).await;
        Ok(call)
    }

    /// Records a cart action, updates the shared wardrobe, and broadcasts a
    /// catalog-enriched cart event.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the product cannot be resolved in the catalog
    pub async fn add_to_cart(
        &self,
        call_id: &str,
        user_id: &str,
        product_id: &str,
        action: CartAction,
    ) -> Result<(Call, Product)> {
        let _guard = self.locks.acquire(call_id).await;
        let mut call = self.load(call_id).await?;

        let product = self
            .catalog
            .get(product_id)
            .await?
            .ok_or_else(|| FitroomError::not_found("product", product_id.to_string()))?;

        let change = call.record_cart_update(user_id, product_id, action)?;
        self.repository.save(&mut call).await?;

        // Wardrobe persistence happens before any broadcast so a failure
        // aborts without a partial event.
        match change {
            WardrobeChange::Added => self.wardrobe.add_item(call_id, product_id).await?,
            WardrobeChange::Removed => self.wardrobe.remove_item(call_id, product_id).await?,
            WardrobeChange::Unchanged => {}
        }

        self.publish(
            &call,
            &CallEvent::CartUpdated {
                call_id: call.id.clone(),
                user_id: user_id.to_string(),
                action,
                product: product.clone(),
                updated_at: chrono::Utc::now(),
            },
        )
        .await;

        match change {
            WardrobeChange::Added => {
                self.publish(
                    &call,
                    &CallEvent::WardrobeItemAdded {
                        call_id: call.id.clone(),
                        user_id: user_id.to_string(),
                        product_id: product_id.to_string(),
                    },
                )
                .await;
            }
            WardrobeChange::Removed => {
                self.publish(
                    &call,
                    &CallEvent::WardrobeItemRemoved {
                        call_id: call.id.clone(),
                        user_id: user_id.to_string(),
                        product_id: product_id.to_string(),
                    },
                )
                .await;
            }
            WardrobeChange::Unchanged => {}
        }

        Ok((call, product))
    }

    /// Returns the shared browsing state, logs trimmed to their retention
    /// windows. Participants only.
    pub async fn browsing_state(&self, call_id: &str, user_id: &str) -> Result<BrowsingState> {
        let call = self.load(call_id).await?;
        call.ensure_participant_read(user_id)?;
        Ok(call.session_data.bounded())
    }

    /// Lists a room's calls, newest first, with bounded logs. Room members
    /// only.
    pub async fn room_calls(&self, room_id: &str, user_id: &str) -> Result<Vec<Call>> {
        if !self.rooms.is_member(room_id, user_id).await? {
            return Err(FitroomError::forbidden(format!(
                "user '{user_id}' is not a member of room '{room_id}'"
            )));
        }
        let mut calls = self.repository.list_by_room(room_id).await?;
        for call in &mut calls {
            call.session_data = call.session_data.bounded();
        }
        Ok(calls)
    }

    /// Returns the full call status (participants, controller, host, bounded
    /// logs). Participants only.
    pub async fn call_status(&self, call_id: &str, user_id: &str) -> Result<Call> {
        let mut call = self.load(call_id).await?;
        call.ensure_participant_read(user_id)?;
        call.session_data = call.session_data.bounded();
        Ok(call)
    }

    async fn load(&self, call_id: &str) -> Result<Call> {
        self.repository
            .find_by_id(call_id)
            .await?
            .ok_or_else(|| FitroomError::not_found("call", call_id.to_string()))
    }

    /// Publishes a committed event. Transport failures are logged, not
    /// propagated: the state change already happened and disconnected
    /// subscribers reconcile via the status endpoint.
    async fn publish(&self, call: &Call, event: &CallEvent) {
        if let Err(e) = self.publisher.publish(&call.room_id, &call.id, event).await {
            tracing::warn!(
                "[CallUseCase] failed to publish '{}' for call {}: {e}",
                event.name(),
                call.id
            );
        }
    }

    async fn send_invitations(&self, call: &Call) {
        let members = match self.rooms.members(&call.room_id).await {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(
                    "[CallUseCase] could not list members of room {}: {e}",
                    call.room_id
                );
                return;
            }
        };
        for member in members.iter().filter(|m| *m != &call.host_id) {
            if let Err(e) = self
                .notifications
                .call_invitation(member, &call.id, &call.room_id, &call.host_id)
                .await
            {
                tracing::warn!("[CallUseCase] call invitation to {member} failed: {e}");
            }
        }
    }
}

#[cfg(test)]
#[path = "call_usecase_test.rs"]
mod call_usecase_test;
