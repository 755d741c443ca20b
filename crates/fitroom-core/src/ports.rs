//! Collaborator ports consumed by the live session core.
//!
//! The session core treats the rest of the platform (room membership,
//! notifications, the product catalog, wardrobes, the realtime transport)
//! as external collaborators behind narrow traits. Implementations live in
//! `fitroom-infrastructure`; tests provide their own mocks.

use crate::call::CallEvent;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Read-only product data used to enrich cart events for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub image_url: Option<String>,
}

/// Room membership lookups.
///
/// Rooms themselves (creation, membership management) are owned by another
/// subsystem; the session core only ever asks who belongs to a room.
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// Returns whether `user_id` is a member of `room_id`.
    async fn is_member(&self, room_id: &str, user_id: &str) -> Result<bool>;

    /// Returns all member ids of `room_id`.
    async fn members(&self, room_id: &str) -> Result<Vec<String>>;
}

/// Outbound notification sink for call invitations and control requests.
///
/// Delivery mechanics (push, in-app) are out of scope; dispatch is
/// fire-and-forget from the caller's point of view.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Notifies a room member that a call has started in their room.
    async fn call_invitation(
        &self,
        user_id: &str,
        call_id: &str,
        room_id: &str,
        host_id: &str,
    ) -> Result<()>;

    /// Notifies the current controller that another participant asked for
    /// control.
    async fn control_request(
        &self,
        controller_id: &str,
        call_id: &str,
        requester_id: &str,
    ) -> Result<()>;
}

/// Read-only product lookups.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Resolves a product by id. `Ok(None)` means the product does not exist.
    async fn get(&self, product_id: &str) -> Result<Option<Product>>;
}

/// Persistent sink for products shared into a call.
///
/// Both operations are idempotent: adding an item twice or removing an absent
/// item is a no-op.
#[async_trait]
pub trait WardrobeStore: Send + Sync {
    async fn add_item(&self, call_id: &str, product_id: &str) -> Result<()>;

    async fn remove_item(&self, call_id: &str, product_id: &str) -> Result<()>;
}

/// Realtime event fan-out.
///
/// The use case publishes a committed domain event exactly once; the
/// implementation forwards it to every subscriber of the room/call channel.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, room_id: &str, call_id: &str, event: &CallEvent) -> Result<()>;
}
