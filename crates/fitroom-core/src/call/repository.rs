//! Call repository trait.
//!
//! Defines the interface for call persistence. Implementations must treat
//! `Call::version` as a compare-and-swap key: saving a call whose version
//! does not match the stored one fails with `Conflict`, so a racing
//! read-modify-write can never silently lose an update.

use super::model::Call;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for call persistence.
#[async_trait]
pub trait CallRepository: Send + Sync {
    /// Finds a call by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Call))`: call found
    /// - `Ok(None)`: call not found
    async fn find_by_id(&self, call_id: &str) -> Result<Option<Call>>;

    /// Finds the single active call for a room, if any.
    async fn find_active_by_room(&self, room_id: &str) -> Result<Option<Call>>;

    /// Persists a call.
    ///
    /// On success the stored version and `call.version` are both bumped.
    ///
    /// # Errors
    ///
    /// - `Conflict` when `call.version` does not match the stored version
    ///   (stale read-modify-write)
    async fn save(&self, call: &mut Call) -> Result<()>;

    /// Lists all calls ever held in a room, newest first.
    async fn list_by_room(&self, room_id: &str) -> Result<Vec<Call>>;
}
