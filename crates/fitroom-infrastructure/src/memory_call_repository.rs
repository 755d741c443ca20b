//! In-memory CallRepository implementation.
//!
//! Calls are live, short-lived coordination state; they are held in process
//! memory for their lifetime. The repository honors the version
//! compare-and-swap contract of [`CallRepository`]: a save whose version does
//! not match the stored record fails with `Conflict`, so even a caller that
//! bypasses the per-call serialization boundary cannot silently lose an
//! update.

use async_trait::async_trait;
use fitroom_core::call::{Call, CallRepository, CallStatus};
use fitroom_core::{FitroomError, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory, versioned call store.
#[derive(Default)]
pub struct MemoryCallRepository {
    calls: RwLock<HashMap<String, Call>>,
}

impl MemoryCallRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CallRepository for MemoryCallRepository {
    async fn find_by_id(&self, call_id: &str) -> Result<Option<Call>> {
        let calls = self.calls.read().await;
        Ok(calls.get(call_id).cloned())
    }

    async fn find_active_by_room(&self, room_id: &str) -> Result<Option<Call>> {
        let calls = self.calls.read().await;
        Ok(calls
            .values()
            .find(|c| c.room_id == room_id && c.status == CallStatus::Active)
            .cloned())
    }

    async fn save(&self, call: &mut Call) -> Result<()> {
        let mut calls = self.calls.write().await;
        if let Some(stored) = calls.get(&call.id) {
            if stored.version != call.version {
                return Err(FitroomError::conflict(format!(
                    "call '{}' was modified concurrently (stored v{}, saving v{})",
                    call.id, stored.version, call.version
                )));
            }
        }
        call.version += 1;
        calls.insert(call.id.clone(), call.clone());
        Ok(())
    }

    async fn list_by_room(&self, room_id: &str) -> Result<Vec<Call>> {
        let calls = self.calls.read().await;
        let mut found: Vec<Call> = calls
            .values()
            .filter(|c| c.room_id == room_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.duration.start_time.cmp(&a.duration.start_time));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitroom_core::call::EndReason;

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = MemoryCallRepository::new();
        let mut call = Call::new("room-1", "hanna", 30);
        repo.save(&mut call).await.unwrap();
        assert_eq!(call.version, 1);

        let found = repo.find_by_id(&call.id).await.unwrap().unwrap();
        assert_eq!(found.id, call.id);
        assert_eq!(found.version, 1);
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected() {
        let repo = MemoryCallRepository::new();
        let mut call = Call::new("room-1", "hanna", 30);
        repo.save(&mut call).await.unwrap();

        // Two copies of the same version race; the slower one loses.
        let mut first = repo.find_by_id(&call.id).await.unwrap().unwrap();
        let mut second = repo.find_by_id(&call.id).await.unwrap().unwrap();

        first.join("amir").unwrap();
        repo.save(&mut first).await.unwrap();

        second.join("bea").unwrap();
        let err = repo.save(&mut second).await.unwrap_err();
        assert!(err.is_conflict());

        let stored = repo.find_by_id(&call.id).await.unwrap().unwrap();
        assert!(stored.is_active_participant("amir"));
        assert!(!stored.is_active_participant("bea"));
    }

    #[tokio::test]
    async fn test_find_active_by_room_skips_ended() {
        let repo = MemoryCallRepository::new();
        let mut old = Call::new("room-1", "hanna", 30);
        old.end(EndReason::HostEnded);
        repo.save(&mut old).await.unwrap();

        assert!(repo.find_active_by_room("room-1").await.unwrap().is_none());

        let mut current = Call::new("room-1", "amir", 30);
        repo.save(&mut current).await.unwrap();
        let active = repo.find_active_by_room("room-1").await.unwrap().unwrap();
        assert_eq!(active.id, current.id);

        let history = repo.list_by_room("room-1").await.unwrap();
        assert_eq!(history.len(), 2);
    }
}
