//! Static RoomDirectory implementation.
//!
//! Room management is owned by another subsystem; this adapter answers
//! membership queries from a seeded map. It is what the server binary and
//! integration tests run against.

use async_trait::async_trait;
use fitroom_core::ports::RoomDirectory;
use fitroom_core::Result;
use std::collections::{HashMap, HashSet};

/// Room membership backed by a fixed in-memory map.
#[derive(Default)]
pub struct StaticRoomDirectory {
    rooms: HashMap<String, HashSet<String>>,
}

impl StaticRoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a room with the given members, replacing any previous entry.
    pub fn with_room<I, S>(mut self, room_id: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rooms.insert(
            room_id.into(),
            members.into_iter().map(Into::into).collect(),
        );
        self
    }
}

#[async_trait]
impl RoomDirectory for StaticRoomDirectory {
    async fn is_member(&self, room_id: &str, user_id: &str) -> Result<bool> {
        Ok(self
            .rooms
            .get(room_id)
            .is_some_and(|members| members.contains(user_id)))
    }

    async fn members(&self, room_id: &str) -> Result<Vec<String>> {
        Ok(self
            .rooms
            .get(room_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_membership() {
        let directory = StaticRoomDirectory::new().with_room("r1", ["hanna", "amir"]);

        assert!(directory.is_member("r1", "hanna").await.unwrap());
        assert!(!directory.is_member("r1", "bea").await.unwrap());
        assert!(!directory.is_member("r9", "hanna").await.unwrap());
        assert_eq!(directory.members("r1").await.unwrap().len(), 2);
        assert!(directory.members("r9").await.unwrap().is_empty());
    }
}
