//! Fitroom infrastructure adapters.
//!
//! Concrete implementations of the core's repository and collaborator ports:
//! in-memory versioned call storage, broadcast realtime fan-out, seeded room
//! membership, seeded product catalog, wardrobe sink, and tracing-backed
//! notifications.

pub mod broadcast_publisher;
pub mod catalog;
pub mod directory;
pub mod memory_call_repository;
pub mod notification;

pub use crate::broadcast_publisher::{BroadcastEventPublisher, PublishedEvent};
pub use crate::catalog::{MemoryProductCatalog, MemoryWardrobeStore};
pub use crate::directory::StaticRoomDirectory;
pub use crate::memory_call_repository::MemoryCallRepository;
pub use crate::notification::{Notification, TracingNotificationDispatcher};
