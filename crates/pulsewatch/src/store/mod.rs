/// Storage abstraction layer
///
/// The engine only sees two narrow traits: [`MonitorSource`] to enumerate
/// what to check and [`HeartbeatStore`] for the append-only heartbeat log.
/// [`LibsqlStore`] backs them with a pooled LibSQL database and
/// [`MemoryStore`] keeps everything in process.
pub mod repository;
pub mod memory;
pub mod migrations;
pub mod pool;

pub use repository::{LibsqlStore, UpdateError};
pub use memory::MemoryStore;
pub use pool::{LibsqlManager, LibsqlPool, open_pool};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Heartbeat, MonitorTarget, NewHeartbeat};

/// Sort direction on heartbeat creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// Enumerates the monitors a sweep should check
#[async_trait]
pub trait MonitorSource: Send + Sync {
    async fn list_all_monitors(&self) -> Result<Vec<MonitorTarget>, StoreError>;
}

/// Append-only heartbeat log
///
/// Implementations own write isolation: concurrent appends from one sweep
/// must be safe, and `created_at` must never decrease within one monitor.
#[async_trait]
pub trait HeartbeatStore: Send + Sync {
    /// Persist a heartbeat, stamping its id and creation time
    async fn append(&self, heartbeat: NewHeartbeat) -> Result<Heartbeat, StoreError>;

    /// Heartbeats of one monitor created at or after `since`
    async fn query(&self, monitor_id: Uuid, since: DateTime<Utc>, order: Order) -> Result<Vec<Heartbeat>, StoreError>;

    /// Most recent heartbeat of one monitor
    async fn latest(&self, monitor_id: Uuid) -> Result<Option<Heartbeat>, StoreError>;
}
