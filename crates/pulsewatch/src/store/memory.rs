use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{HeartbeatStore, MonitorSource, Order};
use crate::error::StoreError;
use crate::model::{Heartbeat, Monitor, MonitorTarget, NewHeartbeat};

/// In-process store
///
/// Heartbeats of each monitor are kept in creation order. Appends for a
/// monitor that was never added are accepted, mirroring a store without
/// foreign keys.
#[derive(Default)]
pub struct MemoryStore {
    monitors: RwLock<Vec<Monitor>>,
    heartbeats: RwLock<HashMap<Uuid, Vec<Heartbeat>>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_monitor(&self, monitor: Monitor) {
        self.monitors.write().await.push(monitor);
    }

    pub async fn monitors(&self) -> Vec<Monitor> {
        self.monitors.read().await.clone()
    }

    /// Remove a monitor and its heartbeats
    pub async fn remove_monitor(&self, id: Uuid) -> bool {
        let mut monitors = self.monitors.write().await;
        let before = monitors.len();
        monitors.retain(|m| m.id != id);
        self.heartbeats.write().await.remove(&id);
        monitors.len() != before
    }

    /// Append with an explicit creation time, for seeding history
    ///
    /// The sequence stays sorted; a timestamp older than existing rows is
    /// inserted at its place rather than clamped.
    pub async fn append_at(&self, heartbeat: NewHeartbeat, created_at: DateTime<Utc>) -> Heartbeat {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let heartbeat = heartbeat.into_heartbeat(id, created_at);

        let mut heartbeats = self.heartbeats.write().await;
        let entries = heartbeats.entry(heartbeat.monitor_id).or_default();
        let position = entries.partition_point(|hb| hb.created_at <= created_at);
        entries.insert(position, heartbeat.clone());
        heartbeat
    }

    /// Number of heartbeats held for a monitor
    pub async fn count(&self, monitor_id: Uuid) -> usize {
        self.heartbeats.read().await.get(&monitor_id).map_or(0, Vec::len)
    }
}

#[async_trait]
impl MonitorSource for MemoryStore {
    async fn list_all_monitors(&self) -> Result<Vec<MonitorTarget>, StoreError> {
        Ok(self.monitors.read().await.iter().map(Monitor::target).collect())
    }
}

#[async_trait]
impl HeartbeatStore for MemoryStore {
    async fn append(&self, heartbeat: NewHeartbeat) -> Result<Heartbeat, StoreError> {
        let mut heartbeats = self.heartbeats.write().await;
        let entries = heartbeats.entry(heartbeat.monitor_id).or_default();

        let now = Utc::now();
        let created_at = entries.last().map_or(now, |last| last.created_at.max(now));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;

        let heartbeat = heartbeat.into_heartbeat(id, created_at);
        entries.push(heartbeat.clone());
        Ok(heartbeat)
    }

    async fn query(&self, monitor_id: Uuid, since: DateTime<Utc>, order: Order) -> Result<Vec<Heartbeat>, StoreError> {
        let heartbeats = self.heartbeats.read().await;
        let mut matching: Vec<Heartbeat> = heartbeats
            .get(&monitor_id)
            .map(|entries| entries.iter().filter(|hb| hb.created_at >= since).cloned().collect())
            .unwrap_or_default();

        if order == Order::Descending {
            matching.reverse();
        }
        Ok(matching)
    }

    async fn latest(&self, monitor_id: Uuid) -> Result<Option<Heartbeat>, StoreError> {
        Ok(self.heartbeats.read().await.get(&monitor_id).and_then(|entries| entries.last().cloned()))
    }
}
