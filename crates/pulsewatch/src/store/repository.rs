use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Row, params};
use uuid::Uuid;

use super::migrations::run_migrations;
use super::pool::{LibsqlManager, LibsqlPool, open_pool};
use super::{HeartbeatStore, MonitorSource, Order};
use crate::error::{StoreError, ValidationError};
use crate::model::{Heartbeat, Monitor, MonitorTarget, NewHeartbeat, validate_url};

const MONITOR_COLUMNS: &str = "id, owner_id, name, url, created_at";
const HEARTBEAT_COLUMNS: &str = "id, monitor_id, status, response_time, response_code, error_message, created_at";

/// LibSQL-backed monitor and heartbeat store
pub struct LibsqlStore {
    pool: LibsqlPool,
}

impl LibsqlStore {
    /// Wrap an existing pool; the schema must already be migrated
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    /// Open the database file, run migrations, and return a ready store
    pub async fn open(path: &str, pool_size: usize) -> Result<Self, StoreError> {
        let pool = open_pool(path, pool_size).await?;
        {
            let conn = pool.get().await?;
            run_migrations(&conn).await?;
        }
        Ok(Self::new_from_pool(pool))
    }

    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>, StoreError> {
        Ok(self.pool.get().await?)
    }

    /// Insert a new monitor
    pub async fn create_monitor(&self, monitor: &Monitor) -> Result<(), StoreError> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO monitors (id, owner_id, name, url, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                monitor.id.to_string(),
                monitor.owner_id.to_string(),
                monitor.name.clone(),
                monitor.url.clone(),
                monitor.created_at.timestamp_millis()
            ],
        )
        .await?;
        Ok(())
    }

    pub async fn get_monitor(&self, id: Uuid) -> Result<Option<Monitor>, StoreError> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(&format!("SELECT {MONITOR_COLUMNS} FROM monitors WHERE id = ?"), params![id.to_string()])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(monitor_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Every monitor, oldest first
    pub async fn list_monitors(&self) -> Result<Vec<Monitor>, StoreError> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(&format!("SELECT {MONITOR_COLUMNS} FROM monitors ORDER BY created_at"), ())
            .await?;

        let mut monitors = Vec::new();
        while let Some(row) = rows.next().await? {
            monitors.push(monitor_from_row(&row)?);
        }
        Ok(monitors)
    }

    pub async fn list_monitors_for_owner(&self, owner_id: Uuid) -> Result<Vec<Monitor>, StoreError> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {MONITOR_COLUMNS} FROM monitors WHERE owner_id = ? ORDER BY created_at"),
                params![owner_id.to_string()],
            )
            .await?;

        let mut monitors = Vec::new();
        while let Some(row) = rows.next().await? {
            monitors.push(monitor_from_row(&row)?);
        }
        Ok(monitors)
    }

    /// Change a monitor's name and URL; its heartbeat history is kept
    pub async fn update_monitor(&self, id: Uuid, name: &str, url: &str) -> Result<Monitor, UpdateError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        validate_url(url.trim())?;

        let conn = self.get_conn().await?;
        let changed = conn
            .execute(
                "UPDATE monitors SET name = ?, url = ? WHERE id = ?",
                params![name.to_string(), url.trim().to_string(), id.to_string()],
            )
            .await
            .map_err(StoreError::from)?;

        if changed == 0 {
            return Err(StoreError::MonitorNotFound(id).into());
        }

        drop(conn);
        self.get_monitor(id).await?.ok_or_else(|| StoreError::MonitorNotFound(id).into())
    }

    /// Delete a monitor together with all of its heartbeats
    ///
    /// Returns `false` when no such monitor existed.
    pub async fn delete_monitor(&self, id: Uuid) -> Result<bool, StoreError> {
        let conn = self.get_conn().await?;
        let tx = conn.transaction().await?;
        tx.execute("DELETE FROM heartbeats WHERE monitor_id = ?", params![id.to_string()])
            .await?;
        let deleted = tx.execute("DELETE FROM monitors WHERE id = ?", params![id.to_string()]).await?;
        tx.commit().await?;
        Ok(deleted > 0)
    }
}

/// Failures of [`LibsqlStore::update_monitor`]
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait]
impl MonitorSource for LibsqlStore {
    async fn list_all_monitors(&self) -> Result<Vec<MonitorTarget>, StoreError> {
        Ok(self.list_monitors().await?.iter().map(Monitor::target).collect())
    }
}

#[async_trait]
impl HeartbeatStore for LibsqlStore {
    async fn append(&self, heartbeat: NewHeartbeat) -> Result<Heartbeat, StoreError> {
        let conn = self.get_conn().await?;

        // Clamp to the newest existing row so creation time never goes backwards per monitor
        let mut rows = conn
            .query(
                "INSERT INTO heartbeats (monitor_id, status, response_time, response_code, error_message, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5,
                         MAX(?6, COALESCE((SELECT MAX(created_at) FROM heartbeats WHERE monitor_id = ?1), 0)))
                 RETURNING id, created_at",
                params![
                    heartbeat.monitor_id.to_string(),
                    heartbeat.status.as_str(),
                    heartbeat.response_time.map(|v| v as i64),
                    i64::from(heartbeat.response_code),
                    heartbeat.error_message.clone(),
                    Utc::now().timestamp_millis()
                ],
            )
            .await?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| StoreError::Decode("insert returned no row".to_string()))?;
        let id: i64 = row.get(0)?;
        let created_at = millis_to_datetime(row.get(1)?)?;

        Ok(heartbeat.into_heartbeat(id, created_at))
    }

    async fn query(&self, monitor_id: Uuid, since: DateTime<Utc>, order: Order) -> Result<Vec<Heartbeat>, StoreError> {
        let direction = match order {
            Order::Ascending => "ASC",
            Order::Descending => "DESC",
        };

        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {HEARTBEAT_COLUMNS} FROM heartbeats WHERE monitor_id = ? AND created_at >= ? \
                     ORDER BY created_at {direction}, id {direction}"
                ),
                params![monitor_id.to_string(), since.timestamp_millis()],
            )
            .await?;

        let mut heartbeats = Vec::new();
        while let Some(row) = rows.next().await? {
            heartbeats.push(heartbeat_from_row(&row)?);
        }
        Ok(heartbeats)
    }

    async fn latest(&self, monitor_id: Uuid) -> Result<Option<Heartbeat>, StoreError> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {HEARTBEAT_COLUMNS} FROM heartbeats WHERE monitor_id = ? \
                     ORDER BY created_at DESC, id DESC LIMIT 1"
                ),
                params![monitor_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(heartbeat_from_row(&row)?)),
            None => Ok(None),
        }
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|e| StoreError::Decode(format!("bad uuid `{raw}`: {e}")))
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| StoreError::Decode(format!("bad timestamp {millis}")))
}

fn monitor_from_row(row: &Row) -> Result<Monitor, StoreError> {
    let id: String = row.get(0)?;
    let owner_id: String = row.get(1)?;

    Ok(Monitor {
        id: parse_uuid(&id)?,
        owner_id: parse_uuid(&owner_id)?,
        name: row.get(2)?,
        url: row.get(3)?,
        created_at: millis_to_datetime(row.get(4)?)?,
    })
}

fn heartbeat_from_row(row: &Row) -> Result<Heartbeat, StoreError> {
    let monitor_id: String = row.get(1)?;
    let status: String = row.get(2)?;
    let response_code: i64 = row.get(4)?;

    Ok(Heartbeat {
        id: row.get(0)?,
        monitor_id: parse_uuid(&monitor_id)?,
        status: status.parse().map_err(StoreError::Decode)?,
        response_time: row.get::<Option<i64>>(3)?.map(|v| v as u64),
        response_code: u16::try_from(response_code)
            .map_err(|_| StoreError::Decode(format!("bad response code {response_code}")))?,
        error_message: row.get(5)?,
        created_at: millis_to_datetime(row.get(6)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    async fn create_test_store() -> (LibsqlStore, TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let store = LibsqlStore::open(&db_path.to_string_lossy(), 4).await.unwrap();
        (store, temp_dir)
    }

    fn monitor(owner: Uuid, name: &str) -> Monitor {
        Monitor::new(owner, name, "https://example.com").unwrap()
    }

    #[tokio::test]
    async fn test_monitor_crud() {
        let (store, _dir) = create_test_store().await;
        let owner = Uuid::new_v4();
        let first = monitor(owner, "first");
        let second = monitor(Uuid::new_v4(), "second");

        store.create_monitor(&first).await.unwrap();
        store.create_monitor(&second).await.unwrap();

        let loaded = store.get_monitor(first.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "first");
        assert_eq!(loaded.created_at.timestamp_millis(), first.created_at.timestamp_millis());

        assert_eq!(store.list_monitors().await.unwrap().len(), 2);
        assert_eq!(store.list_monitors_for_owner(owner).await.unwrap().len(), 1);

        let targets = store.list_all_monitors().await.unwrap();
        assert!(targets.iter().any(|t| t.id == second.id && t.url == "https://example.com"));

        let renamed = store.update_monitor(first.id, "renamed", "http://example.org").await.unwrap();
        assert_eq!(renamed.name, "renamed");
        assert_eq!(renamed.url, "http://example.org");

        assert!(matches!(
            store.update_monitor(first.id, "x", "gopher://example.org").await,
            Err(UpdateError::Invalid(ValidationError::UnsupportedScheme(_)))
        ));
        assert!(matches!(
            store.update_monitor(Uuid::new_v4(), "x", "http://example.org").await,
            Err(UpdateError::Store(StoreError::MonitorNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_append_and_query_ordering() {
        let (store, _dir) = create_test_store().await;
        let m = monitor(Uuid::new_v4(), "ordered");
        store.create_monitor(&m).await.unwrap();

        let first = store.append(NewHeartbeat::up(m.id, 120, 200)).await.unwrap();
        let second = store.append(NewHeartbeat::down(m.id, 503, "Connection refused")).await.unwrap();
        let third = store.append(NewHeartbeat::up(m.id, 80, 204)).await.unwrap();

        assert!(first.created_at <= second.created_at && second.created_at <= third.created_at);

        let since = Utc::now() - Duration::hours(1);
        let ascending = store.query(m.id, since, Order::Ascending).await.unwrap();
        let ids: Vec<i64> = ascending.iter().map(|hb| hb.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);

        let descending = store.query(m.id, since, Order::Descending).await.unwrap();
        assert_eq!(descending.first().map(|hb| hb.id), Some(third.id));

        assert_eq!(descending[1].response_time, None);
        assert_eq!(descending[1].error_message.as_deref(), Some("Connection refused"));
        assert_eq!(descending[1].response_code, 503);

        let latest = store.latest(m.id).await.unwrap().unwrap();
        assert_eq!(latest.id, third.id);

        let future = store.query(m.id, Utc::now() + Duration::hours(1), Order::Ascending).await.unwrap();
        assert!(future.is_empty());
    }

    #[tokio::test]
    async fn test_append_for_unknown_monitor_fails() {
        let (store, _dir) = create_test_store().await;
        let result = store.append(NewHeartbeat::up(Uuid::new_v4(), 10, 200)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_monitor_cascades_heartbeats() {
        let (store, _dir) = create_test_store().await;
        let m = monitor(Uuid::new_v4(), "doomed");
        store.create_monitor(&m).await.unwrap();
        store.append(NewHeartbeat::up(m.id, 10, 200)).await.unwrap();
        store.append(NewHeartbeat::up(m.id, 12, 200)).await.unwrap();

        assert!(store.delete_monitor(m.id).await.unwrap());
        assert!(!store.delete_monitor(m.id).await.unwrap());
        assert!(store.get_monitor(m.id).await.unwrap().is_none());
        assert!(store.latest(m.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("twice.db");
        let path = db_path.to_string_lossy().to_string();

        let store = LibsqlStore::open(&path, 2).await.unwrap();
        let m = monitor(Uuid::new_v4(), "kept");
        store.create_monitor(&m).await.unwrap();
        drop(store);

        let reopened = LibsqlStore::open(&path, 2).await.unwrap();
        assert!(reopened.get_monitor(m.id).await.unwrap().is_some());
    }
}
