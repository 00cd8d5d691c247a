use deadpool::managed::{self, Pool, RecycleResult};
use libsql::{Builder, Connection, Database, Error as LibsqlError};

use crate::error::StoreError;

pub struct LibsqlManager {
    database: Database,
}

impl LibsqlManager {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

impl managed::Manager for LibsqlManager {
    type Type = Connection;
    type Error = LibsqlError;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        let conn = self.database.connect()?;
        // Both settings are per connection in SQLite. Concurrent appends from
        // one sweep wait on the write lock instead of failing with SQLITE_BUSY.
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;
        conn.query("PRAGMA busy_timeout = 5000", ()).await?;
        Ok(conn)
    }

    async fn recycle(&self, conn: &mut Self::Type, _: &managed::Metrics) -> RecycleResult<Self::Error> {
        conn.query("SELECT 1", ())
            .await?
            .next()
            .await?
            .ok_or(LibsqlError::QueryReturnedNoRows)?;
        Ok(())
    }
}

pub type LibsqlPool = Pool<LibsqlManager>;

/// Open (or create) a local LibSQL database and wrap it in a pool
pub async fn open_pool(path: &str, max_size: usize) -> Result<LibsqlPool, StoreError> {
    let database = Builder::new_local(path).build().await?;

    Pool::builder(LibsqlManager::new(database))
        .max_size(max_size.max(1))
        .build()
        .map_err(|e| StoreError::Pool(e.to_string()))
}
