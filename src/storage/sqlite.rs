//! SQLite-backed visit storage.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{
  now_millis, HeaderHit, SignalHit, StorageError, VisitId, VisitReport, VisitStorage,
};
use crate::signal::ResourceType;

const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS visits (
  id TEXT PRIMARY KEY,
  created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_visits_created_at ON visits(created_at);

CREATE TABLE IF NOT EXISTS signal_hits (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  visit_id TEXT NOT NULL REFERENCES visits(id) ON DELETE CASCADE,
  signal_key TEXT NOT NULL,
  signal_value TEXT NOT NULL,
  received_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_signal_hits_visit ON signal_hits(visit_id);

CREATE TABLE IF NOT EXISTS header_hits (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  visit_id TEXT NOT NULL REFERENCES visits(id) ON DELETE CASCADE,
  resource_type TEXT NOT NULL,
  header_name TEXT NOT NULL,
  header_value TEXT NOT NULL,
  received_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_header_hits_visit ON header_hits(visit_id);
";

/// Blocking rusqlite calls run on the blocking pool behind a mutex.
#[derive(Clone)]
pub struct SqliteStorage {
  conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
  pub fn open(path: &Path) -> Result<Self, StorageError> {
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)?;
      }
    }

    log::info!("[storage] Opening visit database at {}", path.display());
    Self::with_connection(Connection::open(path)?)
  }

  pub fn open_in_memory() -> Result<Self, StorageError> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self, StorageError> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self {
      conn: Arc::new(Mutex::new(conn)),
    })
  }

  async fn run<T, F>(&self, task: F) -> Result<T, StorageError>
  where
    F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
  {
    let conn = Arc::clone(&self.conn);
    tokio::task::spawn_blocking(move || {
      let mut guard = conn.lock().map_err(|_| StorageError::Poisoned)?;
      task(&mut *guard)
    })
    .await
    .map_err(|e| StorageError::Task(e.to_string()))?
  }
}

fn visit_exists(conn: &Connection, visit: &str) -> SqliteResult<bool> {
  conn
    .query_row("SELECT 1 FROM visits WHERE id = ?1", [visit], |_| Ok(()))
    .optional()
    .map(|row| row.is_some())
}

#[async_trait]
impl VisitStorage for SqliteStorage {
  async fn create_visit(&self) -> Result<VisitId, StorageError> {
    let id = VisitId::generate();
    let raw = id.as_str().to_string();

    self
      .run(move |conn| {
        conn.execute(
          "INSERT INTO visits (id, created_at) VALUES (?1, ?2)",
          params![raw, now_millis()],
        )?;
        Ok(())
      })
      .await?;

    Ok(id)
  }

  async fn record_signal(
    &self,
    visit: &VisitId,
    key: &str,
    value: &str,
  ) -> Result<(), StorageError> {
    let visit = visit.as_str().to_string();
    let key = key.to_string();
    let value = value.to_string();

    self
      .run(move |conn| {
        if !visit_exists(conn, &visit)? {
          return Err(StorageError::UnknownVisit(visit));
        }
        conn.execute(
          "INSERT INTO signal_hits (visit_id, signal_key, signal_value, received_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![visit, key, value, now_millis()],
        )?;
        Ok(())
      })
      .await
  }

  async fn record_headers(
    &self,
    visit: &VisitId,
    resource: ResourceType,
    headers: &[(String, String)],
  ) -> Result<(), StorageError> {
    let visit = visit.as_str().to_string();
    let headers = headers.to_vec();

    self
      .run(move |conn| {
        if !visit_exists(conn, &visit)? {
          return Err(StorageError::UnknownVisit(visit));
        }

        let received_at = now_millis();
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO header_hits
               (visit_id, resource_type, header_name, header_value, received_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for (name, value) in &headers {
            stmt.execute(params![visit, resource.as_str(), name, value, received_at])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await
  }

  async fn visit_report(&self, visit: &VisitId) -> Result<Option<VisitReport>, StorageError> {
    let visit = visit.clone();

    self
      .run(move |conn| {
        let created_at: Option<i64> = conn
          .query_row(
            "SELECT created_at FROM visits WHERE id = ?1",
            [visit.as_str()],
            |row| row.get(0),
          )
          .optional()?;

        let Some(created_at) = created_at else {
          return Ok(None);
        };

        let mut report = VisitReport::new(visit.clone(), created_at);

        let mut stmt = conn.prepare(
          "SELECT signal_key, signal_value, received_at FROM signal_hits
           WHERE visit_id = ?1 ORDER BY id",
        )?;
        report.signals = stmt
          .query_map([visit.as_str()], |row| {
            Ok(SignalHit {
              key: row.get(0)?,
              value: row.get(1)?,
              received_at: row.get(2)?,
            })
          })?
          .collect::<SqliteResult<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT resource_type, header_name, header_value, received_at FROM header_hits
           WHERE visit_id = ?1 ORDER BY id",
        )?;
        report.headers = stmt
          .query_map([visit.as_str()], |row| {
            Ok(HeaderHit {
              resource: row.get(0)?,
              name: row.get(1)?,
              value: row.get(2)?,
              received_at: row.get(3)?,
            })
          })?
          .collect::<SqliteResult<Vec<_>>>()?;

        Ok(Some(report))
      })
      .await
  }

  async fn prune_visits(&self, created_before: i64) -> Result<usize, StorageError> {
    // Hits go with their visit through ON DELETE CASCADE.
    self
      .run(move |conn| {
        let removed = conn.execute(
          "DELETE FROM visits WHERE created_at < ?1",
          [created_before],
        )?;
        Ok(removed)
      })
      .await
  }
}
