//! Visit storage.
//!
//! A visit is created once per rendered page; every URL on that page carries
//! its id, and the activation and header-probe endpoints record what arrived
//! against it.

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::signal::ResourceType;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
  #[error("SQLite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Unknown visit: {0}")]
  UnknownVisit(String),

  #[error("Storage lock poisoned")]
  Poisoned,

  #[error("Storage task failed: {0}")]
  Task(String),
}

/// Opaque per-render correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitId(String);

impl VisitId {
  pub fn generate() -> Self {
    Self(Uuid::new_v4().simple().to_string())
  }

  /// Accepts only ids this crate could have generated.
  pub fn parse(raw: &str) -> Option<Self> {
    Uuid::try_parse(raw)
      .ok()
      .map(|uuid| Self(uuid.simple().to_string()))
  }

  /// Wraps an id from a trusted source without checking its shape.
  pub fn from_trusted(raw: impl Into<String>) -> Self {
    Self(raw.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for VisitId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalHit {
  pub key: String,
  pub value: String,
  pub received_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderHit {
  pub resource: String,
  pub name: String,
  pub value: String,
  pub received_at: i64,
}

/// Raw records of one visit, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitReport {
  pub visit_id: VisitId,
  pub created_at: i64,
  pub signals: Vec<SignalHit>,
  pub headers: Vec<HeaderHit>,
}

impl VisitReport {
  pub fn new(visit_id: VisitId, created_at: i64) -> Self {
    Self {
      visit_id,
      created_at,
      signals: Vec::new(),
      headers: Vec::new(),
    }
  }

  /// Values recorded for `key`, in arrival order.
  pub fn signal_values(&self, key: &str) -> Vec<&str> {
    self
      .signals
      .iter()
      .filter(|hit| hit.key == key)
      .map(|hit| hit.value.as_str())
      .collect()
  }

  /// Header value seen on the probe for `resource`, matched case-insensitively.
  pub fn header_value(&self, resource: ResourceType, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|hit| hit.resource == resource.as_str() && hit.name.eq_ignore_ascii_case(name))
      .map(|hit| hit.value.as_str())
  }
}

#[async_trait]
pub trait VisitStorage: Send + Sync {
  /// Allocate and persist a fresh visit.
  async fn create_visit(&self) -> Result<VisitId, StorageError>;

  /// An activation request for `(key, value)` arrived.
  async fn record_signal(&self, visit: &VisitId, key: &str, value: &str)
    -> Result<(), StorageError>;

  /// A header probe for `resource` arrived carrying `headers`.
  async fn record_headers(
    &self,
    visit: &VisitId,
    resource: ResourceType,
    headers: &[(String, String)],
  ) -> Result<(), StorageError>;

  async fn visit_report(&self, visit: &VisitId) -> Result<Option<VisitReport>, StorageError>;

  /// Delete visits created before `created_before` (unix millis) together
  /// with their records. Returns how many visits were removed.
  async fn prune_visits(&self, created_before: i64) -> Result<usize, StorageError>;
}

pub(crate) fn now_millis() -> i64 {
  chrono::Utc::now().timestamp_millis()
}
