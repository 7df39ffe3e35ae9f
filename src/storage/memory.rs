use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{
  now_millis, HeaderHit, SignalHit, StorageError, VisitId, VisitReport, VisitStorage,
};
use crate::signal::ResourceType;

/// Process-local store, used for `:memory:` databases and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
  visits: Mutex<HashMap<VisitId, VisitReport>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl VisitStorage for MemoryStorage {
  async fn create_visit(&self) -> Result<VisitId, StorageError> {
    let id = VisitId::generate();
    let mut visits = self.visits.lock().await;
    visits.insert(id.clone(), VisitReport::new(id.clone(), now_millis()));
    Ok(id)
  }

  async fn record_signal(
    &self,
    visit: &VisitId,
    key: &str,
    value: &str,
  ) -> Result<(), StorageError> {
    let mut visits = self.visits.lock().await;
    let report = visits
      .get_mut(visit)
      .ok_or_else(|| StorageError::UnknownVisit(visit.to_string()))?;
    report.signals.push(SignalHit {
      key: key.to_string(),
      value: value.to_string(),
      received_at: now_millis(),
    });
    Ok(())
  }

  async fn record_headers(
    &self,
    visit: &VisitId,
    resource: ResourceType,
    headers: &[(String, String)],
  ) -> Result<(), StorageError> {
    let mut visits = self.visits.lock().await;
    let report = visits
      .get_mut(visit)
      .ok_or_else(|| StorageError::UnknownVisit(visit.to_string()))?;
    let received_at = now_millis();
    report
      .headers
      .extend(headers.iter().map(|(name, value)| HeaderHit {
        resource: resource.as_str().to_string(),
        name: name.clone(),
        value: value.clone(),
        received_at,
      }));
    Ok(())
  }

  async fn visit_report(&self, visit: &VisitId) -> Result<Option<VisitReport>, StorageError> {
    let visits = self.visits.lock().await;
    Ok(visits.get(visit).cloned())
  }

  async fn prune_visits(&self, created_before: i64) -> Result<usize, StorageError> {
    let mut visits = self.visits.lock().await;
    let before = visits.len();
    visits.retain(|_, report| report.created_at >= created_before);
    Ok(before - visits.len())
  }
}
