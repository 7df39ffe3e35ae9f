//! URL factories.
//!
//! The compiler never builds URLs itself. Whatever produces them only has to
//! be injective over `(signal key, signal value)` within one visit so a fired
//! request can be attributed to exactly one signal bucket.

use crate::signal::ResourceType;
use crate::storage::VisitId;

pub trait UrlFactory: Send + Sync {
  /// URL whose being requested is the observed bit for `(key, value)`.
  fn activation_url(&self, visit: &VisitId, key: &str, value: &str) -> String;

  /// URL always requested so the request headers for `resource` can be read.
  fn header_probe_url(&self, visit: &VisitId, resource: ResourceType) -> String;

  fn result_url(&self, visit: &VisitId) -> String;
}

/// Path-based URLs matching the routes in [`crate::server`].
#[derive(Debug, Clone, Default)]
pub struct PathUrlFactory {
  base_url: String,
}

impl PathUrlFactory {
  pub fn new(base_url: impl Into<String>) -> Self {
    let base_url: String = base_url.into();
    Self {
      base_url: base_url.trim_end_matches('/').to_string(),
    }
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }
}

impl UrlFactory for PathUrlFactory {
  fn activation_url(&self, visit: &VisitId, key: &str, value: &str) -> String {
    format!(
      "{}/signal/{}/{}?v={}",
      self.base_url,
      visit,
      urlencoding::encode(key),
      urlencoding::encode(value)
    )
  }

  fn header_probe_url(&self, visit: &VisitId, resource: ResourceType) -> String {
    format!("{}/headers/{}/{}", self.base_url, visit, resource)
  }

  fn result_url(&self, visit: &VisitId) -> String {
    format!("{}/result/{}", self.base_url, visit)
  }
}
