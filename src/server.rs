//! HTTP surface: the probe page plus the endpoints its requests land on.

use axum::{
  extract::{Path, Query, State},
  http::{header, HeaderMap, HeaderValue, StatusCode},
  response::{Html, IntoResponse, Json, Response},
  routing::get,
  Router,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::page::PageAssembler;
use crate::report::render_report;
use crate::settings::{DatabaseLocation, ServerSettings};
use crate::signal::{Catalog, CatalogError, ResourceType, DEFAULT_CATALOG};
use crate::storage::{
  MemoryStorage, SqliteStorage, StorageError, VisitId, VisitReport, VisitStorage,
};
use crate::urls::{PathUrlFactory, UrlFactory};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Storage error: {0}")]
  Storage(#[from] StorageError),

  #[error("Invalid signal catalog: {0}")]
  Catalog(#[from] CatalogError),
}

#[derive(Clone)]
pub struct AppState {
  storage: Arc<dyn VisitStorage>,
  urls: Arc<dyn UrlFactory>,
  assembler: Arc<PageAssembler>,
  result_delay: Duration,
}

impl AppState {
  pub fn new(
    storage: Arc<dyn VisitStorage>,
    urls: Arc<dyn UrlFactory>,
    assembler: PageAssembler,
    result_delay: Duration,
  ) -> Self {
    Self {
      storage,
      urls,
      assembler: Arc::new(assembler),
      result_delay,
    }
  }

  /// State for `settings` over an already opened store.
  pub fn from_settings(
    settings: &ServerSettings,
    catalog: Arc<Catalog>,
    storage: Arc<dyn VisitStorage>,
  ) -> Self {
    Self::new(
      storage,
      Arc::new(PathUrlFactory::new(settings.base_url.clone())),
      PageAssembler::new(catalog, settings.result_delay_ch_headers.clone()),
      Duration::from_millis(settings.result_delay_ms),
    )
  }
}

#[derive(Debug, Deserialize)]
struct ActivationQuery {
  #[serde(default)]
  v: String,
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/", get(probe_page))
    .route("/signal/{visit}/{key}", get(record_activation))
    .route("/headers/{visit}/{resource}", get(record_header_probe))
    .route("/result/{visit}", get(result_page))
    .route("/api/visits/{visit}", get(visit_report))
    // Every probe request must reach the server on every visit.
    .layer(SetResponseHeaderLayer::overriding(
      header::CACHE_CONTROL,
      HeaderValue::from_static("no-store"),
    ))
    .with_state(state)
}

fn storage_status(context: &str, error: &StorageError) -> StatusCode {
  match error {
    StorageError::UnknownVisit(_) => StatusCode::NOT_FOUND,
    other => {
      log::error!("[server] {context}: {other}");
      StatusCode::INTERNAL_SERVER_ERROR
    }
  }
}

fn collect_headers(headers: &HeaderMap) -> Vec<(String, String)> {
  headers
    .iter()
    .map(|(name, value)| {
      (
        name.as_str().to_string(),
        String::from_utf8_lossy(value.as_bytes()).into_owned(),
      )
    })
    .collect()
}

async fn probe_page(State(state): State<AppState>) -> Response {
  match state
    .assembler
    .render(state.storage.as_ref(), state.urls.as_ref())
    .await
  {
    Ok(page) => page.into_response(),
    Err(e) => {
      log::error!("[server] Failed to render probe page: {e}");
      StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
  }
}

async fn record_activation(
  State(state): State<AppState>,
  Path((visit, key)): Path<(String, String)>,
  Query(query): Query<ActivationQuery>,
) -> StatusCode {
  let Some(visit) = VisitId::parse(&visit) else {
    return StatusCode::NOT_FOUND;
  };

  log::debug!("[server] Signal {key}={} for visit {visit}", query.v);

  match state.storage.record_signal(&visit, &key, &query.v).await {
    Ok(()) => StatusCode::NO_CONTENT,
    Err(e) => storage_status("Failed to record signal", &e),
  }
}

async fn record_header_probe(
  State(state): State<AppState>,
  Path((visit, resource)): Path<(String, String)>,
  headers: HeaderMap,
) -> Response {
  let Some(visit) = VisitId::parse(&visit) else {
    return StatusCode::NOT_FOUND.into_response();
  };
  let Ok(resource) = resource.parse::<ResourceType>() else {
    return StatusCode::NOT_FOUND.into_response();
  };

  if let Err(e) = state
    .storage
    .record_headers(&visit, resource, &collect_headers(&headers))
    .await
  {
    return storage_status("Failed to record header probe", &e).into_response();
  }

  match resource {
    // An empty stylesheet keeps the page from reporting a failed load.
    ResourceType::Style => (
      StatusCode::OK,
      [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
      "",
    )
      .into_response(),
    _ => StatusCode::NO_CONTENT.into_response(),
  }
}

async fn result_page(
  State(state): State<AppState>,
  Path(visit): Path<String>,
  headers: HeaderMap,
) -> Response {
  let Some(visit) = VisitId::parse(&visit) else {
    return StatusCode::NOT_FOUND.into_response();
  };

  // Give the page's probe requests time to land before reading them back.
  if !state.result_delay.is_zero() {
    tokio::time::sleep(state.result_delay).await;
  }

  if let Err(e) = state
    .storage
    .record_headers(&visit, ResourceType::Document, &collect_headers(&headers))
    .await
  {
    return storage_status("Failed to record result frame headers", &e).into_response();
  }

  match state.storage.visit_report(&visit).await {
    Ok(Some(report)) => Html(render_report(&report, state.assembler.catalog())).into_response(),
    Ok(None) => StatusCode::NOT_FOUND.into_response(),
    Err(e) => storage_status("Failed to load visit report", &e).into_response(),
  }
}

async fn visit_report(
  State(state): State<AppState>,
  Path(visit): Path<String>,
) -> Result<Json<VisitReport>, StatusCode> {
  let visit = VisitId::parse(&visit).ok_or(StatusCode::NOT_FOUND)?;

  match state.storage.visit_report(&visit).await {
    Ok(Some(report)) => Ok(Json(report)),
    Ok(None) => Err(StatusCode::NOT_FOUND),
    Err(e) => Err(storage_status("Failed to load visit report", &e)),
  }
}

/// How often expired visits are swept.
const PRUNE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Delete visits older than `retention`.
pub async fn prune_expired(
  storage: &dyn VisitStorage,
  retention: Duration,
) -> Result<usize, StorageError> {
  let retention_ms = i64::try_from(retention.as_millis()).unwrap_or(i64::MAX);
  let cutoff = chrono::Utc::now()
    .timestamp_millis()
    .saturating_sub(retention_ms);
  storage.prune_visits(cutoff).await
}

fn spawn_pruner(storage: Arc<dyn VisitStorage>, retention: Duration) {
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(PRUNE_INTERVAL.min(retention));
    loop {
      interval.tick().await;
      match prune_expired(storage.as_ref(), retention).await {
        Ok(0) => {}
        Ok(removed) => log::info!("[server] Pruned {removed} expired visits"),
        Err(e) => log::error!("[server] Failed to prune visits: {e}"),
      }
    }
  });
}

pub fn open_storage(settings: &ServerSettings) -> Result<Arc<dyn VisitStorage>, StorageError> {
  match settings.database_location() {
    DatabaseLocation::Memory => {
      log::warn!("[storage] Using in-memory visit store, records are lost on exit");
      Ok(Arc::new(MemoryStorage::new()))
    }
    DatabaseLocation::File(path) => Ok(Arc::new(SqliteStorage::open(&path)?)),
  }
}

/// Serve until Ctrl-C.
pub async fn run_server(settings: ServerSettings) -> Result<(), ServerError> {
  let catalog = Arc::clone(&DEFAULT_CATALOG);
  if settings.validate_catalog {
    catalog.validate()?;
  }

  let storage = open_storage(&settings)?;
  match settings.visit_retention() {
    Some(retention) => spawn_pruner(Arc::clone(&storage), retention),
    None => log::warn!("[server] Visit retention disabled, the store grows with every page view"),
  }
  let state = AppState::from_settings(&settings, catalog, storage);

  let listener = TcpListener::bind(settings.listen_address()).await?;
  let local_addr = listener.local_addr()?;
  log::info!(
    "[server] Listening on http://{} with {} signal sources",
    local_addr,
    DEFAULT_CATALOG.len()
  );

  axum::serve(listener, router(state))
    .with_graceful_shutdown(async {
      if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("[server] Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
      }
      log::info!("[server] Shutting down");
    })
    .await?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_prune_expired_keeps_recent_visits() {
    let storage = MemoryStorage::new();
    let visit = storage.create_visit().await.unwrap();

    let removed = prune_expired(&storage, Duration::from_secs(3600)).await.unwrap();
    assert_eq!(removed, 0);
    assert!(storage.visit_report(&visit).await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(5)).await;
    let removed = prune_expired(&storage, Duration::ZERO).await.unwrap();
    assert_eq!(removed, 1);
    assert!(storage.visit_report(&visit).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_prune_expired_with_huge_retention() {
    let storage = MemoryStorage::new();
    storage.create_visit().await.unwrap();
    let removed = prune_expired(&storage, Duration::MAX).await.unwrap();
    assert_eq!(removed, 0);
  }
}
