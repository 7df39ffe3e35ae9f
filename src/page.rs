//! Probe page assembly.

use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::client_hints::accept_ch_value;
use crate::compile::compile;
use crate::html::{render_document, DocumentParts};
use crate::signal::{Catalog, ResourceType};
use crate::storage::{StorageError, VisitId, VisitStorage};
use crate::urls::UrlFactory;

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const ACCEPT_CH: HeaderName = HeaderName::from_static("accept-ch");

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
  #[error("Failed to create visit: {0}")]
  Storage(#[from] StorageError),
}

/// A rendered probe document and its response headers.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbePage {
  pub visit_id: VisitId,
  pub body: String,
  pub accept_ch: String,
}

impl IntoResponse for ProbePage {
  fn into_response(self) -> Response {
    let mut response = self.body.into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    match HeaderValue::from_str(&self.accept_ch) {
      Ok(value) => {
        headers.insert(ACCEPT_CH, value);
      }
      Err(e) => log::warn!("[page] Dropping invalid Accept-CH value: {e}"),
    }
    response
  }
}

/// Turns the catalog into a probe page for a fresh visit.
#[derive(Debug, Clone)]
pub struct PageAssembler {
  catalog: Arc<Catalog>,
  result_delay_ch_headers: Vec<String>,
}

impl PageAssembler {
  pub fn new(catalog: Arc<Catalog>, result_delay_ch_headers: Vec<String>) -> Self {
    Self {
      catalog,
      result_delay_ch_headers,
    }
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  /// Creates exactly one visit; a storage failure aborts the render before
  /// any markup is produced.
  pub async fn render(
    &self,
    storage: &dyn VisitStorage,
    urls: &dyn UrlFactory,
  ) -> Result<ProbePage, RenderError> {
    let visit = storage.create_visit().await?;
    let probe = compile(&self.catalog, &visit, urls);

    log::debug!(
      "[page] Rendered visit {} with {} probe classes and {} rules",
      visit,
      probe.probe_count,
      probe.css_rules.len()
    );

    let [style, image, video, audio] =
      ResourceType::PAGE_PROBES.map(|resource| urls.header_probe_url(&visit, resource));
    let result = urls.result_url(&visit);

    let body = render_document(&DocumentParts {
      css_rules: &probe.css_rules,
      html_fragments: &probe.html_fragments,
      style_probe_url: &style,
      image_probe_url: &image,
      video_probe_url: &video,
      audio_probe_url: &audio,
      result_url: &result,
    });

    Ok(ProbePage {
      visit_id: visit,
      body,
      accept_ch: accept_ch_value(&self.result_delay_ch_headers, &self.catalog),
    })
  }
}
