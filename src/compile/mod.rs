//! Per-kind signal compilers.
//!
//! Compilation is a fold over the catalog in order. The fold state is the
//! probe counter; each source that needs a generated class allocates exactly
//! one `css_probe_<n>` name, shared by its markup and every rule it emits.

pub mod range;

use crate::html::{css_string, css_url, escape_html};
use crate::signal::{Catalog, RangeFeature, SignalKind, SignalSource};
use crate::storage::VisitId;
use crate::urls::UrlFactory;

pub use range::{range_buckets, Bucket, MAX_EPSILON};

/// CSS rules and markup accumulated for one render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledProbe {
  pub css_rules: Vec<String>,
  pub html_fragments: Vec<String>,
  /// Number of generated class names.
  pub probe_count: usize,
}

impl CompiledProbe {
  fn allocate_class(&mut self) -> String {
    let class_name = format!("css_probe_{}", self.probe_count);
    self.probe_count += 1;
    class_name
  }

  fn push_probe_div(&mut self, class_name: &str) {
    self
      .html_fragments
      .push(format!("<div class=\"{}\"></div>", escape_html(class_name)));
  }
}

/// Compile every source of `catalog` for `visit`.
pub fn compile(catalog: &Catalog, visit: &VisitId, urls: &dyn UrlFactory) -> CompiledProbe {
  catalog
    .iter()
    .fold(CompiledProbe::default(), |probe, source| {
      compile_source(probe, source, visit, urls)
    })
}

fn compile_source(
  mut probe: CompiledProbe,
  source: &SignalSource,
  visit: &VisitId,
  urls: &dyn UrlFactory,
) -> CompiledProbe {
  let key = source.key.as_str();

  match &source.kind {
    SignalKind::Presence(rule) => {
      let class_name = probe.allocate_class();
      probe.push_probe_div(&class_name);
      let style = format!(
        "background: {}",
        css_url(&urls.activation_url(visit, key, ""))
      );
      probe.css_rules.push(rule.build(&class_name, &style));
    }
    SignalKind::MediaEnum { feature, values } => {
      let class_name = probe.allocate_class();
      probe.push_probe_div(&class_name);
      for value in values {
        probe.css_rules.push(format!(
          "@media ({feature}: {value}) {{ .{class_name} {{ background: {} }} }}",
          css_url(&urls.activation_url(visit, key, value))
        ));
      }
    }
    SignalKind::MediaNumber(feature) => {
      let class_name = probe.allocate_class();
      probe.push_probe_div(&class_name);
      probe
        .css_rules
        .extend(range_rules(feature, &class_name, key, visit, urls));
    }
    SignalKind::FontAbsence { font } => {
      probe.css_rules.push(format!(
        "@font-face {{ font-family: {family}; src: local({family}), {} format('truetype'); }}",
        css_url(&urls.activation_url(visit, key, "")),
        family = css_string(font),
      ));
      // No generic fallback: the face above must be resolved or fetched.
      probe.html_fragments.push(format!(
        "<span style=\"font-family: {}\">a</span>",
        escape_html(&css_string(font))
      ));
    }
    // Observed through the page's unconditional resource probes.
    SignalKind::HttpHeader { .. } => {}
  }

  probe
}

fn range_rules(
  feature: &RangeFeature,
  class_name: &str,
  key: &str,
  visit: &VisitId,
  urls: &dyn UrlFactory,
) -> Vec<String> {
  range_buckets(&feature.breakpoints())
    .iter()
    .map(|bucket| {
      let url = urls.activation_url(visit, key, &bucket.activation_value());
      bucket.rule(feature, class_name, &url)
    })
    .collect()
}
