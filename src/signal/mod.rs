//! Signal source model.
//!
//! A signal source is one declarative statement about the browser or device
//! ("is font X installed", "what is the device pixel ratio, to within some
//! resolution"). The catalog is loaded once at startup and never mutated; the
//! compiler in [`crate::compile`] turns each entry into CSS and markup.

pub mod catalog;
pub mod fonts;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::compile::MAX_EPSILON;

pub use catalog::{default_catalog, DEFAULT_CATALOG};

/// Builds a CSS rule from a generated class name and a style fragment
/// (`background: url(...)`). The fragment must only end up applied when the
/// probed condition holds.
#[derive(Clone)]
pub struct PresenceRule(Arc<dyn Fn(&str, &str) -> String + Send + Sync>);

impl PresenceRule {
  pub fn new<F>(rule: F) -> Self
  where
    F: Fn(&str, &str) -> String + Send + Sync + 'static,
  {
    Self(Arc::new(rule))
  }

  pub fn build(&self, class_name: &str, style: &str) -> String {
    (self.0)(class_name, style)
  }
}

impl fmt::Debug for PresenceRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("PresenceRule(..)")
  }
}

/// Resource types the page loads unconditionally so their request headers can
/// be inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
  Style,
  Image,
  Video,
  Audio,
  /// The result frame's own document request.
  Document,
}

impl ResourceType {
  /// Resource elements emitted by every probe page.
  pub const PAGE_PROBES: [ResourceType; 4] = [
    ResourceType::Style,
    ResourceType::Image,
    ResourceType::Video,
    ResourceType::Audio,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ResourceType::Style => "style",
      ResourceType::Image => "image",
      ResourceType::Video => "video",
      ResourceType::Audio => "audio",
      ResourceType::Document => "document",
    }
  }
}

impl fmt::Display for ResourceType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ResourceType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "style" => Ok(ResourceType::Style),
      "image" => Ok(ResourceType::Image),
      "video" => Ok(ResourceType::Video),
      "audio" => Ok(ResourceType::Audio),
      "document" => Ok(ResourceType::Document),
      other => Err(format!("Unknown resource type: {other}")),
    }
  }
}

/// Upper bound on the points a [`Breakpoints::Stepped`] range may produce.
pub const MAX_STEPPED_BREAKPOINTS: usize = 10_000;

/// How the breakpoints of a numeric feature are produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Breakpoints {
  Explicit(Vec<f64>),
  /// `start, start + step, ...` up to and including `end`.
  Stepped { start: f64, end: f64, step: f64 },
}

/// A continuous media feature probed with `min-`/`max-` range queries.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFeature {
  pub feature: String,
  pub vendor_prefix: Option<String>,
  pub unit: Option<String>,
  pub breakpoints: Breakpoints,
}

impl RangeFeature {
  pub fn new(feature: impl Into<String>, breakpoints: Breakpoints) -> Self {
    Self {
      feature: feature.into(),
      vendor_prefix: None,
      unit: None,
      breakpoints,
    }
  }

  pub fn with_vendor_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.vendor_prefix = Some(prefix.into());
    self
  }

  pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
    self.unit = Some(unit.into());
    self
  }

  /// Ascending, de-duplicated, finite breakpoints. Stepped ranges stop after
  /// [`MAX_STEPPED_BREAKPOINTS`] points.
  pub fn breakpoints(&self) -> Vec<f64> {
    let mut points: Vec<f64> = match &self.breakpoints {
      Breakpoints::Explicit(points) => points.clone(),
      Breakpoints::Stepped { start, end, step } => {
        let mut points = Vec::new();
        if *step > 0.0 && start.is_finite() && end.is_finite() && step.is_finite() {
          for index in 0..MAX_STEPPED_BREAKPOINTS {
            // Multiply rather than accumulate so long ranges don't drift.
            let point = start + step * index as f64;
            if point > *end {
              break;
            }
            points.push(point);
          }
        }
        points
      }
    };

    points.retain(|p| p.is_finite());
    points.sort_by(f64::total_cmp);
    points.dedup();
    points
  }
}

/// Kind-specific part of a signal source.
#[derive(Debug, Clone)]
pub enum SignalKind {
  Presence(PresenceRule),
  MediaEnum {
    feature: String,
    values: Vec<String>,
  },
  MediaNumber(RangeFeature),
  /// Activation means the font could NOT be resolved locally.
  FontAbsence {
    font: String,
  },
  HttpHeader {
    header: String,
    resource: ResourceType,
    client_hint: bool,
  },
}

#[derive(Debug, Clone)]
pub struct SignalSource {
  pub key: String,
  pub kind: SignalKind,
}

impl SignalSource {
  pub fn presence<F>(key: impl Into<String>, rule: F) -> Self
  where
    F: Fn(&str, &str) -> String + Send + Sync + 'static,
  {
    Self {
      key: key.into(),
      kind: SignalKind::Presence(PresenceRule::new(rule)),
    }
  }

  pub fn media_enum(key: impl Into<String>, feature: impl Into<String>, values: &[&str]) -> Self {
    Self {
      key: key.into(),
      kind: SignalKind::MediaEnum {
        feature: feature.into(),
        values: values.iter().map(|v| v.to_string()).collect(),
      },
    }
  }

  pub fn media_number(key: impl Into<String>, feature: RangeFeature) -> Self {
    Self {
      key: key.into(),
      kind: SignalKind::MediaNumber(feature),
    }
  }

  pub fn font_absence(key: impl Into<String>, font: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      kind: SignalKind::FontAbsence { font: font.into() },
    }
  }

  pub fn http_header(
    key: impl Into<String>,
    header: impl Into<String>,
    resource: ResourceType,
    client_hint: bool,
  ) -> Self {
    Self {
      key: key.into(),
      kind: SignalKind::HttpHeader {
        header: header.into(),
        resource,
        client_hint,
      },
    }
  }
}

/// Catalog authoring mistakes that can be detected mechanically.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
  #[error("Duplicate signal key: {0}")]
  DuplicateKey(String),

  #[error("Signal {0} has no candidate values")]
  EmptyCandidates(String),

  #[error("Signal {key} has a non-finite breakpoint: {value}")]
  NonFiniteBreakpoint { key: String, value: f64 },

  #[error("Signal {key} has an invalid stepped range: {reason}")]
  InvalidStep { key: String, reason: &'static str },

  #[error("Signal {key} has breakpoints {lower} and {upper} closer than {min_gap}")]
  BreakpointsTooClose {
    key: String,
    lower: f64,
    upper: f64,
    min_gap: f64,
  },

  #[error("Signal {0} has an empty font name")]
  EmptyFontName(String),

  #[error("Signal {0} has an empty header name")]
  EmptyHeaderName(String),
}

/// Ordered, immutable list of signal sources.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
  sources: Vec<SignalSource>,
}

impl Catalog {
  pub fn new(sources: Vec<SignalSource>) -> Self {
    Self { sources }
  }

  pub fn iter(&self) -> impl Iterator<Item = &SignalSource> {
    self.sources.iter()
  }

  pub fn len(&self) -> usize {
    self.sources.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sources.is_empty()
  }

  pub fn get(&self, key: &str) -> Option<&SignalSource> {
    self.sources.iter().find(|s| s.key == key)
  }

  /// Checks the authoring invariants the compiler relies on but does not
  /// enforce. Mutual exclusivity of enum candidates cannot be checked here.
  pub fn validate(&self) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();

    for source in &self.sources {
      if !seen.insert(source.key.as_str()) {
        return Err(CatalogError::DuplicateKey(source.key.clone()));
      }

      match &source.kind {
        SignalKind::Presence(_) => {}
        SignalKind::MediaEnum { values, .. } => {
          if values.is_empty() {
            return Err(CatalogError::EmptyCandidates(source.key.clone()));
          }
        }
        SignalKind::MediaNumber(feature) => validate_range(&source.key, feature)?,
        SignalKind::FontAbsence { font } => {
          if font.trim().is_empty() {
            return Err(CatalogError::EmptyFontName(source.key.clone()));
          }
        }
        SignalKind::HttpHeader { header, .. } => {
          if header.trim().is_empty() {
            return Err(CatalogError::EmptyHeaderName(source.key.clone()));
          }
        }
      }
    }

    Ok(())
  }
}

fn validate_range(key: &str, feature: &RangeFeature) -> Result<(), CatalogError> {
  match &feature.breakpoints {
    Breakpoints::Explicit(points) => {
      if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
        return Err(CatalogError::NonFiniteBreakpoint {
          key: key.to_string(),
          value: *bad,
        });
      }
    }
    Breakpoints::Stepped { start, end, step } => {
      if let Some(bad) = [*start, *end].into_iter().find(|p| !p.is_finite()) {
        return Err(CatalogError::NonFiniteBreakpoint {
          key: key.to_string(),
          value: bad,
        });
      }
      let invalid = |reason| CatalogError::InvalidStep {
        key: key.to_string(),
        reason,
      };
      if !step.is_finite() || *step <= 0.0 {
        return Err(invalid("step must be positive and finite"));
      }
      if start > end {
        return Err(invalid("start is after end"));
      }
      if (end - start) / step >= MAX_STEPPED_BREAKPOINTS as f64 {
        return Err(invalid("too many breakpoints"));
      }
    }
  }

  // Every max bound is lowered by MAX_EPSILON; a narrower bucket would have
  // its max below its min.
  for pair in feature.breakpoints().windows(2) {
    if pair[1] - pair[0] < MAX_EPSILON {
      return Err(CatalogError::BreakpointsTooClose {
        key: key.to_string(),
        lower: pair[0],
        upper: pair[1],
        min_gap: MAX_EPSILON,
      });
    }
  }

  Ok(())
}

impl FromIterator<SignalSource> for Catalog {
  fn from_iter<I: IntoIterator<Item = SignalSource>>(iter: I) -> Self {
    Self::new(iter.into_iter().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_resource_type_round_trips_through_str() {
    for resource in [
      ResourceType::Style,
      ResourceType::Image,
      ResourceType::Video,
      ResourceType::Audio,
      ResourceType::Document,
    ] {
      assert_eq!(resource.as_str().parse::<ResourceType>(), Ok(resource));
    }
    assert!("font".parse::<ResourceType>().is_err());
  }

  #[test]
  fn test_explicit_breakpoints_are_sorted_and_deduplicated() {
    let feature = RangeFeature::new(
      "width",
      Breakpoints::Explicit(vec![3.0, 1.0, 2.0, 1.0, f64::NAN]),
    );
    assert_eq!(feature.breakpoints(), vec![1.0, 2.0, 3.0]);
  }

  #[test]
  fn test_stepped_breakpoints_include_end() {
    let feature = RangeFeature::new(
      "width",
      Breakpoints::Stepped {
        start: 100.0,
        end: 130.0,
        step: 10.0,
      },
    );
    assert_eq!(feature.breakpoints(), vec![100.0, 110.0, 120.0, 130.0]);
  }

  #[test]
  fn test_stepped_breakpoints_with_zero_step_are_empty() {
    let feature = RangeFeature::new(
      "width",
      Breakpoints::Stepped {
        start: 0.0,
        end: 10.0,
        step: 0.0,
      },
    );
    assert!(feature.breakpoints().is_empty());
  }

  #[test]
  fn test_presence_rule_receives_class_and_style() {
    let source = SignalSource::presence("grid", |class, style| {
      format!("@supports (display: grid) {{ .{class} {{ {style} }} }}")
    });
    let SignalKind::Presence(rule) = &source.kind else {
      panic!("expected presence kind");
    };
    assert_eq!(
      rule.build("css_probe_0", "background: url('/x')"),
      "@supports (display: grid) { .css_probe_0 { background: url('/x') } }"
    );
  }

  #[test]
  fn test_validate_rejects_duplicate_keys() {
    let catalog = Catalog::new(vec![
      SignalSource::font_absence("font", "Arial"),
      SignalSource::font_absence("font", "Calibri"),
    ]);
    assert_eq!(
      catalog.validate(),
      Err(CatalogError::DuplicateKey("font".to_string()))
    );
  }

  #[test]
  fn test_validate_rejects_empty_candidates() {
    let catalog = Catalog::new(vec![SignalSource::media_enum(
      "scheme",
      "prefers-color-scheme",
      &[],
    )]);
    assert_eq!(
      catalog.validate(),
      Err(CatalogError::EmptyCandidates("scheme".to_string()))
    );
  }

  #[test]
  fn test_validate_rejects_non_finite_breakpoints() {
    let catalog = Catalog::new(vec![SignalSource::media_number(
      "dpr",
      RangeFeature::new("resolution", Breakpoints::Explicit(vec![1.0, f64::INFINITY])),
    )]);
    assert!(matches!(
      catalog.validate(),
      Err(CatalogError::NonFiniteBreakpoint { .. })
    ));
  }

  fn stepped(key: &str, start: f64, end: f64, step: f64) -> Catalog {
    Catalog::new(vec![SignalSource::media_number(
      key,
      RangeFeature::new("width", Breakpoints::Stepped { start, end, step }),
    )])
  }

  #[test]
  fn test_validate_rejects_non_finite_stepped_bounds() {
    for catalog in [
      stepped("w", f64::NAN, 100.0, 10.0),
      stepped("w", 0.0, f64::INFINITY, 10.0),
      stepped("w", f64::NEG_INFINITY, 0.0, 10.0),
    ] {
      assert!(matches!(
        catalog.validate(),
        Err(CatalogError::NonFiniteBreakpoint { .. })
      ));
    }
  }

  #[test]
  fn test_validate_rejects_bad_steps() {
    for catalog in [
      stepped("w", 0.0, 100.0, 0.0),
      stepped("w", 0.0, 100.0, -10.0),
      stepped("w", 0.0, 100.0, f64::NAN),
      stepped("w", 100.0, 0.0, 10.0),
      stepped("w", 0.0, 1e9, 1.0),
    ] {
      assert!(matches!(
        catalog.validate(),
        Err(CatalogError::InvalidStep { .. })
      ));
    }
    assert!(stepped("w", 0.0, 100.0, 10.0).validate().is_ok());
  }

  #[test]
  fn test_huge_stepped_range_is_capped() {
    let feature = RangeFeature::new(
      "width",
      Breakpoints::Stepped {
        start: 0.0,
        end: 1e12,
        step: 1e-3,
      },
    );
    assert_eq!(feature.breakpoints().len(), MAX_STEPPED_BREAKPOINTS);
  }

  #[test]
  fn test_validate_rejects_breakpoints_closer_than_epsilon() {
    let catalog = Catalog::new(vec![SignalSource::media_number(
      "w",
      RangeFeature::new(
        "width",
        Breakpoints::Explicit(vec![1.0, 1.0000001, 1.0000002]),
      ),
    )]);
    assert!(matches!(
      catalog.validate(),
      Err(CatalogError::BreakpointsTooClose { lower, .. }) if lower == 1.0
    ));

    let spaced = Catalog::new(vec![SignalSource::media_number(
      "w",
      RangeFeature::new("width", Breakpoints::Explicit(vec![1.0, 1.001])),
    )]);
    assert!(spaced.validate().is_ok());
  }

  #[test]
  fn test_validate_rejects_blank_names() {
    let fonts = Catalog::new(vec![SignalSource::font_absence("f", "  ")]);
    assert_eq!(
      fonts.validate(),
      Err(CatalogError::EmptyFontName("f".to_string()))
    );

    let headers = Catalog::new(vec![SignalSource::http_header(
      "h",
      "",
      ResourceType::Image,
      false,
    )]);
    assert_eq!(
      headers.validate(),
      Err(CatalogError::EmptyHeaderName("h".to_string()))
    );
  }

  #[test]
  fn test_validate_accepts_empty_breakpoint_list() {
    let catalog = Catalog::new(vec![SignalSource::media_number(
      "any",
      RangeFeature::new("width", Breakpoints::Explicit(vec![])),
    )]);
    assert!(catalog.validate().is_ok());
  }

  #[test]
  fn test_catalog_lookup_by_key() {
    let catalog: Catalog = vec![SignalSource::font_absence("font_arial", "Arial")]
      .into_iter()
      .collect();
    assert_eq!(catalog.len(), 1);
    assert!(catalog.get("font_arial").is_some());
    assert!(catalog.get("missing").is_none());
  }
}
