//! Numeric range bisector.
//!
//! Breakpoints `b1 < ... < bn` become `n + 1` half-open buckets
//! `(-inf, b1) [b1, b2) ... [bn, +inf)`. CSS `max-*` comparisons are
//! inclusive, so every emitted max bound is lowered by [`MAX_EPSILON`] and no
//! device value can match two adjacent rules.

use crate::html::{css_url, format_bound, format_number};
use crate::signal::RangeFeature;

/// Subtracted from every `max-*` bound, in the feature's own unit.
pub const MAX_EPSILON: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
  pub min: Option<f64>,
  pub max: Option<f64>,
}

impl Bucket {
  /// Half-open membership, `min <= value < max`.
  pub fn contains(&self, value: f64) -> bool {
    self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value < max)
  }

  /// What a browser evaluates for the emitted media condition.
  pub fn matches_css(&self, value: f64) -> bool {
    self.min.is_none_or(|min| value >= min)
      && self.max.is_none_or(|max| value <= max - MAX_EPSILON)
  }

  /// `"<min>,<max>"`, either side empty when open. Uses the unadjusted bounds.
  pub fn activation_value(&self) -> String {
    format!(
      "{},{}",
      self.min.map(format_bound).unwrap_or_default(),
      self.max.map(format_bound).unwrap_or_default()
    )
  }

  /// `(min-x: a) and (max-x: b)`; `None` for the single open/open bucket.
  pub fn media_condition(&self, feature: &RangeFeature) -> Option<String> {
    let prefix = feature.vendor_prefix.as_deref().unwrap_or("");
    let unit = feature.unit.as_deref().unwrap_or("");
    let name = &feature.feature;

    let mut clauses = Vec::with_capacity(2);
    if let Some(min) = self.min {
      clauses.push(format!("({prefix}min-{name}: {}{unit})", format_bound(min)));
    }
    if let Some(max) = self.max {
      clauses.push(format!(
        "({prefix}max-{name}: {}{unit})",
        format_number(max - MAX_EPSILON)
      ));
    }

    if clauses.is_empty() {
      None
    } else {
      Some(clauses.join(" and "))
    }
  }

  /// Media rule binding this bucket to `activation_url` on `class_name`.
  pub fn rule(&self, feature: &RangeFeature, class_name: &str, activation_url: &str) -> String {
    let condition = self
      .media_condition(feature)
      .unwrap_or_else(|| "all".to_string());
    format!(
      "@media {condition} {{ .{class_name} {{ background: {} }} }}",
      css_url(activation_url)
    )
  }
}

/// Buckets for ascending `breakpoints`. An empty slice yields one open bucket.
pub fn range_buckets(breakpoints: &[f64]) -> Vec<Bucket> {
  let mut buckets = Vec::with_capacity(breakpoints.len() + 1);
  let mut lower = None;

  for &point in breakpoints {
    buckets.push(Bucket {
      min: lower,
      max: Some(point),
    });
    lower = Some(point);
  }
  buckets.push(Bucket {
    min: lower,
    max: None,
  });

  buckets
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::signal::Breakpoints;
  use std::collections::HashSet;

  fn dpr() -> RangeFeature {
    RangeFeature::new("device-pixel-ratio", Breakpoints::Explicit(vec![2.0, 3.0]))
      .with_vendor_prefix("-webkit-")
  }

  fn samples(breakpoints: &[f64]) -> Vec<f64> {
    let mut values = vec![-1e9, -1.0, 0.0, 1e9];
    for window in breakpoints.windows(2) {
      values.push((window[0] + window[1]) / 2.0);
    }
    for &point in breakpoints {
      values.extend([point, point + 1e-6, point + 0.5, point - 0.5]);
    }
    values
  }

  #[test]
  fn test_bucket_count_and_bounds() {
    let buckets = range_buckets(&[2.0, 3.0]);
    assert_eq!(
      buckets,
      vec![
        Bucket {
          min: None,
          max: Some(2.0)
        },
        Bucket {
          min: Some(2.0),
          max: Some(3.0)
        },
        Bucket {
          min: Some(3.0),
          max: None
        },
      ]
    );
  }

  #[test]
  fn test_empty_breakpoints_degenerate_to_one_open_bucket() {
    let buckets = range_buckets(&[]);
    assert_eq!(
      buckets,
      vec![Bucket {
        min: None,
        max: None
      }]
    );
    assert!(buckets[0].contains(f64::MIN));
    assert!(buckets[0].contains(f64::MAX));
    assert_eq!(buckets[0].activation_value(), ",");
    assert_eq!(buckets[0].media_condition(&dpr()), None);
  }

  #[test]
  fn test_buckets_partition_the_line() {
    let sets: Vec<Vec<f64>> = vec![
      vec![],
      vec![0.0],
      vec![2.0, 3.0],
      vec![-5.0, 0.0, 0.5, 1.0, 1.25, 1920.0],
    ];

    for breakpoints in sets {
      let buckets = range_buckets(&breakpoints);
      assert_eq!(buckets.len(), breakpoints.len() + 1);
      for value in samples(&breakpoints) {
        let hits = buckets.iter().filter(|b| b.contains(value)).count();
        assert_eq!(hits, 1, "value {value} in {breakpoints:?}");
      }
    }
  }

  #[test]
  fn test_css_conditions_never_overlap() {
    let breakpoints = [0.5, 1.0, 1.25, 2.0, 3.0, 320.0, 1920.0];
    let buckets = range_buckets(&breakpoints);
    for value in samples(&breakpoints) {
      let hits = buckets.iter().filter(|b| b.matches_css(value)).count();
      assert!(hits <= 1, "value {value} matched {hits} buckets");
    }
  }

  #[test]
  fn test_value_on_breakpoint_matches_upper_bucket_only() {
    let breakpoints = [1.0, 2.0, 3.0];
    let buckets = range_buckets(&breakpoints);
    for &point in &breakpoints {
      let matching: Vec<&Bucket> = buckets.iter().filter(|b| b.matches_css(point)).collect();
      assert_eq!(matching.len(), 1);
      assert_eq!(matching[0].min, Some(point));
    }
  }

  #[test]
  fn test_media_conditions() {
    let feature = dpr();
    let buckets = range_buckets(&feature.breakpoints());
    let conditions: Vec<Option<String>> =
      buckets.iter().map(|b| b.media_condition(&feature)).collect();
    assert_eq!(
      conditions,
      vec![
        Some("(-webkit-max-device-pixel-ratio: 1.99999)".to_string()),
        Some(
          "(-webkit-min-device-pixel-ratio: 2) and (-webkit-max-device-pixel-ratio: 2.99999)"
            .to_string()
        ),
        Some("(-webkit-min-device-pixel-ratio: 3)".to_string()),
      ]
    );
  }

  #[test]
  fn test_unit_suffix() {
    let feature = RangeFeature::new("width", Breakpoints::Explicit(vec![1920.0])).with_unit("px");
    let bucket = Bucket {
      min: Some(1280.0),
      max: Some(1920.0),
    };
    assert_eq!(
      bucket.media_condition(&feature).as_deref(),
      Some("(min-width: 1280px) and (max-width: 1919.99999px)")
    );
  }

  #[test]
  fn test_activation_values() {
    let values: Vec<String> = range_buckets(&[2.0, 3.0])
      .iter()
      .map(Bucket::activation_value)
      .collect();
    assert_eq!(values, vec![",2", "2,3", "3,"]);
  }

  #[test]
  fn test_close_breakpoints_keep_distinct_values() {
    let breakpoints = [1.0, 1.0000001, 1.0000002, 1.0000003];
    let values: Vec<String> = range_buckets(&breakpoints)
      .iter()
      .map(Bucket::activation_value)
      .collect();
    assert_eq!(
      values,
      vec![",1", "1,1.0000001", "1.0000001,1.0000002", "1.0000002,1.0000003", "1.0000003,"]
    );

    let feature = RangeFeature::new("width", Breakpoints::Explicit(breakpoints.to_vec()));
    let conditions: HashSet<Option<String>> = range_buckets(&breakpoints)
      .iter()
      .map(|b| b.media_condition(&feature))
      .collect();
    assert_eq!(conditions.len(), breakpoints.len() + 1);
  }

  #[test]
  fn test_rule_without_condition_uses_media_all() {
    let feature = RangeFeature::new("width", Breakpoints::Explicit(vec![]));
    let rule = range_buckets(&[])[0].rule(&feature, "css_probe_0", "/s");
    assert_eq!(
      rule,
      "@media all { .css_probe_0 { background: url('/s') } }"
    );
  }
}
