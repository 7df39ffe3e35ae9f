//! Raw result page shown in the probe page's iframe.
//!
//! Lists what arrived for a visit. Font signals are inverted at the source
//! (a hit means the font is missing), which the page states next to each hit;
//! turning the records into a fingerprint is left to consumers of the JSON
//! endpoint.

use chrono::{DateTime, Utc};

use crate::html::escape_html;
use crate::signal::{Catalog, SignalKind};
use crate::storage::VisitReport;

fn describe_signal(catalog: &Catalog, key: &str, value: &str) -> String {
  match catalog.get(key).map(|source| &source.kind) {
    Some(SignalKind::FontAbsence { font }) => format!("{font} is not installed"),
    Some(SignalKind::MediaNumber(feature)) => {
      let (min, max) = value.split_once(',').unwrap_or((value, ""));
      let unit = feature.unit.as_deref().unwrap_or("");
      match (min.is_empty(), max.is_empty()) {
        (true, true) => format!("{} matched", feature.feature),
        (true, false) => format!("{} < {max}{unit}", feature.feature),
        (false, true) => format!("{} >= {min}{unit}", feature.feature),
        (false, false) => format!("{min}{unit} <= {} < {max}{unit}", feature.feature),
      }
    }
    Some(SignalKind::MediaEnum { feature, .. }) => format!("{feature}: {value}"),
    Some(SignalKind::Presence(_)) => "condition held".to_string(),
    Some(SignalKind::HttpHeader { .. }) | None => value.to_string(),
  }
}

fn format_timestamp(millis: i64) -> String {
  DateTime::<Utc>::from_timestamp_millis(millis)
    .map(|t| t.to_rfc3339())
    .unwrap_or_else(|| millis.to_string())
}

pub fn render_report(report: &VisitReport, catalog: &Catalog) -> String {
  let mut signal_rows = String::new();
  for hit in &report.signals {
    signal_rows.push_str(&format!(
      "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
      escape_html(&hit.key),
      escape_html(&hit.value),
      escape_html(&describe_signal(catalog, &hit.key, &hit.value)),
    ));
  }

  let mut header_rows = String::new();
  for hit in &report.headers {
    header_rows.push_str(&format!(
      "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
      escape_html(&hit.resource),
      escape_html(&hit.name),
      escape_html(&hit.value),
    ));
  }

  format!(
    r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Visit {visit}</title>
<style>
body {{ font-family: sans-serif; }}
table {{ border-collapse: collapse; margin-bottom: 1rem; }}
td, th {{ border: 1px solid #ccc; padding: 0.2rem 0.5rem; text-align: left; }}
</style>
</head>
<body>
<h1>Visit {visit}</h1>
<p>Started {created}. {signal_count} signals, {header_count} headers.</p>
<h2>Signals</h2>
<table>
<tr><th>Key</th><th>Value</th><th>Meaning</th></tr>
{signal_rows}</table>
<h2>Headers</h2>
<table>
<tr><th>Resource</th><th>Header</th><th>Value</th></tr>
{header_rows}</table>
</body>
</html>
"#,
    visit = escape_html(report.visit_id.as_str()),
    created = format_timestamp(report.created_at),
    signal_count = report.signals.len(),
    header_count = report.headers.len(),
  )
}
