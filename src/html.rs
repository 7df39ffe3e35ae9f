//! Escaping helpers and the probe document template.
//!
//! Markup interpolations are HTML-escaped; every attribute in this crate is
//! emitted double-quoted, so `'` does not need escaping. Text placed inside the
//! `<style>` element is raw text to the HTML parser and is quoted as a CSS
//! string instead.

/// Off-screen container style. `display: none` would stop some engines from
/// resolving backgrounds and fonts at all.
pub const HIDDEN_CONTAINER_STYLE: &str =
  "position: absolute; top: 0; left: -9999px; width: 1px; height: 1px; overflow: hidden";

pub fn escape_html(input: &str) -> String {
  let mut escaped = String::with_capacity(input.len());
  for c in input.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      _ => escaped.push(c),
    }
  }
  escaped
}

/// Single-quoted CSS string. `<` is escaped so the value can never close the
/// surrounding `<style>` element.
pub fn css_string(input: &str) -> String {
  let mut quoted = String::with_capacity(input.len() + 2);
  quoted.push('\'');
  for c in input.chars() {
    match c {
      '\\' => quoted.push_str("\\\\"),
      '\'' => quoted.push_str("\\'"),
      '\n' => quoted.push_str("\\a "),
      '\r' => quoted.push_str("\\d "),
      '<' => quoted.push_str("\\3c "),
      _ => quoted.push(c),
    }
  }
  quoted.push('\'');
  quoted
}

/// `url('...')` for use inside the style block.
pub fn css_url(url: &str) -> String {
  format!("url({})", css_string(url))
}

/// At most ten fractional digits, trailing zeros trimmed. Used for computed
/// values such as an epsilon-lowered bound, where the shortest exact form
/// would carry float noise.
pub fn format_number(value: f64) -> String {
  let formatted = format!("{value:.10}");
  let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
  match trimmed {
    "-0" | "" => "0".to_string(),
    other => other.to_string(),
  }
}

/// Shortest form that parses back to exactly `value`. Catalog breakpoints go
/// through this so distinct breakpoints never print alike.
pub fn format_bound(value: f64) -> String {
  if value == 0.0 {
    return "0".to_string();
  }
  format!("{value}")
}

/// Everything the probe document interpolates.
pub struct DocumentParts<'a> {
  pub css_rules: &'a [String],
  pub html_fragments: &'a [String],
  pub style_probe_url: &'a str,
  pub image_probe_url: &'a str,
  pub video_probe_url: &'a str,
  pub audio_probe_url: &'a str,
  pub result_url: &'a str,
}

pub fn render_document(parts: &DocumentParts<'_>) -> String {
  let css = parts.css_rules.join("\n");
  let fragments = parts.html_fragments.join("\n");

  format!(
    r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>CSS fingerprint</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
iframe {{ border: 0; width: 100%; height: 80vh; }}
{css}
</style>
<link rel="stylesheet" href="{style}">
</head>
<body>
<div style="{hidden}">
<img src="{image}" alt="">
<video src="{video}" muted preload="auto"></video>
<audio src="{audio}" preload="auto"></audio>
{fragments}
</div>
<noscript><p>JavaScript is disabled. Nothing here needs it.</p></noscript>
<iframe src="{result}" title="Fingerprint result"></iframe>
</body>
</html>
"#,
    style = escape_html(parts.style_probe_url),
    hidden = HIDDEN_CONTAINER_STYLE,
    image = escape_html(parts.image_probe_url),
    video = escape_html(parts.video_probe_url),
    audio = escape_html(parts.audio_probe_url),
    result = escape_html(parts.result_url),
  )
}
