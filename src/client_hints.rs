//! Client-hint aggregation for the `Accept-CH` response header.

use crate::signal::{Catalog, SignalKind};

/// Header names of every client-hint header signal, in catalog order.
/// Duplicates are kept.
pub fn client_hint_headers(catalog: &Catalog) -> Vec<&str> {
  catalog
    .iter()
    .filter_map(|source| match &source.kind {
      SignalKind::HttpHeader {
        header,
        client_hint: true,
        ..
      } => Some(header.as_str()),
      _ => None,
    })
    .collect()
}

/// `Accept-CH` value: the result frame's headers first, then the catalog's.
pub fn accept_ch_value(delay_headers: &[String], catalog: &Catalog) -> String {
  delay_headers
    .iter()
    .map(String::as_str)
    .chain(client_hint_headers(catalog))
    .collect::<Vec<_>>()
    .join(", ")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::signal::{ResourceType, SignalSource};

  fn catalog() -> Catalog {
    Catalog::new(vec![
      SignalSource::http_header("ua", "User-Agent", ResourceType::Image, false),
      SignalSource::http_header("arch", "Sec-CH-UA-Arch", ResourceType::Image, true),
      SignalSource::font_absence("font_arial", "Arial"),
      SignalSource::http_header("model", "Sec-CH-UA-Model", ResourceType::Style, true),
      SignalSource::http_header("arch_style", "Sec-CH-UA-Arch", ResourceType::Style, true),
    ])
  }

  #[test]
  fn test_collects_only_client_hints_in_order() {
    assert_eq!(
      client_hint_headers(&catalog()),
      vec!["Sec-CH-UA-Arch", "Sec-CH-UA-Model", "Sec-CH-UA-Arch"]
    );
  }

  #[test]
  fn test_accept_ch_puts_delay_headers_first() {
    let delay = vec!["Sec-CH-UA-Full-Version-List".to_string()];
    assert_eq!(
      accept_ch_value(&delay, &catalog()),
      "Sec-CH-UA-Full-Version-List, Sec-CH-UA-Arch, Sec-CH-UA-Model, Sec-CH-UA-Arch"
    );
  }

  #[test]
  fn test_accept_ch_empty() {
    assert_eq!(accept_ch_value(&[], &Catalog::default()), "");
  }
}
