//! OS-specific font lists probed for absence.
//!
//! Each list holds fonts that ship with one platform and are rare elsewhere,
//! so which of them resolve locally says a lot about the operating system.

const WINDOWS_FONTS: &[&str] = &[
  "Calibri",
  "Cambria",
  "Candara",
  "Consolas",
  "Constantia",
  "Corbel",
  "Ebrima",
  "Gadugi",
  "Leelawadee UI",
  "Malgun Gothic",
  "Microsoft Himalaya",
  "Microsoft JhengHei",
  "Microsoft YaHei",
  "MS Gothic",
  "Segoe Print",
  "Segoe Script",
  "Segoe UI",
  "Segoe UI Emoji",
  "Sylfaen",
  "Yu Gothic",
];

const MAC_FONTS: &[&str] = &[
  "American Typewriter",
  "Apple Chancery",
  "Apple Color Emoji",
  "Apple SD Gothic Neo",
  "Avenir",
  "Avenir Next",
  "Baskerville",
  "Chalkboard SE",
  "Didot",
  "Futura",
  "Geneva",
  "Helvetica Neue",
  "Hiragino Sans",
  "Lucida Grande",
  "Menlo",
  "Monaco",
  "Optima",
  "PingFang SC",
  "SF Pro",
  "Skia",
];

const LINUX_FONTS: &[&str] = &[
  "Cantarell",
  "DejaVu Sans",
  "DejaVu Sans Mono",
  "DejaVu Serif",
  "Droid Sans",
  "FreeMono",
  "FreeSans",
  "Liberation Mono",
  "Liberation Sans",
  "Liberation Serif",
  "Noto Color Emoji",
  "Noto Sans",
  "Noto Serif",
  "Ubuntu",
  "Ubuntu Mono",
];

/// Fonts common enough everywhere that their absence is itself unusual.
const COMMON_FONTS: &[&str] = &[
  "Arial",
  "Courier New",
  "Georgia",
  "Times New Roman",
  "Trebuchet MS",
  "Verdana",
];

/// Every font the default catalog probes, in a stable order and without
/// duplicates.
pub fn probe_fonts() -> Vec<&'static str> {
  let mut fonts: Vec<&'static str> = Vec::new();

  for list in [COMMON_FONTS, WINDOWS_FONTS, MAC_FONTS, LINUX_FONTS] {
    for font in list {
      if !fonts.contains(font) {
        fonts.push(*font);
      }
    }
  }

  fonts
}

/// Signal key for a font: `font_` followed by the lowercased name with runs
/// of non-alphanumerics collapsed to `_`.
pub fn font_key(font: &str) -> String {
  let mut key = String::from("font_");
  let mut pending_separator = false;

  for c in font.chars() {
    if c.is_ascii_alphanumeric() {
      if pending_separator && !key.ends_with('_') {
        key.push('_');
      }
      key.push(c.to_ascii_lowercase());
      pending_separator = false;
    } else {
      pending_separator = true;
    }
  }

  key
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_probe_fonts_cover_every_platform() {
    let fonts = probe_fonts();
    for font in ["Calibri", "Segoe UI", "Helvetica Neue", "DejaVu Sans"] {
      assert!(fonts.contains(&font), "{font} missing");
    }
  }

  #[test]
  fn test_probe_fonts_no_duplicates() {
    let fonts = probe_fonts();
    let mut sorted = fonts.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), fonts.len());
    assert_eq!(fonts.first(), Some(&"Arial"));
  }

  #[test]
  fn test_font_key() {
    assert_eq!(font_key("Arial"), "font_arial");
    assert_eq!(font_key("Segoe UI Emoji"), "font_segoe_ui_emoji");
    assert_eq!(font_key("  Leelawadee  UI "), "font_leelawadee_ui");
  }

  #[test]
  fn test_font_keys_are_unique() {
    let fonts = probe_fonts();
    let mut keys: Vec<String> = fonts.iter().map(|f| font_key(f)).collect();
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), fonts.len());
  }
}
