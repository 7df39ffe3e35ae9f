//! Default signal catalog served by the probe page.

use std::sync::Arc;

use lazy_static::lazy_static;

use super::fonts::{font_key, probe_fonts};
use super::{Breakpoints, Catalog, RangeFeature, ResourceType, SignalSource};

lazy_static! {
  pub static ref DEFAULT_CATALOG: Arc<Catalog> = Arc::new(default_catalog());
}

/// `@supports` probes: the background only applies when the declaration parses.
fn supports(key: &str, condition: &'static str) -> SignalSource {
  SignalSource::presence(key, move |class, style| {
    format!("@supports {condition} {{ .{class} {{ {style} }} }}")
  })
}

pub fn default_catalog() -> Catalog {
  let mut sources = vec![
    supports("supports_grid", "(display: grid)"),
    supports("supports_container_queries", "(container-type: inline-size)"),
    supports("supports_has_selector", "selector(:has(a))"),
    supports("supports_backdrop_filter", "(backdrop-filter: blur(1px))"),
    supports("supports_webkit_touch_callout", "(-webkit-touch-callout: none)"),
    supports("supports_moz_appearance", "(-moz-appearance: none)"),
    supports("supports_color_mix", "(color: color-mix(in srgb, red, blue))"),
    // Fires when scripting is switched off or the engine doesn't run scripts.
    SignalSource::presence("scripting_disabled", |class, style| {
      format!("@media (scripting: none) {{ .{class} {{ {style} }} }}")
    }),
  ];

  sources.extend([
    SignalSource::media_enum(
      "prefers_color_scheme",
      "prefers-color-scheme",
      &["light", "dark"],
    ),
    SignalSource::media_enum(
      "prefers_reduced_motion",
      "prefers-reduced-motion",
      &["no-preference", "reduce"],
    ),
    SignalSource::media_enum(
      "prefers_reduced_transparency",
      "prefers-reduced-transparency",
      &["no-preference", "reduce"],
    ),
    SignalSource::media_enum(
      "prefers_contrast",
      "prefers-contrast",
      &["no-preference", "more", "less", "custom"],
    ),
    SignalSource::media_enum("forced_colors", "forced-colors", &["none", "active"]),
    SignalSource::media_enum("inverted_colors", "inverted-colors", &["none", "inverted"]),
    SignalSource::media_enum("pointer", "pointer", &["none", "coarse", "fine"]),
    SignalSource::media_enum("any_pointer", "any-pointer", &["none", "coarse", "fine"]),
    SignalSource::media_enum("hover", "hover", &["none", "hover"]),
    SignalSource::media_enum("any_hover", "any-hover", &["none", "hover"]),
    SignalSource::media_enum("orientation", "orientation", &["portrait", "landscape"]),
    SignalSource::media_enum(
      "display_mode",
      "display-mode",
      &["browser", "minimal-ui", "standalone", "fullscreen"],
    ),
    SignalSource::media_enum("update", "update", &["none", "slow", "fast"]),
    SignalSource::media_enum("overflow_block", "overflow-block", &["none", "scroll", "paged"]),
  ]);

  sources.extend([
    SignalSource::media_number(
      "device_pixel_ratio",
      RangeFeature::new(
        "device-pixel-ratio",
        Breakpoints::Explicit(vec![
          0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0, 2.25, 2.5, 3.0, 3.5, 4.0,
        ]),
      )
      .with_vendor_prefix("-webkit-"),
    ),
    SignalSource::media_number(
      "resolution",
      RangeFeature::new(
        "resolution",
        Breakpoints::Stepped {
          start: 0.5,
          end: 4.0,
          step: 0.25,
        },
      )
      .with_unit("dppx"),
    ),
    SignalSource::media_number(
      "device_width",
      RangeFeature::new(
        "device-width",
        Breakpoints::Stepped {
          start: 320.0,
          end: 3840.0,
          step: 16.0,
        },
      )
      .with_unit("px"),
    ),
    SignalSource::media_number(
      "device_height",
      RangeFeature::new(
        "device-height",
        Breakpoints::Stepped {
          start: 320.0,
          end: 2560.0,
          step: 16.0,
        },
      )
      .with_unit("px"),
    ),
    SignalSource::media_number(
      "viewport_width",
      RangeFeature::new(
        "width",
        Breakpoints::Stepped {
          start: 320.0,
          end: 3840.0,
          step: 32.0,
        },
      )
      .with_unit("px"),
    ),
    SignalSource::media_number(
      "viewport_height",
      RangeFeature::new(
        "height",
        Breakpoints::Stepped {
          start: 240.0,
          end: 2560.0,
          step: 32.0,
        },
      )
      .with_unit("px"),
    ),
    SignalSource::media_number(
      "color_bits",
      RangeFeature::new(
        "color",
        Breakpoints::Stepped {
          start: 1.0,
          end: 16.0,
          step: 1.0,
        },
      ),
    ),
    SignalSource::media_number(
      "monochrome_bits",
      RangeFeature::new("monochrome", Breakpoints::Explicit(vec![1.0, 2.0, 4.0, 8.0])),
    ),
  ]);

  sources.extend(
    probe_fonts()
      .into_iter()
      .map(|font| SignalSource::font_absence(font_key(font), font)),
  );

  sources.extend([
    SignalSource::http_header("header_user_agent", "User-Agent", ResourceType::Image, false),
    SignalSource::http_header("header_accept_style", "Accept", ResourceType::Style, false),
    SignalSource::http_header("header_accept_image", "Accept", ResourceType::Image, false),
    SignalSource::http_header("header_accept_video", "Accept", ResourceType::Video, false),
    SignalSource::http_header("header_accept_audio", "Accept", ResourceType::Audio, false),
    SignalSource::http_header(
      "header_accept_language",
      "Accept-Language",
      ResourceType::Style,
      false,
    ),
    SignalSource::http_header(
      "header_accept_encoding",
      "Accept-Encoding",
      ResourceType::Style,
      false,
    ),
    SignalSource::http_header("header_dnt", "DNT", ResourceType::Image, false),
    SignalSource::http_header("header_sec_gpc", "Sec-GPC", ResourceType::Image, false),
    SignalSource::http_header("header_sec_ch_ua", "Sec-CH-UA", ResourceType::Image, false),
    SignalSource::http_header(
      "header_sec_ch_ua_mobile",
      "Sec-CH-UA-Mobile",
      ResourceType::Image,
      false,
    ),
    SignalSource::http_header(
      "header_sec_ch_ua_platform",
      "Sec-CH-UA-Platform",
      ResourceType::Image,
      false,
    ),
    SignalSource::http_header(
      "header_sec_ch_ua_arch",
      "Sec-CH-UA-Arch",
      ResourceType::Image,
      true,
    ),
    SignalSource::http_header(
      "header_sec_ch_ua_bitness",
      "Sec-CH-UA-Bitness",
      ResourceType::Image,
      true,
    ),
    SignalSource::http_header(
      "header_sec_ch_ua_model",
      "Sec-CH-UA-Model",
      ResourceType::Image,
      true,
    ),
    SignalSource::http_header(
      "header_sec_ch_ua_wow64",
      "Sec-CH-UA-WoW64",
      ResourceType::Image,
      true,
    ),
    SignalSource::http_header(
      "header_sec_ch_ua_form_factors",
      "Sec-CH-UA-Form-Factors",
      ResourceType::Image,
      true,
    ),
    SignalSource::http_header(
      "header_sec_ch_prefers_color_scheme",
      "Sec-CH-Prefers-Color-Scheme",
      ResourceType::Style,
      true,
    ),
    SignalSource::http_header(
      "header_sec_ch_prefers_reduced_motion",
      "Sec-CH-Prefers-Reduced-Motion",
      ResourceType::Style,
      true,
    ),
    SignalSource::http_header(
      "header_sec_ch_viewport_width",
      "Sec-CH-Viewport-Width",
      ResourceType::Image,
      true,
    ),
    SignalSource::http_header(
      "header_sec_ch_dpr",
      "Sec-CH-DPR",
      ResourceType::Image,
      true,
    ),
    SignalSource::http_header(
      "header_device_memory",
      "Device-Memory",
      ResourceType::Image,
      true,
    ),
    SignalSource::http_header("header_downlink", "Downlink", ResourceType::Image, true),
    SignalSource::http_header("header_ect", "ECT", ResourceType::Image, true),
    SignalSource::http_header("header_rtt", "RTT", ResourceType::Image, true),
    SignalSource::http_header("header_save_data", "Save-Data", ResourceType::Image, true),
  ]);

  Catalog::new(sources)
}
