//! IIIF Image API path format.
//!
//! ```text
//! {prefix}/{identifier}/{region}/{size}/{rotation}/{quality}.{format}
//! ```
//!
//! The path is decoded by a six-stage state machine. Each stage takes one
//! token, plus the delimiter after it, and hands over to the next stage. An
//! empty segment (`//`) skips a stage without shifting the later ones. There
//! is no backtracking, and a stage that fails to parse its token logs the
//! failure and lets the next stage run.
//!
//! Two conditions stop decoding early:
//!
//! - region is `info.json`, or missing entirely: the request is an info request
//! - size is missing: the request is for the full-size image
//!
//! # Example
//!
//! ```
//! use docuserver::codec::{decode_iiif, IiifSyntax};
//! use docuserver::params::{RequestParams, WX, OPT_ASCALE};
//!
//! let mut params = RequestParams::new();
//! decode_iiif(&mut params, "iiif/books!vol1/pct:10,20,30,40/pct:50/0/default.jpg", &IiifSyntax::default());
//!
//! assert_eq!(params.str_value("fn"), Some("books/vol1"));
//! assert_eq!(params.float_value(WX), Some(0.1));
//! assert!(params.has_option(OPT_ASCALE));
//! ```

use tracing::{debug, error, warn};

use crate::params::{
    RequestParams, COLOP, DH, DW, FN, OPT_ASCALE, OPT_ERRCODE, OPT_INFO, OPT_JPG, OPT_PNG, ROT,
    SCALE, WH, WW, WX, WY,
};

use super::query::form_decode;
use super::tokens::DelimTokens;

/// Default IIIF path prefix.
pub const DEFAULT_IIIF_PREFIX: &str = "iiif";

/// Default string standing in for `/` inside identifiers.
pub const DEFAULT_SLASH_REPLACEMENT: &str = "!";

/// Server-specific parts of the IIIF path syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IiifSyntax {
    /// Expected first path segment
    pub prefix: String,

    /// Replaced by `/` in decoded identifiers (None = no replacement)
    pub slash_replacement: Option<String>,
}

impl Default for IiifSyntax {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_IIIF_PREFIX.to_string(),
            slash_replacement: Some(DEFAULT_SLASH_REPLACEMENT.to_string()),
        }
    }
}

impl IiifSyntax {
    /// Create a syntax with the given prefix and the default slash replacement.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn with_slash_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.slash_replacement = Some(replacement.into());
        self
    }

    pub fn without_slash_replacement(mut self) -> Self {
        self.slash_replacement = None;
        self
    }

    /// Turn a raw identifier segment into a resource path.
    pub fn decode_identifier(&self, raw: &str) -> Option<String> {
        let decoded = form_decode(raw)?;
        match &self.slash_replacement {
            Some(r) if !r.is_empty() && decoded.contains(r.as_str()) => {
                Some(decoded.replace(r.as_str(), "/"))
            }
            _ => Some(decoded),
        }
    }
}

// =============================================================================
// State Machine
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Prefix,
    Identifier,
    Region,
    Size,
    Rotation,
    QualityFormat,
    Done,
}

impl Stage {
    fn next(self) -> Stage {
        match self {
            Stage::Prefix => Stage::Identifier,
            Stage::Identifier => Stage::Region,
            Stage::Region => Stage::Size,
            Stage::Size => Stage::Rotation,
            Stage::Rotation => Stage::QualityFormat,
            Stage::QualityFormat | Stage::Done => Stage::Done,
        }
    }
}

/// Outcome of one stage.
enum Step {
    Next,
    Stop,
}

/// Decode an IIIF Image API path into `params`.
///
/// `path` must not be percent-decoded and must not start with `/`.
/// Decoding always sets the `errcode` option.
pub fn decode_iiif(params: &mut RequestParams, path: &str, syntax: &IiifSyntax) {
    params.set_option(OPT_ERRCODE);

    let mut tokens = DelimTokens::new(path, '/');
    let mut stage = Stage::Prefix;

    while stage != Stage::Done {
        let token = tokens.next();
        // a lone delimiter is an empty segment
        let value = token.filter(|t| !tokens.is_delim(t));

        let step = match stage {
            Stage::Prefix => prefix_stage(token, syntax),
            Stage::Identifier => identifier_stage(params, value, syntax),
            Stage::Region => match token {
                None => info_request(params),
                Some(_) => region_stage(params, value),
            },
            Stage::Size => match token {
                None => full_size(params),
                Some(_) => size_stage(params, value),
            },
            Stage::Rotation => rotation_stage(params, value),
            Stage::QualityFormat => quality_format_stage(params, value),
            Stage::Done => Step::Stop,
        };

        if value.is_some() {
            tokens.skip_delim();
        }

        stage = match step {
            Step::Next => stage.next(),
            Step::Stop => Stage::Done,
        };
    }
}

fn prefix_stage(token: Option<&str>, syntax: &IiifSyntax) -> Step {
    if let Some(token) = token {
        if token != syntax.prefix {
            warn!(
                expected = %syntax.prefix,
                found = token,
                "IIIF path does not start with prefix"
            );
        }
    }
    Step::Next
}

fn identifier_stage(params: &mut RequestParams, value: Option<&str>, syntax: &IiifSyntax) -> Step {
    // missing identifier means the root directory
    if let Some(raw) = value {
        match syntax.decode_identifier(raw) {
            Some(id) => {
                let _ = params.set(FN, id);
            }
            None => error!(identifier = raw, "Error decoding identifier in IIIF path"),
        }
    }
    Step::Next
}

fn info_request(params: &mut RequestParams) -> Step {
    params.set_option(OPT_INFO);
    Step::Stop
}

fn region_stage(params: &mut RequestParams, value: Option<&str>) -> Step {
    let Some(region) = value else {
        return Step::Next;
    };

    if region == "info.json" {
        return info_request(params);
    }
    if region == "full" {
        return Step::Next;
    }
    if let Some(pct) = region.strip_prefix("pct:") {
        match parse_floats::<4>(pct) {
            Some([x, y, w, h]) => {
                let _ = params.set(WX, x / 100.0);
                let _ = params.set(WY, y / 100.0);
                let _ = params.set(WW, w / 100.0);
                let _ = params.set(WH, h / 100.0);
            }
            None => error!(region = region, "Error parsing region parameter in IIIF path"),
        }
        return Step::Next;
    }

    error!(region = region, "Pixel regions are not implemented, using full region");
    Step::Next
}

fn full_size(params: &mut RequestParams) -> Step {
    set_auto_scale(params, 1.0);
    Step::Stop
}

fn size_stage(params: &mut RequestParams, value: Option<&str>) -> Step {
    let Some(size) = value else {
        return Step::Next;
    };

    if size == "full" || size == "max" {
        set_auto_scale(params, 1.0);
        return Step::Next;
    }
    if let Some(pct) = size.strip_prefix("pct:") {
        match pct.trim().parse::<f64>() {
            Ok(pct) if pct.is_finite() => set_auto_scale(params, pct / 100.0),
            _ => error!(size = size, "Error parsing size parameter in IIIF path"),
        }
        return Step::Next;
    }

    // w,h in pixels. A leading '!' asks for a bounding box; width and height
    // are applied independently either way.
    let mut parts = size.split(',');
    if let Some(width) = parts.next().filter(|w| !w.is_empty()) {
        let width = width.strip_prefix('!').unwrap_or(width);
        let _ = params.set_from_str(DW, width);
    }
    match parts.next() {
        Some(height) if !height.is_empty() => {
            let _ = params.set_from_str(DH, height);
        }
        Some(_) => {}
        None => error!(size = size, "Error parsing size parameter in IIIF path"),
    }
    Step::Next
}

fn set_auto_scale(params: &mut RequestParams, scale: f64) {
    params.set_option(OPT_ASCALE);
    let _ = params.set(SCALE, scale);
}

fn rotation_stage(params: &mut RequestParams, value: Option<&str>) -> Step {
    if let Some(rotation) = value {
        let _ = params.set_from_str(ROT, rotation);
    }
    Step::Next
}

fn quality_format_stage(params: &mut RequestParams, value: Option<&str>) -> Step {
    let Some(token) = value else {
        return Step::Next;
    };

    let (quality, format) = match token.split_once('.') {
        Some((q, f)) => (q, Some(f)),
        None => (token, None),
    };

    if quality == "grey" || quality == "gray" {
        let _ = params.set(COLOP, "grayscale");
    }
    match format {
        Some("jpg") => params.set_option(OPT_JPG),
        Some("png") => params.set_option(OPT_PNG),
        Some(_) => {}
        None => debug!(token = token, "IIIF quality segment has no format"),
    }
    Step::Next
}

/// Parse exactly `N` comma-separated floats.
fn parse_floats<const N: usize>(text: &str) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    let mut parts = text.split(',');
    for slot in out.iter_mut() {
        let value: f64 = parts.next()?.trim().parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        *slot = value;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}
