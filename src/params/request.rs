//! The request parameter model.
//!
//! [`RequestParams`] is an insertion-ordered map from parameter name to
//! [`Parameter`], pre-populated with the known schema. Decoders write into it;
//! the resolver reads the canonical file path from it and writes client
//! information back.

use std::collections::HashMap;

use tracing::debug;

use crate::dir::normalize_path;
use crate::error::ParamError;

use super::options::OptionSet;
use super::value::{ParamKind, ParamValue, Parameter, ValueType};

// =============================================================================
// Parameter Names
// =============================================================================

/// Resource path (second part, relative to `request.path`)
pub const FN: &str = "fn";
/// 1-based page number
pub const PN: &str = "pn";
/// Display width in pixels
pub const DW: &str = "dw";
/// Display height in pixels
pub const DH: &str = "dh";
/// Region left edge (0..1)
pub const WX: &str = "wx";
/// Region top edge (0..1)
pub const WY: &str = "wy";
/// Region width (0..1)
pub const WW: &str = "ww";
/// Region height (0..1)
pub const WH: &str = "wh";
/// Scale factor
pub const WS: &str = "ws";
/// Option flags
pub const MO: &str = "mo";
/// Marks
pub const MK: &str = "mk";
/// Total number of pages
pub const PT: &str = "pt";
/// Rotation in degrees
pub const ROT: &str = "rot";
pub const CONT: &str = "cont";
pub const BRGT: &str = "brgt";
pub const RGBM: &str = "rgbm";
pub const RGBA: &str = "rgba";
pub const DDPI: &str = "ddpi";
pub const DDPIX: &str = "ddpix";
pub const DDPIY: &str = "ddpiy";
/// Scale factor for `mo=ascale`
pub const SCALE: &str = "scale";
/// Color operation
pub const COLOP: &str = "colop";

/// Path prefix (first part of the resource path), set by the server
pub const REQUEST_PATH: &str = "request.path";
pub const BASE_URL: &str = "base.url";

/// Resolved file name
pub const IMG_FN: &str = "img.fn";
pub const IMG_DPIX: &str = "img.dpix";
pub const IMG_DPIY: &str = "img.dpiy";
pub const IMG_PIX_X: &str = "img.pix_x";
pub const IMG_PIX_Y: &str = "img.pix_y";

// =============================================================================
// Option Flags
// =============================================================================

/// Answer errors with HTTP status codes
pub const OPT_ERRCODE: &str = "errcode";
/// Request is for image information only
pub const OPT_INFO: &str = "info";
/// Scale relative to the original size using `scale`
pub const OPT_ASCALE: &str = "ascale";
/// Fit the image into the display size
pub const OPT_FIT: &str = "fit";
/// Force JPEG output
pub const OPT_JPG: &str = "jpg";
/// Force PNG output
pub const OPT_PNG: &str = "png";

// =============================================================================
// RequestParams
// =============================================================================

/// All parameters of one image request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParams {
    params: Vec<Parameter>,
    index: HashMap<String, usize>,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestParams {
    /// Create a parameter model populated with the default schema.
    pub fn new() -> Self {
        use ParamKind::{Client, Internal, Wire};

        let mut params = Self {
            params: Vec::with_capacity(32),
            index: HashMap::with_capacity(32),
        };

        params.declare(Parameter::with_default(FN, Wire, "".into()));
        params.declare(Parameter::with_default(PN, Wire, 1.into()));
        params.declare(Parameter::with_default(DW, Wire, 0.into()));
        params.declare(Parameter::with_default(DH, Wire, 0.into()));
        params.declare(Parameter::with_default(WX, Wire, 0.0.into()));
        params.declare(Parameter::with_default(WY, Wire, 0.0.into()));
        params.declare(Parameter::with_default(WW, Wire, 1.0.into()));
        params.declare(Parameter::with_default(WH, Wire, 1.0.into()));
        params.declare(Parameter::with_default(WS, Wire, 1.0.into()));
        params.declare(Parameter::with_default(MO, Wire, OptionSet::new().into()));
        params.declare(Parameter::with_default(MK, Wire, "".into()));
        params.declare(Parameter::with_default(PT, Wire, 0.into()));
        params.declare(Parameter::with_default(ROT, Wire, 0.0.into()));
        params.declare(Parameter::with_default(CONT, Wire, 0.0.into()));
        params.declare(Parameter::with_default(BRGT, Wire, 0.0.into()));
        params.declare(Parameter::with_default(RGBM, Wire, "0/0/0".into()));
        params.declare(Parameter::with_default(RGBA, Wire, "0/0/0".into()));
        params.declare(Parameter::with_default(DDPI, Wire, 0.0.into()));
        params.declare(Parameter::with_default(DDPIX, Wire, 0.0.into()));
        params.declare(Parameter::with_default(DDPIY, Wire, 0.0.into()));
        params.declare(Parameter::with_default(SCALE, Wire, 1.0.into()));
        params.declare(Parameter::with_default(COLOP, Wire, "".into()));

        params.declare(Parameter::with_default(REQUEST_PATH, Internal, "".into()));
        params.declare(Parameter::declare(BASE_URL, Internal, ValueType::Str));

        params.declare(Parameter::with_default(IMG_FN, Client, "".into()));
        params.declare(Parameter::with_default(IMG_DPIX, Client, 0.0.into()));
        params.declare(Parameter::with_default(IMG_DPIY, Client, 0.0.into()));
        params.declare(Parameter::with_default(IMG_PIX_X, Client, 0.into()));
        params.declare(Parameter::with_default(IMG_PIX_Y, Client, 0.into()));

        params
    }

    fn declare(&mut self, param: Parameter) {
        match self.index.get(param.name()) {
            Some(&i) => self.params[i] = param,
            None => {
                self.index.insert(param.name().to_string(), self.params.len());
                self.params.push(param);
            }
        }
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Result<&Parameter, ParamError> {
        self.index
            .get(name)
            .map(|&i| &self.params[i])
            .ok_or_else(|| ParamError::UnknownParameter(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Parameter, ParamError> {
        match self.index.get(name) {
            Some(&i) => Ok(&mut self.params[i]),
            None => Err(ParamError::UnknownParameter(name.to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Set a parameter from text, coercing to its declared type.
    ///
    /// Returns `Ok(false)` if the text did not parse; the previous value is
    /// kept in that case.
    pub fn set_from_str(&mut self, name: &str, text: &str) -> Result<bool, ParamError> {
        let param = self.get_mut(name)?;
        let ok = param.set_from_str(text);
        if !ok {
            debug!(param = name, value = text, "Ignoring unparseable parameter value");
        }
        Ok(ok)
    }

    /// Set a typed value. Returns `Ok(false)` if the value type does not match.
    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<bool, ParamError> {
        Ok(self.get_mut(name)?.set(value.into()))
    }

    /// Revert a parameter to its default.
    pub fn clear(&mut self, name: &str) -> Result<(), ParamError> {
        self.get_mut(name)?.clear();
        Ok(())
    }

    /// Store a parameter whose name is not part of the schema.
    ///
    /// The parameter is appended as an `Unknown` string on first sight and
    /// overwritten afterwards.
    pub fn add_unknown(&mut self, name: &str, value: &str) {
        if let Ok(param) = self.get_mut(name) {
            param.set_from_str(value);
            return;
        }
        let mut param = Parameter::declare(name, ParamKind::Unknown, ValueType::Str);
        param.set_from_str(value);
        self.declare(param);
    }

    /// Iterate over all parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// The effective string value of `name`.
    pub fn str_value(&self, name: &str) -> Option<&str> {
        self.get(name).ok()?.as_str()
    }

    /// The effective integer value of `name`.
    pub fn int_value(&self, name: &str) -> Option<i64> {
        self.get(name).ok()?.as_int()
    }

    /// The effective float value of `name`.
    pub fn float_value(&self, name: &str) -> Option<f64> {
        self.get(name).ok()?.as_float()
    }

    /// Whether `name` has been explicitly set.
    pub fn has_value(&self, name: &str) -> bool {
        self.get(name).map(Parameter::has_value).unwrap_or(false)
    }

    // -------------------------------------------------------------------------
    // Options
    // -------------------------------------------------------------------------

    /// The current option set.
    pub fn options(&self) -> OptionSet {
        self.get(MO)
            .ok()
            .and_then(Parameter::as_options)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether the option flag is set.
    pub fn has_option(&self, flag: &str) -> bool {
        self.get(MO)
            .ok()
            .and_then(Parameter::as_options)
            .map(|o| o.contains(flag))
            .unwrap_or(false)
    }

    /// Add an option flag.
    pub fn set_option(&mut self, flag: &str) {
        if let Some(options) = self.get_mut(MO).ok().and_then(Parameter::options_mut) {
            options.insert(flag);
        }
    }

    // -------------------------------------------------------------------------
    // Derived values
    // -------------------------------------------------------------------------

    /// The canonical file path: `request.path` + `fn`, normalized.
    ///
    /// Returns `None` if the joined path contains a `..` segment.
    pub fn file_path(&self) -> Option<String> {
        let prefix = self.str_value(REQUEST_PATH).unwrap_or("");
        let name = self.str_value(FN).unwrap_or("");
        normalize_path(&format!("{}{}", prefix, name))
    }

    /// The 1-based page number.
    pub fn page_number(&self) -> i64 {
        self.int_value(PN).unwrap_or(1)
    }

    /// Serialize the wire parameters as `name=value` pairs joined by `&`.
    ///
    /// Only `Wire` parameters with a set value are emitted. `fn` is emitted as
    /// `request.path` followed by `fn` whenever either of them is set.
    pub fn to_wire_string(&self) -> String {
        let mut parts = Vec::new();

        for param in &self.params {
            if param.kind() != ParamKind::Wire {
                continue;
            }
            if param.name() == FN {
                if param.has_value() || self.has_value(REQUEST_PATH) {
                    let prefix = self.str_value(REQUEST_PATH).unwrap_or("");
                    let full = format!("{}{}", prefix, param.to_wire_string());
                    parts.push(format!("{}={}", FN, encode_component(&full)));
                }
                continue;
            }
            if !param.has_value() {
                continue;
            }
            parts.push(format!(
                "{}={}",
                encode_component(param.name()),
                encode_component(&param.to_wire_string())
            ));
        }

        parts.join("&")
    }
}

/// Percent-encode a wire component, keeping `/` and `,` readable.
fn encode_component(text: &str) -> String {
    urlencoding::encode(text)
        .replace("%2F", "/")
        .replace("%2C", ",")
}
