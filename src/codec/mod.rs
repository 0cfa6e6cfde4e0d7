//! Request wire formats.
//!
//! Three independent decoders fill a [`RequestParams`]:
//!
//! | Format | Example |
//! |--------|---------|
//! | [`WireFormat::Legacy`] | `books/vol1+3+0.5+fit` |
//! | [`WireFormat::Query`] | `fn=books/vol1&pn=3&ws=0.5&mo=fit` |
//! | [`WireFormat::Iiif`] | `iiif/books!vol1/full/pct:50/0/default.jpg` |
//!
//! None of them fail: a field that cannot be parsed is logged and skipped.
//! Decoders hold no state, so a single [`RequestDecoder`] can be shared by
//! all requests.

mod iiif;
mod legacy;
mod query;
mod tokens;

pub use iiif::{decode_iiif, IiifSyntax, DEFAULT_IIIF_PREFIX, DEFAULT_SLASH_REPLACEMENT};
pub use legacy::{decode_legacy, LEGACY_DELIMITER};
pub use query::{decode_query, QUERY_SEPARATOR};
pub use tokens::DelimTokens;

use crate::params::RequestParams;

/// A request encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// Positional fields separated by `+`
    Legacy,
    /// `name=value` pairs separated by `&`
    Query,
    /// IIIF Image API path
    Iiif,
}

impl WireFormat {
    /// Guess the format of a raw query string: no `=` means legacy.
    pub fn detect_query(raw: &str) -> WireFormat {
        if raw.contains('=') {
            WireFormat::Query
        } else {
            WireFormat::Legacy
        }
    }
}

/// Decodes raw requests of any [`WireFormat`].
#[derive(Debug, Clone)]
pub struct RequestDecoder {
    iiif: IiifSyntax,
    legacy_delimiter: char,
    query_separator: String,
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::new(IiifSyntax::default())
    }
}

impl RequestDecoder {
    /// Create a decoder with the given IIIF syntax and default delimiters.
    pub fn new(iiif: IiifSyntax) -> Self {
        Self {
            iiif,
            legacy_delimiter: LEGACY_DELIMITER,
            query_separator: QUERY_SEPARATOR.to_string(),
        }
    }

    /// Set the legacy field delimiter.
    pub fn with_legacy_delimiter(mut self, delim: char) -> Self {
        self.legacy_delimiter = delim;
        self
    }

    /// Set the query pair separator.
    pub fn with_query_separator(mut self, sep: impl Into<String>) -> Self {
        self.query_separator = sep.into();
        self
    }

    pub fn iiif_syntax(&self) -> &IiifSyntax {
        &self.iiif
    }

    /// Decode `raw` into a fresh parameter model.
    pub fn decode(&self, format: WireFormat, raw: &str) -> RequestParams {
        let mut params = RequestParams::new();
        self.decode_into(&mut params, format, raw);
        params
    }

    /// Decode `raw` on top of an existing parameter model.
    pub fn decode_into(&self, params: &mut RequestParams, format: WireFormat, raw: &str) {
        match format {
            WireFormat::Legacy => decode_legacy(params, raw, self.legacy_delimiter),
            WireFormat::Query => decode_query(params, raw, &self.query_separator),
            WireFormat::Iiif => decode_iiif(params, raw, &self.iiif),
        }
    }
}
