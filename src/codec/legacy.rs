//! Legacy positional format.
//!
//! ```text
//! fn+pn+ws+mo+mk+wx+wy+ww+wh
//! ```
//!
//! Fields are positional and separated by a single delimiter (`+` by
//! default). Two consecutive delimiters mean the field between them was
//! omitted. Input may stop after any field.

use crate::params::{RequestParams, FN, MK, MO, PN, WH, WS, WW, WX, WY};

use super::tokens::DelimTokens;

/// Default field delimiter.
pub const LEGACY_DELIMITER: char = '+';

/// Field order of the legacy format.
const FIELDS: [&str; 9] = [FN, PN, WS, MO, MK, WX, WY, WW, WH];

/// Decode a legacy request string into `params`.
///
/// Fields that fail to parse are left at their previous value. This never
/// fails, whatever the input.
pub fn decode_legacy(params: &mut RequestParams, input: &str, delim: char) {
    let mut tokens = DelimTokens::new(input, delim);

    for name in FIELDS {
        let Some(field) = tokens.next_field() else {
            break;
        };
        if let Some(text) = field {
            // schema names never miss
            let _ = params.set_from_str(name, text);
        }
    }
}
