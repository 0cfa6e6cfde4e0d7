//! Query-string format: `fn=books/vol1&pn=3&mo=fit`.

use std::borrow::Cow;

use tracing::{debug, warn};

use crate::params::{ParamKind, RequestParams};

/// Default pair separator.
pub const QUERY_SEPARATOR: &str = "&";

/// Decode `name=value` pairs separated by `sep` into `params`.
///
/// Names and values are form-decoded (`+` is a space, then percent-decoding).
/// Internal parameters cannot be set this way. Names outside the schema are
/// kept as `Unknown` parameters. A pair that fails to decode is skipped
/// without affecting the others.
pub fn decode_query(params: &mut RequestParams, input: &str, sep: &str) {
    if input.is_empty() || sep.is_empty() {
        return;
    }

    for pair in input.split(sep) {
        if pair.is_empty() {
            continue;
        }
        let Some((raw_name, raw_value)) = pair.split_once('=') else {
            debug!(pair = pair, "Skipping query pair without value");
            continue;
        };

        let (name, value) = match (form_decode(raw_name), form_decode(raw_value)) {
            (Some(name), Some(value)) => (name, value),
            _ => {
                warn!(pair = pair, "Skipping query pair with invalid percent-encoding");
                continue;
            }
        };

        match params.get(&name).map(|p| p.kind()) {
            Ok(ParamKind::Internal) => {
                debug!(param = %name, "Ignoring internal parameter from request");
            }
            Ok(_) => {
                let _ = params.set_from_str(&name, &value);
            }
            Err(_) => params.add_unknown(&name, &value),
        }
    }
}

/// Form-decode one component. Returns `None` if the result is not UTF-8.
pub(crate) fn form_decode(text: &str) -> Option<String> {
    let spaced: Cow<'_, str> = if text.contains('+') {
        Cow::Owned(text.replace('+', " "))
    } else {
        Cow::Borrowed(text)
    };
    urlencoding::decode(&spaced).ok().map(Cow::into_owned)
}
