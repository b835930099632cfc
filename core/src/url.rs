//! Path template substitution.
//!
//! Endpoint paths are templates such as `/users/:id`. `build_url` replaces
//! each `:name` token with the percent-encoded value supplied for `name`.
//! Only the first occurrence of a token is replaced. Unknown keys are ignored
//! and tokens without a value stay in the output verbatim.

use std::fmt::Display;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::error::Error;

/// Characters escaped when substituting a path value. Mirrors the unreserved
/// set kept by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Substitute `:name` placeholders in `template`.
///
/// ```
/// use typed_http::build_url;
///
/// assert_eq!(build_url("https://h/:id", [("id", 123)]), "https://h/123");
/// assert_eq!(build_url("/search/:q", [("q", "a b")]), "/search/a%20b");
/// ```
pub fn build_url<K, V>(template: &str, params: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: Display,
{
    let mut out = template.to_string();
    for (key, value) in params {
        let token = format!(":{}", key.as_ref());
        let encoded = utf8_percent_encode(&value.to_string(), COMPONENT).to_string();
        out = out.replacen(&token, &encoded, 1);
    }
    out
}

/// Flatten serialized path parameters into `(name, value)` pairs.
///
/// `null` stands for "no parameters". Strings, numbers and booleans are
/// accepted as values; anything nested is rejected. Pairs come out in the
/// order the fields were serialized, which decides substitution order.
pub fn path_params<E>(params: &Value) -> Result<Vec<(String, String)>, Error<E>> {
    let map = match params {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map,
        _ => return Err(Error::PathParams),
    };

    map.iter()
        .map(|(name, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return Err(Error::PathParam { name: name.clone() }),
            };
            Ok((name.clone(), rendered))
        })
        .collect()
}
