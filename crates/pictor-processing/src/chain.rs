//! Request and chain parsing.
//!
//! A processing request carries a slash separated chain of entries, each a
//! comma separated `name,k_v,k_v,...` group. Values may themselves contain
//! underscores (base64url payloads), so key/value tokens split on the first
//! underscore only.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use pictor_core::{AppError, AppResult};

/// Split a `k_v` parameter token at the first underscore.
pub fn split_kv(param: &str) -> (&str, Option<&str>) {
    match param.split_once('_') {
        Some((k, v)) => (k, Some(v)),
        None => (param, None),
    }
}

/// Parse a raw query string into percent-decoded key/value pairs.
pub fn parse_query(raw: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for pair in raw.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (k, v) = match pair.split_once('=') {
            Some((k, v)) => (k, v),
            None => (pair, ""),
        };
        out.insert(
            percent_decode_str(k).decode_utf8_lossy().into_owned(),
            percent_decode_str(v).decode_utf8_lossy().into_owned(),
        );
    }
    out
}

/// Turn a request path plus query parameters into an object uri and an
/// action chain.
///
/// A `!` or `@!` delimiter in the path switches to style mode: everything
/// between it and the next delimiter (if any) is the style name and the
/// chain becomes `["style", name]`. Otherwise the chain comes from the
/// `image_process` query parameter (with the `image` namespace token
/// prepended) or from `x-oss-process`.
pub fn parse_request(
    path: &str,
    query: &HashMap<String, String>,
) -> AppResult<(String, Vec<String>)> {
    let path = path.strip_prefix('/').unwrap_or(path);

    if let Some((start, len)) = style_delim(path) {
        let uri = &path[..start];
        let rest = &path[start + len..];
        let name = match style_delim(rest) {
            Some((next, _)) => &rest[..next],
            None => rest,
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_argument("empty style name"));
        }
        return Ok((uri.to_string(), vec!["style".to_string(), name.to_string()]));
    }

    let actions = if let Some(chain) = query.get("image_process") {
        let mut actions = vec!["image".to_string()];
        actions.extend(split_chain(chain));
        actions
    } else if let Some(chain) = query.get("x-oss-process") {
        split_chain(chain)
    } else {
        Vec::new()
    };
    Ok((path.to_string(), actions))
}

/// Split a chain string on `/`, dropping empty entries.
pub fn split_chain(chain: &str) -> Vec<String> {
    chain
        .split('/')
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Position and width of the next style delimiter (`!` or `@!`).
fn style_delim(s: &str) -> Option<(usize, usize)> {
    let pos = s.find('!')?;
    if pos > 0 && s.as_bytes()[pos - 1] == b'@' {
        Some((pos - 1, 2))
    } else {
        Some((pos, 1))
    }
}
