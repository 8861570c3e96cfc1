//! Accept-Encoding negotiation and Vary bookkeeping

use http::header::{HeaderMap, HeaderName, HeaderValue, VARY};

/// Whether an `Accept-Encoding` value allows a gzip response.
///
/// The header is a comma-separated list of codings, each optionally
/// followed by parameters. `gzip` and its legacy alias `x-gzip` match
/// case-insensitively; a `q=0` weight rules the coding out. A bare `*`
/// does not count, so clients have to name gzip explicitly.
///
/// ```
/// use tessera_compression::accepts_gzip;
///
/// assert!(accepts_gzip(Some("deflate, GZIP;q=0.8")));
/// assert!(!accepts_gzip(Some("gzip;q=0")));
/// assert!(!accepts_gzip(None));
/// ```
pub fn accepts_gzip(accept_encoding: Option<&str>) -> bool {
    let Some(value) = accept_encoding else {
        return false;
    };

    value.split(',').any(|entry| {
        let mut parts = entry.split(';');
        let coding = parts.next().unwrap_or_default().trim();
        if !coding.eq_ignore_ascii_case("gzip") && !coding.eq_ignore_ascii_case("x-gzip") {
            return false;
        }
        parts.all(|param| !is_zero_weight(param))
    })
}

/// `q=0`, `q=0.0`, `q=0.000` and friends
fn is_zero_weight(param: &str) -> bool {
    let Some((name, value)) = param.split_once('=') else {
        return false;
    };
    if !name.trim().eq_ignore_ascii_case("q") {
        return false;
    }
    match value.trim().parse::<f32>() {
        Ok(q) => q <= 0.0,
        Err(_) => false,
    }
}

/// Append `name` to the `Vary` header unless it is already covered.
///
/// Existing `Vary` values are split on commas and compared
/// case-insensitively; `Vary: *` already covers everything.
pub fn add_vary(headers: &mut HeaderMap, name: &HeaderName) {
    let already_present = headers.get_all(VARY).iter().any(|existing| {
        existing
            .as_bytes()
            .split(|b| *b == b',')
            .map(<[u8]>::trim_ascii)
            .any(|v| v == b"*" || v.eq_ignore_ascii_case(name.as_str().as_bytes()))
    });

    if !already_present {
        headers.append(VARY, HeaderValue::from_name(name.clone()));
    }
}
