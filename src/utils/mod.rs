//! Utility functions shared across the application.
//!
//! Path and query-string helpers used when turning an API Gateway event into
//! an inbound request.

use std::borrow::Cow;

/// Strips the gateway mount prefix from a raw path.
///
/// Format: `/api/hyperswitch/payments/pay_1` → `payments/pay_1`
///
/// # Arguments
///
/// * `raw_path` - The path as received from API Gateway
/// * `prefix` - The mount prefix, with or without surrounding slashes
///
/// # Returns
///
/// The path below the prefix without leading or trailing slashes. A path that
/// does not sit under the prefix is returned trimmed but otherwise unchanged.
#[must_use]
pub fn strip_route_prefix<'a>(raw_path: &'a str, prefix: &str) -> &'a str {
    let prefix = prefix.trim_matches('/');
    let path = raw_path.trim_start_matches('/');

    let below = if prefix.is_empty() {
        path
    } else if path == prefix {
        ""
    } else {
        path.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(path)
    };

    below.trim_end_matches('/')
}

/// Returns true if the segment only holds unreserved URL characters or
/// percent escapes, and names neither `.` nor `..` once decoded.
///
/// Escaped dot segments (`%2e%2e`) are resolved by URL parsers just like the
/// literal ones, so they are rejected too, as is an escaped `/`.
#[must_use]
pub fn is_url_safe_segment(segment: &str) -> bool {
    if segment.is_empty()
        || !segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~' | b'%'))
    {
        return false;
    }
    let Ok(decoded) = urlencoding::decode(segment) else {
        return false;
    };
    decoded != "." && decoded != ".." && !decoded.contains(['/', '\\'])
}

/// Returns true if the raw query string would reach the upstream unchanged.
///
/// URL parsing percent-encodes spaces, quotes, `<`, `>`, `#`, control and
/// non-ASCII bytes in a query, so a query holding any of them could not be
/// forwarded byte-for-byte.
#[must_use]
pub fn is_verbatim_query(raw_query: &str) -> bool {
    raw_query
        .bytes()
        .all(|b| b.is_ascii_graphic() && !matches!(b, b'"' | b'#' | b'<' | b'>' | b'\''))
}

/// Parses a raw query string into ordered key/value pairs.
///
/// `+` is read as a space and percent escapes are decoded. Pairs with an
/// empty key are skipped; a key without `=` gets an empty value.
#[must_use]
pub fn parse_query(raw_query: &str) -> Vec<(String, String)> {
    raw_query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(key);
            if key.is_empty() {
                return None;
            }
            Some((key, decode_component(value)))
        })
        .collect()
}

fn decode_component(component: &str) -> String {
    let spaced = component.replace('+', " ");
    // Invalid UTF-8 after decoding: keep the component as sent
    urlencoding::decode(&spaced).map_or_else(|_| spaced.clone(), Cow::into_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_route_prefix() {
        assert_eq!(strip_route_prefix("/api/hyperswitch/payments", "/api/hyperswitch"), "payments");
        assert_eq!(
            strip_route_prefix("/api/hyperswitch/payments/pay_1/", "api/hyperswitch/"),
            "payments/pay_1"
        );
        assert_eq!(strip_route_prefix("/api/hyperswitch", "/api/hyperswitch"), "");
        assert_eq!(strip_route_prefix("/payments", ""), "payments");
        // Not under the prefix: only trimmed
        assert_eq!(strip_route_prefix("/other/payments", "/api/hyperswitch"), "other/payments");
        // Prefix must end on a segment boundary
        assert_eq!(
            strip_route_prefix("/api/hyperswitchx/payments", "/api/hyperswitch"),
            "api/hyperswitchx/payments"
        );
    }

    #[test]
    fn test_url_safe_segments() {
        assert!(is_url_safe_segment("payments"));
        assert!(is_url_safe_segment("pay_01HZ-x.y~z"));
        assert!(is_url_safe_segment("a%20b"));
        assert!(!is_url_safe_segment(""));
        assert!(!is_url_safe_segment(".."));
        assert!(!is_url_safe_segment("."));
        assert!(!is_url_safe_segment("a b"));
        assert!(!is_url_safe_segment("a?b"));
    }

    #[test]
    fn test_escaped_dot_segments_are_unsafe() {
        for segment in ["%2e%2e", "%2E%2E", ".%2e", "%2e.", "%2e", "a%2fb", "a%2Fb", "a%5cb", "%zz%ff"] {
            assert!(!is_url_safe_segment(segment), "{segment} should be rejected");
        }
        assert!(is_url_safe_segment("%2e%2e%2e"));
        assert!(is_url_safe_segment("pay%2e1"));
    }

    #[test]
    fn test_verbatim_query() {
        assert!(is_verbatim_query(""));
        assert!(is_verbatim_query("expand_attempts=true&client_secret=pay_1_secret%2Bx&a=1&a=2"));
        assert!(is_verbatim_query("q=a+b&n=%27"));
        for raw in ["q=it's", "n=a b", "x=\"y\"", "a=<b>", "frag=#1", "name=caf\u{e9}"] {
            assert!(!is_verbatim_query(raw), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_parse_query_decodes_and_keeps_order() {
        let pairs = parse_query("status=active&limit=10&status=failed&q=a+b%26c&flag&=orphan");
        assert_eq!(
            pairs,
            vec![
                ("status".to_string(), "active".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("status".to_string(), "failed".to_string()),
                ("q".to_string(), "a b&c".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_parse_empty_query() {
        assert!(parse_query("").is_empty());
        assert!(parse_query("&&").is_empty());
    }
}
