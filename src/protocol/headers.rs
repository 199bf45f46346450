//! Header name mangling and value cleanup for custom message properties.
//!
//! The broker carries caller-defined properties as plain HTTP headers. On the
//! way back it rewrites their names, so a property sent as `Order-Id` comes
//! back as `orderid`, and it wraps string values in JSON quotes.
//!
//! # Header Formats
//!
//! | Property sent | Header received | Value received |
//! |---------------|-----------------|----------------|
//! | `Order-Id: 42` | `orderid` | `"42"` |
//! | `tenant_name: acme` | `tenantname` | `"acme"` |
//!
//! # Examples
//!
//! ```
//! use servicebus_http::protocol::{normalize_property_name, trim_property_value};
//!
//! assert_eq!(normalize_property_name("Order-Id"), "orderid");
//! assert_eq!(trim_property_value(" \"42\"\r\n"), "42");
//! ```

use crate::protocol::constants::headers::RESERVED;

/// Characters stripped from both ends of a property value.
const VALUE_TRIM: &[char] = &['"', ' ', '\t', '\r', '\n'];

/// Map a property name to the header name the broker returns it under.
///
/// Lower-cases the name and strips everything outside `[a-z0-9]`.
///
/// # Examples
///
/// ```
/// use servicebus_http::protocol::normalize_property_name;
///
/// assert_eq!(normalize_property_name("Content_Kind"), "contentkind");
/// assert_eq!(normalize_property_name("x-retry-2"), "xretry2");
/// assert_eq!(normalize_property_name("---"), "");
/// ```
pub fn normalize_property_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Strip surrounding quotes and whitespace from a property header value.
///
/// # Examples
///
/// ```
/// use servicebus_http::protocol::trim_property_value;
///
/// assert_eq!(trim_property_value("\"acme\""), "acme");
/// assert_eq!(trim_property_value("plain"), "plain");
/// assert_eq!(trim_property_value("\"\""), "");
/// ```
#[inline]
pub fn trim_property_value(value: &str) -> &str {
    value.trim_matches(VALUE_TRIM)
}

/// Whether a response header belongs to the transport or the protocol rather
/// than to the application.
///
/// Comparison is case-insensitive.
///
/// # Examples
///
/// ```
/// use servicebus_http::protocol::is_reserved_header;
///
/// assert!(is_reserved_header("BrokerProperties"));
/// assert!(is_reserved_header("content-type"));
/// assert!(!is_reserved_header("orderid"));
/// ```
pub fn is_reserved_header(name: &str) -> bool {
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_mixed_case() {
        assert_eq!(normalize_property_name("MyProperty"), "myproperty");
    }

    #[test]
    fn test_normalize_strips_separators() {
        assert_eq!(normalize_property_name("my.custom-prop_1"), "mycustomprop1");
    }

    #[test]
    fn test_normalize_non_ascii() {
        assert_eq!(normalize_property_name("café"), "caf");
    }

    #[test]
    fn test_trim_quotes_and_whitespace() {
        assert_eq!(trim_property_value("\t\"value\"\n"), "value");
    }

    #[test]
    fn test_trim_keeps_inner_quotes() {
        assert_eq!(trim_property_value("\"a \"b\" c\""), "a \"b\" c");
    }

    #[test]
    fn test_reserved_headers() {
        for name in ["Location", "SERVER", "Date", "Strict-Transport-Security"] {
            assert!(is_reserved_header(name), "{name} should be reserved");
        }
        assert!(!is_reserved_header("x-custom"));
    }
}
