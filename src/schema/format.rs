//! The `format` keyword.
//!
//! Formats are advisory: unknown format names always pass.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$").unwrap()
});

static HOST_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").unwrap());

static TIME_OFFSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2}:\d{2}:\d{2}(?:\.\d+)?)(?:[Zz]|[+-]\d{2}:\d{2})?$").unwrap()
});

static RELATIVE_POINTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0|[1-9][0-9]*)(#|(/.*)?)$").unwrap());

/// Returns true if `value` is valid for the named format.
///
/// Supported formats: `email`, `date`, `date-time`, `time`, `uri`, `uuid`,
/// `regex`, `ipv4`, `ipv6`, `hostname`, `idn-hostname`, `json-pointer` and
/// `relative-json-pointer`. Any other name returns true.
///
/// # Example
///
/// ```rust
/// use formschema::check_format;
///
/// assert!(check_format("email", "ada@example.com"));
/// assert!(!check_format("date", "2024-02-30"));
/// assert!(check_format("made-up", "anything"));
/// ```
pub fn check_format(format: &str, value: &str) -> bool {
    match format {
        "email" => EMAIL_RE.is_match(value),
        "date" => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        "date-time" => DateTime::parse_from_rfc3339(value).is_ok(),
        "time" => is_time(value),
        "uri" => url::Url::parse(value).is_ok(),
        "uuid" => uuid::Uuid::try_parse(value).is_ok(),
        "regex" => Regex::new(value).is_ok(),
        "ipv4" => value.parse::<Ipv4Addr>().is_ok(),
        "ipv6" => value.parse::<Ipv6Addr>().is_ok(),
        "hostname" => is_hostname(value, false),
        "idn-hostname" => is_hostname(value, true),
        "json-pointer" => is_json_pointer(value),
        "relative-json-pointer" => RELATIVE_POINTER_RE
            .captures(value)
            .is_some_and(|caps| caps.get(3).is_none_or(|p| is_json_pointer(p.as_str()))),
        _ => true,
    }
}

fn is_time(value: &str) -> bool {
    TIME_OFFSET_RE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .is_some_and(|clock| NaiveTime::parse_from_str(clock.as_str(), "%H:%M:%S%.f").is_ok())
}

fn is_hostname(value: &str, international: bool) -> bool {
    let host = value.strip_suffix('.').unwrap_or(value);
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    host.split('.').all(|label| {
        if international && !label.is_ascii() {
            let count = label.chars().count();
            (1..=63).contains(&count)
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        } else {
            HOST_LABEL_RE.is_match(label)
        }
    })
}

fn is_json_pointer(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    if !value.starts_with('/') {
        return false;
    }
    let bytes = value.as_bytes();
    bytes.iter().enumerate().all(|(i, b)| {
        *b != b'~' || matches!(bytes.get(i + 1), Some(b'0') | Some(b'1'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(check_format("email", "ada@example.com"));
        assert!(check_format("email", "first.last+tag@sub.example.co"));
        assert!(!check_format("email", "ada@"));
        assert!(!check_format("email", "ada example.com"));
        assert!(!check_format("email", "ada@localhost"));
    }

    #[test]
    fn test_dates_and_times() {
        assert!(check_format("date", "2024-02-29"));
        assert!(!check_format("date", "2023-02-29"));
        assert!(!check_format("date", "29/02/2024"));
        assert!(check_format("date-time", "2024-01-01T10:00:00Z"));
        assert!(check_format("date-time", "2024-01-01T10:00:00.5+02:00"));
        assert!(!check_format("date-time", "2024-01-01 10:00"));
        assert!(check_format("time", "23:59:59"));
        assert!(check_format("time", "08:30:00.250Z"));
        assert!(!check_format("time", "25:00:00"));
    }

    #[test]
    fn test_uri_uuid_regex() {
        assert!(check_format("uri", "https://example.com/a?b=c"));
        assert!(!check_format("uri", "not a uri"));
        assert!(check_format("uuid", "67e55044-10b1-426f-9247-bb680e5fe0c8"));
        assert!(!check_format("uuid", "67e55044"));
        assert!(check_format("regex", "^a+$"));
        assert!(!check_format("regex", "(unclosed"));
    }

    #[test]
    fn test_ip_addresses() {
        assert!(check_format("ipv4", "192.168.0.1"));
        assert!(!check_format("ipv4", "256.0.0.1"));
        assert!(check_format("ipv6", "::1"));
        assert!(!check_format("ipv6", "12345::"));
    }

    #[test]
    fn test_hostnames() {
        assert!(check_format("hostname", "example.com"));
        assert!(check_format("hostname", "a-b.example.com."));
        assert!(!check_format("hostname", "-bad.example.com"));
        assert!(!check_format("hostname", "exa mple.com"));
        assert!(!check_format("hostname", "bücher.example"));
        assert!(check_format("idn-hostname", "bücher.example"));
    }

    #[test]
    fn test_json_pointers() {
        assert!(check_format("json-pointer", ""));
        assert!(check_format("json-pointer", "/a/b~0c~1d"));
        assert!(!check_format("json-pointer", "a/b"));
        assert!(!check_format("json-pointer", "/a~2"));
        assert!(check_format("relative-json-pointer", "0"));
        assert!(check_format("relative-json-pointer", "1/a/b"));
        assert!(check_format("relative-json-pointer", "2#"));
        assert!(!check_format("relative-json-pointer", "/a"));
    }

    #[test]
    fn test_unknown_format_passes() {
        assert!(check_format("credit-card", "nope"));
    }
}
