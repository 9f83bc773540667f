use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const RATE_LIMIT_LIMIT: &str = "x-rate-limit-limit";
pub const RATE_LIMIT_REMAINING: &str = "x-rate-limit-remaining";
pub const RATE_LIMIT_RESET: &str = "x-rate-limit-reset";

/// Rate-limit window reported by the API alongside a response.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    /// Unix epoch (seconds) at which the window resets.
    pub reset: u64,
}

impl RateLimit {
    /// Snapshot is present iff `x-rate-limit-limit` is. Missing or non-numeric companion
    /// headers read as `0`.
    pub fn from_headers(headers: &HeaderMap) -> Option<RateLimit> {
        headers.get(RATE_LIMIT_LIMIT)?;
        Some(RateLimit {
            limit: numeric_header(headers, RATE_LIMIT_LIMIT),
            remaining: numeric_header(headers, RATE_LIMIT_REMAINING),
            reset: numeric_header(headers, RATE_LIMIT_RESET),
        })
    }

    #[inline]
    pub fn reset_at(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.reset)
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

fn numeric_header(headers: &HeaderMap, name: &str) -> u64 {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod test {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn absent_without_limit_header() {
        let mut h = HeaderMap::new();
        h.insert(RATE_LIMIT_REMAINING, HeaderValue::from_static("10"));
        h.insert(RATE_LIMIT_RESET, HeaderValue::from_static("1700000000"));
        assert_eq!(RateLimit::from_headers(&h), None);
    }

    #[test]
    fn parses_all_three_headers() {
        let mut h = HeaderMap::new();
        h.insert(RATE_LIMIT_LIMIT, HeaderValue::from_static("900"));
        h.insert(RATE_LIMIT_REMAINING, HeaderValue::from_static("899"));
        h.insert(RATE_LIMIT_RESET, HeaderValue::from_static("1700000000"));
        let rl = RateLimit::from_headers(&h).unwrap();
        assert_eq!(
            rl,
            RateLimit {
                limit: 900,
                remaining: 899,
                reset: 1_700_000_000
            }
        );
        assert!(!rl.is_exhausted());
        assert_eq!(rl.reset_at(), UNIX_EPOCH + Duration::from_secs(1_700_000_000));
    }

    #[test]
    fn companion_headers_default_to_zero() {
        let mut h = HeaderMap::new();
        h.insert(RATE_LIMIT_LIMIT, HeaderValue::from_static("15"));
        h.insert(RATE_LIMIT_REMAINING, HeaderValue::from_static("n/a"));
        let rl = RateLimit::from_headers(&h).unwrap();
        assert_eq!(rl.limit, 15);
        assert_eq!(rl.remaining, 0);
        assert_eq!(rl.reset, 0);
        assert!(rl.is_exhausted());
    }
}
