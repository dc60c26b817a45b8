use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;

pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

const WARN_BELOW: u64 = 10;

/// Advisory quota info read off a response. Missing headers stay `None`,
/// never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    pub remaining: Option<u64>,
    pub limit: Option<u64>,
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimitSnapshot {
    pub fn extract(headers: &HeaderMap) -> Self {
        Self {
            remaining: header_u64(headers, REMAINING_HEADER),
            limit: header_u64(headers, LIMIT_HEADER),
            reset_at: header_i64(headers, RESET_HEADER)
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        }
    }

    pub fn should_warn(&self) -> bool {
        matches!(self.remaining, Some(r) if r < WARN_BELOW)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    header_str(headers, name)?.parse().ok()
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    header_str(headers, name)?.parse().ok()
}
