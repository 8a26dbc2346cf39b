use std::time::Duration;

/// Statuses worth another attempt: rate limiting and transient platform
/// faults.
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

pub(crate) fn is_retryable_transport_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// Exponential delay: base * 2^(attempt-1), capped at 30 seconds.
pub(crate) fn retry_delay(base_delay_ms: u64, attempt: usize) -> Duration {
    const MAX_DELAY_MS: u64 = 30_000;
    let exponent = attempt.saturating_sub(1).min(16) as u32;
    let delay = base_delay_ms
        .max(1)
        .saturating_mul(1_u64 << exponent)
        .min(MAX_DELAY_MS);
    Duration::from_millis(delay)
}

pub(crate) fn truncate_for_error(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let truncated: String = body.chars().take(max_chars).collect();
    format!("{truncated}…")
}
