use chrono::{DateTime, TimeDelta, Utc};

/// Whether an entry published at `published_at` is still within `window` of
/// `now`. Entries without a publication time are never fresh.
pub fn is_fresh(
    published_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: TimeDelta,
) -> bool {
    match published_at {
        Some(published) => now.signed_duration_since(published) <= window,
        None => false,
    }
}
