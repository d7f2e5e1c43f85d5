pub mod comment;
pub mod page;
pub mod post;

use time::OffsetDateTime;

/// Creation timestamp at the precision Postgres stores (microseconds), so a
/// freshly created record compares equal to the same record read back.
pub fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    let micros = now.nanosecond() / 1_000 * 1_000;
    now.replace_nanosecond(micros).unwrap_or(now)
}
