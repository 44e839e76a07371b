//! Visit counter kept in the session.
//!
//! `visits` is bumped at most once per elapsed day; `last_visit` records when
//! it was last bumped. Both are stored as strings.

use chrono::NaiveDateTime;

use crate::session::Session;

pub const VISITS_KEY: &str = "visits";
pub const LAST_VISIT_KEY: &str = "last_visit";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Update the counter for a request made at `now` and return the visit count.
pub fn record_visit(session: &mut Session, now: NaiveDateTime) -> i64 {
    let mut visits = session
        .get_str(VISITS_KEY)
        .filter(|v| !v.is_empty())
        .and_then(|v| match v.parse::<i64>() {
            Ok(n) => Some(n),
            Err(_) => {
                tracing::warn!(value = v, "Ignoring unparsable visits counter");
                None
            }
        })
        .unwrap_or(1);

    let last_visit = session
        .get_str(LAST_VISIT_KEY)
        .filter(|v| !v.is_empty())
        .and_then(|v| match parse_timestamp(v) {
            Some(ts) => Some((v.to_owned(), ts)),
            None => {
                tracing::warn!(value = v, "Ignoring unparsable last_visit timestamp");
                None
            }
        });

    let (stored, last_visit_time) = match last_visit {
        Some(found) => found,
        None => (format_timestamp(now), now),
    };

    if (now - last_visit_time).num_days() > 0 {
        visits += 1;
        session.insert(LAST_VISIT_KEY, format_timestamp(now));
    } else {
        session.insert(LAST_VISIT_KEY, stored);
    }
    session.insert(VISITS_KEY, visits.to_string());

    visits
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Accepts timestamps with or without a fractional part.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}
