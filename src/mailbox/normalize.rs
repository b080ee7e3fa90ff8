use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::debug;

use crate::domain::message::{NormalizedMessage, RawMessage};
use crate::mail::decoders::decode_body;

pub const UNREAD_LABEL: &str = "UNREAD";
pub const NO_RECIPIENT: &str = "(No To)";
pub const NO_SUBJECT: &str = "(No Subject)";

/// Source of "now" for the last-resort date.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Builds the caller-facing record for one fetched message.
pub fn normalize(raw: &RawMessage, clock: &dyn Clock) -> NormalizedMessage {
    let (date, date_estimated) = resolve_date(raw, clock);

    NormalizedMessage {
        id: raw.id.clone(),
        from: raw.header("From").map(str::to_string),
        to: raw.header("To").unwrap_or(NO_RECIPIENT).to_string(),
        subject: raw.header("Subject").unwrap_or(NO_SUBJECT).to_string(),
        body: decode_body(&raw.root),
        date,
        date_estimated,
        read: !raw.labels.contains(UNREAD_LABEL),
    }
}

/// `Date` header, then receipt time, then the clock. The flag is set only
/// when the clock had to be used.
fn resolve_date(raw: &RawMessage, clock: &dyn Clock) -> (DateTime<Utc>, bool) {
    if let Some(header) = raw.header("Date") {
        match parse_mail_date(header) {
            Some(d) => return (d, false),
            None => debug!("message {}: unparsable Date header {header:?}", raw.id),
        }
    }
    if let Some(internal) = raw.internal_timestamp.as_deref() {
        match parse_epoch_millis(internal) {
            Some(d) => return (d, false),
            None => debug!("message {}: unparsable internal timestamp {internal:?}", raw.id),
        }
    }
    debug!("message {}: no usable date, using current time", raw.id);
    (clock.now(), true)
}

/// Zoned layouts tried after RFC 2822 and RFC 3339.
const ZONED_FORMATS: &[&str] = &[
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
    "%Y-%m-%d %H:%M:%S %z",
];

/// Layouts without an offset, read as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// RFC 2822 first (a trailing `(UTC)`-style comment is ignored), then RFC 3339,
/// then a few common layouts. A bare `YYYY-MM-DD` is midnight UTC.
pub fn parse_mail_date(s: &str) -> Option<DateTime<Utc>> {
    let s = strip_trailing_comment(s.trim());
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = DateTime::parse_from_rfc2822(s).or_else(|_| DateTime::parse_from_rfc3339(s)) {
        return Some(d.with_timezone(&Utc));
    }
    // Drop a leading weekday so the zoned layouts need not repeat it.
    let undated = s.split_once(", ").map_or(s, |(_, rest)| rest);
    if let Some(d) = ZONED_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(undated, f).ok())
    {
        return Some(d.with_timezone(&Utc));
    }
    if let Some(d) = NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(d.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}

fn strip_trailing_comment(s: &str) -> &str {
    match s.strip_suffix(')').and_then(|rest| rest.rfind('(')) {
        Some(open) => s[..open].trim_end(),
        None => s,
    }
}

fn parse_epoch_millis(s: &str) -> Option<DateTime<Utc>> {
    s.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}
