//! Date and time placeholders
//!
//! Two families exist:
//! - file names: `{{DATE}}`, `{{DATE+N}}`, `{{DATE:format+N}}` (N in days)
//! - template notes: `{{date}}` / `{{time}}` with an optional `+N<unit>`
//!   offset and `:format`, matched case-insensitively
//!
//! Formats use moment-style tokens (`YYYY-MM-DD`, `HH:mm`, `Do MMMM`), and
//! text inside `[...]` is emitted literally.

use chrono::{Datelike, Local, Months, NaiveDateTime, TimeDelta, Timelike};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Format used when a placeholder carries none
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";

lazy_static! {
    static ref DATE: Regex = Regex::new(r"\{\{DATE(\+-?[0-9]+)?\}\}").unwrap();
    static ref DATE_FORMATTED: Regex =
        Regex::new(r"\{\{DATE:([^}\n\r+]*)(\+-?[0-9]+)?\}\}").unwrap();
    static ref DATE_TIME: Regex =
        Regex::new(r"(?i)\{\{\s*(date|time)\s*(([+-]\d+)([yqmwdhs]))?\s*(:.+?)?\}\}").unwrap();
}

/// Resolve the file-name date family against `now`
pub fn replace_date_in_string(input: &str, now: NaiveDateTime) -> String {
    let output = DATE.replace_all(input, |caps: &Captures| {
        let days = caps.get(1).map(|m| parse_day_offset(m.as_str())).unwrap_or(0);
        format_moment(&shift_days(now, days), DEFAULT_DATE_FORMAT)
    });
    DATE_FORMATTED
        .replace_all(&output, |caps: &Captures| {
            let format = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let format = if format.is_empty() { DEFAULT_DATE_FORMAT } else { format };
            let days = caps.get(2).map(|m| parse_day_offset(m.as_str())).unwrap_or(0);
            format_moment(&shift_days(now, days), format)
        })
        .into_owned()
}

/// [`replace_date_in_string`] against the local clock
pub fn replace_date_in_string_now(input: &str) -> String {
    replace_date_in_string(input, Local::now().naive_local())
}

/// Resolve `{{date}}` / `{{time}}` placeholders in a template note
pub fn apply_template_transformations(template: &str, now: NaiveDateTime) -> String {
    DATE_TIME
        .replace_all(template, |caps: &Captures| {
            let mut moment = now;
            if let (Some(delta), Some(unit)) = (caps.get(3), caps.get(4)) {
                if let Ok(delta) = delta.as_str().parse::<i64>() {
                    moment = shift(now, delta, unit.as_str());
                }
            }
            let format = caps
                .get(5)
                .map(|m| m.as_str()[1..].trim())
                .filter(|f| !f.is_empty())
                .unwrap_or(DEFAULT_DATE_FORMAT);
            format_moment(&moment, format)
        })
        .into_owned()
}

/// [`apply_template_transformations`] against the local clock
pub fn apply_template_transformations_now(template: &str) -> String {
    apply_template_transformations(template, Local::now().naive_local())
}

/// "+3" -> 3, "+-2" -> -2; anything else is no offset
fn parse_day_offset(raw: &str) -> i64 {
    raw.trim_start_matches('+').trim().parse().unwrap_or(0)
}

fn shift_days(now: NaiveDateTime, days: i64) -> NaiveDateTime {
    TimeDelta::try_days(days)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(now)
}

/// Apply a moment-style offset. `M` is months and `m` minutes; the other
/// units are case-insensitive. An offset outside chrono's range leaves
/// `now` unchanged.
fn shift(now: NaiveDateTime, delta: i64, unit: &str) -> NaiveDateTime {
    let months = |n: i64| {
        let magnitude = Months::new(n.unsigned_abs().min(u32::MAX as u64) as u32);
        if n >= 0 {
            now.checked_add_months(magnitude)
        } else {
            now.checked_sub_months(magnitude)
        }
    };
    let add = |delta: Option<TimeDelta>| delta.and_then(|d| now.checked_add_signed(d));
    let shifted = match unit {
        "M" => months(delta),
        "m" => add(TimeDelta::try_minutes(delta)),
        _ => match unit.to_ascii_lowercase().as_str() {
            "y" => months(delta.saturating_mul(12)),
            "q" => months(delta.saturating_mul(3)),
            "w" => add(TimeDelta::try_weeks(delta)),
            "d" => add(TimeDelta::try_days(delta)),
            "h" => add(TimeDelta::try_hours(delta)),
            "s" => add(TimeDelta::try_seconds(delta)),
            _ => None,
        },
    };
    shifted.unwrap_or(now)
}

/// Moment tokens, longest first so `YYYY` wins over `YY`
const TOKENS: &[&str] = &[
    "YYYY", "YY", "MMMM", "MMM", "MM", "M", "Do", "DDDD", "DD", "D", "dddd", "ddd", "d", "HH", "H",
    "hh", "h", "mm", "m", "ss", "s", "A", "a", "Q", "WW", "W", "X", "ZZ", "Z",
];

/// Format `moment` with a moment-style format string
pub fn format_moment(moment: &NaiveDateTime, format: &str) -> String {
    let mut out = String::new();
    let mut rest = format;

    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('[') {
            match stripped.find(']') {
                Some(end) => {
                    out.push_str(&stripped[..end]);
                    rest = &stripped[end + 1..];
                }
                None => {
                    out.push_str(stripped);
                    rest = "";
                }
            }
            continue;
        }

        if let Some(token) = TOKENS.iter().find(|t| rest.starts_with(**t)) {
            out.push_str(&render_token(moment, token));
            rest = &rest[token.len()..];
            continue;
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }

    out
}

fn render_token(m: &NaiveDateTime, token: &str) -> String {
    match token {
        "YYYY" => format!("{:04}", m.year()),
        "YY" => format!("{:02}", m.year().rem_euclid(100)),
        "MMMM" => m.format("%B").to_string(),
        "MMM" => m.format("%b").to_string(),
        "MM" => format!("{:02}", m.month()),
        "M" => m.month().to_string(),
        "Do" => ordinal(m.day()),
        "DDDD" => format!("{:03}", m.ordinal()),
        "DD" => format!("{:02}", m.day()),
        "D" => m.day().to_string(),
        "dddd" => m.format("%A").to_string(),
        "ddd" => m.format("%a").to_string(),
        "d" => m.weekday().num_days_from_sunday().to_string(),
        "HH" => format!("{:02}", m.hour()),
        "H" => m.hour().to_string(),
        "hh" => format!("{:02}", twelve_hour(m.hour())),
        "h" => twelve_hour(m.hour()).to_string(),
        "mm" => format!("{:02}", m.minute()),
        "m" => m.minute().to_string(),
        "ss" => format!("{:02}", m.second()),
        "s" => m.second().to_string(),
        "A" => if m.hour() < 12 { "AM" } else { "PM" }.to_string(),
        "a" => if m.hour() < 12 { "am" } else { "pm" }.to_string(),
        "Q" => ((m.month() - 1) / 3 + 1).to_string(),
        "WW" => format!("{:02}", m.iso_week().week()),
        "W" => m.iso_week().week().to_string(),
        "X" => m.and_utc().timestamp().to_string(),
        "ZZ" => "+0000".to_string(),
        "Z" => "+00:00".to_string(),
        other => other.to_string(),
    }
}

fn twelve_hour(hour: u32) -> u32 {
    match hour % 12 {
        0 => 12,
        h => h,
    }
}

fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", day, suffix)
}
