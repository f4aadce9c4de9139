//! Internal helpers for input validation and date arithmetic.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every operation normalizes titles and periods the same way.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

const MAX_TITLE_LEN: usize = 64;

/// Trim a title and collapse inner whitespace.
pub(crate) fn normalize_title_display(value: &str, label: &str) -> ResultEngine<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(EngineError::field_required(label));
    }
    if collapsed.chars().count() > MAX_TITLE_LEN {
        return Err(EngineError::InvalidName(format!(
            "{label} must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(collapsed)
}

/// Comparison key of a title: NFKD, combining marks stripped, lowercase,
/// punctuation and whitespace folded into single spaces.
pub(crate) fn normalize_title_key(display: &str) -> ResultEngine<String> {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in display.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }

    let normalized = out.trim();
    if normalized.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "'{display}' has no letters or digits"
        )));
    }
    Ok(normalized.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// First and last day of a calendar month.
pub(crate) fn month_bounds(year: i32, month: u32) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::InvalidDate(format!("invalid month {year}-{month}")))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| EngineError::InvalidDate(format!("invalid month {year}-{month}")))?;
    Ok((first, last))
}

/// Move `at` into the given month, keeping its time of day. The day is
/// clamped to the last day of the target month (31 -> 30 in April).
pub(crate) fn move_into_month(
    at: DateTime<Utc>,
    year: i32,
    month: u32,
) -> ResultEngine<DateTime<Utc>> {
    let (_, last) = month_bounds(year, month)?;
    let day = at.day().min(last.day());
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| EngineError::InvalidDate(format!("invalid day {year}-{month}-{day}")))?;
    Ok(date.and_time(at.time()).and_utc())
}
