use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::services::DateNormalizer;

/// Output format handed to automation. AppleScript's `date "..."` accepts it.
pub const TIMESTAMP_FORMAT: &str = "%A, %B %-d, %Y at %-I:%M %p";

const NUMBER_WORDS: &[(&str, i64)] = &[
    ("a", 1),
    ("an", 1),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("fifteen", 15),
    ("twenty", 20),
    ("thirty", 30),
    ("forty five", 45),
];

/// Understands the handful of date shapes people use for reminders and
/// calendar entries. Anything else is `None`.
///
/// The reference clock is injectable so behaviour is reproducible.
pub struct NaturalDateNormalizer {
    clock: Box<dyn Fn() -> NaiveDateTime + Send + Sync>,
}

impl NaturalDateNormalizer {
    pub fn new() -> Self {
        Self {
            clock: Box::new(|| Local::now().naive_local()),
        }
    }

    pub fn with_clock(now: NaiveDateTime) -> Self {
        Self {
            clock: Box::new(move || now),
        }
    }

    /// Pure function: (text, now) -> absolute datetime.
    pub fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        parse_relative(text, (self.clock)())
    }
}

impl Default for NaturalDateNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DateNormalizer for NaturalDateNormalizer {
    fn normalize(&self, text: &str) -> Option<String> {
        self.parse(text).map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
    }
}

pub fn parse_relative(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let text = text
        .to_lowercase()
        .replace("a.m.", "am")
        .replace("p.m.", "pm")
        .replace(['.', ','], " ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return None;
    }

    if let Some(dt) = parse_iso(&text) {
        return Some(dt);
    }
    if let Some(rest) = text.strip_prefix("in ") {
        return parse_offset(rest, now);
    }

    let (day_part, time_part) = if let Some((day, time)) = text.split_once(" at ") {
        (day.trim(), Some(time.trim()))
    } else if let Some(time) = text.strip_prefix("at ") {
        ("", Some(time.trim()))
    } else if parse_clock(&text).is_some() {
        ("", Some(text.as_str()))
    } else {
        split_trailing_time(&text)
    };

    let time = match time_part {
        Some(t) => Some(parse_clock(t)?),
        None => None,
    };

    let date = match day_part {
        "" => None,
        "today" => Some(now.date()),
        "tonight" => Some(now.date()),
        "tomorrow" | "tomorrow morning" => Some(now.date() + Duration::days(1)),
        "tomorrow night" | "tomorrow evening" => Some(now.date() + Duration::days(1)),
        other => Some(parse_weekday(other, now.date())?),
    };

    let default_time = match day_part {
        "tonight" | "tomorrow night" | "tomorrow evening" => NaiveTime::from_hms_opt(20, 0, 0),
        _ => NaiveTime::from_hms_opt(9, 0, 0),
    }?;

    match (date, time) {
        (Some(date), Some(time)) => {
            // "tonight at 8" means 8 pm.
            let time = if day_part == "tonight" && time.hour() < 12 {
                time + Duration::hours(12)
            } else {
                time
            };
            Some(date.and_time(time))
        }
        (Some(date), None) => Some(date.and_time(default_time)),
        (None, Some(time)) => {
            let today = now.date().and_time(time);
            if today > now {
                Some(today)
            } else {
                Some(today + Duration::days(1))
            }
        }
        (None, None) => None,
    }
}

/// "tomorrow 5 pm" has no "at"; peel a trailing clock expression off.
fn split_trailing_time(text: &str) -> (&str, Option<&str>) {
    let tokens: Vec<&str> = text.split(' ').collect();
    for split in 1..tokens.len() {
        let tail = tokens[split..].join(" ");
        if parse_clock(&tail).is_some() {
            let head_len = tokens[..split].join(" ").len();
            return (text[..head_len].trim(), Some(text[head_len..].trim()));
        }
    }
    (text, None)
}

fn parse_iso(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M") {
        return Some(dt);
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    date.and_hms_opt(9, 0, 0)
}

fn parse_number(text: &str) -> Option<i64> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(n);
    }
    NUMBER_WORDS
        .iter()
        .find(|(word, _)| *word == text)
        .map(|(_, n)| *n)
}

/// "five minutes", "2 hours", "a day", "half an hour".
fn parse_offset(rest: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    if rest == "half an hour" {
        return Some(now + Duration::minutes(30));
    }
    let (amount, unit) = rest.rsplit_once(' ')?;
    let amount = parse_number(amount.trim())?;
    // Out-of-range amounts are unparseable, not a crash.
    let offset = match unit.trim_end_matches('s') {
        "minute" | "min" => Duration::try_minutes(amount),
        "hour" | "hr" => Duration::try_hours(amount),
        "day" => Duration::try_days(amount),
        "week" => Duration::try_weeks(amount),
        _ => return None,
    }?;
    now.checked_add_signed(offset)
}

/// "5", "5 pm", "5:30pm", "17:45", "noon", "midnight".
fn parse_clock(text: &str) -> Option<NaiveTime> {
    match text {
        "noon" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => return NaiveTime::from_hms_opt(0, 0, 0),
        _ => {}
    }

    let compact = text.replace(' ', "");
    let (digits, meridiem) = if let Some(d) = compact.strip_suffix("am") {
        (d, Some(false))
    } else if let Some(d) = compact.strip_suffix("pm") {
        (d, Some(true))
    } else if let Some(d) = compact.strip_suffix("o'clock") {
        (d, None)
    } else {
        (compact.as_str(), None)
    };

    let (hour, minute) = match digits.split_once(':') {
        Some((h, m)) => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
        None => (parse_number(digits)? as u32, 0),
    };

    let hour = match meridiem {
        Some(pm) => {
            if hour == 0 || hour > 12 {
                return None;
            }
            match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            }
        }
        None => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn parse_weekday(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let name = ["next ", "this ", "on "]
        .iter()
        .find_map(|prefix| text.strip_prefix(prefix))
        .unwrap_or(text);
    let target: Weekday = name.parse().ok()?;

    // Always a future day: saying today's weekday means a week from now.
    let mut ahead = (target.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    if ahead == 0 {
        ahead = 7;
    }
    Some(today + Duration::days(ahead))
}
