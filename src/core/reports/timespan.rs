// Free-text offense time parsing.
//
// Moderators describe when something happened either as "how long ago"
// (`2 days and 3h`, `1w, 2d`, `1.02:30:00`) or as an explicit timestamp
// (`2024-05-01 18:30`, RFC 3339). Durations are subtracted from `now`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Resolve `input` to the UTC instant of the offense.
///
/// Returns `None` for anything unparseable and for spans that add up to zero.
pub fn parse_offense_time(input: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Some(explicit) = parse_timestamp(input) {
        return Some(explicit);
    }

    let span = parse_span(input)?;
    if span.is_zero() {
        return None;
    }
    now.checked_sub_signed(span)
}

/// Parse a "how long ago" span without resolving it against a clock.
pub fn parse_span(input: &str) -> Option<Duration> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }
    parse_clock(&input).or_else(|| parse_units(&input))
}

fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(input) {
        return Some(time.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(time) = NaiveDateTime::parse_from_str(input, format) {
            return Some(time.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|time| time.and_utc())
}

/// `d.hh:mm[:ss]`, `hh:mm[:ss]`, or a bare number of days.
fn parse_clock(input: &str) -> Option<Duration> {
    if input.chars().all(|c| c.is_ascii_digit()) {
        return Duration::try_days(input.parse().ok()?);
    }

    let (days, clock) = match input.split_once('.') {
        Some((days, rest)) => (days.parse::<i64>().ok()?, rest),
        None => (0, input),
    };

    let parts: Vec<i64> = clock
        .split(':')
        .map(|p| p.parse::<i64>().ok())
        .collect::<Option<_>>()?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m] => (*h, *m, 0),
        [h, m, s] => (*h, *m, *s),
        _ => return None,
    };

    if days < 0 || !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    if !(0..60).contains(&seconds) {
        return None;
    }

    Duration::try_days(days)?
        .checked_add(&Duration::try_hours(hours)?)?
        .checked_add(&Duration::try_minutes(minutes)?)?
        .checked_add(&Duration::try_seconds(seconds)?)
}

/// `2 days and 3h`, `1w, 2d`, `45 minutes`. Every token must be understood.
fn parse_units(input: &str) -> Option<Duration> {
    let mut total = Duration::zero();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut number = String::new();
        while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
            number.push(c);
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let mut unit = String::new();
        while let Some(c) = chars.next_if(|c| c.is_ascii_alphabetic()) {
            unit.push(c);
        }

        if number.is_empty() {
            if unit == "and" {
                continue;
            }
            return None;
        }

        let amount: i64 = number.parse().ok()?;
        total = total.checked_add(&unit_span(&unit, amount)?)?;
    }

    Some(total)
}

fn unit_span(unit: &str, amount: i64) -> Option<Duration> {
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Duration::try_seconds(amount),
        "m" | "min" | "mins" | "minute" | "minutes" => Duration::try_minutes(amount),
        "h" | "hr" | "hrs" | "hour" | "hours" => Duration::try_hours(amount),
        "d" | "day" | "days" => Duration::try_days(amount),
        "w" | "week" | "weeks" => Duration::try_weeks(amount),
        // Months are flat 30-day blocks.
        "month" | "months" => Duration::try_days(amount.checked_mul(30)?),
        _ => None,
    }
}
