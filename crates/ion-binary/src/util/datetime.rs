//! Civil calendar arithmetic and timestamp text formatting.
//!
//! Timestamps travel in UTC; these helpers shift them by an offset in minutes
//! and render the local result in RFC 3339 style.

pub(crate) const MINUTES_PER_DAY: i64 = 24 * 60;
pub(crate) const MILLISECONDS_PER_MINUTE: i64 = 60 * 1000;
pub(crate) const MILLISECONDS_PER_DAY: i64 = MINUTES_PER_DAY * MILLISECONDS_PER_MINUTE;

/// Returns true if the given year is a leap year.
pub fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Returns the number of days in a given month (1-indexed), or 0 for an
/// invalid month.
pub fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Calculates days since Unix epoch for a given date.
pub fn date_to_days(year: i64, month: u32, day: u32) -> i64 {
    // Howard Hinnant's days_from_civil.
    let y = if month <= 2 { year - 1 } else { year };
    let m = if month <= 2 {
        i64::from(month) + 9
    } else {
        i64::from(month) - 3
    };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let doy = (153 * m + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;

    era * 146097 + doe - 719468
}

/// Converts days since Unix epoch to (year, month, day).
pub fn days_to_date(days: i64) -> (i64, u32, u32) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;

    let year = if m <= 2 { y + 1 } else { y };
    (year, m, d)
}

/// Shifts a UTC date and time of day by `offset_min` minutes.
///
/// Returns the local `(year, month, day, hour, minute)`.
pub fn shift_minutes(
    year: i64,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    offset_min: i32,
) -> (i64, u32, u32, u32, u32) {
    let total = date_to_days(year, month, day) * MINUTES_PER_DAY
        + i64::from(hour) * 60
        + i64::from(minute)
        + i64::from(offset_min);
    let days = total.div_euclid(MINUTES_PER_DAY);
    let minute_of_day = total.rem_euclid(MINUTES_PER_DAY);
    let (year, month, day) = days_to_date(days);
    (
        year,
        month,
        day,
        (minute_of_day / 60) as u32,
        (minute_of_day % 60) as u32,
    )
}

/// Formats an offset in minutes as `Z`, `+HH:MM` or `-HH:MM`.
///
/// An unknown offset renders as `-00:00`.
pub fn format_offset(offset_min: Option<i32>) -> String {
    match offset_min {
        None => "-00:00".to_string(),
        Some(0) => "Z".to_string(),
        Some(offset) => {
            let sign = if offset >= 0 { '+' } else { '-' };
            let abs_offset = offset.unsigned_abs();
            format!("{}{:02}:{:02}", sign, abs_offset / 60, abs_offset % 60)
        }
    }
}

/// Formats fractional-second digits, padding `digits` on the left to `scale`
/// places. Returns an empty string when `scale` is zero.
pub fn format_fraction(digits: &str, scale: usize) -> String {
    if scale == 0 {
        return String::new();
    }
    format!(".{:0>width$}", digits, width = scale)
}
