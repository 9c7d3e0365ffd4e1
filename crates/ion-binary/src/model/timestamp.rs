//! Precision-tagged timestamps.

use std::fmt;

use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;

use crate::error::{IonError, Result};
use crate::limits::{MAX_FRACTION_DIGITS, MAX_OFFSET_MINUTES};
use crate::model::Decimal;
use crate::util::datetime::{
    date_to_days, days_in_month, format_fraction, format_offset, shift_minutes,
    MILLISECONDS_PER_DAY, MILLISECONDS_PER_MINUTE,
};

/// The most specific component present in a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Precision {
    Year,
    Month,
    Day,
    /// Hour and minute (they always travel together).
    Minute,
    Second,
    Fraction,
}

/// An Ion timestamp.
///
/// Components are stored in UTC, exactly as they appear on the wire. The
/// offset (minutes east of UTC, `None` when unknown) only affects how the
/// timestamp is rendered as local time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Timestamp {
    year: u32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    fraction: Option<Decimal>,
    offset: Option<i32>,
    precision: Precision,
}

impl Timestamp {
    /// Starts a timestamp with year precision.
    pub fn builder(year: u32) -> TimestampBuilder {
        TimestampBuilder {
            year,
            month: None,
            day: None,
            hour_minute: None,
            second: None,
            fraction: None,
            offset: None,
        }
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    /// Fractional seconds in `[0, 1)`, present at [`Precision::Fraction`].
    pub fn fraction(&self) -> Option<&Decimal> {
        self.fraction.as_ref()
    }

    /// Local offset in minutes, `None` when unknown.
    pub fn offset(&self) -> Option<i32> {
        self.offset
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Milliseconds since the Unix epoch (sub-millisecond digits truncated).
    pub fn to_epoch_millis(&self) -> i64 {
        let days = date_to_days(
            i64::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        );
        let minutes = i64::from(self.hour) * 60 + i64::from(self.minute);
        let fraction_ms = self
            .fraction
            .as_ref()
            .and_then(Decimal::to_big_decimal)
            .and_then(|f| (f * BigDecimal::from(1000)).with_scale(0).to_i64())
            .unwrap_or(0);
        days * MILLISECONDS_PER_DAY
            + minutes * MILLISECONDS_PER_MINUTE
            + i64::from(self.second) * 1000
            + fraction_ms
    }
}

impl fmt::Display for Timestamp {
    /// Renders local time in Ion text form: `2024T`, `2024-03T`,
    /// `2024-03-15`, or `2024-03-15T10:30:05.250+01:00`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.precision {
            Precision::Year => return write!(f, "{:04}T", self.year),
            Precision::Month => return write!(f, "{:04}-{:02}T", self.year, self.month),
            Precision::Day => {
                return write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day);
            }
            _ => {}
        }

        let (year, month, day, hour, minute) = shift_minutes(
            i64::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
            u32::from(self.hour),
            u32::from(self.minute),
            self.offset.unwrap_or(0),
        );
        write!(f, "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}")?;
        if self.precision >= Precision::Second {
            write!(f, ":{:02}", self.second)?;
        }
        if let Some(fraction) = &self.fraction {
            let scale = fraction
                .exponent()
                .checked_neg()
                .and_then(|scale| usize::try_from(scale).ok())
                .unwrap_or(0);
            let digits = fraction.coefficient_magnitude().to_string();
            f.write_str(&format_fraction(&digits, scale))?;
        }
        f.write_str(&format_offset(self.offset))
    }
}

/// Builder for [`Timestamp`]; each setter raises the precision.
#[derive(Debug, Clone)]
pub struct TimestampBuilder {
    year: u32,
    month: Option<u8>,
    day: Option<u8>,
    hour_minute: Option<(u8, u8)>,
    second: Option<u8>,
    fraction: Option<Decimal>,
    offset: Option<i32>,
}

impl TimestampBuilder {
    pub fn month(mut self, month: u8) -> Self {
        self.month = Some(month);
        self
    }

    pub fn day(mut self, day: u8) -> Self {
        self.day = Some(day);
        self
    }

    pub fn hour_minute(mut self, hour: u8, minute: u8) -> Self {
        self.hour_minute = Some((hour, minute));
        self
    }

    pub fn second(mut self, second: u8) -> Self {
        self.second = Some(second);
        self
    }

    pub fn fraction(mut self, fraction: Decimal) -> Self {
        self.fraction = Some(fraction);
        self
    }

    /// Sets the offset in minutes; `None` marks it unknown.
    pub fn offset(mut self, offset: Option<i32>) -> Self {
        self.offset = offset;
        self
    }

    /// Validates the components and builds the timestamp.
    pub fn build(self) -> Result<Timestamp> {
        let fail = |reason: &'static str| -> Result<Timestamp> {
            Err(IonError::malformed("timestamp", reason))
        };

        if !(1..=9999).contains(&self.year) {
            return fail("year out of range");
        }
        if let Some(offset) = self.offset {
            if i64::from(offset).abs() >= MAX_OFFSET_MINUTES {
                return fail("offset out of range");
            }
        }

        let mut precision = Precision::Year;
        let month = match self.month {
            Some(m) if (1..=12).contains(&m) => {
                precision = Precision::Month;
                m
            }
            Some(_) => return fail("month out of range"),
            None => 1,
        };
        let day = match self.day {
            Some(_) if precision < Precision::Month => return fail("day without month"),
            Some(d)
                if d >= 1
                    && u32::from(d) <= days_in_month(i64::from(self.year), u32::from(month)) =>
            {
                precision = Precision::Day;
                d
            }
            Some(_) => return fail("day out of range"),
            None => 1,
        };
        let (hour, minute) = match self.hour_minute {
            Some(_) if precision < Precision::Day => return fail("time without day"),
            Some((h, m)) if h < 24 && m < 60 => {
                precision = Precision::Minute;
                (h, m)
            }
            Some(_) => return fail("hour or minute out of range"),
            None => (0, 0),
        };
        let second = match self.second {
            Some(_) if precision < Precision::Minute => return fail("second without minute"),
            Some(s) if s < 60 => {
                precision = Precision::Second;
                s
            }
            Some(_) => return fail("second out of range"),
            None => 0,
        };
        if let Some(fraction) = &self.fraction {
            if precision < Precision::Second {
                return fail("fraction without second");
            }
            if fraction.is_sign_negative() && !fraction.is_zero() {
                return fail("fraction is negative");
            }
            if fraction.exponent().unsigned_abs() > MAX_FRACTION_DIGITS {
                return fail("fraction exponent out of range");
            }
            if !fraction_below_one(fraction) {
                return fail("fraction is not less than one");
            }
            precision = Precision::Fraction;
        }

        Ok(Timestamp {
            year: self.year,
            month,
            day,
            hour,
            minute,
            second,
            fraction: self.fraction,
            offset: self.offset,
            precision,
        })
    }
}

/// True when a non-negative fraction is below one: zero, or a coefficient
/// with no more digits than the negated exponent.
fn fraction_below_one(fraction: &Decimal) -> bool {
    if fraction.is_zero() {
        return true;
    }
    let digits = fraction.coefficient_magnitude().to_string().len() as u64;
    fraction.exponent() < 0 && digits <= fraction.exponent().unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_precision_levels() {
        let ts = Timestamp::builder(2024).build().unwrap();
        assert_eq!(ts.precision(), Precision::Year);
        assert_eq!(ts.to_string(), "2024T");

        let ts = Timestamp::builder(2024).month(3).build().unwrap();
        assert_eq!(ts.to_string(), "2024-03T");

        let ts = Timestamp::builder(2024).month(3).day(15).build().unwrap();
        assert_eq!(ts.precision(), Precision::Day);
        assert_eq!(ts.to_string(), "2024-03-15");
    }

    #[test]
    fn test_display_applies_offset() {
        // 23:30 UTC at +01:00 is 00:30 the next day.
        let ts = Timestamp::builder(2024)
            .month(1)
            .day(1)
            .hour_minute(23, 30)
            .offset(Some(60))
            .build()
            .unwrap();
        assert_eq!(ts.to_string(), "2024-01-02T00:30+01:00");
        assert_eq!(ts.hour(), 23);
    }

    #[test]
    fn test_display_fraction_and_unknown_offset() {
        let ts = Timestamp::builder(2024)
            .month(3)
            .day(15)
            .hour_minute(10, 30)
            .second(5)
            .fraction(Decimal::new(25, -3))
            .build()
            .unwrap();
        assert_eq!(ts.precision(), Precision::Fraction);
        assert_eq!(ts.to_string(), "2024-03-15T10:30:05.025-00:00");
    }

    #[test]
    fn test_fraction_digit_limit() {
        let exponent = -(MAX_FRACTION_DIGITS as i64);
        let ts = Timestamp::builder(2024)
            .month(1)
            .day(1)
            .hour_minute(0, 0)
            .second(0)
            .fraction(Decimal::new(5, exponent))
            .offset(Some(0))
            .build()
            .unwrap();
        let text = ts.to_string();
        assert!(text.ends_with("5Z"));
        assert_eq!(text.len(), "2024-01-01T00:00:00.".len() + MAX_FRACTION_DIGITS as usize + 1);
        assert_eq!(ts.to_epoch_millis(), 1_704_067_200_000);

        let err = Timestamp::builder(2024)
            .month(1)
            .day(1)
            .hour_minute(0, 0)
            .second(0)
            .fraction(Decimal::new(5, exponent - 1))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);
    }

    #[test]
    fn test_epoch_millis() {
        let ts = Timestamp::builder(1970)
            .month(1)
            .day(2)
            .hour_minute(0, 1)
            .second(1)
            .fraction(Decimal::new(5, -1))
            .offset(Some(0))
            .build()
            .unwrap();
        assert_eq!(ts.to_epoch_millis(), 86_400_000 + 60_000 + 1_500);
    }

    #[test]
    fn test_validation() {
        let cases = [
            Timestamp::builder(0).build(),
            Timestamp::builder(2024).month(13).build(),
            Timestamp::builder(2023).month(2).day(29).build(),
            Timestamp::builder(2024).day(1).build(),
            Timestamp::builder(2024).month(1).day(1).hour_minute(24, 0).build(),
            Timestamp::builder(2024)
                .month(1)
                .day(1)
                .hour_minute(1, 0)
                .offset(Some(1440))
                .build(),
            Timestamp::builder(2024)
                .month(1)
                .day(1)
                .hour_minute(1, 0)
                .second(0)
                .fraction(Decimal::new(10, -1))
                .build(),
            Timestamp::builder(2024)
                .month(1)
                .day(1)
                .hour_minute(1, 0)
                .second(0)
                .fraction(Decimal::new(5, -(1 << 40)))
                .build(),
            Timestamp::builder(2024)
                .month(1)
                .day(1)
                .hour_minute(1, 0)
                .second(0)
                .fraction(Decimal::negative_zero(1 << 40))
                .build(),
        ];
        for case in cases {
            assert_eq!(case.unwrap_err().kind(), ErrorKind::MalformedValue);
        }

        assert!(Timestamp::builder(2024).month(2).day(29).build().is_ok());
    }
}
