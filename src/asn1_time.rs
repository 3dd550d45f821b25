// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! ASN.1 UTCTime / GeneralizedTime parsing and calendar arithmetic.
//!
//! Everything here is plain integer math over [`CalendarTime`] values so
//! certificate lifetimes come out the same regardless of which parser
//! produced the certificate. Day counting goes through Julian day numbers
//! (Fliegel and Van Flandern), and weekday / day-of-year use Zeller's
//! congruence with months renumbered from March.

use std::fmt;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime};

pub const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Lowest and highest calendar year [`CalendarTime::adjust`] will produce.
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 9999;

/// A broken-down UTC time.
///
/// `month` is 1-based, `weekday` counts from Sunday = 0 and `yearday`
/// from January 1st = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalendarTime {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
    pub weekday: i32,
    pub yearday: i32,
}

pub fn is_leap_year(year: i32) -> bool {
    year % 400 == 0 || (year % 100 != 0 && year % 4 == 0)
}

/// Number of days in `month` (1-based), or 0 for a month outside 1..=12.
pub fn days_in_month(year: i32, month: i32) -> i32 {
    const MDAYS: [i32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if month == 2 {
        MDAYS[1] + i32::from(is_leap_year(year))
    } else {
        usize::try_from(month - 1)
            .ok()
            .and_then(|i| MDAYS.get(i))
            .copied()
            .unwrap_or(0)
    }
}

/// Fill in `weekday` and `yearday` from year, month and day.
///
/// Returns `false` and leaves `tm` untouched if the month is not 1..=12.
pub fn determine_days(tm: &mut CalendarTime) -> bool {
    const YDAYS: [i32; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
    if !(1..=12).contains(&tm.month) {
        return false;
    }
    let mut y = tm.year;
    // March is 4, February of the previous year is 15
    let mut m = tm.month - 1;
    let d = tm.day;

    tm.yearday = YDAYS[m as usize] + d - 1;
    if m >= 2 {
        tm.yearday += i32::from(is_leap_year(y));
        m += 2;
    } else {
        m += 14;
        y -= 1;
    }
    let c = y / 100;
    y %= 100;
    tm.weekday = (d + (13 * m) / 5 + y + y / 4 + c / 4 + 5 * c + 6) % 7;
    true
}

/// Julian day number of a Gregorian date.
pub fn date_to_julian(y: i64, m: i64, d: i64) -> i64 {
    (1461 * (y + 4800 + (m - 14) / 12)) / 4 + (367 * (m - 2 - 12 * ((m - 14) / 12))) / 12
        - (3 * ((y + 4900 + (m - 14) / 12) / 100)) / 4
        + d
        - 32075
}

/// Gregorian `(year, month, day)` of a Julian day number.
pub fn julian_to_date(jd: i64) -> (i64, i64, i64) {
    let mut l = jd + 68569;
    let n = (4 * l) / 146097;
    l -= (146097 * n + 3) / 4;
    let i = (4000 * (l + 1)) / 1461001;
    l = l - (1461 * i) / 4 + 31;
    let j = (80 * l) / 2447;
    let d = l - (2447 * j) / 80;
    l = j / 11;
    let m = j + 2 - (12 * l);
    let y = 100 * (n - 49) + i + l;
    (y, m, d)
}

/// Julian day and second-of-day of `tm` shifted by the given offsets.
fn julian_adj(tm: &CalendarTime, off_day: i64, offset_sec: i64) -> Option<(i64, i64)> {
    let mut offset_day = offset_sec / SECS_PER_DAY;
    // Same sign as offset_sec
    let mut offset_hms = offset_sec % SECS_PER_DAY;
    offset_day = offset_day.checked_add(off_day)?;
    offset_hms += i64::from(tm.hour) * 3600 + i64::from(tm.minute) * 60 + i64::from(tm.second);

    if offset_hms >= SECS_PER_DAY {
        offset_day = offset_day.checked_add(1)?;
        offset_hms -= SECS_PER_DAY;
    } else if offset_hms < 0 {
        offset_day = offset_day.checked_sub(1)?;
        offset_hms += SECS_PER_DAY;
    }

    let time_jd = date_to_julian(tm.year.into(), tm.month.into(), tm.day.into())
        .checked_add(offset_day)?;
    if time_jd < 0 {
        return None;
    }
    Some((time_jd, offset_hms))
}

impl CalendarTime {
    /// Build a time from its date and clock fields, deriving weekday and yearday.
    ///
    /// Returns `None` if any field is out of range for the Gregorian calendar.
    pub fn new(
        year: i32,
        month: i32,
        day: i32,
        hour: i32,
        minute: i32,
        second: i32,
    ) -> Option<Self> {
        if !(1..=12).contains(&month)
            || day < 1
            || day > days_in_month(year, month)
            || !(0..24).contains(&hour)
            || !(0..60).contains(&minute)
            || !(0..60).contains(&second)
        {
            return None;
        }
        let mut tm = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            ..Self::default()
        };
        determine_days(&mut tm).then_some(tm)
    }

    /// Shift by `days` and `seconds`, either of which may be negative.
    ///
    /// Returns `None` if the result falls before Julian day 0 or outside
    /// years [`MIN_YEAR`]..=[`MAX_YEAR`].
    pub fn adjust(&self, days: i64, seconds: i64) -> Option<Self> {
        let (jd, secs) = julian_adj(self, days, seconds)?;
        let first = date_to_julian(MIN_YEAR.into(), 1, 1);
        let last = date_to_julian(MAX_YEAR.into(), 12, 31);
        if !(first..=last).contains(&jd) {
            return None;
        }
        let (year, month, day) = julian_to_date(jd);
        if year < i64::from(MIN_YEAR) || year > i64::from(MAX_YEAR) {
            return None;
        }

        let mut tm = Self {
            year: year as i32,
            month: month as i32,
            day: day as i32,
            hour: (secs / 3600) as i32,
            minute: ((secs / 60) % 60) as i32,
            second: (secs % 60) as i32,
            ..*self
        };
        determine_days(&mut tm).then_some(tm)
    }

    /// Signed `(days, seconds)` from `from` to `to`.
    ///
    /// Both components carry the same sign, so `days * 86400 + seconds` is
    /// the exact difference.
    pub fn diff(from: &Self, to: &Self) -> Option<(i64, i64)> {
        let (from_jd, from_sec) = julian_adj(from, 0, 0)?;
        let (to_jd, to_sec) = julian_adj(to, 0, 0)?;
        let mut diff_day = to_jd - from_jd;
        let mut diff_sec = to_sec - from_sec;

        if diff_day > 0 && diff_sec < 0 {
            diff_day -= 1;
            diff_sec += SECS_PER_DAY;
        }
        if diff_day < 0 && diff_sec > 0 {
            diff_day += 1;
            diff_sec -= SECS_PER_DAY;
        }
        Some((diff_day, diff_sec))
    }

    pub fn to_datetime(&self) -> Option<OffsetDateTime> {
        let month = Month::try_from(u8::try_from(self.month).ok()?).ok()?;
        let date = Date::from_calendar_date(self.year, month, u8::try_from(self.day).ok()?).ok()?;
        let time = time::Time::from_hms(
            u8::try_from(self.hour).ok()?,
            u8::try_from(self.minute).ok()?,
            u8::try_from(self.second).ok()?,
        )
        .ok()?;
        Some(PrimitiveDateTime::new(date, time).assume_utc())
    }
}

impl From<OffsetDateTime> for CalendarTime {
    fn from(dt: OffsetDateTime) -> Self {
        let dt = dt.to_offset(time::UtcOffset::UTC);
        Self {
            year: dt.year(),
            month: i32::from(u8::from(dt.month())),
            day: i32::from(dt.day()),
            hour: i32::from(dt.hour()),
            minute: i32::from(dt.minute()),
            second: i32::from(dt.second()),
            weekday: i32::from(dt.weekday().number_days_from_sunday()),
            yearday: i32::from(dt.ordinal()) - 1,
        }
    }
}

/// Which ASN.1 string type a time value was encoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asn1TimeKind {
    /// `YYMMDDHHMM[SS]Z`, years 1950 through 2049.
    UtcTime,
    /// `YYYYMMDDHHMM[SS[.fff]]Z`.
    GeneralizedTime,
}

/// The textual content of an ASN.1 time value.
///
/// Values marked as X.509 times are parsed under RFC 5280 rules: seconds
/// and a trailing `Z` are mandatory, with no fractions or numeric offsets.
/// Unmarked values accept the older lenient forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asn1Time {
    kind: Asn1TimeKind,
    text: String,
    x509: bool,
}

impl Asn1Time {
    pub fn utc_time(text: impl Into<String>) -> Self {
        Self {
            kind: Asn1TimeKind::UtcTime,
            text: text.into(),
            x509: false,
        }
    }

    pub fn generalized_time(text: impl Into<String>) -> Self {
        Self {
            kind: Asn1TimeKind::GeneralizedTime,
            text: text.into(),
            x509: false,
        }
    }

    /// Mark this value as an X.509 certificate time so strict rules apply.
    pub fn x509_profile(mut self) -> Self {
        self.x509 = true;
        self
    }

    /// Encode `dt` the way RFC 5280 requires for certificate validity.
    pub fn from_datetime(dt: OffsetDateTime) -> Self {
        let dt = dt.to_offset(time::UtcOffset::UTC);
        let year = dt.year();
        let clock = format!(
            "{:02}{:02}{:02}{:02}{:02}Z",
            u8::from(dt.month()),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second()
        );
        let time = if (1950..2050).contains(&year) {
            Self::utc_time(format!("{:02}{}", year % 100, clock))
        } else {
            Self::generalized_time(format!("{:04}{}", year, clock))
        };
        time.x509_profile()
    }

    pub fn kind(&self) -> Asn1TimeKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_x509_profile(&self) -> bool {
        self.x509
    }

    /// Parse into a [`CalendarTime`], normalising any numeric offset to UTC.
    pub fn to_calendar_time(&self) -> Option<CalendarTime> {
        asn1_time_to_tm(self)
    }
}

impl fmt::Display for Asn1Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Parse an ASN.1 time string into a broken-down UTC time.
pub fn asn1_time_to_tm(time: &Asn1Time) -> Option<CalendarTime> {
    const MIN: [i32; 9] = [0, 0, 1, 1, 0, 0, 0, 0, 0];
    const MAX: [i32; 9] = [99, 99, 12, 31, 23, 59, 59, 12, 59];

    let utc = time.kind == Asn1TimeKind::UtcTime;
    let strict = time.x509;
    // Number of two-digit fields and the index where a timezone may appear early
    let (end, btz, min_len) = match (time.kind, strict) {
        (Asn1TimeKind::UtcTime, true) => (6, 5, 13),
        (Asn1TimeKind::UtcTime, false) => (6, 5, 11),
        (Asn1TimeKind::GeneralizedTime, true) => (7, 6, 15),
        (Asn1TimeKind::GeneralizedTime, false) => (7, 6, 13),
    };
    let field_index = |i: usize| if utc { i + 1 } else { i };

    let a = time.text.as_bytes();
    let l = a.len();
    if l < min_len {
        return None;
    }

    let mut tmp = CalendarTime::default();
    let mut o = 0;

    for i in 0..end {
        if !strict && i == btz && matches!(a[o], b'Z' | b'+' | b'-') {
            break;
        }
        let n = two_digits(a, o)?;
        o += 2;
        // A timezone must still follow
        if o >= l {
            return None;
        }

        let i2 = field_index(i);
        if n < MIN[i2] || n > MAX[i2] {
            return None;
        }
        match i2 {
            0 => tmp.year = n * 100,
            1 => {
                if utc {
                    tmp.year = if n < 50 { 2000 + n } else { 1900 + n };
                } else {
                    tmp.year += n;
                }
            }
            2 => tmp.month = n,
            3 => {
                if n > days_in_month(tmp.year, tmp.month) {
                    return None;
                }
                tmp.day = n;
                if !determine_days(&mut tmp) {
                    return None;
                }
            }
            4 => tmp.hour = n,
            5 => tmp.minute = n,
            6 => tmp.second = n,
            _ => {}
        }
    }

    // Optional fractional seconds
    if !utc && a[o] == b'.' {
        if strict {
            return None;
        }
        o += 1;
        let start = o;
        while o < l && a[o].is_ascii_digit() {
            o += 1;
        }
        if o == start || o == l {
            return None;
        }
    }

    if a[o] == b'Z' {
        o += 1;
    } else if !strict && matches!(a[o], b'+' | b'-') {
        // "+0100" means local time is ahead of UTC, so subtract
        let sign: i64 = if a[o] == b'-' { 1 } else { -1 };
        o += 1;
        if o + 4 != l {
            return None;
        }
        let mut offset: i64 = 0;
        for i in end..end + 2 {
            let n = two_digits(a, o)?;
            let i2 = field_index(i);
            if n < MIN[i2] || n > MAX[i2] {
                return None;
            }
            if i == end {
                offset = i64::from(n) * 3600;
            } else {
                offset += i64::from(n) * 60;
            }
            o += 2;
        }
        if offset != 0 {
            tmp = tmp.adjust(0, offset * sign)?;
        }
    } else {
        return None;
    }

    if o == l {
        Some(tmp)
    } else {
        None
    }
}

fn two_digits(a: &[u8], o: usize) -> Option<i32> {
    match (a.get(o), a.get(o + 1)) {
        (Some(hi), Some(lo)) if hi.is_ascii_digit() && lo.is_ascii_digit() => {
            Some(i32::from(hi - b'0') * 10 + i32::from(lo - b'0'))
        }
        _ => None,
    }
}

/// `(days, seconds)` from `from` to `to`, where `None` stands for now.
pub fn time_diff(from: Option<&Asn1Time>, to: Option<&Asn1Time>) -> Option<(i64, i64)> {
    let now = || CalendarTime::from(OffsetDateTime::now_utc());
    let from = match from {
        Some(t) => t.to_calendar_time()?,
        None => now(),
    };
    let to = match to {
        Some(t) => t.to_calendar_time()?,
        None => now(),
    };
    CalendarTime::diff(&from, &to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tm(y: i32, mo: i32, d: i32, h: i32, mi: i32, s: i32) -> CalendarTime {
        CalendarTime::new(y, mo, d, h, mi, s).expect("valid calendar time")
    }

    #[test]
    fn test_julian_known_values() {
        assert_eq!(date_to_julian(2000, 1, 1), 2451545);
        assert_eq!(date_to_julian(1970, 1, 1), 2440588);
        assert_eq!(julian_to_date(2451545), (2000, 1, 1));
        assert_eq!(julian_to_date(2440588), (1970, 1, 1));
    }

    #[test]
    fn test_julian_leap_days() {
        let feb28 = date_to_julian(2000, 2, 28);
        assert_eq!(julian_to_date(feb28 + 1), (2000, 2, 29));
        assert_eq!(julian_to_date(feb28 + 2), (2000, 3, 1));

        let feb28 = date_to_julian(1900, 2, 28);
        assert_eq!(julian_to_date(feb28 + 1), (1900, 3, 1));
    }

    #[test]
    fn test_determine_days() {
        // 2000-01-01 was a Saturday
        let t = tm(2000, 1, 1, 0, 0, 0);
        assert_eq!(t.weekday, 6);
        assert_eq!(t.yearday, 0);

        // 2024-12-31 was a Tuesday, day 366 of a leap year
        let t = tm(2024, 12, 31, 0, 0, 0);
        assert_eq!(t.weekday, 2);
        assert_eq!(t.yearday, 365);

        // 2023-03-01, not a leap year
        let t = tm(2023, 3, 1, 0, 0, 0);
        assert_eq!(t.weekday, 3);
        assert_eq!(t.yearday, 59);
    }

    #[test]
    fn test_calendar_time_new_rejects_bad_fields() {
        assert!(CalendarTime::new(2023, 2, 29, 0, 0, 0).is_none());
        assert!(CalendarTime::new(2024, 2, 29, 0, 0, 0).is_some());
        assert!(CalendarTime::new(2024, 13, 1, 0, 0, 0).is_none());
        assert!(CalendarTime::new(2024, 4, 31, 0, 0, 0).is_none());
        assert!(CalendarTime::new(2024, 4, 30, 24, 0, 0).is_none());
    }

    #[test]
    fn test_adjust_across_boundaries() {
        let t = tm(2023, 12, 31, 23, 59, 30);
        assert_eq!(t.adjust(0, 45), Some(tm(2024, 1, 1, 0, 0, 15)));
        assert_eq!(t.adjust(60, 0), Some(tm(2024, 2, 29, 23, 59, 30)));
        assert_eq!(t.adjust(-365, -30), Some(tm(2022, 12, 31, 23, 59, 0)));
        assert_eq!(t.adjust(0, -SECS_PER_DAY - 1), Some(tm(2023, 12, 30, 23, 59, 29)));
    }

    #[test]
    fn test_adjust_clamps_year_range() {
        assert!(tm(1900, 1, 1, 0, 0, 0).adjust(0, -1).is_none());
        assert!(tm(9999, 12, 31, 23, 59, 59).adjust(0, 1).is_none());
        assert!(tm(9999, 12, 31, 23, 59, 58).adjust(0, 1).is_some());
    }

    #[test]
    fn test_adjust_huge_offsets_are_out_of_range() {
        let t = tm(2024, 1, 1, 0, 0, 0);
        assert!(t.adjust(i64::MAX, 0).is_none());
        assert!(t.adjust(i64::MIN, 0).is_none());
        assert!(t.adjust(0, i64::MAX).is_none());
        assert!(t.adjust(0, i64::MIN).is_none());
        assert!(t.adjust(i64::MAX, i64::MAX).is_none());
        assert!(t.adjust(i64::MIN, i64::MIN).is_none());
        assert!(t.adjust(3_000_000, 0).is_none());
    }

    #[test]
    fn test_determine_days_rejects_bad_month() {
        let mut t = CalendarTime {
            year: 2024,
            month: 13,
            day: 1,
            ..CalendarTime::default()
        };
        assert!(!determine_days(&mut t));
        assert_eq!(t.yearday, 0);

        t.month = 0;
        assert!(!determine_days(&mut t));
        t.month = 12;
        assert!(determine_days(&mut t));
        assert_eq!(t.yearday, 335);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2023, 12), 31);
        assert_eq!(days_in_month(2023, 13), 0);
        assert_eq!(days_in_month(2023, 0), 0);
    }

    #[test]
    fn test_diff_same_sign() {
        let a = tm(2024, 1, 1, 12, 0, 0);
        let b = tm(2024, 1, 3, 6, 0, 0);
        assert_eq!(CalendarTime::diff(&a, &b), Some((1, 18 * 3600)));
        assert_eq!(CalendarTime::diff(&b, &a), Some((-1, -18 * 3600)));
        assert_eq!(CalendarTime::diff(&a, &a), Some((0, 0)));
    }

    #[test]
    fn test_diff_then_adjust_round_trips() {
        let a = tm(2019, 6, 15, 8, 30, 0);
        let b = tm(2031, 2, 1, 22, 5, 17);
        let (days, secs) = CalendarTime::diff(&a, &b).unwrap();
        assert_eq!(a.adjust(days, secs), Some(b));
    }

    #[test]
    fn test_parse_strict_utc_time() {
        let t = Asn1Time::utc_time("240229120000Z").x509_profile();
        assert_eq!(t.to_calendar_time(), Some(tm(2024, 2, 29, 12, 0, 0)));

        let t = Asn1Time::utc_time("500101000000Z").x509_profile();
        assert_eq!(t.to_calendar_time().map(|t| t.year), Some(1950));

        let t = Asn1Time::utc_time("491231235959Z").x509_profile();
        assert_eq!(t.to_calendar_time().map(|t| t.year), Some(2049));
    }

    #[test]
    fn test_parse_strict_rejects_lenient_forms() {
        // Missing seconds
        assert!(Asn1Time::utc_time("2402291200Z").x509_profile().to_calendar_time().is_none());
        // Numeric offset
        assert!(Asn1Time::utc_time("240229120000+0100")
            .x509_profile()
            .to_calendar_time()
            .is_none());
        // Fractional seconds
        assert!(Asn1Time::generalized_time("20240229120000.5Z")
            .x509_profile()
            .to_calendar_time()
            .is_none());
        // No timezone at all
        assert!(Asn1Time::generalized_time("20240229120000")
            .x509_profile()
            .to_calendar_time()
            .is_none());
    }

    #[test]
    fn test_parse_strict_generalized_time() {
        let t = Asn1Time::generalized_time("20500101000000Z").x509_profile();
        assert_eq!(t.to_calendar_time(), Some(tm(2050, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn test_parse_lenient_without_seconds() {
        let t = Asn1Time::utc_time("2402291200Z");
        assert_eq!(t.to_calendar_time(), Some(tm(2024, 2, 29, 12, 0, 0)));

        let t = Asn1Time::generalized_time("202402291200Z");
        assert_eq!(t.to_calendar_time(), Some(tm(2024, 2, 29, 12, 0, 0)));
    }

    #[test]
    fn test_parse_lenient_offsets() {
        // 12:00 at +01:30 is 10:30 UTC
        let t = Asn1Time::utc_time("240229120000+0130");
        assert_eq!(t.to_calendar_time(), Some(tm(2024, 2, 29, 10, 30, 0)));

        // 23:00 at -02:00 is 01:00 UTC the next day
        let t = Asn1Time::generalized_time("20240229230000-0200");
        assert_eq!(t.to_calendar_time(), Some(tm(2024, 3, 1, 1, 0, 0)));

        // Offset hours above 12 are out of range
        assert!(Asn1Time::utc_time("240229120000+1300").to_calendar_time().is_none());
        // Offset must be exactly four digits
        assert!(Asn1Time::utc_time("240229120000+01").to_calendar_time().is_none());
        assert!(Asn1Time::utc_time("240229120000+01000").to_calendar_time().is_none());
    }

    #[test]
    fn test_parse_lenient_fractional_seconds() {
        let t = Asn1Time::generalized_time("20240229120000.123Z");
        assert_eq!(t.to_calendar_time(), Some(tm(2024, 2, 29, 12, 0, 0)));

        // At least one digit after the point
        assert!(Asn1Time::generalized_time("20240229120000.Z").to_calendar_time().is_none());
        // Fractions never apply to UTCTime
        assert!(Asn1Time::utc_time("240229120000.5Z").to_calendar_time().is_none());
    }

    #[test]
    fn test_parse_rejects_bad_fields() {
        assert!(Asn1Time::utc_time("230229120000Z").to_calendar_time().is_none());
        assert!(Asn1Time::utc_time("241301120000Z").to_calendar_time().is_none());
        assert!(Asn1Time::utc_time("240100120000Z").to_calendar_time().is_none());
        assert!(Asn1Time::utc_time("240101240000Z").to_calendar_time().is_none());
        assert!(Asn1Time::utc_time("2401011200a0Z").to_calendar_time().is_none());
        assert!(Asn1Time::utc_time("240101120000Zjunk").to_calendar_time().is_none());
        assert!(Asn1Time::utc_time("2401").to_calendar_time().is_none());
    }

    #[test]
    fn test_from_datetime_chooses_encoding_by_year() {
        let dt = tm(2049, 12, 31, 23, 59, 59).to_datetime().unwrap();
        let t = Asn1Time::from_datetime(dt);
        assert_eq!(t.kind(), Asn1TimeKind::UtcTime);
        assert_eq!(t.as_str(), "491231235959Z");
        assert!(t.is_x509_profile());

        let dt = tm(2050, 1, 1, 0, 0, 0).to_datetime().unwrap();
        let t = Asn1Time::from_datetime(dt);
        assert_eq!(t.kind(), Asn1TimeKind::GeneralizedTime);
        assert_eq!(t.as_str(), "20500101000000Z");

        let dt = tm(1949, 6, 1, 0, 0, 0).to_datetime().unwrap();
        assert_eq!(Asn1Time::from_datetime(dt).as_str(), "19490601000000Z");
    }

    #[test]
    fn test_calendar_time_from_datetime() {
        let dt = tm(2024, 3, 10, 5, 6, 7).to_datetime().unwrap();
        assert_eq!(CalendarTime::from(dt), tm(2024, 3, 10, 5, 6, 7));
    }

    #[test]
    fn test_time_diff_against_now() {
        let now = OffsetDateTime::now_utc();
        let future = Asn1Time::from_datetime(now + time::Duration::days(3));
        let (days, secs) = time_diff(None, Some(&future)).unwrap();
        // The clock may tick between the two reads
        let total = days * SECS_PER_DAY + secs;
        assert!((3 * SECS_PER_DAY - 2..=3 * SECS_PER_DAY).contains(&total));
    }
}
