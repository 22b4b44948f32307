//! Timestamp text codec: a flag-driven formatter and a tolerant parser.
//!
//! The formatter writes the compact `[YYYY ]Mon DD HH:MM:SS[.fff[fff]]`
//! header stamp. The parser accepts that output plus the numeric
//! `YYYY-MM-DD` / `MM-DD` date forms, an optional weekday token, fractional
//! seconds and a `+HH`/`-HH` zone suffix, filling every omitted field from a
//! caller-supplied reference timestamp. It must stay total over arbitrary
//! bytes: anything it cannot make sense of degrades to reference-derived
//! values instead of failing, except for non-digits inside a mandatory
//! numeric field.

use bitflags::bitflags;
use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike, Utc};
use std::fmt::Write;

use crate::error::StampError;

bitflags! {
    /// Layout bits for the line timestamp.
    ///
    /// `DATE` adds `Mon DD ` before the clock, `YEAR` additionally prefixes
    /// the 4-digit year (it has no effect without `DATE`), `UTC` converts
    /// the instant before formatting, and `MILLIS`/`MICROS` select the
    /// fractional-second precision. When both precision bits are set,
    /// `MICROS` wins.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StampFlags: u8 {
        const DATE = 1 << 0;
        const YEAR = 1 << 1;
        const UTC = 1 << 2;
        const MILLIS = 1 << 3;
        const MICROS = 1 << 4;
    }
}

impl Default for StampFlags {
    fn default() -> Self {
        StampFlags::DATE
    }
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn month_no(token: &[u8]) -> Option<u32> {
    MONTHS
        .iter()
        .position(|m| m.as_bytes() == token)
        .map(|i| i as u32 + 1)
}

/// Append a timestamp to `buf` under the layout selected by `flags`.
///
/// No timezone offset is ever emitted; pair with `UTC` when the output has
/// to be unambiguous.
pub fn append_stamp(buf: &mut String, t: &DateTime<FixedOffset>, flags: StampFlags) {
    let t = if flags.contains(StampFlags::UTC) {
        t.with_timezone(&Utc).fixed_offset()
    } else {
        *t
    };
    if flags.contains(StampFlags::DATE) {
        if flags.contains(StampFlags::YEAR) {
            let _ = write!(buf, "{:04} ", t.year());
        }
        buf.push_str(MONTHS[t.month0() as usize]);
        let _ = write!(buf, " {:02} ", t.day());
    }
    let _ = write!(buf, "{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second());
    if flags.contains(StampFlags::MICROS) {
        let _ = write!(buf, ".{:06}", t.nanosecond() / 1_000);
    } else if flags.contains(StampFlags::MILLIS) {
        let _ = write!(buf, ".{:03}", t.nanosecond() / 1_000_000);
    }
}

/// [`parse_stamp`] over a `&str`.
pub fn parse_stamp_str(
    s: &str,
    tref: &DateTime<FixedOffset>,
) -> Result<(DateTime<FixedOffset>, usize), StampError> {
    parse_stamp(s.as_bytes(), tref)
}

/// Parse a timestamp from the start of `b`, taking every omitted field from
/// `tref`.
///
/// Returns the parsed instant and the number of bytes consumed. Inputs too
/// short to carry a timestamp yield the Unix epoch with zero bytes consumed;
/// callers branch on `consumed == 0` to detect that. Errors are raised only
/// for a non-digit inside a mandatory numeric field or an unknown month
/// token; all other defects (bad clock layout, truncated offsets, impossible
/// calendar values) silently fall back to `tref`.
pub fn parse_stamp(
    b: &[u8],
    tref: &DateTime<FixedOffset>,
) -> Result<(DateTime<FixedOffset>, usize), StampError> {
    if b.len() < 5 {
        return Ok((DateTime::UNIX_EPOCH.fixed_offset(), 0));
    }

    let mut year = tref.year();
    let mut month = tref.month();
    let mut day = tref.day();
    let mut n: usize = 0;
    let mut have_date = false;
    let mut textual = false;

    if b[4] == b'-' {
        // numeric date with year: YYYY-MM-DD
        if b.len() < 10 {
            return Ok((DateTime::UNIX_EPOCH.fixed_offset(), 0));
        }
        year = parse_uint(b, 0, 4)? as i32;
        n = 5;
        have_date = true;
    } else if b[4] == b' '
        && b.len() >= 6
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[5].is_ascii_uppercase()
    {
        // textual date with year: YYYY Mon DD
        year = parse_uint(b, 0, 4)? as i32;
        n = 5;
        have_date = true;
        textual = true;
    } else if b[0].is_ascii_uppercase()
        && b[1].is_ascii_lowercase()
        && b[2].is_ascii_lowercase()
        && b[3] == b' '
    {
        // textual date without year: Mon DD
        have_date = true;
        textual = true;
    } else if b[2] == b':' {
        // time-only input, keep the reference date
    } else {
        // year-less numeric date: MM-DD
        have_date = true;
    }

    if have_date {
        if textual {
            if b.len() < n + 6 {
                return Ok((DateTime::UNIX_EPOCH.fixed_offset(), 0));
            }
            month = match month_no(&b[n..n + 3]) {
                Some(m) => m,
                None => {
                    return Err(StampError::Month(
                        String::from_utf8_lossy(&b[n..n + 3]).into_owned(),
                    ))
                }
            };
            day = parse_uint(b, n + 4, n + 6)?;
            n += 6;
        } else {
            if b.len() < n + 5 {
                return Ok((DateTime::UNIX_EPOCH.fixed_offset(), 0));
            }
            month = parse_uint(b, n, n + 2)?;
            day = parse_uint(b, n + 3, n + 5)?;
            n += 5;
        }
        if n + 3 >= b.len() {
            // nothing but the date, take the whole clock from the reference
            return Ok(finish(
                year,
                month,
                day,
                tref.hour(),
                tref.minute(),
                tref.second(),
                tref.nanosecond(),
                *tref.offset(),
                tref,
                n,
            ));
        } else if b[n + 3] == b' ' {
            // skip an unvalidated 2-character weekday token
            n += 4;
        } else {
            n += 1;
        }
    }

    let mut hour = tref.hour();
    let mut minute = tref.minute();
    let mut second = tref.second();
    if b.len() >= n + 8 {
        if b[n + 2] == b':' && b[n + 5] == b':' {
            if let (Ok(h), Ok(m), Ok(s)) = (
                parse_uint(b, n, n + 2),
                parse_uint(b, n + 3, n + 5),
                parse_uint(b, n + 6, n + 8),
            ) {
                hour = h;
                minute = m;
                second = s;
            }
        }
        n += 8;
    }

    let mut nsec = tref.nanosecond();
    if n + 1 < b.len() && b[n] == b'.' {
        n += 1;
        nsec = 0;
        let mut p = 100_000_000u32;
        while p > 0 && n < b.len() && b[n].is_ascii_digit() {
            nsec += p * (b[n] - b'0') as u32;
            p /= 10;
            n += 1;
        }
    }
    // With no fraction present only the nanosecond defaults from the
    // reference; a successfully parsed clock stands.

    let mut offset = *tref.offset();
    if n < b.len() {
        let sign = match b[n] {
            b'+' => Some(1i32),
            b'-' => Some(-1i32),
            _ => None,
        };
        if let Some(sign) = sign {
            if n + 2 < b.len() {
                if let Ok(dh) = parse_uint(b, n + 1, n + 3) {
                    if let Some(zone) = FixedOffset::east_opt(sign * dh as i32 * 3600) {
                        offset = zone;
                    }
                }
                n += 3;
            }
        }
    }

    Ok(finish(
        year, month, day, hour, minute, second, nsec, offset, tref, n,
    ))
}

/// Assemble the collected fields into an instant, degrading to the
/// reference when they do not form a valid calendar date or clock.
#[allow(clippy::too_many_arguments)]
fn finish(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    nsec: u32,
    offset: FixedOffset,
    tref: &DateTime<FixedOffset>,
    n: usize,
) -> (DateTime<FixedOffset>, usize) {
    let t = offset
        .with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .and_then(|t| t.with_nanosecond(nsec));
    (t.unwrap_or(*tref), n)
}

fn digit(b: u8) -> Result<u32, StampError> {
    if b.is_ascii_digit() {
        Ok((b - b'0') as u32)
    } else {
        Err(StampError::Digit(b as char))
    }
}

// Callers guarantee start..end is in bounds.
fn parse_uint(b: &[u8], start: usize, end: usize) -> Result<u32, StampError> {
    let mut v = digit(b[start])?;
    for &d in &b[start + 1..end] {
        v = 10 * v + digit(d)?;
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DurationRound, TimeDelta};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn ts() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2023, 4, 1, 13, 42, 18)
            .unwrap()
            .with_nanosecond(432_123_000)
            .unwrap()
            .fixed_offset()
    }

    #[test]
    fn formats_stamp_layouts() {
        let t = ts();
        let cases = [
            (StampFlags::empty(), "13:42:18"),
            (StampFlags::DATE, "Apr 01 13:42:18"),
            (StampFlags::DATE | StampFlags::YEAR, "2023 Apr 01 13:42:18"),
            (StampFlags::MILLIS, "13:42:18.432"),
            (StampFlags::MICROS, "13:42:18.432123"),
            (StampFlags::MILLIS | StampFlags::MICROS, "13:42:18.432123"),
            (
                StampFlags::DATE | StampFlags::YEAR | StampFlags::UTC | StampFlags::MICROS,
                "2023 Apr 01 13:42:18.432123",
            ),
        ];
        for (flags, want) in cases {
            let mut buf = String::new();
            append_stamp(&mut buf, &t, flags);
            assert_eq!(buf, want, "flags {flags:?}");
        }
    }

    #[test]
    fn utc_flag_converts_zoned_input() {
        let t = ts().with_timezone(&FixedOffset::east_opt(2 * 3600).unwrap());
        let mut local = String::new();
        append_stamp(&mut local, &t, StampFlags::empty());
        assert_eq!(local, "15:42:18");
        let mut utc = String::new();
        append_stamp(&mut utc, &t, StampFlags::UTC);
        assert_eq!(utc, "13:42:18");
    }

    #[test]
    fn format_parse_round_trip_all_flag_combinations() {
        let t = ts();
        for bits in 0u8..32 {
            let flags = StampFlags::from_bits_truncate(bits);
            let mut buf = String::new();
            append_stamp(&mut buf, &t, flags);
            let (parsed, consumed) = parse_stamp_str(&buf, &t).unwrap();
            assert_eq!(consumed, buf.len(), "consumed all of {buf:?}");
            let round = if flags.contains(StampFlags::MICROS) {
                TimeDelta::microseconds(1)
            } else if flags.contains(StampFlags::MILLIS) {
                TimeDelta::milliseconds(1)
            } else {
                TimeDelta::seconds(1)
            };
            assert_eq!(
                parsed.duration_round(round).unwrap(),
                t.duration_round(round).unwrap(),
                "flags {flags:?} text {buf:?}"
            );
        }
    }

    #[test]
    fn parses_full_stamp_with_weekday_and_offset() {
        let tref = Utc
            .with_ymd_and_hms(2006, 11, 12, 0, 0, 0)
            .unwrap()
            .fixed_offset();
        let (t, n) = parse_stamp_str("2006-11-12 Mo 15:24:35.987654-07", &tref).unwrap();
        assert_eq!(n, 32);
        assert_eq!(t.offset().local_minus_utc(), -7 * 3600);
        let expect = FixedOffset::west_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2006, 11, 12, 15, 24, 35)
            .unwrap()
            .with_nanosecond(987_654_000)
            .unwrap();
        assert_eq!(t, expect);
    }

    #[test]
    fn date_only_input_takes_clock_from_reference() {
        let tref = Utc
            .with_ymd_and_hms(2006, 1, 2, 15, 24, 35)
            .unwrap()
            .with_nanosecond(7)
            .unwrap()
            .fixed_offset();
        let (t, n) = parse_stamp_str("11-12", &tref).unwrap();
        assert_eq!(n, 5);
        assert_eq!(
            (t.year(), t.month(), t.day()),
            (2006, 11, 12),
            "date from input, year from reference"
        );
        assert_eq!((t.hour(), t.minute(), t.second()), (15, 24, 35));
        assert_eq!(t.nanosecond(), 7);
    }

    #[test]
    fn parsed_clock_survives_missing_fraction() {
        let tref = Utc
            .with_ymd_and_hms(2006, 1, 2, 1, 2, 3)
            .unwrap()
            .with_nanosecond(7)
            .unwrap()
            .fixed_offset();
        let (t, n) = parse_stamp_str("15:24:35", &tref).unwrap();
        assert_eq!(n, 8);
        assert_eq!((t.hour(), t.minute(), t.second()), (15, 24, 35));
        assert_eq!(t.nanosecond(), 7, "nanosecond defaults from reference");
    }

    #[test]
    fn bad_clock_layout_falls_back_to_reference_clock() {
        let tref = Utc
            .with_ymd_and_hms(2006, 1, 2, 1, 2, 3)
            .unwrap()
            .fixed_offset();
        let (t, n) = parse_stamp_str("2006-11-12 15x24x35", &tref).unwrap();
        assert_eq!(n, 19);
        assert_eq!((t.year(), t.month(), t.day()), (2006, 11, 12));
        assert_eq!((t.hour(), t.minute(), t.second()), (1, 2, 3));
    }

    #[test]
    fn impossible_calendar_values_degrade_to_reference() {
        let tref = Utc
            .with_ymd_and_hms(2006, 1, 2, 1, 2, 3)
            .unwrap()
            .fixed_offset();
        let (t, n) = parse_stamp_str("2006-11-12 99:99:99", &tref).unwrap();
        assert_eq!(n, 19);
        assert_eq!(t, tref);
        let (t, n) = parse_stamp_str("2006-00-00", &tref).unwrap();
        assert_eq!(n, 10);
        assert_eq!(t, tref);
    }

    #[test]
    fn truncated_offset_is_left_unconsumed() {
        let tref = Utc
            .with_ymd_and_hms(2006, 1, 2, 1, 2, 3)
            .unwrap()
            .fixed_offset();
        let (t, n) = parse_stamp_str("15:24:35+0", &tref).unwrap();
        assert_eq!(n, 8);
        assert_eq!(t.offset().local_minus_utc(), 0);
    }

    #[test]
    fn out_of_range_offset_keeps_reference_zone() {
        let tref = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2006, 1, 2, 1, 2, 3)
            .unwrap();
        let (t, n) = parse_stamp_str("15:24:35+99", &tref).unwrap();
        assert_eq!(n, 11, "malformed offsets still consume their bytes");
        assert_eq!(t.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn short_input_yields_zero_time() {
        let tref = ts();
        for s in ["", "1", "12:3", "2023", "2006-11-1", "Apr 0"] {
            let (t, n) = parse_stamp_str(s, &tref).unwrap();
            assert_eq!(n, 0, "input {s:?}");
            assert_eq!(t, DateTime::UNIX_EPOCH, "input {s:?}");
        }
    }

    #[test]
    fn non_digit_in_mandatory_field_is_a_hard_error() {
        let tref = ts();
        assert_eq!(
            parse_stamp_str("20x6-11-12", &tref),
            Err(StampError::Digit('x'))
        );
        assert_eq!(
            parse_stamp_str("11-x2 15:00:00", &tref),
            Err(StampError::Digit('x'))
        );
        assert_eq!(
            parse_stamp_str("Xxx 01 13:42:18", &tref),
            Err(StampError::Month("Xxx".to_string()))
        );
    }

    #[test]
    fn parser_handles_truncated_prefixes() {
        let tref = Utc
            .with_ymd_and_hms(2006, 11, 12, 15, 24, 35)
            .unwrap()
            .with_nanosecond(987_654_000)
            .unwrap()
            .fixed_offset();
        let seeds = [
            "11-12",
            "2006-11-12",
            "11-12 Mo",
            "2006-11-12 Mo",
            "15:24:35",
            "15:24:35.123",
            "15:24:35.123456",
            "15:24:35+01",
            "15:24:35-01",
            "11-12 15:24:35",
            "2006-11-12 Mo 15:24:35.987654-07",
            "2023 Apr 01 13:42:18.432123",
            "Apr 01 13:42:18",
        ];
        for seed in seeds {
            for cut in 0..=seed.len() {
                let _ = parse_stamp_str(&seed[..cut], &tref);
            }
        }
    }

    proptest! {
        #[test]
        fn parser_never_panics(input in prop::collection::vec(any::<u8>(), 0..64)) {
            let tref = Utc
                .with_ymd_and_hms(2006, 11, 12, 15, 24, 35)
                .unwrap()
                .fixed_offset();
            if let Ok((_, consumed)) = parse_stamp(&input, &tref) {
                prop_assert!(consumed <= input.len());
            }
        }
    }
}
