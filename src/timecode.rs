//! Broadcast time decoding.
//!
//! Reference: ETSI EN 300 468, Annex C (MJD conversion) and the BCD encoded
//! UTC_time / duration fields.
use std::fmt::Display;

use chrono::{DateTime, Datelike, Duration, Local, TimeZone, Timelike, Utc};
use serde::Serialize;

/// Modified Julian Date of 1970-01-01.
pub const MJD_UNIX_EPOCH: u64 = 40587;

const SECS_PER_DAY: i64 = 86_400;

/// All-ones start time, which means "undefined" (e.g., NVOD reference events).
const UNDEFINED: u64 = 0xff_ffff_ffff;

fn bcd(b: u8) -> u32 {
    u32::from(b >> 4) * 10 + u32::from(b & 0xf)
}

/// Decode a 24-bit BCD `hhmmss` value into seconds since midnight.
///
/// Bits above the low 24 are ignored.
#[must_use]
pub fn decode_time_of_day(value: u32) -> u32 {
    let hour = bcd(((value >> 16) & 0xff) as u8);
    let minute = bcd(((value >> 8) & 0xff) as u8);
    let second = bcd((value & 0xff) as u8);
    ((hour * 60) + minute) * 60 + second
}

/// Decode a 24-bit BCD event duration.
#[must_use]
pub fn decode_duration(value: u32) -> Duration {
    Duration::seconds(i64::from(decode_time_of_day(value)))
}

/// Decode a 40-bit MJD + BCD time value. The top 16 bits of the 40 are the MJD.
#[must_use]
pub fn decode_date(value: u64) -> BroadcastTime {
    let value = value & UNDEFINED;
    if value == UNDEFINED {
        return BroadcastTime::Unknown;
    }
    let mjd = value >> 24;
    if mjd < MJD_UNIX_EPOCH {
        return BroadcastTime::Unknown;
    }
    // mjd is at most 16 bits so this cannot overflow
    let days = (mjd - MJD_UNIX_EPOCH) as i64;
    let secs = days * SECS_PER_DAY + i64::from(decode_time_of_day((value & 0xff_ffff) as u32));
    BroadcastTime::At(secs)
}

/// Decode a 5 byte MJD + BCD time field.
///
/// Callers must provide at least 5 bytes.
#[must_use]
pub fn decode_date_bytes(dat: &[u8]) -> BroadcastTime {
    decode_date(u64::from_be_bytes([
        0, 0, 0, dat[0], dat[1], dat[2], dat[3], dat[4],
    ]))
}

/// Calendar fields of a [BroadcastTime].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Calendar {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl<Tz: TimeZone> From<&DateTime<Tz>> for Calendar {
    fn from(dt: &DateTime<Tz>) -> Self {
        Calendar {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }
}

/// A decoded broadcast timestamp.
///
/// The canonical value is seconds relative to 1970-01-01T00:00:00Z. Dates before
/// that are never represented as negative or wrapped values, they are `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastTime {
    Unknown,
    At(i64),
}

impl BroadcastTime {
    #[must_use]
    pub fn epoch_seconds(&self) -> Option<i64> {
        match self {
            Self::Unknown => None,
            Self::At(secs) => Some(*secs),
        }
    }

    #[must_use]
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        self.epoch_seconds()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }

    #[must_use]
    pub fn to_local(&self) -> Option<DateTime<Local>> {
        self.to_utc().map(|dt| dt.with_timezone(&Local))
    }

    /// Calendar fields in the local timezone, for display.
    #[must_use]
    pub fn calendar(&self) -> Option<Calendar> {
        self.to_local().as_ref().map(Calendar::from)
    }
}

impl Display for BroadcastTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.calendar() {
            Some(c) => write!(
                f,
                "{:02}/{:02}/{:04} {:02}:{:02}:{:02}",
                c.day, c.month, c.year, c.hour, c.minute, c.second
            ),
            None => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0x00_00_00, 0; "midnight")]
    #[test_case(0x12_30_00, 45_000; "half past noon")]
    #[test_case(0x23_59_59, 86_399; "last second")]
    #[test_case(0x00_01_30, 90; "ninety seconds")]
    #[test_case(0xff_12_30_00, 45_000; "bits above 24 ignored")]
    fn time_of_day(value: u32, expected: u32) {
        assert_eq!(decode_time_of_day(value), expected);
    }

    #[test]
    fn day_before_epoch_is_unknown() {
        assert_eq!(decode_date(40586 << 24), BroadcastTime::Unknown);
        assert_eq!(decode_date(0), BroadcastTime::Unknown);
    }

    #[test]
    fn epoch() {
        let tc = decode_date(MJD_UNIX_EPOCH << 24);
        assert_eq!(tc, BroadcastTime::At(0));
        assert_eq!(tc.to_utc().unwrap().timestamp(), 0);
    }

    #[test]
    fn en300468_annex_c_example() {
        // 93/10/13 12:45:00 is coded as 0xC079124500
        let tc = decode_date(0xc0_79_12_45_00);
        let dt = tc.to_utc().unwrap();
        assert_eq!(Calendar::from(&dt), Calendar {
            year: 1993,
            month: 10,
            day: 13,
            hour: 12,
            minute: 45,
            second: 0,
        });
    }

    #[test]
    fn date_from_bytes() {
        let tc = decode_date_bytes(&[0xc0, 0x79, 0x12, 0x45, 0x00]);
        assert_eq!(tc, decode_date(0xc0_79_12_45_00));
    }

    #[test]
    fn all_ones_is_unknown() {
        assert_eq!(decode_date(0xff_ffff_ffff), BroadcastTime::Unknown);
        assert_eq!(BroadcastTime::Unknown.to_string(), "unknown");
    }

    #[test]
    fn duration() {
        assert_eq!(decode_duration(0x01_45_30), Duration::seconds(6330));
    }
}
