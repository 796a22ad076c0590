// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Logical-type conversion: pure functions from a raw physical value plus a
//! `LogicalType`/`ConvertedType` descriptor to a semantic value.
//!
//! spec.md §1 treats this conversion as an external collaborator the core
//! decode path never calls on its own; this module is that collaborator,
//! kept separate so `record`/`column` stay logical-type-agnostic. `RowReader`
//! typed getters (spec.md §6) call into it explicitly.

use crate::basic::TimeUnit;
use crate::errors::{general_err, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use num_bigint::BigInt;
use std::fmt;

/// `STRING`/`ENUM`/`JSON` are all UTF-8 under the hood; `BSON` is opaque
/// binary and has no string form, so callers shouldn't reach this for it.
pub fn decode_string(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| general_err!("invalid UTF-8 in STRING/ENUM/JSON value: {}", e))
}

/// Days since the Unix epoch, per `DATE`'s definition.
pub fn decode_date(days: i32) -> NaiveDate {
    unix_epoch() + Duration::days(days as i64)
}

pub fn decode_time_millis(millis: i32) -> NaiveTime {
    midnight() + Duration::milliseconds(millis as i64)
}

pub fn decode_time_micros(micros: i64) -> NaiveTime {
    midnight() + Duration::microseconds(micros)
}

/// `TIMESTAMP`'s `is_adjusted_to_u_t_c` flag changes only how a consumer
/// should interpret the result (as UTC wall-clock vs. some unspecified local
/// time); the stored integer is always elapsed units since the epoch
/// regardless, so decoding it doesn't need the flag.
pub fn decode_timestamp(value: i64, unit: TimeUnit) -> NaiveDateTime {
    let epoch = unix_epoch().and_hms_opt(0, 0, 0).unwrap();
    match unit {
        TimeUnit::Millis => epoch + Duration::milliseconds(value),
        TimeUnit::Micros => epoch + Duration::microseconds(value),
        TimeUnit::Nanos => epoch + Duration::nanoseconds(value),
    }
}

fn unix_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}

fn midnight() -> NaiveTime {
    NaiveTime::from_hms_opt(0, 0, 0).unwrap()
}

/// A fixed-point decimal: `unscaled * 10^-scale`. Kept as the raw
/// `BigInt`/`scale` pair rather than converted to a float, since Parquet
/// decimals are exact and a float would silently lose that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    pub unscaled: BigInt,
    pub scale: i32,
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale <= 0 {
            return write!(f, "{}", self.unscaled);
        }
        let digits = self.unscaled.to_string();
        let (sign, digits) = match digits.strip_prefix('-') {
            Some(rest) => ("-", rest.to_string()),
            None => ("", digits),
        };
        let scale = self.scale as usize;
        if digits.len() <= scale {
            let padded = format!("{:0>width$}", digits, width = scale + 1);
            let (int_part, frac_part) = padded.split_at(padded.len() - scale);
            write!(f, "{sign}{int_part}.{frac_part}")
        } else {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{sign}{int_part}.{frac_part}")
        }
    }
}

/// `DECIMAL` backed by `INT32`/`INT64`: the physical value directly is the
/// unscaled integer.
pub fn decode_decimal_from_i64(value: i64, scale: i32) -> Decimal {
    Decimal {
        unscaled: BigInt::from(value),
        scale,
    }
}

/// `DECIMAL` backed by `BYTE_ARRAY`/`FIXED_LEN_BYTE_ARRAY`: a two's-complement
/// big-endian integer.
pub fn decode_decimal_from_bytes(bytes: &[u8], scale: i32) -> Decimal {
    Decimal {
        unscaled: BigInt::from_signed_bytes_be(bytes),
        scale,
    }
}

/// `UUID` is stored as 16 raw bytes; renders the canonical
/// `8-4-4-4-12` hyphenated form.
pub fn decode_uuid(bytes: &[u8; 16]) -> String {
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        bytes[6], bytes[7],
        bytes[8], bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_decodes_from_epoch_day_count() {
        let d = decode_date(0);
        assert_eq!(d.to_string(), "1970-01-01");
        let d = decode_date(19723); // 2023-12-25
        assert_eq!(d.to_string(), "2023-12-25");
    }

    #[test]
    fn timestamp_millis_round_trips_a_known_instant() {
        let ts = decode_timestamp(1_700_000_000_000, TimeUnit::Millis);
        assert_eq!(ts.format("%Y-%m-%d").to_string(), "2023-11-14");
    }

    #[test]
    fn decimal_from_i64_formats_with_scale() {
        let d = decode_decimal_from_i64(12345, 2);
        assert_eq!(d.to_string(), "123.45");
        let d = decode_decimal_from_i64(-5, 2);
        assert_eq!(d.to_string(), "-0.05");
    }

    #[test]
    fn decimal_from_bytes_matches_signed_big_endian() {
        let d = decode_decimal_from_bytes(&[0x00, 0x00, 0x30, 0x39], 2); // 12345
        assert_eq!(d.to_string(), "123.45");
    }

    #[test]
    fn uuid_renders_hyphenated() {
        let bytes: [u8; 16] = [
            0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0, 0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0,
        ];
        assert_eq!(decode_uuid(&bytes), "12345678-9abc-def0-1234-56789abcdef0");
    }

    #[test]
    fn string_rejects_invalid_utf8() {
        assert!(decode_string(&[0xff, 0xfe]).is_err());
    }
}
