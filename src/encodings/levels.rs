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

//! Definition/repetition level decoding (spec.md §4.3), layered directly on
//! top of the shared hybrid RLE decoder.

use crate::encodings::rle::{bit_width_for_max_level, HybridRleDecoder};
use crate::errors::{eof_err, Result};

/// Decodes a v1 page's level stream, which is prefixed by its own 4-byte
/// little-endian byte length. Returns the decoded levels and the number of
/// bytes consumed from `buf` (4 + the prefixed length).
pub fn read_levels_v1(buf: &[u8], max_level: i16, count: usize) -> Result<(Vec<i16>, usize)> {
    if max_level == 0 {
        return Ok((vec![0; count], 0));
    }
    if buf.len() < 4 {
        return Err(eof_err!("level stream missing its 4-byte length prefix"));
    }
    let byte_len = u32::from_le_bytes(buf[0..4].try_into().unwrap()) as usize;
    let body_start = 4;
    let body_end = body_start
        .checked_add(byte_len)
        .filter(|&e| e <= buf.len())
        .ok_or_else(|| eof_err!("level stream body of {} bytes exceeds buffer", byte_len))?;

    let bit_width = bit_width_for_max_level(max_level);
    let mut decoder = HybridRleDecoder::new(&buf[body_start..body_end], bit_width);
    let raw = decoder.decode(count)?;
    Ok((raw.into_iter().map(|v| v as i16).collect(), body_end))
}

/// Decodes a v2 page's level stream, whose byte length is carried in the
/// page header rather than inline, so the caller has already sliced `buf`
/// to exactly that length.
pub fn read_levels_v2(buf: &[u8], max_level: i16, count: usize) -> Result<Vec<i16>> {
    if max_level == 0 {
        return Ok(vec![0; count]);
    }
    let bit_width = bit_width_for_max_level(max_level);
    let mut decoder = HybridRleDecoder::new(buf, bit_width);
    let raw = decoder.decode(count)?;
    Ok(raw.into_iter().map(|v| v as i16).collect())
}

/// Counts slots at full definition (i.e. non-null leaf values), per spec.md
/// §4.5 step 5: "count non-null slots (slots where `def == max_def`)".
pub fn count_non_null(def_levels: &[i16], max_def_level: i16) -> usize {
    def_levels.iter().filter(|&&d| d == max_def_level).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_when_max_level_zero() {
        let (levels, consumed) = read_levels_v1(&[], 0, 5).unwrap();
        assert_eq!(levels, vec![0, 0, 0, 0, 0]);
        assert_eq!(consumed, 0);
    }

    #[test]
    fn v1_roundtrip_all_present() {
        // max_level = 1 -> bit_width 1. RLE run of 5, value 1.
        let mut body = vec![0x0a, 0x01];
        let mut buf = (body.len() as u32).to_le_bytes().to_vec();
        buf.append(&mut body);
        let (levels, consumed) = read_levels_v1(&buf, 1, 5).unwrap();
        assert_eq!(levels, vec![1, 1, 1, 1, 1]);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn non_null_count() {
        let defs = [0i16, 1, 1, 0, 1];
        assert_eq!(count_non_null(&defs, 1), 3);
    }
}
