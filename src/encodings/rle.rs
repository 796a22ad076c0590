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

//! The RLE / bit-packing hybrid shared by both the definition/repetition
//! level streams (spec.md §4.3) and dictionary index streams (spec.md
//! §4.4). One decoder, two callers with different bit widths and
//! different "requested count" semantics.

use crate::errors::{eof_err, general_err, Result};

/// Decodes a hybrid RLE/bit-packed stream of `u32`s, `bit_width` bits wide,
/// stopping once `count` values have been produced.
pub struct HybridRleDecoder<'a> {
    buf: &'a [u8],
    pos: usize,
    bit_width: u32,
}

impl<'a> HybridRleDecoder<'a> {
    pub fn new(buf: &'a [u8], bit_width: u32) -> Self {
        HybridRleDecoder { buf, pos: 0, bit_width }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn read_byte(&mut self) -> Result<u8> {
        let b = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| eof_err!("hybrid RLE stream exhausted mid-header"))?;
        self.pos += 1;
        Ok(b)
    }

    fn read_unsigned_varint(&mut self) -> Result<u64> {
        let mut result = 0u64;
        let mut shift = 0;
        loop {
            let byte = self.read_byte()?;
            result |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        Ok(result)
    }

    /// Number of whole bytes needed to hold one value of `bit_width` bits.
    fn value_byte_width(&self) -> usize {
        ((self.bit_width as usize) + 7) / 8
    }

    fn read_rle_value(&mut self) -> Result<u32> {
        let width = self.value_byte_width();
        if self.pos + width > self.buf.len() {
            return Err(eof_err!("hybrid RLE run value truncated"));
        }
        let mut value = 0u32;
        for i in 0..width {
            value |= (self.buf[self.pos + i] as u32) << (8 * i);
        }
        self.pos += width;
        Ok(value)
    }

    /// Unpacks one group of 8 bit-packed values, `bit_width` bits each,
    /// tightly packed LSB-first: `bit_width` bytes hold exactly 8 values.
    fn read_bit_packed_group(&mut self, out: &mut Vec<u32>, remaining: usize) -> Result<usize> {
        let group_bytes = self.bit_width as usize;
        if self.pos + group_bytes > self.buf.len() {
            return Err(eof_err!("bit-packed group truncated"));
        }
        let bytes = &self.buf[self.pos..self.pos + group_bytes];
        self.pos += group_bytes;

        let mut bit_pos = 0usize;
        let mut produced = 0usize;
        for _ in 0..8 {
            if produced >= remaining {
                break;
            }
            let mut value = 0u32;
            for b in 0..self.bit_width as usize {
                let abs_bit = bit_pos + b;
                let byte = bytes[abs_bit / 8];
                let bit = (byte >> (abs_bit % 8)) & 1;
                value |= (bit as u32) << b;
            }
            out.push(value);
            bit_pos += self.bit_width as usize;
            produced += 1;
        }
        Ok(produced)
    }

    /// Decodes exactly `count` values, per spec.md §4.3's algorithm: repeat
    /// reading varint headers (even = RLE run, odd = bit-packed group of
    /// `8 * (h >> 1)` values) until `count` is satisfied.
    pub fn decode(&mut self, count: usize) -> Result<Vec<u32>> {
        let mut out = Vec::with_capacity(count);
        while out.len() < count {
            if self.pos >= self.buf.len() {
                return Err(eof_err!(
                    "hybrid RLE stream exhausted after producing {} of {} requested values",
                    out.len(),
                    count
                ));
            }
            let header = self.read_unsigned_varint()?;
            if header & 1 == 0 {
                let run_length = (header >> 1) as usize;
                let value = self.read_rle_value()?;
                let take = run_length.min(count - out.len());
                out.resize(out.len() + take, value);
                // A run may legitimately be longer than what's requested
                // (e.g. spanning into the next batch); only the header and
                // value were consumed either way, matching spec.md's "stop
                // when the requested count is satisfied".
                if run_length > take {
                    break;
                }
            } else {
                let num_groups = (header >> 1) as usize;
                for _ in 0..num_groups {
                    if out.len() >= count {
                        break;
                    }
                    let remaining = count - out.len();
                    let produced = self.read_bit_packed_group(&mut out, remaining)?;
                    if produced == 0 {
                        break;
                    }
                }
            }
        }
        if out.len() != count {
            return Err(general_err!(
                "hybrid RLE decode produced {} values, expected {}",
                out.len(),
                count
            ));
        }
        Ok(out)
    }
}

/// Bit width needed to represent levels `0..=max_level`, i.e.
/// `ceil(log2(max_level + 1))`.
pub fn bit_width_for_max_level(max_level: i16) -> u32 {
    if max_level == 0 {
        0
    } else {
        32 - (max_level as u32).leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_width_computation() {
        assert_eq!(bit_width_for_max_level(0), 0);
        assert_eq!(bit_width_for_max_level(1), 1);
        assert_eq!(bit_width_for_max_level(2), 2);
        assert_eq!(bit_width_for_max_level(3), 2);
        assert_eq!(bit_width_for_max_level(4), 3);
    }

    #[test]
    fn rle_run_decode() {
        // bit_width=2 (values 0..3), RLE run of length 5, value=3.
        // header = (5 << 1) | 0 = 10 -> varint byte 0x0a
        // value byte width = ceil(2/8) = 1, value = 3
        let bytes = [0x0a, 0x03];
        let mut dec = HybridRleDecoder::new(&bytes, 2);
        let values = dec.decode(5).unwrap();
        assert_eq!(values, vec![3, 3, 3, 3, 3]);
    }

    #[test]
    fn bit_packed_group_decode() {
        // bit_width=3, one group of 8 values: [0,1,2,3,4,5,6,7]
        // header = (1 << 1) | 1 = 3
        // packed LSB-first, 3 bits each, 8 values = 24 bits = 3 bytes.
        // value i occupies bits [3i, 3i+3).
        let mut packed: u32 = 0;
        for (i, v) in (0u32..8).enumerate() {
            packed |= v << (3 * i);
        }
        let bytes = [3u8, packed as u8, (packed >> 8) as u8, (packed >> 16) as u8];
        let mut dec = HybridRleDecoder::new(&bytes, 3);
        let values = dec.decode(8).unwrap();
        assert_eq!(values, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn mixed_run_then_group() {
        let mut bytes = vec![0x0a, 0x01]; // RLE run of 5, value=1 (width 2 -> 1 byte)
        let mut packed: u32 = 0;
        for (i, v) in [0u32, 1, 0, 1, 0, 1, 0, 1].iter().enumerate() {
            packed |= v << (2 * i);
        }
        bytes.push(3); // bit-packed header: 1 group
        bytes.push(packed as u8);
        bytes.push((packed >> 8) as u8);
        let mut dec = HybridRleDecoder::new(&bytes, 2);
        let values = dec.decode(13).unwrap();
        assert_eq!(values.len(), 13);
        assert_eq!(&values[0..5], &[1, 1, 1, 1, 1]);
        assert_eq!(&values[5..13], &[0, 1, 0, 1, 0, 1, 0, 1]);
    }
}
