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

//! PLAIN and dictionary (RLE_DICTIONARY / PLAIN_DICTIONARY) value decoding
//! per physical type, as spec.md §4.4 describes.

use crate::encodings::rle::HybridRleDecoder;
use crate::errors::{eof_err, general_err, Result};
use bytes::Bytes;

pub fn plain_decode_bool(buf: &[u8], count: usize) -> Result<Vec<bool>> {
    let needed_bytes = (count + 7) / 8;
    if buf.len() < needed_bytes {
        return Err(eof_err!(
            "PLAIN boolean stream needs {} bytes, has {}",
            needed_bytes,
            buf.len()
        ));
    }
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let byte = buf[i / 8];
        out.push((byte >> (i % 8)) & 1 == 1);
    }
    Ok(out)
}

macro_rules! plain_fixed_width_decoder {
    ($name:ident, $ty:ty, $width:expr, $from_bytes:expr) => {
        pub fn $name(buf: &[u8], count: usize) -> Result<Vec<$ty>> {
            let needed = count * $width;
            if buf.len() < needed {
                return Err(eof_err!(
                    "PLAIN stream needs {} bytes for {} values, has {}",
                    needed,
                    count,
                    buf.len()
                ));
            }
            let mut out = Vec::with_capacity(count);
            for i in 0..count {
                let chunk: [u8; $width] = buf[i * $width..(i + 1) * $width].try_into().unwrap();
                out.push($from_bytes(chunk));
            }
            Ok(out)
        }
    };
}

plain_fixed_width_decoder!(plain_decode_i32, i32, 4, i32::from_le_bytes);
plain_fixed_width_decoder!(plain_decode_i64, i64, 8, i64::from_le_bytes);
plain_fixed_width_decoder!(plain_decode_float, f32, 4, f32::from_le_bytes);
plain_fixed_width_decoder!(plain_decode_double, f64, 8, f64::from_le_bytes);

/// INT96 has no native Rust type; kept as the raw 12 bytes per the decided
/// Open Question (no timestamp semantics invented here).
pub fn plain_decode_int96(buf: &[u8], count: usize) -> Result<Vec<Bytes>> {
    let needed = count * 12;
    if buf.len() < needed {
        return Err(eof_err!(
            "PLAIN INT96 stream needs {} bytes for {} values, has {}",
            needed,
            count,
            buf.len()
        ));
    }
    Ok((0..count)
        .map(|i| Bytes::copy_from_slice(&buf[i * 12..(i + 1) * 12]))
        .collect())
}

pub fn plain_decode_fixed_len_byte_array(
    buf: &[u8],
    count: usize,
    type_length: i32,
) -> Result<Vec<Bytes>> {
    let width = type_length.max(0) as usize;
    let needed = count * width;
    if buf.len() < needed {
        return Err(eof_err!(
            "PLAIN FIXED_LEN_BYTE_ARRAY stream needs {} bytes for {} values of length {}, has {}",
            needed,
            count,
            width,
            buf.len()
        ));
    }
    Ok((0..count)
        .map(|i| Bytes::copy_from_slice(&buf[i * width..(i + 1) * width]))
        .collect())
}

/// `BYTE_ARRAY` PLAIN values are `(i32 length, bytes)` pairs. A zero-length
/// entry at the very end of the stream is legitimate and must not be
/// confused with running out of input (spec.md §4.4 edge case).
pub fn plain_decode_byte_array(buf: &[u8], count: usize) -> Result<Vec<Bytes>> {
    let mut out = Vec::with_capacity(count);
    let mut pos = 0usize;
    for _ in 0..count {
        if pos + 4 > buf.len() {
            return Err(eof_err!("BYTE_ARRAY length prefix truncated"));
        }
        let len = i32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap());
        if len < 0 {
            return Err(general_err!("BYTE_ARRAY length prefix is negative: {}", len));
        }
        let len = len as usize;
        pos += 4;
        if pos + len > buf.len() {
            return Err(eof_err!(
                "BYTE_ARRAY value of {} bytes exceeds remaining buffer",
                len
            ));
        }
        out.push(Bytes::copy_from_slice(&buf[pos..pos + len]));
        pos += len;
    }
    Ok(out)
}

/// Decodes a dictionary-index stream: a single byte giving the bit width of
/// the indices, followed by an RLE/bit-packing hybrid stream of `count`
/// indices (spec.md §4.4).
pub fn decode_dictionary_indices(buf: &[u8], count: usize) -> Result<Vec<u32>> {
    let bit_width = *buf.first().ok_or_else(|| eof_err!("dictionary index stream is empty"))? as u32;
    if bit_width > 32 {
        return Err(general_err!("dictionary index bit width {} is out of range", bit_width));
    }
    if bit_width == 0 {
        return Ok(vec![0; count]);
    }
    let mut decoder = HybridRleDecoder::new(&buf[1..], bit_width);
    decoder.decode(count)
}

/// Gathers primitive dictionary entries into the decoded-value positions by
/// index, failing with `MalformedFormat` if an index is out of range
/// (spec.md §7: "dictionary index out of range").
pub fn gather_dictionary<'a, T: Clone>(dictionary: &'a [T], indices: &[u32]) -> Result<Vec<T>> {
    indices
        .iter()
        .map(|&idx| {
            dictionary
                .get(idx as usize)
                .cloned()
                .ok_or_else(|| general_err!("dictionary index {} out of range ({})", idx, dictionary.len()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_bool_decode() {
        // bits: 1,0,1,1,0 -> byte 0b00001101 = 0x0d
        let buf = [0x0du8];
        let values = plain_decode_bool(&buf, 5).unwrap();
        assert_eq!(values, vec![true, false, true, true, false]);
    }

    #[test]
    fn plain_i64_decode() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&100i64.to_le_bytes());
        buf.extend_from_slice(&200i64.to_le_bytes());
        let values = plain_decode_i64(&buf, 2).unwrap();
        assert_eq!(values, vec![100, 200]);
    }

    #[test]
    fn byte_array_zero_length_at_end_is_not_eof() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&3i32.to_le_bytes());
        buf.extend_from_slice(b"abc");
        buf.extend_from_slice(&0i32.to_le_bytes());
        let values = plain_decode_byte_array(&buf, 2).unwrap();
        assert_eq!(values[0].as_ref(), b"abc");
        assert_eq!(values[1].as_ref(), b"" as &[u8]);
    }

    #[test]
    fn dictionary_gather_and_index_out_of_range() {
        let dict = vec![Bytes::from_static(b"A"), Bytes::from_static(b"B"), Bytes::from_static(b"C")];
        let indices = [0u32, 1, 0, 2, 1];
        let values = gather_dictionary(&dict, &indices).unwrap();
        let expected: Vec<&[u8]> = vec![b"A", b"B", b"A", b"C", b"B"];
        assert_eq!(
            values.iter().map(|b| b.as_ref()).collect::<Vec<_>>(),
            expected
        );

        assert!(gather_dictionary(&dict, &[5]).is_err());
    }

    #[test]
    fn dictionary_index_stream_decode() {
        // bit width 2, RLE run of 5 indices, value 2.
        let mut buf = vec![2u8]; // bit width byte
        buf.push(0x0a); // header: run length 5
        buf.push(0x02); // value 2
        let indices = decode_dictionary_indices(&buf, 5).unwrap();
        assert_eq!(indices, vec![2, 2, 2, 2, 2]);
    }
}
