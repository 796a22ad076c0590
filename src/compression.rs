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

//! A uniform `decompress` interface over the codec back-ends, which spec.md
//! §1 treats as external collaborators: each one is a black box
//! `decompress(bytes, uncompressed_size) -> bytes`.

use crate::basic::Compression;
use crate::errors::{unsupported_err, Result};

/// A single column chunk's decompressor. Stateless beyond the feature-gated
/// codec handle itself (e.g. zstd keeps no dictionary state here).
pub trait Codec: Send {
    /// Appends the decompressed contents of `input` to `output`, which is
    /// expected to already be sized/reserved for `input`'s companion
    /// uncompressed-size field.
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize>;
}

#[cfg(feature = "snap")]
struct SnappyCodec;

#[cfg(feature = "snap")]
impl Codec for SnappyCodec {
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        let len = snap::raw::decompress_len(input)
            .map_err(|e| crate::errors::general_err!("invalid snappy frame: {}", e))?;
        let offset = output.len();
        output.resize(offset + len, 0);
        let mut decoder = snap::raw::Decoder::new();
        decoder
            .decompress(input, &mut output[offset..])
            .map_err(|e| crate::errors::general_err!("snappy decompression failed: {}", e))?;
        Ok(len)
    }
}

#[cfg(feature = "flate2")]
struct GzipCodec;

#[cfg(feature = "flate2")]
impl Codec for GzipCodec {
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        use std::io::Read;
        let mut decoder = flate2::read::GzDecoder::new(input);
        let before = output.len();
        decoder.read_to_end(output)?;
        Ok(output.len() - before)
    }
}

#[cfg(feature = "brotli")]
struct BrotliCodec;

#[cfg(feature = "brotli")]
impl Codec for BrotliCodec {
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        use std::io::Read;
        let mut decoder = brotli::Decompressor::new(input, 4096);
        let before = output.len();
        decoder.read_to_end(output)?;
        Ok(output.len() - before)
    }
}

#[cfg(feature = "lz4")]
struct Lz4Codec;

#[cfg(feature = "lz4")]
impl Codec for Lz4Codec {
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        use std::io::Read;
        let mut decoder = lz4::Decoder::new(input)?;
        let before = output.len();
        decoder.read_to_end(output)?;
        Ok(output.len() - before)
    }
}

#[cfg(feature = "zstd")]
struct ZstdCodec;

#[cfg(feature = "zstd")]
impl Codec for ZstdCodec {
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        use std::io::Read;
        let mut decoder = zstd::stream::Decoder::new(input)?;
        let before = output.len();
        decoder.read_to_end(output)?;
        Ok(output.len() - before)
    }
}

/// Returns the decompressor for `codec`, or `None` for `UNCOMPRESSED` (the
/// page reader skips the decompress step entirely in that case).
pub fn create_codec(codec: Compression) -> Result<Option<Box<dyn Codec>>> {
    Ok(match codec {
        Compression::UNCOMPRESSED => None,
        #[cfg(feature = "snap")]
        Compression::SNAPPY => Some(Box::new(SnappyCodec)),
        #[cfg(feature = "flate2")]
        Compression::GZIP => Some(Box::new(GzipCodec)),
        #[cfg(feature = "brotli")]
        Compression::BROTLI => Some(Box::new(BrotliCodec)),
        #[cfg(feature = "lz4")]
        Compression::LZ4 | Compression::LZ4_RAW => Some(Box::new(Lz4Codec)),
        #[cfg(feature = "zstd")]
        Compression::ZSTD => Some(Box::new(ZstdCodec)),
        other => return Err(unsupported_err!("unsupported compression codec {:?}", other)),
    })
}
