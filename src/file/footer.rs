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

//! Footer parsing: magic validation, footer-length read, and Thrift
//! decoding of `FileMetaData`, per spec.md §6's file format description.

use crate::errors::{general_err, Result};
use crate::file::metadata::{build_parquet_metadata, ParquetMetaData};
use crate::file::reader::{ChunkReader, Length};
use crate::format;
use crate::thrift::CompactInputProtocol;

pub const PARQUET_MAGIC: &[u8; 4] = b"PAR1";
/// Trailing magic (4 bytes) + footer length (4 bytes).
const FOOTER_SUFFIX_LEN: u64 = 8;

pub fn parse_metadata<R: ChunkReader>(reader: &R) -> Result<ParquetMetaData> {
    let file_size = reader.len();
    if file_size < (PARQUET_MAGIC.len() as u64) + FOOTER_SUFFIX_LEN {
        return Err(general_err!(
            "file of {} bytes is too small to be a Parquet file",
            file_size
        ));
    }

    let mut header_magic = [0u8; 4];
    {
        use std::io::Read;
        reader.get_read(0, 4)?.read_exact(&mut header_magic)?;
    }
    if &header_magic != PARQUET_MAGIC {
        return Err(general_err!(
            "invalid leading magic bytes {:?}, expected PAR1",
            header_magic
        ));
    }

    let mut trailer = [0u8; FOOTER_SUFFIX_LEN as usize];
    {
        use std::io::Read;
        reader
            .get_read(file_size - FOOTER_SUFFIX_LEN, FOOTER_SUFFIX_LEN as usize)?
            .read_exact(&mut trailer)?;
    }
    let footer_len = u32::from_le_bytes(trailer[0..4].try_into().unwrap()) as u64;
    let trailing_magic = &trailer[4..8];
    if trailing_magic != PARQUET_MAGIC {
        return Err(general_err!(
            "invalid trailing magic bytes {:?}, expected PAR1",
            trailing_magic
        ));
    }

    let footer_start = file_size
        .checked_sub(FOOTER_SUFFIX_LEN)
        .and_then(|v| v.checked_sub(footer_len))
        .ok_or_else(|| {
            general_err!(
                "footer length {} is larger than the file ({} bytes)",
                footer_len,
                file_size
            )
        })?;
    if footer_start < PARQUET_MAGIC.len() as u64 {
        return Err(general_err!(
            "footer length {} would overlap the leading magic bytes",
            footer_len
        ));
    }

    let footer_bytes = reader.get_bytes(footer_start, footer_len as usize)?;
    let mut protocol = CompactInputProtocol::new(footer_bytes.as_ref());
    let raw = format::read_file_metadata(&mut protocol)
        .map_err(|e| general_err!("failed to decode file metadata: {}", e))?;

    let metadata = build_parquet_metadata(raw)?;
    log::debug!(
        "parsed footer: {} row group(s), {} column(s), {} byte footer",
        metadata.num_row_groups(),
        metadata.file_metadata().schema_descr().num_columns(),
        footer_len
    );
    Ok(metadata)
}
