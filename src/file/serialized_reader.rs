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

//! The on-disk `FileReader`/`RowGroupReader`/`PageReader` trio: parses the
//! footer once, then streams pages out of a single column chunk's byte
//! range on demand (spec.md §4.5).

use crate::basic::{Compression, PageType};
use crate::column::page::{Page, PageReader};
use crate::compression::create_codec;
use crate::errors::{general_err, Result};
use crate::file::footer::parse_metadata;
use crate::file::metadata::ParquetMetaData;
use crate::file::reader::{page_context, ChunkReader, FileReader, RowGroupReader};
use crate::thrift::CompactInputProtocol;
use bytes::Bytes;

/// A `FileReader` over a single memory-mapped (or in-memory) Parquet file.
pub struct SerializedFileReader<R> {
    chunk_reader: R,
    metadata: ParquetMetaData,
    file_path: Option<String>,
}

impl<R: ChunkReader> SerializedFileReader<R> {
    pub fn new(chunk_reader: R) -> Result<Self> {
        let metadata = parse_metadata(&chunk_reader)?;
        Ok(SerializedFileReader {
            chunk_reader,
            metadata,
            file_path: None,
        })
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }
}

impl<R: ChunkReader> FileReader for SerializedFileReader<R> {
    fn metadata(&self) -> &ParquetMetaData {
        &self.metadata
    }

    fn num_row_groups(&self) -> usize {
        self.metadata.num_row_groups()
    }

    fn get_row_group(&self, i: usize) -> Result<Box<dyn RowGroupReader + '_>> {
        if i >= self.metadata.num_row_groups() {
            return Err(general_err!(
                "row group index {} out of range (file has {})",
                i,
                self.metadata.num_row_groups()
            ));
        }
        Ok(Box::new(SerializedRowGroupReader {
            file_reader: self,
            row_group_index: i,
        }))
    }
}

pub struct SerializedRowGroupReader<'a, R> {
    file_reader: &'a SerializedFileReader<R>,
    row_group_index: usize,
}

impl<'a, R: ChunkReader> RowGroupReader for SerializedRowGroupReader<'a, R> {
    fn metadata(&self) -> &crate::file::metadata::RowGroupMetaData {
        self.file_reader.metadata.row_group(self.row_group_index)
    }

    fn num_columns(&self) -> usize {
        self.metadata().num_columns()
    }

    fn get_column_page_reader(&self, i: usize) -> Result<Box<dyn PageReader>> {
        let col = self.metadata().column(i);
        let (start, len) = col.byte_range();
        let ctx = || {
            page_context(
                self.file_reader.file_path.as_deref(),
                self.row_group_index,
                col.column_descr().path.to_string().as_str(),
            )
        };
        let bytes = self
            .file_reader
            .chunk_reader
            .get_bytes(start, len as usize)
            .map_err(|e| e.with_context(ctx()))?;

        Ok(Box::new(SerializedPageReader::new(
            bytes,
            col.num_values() as u64,
            col.compression(),
        )))
    }
}

/// Reads pages sequentially out of one column chunk's already-fetched byte
/// range, decompressing each page's body as it goes (spec.md §4.5).
pub struct SerializedPageReader {
    buf: Bytes,
    cursor: usize,
    compression: Compression,
    /// Declared value count for the whole chunk (dictionary page excluded).
    total_num_values: u64,
    seen_num_values: u64,
}

impl SerializedPageReader {
    fn new(buf: Bytes, total_num_values: u64, compression: Compression) -> Self {
        SerializedPageReader {
            buf,
            cursor: 0,
            compression,
            total_num_values,
            seen_num_values: 0,
        }
    }

    fn decompress(&self, input: &[u8], uncompressed_size: usize) -> Result<Bytes> {
        match create_codec(self.compression)? {
            None => Ok(Bytes::copy_from_slice(input)),
            Some(mut codec) => {
                let mut out = Vec::with_capacity(uncompressed_size);
                codec.decompress(input, &mut out)?;
                Ok(Bytes::from(out))
            }
        }
    }
}

impl PageReader for SerializedPageReader {
    fn get_next_page(&mut self) -> Result<Option<Page>> {
        if self.seen_num_values >= self.total_num_values || self.cursor >= self.buf.len() {
            return Ok(None);
        }

        let mut protocol = CompactInputProtocol::new(&self.buf[self.cursor..]);
        let header = crate::format::read_page_header(&mut protocol)?;
        self.cursor += protocol.position();

        let body_start = self.cursor;
        let body_end = body_start + header.compressed_page_size as usize;
        if body_end > self.buf.len() {
            return Err(general_err!(
                "page body of {} bytes exceeds remaining chunk bytes ({})",
                header.compressed_page_size,
                self.buf.len() - body_start
            ));
        }
        let body = &self.buf[body_start..body_end];
        self.cursor = body_end;

        let page_type = PageType::try_from(header.type_)?;
        let page = match page_type {
            PageType::DICTIONARY_PAGE => {
                let dict_header = header.dictionary_page_header.ok_or_else(|| {
                    general_err!("DICTIONARY_PAGE header missing its dictionary_page_header")
                })?;
                let decompressed =
                    self.decompress(body, header.uncompressed_page_size as usize)?;
                // Dictionary pages don't count toward the chunk's num_values.
                Page::Dictionary {
                    buf: decompressed,
                    num_values: dict_header.num_values as u32,
                }
            }
            PageType::DATA_PAGE => {
                let data_header = header.data_page_header.ok_or_else(|| {
                    general_err!("DATA_PAGE header missing its data_page_header")
                })?;
                let decompressed =
                    self.decompress(body, header.uncompressed_page_size as usize)?;
                self.seen_num_values += data_header.num_values as u64;
                Page::DataV1 {
                    buf: decompressed,
                    num_values: data_header.num_values as u32,
                    encoding: data_header.encoding.into(),
                }
            }
            PageType::DATA_PAGE_V2 => {
                let h = header.data_page_header_v2.ok_or_else(|| {
                    general_err!("DATA_PAGE_V2 header missing its data_page_header_v2")
                })?;
                let rep_len = h.repetition_levels_byte_length as usize;
                let def_len = h.definition_levels_byte_length as usize;
                if rep_len + def_len > body.len() {
                    return Err(general_err!(
                        "DATA_PAGE_V2 level lengths ({} + {}) exceed page body ({})",
                        rep_len,
                        def_len,
                        body.len()
                    ));
                }
                let rep_levels = Bytes::copy_from_slice(&body[0..rep_len]);
                let def_levels = Bytes::copy_from_slice(&body[rep_len..rep_len + def_len]);
                let value_bytes = &body[rep_len + def_len..];
                // Per the format, v2 pages are compressed only when
                // `is_compressed` is absent or true; the level streams never are.
                let is_compressed = h.is_compressed.unwrap_or(true);
                let values = if is_compressed {
                    self.decompress(
                        value_bytes,
                        header.uncompressed_page_size as usize - rep_len - def_len,
                    )?
                } else {
                    Bytes::copy_from_slice(value_bytes)
                };
                self.seen_num_values += h.num_values as u64;
                Page::DataV2 {
                    rep_levels,
                    def_levels,
                    values,
                    num_values: h.num_values as u32,
                    num_nulls: h.num_nulls as u32,
                    num_rows: h.num_rows as u32,
                    encoding: h.encoding.into(),
                }
            }
            PageType::INDEX_PAGE => {
                return Err(crate::errors::unsupported_err!(
                    "index pages are not read by this reader"
                ));
            }
        };

        Ok(Some(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::reader::ChunkSource;
    use crate::test_util::{write_data_page_v1_header, write_thrift_file_metadata};

    fn build_minimal_file() -> Bytes {
        let footer = write_thrift_file_metadata();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"PAR1");
        bytes.extend_from_slice(&footer);
        bytes.extend_from_slice(&(footer.len() as u32).to_le_bytes());
        bytes.extend_from_slice(b"PAR1");
        Bytes::from(bytes)
    }

    #[test]
    fn opens_file_reader_and_lists_row_groups() {
        let source = ChunkSource::from_bytes(build_minimal_file());
        let reader = SerializedFileReader::new(source).unwrap();
        assert_eq!(reader.num_row_groups(), 1);
        let rg = reader.get_row_group(0).unwrap();
        assert_eq!(rg.num_columns(), 2);
    }

    #[test]
    fn page_reader_decodes_a_single_plain_data_page() {
        let mut values = Vec::new();
        values.extend_from_slice(&1i64.to_le_bytes());
        values.extend_from_slice(&2i64.to_le_bytes());
        values.extend_from_slice(&3i64.to_le_bytes());
        let header = write_data_page_v1_header(3, values.len() as i32, values.len() as i32, 0);
        let mut chunk = header;
        chunk.extend_from_slice(&values);

        let mut reader = SerializedPageReader::new(Bytes::from(chunk), 3, Compression::UNCOMPRESSED);
        let page = reader.get_next_page().unwrap().expect("one page");
        match page {
            Page::DataV1 { buf, num_values, .. } => {
                assert_eq!(num_values, 3);
                assert_eq!(buf.len(), 24);
            }
            other => panic!("expected DataV1, got {:?}", other),
        }
        assert!(reader.get_next_page().unwrap().is_none());
    }
}
