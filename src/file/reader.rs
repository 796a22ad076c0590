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

//! Core reader traits (`ChunkReader`, `FileReader`, `RowGroupReader`) plus
//! the byte-range front door: the file-opener that memory-maps a path or
//! wraps an in-memory buffer and hands out byte ranges. This layer is the
//! "external collaborator" spec.md §1 treats as out of the core's concern,
//! reduced here to the minimum needed to actually run the core against a
//! real file.

use crate::column::page::PageReader;
use crate::errors::{ErrorContext, ParquetError, Result};
use crate::file::metadata::{ParquetMetaData, RowGroupMetaData};
use bytes::Bytes;
use memmap2::Mmap;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// Anything that knows its own byte length.
pub trait Length {
    fn len(&self) -> u64;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A source of byte ranges: the abstraction column chunks and the footer
/// are read through, independent of whether the backing bytes come from a
/// memory-mapped file or an in-memory buffer.
pub trait ChunkReader: Length + Send + Sync {
    type T: std::io::Read;

    fn get_read(&self, start: u64, length: usize) -> Result<Self::T>;

    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        use std::io::Read;
        let mut buf = Vec::with_capacity(length);
        self.get_read(start, length)?.read_to_end(&mut buf)?;
        Ok(Bytes::from(buf))
    }
}

/// The byte source backing a `FileReader`: either a memory-mapped file or
/// an in-memory buffer. Reads always copy the requested range out into an
/// owned `Bytes`, per the design note that languages without scoped
/// references should copy `BYTE_ARRAY` payloads at decode time — here we
/// copy one step earlier, at the byte-range level, to keep the page
/// pipeline free of lifetime parameters.
pub enum ChunkSource {
    Mapped(Arc<Mmap>),
    Memory(Bytes),
}

impl ChunkSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(ParquetError::IoError)?;
        // Safety: mutation of the underlying file while mapped is undefined
        // behavior in general; this reader only ever reads through the map
        // and never writes to the path itself.
        let mmap = unsafe { Mmap::map(&file) }.map_err(ParquetError::IoError)?;
        Ok(ChunkSource::Mapped(Arc::new(mmap)))
    }

    pub fn from_bytes(bytes: Bytes) -> Self {
        ChunkSource::Memory(bytes)
    }

    fn as_slice(&self) -> &[u8] {
        match self {
            ChunkSource::Mapped(m) => m.as_ref(),
            ChunkSource::Memory(b) => b.as_ref(),
        }
    }
}

impl Length for ChunkSource {
    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }
}

impl ChunkReader for ChunkSource {
    type T = Cursor<Bytes>;

    fn get_read(&self, start: u64, length: usize) -> Result<Self::T> {
        let slice = self.as_slice();
        let start = start as usize;
        let end = start
            .checked_add(length)
            .filter(|&e| e <= slice.len())
            .ok_or_else(|| {
                crate::errors::general_err!(
                    "byte range [{}, {}) is out of bounds for a {}-byte source",
                    start,
                    start + length,
                    slice.len()
                )
            })?;
        Ok(Cursor::new(Bytes::copy_from_slice(&slice[start..end])))
    }
}

/// Object-safe handle onto a single Parquet file's metadata and row groups.
pub trait FileReader: Send + Sync {
    fn metadata(&self) -> &ParquetMetaData;

    fn num_row_groups(&self) -> usize;

    fn get_row_group(&self, i: usize) -> Result<Box<dyn RowGroupReader + '_>>;
}

/// Object-safe handle onto a single row group's column chunks.
pub trait RowGroupReader {
    fn metadata(&self) -> &RowGroupMetaData;

    fn num_columns(&self) -> usize;

    fn get_column_page_reader(&self, i: usize) -> Result<Box<dyn PageReader>>;
}

/// Builds the `ErrorContext` a page-reader-level error should be annotated
/// with, given the file path (if known) and the row-group/column indices.
pub fn page_context(
    file_path: Option<&str>,
    row_group: usize,
    column_path: &str,
) -> ErrorContext {
    let mut ctx = ErrorContext::empty().with_row_group(row_group).with_column(column_path);
    if let Some(p) = file_path {
        ctx = ctx.with_file(p);
    }
    ctx
}
