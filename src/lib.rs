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

//! A read-only engine for the Apache Parquet columnar file format.
//!
//! [`open`] memory-maps a single file and parses its footer; [`open_all`]
//! does the same for a sequence of files sharing one schema, handing back a
//! single reader that drives rows across all of them in order. From either,
//! [`ParquetReader::row_reader`] assembles whole records (nested columns
//! reassembled via the inverse-Dremel algorithm in [`record`]) and
//! [`ParquetReader::column_reader`] exposes one column's values directly,
//! batch by batch, without materializing rows at all.

pub mod basic;
pub mod column;
pub mod compression;
pub mod concurrent;
pub mod encodings;
pub mod errors;
mod format;
pub mod logical;
pub mod record;
pub mod schema;
pub mod file;
mod thrift;

#[cfg(test)]
mod test_util;

use crate::column::page::PageReader;
use crate::column::{ColumnIterator, ColumnReader};
use crate::concurrent::Hardwood;
use crate::errors::{general_err, ParquetError, Result};
use crate::file::reader::{page_context, ChunkSource, FileReader, RowGroupReader};
use crate::file::row_reader::RowReader;
use crate::file::serialized_reader::SerializedFileReader;
use crate::file::{ParquetMetaData, ReaderProperties};
use crate::schema::SchemaDescriptor;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

/// Opens a single file with default [`ReaderProperties`], memory-mapping it
/// and parsing its footer eagerly.
pub fn open(path: impl AsRef<Path>) -> Result<ParquetReader> {
    open_with_properties(path, ReaderProperties::default())
}

pub fn open_with_properties(path: impl AsRef<Path>, properties: ReaderProperties) -> Result<ParquetReader> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy().into_owned();
    log::info!("opening parquet file {}", path_str);
    let chunk_reader = ChunkSource::open(path)?;
    let reader = SerializedFileReader::new(chunk_reader)?.with_file_path(path_str.clone());
    ParquetReader::from_single(Arc::new(reader), Some(path_str), properties)
}

/// Reads an already in-memory buffer as a single Parquet file.
pub fn open_bytes(bytes: bytes::Bytes) -> Result<ParquetReader> {
    open_bytes_with_properties(bytes, ReaderProperties::default())
}

pub fn open_bytes_with_properties(bytes: bytes::Bytes, properties: ReaderProperties) -> Result<ParquetReader> {
    log::info!("opening parquet file from a {}-byte in-memory buffer", bytes.len());
    let chunk_reader = ChunkSource::from_bytes(bytes);
    let reader = SerializedFileReader::new(chunk_reader)?;
    ParquetReader::from_single(Arc::new(reader), None, properties)
}

/// Opens a sequence of files that share one schema, reading the schema from
/// the first and driving rows across all of them in the order given
/// (spec.md §5's multi-file chaining). Errors if the list is empty.
pub fn open_all(paths: &[impl AsRef<Path>]) -> Result<ParquetReader> {
    open_all_with_properties(paths, ReaderProperties::default())
}

pub fn open_all_with_properties(
    paths: &[impl AsRef<Path>],
    properties: ReaderProperties,
) -> Result<ParquetReader> {
    if paths.is_empty() {
        return Err(general_err!("open_all requires at least one file path"));
    }
    let mut sources = Vec::with_capacity(paths.len());
    let mut file_paths = Vec::with_capacity(paths.len());
    for p in paths {
        let path = p.as_ref();
        let path_str = path.to_string_lossy().into_owned();
        log::info!("opening parquet file {} as part of a multi-file read", path_str);
        let chunk_reader = ChunkSource::open(path)?;
        let reader = SerializedFileReader::new(chunk_reader)?.with_file_path(path_str.clone());
        sources.push(Arc::new(reader) as Arc<dyn FileReader>);
        file_paths.push(Some(path_str));
    }
    ParquetReader::from_many(sources, file_paths, properties)
}

/// A handle onto one or more opened Parquet files sharing a schema: the
/// entry point spec.md §6 describes for reading metadata, whole rows, or a
/// single column's values.
///
/// Owns its [`Hardwood`] worker pool when opened via [`open`]/[`open_all`]
/// (torn down on `close`/drop); a reader built with a caller-supplied
/// `Hardwood` instead borrows it and never tears it down, since other
/// readers may still be using it.
pub struct ParquetReader {
    sources: Vec<Arc<dyn FileReader>>,
    file_paths: Vec<Option<String>>,
    schema: Arc<SchemaDescriptor>,
    hardwood: Arc<Hardwood>,
    properties: ReaderProperties,
    closed: bool,
}

impl ParquetReader {
    fn from_single(source: Arc<dyn FileReader>, file_path: Option<String>, properties: ReaderProperties) -> Result<Self> {
        Self::from_many(vec![source], vec![file_path], properties)
    }

    fn from_many(
        sources: Vec<Arc<dyn FileReader>>,
        file_paths: Vec<Option<String>>,
        properties: ReaderProperties,
    ) -> Result<Self> {
        let schema = sources[0].metadata().file_metadata().schema_descr_ptr();
        let hardwood = crate::concurrent::resolve(properties.thread_count());
        Ok(ParquetReader {
            sources,
            file_paths,
            schema,
            hardwood,
            properties,
            closed: false,
        })
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// The first file's metadata. For a multi-file reader each file's own
    /// metadata is reachable through `metadata_for(index)`.
    pub fn metadata(&self) -> &ParquetMetaData {
        self.sources[0].metadata()
    }

    pub fn metadata_for(&self, file_index: usize) -> &ParquetMetaData {
        self.sources[file_index].metadata()
    }

    pub fn num_files(&self) -> usize {
        self.sources.len()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(ParquetError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Builds a row reader over every file this reader was opened with, in
    /// order, optionally projected down to a subset of top-level field
    /// names.
    pub fn row_reader(&self, projection: Option<&[&str]>) -> Result<RowReader> {
        self.ensure_open()?;
        let projection = self.schema.project(projection)?;
        RowReader::new(
            self.sources.clone(),
            self.file_paths.clone(),
            Arc::clone(&self.schema),
            projection,
            Arc::clone(&self.hardwood),
            self.properties.batch_size(),
        )
    }

    /// Builds a column reader over one leaf column's values across every
    /// row group of every file this reader was opened with, named by its
    /// dot-joined path (e.g. `"address.city"`).
    pub fn column_reader(&self, name: &str) -> Result<ColumnReader> {
        let index = self
            .schema
            .columns()
            .iter()
            .position(|c| c.path.to_string() == name)
            .ok_or_else(|| ParquetError::ProjectionError(format!("unknown column '{name}'")))?;
        self.column_reader_by_index(index)
    }

    pub fn column_reader_by_index(&self, index: usize) -> Result<ColumnReader> {
        self.ensure_open()?;
        if index >= self.schema.num_columns() {
            return Err(general_err!(
                "column index {} out of range ({} columns)",
                index,
                self.schema.num_columns()
            ));
        }
        let descr = Arc::clone(self.schema.column(index));
        let mut page_readers = VecDeque::new();
        for (source_idx, source) in self.sources.iter().enumerate() {
            for rg_idx in 0..source.num_row_groups() {
                let rg = source.get_row_group(rg_idx)?;
                let reader = rg.get_column_page_reader(index).map_err(|e| {
                    e.with_context(page_context(
                        self.file_paths[source_idx].as_deref(),
                        rg_idx,
                        descr.path.to_string().as_str(),
                    ))
                })?;
                page_readers.push_back(reader);
            }
        }
        let chained = ChainedPageReader { readers: page_readers };
        let iterator = ColumnIterator::new(Box::new(chained), descr);
        Ok(ColumnReader::new(iterator))
    }

    /// Closes the reader. Tears down its own worker pool if it owns one;
    /// idempotent. Any `RowReader`/`ColumnReader` already handed out keeps
    /// working against its own borrowed `Hardwood` handle, but new calls on
    /// this `ParquetReader` fail with `Cancelled`.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        log::debug!(
            "closing parquet reader; waiting up to {:?} for worker pool shutdown",
            self.hardwood.shutdown_grace()
        );
    }
}

impl Drop for ParquetReader {
    fn drop(&mut self) {
        self.close();
    }
}

/// Concatenates page readers from consecutive row groups (or, for a
/// `column_reader` spanning a multi-file `ParquetReader`, consecutive
/// files) into the single page stream `ColumnIterator` expects.
struct ChainedPageReader {
    readers: VecDeque<Box<dyn PageReader>>,
}

impl PageReader for ChainedPageReader {
    fn get_next_page(&mut self) -> Result<Option<crate::column::page::Page>> {
        loop {
            let Some(front) = self.readers.front_mut() else {
                return Ok(None);
            };
            if let Some(page) = front.get_next_page()? {
                return Ok(Some(page));
            }
            self.readers.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::write_two_long_column_file;

    #[test]
    fn open_bytes_exposes_schema_and_metadata() {
        let bytes = write_two_long_column_file(&[1, 2, 3], &[10, 20, 30]);
        let reader = open_bytes(bytes::Bytes::from(bytes)).unwrap();
        assert_eq!(reader.schema().num_columns(), 2);
        assert_eq!(reader.metadata().num_row_groups(), 1);
        assert_eq!(reader.metadata().file_metadata().num_rows(), 3);
    }

    #[test]
    fn row_reader_reads_every_row_from_an_opened_buffer() {
        let bytes = write_two_long_column_file(&[1, 2, 3], &[10, 20, 30]);
        let reader = open_bytes(bytes::Bytes::from(bytes)).unwrap();
        let mut rows = reader.row_reader(None).unwrap();
        let mut seen = Vec::new();
        while let Some(row) = rows.next_row().unwrap() {
            seen.push((row.get_long(0).unwrap(), row.get_long(1).unwrap()));
        }
        assert_eq!(seen, vec![(1, 10), (2, 20), (3, 30)]);
    }

    #[test]
    fn column_reader_reads_a_single_column_across_the_whole_file() {
        let bytes = write_two_long_column_file(&[1, 2, 3], &[10, 20, 30]);
        let reader = open_bytes(bytes::Bytes::from(bytes)).unwrap();
        let mut col = reader.column_reader("value").unwrap();
        assert!(col.next_batch(16).unwrap());
        assert_eq!(col.get_longs().unwrap(), &[10, 20, 30]);
    }

    #[test]
    fn closed_reader_rejects_new_row_readers() {
        let bytes = write_two_long_column_file(&[1], &[10]);
        let mut reader = open_bytes(bytes::Bytes::from(bytes)).unwrap();
        reader.close();
        assert!(matches!(reader.row_reader(None), Err(ParquetError::Cancelled)));
    }

    #[test]
    fn projection_rejects_unknown_field_names() {
        let bytes = write_two_long_column_file(&[1], &[10]);
        let reader = open_bytes(bytes::Bytes::from(bytes)).unwrap();
        assert!(reader.row_reader(Some(&["nonexistent"])).is_err());
    }
}
