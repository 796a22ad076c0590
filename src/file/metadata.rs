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

//! The file/schema/row-group/column-chunk metadata model, as decoded from
//! the footer's `FileMetaData` Thrift struct.

use crate::basic::Compression;
use crate::format;
use crate::schema::types::{schema_from_elements, ColumnDescriptor, SchemaDescriptor};
use std::sync::Arc;

/// Top-level, file-scoped metadata: everything in the footer that isn't
/// itself row-group data.
#[derive(Debug, Clone)]
pub struct FileMetaData {
    version: i32,
    num_rows: i64,
    created_by: Option<String>,
    key_value_metadata: Option<Vec<format::KeyValue>>,
    schema_descr: Arc<SchemaDescriptor>,
}

impl FileMetaData {
    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn key_value_metadata(&self) -> Option<&[format::KeyValue]> {
        self.key_value_metadata.as_deref()
    }

    pub fn schema_descr(&self) -> &SchemaDescriptor {
        &self.schema_descr
    }

    pub fn schema_descr_ptr(&self) -> Arc<SchemaDescriptor> {
        Arc::clone(&self.schema_descr)
    }
}

/// Metadata for a single column chunk within a row group.
#[derive(Debug, Clone)]
pub struct ColumnChunkMetaData {
    column_descr: Arc<ColumnDescriptor>,
    encodings: Vec<i32>,
    codec: Compression,
    num_values: i64,
    total_uncompressed_size: i64,
    total_compressed_size: i64,
    data_page_offset: i64,
    dictionary_page_offset: Option<i64>,
}

impl ColumnChunkMetaData {
    pub fn column_descr(&self) -> &ColumnDescriptor {
        &self.column_descr
    }

    pub fn compression(&self) -> Compression {
        self.codec
    }

    pub fn num_values(&self) -> i64 {
        self.num_values
    }

    pub fn total_uncompressed_size(&self) -> i64 {
        self.total_uncompressed_size
    }

    pub fn total_compressed_size(&self) -> i64 {
        self.total_compressed_size
    }

    pub fn data_page_offset(&self) -> i64 {
        self.data_page_offset
    }

    pub fn dictionary_page_offset(&self) -> Option<i64> {
        self.dictionary_page_offset
    }

    /// The byte range covering this column chunk: starts at the earliest
    /// of the dictionary page (if any) and the first data page, spans its
    /// compressed size.
    pub fn byte_range(&self) -> (u64, u64) {
        let start = self
            .dictionary_page_offset
            .map(|d| d.min(self.data_page_offset))
            .unwrap_or(self.data_page_offset);
        (start as u64, self.total_compressed_size as u64)
    }

    pub fn encodings(&self) -> &[i32] {
        &self.encodings
    }
}

/// Metadata for one row group: one column chunk per leaf column.
#[derive(Debug, Clone)]
pub struct RowGroupMetaData {
    columns: Vec<ColumnChunkMetaData>,
    num_rows: i64,
    total_byte_size: i64,
}

impl RowGroupMetaData {
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, i: usize) -> &ColumnChunkMetaData {
        &self.columns[i]
    }

    pub fn columns(&self) -> &[ColumnChunkMetaData] {
        &self.columns
    }

    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    pub fn total_byte_size(&self) -> i64 {
        self.total_byte_size
    }
}

/// The whole file's metadata: file-level info plus every row group.
#[derive(Debug, Clone)]
pub struct ParquetMetaData {
    file_metadata: FileMetaData,
    row_groups: Vec<RowGroupMetaData>,
}

impl ParquetMetaData {
    pub fn new(file_metadata: FileMetaData, row_groups: Vec<RowGroupMetaData>) -> Self {
        ParquetMetaData {
            file_metadata,
            row_groups,
        }
    }

    pub fn file_metadata(&self) -> &FileMetaData {
        &self.file_metadata
    }

    pub fn num_row_groups(&self) -> usize {
        self.row_groups.len()
    }

    pub fn row_group(&self, i: usize) -> &RowGroupMetaData {
        &self.row_groups[i]
    }

    pub fn row_groups(&self) -> &[RowGroupMetaData] {
        &self.row_groups
    }
}

/// Assembles the public metadata model from the decoded footer structs.
pub(crate) fn build_parquet_metadata(raw: format::FileMetaData) -> crate::errors::Result<ParquetMetaData> {
    let schema_descr = Arc::new(schema_from_elements(&raw.schema)?);

    let mut row_groups = Vec::with_capacity(raw.row_groups.len());
    for rg in raw.row_groups {
        let mut columns = Vec::with_capacity(rg.columns.len());
        for (i, col) in rg.columns.into_iter().enumerate() {
            let meta = col.meta_data.ok_or_else(|| {
                crate::errors::general_err!("column chunk {} is missing its metadata", i)
            })?;
            let descr = Arc::clone(schema_descr.column(i));
            columns.push(ColumnChunkMetaData {
                column_descr: descr,
                encodings: meta.encodings,
                codec: Compression::from(meta.codec),
                num_values: meta.num_values,
                total_uncompressed_size: meta.total_uncompressed_size,
                total_compressed_size: meta.total_compressed_size,
                data_page_offset: meta.data_page_offset,
                dictionary_page_offset: meta.dictionary_page_offset,
            });
        }
        row_groups.push(RowGroupMetaData {
            columns,
            num_rows: rg.num_rows,
            total_byte_size: rg.total_byte_size,
        });
    }

    let file_metadata = FileMetaData {
        version: raw.version,
        num_rows: raw.num_rows,
        created_by: raw.created_by,
        key_value_metadata: raw.key_value_metadata,
        schema_descr,
    };

    Ok(ParquetMetaData {
        file_metadata,
        row_groups,
    })
}
