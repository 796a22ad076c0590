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

//! `RowReader`: the multi-file, multi-row-group driver (spec.md §4.8) that
//! turns a sequence of opened files into one ordered stream of rows. One
//! column iterator per projected leaf is opened per row group; batches are
//! fetched across those iterators in parallel on a [`Hardwood`] pool, with
//! the following batch's fetch submitted concurrently with the caller
//! draining the current one (double-buffering, spec.md §5).
//!
//! No direct analog of this driver was retrieved into this pack — the
//! teacher's own row-iterator lives in a file this pack doesn't carry, only
//! referenced by name (`record::reader::RowIter`) from the files that are
//! present. Its shape here is grounded on that naming convention plus the
//! teacher's `SerializedFileReader`/`SerializedRowGroupReader` pairing this
//! module sits directly on top of.

use crate::column::ColumnIterator;
use crate::concurrent::Hardwood;
use crate::errors::{general_err, ParquetError, Result};
use crate::file::reader::{page_context, FileReader, RowGroupReader};
use crate::record::reader::RecordAssembler;
use crate::record::{build_row_schema, FieldDescriptor, Row};
use crate::schema::{Projection, SchemaDescriptor};
use rayon::prelude::*;
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;

type BatchJob = (Vec<ColumnIterator>, Result<Vec<crate::column::TypedColumnBatch>>);

/// Drives one row group's projected columns through prefetch-and-assemble
/// rounds, materializing a full batch's rows eagerly each round rather than
/// keeping a live `RecordAssembler` (which would have to borrow from the
/// very struct holding the batch it borrows).
struct RowGroupCursor {
    columns: Option<Vec<ColumnIterator>>,
    rows: VecDeque<Row>,
    pending: Option<Receiver<BatchJob>>,
    exhausted: bool,
}

impl RowGroupCursor {
    fn new(columns: Vec<ColumnIterator>) -> Self {
        RowGroupCursor {
            columns: Some(columns),
            rows: VecDeque::new(),
            pending: None,
            exhausted: false,
        }
    }

    fn pop_row(
        &mut self,
        descriptors: &[FieldDescriptor],
        hardwood: &Hardwood,
        batch_size: usize,
    ) -> Result<Option<Row>> {
        if let Some(row) = self.rows.pop_front() {
            return Ok(Some(row));
        }
        if self.exhausted {
            return Ok(None);
        }
        self.fill_next_batch(descriptors, hardwood, batch_size)?;
        Ok(self.rows.pop_front())
    }

    fn fill_next_batch(
        &mut self,
        descriptors: &[FieldDescriptor],
        hardwood: &Hardwood,
        batch_size: usize,
    ) -> Result<()> {
        let (mut columns, batches) = match self.pending.take() {
            Some(rx) => rx
                .recv()
                .map_err(|_| general_err!("prefetch worker dropped its reply channel"))?,
            None => {
                let mut columns = self
                    .columns
                    .take()
                    .unwrap_or_else(|| unreachable!("cursor columns missing outside a pending fetch"));
                let batches =
                    hardwood.install(|| columns.par_iter_mut().map(|c| c.prefetch(batch_size)).collect());
                (columns, batches)
            }
        };
        let batches = batches?;

        let num_records = batches.first().map(|b| b.num_records()).unwrap_or(0);
        if num_records == 0 {
            self.exhausted = true;
            self.columns = Some(columns);
            return Ok(());
        }

        let mut assembler = RecordAssembler::new(descriptors, &batches);
        for _ in 0..num_records {
            self.rows.push_back(assembler.assemble_row());
        }

        let (tx, rx) = channel();
        hardwood.spawn_reply(tx, move || {
            let batches = columns.par_iter_mut().map(|c| c.prefetch(batch_size)).collect();
            (columns, batches)
        });
        self.pending = Some(rx);
        Ok(())
    }
}

fn open_projected_columns(
    rg: &dyn RowGroupReader,
    schema: &SchemaDescriptor,
    projection: &Projection,
    file_path: Option<&str>,
    row_group_index: usize,
) -> Result<Vec<ColumnIterator>> {
    let mut slots: Vec<Option<ColumnIterator>> = (0..schema.num_columns())
        .filter(|&i| projection.is_kept(i))
        .map(|_| None)
        .collect();
    for i in 0..schema.num_columns() {
        let Some(projected) = projection.projected_index(i) else {
            continue;
        };
        let descr = Arc::clone(schema.column(i));
        let page_reader = rg.get_column_page_reader(i).map_err(|e| {
            e.with_context(page_context(file_path, row_group_index, descr.path.to_string().as_str()))
        })?;
        slots[projected] = Some(ColumnIterator::new(page_reader, descr));
    }
    Ok(slots
        .into_iter()
        .map(|c| c.unwrap_or_else(|| unreachable!("every projected leaf slot is populated above")))
        .collect())
}

/// Iterates rows across one or more opened files' row groups, in file order
/// then row-group order (spec.md §4.8). Built by [`crate::open`]'s
/// `row_reader`/[`crate::open_all`] entry points, never constructed
/// directly.
pub struct RowReader {
    sources: Vec<Arc<dyn FileReader>>,
    file_paths: Vec<Option<String>>,
    schema: Arc<SchemaDescriptor>,
    descriptors: Vec<FieldDescriptor>,
    projection: Projection,
    hardwood: Arc<Hardwood>,
    batch_size: usize,
    source_index: usize,
    row_group_index: usize,
    cursor: Option<RowGroupCursor>,
    closed: bool,
}

impl RowReader {
    pub(crate) fn new(
        sources: Vec<Arc<dyn FileReader>>,
        file_paths: Vec<Option<String>>,
        schema: Arc<SchemaDescriptor>,
        projection: Projection,
        hardwood: Arc<Hardwood>,
        batch_size: usize,
    ) -> Result<Self> {
        let descriptors = build_row_schema(&schema, &projection)?;
        Ok(RowReader {
            sources,
            file_paths,
            schema,
            descriptors,
            projection,
            hardwood,
            batch_size,
            source_index: 0,
            row_group_index: 0,
            cursor: None,
            closed: false,
        })
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn field_count(&self) -> usize {
        self.descriptors.len()
    }

    pub fn field_name(&self, i: usize) -> &str {
        self.descriptors[i].name()
    }

    /// Closes the reader: outstanding double-buffered prefetch results are
    /// dropped on arrival, and every call after this returns `Cancelled`.
    pub fn close(&mut self) {
        self.closed = true;
        self.cursor = None;
    }

    /// Pulls the next row, advancing across row-group and file boundaries
    /// transparently. Returns `Ok(None)` once every source is exhausted.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        if self.closed {
            return Err(ParquetError::Cancelled);
        }
        loop {
            if let Some(cursor) = self.cursor.as_mut() {
                if let Some(row) = cursor.pop_row(&self.descriptors, &self.hardwood, self.batch_size)? {
                    return Ok(Some(row));
                }
                self.cursor = None;
                self.row_group_index += 1;
            }

            if self.source_index >= self.sources.len() {
                return Ok(None);
            }
            let source = Arc::clone(&self.sources[self.source_index]);
            if self.row_group_index >= source.num_row_groups() {
                self.source_index += 1;
                self.row_group_index = 0;
                continue;
            }

            let rg = source.get_row_group(self.row_group_index)?;
            let columns = open_projected_columns(
                rg.as_ref(),
                &self.schema,
                &self.projection,
                self.file_paths[self.source_index].as_deref(),
                self.row_group_index,
            )?;
            log::debug!(
                "row reader advancing to row group {} ({} projected columns)",
                self.row_group_index,
                columns.len()
            );
            self.cursor = Some(RowGroupCursor::new(columns));
        }
    }
}

impl Iterator for RowReader {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::reader::ChunkSource;
    use crate::file::serialized_reader::SerializedFileReader;
    use crate::test_util::write_two_long_column_file;
    use bytes::Bytes;

    fn open_reader(bytes: Vec<u8>, batch_size: usize) -> RowReader {
        let source: Arc<dyn FileReader> =
            Arc::new(SerializedFileReader::new(ChunkSource::from_bytes(Bytes::from(bytes))).unwrap());
        let schema = source.metadata().file_metadata().schema_descr_ptr();
        let projection = schema.project(None).unwrap();
        let hardwood = Arc::new(Hardwood::with_threads(2));
        RowReader::new(vec![source], vec![None], schema, projection, hardwood, batch_size).unwrap()
    }

    #[test]
    fn reads_every_row_in_file_order() {
        let bytes = write_two_long_column_file(&[1, 2, 3], &[10, 20, 30]);
        let mut reader = open_reader(bytes, 16);

        assert_eq!(reader.field_count(), 2);
        assert_eq!(reader.field_name(0), "id");
        assert_eq!(reader.field_name(1), "value");

        let rows: Result<Vec<Row>> = reader.by_ref().collect();
        let rows = rows.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get_long(0).unwrap(), 1);
        assert_eq!(rows[0].get_long(1).unwrap(), 10);
        assert_eq!(rows[2].get_long(0).unwrap(), 3);
        assert_eq!(rows[2].get_long(1).unwrap(), 30);
        assert!(reader.next_row().unwrap().is_none());
    }

    #[test]
    fn small_batch_size_still_yields_every_row_via_double_buffering() {
        // batch_size smaller than the row group forces at least one
        // follow-up prefetch round, exercising the double-buffered path.
        let bytes = write_two_long_column_file(&[1, 2, 3, 4, 5], &[10, 20, 30, 40, 50]);
        let mut reader = open_reader(bytes, 2);

        let mut ids = Vec::new();
        while let Some(row) = reader.next_row().unwrap() {
            ids.push(row.get_long(0).unwrap());
        }
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn closed_reader_rejects_further_reads() {
        let bytes = write_two_long_column_file(&[1], &[10]);
        let mut reader = open_reader(bytes, 16);
        reader.close();
        assert!(matches!(reader.next_row(), Err(ParquetError::Cancelled)));
    }
}
