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

//! The column iterator (spec.md §4.6): the above-page abstraction that
//! turns a stream of `Page`s into fixed-size `TypedColumnBatch`es, handling
//! dictionary pages transparently and never splitting a repeated column
//! mid-record. Grounded on the teacher's `read_records` loop in
//! `arrow/array_reader/mod.rs` (pull the record reader until exhausted,
//! then advance to the next page reader), generalized here to produce the
//! tagged-sum `TypedColumnBatch` instead of an Arrow `ArrayRef` and to add
//! the whole-record batching rule spec.md §4.6 layers on top.

use crate::basic::{Encoding, Type as PhysicalType};
use crate::column::page::{Page, PageReader, PrimitiveBatch, TypedColumnBatch};
use crate::encodings::decoding::{
    decode_dictionary_indices, gather_dictionary, plain_decode_bool, plain_decode_byte_array,
    plain_decode_double, plain_decode_fixed_len_byte_array, plain_decode_float, plain_decode_i32,
    plain_decode_i64, plain_decode_int96,
};
use crate::encodings::levels::{count_non_null, read_levels_v1, read_levels_v2};
use crate::errors::{general_err, unsupported_err, Result};
use crate::schema::types::ColumnDescriptor;
use bytes::Bytes;
use std::sync::Arc;

/// Decoded values for one page or dictionary: one variant per
/// physical-storage kind, mirroring `TypedColumnBatch` one level below the
/// def/rep-level bookkeeping (spec.md §9).
#[derive(Debug, Clone)]
enum DecodedValues {
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Boolean(Vec<bool>),
    ByteArray(Vec<Bytes>),
    Object(Vec<Bytes>),
}

impl DecodedValues {
    fn len(&self) -> usize {
        match self {
            DecodedValues::Int(v) => v.len(),
            DecodedValues::Long(v) => v.len(),
            DecodedValues::Float(v) => v.len(),
            DecodedValues::Double(v) => v.len(),
            DecodedValues::Boolean(v) => v.len(),
            DecodedValues::ByteArray(v) => v.len(),
            DecodedValues::Object(v) => v.len(),
        }
    }

    fn empty_like(&self) -> DecodedValues {
        match self {
            DecodedValues::Int(_) => DecodedValues::Int(Vec::new()),
            DecodedValues::Long(_) => DecodedValues::Long(Vec::new()),
            DecodedValues::Float(_) => DecodedValues::Float(Vec::new()),
            DecodedValues::Double(_) => DecodedValues::Double(Vec::new()),
            DecodedValues::Boolean(_) => DecodedValues::Boolean(Vec::new()),
            DecodedValues::ByteArray(_) => DecodedValues::ByteArray(Vec::new()),
            DecodedValues::Object(_) => DecodedValues::Object(Vec::new()),
        }
    }

    /// Appends `src[idx]` onto `self`; both must be the same variant, which
    /// holds for the lifetime of a single column (its physical type never
    /// changes page to page).
    fn push_from(&mut self, src: &DecodedValues, idx: usize) {
        match (self, src) {
            (DecodedValues::Int(d), DecodedValues::Int(s)) => d.push(s[idx]),
            (DecodedValues::Long(d), DecodedValues::Long(s)) => d.push(s[idx]),
            (DecodedValues::Float(d), DecodedValues::Float(s)) => d.push(s[idx]),
            (DecodedValues::Double(d), DecodedValues::Double(s)) => d.push(s[idx]),
            (DecodedValues::Boolean(d), DecodedValues::Boolean(s)) => d.push(s[idx]),
            (DecodedValues::ByteArray(d), DecodedValues::ByteArray(s)) => d.push(s[idx].clone()),
            (DecodedValues::Object(d), DecodedValues::Object(s)) => d.push(s[idx].clone()),
            _ => unreachable!("column's physical type changed mid-chunk"),
        }
    }

    fn into_typed_batch(
        self,
        def_levels: Option<Vec<i16>>,
        rep_levels: Option<Vec<i16>>,
        max_def_level: i16,
        num_records: usize,
    ) -> TypedColumnBatch {
        macro_rules! batch {
            ($values:expr) => {
                PrimitiveBatch {
                    values: $values,
                    def_levels,
                    rep_levels,
                    max_def_level,
                    num_records,
                }
            };
        }
        match self {
            DecodedValues::Int(v) => TypedColumnBatch::IntColumn(batch!(v)),
            DecodedValues::Long(v) => TypedColumnBatch::LongColumn(batch!(v)),
            DecodedValues::Float(v) => TypedColumnBatch::FloatColumn(batch!(v)),
            DecodedValues::Double(v) => TypedColumnBatch::DoubleColumn(batch!(v)),
            DecodedValues::Boolean(v) => TypedColumnBatch::BooleanColumn(batch!(v)),
            DecodedValues::ByteArray(v) => TypedColumnBatch::ByteArrayColumn(batch!(v)),
            DecodedValues::Object(v) => TypedColumnBatch::ObjectColumn(batch!(v)),
        }
    }
}

fn empty_for_physical_type(physical_type: PhysicalType) -> DecodedValues {
    match physical_type {
        PhysicalType::BOOLEAN => DecodedValues::Boolean(Vec::new()),
        PhysicalType::INT32 => DecodedValues::Int(Vec::new()),
        PhysicalType::INT64 => DecodedValues::Long(Vec::new()),
        PhysicalType::FLOAT => DecodedValues::Float(Vec::new()),
        PhysicalType::DOUBLE => DecodedValues::Double(Vec::new()),
        PhysicalType::BYTE_ARRAY => DecodedValues::ByteArray(Vec::new()),
        PhysicalType::INT96 | PhysicalType::FIXED_LEN_BYTE_ARRAY => DecodedValues::Object(Vec::new()),
    }
}

fn plain_decode(physical_type: PhysicalType, type_length: i32, buf: &[u8], count: usize) -> Result<DecodedValues> {
    Ok(match physical_type {
        PhysicalType::BOOLEAN => DecodedValues::Boolean(plain_decode_bool(buf, count)?),
        PhysicalType::INT32 => DecodedValues::Int(plain_decode_i32(buf, count)?),
        PhysicalType::INT64 => DecodedValues::Long(plain_decode_i64(buf, count)?),
        PhysicalType::FLOAT => DecodedValues::Float(plain_decode_float(buf, count)?),
        PhysicalType::DOUBLE => DecodedValues::Double(plain_decode_double(buf, count)?),
        PhysicalType::BYTE_ARRAY => DecodedValues::ByteArray(plain_decode_byte_array(buf, count)?),
        PhysicalType::INT96 => DecodedValues::Object(plain_decode_int96(buf, count)?),
        PhysicalType::FIXED_LEN_BYTE_ARRAY => {
            DecodedValues::Object(plain_decode_fixed_len_byte_array(buf, count, type_length)?)
        }
    })
}

fn dictionary_decode(dictionary: &DecodedValues, buf: &[u8], count: usize) -> Result<DecodedValues> {
    let indices = decode_dictionary_indices(buf, count)?;
    Ok(match dictionary {
        DecodedValues::Int(d) => DecodedValues::Int(gather_dictionary(d, &indices)?),
        DecodedValues::Long(d) => DecodedValues::Long(gather_dictionary(d, &indices)?),
        DecodedValues::Float(d) => DecodedValues::Float(gather_dictionary(d, &indices)?),
        DecodedValues::Double(d) => DecodedValues::Double(gather_dictionary(d, &indices)?),
        DecodedValues::Boolean(d) => DecodedValues::Boolean(gather_dictionary(d, &indices)?),
        DecodedValues::ByteArray(d) => DecodedValues::ByteArray(gather_dictionary(d, &indices)?),
        DecodedValues::Object(d) => DecodedValues::Object(gather_dictionary(d, &indices)?),
    })
}

/// One decoded data page's slots, with cursors tracking how much of it has
/// already been delivered into a batch.
struct PageBuffer {
    def_levels: Vec<i16>,
    rep_levels: Vec<i16>,
    values: DecodedValues,
    /// Next slot index (0..num_slots) to consider.
    slot_cursor: usize,
    /// Next index into `values` to consume; advances only on a non-null slot.
    value_cursor: usize,
    num_slots: usize,
}

impl PageBuffer {
    fn is_exhausted(&self) -> bool {
        self.slot_cursor >= self.num_slots
    }

    fn slot_def(&self, slot: usize) -> i16 {
        self.def_levels.get(slot).copied().unwrap_or(0)
    }

    fn slot_rep(&self, slot: usize) -> i16 {
        self.rep_levels.get(slot).copied().unwrap_or(0)
    }
}

/// Reads pages within a single column chunk and emits fixed-size
/// `TypedColumnBatch`es, never splitting a repeated column mid-record
/// (spec.md §4.6). The per-column `Idle -> Reading(page) -> Batched ->
/// Idle` state machine (spec.md §4.8) collapses here to whether `current`
/// holds a partially-consumed page.
pub struct ColumnIterator {
    page_reader: Box<dyn PageReader>,
    column: Arc<ColumnDescriptor>,
    dictionary: Option<DecodedValues>,
    current: Option<PageBuffer>,
    exhausted: bool,
}

impl ColumnIterator {
    pub fn new(page_reader: Box<dyn PageReader>, column: Arc<ColumnDescriptor>) -> Self {
        ColumnIterator {
            page_reader,
            column,
            dictionary: None,
            current: None,
            exhausted: false,
        }
    }

    pub fn column(&self) -> &ColumnDescriptor {
        &self.column
    }

    /// Pulls pages until either a data page is buffered in `self.current`
    /// or the chunk is exhausted. Dictionary pages are consumed
    /// transparently and never surfaced to the caller.
    fn ensure_current_page(&mut self) -> Result<bool> {
        if self.current.is_some() {
            return Ok(true);
        }
        loop {
            match self.page_reader.get_next_page()? {
                None => {
                    self.exhausted = true;
                    return Ok(false);
                }
                Some(Page::Dictionary { buf, num_values }) => {
                    let dict = plain_decode(
                        self.column.physical_type,
                        self.column.type_length,
                        &buf,
                        num_values as usize,
                    )?;
                    self.dictionary = Some(dict);
                }
                Some(page) => {
                    self.current = Some(self.decode_data_page(page)?);
                    return Ok(true);
                }
            }
        }
    }

    fn decode_data_page(&self, page: Page) -> Result<PageBuffer> {
        let max_def = self.column.max_def_level;
        let max_rep = self.column.max_rep_level;

        let (def_levels, rep_levels, value_bytes, num_values, encoding): (Vec<i16>, Vec<i16>, Bytes, usize, Encoding) =
            match page {
                Page::DataV1 { buf, num_values, encoding } => {
                    let num_values = num_values as usize;
                    let mut cursor = 0usize;
                    let rep_levels = if max_rep > 0 {
                        let (levels, consumed) = read_levels_v1(&buf[cursor..], max_rep, num_values)?;
                        cursor += consumed;
                        levels
                    } else {
                        Vec::new()
                    };
                    let def_levels = if max_def > 0 {
                        let (levels, consumed) = read_levels_v1(&buf[cursor..], max_def, num_values)?;
                        cursor += consumed;
                        levels
                    } else {
                        Vec::new()
                    };
                    (def_levels, rep_levels, buf.slice(cursor..), num_values, encoding)
                }
                Page::DataV2 {
                    rep_levels,
                    def_levels,
                    values,
                    num_values,
                    encoding,
                    ..
                } => {
                    let num_values = num_values as usize;
                    let rep_levels = if max_rep > 0 {
                        read_levels_v2(&rep_levels, max_rep, num_values)?
                    } else {
                        Vec::new()
                    };
                    let def_levels = if max_def > 0 {
                        read_levels_v2(&def_levels, max_def, num_values)?
                    } else {
                        Vec::new()
                    };
                    (def_levels, rep_levels, values, num_values, encoding)
                }
                Page::Dictionary { .. } => {
                    return Err(general_err!("dictionary page reached the data-page decoder"));
                }
            };

        let non_null_count = if max_def > 0 {
            count_non_null(&def_levels, max_def)
        } else {
            num_values
        };

        let values = match encoding {
            Encoding::PLAIN => {
                plain_decode(self.column.physical_type, self.column.type_length, &value_bytes, non_null_count)?
            }
            Encoding::PLAIN_DICTIONARY | Encoding::RLE_DICTIONARY => {
                let dict = self
                    .dictionary
                    .as_ref()
                    .ok_or_else(|| general_err!("dictionary-encoded page with no preceding dictionary page"))?;
                dictionary_decode(dict, &value_bytes, non_null_count)?
            }
            other => return Err(unsupported_err!("encoding {:?} is not implemented", other)),
        };

        Ok(PageBuffer {
            def_levels,
            rep_levels,
            values,
            slot_cursor: 0,
            value_cursor: 0,
            num_slots: num_values,
        })
    }

    /// Reads up to `batch_size` whole top-level records (spec.md §4.6).
    /// Flat columns (`max_rep_level == 0`) treat one value as one record;
    /// nested columns only ever stop at a `rep == 0` boundary, so the
    /// returned batch may overshoot or undershoot `batch_size` by a whole
    /// record. Returns an empty batch once the chunk is exhausted.
    pub fn prefetch(&mut self, batch_size: usize) -> Result<TypedColumnBatch> {
        let max_def = self.column.max_def_level;
        let max_rep = self.column.max_rep_level;

        let mut values_out = empty_for_physical_type(self.column.physical_type);
        let mut def_levels_out: Vec<i16> = Vec::new();
        let mut rep_levels_out: Vec<i16> = Vec::new();
        let mut records_emitted = 0usize;

        'outer: loop {
            if records_emitted >= batch_size && max_rep == 0 {
                break;
            }
            if !self.ensure_current_page()? {
                break;
            }
            let page = self.current.as_mut().expect("ensure_current_page guarantees Some");
            let mut stopped_mid_page = false;

            while !page.is_exhausted() {
                let slot = page.slot_cursor;
                let rep = if max_rep > 0 { page.slot_rep(slot) } else { 0 };
                let is_record_start = max_rep == 0 || rep == 0;

                if is_record_start && records_emitted >= batch_size {
                    // Stop before consuming the next record's first slot.
                    stopped_mid_page = true;
                    break;
                }

                let def = if max_def > 0 { page.slot_def(slot) } else { max_def };
                if max_def > 0 {
                    def_levels_out.push(def);
                }
                if max_rep > 0 {
                    rep_levels_out.push(rep);
                }
                if def == max_def {
                    values_out.push_from(&page.values, page.value_cursor);
                    page.value_cursor += 1;
                }
                page.slot_cursor += 1;
                if is_record_start {
                    records_emitted += 1;
                }
            }

            if page.is_exhausted() {
                self.current = None;
            }
            if stopped_mid_page {
                break 'outer;
            }
            if self.exhausted && self.current.is_none() {
                break 'outer;
            }
        }

        let def_levels = if max_def > 0 { Some(def_levels_out) } else { None };
        let rep_levels = if max_rep > 0 { Some(rep_levels_out) } else { None };
        Ok(values_out.into_typed_batch(def_levels, rep_levels, max_def, records_emitted))
    }
}

/// The public, single-column-at-a-time face of a `ColumnIterator` (spec.md
/// §6): `next_batch` pulls the next fixed-size batch, the typed `get_*`
/// accessors expose it without the caller ever touching `TypedColumnBatch`
/// directly.
pub struct ColumnReader {
    iterator: ColumnIterator,
    current: Option<TypedColumnBatch>,
    closed: bool,
}

impl ColumnReader {
    pub fn new(iterator: ColumnIterator) -> Self {
        ColumnReader {
            iterator,
            current: None,
            closed: false,
        }
    }

    pub fn column(&self) -> &ColumnDescriptor {
        self.iterator.column()
    }

    /// Pulls the next batch of up to `batch_size` records. Returns `false`
    /// once the chunk is exhausted, at which point the `get_*` accessors
    /// see an empty batch.
    pub fn next_batch(&mut self, batch_size: usize) -> Result<bool> {
        if self.closed {
            return Err(crate::errors::ParquetError::Cancelled);
        }
        let batch = self.iterator.prefetch(batch_size)?;
        let has_rows = !batch.is_empty();
        self.current = Some(batch);
        Ok(has_rows)
    }

    pub fn num_records(&self) -> usize {
        self.current.as_ref().map(TypedColumnBatch::num_records).unwrap_or(0)
    }

    fn current(&self) -> Result<&TypedColumnBatch> {
        self.current
            .as_ref()
            .ok_or_else(|| general_err!("next_batch must be called before reading column values"))
    }

    pub fn get_ints(&self) -> Result<&[i32]> {
        match self.current()? {
            TypedColumnBatch::IntColumn(b) => Ok(&b.values),
            other => Err(general_err!("column is not INT32: {:?}", variant_name(other))),
        }
    }

    pub fn get_longs(&self) -> Result<&[i64]> {
        match self.current()? {
            TypedColumnBatch::LongColumn(b) => Ok(&b.values),
            other => Err(general_err!("column is not INT64: {:?}", variant_name(other))),
        }
    }

    pub fn get_floats(&self) -> Result<&[f32]> {
        match self.current()? {
            TypedColumnBatch::FloatColumn(b) => Ok(&b.values),
            other => Err(general_err!("column is not FLOAT: {:?}", variant_name(other))),
        }
    }

    pub fn get_doubles(&self) -> Result<&[f64]> {
        match self.current()? {
            TypedColumnBatch::DoubleColumn(b) => Ok(&b.values),
            other => Err(general_err!("column is not DOUBLE: {:?}", variant_name(other))),
        }
    }

    pub fn get_booleans(&self) -> Result<&[bool]> {
        match self.current()? {
            TypedColumnBatch::BooleanColumn(b) => Ok(&b.values),
            other => Err(general_err!("column is not BOOLEAN: {:?}", variant_name(other))),
        }
    }

    pub fn get_byte_arrays(&self) -> Result<&[Bytes]> {
        match self.current()? {
            TypedColumnBatch::ByteArrayColumn(b) => Ok(&b.values),
            TypedColumnBatch::ObjectColumn(b) => Ok(&b.values),
            other => Err(general_err!("column is not a byte-array kind: {:?}", variant_name(other))),
        }
    }

    /// One entry per value slot in the current batch: `true` where the slot
    /// is null. Empty for a column with `max_def_level == 0` (can't be
    /// null), per spec.md §6's "bit-set" accessor.
    pub fn get_element_nulls(&self) -> Result<Vec<bool>> {
        let batch = self.current()?;
        Ok(match batch.def_levels() {
            Some(defs) => defs.iter().map(|&d| d < batch.max_def_level()).collect(),
            None => vec![false; batch.num_slots()],
        })
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}

fn variant_name(batch: &TypedColumnBatch) -> &'static str {
    match batch {
        TypedColumnBatch::IntColumn(_) => "INT32",
        TypedColumnBatch::LongColumn(_) => "INT64",
        TypedColumnBatch::FloatColumn(_) => "FLOAT",
        TypedColumnBatch::DoubleColumn(_) => "DOUBLE",
        TypedColumnBatch::BooleanColumn(_) => "BOOLEAN",
        TypedColumnBatch::ByteArrayColumn(_) => "BYTE_ARRAY",
        TypedColumnBatch::ObjectColumn(_) => "FIXED_LEN_BYTE_ARRAY/INT96",
    }
}
