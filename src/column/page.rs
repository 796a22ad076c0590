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

//! Decoded page shapes (spec.md §4.5) and the typed column batch (spec.md
//! §3) that pages ultimately get decoded into.

use crate::basic::Encoding;
use bytes::Bytes;

/// A single decoded page. Decompression has already happened by the time a
/// `PageReader` hands one of these out; only level/value decoding remains.
#[derive(Debug, Clone)]
pub enum Page {
    /// Always PLAIN-encoded, always first in a column chunk if present.
    Dictionary { buf: Bytes, num_values: u32 },
    /// v1: rep-levels, def-levels and values were jointly compressed, so
    /// `buf` here is the single decompressed body the three streams share.
    DataV1 {
        buf: Bytes,
        num_values: u32,
        encoding: Encoding,
    },
    /// v2: rep/def-level streams are never compressed; only `values` was
    /// (conditionally) compressed, and has already been decompressed here.
    DataV2 {
        rep_levels: Bytes,
        def_levels: Bytes,
        values: Bytes,
        num_values: u32,
        num_nulls: u32,
        num_rows: u32,
        encoding: Encoding,
    },
}

impl Page {
    pub fn num_values(&self) -> u32 {
        match self {
            Page::Dictionary { num_values, .. } => *num_values,
            Page::DataV1 { num_values, .. } => *num_values,
            Page::DataV2 { num_values, .. } => *num_values,
        }
    }
}

/// A byte-stream reader over a single column chunk, producing one decoded
/// `Page` at a time (spec.md §4.5). Returns `None` once the chunk's declared
/// value count has been consumed.
pub trait PageReader: Send {
    fn get_next_page(&mut self) -> crate::errors::Result<Option<Page>>;
}

/// One primitive-typed batch: values plus the parallel level arrays that
/// describe nullability/nesting, per spec.md §3's "Typed column batch".
#[derive(Debug, Clone)]
pub struct PrimitiveBatch<T> {
    pub values: Vec<T>,
    /// Present iff `max_def_level > 0`. One entry per value *slot*,
    /// including nulls — longer than `values` whenever some slots are null.
    pub def_levels: Option<Vec<i16>>,
    /// Present iff `max_rep_level > 0`. Same length as `def_levels`.
    pub rep_levels: Option<Vec<i16>>,
    pub max_def_level: i16,
    /// Number of whole top-level records represented by this batch.
    pub num_records: usize,
}

impl<T> PrimitiveBatch<T> {
    pub fn num_slots(&self) -> usize {
        self.def_levels.as_ref().map(|d| d.len()).unwrap_or(self.values.len())
    }
}

/// The tagged-sum column batch spec.md §9 calls for: one variant per
/// physical-storage kind, monomorphic accessors per variant.
#[derive(Debug, Clone)]
pub enum TypedColumnBatch {
    IntColumn(PrimitiveBatch<i32>),
    LongColumn(PrimitiveBatch<i64>),
    FloatColumn(PrimitiveBatch<f32>),
    DoubleColumn(PrimitiveBatch<f64>),
    BooleanColumn(PrimitiveBatch<bool>),
    ByteArrayColumn(PrimitiveBatch<Bytes>),
    /// FIXED_LEN_BYTE_ARRAY and INT96: raw fixed-size byte blobs.
    ObjectColumn(PrimitiveBatch<Bytes>),
}

impl TypedColumnBatch {
    pub fn num_records(&self) -> usize {
        match self {
            TypedColumnBatch::IntColumn(b) => b.num_records,
            TypedColumnBatch::LongColumn(b) => b.num_records,
            TypedColumnBatch::FloatColumn(b) => b.num_records,
            TypedColumnBatch::DoubleColumn(b) => b.num_records,
            TypedColumnBatch::BooleanColumn(b) => b.num_records,
            TypedColumnBatch::ByteArrayColumn(b) => b.num_records,
            TypedColumnBatch::ObjectColumn(b) => b.num_records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_records() == 0
    }

    pub fn def_levels(&self) -> Option<&[i16]> {
        match self {
            TypedColumnBatch::IntColumn(b) => b.def_levels.as_deref(),
            TypedColumnBatch::LongColumn(b) => b.def_levels.as_deref(),
            TypedColumnBatch::FloatColumn(b) => b.def_levels.as_deref(),
            TypedColumnBatch::DoubleColumn(b) => b.def_levels.as_deref(),
            TypedColumnBatch::BooleanColumn(b) => b.def_levels.as_deref(),
            TypedColumnBatch::ByteArrayColumn(b) => b.def_levels.as_deref(),
            TypedColumnBatch::ObjectColumn(b) => b.def_levels.as_deref(),
        }
    }

    pub fn rep_levels(&self) -> Option<&[i16]> {
        match self {
            TypedColumnBatch::IntColumn(b) => b.rep_levels.as_deref(),
            TypedColumnBatch::LongColumn(b) => b.rep_levels.as_deref(),
            TypedColumnBatch::FloatColumn(b) => b.rep_levels.as_deref(),
            TypedColumnBatch::DoubleColumn(b) => b.rep_levels.as_deref(),
            TypedColumnBatch::BooleanColumn(b) => b.rep_levels.as_deref(),
            TypedColumnBatch::ByteArrayColumn(b) => b.rep_levels.as_deref(),
            TypedColumnBatch::ObjectColumn(b) => b.rep_levels.as_deref(),
        }
    }

    pub fn max_def_level(&self) -> i16 {
        match self {
            TypedColumnBatch::IntColumn(b) => b.max_def_level,
            TypedColumnBatch::LongColumn(b) => b.max_def_level,
            TypedColumnBatch::FloatColumn(b) => b.max_def_level,
            TypedColumnBatch::DoubleColumn(b) => b.max_def_level,
            TypedColumnBatch::BooleanColumn(b) => b.max_def_level,
            TypedColumnBatch::ByteArrayColumn(b) => b.max_def_level,
            TypedColumnBatch::ObjectColumn(b) => b.max_def_level,
        }
    }

    pub fn num_slots(&self) -> usize {
        match self {
            TypedColumnBatch::IntColumn(b) => b.num_slots(),
            TypedColumnBatch::LongColumn(b) => b.num_slots(),
            TypedColumnBatch::FloatColumn(b) => b.num_slots(),
            TypedColumnBatch::DoubleColumn(b) => b.num_slots(),
            TypedColumnBatch::BooleanColumn(b) => b.num_slots(),
            TypedColumnBatch::ByteArrayColumn(b) => b.num_slots(),
            TypedColumnBatch::ObjectColumn(b) => b.num_slots(),
        }
    }
}
