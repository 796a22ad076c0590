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

//! Error types for the Parquet crate.

use std::fmt::{Debug, Display};
use thiserror::Error;

/// The error taxonomy for this crate, per the spec's error handling design.
///
/// Every variant that can be attributed to a particular file, row group,
/// column or page carries that context so it can be surfaced to the caller
/// without the caller having to reconstruct it.
#[derive(Error, Debug)]
pub enum ParquetError {
    /// Footer/page/Thrift decode failures: bad magic, truncated input,
    /// out-of-range varints, inconsistent page header fields, dictionary
    /// index out of range, impossible level values.
    #[error("Malformed Parquet file{}: {1}", context_suffix(.0))]
    MalformedFormat(ErrorContext, String),

    /// A combination of encoding/codec/logical-type the reader does not (yet)
    /// implement. Distinct from malformed so callers can tell "this will
    /// never parse" from "this needs a newer reader".
    #[error("Unsupported Parquet feature{}: {1}", context_suffix(.0))]
    UnsupportedFeature(ErrorContext, String),

    /// Unknown field name in a projection, or a typed accessor called against
    /// a column whose physical/logical type doesn't match.
    #[error("Projection error: {0}")]
    ProjectionError(String),

    /// Propagated unchanged from the underlying file-mapping layer.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Raised by any operation issued against a reader that has been closed.
    #[error("Operation attempted on a closed reader")]
    Cancelled,
}

/// File path / row-group / column-path / page-offset breadcrumbs attached to
/// an error as it propagates up through the page reader and row reader.
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    pub file_path: Option<String>,
    pub row_group: Option<usize>,
    pub column_path: Option<String>,
    pub page_offset: Option<u64>,
}

impl ErrorContext {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_row_group(mut self, idx: usize) -> Self {
        self.row_group = Some(idx);
        self
    }

    pub fn with_column(mut self, path: impl Into<String>) -> Self {
        self.column_path = Some(path.into());
        self
    }

    pub fn with_page_offset(mut self, offset: u64) -> Self {
        self.page_offset = Some(offset);
        self
    }

    /// Merge in fields from `more` that aren't already set on `self`, so an
    /// annotation added further up the call stack doesn't clobber a more
    /// specific one set closer to the source.
    pub fn merge(mut self, more: &ErrorContext) -> Self {
        self.file_path = self.file_path.or_else(|| more.file_path.clone());
        self.row_group = self.row_group.or(more.row_group);
        self.column_path = self.column_path.or_else(|| more.column_path.clone());
        self.page_offset = self.page_offset.or(more.page_offset);
        self
    }
}

fn context_suffix(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(p) = &ctx.file_path {
        parts.push(format!("file={p}"));
    }
    if let Some(rg) = ctx.row_group {
        parts.push(format!("row_group={rg}"));
    }
    if let Some(c) = &ctx.column_path {
        parts.push(format!("column={c}"));
    }
    if let Some(o) = ctx.page_offset {
        parts.push(format!("page_offset={o}"));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl ParquetError {
    /// Attach or enrich context without discarding what's already present.
    pub fn with_context(self, ctx: ErrorContext) -> Self {
        match self {
            ParquetError::MalformedFormat(existing, msg) => {
                ParquetError::MalformedFormat(ctx.merge(&existing), msg)
            }
            ParquetError::UnsupportedFeature(existing, msg) => {
                ParquetError::UnsupportedFeature(ctx.merge(&existing), msg)
            }
            other => other,
        }
    }
}

pub type Result<T, E = ParquetError> = std::result::Result<T, E>;

macro_rules! general_err {
    ($fmt:expr) => (
        $crate::errors::ParquetError::MalformedFormat($crate::errors::ErrorContext::empty(), format!($fmt))
    );
    ($fmt:expr, $($args:expr),*) => (
        $crate::errors::ParquetError::MalformedFormat($crate::errors::ErrorContext::empty(), format!($fmt, $($args),*))
    );
}

macro_rules! eof_err {
    ($fmt:expr) => (
        $crate::errors::ParquetError::MalformedFormat($crate::errors::ErrorContext::empty(), format!(concat!("Unexpected EOF: ", $fmt)))
    );
    ($fmt:expr, $($args:expr),*) => (
        $crate::errors::ParquetError::MalformedFormat($crate::errors::ErrorContext::empty(), format!(concat!("Unexpected EOF: ", $fmt), $($args),*))
    );
}

macro_rules! unsupported_err {
    ($fmt:expr) => (
        $crate::errors::ParquetError::UnsupportedFeature($crate::errors::ErrorContext::empty(), format!($fmt))
    );
    ($fmt:expr, $($args:expr),*) => (
        $crate::errors::ParquetError::UnsupportedFeature($crate::errors::ErrorContext::empty(), format!($fmt, $($args),*))
    );
}

pub(crate) use eof_err;
pub(crate) use general_err;
pub(crate) use unsupported_err;

/// Helper used by accessors that need to reject a request against a type
/// that doesn't support it (e.g. `get_long` on a BYTE_ARRAY column).
pub fn type_mismatch<T: Debug, U: Display>(expected: T, found: U) -> ParquetError {
    ParquetError::ProjectionError(format!("expected {expected:?}, found {found}"))
}
