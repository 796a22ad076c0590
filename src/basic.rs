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

//! Basic enum types mirroring the Parquet Thrift schema's integer-coded
//! enums (physical type, repetition, encoding, compression, page type,
//! converted/logical type). These map from the little-endian i32 codes
//! read off the wire via fixed tables; unknown codes are tolerated at
//! parse time (mapped to an `UNKNOWN` sentinel) and only rejected if a
//! page actually tries to use them.

use crate::errors::{general_err, ParquetError};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    BOOLEAN,
    INT32,
    INT64,
    INT96,
    FLOAT,
    DOUBLE,
    BYTE_ARRAY,
    FIXED_LEN_BYTE_ARRAY,
}

impl TryFrom<i32> for Type {
    type Error = ParquetError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Type::BOOLEAN,
            1 => Type::INT32,
            2 => Type::INT64,
            3 => Type::INT96,
            4 => Type::FLOAT,
            5 => Type::DOUBLE,
            6 => Type::BYTE_ARRAY,
            7 => Type::FIXED_LEN_BYTE_ARRAY,
            _ => return Err(general_err!("unknown physical type code {}", value)),
        })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
    REQUIRED,
    OPTIONAL,
    REPEATED,
}

impl TryFrom<i32> for Repetition {
    type Error = ParquetError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Repetition::REQUIRED,
            1 => Repetition::OPTIONAL,
            2 => Repetition::REPEATED,
            _ => return Err(general_err!("unknown repetition code {}", value)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    PLAIN,
    PLAIN_DICTIONARY,
    RLE,
    BIT_PACKED,
    DELTA_BINARY_PACKED,
    DELTA_LENGTH_BYTE_ARRAY,
    DELTA_BYTE_ARRAY,
    RLE_DICTIONARY,
    BYTE_STREAM_SPLIT,
    /// Tolerated at footer-parse time; only an error if a page tries to use it.
    UNKNOWN(i32),
}

impl From<i32> for Encoding {
    fn from(value: i32) -> Self {
        match value {
            0 => Encoding::PLAIN,
            2 => Encoding::PLAIN_DICTIONARY,
            3 => Encoding::RLE,
            4 => Encoding::BIT_PACKED,
            5 => Encoding::DELTA_BINARY_PACKED,
            6 => Encoding::DELTA_LENGTH_BYTE_ARRAY,
            7 => Encoding::DELTA_BYTE_ARRAY,
            8 => Encoding::RLE_DICTIONARY,
            9 => Encoding::BYTE_STREAM_SPLIT,
            other => Encoding::UNKNOWN(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    UNCOMPRESSED,
    SNAPPY,
    GZIP,
    LZO,
    BROTLI,
    LZ4,
    ZSTD,
    LZ4_RAW,
    UNKNOWN(i32),
}

impl From<i32> for Compression {
    fn from(value: i32) -> Self {
        match value {
            0 => Compression::UNCOMPRESSED,
            1 => Compression::SNAPPY,
            2 => Compression::GZIP,
            3 => Compression::LZO,
            4 => Compression::BROTLI,
            5 => Compression::LZ4,
            6 => Compression::ZSTD,
            7 => Compression::LZ4_RAW,
            other => Compression::UNKNOWN(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    DATA_PAGE,
    INDEX_PAGE,
    DICTIONARY_PAGE,
    DATA_PAGE_V2,
}

impl TryFrom<i32> for PageType {
    type Error = ParquetError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => PageType::DATA_PAGE,
            1 => PageType::INDEX_PAGE,
            2 => PageType::DICTIONARY_PAGE,
            3 => PageType::DATA_PAGE_V2,
            _ => return Err(general_err!("unknown page type code {}", value)),
        })
    }
}

/// `ConvertedType`, the legacy logical-type annotation scheme. Still emitted
/// by most writers alongside (or instead of) `LogicalType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConvertedType {
    NONE,
    UTF8,
    MAP,
    MAP_KEY_VALUE,
    LIST,
    ENUM,
    DECIMAL,
    DATE,
    TIME_MILLIS,
    TIME_MICROS,
    TIMESTAMP_MILLIS,
    TIMESTAMP_MICROS,
    UINT_8,
    UINT_16,
    UINT_32,
    UINT_64,
    INT_8,
    INT_16,
    INT_32,
    INT_64,
    JSON,
    BSON,
    INTERVAL,
    UNKNOWN(i32),
}

impl From<Option<i32>> for ConvertedType {
    fn from(value: Option<i32>) -> Self {
        match value {
            None => ConvertedType::NONE,
            Some(0) => ConvertedType::UTF8,
            Some(1) => ConvertedType::MAP,
            Some(2) => ConvertedType::MAP_KEY_VALUE,
            Some(3) => ConvertedType::LIST,
            Some(4) => ConvertedType::ENUM,
            Some(5) => ConvertedType::DECIMAL,
            Some(6) => ConvertedType::DATE,
            Some(7) => ConvertedType::TIME_MILLIS,
            Some(8) => ConvertedType::TIME_MICROS,
            Some(9) => ConvertedType::TIMESTAMP_MILLIS,
            Some(10) => ConvertedType::TIMESTAMP_MICROS,
            Some(11) => ConvertedType::UINT_8,
            Some(12) => ConvertedType::UINT_16,
            Some(13) => ConvertedType::UINT_32,
            Some(14) => ConvertedType::UINT_64,
            Some(15) => ConvertedType::INT_8,
            Some(16) => ConvertedType::INT_16,
            Some(17) => ConvertedType::INT_32,
            Some(18) => ConvertedType::INT_64,
            Some(19) => ConvertedType::JSON,
            Some(20) => ConvertedType::BSON,
            Some(21) => ConvertedType::INTERVAL,
            Some(other) => ConvertedType::UNKNOWN(other),
        }
    }
}

/// `LogicalType`, the modern logical-type annotation. Unknown variants
/// (future additions to the Parquet spec) are preserved but inert.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalType {
    String,
    Enum,
    Uuid,
    Date,
    Time {
        is_adjusted_to_u_t_c: bool,
        unit: TimeUnit,
    },
    Timestamp {
        is_adjusted_to_u_t_c: bool,
        unit: TimeUnit,
    },
    Decimal {
        precision: i32,
        scale: i32,
    },
    Integer {
        bit_width: i8,
        is_signed: bool,
    },
    Json,
    Bson,
    List,
    Map,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Millis,
    Micros,
    Nanos,
}
