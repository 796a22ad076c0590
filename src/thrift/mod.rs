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

//! A from-scratch Thrift Compact Protocol reader.
//!
//! The upstream crate this workspace descends from reads footers and page
//! headers via the `thrift` crate plus a code-generated `parquet-format`
//! schema crate. Neither is available here, so this module implements the
//! Compact Protocol directly over a byte cursor, closely enough to the wire
//! format that it stays interchangeable with those two crates' behavior.

pub mod compact;

pub use compact::CompactInputProtocol;

/// Thrift compact-protocol type tags, as they appear in field headers and
/// list/set/map element headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Stop,
    BoolTrue,
    BoolFalse,
    Byte,
    I16,
    I32,
    I64,
    Double,
    Binary,
    List,
    Set,
    Map,
    Struct,
}

impl FieldType {
    pub fn from_compact_id(id: u8) -> Option<Self> {
        Some(match id {
            0x00 => FieldType::Stop,
            0x01 => FieldType::BoolTrue,
            0x02 => FieldType::BoolFalse,
            0x03 => FieldType::Byte,
            0x04 => FieldType::I16,
            0x05 => FieldType::I32,
            0x06 => FieldType::I64,
            0x07 => FieldType::Double,
            0x08 => FieldType::Binary,
            0x09 => FieldType::List,
            0x0a => FieldType::Set,
            0x0b => FieldType::Map,
            0x0c => FieldType::Struct,
            _ => return None,
        })
    }

    /// Type id as used in list/set/map element headers, where booleans do
    /// not get the true/false split they get in field headers.
    pub fn from_element_id(id: u8) -> Option<Self> {
        Some(match id {
            0x01 => FieldType::BoolTrue,
            other => return Self::from_compact_id(other),
        })
    }
}
