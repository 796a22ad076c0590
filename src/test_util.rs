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

//! Test-only helpers for building synthetic Thrift Compact Protocol bytes.
//!
//! This workspace has no bundled `.parquet` fixtures to read, so every test
//! that needs footer or page bytes builds them by hand with this minimal
//! encoder instead. Never compiled into the published library.

#![cfg(test)]

/// A minimal Thrift Compact Protocol writer, the mirror image of
/// `crate::thrift::compact::CompactInputProtocol`, used only to manufacture
/// test fixtures.
#[derive(Default)]
pub(crate) struct CompactOutputProtocol {
    buf: Vec<u8>,
    last_field_id_stack: Vec<i16>,
    last_field_id: i16,
}

impl CompactOutputProtocol {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_varint_u64(&mut self, mut value: u64) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                break;
            } else {
                self.buf.push(byte | 0x80);
            }
        }
    }

    fn write_zigzag_i64(&mut self, value: i64) {
        let zigzag = ((value << 1) ^ (value >> 63)) as u64;
        self.write_varint_u64(zigzag);
    }

    pub(crate) fn write_struct_begin(&mut self) {
        self.last_field_id_stack.push(self.last_field_id);
        self.last_field_id = 0;
    }

    pub(crate) fn write_struct_end(&mut self) {
        self.buf.push(0x00); // STOP
        self.last_field_id = self.last_field_id_stack.pop().unwrap();
    }

    /// Writes a field header for a non-bool field (short form only, good
    /// enough for fixtures where ids always increase and stay within 15).
    pub(crate) fn write_field_header(&mut self, type_id: u8, field_id: i16) {
        let delta = field_id - self.last_field_id;
        assert!((1..=15).contains(&delta), "fixture field id delta out of short-form range");
        self.buf.push(((delta as u8) << 4) | type_id);
        self.last_field_id = field_id;
    }

    pub(crate) fn write_bool_field(&mut self, field_id: i16, value: bool) {
        let delta = field_id - self.last_field_id;
        assert!((1..=15).contains(&delta));
        let type_id = if value { 0x01 } else { 0x02 };
        self.buf.push(((delta as u8) << 4) | type_id);
        self.last_field_id = field_id;
    }

    pub(crate) fn write_i32(&mut self, value: i32) {
        self.write_zigzag_i64(value as i64);
    }

    pub(crate) fn write_i64(&mut self, value: i64) {
        self.write_zigzag_i64(value);
    }

    pub(crate) fn write_binary(&mut self, bytes: &[u8]) {
        self.write_varint_u64(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn write_string(&mut self, s: &str) {
        self.write_binary(s.as_bytes());
    }

    pub(crate) fn write_list_header(&mut self, elem_type_id: u8, size: usize) {
        if size < 15 {
            self.buf.push(((size as u8) << 4) | elem_type_id);
        } else {
            self.buf.push(0xf0 | elem_type_id);
            self.write_varint_u64(size as u64);
        }
    }
}

// Thrift compact type ids used by the fixtures below.
pub(crate) const T_I32: u8 = 0x05;
pub(crate) const T_I64: u8 = 0x06;
pub(crate) const T_BINARY: u8 = 0x08;
pub(crate) const T_LIST: u8 = 0x09;
pub(crate) const T_STRUCT: u8 = 0x0c;

fn write_schema_element(
    p: &mut CompactOutputProtocol,
    name: &str,
    type_code: Option<i32>,
    repetition: Option<i32>,
    num_children: Option<i32>,
) {
    p.write_struct_begin();
    let mut id = 0;
    if let Some(t) = type_code {
        id += 1;
        p.write_field_header(T_I32, id);
        p.write_i32(t);
    }
    if let Some(r) = repetition {
        id = 3;
        p.write_field_header(T_I32, id);
        p.write_i32(r);
    }
    id = 4;
    p.write_field_header(T_BINARY, id);
    p.write_string(name);
    if let Some(n) = num_children {
        id = 5;
        p.write_field_header(T_I32, id);
        p.write_i32(n);
    }
    p.write_struct_end();
}

fn write_column_chunk(
    p: &mut CompactOutputProtocol,
    path: &str,
    physical_type: i32,
    num_values: i64,
    uncompressed_size: i64,
    compressed_size: i64,
    data_page_offset: i64,
) {
    p.write_struct_begin();
    // ColumnChunk.file_offset (field 2)
    p.write_field_header(T_I64, 2);
    p.write_i64(data_page_offset);
    // ColumnChunk.meta_data (field 3, struct)
    p.write_field_header(T_STRUCT, 3);
    {
        p.write_struct_begin();
        p.write_field_header(T_I32, 1); // type
        p.write_i32(physical_type);
        p.write_field_header(T_LIST, 2); // encodings
        p.write_list_header(T_I32, 1);
        p.write_i32(0); // PLAIN
        p.write_field_header(T_LIST, 3); // path_in_schema
        p.write_list_header(T_BINARY, 1);
        p.write_string(path);
        p.write_field_header(T_I32, 4); // codec
        p.write_i32(0); // UNCOMPRESSED
        p.write_field_header(T_I64, 5); // num_values
        p.write_i64(num_values);
        p.write_field_header(T_I64, 6); // total_uncompressed_size
        p.write_i64(uncompressed_size);
        p.write_field_header(T_I64, 7); // total_compressed_size
        p.write_i64(compressed_size);
        p.write_field_header(T_I64, 9); // data_page_offset
        p.write_i64(data_page_offset);
        p.write_struct_end();
    }
    p.write_struct_end();
}

/// Builds the Thrift-encoded `FileMetaData` bytes for:
/// `message schema { required int64 id; required int64 value; }`
/// with one row group of 3 rows, matching spec.md §8 scenario 1.
pub(crate) fn write_thrift_file_metadata() -> Vec<u8> {
    let mut p = CompactOutputProtocol::new();
    p.write_struct_begin();
    p.write_field_header(T_I32, 1); // version
    p.write_i32(1);

    p.write_field_header(T_LIST, 2); // schema
    p.write_list_header(T_STRUCT, 3);
    write_schema_element(&mut p, "schema", None, None, Some(2));
    write_schema_element(&mut p, "id", Some(2), Some(0), None);
    write_schema_element(&mut p, "value", Some(2), Some(0), None);

    p.write_field_header(T_I64, 3); // num_rows
    p.write_i64(3);

    p.write_field_header(T_LIST, 4); // row_groups
    p.write_list_header(T_STRUCT, 1);
    {
        p.write_struct_begin();
        p.write_field_header(T_LIST, 1); // columns
        p.write_list_header(T_STRUCT, 2);
        write_column_chunk(&mut p, "id", 2, 3, 24, 24, 4);
        write_column_chunk(&mut p, "value", 2, 3, 24, 24, 28);
        p.write_field_header(T_I64, 2); // total_byte_size
        p.write_i64(48);
        p.write_field_header(T_I64, 3); // num_rows
        p.write_i64(3);
        p.write_struct_end();
    }

    p.write_struct_end();
    p.into_bytes()
}

/// Thrift-encodes a `PageHeader` for a PLAIN data page (v1) with the given
/// value count and compressed/uncompressed sizes.
pub(crate) fn write_data_page_v1_header(
    num_values: i32,
    uncompressed_size: i32,
    compressed_size: i32,
    encoding: i32,
) -> Vec<u8> {
    let mut p = CompactOutputProtocol::new();
    p.write_struct_begin();
    p.write_field_header(T_I32, 1); // type = DATA_PAGE
    p.write_i32(0);
    p.write_field_header(T_I32, 2);
    p.write_i32(uncompressed_size);
    p.write_field_header(T_I32, 3);
    p.write_i32(compressed_size);
    p.write_field_header(T_STRUCT, 5); // data_page_header
    {
        p.write_struct_begin();
        p.write_field_header(T_I32, 1); // num_values
        p.write_i32(num_values);
        p.write_field_header(T_I32, 2); // encoding
        p.write_i32(encoding);
        p.write_field_header(T_I32, 3); // def_level_encoding
        p.write_i32(3); // RLE
        p.write_field_header(T_I32, 4); // rep_level_encoding
        p.write_i32(3); // RLE
        p.write_struct_end();
    }
    p.write_struct_end();
    p.into_bytes()
}

/// Thrift-encodes a `PageHeader` for a PLAIN-encoded dictionary page.
pub(crate) fn write_dictionary_page_header(
    num_values: i32,
    uncompressed_size: i32,
    compressed_size: i32,
) -> Vec<u8> {
    let mut p = CompactOutputProtocol::new();
    p.write_struct_begin();
    p.write_field_header(T_I32, 1); // type = DICTIONARY_PAGE
    p.write_i32(2);
    p.write_field_header(T_I32, 2);
    p.write_i32(uncompressed_size);
    p.write_field_header(T_I32, 3);
    p.write_i32(compressed_size);
    p.write_field_header(T_STRUCT, 7); // dictionary_page_header
    {
        p.write_struct_begin();
        p.write_field_header(T_I32, 1); // num_values
        p.write_i32(num_values);
        p.write_field_header(T_I32, 2); // encoding = PLAIN
        p.write_i32(0);
        p.write_struct_end();
    }
    p.write_struct_end();
    p.into_bytes()
}

/// Builds a complete, self-consistent single-row-group file with two
/// required INT64 columns ("id", "value"), each one uncompressed PLAIN data
/// page. Unlike `write_thrift_file_metadata`, every offset the footer
/// declares points at real page bytes within the returned file, so it can
/// drive a full row read end to end.
pub(crate) fn write_two_long_column_file(id_values: &[i64], value_values: &[i64]) -> Vec<u8> {
    assert_eq!(id_values.len(), value_values.len());
    let num_rows = id_values.len() as i64;

    fn page_bytes(values: &[i64]) -> Vec<u8> {
        let mut body = Vec::new();
        for v in values {
            body.extend_from_slice(&v.to_le_bytes());
        }
        let header = write_data_page_v1_header(values.len() as i32, body.len() as i32, body.len() as i32, 0);
        let mut out = header;
        out.extend_from_slice(&body);
        out
    }

    let id_page = page_bytes(id_values);
    let value_page = page_bytes(value_values);

    let mut file = Vec::new();
    file.extend_from_slice(b"PAR1");
    let id_offset = file.len() as i64;
    file.extend_from_slice(&id_page);
    let value_offset = file.len() as i64;
    file.extend_from_slice(&value_page);

    let mut p = CompactOutputProtocol::new();
    p.write_struct_begin();
    p.write_field_header(T_I32, 1); // version
    p.write_i32(1);
    p.write_field_header(T_LIST, 2); // schema
    p.write_list_header(T_STRUCT, 3);
    write_schema_element(&mut p, "schema", None, None, Some(2));
    write_schema_element(&mut p, "id", Some(2), Some(0), None);
    write_schema_element(&mut p, "value", Some(2), Some(0), None);
    p.write_field_header(T_I64, 3); // num_rows
    p.write_i64(num_rows);
    p.write_field_header(T_LIST, 4); // row_groups
    p.write_list_header(T_STRUCT, 1);
    {
        p.write_struct_begin();
        p.write_field_header(T_LIST, 1); // columns
        p.write_list_header(T_STRUCT, 2);
        write_column_chunk(&mut p, "id", 2, num_rows, id_page.len() as i64, id_page.len() as i64, id_offset);
        write_column_chunk(
            &mut p,
            "value",
            2,
            num_rows,
            value_page.len() as i64,
            value_page.len() as i64,
            value_offset,
        );
        p.write_field_header(T_I64, 2); // total_byte_size
        p.write_i64((id_page.len() + value_page.len()) as i64);
        p.write_field_header(T_I64, 3); // num_rows
        p.write_i64(num_rows);
        p.write_struct_end();
    }
    p.write_struct_end();
    let footer = p.into_bytes();

    file.extend_from_slice(&footer);
    file.extend_from_slice(&(footer.len() as u32).to_le_bytes());
    file.extend_from_slice(b"PAR1");
    file
}
