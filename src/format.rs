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

//! Plain Rust mirrors of the Thrift structs the Parquet footer and page
//! headers are serialized as. Stands in for the `parquet-format` crate the
//! teacher depends on; decoded directly by `crate::thrift::compact` rather
//! than through generated Thrift bindings.

use crate::errors::{general_err, Result};
use crate::thrift::{CompactInputProtocol, FieldType};

#[derive(Debug, Clone)]
pub struct SchemaElement {
    pub type_: Option<i32>,
    pub type_length: Option<i32>,
    pub repetition_type: Option<i32>,
    pub name: String,
    pub num_children: Option<i32>,
    pub converted_type: Option<i32>,
    pub scale: Option<i32>,
    pub precision: Option<i32>,
    pub field_id: Option<i32>,
    pub logical_type: Option<LogicalType>,
}

#[derive(Debug, Clone)]
pub struct LogicalType {
    pub string: bool,
    pub map: bool,
    pub list: bool,
    pub enum_: bool,
    pub decimal: Option<(i32, i32)>, // (scale, precision)
    pub date: bool,
    pub time: Option<(bool, i32)>,      // (is_adjusted_to_utc, unit)
    pub timestamp: Option<(bool, i32)>, // (is_adjusted_to_utc, unit)
    pub integer: Option<(i8, bool)>,    // (bit_width, is_signed)
    pub unknown: bool,
    pub json: bool,
    pub bson: bool,
    pub uuid: bool,
}

impl Default for LogicalType {
    fn default() -> Self {
        LogicalType {
            string: false,
            map: false,
            list: false,
            enum_: false,
            decimal: None,
            date: false,
            time: None,
            timestamp: None,
            integer: None,
            unknown: false,
            json: false,
            bson: false,
            uuid: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeyValue {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub max: Option<Vec<u8>>,
    pub min: Option<Vec<u8>>,
    pub null_count: Option<i64>,
    pub distinct_count: Option<i64>,
    pub max_value: Option<Vec<u8>>,
    pub min_value: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct ColumnMetaData {
    pub type_: i32,
    pub encodings: Vec<i32>,
    pub path_in_schema: Vec<String>,
    pub codec: i32,
    pub num_values: i64,
    pub total_uncompressed_size: i64,
    pub total_compressed_size: i64,
    pub key_value_metadata: Option<Vec<KeyValue>>,
    pub data_page_offset: i64,
    pub index_page_offset: Option<i64>,
    pub dictionary_page_offset: Option<i64>,
    pub statistics: Option<Statistics>,
}

#[derive(Debug, Clone)]
pub struct ColumnChunk {
    pub file_path: Option<String>,
    pub file_offset: i64,
    pub meta_data: Option<ColumnMetaData>,
}

#[derive(Debug, Clone)]
pub struct RowGroup {
    pub columns: Vec<ColumnChunk>,
    pub total_byte_size: i64,
    pub num_rows: i64,
}

#[derive(Debug, Clone)]
pub struct FileMetaData {
    pub version: i32,
    pub schema: Vec<SchemaElement>,
    pub num_rows: i64,
    pub row_groups: Vec<RowGroup>,
    pub key_value_metadata: Option<Vec<KeyValue>>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DictionaryPageHeader {
    pub num_values: i32,
    pub encoding: i32,
    pub is_sorted: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct DataPageHeader {
    pub num_values: i32,
    pub encoding: i32,
    pub definition_level_encoding: i32,
    pub repetition_level_encoding: i32,
    pub statistics: Option<Statistics>,
}

#[derive(Debug, Clone, Default)]
pub struct DataPageHeaderV2 {
    pub num_values: i32,
    pub num_nulls: i32,
    pub num_rows: i32,
    pub encoding: i32,
    pub definition_levels_byte_length: i32,
    pub repetition_levels_byte_length: i32,
    pub is_compressed: Option<bool>,
    pub statistics: Option<Statistics>,
}

#[derive(Debug, Clone)]
pub struct PageHeader {
    pub type_: i32,
    pub uncompressed_page_size: i32,
    pub compressed_page_size: i32,
    pub dictionary_page_header: Option<DictionaryPageHeader>,
    pub data_page_header: Option<DataPageHeader>,
    pub data_page_header_v2: Option<DataPageHeaderV2>,
}

/// Reads a generic `Statistics` struct, tolerating unknown fields via
/// `skip_field`.
fn read_statistics(p: &mut CompactInputProtocol) -> Result<Statistics> {
    let mut s = Statistics::default();
    p.read_struct_begin();
    while let Some((ft, id)) = p.read_field_begin()? {
        match id {
            1 if ft == FieldType::Binary => s.max = Some(p.read_binary()?),
            2 if ft == FieldType::Binary => s.min = Some(p.read_binary()?),
            3 if ft == FieldType::I64 => s.null_count = Some(p.read_i64()?),
            4 if ft == FieldType::I64 => s.distinct_count = Some(p.read_i64()?),
            5 if ft == FieldType::Binary => s.max_value = Some(p.read_binary()?),
            6 if ft == FieldType::Binary => s.min_value = Some(p.read_binary()?),
            _ => p.skip_field(ft)?,
        }
    }
    p.read_struct_end();
    Ok(s)
}

fn read_key_value(p: &mut CompactInputProtocol) -> Result<KeyValue> {
    let mut kv = KeyValue::default();
    p.read_struct_begin();
    while let Some((ft, id)) = p.read_field_begin()? {
        match id {
            1 if ft == FieldType::Binary => kv.key = p.read_string()?,
            2 if ft == FieldType::Binary => kv.value = Some(p.read_string()?),
            _ => p.skip_field(ft)?,
        }
    }
    p.read_struct_end();
    Ok(kv)
}

fn read_logical_type(p: &mut CompactInputProtocol) -> Result<LogicalType> {
    // LogicalType is a Thrift "union": exactly one field is set, each a
    // nested (possibly empty) struct identifying the variant.
    let mut lt = LogicalType::default();
    p.read_struct_begin();
    while let Some((ft, id)) = p.read_field_begin()? {
        if ft != FieldType::Struct {
            p.skip_field(ft)?;
            continue;
        }
        match id {
            1 => {
                lt.string = true;
                skip_empty_struct(p)?;
            }
            2 => {
                lt.map = true;
                skip_empty_struct(p)?;
            }
            3 => {
                lt.list = true;
                skip_empty_struct(p)?;
            }
            4 => {
                lt.enum_ = true;
                skip_empty_struct(p)?;
            }
            5 => {
                lt.decimal = Some(read_decimal_type(p)?);
            }
            6 => {
                lt.date = true;
                skip_empty_struct(p)?;
            }
            7 => {
                lt.time = Some(read_time_type(p)?);
            }
            8 => {
                lt.timestamp = Some(read_time_type(p)?);
            }
            10 => {
                lt.integer = Some(read_int_type(p)?);
            }
            11 => {
                lt.json = true;
                skip_empty_struct(p)?;
            }
            12 => {
                lt.bson = true;
                skip_empty_struct(p)?;
            }
            13 => {
                lt.uuid = true;
                skip_empty_struct(p)?;
            }
            _ => {
                lt.unknown = true;
                p.skip_field(ft)?;
            }
        }
    }
    p.read_struct_end();
    Ok(lt)
}

fn skip_empty_struct(p: &mut CompactInputProtocol) -> Result<()> {
    p.read_struct_begin();
    while let Some((ft, _)) = p.read_field_begin()? {
        p.skip_field(ft)?;
    }
    p.read_struct_end();
    Ok(())
}

fn read_decimal_type(p: &mut CompactInputProtocol) -> Result<(i32, i32)> {
    let mut scale = 0;
    let mut precision = 0;
    p.read_struct_begin();
    while let Some((ft, id)) = p.read_field_begin()? {
        match id {
            1 => scale = p.read_i32()?,
            2 => precision = p.read_i32()?,
            _ => p.skip_field(ft)?,
        }
    }
    p.read_struct_end();
    Ok((scale, precision))
}

fn read_time_type(p: &mut CompactInputProtocol) -> Result<(bool, i32)> {
    let mut utc = true;
    let mut unit = 1; // MILLIS
    p.read_struct_begin();
    while let Some((ft, id)) = p.read_field_begin()? {
        match id {
            1 => utc = p.read_bool()?,
            2 => {
                // TimeUnit union: identify by the variant field id.
                p.read_struct_begin();
                while let Some((inner_ft, inner_id)) = p.read_field_begin()? {
                    unit = match inner_id {
                        1 => 1, // MILLIS
                        2 => 2, // MICROS
                        3 => 3, // NANOS
                        _ => unit,
                    };
                    p.skip_field(inner_ft)?;
                }
                p.read_struct_end();
            }
            _ => p.skip_field(ft)?,
        }
    }
    p.read_struct_end();
    Ok((utc, unit))
}

fn read_int_type(p: &mut CompactInputProtocol) -> Result<(i8, bool)> {
    let mut bit_width = 32i8;
    let mut is_signed = true;
    p.read_struct_begin();
    while let Some((ft, id)) = p.read_field_begin()? {
        match id {
            1 => bit_width = p.read_byte_value()?,
            2 => is_signed = p.read_bool()?,
            _ => p.skip_field(ft)?,
        }
    }
    p.read_struct_end();
    Ok((bit_width, is_signed))
}

impl<'a> CompactInputProtocol<'a> {
    fn read_byte_value(&mut self) -> Result<i8> {
        // Thrift `byte` fields are a raw signed byte, no varint encoding.
        let raw = self.read_raw_byte()?;
        Ok(raw as i8)
    }
}

pub(crate) fn read_schema_element(p: &mut CompactInputProtocol) -> Result<SchemaElement> {
    let mut s = SchemaElement {
        type_: None,
        type_length: None,
        repetition_type: None,
        name: String::new(),
        num_children: None,
        converted_type: None,
        scale: None,
        precision: None,
        field_id: None,
        logical_type: None,
    };
    p.read_struct_begin();
    while let Some((ft, id)) = p.read_field_begin()? {
        match id {
            1 => s.type_ = Some(p.read_i32()?),
            2 => s.type_length = Some(p.read_i32()?),
            3 => s.repetition_type = Some(p.read_i32()?),
            4 => s.name = p.read_string()?,
            5 => s.num_children = Some(p.read_i32()?),
            6 => s.converted_type = Some(p.read_i32()?),
            7 => s.scale = Some(p.read_i32()?),
            8 => s.precision = Some(p.read_i32()?),
            9 => s.field_id = Some(p.read_i32()?),
            10 if ft == FieldType::Struct => s.logical_type = Some(read_logical_type(p)?),
            _ => p.skip_field(ft)?,
        }
    }
    p.read_struct_end();
    Ok(s)
}

fn read_column_meta_data(p: &mut CompactInputProtocol) -> Result<ColumnMetaData> {
    let mut type_ = 0;
    let mut encodings = Vec::new();
    let mut path_in_schema = Vec::new();
    let mut codec = 0;
    let mut num_values = 0;
    let mut total_uncompressed_size = 0;
    let mut total_compressed_size = 0;
    let mut key_value_metadata = None;
    let mut data_page_offset = 0;
    let mut index_page_offset = None;
    let mut dictionary_page_offset = None;
    let mut statistics = None;

    p.read_struct_begin();
    while let Some((ft, id)) = p.read_field_begin()? {
        match id {
            1 => type_ = p.read_i32()?,
            2 => {
                let (elem, size) = p.read_list_begin()?;
                debug_assert_eq!(elem, FieldType::I32);
                for _ in 0..size {
                    encodings.push(p.read_i32()?);
                }
            }
            3 => {
                let (elem, size) = p.read_list_begin()?;
                debug_assert_eq!(elem, FieldType::Binary);
                for _ in 0..size {
                    path_in_schema.push(p.read_string()?);
                }
            }
            4 => codec = p.read_i32()?,
            5 => num_values = p.read_i64()?,
            6 => total_uncompressed_size = p.read_i64()?,
            7 => total_compressed_size = p.read_i64()?,
            8 => {
                let (_, size) = p.read_list_begin()?;
                let mut kvs = Vec::with_capacity(size);
                for _ in 0..size {
                    kvs.push(read_key_value(p)?);
                }
                key_value_metadata = Some(kvs);
            }
            9 => data_page_offset = p.read_i64()?,
            10 => index_page_offset = Some(p.read_i64()?),
            11 => dictionary_page_offset = Some(p.read_i64()?),
            12 if ft == FieldType::Struct => statistics = Some(read_statistics(p)?),
            _ => p.skip_field(ft)?,
        }
    }
    p.read_struct_end();

    Ok(ColumnMetaData {
        type_,
        encodings,
        path_in_schema,
        codec,
        num_values,
        total_uncompressed_size,
        total_compressed_size,
        key_value_metadata,
        data_page_offset,
        index_page_offset,
        dictionary_page_offset,
        statistics,
    })
}

fn read_column_chunk(p: &mut CompactInputProtocol) -> Result<ColumnChunk> {
    let mut file_path = None;
    let mut file_offset = 0;
    let mut meta_data = None;
    p.read_struct_begin();
    while let Some((ft, id)) = p.read_field_begin()? {
        match id {
            1 => file_path = Some(p.read_string()?),
            2 => file_offset = p.read_i64()?,
            3 if ft == FieldType::Struct => meta_data = Some(read_column_meta_data(p)?),
            _ => p.skip_field(ft)?,
        }
    }
    p.read_struct_end();
    Ok(ColumnChunk {
        file_path,
        file_offset,
        meta_data,
    })
}

fn read_row_group(p: &mut CompactInputProtocol) -> Result<RowGroup> {
    let mut columns = Vec::new();
    let mut total_byte_size = 0;
    let mut num_rows = 0;
    p.read_struct_begin();
    while let Some((ft, id)) = p.read_field_begin()? {
        match id {
            1 if ft == FieldType::List => {
                let (_, size) = p.read_list_begin()?;
                columns.reserve(size);
                for _ in 0..size {
                    columns.push(read_column_chunk(p)?);
                }
            }
            2 => total_byte_size = p.read_i64()?,
            3 => num_rows = p.read_i64()?,
            _ => p.skip_field(ft)?,
        }
    }
    p.read_struct_end();
    Ok(RowGroup {
        columns,
        total_byte_size,
        num_rows,
    })
}

pub(crate) fn read_file_metadata(p: &mut CompactInputProtocol) -> Result<FileMetaData> {
    let mut version = 0;
    let mut schema = Vec::new();
    let mut num_rows = 0;
    let mut row_groups = Vec::new();
    let mut key_value_metadata = None;
    let mut created_by = None;

    p.read_struct_begin();
    while let Some((ft, id)) = p.read_field_begin()? {
        match id {
            1 => version = p.read_i32()?,
            2 if ft == FieldType::List => {
                let (_, size) = p.read_list_begin()?;
                schema.reserve(size);
                for _ in 0..size {
                    schema.push(read_schema_element(p)?);
                }
            }
            3 => num_rows = p.read_i64()?,
            4 if ft == FieldType::List => {
                let (_, size) = p.read_list_begin()?;
                row_groups.reserve(size);
                for _ in 0..size {
                    row_groups.push(read_row_group(p)?);
                }
            }
            5 => {
                let (_, size) = p.read_list_begin()?;
                let mut kvs = Vec::with_capacity(size);
                for _ in 0..size {
                    kvs.push(read_key_value(p)?);
                }
                key_value_metadata = Some(kvs);
            }
            6 => created_by = Some(p.read_string()?),
            _ => p.skip_field(ft)?,
        }
    }
    p.read_struct_end();

    if schema.is_empty() {
        return Err(general_err!("file metadata has an empty schema"));
    }

    Ok(FileMetaData {
        version,
        schema,
        num_rows,
        row_groups,
        key_value_metadata,
        created_by,
    })
}

pub(crate) fn read_page_header(p: &mut CompactInputProtocol) -> Result<PageHeader> {
    let mut type_ = 0;
    let mut uncompressed_page_size = 0;
    let mut compressed_page_size = 0;
    let mut dictionary_page_header = None;
    let mut data_page_header = None;
    let mut data_page_header_v2 = None;

    p.read_struct_begin();
    while let Some((ft, id)) = p.read_field_begin()? {
        match id {
            1 => type_ = p.read_i32()?,
            2 => uncompressed_page_size = p.read_i32()?,
            3 => compressed_page_size = p.read_i32()?,
            5 if ft == FieldType::Struct => {
                data_page_header = Some(read_data_page_header(p)?)
            }
            7 if ft == FieldType::Struct => {
                dictionary_page_header = Some(read_dictionary_page_header(p)?)
            }
            8 if ft == FieldType::Struct => {
                data_page_header_v2 = Some(read_data_page_header_v2(p)?)
            }
            _ => p.skip_field(ft)?,
        }
    }
    p.read_struct_end();

    Ok(PageHeader {
        type_,
        uncompressed_page_size,
        compressed_page_size,
        dictionary_page_header,
        data_page_header,
        data_page_header_v2,
    })
}

fn read_dictionary_page_header(p: &mut CompactInputProtocol) -> Result<DictionaryPageHeader> {
    let mut h = DictionaryPageHeader::default();
    p.read_struct_begin();
    while let Some((ft, id)) = p.read_field_begin()? {
        match id {
            1 => h.num_values = p.read_i32()?,
            2 => h.encoding = p.read_i32()?,
            3 => h.is_sorted = Some(p.read_bool()?),
            _ => p.skip_field(ft)?,
        }
    }
    p.read_struct_end();
    Ok(h)
}

fn read_data_page_header(p: &mut CompactInputProtocol) -> Result<DataPageHeader> {
    let mut h = DataPageHeader::default();
    p.read_struct_begin();
    while let Some((ft, id)) = p.read_field_begin()? {
        match id {
            1 => h.num_values = p.read_i32()?,
            2 => h.encoding = p.read_i32()?,
            3 => h.definition_level_encoding = p.read_i32()?,
            4 => h.repetition_level_encoding = p.read_i32()?,
            5 if ft == FieldType::Struct => h.statistics = Some(read_statistics(p)?),
            _ => p.skip_field(ft)?,
        }
    }
    p.read_struct_end();
    Ok(h)
}

fn read_data_page_header_v2(p: &mut CompactInputProtocol) -> Result<DataPageHeaderV2> {
    let mut h = DataPageHeaderV2::default();
    p.read_struct_begin();
    while let Some((ft, id)) = p.read_field_begin()? {
        match id {
            1 => h.num_values = p.read_i32()?,
            2 => h.num_nulls = p.read_i32()?,
            3 => h.num_rows = p.read_i32()?,
            4 => h.encoding = p.read_i32()?,
            5 => h.definition_levels_byte_length = p.read_i32()?,
            6 => h.repetition_levels_byte_length = p.read_i32()?,
            7 => h.is_compressed = Some(p.read_bool()?),
            8 if ft == FieldType::Struct => h.statistics = Some(read_statistics(p)?),
            _ => p.skip_field(ft)?,
        }
    }
    p.read_struct_end();
    Ok(h)
}
