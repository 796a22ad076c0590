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

//! Record assembly: rebuilding nested rows from flat leaf-column streams by
//! the inverse of Dremel's shredding, as spec.md §4.7 describes.
//!
//! [`build_row_schema`] walks a projected [`SchemaDescriptor`] once into a
//! tree of [`FieldDescriptor`]s carrying the def/rep-level thresholds each
//! field needs at assembly time; [`reader::RecordAssembler`] then walks that
//! tree once per row against the projected leaves' decoded batches.

pub mod reader;

use crate::errors::{general_err, Result};
use crate::schema::{Projection, SchemaDescriptor, Type as SchemaType};
use bytes::Bytes;
use std::sync::Arc;

/// One assembled value. Logical-type interpretation (turning a `Bytes` into
/// a UTF-8 `String`, an `i32` into a calendar date, and so on) is left to
/// [`crate::logical`]; this is the raw physical shape spec.md §1 scopes the
/// assembler to.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Bytes),
    Struct(Vec<(String, Field)>),
    List(Option<Vec<Field>>),
    Map(Option<Vec<(Field, Field)>>),
}

impl Field {
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }
}

/// One assembled row: a named, ordered list of top-level field values, plus
/// the logical-type metadata needed to convert each primitive leaf on
/// demand (spec.md §6's `date`/`time`/`timestamp`/`decimal`/`uuid`
/// getters). `logical[i]` is `None` for struct/list/map fields, whose own
/// `get_struct`/`get_list`/`get_map` never convert values.
#[derive(Debug, Clone)]
pub struct Row {
    fields: Vec<(String, Field)>,
    logical: Vec<Option<LeafLogical>>,
}

impl Row {
    pub fn new(fields: Vec<(String, Field)>, logical: Vec<Option<LeafLogical>>) -> Self {
        Row { fields, logical }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field_name(&self, i: usize) -> &str {
        &self.fields[i].0
    }

    /// The index of the top-level field with this name, for callers that
    /// prefer spec.md §6's by-name getters over a projected index.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(n, _)| n == name)
    }

    pub fn is_null(&self, i: usize) -> bool {
        self.fields[i].1.is_null()
    }

    pub fn get_field(&self, i: usize) -> &Field {
        &self.fields[i].1
    }

    pub fn fields(&self) -> &[(String, Field)] {
        &self.fields
    }

    pub fn get_bool(&self, i: usize) -> Result<bool> {
        match &self.fields[i].1 {
            Field::Bool(v) => Ok(*v),
            other => Err(general_err!("field {} is not a bool: {:?}", i, other)),
        }
    }

    pub fn get_int(&self, i: usize) -> Result<i32> {
        match &self.fields[i].1 {
            Field::Int(v) => Ok(*v),
            other => Err(general_err!("field {} is not an int: {:?}", i, other)),
        }
    }

    pub fn get_long(&self, i: usize) -> Result<i64> {
        match &self.fields[i].1 {
            Field::Long(v) => Ok(*v),
            other => Err(general_err!("field {} is not a long: {:?}", i, other)),
        }
    }

    pub fn get_float(&self, i: usize) -> Result<f32> {
        match &self.fields[i].1 {
            Field::Float(v) => Ok(*v),
            other => Err(general_err!("field {} is not a float: {:?}", i, other)),
        }
    }

    pub fn get_double(&self, i: usize) -> Result<f64> {
        match &self.fields[i].1 {
            Field::Double(v) => Ok(*v),
            other => Err(general_err!("field {} is not a double: {:?}", i, other)),
        }
    }

    /// A reference-typed getter: returns `Ok(None)` for a null field rather
    /// than erroring, per spec.md §8's null-accessor contract.
    pub fn get_bytes(&self, i: usize) -> Result<Option<&Bytes>> {
        match &self.fields[i].1 {
            Field::Bytes(v) => Ok(Some(v)),
            Field::Null => Ok(None),
            other => Err(general_err!("field {} is not a byte array: {:?}", i, other)),
        }
    }

    pub fn get_struct(&self, i: usize) -> Result<Option<&[(String, Field)]>> {
        match &self.fields[i].1 {
            Field::Struct(v) => Ok(Some(v)),
            Field::Null => Ok(None),
            other => Err(general_err!("field {} is not a struct: {:?}", i, other)),
        }
    }

    pub fn get_list(&self, i: usize) -> Result<Option<&[Field]>> {
        match &self.fields[i].1 {
            Field::List(v) => Ok(v.as_deref()),
            other => Err(general_err!("field {} is not a list: {:?}", i, other)),
        }
    }

    pub fn get_map(&self, i: usize) -> Result<Option<&[(Field, Field)]>> {
        match &self.fields[i].1 {
            Field::Map(v) => Ok(v.as_deref()),
            other => Err(general_err!("field {} is not a map: {:?}", i, other)),
        }
    }

    /// `STRING`/`ENUM`/`JSON`-annotated `BYTE_ARRAY` fields decoded as UTF-8.
    pub fn get_string(&self, i: usize) -> Result<Option<String>> {
        match self.get_bytes(i)? {
            Some(b) => crate::logical::decode_string(b).map(Some),
            None => Ok(None),
        }
    }

    /// `DATE`-annotated `INT32` fields: days since the Unix epoch.
    pub fn get_date(&self, i: usize) -> Result<Option<chrono::NaiveDate>> {
        match &self.fields[i].1 {
            Field::Null => Ok(None),
            Field::Int(v) => Ok(Some(crate::logical::decode_date(*v))),
            other => Err(general_err!("field {} is not a DATE-annotated int: {:?}", i, other)),
        }
    }

    /// `TIME`-annotated `INT32` (millisecond) or `INT64` (microsecond)
    /// fields. `TimeType` has no nanosecond variant in the Parquet spec, so
    /// an `INT64` leaf is always microseconds here.
    pub fn get_time(&self, i: usize) -> Result<Option<chrono::NaiveTime>> {
        match &self.fields[i].1 {
            Field::Null => Ok(None),
            Field::Int(v) => Ok(Some(crate::logical::decode_time_millis(*v))),
            Field::Long(v) => Ok(Some(crate::logical::decode_time_micros(*v))),
            other => Err(general_err!("field {} is not a TIME-annotated value: {:?}", i, other)),
        }
    }

    /// `TIMESTAMP`-annotated `INT64` fields, per the leaf's declared unit.
    pub fn get_timestamp(&self, i: usize) -> Result<Option<chrono::NaiveDateTime>> {
        let unit = self.time_unit(i)?;
        match &self.fields[i].1 {
            Field::Null => Ok(None),
            Field::Long(v) => Ok(Some(crate::logical::decode_timestamp(*v, unit))),
            other => Err(general_err!("field {} is not a TIMESTAMP-annotated long: {:?}", i, other)),
        }
    }

    /// `DECIMAL`-annotated `INT32`/`INT64`/`BYTE_ARRAY`/`FIXED_LEN_BYTE_ARRAY`
    /// fields, using the leaf's declared scale.
    pub fn get_decimal(&self, i: usize) -> Result<Option<crate::logical::Decimal>> {
        let scale = self.decimal_scale(i);
        match &self.fields[i].1 {
            Field::Null => Ok(None),
            Field::Int(v) => Ok(Some(crate::logical::decode_decimal_from_i64(*v as i64, scale))),
            Field::Long(v) => Ok(Some(crate::logical::decode_decimal_from_i64(*v, scale))),
            Field::Bytes(b) => Ok(Some(crate::logical::decode_decimal_from_bytes(b, scale))),
            other => Err(general_err!("field {} is not a DECIMAL-annotated value: {:?}", i, other)),
        }
    }

    /// `UUID`-annotated 16-byte `FIXED_LEN_BYTE_ARRAY` fields, hyphenated.
    pub fn get_uuid(&self, i: usize) -> Result<Option<String>> {
        match &self.fields[i].1 {
            Field::Null => Ok(None),
            Field::Bytes(b) => {
                let arr: [u8; 16] = b.as_ref().try_into().map_err(|_| {
                    general_err!("field {} is not a 16-byte UUID value (got {} bytes)", i, b.len())
                })?;
                Ok(Some(crate::logical::decode_uuid(&arr)))
            }
            other => Err(general_err!("field {} is not a UUID-annotated value: {:?}", i, other)),
        }
    }

    /// The leaf's declared time unit, preferring the modern `LogicalType`
    /// annotation and falling back to the legacy `ConvertedType` variants
    /// (`TIME_MICROS`/`TIMESTAMP_MICROS` vs. the `_MILLIS` pair) when only
    /// that's present.
    fn time_unit(&self, i: usize) -> Result<crate::basic::TimeUnit> {
        use crate::basic::{ConvertedType, LogicalType, TimeUnit};
        let Some(leaf) = self.logical.get(i).and_then(|l| l.as_ref()) else {
            return Ok(TimeUnit::Millis);
        };
        Ok(match &leaf.logical_type {
            Some(LogicalType::Time { unit, .. }) => *unit,
            Some(LogicalType::Timestamp { unit, .. }) => *unit,
            _ => match leaf.converted_type {
                ConvertedType::TIME_MICROS | ConvertedType::TIMESTAMP_MICROS => TimeUnit::Micros,
                _ => TimeUnit::Millis,
            },
        })
    }

    fn decimal_scale(&self, i: usize) -> i32 {
        match self.logical.get(i).and_then(|l| l.as_ref()) {
            Some(LeafLogical {
                logical_type: Some(crate::basic::LogicalType::Decimal { scale, .. }),
                ..
            }) => *scale,
            Some(l) => l.scale,
            None => 0,
        }
    }
}

/// The logical-type metadata a leaf carries, threaded through to [`Row`] so
/// its typed getters (spec.md §6: `date`/`time`/`timestamp`/`decimal`/`uuid`)
/// can call into [`crate::logical`] without the assembler itself becoming
/// logical-type-aware (spec.md §1 keeps that conversion a separate
/// collaborator).
#[derive(Debug, Clone)]
pub struct LeafLogical {
    pub converted_type: crate::basic::ConvertedType,
    pub logical_type: Option<crate::basic::LogicalType>,
    pub scale: i32,
    pub precision: i32,
}

/// A projected leaf column reference: which entry of the per-row assembler's
/// cursor slice (itself in projected-leaf order) carries this field's
/// values.
#[derive(Debug, Clone)]
pub struct PrimitiveDescriptor {
    pub name: String,
    pub leaf_index: usize,
    pub logical: LeafLogical,
}

#[derive(Debug, Clone)]
pub struct StructDescriptor {
    pub name: String,
    /// Def level at which this group itself is present (as opposed to null).
    pub self_def_level: i16,
    pub driving_leaf: usize,
    pub children: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone)]
pub struct ListDescriptor {
    pub name: String,
    pub element: Box<FieldDescriptor>,
    /// Def level at/below which the list container itself is null or
    /// (exactly at this level) present-but-empty.
    pub null_def_level: i16,
    /// Rep level marking "another sibling element at this list's own
    /// nesting depth" (the count of REPEATED ancestors through and
    /// including this list's own repeated group).
    pub depth: i16,
    pub driving_leaf: usize,
}

#[derive(Debug, Clone)]
pub struct MapDescriptor {
    pub name: String,
    pub key: Box<FieldDescriptor>,
    pub value: Box<FieldDescriptor>,
    pub null_def_level: i16,
    pub depth: i16,
    pub driving_leaf: usize,
}

#[derive(Debug, Clone)]
pub enum FieldDescriptor {
    Primitive(PrimitiveDescriptor),
    Struct(StructDescriptor),
    List(ListDescriptor),
    Map(MapDescriptor),
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        match self {
            FieldDescriptor::Primitive(p) => &p.name,
            FieldDescriptor::Struct(s) => &s.name,
            FieldDescriptor::List(l) => &l.name,
            FieldDescriptor::Map(m) => &m.name,
        }
    }

    /// The logical-type metadata backing this field, when it's a leaf
    /// primitive directly (as opposed to a struct/list/map, whose own
    /// `get_struct`/`get_list`/`get_map` accessors don't convert values).
    pub fn leaf_logical(&self) -> Option<&LeafLogical> {
        match self {
            FieldDescriptor::Primitive(p) => Some(&p.logical),
            _ => None,
        }
    }

    /// The leftmost leaf reachable under this field, used as the
    /// "driving leaf" whose def/rep levels decide a container's
    /// null/empty/present state (valid because every leaf beneath a shared
    /// ancestor sees identical def/rep contributions from that ancestor).
    fn leftmost_leaf(&self) -> usize {
        match self {
            FieldDescriptor::Primitive(p) => p.leaf_index,
            FieldDescriptor::Struct(s) => s.driving_leaf,
            FieldDescriptor::List(l) => l.driving_leaf,
            FieldDescriptor::Map(m) => m.driving_leaf,
        }
    }
}

/// Builds the field-descriptor tree for every top-level field the
/// projection kept, in projected-leaf order.
pub fn build_row_schema(schema: &SchemaDescriptor, projection: &Projection) -> Result<Vec<FieldDescriptor>> {
    let top_fields = schema.root().fields();
    let mut leaf_offsets = Vec::with_capacity(top_fields.len());
    let mut running = 0usize;
    for f in top_fields {
        leaf_offsets.push(running);
        running += count_leaves(f);
    }

    projection
        .kept_field_indices()
        .iter()
        .map(|&idx| {
            let mut cursor = leaf_offsets[idx];
            build_node(&top_fields[idx], 0, 0, &mut cursor, projection)
        })
        .collect()
}

fn count_leaves(node: &Arc<SchemaType>) -> usize {
    match node.as_ref() {
        SchemaType::Primitive { .. } => 1,
        SchemaType::Group { fields, .. } => fields.iter().map(count_leaves).sum(),
    }
}

fn build_node(
    node: &Arc<SchemaType>,
    cum_def: i16,
    cum_rep: i16,
    original_leaf: &mut usize,
    projection: &Projection,
) -> Result<FieldDescriptor> {
    match node.as_ref() {
        SchemaType::Primitive {
            name,
            repetition,
            converted_type,
            logical_type,
            scale,
            precision,
            ..
        } => {
            let orig = *original_leaf;
            *original_leaf += 1;
            let _ = (cum_def, cum_rep, repetition);
            let leaf_index = projection.projected_index(orig).ok_or_else(|| {
                general_err!("leaf {} under a projected field was unexpectedly dropped", orig)
            })?;
            Ok(FieldDescriptor::Primitive(PrimitiveDescriptor {
                name: name.clone(),
                leaf_index,
                logical: LeafLogical {
                    converted_type: *converted_type,
                    logical_type: logical_type.clone(),
                    scale: *scale,
                    precision: *precision,
                },
            }))
        }
        SchemaType::Group {
            name,
            repetition,
            is_list,
            is_map,
            fields,
            ..
        } => {
            let def_add = repetition.map(|r| r != crate::basic::Repetition::REQUIRED).unwrap_or(false);
            let rep_add = *repetition == Some(crate::basic::Repetition::REPEATED);
            let new_def = cum_def + if def_add { 1 } else { 0 };
            let new_rep = cum_rep + if rep_add { 1 } else { 0 };

            if *is_list {
                let repeated_group = fields.first().ok_or_else(|| general_err!("LIST group '{name}' has no repeated child"))?;
                let element_node = repeated_group
                    .fields()
                    .first()
                    .ok_or_else(|| general_err!("LIST group '{name}' repeated child has no element"))?;
                let null_def_level = new_def;
                let depth = new_rep + 1;
                let element = build_node(element_node, null_def_level + 1, depth, original_leaf, projection)?;
                let driving_leaf = element.leftmost_leaf();
                Ok(FieldDescriptor::List(ListDescriptor {
                    name: name.clone(),
                    element: Box::new(element),
                    null_def_level,
                    depth,
                    driving_leaf,
                }))
            } else if *is_map {
                let repeated_group = fields.first().ok_or_else(|| general_err!("MAP group '{name}' has no repeated child"))?;
                let kv_fields = repeated_group.fields();
                let key_node = kv_fields
                    .first()
                    .ok_or_else(|| general_err!("MAP group '{name}' key_value child has no key"))?;
                let value_node = kv_fields
                    .get(1)
                    .ok_or_else(|| general_err!("MAP group '{name}' key_value child has no value"))?;
                let null_def_level = new_def;
                let depth = new_rep + 1;
                let key = build_node(key_node, null_def_level + 1, depth, original_leaf, projection)?;
                let value = build_node(value_node, null_def_level + 1, depth, original_leaf, projection)?;
                let driving_leaf = key.leftmost_leaf();
                Ok(FieldDescriptor::Map(MapDescriptor {
                    name: name.clone(),
                    key: Box::new(key),
                    value: Box::new(value),
                    null_def_level,
                    depth,
                    driving_leaf,
                }))
            } else {
                let mut children = Vec::with_capacity(fields.len());
                for f in fields {
                    children.push(build_node(f, new_def, new_rep, original_leaf, projection)?);
                }
                let driving_leaf = children
                    .first()
                    .ok_or_else(|| general_err!("group '{name}' has no fields"))?
                    .leftmost_leaf();
                Ok(FieldDescriptor::Struct(StructDescriptor {
                    name: name.clone(),
                    self_def_level: new_def,
                    driving_leaf,
                    children,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SchemaElement;

    fn elem(
        name: &str,
        type_: Option<i32>,
        rep: Option<i32>,
        num_children: Option<i32>,
        converted: Option<i32>,
    ) -> SchemaElement {
        SchemaElement {
            type_,
            type_length: None,
            repetition_type: rep,
            name: name.to_string(),
            num_children,
            converted_type: converted,
            scale: None,
            precision: None,
            field_id: None,
            logical_type: None,
        }
    }

    #[test]
    fn flat_schema_descriptors_are_primitives() {
        let elements = vec![
            elem("schema", None, None, Some(2), None),
            elem("id", Some(2), Some(0), None, None),
            elem("name", Some(6), Some(1), None, Some(0)),
        ];
        let schema = crate::schema::schema_from_elements(&elements).unwrap();
        let projection = schema.project(None).unwrap();
        let descriptors = build_row_schema(&schema, &projection).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert!(matches!(descriptors[0], FieldDescriptor::Primitive(_)));
        assert_eq!(descriptors[0].name(), "id");
        assert_eq!(descriptors[1].name(), "name");
    }

    #[test]
    fn nested_struct_descriptor_tracks_self_def_level() {
        let elements = vec![
            elem("schema", None, None, Some(2), None),
            elem("id", Some(1), Some(0), None, None),
            elem("address", None, Some(1), Some(1), None),
            elem("street", Some(6), Some(0), None, Some(0)),
        ];
        let schema = crate::schema::schema_from_elements(&elements).unwrap();
        let projection = schema.project(None).unwrap();
        let descriptors = build_row_schema(&schema, &projection).unwrap();
        match &descriptors[1] {
            FieldDescriptor::Struct(s) => {
                assert_eq!(s.self_def_level, 1);
                assert_eq!(s.children.len(), 1);
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn list_descriptor_tracks_null_and_depth() {
        let elements = vec![
            elem("schema", None, None, Some(1), None),
            elem("tags", None, Some(1), Some(1), Some(3)), // LIST
            elem("list", None, Some(2), Some(1), None),
            elem("element", Some(6), Some(0), None, Some(0)),
        ];
        let schema = crate::schema::schema_from_elements(&elements).unwrap();
        let projection = schema.project(None).unwrap();
        let descriptors = build_row_schema(&schema, &projection).unwrap();
        match &descriptors[0] {
            FieldDescriptor::List(l) => {
                assert_eq!(l.null_def_level, 1);
                assert_eq!(l.depth, 1);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }
}
