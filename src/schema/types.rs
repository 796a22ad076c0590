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

use crate::basic::{ConvertedType, LogicalType, Repetition, TimeUnit, Type as PhysicalType};
use crate::errors::{general_err, ParquetError, Result};
use crate::format;
use std::fmt;
use std::sync::Arc;

/// A dot-joined, depth-first path to a leaf column, e.g. `address.city`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnPath {
    parts: Vec<String>,
}

impl ColumnPath {
    pub fn new(parts: Vec<String>) -> Self {
        ColumnPath { parts }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn leaf_name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or("")
    }

    pub fn top_level_name(&self) -> &str {
        self.parts.first().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

/// The schema tree: a root group whose children are primitive leaves or
/// nested groups, as spec.md §3 describes.
#[derive(Debug, Clone)]
pub enum Type {
    Primitive {
        name: String,
        repetition: Repetition,
        physical_type: PhysicalType,
        type_length: i32,
        converted_type: ConvertedType,
        logical_type: Option<LogicalType>,
        /// Legacy `DECIMAL`'s scale/precision, carried straight off the
        /// schema element since `ConvertedType::DECIMAL` (unlike the newer
        /// `LogicalType::Decimal`) doesn't carry them itself.
        scale: i32,
        precision: i32,
    },
    Group {
        name: String,
        repetition: Option<Repetition>,
        converted_type: ConvertedType,
        logical_type: Option<LogicalType>,
        fields: Vec<Arc<Type>>,
        /// `true` when this group's shape matches the LIST pattern: a sole
        /// REPEATED child group whose sole child is the element.
        is_list: bool,
        /// `true` when this group's shape matches the MAP pattern: a sole
        /// REPEATED child group with exactly two children, key and value.
        is_map: bool,
    },
}

impl Type {
    pub fn name(&self) -> &str {
        match self {
            Type::Primitive { name, .. } => name,
            Type::Group { name, .. } => name,
        }
    }

    pub fn repetition(&self) -> Option<Repetition> {
        match self {
            Type::Primitive { repetition, .. } => Some(*repetition),
            Type::Group { repetition, .. } => *repetition,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Type::Group { .. })
    }

    pub fn fields(&self) -> &[Arc<Type>] {
        match self {
            Type::Group { fields, .. } => fields,
            Type::Primitive { .. } => &[],
        }
    }
}

/// One leaf primitive column's full descriptor, as spec.md §3 specifies.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    pub path: ColumnPath,
    pub physical_type: PhysicalType,
    pub type_length: i32,
    pub converted_type: ConvertedType,
    pub logical_type: Option<LogicalType>,
    pub scale: i32,
    pub precision: i32,
    pub column_index: usize,
    pub max_def_level: i16,
    pub max_rep_level: i16,
}

impl ColumnDescriptor {
    pub fn name(&self) -> &str {
        self.path.leaf_name()
    }
}

/// The whole file schema plus its flattened, depth-first leaf list.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    root: Arc<Type>,
    leaves: Vec<Arc<ColumnDescriptor>>,
}

impl SchemaDescriptor {
    pub fn root(&self) -> &Arc<Type> {
        &self.root
    }

    pub fn num_columns(&self) -> usize {
        self.leaves.len()
    }

    pub fn column(&self, i: usize) -> &Arc<ColumnDescriptor> {
        &self.leaves[i]
    }

    pub fn columns(&self) -> &[Arc<ColumnDescriptor>] {
        &self.leaves
    }

    /// Top-level field names, in schema order.
    pub fn top_level_field_names(&self) -> Vec<&str> {
        self.root.fields().iter().map(|f| f.name()).collect()
    }

    /// Builds a projection over a subset of top-level field names, or all
    /// fields when `names` is `None`.
    pub fn project(&self, names: Option<&[&str]>) -> Result<Projection> {
        let top_fields = self.root.fields();
        let kept_field_indices: Vec<usize> = match names {
            None => (0..top_fields.len()).collect(),
            Some(names) => {
                let mut indices = Vec::with_capacity(names.len());
                for name in names {
                    let idx = top_fields.iter().position(|f| f.name() == *name).ok_or_else(|| {
                        ParquetError::ProjectionError(format!("unknown field '{name}'"))
                    })?;
                    indices.push(idx);
                }
                indices
            }
        };

        let kept_field_names: std::collections::HashSet<&str> = kept_field_indices
            .iter()
            .map(|&i| top_fields[i].name())
            .collect();

        let mut leaf_mapping = vec![-1i32; self.leaves.len()];
        let mut next_projected = 0i32;
        for (i, leaf) in self.leaves.iter().enumerate() {
            if kept_field_names.contains(leaf.path.top_level_name()) {
                leaf_mapping[i] = next_projected;
                next_projected += 1;
            }
        }

        Ok(Projection {
            kept_field_indices,
            leaf_mapping,
        })
    }
}

/// The result of resolving a projection against a `SchemaDescriptor`: which
/// original top-level field indices survive, and a dense mapping from
/// original leaf-column index to projected leaf-column index (-1 = dropped).
#[derive(Debug, Clone)]
pub struct Projection {
    kept_field_indices: Vec<usize>,
    leaf_mapping: Vec<i32>,
}

impl Projection {
    pub fn kept_field_indices(&self) -> &[usize] {
        &self.kept_field_indices
    }

    pub fn num_fields(&self) -> usize {
        self.kept_field_indices.len()
    }

    /// Maps an original leaf-column index to its projected index, or `None`
    /// if the leaf was dropped by the projection.
    pub fn projected_index(&self, original_leaf: usize) -> Option<usize> {
        match self.leaf_mapping.get(original_leaf).copied() {
            Some(-1) | None => None,
            Some(idx) => Some(idx as usize),
        }
    }

    pub fn is_kept(&self, original_leaf: usize) -> bool {
        self.projected_index(original_leaf).is_some()
    }
}

/// Builds a `SchemaDescriptor` from the footer's depth-first
/// `SchemaElement` list (root first, each group followed immediately by
/// `num_children` children, recursively).
pub fn schema_from_elements(elements: &[format::SchemaElement]) -> Result<SchemaDescriptor> {
    if elements.is_empty() {
        return Err(general_err!("schema element list is empty"));
    }
    let mut cursor = 0usize;
    let root = build_node(elements, &mut cursor, true)?;
    if cursor != elements.len() {
        return Err(general_err!(
            "schema element list has {} trailing, unconsumed elements",
            elements.len() - cursor
        ));
    }

    let mut leaves = Vec::new();
    let mut path = Vec::new();
    collect_leaves(&root, &mut path, 0, 0, &mut leaves);

    Ok(SchemaDescriptor { root, leaves })
}

fn build_node(
    elements: &[format::SchemaElement],
    cursor: &mut usize,
    is_root: bool,
) -> Result<Arc<Type>> {
    if *cursor >= elements.len() {
        return Err(general_err!("unexpected end of schema element list"));
    }
    let elem = &elements[*cursor];
    *cursor += 1;

    let is_group = elem.num_children.is_some();
    if is_group {
        let num_children = elem.num_children.unwrap_or(0) as usize;
        let mut fields = Vec::with_capacity(num_children);
        for _ in 0..num_children {
            fields.push(build_node(elements, cursor, false)?);
        }
        let repetition = if is_root {
            None
        } else {
            Some(Repetition::try_from(elem.repetition_type.ok_or_else(|| {
                general_err!("group '{}' is missing a repetition type", elem.name)
            })?)?)
        };
        let converted_type = ConvertedType::from(elem.converted_type);
        let logical_type = convert_logical_type(&elem.logical_type);

        let (is_list, is_map) = classify_group(repetition, converted_type, &fields);

        Ok(Arc::new(Type::Group {
            name: elem.name.clone(),
            repetition,
            converted_type,
            logical_type,
            fields,
            is_list,
            is_map,
        }))
    } else {
        let repetition = Repetition::try_from(elem.repetition_type.ok_or_else(|| {
            general_err!("primitive field '{}' is missing a repetition type", elem.name)
        })?)?;
        let physical_type = PhysicalType::try_from(elem.type_.ok_or_else(|| {
            general_err!("primitive field '{}' is missing a physical type", elem.name)
        })?)?;
        let converted_type = ConvertedType::from(elem.converted_type);
        let logical_type = convert_logical_type(&elem.logical_type);

        Ok(Arc::new(Type::Primitive {
            name: elem.name.clone(),
            repetition,
            physical_type,
            type_length: elem.type_length.unwrap_or(0),
            converted_type,
            logical_type,
            scale: elem.scale.unwrap_or(0),
            precision: elem.precision.unwrap_or(0),
        }))
    }
}

/// Classifies a group as LIST/MAP per spec.md §3 and the `MAP_KEY_VALUE` vs
/// `MAP` Open Question decided in DESIGN.md: the outer group's own
/// `ConvertedType`/`LogicalType` is authoritative and the inner `REPEATED`
/// group's annotation (if any) is read but treated as advisory only.
fn classify_group(
    repetition: Option<Repetition>,
    converted_type: ConvertedType,
    fields: &[Arc<Type>],
) -> (bool, bool) {
    // The root group is never itself a list/map.
    if repetition.is_none() {
        return (false, false);
    }
    if fields.len() != 1 {
        return (false, false);
    }
    let only_child = &fields[0];
    if only_child.repetition() != Some(Repetition::REPEATED) {
        return (false, false);
    }

    let annotated_list = matches!(converted_type, ConvertedType::LIST);
    let annotated_map =
        matches!(converted_type, ConvertedType::MAP | ConvertedType::MAP_KEY_VALUE);

    let child_fields = only_child.fields();
    let shape_is_map = only_child.is_group()
        && child_fields.len() == 2
        && child_fields[0].name() == "key"
        && child_fields[1].name() == "value";
    let shape_is_list = only_child.fields().len() == 1 || !only_child.is_group();

    if annotated_map && shape_is_map {
        (false, true)
    } else if annotated_list {
        (true, false)
    } else if !annotated_list && !annotated_map {
        // No annotation: infer from shape, preferring MAP when the inner
        // repeated group's own shape looks like a key/value pair.
        if shape_is_map {
            (false, true)
        } else if shape_is_list {
            (true, false)
        } else {
            (false, false)
        }
    } else {
        (false, false)
    }
}

fn convert_logical_type(lt: &Option<format::LogicalType>) -> Option<LogicalType> {
    let lt = lt.as_ref()?;
    Some(if lt.string {
        LogicalType::String
    } else if lt.enum_ {
        LogicalType::Enum
    } else if lt.uuid {
        LogicalType::Uuid
    } else if lt.date {
        LogicalType::Date
    } else if let Some((utc, unit)) = lt.time {
        LogicalType::Time {
            is_adjusted_to_u_t_c: utc,
            unit: time_unit_from_code(unit),
        }
    } else if let Some((utc, unit)) = lt.timestamp {
        LogicalType::Timestamp {
            is_adjusted_to_u_t_c: utc,
            unit: time_unit_from_code(unit),
        }
    } else if let Some((scale, precision)) = lt.decimal {
        LogicalType::Decimal { precision, scale }
    } else if let Some((bit_width, is_signed)) = lt.integer {
        LogicalType::Integer {
            bit_width,
            is_signed,
        }
    } else if lt.json {
        LogicalType::Json
    } else if lt.bson {
        LogicalType::Bson
    } else if lt.list {
        LogicalType::List
    } else if lt.map {
        LogicalType::Map
    } else {
        LogicalType::Unknown
    })
}

fn time_unit_from_code(code: i32) -> TimeUnit {
    match code {
        2 => TimeUnit::Micros,
        3 => TimeUnit::Nanos,
        _ => TimeUnit::Millis,
    }
}

/// Walks the tree depth-first, tracking max-def/max-rep levels as it
/// descends: max-def-level increases for every OPTIONAL or REPEATED
/// ancestor (inclusive of the leaf's own optionality); max-rep-level
/// increases for every REPEATED ancestor.
fn collect_leaves(
    node: &Arc<Type>,
    path: &mut Vec<String>,
    max_def: i16,
    max_rep: i16,
    out: &mut Vec<Arc<ColumnDescriptor>>,
) {
    match node.as_ref() {
        Type::Primitive {
            name,
            repetition,
            physical_type,
            type_length,
            converted_type,
            logical_type,
            scale,
            precision,
        } => {
            path.push(name.clone());
            let def = max_def + if *repetition != Repetition::REQUIRED { 1 } else { 0 };
            let rep = max_rep + if *repetition == Repetition::REPEATED { 1 } else { 0 };
            out.push(Arc::new(ColumnDescriptor {
                path: ColumnPath::new(path.clone()),
                physical_type: *physical_type,
                type_length: *type_length,
                converted_type: *converted_type,
                logical_type: logical_type.clone(),
                scale: *scale,
                precision: *precision,
                column_index: out.len(),
                max_def_level: def,
                max_rep_level: rep,
            }));
            path.pop();
        }
        Type::Group {
            name,
            repetition,
            fields,
            ..
        } => {
            let is_root = repetition.is_none();
            if !is_root {
                path.push(name.clone());
            }
            let def = max_def
                + if repetition.map(|r| r != Repetition::REQUIRED).unwrap_or(false) {
                    1
                } else {
                    0
                };
            let rep = max_rep
                + if *repetition == Some(Repetition::REPEATED) {
                    1
                } else {
                    0
                };
            for field in fields {
                collect_leaves(field, path, def, rep, out);
            }
            if !is_root {
                path.pop();
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
    fn flat_two_int64_schema() {
        // message schema { required int64 id; required int64 value; }
        let elements = vec![
            elem("schema", None, None, Some(2), None),
            elem("id", Some(2), Some(0), None, None),
            elem("value", Some(2), Some(0), None, None),
        ];
        let schema = schema_from_elements(&elements).unwrap();
        assert_eq!(schema.num_columns(), 2);
        assert_eq!(schema.column(0).name(), "id");
        assert_eq!(schema.column(0).max_def_level, 0);
        assert_eq!(schema.column(0).max_rep_level, 0);
        assert_eq!(schema.column(1).name(), "value");
    }

    #[test]
    fn optional_leaf_increases_max_def_level() {
        let elements = vec![
            elem("schema", None, None, Some(2), None),
            elem("id", Some(2), Some(0), None, None),
            elem("name", Some(6), Some(1), None, Some(0)), // BYTE_ARRAY OPTIONAL, UTF8
        ];
        let schema = schema_from_elements(&elements).unwrap();
        assert_eq!(schema.column(1).max_def_level, 1);
        assert_eq!(schema.column(1).max_rep_level, 0);
    }

    #[test]
    fn nested_optional_struct_increases_def_level_for_children() {
        // message schema {
        //   required int32 id;
        //   optional group address {
        //     required binary street (UTF8);
        //     required binary city (UTF8);
        //     required int32 zip;
        //   }
        // }
        let elements = vec![
            elem("schema", None, None, Some(2), None),
            elem("id", Some(1), Some(0), None, None),
            elem("address", None, Some(1), Some(3), None),
            elem("street", Some(6), Some(0), None, Some(0)),
            elem("city", Some(6), Some(0), None, Some(0)),
            elem("zip", Some(1), Some(0), None, None),
        ];
        let schema = schema_from_elements(&elements).unwrap();
        assert_eq!(schema.num_columns(), 4);
        assert_eq!(schema.column(1).path.to_string(), "address.street");
        assert_eq!(schema.column(1).max_def_level, 1);
        assert_eq!(schema.column(3).path.to_string(), "address.zip");
        assert_eq!(schema.column(3).max_def_level, 1);
    }

    #[test]
    fn list_group_is_classified() {
        // optional group tags (LIST) {
        //   repeated group list {
        //     required binary element (UTF8);
        //   }
        // }
        let elements = vec![
            elem("schema", None, None, Some(1), None),
            elem("tags", None, Some(1), Some(1), Some(3)), // LIST
            elem("list", None, Some(2), Some(1), None),
            elem("element", Some(6), Some(0), None, Some(0)),
        ];
        let schema = schema_from_elements(&elements).unwrap();
        if let Type::Group { is_list, .. } = schema.root().fields()[0].as_ref() {
            assert!(*is_list);
        } else {
            panic!("expected group");
        }
        // element max_rep_level = 1 (one REPEATED ancestor: `list`)
        assert_eq!(schema.column(0).max_rep_level, 1);
        // element max_def_level = 2: tags is OPTIONAL (+1), list is REPEATED (+1)
        assert_eq!(schema.column(0).max_def_level, 2);
    }

    #[test]
    fn unannotated_key_value_shape_is_classified_as_map() {
        // group scores { repeated group key_value { required binary key (UTF8); required int32 value; } }
        // no MAP/MAP_KEY_VALUE annotation anywhere: classification must fall back to shape.
        let elements = vec![
            elem("schema", None, None, Some(1), None),
            elem("scores", None, Some(1), Some(1), None),
            elem("key_value", None, Some(2), Some(2), None),
            elem("key", Some(6), Some(0), None, Some(0)),
            elem("value", Some(1), Some(0), None, None),
        ];
        let schema = schema_from_elements(&elements).unwrap();
        if let Type::Group { is_map, is_list, .. } = schema.root().fields()[0].as_ref() {
            assert!(*is_map);
            assert!(!*is_list);
        } else {
            panic!("expected group");
        }
    }

    #[test]
    fn unannotated_two_field_non_key_value_shape_is_not_a_map() {
        // An unannotated repeated group with two fields named x/y is a
        // list-of-struct, not a map: the key/value names must be checked,
        // not just the field count.
        let elements = vec![
            elem("schema", None, None, Some(1), None),
            elem("points", None, Some(1), Some(1), None),
            elem("point", None, Some(2), Some(2), None),
            elem("x", Some(1), Some(0), None, None),
            elem("y", Some(1), Some(0), None, None),
        ];
        let schema = schema_from_elements(&elements).unwrap();
        if let Type::Group { is_map, is_list, .. } = schema.root().fields()[0].as_ref() {
            assert!(!*is_map);
            assert!(!*is_list);
        } else {
            panic!("expected group");
        }
    }

    #[test]
    fn projection_maps_leaf_indices() {
        let elements = vec![
            elem("schema", None, None, Some(2), None),
            elem("id", Some(2), Some(0), None, None),
            elem("name", Some(6), Some(1), None, Some(0)),
        ];
        let schema = schema_from_elements(&elements).unwrap();
        let proj = schema.project(Some(&["name"])).unwrap();
        assert_eq!(proj.num_fields(), 1);
        assert_eq!(proj.projected_index(0), None);
        assert_eq!(proj.projected_index(1), Some(0));
    }

    #[test]
    fn projection_rejects_unknown_field() {
        let elements = vec![
            elem("schema", None, None, Some(1), None),
            elem("id", Some(2), Some(0), None, None),
        ];
        let schema = schema_from_elements(&elements).unwrap();
        assert!(schema.project(Some(&["nope"])).is_err());
    }
}
