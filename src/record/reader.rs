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

//! `RecordAssembler`/`RowIter`: walks a batch of projected, typed column
//! leaves one row at a time via the field-descriptor tree `build_row_schema`
//! produces, per spec.md §4.7's per-row algorithm.

use crate::column::TypedColumnBatch;
use crate::record::{Field, FieldDescriptor, ListDescriptor, MapDescriptor, Row, StructDescriptor};
use bytes::Bytes;

enum LeafValues<'a> {
    Int(&'a [i32]),
    Long(&'a [i64]),
    Float(&'a [f32]),
    Double(&'a [f64]),
    Boolean(&'a [bool]),
    Bytes(&'a [Bytes]),
}

impl<'a> LeafValues<'a> {
    fn get(&self, idx: usize) -> Field {
        match self {
            LeafValues::Int(v) => Field::Int(v[idx]),
            LeafValues::Long(v) => Field::Long(v[idx]),
            LeafValues::Float(v) => Field::Float(v[idx]),
            LeafValues::Double(v) => Field::Double(v[idx]),
            LeafValues::Boolean(v) => Field::Bool(v[idx]),
            LeafValues::Bytes(v) => Field::Bytes(v[idx].clone()),
        }
    }
}

/// A cursor walking one projected leaf's decoded batch slot by slot.
struct LeafCursor<'a> {
    max_def: i16,
    def_levels: Option<&'a [i16]>,
    rep_levels: Option<&'a [i16]>,
    values: LeafValues<'a>,
    num_slots: usize,
    slot: usize,
    value_idx: usize,
}

impl<'a> LeafCursor<'a> {
    fn new(batch: &'a TypedColumnBatch) -> Self {
        let values = match batch {
            TypedColumnBatch::IntColumn(b) => LeafValues::Int(&b.values),
            TypedColumnBatch::LongColumn(b) => LeafValues::Long(&b.values),
            TypedColumnBatch::FloatColumn(b) => LeafValues::Float(&b.values),
            TypedColumnBatch::DoubleColumn(b) => LeafValues::Double(&b.values),
            TypedColumnBatch::BooleanColumn(b) => LeafValues::Boolean(&b.values),
            TypedColumnBatch::ByteArrayColumn(b) => LeafValues::Bytes(&b.values),
            TypedColumnBatch::ObjectColumn(b) => LeafValues::Bytes(&b.values),
        };
        LeafCursor {
            max_def: batch.max_def_level(),
            def_levels: batch.def_levels(),
            rep_levels: batch.rep_levels(),
            values,
            num_slots: batch.num_slots(),
            slot: 0,
            value_idx: 0,
        }
    }

    fn has_more(&self) -> bool {
        self.slot < self.num_slots
    }

    fn peek_def(&self) -> i16 {
        self.def_levels.map(|d| d[self.slot]).unwrap_or(self.max_def)
    }

    fn peek_rep(&self) -> i16 {
        self.rep_levels.map(|r| r[self.slot]).unwrap_or(0)
    }

    /// Consumes the current slot, returning its value if it was present
    /// (`def == max_def`) or `None` for a null at this or a shallower level.
    fn consume(&mut self) -> Option<Field> {
        let def = self.peek_def();
        let value = if def == self.max_def {
            Some(self.values.get(self.value_idx))
        } else {
            None
        };
        if def == self.max_def {
            self.value_idx += 1;
        }
        self.slot += 1;
        value
    }
}

/// Assembles whole rows out of a fixed set of projected leaf batches, per
/// the field-descriptor tree `build_row_schema` produced for the same
/// projection. One assembler instance is spent on exactly one batch of
/// aligned leaf columns; `assemble_row` is called once per record the
/// batch holds.
pub struct RecordAssembler<'a> {
    descriptors: &'a [FieldDescriptor],
    cursors: Vec<LeafCursor<'a>>,
    logical: Vec<Option<crate::record::LeafLogical>>,
}

impl<'a> RecordAssembler<'a> {
    pub fn new(descriptors: &'a [FieldDescriptor], batches: &'a [TypedColumnBatch]) -> Self {
        let cursors = batches.iter().map(LeafCursor::new).collect();
        let logical = descriptors.iter().map(|d| d.leaf_logical().cloned()).collect();
        RecordAssembler {
            descriptors,
            cursors,
            logical,
        }
    }

    pub fn assemble_row(&mut self) -> Row {
        let fields = self
            .descriptors
            .iter()
            .map(|d| (d.name().to_string(), read_field(d, &mut self.cursors)))
            .collect();
        Row::new(fields, self.logical.clone())
    }
}

fn read_field(desc: &FieldDescriptor, cursors: &mut [LeafCursor]) -> Field {
    match desc {
        FieldDescriptor::Primitive(p) => cursors[p.leaf_index].consume().unwrap_or(Field::Null),
        FieldDescriptor::Struct(s) => read_struct(s, cursors),
        FieldDescriptor::List(l) => read_list(l, cursors),
        FieldDescriptor::Map(m) => read_map(m, cursors),
    }
}

fn read_struct(desc: &StructDescriptor, cursors: &mut [LeafCursor]) -> Field {
    let present = cursors[desc.driving_leaf].peek_def() >= desc.self_def_level;
    let fields = desc
        .children
        .iter()
        .map(|c| (c.name().to_string(), read_field(c, cursors)))
        .collect();
    if present {
        Field::Struct(fields)
    } else {
        Field::Null
    }
}

/// Discards exactly one slot per descendant leaf: used when a container was
/// found null or empty, since Parquet still writes one placeholder slot per
/// leaf for that row even though no element occurred.
fn consume_subtree(desc: &FieldDescriptor, cursors: &mut [LeafCursor]) {
    match desc {
        FieldDescriptor::Primitive(p) => {
            cursors[p.leaf_index].consume();
        }
        FieldDescriptor::Struct(s) => {
            for c in &s.children {
                consume_subtree(c, cursors);
            }
        }
        FieldDescriptor::List(l) => consume_subtree(&l.element, cursors),
        FieldDescriptor::Map(m) => {
            consume_subtree(&m.key, cursors);
            consume_subtree(&m.value, cursors);
        }
    }
}

fn read_list(desc: &ListDescriptor, cursors: &mut [LeafCursor]) -> Field {
    let def0 = cursors[desc.driving_leaf].peek_def();
    if def0 < desc.null_def_level {
        consume_subtree(&desc.element, cursors);
        return Field::List(None);
    }
    if def0 == desc.null_def_level {
        consume_subtree(&desc.element, cursors);
        return Field::List(Some(Vec::new()));
    }

    let mut elements = Vec::new();
    loop {
        elements.push(read_field(&desc.element, cursors));
        let driving = &cursors[desc.driving_leaf];
        if !(driving.has_more() && driving.peek_rep() >= desc.depth) {
            break;
        }
    }
    Field::List(Some(elements))
}

fn read_map(desc: &MapDescriptor, cursors: &mut [LeafCursor]) -> Field {
    let def0 = cursors[desc.driving_leaf].peek_def();
    if def0 < desc.null_def_level {
        consume_subtree(&desc.key, cursors);
        consume_subtree(&desc.value, cursors);
        return Field::Map(None);
    }
    if def0 == desc.null_def_level {
        consume_subtree(&desc.key, cursors);
        consume_subtree(&desc.value, cursors);
        return Field::Map(Some(Vec::new()));
    }

    let mut entries = Vec::new();
    loop {
        let key = read_field(&desc.key, cursors);
        let value = read_field(&desc.value, cursors);
        entries.push((key, value));
        let driving = &cursors[desc.driving_leaf];
        if !(driving.has_more() && driving.peek_rep() >= desc.depth) {
            break;
        }
    }
    Field::Map(Some(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::page::PrimitiveBatch;
    use crate::record::build_row_schema;
    use crate::schema::schema_from_elements;
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
    fn flat_required_columns_assemble_one_row_per_slot() {
        let elements = vec![
            elem("schema", None, None, Some(2), None),
            elem("id", Some(2), Some(0), None, None),
            elem("value", Some(2), Some(0), None, None),
        ];
        let schema = schema_from_elements(&elements).unwrap();
        let projection = schema.project(None).unwrap();
        let descriptors = build_row_schema(&schema, &projection).unwrap();

        let id_batch = TypedColumnBatch::LongColumn(PrimitiveBatch {
            values: vec![1, 2, 3],
            def_levels: None,
            rep_levels: None,
            max_def_level: 0,
            num_records: 3,
        });
        let value_batch = TypedColumnBatch::LongColumn(PrimitiveBatch {
            values: vec![10, 20, 30],
            def_levels: None,
            rep_levels: None,
            max_def_level: 0,
            num_records: 3,
        });
        let batches = vec![id_batch, value_batch];
        let mut assembler = RecordAssembler::new(&descriptors, &batches);

        let row0 = assembler.assemble_row();
        assert_eq!(row0.get_long(0).unwrap(), 1);
        assert_eq!(row0.get_long(1).unwrap(), 10);
        let row1 = assembler.assemble_row();
        assert_eq!(row1.get_long(0).unwrap(), 2);
        assert_eq!(row1.get_long(1).unwrap(), 20);
    }

    #[test]
    fn optional_struct_is_null_when_absent() {
        // optional group address { required binary street (UTF8); }
        let elements = vec![
            elem("schema", None, None, Some(2), None),
            elem("id", Some(1), Some(0), None, None),
            elem("address", None, Some(1), Some(1), None),
            elem("street", Some(6), Some(0), None, Some(0)),
        ];
        let schema = schema_from_elements(&elements).unwrap();
        let projection = schema.project(None).unwrap();
        let descriptors = build_row_schema(&schema, &projection).unwrap();

        // Row 0: address present ("a"); row 1: address absent (def=0 < self_def_level=1).
        let street_batch = TypedColumnBatch::ByteArrayColumn(PrimitiveBatch {
            values: vec![Bytes::from_static(b"a")],
            def_levels: Some(vec![1, 0]),
            rep_levels: None,
            max_def_level: 1,
            num_records: 2,
        });
        let id_batch = TypedColumnBatch::IntColumn(PrimitiveBatch {
            values: vec![1, 2],
            def_levels: None,
            rep_levels: None,
            max_def_level: 0,
            num_records: 2,
        });
        let batches = vec![id_batch, street_batch];
        let mut assembler = RecordAssembler::new(&descriptors, &batches);

        let row0 = assembler.assemble_row();
        assert!(!row0.is_null(1));
        let inner = row0.get_struct(1).unwrap().unwrap();
        assert_eq!(inner[0].0, "street");
        assert_eq!(inner[0].1, Field::Bytes(Bytes::from_static(b"a")));

        let row1 = assembler.assemble_row();
        assert!(row1.is_null(1));
    }

    #[test]
    fn list_of_primitive_reassembles_variable_length_rows() {
        // optional group tags (LIST) { repeated group list { required binary element (UTF8); } }
        let elements = vec![
            elem("schema", None, None, Some(1), None),
            elem("tags", None, Some(1), Some(1), Some(3)),
            elem("list", None, Some(2), Some(1), None),
            elem("element", Some(6), Some(0), None, Some(0)),
        ];
        let schema = schema_from_elements(&elements).unwrap();
        let projection = schema.project(None).unwrap();
        let descriptors = build_row_schema(&schema, &projection).unwrap();

        // Row 0: ["x", "y"] (def=2,rep=0 then def=2,rep=1).
        // Row 1: [] (present, empty: def=1,rep=0).
        // Row 2: null (absent: def=0,rep=0).
        let element_batch = TypedColumnBatch::ByteArrayColumn(PrimitiveBatch {
            values: vec![Bytes::from_static(b"x"), Bytes::from_static(b"y")],
            def_levels: Some(vec![2, 2, 1, 0]),
            rep_levels: Some(vec![0, 1, 0, 0]),
            max_def_level: 2,
            num_records: 3,
        });
        let batches = vec![element_batch];
        let mut assembler = RecordAssembler::new(&descriptors, &batches);

        let row0 = assembler.assemble_row();
        let list0 = row0.get_list(0).unwrap().unwrap();
        assert_eq!(list0.len(), 2);
        assert_eq!(list0[0], Field::Bytes(Bytes::from_static(b"x")));
        assert_eq!(list0[1], Field::Bytes(Bytes::from_static(b"y")));

        let row1 = assembler.assemble_row();
        assert_eq!(row1.get_list(0).unwrap(), Some(&[][..]));

        let row2 = assembler.assemble_row();
        assert!(row2.get_list(0).unwrap().is_none());
    }

    #[test]
    fn map_of_primitive_reassembles_variable_length_rows() {
        // optional group scores (MAP) {
        //   repeated group key_value { required binary key (UTF8); required int32 value; }
        // }
        let elements = vec![
            elem("schema", None, None, Some(1), None),
            elem("scores", None, Some(1), Some(1), Some(3)), // MAP
            elem("key_value", None, Some(2), Some(2), None),
            elem("key", Some(6), Some(0), None, Some(0)),
            elem("value", Some(1), Some(0), None, None),
        ];
        let schema = schema_from_elements(&elements).unwrap();
        let projection = schema.project(None).unwrap();
        let descriptors = build_row_schema(&schema, &projection).unwrap();

        // Row 0: {"a": 1, "b": 2} (def=2,rep=0 then def=2,rep=1).
        // Row 1: {} (present, empty: def=1,rep=0).
        // Row 2: null (absent: def=0,rep=0).
        let key_batch = TypedColumnBatch::ByteArrayColumn(PrimitiveBatch {
            values: vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")],
            def_levels: Some(vec![2, 2, 1, 0]),
            rep_levels: Some(vec![0, 1, 0, 0]),
            max_def_level: 2,
            num_records: 3,
        });
        let value_batch = TypedColumnBatch::IntColumn(PrimitiveBatch {
            values: vec![1, 2],
            def_levels: Some(vec![2, 2, 1, 0]),
            rep_levels: Some(vec![0, 1, 0, 0]),
            max_def_level: 2,
            num_records: 3,
        });
        let batches = vec![key_batch, value_batch];
        let mut assembler = RecordAssembler::new(&descriptors, &batches);

        let row0 = assembler.assemble_row();
        let map0 = row0.get_map(0).unwrap().unwrap();
        assert_eq!(map0.len(), 2);
        assert_eq!(map0[0].0, Field::Bytes(Bytes::from_static(b"a")));
        assert_eq!(map0[0].1, Field::Int(1));
        assert_eq!(map0[1].0, Field::Bytes(Bytes::from_static(b"b")));
        assert_eq!(map0[1].1, Field::Int(2));

        let row1 = assembler.assemble_row();
        assert_eq!(row1.get_map(0).unwrap(), Some(&[][..]));

        let row2 = assembler.assemble_row();
        assert!(row2.get_map(0).unwrap().is_none());
    }

    #[test]
    fn optional_string_column_surfaces_nulls_through_get_string() {
        // required int64 id; optional binary name (UTF8);
        let elements = vec![
            elem("schema", None, None, Some(2), None),
            elem("id", Some(2), Some(0), None, None),
            elem("name", Some(6), Some(1), None, Some(0)),
        ];
        let schema = schema_from_elements(&elements).unwrap();
        let projection = schema.project(None).unwrap();
        let descriptors = build_row_schema(&schema, &projection).unwrap();

        let id_batch = TypedColumnBatch::LongColumn(PrimitiveBatch {
            values: vec![1, 2, 3],
            def_levels: None,
            rep_levels: None,
            max_def_level: 0,
            num_records: 3,
        });
        let name_batch = TypedColumnBatch::ByteArrayColumn(PrimitiveBatch {
            values: vec![Bytes::from_static(b"alice"), Bytes::from_static(b"charlie")],
            def_levels: Some(vec![1, 0, 1]),
            rep_levels: None,
            max_def_level: 1,
            num_records: 3,
        });
        let batches = vec![id_batch, name_batch];
        let mut assembler = RecordAssembler::new(&descriptors, &batches);

        let row0 = assembler.assemble_row();
        assert!(!row0.is_null(1));
        assert_eq!(row0.get_string(1).unwrap(), Some("alice".to_string()));

        let row1 = assembler.assemble_row();
        assert!(row1.is_null(1));
        assert_eq!(row1.get_string(1).unwrap(), None);

        let row2 = assembler.assemble_row();
        assert_eq!(row2.get_string(1).unwrap(), Some("charlie".to_string()));
    }

    #[test]
    fn decimal_and_date_leaves_convert_through_their_declared_scale_and_epoch() {
        // required int32 amount (DECIMAL(9,2)); required int32 d (DATE);
        let mut amount = elem("amount", Some(1), Some(0), None, Some(5));
        amount.scale = Some(2);
        amount.precision = Some(9);
        let elements = vec![
            elem("schema", None, None, Some(2), None),
            amount,
            elem("d", Some(1), Some(0), None, Some(6)),
        ];
        let schema = schema_from_elements(&elements).unwrap();
        let projection = schema.project(None).unwrap();
        let descriptors = build_row_schema(&schema, &projection).unwrap();

        let amount_batch = TypedColumnBatch::IntColumn(PrimitiveBatch {
            values: vec![12345],
            def_levels: None,
            rep_levels: None,
            max_def_level: 0,
            num_records: 1,
        });
        let date_batch = TypedColumnBatch::IntColumn(PrimitiveBatch {
            values: vec![19723],
            def_levels: None,
            rep_levels: None,
            max_def_level: 0,
            num_records: 1,
        });
        let batches = vec![amount_batch, date_batch];
        let mut assembler = RecordAssembler::new(&descriptors, &batches);

        let row0 = assembler.assemble_row();
        assert_eq!(row0.get_decimal(0).unwrap().unwrap().to_string(), "123.45");
        assert_eq!(row0.get_date(1).unwrap().unwrap().to_string(), "2023-12-25");
    }

    #[test]
    fn field_index_looks_up_top_level_fields_by_name() {
        let elements = vec![
            elem("schema", None, None, Some(2), None),
            elem("id", Some(2), Some(0), None, None),
            elem("value", Some(2), Some(0), None, None),
        ];
        let schema = schema_from_elements(&elements).unwrap();
        let projection = schema.project(None).unwrap();
        let descriptors = build_row_schema(&schema, &projection).unwrap();
        let batches = vec![
            TypedColumnBatch::LongColumn(PrimitiveBatch {
                values: vec![1],
                def_levels: None,
                rep_levels: None,
                max_def_level: 0,
                num_records: 1,
            }),
            TypedColumnBatch::LongColumn(PrimitiveBatch {
                values: vec![10],
                def_levels: None,
                rep_levels: None,
                max_def_level: 0,
                num_records: 1,
            }),
        ];
        let mut assembler = RecordAssembler::new(&descriptors, &batches);
        let row = assembler.assemble_row();
        assert_eq!(row.field_index("value"), Some(1));
        assert_eq!(row.field_index("nonexistent"), None);
    }
}
