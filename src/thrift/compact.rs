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

use crate::errors::{eof_err, general_err, ParquetError, Result};
use crate::thrift::FieldType;

/// A cursor-based reader for the Thrift Compact Protocol, as used for both
/// the file footer (`FileMetaData`) and page headers (`PageHeader`).
///
/// Field ids are delta-encoded relative to the previous field read within
/// the same struct; `last_field_id` tracks that delta and is saved/restored
/// across nested struct reads via `read_struct_begin`/`read_struct_end`.
pub struct CompactInputProtocol<'a> {
    buf: &'a [u8],
    pos: usize,
    last_field_id_stack: Vec<i16>,
    last_field_id: i16,
    /// Pending boolean value read inline from a field header, consumed by
    /// the next `read_bool` call (compact protocol quirk: bool field values
    /// live in the field-header type nibble, not a following byte).
    pending_bool: Option<bool>,
}

impl<'a> CompactInputProtocol<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            last_field_id_stack: Vec::new(),
            last_field_id: 0,
            pending_bool: None,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Raw single byte, used for Thrift `byte` fields (unlike varint-encoded
    /// i16/i32/i64, `byte` is not zigzag- or varint-coded).
    pub(crate) fn read_raw_byte(&mut self) -> Result<u8> {
        self.read_byte()
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.pos >= self.buf.len() {
            return Err(eof_err!("expected a byte, reached end of buffer"));
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(eof_err!(
                "expected {} bytes, only {} remain",
                n,
                self.buf.len() - self.pos
            ));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Unsigned LEB128 varint, up to 64 bits (10 bytes worth of payload).
    fn read_varint_u64(&mut self) -> Result<u64> {
        let mut result: u64 = 0;
        let mut shift = 0;
        loop {
            if shift >= 70 {
                return Err(general_err!("varint too long (possible corruption)"));
            }
            let byte = self.read_byte()?;
            result |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        Ok(result)
    }

    fn read_zigzag_i64(&mut self) -> Result<i64> {
        let u = self.read_varint_u64()?;
        Ok(((u >> 1) as i64) ^ -((u & 1) as i64))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_zigzag_i64()? as i16)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_zigzag_i64()? as i32)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_zigzag_i64()
    }

    pub fn read_double(&mut self) -> Result<f64> {
        let bytes = self.read_bytes(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(arr))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        if let Some(b) = self.pending_bool.take() {
            return Ok(b);
        }
        // Bools outside of struct fields (inside lists/maps) are encoded as
        // a standalone byte: 1 = true, 2 = false.
        let b = self.read_byte()?;
        match b {
            0x01 => Ok(true),
            0x02 => Ok(false),
            other => Err(general_err!("invalid standalone bool byte 0x{:02x}", other)),
        }
    }

    pub fn read_binary(&mut self) -> Result<Vec<u8>> {
        let len = self.read_varint_u64()? as usize;
        Ok(self.read_bytes(len)?.to_vec())
    }

    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_binary()?;
        String::from_utf8(bytes).map_err(|e| general_err!("invalid UTF-8 string: {}", e))
    }

    pub fn read_struct_begin(&mut self) {
        self.last_field_id_stack.push(self.last_field_id);
        self.last_field_id = 0;
    }

    pub fn read_struct_end(&mut self) {
        self.last_field_id = self
            .last_field_id_stack
            .pop()
            .expect("unbalanced struct begin/end");
    }

    /// Returns `None` on STOP, else `(type, field_id)`.
    pub fn read_field_begin(&mut self) -> Result<Option<(FieldType, i16)>> {
        let header = self.read_byte()?;
        if header == 0x00 {
            return Ok(None);
        }

        let type_nibble = header & 0x0f;
        let delta = (header & 0xf0) >> 4;

        let field_type = FieldType::from_compact_id(type_nibble)
            .ok_or_else(|| general_err!("unknown field type id {}", type_nibble))?;

        let field_id = if delta == 0 {
            // Long form: absolute field id follows as a zigzag varint i16.
            self.read_i16()?
        } else {
            self.last_field_id + delta as i16
        };
        self.last_field_id = field_id;

        match field_type {
            FieldType::BoolTrue => self.pending_bool = Some(true),
            FieldType::BoolFalse => self.pending_bool = Some(false),
            _ => {}
        }

        Ok(Some((field_type, field_id)))
    }

    /// Reads a list/set header: `(element_type, size)`.
    pub fn read_list_begin(&mut self) -> Result<(FieldType, usize)> {
        let header = self.read_byte()?;
        let size_nibble = (header & 0xf0) >> 4;
        let type_nibble = header & 0x0f;
        let element_type = FieldType::from_element_id(type_nibble)
            .ok_or_else(|| general_err!("unknown list element type id {}", type_nibble))?;
        let size = if size_nibble == 0x0f {
            self.read_varint_u64()? as usize
        } else {
            size_nibble as usize
        };
        Ok((element_type, size))
    }

    /// Reads a map header: `(key_type, value_type, size)`. Returns size 0
    /// and arbitrary types for an empty map, which the compact protocol
    /// encodes as a single `0x00` byte with *no* type byte following
    /// (a common implementation bug is to always expect a type byte).
    pub fn read_map_begin(&mut self) -> Result<(Option<FieldType>, Option<FieldType>, usize)> {
        let size = self.read_varint_u64()? as usize;
        if size == 0 {
            return Ok((None, None, 0));
        }
        let type_byte = self.read_byte()?;
        let key_type = FieldType::from_element_id((type_byte & 0xf0) >> 4)
            .ok_or_else(|| general_err!("unknown map key type id"))?;
        let value_type = FieldType::from_element_id(type_byte & 0x0f)
            .ok_or_else(|| general_err!("unknown map value type id"))?;
        Ok((Some(key_type), Some(value_type), size))
    }

    /// Recursively consumes a single value of the given type without
    /// materializing it, used to skip struct fields the metadata model
    /// doesn't recognize.
    pub fn skip_field(&mut self, field_type: FieldType) -> Result<()> {
        match field_type {
            FieldType::Stop => Ok(()),
            FieldType::BoolTrue | FieldType::BoolFalse => {
                // Inside a struct field, the value was already captured by
                // read_field_begin's header nibble; nothing more to skip.
                // Inside a list/set (read_list_begin never sets
                // pending_bool), the element is its own standalone byte.
                if self.pending_bool.take().is_none() {
                    self.read_byte()?;
                }
                Ok(())
            }
            FieldType::Byte => {
                self.read_byte()?;
                Ok(())
            }
            FieldType::I16 | FieldType::I32 | FieldType::I64 => {
                self.read_zigzag_i64()?;
                Ok(())
            }
            FieldType::Double => {
                self.read_double()?;
                Ok(())
            }
            FieldType::Binary => {
                self.read_binary()?;
                Ok(())
            }
            FieldType::List | FieldType::Set => {
                let (elem_type, size) = self.read_list_begin()?;
                for _ in 0..size {
                    self.skip_field(elem_type)?;
                }
                Ok(())
            }
            FieldType::Map => {
                let (key_type, value_type, size) = self.read_map_begin()?;
                if let (Some(kt), Some(vt)) = (key_type, value_type) {
                    for _ in 0..size {
                        self.skip_field(kt)?;
                        self.skip_field(vt)?;
                    }
                }
                Ok(())
            }
            FieldType::Struct => {
                self.read_struct_begin();
                loop {
                    match self.read_field_begin()? {
                        None => break,
                        Some((ft, _id)) => self.skip_field(ft)?,
                    }
                }
                self.read_struct_end();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zigzag_varint_roundtrip() {
        // -1 zigzags to 1, encoded as a single varint byte 0x02.
        let mut p = CompactInputProtocol::new(&[0x02]);
        assert_eq!(p.read_i32().unwrap(), -1);

        // 300 zigzags to 600 = 0b10_0101_1000, varint bytes 0xd8 0x04.
        let mut p = CompactInputProtocol::new(&[0xd8, 0x04]);
        assert_eq!(p.read_i32().unwrap(), 300);
    }

    #[test]
    fn field_header_short_form_delta() {
        // type=I32 (0x05), delta=1 -> header byte 0x15, field id becomes 1.
        let mut p = CompactInputProtocol::new(&[0x15]);
        p.read_struct_begin();
        let (ft, id) = p.read_field_begin().unwrap().unwrap();
        assert_eq!(ft, FieldType::I32);
        assert_eq!(id, 1);
    }

    #[test]
    fn empty_map_is_single_zero_byte() {
        // Scenario 6: an empty map<binary, struct> skip via Thrift advances
        // the cursor by exactly one byte (the size-varint 0), never reading
        // a type byte.
        let mut p = CompactInputProtocol::new(&[0x00, 0xAA]);
        let (kt, vt, size) = p.read_map_begin().unwrap();
        assert!(kt.is_none() && vt.is_none());
        assert_eq!(size, 0);
        assert_eq!(p.position(), 1);
    }

    #[test]
    fn map_with_one_entry_skips_expected_byte_count() {
        // map<binary, struct{field1: i32}> with one entry: key="ab", struct.field1=21.
        // size=1 -> varint 0x02 (zigzag(1)=2)... but map size is a *plain*
        // varint, not zigzag, so size=1 encodes as 0x01.
        let mut bytes = vec![0x01]; // size = 1
        bytes.push(0x88); // key type=Binary(0x08) << 4 | value type=Struct(0x0c)
                          // key: binary "ab" -> varint len=2, then bytes
        bytes.push(0x02);
        bytes.extend_from_slice(b"ab");
        // value struct: field1 (delta=1, type=I32=0x05) -> header 0x15, zigzag(21)=42=0x2a
        bytes.push(0x15);
        bytes.push(0x2a);
        bytes.push(0x00); // STOP

        let mut p = CompactInputProtocol::new(&bytes);
        let (kt, vt, size) = p.read_map_begin().unwrap();
        assert_eq!(size, 1);
        let kt = kt.unwrap();
        let vt = vt.unwrap();
        assert_eq!(kt, FieldType::Binary);
        assert_eq!(vt, FieldType::Struct);
        p.skip_field(kt).unwrap();
        p.skip_field(vt).unwrap();
        // total bytes consumed: 1 (size) + 1 (type byte) + (1 + 2) (key) + (2 + 1) (struct) = 8
        assert_eq!(p.position(), 8);
        assert_eq!(bytes.len(), 8);
    }
}
