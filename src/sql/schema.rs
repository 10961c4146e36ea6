//! The external catalog: field layout for each base table's `record_buf`.
//!
//! The executor treats a tuple as opaque bytes except when evaluating an
//! expression; the catalog is what lets it interpret named fields as
//! `int64`, `decimal` or `string` at known offsets.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sql::types::{DataType, Decimal, Value};

/// One column's on-disk shape within a table's fixed-size `record_buf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub offset: usize,
    pub length: usize,
}

impl Field {
    /// Byte width a value of this type occupies in a record buffer.
    pub fn width_for(data_type: DataType, declared_length: usize) -> usize {
        match data_type {
            DataType::Integer => 8,
            DataType::Decimal => 12, // i64 mantissa + u32 scale
            DataType::String => declared_length,
        }
    }
}

/// Catalog entry for one base table: field layout plus the total
/// `rec_buff_length` every record in its heap file occupies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub fields: Vec<Field>,
    pub rec_buff_length: usize,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new(), rec_buff_length: 0 }
    }

    /// Appends a field, computing its offset from the fields already present.
    pub fn add_field(&mut self, name: impl Into<String>, data_type: DataType, declared_length: usize) {
        let width = Field::width_for(data_type, declared_length);
        let offset = self.rec_buff_length;
        self.fields.push(Field { name: name.into(), data_type, offset, length: width });
        self.rec_buff_length += width;
    }

    pub fn field(&self, name: &str) -> Result<&Field> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| Error::NotFound(format!("field {name} in table {}", self.name)))
    }

    /// Reads the named field's value out of a record buffer.
    pub fn read_value(&self, buf: &[u8], field_name: &str) -> Result<Value> {
        let field = self.field(field_name)?;
        let slice = buf
            .get(field.offset..field.offset + field.length)
            .ok_or_else(|| Error::Internal(format!("record buffer too short for field {field_name}")))?;
        decode_value(field.data_type, slice)
    }

    /// Writes a value into the field's slot of a record buffer (in place).
    pub fn write_value(&self, buf: &mut [u8], field_name: &str, value: &Value) -> Result<()> {
        let field = self.field(field_name)?;
        let encoded = encode_value(field.data_type, field.length, value)?;
        buf[field.offset..field.offset + field.length].copy_from_slice(&encoded);
        Ok(())
    }
}

pub fn encode_value(data_type: DataType, length: usize, value: &Value) -> Result<Vec<u8>> {
    let mut out = vec![0u8; length];
    match (data_type, value) {
        (_, Value::Null) => {}
        (DataType::Integer, Value::Integer(i)) => out.copy_from_slice(&i.to_le_bytes()),
        (DataType::Decimal, Value::Decimal(d)) => {
            out[0..8].copy_from_slice(&d.mantissa.to_le_bytes());
            out[8..12].copy_from_slice(&d.scale.to_le_bytes());
        }
        (DataType::String, Value::String(s)) => {
            let bytes = s.as_bytes();
            let n = bytes.len().min(length);
            out[0..n].copy_from_slice(&bytes[0..n]);
        }
        (dt, v) => return Err(Error::Internal(format!("type mismatch encoding {v:?} as {dt:?}"))),
    }
    Ok(out)
}

pub fn decode_value(data_type: DataType, slice: &[u8]) -> Result<Value> {
    Ok(match data_type {
        DataType::Integer => {
            let bytes: [u8; 8] = slice
                .get(0..8)
                .ok_or_else(|| Error::Internal("short integer field".into()))?
                .try_into()
                .unwrap();
            Value::Integer(i64::from_le_bytes(bytes))
        }
        DataType::Decimal => {
            let mantissa = i64::from_le_bytes(slice[0..8].try_into().unwrap());
            let scale = u32::from_le_bytes(slice[8..12].try_into().unwrap());
            Value::Decimal(Decimal::new(mantissa, scale))
        }
        DataType::String => {
            let end = slice.iter().position(|&b| b == 0).unwrap_or(slice.len());
            Value::String(String::from_utf8_lossy(&slice[0..end]).into_owned())
        }
    })
}

/// Process-wide mapping from table name to its field layout.
///
/// This is the external catalog supplied by the caller; the planner and
/// executor only ever read from it. `save`/`load` are a convenience for
/// callers that want that catalog to outlive the process rather than
/// being rebuilt from e.g. a `CREATE TABLE` statement on every startup,
/// using bincode for serialization.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    tables: HashMap<String, TableSchema>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, schema: TableSchema) {
        self.tables.insert(schema.name.clone(), schema);
    }

    pub fn table(&self, name: &str) -> Result<&TableSchema> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("table {name}")))
    }

    pub fn has_field(&self, table: &str, field: &str) -> bool {
        self.table(table).map(|t| t.field(field).is_ok()).unwrap_or(false)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = bincode::serialize(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(bincode::deserialize(&bytes)?)
    }
}

#[cfg(test)]
mod catalog_persistence_tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn save_load_round_trips_field_layout() -> Result<()> {
        let mut schema = TableSchema::new("t");
        schema.add_field("a", DataType::Integer, 0);
        schema.add_field("b", DataType::String, 16);
        let mut catalog = Catalog::new();
        catalog.register(schema);

        let path = NamedTempFile::new().unwrap().into_temp_path().keep().unwrap();
        catalog.save(&path)?;
        let loaded = Catalog::load(&path)?;

        let t = loaded.table("t")?;
        assert_eq!(t.rec_buff_length, 24);
        assert_eq!(t.field("b")?.length, 16);
        Ok(())
    }
}
