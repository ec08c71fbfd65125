//! Document serialization
//!
//! Values are written as a versioned JSON envelope with a single root
//! object. Only materialized fields appear in the output, so a document
//! stores exactly the edits made to it and nothing of the schema's
//! defaults. Every nested value carries its concrete `TypeName`, which is
//! what keeps polymorphic pointer slots intact across a round trip.
//!
//! The per-kind `Type` tags written next to primitive values are
//! documentation for humans diffing documents; the reader decodes from the
//! schema's declared kinds and never trusts them.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::reader::DocumentError;
use super::tree::Document;
use crate::schema::attribute::ids;
use crate::schema::{FieldKind, TypeDatabase};
use crate::value::field_value::FieldValue;
use crate::value::primitive::PrimitiveValue;
use crate::value::type_value::TypeValue;

/// Envelope version stamped on every written document.
pub const DOCUMENT_VERSION: &str = "v1";

/// The versioned outer shape of a document file.
#[derive(Serialize, Deserialize)]
pub(crate) struct Envelope {
    #[serde(rename = "Version")]
    pub version: Option<String>,
    #[serde(rename = "RootData")]
    pub root_data: Option<Value>,
}

/// Serialize a value tree into the versioned document envelope.
pub fn to_json(db: &TypeDatabase, root: &TypeValue) -> Result<Value, DocumentError> {
    Ok(serde_json::to_value(Envelope {
        version: Some(DOCUMENT_VERSION.to_string()),
        root_data: Some(encode_type_value(db, root)?),
    })?)
}

impl Document {
    pub fn to_json(&self) -> Result<Value, DocumentError> {
        to_json(self.database(), self.root())
    }

    pub fn to_pretty_string(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(&self.to_json()?)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        std::fs::write(path, self.to_pretty_string()?)?;
        Ok(())
    }
}

fn encode_type_value(db: &TypeDatabase, value: &TypeValue) -> Result<Value, DocumentError> {
    let ty = value.type_info();
    let mut fields = Map::new();
    for (index, stored) in value.set_fields() {
        let Some(field) = ty.field(index) else { continue };
        if field.attributes().contains(ids::SKIP_SERIALIZATION) {
            continue;
        }
        let encoded = match stored {
            FieldValue::Primitive(v) => json!({
                "Type": v.kind().tag(),
                "Value": encode_primitive(v),
            }),
            FieldValue::Enumeration(ordinal) => json!({
                "Type": "enum",
                "Value": ordinal,
            }),
            FieldValue::PrimitiveList(list) => json!({
                "Type": list.element().tag(),
                "Value": list.iter().map(encode_primitive).collect::<Vec<_>>(),
            }),
            FieldValue::Type(child) => encode_type_value(db, child)?,
            FieldValue::TypeList(list) => {
                let FieldKind::TypeList { element, .. } = field.kind() else {
                    continue;
                };
                let element_name = db
                    .find_type_id(*element)
                    .map(|t| t.name().to_string())
                    .ok_or(crate::value::path::PathError::UnknownType)?;
                let mut encoded = Vec::with_capacity(list.len());
                for item in list.iter() {
                    if item
                        .type_info()
                        .attributes()
                        .contains(ids::SKIP_SERIALIZATION)
                    {
                        continue;
                    }
                    encoded.push(encode_type_value(db, item)?);
                }
                json!({
                    "TypeName": element_name,
                    "Value": encoded,
                })
            }
        };
        fields.insert(field.name().to_string(), encoded);
    }
    Ok(json!({
        "TypeName": ty.name(),
        "Fields": Value::Object(fields),
    }))
}

/// Encode one primitive into its document representation.
///
/// Matrices are written as sixteen numbers in row-major order; `glam`
/// stores column-major, hence the transpose.
fn encode_primitive(value: &PrimitiveValue) -> Value {
    match value {
        PrimitiveValue::Bool(v) => json!(v),
        PrimitiveValue::Char(v) => json!(v.to_string()),
        PrimitiveValue::Int8(v) => json!(v),
        PrimitiveValue::Uint8(v) => json!(v),
        PrimitiveValue::Int16(v) => json!(v),
        PrimitiveValue::Uint16(v) => json!(v),
        PrimitiveValue::Int32(v) => json!(v),
        PrimitiveValue::Uint32(v) => json!(v),
        PrimitiveValue::Int64(v) => json!(v),
        PrimitiveValue::Uint64(v) => json!(v),
        PrimitiveValue::Float32(v) => json!(v),
        PrimitiveValue::Float64(v) => json!(v),
        PrimitiveValue::String(v) => json!(v),
        PrimitiveValue::Vector2(v) => json!({ "X": v.x, "Y": v.y }),
        PrimitiveValue::Vector3(v) => json!({ "X": v.x, "Y": v.y, "Z": v.z }),
        PrimitiveValue::Vector4(v) => json!({ "X": v.x, "Y": v.y, "Z": v.z, "W": v.w }),
        PrimitiveValue::Rectangle(r) => json!({
            "X": r.x,
            "Y": r.y,
            "Width": r.width,
            "Height": r.height,
        }),
        PrimitiveValue::Matrix(m) => json!(m.transpose().to_cols_array().to_vec()),
        PrimitiveValue::Guid(g) => json!(g.to_string()),
        PrimitiveValue::Color(c) => json!([c.r, c.g, c.b, c.a]),
    }
}
