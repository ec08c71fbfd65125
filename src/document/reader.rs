//! Document parsing
//!
//! The reader walks the JSON envelope against the schema: every field is
//! decoded from its declared kind, so a document can never change a field's
//! shape. Field names the schema no longer declares are skipped so that
//! documents survive schema evolution; anything structurally malformed
//! fails the whole load with a [`DocumentError`]. There are no partially
//! loaded documents.

use std::path::Path;
use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3, Vec4};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::tree::Document;
use super::writer::{DOCUMENT_VERSION, Envelope};
use crate::schema::{FieldKind, PrimitiveType, TypeDatabase};
use crate::value::field_value::FieldValue;
use crate::value::list::{PrimitiveList, TypeList};
use crate::value::path::PathError;
use crate::value::primitive::{Color, PrimitiveValue, Rect};
use crate::value::type_value::TypeValue;

/// Why a document failed to load or save.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document i/o failed")]
    Io(#[from] std::io::Error),

    #[error("document is not valid JSON")]
    Json(#[from] serde_json::Error),

    #[error("document is empty")]
    EmptyDocument,

    #[error("document has no RootData object")]
    MissingRootData,

    #[error("value object at {context} has no TypeName")]
    MissingTypeName { context: String },

    #[error("document references unknown type {0:?}")]
    UnknownType(String),

    #[error("unexpected JSON shape at {context}")]
    BadShape { context: String },

    #[error(transparent)]
    Path(#[from] PathError),
}

fn bad(context: impl Into<String>) -> DocumentError {
    DocumentError::BadShape {
        context: context.into(),
    }
}

impl Document {
    /// Load a document from disk. A missing or empty file is an error; a
    /// fresh document is made with [`Document::new`], never by loading.
    pub fn load(
        database: &Arc<TypeDatabase>,
        path: impl AsRef<Path>,
    ) -> Result<Document, DocumentError> {
        let text = std::fs::read_to_string(path)?;
        Document::parse(database, &text)
    }

    /// Parse a document from JSON text.
    pub fn parse(database: &Arc<TypeDatabase>, text: &str) -> Result<Document, DocumentError> {
        if text.trim().is_empty() {
            return Err(DocumentError::EmptyDocument);
        }
        let json: Value = serde_json::from_str(text)?;
        Document::from_json(database, &json)
    }

    /// Build a document from an already-parsed JSON envelope.
    pub fn from_json(
        database: &Arc<TypeDatabase>,
        json: &Value,
    ) -> Result<Document, DocumentError> {
        let envelope = Envelope::deserialize(json)?;
        match envelope.version.as_deref() {
            Some(DOCUMENT_VERSION) => {}
            Some(other) => warn!("document version {other:?} is not {DOCUMENT_VERSION:?}"),
            None => warn!("document carries no version stamp"),
        }
        let root_data = envelope.root_data.ok_or(DocumentError::MissingRootData)?;
        let root = decode_type_value(database, &root_data, "RootData")?;
        Ok(Document::from_root(database.clone(), root))
    }
}

fn decode_type_value(
    db: &TypeDatabase,
    json: &Value,
    context: &str,
) -> Result<TypeValue, DocumentError> {
    let obj = json.as_object().ok_or_else(|| bad(context))?;
    let name = obj
        .get("TypeName")
        .and_then(Value::as_str)
        .ok_or_else(|| DocumentError::MissingTypeName {
            context: context.to_string(),
        })?;
    let ty = db
        .find_type(name)
        .ok_or_else(|| DocumentError::UnknownType(name.to_string()))?
        .clone();
    let mut value = TypeValue::new(db, &ty);

    let Some(fields) = obj.get("Fields") else {
        return Ok(value);
    };
    let fields = fields.as_object().ok_or_else(|| bad(context))?;
    for (field_name, field_json) in fields {
        let Some(index) = ty.field_index(field_name) else {
            debug!("skipping unknown field {field_name:?} on {name}");
            continue;
        };
        let Some(field) = ty.field(index) else { continue };
        let context = format!("{context}.{field_name}");
        match field.kind().clone() {
            FieldKind::Primitive { default } => {
                let inner = field_json.get("Value").ok_or_else(|| bad(&context))?;
                let decoded = decode_primitive(default.kind(), inner, &context)?;
                value.insert_field(index, FieldValue::Primitive(decoded));
            }
            FieldKind::Enumeration { .. } => {
                let ordinal = field_json
                    .get("Value")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| bad(&context))?;
                let ordinal = i32::try_from(ordinal).map_err(|_| bad(&context))?;
                value.insert_field(index, FieldValue::Enumeration(ordinal));
            }
            FieldKind::PrimitiveList { element } => {
                let items = field_json
                    .get("Value")
                    .and_then(Value::as_array)
                    .ok_or_else(|| bad(&context))?;
                let mut list = PrimitiveList::new(element);
                for item in items {
                    list.push(decode_primitive(element, item, &context)?)?;
                }
                value.insert_field(index, FieldValue::PrimitiveList(list));
            }
            FieldKind::Type { declared, .. } => {
                let child = decode_type_value(db, field_json, &context)?;
                let base = db.find_type_id(declared).ok_or(PathError::UnknownType)?;
                if !child.type_info().is_derived_from(base) {
                    return Err(PathError::NotDerived.into());
                }
                value.insert_field(index, FieldValue::Type(child));
            }
            FieldKind::TypeList { element, .. } => {
                let items = field_json
                    .get("Value")
                    .and_then(Value::as_array)
                    .ok_or_else(|| bad(&context))?;
                let base = db.find_type_id(element).ok_or(PathError::UnknownType)?;
                let mut list = TypeList::new();
                for (i, item) in items.iter().enumerate() {
                    let child = decode_type_value(db, item, &format!("{context}[{i}]"))?;
                    if !child.type_info().is_derived_from(base) {
                        return Err(PathError::NotDerived.into());
                    }
                    list.push(child);
                }
                value.insert_field(index, FieldValue::TypeList(list));
            }
        }
    }
    Ok(value)
}

fn as_f32(json: &Value, context: &str) -> Result<f32, DocumentError> {
    Ok(json.as_f64().ok_or_else(|| bad(context))? as f32)
}

fn component(obj: &serde_json::Map<String, Value>, key: &str, context: &str) -> Result<f32, DocumentError> {
    as_f32(obj.get(key).ok_or_else(|| bad(context))?, context)
}

/// Decode one primitive from its document representation. The expected
/// kind comes from the schema, never from the document.
fn decode_primitive(
    kind: PrimitiveType,
    json: &Value,
    context: &str,
) -> Result<PrimitiveValue, DocumentError> {
    let int = |json: &Value| json.as_i64().ok_or_else(|| bad(context));
    let decoded = match kind {
        PrimitiveType::Bool => PrimitiveValue::Bool(json.as_bool().ok_or_else(|| bad(context))?),
        PrimitiveType::Char => {
            let text = json.as_str().ok_or_else(|| bad(context))?;
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => PrimitiveValue::Char(c),
                _ => return Err(bad(context)),
            }
        }
        PrimitiveType::Int8 => {
            PrimitiveValue::Int8(i8::try_from(int(json)?).map_err(|_| bad(context))?)
        }
        PrimitiveType::Uint8 => {
            PrimitiveValue::Uint8(u8::try_from(int(json)?).map_err(|_| bad(context))?)
        }
        PrimitiveType::Int16 => {
            PrimitiveValue::Int16(i16::try_from(int(json)?).map_err(|_| bad(context))?)
        }
        PrimitiveType::Uint16 => {
            PrimitiveValue::Uint16(u16::try_from(int(json)?).map_err(|_| bad(context))?)
        }
        PrimitiveType::Int32 => {
            PrimitiveValue::Int32(i32::try_from(int(json)?).map_err(|_| bad(context))?)
        }
        PrimitiveType::Uint32 => {
            PrimitiveValue::Uint32(u32::try_from(int(json)?).map_err(|_| bad(context))?)
        }
        PrimitiveType::Int64 => PrimitiveValue::Int64(int(json)?),
        PrimitiveType::Uint64 => {
            PrimitiveValue::Uint64(json.as_u64().ok_or_else(|| bad(context))?)
        }
        PrimitiveType::Float32 => PrimitiveValue::Float32(as_f32(json, context)?),
        PrimitiveType::Float64 => {
            PrimitiveValue::Float64(json.as_f64().ok_or_else(|| bad(context))?)
        }
        PrimitiveType::String => {
            PrimitiveValue::String(json.as_str().ok_or_else(|| bad(context))?.to_string())
        }
        PrimitiveType::Vector2 => {
            let obj = json.as_object().ok_or_else(|| bad(context))?;
            PrimitiveValue::Vector2(Vec2::new(
                component(obj, "X", context)?,
                component(obj, "Y", context)?,
            ))
        }
        PrimitiveType::Vector3 => {
            let obj = json.as_object().ok_or_else(|| bad(context))?;
            PrimitiveValue::Vector3(Vec3::new(
                component(obj, "X", context)?,
                component(obj, "Y", context)?,
                component(obj, "Z", context)?,
            ))
        }
        PrimitiveType::Vector4 => {
            let obj = json.as_object().ok_or_else(|| bad(context))?;
            PrimitiveValue::Vector4(Vec4::new(
                component(obj, "X", context)?,
                component(obj, "Y", context)?,
                component(obj, "Z", context)?,
                component(obj, "W", context)?,
            ))
        }
        PrimitiveType::Rectangle => {
            let obj = json.as_object().ok_or_else(|| bad(context))?;
            PrimitiveValue::Rectangle(Rect::new(
                component(obj, "X", context)?,
                component(obj, "Y", context)?,
                component(obj, "Width", context)?,
                component(obj, "Height", context)?,
            ))
        }
        PrimitiveType::Matrix => {
            let items = json.as_array().ok_or_else(|| bad(context))?;
            if items.len() != 16 {
                return Err(bad(context));
            }
            let mut numbers = [0.0f32; 16];
            for (slot, item) in numbers.iter_mut().zip(items) {
                *slot = as_f32(item, context)?;
            }
            // Documents store row-major; glam is column-major
            PrimitiveValue::Matrix(Mat4::from_cols_array(&numbers).transpose())
        }
        PrimitiveType::Guid => {
            let text = json.as_str().ok_or_else(|| bad(context))?;
            PrimitiveValue::Guid(Uuid::parse_str(text).map_err(|_| bad(context))?)
        }
        PrimitiveType::Color => {
            let items = json.as_array().ok_or_else(|| bad(context))?;
            if items.len() != 4 {
                return Err(bad(context));
            }
            let mut channels = [0u8; 4];
            for (slot, item) in channels.iter_mut().zip(items) {
                *slot = u8::try_from(int(item)?).map_err(|_| bad(context))?;
            }
            PrimitiveValue::Color(Color::new(channels[0], channels[1], channels[2], channels[3]))
        }
    };
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaBuilder, TypeBuilder};
    use crate::value::path::FieldPath;
    use serde_json::json;

    fn line_db() -> Arc<TypeDatabase> {
        let mut schema = SchemaBuilder::new();

        let mut point = TypeBuilder::new("Point");
        point.primitive("X", 0.0f32);
        point.primitive("Y", 0.0f32);
        schema.add_type(point);

        let mut line = TypeBuilder::new("Line");
        line.nested("Start", "Point");
        line.nested("End", "Point");
        line.primitive("Label", "");
        schema.add_type(line);

        Arc::new(schema.build().unwrap())
    }

    fn brush_db() -> Arc<TypeDatabase> {
        let mut schema = SchemaBuilder::new();

        let mut brush = TypeBuilder::new("Brush");
        brush.primitive("Radius", 1.0f32);
        schema.add_type(brush);

        let mut erosion = TypeBuilder::derived("ErosionBrush", "Brush");
        erosion.primitive("Strength", 0.5f32);
        schema.add_type(erosion);

        let mut palette = TypeBuilder::new("Palette");
        palette.pointer("Active", "Brush", None);
        palette.pointer_list("Brushes", "Brush");
        schema.add_type(palette);

        Arc::new(schema.build().unwrap())
    }

    #[test]
    fn test_only_edited_fields_serialize() {
        let db = line_db();
        let line = db.find_type("Line").unwrap().clone();
        let mut doc = Document::new(db.clone(), &line);
        doc.set_primitive(&FieldPath::field(0).child(0), 1.5f32)
            .unwrap();

        let json = doc.to_json().unwrap();
        assert_eq!(json["Version"], "v1");
        let fields = json["RootData"]["Fields"].as_object().unwrap();
        assert_eq!(fields.len(), 1);
        let start = fields["Start"]["Fields"].as_object().unwrap();
        assert_eq!(start.len(), 1);
        assert_eq!(start["X"]["Value"], 1.5);
    }

    #[test]
    fn test_round_trip_restores_edits_and_defaults() {
        let db = line_db();
        let line = db.find_type("Line").unwrap().clone();
        let mut doc = Document::new(db.clone(), &line);
        let start_x = FieldPath::field(0).child(0);
        doc.set_primitive(&start_x, 1.5f32).unwrap();

        let text = doc.to_pretty_string().unwrap();
        let loaded = Document::parse(&db, &text).unwrap();

        assert_eq!(
            loaded.primitive_at(&start_x),
            Some(PrimitiveValue::Float32(1.5))
        );
        // Untouched fields read back as declared defaults
        assert_eq!(
            loaded.primitive_at(&FieldPath::field(0).child(1)),
            Some(PrimitiveValue::Float32(0.0))
        );
        assert_eq!(
            loaded.primitive_at(&FieldPath::field(2)),
            Some(PrimitiveValue::String(String::new()))
        );
        assert_eq!(loaded.root(), doc.root());
    }

    fn sample_value(kind: PrimitiveType) -> PrimitiveValue {
        match kind {
            PrimitiveType::Bool => true.into(),
            PrimitiveType::Char => 'k'.into(),
            PrimitiveType::Int8 => (-8i8).into(),
            PrimitiveType::Uint8 => 8u8.into(),
            PrimitiveType::Int16 => (-16i16).into(),
            PrimitiveType::Uint16 => 16u16.into(),
            PrimitiveType::Int32 => (-32i32).into(),
            PrimitiveType::Uint32 => 32u32.into(),
            PrimitiveType::Int64 => (-64i64).into(),
            PrimitiveType::Uint64 => 64u64.into(),
            PrimitiveType::Float32 => 1.5f32.into(),
            PrimitiveType::Float64 => 2.25f64.into(),
            PrimitiveType::String => "ridge".into(),
            PrimitiveType::Vector2 => Vec2::new(1.0, 2.0).into(),
            PrimitiveType::Vector3 => Vec3::new(1.0, 2.0, 3.0).into(),
            PrimitiveType::Vector4 => Vec4::new(1.0, 2.0, 3.0, 4.0).into(),
            PrimitiveType::Rectangle => Rect::new(1.0, 2.0, 16.0, 9.0).into(),
            PrimitiveType::Matrix => Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0)).into(),
            PrimitiveType::Guid => Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8")
                .unwrap()
                .into(),
            PrimitiveType::Color => Color::new(10, 20, 30, 200).into(),
        }
    }

    #[test]
    fn test_round_trip_every_primitive_kind() {
        let mut schema = SchemaBuilder::new();
        let mut sample = TypeBuilder::new("Sample");
        for kind in PrimitiveType::ALL {
            sample.primitive(kind.tag(), PrimitiveValue::default_of(kind));
        }
        schema.add_type(sample);
        let db = Arc::new(schema.build().unwrap());

        let sample = db.find_type("Sample").unwrap().clone();
        let mut doc = Document::new(db.clone(), &sample);
        for (i, kind) in PrimitiveType::ALL.iter().enumerate() {
            doc.set_primitive(&FieldPath::field(i as u32), sample_value(*kind))
                .unwrap();
        }

        let text = doc.to_pretty_string().unwrap();
        let loaded = Document::parse(&db, &text).unwrap();
        assert_eq!(loaded.root(), doc.root());
        for (i, kind) in PrimitiveType::ALL.iter().enumerate() {
            assert_eq!(
                loaded.primitive_at(&FieldPath::field(i as u32)),
                Some(sample_value(*kind)),
                "kind {:?} did not survive the round trip",
                kind
            );
        }
    }

    #[test]
    fn test_unknown_field_names_skipped() {
        let db = line_db();
        let json = json!({
            "Version": "v1",
            "RootData": {
                "TypeName": "Line",
                "Fields": {
                    "Retired": { "Type": "float", "Value": 9.0 },
                    "Label": { "Type": "string", "Value": "ridge" },
                },
            },
        });
        let doc = Document::from_json(&db, &json).unwrap();
        assert_eq!(
            doc.primitive_at(&FieldPath::field(2)),
            Some(PrimitiveValue::String("ridge".into()))
        );
        assert!(!doc.root().is_set(0));
    }

    #[test]
    fn test_polymorphic_pointer_round_trip() {
        let db = brush_db();
        let palette = db.find_type("Palette").unwrap().clone();
        let mut doc = Document::new(db.clone(), &palette);

        doc.set_type_pointer(&FieldPath::field(0), "ErosionBrush")
            .unwrap();
        doc.set_primitive(&FieldPath::field(0).child(1), 0.9f32)
            .unwrap();
        doc.push_type(&FieldPath::field(1), Some("ErosionBrush"))
            .unwrap();

        let text = doc.to_pretty_string().unwrap();
        let loaded = Document::parse(&db, &text).unwrap();

        let active = loaded.root().child(0).unwrap();
        assert_eq!(active.type_info().name(), "ErosionBrush");
        assert_eq!(active.primitive(1), Some(PrimitiveValue::Float32(0.9)));
        assert_eq!(
            loaded
                .root()
                .type_list(1)
                .unwrap()
                .get(0)
                .unwrap()
                .type_info()
                .name(),
            "ErosionBrush"
        );
    }

    #[test]
    fn test_pointer_not_derived_fails_load() {
        let db = brush_db();
        let json = json!({
            "Version": "v1",
            "RootData": {
                "TypeName": "Palette",
                "Fields": {
                    "Active": { "TypeName": "Palette", "Fields": {} },
                },
            },
        });
        assert!(matches!(
            Document::from_json(&db, &json),
            Err(DocumentError::Path(PathError::NotDerived))
        ));
    }

    #[test]
    fn test_malformed_documents_fail_whole_load() {
        let db = line_db();
        assert!(matches!(
            Document::parse(&db, "   "),
            Err(DocumentError::EmptyDocument)
        ));
        assert!(matches!(
            Document::parse(&db, "{not json"),
            Err(DocumentError::Json(_))
        ));
        assert!(matches!(
            Document::parse(&db, "{\"Version\": \"v1\"}"),
            Err(DocumentError::MissingRootData)
        ));
        assert!(matches!(
            Document::from_json(&db, &json!({ "RootData": { "TypeName": "Ghost" } })),
            Err(DocumentError::UnknownType(name)) if name == "Ghost"
        ));
        // A field with the wrong shape poisons the load, not just the field
        let json = json!({
            "Version": "v1",
            "RootData": {
                "TypeName": "Line",
                "Fields": { "Label": { "Type": "string", "Value": 7 } },
            },
        });
        assert!(matches!(
            Document::from_json(&db, &json),
            Err(DocumentError::BadShape { .. })
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let db = line_db();
        let line = db.find_type("Line").unwrap().clone();
        let mut doc = Document::new(db.clone(), &line);
        doc.set_primitive(&FieldPath::field(2), "ravine").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line.doc.json");
        doc.save(&path).unwrap();

        let loaded = Document::load(&db, &path).unwrap();
        assert_eq!(loaded.root(), doc.root());
        assert!(Document::load(&db, dir.path().join("missing.doc.json")).is_err());
    }

    #[test]
    fn test_primitive_decoding_edge_cases() {
        let matrix = json!([
            1.0, 0.0, 0.0, 4.0,
            0.0, 1.0, 0.0, 5.0,
            0.0, 0.0, 1.0, 6.0,
            0.0, 0.0, 0.0, 1.0
        ]);
        let decoded = decode_primitive(PrimitiveType::Matrix, &matrix, "m").unwrap();
        assert_eq!(
            decoded,
            PrimitiveValue::Matrix(Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0)))
        );

        assert!(decode_primitive(PrimitiveType::Char, &json!("ab"), "c").is_err());
        assert!(decode_primitive(PrimitiveType::Uint8, &json!(300), "u").is_err());
        assert!(decode_primitive(PrimitiveType::Guid, &json!("nope"), "g").is_err());
        assert_eq!(
            decode_primitive(PrimitiveType::Color, &json!([1, 2, 3, 4]), "col").unwrap(),
            PrimitiveValue::Color(Color::new(1, 2, 3, 4))
        );
    }
}
