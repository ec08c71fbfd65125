//! Field descriptors
//!
//! A [`FieldInfo`] describes one declared field slot on a type: its kind
//! (primitive, primitive list, nested type, nested type list, or
//! enumeration), its name, its default, and - for nested slots - pointer
//! and polymorphism metadata. Descriptors are immutable once the schema is
//! built and are append-only within a type: field indices must stay stable
//! for the lifetime of a schema because serialized documents address fields
//! through them (via names resolved against them).

use super::attribute::AttributeContainer;
use super::hash::TypeId;
use crate::value::primitive::PrimitiveValue;

/// Closed set of scalar kinds a primitive field or list element can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Bool,
    Char,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    String,
    Vector2,
    Vector3,
    Vector4,
    Rectangle,
    Matrix,
    Guid,
    Color,
}

impl PrimitiveType {
    /// Every enumerator, for exhaustive dispatch tables and tests.
    pub const ALL: [PrimitiveType; 20] = [
        PrimitiveType::Bool,
        PrimitiveType::Char,
        PrimitiveType::Int8,
        PrimitiveType::Uint8,
        PrimitiveType::Int16,
        PrimitiveType::Uint16,
        PrimitiveType::Int32,
        PrimitiveType::Uint32,
        PrimitiveType::Int64,
        PrimitiveType::Uint64,
        PrimitiveType::Float32,
        PrimitiveType::Float64,
        PrimitiveType::String,
        PrimitiveType::Vector2,
        PrimitiveType::Vector3,
        PrimitiveType::Vector4,
        PrimitiveType::Rectangle,
        PrimitiveType::Matrix,
        PrimitiveType::Guid,
        PrimitiveType::Color,
    ];

    /// Tag string written next to values in documents.
    ///
    /// Documentation metadata only: the reader decodes from the schema's
    /// declared kind, never from this string.
    pub fn tag(&self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Char => "char",
            PrimitiveType::Int8 => "int8",
            PrimitiveType::Uint8 => "uint8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::Uint16 => "uint16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Uint32 => "uint32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::Uint64 => "uint64",
            PrimitiveType::Float32 => "float",
            PrimitiveType::Float64 => "double",
            PrimitiveType::String => "string",
            PrimitiveType::Vector2 => "vector2",
            PrimitiveType::Vector3 => "vector3",
            PrimitiveType::Vector4 => "vector4",
            PrimitiveType::Rectangle => "rectangle",
            PrimitiveType::Matrix => "matrix",
            PrimitiveType::Guid => "GUID",
            PrimitiveType::Color => "color",
        }
    }
}

/// What a field slot holds. Fields never change kind after creation.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    /// Scalar primitive with a declared default.
    Primitive { default: PrimitiveValue },

    /// Ordered homogeneous sequence of one primitive kind.
    PrimitiveList { element: PrimitiveType },

    /// A single nested value.
    ///
    /// When `pointer` is set the slot is polymorphic: any type derived from
    /// `declared` may occupy it. `default_pointer` names the concrete type
    /// pre-materialized when a value of the owning type is constructed; a
    /// pointer slot without one stays unset until explicitly assigned.
    Type {
        declared: TypeId,
        pointer: bool,
        default_pointer: Option<TypeId>,
    },

    /// Ordered sequence of nested values, optionally pointer elements.
    TypeList { element: TypeId, pointer: bool },

    /// Int32 ordinal validated only against a registered enumeration.
    Enumeration { enumeration: TypeId, default: i32 },
}

/// Schema for one field slot on a type.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldInfo {
    name: String,
    kind: FieldKind,
    attributes: AttributeContainer,
}

impl FieldInfo {
    pub(crate) fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            attributes: AttributeContainer::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn attributes(&self) -> &AttributeContainer {
        &self.attributes
    }

    /// Attribute attachment during schema declaration.
    pub fn attach(&mut self, attribute: super::attribute::Attribute) -> &mut Self {
        self.attributes.attach(attribute);
        self
    }

    /// Declared default for a primitive field, if this is one.
    pub fn primitive_default(&self) -> Option<&PrimitiveValue> {
        match &self.kind {
            FieldKind::Primitive { default } => Some(default),
            _ => None,
        }
    }
}
