//! Stored field data
//!
//! One closed variant per field kind. A field absent from its owner's
//! storage map is semantically at its declared default; these variants only
//! exist for fields that have been written.

use super::list::{PrimitiveList, TypeList};
use super::primitive::PrimitiveValue;
use super::type_value::TypeValue;

/// The stored data for one field occurrence.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Primitive(PrimitiveValue),
    Enumeration(i32),
    PrimitiveList(PrimitiveList),
    Type(TypeValue),
    TypeList(TypeList),
}

impl FieldValue {
    pub fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            FieldValue::Primitive(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeValue> {
        match self {
            FieldValue::Type(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_primitive_list(&self) -> Option<&PrimitiveList> {
        match self {
            FieldValue::PrimitiveList(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_type_list(&self) -> Option<&TypeList> {
        match self {
            FieldValue::TypeList(v) => Some(v),
            _ => None,
        }
    }
}
