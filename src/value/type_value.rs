//! Type value storage
//!
//! A [`TypeValue`] is one instance of a declared type: a sparse ordered map
//! from global field index to stored [`FieldValue`]. A field absent from
//! the map reads as its declared default without materializing storage;
//! writing creates storage lazily, and resetting removes the entry again.
//! Ownership is strictly top-down: dropping a value drops its whole
//! subtree. Mutation routes through [`crate::document::Document`] so that
//! change events are emitted exactly once per operation.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::field_value::FieldValue;
use super::list::{PrimitiveList, TypeList};
use super::path::PathError;
use super::primitive::PrimitiveValue;
use crate::schema::{FieldKind, TypeDatabase, TypeInfo};

/// One instance of a declared type.
#[derive(Clone, Debug)]
pub struct TypeValue {
    ty: Arc<TypeInfo>,
    fields: BTreeMap<u32, FieldValue>,
}

impl TypeValue {
    /// Construct a fresh value bound to `ty`.
    ///
    /// Pointer fields that declare a concrete default type are
    /// pre-materialized, so such slots are never unset after binding.
    pub fn new(db: &TypeDatabase, ty: &Arc<TypeInfo>) -> Self {
        let mut value = Self {
            ty: ty.clone(),
            fields: BTreeMap::new(),
        };
        for index in 0..ty.field_count() {
            let Some(field) = ty.field(index) else { continue };
            if let FieldKind::Type {
                pointer: true,
                default_pointer: Some(concrete),
                ..
            } = field.kind()
            {
                if let Some(concrete) = db.find_type_id(*concrete) {
                    value
                        .fields
                        .insert(index, FieldValue::Type(TypeValue::new(db, concrete)));
                }
            }
        }
        value
    }

    pub fn type_info(&self) -> &Arc<TypeInfo> {
        &self.ty
    }

    /// True when no field has materialized storage.
    ///
    /// Note this detects "every field at default" only for values whose
    /// fields were never touched: a field written back to a value
    /// content-equal to its default stays materialized until reset.
    pub fn is_default(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether a field has materialized storage.
    pub fn is_set(&self, index: u32) -> bool {
        self.fields.contains_key(&index)
    }

    /// Raw storage for one field, if materialized.
    pub fn field_value(&self, index: u32) -> Option<&FieldValue> {
        self.fields.get(&index)
    }

    /// Materialized fields in index order. The writer walks this, which is
    /// how default fields stay out of serialized documents.
    pub fn set_fields(&self) -> impl Iterator<Item = (u32, &FieldValue)> {
        self.fields.iter().map(|(i, v)| (*i, v))
    }

    /// Typed read of a primitive field: the stored value, or the declared
    /// default when unset. `None` when the index is out of range or the
    /// field is not a scalar primitive.
    pub fn primitive(&self, index: u32) -> Option<PrimitiveValue> {
        if let Some(stored) = self.fields.get(&index) {
            return stored.as_primitive().cloned();
        }
        self.ty.field(index)?.primitive_default().cloned()
    }

    /// Typed read of an enumeration field, falling back to its declared
    /// default ordinal.
    pub fn enumeration(&self, index: u32) -> Option<i32> {
        if let Some(stored) = self.fields.get(&index) {
            return match stored {
                FieldValue::Enumeration(v) => Some(*v),
                _ => None,
            };
        }
        match self.ty.field(index)?.kind() {
            FieldKind::Enumeration { default, .. } => Some(*default),
            _ => None,
        }
    }

    /// Nested value of a type field, if materialized.
    pub fn child(&self, index: u32) -> Option<&TypeValue> {
        self.fields.get(&index)?.as_type()
    }

    /// Primitive list storage, if materialized.
    pub fn primitive_list(&self, index: u32) -> Option<&PrimitiveList> {
        self.fields.get(&index)?.as_primitive_list()
    }

    /// Type list storage, if materialized.
    pub fn type_list(&self, index: u32) -> Option<&TypeList> {
        self.fields.get(&index)?.as_type_list()
    }

    fn field_kind(&self, index: u32) -> Result<&FieldKind, PathError> {
        self.ty
            .field(index)
            .map(|f| f.kind())
            .ok_or(PathError::NoSuchField { index })
    }

    /// Scalar write: lazily materializes storage, returns the prior value
    /// (the declared default when the field was unset).
    pub(crate) fn write_primitive(
        &mut self,
        index: u32,
        value: PrimitiveValue,
    ) -> Result<PrimitiveValue, PathError> {
        let default = match self.field_kind(index)? {
            FieldKind::Primitive { default } => default.clone(),
            _ => return Err(PathError::KindMismatch),
        };
        if value.kind() != default.kind() {
            return Err(PathError::KindMismatch);
        }
        let old = match self.fields.insert(index, FieldValue::Primitive(value)) {
            Some(FieldValue::Primitive(prior)) => prior,
            _ => default,
        };
        Ok(old)
    }

    /// Enumeration write; the ordinal is not validated against the
    /// enumeration's declared members.
    pub(crate) fn write_enumeration(
        &mut self,
        index: u32,
        value: i32,
    ) -> Result<i32, PathError> {
        let default = match self.field_kind(index)? {
            FieldKind::Enumeration { default, .. } => *default,
            _ => return Err(PathError::KindMismatch),
        };
        let old = match self.fields.insert(index, FieldValue::Enumeration(value)) {
            Some(FieldValue::Enumeration(prior)) => prior,
            _ => default,
        };
        Ok(old)
    }

    /// Remove a field's storage, returning what was stored. Resetting an
    /// already-default field is a no-op.
    pub(crate) fn reset(&mut self, index: u32) -> Result<Option<FieldValue>, PathError> {
        self.field_kind(index)?;
        Ok(self.fields.remove(&index))
    }

    /// Nested value of a type field, materializing it on first access.
    ///
    /// Non-pointer fields materialize their declared type; pointer fields
    /// materialize their default concrete type, or fail with
    /// [`PathError::PointerUnset`] when none is declared.
    pub(crate) fn ensure_child(
        &mut self,
        db: &TypeDatabase,
        index: u32,
    ) -> Result<&mut TypeValue, PathError> {
        if !self.fields.contains_key(&index) {
            let (declared, pointer, default_pointer) = match self.field_kind(index)? {
                FieldKind::Type {
                    declared,
                    pointer,
                    default_pointer,
                } => (*declared, *pointer, *default_pointer),
                _ => return Err(PathError::KindMismatch),
            };
            let concrete = if pointer {
                default_pointer.ok_or(PathError::PointerUnset)?
            } else {
                declared
            };
            let concrete = db.find_type_id(concrete).ok_or(PathError::UnknownType)?;
            self.fields
                .insert(index, FieldValue::Type(TypeValue::new(db, concrete)));
        }
        match self.fields.get_mut(&index) {
            Some(FieldValue::Type(child)) => Ok(child),
            _ => Err(PathError::KindMismatch),
        }
    }

    /// Replace the nested value with a fresh value of `concrete`, unless
    /// the existing value is already exactly that type (no-op). This is how
    /// polymorphic pointer slots receive a concrete derived type.
    pub(crate) fn set_pointer(
        &mut self,
        db: &TypeDatabase,
        index: u32,
        concrete: &Arc<TypeInfo>,
    ) -> Result<(), PathError> {
        let declared = match self.field_kind(index)? {
            FieldKind::Type { declared, .. } => *declared,
            _ => return Err(PathError::KindMismatch),
        };
        let base = db.find_type_id(declared).ok_or(PathError::UnknownType)?;
        if !concrete.is_derived_from(base) {
            return Err(PathError::NotDerived);
        }
        if let Some(FieldValue::Type(existing)) = self.fields.get(&index) {
            if existing.type_info().id() == concrete.id() {
                return Ok(());
            }
        }
        // Prior value (and its subtree) is destroyed by the replacement
        self.fields
            .insert(index, FieldValue::Type(TypeValue::new(db, concrete)));
        Ok(())
    }

    /// Primitive list storage, materializing an empty list on first access.
    pub(crate) fn ensure_primitive_list(
        &mut self,
        index: u32,
    ) -> Result<&mut PrimitiveList, PathError> {
        if !self.fields.contains_key(&index) {
            let element = match self.field_kind(index)? {
                FieldKind::PrimitiveList { element } => *element,
                _ => return Err(PathError::KindMismatch),
            };
            self.fields
                .insert(index, FieldValue::PrimitiveList(PrimitiveList::new(element)));
        }
        match self.fields.get_mut(&index) {
            Some(FieldValue::PrimitiveList(list)) => Ok(list),
            _ => Err(PathError::KindMismatch),
        }
    }

    /// Type list storage, materializing an empty list on first access.
    /// Returns the list and the declared element schema.
    pub(crate) fn ensure_type_list(
        &mut self,
        index: u32,
    ) -> Result<(&mut TypeList, crate::schema::TypeId, bool), PathError> {
        let (element, pointer) = match self.field_kind(index)? {
            FieldKind::TypeList { element, pointer } => (*element, *pointer),
            _ => return Err(PathError::KindMismatch),
        };
        self.fields
            .entry(index)
            .or_insert_with(|| FieldValue::TypeList(TypeList::new()));
        match self.fields.get_mut(&index) {
            Some(FieldValue::TypeList(list)) => Ok((list, element, pointer)),
            _ => Err(PathError::KindMismatch),
        }
    }

    pub(crate) fn insert_field(&mut self, index: u32, value: FieldValue) {
        self.fields.insert(index, value);
    }
}

impl PartialEq for TypeValue {
    fn eq(&self, other: &Self) -> bool {
        self.ty.id() == other.ty.id() && self.fields == other.fields
    }
}
