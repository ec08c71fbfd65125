//! List field storage
//!
//! Two concrete list shapes: a homogeneous primitive sequence and a
//! sequence of nested type values. Mutation goes through the owning
//! document so every operation emits its change event; the methods here
//! are the storage layer underneath that.

use super::primitive::PrimitiveValue;
use super::path::PathError;
use super::type_value::TypeValue;
use crate::schema::PrimitiveType;

/// Ordered homogeneous sequence of one primitive kind.
#[derive(Clone, Debug, PartialEq)]
pub struct PrimitiveList {
    element: PrimitiveType,
    items: Vec<PrimitiveValue>,
}

impl PrimitiveList {
    pub fn new(element: PrimitiveType) -> Self {
        Self {
            element,
            items: Vec::new(),
        }
    }

    pub fn element(&self) -> PrimitiveType {
        self.element
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PrimitiveValue> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrimitiveValue> {
        self.items.iter()
    }

    fn check_kind(&self, value: &PrimitiveValue) -> Result<(), PathError> {
        if value.kind() != self.element {
            return Err(PathError::KindMismatch);
        }
        Ok(())
    }

    pub(crate) fn push(&mut self, value: PrimitiveValue) -> Result<usize, PathError> {
        self.check_kind(&value)?;
        self.items.push(value);
        Ok(self.items.len() - 1)
    }

    /// Overwrite an element, returning the prior value.
    pub(crate) fn set(
        &mut self,
        index: usize,
        value: PrimitiveValue,
    ) -> Result<PrimitiveValue, PathError> {
        self.check_kind(&value)?;
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or(PathError::IndexOutOfRange { index, len })?;
        Ok(std::mem::replace(slot, value))
    }

    pub(crate) fn remove(&mut self, index: usize) -> Result<PrimitiveValue, PathError> {
        if index >= self.items.len() {
            return Err(PathError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    pub(crate) fn clear(&mut self) -> Vec<PrimitiveValue> {
        std::mem::take(&mut self.items)
    }
}

/// Ordered sequence of uniquely-owned nested values. The element schema
/// (and whether elements are polymorphic) lives on the declaring field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeList {
    items: Vec<TypeValue>,
}

impl TypeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TypeValue> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeValue> {
        self.items.iter()
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut TypeValue> {
        self.items.get_mut(index)
    }

    pub(crate) fn push(&mut self, value: TypeValue) -> usize {
        self.items.push(value);
        self.items.len() - 1
    }

    pub(crate) fn remove(&mut self, index: usize) -> Result<TypeValue, PathError> {
        if index >= self.items.len() {
            return Err(PathError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    pub(crate) fn clear(&mut self) -> Vec<TypeValue> {
        std::mem::take(&mut self.items)
    }
}
