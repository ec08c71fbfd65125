//! The type registry
//!
//! A [`TypeDatabase`] is the frozen result of a [`super::builder::SchemaBuilder`]:
//! every declared type and enumeration keyed by its hashed name. Lookups
//! return `Option` because a miss is a normal caller-side branch (for
//! example probing whether a document's root type is known). The database
//! is immutable after build and shared via `Arc`, so the read-mostly
//! discipline the embedding tool needs falls out of the type system.

use std::collections::HashMap;
use std::sync::Arc;

use super::enumeration::EnumerationInfo;
use super::hash::TypeId;
use super::type_info::TypeInfo;

/// Immutable registry of every declared type and enumeration.
pub struct TypeDatabase {
    types: HashMap<TypeId, Arc<TypeInfo>>,
    enumerations: HashMap<TypeId, Arc<EnumerationInfo>>,
}

impl TypeDatabase {
    pub(crate) fn new(
        types: HashMap<TypeId, Arc<TypeInfo>>,
        enumerations: HashMap<TypeId, Arc<EnumerationInfo>>,
    ) -> Self {
        Self {
            types,
            enumerations,
        }
    }

    pub fn find_type(&self, name: &str) -> Option<&Arc<TypeInfo>> {
        self.find_type_id(TypeId::of(name))
    }

    pub fn find_type_id(&self, id: TypeId) -> Option<&Arc<TypeInfo>> {
        self.types.get(&id)
    }

    pub fn find_enumeration(&self, name: &str) -> Option<&Arc<EnumerationInfo>> {
        self.find_enumeration_id(TypeId::of(name))
    }

    pub fn find_enumeration_id(&self, id: TypeId) -> Option<&Arc<EnumerationInfo>> {
        self.enumerations.get(&id)
    }

    /// True iff `possible_base` appears in `test`'s parent chain, the type
    /// itself included.
    pub fn is_base_of(&self, test: &TypeInfo, possible_base: &TypeInfo) -> bool {
        test.is_derived_from(possible_base)
    }

    /// All registered types derived from `base` (including `base` itself),
    /// sorted by name. Used by asset-type discovery to enumerate everything
    /// under a root asset type.
    pub fn types_derived_from(&self, base: &TypeInfo) -> Vec<Arc<TypeInfo>> {
        let mut derived: Vec<Arc<TypeInfo>> = self
            .types
            .values()
            .filter(|ty| ty.is_derived_from(base))
            .cloned()
            .collect();
        derived.sort_by(|a, b| a.name().cmp(b.name()));
        derived
    }

    pub fn types(&self) -> impl Iterator<Item = &Arc<TypeInfo>> {
        self.types.values()
    }

    pub fn enumerations(&self) -> impl Iterator<Item = &Arc<EnumerationInfo>> {
        self.enumerations.values()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}
