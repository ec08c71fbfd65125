//! Type schemas
//!
//! A [`TypeInfo`] is the immutable schema for one declared type: its own
//! ordered fields, an optional parent (single inheritance), and attributes.
//! Field indices are global across the inheritance chain: a derived type's
//! own fields start after all inherited ones, so index `i` on a derived
//! type resolves into the parent while it falls inside the parent's range.

use std::sync::Arc;

use super::attribute::AttributeContainer;
use super::field::FieldInfo;
use super::hash::TypeId;

/// Immutable schema for one declared type.
#[derive(Clone, Debug)]
pub struct TypeInfo {
    name: String,
    id: TypeId,
    parent: Option<Arc<TypeInfo>>,
    /// Own fields only; inherited fields live on the parent.
    fields: Vec<FieldInfo>,
    attributes: AttributeContainer,
}

impl TypeInfo {
    pub(crate) fn new(
        name: impl Into<String>,
        parent: Option<Arc<TypeInfo>>,
        fields: Vec<FieldInfo>,
        attributes: AttributeContainer,
    ) -> Self {
        let name = name.into();
        let id = TypeId::of(&name);
        Self {
            name,
            id,
            parent,
            fields,
            attributes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn parent(&self) -> Option<&Arc<TypeInfo>> {
        self.parent.as_ref()
    }

    pub fn attributes(&self) -> &AttributeContainer {
        &self.attributes
    }

    /// Total field count: inherited plus own.
    pub fn field_count(&self) -> u32 {
        self.parent_field_count() + self.fields.len() as u32
    }

    fn parent_field_count(&self) -> u32 {
        self.parent.as_ref().map_or(0, |p| p.field_count())
    }

    /// Resolve a field at a global index across the inheritance chain.
    ///
    /// Returns `None` past the end of the full chain.
    pub fn field(&self, index: u32) -> Option<&FieldInfo> {
        let inherited = self.parent_field_count();
        if index < inherited {
            // Falls in the parent's range
            self.parent.as_ref().and_then(|p| p.field(index))
        } else {
            self.fields.get((index - inherited) as usize)
        }
    }

    /// Global index of a field by name; inherited fields first, first match
    /// wins. `None` if the name is absent from the whole chain.
    pub fn field_index(&self, name: &str) -> Option<u32> {
        (0..self.field_count()).find(|&i| {
            self.field(i).is_some_and(|f| f.name() == name)
        })
    }

    /// Own (non-inherited) fields, in declaration order.
    pub fn own_fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Walk the parent chain, true iff `base` appears in it (including
    /// this type itself).
    pub fn is_derived_from(&self, base: &TypeInfo) -> bool {
        let mut current = Some(self);
        while let Some(ty) = current {
            if ty.id == base.id {
                return true;
            }
            current = ty.parent.as_deref();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::field::FieldKind;
    use crate::value::primitive::PrimitiveValue;

    fn primitive(name: &str, default: PrimitiveValue) -> FieldInfo {
        FieldInfo::new(name, FieldKind::Primitive { default })
    }

    fn chain() -> (Arc<TypeInfo>, Arc<TypeInfo>, Arc<TypeInfo>) {
        let a = Arc::new(TypeInfo::new(
            "Asset",
            None,
            vec![
                primitive("Name", PrimitiveValue::String(String::new())),
                primitive("Id", PrimitiveValue::Uint64(0)),
            ],
            AttributeContainer::new(),
        ));
        let b = Arc::new(TypeInfo::new(
            "TerrainAsset",
            Some(a.clone()),
            vec![primitive("HeightScale", PrimitiveValue::Float32(1.0))],
            AttributeContainer::new(),
        ));
        let c = Arc::new(TypeInfo::new(
            "RockAsset",
            Some(b.clone()),
            vec![
                primitive("Hardness", PrimitiveValue::Float32(0.5)),
                primitive("Label", PrimitiveValue::String(String::new())),
            ],
            AttributeContainer::new(),
        ));
        (a, b, c)
    }

    #[test]
    fn test_field_count_includes_inherited() {
        let (a, b, c) = chain();
        assert_eq!(a.field_count(), 2);
        assert_eq!(b.field_count(), 3);
        assert_eq!(c.field_count(), 5);
    }

    #[test]
    fn test_global_index_delegates_to_parent() {
        let (a, _b, c) = chain();
        // Indices below the parent's range resolve to the parent's fields
        for i in 0..a.field_count() {
            assert_eq!(c.field(i).unwrap().name(), a.field(i).unwrap().name());
        }
        assert_eq!(c.field(2).unwrap().name(), "HeightScale");
        assert_eq!(c.field(3).unwrap().name(), "Hardness");
        assert_eq!(c.field(4).unwrap().name(), "Label");
        assert!(c.field(5).is_none());
    }

    #[test]
    fn test_field_index_by_name() {
        let (_a, _b, c) = chain();
        assert_eq!(c.field_index("Name"), Some(0));
        assert_eq!(c.field_index("HeightScale"), Some(2));
        assert_eq!(c.field_index("Label"), Some(4));
        assert_eq!(c.field_index("Missing"), None);
    }

    #[test]
    fn test_is_derived_from_chain() {
        let (a, b, c) = chain();
        assert!(c.is_derived_from(&a));
        assert!(c.is_derived_from(&b));
        assert!(b.is_derived_from(&a));
        assert!(a.is_derived_from(&a));
        assert!(!a.is_derived_from(&c));
    }
}
