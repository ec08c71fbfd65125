//! Schema declaration
//!
//! Schemas are declared imperatively at startup through a [`SchemaBuilder`]
//! and frozen into an immutable [`TypeDatabase`] by [`SchemaBuilder::build`].
//! Registration is two-pass: declaration order never matters because parent
//! links and nested-type references are resolved only at build time.
//! Duplicate or dangling declarations are hard errors rather than silently
//! ignored.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use thiserror::Error;

use super::attribute::{Attribute, AttributeContainer};
use super::database::TypeDatabase;
use super::enumeration::EnumerationInfo;
use super::field::{FieldInfo, FieldKind, PrimitiveType};
use super::hash::TypeId;
use super::type_info::TypeInfo;
use crate::value::primitive::PrimitiveValue;

/// Errors raised while freezing a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("duplicate type: {0}")]
    DuplicateType(String),

    #[error("duplicate enumeration: {0}")]
    DuplicateEnumeration(String),

    #[error("duplicate field {field} on {ty}")]
    DuplicateField { ty: String, field: String },

    #[error("unknown parent {parent} for type {ty}")]
    UnknownParent { ty: String, parent: String },

    #[error("inheritance cycle involving {0}")]
    InheritanceCycle(String),

    #[error("field {field} on {ty} references an unregistered type")]
    UnknownFieldType { ty: String, field: String },

    #[error("field {field} on {ty} references an unregistered enumeration")]
    UnknownEnumeration { ty: String, field: String },

    #[error("default pointer type for field {field} on {ty} does not derive from its base")]
    DefaultNotDerived { ty: String, field: String },
}

/// Declaration of one type: name, optional parent, own fields, attributes.
pub struct TypeBuilder {
    name: String,
    parent: Option<String>,
    fields: Vec<FieldInfo>,
    attributes: AttributeContainer,
}

impl TypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            attributes: AttributeContainer::new(),
        }
    }

    /// Declare a type deriving from `parent`. The parent may be declared
    /// before or after this type; linkage happens at build time.
    pub fn derived(name: impl Into<String>, parent: impl Into<String>) -> Self {
        let mut builder = Self::new(name);
        builder.parent = Some(parent.into());
        builder
    }

    /// Attach a type-level attribute.
    pub fn attach(&mut self, attribute: Attribute) -> &mut Self {
        self.attributes.attach(attribute);
        self
    }

    fn push(&mut self, field: FieldInfo) -> &mut FieldInfo {
        self.fields.push(field);
        self.fields.last_mut().unwrap()
    }

    /// Scalar primitive field; the default also fixes the kind.
    pub fn primitive(
        &mut self,
        name: impl Into<String>,
        default: impl Into<PrimitiveValue>,
    ) -> &mut FieldInfo {
        self.push(FieldInfo::new(
            name,
            FieldKind::Primitive {
                default: default.into(),
            },
        ))
    }

    /// Homogeneous primitive list field.
    pub fn primitive_list(
        &mut self,
        name: impl Into<String>,
        element: PrimitiveType,
    ) -> &mut FieldInfo {
        self.push(FieldInfo::new(name, FieldKind::PrimitiveList { element }))
    }

    /// Nested value of a fixed concrete type.
    pub fn nested(&mut self, name: impl Into<String>, ty: &str) -> &mut FieldInfo {
        self.push(FieldInfo::new(
            name,
            FieldKind::Type {
                declared: TypeId::of(ty),
                pointer: false,
                default_pointer: None,
            },
        ))
    }

    /// Polymorphic pointer slot: any type derived from `base` may occupy it.
    /// With a `default` concrete type the slot is pre-materialized on value
    /// construction; without one it stays unset until explicitly assigned.
    pub fn pointer(
        &mut self,
        name: impl Into<String>,
        base: &str,
        default: Option<&str>,
    ) -> &mut FieldInfo {
        self.push(FieldInfo::new(
            name,
            FieldKind::Type {
                declared: TypeId::of(base),
                pointer: true,
                default_pointer: default.map(TypeId::of),
            },
        ))
    }

    /// Ordered list of nested values of a fixed concrete element type.
    pub fn nested_list(&mut self, name: impl Into<String>, element: &str) -> &mut FieldInfo {
        self.push(FieldInfo::new(
            name,
            FieldKind::TypeList {
                element: TypeId::of(element),
                pointer: false,
            },
        ))
    }

    /// Ordered list whose elements may be any type derived from `base`.
    pub fn pointer_list(&mut self, name: impl Into<String>, base: &str) -> &mut FieldInfo {
        self.push(FieldInfo::new(
            name,
            FieldKind::TypeList {
                element: TypeId::of(base),
                pointer: true,
            },
        ))
    }

    /// Int32-backed enumeration field.
    pub fn enumeration(
        &mut self,
        name: impl Into<String>,
        enumeration: &str,
        default: i32,
    ) -> &mut FieldInfo {
        self.push(FieldInfo::new(
            name,
            FieldKind::Enumeration {
                enumeration: TypeId::of(enumeration),
                default,
            },
        ))
    }
}

/// Collects type and enumeration declarations, then freezes them into a
/// [`TypeDatabase`].
#[derive(Default)]
pub struct SchemaBuilder {
    types: Vec<TypeBuilder>,
    enumerations: Vec<EnumerationInfo>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, builder: TypeBuilder) -> &mut Self {
        self.types.push(builder);
        self
    }

    pub fn add_enumeration(&mut self, name: &str, entries: &[(i32, &str)]) -> &mut Self {
        let entries = entries
            .iter()
            .map(|(v, n)| (*v, n.to_string()))
            .collect();
        self.enumerations.push(EnumerationInfo::new(name, entries));
        self
    }

    /// Freeze the declarations into an immutable database.
    ///
    /// Parent links are resolved in inheritance order, so declaration order
    /// never matters. Fails on duplicate names, unknown parents,
    /// inheritance cycles, duplicate field names anywhere in a chain, and
    /// nested/enumeration fields referencing unregistered schemas.
    pub fn build(self) -> Result<TypeDatabase, SchemaError> {
        let mut enumerations: HashMap<TypeId, Arc<EnumerationInfo>> = HashMap::new();
        for info in self.enumerations {
            if enumerations.contains_key(&info.id()) {
                return Err(SchemaError::DuplicateEnumeration(info.name().to_string()));
            }
            enumerations.insert(info.id(), Arc::new(info));
        }

        let declared: HashMap<TypeId, &TypeBuilder> = {
            let mut map = HashMap::new();
            for builder in &self.types {
                if map.insert(TypeId::of(&builder.name), builder).is_some() {
                    return Err(SchemaError::DuplicateType(builder.name.clone()));
                }
            }
            map
        };

        // Link parents in dependency order: every pass builds the types
        // whose parent is already built; no progress with types remaining
        // means a cycle.
        let mut types: HashMap<TypeId, Arc<TypeInfo>> = HashMap::new();
        let mut pending: Vec<&TypeBuilder> = self.types.iter().collect();
        while !pending.is_empty() {
            let mut progressed = false;
            pending.retain(|builder| {
                let parent = match &builder.parent {
                    None => None,
                    Some(name) => {
                        let parent_id = TypeId::of(name);
                        if !declared.contains_key(&parent_id) {
                            // Caught below so retain() can stay infallible
                            return true;
                        }
                        match types.get(&parent_id) {
                            Some(parent) => Some(parent.clone()),
                            None => return true,
                        }
                    }
                };
                let info = TypeInfo::new(
                    builder.name.clone(),
                    parent,
                    builder.fields.clone(),
                    builder.attributes.clone(),
                );
                types.insert(info.id(), Arc::new(info));
                progressed = true;
                false
            });

            if !progressed {
                for stuck in &pending {
                    let parent = stuck.parent.as_deref().unwrap_or_default();
                    if !declared.contains_key(&TypeId::of(parent)) {
                        return Err(SchemaError::UnknownParent {
                            ty: stuck.name.clone(),
                            parent: parent.to_string(),
                        });
                    }
                }
                return Err(SchemaError::InheritanceCycle(pending[0].name.clone()));
            }
        }

        for ty in types.values() {
            validate_fields(ty, &types, &enumerations)?;
        }

        debug!(
            "schema built: {} types, {} enumerations",
            types.len(),
            enumerations.len()
        );
        Ok(TypeDatabase::new(types, enumerations))
    }
}

fn validate_fields(
    ty: &Arc<TypeInfo>,
    types: &HashMap<TypeId, Arc<TypeInfo>>,
    enumerations: &HashMap<TypeId, Arc<EnumerationInfo>>,
) -> Result<(), SchemaError> {
    // Duplicate field names anywhere in the chain shadow each other in
    // name-based document lookup, so they are rejected outright.
    let total = ty.field_count();
    for i in 0..total {
        let name = ty.field(i).map(|f| f.name()).unwrap_or_default();
        for j in (i + 1)..total {
            if ty.field(j).is_some_and(|f| f.name() == name) {
                return Err(SchemaError::DuplicateField {
                    ty: ty.name().to_string(),
                    field: name.to_string(),
                });
            }
        }
    }

    for field in ty.own_fields() {
        let unknown = || SchemaError::UnknownFieldType {
            ty: ty.name().to_string(),
            field: field.name().to_string(),
        };
        match field.kind() {
            FieldKind::Type {
                declared,
                default_pointer,
                ..
            } => {
                let base = types.get(declared).ok_or_else(unknown)?;
                if let Some(concrete) = default_pointer {
                    let concrete = types.get(concrete).ok_or_else(unknown)?;
                    if !concrete.is_derived_from(base) {
                        return Err(SchemaError::DefaultNotDerived {
                            ty: ty.name().to_string(),
                            field: field.name().to_string(),
                        });
                    }
                }
            }
            FieldKind::TypeList { element, .. } => {
                types.get(element).ok_or_else(unknown)?;
            }
            FieldKind::Enumeration { enumeration, .. } => {
                if !enumerations.contains_key(enumeration) {
                    return Err(SchemaError::UnknownEnumeration {
                        ty: ty.name().to_string(),
                        field: field.name().to_string(),
                    });
                }
            }
            FieldKind::Primitive { .. } | FieldKind::PrimitiveList { .. } => {}
        }
    }
    Ok(())
}
