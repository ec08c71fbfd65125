//! Runtime type schemas
//!
//! Types are declared at runtime rather than derived from Rust's static
//! type system, so the asset schema can evolve independently of compiled
//! code. Declaration happens through [`SchemaBuilder`] and freezes into an
//! immutable [`TypeDatabase`]; instances of the declared types live in
//! [`crate::value`] and are persisted by [`crate::document`].

pub mod attribute;
pub mod builder;
pub mod database;
pub mod enumeration;
pub mod field;
pub mod hash;
pub mod type_info;

pub use attribute::{Attribute, AttributeContainer};
pub use builder::{SchemaBuilder, SchemaError, TypeBuilder};
pub use database::TypeDatabase;
pub use enumeration::EnumerationInfo;
pub use field::{FieldInfo, FieldKind, PrimitiveType};
pub use hash::{fnv1a_64, AttributeId, TypeId};
pub use type_info::TypeInfo;
