//! Loam - runtime type system and document serialization for a terrain editor
//!
//! Schemas are declared imperatively at startup into a [`schema::TypeDatabase`],
//! instances are sparse dynamically-typed field maps ([`value::TypeValue`]),
//! all mutation flows through a [`document::Document`] which emits change
//! events, and the [`document::reader`] / [`document::writer`] pair persists
//! object graphs as versioned JSON documents.

pub mod core;
pub mod schema;
pub mod value;
pub mod document;
