//! Enumeration schemas

use super::hash::TypeId;

/// Schema for one declared enumeration: ordinal to display-name mapping.
///
/// The core never validates stored ordinals against this table; editors and
/// writers decide how strict to be.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumerationInfo {
    name: String,
    id: TypeId,
    entries: Vec<(i32, String)>,
}

impl EnumerationInfo {
    pub(crate) fn new(name: impl Into<String>, entries: Vec<(i32, String)>) -> Self {
        let name = name.into();
        let id = TypeId::of(&name);
        Self { name, id, entries }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Display name for an ordinal, if declared.
    pub fn name_of(&self, value: i32) -> Option<&str> {
        self.entries
            .iter()
            .find(|(v, _)| *v == value)
            .map(|(_, n)| n.as_str())
    }

    /// Ordinal for a display name, if declared.
    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.entries.iter().find(|(_, n)| n == name).map(|(v, _)| *v)
    }

    /// Declared entries in declaration order.
    pub fn entries(&self) -> &[(i32, String)] {
        &self.entries
    }
}
