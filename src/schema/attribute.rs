//! Schema metadata attributes
//!
//! Attributes are a keyed bag of metadata attachable to a type or to a
//! field. The core does not interpret them beyond [`Attribute::SkipSerialization`]
//! (honored by the document writer); everything else is consumed by external
//! editor tooling such as generic property panels.

use super::hash::AttributeId;

/// One metadata tag on a type or field.
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    /// Field cannot be edited in property panels.
    ReadOnly,
    /// Field is not shown in property panels.
    Hidden,
    /// Human-facing name override.
    DisplayName(String),
    /// Hover text for property panels.
    Tooltip(String),
    /// Named custom editor widget for this type or field.
    CustomEditor(String),
    /// Writer skips fields carrying this, and nested-type-list elements
    /// whose concrete type carries it.
    SkipSerialization,
    /// Open-ended tool-facing metadata.
    Custom {
        name: String,
        value: serde_json::Value,
    },
}

impl Attribute {
    /// Name of the attribute, the source of its hashed key.
    pub fn name(&self) -> &str {
        match self {
            Attribute::ReadOnly => "ReadOnly",
            Attribute::Hidden => "Hidden",
            Attribute::DisplayName(_) => "DisplayName",
            Attribute::Tooltip(_) => "Tooltip",
            Attribute::CustomEditor(_) => "CustomEditor",
            Attribute::SkipSerialization => "SkipSerialization",
            Attribute::Custom { name, .. } => name,
        }
    }

    /// Hashed key under which this attribute is stored.
    pub fn id(&self) -> AttributeId {
        AttributeId::of(self.name())
    }
}

/// Well-known attribute ids for query call sites.
pub mod ids {
    use super::AttributeId;

    pub const READ_ONLY: AttributeId = AttributeId::of("ReadOnly");
    pub const HIDDEN: AttributeId = AttributeId::of("Hidden");
    pub const DISPLAY_NAME: AttributeId = AttributeId::of("DisplayName");
    pub const TOOLTIP: AttributeId = AttributeId::of("Tooltip");
    pub const CUSTOM_EDITOR: AttributeId = AttributeId::of("CustomEditor");
    pub const SKIP_SERIALIZATION: AttributeId = AttributeId::of("SkipSerialization");
}

/// Keyed bag of attributes. One entry per attribute id; attaching an
/// attribute with an id already present replaces the previous entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeContainer {
    entries: Vec<Attribute>,
}

impl AttributeContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an attribute, replacing any previous entry with the same id.
    pub fn attach(&mut self, attribute: Attribute) {
        let id = attribute.id();
        if let Some(existing) = self.entries.iter_mut().find(|a| a.id() == id) {
            *existing = attribute;
        } else {
            self.entries.push(attribute);
        }
    }

    pub fn contains(&self, id: AttributeId) -> bool {
        self.entries.iter().any(|a| a.id() == id)
    }

    pub fn get(&self, id: AttributeId) -> Option<&Attribute> {
        self.entries.iter().find(|a| a.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convenience accessor for the display-name attribute.
    pub fn display_name(&self) -> Option<&str> {
        match self.get(ids::DISPLAY_NAME) {
            Some(Attribute::DisplayName(name)) => Some(name),
            _ => None,
        }
    }
}
