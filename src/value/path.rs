//! Field paths
//!
//! A path locates one value inside a document tree as a sequence of
//! field-index and list-index steps from the root. Change events carry the
//! path of the mutated value, and the edit-history layer replays writes
//! through path-addressed document mutation.

use thiserror::Error;

/// Errors raised while resolving a path against a value tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path")]
    EmptyPath,

    #[error("path step {step} does not address a field of the expected shape")]
    BadStep { step: usize },

    #[error("no field at index {index}")]
    NoSuchField { index: u32 },

    #[error("value kind does not match the declared field kind")]
    KindMismatch,

    #[error("list index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("pointer field has no value; assign a concrete type first")]
    PointerUnset,

    #[error("concrete type does not derive from the declared base")]
    NotDerived,

    #[error("field references a type missing from the database")]
    UnknownType,
}

/// One step of a field path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathStep {
    /// Global field index on the enclosing type value.
    Field(u32),
    /// Element index inside a list field.
    Index(usize),
}

/// Sequence of steps locating a value under a document root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPath {
    steps: Vec<PathStep>,
}

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: impl Into<Vec<PathStep>>) -> Self {
        Self {
            steps: steps.into(),
        }
    }

    /// Path of a root-level field.
    pub fn field(index: u32) -> Self {
        Self {
            steps: vec![PathStep::Field(index)],
        }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<PathStep> {
        self.steps.last().copied()
    }

    /// Extend with a further field step.
    pub fn child(&self, index: u32) -> Self {
        let mut steps = self.steps.clone();
        steps.push(PathStep::Field(index));
        Self { steps }
    }

    /// Extend with a list-element step.
    pub fn element(&self, index: usize) -> Self {
        let mut steps = self.steps.clone();
        steps.push(PathStep::Index(index));
        Self { steps }
    }

    /// Path of the enclosing value, `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.steps.is_empty() {
            return None;
        }
        Some(Self {
            steps: self.steps[..self.steps.len() - 1].to_vec(),
        })
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for step in &self.steps {
            match step {
                PathStep::Field(i) => write!(f, ".{}", i)?,
                PathStep::Index(i) => write!(f, "[{}]", i)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_and_parent() {
        let path = FieldPath::field(2).element(0).child(5);
        assert_eq!(path.len(), 3);
        assert_eq!(path.last(), Some(PathStep::Field(5)));
        assert_eq!(path.parent().unwrap(), FieldPath::field(2).element(0));
        assert_eq!(FieldPath::new().parent(), None);
    }

    #[test]
    fn test_display() {
        let path = FieldPath::field(2).element(0).child(5);
        assert_eq!(path.to_string(), ".2[0].5");
    }
}
