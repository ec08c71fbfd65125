//! Runtime values for declared types

pub mod event;
pub mod field_value;
pub mod list;
pub mod path;
pub mod primitive;
pub mod type_value;

pub use event::{ListenerId, ListenerSet, ListenerToken, ValueChange, ValueChangedEvent};
pub use field_value::FieldValue;
pub use list::{PrimitiveList, TypeList};
pub use path::{FieldPath, PathError, PathStep};
pub use primitive::{Color, PrimitiveValue, Rect};
pub use type_value::TypeValue;
