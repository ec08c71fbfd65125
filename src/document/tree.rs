//! Document tree
//!
//! A [`Document`] owns one root [`TypeValue`], the database its types come
//! from, and the change listeners. All mutation is path-addressed through
//! the document: the path is resolved against the tree (materializing
//! intermediate storage lazily, including the append case where a list
//! index equal to the current length pushes a fresh element), the mutation
//! is applied, and exactly one change event is delivered to every listener
//! before the call returns.
//!
//! Routing mutation through the owning context replaces the parent
//! back-pointer bubbling of classic object models: the event reaches the
//! root by construction, and subtrees can never hold dangling parents.

use std::sync::Arc;

use crate::schema::{FieldKind, TypeDatabase, TypeInfo};
use crate::value::event::{
    ListenerId, ListenerSet, ListenerToken, ValueChange, ValueChangedEvent,
};
use crate::value::path::{FieldPath, PathError, PathStep};
use crate::value::primitive::PrimitiveValue;
use crate::value::type_value::TypeValue;

/// One editable object graph: root value, schema handle, listeners.
pub struct Document {
    database: Arc<TypeDatabase>,
    root: TypeValue,
    listeners: ListenerSet,
}

impl Document {
    /// Create a document with a fresh root value of `root_type`.
    pub fn new(database: Arc<TypeDatabase>, root_type: &Arc<TypeInfo>) -> Self {
        let root = TypeValue::new(&database, root_type);
        Self::from_root(database, root)
    }

    /// Wrap an already-built root value (used by the reader).
    pub fn from_root(database: Arc<TypeDatabase>, root: TypeValue) -> Self {
        Self {
            database,
            root,
            listeners: ListenerSet::new(),
        }
    }

    pub fn database(&self) -> &Arc<TypeDatabase> {
        &self.database
    }

    pub fn root(&self) -> &TypeValue {
        &self.root
    }

    /// Register a change listener; fires until explicitly unsubscribed.
    pub fn on_change(
        &mut self,
        callback: impl FnMut(&ValueChangedEvent) + 'static,
    ) -> ListenerId {
        self.listeners.subscribe(callback)
    }

    /// Register a change listener bound to a liveness token.
    pub fn on_change_scoped(
        &mut self,
        token: &ListenerToken,
        callback: impl FnMut(&ValueChangedEvent) + 'static,
    ) -> ListenerId {
        self.listeners.subscribe_scoped(token, callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.unsubscribe(id);
    }

    fn emit(&mut self, path: FieldPath, change: ValueChange) {
        self.listeners.dispatch(&ValueChangedEvent { path, change });
    }

    /// Scalar write. A terminal field step writes the field itself; a
    /// terminal index step writes a primitive-list element, with an index
    /// equal to the list length meaning append.
    pub fn set_primitive(
        &mut self,
        path: &FieldPath,
        value: impl Into<PrimitiveValue>,
    ) -> Result<(), PathError> {
        let value = value.into();
        let db = self.database.clone();
        let steps = path.steps();
        let change = match steps {
            [] => return Err(PathError::EmptyPath),
            [prefix @ .., PathStep::Field(field), PathStep::Index(index)] => {
                let owner = descend(&db, &mut self.root, prefix)?;
                let list = owner.ensure_primitive_list(*field)?;
                let len = list.len();
                if *index < len {
                    let old = list.set(*index, value.clone())?;
                    ValueChange::Primitive { old, new: value }
                } else if *index == len {
                    list.push(value.clone())?;
                    ValueChange::PrimitiveListAdded { value }
                } else {
                    return Err(PathError::IndexOutOfRange { index: *index, len });
                }
            }
            [prefix @ .., PathStep::Field(field)] => {
                let owner = descend(&db, &mut self.root, prefix)?;
                let old = owner.write_primitive(*field, value.clone())?;
                ValueChange::Primitive { old, new: value }
            }
            _ => {
                return Err(PathError::BadStep {
                    step: steps.len() - 1,
                })
            }
        };
        self.emit(path.clone(), change);
        Ok(())
    }

    /// Enumeration ordinal write. The ordinal is not validated against the
    /// enumeration's declared members; that policy belongs to editors.
    pub fn set_enumeration(&mut self, path: &FieldPath, value: i32) -> Result<(), PathError> {
        let db = self.database.clone();
        let steps = path.steps();
        let change = match steps {
            [] => return Err(PathError::EmptyPath),
            [prefix @ .., PathStep::Field(field)] => {
                let owner = descend(&db, &mut self.root, prefix)?;
                let old = owner.write_enumeration(*field, value)?;
                ValueChange::Enumeration { old, new: value }
            }
            _ => {
                return Err(PathError::BadStep {
                    step: steps.len() - 1,
                })
            }
        };
        self.emit(path.clone(), change);
        Ok(())
    }

    /// Remove a field's storage so it reads as its declared default again.
    /// Resetting an already-default field is a no-op and emits nothing.
    pub fn reset_field(&mut self, path: &FieldPath) -> Result<(), PathError> {
        let db = self.database.clone();
        let steps = path.steps();
        let removed = match steps {
            [] => return Err(PathError::EmptyPath),
            [prefix @ .., PathStep::Field(field)] => {
                let owner = descend(&db, &mut self.root, prefix)?;
                owner.reset(*field)?
            }
            _ => {
                return Err(PathError::BadStep {
                    step: steps.len() - 1,
                })
            }
        };
        if let Some(old) = removed {
            self.emit(path.clone(), ValueChange::FieldReset { old });
        }
        Ok(())
    }

    /// Assign a concrete type to a nested (typically pointer) field,
    /// destroying the prior value unless it is already of that exact type.
    pub fn set_type_pointer(&mut self, path: &FieldPath, type_name: &str) -> Result<(), PathError> {
        let db = self.database.clone();
        let concrete = db.find_type(type_name).ok_or(PathError::UnknownType)?.clone();
        let steps = path.steps();
        match steps {
            [] => Err(PathError::EmptyPath),
            [prefix @ .., PathStep::Field(field)] => {
                let owner = descend(&db, &mut self.root, prefix)?;
                owner.set_pointer(&db, *field, &concrete)
            }
            _ => Err(PathError::BadStep {
                step: steps.len() - 1,
            }),
        }
    }

    /// Append to a primitive list; returns the new element's index.
    pub fn push_primitive(
        &mut self,
        list_path: &FieldPath,
        value: impl Into<PrimitiveValue>,
    ) -> Result<usize, PathError> {
        let value = value.into();
        let db = self.database.clone();
        let (owner, field) = self.list_owner(&db, list_path)?;
        let list = owner.ensure_primitive_list(field)?;
        let index = list.push(value.clone())?;
        self.emit(
            list_path.element(index),
            ValueChange::PrimitiveListAdded { value },
        );
        Ok(index)
    }

    /// Append to a type list; returns the new element's index.
    ///
    /// With `None` the declared element type is appended; a concrete type
    /// name appends a polymorphic element, which must derive from the
    /// declared element base.
    pub fn push_type(
        &mut self,
        list_path: &FieldPath,
        concrete: Option<&str>,
    ) -> Result<usize, PathError> {
        let db = self.database.clone();
        let (owner, field) = self.list_owner(&db, list_path)?;
        let (list, element, _pointer) = owner.ensure_type_list(field)?;
        let element_ty = db.find_type_id(element).ok_or(PathError::UnknownType)?;
        let concrete_ty = match concrete {
            None => element_ty,
            Some(name) => {
                let ty = db.find_type(name).ok_or(PathError::UnknownType)?;
                if !ty.is_derived_from(element_ty) {
                    return Err(PathError::NotDerived);
                }
                ty
            }
        };
        let type_id = concrete_ty.id();
        let index = list.push(TypeValue::new(&db, concrete_ty));
        self.emit(list_path.element(index), ValueChange::TypeListAdded { type_id });
        Ok(index)
    }

    /// Remove one element from either list kind.
    pub fn remove_item(&mut self, list_path: &FieldPath, index: usize) -> Result<(), PathError> {
        let db = self.database.clone();
        let (owner, field) = self.list_owner(&db, list_path)?;
        let kind = owner
            .type_info()
            .field(field)
            .map(|f| f.kind().clone())
            .ok_or(PathError::NoSuchField { index: field })?;
        // An untouched list reads as empty without materializing storage
        let change = match kind {
            FieldKind::PrimitiveList { .. } => {
                if !owner.is_set(field) {
                    return Err(PathError::IndexOutOfRange { index, len: 0 });
                }
                let value = owner.ensure_primitive_list(field)?.remove(index)?;
                ValueChange::PrimitiveListRemoved { value }
            }
            FieldKind::TypeList { .. } => {
                if !owner.is_set(field) {
                    return Err(PathError::IndexOutOfRange { index, len: 0 });
                }
                let (list, _, _) = owner.ensure_type_list(field)?;
                let value = list.remove(index)?;
                ValueChange::TypeListRemoved { value }
            }
            _ => return Err(PathError::KindMismatch),
        };
        self.emit(list_path.element(index), change);
        Ok(())
    }

    /// Drain either list kind. Emits a single cleared event carrying every
    /// removed value; an empty or unmaterialized list is a no-op.
    pub fn clear_list(&mut self, list_path: &FieldPath) -> Result<(), PathError> {
        let db = self.database.clone();
        let (owner, field) = self.list_owner(&db, list_path)?;
        let kind = owner
            .type_info()
            .field(field)
            .map(|f| f.kind().clone())
            .ok_or(PathError::NoSuchField { index: field })?;
        let change = match kind {
            FieldKind::PrimitiveList { .. } => {
                if !owner.is_set(field) {
                    return Ok(());
                }
                let values = owner.ensure_primitive_list(field)?.clear();
                if values.is_empty() {
                    return Ok(());
                }
                ValueChange::PrimitiveListCleared { values }
            }
            FieldKind::TypeList { .. } => {
                if !owner.is_set(field) {
                    return Ok(());
                }
                let (list, _, _) = owner.ensure_type_list(field)?;
                let values = list.clear();
                if values.is_empty() {
                    return Ok(());
                }
                ValueChange::TypeListCleared { values }
            }
            _ => return Err(PathError::KindMismatch),
        };
        self.emit(list_path.clone(), change);
        Ok(())
    }

    fn list_owner<'a>(
        &'a mut self,
        db: &TypeDatabase,
        list_path: &FieldPath,
    ) -> Result<(&'a mut TypeValue, u32), PathError> {
        match list_path.steps() {
            [] => Err(PathError::EmptyPath),
            [prefix @ .., PathStep::Field(field)] => {
                Ok((descend(db, &mut self.root, prefix)?, *field))
            }
            steps => Err(PathError::BadStep {
                step: steps.len() - 1,
            }),
        }
    }

    /// Materialized value at a path; `None` wherever storage is unset.
    pub fn value_at(&self, path: &FieldPath) -> Option<&TypeValue> {
        let steps = path.steps();
        let mut current = &self.root;
        let mut i = 0;
        while i < steps.len() {
            let PathStep::Field(field) = steps[i] else {
                return None;
            };
            if let Some(PathStep::Index(index)) = steps.get(i + 1).copied() {
                current = current.type_list(field)?.get(index)?;
                i += 2;
            } else {
                current = current.child(field)?;
                i += 1;
            }
        }
        Some(current)
    }

    /// Primitive read through the tree, falling back to schema defaults
    /// across unmaterialized nested values (an unset `End` still answers
    /// `End.X` with `X`'s declared default).
    pub fn primitive_at(&self, path: &FieldPath) -> Option<PrimitiveValue> {
        let steps = path.steps();
        if steps.is_empty() {
            return None;
        }
        let mut value: Option<&TypeValue> = Some(&self.root);
        let mut ty: Arc<TypeInfo> = self.root.type_info().clone();
        let mut i = 0;
        loop {
            let PathStep::Field(field) = steps[i] else {
                return None;
            };
            if i + 1 == steps.len() {
                // Terminal scalar field
                return match value {
                    Some(v) => v.primitive(field),
                    None => ty.field(field)?.primitive_default().cloned(),
                };
            }
            if let Some(PathStep::Index(index)) = steps.get(i + 1).copied() {
                if i + 2 == steps.len() {
                    // Terminal primitive-list element; an unmaterialized
                    // list is empty, so any index misses
                    return value?.primitive_list(field)?.get(index).cloned();
                }
                let element = value?.type_list(field)?.get(index)?;
                ty = element.type_info().clone();
                value = Some(element);
                i += 2;
            } else {
                match value.and_then(|v| v.child(field)) {
                    Some(child) => {
                        ty = child.type_info().clone();
                        value = Some(child);
                    }
                    None => {
                        let FieldKind::Type {
                            declared,
                            pointer,
                            default_pointer,
                        } = ty.field(field)?.kind().clone()
                        else {
                            return None;
                        };
                        let target = if pointer { default_pointer? } else { declared };
                        ty = self.database.find_type_id(target)?.clone();
                        value = None;
                    }
                }
                i += 1;
            }
        }
    }

    /// Human field name for a change-record path: the name of the last
    /// field step, resolved on the concrete type that owns it.
    pub fn field_name_at(&self, path: &FieldPath) -> Option<String> {
        let steps = path.steps();
        let (last, field) = steps
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, step)| match step {
                PathStep::Field(f) => Some((i, *f)),
                PathStep::Index(_) => None,
            })?;
        let owner_path = FieldPath::from_steps(steps[..last].to_vec());
        let owner = self.value_at(&owner_path)?;
        Some(owner.type_info().field(field)?.name().to_string())
    }
}

/// Walk `steps` down from `value`, materializing nested storage on the way.
///
/// Every step here must be a field step, optionally followed by an index
/// step into a type list; an index equal to the list length appends a fresh
/// element of the declared type and descends into it.
fn descend<'a>(
    db: &TypeDatabase,
    value: &'a mut TypeValue,
    steps: &[PathStep],
) -> Result<&'a mut TypeValue, PathError> {
    let mut current = value;
    let mut i = 0;
    while i < steps.len() {
        let PathStep::Field(field) = steps[i] else {
            return Err(PathError::BadStep { step: i });
        };
        if let Some(PathStep::Index(index)) = steps.get(i + 1).copied() {
            let (list, element, _pointer) = current.ensure_type_list(field)?;
            let len = list.len();
            if index > len {
                return Err(PathError::IndexOutOfRange { index, len });
            }
            if index == len {
                let element_ty = db.find_type_id(element).ok_or(PathError::UnknownType)?;
                list.push(TypeValue::new(db, element_ty));
            }
            current = list
                .get_mut(index)
                .ok_or(PathError::IndexOutOfRange { index, len })?;
            i += 2;
        } else {
            current = current.ensure_child(db, field)?;
            i += 1;
        }
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PrimitiveType, SchemaBuilder, TypeBuilder};
    use crate::value::event::ValueChange;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn db() -> Arc<TypeDatabase> {
        let mut schema = SchemaBuilder::new();

        let mut point = TypeBuilder::new("Point");
        point.primitive("X", 0.0f32);
        point.primitive("Y", 0.0f32);
        schema.add_type(point);

        let mut stroke = TypeBuilder::new("Stroke");
        stroke.nested("Origin", "Point");
        stroke.primitive("Width", 1.0f32);
        schema.add_type(stroke);

        let mut layer = TypeBuilder::new("Layer");
        layer.nested("Outline", "Stroke");
        layer.primitive_list("Heights", PrimitiveType::Float32);
        layer.nested_list("Markers", "Point");
        layer.enumeration("Biome", "Biome", 0);
        schema.add_type(layer);
        schema.add_enumeration("Biome", &[(0, "Plains"), (1, "Desert")]);

        Arc::new(schema.build().unwrap())
    }

    fn layer_doc() -> Document {
        let db = db();
        let layer = db.find_type("Layer").unwrap().clone();
        Document::new(db, &layer)
    }

    fn record(doc: &mut Document) -> Rc<RefCell<Vec<ValueChangedEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        doc.on_change(move |e| sink.borrow_mut().push(e.clone()));
        events
    }

    #[test]
    fn test_deep_write_reaches_root_listener() {
        let mut doc = layer_doc();
        let events = record(&mut doc);

        // Layer.Outline.Origin.X, three levels deep
        let path = FieldPath::field(0).child(0).child(0);
        doc.set_primitive(&path, 1.5f32).unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path.len(), 3);
        assert_eq!(events[0].path.last(), Some(PathStep::Field(0)));
        match &events[0].change {
            ValueChange::Primitive { old, new } => {
                assert_eq!(*old, PrimitiveValue::Float32(0.0));
                assert_eq!(*new, PrimitiveValue::Float32(1.5));
            }
            other => panic!("unexpected change: {:?}", other),
        }

        // Intermediate values were materialized along the way
        assert_eq!(
            doc.primitive_at(&path),
            Some(PrimitiveValue::Float32(1.5))
        );
    }

    #[test]
    fn test_primitive_list_events() {
        let mut doc = layer_doc();
        let events = record(&mut doc);
        let heights = FieldPath::field(1);

        let index = doc.push_primitive(&heights, 4.0f32).unwrap();
        assert_eq!(index, 0);
        {
            let events = events.borrow();
            assert_eq!(events[0].path.last(), Some(PathStep::Index(0)));
            assert!(matches!(
                events[0].change,
                ValueChange::PrimitiveListAdded { .. }
            ));
        }

        doc.remove_item(&heights, 0).unwrap();
        {
            let events = events.borrow();
            assert!(matches!(
                events[1].change,
                ValueChange::PrimitiveListRemoved { .. }
            ));
        }
        assert!(doc.root().primitive_list(1).unwrap().is_empty());
    }

    #[test]
    fn test_clear_emits_single_event_with_batch() {
        let mut doc = layer_doc();
        let heights = FieldPath::field(1);
        doc.push_primitive(&heights, 1.0f32).unwrap();
        doc.push_primitive(&heights, 2.0f32).unwrap();

        let events = record(&mut doc);
        doc.clear_list(&heights).unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path, heights);
        match &events[0].change {
            ValueChange::PrimitiveListCleared { values } => {
                assert_eq!(
                    values,
                    &vec![PrimitiveValue::Float32(1.0), PrimitiveValue::Float32(2.0)]
                );
            }
            other => panic!("unexpected change: {:?}", other),
        }

        // Clearing again is a no-op with no event
        drop(events);
        doc.clear_list(&heights).unwrap();
    }

    #[test]
    fn test_append_case_descends_through_list() {
        let mut doc = layer_doc();
        // Markers[0].Y with an empty list: index == len pushes then descends
        let path = FieldPath::field(2).element(0).child(1);
        doc.set_primitive(&path, 7.0f32).unwrap();

        let markers = doc.root().type_list(2).unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(
            markers.get(0).unwrap().primitive(1),
            Some(PrimitiveValue::Float32(7.0))
        );

        // An index past the end does not
        let bad = FieldPath::field(2).element(2).child(0);
        assert!(matches!(
            doc.set_primitive(&bad, 1.0f32),
            Err(PathError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_type_list_events() {
        let mut doc = layer_doc();
        let events = record(&mut doc);
        let markers = FieldPath::field(2);

        doc.push_type(&markers, None).unwrap();
        doc.push_type(&markers, None).unwrap();
        doc.remove_item(&markers, 0).unwrap();
        doc.clear_list(&markers).unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0].change, ValueChange::TypeListAdded { .. }));
        assert!(matches!(
            events[2].change,
            ValueChange::TypeListRemoved { .. }
        ));
        match &events[3].change {
            ValueChange::TypeListCleared { values } => assert_eq!(values.len(), 1),
            other => panic!("unexpected change: {:?}", other),
        }
    }

    #[test]
    fn test_enumeration_write_and_default() {
        let mut doc = layer_doc();
        let biome = FieldPath::field(3);
        assert_eq!(doc.root().enumeration(3), Some(0));

        let events = record(&mut doc);
        doc.set_enumeration(&biome, 1).unwrap();
        assert_eq!(doc.root().enumeration(3), Some(1));
        assert!(matches!(
            events.borrow()[0].change,
            ValueChange::Enumeration { old: 0, new: 1 }
        ));
    }

    #[test]
    fn test_reset_emits_event_once() {
        let mut doc = layer_doc();
        let width = FieldPath::field(0).child(1);
        doc.set_primitive(&width, 3.0f32).unwrap();

        let events = record(&mut doc);
        doc.reset_field(&width).unwrap();
        assert!(matches!(
            events.borrow()[0].change,
            ValueChange::FieldReset { .. }
        ));

        // Already default: no further event
        doc.reset_field(&width).unwrap();
        assert_eq!(events.borrow().len(), 1);
        assert_eq!(doc.primitive_at(&width), Some(PrimitiveValue::Float32(1.0)));
    }

    #[test]
    fn test_primitive_at_defaults_through_unset_children() {
        let doc = layer_doc();
        // Nothing materialized: Outline.Origin.X answers with its default
        let path = FieldPath::field(0).child(0).child(0);
        assert_eq!(doc.primitive_at(&path), Some(PrimitiveValue::Float32(0.0)));
        assert!(doc.value_at(&FieldPath::field(0)).is_none());
    }

    #[test]
    fn test_field_name_at() {
        let mut doc = layer_doc();
        let path = FieldPath::field(0).child(0).child(1);
        doc.set_primitive(&path, 2.0f32).unwrap();
        assert_eq!(doc.field_name_at(&path), Some("Y".to_string()));
        assert_eq!(
            doc.field_name_at(&FieldPath::field(1).element(0)),
            Some("Heights".to_string())
        );
    }

    #[test]
    fn test_untouched_lists_stay_unmaterialized() {
        let mut doc = layer_doc();
        let events = record(&mut doc);
        let heights = FieldPath::field(1);
        let markers = FieldPath::field(2);

        assert!(matches!(
            doc.remove_item(&heights, 0),
            Err(PathError::IndexOutOfRange { index: 0, len: 0 })
        ));
        assert!(matches!(
            doc.remove_item(&markers, 0),
            Err(PathError::IndexOutOfRange { index: 0, len: 0 })
        ));
        doc.clear_list(&heights).unwrap();
        doc.clear_list(&markers).unwrap();

        // No storage created, no events: the document still serializes empty
        assert!(doc.root().is_default());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_set_primitive_terminal_index_append_and_set() {
        let mut doc = layer_doc();
        let heights = FieldPath::field(1);

        // index == len appends
        doc.set_primitive(&heights.element(0), 1.0f32).unwrap();
        // index < len overwrites
        doc.set_primitive(&heights.element(0), 2.0f32).unwrap();
        assert_eq!(
            doc.primitive_at(&heights.element(0)),
            Some(PrimitiveValue::Float32(2.0))
        );
        // past the end fails
        assert!(matches!(
            doc.set_primitive(&heights.element(3), 1.0f32),
            Err(PathError::IndexOutOfRange { .. })
        ));
    }
}
