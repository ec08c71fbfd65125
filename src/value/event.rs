//! Change events and listener registration
//!
//! Every mutation of a document produces exactly one [`ValueChangedEvent`],
//! delivered to all listeners in registration order before the mutating
//! call returns. Listeners either unsubscribe explicitly by id or register
//! with a liveness token; token-backed subscriptions whose owner has been
//! dropped are pruned lazily at dispatch.

use std::sync::{Arc, Weak};

use log::trace;

use super::field_value::FieldValue;
use super::path::FieldPath;
use super::primitive::PrimitiveValue;
use super::type_value::TypeValue;
use crate::schema::TypeId;

/// Payload of one document mutation.
#[derive(Clone, Debug)]
pub enum ValueChange {
    /// Scalar primitive write (including writes to list elements).
    Primitive {
        old: PrimitiveValue,
        new: PrimitiveValue,
    },
    /// Enumeration ordinal write.
    Enumeration { old: i32, new: i32 },
    /// A set field was reset to its declared default.
    FieldReset { old: FieldValue },
    /// Element appended to a primitive list.
    PrimitiveListAdded { value: PrimitiveValue },
    /// Element removed from a primitive list.
    PrimitiveListRemoved { value: PrimitiveValue },
    /// Primitive list cleared; carries every removed element in order.
    PrimitiveListCleared { values: Vec<PrimitiveValue> },
    /// Element appended to a type list.
    TypeListAdded { type_id: TypeId },
    /// Element removed from a type list.
    TypeListRemoved { value: TypeValue },
    /// Type list cleared; carries every removed element in order.
    TypeListCleared { values: Vec<TypeValue> },
}

/// One mutation, located by the path of the changed value.
///
/// Element-level changes carry the element path (list field plus index);
/// clears carry the list field path.
#[derive(Clone, Debug)]
pub struct ValueChangedEvent {
    pub path: FieldPath,
    pub change: ValueChange,
}

/// Handle for explicit unsubscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Liveness token for scoped subscriptions. Keep it alive for as long as
/// the listener should fire; dropping the last clone retires the
/// subscription at the next dispatch.
#[derive(Clone, Default)]
pub struct ListenerToken(Arc<()>);

impl ListenerToken {
    pub fn new() -> Self {
        Self::default()
    }
}

type ListenerFn = Box<dyn FnMut(&ValueChangedEvent)>;

struct ListenerEntry {
    id: ListenerId,
    token: Option<Weak<()>>,
    callback: ListenerFn,
}

impl ListenerEntry {
    fn is_live(&self) -> bool {
        match &self.token {
            Some(token) => token.strong_count() > 0,
            None => true,
        }
    }
}

/// Ordered listener registry.
#[derive(Default)]
pub struct ListenerSet {
    entries: Vec<ListenerEntry>,
    next_id: u64,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, token: Option<Weak<()>>, callback: ListenerFn) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push(ListenerEntry {
            id,
            token,
            callback,
        });
        id
    }

    /// Register a listener that fires until explicitly unsubscribed.
    pub fn subscribe(&mut self, callback: impl FnMut(&ValueChangedEvent) + 'static) -> ListenerId {
        self.insert(None, Box::new(callback))
    }

    /// Register a listener bound to a liveness token.
    pub fn subscribe_scoped(
        &mut self,
        token: &ListenerToken,
        callback: impl FnMut(&ValueChangedEvent) + 'static,
    ) -> ListenerId {
        self.insert(Some(Arc::downgrade(&token.0)), Box::new(callback))
    }

    /// Remove a listener by id. Removing an unknown id is a no-op.
    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.entries.retain(|e| e.id != id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deliver one event to every live listener in registration order,
    /// pruning dead token-backed entries.
    pub fn dispatch(&mut self, event: &ValueChangedEvent) {
        trace!("dispatching change at {}", event.path);
        self.entries.retain_mut(|entry| {
            if !entry.is_live() {
                return false;
            }
            (entry.callback)(event);
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn event() -> ValueChangedEvent {
        ValueChangedEvent {
            path: FieldPath::field(0),
            change: ValueChange::Enumeration { old: 0, new: 1 },
        }
    }

    #[test]
    fn test_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut set = ListenerSet::new();
        for i in 0..3 {
            let order = order.clone();
            set.subscribe(move |_| order.borrow_mut().push(i));
        }
        set.dispatch(&event());
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unsubscribe_by_id() {
        let count = Rc::new(RefCell::new(0));
        let mut set = ListenerSet::new();
        let counter = count.clone();
        let id = set.subscribe(move |_| *counter.borrow_mut() += 1);
        set.dispatch(&event());
        set.unsubscribe(id);
        set.dispatch(&event());
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_token_pruning() {
        let count = Rc::new(RefCell::new(0));
        let mut set = ListenerSet::new();
        let token = ListenerToken::new();
        let counter = count.clone();
        set.subscribe_scoped(&token, move |_| *counter.borrow_mut() += 1);

        set.dispatch(&event());
        assert_eq!(*count.borrow(), 1);
        assert_eq!(set.len(), 1);

        drop(token);
        set.dispatch(&event());
        assert_eq!(*count.borrow(), 1);
        // Dead entry pruned during dispatch, not retained until unsubscribe
        assert!(set.is_empty());
    }
}
