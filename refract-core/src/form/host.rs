//! Host-side form handles.
//!
//! Form fields live inside an ambient form owned by the host. The field
//! reaches that form through a [`FieldRef`]: the host attaches a
//! [`FieldElement`] to the ref when the field renders, and the element may
//! carry the [`FormHandle`] of its enclosing form. Reset events travel from
//! the form to every registered listener.

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::reactive::{Disposer, ListenerId};

/// Settable reference to a rendered field element.
///
/// Starts empty; the host attaches the element when the field renders and
/// detaches it when the element goes away. Clones share the same slot.
#[derive(Clone, Default)]
pub struct FieldRef {
    current: Arc<RwLock<Option<FieldElement>>>,
}

impl FieldRef {
    /// Create an empty reference.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the rendered element.
    pub fn attach(&self, element: FieldElement) {
        *self.current.write() = Some(element);
    }

    /// Clear the reference.
    pub fn detach(&self) {
        *self.current.write() = None;
    }

    /// The attached element, if any.
    pub fn element(&self) -> Option<FieldElement> {
        self.current.read().clone()
    }

    /// The form the attached element belongs to, if any.
    pub fn form(&self) -> Option<FormHandle> {
        self.current
            .read()
            .as_ref()
            .and_then(|element| element.form().cloned())
    }
}

impl std::fmt::Debug for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRef")
            .field("attached", &self.current.read().is_some())
            .finish()
    }
}

/// A rendered field element, possibly inside a form.
#[derive(Debug, Clone, Default)]
pub struct FieldElement {
    form: Option<FormHandle>,
}

impl FieldElement {
    /// An element outside any form.
    pub fn new() -> Self {
        Self::default()
    }

    /// An element belonging to the given form.
    pub fn with_form(form: FormHandle) -> Self {
        Self { form: Some(form) }
    }

    /// The enclosing form, if any.
    pub fn form(&self) -> Option<&FormHandle> {
        self.form.as_ref()
    }
}

/// Handle to an ambient form.
///
/// Holds the reset-listener registry. Clones share the same form.
#[derive(Clone, Default)]
pub struct FormHandle {
    inner: Arc<FormInner>,
}

#[derive(Default)]
struct FormInner {
    listeners: RwLock<IndexMap<ListenerId, Arc<dyn Fn() + Send + Sync>>>,
}

impl FormHandle {
    /// Create a form with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reset listener.
    ///
    /// The returned [`Disposer`] detaches the listener when invoked or
    /// dropped; detaching happens at most once.
    pub fn add_reset_listener<F>(&self, listener: F) -> Disposer
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId::new();
        self.inner.listeners.write().insert(id, Arc::new(listener));

        let inner: Weak<FormInner> = Arc::downgrade(&self.inner);
        Disposer::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.listeners.write().shift_remove(&id);
            }
        })
    }

    /// Fire a reset event to every listener, in registration order.
    pub fn emit_reset(&self) {
        // Collect first so listeners run without the registry lock held.
        let listeners: Vec<Arc<dyn Fn() + Send + Sync>> = {
            let registry = self.inner.listeners.read();
            registry.values().map(Arc::clone).collect()
        };
        for listener in listeners {
            listener();
        }
    }

    /// Number of registered reset listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    /// Whether two handles point at the same form.
    pub fn same_form(&self, other: &FormHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for FormHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormHandle")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}
