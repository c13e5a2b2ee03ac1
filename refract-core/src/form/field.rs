//! Form Field Controller
//!
//! A form field owns the value-binding behavior every input component
//! needs: adopting an externally supplied default into an empty field,
//! emitting user edits through a change handler, and answering ambient
//! form resets.
//!
//! # Value Resolution
//!
//! The field's presented value is derived on every read. A non-empty
//! `value` prop from the owner wins; otherwise the field's own inner value
//! is used. The inner value is written by exactly three paths: default
//! adoption, user edits via [`FormField::emit_value`], and reset.
//!
//! # Binding
//!
//! The field is [`Binding::Unbound`] from construction until mount.
//! Mounting refreshes the mirrors, subscribes both class reactions, and
//! attaches the reset listener to the form reachable through the field
//! reference. Unmounting reverses all of it synchronously; repeating
//! either transition changes nothing.

use std::sync::{Arc, OnceLock, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::debug;

use crate::bridge::{Lifecycle, ObservedInstance, PrevFrame, StateBridge};
use crate::observe::{is_empty, EmptinessCheck, ObservedMirror, Snapshot};
use crate::reactive::{Disposer, Observable, ReactionSet};

use super::host::FieldRef;

/// Key of the owner-controlled value prop.
pub const VALUE_KEY: &str = "value";

/// Key of the externally supplied default value prop.
pub const DEFAULT_VALUE_KEY: &str = "default_value";

/// Callback invoked with each emitted value change.
pub type ChangeHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Mount-derived state of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Constructed but not mounted: no live watchers, no reset listener.
    Unbound,
    /// Mounted: reactions subscribed and the reset listener attached.
    Bound,
}

/// Construction input for a field.
pub struct FieldProps {
    /// The attribute bag, carrying `value`, `default_value`, and any
    /// passthrough attributes.
    pub attrs: Snapshot,

    /// Change handler, if the owner wants edit notifications.
    pub on_change: Option<ChangeHandler>,
}

impl FieldProps {
    /// Props with no change handler.
    pub fn new(attrs: Snapshot) -> Self {
        Self {
            attrs,
            on_change: None,
        }
    }

    /// Attach a change handler.
    pub fn with_change_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(handler));
        self
    }
}

impl std::fmt::Debug for FieldProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldProps")
            .field("attrs", &self.attrs)
            .field("has_change_handler", &self.on_change.is_some())
            .finish()
    }
}

/// The class-level reaction declarations, shared across all fields.
fn field_reactions() -> ReactionSet<FieldInner> {
    static REACTIONS: OnceLock<ReactionSet<FieldInner>> = OnceLock::new();
    REACTIONS
        .get_or_init(|| {
            ReactionSet::builder()
                .declare(
                    "default-value-adoption",
                    |field: &FieldInner| field.observed_default_value(),
                    |field, new_default, _old| field.adopt_default(new_default),
                )
                .declare(
                    "change-emission",
                    |field: &FieldInner| field.inner_value.get(),
                    |field, new_value, _old| field.emit_change(new_value),
                )
                .build()
        })
        .clone()
}

struct FieldInner {
    mirror: ObservedMirror,
    props: RwLock<Snapshot>,
    state: RwLock<Snapshot>,
    context: RwLock<Snapshot>,
    inner_value: Observable<Value>,
    on_change: RwLock<Option<ChangeHandler>>,
    is_empty_check: EmptinessCheck,
    reference: FieldRef,
    reset_listener: Mutex<Option<Disposer>>,
}

impl FieldInner {
    /// Tracked read of the mirrored default value.
    fn observed_default_value(&self) -> Value {
        self.mirror
            .props()
            .with(|props| props.get(DEFAULT_VALUE_KEY).cloned())
            .unwrap_or(Value::Null)
    }

    /// Adoption fills an empty field from a non-empty incoming default.
    /// A field that already holds something is never overwritten.
    fn adopt_default(&self, new_default: &Value) {
        if (self.is_empty_check)(new_default) {
            return;
        }
        let field_is_empty = self
            .inner_value
            .with(|current| (self.is_empty_check)(current));
        if !field_is_empty {
            return;
        }
        debug!("adopted incoming default value");
        self.inner_value.set(new_default.clone());
    }

    /// Hand the emitted value to the current change handler.
    ///
    /// Emitted values are plain copies of data; no internal handle ever
    /// crosses this boundary.
    fn emit_change(&self, value: &Value) {
        let handler = self.on_change.read().clone();
        if let Some(handler) = handler {
            handler(value);
        }
    }

    /// Overwrite the inner value from the current raw default.
    ///
    /// Reset bypasses the emptiness check: it restores the declared
    /// default even over a non-empty edit, and clears the field when no
    /// default is declared.
    fn reset_from_default(&self) {
        let default = self
            .props
            .read()
            .get(DEFAULT_VALUE_KEY)
            .cloned()
            .unwrap_or(Value::Null);
        self.inner_value.set(default);
    }

    /// Owner value when present and non-empty, else the inner value.
    fn resolved_value(&self) -> Value {
        let owner = self
            .mirror
            .props()
            .with(|props| props.get(VALUE_KEY).cloned());
        match owner {
            Some(value) if !(self.is_empty_check)(&value) => value,
            _ => self.inner_value.get(),
        }
    }
}

impl ObservedInstance for FieldInner {
    fn mirror(&self) -> &ObservedMirror {
        &self.mirror
    }

    fn current_props(&self) -> Snapshot {
        self.props.read().clone()
    }

    fn current_state(&self) -> Snapshot {
        self.state.read().clone()
    }

    fn current_context(&self) -> Snapshot {
        self.context.read().clone()
    }
}

/// A form input's value controller.
///
/// Construct one per input component, forward the host lifecycle hooks to
/// it, and route user edits through [`FormField::emit_value`].
pub struct FormField {
    inner: Arc<FieldInner>,
    bridge: StateBridge<FieldInner>,
}

impl FormField {
    /// Create a field with the default emptiness policy.
    pub fn new(props: FieldProps) -> Self {
        Self::with_emptiness(props, Arc::new(is_empty))
    }

    /// Create a field judging emptiness with a custom predicate.
    pub fn with_emptiness(props: FieldProps, is_empty_check: EmptinessCheck) -> Self {
        let FieldProps { attrs, on_change } = props;
        let initial_inner = attrs
            .get(DEFAULT_VALUE_KEY)
            .cloned()
            .unwrap_or(Value::Null);

        let inner = Arc::new(FieldInner {
            mirror: ObservedMirror::new(attrs.clone(), Snapshot::new()),
            props: RwLock::new(attrs),
            state: RwLock::new(Snapshot::new()),
            context: RwLock::new(Snapshot::new()),
            inner_value: Observable::new(initial_inner),
            on_change: RwLock::new(on_change),
            is_empty_check,
            reference: FieldRef::new(),
            reset_listener: Mutex::new(None),
        });

        let bridge = StateBridge::new(field_reactions());
        inner.mirror.bind_queue(bridge.queue());
        inner.inner_value.bind_queue(bridge.queue());

        Self { inner, bridge }
    }

    /// The field's presented value, derived on every read.
    pub fn value(&self) -> Value {
        self.inner.resolved_value()
    }

    /// The field's own inner value, ignoring any owner `value` prop.
    pub fn inner_value(&self) -> Value {
        self.inner.inner_value.get_untracked()
    }

    /// Record a user edit and flush, emitting the change if it is one.
    pub fn emit_value(&self, value: impl Into<Value>) {
        self.inner.inner_value.set(value.into());
        self.bridge.flush(&self.inner);
    }

    /// Restore the declared default, unconditionally.
    ///
    /// The change, if any, is emitted through the ordinary emission
    /// reaction, so a bound field's change handler sees the reset value.
    pub fn reset(&self) {
        self.inner.reset_from_default();
        self.bridge.flush(&self.inner);
    }

    /// Replace the change handler. Later emissions use the new handler.
    pub fn set_change_handler<F>(&self, handler: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        *self.inner.on_change.write() = Some(Arc::new(handler));
    }

    /// Drop the change handler. Later emissions go nowhere.
    pub fn clear_change_handler(&self) {
        *self.inner.on_change.write() = None;
    }

    /// Commit new raw props, returning the frame to pass to
    /// [`Lifecycle::on_update`].
    pub fn replace_props(&self, next: Snapshot) -> PrevFrame {
        let prev_props = std::mem::replace(&mut *self.inner.props.write(), next);
        PrevFrame {
            props: prev_props,
            state: self.inner.state.read().clone(),
            context: None,
        }
    }

    /// Commit new raw state, returning the frame to pass to
    /// [`Lifecycle::on_update`].
    pub fn replace_state(&self, next: Snapshot) -> PrevFrame {
        let prev_state = std::mem::replace(&mut *self.inner.state.write(), next);
        PrevFrame {
            props: self.inner.props.read().clone(),
            state: prev_state,
            context: None,
        }
    }

    /// Commit new raw context, returning the frame to pass to
    /// [`Lifecycle::on_update`]. The frame carries `Some(prev)` so the
    /// context mirror is synchronized.
    pub fn replace_context(&self, next: Snapshot) -> PrevFrame {
        let prev_context = std::mem::replace(&mut *self.inner.context.write(), next);
        PrevFrame {
            props: self.inner.props.read().clone(),
            state: self.inner.state.read().clone(),
            context: Some(prev_context),
        }
    }

    /// The current raw props.
    pub fn props(&self) -> Snapshot {
        self.inner.props.read().clone()
    }

    /// The reference the host attaches the rendered element to.
    pub fn field_ref(&self) -> FieldRef {
        self.inner.reference.clone()
    }

    /// The field's mirror cells.
    pub fn mirror(&self) -> &ObservedMirror {
        &self.inner.mirror
    }

    /// The field's mount-derived state.
    pub fn binding(&self) -> Binding {
        if self.bridge.is_mounted() {
            Binding::Bound
        } else {
            Binding::Unbound
        }
    }

    /// Number of live reaction watchers.
    pub fn active_reaction_count(&self) -> usize {
        self.bridge.reactor().active_count()
    }

    /// Attach the reset listener to the form reachable through the field
    /// reference. Silent no-op when there is no element or no form.
    fn attach_reset_listener(&self) {
        let mut slot = self.inner.reset_listener.lock();
        if slot.is_some() {
            return;
        }
        let Some(form) = self.inner.reference.form() else {
            return;
        };

        let field: Weak<FieldInner> = Arc::downgrade(&self.inner);
        let reactor = self.bridge.reactor().clone();
        let listener = form.add_reset_listener(move || {
            if let Some(field) = field.upgrade() {
                field.reset_from_default();
                reactor.flush(&field);
            }
        });
        debug!("reset listener attached");
        *slot = Some(listener);
    }

    /// Detach the reset listener if one is attached.
    fn detach_reset_listener(&self) {
        if let Some(listener) = self.inner.reset_listener.lock().take() {
            listener.dispose();
            debug!("reset listener detached");
        }
    }
}

impl Clone for FormField {
    /// Clones share the same field.
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            bridge: self.bridge.clone(),
        }
    }
}

impl Lifecycle for FormField {
    fn on_mount(&self) {
        self.bridge.mount(&self.inner);
        self.attach_reset_listener();
    }

    fn on_update(&self, prev: &PrevFrame, _snapshot: Option<&Value>) {
        self.bridge.update(&self.inner, prev);
    }

    fn on_unmount(&self) {
        self.detach_reset_listener();
        self.bridge.unmount();
    }
}

impl std::fmt::Debug for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormField")
            .field("binding", &self.binding())
            .field("value", &self.inner.resolved_value())
            .finish()
    }
}
