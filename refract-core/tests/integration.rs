//! Integration Tests for the State-Synchronization Runtime
//!
//! These tests drive components the way a host does: construct, mount,
//! commit raw frames through update, and unmount, verifying that mirrors,
//! reactions, and form fields work together correctly.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};

use refract_core::form::{FieldElement, FieldProps, FormField, FormHandle};
use refract_core::{
    Binding, Lifecycle, ObservedInstance, ObservedMirror, PrevFrame, ReactionSet, Snapshot,
    StateBridge,
};

fn attrs(value: Value) -> Snapshot {
    Snapshot::try_from(value).unwrap()
}

/// A minimal non-form component for exercising the generic bridge.
struct Gauge {
    mirror: ObservedMirror,
    props: RwLock<Snapshot>,
    state: RwLock<Snapshot>,
}

impl Gauge {
    fn new(props: Snapshot) -> Self {
        Self {
            mirror: ObservedMirror::new(props.clone(), Snapshot::new()),
            props: RwLock::new(props),
            state: RwLock::new(Snapshot::new()),
        }
    }

    fn commit_props(&self, next: Snapshot) -> PrevFrame {
        let prev = std::mem::replace(&mut *self.props.write(), next);
        PrevFrame {
            props: prev,
            state: self.state.read().clone(),
            context: None,
        }
    }

    fn commit_state(&self, next: Snapshot) -> PrevFrame {
        let prev = std::mem::replace(&mut *self.state.write(), next);
        PrevFrame {
            props: self.props.read().clone(),
            state: prev,
            context: None,
        }
    }
}

impl ObservedInstance for Gauge {
    fn mirror(&self) -> &ObservedMirror {
        &self.mirror
    }

    fn current_props(&self) -> Snapshot {
        self.props.read().clone()
    }

    fn current_state(&self) -> Snapshot {
        self.state.read().clone()
    }
}

/// Test that reaction watchers exist exactly while the field is mounted.
#[test]
fn watchers_follow_the_mount_span() {
    let field = FormField::new(FieldProps::new(Snapshot::new()));
    assert_eq!(field.binding(), Binding::Unbound);
    assert_eq!(field.active_reaction_count(), 0);

    field.on_mount();
    assert_eq!(field.binding(), Binding::Bound);
    assert_eq!(field.active_reaction_count(), 2);

    field.on_unmount();
    assert_eq!(field.binding(), Binding::Unbound);
    assert_eq!(field.active_reaction_count(), 0);

    // A second span works like the first
    field.on_mount();
    assert_eq!(field.active_reaction_count(), 2);
    field.on_unmount();
}

/// Test that an incoming default is adopted and then emitted, in order.
#[test]
fn adoption_chains_into_emission_on_update() {
    let emitted = Arc::new(Mutex::new(Vec::new()));
    let emitted_clone = emitted.clone();
    let field = FormField::new(
        FieldProps::new(Snapshot::new())
            .with_change_handler(move |value| emitted_clone.lock().push(value.clone())),
    );
    field.on_mount();
    assert_eq!(field.inner_value(), Value::Null);

    // The owner starts supplying a default value
    let prev = field.replace_props(attrs(json!({ "default_value": "incoming" })));
    field.on_update(&prev, None);

    // The empty field adopted it, and the adoption was emitted as a change
    assert_eq!(field.inner_value(), json!("incoming"));
    assert_eq!(*emitted.lock(), vec![json!("incoming")]);
}

/// Test that adoption never overwrites a value the user already holds.
#[test]
fn adoption_never_overwrites_a_real_value() {
    let field = FormField::new(FieldProps::new(attrs(json!({
        "default_value": "first"
    }))));
    field.on_mount();

    // The user edits to zero, which is a real value, not an empty one
    field.emit_value(0);
    assert_eq!(field.inner_value(), json!(0));

    let prev = field.replace_props(attrs(json!({ "default_value": "second" })));
    field.on_update(&prev, None);
    assert_eq!(field.inner_value(), json!(0));

    // An empty incoming default is never adopted either
    let empty = FormField::new(FieldProps::new(Snapshot::new()));
    empty.on_mount();
    let prev = empty.replace_props(attrs(json!({ "default_value": "" })));
    empty.on_update(&prev, None);
    assert_eq!(empty.inner_value(), Value::Null);
}

/// Test that a non-empty owner value wins and an emptied one falls back.
#[test]
fn owner_value_wins_until_it_empties() {
    let field = FormField::new(FieldProps::new(attrs(json!({
        "value": "owner",
        "default_value": "fallback"
    }))));
    field.on_mount();
    assert_eq!(field.value(), json!("owner"));

    // The owner clears its value prop; presentation falls back to the
    // field's own value
    let prev = field.replace_props(attrs(json!({
        "value": "",
        "default_value": "fallback"
    })));
    field.on_update(&prev, None);
    assert_eq!(field.value(), json!("fallback"));

    // Booleans are never empty, so false is a real owner value
    let toggled = FormField::new(FieldProps::new(attrs(json!({ "value": false }))));
    toggled.on_mount();
    assert_eq!(toggled.value(), json!(false));
}

/// Test that each flushed change is emitted exactly once.
#[test]
fn change_emission_fires_once_per_real_change() {
    let emissions = Arc::new(AtomicI32::new(0));
    let emissions_clone = emissions.clone();
    let field = FormField::new(
        FieldProps::new(Snapshot::new())
            .with_change_handler(move |_| {
                emissions_clone.fetch_add(1, Ordering::SeqCst);
            }),
    );
    field.on_mount();

    field.emit_value("a");
    assert_eq!(emissions.load(Ordering::SeqCst), 1);

    // Re-emitting the same value is not a change
    field.emit_value("a");
    assert_eq!(emissions.load(Ordering::SeqCst), 1);

    field.emit_value("b");
    assert_eq!(emissions.load(Ordering::SeqCst), 2);
}

/// Test that a native form reset restores the declared default.
#[test]
fn form_reset_restores_the_declared_default() {
    let emitted = Arc::new(Mutex::new(Vec::new()));
    let emitted_clone = emitted.clone();
    let field = FormField::new(
        FieldProps::new(attrs(json!({ "default_value": "factory" })))
            .with_change_handler(move |value| emitted_clone.lock().push(value.clone())),
    );

    // The host renders the field inside a form and attaches the element
    let form = FormHandle::new();
    field.field_ref().attach(FieldElement::with_form(form.clone()));

    field.on_mount();
    assert_eq!(form.listener_count(), 1);

    field.emit_value("scribble");
    assert_eq!(field.value(), json!("scribble"));

    // The form resets; the field snaps back and the change is emitted
    form.emit_reset();
    assert_eq!(field.value(), json!("factory"));
    assert_eq!(*emitted.lock(), vec![json!("scribble"), json!("factory")]);
}

/// Test that bookkeeping-only prop churn never touches the mirror.
#[test]
fn bookkeeping_churn_leaves_the_mirror_alone() {
    let emissions = Arc::new(AtomicI32::new(0));
    let emissions_clone = emissions.clone();
    let field = FormField::new(
        FieldProps::new(attrs(json!({
            "default_value": "x",
            "__owner": "parent-a"
        })))
        .with_change_handler(move |_| {
            emissions_clone.fetch_add(1, Ordering::SeqCst);
        }),
    );
    field.on_mount();
    let before = field.mirror().props().version();

    // Only the ignored bookkeeping key differs
    let prev = field.replace_props(attrs(json!({
        "default_value": "x",
        "__owner": "parent-b"
    })));
    field.on_update(&prev, None);

    assert_eq!(field.mirror().props().version(), before);
    assert_eq!(emissions.load(Ordering::SeqCst), 0);
}

/// Test that unmount detaches the reset listener and kills the watchers.
#[test]
fn unmount_detaches_listener_and_watchers() {
    let field = FormField::new(FieldProps::new(attrs(json!({
        "default_value": "factory"
    }))));
    let form = FormHandle::new();
    field.field_ref().attach(FieldElement::with_form(form.clone()));

    field.on_mount();
    assert_eq!(form.listener_count(), 1);

    field.emit_value("scribble");
    field.on_unmount();
    assert_eq!(form.listener_count(), 0);
    assert_eq!(field.active_reaction_count(), 0);

    // A reset after unmount reaches nothing
    form.emit_reset();
    assert_eq!(field.inner_value(), json!("scribble"));

    // Repeating unmount changes nothing
    field.on_unmount();
    assert_eq!(field.active_reaction_count(), 0);

    // Unmounting a never-mounted field is also fine
    let fresh = FormField::new(FieldProps::new(Snapshot::new()));
    fresh.on_unmount();
    assert_eq!(fresh.active_reaction_count(), 0);
}

/// Test that repeated mounts keep exactly one listener and watcher set.
#[test]
fn repeated_mounts_do_not_stack() {
    let field = FormField::new(FieldProps::new(Snapshot::new()));
    let form = FormHandle::new();
    field.field_ref().attach(FieldElement::with_form(form.clone()));

    field.on_mount();
    field.on_mount();
    assert_eq!(form.listener_count(), 1);
    assert_eq!(field.active_reaction_count(), 2);

    // A full remount lands back at one of each
    field.on_unmount();
    field.on_mount();
    assert_eq!(form.listener_count(), 1);
    assert_eq!(field.active_reaction_count(), 2);
}

/// Test that mounting outside any form is a silent no-op for the listener.
#[test]
fn mount_without_a_form_is_silent() {
    let field = FormField::new(FieldProps::new(attrs(json!({
        "default_value": "d"
    }))));

    // No element was ever attached to the reference
    field.on_mount();
    assert_eq!(field.binding(), Binding::Bound);

    // Local reset still works without a form
    field.emit_value("x");
    field.reset();
    assert_eq!(field.value(), json!("d"));

    // An element outside any form behaves the same
    let bare = FormField::new(FieldProps::new(Snapshot::new()));
    bare.field_ref().attach(FieldElement::new());
    bare.on_mount();
    assert_eq!(bare.binding(), Binding::Bound);
}

/// Test the generic bridge with a custom component and reaction set.
#[test]
fn custom_component_reacts_to_mirrored_state() {
    let seen = Arc::new(AtomicI32::new(-1));
    let seen_clone = seen.clone();
    let runs = Arc::new(AtomicI32::new(0));
    let runs_clone = runs.clone();

    let set = ReactionSet::builder()
        .declare(
            "level-watch",
            |gauge: &Gauge| {
                gauge
                    .mirror
                    .state()
                    .with(|state| state.get("level").cloned())
                    .unwrap_or(Value::Null)
            },
            move |_gauge, new_level, _old| {
                runs_clone.fetch_add(1, Ordering::SeqCst);
                seen_clone.store(new_level.as_i64().unwrap_or(-1) as i32, Ordering::SeqCst);
            },
        )
        .build();

    let gauge = Gauge::new(Snapshot::new());
    let bridge = StateBridge::new(set);
    gauge.mirror.bind_queue(bridge.queue());
    bridge.mount(&gauge);

    let prev = gauge.commit_state(attrs(json!({ "level": 3 })));
    bridge.update(&gauge, &prev);
    assert_eq!(seen.load(Ordering::SeqCst), 3);
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    // Bookkeeping churn in state is filtered by the same gate
    let prev = gauge.commit_state(attrs(json!({ "level": 3, "__owner": "panel" })));
    bridge.update(&gauge, &prev);
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let prev = gauge.commit_state(attrs(json!({ "level": 5, "__owner": "panel" })));
    bridge.update(&gauge, &prev);
    assert_eq!(seen.load(Ordering::SeqCst), 5);
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    bridge.unmount();
    let prev = gauge.commit_state(attrs(json!({ "level": 9 })));
    bridge.update(&gauge, &prev);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

/// Test that effects run in declaration order within a single update.
#[test]
fn effects_run_in_declaration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let log_props = log.clone();
    let log_state = log.clone();

    let set = ReactionSet::builder()
        .declare(
            "props-echo",
            |gauge: &Gauge| {
                gauge
                    .mirror
                    .props()
                    .with(|props| props.get("label").cloned())
                    .unwrap_or(Value::Null)
            },
            move |_gauge, _new, _old| log_props.lock().push("props-echo"),
        )
        .declare(
            "state-echo",
            |gauge: &Gauge| {
                gauge
                    .mirror
                    .state()
                    .with(|state| state.get("level").cloned())
                    .unwrap_or(Value::Null)
            },
            move |_gauge, _new, _old| log_state.lock().push("state-echo"),
        )
        .build();

    let gauge = Gauge::new(Snapshot::new());
    let bridge = StateBridge::new(set);
    gauge.mirror.bind_queue(bridge.queue());
    bridge.mount(&gauge);

    // One frame changes both props and state; both effects fire, in the
    // order their reactions were declared
    gauge.commit_state(attrs(json!({ "level": 1 })));
    gauge.commit_props(attrs(json!({ "label": "a" })));
    let prev = PrevFrame {
        props: Snapshot::new(),
        state: Snapshot::new(),
        context: None,
    };
    bridge.update(&gauge, &prev);

    assert_eq!(*log.lock(), vec!["props-echo", "state-echo"]);
}
