//! Reaction Declarations
//!
//! A reaction pairs a selector with an effect. The selector derives a value
//! from a component instance; the effect runs when that derived value
//! changes between evaluations.
//!
//! Declarations are made once per component class through
//! [`ReactionSetBuilder`] and shared across every instance of that class.
//! Because `build` consumes the builder, no declaration can be added after
//! instances start subscribing.

use std::sync::Arc;

use serde_json::Value;

/// Selector half of a reaction: derives a value from the instance.
pub type Selector<C> = Arc<dyn Fn(&C) -> Value + Send + Sync>;

/// Effect half of a reaction: runs with the new and previous derived values.
pub type EffectFn<C> = Arc<dyn Fn(&C, &Value, &Value) + Send + Sync>;

/// One (selector, effect) declaration.
pub struct Reaction<C> {
    name: String,
    selector: Selector<C>,
    effect: EffectFn<C>,
}

impl<C> Reaction<C> {
    /// The declaration's diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn select(&self, component: &C) -> Value {
        (self.selector)(component)
    }

    pub(crate) fn run_effect(&self, component: &C, new: &Value, old: &Value) {
        (self.effect)(component, new, old);
    }
}

impl<C> Clone for Reaction<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            selector: Arc::clone(&self.selector),
            effect: Arc::clone(&self.effect),
        }
    }
}

impl<C> std::fmt::Debug for Reaction<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaction").field("name", &self.name).finish()
    }
}

/// An immutable, ordered set of reaction declarations for one component
/// class.
///
/// Cloning is cheap and shares the declarations.
pub struct ReactionSet<C> {
    reactions: Arc<[Reaction<C>]>,
}

impl<C> ReactionSet<C> {
    /// Start declaring reactions for a component class.
    pub fn builder() -> ReactionSetBuilder<C> {
        ReactionSetBuilder::new()
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    /// Whether the set has no declarations.
    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    /// Iterate the declarations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Reaction<C>> {
        self.reactions.iter()
    }

    /// Get a declaration by position.
    pub fn get(&self, index: usize) -> Option<&Reaction<C>> {
        self.reactions.get(index)
    }
}

impl<C> Clone for ReactionSet<C> {
    fn clone(&self) -> Self {
        Self {
            reactions: Arc::clone(&self.reactions),
        }
    }
}

impl<C> std::fmt::Debug for ReactionSet<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionSet")
            .field("len", &self.len())
            .finish()
    }
}

/// Builder collecting declarations in order.
pub struct ReactionSetBuilder<C> {
    reactions: Vec<Reaction<C>>,
}

impl<C> ReactionSetBuilder<C> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            reactions: Vec::new(),
        }
    }

    /// Declare one reaction.
    ///
    /// Order matters: watchers subscribe and run in declaration order.
    pub fn declare<S, E>(mut self, name: impl Into<String>, selector: S, effect: E) -> Self
    where
        S: Fn(&C) -> Value + Send + Sync + 'static,
        E: Fn(&C, &Value, &Value) + Send + Sync + 'static,
    {
        self.reactions.push(Reaction {
            name: name.into(),
            selector: Arc::new(selector),
            effect: Arc::new(effect),
        });
        self
    }

    /// Finish declaring and freeze the set.
    pub fn build(self) -> ReactionSet<C> {
        ReactionSet {
            reactions: Arc::from(self.reactions),
        }
    }
}

impl<C> Default for ReactionSetBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}
