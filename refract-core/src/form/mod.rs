//! Form Integration
//!
//! The pieces a form input needs beyond plain observed state: the
//! [`FormField`] value controller, and the [`FieldRef`] / [`FormHandle`]
//! surface the host uses to wire rendered elements and ambient form
//! resets back to it.

mod field;
mod host;

pub use field::{
    Binding, ChangeHandler, FieldProps, FormField, DEFAULT_VALUE_KEY, VALUE_KEY,
};
pub use host::{FieldElement, FieldRef, FormHandle};
