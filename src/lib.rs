//! Snapbind - bidirectional bindings between tree nodes and typed targets
//!
//! A tree node is a `serde_json` object as streamed out of a realtime
//! key-value store. Targets declare their bindings once, in an ordered
//! [`Bindable::bind`] body, and a [`Mapper`] drives those declarations in
//! both directions: claiming each of a node's key/value pairs into typed
//! slots when parsing, and emitting the slots back into fresh nodes when
//! serializing. Any pair no binding claims fails the parse loudly, so a
//! misspelled key surfaces as an error naming it instead of as silently
//! dropped state.

pub mod binder;
pub mod error;
pub mod mapper;
pub mod value;

pub use binder::{Bindable, BindableObject, BindableSnapshot, Binder};
pub use error::BindError;
pub use mapper::{Mapper, DEFAULT_IDENTITY_KEY};
pub use value::{FromValue, ToValue, TreeKey};
