//! Per-pair binding sessions shared by the parser and the serializer.
//!
//! A [`Binder`] is constructed around exactly one key/value pair from a tree
//! node. The target type's [`Bindable::bind`] body runs an ordered sequence
//! of claim calls against it; at most one claim succeeds per session, and the
//! engine resolves the session afterwards. The same claim calls drive the
//! reverse direction: in emit mode each declared binding appends its current
//! slot value to an accumulating output node instead of reading the pair.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::BindError;
use crate::mapper::Mapper;
use crate::value::{kind_name, FromValue, ToValue, TreeKey};

/// A type whose fields are populated and re-emitted through declared bindings.
///
/// The `bind` body is the binding declaration: an ordered sequence of claim
/// calls, each handing the engine transient access to one slot. The engine
/// drives the same body once per key/value pair when parsing and once per
/// target when serializing, so implementations must not branch on anything
/// but their own slots.
pub trait Bindable: Default + Clone {
    fn bind(&mut self, binder: &mut Binder<'_>);
}

/// Marker for targets whose enclosing key is captured via [`Binder::identity`].
pub trait BindableSnapshot: Bindable {}

/// Marker for targets whose enclosing key is discarded.
pub trait BindableObject: Bindable {}

/// One binding session: a single key/value pair awaiting a claim, or an
/// output node being accumulated.
#[derive(Debug)]
pub struct Binder<'a> {
    mapper: &'a Mapper,
    mode: Mode<'a>,
}

#[derive(Debug)]
enum Mode<'a> {
    /// Parse direction: one (key, value) pair from a node.
    Claim {
        key: &'a str,
        value: &'a Value,
        claimed: bool,
        error: Option<BindError>,
    },
    /// Serialize direction: declared bindings append to the output node.
    /// `identity` gates whether [`Binder::identity`] may emit.
    Emit {
        out: &'a mut Map<String, Value>,
        identity: bool,
    },
}

impl<'a> Binder<'a> {
    pub(crate) fn claim(mapper: &'a Mapper, key: &'a str, value: &'a Value) -> Self {
        Self {
            mapper,
            mode: Mode::Claim {
                key,
                value,
                claimed: false,
                error: None,
            },
        }
    }

    pub(crate) fn emit(
        mapper: &'a Mapper,
        out: &'a mut Map<String, Value>,
        identity: bool,
    ) -> Self {
        Self {
            mapper,
            mode: Mode::Emit { out, identity },
        }
    }

    /// Resolve a claim session after the declaration pass.
    ///
    /// A claimed session succeeds even if an earlier attempt recorded an
    /// error (a later binding took responsibility for the pair). An
    /// unclaimed session fails with the last recorded error, or with a
    /// synthesized "no binding" error when nothing was recorded.
    pub(crate) fn finish(self) -> Result<(), BindError> {
        match self.mode {
            Mode::Claim { claimed: true, .. } => Ok(()),
            Mode::Claim {
                error: Some(err), ..
            } => Err(err),
            Mode::Claim { key, .. } => Err(BindError::unmatched(key)),
            Mode::Emit { .. } => Ok(()),
        }
    }

    /// Claim the pair carrying this target's identity.
    ///
    /// The binding name is the mapper's configured identity key, so it claims
    /// both the synthetic session the snapshot walk runs for the enclosing
    /// key and any literal pair in the node under that key.
    pub fn identity(&mut self, slot: &mut Option<String>) -> &mut Self {
        let mapper = self.mapper;
        match &mut self.mode {
            Mode::Claim {
                key,
                value,
                claimed,
                ..
            } => {
                if !*claimed && *key == mapper.identity_key() {
                    *slot = (*value).as_str().map(str::to_owned);
                    *claimed = true;
                }
            }
            Mode::Emit { out, identity } => {
                if *identity {
                    if let Some(id) = slot.as_ref() {
                        out.insert(
                            mapper.identity_key().to_string(),
                            Value::String(id.clone()),
                        );
                    }
                }
            }
        }
        self
    }

    /// Claim a primitive field by name.
    ///
    /// A value whose kind does not fit `T` still claims the pair and leaves
    /// the slot empty; a wrong kind is not a binding failure by itself.
    pub fn field<T>(&mut self, name: &str, slot: &mut Option<T>) -> &mut Self
    where
        T: FromValue + ToValue,
    {
        self.field_with(name, slot, T::from_value)
    }

    /// Claim a field by name with a caller-supplied conversion.
    ///
    /// `decode` replaces [`FromValue`] for the parse direction;
    /// serialization still goes through `T`'s [`ToValue`].
    pub fn field_with<T, F>(&mut self, name: &str, slot: &mut Option<T>, decode: F) -> &mut Self
    where
        T: ToValue,
        F: FnOnce(&Value) -> Option<T>,
    {
        match &mut self.mode {
            Mode::Claim {
                key,
                value,
                claimed,
                ..
            } => {
                if !*claimed && *key == name {
                    *slot = decode(*value);
                    *claimed = true;
                }
            }
            Mode::Emit { out, .. } => {
                if let Some(current) = slot.as_ref() {
                    out.insert(name.to_string(), current.to_value());
                }
            }
        }
        self
    }

    /// Claim a nested object by name.
    ///
    /// The value is parsed recursively as a [`BindableObject`]; a failure
    /// inside the nested node is recorded unwrapped as this session's error,
    /// so it keeps naming the inner key. A `null` value claims the pair and
    /// leaves the slot empty (stores encode an absent branch as null); any
    /// other non-node value is an error for this key.
    pub fn object<T>(&mut self, name: &str, slot: &mut Option<T>) -> &mut Self
    where
        T: BindableObject,
    {
        let mapper = self.mapper;
        match &mut self.mode {
            Mode::Claim {
                key,
                value,
                claimed,
                error,
            } => {
                if !*claimed && *key == name {
                    match *value {
                        Value::Object(node) => match mapper.parse_object_node::<T>(node) {
                            Ok(nested) => {
                                *slot = Some(nested);
                                *claimed = true;
                            }
                            Err(err) => *error = Some(err),
                        },
                        Value::Null => {
                            *slot = None;
                            *claimed = true;
                        }
                        other => {
                            *error = Some(BindError::new(
                                *key,
                                format!(
                                    "expected a tree node under `{name}`, found {}",
                                    kind_name(other)
                                ),
                            ));
                        }
                    }
                }
            }
            Mode::Emit { out, .. } => {
                if let Some(nested) = slot.as_ref() {
                    out.insert(name.to_string(), Value::Object(mapper.serialize_object(nested)));
                }
            }
        }
        self
    }

    /// Claim a list of keyed snapshots by name.
    ///
    /// The value is treated as a tree-of-nodes; each node entry is parsed as
    /// a [`BindableSnapshot`] whose identity is its own sub-key, in the
    /// tree's iteration order. Non-node entries are skipped; a binding
    /// failure inside any entry is recorded unwrapped as this session's
    /// error. A `null` value claims the pair with an empty list.
    pub fn list<T>(&mut self, name: &str, slot: &mut Vec<T>) -> &mut Self
    where
        T: BindableSnapshot,
    {
        let mapper = self.mapper;
        match &mut self.mode {
            Mode::Claim {
                key,
                value,
                claimed,
                error,
            } => {
                if !*claimed && *key == name {
                    match *value {
                        Value::Object(nodes) => match mapper.parse_list_nodes::<T>(nodes) {
                            Ok(items) => {
                                *slot = items;
                                *claimed = true;
                            }
                            Err(err) => *error = Some(err),
                        },
                        Value::Null => {
                            slot.clear();
                            *claimed = true;
                        }
                        other => {
                            *error = Some(BindError::new(
                                *key,
                                format!(
                                    "expected a tree of nodes under `{name}`, found {}",
                                    kind_name(other)
                                ),
                            ));
                        }
                    }
                }
            }
            Mode::Emit { out, .. } => {
                if !slot.is_empty() {
                    out.insert(name.to_string(), Value::Object(mapper.serialize_list(slot)));
                }
            }
        }
        self
    }

    /// Claim any pair left over by the other declared bindings.
    ///
    /// This is the catch-all: `name` is only used in error messages. The
    /// pair's key and value must fit the dictionary's key/value types;
    /// repeated claims across sessions accumulate into the growing map, and
    /// a type mismatch is an error naming the dictionary. Declare it after
    /// the specific bindings it backstops: claims are attempted in
    /// declaration order, so a dictionary declared first absorbs every pair
    /// that fits. On serialization the stored pairs flatten into the parent
    /// node, mirroring how they were absorbed from it.
    pub fn dictionary<K, V>(&mut self, name: &str, slot: &mut BTreeMap<K, V>) -> &mut Self
    where
        K: TreeKey,
        V: FromValue + ToValue,
    {
        match &mut self.mode {
            Mode::Claim {
                key,
                value,
                claimed,
                error,
            } => {
                if !*claimed {
                    match (K::from_key(*key), V::from_value(*value)) {
                        (Some(k), Some(v)) => {
                            slot.insert(k, v);
                            *claimed = true;
                        }
                        (None, _) => {
                            *error = Some(BindError::new(
                                *key,
                                format!("key does not fit dictionary `{name}`"),
                            ));
                        }
                        (Some(_), None) => {
                            *error = Some(BindError::new(
                                *key,
                                format!(
                                    "value ({}) does not fit dictionary `{name}`",
                                    kind_name(*value)
                                ),
                            ));
                        }
                    }
                }
            }
            Mode::Emit { out, .. } => {
                for (k, v) in slot.iter() {
                    out.insert(k.to_key(), v.to_value());
                }
            }
        }
        self
    }
}
