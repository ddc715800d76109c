//! The mapping facility: recursive tree walkers for the parse direction and
//! node builders for the serialize direction.
//!
//! A [`Mapper`] holds only configuration (today, the identity key), so a
//! single instance is cheap to share and safe to call from any number of
//! threads. Parsing walks a tree top-down, running one claim session per
//! key/value pair of each node; serialization drives the same binding
//! declarations once per target, bottom-up, into fresh nodes.

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::binder::{Bindable, BindableObject, BindableSnapshot, Binder};
use crate::error::BindError;
use crate::value::kind_name;

/// Identity key used by [`Mapper::new`].
pub const DEFAULT_IDENTITY_KEY: &str = "id";

/// Drives parse and serialize passes over tree nodes.
#[derive(Debug, Clone)]
pub struct Mapper {
    identity_key: String,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper {
    /// A mapper using [`DEFAULT_IDENTITY_KEY`] for snapshot identities.
    pub fn new() -> Self {
        Self::with_identity_key(DEFAULT_IDENTITY_KEY)
    }

    /// A mapper whose [`Binder::identity`] bindings claim `identity_key`
    /// instead of the default. Parsing and serialization must use the same
    /// mapper for identities to round-trip.
    pub fn with_identity_key(identity_key: impl Into<String>) -> Self {
        Self {
            identity_key: identity_key.into(),
        }
    }

    /// The key under which snapshot identities are claimed and emitted.
    pub fn identity_key(&self) -> &str {
        &self.identity_key
    }

    /// Parse `node` into a snapshot target whose identity is `key`, the key
    /// the node sits under in its parent tree.
    ///
    /// The identity is offered to the target as a synthetic leading session
    /// under the identity key; a literal pair under that key inside the node
    /// is also claimable and overwrites the synthesized value. Fails on the
    /// first pair no binding claims.
    #[instrument(skip_all, fields(key = %key, ty = std::any::type_name::<T>()))]
    pub fn parse_snapshot<T: BindableSnapshot>(
        &self,
        key: &str,
        node: &Value,
    ) -> Result<T, BindError> {
        match node.as_object() {
            Some(node) => self.parse_snapshot_node(key, node),
            None => Err(BindError::new(
                key,
                format!("expected a tree node, found {}", kind_name(node)),
            )),
        }
    }

    /// Parse `node` into a plain object target. No identity session runs;
    /// the node's enclosing key, if any, is the caller's business.
    ///
    /// A root-shape failure here carries an empty error key, since there is
    /// no enclosing key to name.
    #[instrument(skip_all, fields(ty = std::any::type_name::<T>()))]
    pub fn parse_object<T: BindableObject>(&self, node: &Value) -> Result<T, BindError> {
        match node.as_object() {
            Some(node) => self.parse_object_node(node),
            None => Err(BindError::new(
                "",
                format!("expected a tree node, found {}", kind_name(node)),
            )),
        }
    }

    /// Parse a tree-of-nodes into a list of snapshot targets, one per node
    /// entry, each taking its identity from its sub-key, in the tree's
    /// iteration order.
    ///
    /// A root that is not a tree node yields an empty list rather than an
    /// error, matching how an absent branch reads from a store. Entries that
    /// are not nodes themselves are skipped. A binding failure inside any
    /// entry aborts the whole parse.
    #[instrument(skip_all, fields(ty = std::any::type_name::<T>()))]
    pub fn parse_list<T: BindableSnapshot>(&self, nodes: &Value) -> Result<Vec<T>, BindError> {
        match nodes.as_object() {
            Some(nodes) => self.parse_list_nodes(nodes),
            None => {
                debug!(
                    found = kind_name(nodes),
                    "list root is not a tree of nodes, yielding no elements"
                );
                Ok(Vec::new())
            }
        }
    }

    pub(crate) fn parse_snapshot_node<T: BindableSnapshot>(
        &self,
        key: &str,
        node: &Map<String, Value>,
    ) -> Result<T, BindError> {
        let mut target = T::default();
        let enclosing = Value::String(key.to_owned());
        self.run_claim(&mut target, self.identity_key.as_str(), &enclosing)?;
        for (pair_key, pair_value) in node {
            self.run_claim(&mut target, pair_key, pair_value)?;
        }
        Ok(target)
    }

    pub(crate) fn parse_object_node<T: BindableObject>(
        &self,
        node: &Map<String, Value>,
    ) -> Result<T, BindError> {
        let mut target = T::default();
        for (pair_key, pair_value) in node {
            self.run_claim(&mut target, pair_key, pair_value)?;
        }
        Ok(target)
    }

    pub(crate) fn parse_list_nodes<T: BindableSnapshot>(
        &self,
        nodes: &Map<String, Value>,
    ) -> Result<Vec<T>, BindError> {
        let mut items = Vec::with_capacity(nodes.len());
        for (sub_key, sub_node) in nodes {
            match sub_node.as_object() {
                Some(node) => items.push(self.parse_snapshot_node(sub_key, node)?),
                None => debug!(
                    key = %sub_key,
                    found = kind_name(sub_node),
                    "skipping list entry that is not a node"
                ),
            }
        }
        Ok(items)
    }

    fn run_claim<T: Bindable>(
        &self,
        target: &mut T,
        key: &str,
        value: &Value,
    ) -> Result<(), BindError> {
        let mut binder = Binder::claim(self, key, value);
        target.bind(&mut binder);
        binder.finish()
    }

    /// Build the node for a snapshot target. The identity is emitted as a
    /// literal pair under the identity key; empty slots and empty
    /// collections are omitted.
    pub fn serialize_snapshot<T: BindableSnapshot>(&self, target: &T) -> Map<String, Value> {
        self.run_emit(target, true)
    }

    /// Build the node for a plain object target. Identity bindings emit
    /// nothing here; everything else serializes as for snapshots.
    pub fn serialize_object<T: BindableObject>(&self, target: &T) -> Map<String, Value> {
        self.run_emit(target, false)
    }

    /// Build a tree-of-nodes from snapshot targets, keyed by each element's
    /// identity. Elements without an identity have no key to sit under and
    /// are skipped; elements sharing an identity keep only the last one.
    pub fn serialize_list<T: BindableSnapshot>(&self, items: &[T]) -> Map<String, Value> {
        let mut out = Map::new();
        for item in items {
            let node = self.serialize_snapshot(item);
            let sub_key = node
                .get(self.identity_key.as_str())
                .and_then(Value::as_str)
                .map(str::to_owned);
            match sub_key {
                Some(sub_key) => {
                    if out.insert(sub_key.clone(), Value::Object(node)).is_some() {
                        debug!(
                            key = %sub_key,
                            "list element overwrote an earlier one with the same identity"
                        );
                    }
                }
                None => debug!(
                    ty = std::any::type_name::<T>(),
                    "skipping list element with no identity"
                ),
            }
        }
        out
    }

    fn run_emit<T: Bindable>(&self, target: &T, identity: bool) -> Map<String, Value> {
        // The declarations need mutable slot access even when emitting, so
        // drive them over a scratch clone and let the output node carry the
        // result.
        let mut scratch = target.clone();
        let mut out = Map::new();
        let mut binder = Binder::emit(self, &mut out, identity);
        scratch.bind(&mut binder);
        out
    }
}
