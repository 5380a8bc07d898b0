//! Staged session mutations and their replay onto committed state.

use rustc_hash::FxHashMap;

use super::tree::NodeTree;
use super::{NodeId, StoreError, StoreResult, Value};
use crate::debug;

/// One staged write. `path` is where the session saw the node when staging.
#[derive(Debug, Clone)]
pub(super) enum Mutation {
    CreateChild {
        parent: NodeId,
        name: String,
        id: NodeId,
        path: String,
    },
    Rename {
        node: NodeId,
        name: String,
        path: String,
    },
    SetProperty {
        node: NodeId,
        key: String,
        value: Option<Value>,
        /// Value the session observed before writing.
        expected: Option<Value>,
        path: String,
    },
    Remove {
        node: NodeId,
        path: String,
    },
}

/// Replays a journal onto a newer committed tree.
///
/// A child created by the session that another session created concurrently
/// under the same name is merged: later mutations are redirected to the
/// existing node. Property writes whose observed value changed meanwhile and
/// writes to nodes that vanished are conflicts.
#[derive(Debug, Default)]
pub(super) struct Replay {
    merged: FxHashMap<NodeId, NodeId>,
}

impl Replay {
    pub fn apply_all(journal: &[Mutation], tree: &mut NodeTree) -> StoreResult<()> {
        let mut replay = Self::default();
        journal
            .iter()
            .try_for_each(|mutation| replay.apply(mutation, tree))
    }

    fn apply(&mut self, mutation: &Mutation, tree: &mut NodeTree) -> StoreResult<()> {
        match mutation {
            Mutation::CreateChild {
                parent,
                name,
                id,
                path,
            } => {
                let parent = self.resolve(*parent);
                if !tree.contains(parent) {
                    return Err(conflict(path));
                }
                match tree.child(parent, name) {
                    Some(existing) => {
                        self.merged.insert(*id, existing);
                    }
                    None => tree.insert_child(parent, name, *id)?,
                }
            }

            Mutation::Rename { node, name, path } => {
                let node = self.resolve(*node);
                if !tree.contains(node) {
                    return Err(conflict(path));
                }
                tree.rename(node, name).map_err(|_| conflict(path))?;
            }

            Mutation::SetProperty {
                node,
                key,
                value,
                expected,
                path,
            } => {
                let node = self.resolve(*node);
                if !tree.contains(node) {
                    return Err(conflict(path));
                }
                let expected = expected.as_ref().map(|v| self.translate(v));
                if tree.property(node, key) != expected.as_ref() {
                    return Err(conflict(path));
                }
                let value = value.as_ref().map(|v| self.translate(v));
                tree.set_property(node, key, value)?;
            }

            Mutation::Remove { node, path } => {
                let node = self.resolve(*node);
                // Already gone is fine: the outcome is the same
                if tree.contains(node) {
                    tree.remove(node)?;
                } else {
                    debug!("store"; "{} was already removed", path);
                }
            }
        }
        Ok(())
    }

    fn resolve(&self, id: NodeId) -> NodeId {
        self.merged.get(&id).copied().unwrap_or(id)
    }

    fn translate(&self, value: &Value) -> Value {
        match value {
            Value::Reference(target) => Value::Reference(self.resolve(NodeId(*target)).0),
            other => other.clone(),
        }
    }
}

fn conflict(path: &str) -> StoreError {
    StoreError::Conflict {
        path: path.to_string(),
    }
}
