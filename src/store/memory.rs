//! Session-buffered in-memory node store with optional JSON file backing.
//!
//! A [`Repository`] owns the committed tree. Each [`Session`] works on its
//! own copy and records every write in a journal; nothing becomes visible to
//! other sessions before [`NodeStore::commit`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use super::mutation::{Mutation, Replay};
use super::tree::NodeTree;
use super::{NodeHandle, NodeId, NodeStore, StoreError, StoreResult, Value};
use crate::debug;
use crate::utils::plural_count;

#[derive(Debug)]
struct Committed {
    version: u64,
    tree: NodeTree,
}

/// Shared committed state. Cloning is cheap and yields the same repository.
#[derive(Debug, Clone)]
pub struct Repository {
    state: Arc<RwLock<Committed>>,
    file: Option<Arc<PathBuf>>,
}

impl Default for Repository {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Repository {
    /// A repository that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(RwLock::new(Committed {
                version: 0,
                tree: NodeTree::new(),
            })),
            file: None,
        }
    }

    /// Open a file-backed repository. A missing file starts an empty one;
    /// every commit rewrites the file.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let (tree, version) = Self::read_snapshot(&path)?;
        debug!("store"; "opened {} ({}, version {})", path.display(), plural_count(tree.len(), "node"), version);

        Ok(Self {
            state: Arc::new(RwLock::new(Committed { version, tree })),
            file: Some(Arc::new(path)),
        })
    }

    /// Number of commits applied so far.
    pub fn version(&self) -> u64 {
        self.state.read().version
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref().map(PathBuf::as_path)
    }

    /// Start a session on the latest committed state.
    pub fn session(&self) -> Session {
        let state = self.state.read();
        Session {
            repo: self.clone(),
            base_version: state.version,
            working: state.tree.clone(),
            journal: Vec::new(),
        }
    }

    fn read_snapshot(path: &Path) -> StoreResult<(NodeTree, u64)> {
        if !path.exists() {
            return Ok((NodeTree::new(), 0));
        }
        let content =
            fs::read_to_string(path).map_err(|err| StoreError::Io(path.to_path_buf(), err))?;
        NodeTree::from_snapshot(serde_json::from_str(&content)?)
    }

    /// Adopt a newer snapshot another process wrote to the backing file.
    fn reload_if_newer(&self, state: &mut Committed) -> StoreResult<()> {
        let Some(path) = self.file() else {
            return Ok(());
        };
        let (tree, version) = Self::read_snapshot(path)?;
        if version > state.version {
            debug!("store"; "{} changed on disk (version {} -> {})", path.display(), state.version, version);
            state.tree = tree;
            state.version = version;
        }
        Ok(())
    }

    /// Write the snapshot next to the target, then move it into place.
    fn persist(&self, tree: &NodeTree, version: u64) -> StoreResult<()> {
        let Some(path) = self.file() else {
            return Ok(());
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| StoreError::Io(parent.to_path_buf(), err))?;
        }

        let json = serde_json::to_string_pretty(&tree.to_snapshot(version))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|err| StoreError::Io(tmp.clone(), err))?;
        fs::rename(&tmp, path).map_err(|err| StoreError::Io(path.to_path_buf(), err))?;
        Ok(())
    }
}

// ============================================================================
// Session
// ============================================================================

/// A unit of work over a [`Repository`].
#[derive(Debug)]
pub struct Session {
    repo: Repository,
    /// Committed version the working copy was taken from.
    base_version: u64,
    working: NodeTree,
    journal: Vec<Mutation>,
}

impl Session {
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Number of staged mutations.
    pub fn pending(&self) -> usize {
        self.journal.len()
    }

    fn existing(&self, handle: &NodeHandle) -> StoreResult<NodeId> {
        if self.working.contains(handle.id()) {
            Ok(handle.id())
        } else {
            Err(StoreError::NotFound(handle.path().to_string()))
        }
    }

    fn handle_of(&self, id: NodeId) -> StoreResult<NodeHandle> {
        self.working
            .handle(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn rebase(&mut self) {
        let state = self.repo.state.read();
        self.working = state.tree.clone();
        self.base_version = state.version;
    }
}

impl NodeStore for Session {
    fn find_by_path(&self, path: &str) -> StoreResult<Option<NodeHandle>> {
        Ok(self
            .working
            .find(path)
            .and_then(|id| self.working.handle(id)))
    }

    fn find_by_identifier(&self, id: NodeId) -> StoreResult<Option<NodeHandle>> {
        Ok(self.working.handle(id))
    }

    fn child_names(&self, node: &NodeHandle) -> StoreResult<Vec<String>> {
        let id = self.existing(node)?;
        Ok(self.working.child_names(id).unwrap_or_default())
    }

    fn create_child(&mut self, parent: &NodeHandle, name: &str) -> StoreResult<NodeHandle> {
        let parent = self.existing(parent)?;
        if let Some(child) = self.working.child(parent, name) {
            return self.handle_of(child);
        }

        let id = NodeId::new_v4();
        self.working.insert_child(parent, name, id)?;
        let handle = self.handle_of(id)?;
        self.journal.push(Mutation::CreateChild {
            parent,
            name: name.to_string(),
            id,
            path: handle.path().to_string(),
        });
        Ok(handle)
    }

    fn rename(&mut self, node: &NodeHandle, new_name: &str) -> StoreResult<NodeHandle> {
        let id = self.existing(node)?;
        self.working.rename(id, new_name)?;
        self.journal.push(Mutation::Rename {
            node: id,
            name: new_name.to_string(),
            path: node.path().to_string(),
        });
        self.handle_of(id)
    }

    fn property(&self, node: &NodeHandle, key: &str) -> StoreResult<Option<Value>> {
        let id = self.existing(node)?;
        Ok(self.working.property(id, key).cloned())
    }

    fn set_property(
        &mut self,
        node: &NodeHandle,
        key: &str,
        value: Option<Value>,
    ) -> StoreResult<()> {
        let id = self.existing(node)?;
        let previous = self.working.set_property(id, key, value.clone())?;
        if previous != value {
            self.journal.push(Mutation::SetProperty {
                node: id,
                key: key.to_string(),
                value,
                expected: previous,
                path: node.path().to_string(),
            });
        }
        Ok(())
    }

    fn remove(&mut self, node: &NodeHandle) -> StoreResult<()> {
        let id = self.existing(node)?;
        let removed = self.working.remove(id)?;
        debug!("store"; "staged removal of {} ({})", node.path(), plural_count(removed, "node"));
        self.journal.push(Mutation::Remove {
            node: id,
            path: node.path().to_string(),
        });
        Ok(())
    }

    fn referrers(&self, target: Uuid) -> StoreResult<Vec<NodeHandle>> {
        Ok(self
            .working
            .referrers(target)
            .into_iter()
            .filter_map(|id| self.working.handle(id))
            .collect())
    }

    fn commit(&mut self) -> StoreResult<()> {
        if self.journal.is_empty() {
            return Ok(());
        }

        let mut state = self.repo.state.write();
        self.repo.reload_if_newer(&mut state)?;
        let next = if state.version == self.base_version {
            self.working.clone()
        } else {
            // Someone committed since our working copy was taken
            let mut tree = state.tree.clone();
            Replay::apply_all(&self.journal, &mut tree)?;
            tree
        };

        let version = state.version + 1;
        self.repo.persist(&next, version)?;
        state.tree = next;
        state.version = version;
        self.working = state.tree.clone();
        drop(state);

        self.base_version = version;
        debug!("store"; "committed {} (version {})", plural_count(self.journal.len(), "mutation"), version);
        self.journal.clear();
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        self.journal.clear();
        self.rebase();
        Ok(())
    }

    fn refresh(&mut self, keep_changes: bool) -> StoreResult<()> {
        if !keep_changes {
            return self.rollback();
        }

        let state = self.repo.state.read();
        let mut tree = state.tree.clone();
        Replay::apply_all(&self.journal, &mut tree)?;
        let version = state.version;
        drop(state);

        self.working = tree;
        self.base_version = version;
        Ok(())
    }

    fn has_pending_changes(&self) -> bool {
        !self.journal.is_empty()
    }
}
