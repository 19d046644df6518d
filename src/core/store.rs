//! The aggregate store: a forest of scanned roots with cached totals.

use std::path::{Path, PathBuf};

use super::node::{Node, NodeId};
use super::tree_builder::TreeBuilder;

/// Holds the roots added by the user, in insertion order.
///
/// `total_size`, `total_items` and `source_paths` are recomputed at the end of
/// every mutating operation, so they always describe the current `items`.
/// The store performs no I/O itself and never fails; callers sharing it across
/// threads must hold exclusive access for the duration of each operation.
#[derive(Debug, Clone, Default)]
pub struct FileStore {
    items: Vec<Node>,
    total_size: u64,
    total_items: u64,
    source_paths: Vec<PathBuf>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Node] {
        &self.items
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    pub fn source_paths(&self) -> &[PathBuf] {
        &self.source_paths
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_root(&self, path: &Path) -> bool {
        self.items.iter().any(|item| item.path() == path)
    }

    /// Scans `paths` and merges the resulting roots.
    pub async fn add_items_from_paths<P: AsRef<Path>>(
        &mut self,
        builder: &TreeBuilder,
        paths: &[P],
    ) -> usize {
        let roots = builder.process_paths(paths).await;
        self.merge_roots(roots)
    }

    /// Appends every root whose path is not present yet, keeping the given order.
    ///
    /// Duplicates, including duplicates within `roots`, are dropped silently.
    /// Returns how many roots were accepted.
    pub fn merge_roots(&mut self, roots: Vec<Node>) -> usize {
        let mut added = 0;
        for root in roots {
            if self.contains_root(root.path()) {
                tracing::debug!("Root {} already present, skipping", root.path().display());
                continue;
            }
            self.items.push(root);
            added += 1;
        }
        self.refresh_derived();
        added
    }

    /// Removes the node with `id` from anywhere in the forest.
    ///
    /// Ancestors that become empty are pruned up to the root; every surviving
    /// ancestor gets its rollups recalculated. Unknown ids are ignored.
    pub fn remove_by_id(&mut self, id: NodeId) {
        if find_and_remove(&mut self.items, id) {
            tracing::debug!("Removed node {}", id);
        }
        self.refresh_derived();
    }

    /// Drops every root.
    pub fn clear_all(&mut self) {
        self.items.clear();
        self.refresh_derived();
    }

    /// Flips the expansion flag of the folder with `id`.
    ///
    /// Returns `false` if no folder with that id exists.
    pub fn toggle_open(&mut self, id: NodeId) -> bool {
        match self.items.iter_mut().find_map(|item| item.find_mut(id)) {
            Some(Node::Folder(folder)) => {
                folder.is_open = !folder.is_open;
                true
            }
            _ => false,
        }
    }

    pub fn find(&self, id: NodeId) -> Option<&Node> {
        self.items.iter().find_map(|item| item.find(id))
    }

    fn refresh_derived(&mut self) {
        self.total_size = self.items.iter().map(Node::size).sum();
        self.total_items = self.items.iter().map(Node::file_count).sum();
        self.source_paths = self
            .items
            .iter()
            .map(|item| item.path().to_path_buf())
            .collect();
    }
}

/// Depth-first removal. Returns `true` once `id` has been found and removed.
fn find_and_remove(list: &mut Vec<Node>, id: NodeId) -> bool {
    if let Some(index) = list.iter().position(|item| item.id() == id) {
        list.remove(index);
        return true;
    }

    for index in 0..list.len() {
        let Node::Folder(folder) = &mut list[index] else {
            continue;
        };
        if !find_and_remove(&mut folder.children, id) {
            continue;
        }
        if folder.children.is_empty() {
            list.remove(index);
        } else {
            folder.recalculate();
        }
        return true;
    }

    false
}
