//! The file/folder records that make up a scanned tree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::utils::file_detection::extension_of;

/// Opaque node identifier. Generated once per node and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single eligible file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub id: NodeId,
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    /// Suffix after the last `.`, in the case it appears on disk.
    pub extension: String,
    /// Always 1; carried so files and folders serialize the same count field.
    pub file_count: u64,
}

impl FileNode {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, size: u64) -> Self {
        let name = name.into();
        let extension = extension_of(&name).unwrap_or_default().to_string();
        Self {
            id: NodeId::new(),
            name,
            path: path.into(),
            size,
            extension,
            file_count: 1,
        }
    }
}

/// A directory holding at least one eligible descendant.
///
/// `size` and `file_count` are cached rollups of `children` and must be
/// refreshed with [`FolderNode::recalculate`] after any structural change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    pub id: NodeId,
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub file_count: u64,
    pub children: Vec<Node>,
    pub is_open: bool,
}

impl FolderNode {
    /// Creates a closed folder from already-built children.
    ///
    /// Returns `None` when `children` is empty: empty folders are never part of a tree.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        children: Vec<Node>,
    ) -> Option<Self> {
        if children.is_empty() {
            return None;
        }
        let mut folder = Self {
            id: NodeId::new(),
            name: name.into(),
            path: path.into(),
            size: 0,
            file_count: 0,
            children,
            is_open: false,
        };
        folder.recalculate();
        Some(folder)
    }

    /// Recomputes `size` and `file_count` from the direct children.
    pub fn recalculate(&mut self) {
        self.size = self.children.iter().map(Node::size).sum();
        self.file_count = self.children.iter().map(Node::file_count).sum();
    }
}

/// A node of the aggregate tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    File(FileNode),
    Folder(FolderNode),
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::File(file) => file.id,
            Node::Folder(folder) => folder.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::File(file) => &file.name,
            Node::Folder(folder) => &folder.name,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Node::File(file) => &file.path,
            Node::Folder(folder) => &folder.path,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Node::File(file) => file.size,
            Node::Folder(folder) => folder.size,
        }
    }

    pub fn file_count(&self) -> u64 {
        match self {
            Node::File(file) => file.file_count,
            Node::Folder(folder) => folder.file_count,
        }
    }

    /// Direct children; always empty for files.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::File(_) => &[],
            Node::Folder(folder) => &folder.children,
        }
    }

    /// Depth-first lookup of `id` in this subtree, including `self`.
    pub fn find(&self, id: NodeId) -> Option<&Node> {
        if self.id() == id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if self.id() == id {
            return Some(self);
        }
        match self {
            Node::File(_) => None,
            Node::Folder(folder) => folder
                .children
                .iter_mut()
                .find_map(|child| child.find_mut(id)),
        }
    }
}

impl From<FileNode> for Node {
    fn from(file: FileNode) -> Self {
        Node::File(file)
    }
}

impl From<FolderNode> for Node {
    fn from(folder: FolderNode) -> Self {
        Node::Folder(folder)
    }
}
