pub mod error;
pub mod fs;
pub mod ignore;
pub mod node;
pub mod store;
pub mod tree_builder;
pub mod tree_generator;

pub use error::CoreError;
pub use fs::{DirEntry, EntryMetadata, FileSystem, TokioFileSystem};
pub use ignore::build_globset_from_patterns;
pub use node::{FileNode, FolderNode, Node, NodeId};
pub use store::FileStore;
pub use tree_builder::{ScanProgress, TreeBuilder};
pub use tree_generator::TreeGenerator;
