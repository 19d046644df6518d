//! Generates an ASCII representation of a scanned forest.

use super::node::Node;
use crate::utils::format::{format_file_count, format_size};

/// A utility struct for generating an ASCII directory tree.
///
/// This struct is stateless and provides methods as associated functions.
pub struct TreeGenerator;

impl TreeGenerator {
    /// Renders every root and its descendants, one line per node.
    ///
    /// Nodes appear in stored order; nothing is re-sorted.
    pub fn generate_tree(items: &[Node]) -> String {
        let mut result = String::new();
        Self::render_children(items, &mut result, "");
        result
    }

    fn render_children(children: &[Node], result: &mut String, prefix: &str) {
        for (i, node) in children.iter().enumerate() {
            let is_last = i == children.len() - 1;
            let connector = if is_last { "└── " } else { "├── " };

            result.push_str(&format!("{prefix}{connector}{}\n", Self::label(node)));

            if !node.children().is_empty() {
                let new_prefix = if is_last {
                    format!("{prefix}    ")
                } else {
                    format!("{prefix}│   ")
                };
                Self::render_children(node.children(), result, &new_prefix);
            }
        }
    }

    fn label(node: &Node) -> String {
        match node {
            Node::File(file) => format!("📄 {} ({})", file.name, format_size(file.size)),
            Node::Folder(folder) => format!(
                "📁 {} ({}, {})",
                folder.name,
                format_size(folder.size),
                format_file_count(folder.file_count)
            ),
        }
    }
}
