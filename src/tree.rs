use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One node of the browsable project tree.
///
/// Files carry their full slash-delimited archive path so the client can
/// request previews and extraction without re-walking parent keys.
/// Directory children are keyed by segment name; ordering is not part of the
/// contract (the consuming UI re-sorts), a BTreeMap just keeps output stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    File { path: String },
    Directory { children: BTreeMap<String, TreeNode> },
}

impl TreeNode {
    fn directory() -> Self {
        TreeNode::Directory {
            children: BTreeMap::new(),
        }
    }
}

/// Top-level structure: segment name -> node.
pub type FileStructure = BTreeMap<String, TreeNode>;

/// Convert a flat list of slash-delimited entry paths into a nested tree.
///
/// Every path produces exactly one `File` leaf; earlier segments become
/// directories. Malformed paths (empty segments) simply create oddly-named
/// nodes. A file node that later turns out to be a directory prefix of
/// another path is replaced by a directory.
pub fn build_file_structure<S: AsRef<str>>(paths: &[S]) -> FileStructure {
    let mut structure = FileStructure::new();

    for path in paths {
        let path = path.as_ref();
        let parts: Vec<&str> = path.split('/').collect();
        let mut current = &mut structure;

        for (index, part) in parts.iter().enumerate() {
            if index == parts.len() - 1 {
                current.insert(
                    part.to_string(),
                    TreeNode::File {
                        path: path.to_string(),
                    },
                );
            } else {
                let node = current
                    .entry(part.to_string())
                    .or_insert_with(TreeNode::directory);
                if let TreeNode::File { .. } = node {
                    *node = TreeNode::directory();
                }
                match node {
                    TreeNode::Directory { children } => current = children,
                    TreeNode::File { .. } => unreachable!("file nodes are replaced above"),
                }
            }
        }
    }

    structure
}

/// Flatten the tree back to the list of file paths it was built from.
pub fn flatten_paths(structure: &FileStructure) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths(structure, &mut paths);
    paths
}

fn collect_paths(structure: &FileStructure, out: &mut Vec<String>) {
    for node in structure.values() {
        match node {
            TreeNode::File { path } => out.push(path.clone()),
            TreeNode::Directory { children } => collect_paths(children, out),
        }
    }
}

/// Render the tree as indented ASCII text for the smart-chat system prompt.
pub fn render_tree_text(structure: &FileStructure) -> String {
    let mut text = String::new();
    render_level(structure, "", &mut text);
    text
}

fn render_level(structure: &FileStructure, indent: &str, out: &mut String) {
    let count = structure.len();
    for (i, (name, node)) in structure.iter().enumerate() {
        let is_last = i == count - 1;
        let prefix = if is_last { "└── " } else { "├── " };
        let child_indent = format!("{}{}", indent, if is_last { "    " } else { "│   " });

        match node {
            TreeNode::Directory { children } => {
                out.push_str(&format!("{}{}{}/\n", indent, prefix, name));
                render_level(children, &child_indent, out);
            }
            TreeNode::File { .. } => {
                out.push_str(&format!("{}{}{}\n", indent, prefix, name));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_nested_structure() {
        let structure = build_file_structure(&["src/main.rs", "src/lib.rs", "README.md"]);

        assert_eq!(structure.len(), 2);
        match structure.get("src").unwrap() {
            TreeNode::Directory { children } => {
                assert_eq!(children.len(), 2);
                assert_eq!(
                    children.get("main.rs").unwrap(),
                    &TreeNode::File {
                        path: "src/main.rs".to_string()
                    }
                );
            }
            other => panic!("expected directory, got {:?}", other),
        }
        assert_eq!(
            structure.get("README.md").unwrap(),
            &TreeNode::File {
                path: "README.md".to_string()
            }
        );
    }

    #[test]
    fn test_every_path_has_exactly_one_leaf() {
        let paths = vec![
            "a.txt".to_string(),
            "dir/b.txt".to_string(),
            "dir/sub/c.txt".to_string(),
            "dir/sub/d.txt".to_string(),
        ];
        let structure = build_file_structure(&paths);
        let mut flat = flatten_paths(&structure);
        flat.sort();
        let mut expected = paths.clone();
        expected.sort();
        assert_eq!(flat, expected);
    }

    #[test]
    fn test_empty_segment_creates_odd_node() {
        // "dir//x" has an empty middle segment; accepted, not an error.
        let structure = build_file_structure(&["dir//x"]);
        match structure.get("dir").unwrap() {
            TreeNode::Directory { children } => {
                assert!(children.contains_key(""));
            }
            other => panic!("expected directory, got {:?}", other),
        }
    }

    #[test]
    fn test_serialized_shape() {
        let structure = build_file_structure(&["src/main.rs"]);
        let json = serde_json::to_value(&structure).unwrap();
        assert_eq!(json["src"]["type"], "directory");
        assert_eq!(json["src"]["children"]["main.rs"]["type"], "file");
        assert_eq!(json["src"]["children"]["main.rs"]["path"], "src/main.rs");
    }

    #[test]
    fn test_render_tree_text() {
        let structure = build_file_structure(&["src/main.rs", "README.md"]);
        let text = render_tree_text(&structure);
        assert!(text.contains("README.md"));
        assert!(text.contains("src/"));
        assert!(text.contains("main.rs"));
        // Last top-level entry uses the corner connector
        assert!(text.contains("└── src/"));
    }
}
