//! Filepath: src/core/tree.rs
//! Tree view of the virtual file map, with per-file total line counts
//! appended as `name:lines`, e.g. `app.js:42`. Folders are derived from
//! path prefixes; they are never stored in the map itself.
//!
//! Notes:
//! - Counts lines by scanning bytes for '\n' (CRLF-safe).
//! - Uses BTreeMap for deterministic ordering.
//! - Projection is pure so the same map always renders the same tree.

use anyhow::Result;
use owo_colors::OwoColorize;
use ptree::TreeBuilder;
use ptree::item::StringItem;
use std::collections::BTreeMap;

use crate::cli::{AppContext, TreeArgs};
use crate::core::workspace::FileMap;
use crate::infra::store::open_store;

pub fn run(args: TreeArgs, ctx: &AppContext) -> Result<()> {
    if ctx.dry_run {
        if !ctx.quiet {
            println!("{}", "DRY RUN: Would render:".yellow());
            println!("  Workspace: {}", args.id);
        }
        return Ok(());
    }

    let store = open_store(ctx)?;
    let record = store.get_workspace(&args.id)?;

    if !ctx.quiet {
        let tree = build_display_tree(&args.id, &record.files, !ctx.no_color);
        ptree::print_tree(&tree)?;
    }

    Ok(())
}

/// One level of the projected tree: subfolders, then leaf files.
/// Leaf values hold the full map key the leaf came from.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TreeNode {
    pub folders: BTreeMap<String, TreeNode>,
    pub files: BTreeMap<String, String>,
}

/// Project the flat map into nested folder levels.
///
/// Segments come from splitting each key on '/'; the leading slash
/// contributes no segment, so `/src/a.js` lands as `src` -> `a.js`.
pub fn project(files: &FileMap) -> TreeNode {
    let mut root = TreeNode::default();
    for full_path in files.keys() {
        let segments: Vec<&str> = full_path.split('/').filter(|s| !s.is_empty()).collect();
        insert(&mut root, &segments, full_path);
    }
    root
}

fn insert(node: &mut TreeNode, segments: &[&str], full_path: &str) {
    match segments {
        [] => {}
        [leaf] => {
            node.files.insert((*leaf).to_string(), full_path.to_string());
        }
        [folder, rest @ ..] => {
            let child = node.folders.entry((*folder).to_string()).or_default();
            insert(child, rest, full_path);
        }
    }
}

/// Build the printable tree. Folders sort before files at each level,
/// matching how the map's own editor lists them.
pub fn build_display_tree(root_label: &str, files: &FileMap, color: bool) -> StringItem {
    let root = project(files);
    let label = if color {
        format!("{}/", root_label.blue())
    } else {
        format!("{root_label}/")
    };
    let mut builder = TreeBuilder::new(label);
    add_level(&mut builder, &root, files, color);
    builder.build()
}

fn add_level(builder: &mut TreeBuilder, node: &TreeNode, files: &FileMap, color: bool) {
    for (name, child) in &node.folders {
        builder.begin_child(format_folder_label(name, color));
        add_level(builder, child, files, color);
        builder.end_child();
    }
    for (name, full_path) in &node.files {
        let lines = files
            .get(full_path)
            .map(|content| count_lines(content.text()))
            .unwrap_or(0);
        builder.add_empty_child(format_file_label(name, lines, color));
    }
}

fn format_folder_label(name: &str, color: bool) -> String {
    if color {
        format!("{}/", name.blue())
    } else {
        format!("{name}/")
    }
}

/// File label with colors and appended `:lines`.
fn format_file_label(name: &str, lines: usize, color: bool) -> String {
    if color {
        format!("{}:{}", color_by_ext(name), lines)
    } else {
        format!("{name}:{lines}")
    }
}

fn color_by_ext(name: &str) -> String {
    if let Some(ext) = std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
    {
        match ext {
            "js" | "jsx" | "ts" | "tsx" => name.cyan().to_string(),
            "css" | "scss" => name.magenta().to_string(),
            "html" => name.red().to_string(),
            "json" | "toml" | "yaml" | "yml" => name.bright_blue().to_string(),
            "md" | "txt" => name.white().to_string(),
            "py" => name.green().to_string(),
            "rs" => name.yellow().to_string(),
            _ => name.to_string(),
        }
    } else {
        name.to_string()
    }
}

/// CRLF-safe total line counting over in-memory content.
/// Counts '\n' bytes and adds one if the text doesn't end with '\n'.
pub fn count_lines(text: &str) -> usize {
    use memchr::memchr_iter;

    if text.is_empty() {
        return 0;
    }
    let nl = memchr_iter(b'\n', text.as_bytes()).count();
    if text.ends_with('\n') { nl } else { nl + 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workspace::FileContent;

    fn sample() -> FileMap {
        let mut files = FileMap::new();
        files.insert("/src/a.js".to_string(), FileContent::coded("let a = 1;\nlet b = 2;"));
        files.insert("/readme.md".to_string(), FileContent::plain("# Hi\n"));
        files
    }

    #[test]
    fn test_projection_structure() {
        let tree = project(&sample());

        let src = tree.folders.get("src").expect("src folder present");
        assert_eq!(src.files.get("a.js"), Some(&"/src/a.js".to_string()));
        assert_eq!(tree.files.get("readme.md"), Some(&"/readme.md".to_string()));
        assert!(tree.folders.get("readme.md").is_none());
    }

    #[test]
    fn test_projection_is_deterministic() {
        assert_eq!(project(&sample()), project(&sample()));
    }

    #[test]
    fn test_deep_paths_nest() {
        let mut files = FileMap::new();
        files.insert("/a/b/c/d.txt".to_string(), FileContent::plain("x"));
        let tree = project(&files);

        let c = &tree.folders["a"].folders["b"].folders["c"];
        assert_eq!(c.files.get("d.txt"), Some(&"/a/b/c/d.txt".to_string()));
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("one"), 1);
        assert_eq!(count_lines("one\n"), 1);
        assert_eq!(count_lines("one\ntwo"), 2);
        assert_eq!(count_lines("one\r\ntwo\r\n"), 2);
    }

    #[test]
    fn test_labels_without_color() {
        assert_eq!(format_folder_label("src", false), "src/");
        assert_eq!(format_file_label("a.js", 3, false), "a.js:3");
    }

    #[test]
    fn test_rendered_tree_lists_folders_before_files() -> Result<()> {
        let tree = build_display_tree("demo", &sample(), false);
        let mut out = Vec::new();
        ptree::write_tree(&tree, &mut out)?;
        let text = String::from_utf8(out)?;

        assert!(text.contains("demo/"));
        assert!(text.contains("src/"));
        assert!(text.contains("a.js:2"));
        assert!(text.contains("readme.md:1"));
        let src_at = text.find("src/").unwrap();
        let readme_at = text.find("readme.md").unwrap();
        assert!(src_at < readme_at);

        Ok(())
    }
}
