//! Virtual file map with tree-shaped edit operations.
//!
//! A workspace holds project files as one flat map from normalized path
//! (`/src/app.js`) to content. Folders are never stored; they exist only
//! as shared path prefixes. Rename and delete therefore work on prefixes:
//! renaming `/src` rewrites every key under `/src/`, deleting it removes
//! them. All mutations keep two invariants: keys stay unique after
//! normalization, and no key is simultaneously a leaf and a folder.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Flat path -> content map, iteration in insertion order.
pub type FileMap = IndexMap<String, FileContent>;

/// One file's content in either of the two persisted shapes.
///
/// Seeded and hand-added files are bare strings; generator output is
/// wrapped in a `{ "code": ... }` object. Both shapes survive edits
/// unchanged so documents round-trip byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileContent {
    Plain(String),
    Coded { code: String },
}

impl FileContent {
    pub fn plain(text: impl Into<String>) -> Self {
        FileContent::Plain(text.into())
    }

    pub fn coded(text: impl Into<String>) -> Self {
        FileContent::Coded { code: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            FileContent::Plain(text) => text,
            FileContent::Coded { code } => code,
        }
    }

    /// Replace the text while keeping the variant.
    pub fn set_text(&mut self, text: impl Into<String>) {
        match self {
            FileContent::Plain(slot) => *slot = text.into(),
            FileContent::Coded { code } => *code = text.into(),
        }
    }
}

/// Trim surrounding whitespace and force exactly one leading slash.
pub fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Where the workspace sits relative to its persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Matches what was loaded or seeded; nothing to write back.
    Loaded,
    /// Has unpersisted mutations.
    Mutated,
    /// Mutations have been written back.
    Saved,
}

/// In-memory workspace: file map, current selection, expanded folders.
///
/// The expanded-folder set is session state and is not persisted; it is
/// kept here because rename and delete must re-key or prune it in step
/// with the file map.
#[derive(Debug, Clone)]
pub struct Workspace {
    files: FileMap,
    selected: Option<String>,
    open_folders: IndexMap<String, bool>,
    phase: Phase,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            files: FileMap::new(),
            selected: None,
            open_folders: IndexMap::new(),
            phase: Phase::Loaded,
        }
    }

    /// Fresh workspace with a single placeholder file, selected.
    pub fn seeded(file_name: &str, content: &str) -> Self {
        let path = normalize_path(file_name);
        let mut files = FileMap::new();
        files.insert(path.clone(), FileContent::plain(content));
        Self {
            files,
            selected: Some(path),
            open_folders: IndexMap::new(),
            phase: Phase::Loaded,
        }
    }

    /// Rebuild from a persisted document.
    ///
    /// Keys are re-normalized on the way in and a stale selection falls
    /// back to the first key.
    pub fn load(files: FileMap, selected: Option<String>) -> Self {
        let mut ws = Self::new();
        ws.replace_all(files);
        ws.phase = Phase::Loaded;
        if let Some(path) = selected {
            let path = normalize_path(&path);
            if ws.files.contains_key(&path) {
                ws.selected = Some(path);
            }
        }
        ws
    }

    pub fn files(&self) -> &FileMap {
        &self.files
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_dirty(&self) -> bool {
        self.phase == Phase::Mutated
    }

    pub fn mark_saved(&mut self) {
        if self.phase == Phase::Mutated {
            self.phase = Phase::Saved;
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    pub fn content(&self, path: &str) -> Option<&FileContent> {
        self.files.get(&normalize_path(path))
    }

    /// Swap in a whole new map (generator output replaces everything).
    ///
    /// Incoming keys are normalized; exact duplicates keep the last
    /// occurrence. When one key nests under another, the enclosing leaf
    /// takes a `-copyN` suffix in either arrival order. Selection
    /// carries over when its file survives, otherwise moves to the first
    /// key of the new map.
    pub fn replace_all(&mut self, incoming: FileMap) {
        let mut next = FileMap::new();
        let mut taken: Vec<String> = Vec::new();

        for (raw_path, content) in incoming {
            let path = normalize_path(&raw_path);
            if let Some(slot) = next.get_mut(&path) {
                *slot = content;
                continue;
            }
            displace_ancestor_leaf(&mut next, &mut taken, &path);
            let unique = ensure_unique(&path, &taken);
            taken.push(unique.clone());
            next.insert(unique, content);
        }

        self.files = next;
        self.open_folders.clear();
        let keep = self
            .selected
            .take()
            .filter(|path| self.files.contains_key(path));
        self.selected = keep.or_else(|| self.files.keys().next().cloned());
        self.phase = Phase::Mutated;
    }

    /// Add an empty numbered file (`/fileN.js`) and select it.
    ///
    /// N counts from the current map size, so deleting files can make
    /// the counter land on a taken name; the suffix rule resolves it.
    pub fn add_file(&mut self, default_content: &str) -> String {
        let candidate = normalize_path(&format!("file{}.js", self.files.len() + 1));
        let taken: Vec<String> = self.files.keys().cloned().collect();
        let path = ensure_unique(&candidate, &taken);

        self.files
            .insert(path.clone(), FileContent::plain(default_content));
        self.selected = Some(path.clone());
        self.phase = Phase::Mutated;
        path
    }

    /// Overwrite one file's text, keeping its content shape.
    ///
    /// Unknown paths are a no-op; returns whether an edit happened.
    pub fn edit_content(&mut self, path: &str, text: &str) -> bool {
        let path = normalize_path(path);
        match self.files.get_mut(&path) {
            Some(content) => {
                content.set_text(text);
                self.phase = Phase::Mutated;
                true
            }
            None => false,
        }
    }

    /// Rename a leaf or a folder to a new last segment.
    ///
    /// Leaf: the entry moves to the end of the map under its new key.
    /// Folder: every key under `path/` is rewritten to the new prefix,
    /// each move suffixed independently if its target is taken, and
    /// expanded-folder entries are re-keyed to match. An empty or
    /// slash-bearing name, or an unknown path, cancels the edit.
    /// Returns the applied `(old, new)` moves, empty when nothing
    /// changed.
    pub fn rename(&mut self, path: &str, new_name: &str) -> Vec<(String, String)> {
        let new_name = new_name.trim();
        if new_name.is_empty() || new_name.contains('/') {
            return Vec::new();
        }
        let old = normalize_path(path);
        let prefix = format!("{old}/");

        if self.files.contains_key(&old) {
            return self.rename_leaf(&old, new_name);
        }

        let descendants: Vec<String> = self
            .files
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect();
        if descendants.is_empty() {
            return Vec::new();
        }
        self.rename_folder(&old, &prefix, new_name, descendants)
    }

    fn rename_leaf(&mut self, old: &str, new_name: &str) -> Vec<(String, String)> {
        let target = replace_last_segment(old, new_name);
        if target == old {
            return Vec::new();
        }

        let taken: Vec<String> = self
            .files
            .keys()
            .filter(|k| k.as_str() != old)
            .cloned()
            .collect();
        let target = ensure_unique(&target, &taken);

        if let Some(content) = self.files.shift_remove(old) {
            self.files.insert(target.clone(), content);
        }
        if self.selected.as_deref() == Some(old) {
            self.selected = Some(target.clone());
        }
        self.phase = Phase::Mutated;
        vec![(old.to_string(), target)]
    }

    fn rename_folder(
        &mut self,
        old: &str,
        prefix: &str,
        new_name: &str,
        descendants: Vec<String>,
    ) -> Vec<(String, String)> {
        let new_root = replace_last_segment(old, new_name);
        if new_root == old {
            return Vec::new();
        }

        // Keys that stay put; moved entries must stay clear of them
        let outside: Vec<String> = self
            .files
            .keys()
            .filter(|k| !k.starts_with(prefix))
            .cloned()
            .collect();
        let rests: Vec<String> = descendants
            .iter()
            .map(|d| d[prefix.len()..].to_string())
            .collect();

        // The new root itself may collide with a leaf, or bury a moved
        // path under one. Per-file suffixing cannot escape that, so the
        // root is suffixed until the whole subtree is clear.
        let new_root = clear_folder_root(&new_root, &rests, &outside);
        let new_prefix = format!("{new_root}/");

        let mut moves = Vec::with_capacity(descendants.len());
        for source in descendants {
            let rest = &source[prefix.len()..];
            let candidate = format!("{new_prefix}{rest}");
            let taken: Vec<String> = self
                .files
                .keys()
                .filter(|k| !k.starts_with(prefix))
                .cloned()
                .collect();
            let unique = ensure_unique(&candidate, &taken);

            if let Some(content) = self.files.shift_remove(&source) {
                self.files.insert(unique.clone(), content);
            }
            if self.selected.as_deref() == Some(source.as_str()) {
                self.selected = Some(unique.clone());
            }
            moves.push((source, unique));
        }

        self.rekey_open_folders(old, prefix, &new_root, &new_prefix);
        self.phase = Phase::Mutated;
        moves
    }

    fn rekey_open_folders(&mut self, old: &str, prefix: &str, new_root: &str, new_prefix: &str) {
        let rekeyed: IndexMap<String, bool> = self
            .open_folders
            .drain(..)
            .map(|(key, expanded)| {
                if key == old {
                    (new_root.to_string(), expanded)
                } else if let Some(rest) = key.strip_prefix(prefix) {
                    (format!("{new_prefix}{rest}"), expanded)
                } else {
                    (key, expanded)
                }
            })
            .collect();
        self.open_folders = rekeyed;
    }

    /// Delete a leaf, or a folder together with everything under it.
    ///
    /// Expanded-folder entries under the path are pruned; if the
    /// selection was removed, it falls back to the first remaining key.
    /// Returns the number of entries removed (0 for unknown paths).
    pub fn delete(&mut self, path: &str) -> usize {
        if path.trim().is_empty() {
            return 0;
        }
        let target = normalize_path(path);
        let prefix = format!("{target}/");

        let doomed: Vec<String> = self
            .files
            .keys()
            .filter(|k| **k == target || k.starts_with(&prefix))
            .cloned()
            .collect();
        if doomed.is_empty() {
            return 0;
        }

        for key in &doomed {
            self.files.shift_remove(key);
        }
        self.open_folders
            .retain(|k, _| k != &target && !k.starts_with(&prefix));

        let selection_gone = self
            .selected
            .as_deref()
            .is_some_and(|s| doomed.iter().any(|d| d == s));
        if selection_gone {
            self.selected = self.files.keys().next().cloned();
        }

        self.phase = Phase::Mutated;
        doomed.len()
    }

    /// Flip one folder's expanded flag (absent counts as collapsed).
    pub fn toggle_folder(&mut self, path: &str) {
        let path = normalize_path(path);
        let expanded = self.open_folders.get(&path).copied().unwrap_or(false);
        self.open_folders.insert(path, !expanded);
    }

    pub fn is_open(&self, path: &str) -> bool {
        self.open_folders
            .get(&normalize_path(path))
            .copied()
            .unwrap_or(false)
    }

    pub fn open_folders(&self) -> impl Iterator<Item = (&str, bool)> {
        self.open_folders.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// True when `candidate` clashes with `key`: same path, `key` lives
/// under `candidate/` (candidate would shadow a folder), or `candidate`
/// lives under `key/` (key would become both leaf and folder).
fn conflicts(candidate: &str, key: &str) -> bool {
    candidate == key
        || key
            .strip_prefix(candidate)
            .is_some_and(|rest| rest.starts_with('/'))
        || candidate
            .strip_prefix(key)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn is_available(candidate: &str, taken: &[String]) -> bool {
    taken.iter().all(|key| !conflicts(candidate, key))
}

/// First free path in `candidate, base-copy1.ext, base-copy2.ext, ...`.
///
/// Suffixing only rewrites the last segment, so `taken` must not hold
/// an ancestor of `candidate`; callers clear those out first.
fn ensure_unique(candidate: &str, taken: &[String]) -> String {
    if is_available(candidate, taken) {
        return candidate.to_string();
    }
    let (base, ext) = split_extension(candidate);
    let mut i = 1;
    loop {
        let next = format!("{base}-copy{i}{ext}");
        if is_available(&next, taken) {
            return next;
        }
        i += 1;
    }
}

/// Re-key a leaf in `next` that `path` nests under, so the incoming
/// descendant keeps its own name and the leaf takes the suffix, same
/// as when the leaf arrives second. At most one such leaf can exist:
/// `next` never holds a key that is a prefix of another.
fn displace_ancestor_leaf(next: &mut FileMap, taken: &mut Vec<String>, path: &str) {
    let Some(at) = taken.iter().position(|key| {
        path.strip_prefix(key.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }) else {
        return;
    };

    let old = taken.remove(at);
    let mut blocked = taken.clone();
    blocked.push(path.to_string());
    let fresh = ensure_unique(&old, &blocked);

    if let Some(content) = next.shift_remove(&old) {
        next.insert(fresh.clone(), content);
    }
    taken.push(fresh);
}

/// Suffix a folder's new root until no moved path collides with or
/// lands under a stay-put leaf. Merging into an existing folder is
/// allowed, so keys living under the root do not block it.
fn clear_folder_root(root: &str, rests: &[String], outside: &[String]) -> String {
    let root_is_clear = |candidate: &str| {
        let under_leaf = |path: &str| {
            outside.iter().any(|k| {
                path.strip_prefix(k.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
            })
        };
        if outside.iter().any(|k| k == candidate) || under_leaf(candidate) {
            return false;
        }
        rests
            .iter()
            .all(|rest| !under_leaf(&format!("{candidate}/{rest}")))
    };

    if root_is_clear(root) {
        return root.to_string();
    }
    let (base, ext) = split_extension(root);
    let mut i = 1;
    loop {
        let next = format!("{base}-copy{i}{ext}");
        if root_is_clear(&next) {
            return next;
        }
        i += 1;
    }
}

/// Split at the extension dot of the last path segment.
fn split_extension(path: &str) -> (&str, &str) {
    let segment_start = path.rfind('/').map_or(0, |p| p + 1);
    match path[segment_start..].rfind('.') {
        Some(dot) => path.split_at(segment_start + dot),
        None => (path, ""),
    }
}

fn replace_last_segment(path: &str, new_name: &str) -> String {
    match path.rfind('/') {
        Some(slash) => format!("{}/{new_name}", &path[..slash]),
        None => new_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> FileMap {
        entries
            .iter()
            .map(|(path, text)| ((*path).to_string(), FileContent::coded(*text)))
            .collect()
    }

    fn keys(ws: &Workspace) -> Vec<&str> {
        ws.files().keys().map(String::as_str).collect()
    }

    #[test]
    fn test_seeded_workspace_selects_placeholder() {
        let ws = Workspace::seeded("index.js", "// Write your code here...");
        assert_eq!(keys(&ws), vec!["/index.js"]);
        assert_eq!(ws.selected(), Some("/index.js"));
        assert_eq!(ws.content("/index.js").map(FileContent::text), Some("// Write your code here..."));
        assert_eq!(ws.phase(), Phase::Loaded);
    }

    #[test]
    fn test_replace_all_normalizes_and_resets_selection() {
        let mut ws = Workspace::seeded("index.js", "seed");
        ws.replace_all(map(&[("src/app.js", "a"), ("/src/lib.js", "b")]));

        assert_eq!(keys(&ws), vec!["/src/app.js", "/src/lib.js"]);
        assert_eq!(ws.selected(), Some("/src/app.js"));
        assert!(ws.is_dirty());
    }

    #[test]
    fn test_replace_all_keeps_surviving_selection() {
        let mut ws = Workspace::load(map(&[("/a.js", "1"), ("/b.js", "2")]), Some("/b.js".into()));
        ws.replace_all(map(&[("/b.js", "2'"), ("/c.js", "3")]));
        assert_eq!(ws.selected(), Some("/b.js"));
    }

    #[test]
    fn test_replace_all_exact_duplicate_last_write_wins() {
        let mut ws = Workspace::new();
        ws.replace_all(map(&[("a.js", "first"), ("/a.js", "second")]));

        assert_eq!(keys(&ws), vec!["/a.js"]);
        assert_eq!(ws.content("/a.js").map(FileContent::text), Some("second"));
    }

    #[test]
    fn test_replace_all_suffixes_leaf_folder_clash() {
        let mut ws = Workspace::new();
        ws.replace_all(map(&[("/src/a.js", "a"), ("/src", "oops")]));

        assert_eq!(keys(&ws), vec!["/src/a.js", "/src-copy1"]);
    }

    #[test]
    fn test_replace_all_suffixes_leaf_arriving_before_descendant() {
        let mut ws = Workspace::new();
        ws.replace_all(map(&[("/src", "oops"), ("/src/a.js", "a")]));

        assert_eq!(keys(&ws), vec!["/src-copy1", "/src/a.js"]);
        assert_eq!(ws.content("/src-copy1").map(FileContent::text), Some("oops"));
        assert_eq!(ws.content("/src/a.js").map(FileContent::text), Some("a"));
    }

    #[test]
    fn test_replace_all_suffixes_every_enclosing_leaf() {
        let mut ws = Workspace::new();
        ws.replace_all(map(&[("/src", "1"), ("/src/a", "2"), ("/src/a/b.js", "3")]));

        assert_eq!(keys(&ws), vec!["/src-copy1", "/src/a-copy1", "/src/a/b.js"]);
    }

    #[test]
    fn test_add_file_numbers_from_map_size() {
        let mut ws = Workspace::seeded("index.js", "seed");
        let first = ws.add_file("// New file");
        let second = ws.add_file("// New file");

        assert_eq!(first, "/file2.js");
        assert_eq!(second, "/file3.js");
        assert_eq!(ws.selected(), Some("/file3.js"));
        assert_eq!(ws.content(&first).map(FileContent::text), Some("// New file"));
    }

    #[test]
    fn test_add_file_suffixes_taken_name() {
        let mut ws = Workspace::new();
        ws.replace_all(map(&[("/file2.js", "x")]));
        let added = ws.add_file("// New file");
        assert_eq!(added, "/file2-copy1.js");
    }

    #[test]
    fn test_edit_content_preserves_shape() {
        let mut ws = Workspace::new();
        let mut files = FileMap::new();
        files.insert("/plain.js".to_string(), FileContent::plain("old"));
        files.insert("/coded.js".to_string(), FileContent::coded("old"));
        ws.replace_all(files);

        assert!(ws.edit_content("/plain.js", "new"));
        assert!(ws.edit_content("coded.js", "new"));
        assert_eq!(ws.content("/plain.js"), Some(&FileContent::plain("new")));
        assert_eq!(ws.content("/coded.js"), Some(&FileContent::coded("new")));
    }

    #[test]
    fn test_edit_unknown_path_is_noop() {
        let mut ws = Workspace::seeded("index.js", "seed");
        assert!(!ws.edit_content("/ghost.js", "boo"));
        assert_eq!(ws.phase(), Phase::Loaded);
    }

    #[test]
    fn test_rename_leaf_moves_entry_to_end() {
        let mut ws = Workspace::new();
        ws.replace_all(map(&[("/a.js", "a"), ("/b.js", "b")]));
        let moves = ws.rename("/a.js", "main.js");

        assert_eq!(moves, vec![("/a.js".to_string(), "/main.js".to_string())]);
        assert_eq!(keys(&ws), vec!["/b.js", "/main.js"]);
    }

    #[test]
    fn test_rename_collision_gets_copy_suffix() {
        let mut ws = Workspace::load(map(&[("/a.js", "a"), ("/b.js", "b")]), Some("/a.js".into()));
        let moves = ws.rename("/a.js", "b.js");

        assert_eq!(moves, vec![("/a.js".to_string(), "/b-copy1.js".to_string())]);
        assert_eq!(ws.selected(), Some("/b-copy1.js"));
    }

    #[test]
    fn test_rename_to_same_name_is_noop() {
        let mut ws = Workspace::new();
        ws.replace_all(map(&[("/a.js", "a")]));
        assert!(ws.rename("/a.js", "a.js").is_empty());
        assert_eq!(keys(&ws), vec!["/a.js"]);
    }

    #[test]
    fn test_rename_empty_name_cancelled() {
        let mut ws = Workspace::new();
        ws.replace_all(map(&[("/a.js", "a")]));
        assert!(ws.rename("/a.js", "   ").is_empty());
    }

    #[test]
    fn test_rename_slashed_name_cancelled() {
        let mut ws = Workspace::new();
        ws.replace_all(map(&[("/a.js", "a"), ("/b", "b")]));
        assert!(ws.rename("/a.js", "b/c.js").is_empty());
        assert_eq!(keys(&ws), vec!["/a.js", "/b"]);
    }

    #[test]
    fn test_rename_unknown_path_is_noop() {
        let mut ws = Workspace::new();
        ws.replace_all(map(&[("/a.js", "a")]));
        assert!(ws.rename("/ghost.js", "b.js").is_empty());
        assert_eq!(keys(&ws), vec!["/a.js"]);
    }

    #[test]
    fn test_rename_folder_rewrites_descendants() {
        let mut ws = Workspace::load(
            map(&[("/src/a.js", "a"), ("/src/sub/b.js", "b"), ("/readme.md", "r")]),
            Some("/src/sub/b.js".into()),
        );
        ws.toggle_folder("/src");
        ws.toggle_folder("/src/sub");

        let moves = ws.rename("/src", "lib");

        assert_eq!(
            moves,
            vec![
                ("/src/a.js".to_string(), "/lib/a.js".to_string()),
                ("/src/sub/b.js".to_string(), "/lib/sub/b.js".to_string()),
            ]
        );
        assert_eq!(keys(&ws), vec!["/readme.md", "/lib/a.js", "/lib/sub/b.js"]);
        assert_eq!(ws.selected(), Some("/lib/sub/b.js"));
        assert!(ws.is_open("/lib"));
        assert!(ws.is_open("/lib/sub"));
        assert!(!ws.is_open("/src"));
    }

    #[test]
    fn test_rename_nested_folder_keeps_parent_path() {
        let mut ws = Workspace::new();
        ws.replace_all(map(&[("/src/sub/a.js", "a")]));
        let moves = ws.rename("/src/sub", "inner");

        assert_eq!(
            moves,
            vec![("/src/sub/a.js".to_string(), "/src/inner/a.js".to_string())]
        );
    }

    #[test]
    fn test_rename_folder_merge_suffixes_exact_clash() {
        let mut ws = Workspace::new();
        ws.replace_all(map(&[("/src/a.js", "new"), ("/lib/a.js", "old"), ("/lib/z.js", "z")]));
        let moves = ws.rename("/src", "lib");

        assert_eq!(
            moves,
            vec![("/src/a.js".to_string(), "/lib/a-copy1.js".to_string())]
        );
        assert_eq!(ws.content("/lib/a.js").map(FileContent::text), Some("old"));
    }

    #[test]
    fn test_rename_folder_onto_leaf_suffixes_root() {
        let mut ws = Workspace::new();
        ws.replace_all(map(&[("/src/a.js", "a"), ("/lib", "leaf")]));
        let moves = ws.rename("/src", "lib");

        assert_eq!(
            moves,
            vec![("/src/a.js".to_string(), "/lib-copy1/a.js".to_string())]
        );
        assert!(ws.contains("/lib"));
    }

    #[test]
    fn test_delete_leaf_moves_selection_to_first_remaining() {
        let mut ws = Workspace::load(map(&[("/a.js", "a"), ("/b.js", "b")]), Some("/a.js".into()));
        assert_eq!(ws.delete("/a.js"), 1);
        assert_eq!(ws.selected(), Some("/b.js"));
    }

    #[test]
    fn test_delete_folder_cascades() {
        let mut ws = Workspace::load(
            map(&[("/src/a.js", "a"), ("/src/sub/b.js", "b"), ("/keep.md", "k")]),
            Some("/src/a.js".into()),
        );
        ws.toggle_folder("/src");
        ws.toggle_folder("/src/sub");

        assert_eq!(ws.delete("/src"), 2);
        assert_eq!(keys(&ws), vec!["/keep.md"]);
        assert_eq!(ws.selected(), Some("/keep.md"));
        assert_eq!(ws.open_folders().count(), 0);
    }

    #[test]
    fn test_delete_everything_clears_selection() {
        let mut ws = Workspace::load(map(&[("/only.js", "x")]), Some("/only.js".into()));
        assert_eq!(ws.delete("/only.js"), 1);
        assert!(ws.is_empty());
        assert_eq!(ws.selected(), None);
    }

    #[test]
    fn test_delete_unknown_or_empty_path_is_noop() {
        let mut ws = Workspace::new();
        ws.replace_all(map(&[("/a.js", "a")]));
        assert_eq!(ws.delete("/ghost.js"), 0);
        assert_eq!(ws.delete("   "), 0);
        assert_eq!(ws.len(), 1);
    }

    #[test]
    fn test_delete_does_not_cross_sibling_prefix() {
        // "/src-util" shares a string prefix with "/src" but not a path one
        let mut ws = Workspace::new();
        ws.replace_all(map(&[("/src/a.js", "a"), ("/src-util/b.js", "b")]));
        assert_eq!(ws.delete("/src"), 1);
        assert_eq!(keys(&ws), vec!["/src-util/b.js"]);
    }

    #[test]
    fn test_mark_saved_transitions() {
        let mut ws = Workspace::seeded("index.js", "seed");
        ws.mark_saved();
        assert_eq!(ws.phase(), Phase::Loaded);

        ws.add_file("// New file");
        assert_eq!(ws.phase(), Phase::Mutated);
        ws.mark_saved();
        assert_eq!(ws.phase(), Phase::Saved);
    }

    #[test]
    fn test_split_extension_last_segment_only() {
        assert_eq!(split_extension("/a.js"), ("/a", ".js"));
        assert_eq!(split_extension("/src.v2/readme"), ("/src.v2/readme", ""));
        assert_eq!(split_extension("/src/archive.tar.gz"), ("/src/archive.tar", ".gz"));
        assert_eq!(split_extension("/x/.gitignore"), ("/x/", ".gitignore"));
    }

    #[test]
    fn test_ensure_unique_increments_until_free() {
        let taken = vec!["/a.js".to_string(), "/a-copy1.js".to_string()];
        assert_eq!(ensure_unique("/a.js", &taken), "/a-copy2.js");
        assert_eq!(ensure_unique("/fresh.js", &taken), "/fresh.js");
    }

    #[test]
    fn test_content_shapes_serialize_as_persisted() {
        let plain = serde_json::to_string(&FileContent::plain("x")).unwrap();
        let coded = serde_json::to_string(&FileContent::coded("x")).unwrap();
        assert_eq!(plain, r#""x""#);
        assert_eq!(coded, r#"{"code":"x"}"#);

        let back: FileContent = serde_json::from_str(&coded).unwrap();
        assert_eq!(back, FileContent::coded("x"));
    }
}
