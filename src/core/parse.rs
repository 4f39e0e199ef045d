//! Delimited generator-output parsing.
//!
//! Generators emit multi-file project code as one text stream with
//! `<<<FILE /path/to/file>>>` marker lines between files. This module
//! splits that stream into a path -> content map, stripping optional
//! Markdown code fences around each section. Malformed input never
//! errors: a stream with no recognizable markers yields `NoFiles` and
//! the caller decides what to do with the raw text.

use regex::Regex;

use crate::core::workspace::{FileContent, FileMap, normalize_path};

/// Result of scanning one generator reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// At least one marker matched; keys are normalized paths.
    Files(FileMap),
    /// No marker lines found anywhere in the text.
    NoFiles,
}

impl ParseOutcome {
    pub fn files(&self) -> Option<&FileMap> {
        match self {
            ParseOutcome::Files(map) => Some(map),
            ParseOutcome::NoFiles => None,
        }
    }

    pub fn into_files(self) -> Option<FileMap> {
        match self {
            ParseOutcome::Files(map) => Some(map),
            ParseOutcome::NoFiles => None,
        }
    }
}

/// Splits generator replies on `<<<FILE path>>>` marker lines.
///
/// The marker must start its line; `<<<FILE` appearing mid-line is
/// ordinary content. Parsing is pure and deterministic, so one parser
/// can be shared across calls.
#[derive(Debug)]
pub struct DelimitedParser {
    marker_re: Regex,
}

impl Default for DelimitedParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DelimitedParser {
    pub fn new() -> Self {
        Self {
            // Whitespace is allowed between the keyword and the path and
            // after the closing bracket; the path itself is trimmed later.
            marker_re: Regex::new(r"^<<<FILE\s+(.+?)>>>\s*$").unwrap(),
        }
    }

    /// Scan `raw` into a path -> content map.
    ///
    /// A marker opens a section that extends to the next marker or to
    /// end-of-text. Section content is trimmed of leading/trailing blank
    /// lines, then an optional code-fence wrapper (with language tag) is
    /// removed. Duplicate paths keep the last occurrence.
    pub fn parse(&self, raw: &str) -> ParseOutcome {
        if raw.is_empty() {
            return ParseOutcome::NoFiles;
        }

        // Normalize CRLF and a possible BOM before line scanning
        let normalized = raw.replace('\r', "");
        let normalized = normalized.strip_prefix('\u{feff}').unwrap_or(&normalized);

        let mut files = FileMap::new();
        let mut current: Option<(String, Vec<&str>)> = None;

        for line in normalized.split('\n') {
            if let Some(caps) = self.marker_re.captures(line) {
                if let Some((path, lines)) = current.take() {
                    files.insert(path, FileContent::coded(clean_section(lines)));
                }
                let path = caps[1].trim();
                // A marker without a usable path opens no section
                current = (!path.is_empty()).then(|| (normalize_path(path), Vec::new()));
            } else if let Some((_, lines)) = current.as_mut() {
                lines.push(line);
            }
        }
        if let Some((path, lines)) = current.take() {
            files.insert(path, FileContent::coded(clean_section(lines)));
        }

        if files.is_empty() {
            ParseOutcome::NoFiles
        } else {
            ParseOutcome::Files(files)
        }
    }
}

/// Trim blank edge lines, then drop a fence line at either edge.
///
/// Only whole blank lines are trimmed; a line of spaces is content.
/// Opening and closing fences are stripped independently so truncated
/// replies that lost their closing fence still clean up. Fences that
/// appear between other content lines are left alone.
fn clean_section(mut lines: Vec<&str>) -> String {
    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    if lines.first().is_some_and(|l| is_opening_fence(l)) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| *l == "```") {
        lines.pop();
    }

    lines.join("\n")
}

/// A bare fence or a fence with a language tag, nothing else on the line.
fn is_opening_fence(line: &str) -> bool {
    line.strip_prefix("```")
        .is_some_and(|tag| tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
}
