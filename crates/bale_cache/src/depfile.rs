//! Make-style dependency files.
//!
//! A depfile lists the inputs of a build step in the format understood by
//! external build-graph tools:
//!
//! ```text
//! build/app.dill: lib/main.dart lib/src/with\ space.dart \
//!     lib/src/util.dart
//! ```
//!
//! Spaces inside paths are escaped as `\ ` and a trailing `\` continues the
//! rule on the next line. Lines that do not contain a `target: deps` rule are
//! ignored rather than rejected.

use std::path::{Path, PathBuf};

use crate::error::CacheError;

/// A parsed depfile: the outputs a rule produces and the inputs it reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Depfile {
    /// Rule targets (left of the colon).
    pub outputs: Vec<PathBuf>,
    /// Rule prerequisites (right of the colon), in first-seen order without
    /// duplicates.
    pub inputs: Vec<PathBuf>,
}

impl Depfile {
    /// Creates a depfile with a single rule.
    pub fn new(outputs: Vec<PathBuf>, inputs: Vec<PathBuf>) -> Self {
        let mut depfile = Self {
            outputs: Vec::new(),
            inputs: Vec::new(),
        };
        depfile.push_rule(outputs, inputs);
        depfile
    }

    /// Parses depfile text. Malformed lines are skipped.
    pub fn parse(content: &str) -> Self {
        let mut depfile = Self::default();
        for line in logical_lines(content) {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((targets, deps)) = split_rule(trimmed) else {
                continue;
            };
            depfile.push_rule(split_escaped(targets), split_escaped(deps));
        }
        depfile
    }

    /// Reads and parses the depfile at `path`.
    pub fn read(path: &Path) -> Result<Self, CacheError> {
        let content = std::fs::read_to_string(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::parse(&content))
    }

    /// Renders this depfile as a single newline-terminated rule.
    pub fn render(&self) -> String {
        format!(
            "{}: {}\n",
            join_escaped(&self.outputs),
            join_escaped(&self.inputs)
        )
    }

    /// Writes this depfile to `path`, creating parent directories as needed.
    pub fn write(&self, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(path, self.render()).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn push_rule(&mut self, outputs: Vec<PathBuf>, inputs: Vec<PathBuf>) {
        for output in outputs {
            if !self.outputs.contains(&output) {
                self.outputs.push(output);
            }
        }
        for input in inputs {
            if !self.inputs.contains(&input) {
                self.inputs.push(input);
            }
        }
    }
}

/// Joins backslash-continued physical lines into logical lines.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for raw in content.lines() {
        match raw.strip_suffix('\\') {
            Some(head) => {
                current.push_str(head);
                current.push(' ');
            }
            None => {
                current.push_str(raw);
                lines.push(std::mem::take(&mut current));
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Splits a rule at the first `:` that is followed by whitespace or the end of
/// the line, so that drive letters such as `C:\` stay inside a path.
fn split_rule(line: &str) -> Option<(&str, &str)> {
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b':' && bytes.get(i + 1).map_or(true, |next| next.is_ascii_whitespace()) {
            return Some((&line[..i], &line[i + 1..]));
        }
    }
    None
}

fn split_escaped(s: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&' ') => {
                current.push(' ');
                chars.next();
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    paths.push(PathBuf::from(std::mem::take(&mut current)));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        paths.push(PathBuf::from(current));
    }
    paths
}

fn join_escaped(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.to_string_lossy().replace(' ', "\\ "))
        .collect::<Vec<_>>()
        .join(" ")
}
