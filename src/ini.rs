//! Section/key/value documents in the syntax of Subversion's `servers` and
//! `config` files.
//!
//! Values are kept raw (no escape processing) and both sections and keys keep
//! their declared order, which matters for `[groups]` matching.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ConfigDiagnostic, DiagnosticKind, Loaded};
use crate::persist::write_atomic;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// One `[name]` section.
pub struct IniSection {
    name: String,
    entries: Vec<(String, String)>,
}

impl IniSection {
    /// Creates an empty section.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// The section name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether `key` is present (possibly with an empty value).
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Sets `key`, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Entries in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies every entry of `other` whose key is absent here and accepted by
    /// `filter`. Existing values are never overwritten.
    pub fn merge_missing_from(&mut self, other: &IniSection, filter: impl Fn(&str) -> bool) {
        for (key, value) in other.iter() {
            if filter(key) && !self.contains_key(key) {
                self.entries.push((key.to_string(), value.to_string()));
            }
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// An ordered collection of [`IniSection`]s.
pub struct IniDocument {
    sections: Vec<IniSection>,
}

impl IniDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `input`.
    ///
    /// Parsing never fails: lines that are neither a section header, a
    /// comment, a continuation nor a `key = value` pair are skipped.
    pub fn parse_str(input: &str) -> Self {
        let mut doc = Self::new();
        let mut current: Option<usize> = None;
        let mut last_key: Option<String> = None;

        for raw in input.lines() {
            let line = raw.trim_end_matches('\r');
            let trimmed = line.trim();
            // comments only start in the first column; indented lines continue a value
            if trimmed.is_empty() || line.starts_with(['#', ';']) {
                continue;
            }

            if line.starts_with([' ', '\t']) {
                if let (Some(idx), Some(key)) = (current, last_key.as_deref()) {
                    let section = &mut doc.sections[idx];
                    let joined = match section.get(key) {
                        Some(prev) if !prev.is_empty() => format!("{prev} {trimmed}"),
                        _ => trimmed.to_string(),
                    };
                    section.set(key, joined);
                }
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix('[')
                && let Some(name) = rest.strip_suffix(']')
            {
                let name = name.trim();
                current = Some(doc.section_index_or_insert(name));
                last_key = None;
                continue;
            }

            let Some(split) = trimmed.find(['=', ':']) else {
                continue;
            };
            let key = trimmed[..split].trim();
            if key.is_empty() {
                continue;
            }
            let value = trimmed[split + 1..].trim();
            let idx = *current.get_or_insert_with(|| doc.section_index_or_insert(""));
            doc.sections[idx].set(key, value);
            last_key = Some(key.to_string());
        }

        doc.sections.retain(|s| !(s.name.is_empty() && s.is_empty()));
        doc
    }

    /// Loads `path`.
    ///
    /// A missing file is an empty document. Any other failure is logged and
    /// also yields an empty document, with the failure kept as a diagnostic.
    pub fn load(path: &Path) -> Loaded<Self> {
        match std::fs::read(path) {
            Ok(bytes) => {
                let doc = Self::parse_str(&String::from_utf8_lossy(&bytes));
                debug!(path = %path.display(), sections = doc.sections.len(), "loaded ini file");
                Loaded::ok(doc)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Loaded::ok(Self::new()),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read ini file; using empty document");
                Loaded::degraded(
                    Self::new(),
                    ConfigDiagnostic::new(path, DiagnosticKind::Load, err),
                )
            }
        }
    }

    /// Writes the document to `path` atomically, creating parent directories.
    pub fn store(&self, path: &Path) -> std::io::Result<()> {
        write_atomic(path, self.to_string().as_bytes())
    }

    /// Returns the section `name`.
    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Returns the section `name` mutably.
    pub fn section_mut(&mut self, name: &str) -> Option<&mut IniSection> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    /// Returns the section `name`, appending an empty one if missing.
    pub fn section_or_insert(&mut self, name: &str) -> &mut IniSection {
        let idx = self.section_index_or_insert(name);
        &mut self.sections[idx]
    }

    /// Shorthand for looking up `key` in section `section`.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key)
    }

    /// Shorthand for setting `key` in section `section`.
    pub fn set(&mut self, section: &str, key: impl Into<String>, value: impl Into<String>) {
        self.section_or_insert(section).set(key, value);
    }

    /// Sections in declared order.
    pub fn sections(&self) -> impl Iterator<Item = &IniSection> {
        self.sections.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Copies every section and key of `other` that is absent here.
    ///
    /// Values already present in `self` always win.
    pub fn merge_missing_from(&mut self, other: &IniDocument) {
        for section in &other.sections {
            self.section_or_insert(&section.name)
                .merge_missing_from(section, |_| true);
        }
    }

    fn section_index_or_insert(&mut self, name: &str) -> usize {
        if let Some(idx) = self.sections.iter().position(|s| s.name == name) {
            return idx;
        }
        self.sections.push(IniSection::new(name));
        self.sections.len() - 1
    }
}

impl std::fmt::Display for IniDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for section in &self.sections {
            if !first {
                writeln!(f)?;
            }
            first = false;
            writeln!(f, "[{}]", section.name)?;
            for (key, value) in section.iter() {
                if value.is_empty() {
                    writeln!(f, "{key} =")?;
                } else {
                    writeln!(f, "{key} = {value}")?;
                }
            }
        }
        Ok(())
    }
}
