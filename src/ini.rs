//! Ordered, case-preserving INI document
//!
//! All persistent configuration (main settings, output profiles, pose/scale
//! data, the pose ID map, key bindings) is stored as INI. Sections and keys
//! keep their insertion order and their case so that a load/save cycle does
//! not reshuffle a file the user also edits by hand.

use std::fmt;

use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

/// An INI file held in memory: ordered sections of ordered key/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<Section>,
}

impl IniDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse INI text. Tolerates a UTF-8 BOM, `;`/`#` comments and blank
    /// lines. A duplicate key within a section overwrites the earlier value;
    /// content before the first section header is skipped with a warning.
    pub fn parse(input: &str) -> Self {
        let mut doc = Self::new();
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);

        let mut current: Option<usize> = None;
        for (line_no, raw) in input.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                current = Some(doc.ensure_section(name.trim()));
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                warn!(line = line_no + 1, content = %line, "Skipping malformed INI line");
                continue;
            };
            match current {
                Some(idx) => {
                    let key = key.trim().to_string();
                    let value = value.trim().to_string();
                    set_entry(&mut doc.sections[idx].entries, &key, value);
                }
                None => {
                    warn!(line = line_no + 1, "Skipping key before first section header");
                }
            }
        }
        doc
    }

    fn ensure_section(&mut self, name: &str) -> usize {
        if let Some(idx) = self.section_index(name) {
            return idx;
        }
        self.sections.push(Section {
            name: name.to_string(),
            entries: Vec::new(),
        });
        self.sections.len() - 1
    }

    fn section_index(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name == name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section_index(name).is_some()
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    /// Create the section if it does not exist yet.
    pub fn add_section(&mut self, name: &str) {
        self.ensure_section(name);
    }

    pub fn remove_section(&mut self, name: &str) -> bool {
        match self.section_index(name) {
            Some(idx) => {
                self.sections.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Rename a section in place, keeping its position and entries.
    /// Fails when the target name is already taken.
    pub fn rename_section(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        if self.has_section(to) {
            return false;
        }
        match self.section_index(from) {
            Some(idx) => {
                self.sections[idx].name = to.to_string();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let idx = self.section_index(section)?;
        self.sections[idx]
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a key, creating the section on demand. An existing key is updated
    /// in place so its position in the file is stable.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        let idx = self.ensure_section(section);
        set_entry(&mut self.sections[idx].entries, key, value.into());
    }

    pub fn remove(&mut self, section: &str, key: &str) -> bool {
        let Some(idx) = self.section_index(section) else {
            return false;
        };
        let entries = &mut self.sections[idx].entries;
        match entries.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Ordered key/value pairs of a section; empty iterator when absent.
    pub fn entries(&self, section: &str) -> impl Iterator<Item = (&str, &str)> {
        self.section_index(section)
            .map(|idx| self.sections[idx].entries.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get_bool(&self, section: &str, key: &str, fallback: bool) -> bool {
        self.get(section, key)
            .and_then(parse_bool)
            .unwrap_or(fallback)
    }

    pub fn get_parsed<T: std::str::FromStr>(&self, section: &str, key: &str) -> Option<T> {
        self.get(section, key)?.trim().parse().ok()
    }

    pub fn set_bool(&mut self, section: &str, key: &str, value: bool) {
        self.set(section, key, bool_str(value));
    }
}

impl fmt::Display for IniDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{}]", section.name)?;
            for (key, value) in &section.entries {
                writeln!(f, "{key} = {value}")?;
            }
        }
        Ok(())
    }
}

fn set_entry(entries: &mut Vec<(String, String)>, key: &str, value: String) {
    match entries.iter_mut().find(|(k, _)| k == key) {
        Some((_, v)) => *v = value,
        None => entries.push((key.to_string(), value)),
    }
}

/// `True`/`False` is what the config files historically contain; accept the
/// usual variants when reading.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn bool_str(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_and_keys() {
        let doc = IniDocument::parse("[General]\nName = Miku\nScale=1.0\n\n[Other]\nKey = v\n");
        assert_eq!(doc.get("General", "Name"), Some("Miku"));
        assert_eq!(doc.get("General", "Scale"), Some("1.0"));
        assert_eq!(doc.get("Other", "Key"), Some("v"));
        assert_eq!(doc.section_names().collect::<Vec<_>>(), vec!["General", "Other"]);
    }

    #[test]
    fn test_parse_strips_bom_and_comments() {
        let doc = IniDocument::parse("\u{feff}; comment\n# also comment\n[S]\nk = v\n");
        assert_eq!(doc.get("S", "k"), Some("v"));
        assert_eq!(doc.section_names().count(), 1);
    }

    #[test]
    fn test_duplicate_key_overwrites() {
        let doc = IniDocument::parse("[S]\nk = first\nk = second\n");
        assert_eq!(doc.get("S", "k"), Some("second"));
        assert_eq!(doc.entries("S").count(), 1);
    }

    #[test]
    fn test_key_case_preserved() {
        let mut doc = IniDocument::new();
        doc.set("GeneralSettings", "FarcPackPath", "C:/tools/farcpack.exe");
        let rendered = doc.to_string();
        assert!(rendered.contains("FarcPackPath = C:/tools/farcpack.exe"));
        let reparsed = IniDocument::parse(&rendered);
        assert_eq!(reparsed.get("GeneralSettings", "FarcPackPath"), Some("C:/tools/farcpack.exe"));
        assert_eq!(reparsed.get("GeneralSettings", "farcpackpath"), None);
    }

    #[test]
    fn test_roundtrip_preserves_order() {
        let source = "[B]\nz = 1\na = 2\n\n[A]\nk = v\n";
        let doc = IniDocument::parse(source);
        assert_eq!(doc.to_string(), source);
    }

    #[test]
    fn test_set_updates_in_place() {
        let mut doc = IniDocument::parse("[S]\nfirst = 1\nsecond = 2\n");
        doc.set("S", "first", "changed");
        let keys: Vec<_> = doc.entries("S").map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["first", "second"]);
        assert_eq!(doc.get("S", "first"), Some("changed"));
    }

    #[test]
    fn test_rename_section_refuses_clobber() {
        let mut doc = IniDocument::parse("[A]\nk = 1\n\n[B]\nk = 2\n");
        assert!(!doc.rename_section("A", "B"));
        assert!(doc.rename_section("A", "C"));
        assert_eq!(doc.get("C", "k"), Some("1"));
        assert_eq!(doc.section_names().collect::<Vec<_>>(), vec!["C", "B"]);
    }

    #[test]
    fn test_bool_parsing() {
        let doc = IniDocument::parse("[S]\na = True\nb = false\nc = 1\nd = junk\n");
        assert!(doc.get_bool("S", "a", false));
        assert!(!doc.get_bool("S", "b", true));
        assert!(doc.get_bool("S", "c", false));
        assert!(doc.get_bool("S", "d", true));
        assert!(!doc.get_bool("S", "missing", false));
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let doc = IniDocument::parse("orphan = 1\n[S]\nno equals sign\nk = v\n");
        assert_eq!(doc.get("S", "k"), Some("v"));
        assert_eq!(doc.entries("S").count(), 1);
    }
}
