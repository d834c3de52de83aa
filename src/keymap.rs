//! Keyboard shortcut bindings
//!
//! Shortcuts live in `KeyMap.ini` under a `[Shortcuts]` section, one chord
//! per action (`Ctrl+Shift+Z` style). Loading fills in missing actions with
//! their defaults and migrates the legacy `SaveGeneralSettings` action name,
//! rewriting the file when anything changed. Chords that fail to parse are
//! logged and left unbound rather than dropped from the file.

use anyhow::Result;
use egui::{Key, KeyboardShortcut, Modifiers};
use tracing::{error, info};

use crate::constants::sections;
use crate::ini::IniDocument;
use crate::store::ConfigStore;

/// Legacy action name replaced by `SaveCurrentTab`.
const LEGACY_SAVE_ACTION: &str = "SaveGeneralSettings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SaveCurrentTab,
    SaveAndExit,
    ExitNoSave,
    RestartNoSave,
    SaveAndRestart,
    Undo,
    Redo,
    ToggleDebugSettings,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::SaveCurrentTab,
        Action::SaveAndExit,
        Action::ExitNoSave,
        Action::RestartNoSave,
        Action::SaveAndRestart,
        Action::Undo,
        Action::Redo,
        Action::ToggleDebugSettings,
    ];

    /// Key name used in KeyMap.ini.
    pub fn key_name(self) -> &'static str {
        match self {
            Action::SaveCurrentTab => "SaveCurrentTab",
            Action::SaveAndExit => "SaveAndExit",
            Action::ExitNoSave => "ExitNoSave",
            Action::RestartNoSave => "RestartNoSave",
            Action::SaveAndRestart => "SaveAndRestart",
            Action::Undo => "Undo",
            Action::Redo => "Redo",
            Action::ToggleDebugSettings => "ToggleDebugSettings",
        }
    }

    /// Human label for the key map tab.
    pub fn label(self) -> &'static str {
        match self {
            Action::SaveCurrentTab => "Save current tab",
            Action::SaveAndExit => "Save and exit",
            Action::ExitNoSave => "Exit without saving",
            Action::RestartNoSave => "Restart without saving",
            Action::SaveAndRestart => "Save and restart",
            Action::Undo => "Undo",
            Action::Redo => "Redo",
            Action::ToggleDebugSettings => "Toggle debug settings",
        }
    }

    /// Modifier-heavy defaults so nothing collides with OS-level shortcuts.
    pub fn default_chord(self) -> &'static str {
        match self {
            Action::SaveCurrentTab => "Ctrl+S",
            Action::SaveAndExit => "Ctrl+Alt+F4",
            Action::ExitNoSave => "Alt+F4",
            Action::RestartNoSave => "Ctrl+R",
            Action::SaveAndRestart => "Ctrl+Shift+R",
            Action::Undo => "Ctrl+Shift+Z",
            Action::Redo => "Ctrl+Shift+Y",
            Action::ToggleDebugSettings => "Shift+F12",
        }
    }
}

/// Parse a `Mod+Mod+Key` chord. Modifiers are Ctrl/Alt/Shift in any order;
/// the final part must name an egui key (letters, digits, function keys).
pub fn parse_chord(chord: &str) -> Option<KeyboardShortcut> {
    let mut modifiers = Modifiers::default();
    let parts: Vec<&str> = chord.split('+').map(str::trim).collect();
    let (key_part, mod_parts) = parts.split_last()?;

    for part in mod_parts {
        match part.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => modifiers.ctrl = true,
            "alt" => modifiers.alt = true,
            "shift" => modifiers.shift = true,
            _ => return None,
        }
    }
    if key_part.is_empty() {
        return None;
    }
    // Key::from_name expects canonical casing ("A", "F12")
    let canonical = if key_part.len() == 1 {
        key_part.to_ascii_uppercase()
    } else {
        let mut chars = key_part.chars();
        let first = chars.next()?.to_ascii_uppercase();
        format!("{first}{}", chars.as_str().to_ascii_lowercase())
    };
    let key = Key::from_name(&canonical)?;
    Some(KeyboardShortcut::new(modifiers, key))
}

/// Format a shortcut back into the chord syntax KeyMap.ini uses.
pub fn format_chord(shortcut: &KeyboardShortcut) -> String {
    let mut parts = Vec::new();
    if shortcut.modifiers.ctrl || shortcut.modifiers.command {
        parts.push("Ctrl".to_string());
    }
    if shortcut.modifiers.alt {
        parts.push("Alt".to_string());
    }
    if shortcut.modifiers.shift {
        parts.push("Shift".to_string());
    }
    parts.push(shortcut.logical_key.name().to_string());
    parts.join("+")
}

pub struct KeyMap {
    /// Raw chords per action, in `Action::ALL` order (file order).
    chords: Vec<(Action, String)>,
}

impl KeyMap {
    /// Load KeyMap.ini, migrating legacy names and filling in defaults.
    pub fn load(store: &ConfigStore) -> Result<Self> {
        let path = store.key_map_path();
        let mut doc = store.load_document(&path)?;
        let mut changed = false;

        if !doc.has_section(sections::SHORTCUTS) {
            doc.add_section(sections::SHORTCUTS);
            changed = true;
        }

        if let Some(old_chord) = doc.get(sections::SHORTCUTS, LEGACY_SAVE_ACTION).map(str::to_string) {
            doc.set(sections::SHORTCUTS, Action::SaveCurrentTab.key_name(), old_chord);
            doc.remove(sections::SHORTCUTS, LEGACY_SAVE_ACTION);
            info!("Migrated legacy shortcut {LEGACY_SAVE_ACTION} to SaveCurrentTab");
            changed = true;
        }

        let mut chords = Vec::with_capacity(Action::ALL.len());
        for action in Action::ALL {
            let chord = match doc.get(sections::SHORTCUTS, action.key_name()) {
                Some(chord) => chord.to_string(),
                None => {
                    doc.set(sections::SHORTCUTS, action.key_name(), action.default_chord());
                    changed = true;
                    action.default_chord().to_string()
                }
            };
            if !chord.is_empty() && parse_chord(&chord).is_none() {
                error!(action = action.key_name(), chord = %chord, "Invalid key chord, leaving unbound");
            }
            chords.push((action, chord));
        }

        if changed {
            store.save_document(&path, &doc)?;
        }
        Ok(Self { chords })
    }

    pub fn chord(&self, action: Action) -> &str {
        self.chords
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, chord)| chord.as_str())
            .unwrap_or("")
    }

    pub fn shortcut(&self, action: Action) -> Option<KeyboardShortcut> {
        let chord = self.chord(action);
        if chord.is_empty() { None } else { parse_chord(chord) }
    }

    pub fn set_chord(&mut self, action: Action, chord: String) {
        if let Some(entry) = self.chords.iter_mut().find(|(a, _)| *a == action) {
            entry.1 = chord;
        }
    }

    pub fn save(&self, store: &ConfigStore) -> Result<()> {
        let path = store.key_map_path();
        let mut doc = store.load_document(&path)?;
        for (action, chord) in &self.chords {
            doc.set(sections::SHORTCUTS, action.key_name(), chord.clone());
        }
        store.save_document(&path, &doc)
    }

    /// Consume the shortcut for an action this frame, if bound and pressed.
    pub fn consume(&self, ctx: &egui::Context, action: Action) -> bool {
        match self.shortcut(action) {
            Some(shortcut) => ctx.input_mut(|input| input.consume_shortcut(&shortcut)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open_at(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_parse_chord_basic() {
        let shortcut = parse_chord("Ctrl+S").unwrap();
        assert!(shortcut.modifiers.ctrl);
        assert!(!shortcut.modifiers.shift);
        assert_eq!(shortcut.logical_key, Key::S);
    }

    #[test]
    fn test_parse_chord_multiple_modifiers() {
        let shortcut = parse_chord("ctrl+shift+z").unwrap();
        assert!(shortcut.modifiers.ctrl);
        assert!(shortcut.modifiers.shift);
        assert_eq!(shortcut.logical_key, Key::Z);
    }

    #[test]
    fn test_parse_chord_function_keys() {
        let shortcut = parse_chord("Shift+F12").unwrap();
        assert!(shortcut.modifiers.shift);
        assert_eq!(shortcut.logical_key, Key::F12);
    }

    #[test]
    fn test_parse_chord_rejects_garbage() {
        assert!(parse_chord("").is_none());
        assert!(parse_chord("Hyper+S").is_none());
        assert!(parse_chord("Ctrl+NotAKey").is_none());
        assert!(parse_chord("Ctrl+").is_none());
    }

    #[test]
    fn test_format_chord_roundtrip() {
        for chord in ["Ctrl+S", "Ctrl+Shift+Z", "Alt+F4", "Shift+F12"] {
            let shortcut = parse_chord(chord).unwrap();
            assert_eq!(format_chord(&shortcut), chord);
        }
    }

    #[test]
    fn test_load_creates_defaults() {
        let (_dir, store) = store();
        let keymap = KeyMap::load(&store).unwrap();
        assert_eq!(keymap.chord(Action::Undo), "Ctrl+Shift+Z");
        assert_eq!(keymap.chord(Action::SaveCurrentTab), "Ctrl+S");

        // The file was written out with every action present
        let doc = store.load_document(&store.key_map_path()).unwrap();
        for action in Action::ALL {
            assert!(doc.get(sections::SHORTCUTS, action.key_name()).is_some());
        }
    }

    #[test]
    fn test_load_migrates_legacy_name() {
        let (_dir, store) = store();
        let mut doc = IniDocument::new();
        doc.set(sections::SHORTCUTS, LEGACY_SAVE_ACTION, "Ctrl+Alt+S");
        store.save_document(&store.key_map_path(), &doc).unwrap();

        let keymap = KeyMap::load(&store).unwrap();
        assert_eq!(keymap.chord(Action::SaveCurrentTab), "Ctrl+Alt+S");

        let doc = store.load_document(&store.key_map_path()).unwrap();
        assert!(doc.get(sections::SHORTCUTS, LEGACY_SAVE_ACTION).is_none());
    }

    #[test]
    fn test_load_keeps_custom_chords() {
        let (_dir, store) = store();
        let mut doc = IniDocument::new();
        doc.set(sections::SHORTCUTS, "Undo", "Ctrl+U");
        store.save_document(&store.key_map_path(), &doc).unwrap();

        let keymap = KeyMap::load(&store).unwrap();
        assert_eq!(keymap.chord(Action::Undo), "Ctrl+U");
        // Missing actions filled in
        assert_eq!(keymap.chord(Action::Redo), "Ctrl+Shift+Y");
    }

    #[test]
    fn test_set_and_save() {
        let (_dir, store) = store();
        let mut keymap = KeyMap::load(&store).unwrap();
        keymap.set_chord(Action::Redo, "Ctrl+Y".to_string());
        keymap.save(&store).unwrap();

        let reloaded = KeyMap::load(&store).unwrap();
        assert_eq!(reloaded.chord(Action::Redo), "Ctrl+Y");
    }
}
