//! Typed view over the main config document
//!
//! `AppSettings` is the editing copy the GUI binds its widgets to; it is
//! loaded from the `Config.ini` document and written back on save. Writing
//! goes through `apply` so keys the tool does not know about survive a
//! round-trip untouched. Out-of-range values are clamped on load.

use tracing::warn;

use crate::constants::{defaults, sections, validation};
use crate::ini::IniDocument;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneralSettings {
    pub farc_pack_path: String,
    pub save_in_parent: bool,
    pub default_pose_file_name: String,
    pub use_module_name_contains: bool,
    pub overwrite_existing: bool,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DebugSettings {
    pub show_debug: bool,
    pub output_log: bool,
    pub delete_temp: bool,
    pub history_limit: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub general: GeneralSettings,
    pub debug: DebugSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            general: GeneralSettings {
                farc_pack_path: String::new(),
                save_in_parent: false,
                default_pose_file_name: defaults::POSE_FILE_NAME.to_string(),
                use_module_name_contains: false,
                overwrite_existing: false,
                language: defaults::LANGUAGE.to_string(),
            },
            debug: DebugSettings {
                show_debug: false,
                output_log: false,
                delete_temp: true,
                history_limit: defaults::HISTORY_LIMIT,
            },
        }
    }
}

impl AppSettings {
    pub fn from_doc(doc: &IniDocument) -> Self {
        let fallback = Self::default();
        let mut settings = Self {
            general: GeneralSettings {
                farc_pack_path: doc
                    .get(sections::FARC_PACK, "FarcPackPath")
                    .unwrap_or_default()
                    .to_string(),
                save_in_parent: doc.get_bool(sections::GENERAL, "SaveInParentDirectory", false),
                default_pose_file_name: doc
                    .get(sections::GENERAL, "DefaultPoseFileName")
                    .filter(|name| !name.is_empty())
                    .unwrap_or(&fallback.general.default_pose_file_name)
                    .to_string(),
                use_module_name_contains: doc.get_bool(sections::GENERAL, "UseModuleNameContains", false),
                overwrite_existing: doc.get_bool(sections::GENERAL, "OverwriteExistingFiles", false),
                language: doc
                    .get(sections::GENERAL, "Language")
                    .filter(|lang| !lang.is_empty())
                    .unwrap_or(&fallback.general.language)
                    .to_string(),
            },
            debug: DebugSettings {
                show_debug: doc.get_bool(sections::DEBUG, "ShowDebugSettings", false),
                output_log: doc.get_bool(sections::DEBUG, "OutputLog", false),
                delete_temp: doc.get_bool(sections::DEBUG, "DeleteTemp", true),
                history_limit: doc
                    .get_parsed(sections::DEBUG, "HistoryLimit")
                    .unwrap_or(defaults::HISTORY_LIMIT),
            },
        };
        settings.validate_and_clamp();
        settings
    }

    /// Write the typed values back into the document, leaving unrelated
    /// sections and keys alone.
    pub fn apply(&self, doc: &mut IniDocument) {
        doc.set(sections::FARC_PACK, "FarcPackPath", self.general.farc_pack_path.clone());
        doc.set_bool(sections::GENERAL, "SaveInParentDirectory", self.general.save_in_parent);
        doc.set(sections::GENERAL, "DefaultPoseFileName", self.general.default_pose_file_name.clone());
        doc.set_bool(sections::GENERAL, "UseModuleNameContains", self.general.use_module_name_contains);
        doc.set_bool(sections::GENERAL, "OverwriteExistingFiles", self.general.overwrite_existing);
        doc.set(sections::GENERAL, "Language", self.general.language.clone());
        doc.set_bool(sections::DEBUG, "ShowDebugSettings", self.debug.show_debug);
        doc.set_bool(sections::DEBUG, "OutputLog", self.debug.output_log);
        doc.set_bool(sections::DEBUG, "DeleteTemp", self.debug.delete_temp);
        doc.set(sections::DEBUG, "HistoryLimit", self.debug.history_limit.to_string());
    }

    fn validate_and_clamp(&mut self) {
        if self.debug.history_limit < validation::MIN_HISTORY_LIMIT {
            warn!(history_limit = self.debug.history_limit, min = validation::MIN_HISTORY_LIMIT, "HistoryLimit below minimum, clamping");
            self.debug.history_limit = validation::MIN_HISTORY_LIMIT;
        } else if self.debug.history_limit > validation::MAX_HISTORY_LIMIT {
            warn!(history_limit = self.debug.history_limit, max = validation::MAX_HISTORY_LIMIT, "HistoryLimit exceeds maximum, clamping");
            self.debug.history_limit = validation::MAX_HISTORY_LIMIT;
        }
    }
}

/// Window size from the `WIDTHxHEIGHT` geometry key, clamped to sane bounds.
pub fn window_size(doc: &IniDocument) -> (f32, f32) {
    let geometry = doc
        .get(sections::GENERAL, "WindowGeometry")
        .unwrap_or(defaults::WINDOW_GEOMETRY);
    let parsed = parse_geometry(geometry).unwrap_or_else(|| {
        warn!(geometry = %geometry, "Invalid WindowGeometry, using default");
        parse_geometry(defaults::WINDOW_GEOMETRY).unwrap_or((1100.0, 800.0))
    });
    (
        parsed.0.clamp(validation::MIN_WINDOW_WIDTH, validation::MAX_WINDOW_DIMENSION),
        parsed.1.clamp(validation::MIN_WINDOW_HEIGHT, validation::MAX_WINDOW_DIMENSION),
    )
}

pub fn set_window_size(doc: &mut IniDocument, width: f32, height: f32) {
    doc.set(
        sections::GENERAL,
        "WindowGeometry",
        format!("{}x{}", width.round() as u32, height.round() as u32),
    );
}

fn parse_geometry(value: &str) -> Option<(f32, f32)> {
    let (w, h) = value.trim().split_once(['x', 'X'])?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(section: &str, key: &str, value: &str) -> IniDocument {
        let mut doc = IniDocument::new();
        doc.set(section, key, value);
        doc
    }

    #[test]
    fn test_defaults_from_empty_doc() {
        let settings = AppSettings::from_doc(&IniDocument::new());
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.debug.history_limit, 50);
        assert!(settings.debug.delete_temp);
    }

    #[test]
    fn test_history_limit_clamped() {
        let settings = AppSettings::from_doc(&doc_with(sections::DEBUG, "HistoryLimit", "0"));
        assert_eq!(settings.debug.history_limit, validation::MIN_HISTORY_LIMIT);

        let settings = AppSettings::from_doc(&doc_with(sections::DEBUG, "HistoryLimit", "99999"));
        assert_eq!(settings.debug.history_limit, validation::MAX_HISTORY_LIMIT);

        let settings = AppSettings::from_doc(&doc_with(sections::DEBUG, "HistoryLimit", "junk"));
        assert_eq!(settings.debug.history_limit, defaults::HISTORY_LIMIT);
    }

    #[test]
    fn test_apply_preserves_unknown_keys() {
        let mut doc = IniDocument::new();
        doc.set(sections::GENERAL, "SomeFutureKey", "kept");
        doc.set("CustomSection", "x", "y");

        let mut settings = AppSettings::from_doc(&doc);
        settings.general.default_pose_file_name = "renamed_tbl".to_string();
        settings.apply(&mut doc);

        assert_eq!(doc.get(sections::GENERAL, "SomeFutureKey"), Some("kept"));
        assert_eq!(doc.get("CustomSection", "x"), Some("y"));
        assert_eq!(doc.get(sections::GENERAL, "DefaultPoseFileName"), Some("renamed_tbl"));
    }

    #[test]
    fn test_window_size_parse_and_clamp() {
        assert_eq!(window_size(&doc_with(sections::GENERAL, "WindowGeometry", "1280x720")), (1280.0, 720.0));
        // Too small gets clamped up
        assert_eq!(window_size(&doc_with(sections::GENERAL, "WindowGeometry", "10x10")), (400.0, 300.0));
        // Garbage falls back to the default geometry
        assert_eq!(window_size(&doc_with(sections::GENERAL, "WindowGeometry", "wat")), (1100.0, 800.0));
        assert_eq!(window_size(&IniDocument::new()), (1100.0, 800.0));
    }

    #[test]
    fn test_set_window_size_rounds() {
        let mut doc = IniDocument::new();
        set_window_size(&mut doc, 1279.6, 719.4);
        assert_eq!(doc.get(sections::GENERAL, "WindowGeometry"), Some("1280x719"));
    }
}
