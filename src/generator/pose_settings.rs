//! Pose/scale settings and module resolution
//!
//! Settings come from every INI file in `Settings/PoseScaleData/`, one
//! `PoseScaleSetting_<suffix>` section per rule. A rule names the character
//! it applies to (in the short settings alias), an optional keyword filter
//! on the module name, the pose to assign and the scale factor.

use anyhow::Result;
use tracing::{debug, warn};

use crate::constants::sections;
use crate::generator::module_table::ModuleEntry;
use crate::store::ConfigStore;
use crate::text::is_match;

#[derive(Debug, Clone, PartialEq)]
pub struct PoseSetting {
    /// Section name, for diagnostics
    pub source: String,
    /// Character in the settings alias (e.g. `MIK`) or full name (`MIKU`)
    pub chara: String,
    /// Comma-separated module-name keywords; empty means chara-only matching
    pub contains: String,
    pub pose_id: Option<u32>,
    pub scale: f32,
}

/// Module chara name -> settings alias. Unknown names pass through so new
/// game characters still match settings that spell the name out.
pub fn chara_to_setting(chara: &str) -> &str {
    match chara {
        "MIKU" => "MIK",
        "RIN" => "RIN",
        "LEN" => "LEN",
        "LUKA" => "LUK",
        "NERU" => "NER",
        "HAKU" => "HAK",
        "KAITO" => "KAI",
        "MEIKO" => "MEI",
        "SAKINE" => "SAK",
        "TETO" => "TET",
        other => other,
    }
}

/// Module chara name -> scale table digit. Unknown names pass through.
pub fn chara_to_digit(chara: &str) -> &str {
    match chara {
        "MIKU" => "0",
        "RIN" => "1",
        "LEN" => "2",
        "LUKA" => "3",
        "NERU" => "4",
        "HAKU" => "5",
        "KAITO" => "6",
        "MEIKO" => "7",
        "SAKINE" => "8",
        "TETO" => "9",
        other => other,
    }
}

/// Load every setting from the pose data directory. A rule with an
/// unparseable scale or pose id is skipped with a warning, never guessed at.
pub fn load_settings(store: &ConfigStore) -> Result<Vec<PoseSetting>> {
    let mut settings = Vec::new();
    for path in store.list_pose_data_files()? {
        let doc = store.load_document(&path)?;
        for section in doc.section_names() {
            if !section.starts_with(sections::POSE_SETTING_PREFIX) {
                continue;
            }
            let chara = doc.get(section, "Chara").unwrap_or_default().trim().to_string();
            if chara.is_empty() {
                warn!(section = %section, "Skipping setting without Chara");
                continue;
            }

            let scale_raw = doc.get(section, "Scale").unwrap_or("1.0").trim();
            let Ok(scale) = scale_raw.parse::<f32>() else {
                warn!(section = %section, scale = %scale_raw, "Skipping setting with invalid Scale");
                continue;
            };

            let pose_raw = doc.get(section, "PoseID").unwrap_or_default().trim();
            let pose_id = if pose_raw.is_empty() {
                None
            } else {
                match pose_raw.parse::<u32>() {
                    Ok(id) => Some(id),
                    Err(_) => {
                        warn!(section = %section, pose_id = %pose_raw, "Skipping setting with invalid PoseID");
                        continue;
                    }
                }
            };

            settings.push(PoseSetting {
                source: section.to_string(),
                chara,
                contains: doc.get(section, "ModuleNameContains").unwrap_or_default().to_string(),
                pose_id,
                scale,
            });
        }
    }
    debug!(count = settings.len(), "Loaded pose/scale settings");
    Ok(settings)
}

/// First setting that applies to a module. Character must match through the
/// alias table; when keyword matching is enabled a setting with keywords must
/// also OR-match the module name (a setting without keywords applies to the
/// whole character).
pub fn resolve<'a>(
    module: &ModuleEntry,
    settings: &'a [PoseSetting],
    use_name_contains: bool,
) -> Option<&'a PoseSetting> {
    let alias = chara_to_setting(&module.chara);
    settings.iter().find(|setting| {
        if setting.chara != alias && setting.chara != module.chara {
            return false;
        }
        if use_name_contains && !setting.contains.trim().is_empty() {
            return is_match(&module.name, &setting.contains, "");
        }
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ini::IniDocument;

    fn module(id: u32, name: &str, chara: &str) -> ModuleEntry {
        ModuleEntry {
            id,
            name: name.to_string(),
            chara: chara.to_string(),
            cos: None,
        }
    }

    fn setting(chara: &str, contains: &str, pose_id: Option<u32>, scale: f32) -> PoseSetting {
        PoseSetting {
            source: format!("PoseScaleSetting_{chara}"),
            chara: chara.to_string(),
            contains: contains.to_string(),
            pose_id,
            scale,
        }
    }

    #[test]
    fn test_chara_aliases() {
        assert_eq!(chara_to_setting("MIKU"), "MIK");
        assert_eq!(chara_to_setting("TETO"), "TET");
        assert_eq!(chara_to_setting("SOMEONE_NEW"), "SOMEONE_NEW");
        assert_eq!(chara_to_digit("MIKU"), "0");
        assert_eq!(chara_to_digit("TETO"), "9");
        assert_eq!(chara_to_digit("SOMEONE_NEW"), "SOMEONE_NEW");
    }

    #[test]
    fn test_resolve_by_chara_alias() {
        let settings = vec![setting("MIK", "", Some(12), 1.05)];
        let found = resolve(&module(437, "Miku Classic", "MIKU"), &settings, false);
        assert_eq!(found.unwrap().pose_id, Some(12));
        assert!(resolve(&module(1, "Rin", "RIN"), &settings, false).is_none());
    }

    #[test]
    fn test_resolve_accepts_full_chara_name() {
        let settings = vec![setting("MIKU", "", Some(3), 1.0)];
        assert!(resolve(&module(437, "Miku Classic", "MIKU"), &settings, false).is_some());
    }

    #[test]
    fn test_resolve_with_name_keywords() {
        let settings = vec![
            setting("MIK", "Swimwear", Some(7), 0.98),
            setting("MIK", "", Some(12), 1.05),
        ];
        // Keyword rule wins for matching names
        let found = resolve(&module(1, "Miku Swimwear", "MIKU"), &settings, true).unwrap();
        assert_eq!(found.pose_id, Some(7));
        // Others fall through to the chara-wide rule
        let found = resolve(&module(2, "Miku Classic", "MIKU"), &settings, true).unwrap();
        assert_eq!(found.pose_id, Some(12));
    }

    #[test]
    fn test_resolve_ignores_keywords_when_disabled() {
        let settings = vec![setting("MIK", "Swimwear", Some(7), 0.98)];
        let found = resolve(&module(2, "Miku Classic", "MIKU"), &settings, false);
        assert_eq!(found.unwrap().pose_id, Some(7));
    }

    #[test]
    fn test_load_settings_skips_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open_at(dir.path().to_path_buf()).unwrap();

        let mut doc = IniDocument::new();
        doc.set("PoseScaleSetting_Good", "Chara", "MIK");
        doc.set("PoseScaleSetting_Good", "ModuleNameContains", "Miku");
        doc.set("PoseScaleSetting_Good", "PoseID", "12");
        doc.set("PoseScaleSetting_Good", "Scale", "1.05");
        doc.set("PoseScaleSetting_BadScale", "Chara", "RIN");
        doc.set("PoseScaleSetting_BadScale", "Scale", "huge");
        doc.set("PoseScaleSetting_BadPose", "Chara", "LEN");
        doc.set("PoseScaleSetting_BadPose", "PoseID", "twelve");
        doc.set("PoseScaleSetting_NoChara", "Scale", "1.0");
        doc.set("NotASetting", "Chara", "KAI");
        store
            .save_document(&store.pose_data_dir().join("extra.ini"), &doc)
            .unwrap();

        let settings = load_settings(&store).unwrap();
        // The default store file contributes its MIKU rule as well
        let from_extra: Vec<_> = settings.iter().filter(|s| s.source.contains("Good")).collect();
        assert_eq!(from_extra.len(), 1);
        assert_eq!(from_extra[0].pose_id, Some(12));
        assert!(settings.iter().all(|s| !s.source.contains("Bad")));
        assert!(settings.iter().all(|s| !s.source.contains("NoChara")));
    }

    #[test]
    fn test_load_settings_empty_pose_id_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open_at(dir.path().to_path_buf()).unwrap();
        // The default data file ships with an empty PoseID
        let settings = load_settings(&store).unwrap();
        let default = settings.iter().find(|s| s.source.contains("Default")).unwrap();
        assert_eq!(default.pose_id, None);
        assert_eq!(default.scale, 1.0);
    }
}
