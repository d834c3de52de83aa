//! TOML output
//!
//! The generator emits two tables: the pose table (module id, name, chara
//! digit and assigned pose) and the scale table (keyed `<digit>.<module id>`).
//! Existing output files are renamed aside with a timestamp unless the user
//! opted into overwriting.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::generator::module_table::ModuleEntry;
use crate::generator::pose_settings::{PoseSetting, chara_to_digit, resolve};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseRow {
    pub id: u32,
    pub name: String,
    pub chara: String,
    pub pose: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleRow {
    pub id: String,
    pub value: f32,
}

#[derive(Debug, Serialize)]
struct PoseTable<'a> {
    module: &'a [PoseRow],
}

#[derive(Debug, Serialize)]
struct ScaleTable<'a> {
    scale: &'a [ScaleRow],
}

/// One pose row per module that resolves to a setting carrying a pose id.
pub fn build_pose_rows(
    modules: &[ModuleEntry],
    settings: &[PoseSetting],
    use_name_contains: bool,
) -> Vec<PoseRow> {
    modules
        .iter()
        .filter_map(|module| {
            let setting = resolve(module, settings, use_name_contains)?;
            let pose = setting.pose_id?;
            Some(PoseRow {
                id: module.id,
                name: module.name.clone(),
                chara: chara_to_digit(&module.chara).to_string(),
                pose,
            })
        })
        .collect()
}

/// One scale row per resolved module whose scale differs from neutral 1.0.
pub fn build_scale_rows(
    modules: &[ModuleEntry],
    settings: &[PoseSetting],
    use_name_contains: bool,
) -> Vec<ScaleRow> {
    modules
        .iter()
        .filter_map(|module| {
            let setting = resolve(module, settings, use_name_contains)?;
            if setting.scale == 1.0 {
                return None;
            }
            Some(ScaleRow {
                id: format!("{}.{}", chara_to_digit(&module.chara), module.id),
                value: setting.scale,
            })
        })
        .collect()
}

pub fn render_pose_toml(rows: &[PoseRow]) -> Result<String> {
    toml::to_string_pretty(&PoseTable { module: rows }).context("Failed to serialize pose table")
}

pub fn render_scale_toml(rows: &[ScaleRow]) -> Result<String> {
    toml::to_string_pretty(&ScaleTable { scale: rows }).context("Failed to serialize scale table")
}

/// Write an output file. When the target exists and overwriting is off, the
/// old file is renamed aside with a `_YYYYmmddHHMMSS` suffix first so no run
/// ever destroys a previous result.
pub fn save_with_timestamp(path: &Path, contents: &str, overwrite: bool) -> Result<()> {
    if path.exists() {
        if overwrite {
            info!(path = %path.display(), "Overwriting existing file");
        } else {
            let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S");
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
            let renamed = path.with_file_name(format!("{stem}_{timestamp}.{ext}"));
            fs::rename(path, &renamed)
                .with_context(|| format!("Failed to rename existing file {}", path.display()))?;
            info!(renamed = %renamed.display(), "Renamed existing file aside");
        }
    }
    fs::write(path, contents).with_context(|| format!("Failed to save {}", path.display()))?;
    info!(path = %path.display(), "Saved output file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_build_pose_rows() {
        let modules = vec![
            module(437, "Miku Classic", "MIKU"),
            module(500, "Rin Future", "RIN"),
            module(600, "KAITO Formal", "KAITO"),
        ];
        let settings = vec![
            setting("MIK", "", Some(12), 1.05),
            setting("RIN", "", None, 0.97),
        ];

        let rows = build_pose_rows(&modules, &settings, false);
        // Rin has no pose id, KAITO has no setting
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], PoseRow {
            id: 437,
            name: "Miku Classic".to_string(),
            chara: "0".to_string(),
            pose: 12,
        });
    }

    #[test]
    fn test_build_scale_rows_skips_neutral() {
        let modules = vec![
            module(437, "Miku Classic", "MIKU"),
            module(500, "Rin Future", "RIN"),
        ];
        let settings = vec![
            setting("MIK", "", Some(12), 1.0),
            setting("RIN", "", None, 0.97),
        ];

        let rows = build_scale_rows(&modules, &settings, false);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "1.500");
        assert_eq!(rows[0].value, 0.97);
    }

    #[test]
    fn test_render_pose_toml_shape() {
        let rows = vec![PoseRow {
            id: 437,
            name: "Miku Classic".to_string(),
            chara: "0".to_string(),
            pose: 12,
        }];
        let rendered = render_pose_toml(&rows).unwrap();
        assert!(rendered.contains("[[module]]"));
        assert!(rendered.contains("id = 437"));
        assert!(rendered.contains("name = \"Miku Classic\""));
        assert!(rendered.contains("pose = 12"));
    }

    #[test]
    fn test_render_scale_toml_shape() {
        let rows = vec![ScaleRow {
            id: "0.437".to_string(),
            value: 1.05,
        }];
        let rendered = render_scale_toml(&rows).unwrap();
        assert!(rendered.contains("[[scale]]"));
        assert!(rendered.contains("id = \"0.437\""));
        assert!(rendered.contains("value = 1.05"));
    }

    #[test]
    fn test_save_with_timestamp_renames_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pose_tbl.toml");

        save_with_timestamp(&path, "first", false).unwrap();
        save_with_timestamp(&path, "second", false).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        let renamed: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("pose_tbl_") && name.ends_with(".toml"))
            .collect();
        assert_eq!(renamed.len(), 1);
        assert_eq!(fs::read_to_string(dir.path().join(&renamed[0])).unwrap(), "first");
    }

    #[test]
    fn test_save_with_timestamp_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scale_db.toml");

        save_with_timestamp(&path, "first", true).unwrap();
        save_with_timestamp(&path, "second", true).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
