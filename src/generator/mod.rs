//! Generator mode: archive in, TOML tables out
//!
//! Runs when the binary is invoked with file arguments (a game archive
//! dropped onto the executable). The pipeline stages the archive, unpacks it
//! with the external farcpack tool, parses the module table, resolves each
//! module against the pose/scale settings and writes the TOML tables next to
//! the dropped file. When no usable configuration exists the editor is
//! launched instead so the user can set one up.

pub mod archive;
pub mod module_table;
pub mod output;
pub mod pose_settings;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::constants::{app, defaults, sections};
use crate::restart;
use crate::settings::AppSettings;
use crate::store::ConfigStore;
use crate::text::is_match;
use crate::update;

pub fn run(store: &ConfigStore, files: &[PathBuf]) -> Result<()> {
    println!("Pose Scale TOML Generator {}", app::VERSION);
    notify_update_on_console(store);

    let main_doc = store.load_document(&store.main_config_path())?;
    let settings = AppSettings::from_doc(&main_doc);

    let tool = match archive::validate_tool_path(&settings.general.farc_pack_path) {
        Ok(tool) => tool,
        Err(err) => {
            warn!(error = %err, "No valid unpack tool configured");
            println!("No valid FarcPack path is configured. Opening the editor...");
            restart::launch_editor()?;
            return Ok(());
        }
    };

    let pose_settings = pose_settings::load_settings(store)?;
    if pose_settings.is_empty() {
        warn!("No usable pose/scale settings found");
        println!("No usable pose/scale settings found. Opening the editor...");
        restart::launch_editor()?;
        return Ok(());
    }

    let temp_dir = store.temp_dir();
    archive::prepare_temp_dir(&temp_dir)?;

    let mut result = Ok(());
    for file in files {
        if let Err(err) = convert_one(store, &settings, &pose_settings, &tool, &temp_dir, file) {
            eprintln!("Failed to convert {}: {err:#}", file.display());
            result = Err(err).with_context(|| format!("Failed to convert {}", file.display()));
        }
    }

    if settings.debug.delete_temp {
        archive::clean_temp_dir(&temp_dir);
    } else {
        info!("Keeping temp directory (DeleteTemp is off)");
    }
    result
}

fn convert_one(
    store: &ConfigStore,
    settings: &AppSettings,
    pose_settings: &[pose_settings::PoseSetting],
    tool: &Path,
    temp_dir: &Path,
    dropped: &Path,
) -> Result<()> {
    info!(file = %dropped.display(), "Converting archive");
    let extracted = archive::extract_archive(dropped, tool, temp_dir)?;

    let modules = module_table::scan_extracted_dir(&extracted)?;
    if modules.is_empty() {
        bail!("No module entries found in {}", extracted.display());
    }
    info!(count = modules.len(), "Parsed module entries");

    let use_contains = settings.general.use_module_name_contains;
    let pose_rows = output::build_pose_rows(&modules, pose_settings, use_contains);
    let scale_rows = output::build_scale_rows(&modules, pose_settings, use_contains);

    let dropped_dir = dropped
        .parent()
        .context("Dropped file has no parent directory")?;
    let save_dir = if settings.general.save_in_parent {
        dropped_dir.parent().unwrap_or(dropped_dir)
    } else {
        dropped_dir
    };

    let overwrite = settings.general.overwrite_existing;
    if pose_rows.is_empty() {
        info!("Pose table is empty, skipping pose output");
    } else {
        let rendered = output::render_pose_toml(&pose_rows)?;
        for file_name in pose_file_names(store, settings, &modules)? {
            let path = save_dir.join(format!("{file_name}.toml"));
            output::save_with_timestamp(&path, &rendered, overwrite)?;
            println!("Wrote {}", path.display());
        }
    }

    if scale_rows.is_empty() {
        info!("Scale table is empty, skipping scale output");
    } else {
        let rendered = output::render_scale_toml(&scale_rows)?;
        let path = save_dir.join(format!("{}.toml", defaults::SCALE_FILE_NAME));
        output::save_with_timestamp(&path, &rendered, overwrite)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

/// Pose output file names for this module set. With profile matching on,
/// every `TomlProfile_*` section whose keywords hit any module contributes
/// its `PoseFileName`; otherwise the default name is used.
fn pose_file_names(
    store: &ConfigStore,
    settings: &AppSettings,
    modules: &[module_table::ModuleEntry],
) -> Result<Vec<String>> {
    if !settings.general.use_module_name_contains {
        return Ok(vec![settings.general.default_pose_file_name.clone()]);
    }

    let profiles = store.load_document(&store.profile_config_path())?;
    let mut names = Vec::new();
    for section in profiles.section_names() {
        if !section.starts_with(sections::PROFILE_PREFIX) {
            continue;
        }
        let matches = profiles.get(section, "ModuleMatch").unwrap_or_default();
        let excludes = profiles.get(section, "ModuleExclude").unwrap_or_default();
        let hit = modules
            .iter()
            .any(|module| is_match(&module.name, matches, excludes));
        if !hit {
            continue;
        }
        match profiles.get(section, "PoseFileName") {
            Some(name) if !name.trim().is_empty() => names.push(name.trim().to_string()),
            _ => warn!(section = %section, "Matching profile has no PoseFileName, skipping"),
        }
    }
    if names.is_empty() {
        warn!("No output profile matched, falling back to the default pose file name");
        names.push(settings.general.default_pose_file_name.clone());
    }
    Ok(names)
}

/// Console update notice, printed before the run the way a launcher banner
/// would be. Failures are silent; the conversion must never depend on it.
fn notify_update_on_console(store: &ConfigStore) {
    let status = update::check_update(
        &store.update_status_path(),
        app::GENERATOR_TOOL,
        app::VERSION,
        false,
    );
    if let Some(version) = update::update_available(&status, app::GENERATOR_TOOL) {
        println!("--------------------------------------------------");
        println!("A newer release is available: {version}");
        if !status.release_url.is_empty() {
            println!("Download: {}", status.release_url);
        }
        println!("--------------------------------------------------");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ini::IniDocument;
    use super::module_table::ModuleEntry;

    fn module(name: &str) -> ModuleEntry {
        ModuleEntry {
            id: 1,
            name: name.to_string(),
            chara: "MIKU".to_string(),
            cos: None,
        }
    }

    fn store_with_profiles(profiles: &IniDocument) -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open_at(dir.path().to_path_buf()).unwrap();
        store
            .save_document(&store.profile_config_path(), profiles)
            .unwrap();
        (dir, store)
    }

    #[test]
    fn test_pose_file_names_default_when_contains_off() {
        let (_dir, store) = store_with_profiles(&IniDocument::new());
        let settings = AppSettings::default();
        let names = pose_file_names(&store, &settings, &[module("Miku Classic")]).unwrap();
        assert_eq!(names, vec!["gm_module_pose_tbl".to_string()]);
    }

    #[test]
    fn test_pose_file_names_profile_matching() {
        let mut profiles = IniDocument::new();
        profiles.set("TomlProfile_Miku", "ModuleMatch", "Miku");
        profiles.set("TomlProfile_Miku", "PoseFileName", "miku_pose_tbl");
        profiles.set("TomlProfile_Rin", "ModuleMatch", "Rin");
        profiles.set("TomlProfile_Rin", "PoseFileName", "rin_pose_tbl");
        let (_dir, store) = store_with_profiles(&profiles);

        let mut settings = AppSettings::default();
        settings.general.use_module_name_contains = true;

        let names = pose_file_names(&store, &settings, &[module("Miku Classic")]).unwrap();
        assert_eq!(names, vec!["miku_pose_tbl".to_string()]);
    }

    #[test]
    fn test_pose_file_names_exclude_rejects() {
        let mut profiles = IniDocument::new();
        profiles.set("TomlProfile_Miku", "ModuleMatch", "Miku");
        profiles.set("TomlProfile_Miku", "ModuleExclude", "Swimwear");
        profiles.set("TomlProfile_Miku", "PoseFileName", "miku_pose_tbl");
        let (_dir, store) = store_with_profiles(&profiles);

        let mut settings = AppSettings::default();
        settings.general.use_module_name_contains = true;

        let names = pose_file_names(&store, &settings, &[module("Miku Swimwear")]).unwrap();
        // Falls back to the default when nothing matches
        assert_eq!(names, vec!["gm_module_pose_tbl".to_string()]);
    }
}
