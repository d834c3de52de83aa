//! Configuration store and image asset manager
//!
//! Owns the `Settings/` directory next to the executable: the INI config
//! files, the pose/scale data directory, imported preview images and the
//! staged-delete trash. All disk access for configuration goes through here
//! so the retry and pending-delete bookkeeping lives in one place.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::constants::{defaults, images, paths, sections};
use crate::ini::IniDocument;

/// Attempts for a save that hits a transiently locked file.
const SAVE_RETRIES: u32 = 3;
const SAVE_RETRY_PAUSE: Duration = Duration::from_millis(200);

pub struct ConfigStore {
    app_dir: PathBuf,
    settings_dir: PathBuf,
    pose_data_dir: PathBuf,
    pose_images_dir: PathBuf,
    /// Image file names staged for deletion; resolved against the map on exit.
    pending_deletes: Vec<String>,
}

impl ConfigStore {
    /// Open the store next to the executable. Falls back to the user config
    /// directory when the executable location cannot be resolved (e.g. a
    /// read-only install).
    pub fn open() -> Result<Self> {
        let app_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .or_else(|| dirs::config_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME"))))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::open_at(app_dir)
    }

    /// Open the store rooted at an explicit directory.
    pub fn open_at(app_dir: PathBuf) -> Result<Self> {
        let settings_dir = app_dir.join(paths::SETTINGS_DIR);
        let pose_data_dir = settings_dir.join(paths::POSE_DATA_DIR);
        let pose_images_dir = settings_dir.join(paths::POSE_IMAGES_DIR);

        let mut store = Self {
            app_dir,
            settings_dir,
            pose_data_dir,
            pose_images_dir,
            pending_deletes: Vec::new(),
        };
        store.ensure_directories()?;
        store.ensure_default_files()?;
        Ok(store)
    }

    fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.settings_dir, &self.pose_data_dir, &self.pose_images_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }

    /// First-run files. Existing files are never touched.
    fn ensure_default_files(&self) -> Result<()> {
        if !self.main_config_path().exists() {
            let mut doc = IniDocument::new();
            doc.set(sections::FARC_PACK, "FarcPackPath", "");
            doc.set_bool(sections::GENERAL, "SaveInParentDirectory", false);
            doc.set(sections::GENERAL, "DefaultPoseFileName", defaults::POSE_FILE_NAME);
            doc.set_bool(sections::GENERAL, "UseModuleNameContains", false);
            doc.set_bool(sections::GENERAL, "OverwriteExistingFiles", false);
            doc.set(sections::GENERAL, "Language", defaults::LANGUAGE);
            doc.set_bool(sections::DEBUG, "ShowDebugSettings", false);
            doc.set_bool(sections::DEBUG, "OutputLog", false);
            doc.set_bool(sections::DEBUG, "DeleteTemp", true);
            doc.set(sections::DEBUG, "HistoryLimit", defaults::HISTORY_LIMIT.to_string());
            self.save_document(&self.main_config_path(), &doc)?;
            info!(path = %self.main_config_path().display(), "Created default main config");
        }

        if !self.profile_config_path().exists() {
            fs::write(self.profile_config_path(), "")
                .context("Failed to create empty profile config")?;
        }

        if !self.pose_id_map_path().exists() {
            let mut doc = IniDocument::new();
            doc.add_section(sections::POSE_IDS);
            self.save_document(&self.pose_id_map_path(), &doc)?;
        }

        let default_pose_data = self.pose_data_dir.join(paths::DEFAULT_POSE_DATA_FILE);
        if !default_pose_data.exists() {
            let section = format!("{}Default", sections::POSE_SETTING_PREFIX);
            let mut doc = IniDocument::new();
            doc.set(&section, "Chara", "MIKU");
            doc.set(&section, "ModuleNameContains", "ミク, Miku");
            doc.set(&section, "PoseID", "");
            doc.set(&section, "Scale", "1.0");
            self.save_document(&default_pose_data, &doc)?;
            info!(path = %default_pose_data.display(), "Created default pose data file");
        }

        Ok(())
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    pub fn main_config_path(&self) -> PathBuf {
        self.settings_dir.join(paths::MAIN_CONFIG)
    }

    pub fn profile_config_path(&self) -> PathBuf {
        self.settings_dir.join(paths::PROFILE_CONFIG)
    }

    pub fn pose_id_map_path(&self) -> PathBuf {
        self.settings_dir.join(paths::POSE_ID_MAP)
    }

    pub fn key_map_path(&self) -> PathBuf {
        self.settings_dir.join(paths::KEY_MAP)
    }

    pub fn update_status_path(&self) -> PathBuf {
        self.settings_dir.join(paths::UPDATE_STATUS)
    }

    pub fn pose_data_dir(&self) -> &Path {
        &self.pose_data_dir
    }

    pub fn pose_images_dir(&self) -> &Path {
        &self.pose_images_dir
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.app_dir.join(paths::TEMP_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.app_dir.join(paths::LOGS_DIR)
    }

    fn trash_dir(&self) -> PathBuf {
        self.pose_images_dir.join(paths::TRASH_DIR)
    }

    /// Load an INI document. A locked or unreadable file is an error, never
    /// an empty document: returning an empty document would get re-saved and
    /// silently wipe the user's data.
    pub fn load_document(&self, path: &Path) -> Result<IniDocument> {
        if !path.exists() {
            return Ok(IniDocument::new());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Ok(IniDocument::parse(&contents))
    }

    /// Save an INI document, riding out transient file locks with a few
    /// retries.
    pub fn save_document(&self, path: &Path, doc: &IniDocument) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let contents = doc.to_string();
        let mut last_err = None;
        for attempt in 0..SAVE_RETRIES {
            match fs::write(path, &contents) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if attempt + 1 < SAVE_RETRIES {
                        warn!(path = %path.display(), attempt = attempt + 1, error = %err, "Save failed, retrying");
                        std::thread::sleep(SAVE_RETRY_PAUSE);
                    }
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| std::io::Error::other("save failed")))
            .with_context(|| format!("Failed to save config {}", path.display()))
    }

    /// Pose/scale data files, sorted by file name.
    pub fn list_pose_data_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.pose_data_dir)
            .with_context(|| format!("Failed to read {}", self.pose_data_dir.display()))?
        {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("ini")) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    // --- image assets ---

    /// Absolute path of an imported image, if it exists.
    pub fn image_path(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }
        let path = self.pose_images_dir.join(name);
        path.exists().then_some(path)
    }

    /// Find an image named `<pose_id>_*.<ext>` with an accepted extension.
    pub fn find_image_for_pose(&self, pose_id: &str) -> Option<PathBuf> {
        if pose_id.is_empty() {
            return None;
        }
        let prefix = format!("{pose_id}_");
        let entries = fs::read_dir(&self.pose_images_dir).ok()?;
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(&prefix) && has_image_extension(name) {
                return Some(path);
            }
        }
        None
    }

    /// Copy an external image into the image directory. With a target name,
    /// the source extension is appended when the target does not already
    /// carry it. Returns the stored file name.
    pub fn import_image(&self, source: &Path, target_name: Option<&str>) -> Result<String> {
        if !source.exists() {
            bail!("Image does not exist: {}", source.display());
        }
        let file_name = match target_name {
            Some(target) => {
                let ext = source
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                if ext.is_empty() || target.to_ascii_lowercase().ends_with(&format!(".{ext}")) {
                    target.to_string()
                } else {
                    format!("{target}.{ext}")
                }
            }
            None => source
                .file_name()
                .and_then(|n| n.to_str())
                .context("Image has no usable file name")?
                .to_string(),
        };
        let dest = self.pose_images_dir.join(&file_name);
        fs::copy(source, &dest)
            .with_context(|| format!("Failed to import image to {}", dest.display()))?;
        info!(source = %source.display(), name = %file_name, "Imported image");
        Ok(file_name)
    }

    /// Rename an image; refuses to clobber an existing file.
    pub fn rename_image(&self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name.is_empty() || new_name.is_empty() {
            bail!("Image names must not be empty");
        }
        let old_path = self.pose_images_dir.join(old_name);
        let new_path = self.pose_images_dir.join(new_name);
        if !old_path.exists() {
            bail!("Image does not exist: {old_name}");
        }
        if new_path.exists() {
            bail!("Image already exists: {new_name}");
        }
        fs::rename(&old_path, &new_path)
            .with_context(|| format!("Failed to rename image {old_name} to {new_name}"))
    }

    // --- pending-delete ledger ---

    /// Stage an image for deletion: move it into the trash directory and
    /// remember its name. It stays recoverable until the app closes.
    pub fn stage_delete(&mut self, name: &str) -> Result<()> {
        let source = self.pose_images_dir.join(name);
        if !source.exists() {
            // Nothing on disk; remember the name anyway so finalize is a no-op.
            self.pending_deletes.push(name.to_string());
            return Ok(());
        }
        let trash = self.trash_dir();
        fs::create_dir_all(&trash)
            .with_context(|| format!("Failed to create {}", trash.display()))?;
        fs::rename(&source, trash.join(name))
            .with_context(|| format!("Failed to stage image {name} for deletion"))?;
        self.pending_deletes.push(name.to_string());
        info!(name = %name, "Staged image for deletion");
        Ok(())
    }

    /// Restore staged images whose names are referenced again (e.g. an undo
    /// brought the map entry back). Returns the restored names.
    pub fn reconcile_pending(&mut self, used: &HashSet<String>) -> Vec<String> {
        let mut restored = Vec::new();
        self.pending_deletes.retain(|name| {
            if !used.contains(name) {
                return true;
            }
            let staged = self.pose_images_dir.join(paths::TRASH_DIR).join(name);
            if staged.exists() {
                if let Err(err) = fs::rename(&staged, self.pose_images_dir.join(name)) {
                    warn!(name = %name, error = %err, "Failed to restore staged image");
                    return true;
                }
            }
            warn!(name = %name, "Restored image from pending delete");
            restored.push(name.clone());
            false
        });
        restored
    }

    /// Exit-time resolution: restore whatever the map still references, then
    /// drop the trash directory with everything left in it.
    pub fn finalize_pending(&mut self, used: &HashSet<String>) {
        self.reconcile_pending(used);
        self.pending_deletes.clear();
        self.empty_trash();
    }

    pub fn has_pending_deletes(&self) -> bool {
        !self.pending_deletes.is_empty()
    }

    pub fn empty_trash(&self) {
        let trash = self.trash_dir();
        if !trash.exists() {
            return;
        }
        if let Err(err) = fs::remove_dir_all(&trash) {
            warn!(path = %trash.display(), error = %err, "Failed to empty trash directory");
        } else {
            info!(path = %trash.display(), "Emptied trash directory");
        }
    }
}

fn has_image_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    images::EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::sections;
    use tempfile::TempDir;

    fn store() -> (TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open_at(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_defaults() {
        let (_dir, store) = store();
        assert!(store.main_config_path().exists());
        assert!(store.profile_config_path().exists());
        assert!(store.pose_id_map_path().exists());
        assert!(store.pose_data_dir().join(paths::DEFAULT_POSE_DATA_FILE).exists());

        let doc = store.load_document(&store.main_config_path()).unwrap();
        assert_eq!(doc.get(sections::GENERAL, "DefaultPoseFileName"), Some("gm_module_pose_tbl"));
        assert!(doc.get_bool(sections::DEBUG, "DeleteTemp", false));
    }

    #[test]
    fn test_open_preserves_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = ConfigStore::open_at(dir.path().to_path_buf()).unwrap();
            let mut doc = store.load_document(&store.main_config_path()).unwrap();
            doc.set(sections::GENERAL, "DefaultPoseFileName", "custom_tbl");
            store.save_document(&store.main_config_path(), &doc).unwrap();
        }
        let store = ConfigStore::open_at(dir.path().to_path_buf()).unwrap();
        let doc = store.load_document(&store.main_config_path()).unwrap();
        assert_eq!(doc.get(sections::GENERAL, "DefaultPoseFileName"), Some("custom_tbl"));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let (_dir, store) = store();
        let mut doc = IniDocument::new();
        doc.set("TomlProfile_Main", "ModuleMatch", "ミク, Miku");
        doc.set("TomlProfile_Main", "PoseFileName", "miku_pose_tbl");
        store.save_document(&store.profile_config_path(), &doc).unwrap();

        let loaded = store.load_document(&store.profile_config_path()).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_load_missing_is_empty() {
        let (_dir, store) = store();
        let doc = store
            .load_document(&store.pose_data_dir().join("nope.ini"))
            .unwrap();
        assert_eq!(doc.section_names().count(), 0);
    }

    #[test]
    fn test_import_and_find_image() {
        let (dir, store) = store();
        let src = dir.path().join("pic.png");
        fs::write(&src, b"fake png").unwrap();

        let name = store.import_image(&src, Some("12")).unwrap();
        assert_eq!(name, "12.png");
        assert!(store.image_path("12.png").is_some());

        let src2 = dir.path().join("other.jpg");
        fs::write(&src2, b"fake jpg").unwrap();
        let name2 = store.import_image(&src2, Some("34_pose")).unwrap();
        assert_eq!(name2, "34_pose.jpg");
        assert!(store.find_image_for_pose("34").is_some());
        assert!(store.find_image_for_pose("99").is_none());
    }

    #[test]
    fn test_rename_image_refuses_clobber() {
        let (dir, store) = store();
        for name in ["a.png", "b.png"] {
            fs::write(dir.path().join(name), b"x").unwrap();
            store.import_image(&dir.path().join(name), None).unwrap();
        }
        assert!(store.rename_image("a.png", "b.png").is_err());
        store.rename_image("a.png", "c.png").unwrap();
        assert!(store.image_path("c.png").is_some());
        assert!(store.image_path("a.png").is_none());
    }

    #[test]
    fn test_stage_and_restore() {
        let (dir, mut store) = store();
        fs::write(dir.path().join("p.png"), b"x").unwrap();
        store.import_image(&dir.path().join("p.png"), None).unwrap();

        store.stage_delete("p.png").unwrap();
        assert!(store.image_path("p.png").is_none());
        assert!(store.has_pending_deletes());

        // Referenced again: reconcile restores the file.
        let used = HashSet::from(["p.png".to_string()]);
        let restored = store.reconcile_pending(&used);
        assert_eq!(restored, vec!["p.png".to_string()]);
        assert!(store.image_path("p.png").is_some());
        assert!(!store.has_pending_deletes());
    }

    #[test]
    fn test_finalize_deletes_unreferenced() {
        let (dir, mut store) = store();
        for name in ["keep.png", "drop.png"] {
            fs::write(dir.path().join(name), b"x").unwrap();
            store.import_image(&dir.path().join(name), None).unwrap();
            store.stage_delete(name).unwrap();
        }

        let used = HashSet::from(["keep.png".to_string()]);
        store.finalize_pending(&used);

        assert!(store.image_path("keep.png").is_some());
        assert!(store.image_path("drop.png").is_none());
        assert!(!store.pose_images_dir().join(paths::TRASH_DIR).exists());
    }
}
