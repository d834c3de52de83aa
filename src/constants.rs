//! Application-wide constants
//!
//! This module contains the directory layout, file names and string literals
//! used throughout the application, providing a single source of truth.

/// Application identity
pub mod app {
    /// Version string shown in the window title and recorded in the update
    /// status file. Carries the `v` prefix the release assets use.
    pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

    /// Tool key for the editor in the update status file
    pub const EDITOR_TOOL: &str = "editor";

    /// Tool key for the generator in the update status file
    pub const GENERATOR_TOOL: &str = "generator";
}

/// On-disk layout relative to the executable directory
pub mod paths {
    /// Root of all persistent configuration
    pub const SETTINGS_DIR: &str = "Settings";

    /// Pose/scale data files live here, one INI per data set
    pub const POSE_DATA_DIR: &str = "PoseScaleData";

    /// Imported preview images
    pub const POSE_IMAGES_DIR: &str = "PoseImages";

    /// Staged image deletes, emptied on exit
    pub const TRASH_DIR: &str = "_trash";

    /// Generator scratch space (hidden on Windows)
    pub const TEMP_DIR: &str = "Temp";

    /// Log files when file logging is enabled
    pub const LOGS_DIR: &str = "logs";

    pub const MAIN_CONFIG: &str = "Config.ini";
    pub const PROFILE_CONFIG: &str = "TomlProfile.ini";
    pub const POSE_ID_MAP: &str = "PoseIDMap.ini";
    pub const KEY_MAP: &str = "KeyMap.ini";
    pub const UPDATE_STATUS: &str = "update_status.json";
    pub const DEFAULT_POSE_DATA_FILE: &str = "PoseScaleData.ini";
}

/// INI section and key names
pub mod sections {
    pub const FARC_PACK: &str = "FarcPack";
    pub const GENERAL: &str = "GeneralSettings";
    pub const DEBUG: &str = "DebugSettings";
    pub const SHORTCUTS: &str = "Shortcuts";
    pub const POSE_IDS: &str = "PoseIDs";
    pub const POSE_IMAGES: &str = "PoseImages";

    /// Output profile sections are named `TomlProfile_<suffix>`
    pub const PROFILE_PREFIX: &str = "TomlProfile_";

    /// Pose/scale setting sections are named `PoseScaleSetting_<suffix>`
    pub const POSE_SETTING_PREFIX: &str = "PoseScaleSetting_";
}

/// Built-in defaults written when a config file is first created
pub mod defaults {
    pub const POSE_FILE_NAME: &str = "gm_module_pose_tbl";
    pub const SCALE_FILE_NAME: &str = "scale_db";
    pub const LANGUAGE: &str = "en";
    pub const HISTORY_LIMIT: usize = 50;
    pub const WINDOW_GEOMETRY: &str = "1100x800";
}

/// Validation limits applied when loading Config.ini
pub mod validation {
    pub const MIN_HISTORY_LIMIT: usize = 1;
    pub const MAX_HISTORY_LIMIT: usize = 500;
    pub const MIN_WINDOW_WIDTH: f32 = 400.0;
    pub const MIN_WINDOW_HEIGHT: f32 = 300.0;
    pub const MAX_WINDOW_DIMENSION: f32 = 4096.0;
}

/// Update checking
pub mod update {
    /// GitHub repository polled for releases
    pub const REPO_OWNER: &str = "Riel2982";
    pub const REPO_NAME: &str = "DIVA-PoseScaleTomlGenarator";

    /// GitHub rejects requests without a User-Agent
    pub const USER_AGENT: &str = concat!("diva-pose-studio/", env!("CARGO_PKG_VERSION"));

    /// Minimum seconds between live API calls
    pub const CHECK_INTERVAL_SECS: i64 = 3600;

    pub const HTTP_TIMEOUT_SECS: u64 = 5;
}

/// Image asset handling
pub mod images {
    /// Accepted preview image extensions, lowercase
    pub const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];
}

/// External archive tool
pub mod farc {
    /// Accepted file names for the configured unpack tool
    pub const TOOL_NAMES: [&str; 2] = ["farcpack.exe", "farcpack"];
}

/// GitHub project page opened from the toolbar
pub const PROJECT_URL: &str = "https://github.com/Riel2982/DIVA-PoseScaleTomlGenarator";
