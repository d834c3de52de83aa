//! GUI-specific constants for layout, status colors and intervals

use egui;

/// Editor window bounds (the preferred size comes from the saved geometry)
pub const WINDOW_MIN_WIDTH: f32 = 700.0;
pub const WINDOW_MIN_HEIGHT: f32 = 500.0;

/// Layout spacing
pub const SECTION_SPACING: f32 = 15.0;
pub const ITEM_SPACING: f32 = 8.0;

/// Side list width on the list/detail tabs
pub const LIST_PANEL_WIDTH: f32 = 260.0;

/// Largest edge of the pose image preview
pub const IMAGE_PREVIEW_SIZE: f32 = 260.0;

/// Status bar colors
pub const STATUS_INFO: egui::Color32 = egui::Color32::from_rgb(140, 180, 230);
pub const STATUS_SUCCESS: egui::Color32 = egui::Color32::from_rgb(0, 200, 0);
pub const STATUS_WARNING: egui::Color32 = egui::Color32::from_rgb(230, 180, 0);
pub const STATUS_ERROR: egui::Color32 = egui::Color32::from_rgb(230, 60, 60);

/// How long a status message stays visible
pub const STATUS_DURATION_MS: u64 = 3000;
