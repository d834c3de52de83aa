//! General settings tab

use eframe::egui;

use crate::gui::constants::{ITEM_SPACING, SECTION_SPACING};
use crate::settings::AppSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneralAction {
    None,
    Save,
}

#[derive(Default)]
pub struct GeneralTab;

impl GeneralTab {
    /// Renders the settings editor and returns what the app should do.
    pub fn ui(&mut self, ui: &mut egui::Ui, settings: &mut AppSettings) -> GeneralAction {
        let mut action = GeneralAction::None;

        ui.group(|ui| {
            ui.label(egui::RichText::new("FarcPack").heading().strong());
            ui.add_space(ITEM_SPACING);

            ui.horizontal(|ui| {
                ui.label("FarcPack path:");
                ui.add(
                    egui::TextEdit::singleline(&mut settings.general.farc_pack_path)
                        .desired_width(420.0),
                );
                if ui.button("Browse…").clicked()
                    && let Some(path) = rfd::FileDialog::new()
                        .add_filter("farcpack", &["exe"])
                        .pick_file()
                {
                    settings.general.farc_pack_path = path.display().to_string();
                }
            });
            ui.label(
                egui::RichText::new("(Path to the external farcpack tool used for extraction)")
                    .small()
                    .italics(),
            );
        });

        ui.add_space(SECTION_SPACING);

        ui.group(|ui| {
            ui.label(egui::RichText::new("Output").heading().strong());
            ui.add_space(ITEM_SPACING);

            ui.checkbox(
                &mut settings.general.save_in_parent,
                "Save output in the parent directory of the dropped archive",
            );

            ui.add_space(ITEM_SPACING);

            ui.horizontal(|ui| {
                ui.label("Default pose file name:");
                ui.add(
                    egui::TextEdit::singleline(&mut settings.general.default_pose_file_name)
                        .desired_width(260.0),
                );
                ui.label(".toml");
            });

            ui.add_space(ITEM_SPACING);

            ui.checkbox(
                &mut settings.general.use_module_name_contains,
                "Match output profiles by module name keywords",
            );
            ui.checkbox(
                &mut settings.general.overwrite_existing,
                "Overwrite existing output files (otherwise rename with a timestamp)",
            );
        });

        ui.add_space(SECTION_SPACING);

        ui.group(|ui| {
            ui.label(egui::RichText::new("Language").heading().strong());
            ui.add_space(ITEM_SPACING);

            egui::ComboBox::from_id_salt("language_selector")
                .selected_text(language_label(&settings.general.language))
                .show_ui(ui, |ui| {
                    for code in ["en", "ja"] {
                        ui.selectable_value(
                            &mut settings.general.language,
                            code.to_string(),
                            language_label(code),
                        );
                    }
                });
        });

        if settings.debug.show_debug {
            ui.add_space(SECTION_SPACING);

            ui.group(|ui| {
                ui.label(egui::RichText::new("Debug Settings").heading().strong());
                ui.add_space(ITEM_SPACING);

                ui.checkbox(&mut settings.debug.show_debug, "Show debug settings");
                ui.checkbox(&mut settings.debug.output_log, "Write log files");
                ui.checkbox(
                    &mut settings.debug.delete_temp,
                    "Delete the temp directory after generating",
                );

                ui.add_space(ITEM_SPACING);

                ui.horizontal(|ui| {
                    ui.label("Undo history limit:");
                    ui.add(egui::DragValue::new(&mut settings.debug.history_limit).range(1..=500));
                });
            });
        }

        ui.add_space(SECTION_SPACING);

        if ui.button("💾 Save Settings").clicked() {
            action = GeneralAction::Save;
        }

        action
    }
}

fn language_label(code: &str) -> &str {
    match code {
        "ja" => "日本語",
        _ => "English",
    }
}
