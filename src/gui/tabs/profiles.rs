//! TOML output profile tab
//!
//! Edits the `TomlProfile_<suffix>` sections of `TomlProfile.ini`: which
//! module-name keywords select the profile and which pose file name it
//! writes.

use anyhow::Result;
use eframe::egui;

use crate::constants::sections;
use crate::gui::constants::{ITEM_SPACING, LIST_PANEL_WIDTH, SECTION_SPACING};
use crate::gui::status::StatusBar;
use crate::gui::tabs::{EditorTab, TabSnapshot};
use crate::history::History;
use crate::ini::IniDocument;
use crate::store::ConfigStore;
use crate::text::{normalize_comma_list, normalize_text};

pub struct ProfilesTab {
    doc: IniDocument,
    selected: Option<String>,
    suffix: String,
    module_match: String,
    module_exclude: String,
    pose_file_name: String,
    confirm_delete: bool,
}

impl ProfilesTab {
    pub fn load(store: &ConfigStore) -> Result<Self> {
        let doc = store.load_document(&store.profile_config_path())?;
        Ok(Self {
            doc,
            selected: None,
            suffix: String::new(),
            module_match: String::new(),
            module_exclude: String::new(),
            pose_file_name: String::new(),
            confirm_delete: false,
        })
    }

    pub fn snapshot(&self) -> TabSnapshot {
        TabSnapshot::new(self.doc.clone(), self.selected.clone())
    }

    pub fn restore(&mut self, snapshot: TabSnapshot) {
        self.doc = snapshot.doc;
        self.select(snapshot.selected);
    }

    pub fn reload(&mut self, store: &ConfigStore) -> Result<()> {
        self.doc = store.load_document(&store.profile_config_path())?;
        let selected = self.selected.take().filter(|s| self.doc.has_section(s));
        self.select(selected);
        Ok(())
    }

    fn select(&mut self, section: Option<String>) {
        self.selected = section.filter(|s| self.doc.has_section(s));
        match &self.selected {
            Some(section) => {
                self.suffix = section
                    .strip_prefix(sections::PROFILE_PREFIX)
                    .unwrap_or(section)
                    .to_string();
                self.module_match = self.doc.get(section, "ModuleMatch").unwrap_or_default().to_string();
                self.module_exclude = self.doc.get(section, "ModuleExclude").unwrap_or_default().to_string();
                self.pose_file_name = self.doc.get(section, "PoseFileName").unwrap_or_default().to_string();
            }
            None => {
                self.suffix.clear();
                self.module_match.clear();
                self.module_exclude.clear();
                self.pose_file_name.clear();
            }
        }
    }

    fn profile_sections(&self) -> Vec<String> {
        self.doc
            .section_names()
            .filter(|name| name.starts_with(sections::PROFILE_PREFIX))
            .map(str::to_string)
            .collect()
    }

    /// Commit the edit fields into the document and save. Records a history
    /// snapshot of the pre-commit state first.
    pub fn save_entry(
        &mut self,
        store: &ConfigStore,
        history: &mut History<EditorTab, TabSnapshot>,
        status: &mut StatusBar,
    ) {
        let suffix = normalize_text(&self.suffix);
        if suffix.is_empty() {
            status.error("Profile name must not be empty");
            return;
        }
        let target = format!("{}{}", sections::PROFILE_PREFIX, suffix);

        // Validate before recording so a rejected save leaves no history entry
        let renaming = self.selected.as_deref().is_some_and(|old| old != target);
        if (renaming || self.selected.is_none()) && self.doc.has_section(&target) {
            status.error(format!("Profile '{suffix}' already exists"));
            return;
        }

        history.record(EditorTab::Profiles, self.snapshot());

        if renaming
            && let Some(old) = self.selected.clone()
        {
            self.doc.rename_section(&old, &target);
        }

        self.module_match = normalize_comma_list(&self.module_match);
        self.module_exclude = normalize_comma_list(&self.module_exclude);
        self.pose_file_name = normalize_text(&self.pose_file_name);

        self.doc.set(&target, "ModuleMatch", self.module_match.clone());
        self.doc.set(&target, "ModuleExclude", self.module_exclude.clone());
        self.doc.set(&target, "PoseFileName", self.pose_file_name.clone());

        match store.save_document(&store.profile_config_path(), &self.doc) {
            Ok(()) => {
                self.selected = Some(target);
                status.success(format!("Saved profile '{suffix}'"));
            }
            Err(err) => status.error(format!("Failed to save profiles: {err:#}")),
        }
    }

    fn delete_entry(
        &mut self,
        store: &ConfigStore,
        history: &mut History<EditorTab, TabSnapshot>,
        status: &mut StatusBar,
    ) {
        let Some(section) = self.selected.clone() else {
            return;
        };
        history.record(EditorTab::Profiles, self.snapshot());
        self.doc.remove_section(&section);
        match store.save_document(&store.profile_config_path(), &self.doc) {
            Ok(()) => status.success(format!("Deleted profile '{section}'")),
            Err(err) => status.error(format!("Failed to save profiles: {err:#}")),
        }
        self.select(None);
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        store: &ConfigStore,
        history: &mut History<EditorTab, TabSnapshot>,
        status: &mut StatusBar,
    ) {
        ui.horizontal_top(|ui| {
            // Profile list
            ui.vertical(|ui| {
                ui.set_width(LIST_PANEL_WIDTH);
                ui.label(egui::RichText::new("Profiles").strong());
                ui.add_space(ITEM_SPACING);
                egui::ScrollArea::vertical()
                    .id_salt("profile_list")
                    .show(ui, |ui| {
                        let mut clicked = None;
                        for section in self.profile_sections() {
                            let label = section
                                .strip_prefix(sections::PROFILE_PREFIX)
                                .unwrap_or(&section)
                                .to_string();
                            let is_selected = self.selected.as_deref() == Some(section.as_str());
                            if ui.selectable_label(is_selected, label).clicked() {
                                clicked = Some(section);
                            }
                        }
                        if let Some(section) = clicked {
                            self.select(Some(section));
                        }
                        if self.profile_sections().is_empty() {
                            ui.label(egui::RichText::new("(No profiles yet)").weak().italics());
                        }
                    });
            });

            ui.separator();

            // Detail editor
            ui.vertical(|ui| {
                ui.label(egui::RichText::new("Profile Settings").strong());
                ui.add_space(ITEM_SPACING);

                egui::Grid::new("profile_fields")
                    .num_columns(2)
                    .spacing([ITEM_SPACING, ITEM_SPACING])
                    .show(ui, |ui| {
                        ui.label("Name:");
                        ui.text_edit_singleline(&mut self.suffix);
                        ui.end_row();

                        ui.label("Module keywords:");
                        ui.text_edit_singleline(&mut self.module_match);
                        ui.end_row();

                        ui.label("Exclude keywords:");
                        ui.text_edit_singleline(&mut self.module_exclude);
                        ui.end_row();

                        ui.label("Pose file name:");
                        ui.text_edit_singleline(&mut self.pose_file_name);
                        ui.end_row();
                    });

                ui.label(
                    egui::RichText::new("(Keyword lists are comma separated; matching is OR)")
                        .small()
                        .italics(),
                );

                ui.add_space(SECTION_SPACING);

                ui.horizontal(|ui| {
                    if ui.button("➕ New").clicked() {
                        self.select(None);
                    }
                    if ui.button("💾 Save").clicked() {
                        self.save_entry(store, history, status);
                    }
                    if ui.button("🗑 Delete").clicked() && self.selected.is_some() {
                        self.confirm_delete = true;
                    }
                });
            });
        });

        if self.confirm_delete {
            let mut open = true;
            egui::Window::new("Confirm Delete")
                .collapsible(false)
                .resizable(false)
                .open(&mut open)
                .show(ui.ctx(), |ui| {
                    let name = self.selected.clone().unwrap_or_default();
                    ui.label(format!("Delete profile '{name}'?"));
                    ui.add_space(ITEM_SPACING);
                    ui.horizontal(|ui| {
                        if ui.button("Delete").clicked() {
                            self.delete_entry(store, history, status);
                            self.confirm_delete = false;
                        }
                        if ui.button("Cancel").clicked() {
                            self.confirm_delete = false;
                        }
                    });
                });
            if !open {
                self.confirm_delete = false;
            }
        }
    }
}
