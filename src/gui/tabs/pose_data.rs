//! Pose/scale data tab
//!
//! Edits the `PoseScaleSetting_<suffix>` sections across the files in
//! `Settings/PoseScaleData/`. A file selector switches the backing document;
//! switching files drops that tab's history since the snapshots would point
//! at the wrong file.

use std::path::PathBuf;

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

pub struct PoseDataTab {
    files: Vec<PathBuf>,
    current_file: Option<PathBuf>,
    doc: IniDocument,
    selected: Option<String>,
    suffix: String,
    chara: String,
    contains: String,
    pose_id: String,
    scale: String,
    new_file_name: String,
    confirm_delete: bool,
}

impl PoseDataTab {
    pub fn load(store: &ConfigStore) -> Result<Self> {
        let mut tab = Self {
            files: Vec::new(),
            current_file: None,
            doc: IniDocument::new(),
            selected: None,
            suffix: String::new(),
            chara: String::new(),
            contains: String::new(),
            pose_id: String::new(),
            scale: String::new(),
            new_file_name: String::new(),
            confirm_delete: false,
        };
        tab.refresh_files(store)?;
        Ok(tab)
    }

    /// Rescan the data directory and (re)load the current file.
    pub fn refresh_files(&mut self, store: &ConfigStore) -> Result<()> {
        self.files = store.list_pose_data_files()?;
        let current = self
            .current_file
            .take()
            .filter(|f| self.files.contains(f))
            .or_else(|| self.files.first().cloned());
        if let Some(file) = current {
            self.doc = store.load_document(&file)?;
            self.current_file = Some(file);
        } else {
            self.doc = IniDocument::new();
            self.current_file = None;
        }
        let selected = self.selected.take();
        self.select(selected);
        Ok(())
    }

    pub fn snapshot(&self) -> TabSnapshot {
        TabSnapshot::new(self.doc.clone(), self.selected.clone())
    }

    pub fn restore(&mut self, snapshot: TabSnapshot) {
        self.doc = snapshot.doc;
        self.select(snapshot.selected);
    }

    fn select(&mut self, section: Option<String>) {
        self.selected = section.filter(|s| self.doc.has_section(s));
        match &self.selected {
            Some(section) => {
                self.suffix = section
                    .strip_prefix(sections::POSE_SETTING_PREFIX)
                    .unwrap_or(section)
                    .to_string();
                self.chara = self.doc.get(section, "Chara").unwrap_or_default().to_string();
                self.contains = self
                    .doc
                    .get(section, "ModuleNameContains")
                    .unwrap_or_default()
                    .to_string();
                self.pose_id = self.doc.get(section, "PoseID").unwrap_or_default().to_string();
                self.scale = self.doc.get(section, "Scale").unwrap_or_default().to_string();
            }
            None => {
                self.suffix.clear();
                self.chara.clear();
                self.contains.clear();
                self.pose_id.clear();
                self.scale = "1.0".to_string();
            }
        }
    }

    fn setting_sections(&self) -> Vec<String> {
        self.doc
            .section_names()
            .filter(|name| name.starts_with(sections::POSE_SETTING_PREFIX))
            .map(str::to_string)
            .collect()
    }

    pub fn save_entry(
        &mut self,
        store: &ConfigStore,
        history: &mut History<EditorTab, TabSnapshot>,
        status: &mut StatusBar,
    ) {
        let Some(file) = self.current_file.clone() else {
            status.error("No pose data file selected");
            return;
        };
        let suffix = normalize_text(&self.suffix);
        if suffix.is_empty() {
            status.error("Setting name must not be empty");
            return;
        }
        let chara = normalize_text(&self.chara);
        if chara.is_empty() {
            status.error("Chara must not be empty");
            return;
        }
        let scale = normalize_text(&self.scale);
        if scale.parse::<f32>().is_err() {
            status.error(format!("Scale is not a number: '{scale}'"));
            return;
        }
        let pose_id = normalize_text(&self.pose_id);
        if !pose_id.is_empty() && pose_id.parse::<u32>().is_err() {
            status.error(format!("Pose ID is not a whole number: '{pose_id}'"));
            return;
        }

        let target = format!("{}{}", sections::POSE_SETTING_PREFIX, suffix);
        let renaming = self.selected.as_deref().is_some_and(|old| old != target);
        if (renaming || self.selected.is_none()) && self.doc.has_section(&target) {
            status.error(format!("Setting '{suffix}' already exists"));
            return;
        }

        history.record(EditorTab::PoseData, self.snapshot());

        if renaming
            && let Some(old) = self.selected.clone()
        {
            self.doc.rename_section(&old, &target);
        }

        self.contains = normalize_comma_list(&self.contains);
        self.doc.set(&target, "Chara", chara);
        self.doc.set(&target, "ModuleNameContains", self.contains.clone());
        self.doc.set(&target, "PoseID", pose_id);
        self.doc.set(&target, "Scale", scale);

        match store.save_document(&file, &self.doc) {
            Ok(()) => {
                self.selected = Some(target);
                status.success(format!("Saved setting '{suffix}'"));
            }
            Err(err) => status.error(format!("Failed to save pose data: {err:#}")),
        }
    }

    fn delete_entry(
        &mut self,
        store: &ConfigStore,
        history: &mut History<EditorTab, TabSnapshot>,
        status: &mut StatusBar,
    ) {
        let (Some(section), Some(file)) = (self.selected.clone(), self.current_file.clone()) else {
            return;
        };
        history.record(EditorTab::PoseData, self.snapshot());
        self.doc.remove_section(&section);
        match store.save_document(&file, &self.doc) {
            Ok(()) => status.success(format!("Deleted setting '{section}'")),
            Err(err) => status.error(format!("Failed to save pose data: {err:#}")),
        }
        self.select(None);
    }

    fn create_file(
        &mut self,
        store: &ConfigStore,
        history: &mut History<EditorTab, TabSnapshot>,
        status: &mut StatusBar,
    ) {
        let name = normalize_text(&self.new_file_name);
        if name.is_empty() {
            status.error("File name must not be empty");
            return;
        }
        let file_name = if name.to_ascii_lowercase().ends_with(".ini") {
            name
        } else {
            format!("{name}.ini")
        };
        let path = store.pose_data_dir().join(&file_name);
        if path.exists() {
            status.error(format!("File '{file_name}' already exists"));
            return;
        }
        match store.save_document(&path, &IniDocument::new()) {
            Ok(()) => {
                self.new_file_name.clear();
                if let Err(err) = self.refresh_files(store) {
                    status.error(format!("Failed to rescan pose data: {err:#}"));
                    return;
                }
                self.current_file = Some(path);
                self.doc = IniDocument::new();
                history.clear(EditorTab::PoseData);
                self.select(None);
                status.success(format!("Created '{file_name}'"));
            }
            Err(err) => status.error(format!("Failed to create file: {err:#}")),
        }
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        store: &ConfigStore,
        history: &mut History<EditorTab, TabSnapshot>,
        status: &mut StatusBar,
    ) {
        // File selector row
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Data file:").strong());
            let current_label = self
                .current_file
                .as_deref()
                .and_then(|f| f.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "(none)".to_string());
            let mut switch_to = None;
            egui::ComboBox::from_id_salt("pose_data_file")
                .selected_text(current_label)
                .show_ui(ui, |ui| {
                    for file in &self.files {
                        let label = file
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        let is_current = self.current_file.as_deref() == Some(file.as_path());
                        if ui.selectable_label(is_current, label).clicked() && !is_current {
                            switch_to = Some(file.clone());
                        }
                    }
                });
            if let Some(file) = switch_to {
                match store.load_document(&file) {
                    Ok(doc) => {
                        self.doc = doc;
                        self.current_file = Some(file);
                        // Snapshots from the previous file must not leak in
                        history.clear(EditorTab::PoseData);
                        self.select(None);
                    }
                    Err(err) => status.error(format!("Failed to load file: {err:#}")),
                }
            }

            ui.separator();

            ui.label("New file:");
            ui.add(egui::TextEdit::singleline(&mut self.new_file_name).desired_width(160.0));
            if ui.button("Create").clicked() {
                self.create_file(store, history, status);
            }
        });

        ui.add_space(ITEM_SPACING);
        ui.separator();
        ui.add_space(ITEM_SPACING);

        ui.horizontal_top(|ui| {
            // Section list
            ui.vertical(|ui| {
                ui.set_width(LIST_PANEL_WIDTH);
                ui.label(egui::RichText::new("Settings").strong());
                ui.add_space(ITEM_SPACING);
                egui::ScrollArea::vertical()
                    .id_salt("pose_setting_list")
                    .show(ui, |ui| {
                        let mut clicked = None;
                        for section in self.setting_sections() {
                            let label = section
                                .strip_prefix(sections::POSE_SETTING_PREFIX)
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
                        if self.setting_sections().is_empty() {
                            ui.label(egui::RichText::new("(No settings in this file)").weak().italics());
                        }
                    });
            });

            ui.separator();

            // Detail editor
            ui.vertical(|ui| {
                ui.label(egui::RichText::new("Pose/Scale Setting").strong());
                ui.add_space(ITEM_SPACING);

                egui::Grid::new("pose_data_fields")
                    .num_columns(2)
                    .spacing([ITEM_SPACING, ITEM_SPACING])
                    .show(ui, |ui| {
                        ui.label("Name:");
                        ui.text_edit_singleline(&mut self.suffix);
                        ui.end_row();

                        ui.label("Chara:");
                        ui.text_edit_singleline(&mut self.chara);
                        ui.end_row();

                        ui.label("Module keywords:");
                        ui.text_edit_singleline(&mut self.contains);
                        ui.end_row();

                        ui.label("Pose ID:");
                        ui.text_edit_singleline(&mut self.pose_id);
                        ui.end_row();

                        ui.label("Scale:");
                        ui.text_edit_singleline(&mut self.scale);
                        ui.end_row();
                    });

                ui.label(
                    egui::RichText::new("(Empty Pose ID means scale-only; Scale 1.0 is neutral)")
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
                    ui.label(format!("Delete setting '{name}'?"));
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
