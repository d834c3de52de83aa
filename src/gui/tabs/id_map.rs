//! Pose ID map tab
//!
//! Edits `PoseIDMap.ini`: the `[PoseIDs]` id-to-name table and the
//! `[PoseImages]` id-to-image table with a preview. Removing or replacing an
//! image never deletes it outright; the file is staged in the store's trash
//! and comes back if its reference reappears (undo, reload) before exit.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use eframe::egui;

use crate::constants::{images, sections};
use crate::gui::constants::{IMAGE_PREVIEW_SIZE, ITEM_SPACING, LIST_PANEL_WIDTH, SECTION_SPACING};
use crate::gui::status::StatusBar;
use crate::gui::tabs::{EditorTab, TabSnapshot};
use crate::history::History;
use crate::ini::IniDocument;
use crate::store::ConfigStore;
use crate::text::normalize_text;

pub struct IdMapTab {
    doc: IniDocument,
    selected: Option<String>,
    id_field: String,
    name_field: String,
    textures: HashMap<String, egui::TextureHandle>,
    confirm_delete: bool,
}

/// Image names the map currently references.
pub fn used_images(doc: &IniDocument) -> HashSet<String> {
    doc.entries(sections::POSE_IMAGES)
        .map(|(_, name)| name.to_string())
        .collect()
}

impl IdMapTab {
    pub fn load(store: &ConfigStore) -> Result<Self> {
        let doc = store.load_document(&store.pose_id_map_path())?;
        Ok(Self {
            doc,
            selected: None,
            id_field: String::new(),
            name_field: String::new(),
            textures: HashMap::new(),
            confirm_delete: false,
        })
    }

    pub fn doc(&self) -> &IniDocument {
        &self.doc
    }

    pub fn snapshot(&self) -> TabSnapshot {
        TabSnapshot::new(self.doc.clone(), self.selected.clone())
    }

    /// Restoring a snapshot may bring image references back; reconcile so the
    /// staged files return from the trash.
    pub fn restore(&mut self, snapshot: TabSnapshot, store: &mut ConfigStore) {
        self.doc = snapshot.doc;
        self.select(snapshot.selected);
        store.reconcile_pending(&used_images(&self.doc));
    }

    pub fn reload(&mut self, store: &mut ConfigStore) -> Result<()> {
        self.doc = store.load_document(&store.pose_id_map_path())?;
        let selected = self.selected.take();
        self.select(selected);
        store.reconcile_pending(&used_images(&self.doc));
        self.textures.clear();
        Ok(())
    }

    fn select(&mut self, id: Option<String>) {
        self.selected = id.filter(|id| self.doc.get(sections::POSE_IDS, id).is_some());
        match &self.selected {
            Some(id) => {
                self.id_field = id.clone();
                self.name_field = self
                    .doc
                    .get(sections::POSE_IDS, id)
                    .unwrap_or_default()
                    .to_string();
            }
            None => {
                self.id_field.clear();
                self.name_field.clear();
            }
        }
    }

    fn image_name_for(&self, id: &str) -> Option<String> {
        self.doc
            .get(sections::POSE_IMAGES, id)
            .map(str::to_string)
    }

    pub fn save_entry(
        &mut self,
        store: &ConfigStore,
        history: &mut History<EditorTab, TabSnapshot>,
        status: &mut StatusBar,
    ) {
        let id = normalize_text(&self.id_field);
        if id.is_empty() {
            status.error("Pose ID must not be empty");
            return;
        }
        if id.parse::<u32>().is_err() {
            status.error(format!("Pose ID is not a whole number: '{id}'"));
            return;
        }
        let renaming = self.selected.as_deref().is_some_and(|old| old != id);
        if (renaming || self.selected.is_none()) && self.doc.get(sections::POSE_IDS, &id).is_some() {
            status.error(format!("Pose ID '{id}' already exists"));
            return;
        }

        history.record(EditorTab::IdMap, self.snapshot());

        if renaming
            && let Some(old) = self.selected.clone()
        {
            self.doc.remove(sections::POSE_IDS, &old);
            if let Some(image) = self.doc.get(sections::POSE_IMAGES, &old).map(str::to_string) {
                self.doc.remove(sections::POSE_IMAGES, &old);
                self.doc.set(sections::POSE_IMAGES, &id, image);
            }
        }

        self.name_field = normalize_text(&self.name_field);
        self.doc.set(sections::POSE_IDS, &id, self.name_field.clone());

        match store.save_document(&store.pose_id_map_path(), &self.doc) {
            Ok(()) => {
                self.selected = Some(id.clone());
                status.success(format!("Saved pose '{id}'"));
            }
            Err(err) => status.error(format!("Failed to save pose ID map: {err:#}")),
        }
    }

    fn delete_entry(
        &mut self,
        store: &mut ConfigStore,
        history: &mut History<EditorTab, TabSnapshot>,
        status: &mut StatusBar,
    ) {
        let Some(id) = self.selected.clone() else {
            return;
        };
        history.record(EditorTab::IdMap, self.snapshot());

        if let Some(image) = self.image_name_for(&id) {
            self.doc.remove(sections::POSE_IMAGES, &id);
            if let Err(err) = store.stage_delete(&image) {
                status.warning(format!("Could not stage image for deletion: {err:#}"));
            }
        }
        self.doc.remove(sections::POSE_IDS, &id);

        match store.save_document(&store.pose_id_map_path(), &self.doc) {
            Ok(()) => status.success(format!("Deleted pose '{id}'")),
            Err(err) => status.error(format!("Failed to save pose ID map: {err:#}")),
        }
        self.select(None);
    }

    fn import_image(
        &mut self,
        store: &mut ConfigStore,
        history: &mut History<EditorTab, TabSnapshot>,
        status: &mut StatusBar,
    ) {
        let Some(id) = self.selected.clone() else {
            status.error("Select a pose before importing an image");
            return;
        };
        let Some(source) = rfd::FileDialog::new()
            .add_filter("Images", &images::EXTENSIONS)
            .pick_file()
        else {
            return;
        };

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let target = format!("{id}_{stem}");

        history.record(EditorTab::IdMap, self.snapshot());

        let old_image = self.image_name_for(&id);
        match store.import_image(&source, Some(&target)) {
            Ok(imported) => {
                if let Some(old) = old_image
                    && old != imported
                {
                    // Replaced image goes to the trash, recoverable until exit
                    if let Err(err) = store.stage_delete(&old) {
                        status.warning(format!("Could not stage old image: {err:#}"));
                    }
                }
                self.textures.remove(&imported);
                self.doc.set(sections::POSE_IMAGES, &id, imported.clone());
                match store.save_document(&store.pose_id_map_path(), &self.doc) {
                    Ok(()) => status.success(format!("Imported image '{imported}'")),
                    Err(err) => status.error(format!("Failed to save pose ID map: {err:#}")),
                }
            }
            Err(err) => status.error(format!("Failed to import image: {err:#}")),
        }
    }

    fn remove_image(
        &mut self,
        store: &mut ConfigStore,
        history: &mut History<EditorTab, TabSnapshot>,
        status: &mut StatusBar,
    ) {
        let Some(id) = self.selected.clone() else {
            return;
        };
        let Some(image) = self.image_name_for(&id) else {
            return;
        };
        history.record(EditorTab::IdMap, self.snapshot());
        self.doc.remove(sections::POSE_IMAGES, &id);
        if let Err(err) = store.stage_delete(&image) {
            status.warning(format!("Could not stage image for deletion: {err:#}"));
        }
        match store.save_document(&store.pose_id_map_path(), &self.doc) {
            Ok(()) => status.success(format!("Removed image from pose '{id}'")),
            Err(err) => status.error(format!("Failed to save pose ID map: {err:#}")),
        }
    }

    /// Decode and cache the preview texture. A missing or unreadable file
    /// yields `None` and the caller renders a placeholder.
    fn texture_for(
        &mut self,
        ctx: &egui::Context,
        store: &ConfigStore,
        name: &str,
    ) -> Option<egui::TextureHandle> {
        if let Some(handle) = self.textures.get(name) {
            return Some(handle.clone());
        }
        let path = store.image_path(name)?;
        let decoded = image::open(&path).ok()?.to_rgba8();
        let size = [decoded.width() as usize, decoded.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, decoded.as_raw());
        let handle = ctx.load_texture(name.to_string(), color_image, egui::TextureOptions::LINEAR);
        self.textures.insert(name.to_string(), handle.clone());
        Some(handle)
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        store: &mut ConfigStore,
        history: &mut History<EditorTab, TabSnapshot>,
        status: &mut StatusBar,
    ) {
        ui.horizontal_top(|ui| {
            // ID list
            ui.vertical(|ui| {
                ui.set_width(LIST_PANEL_WIDTH);
                ui.label(egui::RichText::new("Pose IDs").strong());
                ui.add_space(ITEM_SPACING);
                egui::ScrollArea::vertical().id_salt("pose_id_list").show(ui, |ui| {
                    let entries: Vec<(String, String)> = self
                        .doc
                        .entries(sections::POSE_IDS)
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect();
                    let mut clicked = None;
                    for (id, name) in &entries {
                        let label = if name.is_empty() {
                            id.clone()
                        } else {
                            format!("{id} — {name}")
                        };
                        let is_selected = self.selected.as_deref() == Some(id.as_str());
                        if ui.selectable_label(is_selected, label).clicked() {
                            clicked = Some(id.clone());
                        }
                    }
                    if let Some(id) = clicked {
                        self.select(Some(id));
                    }
                    if entries.is_empty() {
                        ui.label(egui::RichText::new("(No pose IDs yet)").weak().italics());
                    }
                });
            });

            ui.separator();

            // Detail editor with preview
            ui.vertical(|ui| {
                ui.label(egui::RichText::new("Pose Entry").strong());
                ui.add_space(ITEM_SPACING);

                egui::Grid::new("id_map_fields")
                    .num_columns(2)
                    .spacing([ITEM_SPACING, ITEM_SPACING])
                    .show(ui, |ui| {
                        ui.label("Pose ID:");
                        ui.text_edit_singleline(&mut self.id_field);
                        ui.end_row();

                        ui.label("Display name:");
                        ui.text_edit_singleline(&mut self.name_field);
                        ui.end_row();
                    });

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

                ui.add_space(SECTION_SPACING);
                ui.separator();
                ui.add_space(ITEM_SPACING);

                ui.label(egui::RichText::new("Preview Image").strong());
                ui.add_space(ITEM_SPACING);

                // Mapped image first, otherwise fall back to a file named
                // `<id>_*` dropped into the image directory by hand.
                let image_name = self.selected.as_ref().and_then(|id| {
                    self.image_name_for(id).or_else(|| {
                        store
                            .find_image_for_pose(id)
                            .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
                    })
                });
                match &image_name {
                    Some(name) => {
                        match self.texture_for(ui.ctx(), store, name) {
                            Some(texture) => {
                                ui.add(
                                    egui::Image::new(&texture)
                                        .max_size(egui::vec2(IMAGE_PREVIEW_SIZE, IMAGE_PREVIEW_SIZE)),
                                );
                            }
                            None => {
                                ui.label(
                                    egui::RichText::new(format!("(Image '{name}' not found)"))
                                        .weak()
                                        .italics(),
                                );
                            }
                        }
                        ui.label(egui::RichText::new(name).small().weak());
                    }
                    None => {
                        ui.label(egui::RichText::new("(No image assigned)").weak().italics());
                    }
                }

                ui.add_space(ITEM_SPACING);
                ui.horizontal(|ui| {
                    if ui.button("📂 Import Image…").clicked() {
                        self.import_image(store, history, status);
                    }
                    if image_name.is_some() && ui.button("Remove Image").clicked() {
                        self.remove_image(store, history, status);
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
                    let id = self.selected.clone().unwrap_or_default();
                    ui.label(format!("Delete pose '{id}' and stage its image for deletion?"));
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
