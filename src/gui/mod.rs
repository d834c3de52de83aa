//! Editor GUI implemented with egui/eframe
//!
//! Single window with a toolbar (undo/redo, reload, release notice), a tab
//! strip over the config editors and a timed status bar. The release poll
//! runs once on a background thread and reports through an mpsc channel;
//! everything else is synchronous UI state.

pub mod constants;
pub mod status;
pub mod tabs;

use std::collections::HashSet;
use std::sync::mpsc;
use std::thread;

use anyhow::{Result, anyhow};
use eframe::{CreationContext, NativeOptions, egui};
use tracing::{error, info, warn};

use crate::constants::{PROJECT_URL, app, update as update_cfg};
use crate::history::History;
use crate::ini::IniDocument;
use crate::keymap::{Action, KeyMap};
use crate::restart;
use crate::settings::{self, AppSettings};
use crate::store::ConfigStore;
use crate::update;

use constants::{ITEM_SPACING, WINDOW_MIN_HEIGHT, WINDOW_MIN_WIDTH};
use status::StatusBar;
use tabs::general::{GeneralAction, GeneralTab};
use tabs::id_map::{IdMapTab, used_images};
use tabs::keymap::KeyMapTab;
use tabs::pose_data::PoseDataTab;
use tabs::profiles::ProfilesTab;
use tabs::{EditorTab, TabSnapshot};

struct UpdateNotice {
    version: String,
    url: String,
}

pub struct EditorApp {
    store: ConfigStore,
    main_doc: IniDocument,
    settings: AppSettings,
    keymap: KeyMap,
    history: History<EditorTab, TabSnapshot>,
    active_tab: EditorTab,
    status: StatusBar,

    general: GeneralTab,
    profiles: ProfilesTab,
    pose_data: PoseDataTab,
    id_map: IdMapTab,
    keymap_tab: KeyMapTab,

    update_rx: mpsc::Receiver<UpdateNotice>,
    update_notice: Option<UpdateNotice>,
    window_size: (f32, f32),
}

impl EditorApp {
    fn new(_cc: &CreationContext<'_>, store: ConfigStore) -> Result<Self> {
        info!("Initializing editor");

        let main_doc = store.load_document(&store.main_config_path())?;
        let settings = AppSettings::from_doc(&main_doc);
        let keymap = KeyMap::load(&store)?;
        let history = History::new(settings.debug.history_limit);

        let profiles = ProfilesTab::load(&store)?;
        let pose_data = PoseDataTab::load(&store)?;
        let id_map = IdMapTab::load(&store)?;
        let window_size = settings::window_size(&main_doc);

        // One-shot release poll off the UI thread; result lands in update()
        let (tx, update_rx) = mpsc::channel();
        let status_path = store.update_status_path();
        thread::spawn(move || {
            let status = update::check_update(&status_path, app::EDITOR_TOOL, app::VERSION, false);
            if let Some(version) = update::update_available(&status, app::EDITOR_TOOL) {
                let _ = tx.send(UpdateNotice {
                    version,
                    url: status.release_url,
                });
            }
        });

        Ok(Self {
            store,
            main_doc,
            settings,
            keymap,
            history,
            active_tab: EditorTab::General,
            status: StatusBar::default(),
            general: GeneralTab,
            profiles,
            pose_data,
            id_map,
            keymap_tab: KeyMapTab::default(),
            update_rx,
            update_notice: None,
            window_size,
        })
    }

    fn visible_tabs(&self) -> Vec<EditorTab> {
        let mut tabs = vec![
            EditorTab::General,
            EditorTab::Profiles,
            EditorTab::PoseData,
            EditorTab::IdMap,
        ];
        if self.settings.debug.show_debug {
            tabs.push(EditorTab::KeyMap);
        }
        tabs
    }

    /// Keep the active tab valid when the key map tab gets hidden.
    fn ensure_visible_tab(&mut self) {
        if self.active_tab == EditorTab::KeyMap && !self.settings.debug.show_debug {
            self.active_tab = EditorTab::General;
            self.keymap_tab.cancel_capture();
        }
    }

    /// First bound action whose chord was pressed this frame. Shortcuts are
    /// suspended on the key map tab so chord capture cannot trigger them.
    fn pressed_action(&self, ctx: &egui::Context) -> Option<Action> {
        if self.active_tab == EditorTab::KeyMap {
            return None;
        }
        Action::ALL
            .into_iter()
            .find(|&action| self.keymap.consume(ctx, action))
    }

    fn dispatch(&mut self, action: Action, ctx: &egui::Context) {
        info!(action = action.key_name(), "Shortcut action");
        match action {
            Action::SaveCurrentTab => self.save_current_tab(),
            Action::SaveAndExit => {
                self.save_current_tab();
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            Action::ExitNoSave => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            Action::RestartNoSave => {
                self.relaunch_and_close(ctx);
            }
            Action::SaveAndRestart => {
                self.save_current_tab();
                self.relaunch_and_close(ctx);
            }
            Action::Undo => self.undo(),
            Action::Redo => self.redo(),
            Action::ToggleDebugSettings => {
                self.settings.debug.show_debug = !self.settings.debug.show_debug;
                self.ensure_visible_tab();
                self.status.info(if self.settings.debug.show_debug {
                    "Debug settings shown"
                } else {
                    "Debug settings hidden"
                });
            }
        }
    }

    fn relaunch_and_close(&mut self, ctx: &egui::Context) {
        match restart::relaunch() {
            Ok(()) => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
            Err(err) => {
                error!(error = ?err, "Restart failed");
                self.status.error(format!("Restart failed: {err:#}"));
            }
        }
    }

    fn save_current_tab(&mut self) {
        match self.active_tab {
            EditorTab::General => self.save_general(),
            EditorTab::Profiles => {
                self.profiles
                    .save_entry(&self.store, &mut self.history, &mut self.status);
            }
            EditorTab::PoseData => {
                self.pose_data
                    .save_entry(&self.store, &mut self.history, &mut self.status);
            }
            EditorTab::IdMap => {
                self.id_map
                    .save_entry(&self.store, &mut self.history, &mut self.status);
            }
            // Key map edits save themselves on every rebind
            EditorTab::KeyMap => {}
        }
    }

    fn save_general(&mut self) {
        self.history.record(
            EditorTab::General,
            TabSnapshot::new(self.main_doc.clone(), None),
        );
        self.settings.apply(&mut self.main_doc);
        match self
            .store
            .save_document(&self.store.main_config_path(), &self.main_doc)
        {
            Ok(()) => self.status.success("Saved settings"),
            Err(err) => self.status.error(format!("Failed to save settings: {err:#}")),
        }
        self.history.set_limit(self.settings.debug.history_limit);
        self.ensure_visible_tab();
    }

    fn undo(&mut self) {
        let tab = self.active_tab;
        let restored = match tab {
            EditorTab::General => {
                let current = TabSnapshot::new(self.main_doc.clone(), None);
                match self.history.undo(tab, current) {
                    Some(snapshot) => {
                        self.main_doc = snapshot.doc;
                        self.settings = AppSettings::from_doc(&self.main_doc);
                        self.history.set_limit(self.settings.debug.history_limit);
                        self.ensure_visible_tab();
                        true
                    }
                    None => false,
                }
            }
            EditorTab::Profiles => match self.history.undo(tab, self.profiles.snapshot()) {
                Some(snapshot) => {
                    self.profiles.restore(snapshot);
                    true
                }
                None => false,
            },
            EditorTab::PoseData => match self.history.undo(tab, self.pose_data.snapshot()) {
                Some(snapshot) => {
                    self.pose_data.restore(snapshot);
                    true
                }
                None => false,
            },
            EditorTab::IdMap => match self.history.undo(tab, self.id_map.snapshot()) {
                Some(snapshot) => {
                    self.id_map.restore(snapshot, &mut self.store);
                    true
                }
                None => false,
            },
            EditorTab::KeyMap => false,
        };
        if restored {
            self.status.info("Undid last change (save to persist)");
        }
    }

    fn redo(&mut self) {
        let tab = self.active_tab;
        let restored = match tab {
            EditorTab::General => {
                let current = TabSnapshot::new(self.main_doc.clone(), None);
                match self.history.redo(tab, current) {
                    Some(snapshot) => {
                        self.main_doc = snapshot.doc;
                        self.settings = AppSettings::from_doc(&self.main_doc);
                        self.history.set_limit(self.settings.debug.history_limit);
                        self.ensure_visible_tab();
                        true
                    }
                    None => false,
                }
            }
            EditorTab::Profiles => match self.history.redo(tab, self.profiles.snapshot()) {
                Some(snapshot) => {
                    self.profiles.restore(snapshot);
                    true
                }
                None => false,
            },
            EditorTab::PoseData => match self.history.redo(tab, self.pose_data.snapshot()) {
                Some(snapshot) => {
                    self.pose_data.restore(snapshot);
                    true
                }
                None => false,
            },
            EditorTab::IdMap => match self.history.redo(tab, self.id_map.snapshot()) {
                Some(snapshot) => {
                    self.id_map.restore(snapshot, &mut self.store);
                    true
                }
                None => false,
            },
            EditorTab::KeyMap => false,
        };
        if restored {
            self.status.info("Redid change (save to persist)");
        }
    }

    /// Reload the active tab from disk. The pre-reload state is recorded, so
    /// an accidental reload is undoable.
    fn reload_current_tab(&mut self) {
        match self.active_tab {
            EditorTab::General => {
                self.history.record(
                    EditorTab::General,
                    TabSnapshot::new(self.main_doc.clone(), None),
                );
                match self.store.load_document(&self.store.main_config_path()) {
                    Ok(doc) => {
                        self.main_doc = doc;
                        self.settings = AppSettings::from_doc(&self.main_doc);
                        self.history.set_limit(self.settings.debug.history_limit);
                        self.ensure_visible_tab();
                        self.status.info("Reloaded settings from disk");
                    }
                    Err(err) => self.status.error(format!("Reload failed: {err:#}")),
                }
            }
            EditorTab::Profiles => {
                self.history.record(EditorTab::Profiles, self.profiles.snapshot());
                match self.profiles.reload(&self.store) {
                    Ok(()) => self.status.info("Reloaded profiles from disk"),
                    Err(err) => self.status.error(format!("Reload failed: {err:#}")),
                }
            }
            EditorTab::PoseData => {
                self.history.record(EditorTab::PoseData, self.pose_data.snapshot());
                match self.pose_data.refresh_files(&self.store) {
                    Ok(()) => self.status.info("Rescanned pose data files"),
                    Err(err) => self.status.error(format!("Reload failed: {err:#}")),
                }
            }
            EditorTab::IdMap => {
                self.history.record(EditorTab::IdMap, self.id_map.snapshot());
                match self.id_map.reload(&mut self.store) {
                    Ok(()) => self.status.info("Reloaded pose ID map from disk"),
                    Err(err) => self.status.error(format!("Reload failed: {err:#}")),
                }
            }
            EditorTab::KeyMap => match KeyMap::load(&self.store) {
                Ok(keymap) => {
                    self.keymap = keymap;
                    self.keymap_tab.cancel_capture();
                    self.status.info("Reloaded key map from disk");
                }
                Err(err) => self.status.error(format!("Reload failed: {err:#}")),
            },
        }
    }

    /// Window geometry goes into a freshly loaded document so unsaved tab
    /// edits are not flushed to disk as a side effect of closing.
    fn save_geometry(&mut self) {
        let (width, height) = self.window_size;
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        match self.store.load_document(&self.store.main_config_path()) {
            Ok(mut doc) => {
                settings::set_window_size(&mut doc, width, height);
                if let Err(err) = self
                    .store
                    .save_document(&self.store.main_config_path(), &doc)
                {
                    error!(error = ?err, "Failed to save window geometry");
                } else {
                    info!(width = width as u32, height = height as u32, "Saved window geometry");
                }
            }
            Err(err) => {
                error!(error = ?err, "Skipping geometry save, config not readable");
            }
        }
    }

    fn toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(2.0);
            ui.horizontal(|ui| {
                let can_undo = self.history.can_undo(self.active_tab);
                if ui.add_enabled(can_undo, egui::Button::new("⮪ Undo")).clicked() {
                    self.undo();
                }
                let can_redo = self.history.can_redo(self.active_tab);
                if ui.add_enabled(can_redo, egui::Button::new("⮫ Redo")).clicked() {
                    self.redo();
                }

                ui.separator();

                if ui.button("🔄 Reload Tab").clicked() {
                    self.reload_current_tab();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("GitHub").clicked()
                        && let Err(err) = open::that(PROJECT_URL)
                    {
                        error!(error = %err, "Failed to open project page");
                    }
                    if let Some(notice) = &self.update_notice
                        && ui
                            .button(format!("⬆ Update available: {}", notice.version))
                            .clicked()
                    {
                        let url = if notice.url.is_empty() {
                            format!(
                                "https://github.com/{}/{}/releases",
                                update_cfg::REPO_OWNER,
                                update_cfg::REPO_NAME
                            )
                        } else {
                            notice.url.clone()
                        };
                        if let Err(err) = open::that(url) {
                            error!(error = %err, "Failed to open release page");
                        }
                    }
                });
            });
            ui.add_space(2.0);
        });
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Ok(notice) = self.update_rx.try_recv() {
            info!(version = %notice.version, "Release notice received");
            self.update_notice = Some(notice);
        }

        let size = ctx.input(|input| input.screen_rect().size());
        self.window_size = (size.x, size.y);

        if let Some(action) = self.pressed_action(ctx) {
            self.dispatch(action, ctx);
        }

        self.toolbar(ctx);

        egui::TopBottomPanel::bottom("statusbar").show(ctx, |ui| {
            self.status.ui(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                for tab in self.visible_tabs() {
                    if ui
                        .selectable_label(self.active_tab == tab, tab.title())
                        .clicked()
                    {
                        self.active_tab = tab;
                    }
                }
            });
            ui.separator();
            ui.add_space(ITEM_SPACING);

            egui::ScrollArea::vertical().show(ui, |ui| {
                match self.active_tab {
                    EditorTab::General => {
                        if self.general.ui(ui, &mut self.settings) == GeneralAction::Save {
                            self.save_general();
                        }
                    }
                    EditorTab::Profiles => {
                        self.profiles
                            .ui(ui, &self.store, &mut self.history, &mut self.status);
                    }
                    EditorTab::PoseData => {
                        self.pose_data
                            .ui(ui, &self.store, &mut self.history, &mut self.status);
                    }
                    EditorTab::IdMap => {
                        self.id_map
                            .ui(ui, &mut self.store, &mut self.history, &mut self.status);
                    }
                    EditorTab::KeyMap => {
                        self.keymap_tab
                            .ui(ui, &mut self.keymap, &self.store, &mut self.status);
                    }
                }
            });
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.save_geometry();

        // Resolve staged image deletes against everything still referenced:
        // the in-memory map (covers un-saved undos) and the map on disk.
        if self.store.has_pending_deletes() {
            info!("Resolving staged image deletes");
        }
        let mut used: HashSet<String> = used_images(self.id_map.doc());
        match self.store.load_document(&self.store.pose_id_map_path()) {
            Ok(doc) => used.extend(used_images(&doc)),
            Err(err) => warn!(error = ?err, "Could not reload pose ID map during shutdown"),
        }
        self.store.finalize_pending(&used);

        info!("Editor exiting");
    }
}

pub fn run_editor(store: ConfigStore) -> Result<()> {
    let main_doc = store.load_document(&store.main_config_path())?;
    let (width, height) = settings::window_size(&main_doc);
    let title = format!("Pose Scale Config Editor - {}", app::VERSION);

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_title(title.clone()),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(EditorApp::new(cc, store)?))),
    )
    .map_err(|err| anyhow!("Failed to launch editor window: {err}"))
}
