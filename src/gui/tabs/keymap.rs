//! Key binding tab (visible only with debug settings enabled)
//!
//! Lists every action with its chord and lets the user rebind by pressing
//! the next chord. While this tab is active the global shortcuts are
//! suspended by the app so capturing a chord cannot also trigger it.

use eframe::egui;

use crate::gui::constants::{ITEM_SPACING, SECTION_SPACING};
use crate::gui::status::StatusBar;
use crate::keymap::{Action, KeyMap, format_chord};
use crate::store::ConfigStore;

#[derive(Default)]
pub struct KeyMapTab {
    capturing: Option<Action>,
}

impl KeyMapTab {
    pub fn cancel_capture(&mut self) {
        self.capturing = None;
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        keymap: &mut KeyMap,
        store: &ConfigStore,
        status: &mut StatusBar,
    ) {
        ui.label(egui::RichText::new("Keyboard Shortcuts").heading().strong());
        ui.add_space(ITEM_SPACING);
        ui.label(
            egui::RichText::new("(Click Rebind, then press the new chord. Esc cancels.)")
                .small()
                .italics(),
        );
        ui.add_space(SECTION_SPACING);

        // Chord capture happens before drawing so the row shows the result
        if let Some(action) = self.capturing
            && let Some(captured) = capture_chord(ui.ctx())
        {
            match captured {
                Captured::Cancel => {
                    self.capturing = None;
                    status.info("Rebind cancelled");
                }
                Captured::Chord(chord) => {
                    keymap.set_chord(action, chord.clone());
                    match keymap.save(store) {
                        Ok(()) => status.success(format!("Bound {} to {chord}", action.label())),
                        Err(err) => status.error(format!("Failed to save key map: {err:#}")),
                    }
                    self.capturing = None;
                }
            }
        }

        egui::Grid::new("keymap_rows")
            .num_columns(3)
            .spacing([SECTION_SPACING, ITEM_SPACING])
            .show(ui, |ui| {
                for action in Action::ALL {
                    ui.label(action.label());

                    if self.capturing == Some(action) {
                        ui.label(egui::RichText::new("Press a chord…").italics());
                    } else {
                        let chord = keymap.chord(action);
                        if chord.is_empty() {
                            ui.label(egui::RichText::new("(unbound)").weak());
                        } else {
                            ui.monospace(chord);
                        }
                    }

                    ui.horizontal(|ui| {
                        if ui.button("Rebind").clicked() {
                            self.capturing = Some(action);
                        }
                        if ui.button("Clear").clicked() {
                            keymap.set_chord(action, String::new());
                            if let Err(err) = keymap.save(store) {
                                status.error(format!("Failed to save key map: {err:#}"));
                            } else {
                                status.info(format!("Unbound {}", action.label()));
                            }
                            if self.capturing == Some(action) {
                                self.capturing = None;
                            }
                        }
                    });
                    ui.end_row();
                }
            });

        ui.add_space(SECTION_SPACING);

        if ui.button("Reset to defaults").clicked() {
            for action in Action::ALL {
                keymap.set_chord(action, action.default_chord().to_string());
            }
            match keymap.save(store) {
                Ok(()) => status.success("Restored default shortcuts"),
                Err(err) => status.error(format!("Failed to save key map: {err:#}")),
            }
            self.capturing = None;
        }
    }
}

enum Captured {
    Chord(String),
    Cancel,
}

/// First key press this frame, combined with the live modifiers. Pure
/// modifier presses do not surface as `Event::Key`, so any hit is a real
/// chord terminator.
fn capture_chord(ctx: &egui::Context) -> Option<Captured> {
    ctx.input(|input| {
        for event in &input.events {
            if let egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } = event
            {
                if *key == egui::Key::Escape {
                    return Some(Captured::Cancel);
                }
                let shortcut = egui::KeyboardShortcut::new(*modifiers, *key);
                return Some(Captured::Chord(format_chord(&shortcut)));
            }
        }
        None
    })
}
