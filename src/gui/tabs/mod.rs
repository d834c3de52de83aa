//! Editor tabs
//!
//! Each tab is a self-contained component: a struct holding its widget state
//! plus a `ui` method that renders into the given `egui::Ui` and reports what
//! the caller has to do. Undo/redo snapshots are exchanged through
//! [`TabSnapshot`].

pub mod general;
pub mod id_map;
pub mod keymap;
pub mod pose_data;
pub mod profiles;

use crate::ini::IniDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorTab {
    General,
    Profiles,
    PoseData,
    IdMap,
    KeyMap,
}

impl EditorTab {
    pub fn title(self) -> &'static str {
        match self {
            EditorTab::General => "General",
            EditorTab::Profiles => "Profiles",
            EditorTab::PoseData => "Pose Data",
            EditorTab::IdMap => "ID Map",
            EditorTab::KeyMap => "Key Map",
        }
    }
}

/// State exchanged with the undo/redo history: the backing document plus the
/// tab's selection, so undo restores both data and what was highlighted.
#[derive(Debug, Clone, PartialEq)]
pub struct TabSnapshot {
    pub doc: IniDocument,
    pub selected: Option<String>,
}

impl TabSnapshot {
    pub fn new(doc: IniDocument, selected: Option<String>) -> Self {
        Self { doc, selected }
    }
}
