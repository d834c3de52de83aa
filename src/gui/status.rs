//! Status bar
//!
//! Non-fatal feedback goes through a timed message strip at the bottom of
//! the window instead of dialog popups; a new message replaces the previous
//! one and everything clears itself after a few seconds.

use std::time::{Duration, Instant};

use eframe::egui;

use crate::gui::constants::{STATUS_DURATION_MS, STATUS_ERROR, STATUS_INFO, STATUS_SUCCESS, STATUS_WARNING};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

impl StatusKind {
    fn color(self) -> egui::Color32 {
        match self {
            StatusKind::Info => STATUS_INFO,
            StatusKind::Success => STATUS_SUCCESS,
            StatusKind::Warning => STATUS_WARNING,
            StatusKind::Error => STATUS_ERROR,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            StatusKind::Info => "ℹ",
            StatusKind::Success => "✔",
            StatusKind::Warning => "⚠",
            StatusKind::Error => "✖",
        }
    }
}

#[derive(Default)]
pub struct StatusBar {
    message: Option<(StatusKind, String, Instant)>,
}

impl StatusBar {
    pub fn set(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.message = Some((kind, text.into(), Instant::now()));
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.set(StatusKind::Info, text);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.set(StatusKind::Success, text);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.set(StatusKind::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.set(StatusKind::Error, text);
    }

    pub fn ui(&mut self, ui: &mut egui::Ui) {
        if let Some((_, _, shown_at)) = &self.message
            && shown_at.elapsed() > Duration::from_millis(STATUS_DURATION_MS)
        {
            self.message = None;
        }
        match &self.message {
            Some((kind, text, _)) => {
                ui.colored_label(kind.color(), format!("{} {}", kind.icon(), text));
                // Keep repainting so the message clears without input
                ui.ctx()
                    .request_repaint_after(Duration::from_millis(STATUS_DURATION_MS / 4));
            }
            None => {
                ui.label("");
            }
        }
    }
}
