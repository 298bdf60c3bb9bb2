//! Sidebar Widget
//! Left side panel with the page menu, data folder and build status.

use crate::navigation::PageId;
use egui::{Color32, RichText};
use std::path::Path;

/// Status line tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusKind {
    Idle,
    Busy,
    Done,
    Error,
}

pub struct Sidebar {
    pub status: String,
    pub status_kind: StatusKind,
}

impl Default for Sidebar {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
            status_kind: StatusKind::Idle,
        }
    }
}

impl Sidebar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, kind: StatusKind, status: &str) {
        self.status_kind = kind;
        self.status = status.to_string();
    }

    /// Draw the sidebar
    pub fn show(&mut self, ui: &mut egui::Ui, current: PageId, data_dir: &Path) -> SidebarAction {
        let mut action = SidebarAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🚚 Logistics Risk")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Incident dashboard")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Menu =====
        ui.label(RichText::new("📑 Pages").size(14.0).strong());
        ui.add_space(5.0);

        for page in PageId::ALL {
            let selected = page == current;
            let text = RichText::new(page.label()).size(13.0);
            if ui
                .add_sized(
                    [ui.available_width(), 26.0],
                    egui::SelectableLabel::new(selected, text),
                )
                .clicked()
            {
                action = SidebarAction::Select(page);
            }
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Data folder =====
        ui.label(RichText::new("📁 Data Folder").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(
                    RichText::new(data_dir.display().to_string())
                        .size(12.0)
                        .color(if data_dir.is_dir() {
                            ui.visuals().text_color()
                        } else {
                            Color32::GRAY
                        }),
                );
                ui.horizontal(|ui| {
                    if ui.button("📂 Browse").clicked() {
                        action = SidebarAction::BrowseDataDir;
                    }
                    if ui.button("⟳ Reload").clicked() {
                        action = SidebarAction::Reload;
                    }
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            if self.status_kind == StatusKind::Busy {
                ui.spinner();
            }
            let status_color = match self.status_kind {
                StatusKind::Error => Color32::from_rgb(220, 53, 69),
                StatusKind::Done => Color32::from_rgb(40, 167, 69),
                StatusKind::Idle | StatusKind::Busy => Color32::GRAY,
            };
            ui.label(RichText::new(&self.status).size(11.0).color(status_color));
        });

        action
    }
}

/// Actions triggered by the sidebar
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarAction {
    None,
    Select(PageId),
    BrowseDataDir,
    /// Drop cached tables and rebuild the current page
    Reload,
}
