//! Page Viewer Widget
//! Central scrollable panel: KPI cards, tab selector, section cards and summary.

use crate::charts::{ChartPlotter, ACCENT_COLOR, WARNING_COLOR};
use crate::page::{Kpi, Page, Section};
use egui::{Color32, RichText, ScrollArea};

const CARD_SPACING: f32 = 15.0;
const KPI_WIDTH: f32 = 200.0;

#[derive(Default)]
pub struct PageViewer {
    page: Option<Page>,
    error: Option<String>,
    selected_tab: usize,
}

impl PageViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the shown page; tab selection does not carry over.
    pub fn set_page(&mut self, page: Page) {
        self.page = Some(page);
        self.error = None;
        self.selected_tab = 0;
    }

    pub fn set_error(&mut self, error: String) {
        self.page = None;
        self.error = Some(error);
        self.selected_tab = 0;
    }

    pub fn clear(&mut self) {
        self.page = None;
        self.error = None;
        self.selected_tab = 0;
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        if let Some(error) = &self.error {
            ui.centered_and_justified(|ui| {
                ui.label(
                    RichText::new(format!("Page unavailable\n\n{}", error))
                        .size(16.0)
                        .color(Color32::from_rgb(220, 53, 69)),
                );
            });
            return;
        }

        let Some(page) = &self.page else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        let selected_tab = &mut self.selected_tab;
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(RichText::new(&page.title).size(22.0).strong());
                ui.add_space(6.0);
                for paragraph in &page.context {
                    ui.label(RichText::new(paragraph).size(12.0).color(Color32::GRAY));
                }
                ui.add_space(CARD_SPACING);

                ui.horizontal_wrapped(|ui| {
                    for kpi in &page.kpis {
                        Self::draw_kpi(ui, kpi);
                        ui.add_space(8.0);
                    }
                });
                ui.add_space(CARD_SPACING);

                if let Some(preview) = &page.preview {
                    egui::CollapsingHeader::new(format!(
                        "Dataset preview ({} rows)",
                        preview.rows.len()
                    ))
                    .id_salt(format!("preview_{}", page.id))
                    .default_open(false)
                    .show(ui, |ui| {
                        ChartPlotter::draw_table(ui, &format!("{}_preview", page.id), preview);
                    });
                    ui.add_space(CARD_SPACING);
                }

                if page.tabs.len() > 1 {
                    ui.horizontal(|ui| {
                        for (i, tab) in page.tabs.iter().enumerate() {
                            ui.selectable_value(
                                selected_tab,
                                i,
                                RichText::new(&tab.title).size(14.0),
                            );
                        }
                    });
                    ui.separator();
                }

                if let Some(tab) = page.tabs.get(*selected_tab) {
                    for (i, section) in tab.sections.iter().enumerate() {
                        let id = format!("{}_{}_{}", page.id, *selected_tab, i);
                        Self::draw_section_card(ui, &id, section);
                        ui.add_space(CARD_SPACING);
                    }
                }

                if !page.summary.is_empty() {
                    ui.separator();
                    ui.label(RichText::new("Summary").size(16.0).strong());
                    ui.add_space(4.0);
                    for line in &page.summary {
                        ui.label(RichText::new(format!("• {}", line)).size(13.0));
                    }
                }
            });
    }

    fn draw_kpi(ui: &mut egui::Ui, kpi: &Kpi) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.5, ACCENT_COLOR))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_width(KPI_WIDTH);
                ui.vertical(|ui| {
                    ui.label(RichText::new(&kpi.label).size(11.0).color(Color32::GRAY));
                    ui.label(RichText::new(&kpi.value).size(18.0).strong());
                });
            });
    }

    fn draw_section_card(ui: &mut egui::Ui, id: &str, section: &Section) {
        let border_color = if section.is_warning() {
            WARNING_COLOR
        } else {
            ui.visuals().widgets.noninteractive.bg_stroke.color
        };

        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.5, border_color))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(&section.title).size(16.0).strong());
                ui.add_space(8.0);
                ChartPlotter::draw(ui, id, &section.content);
                if let Some(caption) = &section.caption {
                    ui.add_space(6.0);
                    ui.label(RichText::new(caption).size(11.0).color(Color32::GRAY));
                }
            });
    }
}
