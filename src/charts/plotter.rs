//! Chart Plotter Module
//! Draws page sections as interactive egui_plot charts and colored grids.

use crate::page::{
    BarChart, BoxChart, Content, GeoPoints, Heatmap, HistogramChart, LineChart, TableView,
};
use crate::stats::CorrelationMatrix;
use egui::{Align2, Color32, FontId, RichText, ScrollArea, Sense};
use egui_plot::{
    Bar, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoint, PlotPoints,
    Points, Text,
};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

pub const ACCENT_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(231, 76, 60),  // Red
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(155, 89, 182), // Purple
    Color32::from_rgb(243, 156, 18), // Orange
    Color32::from_rgb(26, 188, 156), // Teal
    Color32::from_rgb(233, 30, 99),  // Pink
    Color32::from_rgb(0, 188, 212),  // Cyan
    Color32::from_rgb(255, 87, 34),  // Deep Orange
    Color32::from_rgb(121, 85, 72),  // Brown
    Color32::from_rgb(96, 125, 139), // Blue Grey
];

pub const WARNING_COLOR: Color32 = Color32::from_rgb(230, 126, 34);

const PLOT_HEIGHT: f32 = 320.0;
const CELL_SIZE: [f32; 2] = [64.0, 22.0];
const TABLE_HEIGHT: f32 = 280.0;

/// Draws page content using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn series_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Sequential light-yellow to dark-red scale, `t` in [0, 1].
    pub fn heat_color(t: f64) -> Color32 {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color32::from_rgb(lerp(255, 189), lerp(255, 0), lerp(204, 38))
    }

    /// Diverging blue-white-red scale for correlations in [-1, 1].
    pub fn correlation_color(r: f64) -> Color32 {
        if !r.is_finite() {
            return Color32::from_gray(200);
        }
        let t = r.clamp(-1.0, 1.0);
        let fade = |c: u8, w: f64| (255.0 + (c as f64 - 255.0) * w).round() as u8;
        if t >= 0.0 {
            Color32::from_rgb(fade(178, t), fade(24, t), fade(43, t))
        } else {
            Color32::from_rgb(fade(33, -t), fade(102, -t), fade(172, -t))
        }
    }

    /// Tick label for a categorical axis: only integer positions get text.
    fn category_label(labels: &[String], value: f64) -> String {
        if (value - value.round()).abs() > 1e-6 || value < 0.0 {
            return String::new();
        }
        labels.get(value.round() as usize).cloned().unwrap_or_default()
    }

    /// Draw one section body.
    pub fn draw(ui: &mut egui::Ui, id: &str, content: &Content) {
        match content {
            Content::Bars(chart) | Content::Shares(chart) => Self::draw_bars(ui, id, chart),
            Content::Lines(chart) => Self::draw_lines(ui, id, chart),
            Content::Histogram(chart) => Self::draw_histogram(ui, id, chart),
            Content::Heatmap(heatmap) => Self::draw_heatmap(ui, id, heatmap),
            Content::Correlation(matrix) => Self::draw_correlation(ui, id, matrix),
            Content::Boxes(chart) => Self::draw_boxes(ui, id, chart),
            Content::Geo(points) => Self::draw_geo(ui, id, points),
            Content::Table(table) => Self::draw_table(ui, id, table),
            Content::Warning(message) => {
                ui.label(
                    RichText::new(format!("⚠ {}", message))
                        .size(13.0)
                        .color(WARNING_COLOR),
                );
            }
        }
    }

    pub fn draw_bars(ui: &mut egui::Ui, id: &str, chart: &BarChart) {
        if chart.bars.is_empty() {
            ui.label(RichText::new("No data").color(Color32::GRAY));
            return;
        }

        let n = chart.bars.len();
        // Horizontal bars list the first item at the top
        let position = |i: usize| {
            if chart.horizontal {
                (n - 1 - i) as f64
            } else {
                i as f64
            }
        };
        let mut labels = vec![String::new(); n];
        for (i, bar) in chart.bars.iter().enumerate() {
            labels[position(i) as usize] = bar.label.clone();
        }

        let bars: Vec<Bar> = chart
            .bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                Bar::new(position(i), bar.value)
                    .width(0.7)
                    .name(&bar.label)
                    .fill(Self::series_color(i).gamma_multiply(0.8))
            })
            .collect();

        let mut plot = Plot::new(format!("bars_{}", id))
            .height(PLOT_HEIGHT)
            .allow_scroll(false);
        let category_axis = move |mark: GridMark, _range: &RangeInclusive<f64>| {
            Self::category_label(&labels, mark.value)
        };
        if chart.horizontal {
            plot = plot
                .x_axis_label(chart.y_label.clone())
                .y_axis_label(chart.x_label.clone())
                .y_axis_formatter(category_axis);
        } else {
            plot = plot
                .x_axis_label(chart.x_label.clone())
                .y_axis_label(chart.y_label.clone())
                .x_axis_formatter(category_axis);
        }

        plot.show(ui, |plot_ui| {
            let mut bar_chart = egui_plot::BarChart::new(bars).color(ACCENT_COLOR);
            if chart.horizontal {
                bar_chart = bar_chart.horizontal();
            }
            plot_ui.bar_chart(bar_chart);

            for (i, bar) in chart.bars.iter().enumerate() {
                if let Some(text) = &bar.text {
                    let (point, anchor) = if chart.horizontal {
                        (PlotPoint::new(bar.value, position(i)), Align2::LEFT_CENTER)
                    } else {
                        (PlotPoint::new(position(i), bar.value), Align2::CENTER_BOTTOM)
                    };
                    plot_ui.text(
                        Text::new(point, RichText::new(text).size(11.0)).anchor(anchor),
                    );
                }
            }
        });
    }

    pub fn draw_lines(ui: &mut egui::Ui, id: &str, chart: &LineChart) {
        let percent = chart.percent;
        let mut plot = Plot::new(format!("lines_{}", id))
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .x_axis_label(chart.x_label.clone())
            .y_axis_label(chart.y_label.clone())
            .y_axis_formatter(move |mark, _range| {
                if percent {
                    format!("{:.0}%", mark.value * 100.0)
                } else {
                    format!("{}", mark.value)
                }
            });
        if chart.series.len() > 1 {
            plot = plot.legend(Legend::default());
        }
        if let Some(ticks) = chart.x_ticks.clone() {
            plot = plot
                .x_axis_formatter(move |mark, _range| Self::category_label(&ticks, mark.value));
        }

        plot.show(ui, |plot_ui| {
            for (i, series) in chart.series.iter().enumerate() {
                let color = Self::series_color(i);
                plot_ui.line(
                    Line::new(PlotPoints::from(series.points.clone()))
                        .color(color)
                        .width(2.0)
                        .name(&series.name),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(series.points.clone()))
                        .radius(3.0)
                        .color(color),
                );
            }
        });
    }

    pub fn draw_histogram(ui: &mut egui::Ui, id: &str, chart: &HistogramChart) {
        let histogram = &chart.histogram;
        if histogram.counts.is_empty() {
            ui.label(RichText::new("No data").color(Color32::GRAY));
            return;
        }

        let log_y = chart.log_y;
        let bars: Vec<Bar> = histogram
            .counts
            .iter()
            .zip(histogram.edges.windows(2))
            .map(|(&count, edge)| {
                let height = if log_y {
                    (count as f64 + 1.0).log10()
                } else {
                    count as f64
                };
                Bar::new((edge[0] + edge[1]) / 2.0, height)
                    .width(edge[1] - edge[0])
                    .name(format!("{:.3} - {:.3}: {}", edge[0], edge[1], count))
            })
            .collect();

        Plot::new(format!("histogram_{}", id))
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .x_axis_label(chart.x_label.clone())
            .y_axis_label(if log_y { "Count (log)" } else { "Count" })
            .y_axis_formatter(move |mark, _range| {
                if log_y {
                    format!("{:.0}", 10f64.powf(mark.value) - 1.0)
                } else {
                    format!("{}", mark.value)
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(
                    egui_plot::BarChart::new(bars)
                        .color(ACCENT_COLOR)
                        .name(&chart.x_label),
                );
            });
    }

    pub fn draw_boxes(ui: &mut egui::Ui, id: &str, chart: &BoxChart) {
        if chart.boxes.is_empty() {
            ui.label(RichText::new("No data").color(Color32::GRAY));
            return;
        }

        let x_labels: Vec<String> = chart.boxes.iter().map(|b| b.label.clone()).collect();

        Plot::new(format!("boxes_{}", id))
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .x_axis_label(chart.x_label.clone())
            .y_axis_label(chart.y_label.clone())
            .x_axis_formatter(move |mark, _range| Self::category_label(&x_labels, mark.value))
            .show(ui, |plot_ui| {
                let mut medians: Vec<[f64; 2]> = Vec::new();

                for (i, summary) in chart.boxes.iter().enumerate() {
                    let color = Self::series_color(i);
                    let box_elem = BoxElem::new(
                        i as f64,
                        BoxSpread::new(
                            summary.whisker_low,
                            summary.q1,
                            summary.median,
                            summary.q3,
                            summary.whisker_high,
                        ),
                    )
                    .box_width(0.5)
                    .fill(color.gamma_multiply(0.3))
                    .stroke(egui::Stroke::new(1.5, color));

                    plot_ui.box_plot(
                        BoxPlot::new(vec![box_elem])
                            .name(format!("{} (n={})", summary.label, summary.count)),
                    );
                    medians.push([i as f64, summary.median]);
                }

                if medians.len() > 1 {
                    plot_ui.line(
                        Line::new(PlotPoints::from(medians))
                            .color(Color32::BLACK)
                            .width(1.5)
                            .name("Median"),
                    );
                }
            });
    }

    /// Scatter on a lon/lat plane, one color per label.
    pub fn draw_geo(ui: &mut egui::Ui, id: &str, geo: &GeoPoints) {
        let mut by_label: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
        for point in &geo.points {
            by_label
                .entry(point.label.as_deref().unwrap_or("Other"))
                .or_default()
                .push([point.lon, point.lat]);
        }

        Plot::new(format!("geo_{}", id))
            .height(PLOT_HEIGHT + 80.0)
            .allow_scroll(false)
            .data_aspect(1.0)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                for (i, (label, points)) in by_label.into_iter().enumerate() {
                    plot_ui.points(
                        Points::new(PlotPoints::from(points))
                            .radius(2.5)
                            .color(Self::series_color(i).gamma_multiply(0.8))
                            .name(label),
                    );
                }
            });

        if geo.dropped > 0 {
            ui.label(
                RichText::new(format!(
                    "{} rows without valid coordinates not shown",
                    geo.dropped
                ))
                .size(11.0)
                .color(Color32::GRAY),
            );
        }
    }

    fn color_cell(ui: &mut egui::Ui, fill: Color32, text: &str, hover: String) {
        let (rect, response) =
            ui.allocate_exact_size(egui::vec2(CELL_SIZE[0], CELL_SIZE[1]), Sense::hover());
        ui.painter().rect_filled(rect, 2.0, fill);
        let luminance = 0.299 * fill.r() as f32 + 0.587 * fill.g() as f32 + 0.114 * fill.b() as f32;
        let text_color = if luminance > 140.0 {
            Color32::BLACK
        } else {
            Color32::WHITE
        };
        ui.painter().text(
            rect.center(),
            Align2::CENTER_CENTER,
            text,
            FontId::proportional(11.0),
            text_color,
        );
        response.on_hover_text(hover);
    }

    pub fn draw_heatmap(ui: &mut egui::Ui, id: &str, heatmap: &Heatmap) {
        let pivot = &heatmap.pivot;
        if pivot.rows.is_empty() || pivot.columns.is_empty() {
            ui.label(RichText::new("No data").color(Color32::GRAY));
            return;
        }

        let values: Vec<f64> = pivot.cells.iter().flatten().flatten().copied().collect();
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = if hi > lo { hi - lo } else { 1.0 };

        ui.label(
            RichText::new(format!("{} (rows) × {} (columns)", heatmap.y_label, heatmap.x_label))
                .size(11.0)
                .color(Color32::GRAY),
        );
        ScrollArea::horizontal().id_salt(format!("heatmap_scroll_{}", id)).show(ui, |ui| {
            egui::Grid::new(format!("heatmap_{}", id))
                .spacing([2.0, 2.0])
                .show(ui, |ui| {
                    ui.label("");
                    for column in &pivot.columns {
                        ui.label(RichText::new(column).size(11.0).strong());
                    }
                    ui.end_row();

                    for (row, cells) in pivot.rows.iter().zip(pivot.cells.iter()) {
                        ui.label(RichText::new(row).size(11.0).strong());
                        for (column, cell) in pivot.columns.iter().zip(cells.iter()) {
                            match cell {
                                Some(v) => Self::color_cell(
                                    ui,
                                    Self::heat_color((v - lo) / span),
                                    &format!("{:.*}", heatmap.decimals, v),
                                    format!("{} / {}: {:.*}", row, column, heatmap.decimals, v),
                                ),
                                None => Self::color_cell(
                                    ui,
                                    Color32::from_gray(235),
                                    "",
                                    format!("{} / {}: no rows", row, column),
                                ),
                            }
                        }
                        ui.end_row();
                    }
                });
        });
    }

    pub fn draw_correlation(ui: &mut egui::Ui, id: &str, matrix: &CorrelationMatrix) {
        ScrollArea::horizontal().id_salt(format!("corr_scroll_{}", id)).show(ui, |ui| {
            egui::Grid::new(format!("corr_{}", id))
                .spacing([2.0, 2.0])
                .show(ui, |ui| {
                    ui.label("");
                    for label in &matrix.labels {
                        ui.label(RichText::new(label).size(11.0).strong());
                    }
                    ui.end_row();

                    for (row_label, row) in matrix.labels.iter().zip(matrix.values.iter()) {
                        ui.label(RichText::new(row_label).size(11.0).strong());
                        for (col_label, r) in matrix.labels.iter().zip(row.iter()) {
                            let text = if r.is_finite() {
                                format!("{:.2}", r)
                            } else {
                                "n/a".to_string()
                            };
                            Self::color_cell(
                                ui,
                                Self::correlation_color(*r),
                                &text,
                                format!("{} / {}: {}", row_label, col_label, text),
                            );
                        }
                        ui.end_row();
                    }
                });
        });
    }

    pub fn draw_table(ui: &mut egui::Ui, id: &str, table: &TableView) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ScrollArea::both()
                    .id_salt(format!("table_scroll_{}", id))
                    .max_height(TABLE_HEIGHT)
                    .show(ui, |ui| {
                        egui::Grid::new(format!("table_{}", id))
                            .striped(true)
                            .min_col_width(55.0)
                            .spacing([8.0, 4.0])
                            .show(ui, |ui| {
                                for column in &table.columns {
                                    ui.label(RichText::new(column).strong().size(11.0));
                                }
                                ui.end_row();

                                for row in &table.rows {
                                    for cell in row {
                                        ui.label(RichText::new(cell).size(11.0));
                                    }
                                    ui.end_row();
                                }
                            });
                    });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_only_on_integer_marks() {
        let labels = vec!["Mon".to_string(), "Tue".to_string()];
        assert_eq!(ChartPlotter::category_label(&labels, 1.0), "Tue");
        assert_eq!(ChartPlotter::category_label(&labels, 0.5), "");
        assert_eq!(ChartPlotter::category_label(&labels, 5.0), "");
        assert_eq!(ChartPlotter::category_label(&labels, -1.0), "");
    }

    #[test]
    fn color_scales_hit_their_endpoints() {
        assert_eq!(ChartPlotter::heat_color(0.0), Color32::from_rgb(255, 255, 204));
        assert_eq!(ChartPlotter::heat_color(1.0), Color32::from_rgb(189, 0, 38));
        assert_eq!(ChartPlotter::correlation_color(0.0), Color32::WHITE);
        assert_eq!(ChartPlotter::correlation_color(-1.0), Color32::from_rgb(33, 102, 172));
    }
}
