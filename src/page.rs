//! Page model: what a dashboard page shows, independent of how it is drawn.
//!
//! Pages are built from aggregates only. The GUI draws them with egui_plot,
//! the CLI prints them as text or JSON.

use crate::data::ColumnError;
use crate::navigation::PageId;
use crate::stats::{BoxSummary, CorrelationMatrix, Histogram, Pivot};
use serde::Serialize;
use std::fmt::Write as _;
use tracing::warn;

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    /// Dataset context paragraphs
    pub context: Vec<String>,
    pub kpis: Vec<Kpi>,
    pub preview: Option<TableView>,
    pub tabs: Vec<Tab>,
    pub summary: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Kpi {
    pub label: String,
    pub value: String,
}

impl Kpi {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Tab {
    pub title: String,
    pub sections: Vec<Section>,
}

impl Tab {
    pub fn new(title: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            title: title.into(),
            sections,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub title: String,
    pub content: Content,
    pub caption: Option<String>,
}

impl Section {
    pub fn new(title: impl Into<String>, content: Content) -> Self {
        Self {
            title: title.into(),
            content,
            caption: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Build a section, turning column errors into an in-place warning.
    /// The closure receives `title`, which is kept on the built section too.
    pub fn guarded<F>(title: &str, build: F) -> Self
    where
        F: FnOnce(&str) -> Result<Section, ColumnError>,
    {
        match build(title) {
            Ok(mut section) => {
                section.title = title.to_string();
                section
            }
            Err(e) => {
                warn!(section = title, error = %e, "section skipped");
                Section::new(title, Content::Warning(format!("Section unavailable: {}", e)))
            }
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.content, Content::Warning(_))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Content {
    Bars(BarChart),
    /// Part-of-whole breakdown (drawn as share bars)
    Shares(BarChart),
    Lines(LineChart),
    Histogram(HistogramChart),
    Heatmap(Heatmap),
    Correlation(CorrelationMatrix),
    Boxes(BoxChart),
    Geo(GeoPoints),
    Table(TableView),
    Warning(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct BarItem {
    pub label: String,
    pub value: f64,
    /// Text printed on the bar, e.g. a proportion
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BarChart {
    pub x_label: String,
    pub y_label: String,
    pub horizontal: bool,
    pub bars: Vec<BarItem>,
}

impl BarChart {
    pub fn new(x_label: &str, y_label: &str, bars: Vec<BarItem>) -> Self {
        Self {
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            horizontal: false,
            bars,
        }
    }

    pub fn horizontal(mut self) -> Self {
        self.horizontal = true;
        self
    }

    /// Bars from (label, value) pairs.
    pub fn from_pairs<L: ToString>(
        x_label: &str,
        y_label: &str,
        pairs: impl IntoIterator<Item = (L, f64)>,
    ) -> Self {
        let bars = pairs
            .into_iter()
            .map(|(label, value)| BarItem {
                label: label.to_string(),
                value,
                text: None,
            })
            .collect();
        Self::new(x_label, y_label, bars)
    }

    /// Annotate each bar with its share of the total.
    pub fn with_shares(mut self) -> Self {
        let total: f64 = self.bars.iter().map(|b| b.value).sum();
        if total > 0.0 {
            for bar in self.bars.iter_mut() {
                bar.text = Some(format!("{:.2}%", bar.value / total * 100.0));
            }
        }
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineChart {
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    /// Categorical tick labels, indexed by x position
    pub x_ticks: Option<Vec<String>>,
    /// Y values are fractions shown as percentages
    pub percent: bool,
}

impl LineChart {
    pub fn single(x_label: &str, y_label: &str, name: &str, points: Vec<[f64; 2]>) -> Self {
        Self {
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            series: vec![Series {
                name: name.to_string(),
                points,
            }],
            x_ticks: None,
            percent: false,
        }
    }

    pub fn with_ticks(mut self, ticks: Vec<String>) -> Self {
        self.x_ticks = Some(ticks);
        self
    }

    pub fn as_percent(mut self) -> Self {
        self.percent = true;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramChart {
    pub x_label: String,
    pub histogram: Histogram,
    pub log_y: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Heatmap {
    pub x_label: String,
    pub y_label: String,
    pub pivot: Pivot,
    pub decimals: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoxChart {
    pub x_label: String,
    pub y_label: String,
    pub boxes: Vec<BoxSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeoPoints {
    pub points: Vec<GeoPoint>,
    /// Rows dropped for null or out-of-range coordinates
    pub dropped: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

/// Integer with thousands separators, e.g. 1234567 -> "1,234,567".
pub fn fmt_count(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0 {
        out.insert(0, '-');
    }
    out
}

pub fn fmt_float(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", decimals, v),
        _ => "n/a".to_string(),
    }
}

pub fn fmt_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.1} %", v),
        _ => "n/a".to_string(),
    }
}

/// "min - max" year span.
pub fn fmt_range(range: Option<(f64, f64)>) -> String {
    match range {
        Some((lo, hi)) => format!("{} - {}", lo as i64, hi as i64),
        None => "n/a".to_string(),
    }
}

const TEXT_ROW_LIMIT: usize = 12;

impl Page {
    pub fn warnings(&self) -> Vec<&Section> {
        self.tabs
            .iter()
            .flat_map(|t| t.sections.iter())
            .filter(|s| s.is_warning())
            .collect()
    }

    pub fn section(&self, title: &str) -> Option<&Section> {
        self.tabs
            .iter()
            .flat_map(|t| t.sections.iter())
            .find(|s| s.title == title)
    }

    /// Plain-text rendering for terminals.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}", self.title);
        for paragraph in &self.context {
            let _ = writeln!(out, "{}", paragraph);
        }
        let _ = writeln!(out);
        for kpi in &self.kpis {
            let _ = writeln!(out, "  {:<34} {}", kpi.label, kpi.value);
        }

        for tab in &self.tabs {
            let _ = writeln!(out, "\n## {}", tab.title);
            for section in &tab.sections {
                let _ = writeln!(out, "\n### {}", section.title);
                write_content(&mut out, &section.content);
                if let Some(caption) = &section.caption {
                    let _ = writeln!(out, "  > {}", caption);
                }
            }
        }

        if !self.summary.is_empty() {
            let _ = writeln!(out, "\n## Summary");
            for line in &self.summary {
                let _ = writeln!(out, "- {}", line);
            }
        }
        out
    }
}

fn cell_text(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", decimals, v),
        _ => "-".to_string(),
    }
}

fn write_pivot(out: &mut String, pivot: &Pivot, decimals: usize) {
    let _ = writeln!(out, "  {:<24} {}", "", pivot.columns.join(" | "));
    for (label, row) in pivot.rows.iter().zip(pivot.cells.iter()).take(TEXT_ROW_LIMIT) {
        let cells: Vec<String> = row.iter().map(|v| cell_text(*v, decimals)).collect();
        let _ = writeln!(out, "  {:<24} {}", label, cells.join(" | "));
    }
}

fn write_content(out: &mut String, content: &Content) {
    match content {
        Content::Bars(chart) | Content::Shares(chart) => {
            for bar in chart.bars.iter().take(TEXT_ROW_LIMIT) {
                let text = bar.text.as_deref().unwrap_or("");
                let _ = writeln!(out, "  {:<40} {:>14.2} {}", bar.label, bar.value, text);
            }
        }
        Content::Lines(chart) => {
            for series in &chart.series {
                let points: Vec<String> = series
                    .points
                    .iter()
                    .take(TEXT_ROW_LIMIT * 2)
                    .map(|[x, y]| {
                        let x = chart
                            .x_ticks
                            .as_ref()
                            .and_then(|t| t.get(*x as usize).cloned())
                            .unwrap_or_else(|| format!("{}", x));
                        format!("{}={:.3}", x, y)
                    })
                    .collect();
                let _ = writeln!(out, "  {}: {}", series.name, points.join(", "));
            }
        }
        Content::Histogram(chart) => {
            let h = &chart.histogram;
            let _ = writeln!(
                out,
                "  {} values in {} bins over [{}, {}]",
                h.total(),
                h.counts.len(),
                fmt_float(h.edges.first().copied(), 3),
                fmt_float(h.edges.last().copied(), 3)
            );
        }
        Content::Heatmap(map) => write_pivot(out, &map.pivot, map.decimals),
        Content::Correlation(matrix) => {
            let _ = writeln!(out, "  {:<28} {}", "", matrix.labels.join(" | "));
            for (label, row) in matrix.labels.iter().zip(matrix.values.iter()) {
                let cells: Vec<String> = row.iter().map(|v| cell_text(Some(*v), 2)).collect();
                let _ = writeln!(out, "  {:<28} {}", label, cells.join(" | "));
            }
        }
        Content::Boxes(chart) => {
            for b in chart.boxes.iter().take(TEXT_ROW_LIMIT) {
                let _ = writeln!(
                    out,
                    "  {:<24} n={} [{:.2} | {:.2} {:.2} {:.2} | {:.2}]",
                    b.label, b.count, b.whisker_low, b.q1, b.median, b.q3, b.whisker_high
                );
            }
        }
        Content::Geo(geo) => {
            let _ = writeln!(
                out,
                "  {} mapped points ({} dropped for invalid coordinates)",
                geo.points.len(),
                geo.dropped
            );
        }
        Content::Table(table) => {
            let _ = writeln!(out, "  {}", table.columns.join(" | "));
            for row in table.rows.iter().take(TEXT_ROW_LIMIT) {
                let _ = writeln!(out, "  {}", row.join(" | "));
            }
        }
        Content::Warning(message) => {
            let _ = writeln!(out, "  ! {}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_get_thousands_separators() {
        assert_eq!(fmt_count(0.0), "0");
        assert_eq!(fmt_count(999.0), "999");
        assert_eq!(fmt_count(1000.0), "1,000");
        assert_eq!(fmt_count(7_728_394.0), "7,728,394");
        assert_eq!(fmt_count(-1234.0), "-1,234");
        assert_eq!(fmt_count(f64::NAN), "n/a");
    }

    #[test]
    fn shares_annotate_percentages() {
        let chart = BarChart::from_pairs("x", "y", vec![("a", 3.0), ("b", 1.0)]).with_shares();
        assert_eq!(chart.bars[0].text.as_deref(), Some("75.00%"));
        assert_eq!(chart.bars[1].text.as_deref(), Some("25.00%"));
    }

    #[test]
    fn guarded_section_keeps_its_title() {
        let section = Section::guarded("Incidents per year", |title| {
            Ok(Section::new(format!("{} (draft)", title), Content::Warning(String::new())))
        });
        assert_eq!(section.title, "Incidents per year");
    }

    #[test]
    fn guarded_section_turns_missing_columns_into_warning() {
        let section = Section::guarded("Chart", |_| {
            Err(ColumnError::Missing(vec!["Risk_Score".to_string()]))
        });
        assert!(section.is_warning());
        match section.content {
            Content::Warning(message) => assert!(message.contains("Risk_Score")),
            _ => unreachable!(),
        }
    }
}
