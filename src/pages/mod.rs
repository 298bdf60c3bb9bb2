//! Per-domain dashboard pages.
//!
//! Each page is a pure function of its table(s): it extracts the columns it
//! needs, computes aggregates and returns a [`Page`]. Sections whose columns
//! are absent degrade to warnings.

pub mod airline;
pub mod home;
pub mod last_mile;
pub mod railroad;
pub mod shipping;
pub mod supply_chain;
pub mod traffic;

use crate::data::{columns, ColumnError, DataLoader, GroupKey};
use crate::page::{BarChart, Content, LineChart, Section, Series, TableView};
use crate::stats::aggregate::{self, CategoryCount, GroupMean};
use crate::stats::{CorrelationMatrix, StatsCalculator};
use polars::prelude::{DataFrame, PolarsError};

/// Build options shared by every page.
#[derive(Debug, Clone, Copy)]
pub struct PageOptions {
    /// Rows shown in the dataset preview; 0 disables it
    pub preview_rows: usize,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self { preview_rows: 1000 }
    }
}

impl PageOptions {
    pub(crate) fn preview(&self, df: &DataFrame) -> Option<TableView> {
        if self.preview_rows == 0 {
            None
        } else {
            Some(DataLoader::preview(df, self.preview_rows))
        }
    }
}

/// Borrow a column computed once per page for use in several sections.
pub(crate) fn reuse<T>(computed: &Result<T, ColumnError>) -> Result<&T, ColumnError> {
    computed.as_ref().map_err(|e| match e {
        ColumnError::Missing(cols) => ColumnError::Missing(cols.clone()),
        ColumnError::PolarsError(err) => {
            ColumnError::PolarsError(PolarsError::ComputeError(err.to_string().into()))
        }
    })
}

/// Horizontal bars from category counts.
pub(crate) fn count_bars(x_label: &str, y_label: &str, counts: &[CategoryCount]) -> BarChart {
    BarChart::from_pairs(
        x_label,
        y_label,
        counts.iter().map(|c| (c.label.clone(), c.count as f64)),
    )
    .horizontal()
}

/// Bars from (key, count) pairs in key order.
pub(crate) fn keyed_bars(x_label: &str, y_label: &str, counts: &[(GroupKey, usize)]) -> BarChart {
    BarChart::from_pairs(x_label, y_label, counts.iter().map(|(k, c)| (k, *c as f64)))
}

pub(crate) fn mean_bars(x_label: &str, y_label: &str, groups: &[GroupMean]) -> BarChart {
    BarChart::from_pairs(x_label, y_label, groups.iter().map(|g| (&g.key, g.mean)))
}

/// Line over group means. Integer keys become x positions; text keys are
/// laid out in order with tick labels.
pub(crate) fn mean_line(x_label: &str, y_label: &str, name: &str, groups: &[GroupMean]) -> LineChart {
    let numeric = groups.iter().all(|g| matches!(g.key, GroupKey::Int(_)));
    if numeric {
        let points = groups
            .iter()
            .filter_map(|g| match g.key {
                GroupKey::Int(x) => Some([x as f64, g.mean]),
                GroupKey::Text(_) => None,
            })
            .collect();
        LineChart::single(x_label, y_label, name, points)
    } else {
        let points = groups
            .iter()
            .enumerate()
            .map(|(i, g)| [i as f64, g.mean])
            .collect();
        LineChart::single(x_label, y_label, name, points)
            .with_ticks(groups.iter().map(|g| g.key.to_string()).collect())
    }
}

/// One line per series over shared categorical ticks.
pub(crate) fn multi_line(
    x_label: &str,
    y_label: &str,
    ticks: Vec<String>,
    series: Vec<(String, Vec<Option<f64>>)>,
) -> LineChart {
    LineChart {
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        series: series
            .into_iter()
            .map(|(name, values)| Series {
                name,
                points: values
                    .iter()
                    .enumerate()
                    .filter_map(|(i, v)| v.map(|y| [i as f64, y]))
                    .collect(),
            })
            .collect(),
        x_ticks: Some(ticks),
        percent: false,
    }
}

/// Correlation section over whichever of `names` are present (at least two).
pub(crate) fn correlation_section(
    title: &str,
    df: &DataFrame,
    names: &[(&str, &str)],
) -> Result<Section, ColumnError> {
    let present: Vec<(String, Vec<Option<f64>>)> = names
        .iter()
        .filter_map(|(col, label)| columns::numeric_opt(df, col).map(|v| (label.to_string(), v)))
        .collect();

    if present.len() < 2 {
        return Err(ColumnError::Missing(
            names
                .iter()
                .filter(|(col, _)| !columns::has_column(df, col))
                .map(|(col, _)| col.to_string())
                .collect(),
        ));
    }

    let matrix: CorrelationMatrix = StatsCalculator::correlation_matrix(&present);
    Ok(Section::new(title, Content::Correlation(matrix)))
}

/// Year span of a numeric year column.
pub(crate) fn year_range(years: &[Option<f64>]) -> Option<(f64, f64)> {
    StatsCalculator::min_max(years)
}

/// Rows matching a label predicate as a share of all rows, in percent.
pub(crate) fn share_of(labels: &[Option<String>], total: usize, pred: impl Fn(&str) -> bool) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let hits = labels.iter().flatten().filter(|s| pred(s)).count();
    Some(hits as f64 / total as f64 * 100.0)
}

/// The `n` highest and `n` lowest group means as two bar charts.
pub(crate) fn best_and_worst(
    groups: Vec<GroupMean>,
    n: usize,
    x_label: &str,
    y_label: &str,
) -> (BarChart, BarChart) {
    let high = aggregate::top_n(&aggregate::sort_by_mean(groups.clone(), true), n);
    let low = aggregate::top_n(&aggregate::sort_by_mean(groups, false), n);
    (
        mean_bars(x_label, y_label, &high).horizontal(),
        mean_bars(x_label, y_label, &low).horizontal(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_keys_get_tick_labels() {
        let groups = vec![
            GroupMean { key: GroupKey::from("Mon"), mean: 0.5, count: 2 },
            GroupMean { key: GroupKey::from("Tue"), mean: 0.7, count: 1 },
        ];
        let line = mean_line("day", "risk", "mean", &groups);
        assert_eq!(line.x_ticks, Some(vec!["Mon".to_string(), "Tue".to_string()]));
        assert_eq!(line.series[0].points, vec![[0.0, 0.5], [1.0, 0.7]]);
    }

    #[test]
    fn share_ignores_nulls_in_the_numerator() {
        let labels = vec![Some("a".to_string()), None, Some("b".to_string()), Some("a".to_string())];
        assert_eq!(share_of(&labels, 4, |s| s == "a"), Some(50.0));
        assert_eq!(share_of(&labels, 0, |s| s == "a"), None);
    }
}
