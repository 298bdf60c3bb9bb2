//! Last-mile delivery performance (Amazon delivery dataset).

use super::{mean_bars, mean_line, reuse, PageOptions};
use crate::data::{columns, ColumnError, DataProcessor, GroupKey, DAY_PERIODS, WEEKDAYS};
use crate::navigation::PageId;
use crate::page::{
    fmt_count, fmt_float, fmt_percent, BarChart, BoxChart, Content, Heatmap, HistogramChart, Kpi,
    Page, Section, Tab, TableView,
};
use crate::stats::aggregate::{self, GroupMean};
use crate::stats::StatsCalculator;
use polars::prelude::DataFrame;
use std::collections::HashMap;

/// Deliveries slower than this many minutes count as late.
pub const LATE_THRESHOLD_MINUTES: f64 = 120.0;

const DELIVERY_BINS: usize = 50;

/// `delivery_risk` when exported, otherwise `Delivery_Time > 120`.
pub fn delivery_risk(df: &DataFrame) -> Result<Vec<Option<f64>>, ColumnError> {
    if let Some(risk) = columns::numeric_opt(df, "delivery_risk") {
        return Ok(risk);
    }
    Ok(columns::numeric(df, "Delivery_Time")?
        .into_iter()
        .map(|t| t.map(|t| if t > LATE_THRESHOLD_MINUTES { 1.0 } else { 0.0 }))
        .collect())
}

/// Per-row mean of `risk` over the row's group.
fn group_mean_per_row(keys: &[Option<GroupKey>], risk: &[Option<f64>]) -> Vec<Option<f64>> {
    let means: HashMap<GroupKey, f64> = aggregate::group_mean(keys, risk)
        .into_iter()
        .map(|g| (g.key, g.mean))
        .collect();
    keys.iter()
        .map(|k| k.as_ref().and_then(|k| means.get(k).copied()))
        .collect()
}

/// Area labels, trimmed.
fn area_keys(df: &DataFrame) -> Result<Vec<Option<GroupKey>>, ColumnError> {
    columns::keys(df, "Area")
}

/// `area_risk_score` when exported, otherwise the mean risk of the row's area.
pub fn area_risk(df: &DataFrame, risk: &[Option<f64>]) -> Result<Vec<Option<f64>>, ColumnError> {
    if let Some(scores) = columns::numeric_opt(df, "area_risk_score") {
        return Ok(scores);
    }
    Ok(group_mean_per_row(&area_keys(df)?, risk))
}

fn weather_traffic_keys(df: &DataFrame) -> Result<Vec<Option<GroupKey>>, ColumnError> {
    columns::require(df, &["Weather", "Traffic"])?;
    let weather = columns::text(df, "Weather")?;
    let traffic = columns::text(df, "Traffic")?;
    Ok(weather
        .iter()
        .zip(traffic.iter())
        .map(|(w, t)| match (w, t) {
            (Some(w), Some(t)) => Some(GroupKey::Text(format!("{} / {}", w, t))),
            _ => None,
        })
        .collect())
}

/// `weather_traffic_resilience_score` when exported, otherwise one minus the
/// late rate of the row's weather and traffic combination.
pub fn resilience(df: &DataFrame, risk: &[Option<f64>]) -> Result<Vec<Option<f64>>, ColumnError> {
    if let Some(scores) = columns::numeric_opt(df, "weather_traffic_resilience_score") {
        return Ok(scores);
    }
    Ok(group_mean_per_row(&weather_traffic_keys(df)?, risk)
        .into_iter()
        .map(|m| m.map(|m| 1.0 - m))
        .collect())
}

/// Order hour, weekday and period of day per row.
struct OrderTime {
    hour: Vec<Option<GroupKey>>,
    weekday: Vec<Option<GroupKey>>,
    period: Vec<Option<GroupKey>>,
    date: Vec<Option<GroupKey>>,
    year: Vec<Option<f64>>,
}

fn order_time(df: &DataFrame) -> Result<OrderTime, ColumnError> {
    columns::require(df, &["Order_Time", "Order_Date"])?;
    let hours: Vec<Option<u32>> = columns::text(df, "Order_Time")?
        .iter()
        .map(|t| t.as_deref().and_then(DataProcessor::parse_hour))
        .collect();
    let dates = columns::text(df, "Order_Date")?;
    let parsed: Vec<_> = dates
        .iter()
        .map(|d| d.as_deref().and_then(DataProcessor::parse_date))
        .collect();

    Ok(OrderTime {
        hour: hours.iter().map(|h| h.map(|h| GroupKey::Int(h as i64))).collect(),
        period: hours
            .iter()
            .map(|h| h.map(|h| GroupKey::from(DataProcessor::day_period(h))))
            .collect(),
        weekday: dates
            .iter()
            .map(|d| d.as_deref().and_then(DataProcessor::weekday_of).map(GroupKey::from))
            .collect(),
        date: parsed
            .iter()
            .map(|d| d.map(|d| GroupKey::Text(d.format("%Y-%m-%d").to_string())))
            .collect(),
        year: parsed
            .iter()
            .map(|d| d.map(|d| chrono::Datelike::year(&d) as f64))
            .collect(),
    })
}

/// Means laid out in a fixed label order; labels without rows are skipped.
fn ordered_means(groups: &[GroupMean], order: &[&str]) -> Vec<(String, f64)> {
    order
        .iter()
        .filter_map(|label| {
            groups
                .iter()
                .find(|g| g.key.to_string() == *label)
                .map(|g| (label.to_string(), g.mean))
        })
        .collect()
}

fn heatmap(title: &str, x: &str, y: &str, pivot: aggregate::Pivot) -> Section {
    Section::new(
        title,
        Content::Heatmap(Heatmap {
            x_label: x.to_string(),
            y_label: y.to_string(),
            pivot,
            decimals: 2,
        }),
    )
}

fn riskiest(groups: &[GroupMean]) -> Option<&GroupMean> {
    groups
        .iter()
        .max_by(|a, b| a.mean.partial_cmp(&b.mean).unwrap_or(std::cmp::Ordering::Equal))
}

pub fn build(df: &DataFrame, opts: &PageOptions) -> Page {
    let total = df.height();
    let risk = delivery_risk(df);
    let times = columns::numeric(df, "Delivery_Time");
    let time = order_time(df);
    let resilience_scores = reuse(&risk).and_then(|r| resilience(df, r));
    let categories = columns::text(df, "Category");

    let late = risk.as_ref().ok().map(|r| StatsCalculator::sum(r));
    let years = time.as_ref().ok().and_then(|t| StatsCalculator::min_max(&t.year));
    let kpis = vec![
        Kpi::new("Deliveries", fmt_count(total as f64)),
        Kpi::new(
            "Late deliveries (>120 min)",
            late.map(fmt_count).unwrap_or_else(|| "n/a".to_string()),
        ),
        Kpi::new(
            "Mean delivery time",
            times
                .as_ref()
                .ok()
                .and_then(|t| StatsCalculator::mean(t))
                .map(|m| format!("{:.1} min", m))
                .unwrap_or_else(|| "n/a".to_string()),
        ),
        Kpi::new(
            "Mean resilience",
            fmt_float(resilience_scores.as_ref().ok().and_then(|r| StatsCalculator::mean(r)), 2),
        ),
        Kpi::new("Time span", crate::page::fmt_range(years)),
    ];

    let overview = vec![
        Section::guarded("Delivery time distribution (minutes)", |title| {
            Ok(Section::new(
                title,
                Content::Histogram(HistogramChart {
                    x_label: "Delivery time (minutes)".to_string(),
                    histogram: StatsCalculator::histogram(reuse(&times)?, DELIVERY_BINS),
                    log_y: false,
                }),
            ))
        }),
        Section::guarded("Riskiest weather and traffic contexts", |title| {
            columns::require(df, &["Weather", "Traffic"])?;
            let pairs = aggregate::group_mean_by2(
                &columns::keys(df, "Weather")?,
                &columns::keys(df, "Traffic")?,
                reuse(&risk)?,
            );
            let mut ranked = pairs;
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            let mut table = TableView::new(&["Weather", "Traffic", "Mean late rate"]);
            for ((weather, traffic), mean) in aggregate::top_n(&ranked, 5) {
                table.push(vec![weather.to_string(), traffic.to_string(), format!("{:.3}", mean)]);
            }
            Ok(Section::new(
                title,
                Content::Table(table),
            ))
        }),
        Section::guarded("Risk by area", |title| {
            let r = reuse(&risk)?;
            let scores = area_risk(df, r)?;
            let means = aggregate::sort_by_mean(aggregate::group_mean(&area_keys(df)?, &scores), true);
            Ok(Section::new(
                title,
                Content::Bars(mean_bars("Mean risk score", "Area", &means).horizontal()),
            ))
        }),
        Section::guarded("Most ordered product categories", |title| {
            let counts = aggregate::top_n(&aggregate::value_counts(reuse(&categories)?, &[]), 5);
            let mut table = TableView::new(&["Category", "Orders"]);
            for c in counts {
                table.push(vec![c.label, fmt_count(c.count as f64)]);
            }
            Ok(Section::new(title, Content::Table(table)))
        }),
    ];

    let temporal = vec![
        Section::guarded("Orders by hour of day", |title| {
            let counts = aggregate::counts_by_key(&reuse(&time)?.hour);
            Ok(Section::new(
                title,
                Content::Bars(super::keyed_bars("Hour", "Orders", &counts)),
            ))
        }),
        Section::guarded("Delivery time by order hour", |title| {
            let t = reuse(&time)?;
            let minutes = reuse(&times)?;
            let mut hours: Vec<GroupKey> = t.hour.iter().flatten().cloned().collect();
            hours.sort();
            hours.dedup();
            let boxes = hours
                .iter()
                .filter_map(|h| {
                    let values: Vec<Option<f64>> = t
                        .hour
                        .iter()
                        .zip(minutes.iter())
                        .map(|(k, v)| v.filter(|_| k.as_ref() == Some(h)))
                        .collect();
                    StatsCalculator::box_summary(&h.to_string(), &values)
                })
                .collect();
            Ok(Section::new(
                title,
                Content::Boxes(BoxChart {
                    x_label: "Hour".to_string(),
                    y_label: "Delivery time (min)".to_string(),
                    boxes,
                }),
            ))
        }),
        Section::guarded("Late rate by order hour", |title| {
            let means = aggregate::group_mean(&reuse(&time)?.hour, reuse(&risk)?);
            Ok(Section::new(
                title,
                Content::Lines(mean_line("Order hour", "Late rate", "Late rate", &means).as_percent()),
            ))
        }),
        Section::guarded("Late rate by day of week", |title| {
            let means = aggregate::group_mean(&reuse(&time)?.weekday, reuse(&risk)?);
            Ok(Section::new(
                title,
                Content::Bars(BarChart::from_pairs(
                    "Day of week",
                    "Late rate",
                    ordered_means(&means, &WEEKDAYS),
                )),
            ))
        }),
        Section::guarded("Morning vs evening late rate", |title| {
            let means = aggregate::group_mean(&reuse(&time)?.period, reuse(&risk)?);
            Ok(Section::new(
                title,
                Content::Bars(BarChart::from_pairs(
                    "Period",
                    "Late rate",
                    ordered_means(&means, &DAY_PERIODS),
                )),
            ))
        }),
        Section::guarded("Late rate over time", |title| {
            let means = aggregate::group_mean(&reuse(&time)?.date, reuse(&risk)?);
            Ok(Section::new(
                title,
                Content::Lines(mean_line("Order date", "Late rate", "Late rate", &means).as_percent()),
            ))
        }),
    ];

    let heatmaps = vec![
        Section::guarded("Late rate by weather and traffic", |title| {
            columns::require(df, &["Weather", "Traffic"])?;
            Ok(heatmap(
                title,
                "Traffic",
                "Weather",
                aggregate::pivot_mean(
                    &columns::keys(df, "Weather")?,
                    &columns::keys(df, "Traffic")?,
                    reuse(&risk)?,
                    None,
                    None,
                ),
            ))
        }),
        Section::guarded("Late rate by area and weather", |title| {
            columns::require(df, &["Weather", "Area"])?;
            Ok(heatmap(
                title,
                "Area",
                "Weather",
                aggregate::pivot_mean(
                    &columns::keys(df, "Weather")?,
                    &area_keys(df)?,
                    reuse(&risk)?,
                    None,
                    None,
                ),
            ))
        }),
        Section::guarded("Late rate by weekday and order hour", |title| {
            let t = reuse(&time)?;
            Ok(heatmap(
                title,
                "Order hour",
                "Day of week",
                aggregate::pivot_mean(&t.weekday, &t.hour, reuse(&risk)?, Some(&WEEKDAYS[..]), None),
            ))
        }),
    ];

    let mut summary = Vec::new();
    if let Ok(r) = &risk {
        summary.push(format!(
            "Global late rate: {}.",
            fmt_percent(StatsCalculator::mean(r).map(|m| m * 100.0))
        ));
        if let Ok(t) = &time {
            if let Some(g) = riskiest(&aggregate::group_mean(&t.hour, r)) {
                summary.push(format!("Riskiest order hour: {}h ({:.0} % late).", g.key, g.mean * 100.0));
            }
            if let Some(g) = riskiest(&aggregate::group_mean(&t.period, r)) {
                summary.push(format!("Riskiest period: {}.", g.key));
            }
        }
        if let Ok(keys) = weather_traffic_keys(df) {
            if let Some(g) = riskiest(&aggregate::group_mean(&keys, r)) {
                summary.push(format!(
                    "Most critical weather / traffic combination: {} ({:.0} % late).",
                    g.key,
                    g.mean * 100.0
                ));
            }
        }
        if let Ok(areas) = area_keys(df) {
            if let Some(g) = riskiest(&aggregate::group_mean(&areas, r)) {
                summary.push(format!("Most exposed area: {}.", g.key));
            }
        }
    }
    if let Some(category) = categories.as_ref().ok().and_then(|c| aggregate::mode(c)) {
        summary.push(format!("Most ordered category: {}.", category));
    }

    Page {
        id: PageId::LastMile,
        title: "Risk analysis: last-mile delivery".to_string(),
        context: vec![
            "Amazon Delivery Dataset: order-level deliveries with weather, traffic, area, product category and delivery time. Provenance is not guaranteed and the data is likely simulated.".to_string(),
            "delivery_risk is 1 when Delivery_Time exceeds 120 minutes. weather_traffic_resilience_score and area_risk_score are derived from the late rate of each weather x traffic combination and of each area.".to_string(),
        ],
        kpis,
        preview: opts.preview(df),
        tabs: vec![
            Tab::new("Overview", overview),
            Tab::new("Temporal analysis", temporal),
            Tab::new("Heatmaps", heatmaps),
        ],
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn deliveries() -> DataFrame {
        DataFrame::new(vec![
            Column::new("Delivery_Time".into(), vec![90.0, 150.0, 130.0, 60.0]),
            Column::new("Weather".into(), vec!["Sunny", "Stormy", "Stormy", "Sunny"]),
            Column::new("Traffic".into(), vec!["Low", "Jam", "Jam", "Low"]),
            Column::new("Area".into(), vec!["Urban", "Urban", "Metropolitian", "Metropolitian"]),
        ])
        .unwrap()
    }

    #[test]
    fn late_flag_uses_the_two_hour_threshold() {
        let risk = delivery_risk(&deliveries()).unwrap();
        assert_eq!(risk, vec![Some(0.0), Some(1.0), Some(1.0), Some(0.0)]);
    }

    #[test]
    fn derived_scores_come_from_group_late_rates() {
        let df = deliveries();
        let risk = delivery_risk(&df).unwrap();
        assert_eq!(area_risk(&df, &risk).unwrap(), vec![Some(0.5); 4]);
        assert_eq!(
            resilience(&df, &risk).unwrap(),
            vec![Some(1.0), Some(0.0), Some(0.0), Some(1.0)]
        );
    }
}
