//! Airline delay causes (US BTS on-time statistics).

use super::home::DELAY_COUNT_CAUSES;
use super::{correlation_section, multi_line, year_range, PageOptions};
use crate::data::{columns, ColumnError, GroupKey};
use crate::navigation::PageId;
use crate::page::{
    fmt_count, fmt_float, fmt_percent, fmt_range, BarChart, BarItem, Content, Kpi, LineChart,
    Page, Section, Tab, TableView,
};
use crate::stats::aggregate::{self, GroupRate};
use crate::stats::StatsCalculator;
use polars::prelude::DataFrame;

pub const DELAY_MINUTE_CAUSES: [(&str, &str); 5] = [
    ("carrier_delay", "Carrier delay"),
    ("weather_delay", "Weather delay"),
    ("nas_delay", "Air traffic control (NAS) delay"),
    ("security_delay", "Security delay"),
    ("late_aircraft_delay", "Late previous aircraft"),
];

/// Short labels for correlation axes.
const SHORT_LABELS: [&str; 5] = ["Carrier", "Weather", "NAS", "Security", "Previous aircraft"];

fn labelled(causes: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
    causes
        .iter()
        .zip(SHORT_LABELS)
        .map(|((col, _), short)| (*col, short))
        .collect()
}

fn cause_totals(df: &DataFrame, causes: &[(&str, &str)]) -> Result<Vec<(String, f64)>, ColumnError> {
    let names: Vec<&str> = causes.iter().map(|(c, _)| *c).collect();
    columns::require(df, &names)?;

    let mut totals = Vec::with_capacity(causes.len());
    for (col, label) in causes {
        totals.push((label.to_string(), StatsCalculator::sum(&columns::numeric(df, col)?).trunc()));
    }
    totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(totals)
}

fn totals_section(
    title: &str,
    y_label: &str,
    df: &DataFrame,
    causes: &[(&str, &str)],
) -> Section {
    Section::guarded(title, |title| {
        let bars = cause_totals(df, causes)?
            .into_iter()
            .map(|(label, value)| BarItem {
                label,
                value,
                text: Some(fmt_count(value)),
            })
            .collect();
        Ok(Section::new(title, Content::Bars(BarChart::new("Cause", y_label, bars))))
    })
}

/// Delay rate per group, flights-free groups removed.
pub fn delay_rates(df: &DataFrame, group: &str) -> Result<Vec<GroupRate>, ColumnError> {
    columns::require(df, &[group, "arr_del15", "arr_flights"])?;
    Ok(aggregate::group_rate(
        &columns::keys(df, group)?,
        &columns::numeric(df, "arr_del15")?,
        &columns::numeric(df, "arr_flights")?,
    ))
}

fn sort_by_rate(mut rates: Vec<GroupRate>) -> Vec<GroupRate> {
    rates.sort_by(|a, b| b.rate.partial_cmp(&a.rate).unwrap_or(std::cmp::Ordering::Equal));
    rates
}

fn rate_table(title: &str, df: &DataFrame, group: &str, label: &str) -> Section {
    Section::guarded(title, |title| {
        let top = aggregate::top_n(&sort_by_rate(delay_rates(df, group)?), 10);
        let mut table = TableView::new(&[label, "Delayed flights", "Total flights", "Delay rate (%)"]);
        for rate in top {
            table.push(vec![
                rate.key.to_string(),
                fmt_count(rate.numerator),
                fmt_count(rate.denominator),
                format!("{:.2}", rate.rate),
            ]);
        }
        Ok(Section::new(title, Content::Table(table)))
    })
}

/// Mean minutes per delayed flight, per cause and year.
fn minutes_per_delayed_flight(title: &str, df: &DataFrame) -> Result<Section, ColumnError> {
    let mut needed = vec!["arr_del15", "year"];
    needed.extend(DELAY_MINUTE_CAUSES.iter().map(|(c, _)| *c));
    columns::require(df, &needed)?;

    let delayed = columns::numeric(df, "arr_del15")?;
    let years = columns::keys(df, "year")?;
    let mut ticks: Vec<GroupKey> = years.iter().flatten().cloned().collect();
    ticks.sort();
    ticks.dedup();

    let mut series = Vec::with_capacity(DELAY_MINUTE_CAUSES.len());
    for (col, label) in DELAY_MINUTE_CAUSES {
        let minutes = columns::numeric(df, col)?;
        let per_flight: Vec<Option<f64>> = minutes
            .iter()
            .zip(delayed.iter())
            .map(|(m, d)| match (m, d) {
                (Some(m), Some(d)) if *d > 0.0 => Some(m / d),
                _ => None,
            })
            .collect();
        let means = aggregate::group_mean(&years, &per_flight);
        let values = ticks
            .iter()
            .map(|year| means.iter().find(|g| &g.key == year).map(|g| g.mean))
            .collect();
        series.push((label.to_string(), values));
    }

    Ok(Section::new(
        title,
        Content::Lines(multi_line(
            "Year",
            "Minutes",
            ticks.iter().map(|k| k.to_string()).collect(),
            series,
        )),
    )
    .with_caption("Only rows with at least one delayed flight contribute."))
}

pub fn build(df: &DataFrame, opts: &PageOptions) -> Page {
    let total = |col: &str| columns::numeric(df, col).ok().map(|v| StatsCalculator::sum(&v));
    let flights = total("arr_flights");
    let delayed = total("arr_del15");
    let years = columns::numeric(df, "year").ok().and_then(|y| year_range(&y));

    let count_kpi = |v: Option<f64>| v.map(fmt_count).unwrap_or_else(|| "n/a".to_string());
    let kpis = vec![
        Kpi::new("Flights", count_kpi(flights)),
        Kpi::new("Delayed flights", count_kpi(delayed)),
        Kpi::new("Total delay (minutes)", count_kpi(total("arr_delay"))),
        Kpi::new("Cancelled flights", count_kpi(total("arr_cancelled"))),
        Kpi::new("Diverted flights", count_kpi(total("arr_diverted"))),
        Kpi::new("Time span", fmt_range(years)),
    ];

    let overview = vec![
        totals_section("Delays by cause", "Delays", df, &DELAY_COUNT_CAUSES),
        totals_section(
            "Total delay time by cause (minutes)",
            "Minutes",
            df,
            &DELAY_MINUTE_CAUSES,
        ),
        rate_table("Top 10 airports by delay rate", df, "airport_name", "Airport"),
        rate_table("Top 10 carriers by delay rate", df, "carrier_name", "Carrier"),
    ];

    let temporal = vec![
        Section::guarded("Mean delay per delayed flight by cause (per year)", |title| {
            minutes_per_delayed_flight(title, df)
        }),
        Section::guarded("Delay rate per year", |title| {
            let rates = delay_rates(df, "year")?;
            let points = rates
                .iter()
                .filter_map(|r| r.key.as_int().map(|y| [y as f64, r.rate]))
                .collect();
            Ok(Section::new(
                title,
                Content::Lines(LineChart::single("Year", "Delay rate (%)", "Delay rate", points)),
            ))
        }),
    ];

    let correlations = vec![
        Section::guarded("Correlation of delay durations (minutes)", |title| {
            correlation_section(
                title,
                df,
                &labelled(&DELAY_MINUTE_CAUSES),
            )
        }),
        Section::guarded("Correlation of delay frequencies (counts)", |title| {
            correlation_section(
                title,
                df,
                &labelled(&DELAY_COUNT_CAUSES),
            )
        }),
    ];

    let mut summary = Vec::new();
    if let (Some(f), Some(d)) = (flights, delayed) {
        if f > 0.0 {
            summary.push(format!(
                "Overall delay rate: {} of {} flights.",
                fmt_percent(Some(d / f * 100.0)),
                fmt_count(f)
            ));
        }
    }
    if let Ok(counts) = cause_totals(df, &DELAY_COUNT_CAUSES) {
        let all: f64 = counts.iter().map(|(_, v)| v).sum();
        if let Some((label, value)) = counts.first() {
            if all > 0.0 {
                summary.push(format!(
                    "Leading cause: {} ({} of cause-attributed delays).",
                    label,
                    fmt_percent(Some(value / all * 100.0))
                ));
            }
        }
        if let Some((_, late)) = counts.iter().find(|(l, _)| l == "Late previous aircraft") {
            if all > 0.0 {
                summary.push(format!(
                    "Knock-on delays from the previous aircraft account for {} of delay counts.",
                    fmt_percent(Some(late / all * 100.0))
                ));
            }
        }
    }
    if let Ok(rates) = delay_rates(df, "airport_name") {
        let top = aggregate::top_n(&sort_by_rate(rates), 10);
        if let (Some(hi), Some(lo)) = (top.first(), top.last()) {
            summary.push(format!(
                "The 10 most delayed airports range from {} % to {} %.",
                fmt_float(Some(lo.rate), 1),
                fmt_float(Some(hi.rate), 1)
            ));
        }
    }

    Page {
        id: PageId::Airline,
        title: "Airline delay analysis".to_string(),
        context: vec![
            "USA Airline Delay Cause: monthly arrival statistics per carrier and airport, with delays split by cause (carrier, weather, NAS, security, late aircraft).".to_string(),
        ],
        kpis,
        preview: opts.preview(df),
        tabs: vec![
            Tab::new("Overview", overview),
            Tab::new("Temporal analysis", temporal),
            Tab::new("Correlations", correlations),
        ],
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn airports_without_flights_are_dropped() {
        let df = DataFrame::new(vec![
            Column::new("airport_name".into(), vec!["A", "A", "B", "C"]),
            Column::new("arr_del15".into(), vec![2.0, 3.0, 0.0, 4.0]),
            Column::new("arr_flights".into(), vec![10.0, 10.0, 0.0, 8.0]),
        ])
        .unwrap();
        let rates = delay_rates(&df, "airport_name").unwrap();
        let keys: Vec<String> = rates.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["A", "C"]);
        assert!((rates[0].rate - 25.0).abs() < 1e-12);
        assert!((rates[1].rate - 50.0).abs() < 1e-12);
    }
}
