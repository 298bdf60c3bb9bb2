//! Cross-mode overview: one KPI and one top-3 chart per transport mode.

use super::{count_bars, PageOptions};
use crate::data::columns;
use crate::navigation::PageId;
use crate::page::{fmt_count, BarChart, Content, Kpi, Page, Section, Tab};
use crate::stats::aggregate;
use crate::stats::StatsCalculator;
use polars::prelude::DataFrame;

/// Airline delay-count columns with readable labels.
pub const DELAY_COUNT_CAUSES: [(&str, &str); 5] = [
    ("carrier_ct", "Carrier delay"),
    ("weather_ct", "Weather delay"),
    ("nas_ct", "Air traffic control (NAS) delay"),
    ("security_ct", "Security delay"),
    ("late_aircraft_ct", "Late previous aircraft"),
];

/// Tables read by the overview.
pub struct HomeTables<'a> {
    pub traffic: &'a DataFrame,
    pub airline: &'a DataFrame,
    pub railroad: &'a DataFrame,
    pub shipping: &'a DataFrame,
}

fn top_categories(
    title: &str,
    df: &DataFrame,
    column: &str,
    exclude: &[&str],
) -> Section {
    Section::guarded(title, |title| {
        let values = columns::text(df, column)?;
        let counts = aggregate::value_counts(&values, exclude);
        let top = aggregate::top_n(&counts, 3);
        Ok(Section::new(
            title,
            Content::Bars(count_bars("Count", column, &top)),
        ))
    })
}

fn top_delay_causes(df: &DataFrame) -> Section {
    let title = "Air: top 3 delay causes";
    Section::guarded(title, |title| {
        let names: Vec<&str> = DELAY_COUNT_CAUSES.iter().map(|(c, _)| *c).collect();
        columns::require(df, &names)?;

        let mut totals: Vec<(String, f64)> = Vec::with_capacity(DELAY_COUNT_CAUSES.len());
        for (col, label) in DELAY_COUNT_CAUSES {
            let values = columns::numeric(df, col)?;
            totals.push((label.to_string(), StatsCalculator::sum(&values).trunc()));
        }
        totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let top = aggregate::top_n(&totals, 3);

        Ok(Section::new(
            title,
            Content::Bars(BarChart::from_pairs("Delays", "Cause", top).horizontal()),
        ))
    })
}

pub fn build(tables: &HomeTables<'_>, _opts: &PageOptions) -> Page {
    let delayed = columns::numeric(tables.airline, "arr_del15")
        .map(|v| fmt_count(StatsCalculator::sum(&v)))
        .unwrap_or_else(|_| "n/a".to_string());

    let kpis = vec![
        Kpi::new("Road accidents", fmt_count(tables.traffic.height() as f64)),
        Kpi::new("Delayed flights", delayed),
        Kpi::new("Rail accidents", fmt_count(tables.railroad.height() as f64)),
        Kpi::new("Maritime accidents", fmt_count(tables.shipping.height() as f64)),
    ];

    let sections = vec![
        top_categories(
            "Road: top 3 risk categories",
            tables.traffic,
            "Risk_Category",
            &["Low Impact"],
        ),
        top_delay_causes(tables.airline),
        top_categories(
            "Rail: top 3 accident types",
            tables.railroad,
            "Accident Type",
            &["Autre", "Other"],
        ),
        top_categories(
            "Maritime: top 3 accident types",
            tables.shipping,
            "Acc_Type",
            &["Other"],
        ),
    ];

    Page {
        id: PageId::Home,
        title: "Risk analysis: supply chain resilience".to_string(),
        context: vec![
            "Interactive summary of incidents by transport mode.".to_string(),
        ],
        kpis,
        preview: None,
        tabs: vec![Tab::new("Overview", sections)],
        summary: Vec::new(),
    }
}
