//! Supplier risk and resilience.

use super::{best_and_worst, correlation_section, mean_bars, reuse, PageOptions};
use crate::data::{columns, ColumnError, GroupKey};
use crate::navigation::PageId;
use crate::page::{
    fmt_count, fmt_float, fmt_percent, BoxChart, Content, HistogramChart, Kpi, Page, Section,
    Tab, TableView,
};
use crate::stats::aggregate::{self, GroupMean};
use crate::stats::{Component, Normalization, StatsCalculator};
use polars::prelude::DataFrame;

const SCORE_BINS: usize = 50;

const CORRELATED: [(&str, &str); 8] = [
    ("route_risk_level", "Route risk level"),
    ("disruption_likelihood_score", "Disruption likelihood"),
    ("delay_probability", "Delay probability"),
    ("delivery_time_deviation", "Delivery time deviation"),
    ("lead_time_days", "Lead time (days)"),
    ("supplier_reliability_score", "Supplier reliability"),
    ("Risk_Score", "Risk score"),
    ("Resilience_Index", "Resilience index"),
];

/// `Risk_Score` when exported, otherwise the equal-weight mean of route risk
/// (0-10), disruption likelihood, delay probability and deviation (days / 10).
pub fn risk_scores(df: &DataFrame) -> Result<Vec<Option<f64>>, ColumnError> {
    if let Some(scores) = columns::numeric_opt(df, "Risk_Score") {
        return Ok(scores);
    }

    columns::require(
        df,
        &[
            "route_risk_level",
            "disruption_likelihood_score",
            "delay_probability",
            "delivery_time_deviation",
        ],
    )?;
    let route = columns::numeric(df, "route_risk_level")?;
    let disruption = columns::numeric(df, "disruption_likelihood_score")?;
    let delay = columns::numeric(df, "delay_probability")?;
    let deviation = columns::numeric(df, "delivery_time_deviation")?;

    Ok(StatsCalculator::composite_score(&[
        Component::new(&route, 0.25, Normalization::DivideBy(10.0)),
        Component::new(&disruption, 0.25, Normalization::Unit),
        Component::new(&delay, 0.25, Normalization::Unit),
        Component::new(&deviation, 0.25, Normalization::DivideBy(10.0)),
    ]))
}

/// `Resilience_Index` when exported, otherwise reliability x (1 - risk).
pub fn resilience_index(
    df: &DataFrame,
    risk: &Result<Vec<Option<f64>>, ColumnError>,
) -> Result<Vec<Option<f64>>, ColumnError> {
    if let Some(index) = columns::numeric_opt(df, "Resilience_Index") {
        return Ok(index);
    }

    let reliability = columns::numeric(df, "supplier_reliability_score")?;
    let risk = reuse(risk)?;
    Ok(reliability
        .iter()
        .zip(risk.iter())
        .map(|(rel, r)| match (rel, r) {
            (Some(rel), Some(r)) => Some(rel * (1.0 - r)),
            _ => None,
        })
        .collect())
}

fn mean_table(title: &str, key_label: &str, value_label: &str, groups: &[GroupMean]) -> Section {
    let mut table = TableView::new(&[key_label, value_label]);
    for g in groups {
        table.push(vec![g.key.to_string(), format!("{:.3}", g.mean)]);
    }
    Section::new(title, Content::Table(table))
}

fn histogram_section(title: &str, x_label: &str, values: &[Option<f64>]) -> Section {
    Section::new(
        title,
        Content::Histogram(HistogramChart {
            x_label: x_label.to_string(),
            histogram: StatsCalculator::histogram(values, SCORE_BINS),
            log_y: false,
        }),
    )
}

fn share_where(values: &[Option<f64>], total: usize, pred: impl Fn(f64) -> bool) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let n = values.iter().flatten().filter(|v| pred(**v)).count();
    Some(n as f64 / total as f64 * 100.0)
}

fn supplier_tables(
    df: &DataFrame,
    resilience: &[Option<f64>],
) -> Result<Vec<Section>, ColumnError> {
    columns::require(df, &["supplier_id", "supplier_country"])?;
    let pairs = aggregate::group_mean_by2(
        &columns::keys(df, "supplier_id")?,
        &columns::keys(df, "supplier_country")?,
        resilience,
    );

    let table = |rows: &[((GroupKey, GroupKey), f64)]| {
        let mut t = TableView::new(&["Supplier", "Country", "Resilience index"]);
        for ((supplier, country), mean) in rows {
            t.push(vec![supplier.to_string(), country.to_string(), format!("{:.3}", mean)]);
        }
        t
    };
    let mut ranked = pairs;
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let best = aggregate::top_n(&ranked, 10);
    ranked.reverse();
    let worst = aggregate::top_n(&ranked, 10);

    Ok(vec![
        Section::new("Top 10 most resilient suppliers", Content::Table(table(&best))),
        Section::new("Top 10 least resilient suppliers", Content::Table(table(&worst))),
    ])
}

fn classification_summary(title: &str, df: &DataFrame, risk: &[Option<f64>]) -> Result<Section, ColumnError> {
    columns::require(df, &["risk_classification", "lead_time_days", "product_id"])?;
    let classes = columns::keys(df, "risk_classification")?;
    let risk_means = aggregate::group_mean(&classes, risk);
    let lead_means = aggregate::group_mean(&classes, &columns::numeric(df, "lead_time_days")?);
    let products = columns::text(df, "product_id")?;
    let product_keys: Vec<Option<GroupKey>> = classes
        .iter()
        .zip(products.iter())
        .map(|(c, p)| p.as_ref().and(c.clone()))
        .collect();
    let counts = aggregate::counts_by_key(&product_keys);

    let mut table = TableView::new(&[
        "Risk classification",
        "Mean risk score",
        "Mean lead time (days)",
        "Products",
    ]);
    for (key, count) in counts {
        let find = |groups: &[GroupMean]| groups.iter().find(|g| g.key == key).map(|g| g.mean);
        table.push(vec![
            key.to_string(),
            fmt_float(find(&risk_means), 3),
            fmt_float(find(&lead_means), 1),
            fmt_count(count as f64),
        ]);
    }
    Ok(Section::new(title, Content::Table(table)))
}

pub fn build(df: &DataFrame, opts: &PageOptions) -> Page {
    let total = df.height();
    let risk = risk_scores(df);
    let resilience = resilience_index(df, &risk);
    let countries = columns::keys(df, "supplier_country");

    let distinct = |col: &str| {
        columns::text(df, col)
            .map(|v| aggregate::distinct_count(&v).to_string())
            .unwrap_or_else(|_| "n/a".to_string())
    };
    let mean_of = |values: &Result<Vec<Option<f64>>, ColumnError>| {
        fmt_float(values.as_ref().ok().and_then(|v| StatsCalculator::mean(v)), 3)
    };
    let kpis = vec![
        Kpi::new("Products", distinct("product_id")),
        Kpi::new("Suppliers", distinct("supplier_id")),
        Kpi::new("Supplier countries", distinct("supplier_country")),
        Kpi::new("Mean risk score", mean_of(&risk)),
        Kpi::new("Mean resilience", mean_of(&resilience)),
    ];

    let country_resilience = || -> Result<Vec<GroupMean>, ColumnError> {
        Ok(aggregate::group_mean(reuse(&countries)?, reuse(&resilience)?))
    };

    let mut overview = vec![Section::guarded("Mean supplier resilience by country", |title| {
        let means = aggregate::sort_by_mean(country_resilience()?, true);
        Ok(Section::new(
            title,
            Content::Bars(mean_bars("Resilience index", "Country", &means).horizontal()),
        )
        .with_caption("Mean resilience index of each country's suppliers."))
    })];
    match country_resilience() {
        Ok(means) => {
            let high = aggregate::top_n(&aggregate::sort_by_mean(means.clone(), true), 10);
            let low = aggregate::top_n(&aggregate::sort_by_mean(means, false), 10);
            overview.push(mean_table(
                "Top 10 countries with the most reliable suppliers",
                "Country",
                "Resilience index",
                &high,
            ));
            overview.push(mean_table(
                "Top 10 countries with the least reliable suppliers",
                "Country",
                "Resilience index",
                &low,
            ));
        }
        Err(e) => overview.push(Section::guarded("Country rankings", |_| Err(e))),
    }
    overview.push(Section::guarded("Risk score distribution", |title| {
        Ok(histogram_section(title, "Risk score", reuse(&risk)?))
    }));
    overview.push(Section::guarded("Resilience index distribution", |title| {
        Ok(histogram_section(
            title,
            "Resilience index",
            reuse(&resilience)?,
        ))
    }));

    let lead_times = columns::numeric(df, "lead_time_days");
    let deviation = columns::numeric(df, "delivery_time_deviation");

    let mut delivery = vec![Section::guarded("Lead time distribution", |title| {
        Ok(histogram_section(
            title,
            "Lead time (days)",
            reuse(&lead_times)?,
        ))
    })];
    match (reuse(&countries), reuse(&lead_times)) {
        (Ok(c), Ok(l)) => {
            let (long, short) =
                best_and_worst(aggregate::group_mean(c, l), 10, "Mean lead time (days)", "Country");
            delivery.push(Section::new(
                "Top 10 countries with the longest mean lead time",
                Content::Bars(long),
            ));
            delivery.push(Section::new(
                "Top 10 countries with the shortest mean lead time",
                Content::Bars(short),
            ));
        }
        (Err(e), _) | (_, Err(e)) => {
            delivery.push(Section::guarded("Lead time by country", |_| Err(e)))
        }
    }
    delivery.push(Section::guarded("Delivery deviation from plan", |title| {
        let dev = reuse(&deviation)?;
        let late = share_where(dev, total, |v| v > 0.0);
        let early = share_where(dev, total, |v| v < 0.0);
        Ok(histogram_section(title, "Deviation (days)", dev)
            .with_caption(format!(
                "Late deliveries: {}. Early deliveries: {}.",
                fmt_percent(late),
                fmt_percent(early)
            )))
    }));
    delivery.push(Section::guarded("Delivery deviation by country (top 10)", |title| {
        let countries = columns::text(df, "supplier_country")?;
        let dev = reuse(&deviation)?;
        let top = aggregate::top_n(&aggregate::value_counts(&countries, &[]), 10);
        let boxes = top
            .iter()
            .filter_map(|c| {
                let values: Vec<Option<f64>> = countries
                    .iter()
                    .zip(dev.iter())
                    .map(|(k, v)| v.filter(|_| k.as_deref() == Some(c.label.as_str())))
                    .collect();
                StatsCalculator::box_summary(&c.label, &values)
            })
            .collect();
        Ok(Section::new(
            title,
            Content::Boxes(BoxChart {
                x_label: "Country".to_string(),
                y_label: "Deviation (days)".to_string(),
                boxes,
            }),
        ))
    }));
    match reuse(&resilience).and_then(|r| supplier_tables(df, r)) {
        Ok(sections) => delivery.extend(sections),
        Err(e) => delivery.push(Section::guarded("Supplier rankings", |_| Err(e))),
    }
    if columns::has_column(df, "risk_classification") {
        delivery.push(Section::guarded("Analysis by risk category", |title| {
            classification_summary(title, df, reuse(&risk)?)
        }));
    }

    let correlations = vec![Section::guarded("Correlation matrix", |title| {
        correlation_section(title, df, &CORRELATED)
    })];

    let mut summary = Vec::new();
    if let Ok(l) = &lead_times {
        summary.push(format!(
            "{} of lead times exceed 5 days.",
            fmt_percent(share_where(l, total, |v| v > 5.0))
        ));
    }
    if let Ok(d) = &deviation {
        summary.push(format!(
            "{} of deliveries arrive later than planned.",
            fmt_percent(share_where(d, total, |v| v > 0.0))
        ));
    }
    if let Ok(r) = &resilience {
        summary.push(format!(
            "Mean resilience index: {}.",
            fmt_float(StatsCalculator::mean(r), 3)
        ));
    }

    Page {
        id: PageId::SupplyChain,
        title: "Risk analysis: suppliers and logistics resilience".to_string(),
        context: vec![
            "Supply Chain Dataset: product-level supplier records with route risk, disruption likelihood, delay probability, lead times and reliability scores.".to_string(),
            "Risk_Score is the weighted mean of route risk, disruption likelihood, delay probability and delivery deviation. Resilience_Index = supplier_reliability_score x (1 - Risk_Score).".to_string(),
        ],
        kpis,
        preview: opts.preview(df),
        tabs: vec![
            Tab::new("Overview", overview),
            Tab::new("Lead times and delivery", delivery),
            Tab::new("Correlation matrix", correlations),
        ],
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn derived_scores_follow_the_weighting() {
        let df = DataFrame::new(vec![
            Column::new("route_risk_level".into(), vec![10.0, 0.0]),
            Column::new("disruption_likelihood_score".into(), vec![1.0, 0.0]),
            Column::new("delay_probability".into(), vec![1.0, 0.0]),
            Column::new("delivery_time_deviation".into(), vec![10.0, -3.0]),
            Column::new("supplier_reliability_score".into(), vec![0.8, 0.9]),
        ])
        .unwrap();
        let risk = risk_scores(&df);
        let resilience = resilience_index(&df, &risk).unwrap();
        let risk = risk.unwrap();
        assert!((risk[0].unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(risk[1], Some(0.0));
        assert!((resilience[0].unwrap()).abs() < 1e-12);
        assert!((resilience[1].unwrap() - 0.9).abs() < 1e-12);
    }
}
