//! Maritime accidents in the Baltic Sea (HELCOM 2003-2023).

use super::{count_bars, keyed_bars, mean_line, reuse, year_range, PageOptions};
use crate::data::{columns, ColumnError, GroupKey};
use crate::navigation::PageId;
use crate::page::{
    fmt_count, fmt_float, fmt_range, BarChart, Content, GeoPoint, GeoPoints, Heatmap,
    HistogramChart, Kpi, Page, Section, Tab,
};
use crate::stats::aggregate;
use crate::stats::{Component, Normalization, QuantileBands, StatsCalculator};
use polars::prelude::DataFrame;

pub const RISK_CLASSES: [&str; 4] = ["Low", "Medium", "High", "Critical"];

const RISK_HISTOGRAM_BINS: usize = 80;

/// `Risk_Score` when exported, otherwise
/// 0.5 Damage_Severe + 0.3 Pollution_Score + 0.2 Ship_Profile_Score.
pub fn risk_scores(df: &DataFrame) -> Result<Vec<Option<f64>>, ColumnError> {
    if let Some(scores) = columns::numeric_opt(df, "Risk_Score") {
        return Ok(scores);
    }

    columns::require(df, &["Damage_Severe", "Pollution_Score", "Ship_Profile_Score"])?;
    let damage = columns::numeric(df, "Damage_Severe")?;
    let pollution = columns::numeric(df, "Pollution_Score")?;
    let profile = columns::numeric(df, "Ship_Profile_Score")?;

    Ok(StatsCalculator::composite_score(&[
        Component::new(&damage, 0.5, Normalization::Unit),
        Component::new(&pollution, 0.3, Normalization::Unit),
        Component::new(&profile, 0.2, Normalization::Unit),
    ]))
}

/// Quartile bands of the risk score mapped to Low/Medium/High/Critical.
pub fn risk_classes(risk: &[Option<f64>]) -> (Option<QuantileBands>, Vec<Option<String>>) {
    match QuantileBands::quartiles(risk) {
        Some(bands) => {
            let labels = bands.label_all(risk, &RISK_CLASSES);
            (Some(bands), labels)
        }
        None => (None, vec![None; risk.len()]),
    }
}

fn accident_map(title: &str, df: &DataFrame) -> Result<Section, ColumnError> {
    columns::require(df, &["Latitude", "Longitude"])?;
    let lat = columns::numeric(df, "Latitude")?;
    let lon = columns::numeric(df, "Longitude")?;
    let types = columns::text(df, "Acc_Type").unwrap_or_else(|_| vec![None; df.height()]);

    let mut points = Vec::new();
    let mut dropped = 0;
    for ((la, lo), label) in lat.iter().zip(lon.iter()).zip(types) {
        match (la, lo) {
            (Some(la), Some(lo)) if la.abs() <= 90.0 && lo.abs() <= 180.0 => {
                points.push(GeoPoint {
                    lat: *la,
                    lon: *lo,
                    label,
                })
            }
            _ => dropped += 1,
        }
    }

    Ok(Section::new(
        title,
        Content::Geo(GeoPoints { points, dropped }),
    ))
}

fn crosstab_section(
    title: &str,
    df: &DataFrame,
    rows: (&str, &[Option<GroupKey>]),
    cols: (&str, &[Option<GroupKey>]),
    col_order: Option<&[&str]>,
) -> Section {
    Section::new(
        title,
        Content::Heatmap(Heatmap {
            x_label: cols.0.to_string(),
            y_label: rows.0.to_string(),
            pivot: aggregate::crosstab(rows.1, cols.1, None, col_order),
            decimals: 0,
        }),
    )
    .with_caption(format!("{} recorded accidents.", fmt_count(df.height() as f64)))
}

pub fn build(df: &DataFrame, opts: &PageOptions) -> Page {
    let total = df.height();
    let risk = risk_scores(df);
    let (bands, classes) = match &risk {
        Ok(r) => risk_classes(r),
        Err(_) => (None, vec![None; total]),
    };
    let types = columns::text(df, "Acc_Type");
    let locations = columns::text(df, "Location");
    let years = columns::numeric(df, "Year");

    let pollution = match columns::numeric_opt(df, "Pollution_Score") {
        Some(values) => {
            let sum = StatsCalculator::sum(&values);
            if sum > 0.0 {
                format!("{} tonnes", fmt_float(Some(sum), 2))
            } else {
                "Data unavailable".to_string()
            }
        }
        None => "Data unavailable".to_string(),
    };
    let most_common = |values: &Result<Vec<Option<String>>, ColumnError>| {
        values
            .as_ref()
            .ok()
            .and_then(|v| aggregate::mode(v))
            .unwrap_or_else(|| "n/a".to_string())
    };
    let distinct_years = years
        .as_ref()
        .map(|y| {
            let mut seen: Vec<i64> = y.iter().flatten().map(|v| *v as i64).collect();
            seen.sort_unstable();
            seen.dedup();
            seen.len()
        })
        .unwrap_or(0);

    let kpis = vec![
        Kpi::new("Total accidents", fmt_count(total as f64)),
        Kpi::new("Most frequent accident type", most_common(&types)),
        Kpi::new(
            "Time span",
            fmt_range(years.as_ref().ok().and_then(|y| year_range(y))),
        ),
        Kpi::new("Distinct years", distinct_years.to_string()),
        Kpi::new("Most affected zone", most_common(&locations)),
        Kpi::new("Total pollution (tonnes)", pollution),
    ];

    let class_keys = columns::text_keys(&classes);
    let overview = vec![
        Section::guarded("Accidents by type", |title| {
            let counts = aggregate::value_counts(reuse(&types)?, &[]);
            Ok(Section::new(
                title,
                Content::Bars(count_bars("Accidents", "Accident type", &counts)),
            ))
        }),
        Section::guarded("Accidents by geographic zone", |title| {
            let counts = aggregate::value_counts(reuse(&locations)?, &[]);
            let chart = BarChart::from_pairs(
                "Zone",
                "Accidents",
                counts.iter().map(|c| (c.label.clone(), c.count as f64)),
            )
            .with_shares();
            Ok(Section::new(title, Content::Shares(chart))
                .with_caption("Port: within 3 km of a port. Port approach: within 10 km. Sea: beyond 10 km. Open sea: beyond 22 km from the coast."))
        }),
        Section::guarded("Risk classes", |title| {
            reuse(&risk)?;
            let counts = aggregate::value_counts(&classes, &[]);
            let pairs = RISK_CLASSES.iter().map(|class| {
                let n = counts
                    .iter()
                    .find(|c| c.label == *class)
                    .map(|c| c.count)
                    .unwrap_or(0);
                (class.to_string(), n as f64)
            });
            let chart = BarChart::from_pairs("Risk class", "Accidents", pairs).with_shares();
            let mut section = Section::new(title, Content::Shares(chart));
            if let Some(bands) = &bands {
                let cuts: Vec<String> = bands
                    .edges
                    .windows(2)
                    .zip(RISK_CLASSES)
                    .map(|(w, class)| format!("{}: {:.4} - {:.4}", class, w[0], w[1]))
                    .collect();
                section = section.with_caption(format!(
                    "Quartile thresholds computed on the current data. {}",
                    cuts.join("; ")
                ));
            }
            Ok(section)
        }),
        Section::guarded("Risk score distribution", |title| {
            let histogram = StatsCalculator::histogram(reuse(&risk)?, RISK_HISTOGRAM_BINS);
            Ok(Section::new(
                title,
                Content::Histogram(HistogramChart {
                    x_label: "Risk score".to_string(),
                    histogram,
                    log_y: true,
                }),
            )
            .with_caption("Composite of damage severity, pollution and ship profile; accident counts on a log scale."))
        }),
    ];

    let year_keys = columns::keys(df, "Year");
    let temporal = vec![
        Section::guarded("Maritime accident map", |title| accident_map(title, df)),
        Section::guarded("Accidents per year", |title| {
            let counts = aggregate::counts_by_key(reuse(&year_keys)?);
            Ok(Section::new(
                title,
                Content::Bars(keyed_bars("Year", "Accidents", &counts)),
            ))
        }),
        Section::guarded("Mean risk score per year", |title| {
            let means = aggregate::group_mean(reuse(&year_keys)?, reuse(&risk)?);
            Ok(Section::new(
                title,
                Content::Lines(mean_line("Year", "Mean risk score", "Risk score", &means)),
            ))
        }),
    ];

    let heatmaps = vec![
        Section::guarded("Accident type vs geographic zone", |title| {
            columns::require(df, &["Acc_Type", "Geo_Zone"])?;
            Ok(crosstab_section(
                title,
                df,
                ("Type", &columns::keys(df, "Acc_Type")?),
                ("Zone", &columns::keys(df, "Geo_Zone")?),
                None,
            ))
        }),
        Section::guarded("Geographic zone vs risk class", |title| {
            reuse(&risk)?;
            Ok(crosstab_section(
                title,
                df,
                ("Zone", &columns::keys(df, "Geo_Zone")?),
                ("Risk class", &class_keys),
                Some(&RISK_CLASSES[..]),
            ))
        }),
        Section::guarded("Accident type vs risk class", |title| {
            reuse(&risk)?;
            Ok(crosstab_section(
                title,
                df,
                ("Type", &columns::keys(df, "Acc_Type")?),
                ("Risk class", &class_keys),
                Some(&RISK_CLASSES[..]),
            ))
        }),
        Section::guarded("Mean risk by zone", |title| {
            columns::require(df, &["Geo_Latitude_Zone", "Geo_Longitude_Zone"])?;
            let pivot = aggregate::pivot_mean(
                &columns::keys(df, "Geo_Latitude_Zone")?,
                &columns::keys(df, "Geo_Longitude_Zone")?,
                reuse(&risk)?,
                None,
                None,
            );
            Ok(Section::new(
                title,
                Content::Heatmap(Heatmap {
                    x_label: "Longitude zone".to_string(),
                    y_label: "Latitude zone".to_string(),
                    pivot,
                    decimals: 3,
                }),
            ))
        }),
    ];

    let mut summary = vec![format!("{} maritime accidents analysed.", fmt_count(total as f64))];
    if let Ok(types) = &types {
        if let Some(top) = aggregate::value_counts(types, &[]).first() {
            summary.push(format!(
                "Most frequent type: {} ({} accidents).",
                top.label,
                fmt_count(top.count as f64)
            ));
        }
    }
    let critical = classes.iter().flatten().filter(|c| c.as_str() == "Critical").count();
    if bands.is_some() && total > 0 {
        summary.push(format!(
            "{:.1} % of accidents fall in the critical risk quartile.",
            critical as f64 / total as f64 * 100.0
        ));
    }
    if let Ok(r) = &risk {
        summary.push(format!(
            "Mean risk score: {}.",
            fmt_float(StatsCalculator::mean(r), 3)
        ));
    }

    Page {
        id: PageId::Shipping,
        title: "Risk analysis: maritime accidents (Baltic Sea)".to_string(),
        context: vec![
            "HELCOM accident records for the Baltic Sea (2003-2023), located against world port and coastline references.".to_string(),
            "Risk_Score = 0.5 x Damage_Severe + 0.3 x Pollution_Score + 0.2 x Ship_Profile_Score, between 0 and 1.".to_string(),
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

    #[test]
    fn risk_classes_cover_all_scored_rows() {
        let risk: Vec<Option<f64>> = vec![Some(0.1), Some(0.4), None, Some(0.2), Some(0.9)];
        let (bands, classes) = risk_classes(&risk);
        assert_eq!(bands.unwrap().band_count(), 4);
        assert_eq!(classes[0].as_deref(), Some("Low"));
        assert_eq!(classes[2], None);
        assert_eq!(classes[4].as_deref(), Some("Critical"));
    }
}
