//! Railroad accidents (FRA accident/incident reports).

use super::{
    correlation_section, count_bars, keyed_bars, mean_line, multi_line, reuse, year_range,
    PageOptions,
};
use crate::data::{columns, ColumnError, GroupKey};
use crate::navigation::PageId;
use crate::page::{
    fmt_count, fmt_range, BarChart, Content, GeoPoint, GeoPoints, Heatmap, Kpi, Page, Section,
    Tab, TableView,
};
use crate::stats::aggregate;
use crate::stats::{Component, Normalization, QuantileBands, StatsCalculator};
use polars::prelude::DataFrame;

pub const CRITICALITY_LEVELS: [&str; 3] = ["Low", "Medium", "High"];
pub const TIME_OF_DAY: [&str; 6] = [
    "Early morning",
    "Late morning",
    "Afternoon",
    "Evening",
    "Dark",
    "Dawn",
];

/// Lat/lon box of the contiguous United States.
pub const US_LATITUDE: (f64, f64) = (24.5, 49.5);
pub const US_LONGITUDE: (f64, f64) = (-125.0, -66.0);

pub const INDICATORS: [(&str, &str); 6] = [
    ("Total Damage Cost", "Total damage cost"),
    ("Total Persons Killed", "Persons killed"),
    ("Total Persons Injured", "Persons injured"),
    ("Hazmat Cars", "Hazmat cars"),
    ("Hazmat Cars Damaged", "Hazmat cars damaged"),
    ("Persons Evacuated", "Persons evacuated"),
];

const COMPOSITE: (&str, &str) = ("Risque_composite", "Composite risk");

fn criticality_label(raw: &str) -> String {
    match raw.trim().to_lowercase().as_str() {
        "low" | "faible" => "Low".to_string(),
        "medium" | "moyen" => "Medium".to_string(),
        "high" | "élevé" | "eleve" | "elevé" => "High".to_string(),
        _ => raw.trim().to_string(),
    }
}

fn time_of_day_label(raw: &str) -> String {
    let slot = match raw.trim().to_lowercase().as_str() {
        "early morning" | "tôt le matin" => 0,
        "late morning" | "fin de matinée" => 1,
        "afternoon" | "après-midi" => 2,
        "evening" | "soirée" => 3,
        "dark" | "nuit" => 4,
        "dawn" | "aube" => 5,
        _ => return raw.trim().to_string(),
    };
    TIME_OF_DAY[slot].to_string()
}

fn sum_columns(df: &DataFrame, names: &[&str]) -> Result<Vec<Option<f64>>, ColumnError> {
    let mut total = vec![Some(0.0); df.height()];
    for name in names {
        for (acc, v) in total.iter_mut().zip(columns::numeric(df, name)?) {
            *acc = match (*acc, v) {
                (Some(a), Some(v)) => Some(a + v),
                _ => None,
            };
        }
    }
    Ok(total)
}

/// `Risque_composite` when exported, otherwise 0.4 casualties + 0.4 damage +
/// 0.2 hazmat/evacuation, each min-max normalized.
pub fn composite_risk(df: &DataFrame) -> Result<Vec<Option<f64>>, ColumnError> {
    if let Some(risk) = columns::numeric_opt(df, COMPOSITE.0) {
        return Ok(risk);
    }

    columns::require(
        df,
        &[
            "Total Persons Killed",
            "Total Persons Injured",
            "Total Damage Cost",
            "Hazmat Cars Damaged",
            "Persons Evacuated",
        ],
    )?;
    let casualties = sum_columns(df, &["Total Persons Killed", "Total Persons Injured"])?;
    let damage = columns::numeric(df, "Total Damage Cost")?;
    let hazmat = sum_columns(df, &["Hazmat Cars Damaged", "Persons Evacuated"])?;

    Ok(StatsCalculator::composite_score(&[
        Component::new(&casualties, 0.4, Normalization::MinMax),
        Component::new(&damage, 0.4, Normalization::MinMax),
        Component::new(&hazmat, 0.2, Normalization::MinMax),
    ]))
}

/// `Niveau_criticité` when exported, otherwise tertile bands of the composite.
pub fn criticality(
    df: &DataFrame,
    composite: &Result<Vec<Option<f64>>, ColumnError>,
) -> Result<Vec<Option<String>>, ColumnError> {
    if columns::has_column(df, "Niveau_criticité") {
        return Ok(columns::text(df, "Niveau_criticité")?
            .into_iter()
            .map(|v| v.map(|s| criticality_label(&s)))
            .collect());
    }

    let risk = reuse(composite)?;
    Ok(match QuantileBands::fit(risk, 3) {
        Some(bands) => bands.label_all(risk, &CRITICALITY_LEVELS),
        None => vec![None; risk.len()],
    })
}

fn incident_map(title: &str, df: &DataFrame, levels: &[Option<String>]) -> Result<Section, ColumnError> {
    columns::require(df, &["Latitude", "Longitude"])?;
    let lat = columns::numeric(df, "Latitude")?;
    let lon = columns::numeric(df, "Longitude")?;

    let mut points = Vec::new();
    let mut dropped = 0;
    for (i, (la, lo)) in lat.iter().zip(lon.iter()).enumerate() {
        match (la, lo) {
            (Some(la), Some(lo))
                if (US_LATITUDE.0..=US_LATITUDE.1).contains(la)
                    && (US_LONGITUDE.0..=US_LONGITUDE.1).contains(lo) =>
            {
                points.push(GeoPoint {
                    lat: *la,
                    lon: *lo,
                    label: levels.get(i).cloned().flatten(),
                })
            }
            _ => dropped += 1,
        }
    }

    Ok(Section::new(
        title,
        Content::Geo(GeoPoints { points, dropped }),
    )
    .with_caption("Incidents inside the contiguous United States, coloured by criticality."))
}

fn county_tables(df: &DataFrame) -> Result<Vec<Section>, ColumnError> {
    let counties = columns::text(df, "County Name")?;
    let counts = aggregate::value_counts(&counties, &[]);

    let table = |rows: &[aggregate::CategoryCount]| {
        let mut t = TableView::new(&["County", "Incidents"]);
        for c in rows {
            t.push(vec![c.label.clone(), fmt_count(c.count as f64)]);
        }
        t
    };
    let least = &counts[counts.len().saturating_sub(10)..];

    Ok(vec![
        Section::new("Top 10 most affected counties", Content::Table(table(&aggregate::top_n(&counts, 10)))),
        Section::new("Top 10 least affected counties (at least one incident)", Content::Table(table(least))),
    ])
}

/// One series per accident type over the report years.
fn types_over_time(title: &str, df: &DataFrame) -> Result<Section, ColumnError> {
    columns::require(df, &["Report Year", "Accident Type"])?;
    let years = columns::keys(df, "Report Year")?;
    let types = columns::keys(df, "Accident Type")?;
    let table = aggregate::crosstab(&types, &years, None, None);

    let series = table
        .rows
        .iter()
        .zip(table.cells.iter())
        .map(|(label, row)| (label.clone(), row.clone()))
        .collect();
    Ok(Section::new(
        title,
        Content::Lines(multi_line("Year", "Incidents", table.columns.clone(), series)),
    ))
}

pub fn build(df: &DataFrame, opts: &PageOptions) -> Page {
    let total = df.height();
    let composite = composite_risk(df);
    let levels = criticality(df, &composite);
    let types = columns::text(df, "Accident Type");

    let sum = |col: &str| columns::numeric(df, col).ok().map(|v| StatsCalculator::sum(&v));
    let damage = columns::numeric(df, "Total Damage Cost").ok();
    let states = columns::text(df, "State Name").ok();

    let damage_state = match (&states, &damage) {
        (Some(states), Some(damage)) => {
            let totals = aggregate::group_sum(&columns::text_keys(states), damage);
            totals
                .into_iter()
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(k, _)| k.to_string())
        }
        _ => None,
    };
    let top_state = states.as_ref().and_then(|s| aggregate::mode(s));
    let years = columns::numeric(df, "Report Year").ok().and_then(|y| year_range(&y));
    let count_or_na = |v: Option<f64>| v.map(fmt_count).unwrap_or_else(|| "n/a".to_string());
    let dollars = |v: Option<f64>| {
        v.map(|d| format!("${}", fmt_count(d)))
            .unwrap_or_else(|| "n/a".to_string())
    };

    let kpis = vec![
        Kpi::new("Total incidents", fmt_count(total as f64)),
        Kpi::new("Persons killed", count_or_na(sum("Total Persons Killed"))),
        Kpi::new("Persons injured", count_or_na(sum("Total Persons Injured"))),
        Kpi::new("Most damaged state ($)", damage_state.clone().unwrap_or_else(|| "n/a".to_string())),
        Kpi::new("Total damage", dollars(damage.as_ref().map(|d| StatsCalculator::sum(d)))),
        Kpi::new("Mean damage", dollars(damage.as_ref().and_then(|d| StatsCalculator::mean(d)))),
        Kpi::new("Most frequent state", top_state.clone().unwrap_or_else(|| "n/a".to_string())),
        Kpi::new("Time span", fmt_range(years)),
    ];

    let mut overview = vec![Section::guarded("Incidents by accident type", |title| {
        let counts = aggregate::value_counts(reuse(&types)?, &[]);
        Ok(Section::new(
            title,
            Content::Bars(count_bars("Incidents", "Accident type", &counts)),
        ))
    })];

    for (col, label) in INDICATORS {
        let title = format!("Mean {} by accident type", label.to_lowercase());
        overview.push(Section::guarded(&title, |title| {
            let types = reuse(&types)?;
            let means = aggregate::sort_by_mean(
                aggregate::group_mean(&columns::text_keys(types), &columns::numeric(df, col)?),
                true,
            );
            Ok(Section::new(
                title,
                Content::Bars(super::mean_bars(label, "Accident type", &means).horizontal()),
            ))
        }));
    }

    overview.push(Section::guarded("Criticality levels", |title| {
        let counts = aggregate::value_counts(reuse(&levels)?, &[]);
        let chart = BarChart::from_pairs(
            "Criticality",
            "Incidents",
            counts.iter().map(|c| (c.label.clone(), c.count as f64)),
        )
        .with_shares();
        Ok(Section::new(title, Content::Shares(chart)))
    }));
    overview.push(Section::guarded("Railroad incident map", |title| {
        let empty = Vec::new();
        let levels = levels.as_ref().unwrap_or(&empty);
        incident_map(title, df, levels)
    }));
    match county_tables(df) {
        Ok(sections) => overview.extend(sections),
        Err(e) => overview.push(Section::guarded("Most and least affected counties", |_| Err(e))),
    }

    let temporal = vec![
        Section::guarded("Incidents per year", |title| {
            let counts = aggregate::counts_by_key(&columns::keys(df, "Report Year")?);
            Ok(Section::new(
                title,
                Content::Bars(keyed_bars("Year", "Incidents", &counts)),
            ))
        }),
        Section::guarded("Accident types over time", |title| types_over_time(title, df)),
        Section::guarded("Mean composite risk per year", |title| {
            let means = aggregate::group_mean(&columns::keys(df, "Report Year")?, reuse(&composite)?);
            Ok(Section::new(
                title,
                Content::Lines(mean_line("Year", "Mean composite risk", "Composite risk", &means)),
            ))
        }),
        Section::guarded("Incidents by time of day", |title| {
            let times: Vec<Option<GroupKey>> = columns::text(df, "TimeOfDay")?
                .into_iter()
                .map(|v| v.map(|s| GroupKey::Text(time_of_day_label(&s))))
                .collect();
            let pivot = aggregate::crosstab(
                &times,
                &columns::text_keys(reuse(&levels)?),
                Some(&TIME_OF_DAY[..]),
                Some(&CRITICALITY_LEVELS[..]),
            );
            Ok(Section::new(
                title,
                Content::Heatmap(Heatmap {
                    x_label: "Criticality".to_string(),
                    y_label: "Time of day".to_string(),
                    pivot,
                    decimals: 0,
                }),
            ))
        }),
    ];

    let general: Vec<(&str, &str)> = INDICATORS.iter().copied().chain([COMPOSITE]).collect();
    let hazmat: Vec<(&str, &str)> = INDICATORS[3..].iter().copied().chain([COMPOSITE]).collect();
    let correlations = vec![
        Section::guarded("General correlation", |title| {
            correlation_section(title, df, &general)
        }),
        Section::guarded("Hazardous materials and risk correlation", |title| {
            correlation_section(title, df, &hazmat)
        }),
    ];

    let mut summary = Vec::new();
    if let (Some(state), Some(states), Some(damage)) = (&top_state, &states, &damage) {
        let state_damage: f64 = states
            .iter()
            .zip(damage.iter())
            .filter(|(s, _)| s.as_deref() == Some(state.as_str()))
            .filter_map(|(_, d)| *d)
            .sum();
        summary.push(format!(
            "{} is the most frequently affected state, with ${} of cumulative damage.",
            state,
            fmt_count(state_damage)
        ));
    }
    if let Ok(years) = columns::keys(df, "Report Year") {
        if let Some((year, count)) = aggregate::counts_by_key(&years)
            .into_iter()
            .max_by_key(|(_, c)| *c)
        {
            summary.push(format!("Peak year: {} with {} incidents.", year, fmt_count(count as f64)));
        }
    }
    if let Ok(levels) = &levels {
        let high = levels.iter().flatten().filter(|l| l.as_str() == "High").count();
        if total > 0 {
            summary.push(format!(
                "{:.1} % of incidents are rated high criticality.",
                high as f64 / total as f64 * 100.0
            ));
        }
    }

    Page {
        id: PageId::Railroad,
        title: "Risk analysis: rail transport".to_string(),
        context: vec![
            "Railroad Accident/Incident Data: FRA reports for accidents on the US rail network, with damage cost, casualties, hazardous materials and location.".to_string(),
            "Risque_composite aggregates casualties, damage cost and hazardous material exposure; values are banded into a Low / Medium / High criticality level.".to_string(),
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
    fn map_drops_points_outside_the_us_box() {
        let df = DataFrame::new(vec![
            Column::new("Latitude".into(), vec![Some(40.0), Some(10.0), None, Some(30.0)]),
            Column::new("Longitude".into(), vec![Some(-100.0), Some(-100.0), Some(-90.0), Some(-130.0)]),
        ])
        .unwrap();
        let section = incident_map("Map", &df, &[]).unwrap();
        match section.content {
            Content::Geo(geo) => {
                assert_eq!(geo.points.len(), 1);
                assert_eq!(geo.dropped, 3);
            }
            _ => panic!("expected a map"),
        }
    }

    #[test]
    fn criticality_falls_back_to_tertiles() {
        let df = DataFrame::new(vec![Column::new(
            "Risque_composite".into(),
            vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
        )])
        .unwrap();
        let composite = composite_risk(&df);
        let levels = criticality(&df, &composite).unwrap();
        assert_eq!(levels[0].as_deref(), Some("Low"));
        assert_eq!(levels[5].as_deref(), Some("High"));
        assert!(levels.iter().all(|l| l.is_some()));
    }

    #[test]
    fn french_criticality_labels_are_translated() {
        assert_eq!(criticality_label("Élevé"), "High");
        assert_eq!(criticality_label("Moyen"), "Medium");
        assert_eq!(time_of_day_label("Soirée"), "Evening");
    }

    #[test]
    fn least_affected_counties_are_the_ten_smallest() {
        let mut counties = vec!["A", "A", "A", "B", "B"];
        counties.extend(["C", "D", "E", "F", "G", "H", "I", "J", "K", "L"]);
        let df = DataFrame::new(vec![Column::new("County Name".into(), counties)]).unwrap();

        let sections = county_tables(&df).unwrap();
        let first_column = |section: &Section| match &section.content {
            Content::Table(t) => t.rows.iter().map(|r| r[0].clone()).collect::<Vec<_>>(),
            other => panic!("expected a table, got {:?}", other),
        };
        assert_eq!(first_column(&sections[0])[..2], ["A", "B"]);
        assert_eq!(
            first_column(&sections[1]),
            vec!["C", "D", "E", "F", "G", "H", "I", "J", "K", "L"]
        );
    }

    #[test]
    fn time_of_day_rows_merge_both_languages() {
        let df = DataFrame::new(vec![
            Column::new(
                "TimeOfDay".into(),
                vec!["EARLY MORNING", "AFTERNOON", "DARK", "Tôt le matin", "Après-midi", "DAWN"],
            ),
            Column::new(
                "Niveau_criticité".into(),
                vec!["Faible", "Élevé", "Moyen", "Faible", "High", "Low"],
            ),
        ])
        .unwrap();
        let page = build(&df, &PageOptions { preview_rows: 0 });

        let section = page
            .tabs
            .iter()
            .flat_map(|t| t.sections.iter())
            .find(|s| s.title == "Incidents by time of day")
            .unwrap();
        let pivot = match &section.content {
            Content::Heatmap(h) => &h.pivot,
            other => panic!("expected a heatmap, got {:?}", other),
        };
        assert_eq!(pivot.rows, TIME_OF_DAY.to_vec());
        assert_eq!(pivot.get("Early morning", "Low"), Some(2.0));
        assert_eq!(pivot.get("Afternoon", "High"), Some(2.0));
        assert_eq!(pivot.get("Dark", "Medium"), Some(1.0));
        assert_eq!(pivot.get("Dawn", "Low"), Some(1.0));
        assert_eq!(pivot.get("Evening", "Low"), Some(0.0));
    }
}
