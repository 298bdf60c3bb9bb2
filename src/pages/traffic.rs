//! Road traffic accidents (US Accidents 2016-2023).

use super::{keyed_bars, mean_line, reuse, share_of, year_range, PageOptions};
use crate::data::{columns, ColumnError, DataProcessor, GroupKey, WEATHER_ORDER, WEEKDAYS};
use crate::navigation::PageId;
use crate::page::{
    fmt_count, fmt_float, fmt_percent, fmt_range, BarChart, BarItem, Content, Heatmap, Kpi, Page,
    Section, Tab,
};
use crate::stats::aggregate;
use crate::stats::{Component, Normalization, StatsCalculator};
use polars::prelude::DataFrame;

pub const PEAK_HOUR: [&str; 2] = ["Peak Hour Congestion", "Heure de Pointe"];
pub const INFRASTRUCTURE_BLOCK: [&str; 2] = ["High Infrastructure Block", "Blocage Infrastructure"];
pub const WEATHER_DISRUPTION: [&str; 2] = ["Weather Disruption", "Perturbation Météo"];

/// Weather contribution to the derived risk score.
fn weather_factor(label: &str) -> f64 {
    match label {
        "Thunderstorm" => 1.0,
        "Snow" => 0.9,
        "Fog" => 0.7,
        "Rain" => 0.6,
        "Clear" => 0.0,
        _ => 0.3,
    }
}

/// `Risk_Score` when exported, otherwise 0.5 severity + 0.3 duration + 0.2 weather.
pub fn risk_scores(df: &DataFrame) -> Result<Vec<Option<f64>>, ColumnError> {
    if let Some(scores) = columns::numeric_opt(df, "Risk_Score") {
        return Ok(scores);
    }

    columns::require(df, &["Severity", "Duration(min)", "Main_Weather"])?;
    let severity = columns::numeric(df, "Severity")?;
    let duration = columns::numeric(df, "Duration(min)")?;
    let weather: Vec<Option<f64>> = columns::text(df, "Main_Weather")?
        .iter()
        .map(|w| Some(weather_factor(DataProcessor::normalize_weather(w.as_deref()))))
        .collect();

    Ok(StatsCalculator::composite_score(&[
        Component::new(&severity, 0.5, Normalization::Range(1.0, 4.0)),
        Component::new(&duration, 0.3, Normalization::MinMax),
        Component::new(&weather, 0.2, Normalization::Unit),
    ]))
}

/// Hour, weekday (0 = Monday) and month keys, plus the year of each row.
pub struct TimeColumns {
    pub hour: Vec<Option<GroupKey>>,
    pub weekday: Vec<Option<GroupKey>>,
    pub month: Vec<Option<GroupKey>>,
    pub year: Vec<Option<f64>>,
}

pub fn time_columns(df: &DataFrame) -> Result<TimeColumns, ColumnError> {
    let parts = if columns::has_column(df, "Start_Time") {
        Some(DataProcessor::time_parts_column(&columns::text(df, "Start_Time")?))
    } else {
        None
    };

    let exported = ["HourOfDay", "DayOfWeek", "Month"]
        .iter()
        .all(|c| columns::has_column(df, c));

    let (hour, weekday, month) = if exported {
        (
            columns::keys(df, "HourOfDay")?,
            columns::keys(df, "DayOfWeek")?,
            columns::keys(df, "Month")?,
        )
    } else {
        let parts = parts
            .as_ref()
            .ok_or_else(|| ColumnError::Missing(vec!["Start_Time".to_string()]))?;
        let derive = |f: fn(&crate::data::TimeParts) -> i64| -> Vec<Option<GroupKey>> {
            parts.iter().map(|p| p.as_ref().map(|p| GroupKey::Int(f(p)))).collect()
        };
        (
            derive(|p| p.hour as i64),
            derive(|p| p.weekday as i64),
            derive(|p| p.month as i64),
        )
    };

    let year = match &parts {
        Some(parts) => parts.iter().map(|p| p.map(|p| p.year as f64)).collect(),
        None => vec![None; df.height()],
    };

    Ok(TimeColumns {
        hour,
        weekday,
        month,
        year,
    })
}

fn weather_keys(df: &DataFrame) -> Result<Vec<Option<GroupKey>>, ColumnError> {
    Ok(columns::text(df, "Main_Weather")?
        .iter()
        .map(|w| Some(GroupKey::from(DataProcessor::normalize_weather(w.as_deref()))))
        .collect())
}

fn slot_keys(hours: &[Option<GroupKey>]) -> Vec<Option<GroupKey>> {
    hours
        .iter()
        .map(|h| {
            h.as_ref()
                .and_then(GroupKey::as_int)
                .filter(|h| (0..24).contains(h))
                .map(|h| GroupKey::Text(DataProcessor::two_hour_slot(h as u32)))
        })
        .collect()
}

fn weekday_keys(days: &[Option<GroupKey>]) -> Vec<Option<GroupKey>> {
    days.iter()
        .map(|d| {
            d.as_ref()
                .and_then(GroupKey::as_int)
                .and_then(|d| DataProcessor::weekday_name(d as u32))
                .map(GroupKey::from)
        })
        .collect()
}

pub fn build(df: &DataFrame, opts: &PageOptions) -> Page {
    let total = df.height();
    let risk = risk_scores(df);
    let time = time_columns(df);
    let categories = columns::text(df, "Risk_Category");

    // KPIs
    let (peak, infra, weather_share) = match &categories {
        Ok(cats) => {
            let peak = share_of(cats, total, |c| DataProcessor::matches_any(c, &PEAK_HOUR));
            let weather =
                share_of(cats, total, |c| DataProcessor::matches_any(c, &WEATHER_DISRUPTION));
            let infra = columns::numeric(df, "Duration(min)").ok().and_then(|durations| {
                let blocked: Vec<Option<f64>> = cats
                    .iter()
                    .zip(durations)
                    .map(|(c, d)| {
                        d.filter(|_| {
                            c.as_deref()
                                .is_some_and(|c| DataProcessor::matches_any(c, &INFRASTRUCTURE_BLOCK))
                        })
                    })
                    .collect();
                StatsCalculator::mean(&blocked)
            });
            (peak, infra, weather)
        }
        Err(_) => (None, None, None),
    };
    let years = time
        .as_ref()
        .ok()
        .and_then(|t| year_range(&t.year));

    let kpis = vec![
        Kpi::new("Peak hours", fmt_percent(peak)),
        Kpi::new(
            "Mean blockage duration",
            infra.map(|m| format!("{:.0} min", m)).unwrap_or_else(|| "n/a".to_string()),
        ),
        Kpi::new("Weather disruptions", fmt_percent(weather_share)),
        Kpi::new("Total accidents", fmt_count(total as f64)),
        Kpi::new("Time span", fmt_range(years)),
    ];

    let overview = vec![Section::guarded("Risk category distribution", |title| {
        let cats = reuse(&categories)?;
        let counts = aggregate::value_counts(cats, &[]);
        let bars = counts
            .iter()
            .map(|c| BarItem {
                label: c.label.clone(),
                value: c.count as f64,
                text: Some(format!("{:.2}%", c.count as f64 / total.max(1) as f64 * 100.0)),
            })
            .collect();
        Ok(Section::new(
            title,
            Content::Bars(BarChart::new("Incidents", "Risk category", bars).horizontal()),
        )
        .with_caption("Number of incidents per risk category, with its share of all incidents."))
    })];

    let mut temporal = Vec::new();
    for (dimension, axis, pick) in [
        ("By hour of day", "Hour", 0usize),
        ("By day of week", "Day of week (0 = Monday)", 1),
        ("By month", "Month", 2),
    ] {
        temporal.push(Section::guarded(&format!("{}: incidents", dimension), |title| {
            let t = reuse(&time)?;
            let keys = [&t.hour, &t.weekday, &t.month][pick];
            let counts = aggregate::counts_by_key(keys);
            Ok(Section::new(
                title,
                Content::Bars(keyed_bars(axis, "Incidents", &counts)),
            ))
        }));
        temporal.push(Section::guarded(&format!("{}: mean risk score", dimension), |title| {
            let t = reuse(&time)?;
            let r = reuse(&risk)?;
            let keys = [&t.hour, &t.weekday, &t.month][pick];
            let means = aggregate::group_mean(keys, r);
            Ok(Section::new(
                title,
                Content::Lines(mean_line(axis, "Risk score", "Mean risk", &means)),
            ))
        }));
    }

    let heatmaps = vec![
        Section::guarded("Risk score heatmap (weather vs hour)", |title| {
            let t = reuse(&time)?;
            let r = reuse(&risk)?;
            let weather = weather_keys(df)?;
            let slots = DataProcessor::two_hour_slots();
            let slot_order: Vec<&str> = slots.iter().map(|s| s.as_str()).collect();
            let pivot = aggregate::pivot_mean(
                &weather,
                &slot_keys(&t.hour),
                r,
                Some(&WEATHER_ORDER[..]),
                Some(slot_order.as_slice()),
            );
            Ok(Section::new(
                title,
                Content::Heatmap(Heatmap {
                    x_label: "Hour of day".to_string(),
                    y_label: "Weather".to_string(),
                    pivot,
                    decimals: 2,
                }),
            )
            .with_caption("Mean risk score per two-hour slot and weather condition; darker is riskier."))
        }),
        Section::guarded("Risk score heatmap (weather vs weekday)", |title| {
            let t = reuse(&time)?;
            let r = reuse(&risk)?;
            let weather = weather_keys(df)?;
            let pivot = aggregate::pivot_mean(
                &weather,
                &weekday_keys(&t.weekday),
                r,
                Some(&WEATHER_ORDER[..]),
                Some(&WEEKDAYS[..]),
            );
            Ok(Section::new(
                title,
                Content::Heatmap(Heatmap {
                    x_label: "Day of week".to_string(),
                    y_label: "Weather".to_string(),
                    pivot,
                    decimals: 2,
                }),
            ))
        }),
    ];

    let summary = vec![
        format!(
            "Peak hours: {} of incidents contribute directly to congestion.",
            fmt_percent(peak)
        ),
        format!(
            "Infrastructure blockages: mean duration {} minutes.",
            fmt_float(infra, 0)
        ),
        format!(
            "Weather disruptions: {} of cases (rain, snow, fog).",
            fmt_percent(weather_share)
        ),
        format!("Incidents analysed: {}.", fmt_count(total as f64)),
    ];

    Page {
        id: PageId::Traffic,
        title: "Risk analysis: road transport".to_string(),
        context: vec![
            "US Accidents (2016-2023): 7.7 million real accident reports across the United States, with severity, duration, traffic impact and GPS coordinates.".to_string(),
            "Risk_Score combines normalized severity (1-4), normalized duration and a weighted weather factor into a value from 0 (none) to 1 (high).".to_string(),
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

    #[test]
    fn derived_risk_stays_in_unit_range() {
        let df = DataFrame::new(vec![
            Column::new("Severity".into(), vec![1.0, 4.0, 2.0]),
            Column::new("Duration(min)".into(), vec![10.0, 100.0, 55.0]),
            Column::new("Main_Weather".into(), vec!["Clear", "Orage", "Rain"]),
        ])
        .unwrap();
        let risk = risk_scores(&df).unwrap();
        assert_eq!(risk[0], Some(0.0));
        assert!((risk[1].unwrap() - 1.0).abs() < 1e-12);
        assert!(risk.iter().flatten().all(|r| (0.0..=1.0).contains(r)));
    }

    #[test]
    fn time_columns_fall_back_to_start_time() {
        let df = DataFrame::new(vec![Column::new(
            "Start_Time".into(),
            vec!["2016-02-08 05:46:00", "2023-03-31 18:10:00"],
        )])
        .unwrap();
        let t = time_columns(&df).unwrap();
        assert_eq!(t.hour, vec![Some(GroupKey::Int(5)), Some(GroupKey::Int(18))]);
        assert_eq!(year_range(&t.year), Some((2016.0, 2023.0)));
    }
}
