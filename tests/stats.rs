use logistics_risk_dashboard::data::GroupKey;
use logistics_risk_dashboard::stats::aggregate;
use logistics_risk_dashboard::stats::{QuantileBands, StatsCalculator};

fn labels(raw: &[&str]) -> Vec<Option<String>> {
    raw.iter().map(|s| Some(s.to_string())).collect()
}

fn keys(raw: &[&str]) -> Vec<Option<GroupKey>> {
    raw.iter().map(|s| Some(GroupKey::from(*s))).collect()
}

fn scores(raw: &[f64]) -> Vec<Option<f64>> {
    raw.iter().copied().map(Some).collect()
}

#[test]
fn top_two_categories() {
    let mut raw = vec!["A"; 5];
    raw.extend(["B"; 3]);
    raw.extend(["C"; 2]);

    let counts = aggregate::value_counts(&labels(&raw), &[]);
    let top: Vec<(String, usize)> = aggregate::top_n(&counts, 2)
        .into_iter()
        .map(|c| (c.label, c.count))
        .collect();

    assert_eq!(top, vec![("A".to_string(), 5), ("B".to_string(), 3)]);
}

#[test]
fn counts_sum_to_rows_left_after_exclusion() {
    let mut values = labels(&["High", "Low Impact", "Medium", "High", "Low Impact", "Critical"]);
    values.push(None);

    let counts = aggregate::value_counts(&values, &["Low Impact"]);
    let total: usize = counts.iter().map(|c| c.count).sum();

    assert_eq!(total, 4);
    assert!(counts.iter().all(|c| c.label != "Low Impact"));
}

#[test]
fn rates_stay_in_percent_range_and_skip_empty_groups() {
    let groups = keys(&["ATL", "ATL", "ORD", "DEN", "SEA"]);
    let delayed = scores(&[10.0, 5.0, 30.0, 0.0, 12.0]);
    let flights = scores(&[100.0, 50.0, 20.0, 0.0, 40.0]);

    let rates = aggregate::group_rate(&groups, &delayed, &flights);

    assert!(rates.iter().all(|r| (0.0..=100.0).contains(&r.rate)));
    assert!(rates.iter().all(|r| r.denominator > 0.0));
    assert!(!rates.iter().any(|r| r.key == GroupKey::from("DEN")));

    let atl = rates.iter().find(|r| r.key == GroupKey::from("ATL")).unwrap();
    assert!((atl.rate - 10.0).abs() < 1e-9);
    // 30 delayed out of 20 flights is clamped
    let ord = rates.iter().find(|r| r.key == GroupKey::from("ORD")).unwrap();
    assert_eq!(ord.rate, 100.0);
}

#[test]
fn pivot_means_and_crosstab_counts() {
    let weather = keys(&["Rain", "Rain", "Clear", "Clear", "Rain"]);
    let slot = keys(&["8h-10h", "8h-10h", "8h-10h", "18h-20h", "18h-20h"]);
    let risk = scores(&[0.8, 0.6, 0.2, 0.4, 1.0]);

    let pivot = aggregate::pivot_mean(&weather, &slot, &risk, Some(&["Clear", "Rain"][..]), None);
    assert_eq!(pivot.rows, vec!["Clear", "Rain"]);
    assert!((pivot.get("Rain", "8h-10h").unwrap() - 0.7).abs() < 1e-9);
    assert_eq!(pivot.get("Clear", "18h-20h"), Some(0.4));

    let counts = aggregate::crosstab(&weather, &slot, None, None);
    assert_eq!(counts.get("Rain", "8h-10h"), Some(2.0));
    assert_eq!(counts.get("Clear", "8h-10h"), Some(1.0));
    let total: f64 = counts.cells.iter().flatten().flatten().sum();
    assert_eq!(total, 5.0);
}

#[test]
fn group_means_follow_key_order() {
    let hours: Vec<Option<GroupKey>> = [3, 1, 3, 2].iter().map(|h| Some(GroupKey::Int(*h))).collect();
    let values = scores(&[1.0, 2.0, 3.0, 4.0]);

    let means = aggregate::group_mean(&hours, &values);
    let order: Vec<GroupKey> = means.iter().map(|g| g.key.clone()).collect();
    assert_eq!(order, vec![GroupKey::Int(1), GroupKey::Int(2), GroupKey::Int(3)]);
    assert_eq!(means[2].mean, 2.0);
    assert_eq!(means[2].count, 2);
}

#[test]
fn four_scores_fall_in_four_quartile_bands() {
    let values = scores(&[1.0, 2.0, 3.0, 4.0]);
    let bands = QuantileBands::quartiles(&values).unwrap();

    assert_eq!(bands.assign_all(&values), vec![Some(1), Some(2), Some(3), Some(4)]);
}

#[test]
fn band_edges_are_the_quartile_percentiles() {
    let values = scores(&[0.12, 0.5, 0.33, 0.91, 0.07, 0.64, 0.28, 0.45, 0.8]);
    let bands = QuantileBands::quartiles(&values).unwrap();
    let sorted = StatsCalculator::sorted_finite(&values);

    let expected: Vec<f64> = [0.0, 25.0, 50.0, 75.0, 100.0]
        .iter()
        .map(|p| StatsCalculator::percentile(&sorted, *p))
        .collect();
    assert_eq!(bands.edges, expected);
}

#[test]
fn banding_partitions_every_scored_row() {
    let mut values = scores(&[5.0, 1.0, 9.0, 3.0, 3.0, 7.0, 2.0, 8.0]);
    values.push(None);
    let bands = QuantileBands::fit(&values, 4).unwrap();

    let assigned = bands.assign_all(&values);
    assert_eq!(assigned.iter().flatten().count(), 8);
    assert!(assigned.iter().flatten().all(|b| (1..=4).contains(b)));
    assert_eq!(assigned[8], None);

    // Refitting on the same data gives the same assignment
    let refit = QuantileBands::fit(&values, 4).unwrap();
    assert_eq!(refit.assign_all(&values), assigned);
}

#[test]
fn no_scores_means_no_bands() {
    assert!(QuantileBands::quartiles(&[None, None]).is_none());
}

#[test]
fn correlation_of_linear_columns() {
    let x = scores(&[1.0, 2.0, 3.0, 4.0]);
    let up = scores(&[2.0, 4.0, 6.0, 8.0]);
    let down = scores(&[8.0, 6.0, 4.0, 2.0]);
    let flat = scores(&[5.0, 5.0, 5.0, 5.0]);

    assert!((StatsCalculator::pearson(&x, &up) - 1.0).abs() < 1e-9);
    assert!((StatsCalculator::pearson(&x, &down) + 1.0).abs() < 1e-9);
    assert!(StatsCalculator::pearson(&x, &flat).is_nan());

    let matrix = StatsCalculator::correlation_matrix(&[
        ("x".to_string(), x),
        ("up".to_string(), up),
    ]);
    assert_eq!(matrix.labels, vec!["x", "up"]);
    assert!((matrix.values[0][0] - 1.0).abs() < 1e-9);
    assert_eq!(matrix.values[0][1], matrix.values[1][0]);
}
