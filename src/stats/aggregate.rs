//! Group-by style aggregations over extracted columns.

use crate::data::GroupKey;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    pub key: GroupKey,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRate {
    pub key: GroupKey,
    pub numerator: f64,
    pub denominator: f64,
    /// Percentage in [0, 100]
    pub rate: f64,
}

/// Two-dimensional table: mean of a value or count per (row, column) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pivot {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `cells[r][c]`, `None` for combinations with no rows
    pub cells: Vec<Vec<Option<f64>>>,
}

impl Pivot {
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.rows.iter().position(|x| x == row)?;
        let c = self.columns.iter().position(|x| x == column)?;
        self.cells[r][c]
    }
}

/// Count rows per category, dropping nulls and any excluded label. Sorted by
/// count descending; ties keep first-appearance order.
pub fn value_counts(values: &[Option<String>], exclude: &[&str]) -> Vec<CategoryCount> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for value in values.iter().flatten() {
        if exclude.contains(&value.as_str()) {
            continue;
        }
        let entry = counts.entry(value.as_str()).or_insert(0);
        if *entry == 0 {
            order.push(value.clone());
        }
        *entry += 1;
    }

    let mut result: Vec<CategoryCount> = order
        .into_iter()
        .map(|label| {
            let count = counts.get(label.as_str()).copied().unwrap_or(0);
            CategoryCount { label, count }
        })
        .collect();
    // Stable sort keeps first-appearance order among ties
    result.sort_by(|a, b| b.count.cmp(&a.count));
    result
}

/// Keep the first `n` entries of a sorted aggregate.
pub fn top_n<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    items.iter().take(n).cloned().collect()
}

/// Count rows per key in natural key order (for hour/day/month/year axes).
pub fn counts_by_key(keys: &[Option<GroupKey>]) -> Vec<(GroupKey, usize)> {
    let mut counts: BTreeMap<GroupKey, usize> = BTreeMap::new();
    for key in keys.iter().flatten() {
        *counts.entry(key.clone()).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}

/// Mean of `values` per key, keys in natural order. Rows with a null key or
/// value are skipped.
pub fn group_mean(keys: &[Option<GroupKey>], values: &[Option<f64>]) -> Vec<GroupMean> {
    let mut acc: BTreeMap<GroupKey, (f64, usize)> = BTreeMap::new();
    for (key, value) in keys.iter().zip(values.iter()) {
        if let (Some(key), Some(value)) = (key, value) {
            let entry = acc.entry(key.clone()).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    acc.into_iter()
        .map(|(key, (sum, count))| GroupMean {
            key,
            mean: sum / count as f64,
            count,
        })
        .collect()
}

/// Sum of `values` per key, keys in natural order.
pub fn group_sum(keys: &[Option<GroupKey>], values: &[Option<f64>]) -> Vec<(GroupKey, f64)> {
    let mut acc: BTreeMap<GroupKey, f64> = BTreeMap::new();
    for (key, value) in keys.iter().zip(values.iter()) {
        if let (Some(key), Some(value)) = (key, value) {
            *acc.entry(key.clone()).or_insert(0.0) += value;
        }
    }
    acc.into_iter().collect()
}

/// Mean of `values` per (first, second) key pair, pairs in natural order.
pub fn group_mean_by2(
    first: &[Option<GroupKey>],
    second: &[Option<GroupKey>],
    values: &[Option<f64>],
) -> Vec<((GroupKey, GroupKey), f64)> {
    let mut acc: BTreeMap<(GroupKey, GroupKey), (f64, usize)> = BTreeMap::new();
    for ((a, b), v) in first.iter().zip(second.iter()).zip(values.iter()) {
        if let (Some(a), Some(b), Some(v)) = (a, b, v) {
            let entry = acc.entry((a.clone(), b.clone())).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }
    }
    acc.into_iter()
        .map(|(k, (sum, count))| (k, sum / count as f64))
        .collect()
}

/// Per-key ratio `sum(numerator) / sum(denominator)` as a percentage. Keys
/// whose summed denominator is not positive are dropped before dividing.
pub fn group_rate(
    keys: &[Option<GroupKey>],
    numerators: &[Option<f64>],
    denominators: &[Option<f64>],
) -> Vec<GroupRate> {
    let mut acc: BTreeMap<GroupKey, (f64, f64)> = BTreeMap::new();
    for ((key, num), den) in keys.iter().zip(numerators.iter()).zip(denominators.iter()) {
        if let (Some(key), Some(num), Some(den)) = (key, num, den) {
            let entry = acc.entry(key.clone()).or_insert((0.0, 0.0));
            entry.0 += num;
            entry.1 += den;
        }
    }

    acc.into_iter()
        .filter(|(_, (_, den))| *den > 0.0)
        .map(|(key, (num, den))| GroupRate {
            key,
            numerator: num,
            denominator: den,
            rate: (num / den * 100.0).clamp(0.0, 100.0),
        })
        .collect()
}

/// Sort group means by mean, descending or ascending.
pub fn sort_by_mean(mut groups: Vec<GroupMean>, descending: bool) -> Vec<GroupMean> {
    groups.sort_by(|a, b| {
        let ord = a
            .mean
            .partial_cmp(&b.mean)
            .unwrap_or(std::cmp::Ordering::Equal);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    groups
}

/// Most frequent label; ties resolved towards the lexically smallest label.
pub fn mode(values: &[Option<String>]) -> Option<String> {
    let counts = value_counts(values, &[]);
    let best = counts.first()?.count;
    counts
        .into_iter()
        .filter(|c| c.count == best)
        .map(|c| c.label)
        .min()
}

pub fn distinct_count(values: &[Option<String>]) -> usize {
    let mut seen: Vec<&str> = values.iter().flatten().map(|s| s.as_str()).collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

fn ordered_axis(observed: Vec<String>, preferred: Option<&[&str]>) -> Vec<String> {
    match preferred {
        None => observed,
        Some(order) => {
            let mut axis: Vec<String> = order.iter().map(|s| s.to_string()).collect();
            for label in observed {
                if !axis.contains(&label) {
                    axis.push(label);
                }
            }
            axis
        }
    }
}

fn sorted_labels(keys: &[Option<GroupKey>]) -> Vec<String> {
    let mut labels: Vec<GroupKey> = keys.iter().flatten().cloned().collect();
    labels.sort();
    labels.dedup();
    labels.into_iter().map(|k| k.to_string()).collect()
}

fn pivot_with<F>(
    rows: &[Option<GroupKey>],
    columns: &[Option<GroupKey>],
    row_order: Option<&[&str]>,
    column_order: Option<&[&str]>,
    mut cell: F,
) -> Pivot
where
    F: FnMut(usize, &mut Vec<Vec<(f64, usize)>>, usize, usize),
{
    let row_labels = ordered_axis(sorted_labels(rows), row_order);
    let col_labels = ordered_axis(sorted_labels(columns), column_order);
    let row_index: HashMap<&str, usize> = row_labels
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();
    let col_index: HashMap<&str, usize> = col_labels
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();

    let mut acc = vec![vec![(0.0, 0usize); col_labels.len()]; row_labels.len()];
    for (i, (r, c)) in rows.iter().zip(columns.iter()).enumerate() {
        if let (Some(r), Some(c)) = (r, c) {
            let (r, c) = (r.to_string(), c.to_string());
            if let (Some(&ri), Some(&ci)) = (row_index.get(r.as_str()), col_index.get(c.as_str())) {
                cell(i, &mut acc, ri, ci);
            }
        }
    }

    Pivot {
        rows: row_labels,
        columns: col_labels,
        cells: acc
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(sum, n)| if n > 0 { Some(sum / n as f64) } else { None })
                    .collect()
            })
            .collect(),
    }
}

/// Mean of `values` per (row, column) pair. Optional orders put the listed
/// labels first, observed extras follow.
pub fn pivot_mean(
    rows: &[Option<GroupKey>],
    columns: &[Option<GroupKey>],
    values: &[Option<f64>],
    row_order: Option<&[&str]>,
    column_order: Option<&[&str]>,
) -> Pivot {
    pivot_with(rows, columns, row_order, column_order, |i, acc, r, c| {
        if let Some(v) = values.get(i).copied().flatten() {
            acc[r][c].0 += v;
            acc[r][c].1 += 1;
        }
    })
}

/// Row counts per (row, column) pair; absent pairs are 0.
pub fn crosstab(
    rows: &[Option<GroupKey>],
    columns: &[Option<GroupKey>],
    row_order: Option<&[&str]>,
    column_order: Option<&[&str]>,
) -> Pivot {
    let mut pivot = pivot_with(rows, columns, row_order, column_order, |_, acc, r, c| {
        acc[r][c].0 += 1.0;
        acc[r][c].1 = 1;
    });
    for row in pivot.cells.iter_mut() {
        for cell in row.iter_mut() {
            if cell.is_none() {
                *cell = Some(0.0);
            }
        }
    }
    pivot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> Vec<Option<String>> {
        raw.iter().map(|s| Some(s.to_string())).collect()
    }

    #[test]
    fn ties_keep_first_appearance() {
        let counts = value_counts(&labels(&["b", "a", "a", "b", "c"]), &[]);
        let order: Vec<&str> = counts.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn mode_and_distinct() {
        let values = labels(&["x", "y", "y", "x", "z"]);
        assert_eq!(mode(&values), Some("x".to_string()));
        assert_eq!(distinct_count(&values), 3);
        assert_eq!(mode(&[]), None);
    }
}
