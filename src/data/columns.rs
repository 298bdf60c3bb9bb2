//! Typed column extraction and the column-presence guard.

use polars::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ColumnError {
    #[error("missing columns: {}", .0.join(", "))]
    Missing(Vec<String>),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Grouping key. Integral numeric columns (years, hours, month numbers)
/// sort numerically, everything else lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Int(i64),
    Text(String),
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupKey::Int(a), GroupKey::Int(b)) => a.cmp(b),
            (GroupKey::Int(_), GroupKey::Text(_)) => Ordering::Less,
            (GroupKey::Text(_), GroupKey::Int(_)) => Ordering::Greater,
            (GroupKey::Text(a), GroupKey::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Int(v) => write!(f, "{}", v),
            GroupKey::Text(s) => f.write_str(s),
        }
    }
}

impl GroupKey {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            GroupKey::Int(v) => Some(*v),
            GroupKey::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        GroupKey::Text(s.to_string())
    }
}

impl From<i64> for GroupKey {
    fn from(v: i64) -> Self {
        GroupKey::Int(v)
    }
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

/// Check that every named column exists.
pub fn require(df: &DataFrame, names: &[&str]) -> Result<(), ColumnError> {
    let missing: Vec<String> = names
        .iter()
        .filter(|name| !has_column(df, name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ColumnError::Missing(missing))
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Boolean
    )
}

/// Column as `f64` values; unparseable cells and NaN become `None`.
pub fn numeric(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, ColumnError> {
    let column = df
        .column(name)
        .map_err(|_| ColumnError::Missing(vec![name.to_string()]))?;

    let values = if column.dtype() == &DataType::String {
        // Text columns like "12.5 " are parsed leniently rather than cast
        let ca = column.str()?;
        ca.into_iter()
            .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
            .collect()
    } else {
        let cast = column.cast(&DataType::Float64)?;
        let ca = cast.f64()?;
        ca.into_iter().collect::<Vec<Option<f64>>>()
    };

    Ok(values
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

/// Column as trimmed text; empty strings become `None`.
pub fn text(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, ColumnError> {
    let column = df
        .column(name)
        .map_err(|_| ColumnError::Missing(vec![name.to_string()]))?;

    if is_numeric(column.dtype()) {
        return Ok(keys_from_numeric(column)?
            .into_iter()
            .map(|k| k.map(|k| k.to_string()))
            .collect());
    }

    let cast = column.cast(&DataType::String)?;
    let ca = cast.str()?;
    Ok(ca
        .into_iter()
        .map(|v| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .collect())
}

/// Column as grouping keys.
pub fn keys(df: &DataFrame, name: &str) -> Result<Vec<Option<GroupKey>>, ColumnError> {
    let column = df
        .column(name)
        .map_err(|_| ColumnError::Missing(vec![name.to_string()]))?;

    if is_numeric(column.dtype()) {
        keys_from_numeric(column)
    } else {
        Ok(text(df, name)?
            .into_iter()
            .map(|v| v.map(GroupKey::Text))
            .collect())
    }
}

fn keys_from_numeric(column: &Column) -> Result<Vec<Option<GroupKey>>, ColumnError> {
    let cast = column.cast(&DataType::Float64)?;
    let ca = cast.f64()?;
    Ok(ca
        .into_iter()
        .map(|v| {
            v.filter(|x| x.is_finite()).map(|x| {
                if x.fract() == 0.0 {
                    GroupKey::Int(x as i64)
                } else {
                    GroupKey::Text(format!("{}", x))
                }
            })
        })
        .collect())
}

/// Numeric column if present, `None` if absent.
pub fn numeric_opt(df: &DataFrame, name: &str) -> Option<Vec<Option<f64>>> {
    if has_column(df, name) {
        numeric(df, name).ok()
    } else {
        None
    }
}

/// Row-wise view of a text column as keys, for pairing with another key column.
pub fn text_keys(values: &[Option<String>]) -> Vec<Option<GroupKey>> {
    values
        .iter()
        .map(|v| v.as_ref().map(|s| GroupKey::Text(s.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_keys_sort_numbers_before_text() {
        let mut keys = vec![
            GroupKey::from("b"),
            GroupKey::from(10),
            GroupKey::from("a"),
            GroupKey::from(2),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                GroupKey::Int(2),
                GroupKey::Int(10),
                GroupKey::from("a"),
                GroupKey::from("b"),
            ]
        );
    }

    #[test]
    fn require_lists_every_missing_column() {
        let df = DataFrame::new(vec![Column::new("a".into(), vec![1.0, 2.0])]).unwrap();
        let err = require(&df, &["a", "b", "c"]).unwrap_err();
        match err {
            ColumnError::Missing(cols) => assert_eq!(cols, vec!["b", "c"]),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn numeric_parses_text_cells_leniently() {
        let df = DataFrame::new(vec![Column::new(
            "v".into(),
            vec![Some("1.5"), Some(" 2 "), Some("n/a"), None],
        )])
        .unwrap();
        assert_eq!(
            numeric(&df, "v").unwrap(),
            vec![Some(1.5), Some(2.0), None, None]
        );
    }
}
