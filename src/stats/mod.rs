//! Statistics module - aggregations and numeric primitives

pub mod aggregate;
mod calculator;

pub use aggregate::{CategoryCount, GroupMean, GroupRate, Pivot};
pub use calculator::{
    BoxSummary, Component, CorrelationMatrix, Histogram, Normalization, QuantileBands,
    StatsCalculator,
};
