//! Data module - CSV loading, column access and derived fields

pub mod columns;
mod loader;
mod processor;

pub use columns::{ColumnError, GroupKey};
pub use loader::{DataLoader, LoaderError};
pub use processor::{DataProcessor, TimeParts, DAY_PERIODS, WEATHER_ORDER, WEEKDAYS};
