//! CSV Data Loader Module
//! Loads cleaned dataset CSVs with Polars and memoizes them by file path.

use polars::prelude::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::page::TableView;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Dataset not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to load CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
}

/// One cache entry per path. The slot stays locked while the file is being
/// read, so concurrent loads of the same path wait instead of reading twice.
type Slot = Arc<Mutex<Option<Arc<DataFrame>>>>;

/// Path-keyed table cache. Tables are read-only once loaded, so the same
/// `Arc<DataFrame>` is handed to every page that asks for the file.
pub struct DataLoader {
    cache: RwLock<HashMap<PathBuf, Slot>>,
    disk_reads: AtomicUsize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            disk_reads: AtomicUsize::new(0),
        }
    }

    /// Load a CSV file, or return the cached table for this path.
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<Arc<DataFrame>, LoaderError> {
        let path = path.as_ref();
        let slot = self.slot(path);
        let mut entry = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(df) = entry.as_ref() {
            debug!(path = %path.display(), "dataset cache hit");
            return Ok(Arc::clone(df));
        }

        // Failed reads leave the slot empty so a later call retries.
        let df = Arc::new(Self::read_csv(path)?);
        self.disk_reads.fetch_add(1, Ordering::Relaxed);
        *entry = Some(Arc::clone(&df));
        Ok(df)
    }

    fn slot(&self, path: &Path) -> Slot {
        if let Some(slot) = self
            .cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(path)
        {
            return Arc::clone(slot);
        }

        let mut cache = self
            .cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let slot = cache.entry(path.to_path_buf()).or_default();
        Arc::clone(slot)
    }

    fn read_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }

        let started = Instant::now();
        let csv_err = |source| LoaderError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()
            .map_err(csv_err)?
            .collect()
            .map_err(csv_err)?;

        // Some exports pad header names with invisible whitespace
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.trim().to_string())
            .collect();
        let needs_trim = df
            .get_column_names()
            .iter()
            .zip(names.iter())
            .any(|(raw, trimmed)| raw.as_str() != trimmed.as_str());
        if needs_trim {
            df.set_column_names(names).map_err(csv_err)?;
        }

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dataset loaded"
        );

        Ok(df)
    }

    /// Warm the cache for several files in parallel. Failures are logged and
    /// left for the page that needs the file to report.
    pub fn preload(&self, paths: &[PathBuf]) {
        paths.par_iter().for_each(|path| {
            if let Err(e) = self.load_csv(path) {
                warn!(path = %path.display(), error = %e, "preload failed");
            }
        });
    }

    /// Number of tables actually read from disk so far.
    pub fn disk_reads(&self) -> usize {
        self.disk_reads.load(Ordering::Relaxed)
    }

    /// Whether a path is already memoized.
    pub fn is_cached(&self, path: impl AsRef<Path>) -> bool {
        let slot = self
            .cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(path.as_ref())
            .cloned();
        let Some(slot) = slot else {
            return false;
        };
        let cached = slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some();
        cached
    }

    /// First `rows` rows of a table rendered as text cells.
    pub fn preview(df: &DataFrame, rows: usize) -> TableView {
        let head = df.head(Some(rows));
        let columns: Vec<String> = head
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut cells: Vec<Vec<String>> = vec![Vec::with_capacity(columns.len()); head.height()];
        for col in head.get_columns() {
            for (i, row) in cells.iter_mut().enumerate() {
                let text = match col.get(i) {
                    Ok(val) if !val.is_null() => val.to_string().trim_matches('"').to_string(),
                    _ => String::new(),
                };
                row.push(text);
            }
        }

        TableView {
            columns,
            rows: cells,
        }
    }
}
