//! Headless page builds for the `report` command.

use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::config::DashboardConfig;
use crate::data::DataLoader;
use crate::navigation::{build_page, PageId};
use crate::page::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelection {
    One(PageId),
    All,
}

impl PageSelection {
    pub fn ids(&self) -> Vec<PageId> {
        match self {
            PageSelection::One(id) => vec![*id],
            PageSelection::All => PageId::ALL.to_vec(),
        }
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(PageSelection::All)
        } else {
            s.parse().map(PageSelection::One)
        }
    }
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSelection::One(id) => write!(f, "{}", id),
            PageSelection::All => f.write_str("all"),
        }
    }
}

/// One built page, or the load error that stopped it.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageReport {
    Built(Page),
    Failed { page: PageId, error: String },
}

impl PageReport {
    pub fn is_failed(&self) -> bool {
        matches!(self, PageReport::Failed { .. })
    }
}

/// Build the selected pages in parallel, in menu order. The loader cache
/// is shared, so the home page reuses tables the domain pages read.
pub fn build_reports(
    selection: PageSelection,
    loader: &DataLoader,
    config: &DashboardConfig,
) -> Vec<PageReport> {
    // Home reads four tables the domain pages also read; load each once.
    if selection == PageSelection::All {
        loader.preload(&config.paths());
    }

    selection
        .ids()
        .par_iter()
        .map(|id| match build_page(*id, loader, config) {
            Ok(page) => PageReport::Built(page),
            Err(e) => {
                tracing::error!(page = %id, error = %e, "page build failed");
                PageReport::Failed {
                    page: *id,
                    error: e.to_string(),
                }
            }
        })
        .collect()
}

pub fn render_text(reports: &[PageReport]) -> String {
    reports
        .iter()
        .map(|report| match report {
            PageReport::Built(page) => page.to_text(),
            PageReport::Failed { page, error } => {
                format!("# {}\n\n! Page unavailable: {}\n", page.label(), error)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_json(reports: &[PageReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_parses_all_or_a_page() {
        assert_eq!("ALL".parse::<PageSelection>().unwrap(), PageSelection::All);
        assert_eq!(
            "railroad".parse::<PageSelection>().unwrap(),
            PageSelection::One(PageId::Railroad)
        );
        assert_eq!(PageSelection::All.ids().len(), 7);
    }

    #[test]
    fn missing_data_reports_failure_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DashboardConfig::default();
        config.data.dir = dir.path().to_path_buf();

        let reports = build_reports(PageSelection::All, &DataLoader::new(), &config);
        assert_eq!(reports.len(), 7);
        assert!(reports.iter().all(PageReport::is_failed));
        assert!(render_text(&reports).contains("Page unavailable"));
        assert!(render_json(&reports).unwrap().contains("\"status\": \"failed\""));
    }
}
