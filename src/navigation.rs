//! Sidebar navigation: page ids and the page dispatch table.

use crate::config::{DashboardConfig, Dataset};
use crate::data::{DataLoader, LoaderError};
use crate::page::Page;
use crate::pages::{self, home::HomeTables, PageOptions};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Failed to load {dataset} data: {source}")]
    Load {
        dataset: &'static str,
        #[source]
        source: LoaderError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageId {
    Home,
    Traffic,
    Airline,
    Railroad,
    Shipping,
    SupplyChain,
    LastMile,
}

impl PageId {
    /// Menu order.
    pub const ALL: [PageId; 7] = [
        PageId::Home,
        PageId::Traffic,
        PageId::Airline,
        PageId::Railroad,
        PageId::Shipping,
        PageId::SupplyChain,
        PageId::LastMile,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PageId::Home => "Home",
            PageId::Traffic => "Road traffic",
            PageId::Airline => "Airline delays",
            PageId::Railroad => "Railroad accidents",
            PageId::Shipping => "Maritime accidents",
            PageId::SupplyChain => "Suppliers",
            PageId::LastMile => "Last-mile delivery",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            PageId::Home => "home",
            PageId::Traffic => "traffic",
            PageId::Airline => "airline",
            PageId::Railroad => "railroad",
            PageId::Shipping => "shipping",
            PageId::SupplyChain => "supply_chain",
            PageId::LastMile => "last_mile",
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for PageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        PageId::ALL
            .iter()
            .copied()
            .find(|id| id.slug() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = PageId::ALL.iter().map(|id| id.slug()).collect();
                format!("unknown page '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

/// Current menu selection. Selecting a page always asks for a fresh build.
#[derive(Debug, Clone, Copy)]
pub struct Navigator {
    current: PageId,
    generation: u64,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            current: PageId::Home,
            generation: 0,
        }
    }
}

impl Navigator {
    pub fn current(&self) -> PageId {
        self.current
    }

    /// Bumped on every selection, including re-selecting the current page.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn select(&mut self, page: PageId) -> PageId {
        self.current = page;
        self.generation += 1;
        page
    }
}

fn load(
    loader: &DataLoader,
    config: &DashboardConfig,
    dataset: Dataset,
) -> Result<std::sync::Arc<polars::prelude::DataFrame>, PageError> {
    loader
        .load_csv(config.dataset_path(dataset))
        .map_err(|source| PageError::Load {
            dataset: dataset.name(),
            source,
        })
}

/// Build one page from its (cached) tables.
pub fn build_page(
    id: PageId,
    loader: &DataLoader,
    config: &DashboardConfig,
) -> Result<Page, PageError> {
    let opts = PageOptions {
        preview_rows: config.ui.preview_rows,
    };
    let start = std::time::Instant::now();

    let page = match id {
        PageId::Home => {
            let traffic = load(loader, config, Dataset::Traffic)?;
            let airline = load(loader, config, Dataset::Airline)?;
            let railroad = load(loader, config, Dataset::Railroad)?;
            let shipping = load(loader, config, Dataset::Shipping)?;
            pages::home::build(
                &HomeTables {
                    traffic: &traffic,
                    airline: &airline,
                    railroad: &railroad,
                    shipping: &shipping,
                },
                &opts,
            )
        }
        PageId::Traffic => pages::traffic::build(&*load(loader, config, Dataset::Traffic)?, &opts),
        PageId::Airline => pages::airline::build(&*load(loader, config, Dataset::Airline)?, &opts),
        PageId::Railroad => {
            pages::railroad::build(&*load(loader, config, Dataset::Railroad)?, &opts)
        }
        PageId::Shipping => {
            pages::shipping::build(&*load(loader, config, Dataset::Shipping)?, &opts)
        }
        PageId::SupplyChain => {
            pages::supply_chain::build(&*load(loader, config, Dataset::SupplyChain)?, &opts)
        }
        PageId::LastMile => {
            pages::last_mile::build(&*load(loader, config, Dataset::LastMile)?, &opts)
        }
    };

    info!(
        page = %id,
        warnings = page.warnings().len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "page built"
    );
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_ids_parse_from_slugs() {
        for id in PageId::ALL {
            assert_eq!(id.slug().parse::<PageId>().unwrap(), id);
        }
        assert_eq!("Supply-Chain".parse::<PageId>().unwrap(), PageId::SupplyChain);
        assert!("weather".parse::<PageId>().is_err());
    }

    #[test]
    fn every_selection_requests_a_rebuild() {
        let mut nav = Navigator::default();
        assert_eq!(nav.current(), PageId::Home);
        nav.select(PageId::Airline);
        nav.select(PageId::Airline);
        assert_eq!(nav.current(), PageId::Airline);
        assert_eq!(nav.generation(), 2);
    }
}
