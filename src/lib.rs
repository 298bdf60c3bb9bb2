//! Logistics risk dashboard: exploratory risk pages over six cleaned
//! transport and supply-chain incident datasets.

pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod gui;
pub mod navigation;
pub mod page;
pub mod pages;
pub mod report;
pub mod stats;
