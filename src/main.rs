//! Logistics Risk Dashboard
//!
//! Interactive risk pages over cleaned road, air, rail, maritime, supplier
//! and last-mile delivery incident datasets.

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use logistics_risk_dashboard::cli::{Cli, Commands, ReportArgs, ReportFormat};
use logistics_risk_dashboard::config::DashboardConfig;
use logistics_risk_dashboard::data::DataLoader;
use logistics_risk_dashboard::gui::DashboardApp;
use logistics_risk_dashboard::navigation::PageId;
use logistics_risk_dashboard::report;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data.dir = dir;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    tracing::info!(data_dir = %config.data.dir.display(), "configuration loaded");

    match cli.command.unwrap_or(Commands::Gui) {
        Commands::Gui => run_gui(config),
        Commands::Pages => {
            for id in PageId::ALL {
                println!("{:<14}{}", id.slug(), id.label());
            }
            Ok(())
        }
        Commands::Report(args) => run_report(&config, args),
    }
}

fn run_gui(config: DashboardConfig) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1200.0, 700.0])
            .with_title("Logistics Risk Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "Logistics Risk Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI failed: {}", e))
}

fn run_report(config: &DashboardConfig, args: ReportArgs) -> Result<()> {
    let loader = DataLoader::new();
    let reports = report::build_reports(args.page, &loader, config);

    let output = match args.format {
        ReportFormat::Text => report::render_text(&reports),
        ReportFormat::Json => report::render_json(&reports).context("serializing report")?,
    };

    match &args.out {
        Some(path) => {
            std::fs::write(path, output)
                .with_context(|| format!("writing report to {}", path.display()))?;
            tracing::info!(path = %path.display(), pages = reports.len(), "report written");
        }
        None => println!("{}", output),
    }

    let failed = reports.iter().filter(|r| r.is_failed()).count();
    if failed == reports.len() {
        anyhow::bail!("no page could be built from {}", config.data.dir.display());
    }
    Ok(())
}
