mod common;

use logistics_risk_dashboard::data::DataLoader;
use logistics_risk_dashboard::navigation::{build_page, PageError, PageId};
use logistics_risk_dashboard::page::Content;
use logistics_risk_dashboard::report::{self, PageSelection};
use tempfile::TempDir;

fn bar_labels(content: &Content) -> Vec<String> {
    match content {
        Content::Bars(chart) | Content::Shares(chart) => {
            chart.bars.iter().map(|b| b.label.clone()).collect()
        }
        other => panic!("expected bars, got {:?}", other),
    }
}

#[test]
fn every_page_builds_from_the_fixture_datasets() {
    let tmp = common::dataset_dir();
    let config = common::config_for(tmp.path());
    let loader = DataLoader::new();

    for id in PageId::ALL {
        let page = build_page(id, &loader, &config).unwrap();
        assert_eq!(page.id, id);
        assert!(!page.title.is_empty());
        assert!(!page.kpis.is_empty(), "{} has no KPIs", id);
        assert!(!page.tabs.is_empty(), "{} has no tabs", id);
    }

    // Home shares the domain pages' tables
    assert_eq!(loader.disk_reads(), 6);
}

#[test]
fn home_shows_top_three_without_excluded_labels() {
    let tmp = common::dataset_dir();
    let config = common::config_for(tmp.path());
    let page = build_page(PageId::Home, &DataLoader::new(), &config).unwrap();

    assert!(page.warnings().is_empty());
    assert_eq!(page.kpis[0].value, "10");
    assert_eq!(page.kpis[1].value, "62");

    let road = page.section("Road: top 3 risk categories").unwrap();
    assert_eq!(bar_labels(&road.content), vec!["High", "Medium", "Critical"]);

    let rail = page.section("Rail: top 3 accident types").unwrap();
    assert_eq!(bar_labels(&rail.content), vec!["Derailment", "Collision"]);

    let sea = page.section("Maritime: top 3 accident types").unwrap();
    assert_eq!(bar_labels(&sea.content), vec!["Grounding", "Collision", "Fire"]);

    let air = page.section("Air: top 3 delay causes").unwrap();
    assert_eq!(
        bar_labels(&air.content),
        vec!["Late previous aircraft", "Carrier delay", "Air traffic control (NAS) delay"]
    );
}

#[test]
fn missing_columns_degrade_to_warnings() {
    let tmp = TempDir::new().unwrap();
    let config = common::config_for(tmp.path());
    common::write_csv(
        tmp.path(),
        &config.data.traffic,
        "Severity,Main_Weather\n2,Rain\n3,Clear\n",
    );

    let page = build_page(PageId::Traffic, &DataLoader::new(), &config).unwrap();
    let section = page.section("Risk category distribution").unwrap();

    assert!(section.is_warning());
    match &section.content {
        Content::Warning(message) => assert!(message.contains("Risk_Category")),
        other => panic!("expected a warning, got {:?}", other),
    }
    let total = page.kpis.iter().find(|k| k.label == "Total accidents").unwrap();
    assert_eq!(total.value, "2");
}

#[test]
fn missing_dataset_fails_only_that_page() {
    let tmp = common::dataset_dir();
    let config = common::config_for(tmp.path());
    std::fs::remove_file(config.dataset_path(logistics_risk_dashboard::config::Dataset::Shipping))
        .unwrap();
    let loader = DataLoader::new();

    let err = build_page(PageId::Shipping, &loader, &config).unwrap_err();
    assert!(matches!(err, PageError::Load { dataset: "shipping", .. }));
    assert!(build_page(PageId::SupplyChain, &loader, &config).is_ok());
}

#[test]
fn dataset_preview_honours_configured_rows() {
    let tmp = common::dataset_dir();
    let mut config = common::config_for(tmp.path());
    let loader = DataLoader::new();

    let page = build_page(PageId::Shipping, &loader, &config).unwrap();
    assert_eq!(page.preview.unwrap().rows.len(), 3);

    config.ui.preview_rows = 0;
    let page = build_page(PageId::Shipping, &loader, &config).unwrap();
    assert!(page.preview.is_none());
}

#[test]
fn report_covers_all_pages_in_menu_order() {
    let tmp = common::dataset_dir();
    let config = common::config_for(tmp.path());

    let reports = report::build_reports(PageSelection::All, &DataLoader::new(), &config);
    assert_eq!(reports.len(), PageId::ALL.len());
    assert!(reports.iter().all(|r| !r.is_failed()));

    let text = report::render_text(&reports);
    assert!(text.contains("# Risk analysis: maritime accidents (Baltic Sea)"));

    let json: serde_json::Value =
        serde_json::from_str(&report::render_json(&reports).unwrap()).unwrap();
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec!["home", "traffic", "airline", "railroad", "shipping", "supply_chain", "last_mile"]
    );
}
