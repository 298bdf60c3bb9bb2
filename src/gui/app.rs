//! Dashboard Main Application
//! Main window with the sidebar menu and the page viewer.

use crate::config::DashboardConfig;
use crate::data::DataLoader;
use crate::gui::{PageViewer, Sidebar, SidebarAction, StatusKind};
use crate::navigation::{build_page, Navigator, PageId};
use crate::page::Page;
use egui::SidePanel;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

/// Page build result from background thread
enum BuildResult {
    Progress(String),
    Complete(Box<Page>),
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    loader: Arc<DataLoader>,
    config: DashboardConfig,
    navigator: Navigator,
    sidebar: Sidebar,
    viewer: PageViewer,

    // Async page build
    build_rx: Option<Receiver<BuildResult>>,
    is_building: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let mut app = Self {
            loader: Arc::new(DataLoader::new()),
            config,
            navigator: Navigator::default(),
            sidebar: Sidebar::new(),
            viewer: PageViewer::new(),
            build_rx: None,
            is_building: false,
        };
        app.start_build(app.navigator.current());
        app
    }

    /// Start building a page in a background thread. A build still in
    /// flight is abandoned: its receiver is dropped and its result discarded.
    fn start_build(&mut self, page: PageId) {
        self.viewer.clear();
        self.sidebar
            .set_status(StatusKind::Busy, &format!("Building {}...", page.label()));
        self.is_building = true;

        let (tx, rx) = channel();
        self.build_rx = Some(rx);

        let loader = Arc::clone(&self.loader);
        let config = self.config.clone();
        let generation = self.navigator.generation();

        thread::spawn(move || {
            Self::run_build(tx, page, &loader, &config, generation);
        });
    }

    /// Run a page build (called from background thread)
    fn run_build(
        tx: Sender<BuildResult>,
        page: PageId,
        loader: &DataLoader,
        config: &DashboardConfig,
        generation: u64,
    ) {
        let _ = tx.send(BuildResult::Progress(format!(
            "Loading {} data...",
            page.label()
        )));

        match build_page(page, loader, config) {
            Ok(built) => {
                info!(page = %page, generation, "page ready");
                let _ = tx.send(BuildResult::Complete(Box::new(built)));
            }
            Err(e) => {
                error!(page = %page, error = %e, "page build failed");
                let _ = tx.send(BuildResult::Error(e.to_string()));
            }
        }
    }

    /// Check for page build results
    fn check_build_results(&mut self) {
        // Take the receiver temporarily to avoid borrow issues
        let rx = self.build_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    BuildResult::Progress(status) => {
                        self.sidebar.set_status(StatusKind::Busy, &status);
                    }
                    BuildResult::Complete(page) => {
                        let warnings = page.warnings().len();
                        let status = if warnings == 0 {
                            format!("{} ready", page.id.label())
                        } else {
                            format!("{} ready, {} sections skipped", page.id.label(), warnings)
                        };
                        self.viewer.set_page(*page);
                        self.sidebar.set_status(StatusKind::Done, &status);
                        self.is_building = false;
                        should_keep_receiver = false;
                    }
                    BuildResult::Error(error) => {
                        self.viewer.set_error(error.clone());
                        self.sidebar
                            .set_status(StatusKind::Error, &format!("Error: {}", error));
                        self.is_building = false;
                        should_keep_receiver = false;
                    }
                }
            }

            // Put receiver back if still needed
            if should_keep_receiver {
                self.build_rx = Some(rx);
            }
        }
    }

    fn handle_browse_data_dir(&mut self) {
        if let Some(dir) = rfd::FileDialog::new()
            .set_directory(&self.config.data.dir)
            .pick_folder()
        {
            info!(dir = %dir.display(), "data folder changed");
            self.config.data.dir = dir;
            self.start_build(self.navigator.current());
        }
    }

    fn handle_reload(&mut self) {
        self.loader = Arc::new(DataLoader::new());
        let page = self.navigator.select(self.navigator.current());
        self.start_build(page);
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_build_results();

        // Request repaint while building
        if self.is_building {
            ctx.request_repaint();
        }

        // Left panel - Sidebar
        SidePanel::left("sidebar")
            .min_width(240.0)
            .max_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action =
                        self.sidebar
                            .show(ui, self.navigator.current(), &self.config.data.dir);

                    match action {
                        SidebarAction::Select(page) => {
                            let page = self.navigator.select(page);
                            self.start_build(page);
                        }
                        SidebarAction::BrowseDataDir => self.handle_browse_data_dir(),
                        SidebarAction::Reload => self.handle_reload(),
                        SidebarAction::None => {}
                    }
                });
            });

        // Central panel - Page Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.viewer.show(ui);
        });
    }
}
