//! Top-level entry point for showing analysis plots in a native window.

use eframe::egui;

use crate::config::ViewerConfig;
use crate::plot::PlotSpec;

use super::viewer::SiriusViewer;

/// Open a window showing `plots`, one tab each.
///
/// The call blocks until the window is closed.
pub fn run_viewer(plots: Vec<PlotSpec>, cfg: &ViewerConfig) -> eframe::Result<()> {
    let app = SiriusViewer::new(plots);
    let opts = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size(egui::vec2(cfg.width, cfg.height)),
        ..Default::default()
    };
    log::debug!("opening viewer with {} plot(s)", app.plot_count());
    eframe::run_native(&cfg.title, opts, Box::new(|_cc| Ok(Box::new(app))))
}
