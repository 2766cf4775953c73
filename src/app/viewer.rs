use eframe::egui;
use egui::Color32;
use egui_plot::{Legend, Line, Plot, VLine};

use crate::data::export::{write_file, write_plot_csv};
use crate::plot::PlotSpec;

/// Shows one [`PlotSpec`] at a time, with a tab per plot.
pub struct SiriusViewer {
    plots: Vec<PlotSpec>,
    selected: usize,
    status: Option<String>,
}

impl SiriusViewer {
    pub fn new(plots: Vec<PlotSpec>) -> Self {
        Self {
            plots,
            selected: 0,
            status: None,
        }
    }

    pub fn plot_count(&self) -> usize {
        self.plots.len()
    }

    fn current(&self) -> Option<&PlotSpec> {
        self.plots.get(self.selected)
    }

    /// Ask for a path and save the current plot's series as CSV.
    fn prompt_and_save_csv(&mut self) {
        let Some(plot) = self.current() else {
            return;
        };
        let file_name = format!("{}.csv", plot.series.first().map(|s| s.name.as_str()).unwrap_or("plot"));
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(&file_name)
            .add_filter("CSV", &["csv"])
            .save_file()
        {
            let res = write_file(&path, |w| write_plot_csv(w, plot));
            self.status = Some(match res {
                Ok(()) => format!("saved {}", path.display()),
                Err(e) => {
                    log::warn!("failed to save {:?}: {}", path, e);
                    format!("save failed: {e}")
                }
            });
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("sirius_top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for (i, p) in self.plots.iter().enumerate() {
                    if ui.selectable_label(i == self.selected, &p.title).clicked() {
                        self.selected = i;
                    }
                }
                ui.separator();
                if ui.button("Save CSV").clicked() {
                    self.prompt_and_save_csv();
                }
                if let Some(s) = &self.status {
                    ui.label(s);
                }
            });
        });
    }

    fn render_plot(&self, ui: &mut egui::Ui) {
        let Some(spec) = self.current() else {
            ui.label("Nothing to plot");
            return;
        };
        ui.heading(&spec.title);
        Plot::new(("sirius_plot", self.selected))
            .legend(Legend::default())
            .x_axis_label(spec.x_label.clone())
            .y_axis_label(spec.y_label.clone())
            .show(ui, |plot_ui| {
                for s in &spec.series {
                    plot_ui.line(Line::new(&s.name, s.points.clone()).width(1.5));
                }
                for m in &spec.markers {
                    plot_ui.vline(VLine::new(&m.name, m.x).color(Color32::LIGHT_RED).width(1.0));
                }
            });
    }
}

impl eframe::App for SiriusViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.render_top_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| self.render_plot(ui));
    }
}
