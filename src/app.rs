use eframe::egui;

use hyperspec_inspector::config::Mode;

use crate::state::AppState;
use crate::ui::image_view::ImageView;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct InspectorApp {
    pub state: AppState,
    image_view: ImageView,
}

impl InspectorApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            image_view: ImageView::default(),
        }
    }
}

impl eframe::App for InspectorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: band + readout ----
        egui::SidePanel::left("control_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Right side panel: spectrum ----
        if self.state.config.mode != Mode::Thermal {
            egui::SidePanel::right("spectrum_panel")
                .default_width(480.0)
                .resizable(true)
                .show(ctx, |ui| {
                    plot::spectrum_plot(ui, &self.state);
                });
        }

        // ---- Central panel: band image ----
        egui::CentralPanel::default().show(ctx, |ui| {
            self.image_view.show(ui, &mut self.state);
        });
    }
}
