use eframe::egui::{Align2, Color32, RichText, Ui};
use egui_plot::{Legend, Line, LineStyle, Plot, PlotPoint, PlotPoints, Points, Text, VLine};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Spectrum plot (right panel)
// ---------------------------------------------------------------------------

/// Render the reflectance spectrum of the last inspected pixel.
pub fn spectrum_plot(ui: &mut Ui, state: &AppState) {
    let Some(report) = &state.report else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Click a pixel to plot its spectrum.");
        });
        return;
    };

    ui.label(
        RichText::new(format!(
            "Reflectance spectrum at pixel (column X, row Y): ({}, {})",
            report.col, report.row
        ))
        .strong(),
    );

    let y_label = if report.unit == "%" {
        "Reflectance [%]".to_string()
    } else {
        "Value".to_string()
    };

    Plot::new("spectrum_plot")
        .legend(Legend::default())
        .x_axis_label("Wavelength [nm]")
        .y_axis_label(y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let curve: PlotPoints = report.curve.iter().copied().collect();
            plot_ui.line(
                Line::new(curve)
                    .name("Spectrum")
                    .color(Color32::LIGHT_BLUE)
                    .width(1.5),
            );

            let Some(readout) = &report.index else {
                return;
            };
            let r = &readout.result;
            let markers = [
                (&readout.a_label, r.band_a_wavelength, r.band_a_value),
                (&readout.b_label, r.band_b_wavelength, r.band_b_value),
            ];
            for (label, wavelength, value) in markers {
                plot_ui.vline(
                    VLine::new(wavelength)
                        .name(format!("{label} ({wavelength:.0} nm)"))
                        .color(Color32::RED)
                        .style(LineStyle::dashed_loose()),
                );
                plot_ui.points(
                    Points::new(vec![[wavelength, value]])
                        .radius(4.0)
                        .color(Color32::RED),
                );
                plot_ui.text(
                    Text::new(
                        PlotPoint::new(wavelength, value),
                        format!("{value:.2}{}", report.unit),
                    )
                    .anchor(Align2::LEFT_BOTTOM)
                    .color(Color32::RED),
                );
            }
        });
}
