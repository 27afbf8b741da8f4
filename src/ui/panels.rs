use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use hyperspec_inspector::config::{ColormapKind, InspectorConfig, Mode, Sources};
use hyperspec_inspector::index::Preset;
use hyperspec_inspector::input::{ClickPolicy, InputMode};
use hyperspec_inspector::report::export_spectrum_csv;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – band, readout, thresholds
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading(format!("{} inspector", state.config.mode));
    ui.separator();

    let Some(scene) = &state.scene else {
        ui.label("No image loaded.");
        return;
    };
    let bands = scene.sample.cube.bands();
    let wavelengths = scene.sample.wavelengths.clone();
    let (rows, cols) = (scene.sample.cube.rows(), scene.sample.cube.cols());

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.label(format!("{rows} x {cols} pixels, {bands} bands"));

            // ---- Band selector ----
            if bands > 1 {
                ui.strong("Band");
                let mut band = state.band;
                ui.add(egui::Slider::new(&mut band, 0..=bands - 1));
                if let Some(w) = wavelengths.as_slice().get(band) {
                    ui.label(format!("{w:.1} nm"));
                }
                state.set_band(band);
                ui.separator();
            }

            // ---- Colormap ----
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Colormap");
                let current = state.config.colormap;
                egui::ComboBox::from_id_salt("colormap")
                    .selected_text(format!("{current:?}"))
                    .show_ui(ui, |ui: &mut Ui| {
                        for kind in [ColormapKind::Grayscale, ColormapKind::Inferno] {
                            if ui
                                .selectable_label(kind == current, format!("{kind:?}"))
                                .clicked()
                            {
                                state.set_colormap(kind);
                            }
                        }
                    });
            });
            ui.separator();

            // ---- Click hint ----
            let hint = match (state.config.click.policy, state.input_mode) {
                (ClickPolicy::Always, _) => "Click a pixel to inspect it.",
                (ClickPolicy::RequireModifier, InputMode::AwaitingModifier) => {
                    "Hold Shift and click a pixel."
                }
                (ClickPolicy::RequireModifier, InputMode::Armed) => "Armed: click a pixel.",
            };
            ui.label(RichText::new(hint).italics());
            ui.separator();

            // ---- Readout ----
            if let Some(text) = &state.report_text {
                ui.strong("Readout");
                ui.label(RichText::new(text).monospace());
                ui.separator();
            }

            // ---- Threshold table ----
            if let Some(spec) = &state.config.index {
                egui::CollapsingHeader::new(RichText::new(format!("{} tiers", spec.name)).strong())
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        ui.label(format!("{}: {}", spec.formula, spec.formula.expression()));
                        ui.label(format!(
                            "a = {} ({} nm), b = {} ({} nm)",
                            spec.bands.a_label, spec.bands.a_nm, spec.bands.b_label, spec.bands.b_nm
                        ));
                        TableBuilder::new(ui)
                            .striped(true)
                            .column(Column::auto())
                            .column(Column::remainder())
                            .header(18.0, |mut header| {
                                header.col(|ui| {
                                    ui.strong("Index >");
                                });
                                header.col(|ui| {
                                    ui.strong("Status");
                                });
                            })
                            .body(|mut body| {
                                for tier in spec.thresholds.tiers() {
                                    body.row(18.0, |mut row| {
                                        row.col(|ui| {
                                            ui.label(format!("{:.2}", tier.bound));
                                        });
                                        row.col(|ui| {
                                            ui.label(&tier.label);
                                        });
                                    });
                                }
                                body.row(18.0, |mut row| {
                                    row.col(|ui| {
                                        ui.label("else");
                                    });
                                    row.col(|ui| {
                                        ui.label(spec.thresholds.default_label());
                                    });
                                });
                            });
                    });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                ui.close_menu();
                if prompt_sources(&mut state.config, true) {
                    state.load_scene();
                }
            }
            let can_export = state.report.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export spectrum…"))
                .clicked()
            {
                ui.close_menu();
                export_dialog(state);
            }
            if ui.button("Save config…").clicked() {
                ui.close_menu();
                save_config_dialog(&state.config);
            }
        });

        ui.separator();

        let current_mode = state.config.mode;
        egui::ComboBox::from_id_salt("mode")
            .selected_text(current_mode.to_string())
            .show_ui(ui, |ui: &mut Ui| {
                for &mode in Mode::ALL {
                    if ui.selectable_label(mode == current_mode, mode.to_string()).clicked() {
                        state.set_mode(mode);
                    }
                }
            });

        if state.config.index.is_some() {
            let current = state.config.index.clone();
            let selected = Preset::ALL
                .iter()
                .find(|p| Some(p.spec()) == current)
                .map(|p| p.label())
                .unwrap_or("custom");
            egui::ComboBox::from_id_salt("preset")
                .selected_text(selected)
                .show_ui(ui, |ui: &mut Ui| {
                    for &preset in Preset::ALL {
                        if ui
                            .selectable_label(Some(preset.spec()) == current, preset.label())
                            .clicked()
                        {
                            state.set_preset(preset);
                        }
                    }
                });
        }

        ui.separator();

        if let Some(scene) = &state.scene {
            ui.label(scene.sample.source.display().to_string());
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn pick_file(title: &str, mode: Mode) -> Option<PathBuf> {
    let dialog = rfd::FileDialog::new().set_title(title);
    let dialog = match mode {
        Mode::VisNir => dialog.add_filter("TIFF files", &["tif", "tiff"]),
        Mode::Swir => dialog.add_filter("ENVI", &["hdr", "img", "raw", "dat", "bil", "bsq", "bip"]),
        Mode::Thermal => dialog.add_filter("BMP/PNG", &["bmp", "png"]),
    };
    dialog.add_filter("All files", &["*"]).pick_file()
}

/// Ask for the sample (and references when the mode needs them).
/// With `force`, every file is asked for again. Returns false if cancelled,
/// leaving `config.sources` untouched.
pub fn prompt_sources(config: &mut InspectorConfig, force: bool) -> bool {
    let mode = config.mode;
    match collect_sources(mode, &config.sources, force, |title| pick_file(title, mode)) {
        Some(sources) => {
            config.sources = sources;
            true
        }
        None => {
            log::info!("File selection cancelled.");
            false
        }
    }
}

/// Fill in the missing (or, with `force`, all) source paths through `pick`.
/// `None` as soon as one pick is cancelled.
fn collect_sources(
    mode: Mode,
    current: &Sources,
    force: bool,
    mut pick: impl FnMut(&str) -> Option<PathBuf>,
) -> Option<Sources> {
    let mut next = current.clone();
    let mut ask = |slot: &mut Option<PathBuf>, title: &str| -> Option<()> {
        if force || slot.is_none() {
            *slot = Some(pick(title)?);
        }
        Some(())
    };
    ask(&mut next.sample, "Select the sample image")?;
    if mode.needs_references() {
        ask(&mut next.dark, "Select the DARK reference")?;
        ask(&mut next.white, "Select the WHITE reference")?;
    }
    Some(next)
}

fn export_dialog(state: &mut AppState) {
    let Some(report) = &state.report else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Export pixel spectrum")
        .set_file_name(format!("pixel_{}_{}.csv", report.col, report.row))
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        match export_spectrum_csv(&path, report) {
            Ok(()) => log::info!("Exported spectrum to {}", path.display()),
            Err(e) => {
                log::error!("Failed to export spectrum: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

fn save_config_dialog(config: &InspectorConfig) {
    let file = rfd::FileDialog::new()
        .set_title("Save configuration")
        .set_file_name("inspector.json")
        .add_filter("JSON", &["json"])
        .save_file();

    if let Some(path) = file {
        match config.save(&path) {
            Ok(()) => log::info!("Saved configuration to {}", path.display()),
            Err(e) => log::error!("Failed to save configuration: {e:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn old_sources() -> Sources {
        Sources {
            sample: Some(PathBuf::from("old_sample.hdr")),
            dark: Some(PathBuf::from("old_dark.hdr")),
            white: Some(PathBuf::from("old_white.hdr")),
        }
    }

    #[test]
    fn test_cancel_keeps_previous_sources() {
        let current = old_sources();
        let mut answers = vec![Some(PathBuf::from("new_sample.hdr")), None].into_iter();
        let result = collect_sources(Mode::Swir, &current, true, |_| answers.next().flatten());
        assert!(result.is_none());
        assert_eq!(current, old_sources());
    }

    #[test]
    fn test_force_replaces_every_source() {
        let mut titles = Vec::new();
        let result = collect_sources(Mode::Swir, &old_sources(), true, |title| {
            titles.push(title.to_string());
            Some(PathBuf::from(format!("new_{}.hdr", titles.len())))
        })
        .unwrap();
        assert_eq!(titles.len(), 3);
        assert_eq!(result.sample, Some(PathBuf::from("new_1.hdr")));
        assert_eq!(result.white, Some(PathBuf::from("new_3.hdr")));
    }

    #[test]
    fn test_only_missing_sources_are_asked_for() {
        let current = Sources {
            sample: Some(PathBuf::from("leaf.tiff")),
            ..Sources::default()
        };
        let mut asked = 0;
        let result = collect_sources(Mode::VisNir, &current, false, |_| {
            asked += 1;
            None
        });
        assert_eq!(asked, 0);
        assert_eq!(result, Some(current));
    }
}
