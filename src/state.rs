use hyperspec_inspector::config::{ColormapKind, InspectorConfig, Mode};
use hyperspec_inspector::data::display::DisplayImage;
use hyperspec_inspector::index::Preset;
use hyperspec_inspector::input::{step, InputEvent, InputMode};
use hyperspec_inspector::report::{console_block, format_report};
use hyperspec_inspector::session::{PixelReport, Scene};

use crate::color::Colormap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: InspectorConfig,

    /// Loaded scene (None until the user opens a sample).
    pub scene: Option<Scene>,

    /// Band currently shown.
    pub band: usize,

    /// Rendered band (cached until band or scene changes).
    pub display: Option<DisplayImage>,

    /// Set when `display` changed and the GPU texture must be rebuilt.
    pub texture_dirty: bool,

    pub colormap: Colormap,

    /// Click arming state.
    pub input_mode: InputMode,

    /// Last pixel inspected, as (row, col).
    pub last_pixel: Option<(usize, usize)>,

    /// Readout for the last pixel.
    pub report: Option<PixelReport>,
    pub report_text: Option<String>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: InspectorConfig) -> Self {
        Self {
            band: config.display.band,
            colormap: Colormap::new(config.colormap),
            config,
            scene: None,
            display: None,
            texture_dirty: false,
            input_mode: InputMode::default(),
            last_pixel: None,
            report: None,
            report_text: None,
            status_message: None,
        }
    }

    /// Load whatever `config.sources` names. Errors end up in the status bar.
    pub fn load_scene(&mut self) {
        match Scene::load(&self.config) {
            Ok(scene) => self.set_scene(scene),
            Err(e) => {
                log::error!("Failed to load scene: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded scene and render its default band.
    pub fn set_scene(&mut self, scene: Scene) {
        let bands = scene.sample.cube.bands();
        self.band = self.config.display.band.min(bands - 1);
        self.scene = Some(scene);
        self.clear_readout();
        self.status_message = None;
        self.rerender();
    }

    /// Re-render the current band.
    pub fn rerender(&mut self) {
        let Some(scene) = &self.scene else {
            return;
        };
        match scene.render(self.band, &self.config) {
            Ok(img) => {
                self.display = Some(img);
                self.texture_dirty = true;
            }
            Err(e) => {
                log::error!("Failed to render band {}: {e:#}", self.band);
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    pub fn set_band(&mut self, band: usize) {
        if band != self.band {
            self.band = band;
            self.rerender();
        }
    }

    /// Switch acquisition mode, keeping the selected files.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.config.mode {
            return;
        }
        let sources = self.config.sources.clone();
        self.config = InspectorConfig::for_mode(mode);
        self.config.sources = sources;
        self.colormap = Colormap::new(self.config.colormap);
        self.input_mode = InputMode::default();
        self.scene = None;
        self.display = None;
        self.clear_readout();
        if self.config.sources.sample.is_some() {
            self.load_scene();
        }
    }

    fn clear_readout(&mut self) {
        self.last_pixel = None;
        self.report = None;
        self.report_text = None;
    }

    pub fn set_colormap(&mut self, kind: ColormapKind) {
        if kind != self.config.colormap {
            self.config.colormap = kind;
            self.colormap = Colormap::new(kind);
            self.texture_dirty = self.display.is_some();
        }
    }

    /// Swap the index preset and refresh the current readout.
    pub fn set_preset(&mut self, preset: Preset) {
        self.config.index = Some(preset.spec());
        if let Some((row, col)) = self.last_pixel {
            self.inspect(row, col);
        }
    }

    /// Feed one input event through the arming state machine.
    pub fn handle_input(&mut self, event: InputEvent) {
        let (mode, pick) = step(self.input_mode, event, self.config.click.policy);
        self.input_mode = mode;

        let Some(pick) = pick else {
            return;
        };
        let Some(display) = &self.display else {
            return;
        };
        match display.to_source(pick.x, pick.y, self.config.click.rounding) {
            Some((row, col)) => self.inspect(row, col),
            None => log::debug!("click at ({:.1}, {:.1}) outside the image", pick.x, pick.y),
        }
    }

    /// Compute, print and keep the readout for one pixel.
    pub fn inspect(&mut self, row: usize, col: usize) {
        let Some(scene) = &self.scene else {
            return;
        };
        match scene.inspect(row, col, &self.config) {
            Ok(report) => {
                let text = format_report(&report);
                println!("{}", console_block(&text));
                log::info!("Inspected pixel (row {row}, col {col})");
                self.last_pixel = Some((row, col));
                self.report = Some(report);
                self.report_text = Some(text);
                self.status_message = None;
            }
            Err(e) => {
                log::warn!("Inspection failed: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperspec_inspector::data::calibration::ReflectanceModel;
    use hyperspec_inspector::data::model::{Cube, CubeKind, ImageCube, WavelengthTable};
    use std::path::PathBuf;

    fn inspected_state() -> AppState {
        let cube = Cube::new(1, 2, 3, vec![1000.0, 1000.0, 3000.0, 500.0, 500.0, 500.0]).unwrap();
        let wl = WavelengthTable::new(vec![600.0, 670.0, 798.0]);
        let image = ImageCube::new(cube, wl, PathBuf::from("mem.tiff"), CubeKind::Tiff).unwrap();
        let mut state = AppState::new(InspectorConfig::for_mode(Mode::VisNir));
        state.set_scene(Scene::new(image, ReflectanceModel::Scaled { scale: 10_000.0 }));
        state.inspect(0, 0);
        state
    }

    #[test]
    fn test_inspect_keeps_readout() {
        let state = inspected_state();
        assert_eq!(state.last_pixel, Some((0, 0)));
        assert!(state.report.is_some());
        assert!(state.report_text.is_some());
    }

    #[test]
    fn test_failed_mode_switch_clears_readout() {
        let mut state = inspected_state();
        state.config.sources.sample = Some(PathBuf::from("does/not/exist.hdr"));
        state.set_mode(Mode::Swir);

        assert!(state.scene.is_none());
        assert!(state.status_message.is_some());
        assert!(state.report.is_none());
        assert!(state.report_text.is_none());
        assert!(state.last_pixel.is_none());
    }
}
