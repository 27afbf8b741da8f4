mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use eframe::egui;

use app::InspectorApp;
use hyperspec_inspector::config::{InspectorConfig, Mode};
use hyperspec_inspector::index::Preset;
use state::AppState;

/// Click pixels of a hyperspectral or thermal image and read their spectra.
#[derive(Parser, Debug)]
#[command(name = "hyperspec-inspector", version, about)]
struct Cli {
    /// Acquisition mode; selects loader, calibration and index defaults
    #[arg(short, long, value_enum, default_value_t = Mode::VisNir)]
    mode: Mode,

    /// JSON configuration file (overrides the mode defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sample image
    #[arg(short, long)]
    sample: Option<PathBuf>,

    /// Dark reference cube
    #[arg(long)]
    dark: Option<PathBuf>,

    /// White reference cube
    #[arg(long)]
    white: Option<PathBuf>,

    /// Spectral index preset
    #[arg(short, long, value_enum)]
    preset: Option<Preset>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn into_config(self) -> Result<InspectorConfig> {
        let mut config = match &self.config {
            Some(path) => InspectorConfig::load(path)?,
            None => InspectorConfig::for_mode(self.mode),
        };
        if let Some(preset) = self.preset {
            config = config.with_preset(preset);
        }
        if self.sample.is_some() {
            config.sources.sample = self.sample;
        }
        if self.dark.is_some() {
            config.sources.dark = self.dark;
        }
        if self.white.is_some() {
            config.sources.white = self.white;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let print_config = cli.print_config;
    let mut config = cli.into_config()?;

    if print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let mut state = AppState::new(config.clone());
    if ui::panels::prompt_sources(&mut config, false) {
        state.config.sources = config.sources;
        state.load_scene();
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([700.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Hyperspectral Pixel Inspector",
        options,
        Box::new(|_cc| Ok(Box::new(InspectorApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI failed: {e}"))
}
