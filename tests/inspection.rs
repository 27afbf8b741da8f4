use std::fs::File;
use std::io::BufWriter;

use hyperspec_inspector::config::{InspectorConfig, Mode};
use hyperspec_inspector::data::envi::write_envi;
use hyperspec_inspector::data::model::{Cube, WavelengthTable};
use hyperspec_inspector::index::Preset;
use hyperspec_inspector::input::{step, ClickPolicy, InputEvent, InputMode, MouseButton};
use hyperspec_inspector::report::format_report;
use hyperspec_inspector::session::Scene;
use tiff::encoder::{colortype, TiffEncoder};

const SWIR_WL: [f64; 5] = [1400.0, 1510.0, 1600.0, 1680.0, 1700.0];

fn filled(rows: usize, cols: usize, value: f32) -> Cube {
    Cube::new(rows, cols, SWIR_WL.len(), vec![value; rows * cols * SWIR_WL.len()]).unwrap()
}

/// 2 x 3 SWIR scene with dark = 100, white = 1100. Pixel (1, 2) reads
/// 30 % at 1510 nm and 40 % at 1680 nm once calibrated.
fn write_swir(dir: &std::path::Path) -> InspectorConfig {
    let table = WavelengthTable::new(SWIR_WL.to_vec());
    let (rows, cols, bands) = (2, 3, SWIR_WL.len());

    let mut data = vec![600.0f32; rows * cols * bands];
    let base = (cols + 2) * bands;
    data[base + 1] = 400.0;
    data[base + 3] = 500.0;
    let sample = Cube::new(rows, cols, bands, data).unwrap();

    let mut config = InspectorConfig::for_mode(Mode::Swir);
    config.sources.sample = Some(write_envi(&dir.join("sample"), &sample, &table).unwrap());
    config.sources.dark = Some(write_envi(&dir.join("dark"), &filled(rows, cols, 100.0), &table).unwrap());
    config.sources.white = Some(write_envi(&dir.join("white"), &filled(1, cols, 1100.0), &table).unwrap());
    config.reflectance = hyperspec_inspector::data::calibration::ReflectanceConfig::WhiteDark {
        white_reflectance: 1.0,
    };
    config
}

#[test]
fn test_swir_click_to_ndni() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_swir(dir.path());
    let scene = Scene::load(&config).unwrap();

    // Display is stretched to 500 rows; a click there maps back to row 1.
    let display = scene.render(config.display.band, &config).unwrap();
    assert_eq!(display.height, 500);
    assert_eq!(display.width, 3);

    let (_, pick) = step(
        InputMode::AwaitingModifier,
        InputEvent::Click {
            button: MouseButton::Primary,
            double: false,
            position: Some((2.7, 260.0)),
        },
        config.click.policy,
    );
    let pick = pick.unwrap();
    let (row, col) = display.to_source(pick.x, pick.y, config.click.rounding).unwrap();
    assert_eq!((row, col), (1, 2));

    let report = scene.inspect(row, col, &config).unwrap();
    let readout = report.index.as_ref().unwrap();
    assert_eq!(readout.name, "NDNI");
    assert_eq!(readout.result.band_a_wavelength, 1510.0);
    assert_eq!(readout.result.band_b_wavelength, 1680.0);
    assert!((readout.result.band_a_value - 30.0).abs() < 1e-3);
    assert!((readout.result.band_b_value - 40.0).abs() < 1e-3);
    assert!((readout.result.index - 0.13568).abs() < 1e-4);
    assert_eq!(readout.result.label, "Moderately healthy");

    let text = format_report(&report);
    assert!(text.starts_with("Pixel (column X, row Y): (2, 1)"));
    assert!(text.contains("R1510 reflectance (1510 nm): 30.00%"));
}

#[test]
fn test_swir_log_ratio_preset_flips_sign() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_swir(dir.path()).with_preset(Preset::NdniLogRatio);
    let scene = Scene::load(&config).unwrap();
    let report = scene.inspect(1, 2, &config).unwrap();
    let index = report.index.unwrap().result.index;
    assert!((index + 0.13568).abs() < 1e-4);
}

#[test]
fn test_swir_missing_reference_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = write_swir(dir.path());
    config.sources.white = None;
    let err = Scene::load(&config).unwrap_err();
    assert!(err.to_string().contains("white"));
}

#[test]
fn test_vis_nir_tiff_ndvi() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leaf.tiff");
    let table = WavelengthTable::vis_nir();
    {
        let file = File::create(&path).unwrap();
        let mut enc = TiffEncoder::new(BufWriter::new(file)).unwrap();
        for &wl in table.as_slice() {
            let v: u16 = if wl == 670.0 {
                1000
            } else if wl == 798.0 {
                3000
            } else {
                2000
            };
            enc.write_image::<colortype::Gray16>(2, 2, &[v; 4]).unwrap();
        }
    }

    let mut config = InspectorConfig::for_mode(Mode::VisNir);
    config.sources.sample = Some(path);
    let scene = Scene::load(&config).unwrap();
    assert_eq!(scene.sample.cube.bands(), 152);
    assert_eq!(scene.sample.wavelengths.as_slice()[0], 398.0);

    // Unarmed clicks do nothing; Shift arms exactly one pick.
    let policy = config.click.policy;
    assert_eq!(policy, ClickPolicy::RequireModifier);
    let click = InputEvent::Click {
        button: MouseButton::Primary,
        double: false,
        position: Some((1.2, 1.6)),
    };
    let (mode, pick) = step(InputMode::AwaitingModifier, click, policy);
    assert!(pick.is_none());
    let (mode, _) = step(mode, InputEvent::ModifierDown, policy);
    let (mode, pick) = step(mode, click, policy);
    assert_eq!(mode, InputMode::AwaitingModifier);

    let display = scene.render(0, &config).unwrap();
    let pick = pick.unwrap();
    let (row, col) = display.to_source(pick.x, pick.y, config.click.rounding).unwrap();
    assert_eq!((row, col), (1, 1));

    let report = scene.inspect(row, col, &config).unwrap();
    let result = &report.index.as_ref().unwrap().result;
    assert!((result.band_a_value - 10.0).abs() < 1e-9);
    assert!((result.band_b_value - 30.0).abs() < 1e-9);
    assert!((result.index - 0.5).abs() < 1e-6);
    assert_eq!(result.label, "Moderately healthy");
    assert!(format_report(&report).contains("NDVI: 0.50 → Moderately healthy"));
    // Smoothing resamples the curve for plotting.
    assert_eq!(report.curve.len(), config.smoothing.spline_points);
}

#[test]
fn test_thermal_png_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.png");
    image::GrayImage::from_fn(3, 2, |x, y| image::Luma([(x * 60 + y * 7) as u8]))
        .save(&path)
        .unwrap();

    let mut config = InspectorConfig::for_mode(Mode::Thermal);
    config.sources.sample = Some(path);
    let scene = Scene::load(&config).unwrap();
    let report = scene.inspect(1, 2, &config).unwrap();
    assert_eq!(report.values, vec![127.0]);
    assert!(report.index.is_none());
    assert!(format_report(&report).ends_with("Value: 127 / 255"));
}
