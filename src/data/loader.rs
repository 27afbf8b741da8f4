use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::ColorType;

use super::envi::load_envi;
use super::model::{Cube, CubeKind, ImageCube, WavelengthTable, VIS_NIR_BANDS};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a cube from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.hdr` / `.img` / `.raw` / `.dat` / `.bil` / `.bsq` / `.bip` – ENVI
/// * `.tif` / `.tiff` – multi-sample image or one page per band
/// * `.bmp` / `.png`  – 8-bit thermal frame, one band
pub fn load_file(path: &Path) -> Result<ImageCube> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let cube = match ext.as_str() {
        "hdr" | "img" | "raw" | "dat" | "bil" | "bsq" | "bip" => load_envi(path),
        "tif" | "tiff" => load_tiff(path),
        "bmp" | "png" => load_thermal(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} cube {} ({} x {} x {})",
        cube.kind,
        path.display(),
        cube.cube.rows(),
        cube.cube.cols(),
        cube.cube.bands()
    );
    Ok(cube)
}

// ---------------------------------------------------------------------------
// TIFF loader
// ---------------------------------------------------------------------------

struct Page {
    width: usize,
    height: usize,
    samples: usize,
    data: Vec<f32>,
}

/// Hyperspectral TIFF in one of two layouts:
/// - a single image with one sample per band (H x W x B, contiguous)
/// - a stack of single-sample pages, one page per band
///
/// Wavelengths come from the VIS-NIR table when the band count matches it,
/// band numbers otherwise.
fn load_tiff(path: &Path) -> Result<ImageCube> {
    let file = File::open(path).context("opening TIFF file")?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .context("reading TIFF header")?
        .with_limits(Limits::unlimited());

    let mut pages = Vec::new();
    loop {
        let (width, height) = decoder.dimensions().context("reading TIFF dimensions")?;
        let samples = match decoder.colortype().context("reading TIFF color type")? {
            ColorType::Gray(_) => 1,
            ColorType::RGB(_) => 3,
            ColorType::RGBA(_) => 4,
            ColorType::Multiband { num_samples, .. } => num_samples as usize,
            other => bail!("Unsupported TIFF color type {other:?}"),
        };
        let data = decoding_to_f32(decoder.read_image().context("reading TIFF page")?);
        pages.push(Page {
            width: width as usize,
            height: height as usize,
            samples,
            data,
        });

        if !decoder.more_images() {
            break;
        }
        decoder.next_image().context("advancing to next TIFF page")?;
    }

    let cube = pages_to_cube(pages)?;
    let wavelengths = if cube.bands() == VIS_NIR_BANDS {
        WavelengthTable::vis_nir()
    } else {
        log::warn!(
            "{} bands do not match the VIS-NIR table; using band numbers",
            cube.bands()
        );
        WavelengthTable::band_numbers(cube.bands())
    };
    Ok(ImageCube::new(cube, wavelengths, path.to_path_buf(), CubeKind::Tiff)?)
}

fn pages_to_cube(mut pages: Vec<Page>) -> Result<Cube> {
    match pages.len() {
        0 => bail!("TIFF file has no images"),
        1 => {
            let p = pages.remove(0);
            if p.data.len() != p.width * p.height * p.samples {
                bail!(
                    "TIFF page holds {} samples, expected {} x {} x {}",
                    p.data.len(),
                    p.height,
                    p.width,
                    p.samples
                );
            }
            Ok(Cube::new(p.height, p.width, p.samples, p.data)?)
        }
        _ => {
            let (width, height) = (pages[0].width, pages[0].height);
            if let Some(i) = pages
                .iter()
                .position(|p| p.samples != 1 || p.width != width || p.height != height)
            {
                bail!("TIFF page {i} does not match a single-band {width} x {height} stack");
            }
            let planes: Vec<Vec<f32>> = pages.into_iter().map(|p| p.data).collect();
            Ok(Cube::from_bands(height, width, &planes)?)
        }
    }
}

fn decoding_to_f32(result: DecodingResult) -> Vec<f32> {
    match result {
        DecodingResult::U8(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::F16(buf) => buf.into_iter().map(|v| v.to_f32()).collect(),
        DecodingResult::F32(buf) => buf,
        DecodingResult::F64(buf) => buf.into_iter().map(|v| v as f32).collect(),
    }
}

// ---------------------------------------------------------------------------
// Thermal (LWIR) loader
// ---------------------------------------------------------------------------

/// 8-bit LWIR frame. Colour files keep their first channel.
fn load_thermal(path: &Path) -> Result<ImageCube> {
    let img = image::open(path).context("decoding image")?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let data: Vec<f32> = rgb.pixels().map(|p| p.0[0] as f32).collect();
    let cube = Cube::new(height as usize, width as usize, 1, data)?;
    Ok(ImageCube::new(
        cube,
        WavelengthTable::band_numbers(1),
        path.to_path_buf(),
        CubeKind::Thermal,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiff::encoder::{colortype, TiffEncoder};

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("cube.xyz")).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported"));
    }

    #[test]
    fn test_tiff_page_stack() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stack.tif");
        {
            let file = File::create(&path).unwrap();
            let mut enc = TiffEncoder::new(file).unwrap();
            for band in 0..3u16 {
                let data: Vec<u16> = (0..6).map(|px| band * 100 + px).collect();
                enc.write_image::<colortype::Gray16>(3, 2, &data).unwrap();
            }
        }
        let cube = load_file(&path).unwrap();
        assert_eq!(cube.kind, CubeKind::Tiff);
        assert_eq!(cube.cube.shape(), (2, 3, 3));
        assert_eq!(cube.cube.spectrum(1, 2).unwrap(), vec![5.0, 105.0, 205.0]);
        assert_eq!(cube.wavelengths.as_slice(), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_tiff_single_rgb_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.tiff");
        {
            let file = File::create(&path).unwrap();
            let mut enc = TiffEncoder::new(file).unwrap();
            let data: Vec<u8> = (0..2 * 2 * 3).map(|v| v as u8).collect();
            enc.write_image::<colortype::RGB8>(2, 2, &data).unwrap();
        }
        let cube = load_file(&path).unwrap();
        assert_eq!(cube.cube.shape(), (2, 2, 3));
        assert_eq!(cube.cube.spectrum(0, 1).unwrap(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_thermal_png_first_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lwir.png");
        let mut img = image::RgbImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgb([10, 200, 200]));
        img.put_pixel(1, 0, image::Rgb([250, 0, 0]));
        img.save(&path).unwrap();

        let cube = load_file(&path).unwrap();
        assert_eq!(cube.kind, CubeKind::Thermal);
        assert_eq!(cube.cube.shape(), (1, 2, 1));
        assert_eq!(cube.cube.spectrum(0, 0).unwrap(), vec![10.0]);
        assert_eq!(cube.cube.spectrum(0, 1).unwrap(), vec![250.0]);
    }
}
