use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tiff::encoder::{colortype, TiffEncoder};

use hyperspec_inspector::data::envi::write_envi;
use hyperspec_inspector::data::model::{Cube, WavelengthTable};

/// Write synthetic SWIR, VIS-NIR and thermal scenes for trying the inspector.
#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
struct Args {
    /// Output directory
    #[arg(default_value = "sample_data")]
    out: PathBuf,

    /// Image height in pixels
    #[arg(long, default_value_t = 48)]
    rows: usize,

    /// Image width in pixels
    #[arg(long, default_value_t = 64)]
    cols: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Leaf-like reflectance in [0, 1]. `vigour` in [0, 1] deepens the
/// chlorophyll well, raises the NIR plateau and strengthens the
/// nitrogen feature near 1510 nm.
fn leaf_reflectance(wl: f64, vigour: f64) -> f64 {
    let red_edge = 1.0 / (1.0 + (-(wl - 715.0) / 12.0).exp());
    let visible = 0.08 + gaussian(wl, 550.0, 30.0, 0.06) - gaussian(wl, 670.0, 25.0, 0.05 * vigour);
    let nir = 0.25 + 0.3 * vigour;
    let water = gaussian(wl, 1450.0, 60.0, 0.12) + gaussian(wl, 1940.0, 80.0, 0.2);
    let nitrogen = gaussian(wl, 1510.0, 25.0, 0.06 * vigour);
    let r = visible * (1.0 - red_edge) + (nir - water - nitrogen) * red_edge;
    r.clamp(0.01, 0.95)
}

/// Vigour gradient across the image with a stressed patch in the middle.
fn vigour(row: usize, col: usize, rows: usize, cols: usize) -> f64 {
    let base = col as f64 / (cols.max(2) - 1) as f64;
    let (cy, cx) = (rows as f64 / 2.0, cols as f64 / 2.0);
    let d = ((row as f64 - cy).powi(2) + (col as f64 - cx).powi(2)).sqrt();
    if d < rows.min(cols) as f64 / 6.0 {
        base * 0.2
    } else {
        base
    }
}

fn swir_scene(args: &Args, rng: &mut SimpleRng) -> Result<()> {
    let (rows, cols) = (args.rows, args.cols);
    let wavelengths: Vec<f64> = (0..160).map(|i| 950.0 + i as f64 * 5.0).collect();
    let bands = wavelengths.len();

    // Line scanner: per-column sensor response and dark current.
    let dark_level: Vec<f64> = (0..cols).map(|_| 180.0 + rng.gauss(0.0, 15.0)).collect();
    let gain: Vec<f64> = (0..cols).map(|_| 4000.0 * (1.0 + rng.gauss(0.0, 0.03))).collect();

    let mut sample = vec![0f32; rows * cols * bands];
    let mut dark = vec![0f32; rows * cols * bands];
    let mut white = vec![0f32; rows * cols * bands];
    for r in 0..rows {
        for c in 0..cols {
            let v = vigour(r, c, rows, cols);
            for (b, &wl) in wavelengths.iter().enumerate() {
                let i = (r * cols + c) * bands + b;
                let d = dark_level[c];
                let w_counts = d + gain[c] * 0.99;
                let refl = leaf_reflectance(wl, v);
                dark[i] = (d + rng.gauss(0.0, 2.0)) as f32;
                white[i] = (w_counts + rng.gauss(0.0, 8.0)) as f32;
                sample[i] = (d + gain[c] * refl + rng.gauss(0.0, 6.0)) as f32;
            }
        }
    }

    let table = WavelengthTable::new(wavelengths);
    for (name, data) in [("swir_sample", sample), ("swir_dark", dark), ("swir_white", white)] {
        let cube = Cube::new(rows, cols, bands, data)?;
        let header = write_envi(&args.out.join(name), &cube, &table)?;
        println!("Wrote {}", header.display());
    }
    Ok(())
}

fn vis_nir_scene(args: &Args, rng: &mut SimpleRng) -> Result<()> {
    let (rows, cols) = (args.rows, args.cols);
    let table = WavelengthTable::vis_nir();
    let path = args.out.join("vis_nir_sample.tiff");

    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
    for &wl in table.as_slice() {
        let page: Vec<u16> = (0..rows * cols)
            .map(|i| {
                let v = vigour(i / cols, i % cols, rows, cols);
                let scaled = leaf_reflectance(wl, v) * 10_000.0 + rng.gauss(0.0, 30.0);
                scaled.clamp(0.0, u16::MAX as f64) as u16
            })
            .collect();
        encoder.write_image::<colortype::Gray16>(cols as u32, rows as u32, &page)?;
    }
    println!("Wrote {} ({} bands)", path.display(), table.len());
    Ok(())
}

fn thermal_scene(args: &Args, out: &Path) -> Result<()> {
    let (rows, cols) = (args.rows as u32, args.cols as u32);
    let img = image::GrayImage::from_fn(cols, rows, |x, y| {
        let v = vigour(y as usize, x as usize, rows as usize, cols as usize);
        // Stressed canopy runs warmer.
        image::Luma([(255.0 * (1.0 - 0.7 * v)) as u8])
    });
    let path = out.join("thermal_sample.png");
    img.save(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    let mut rng = SimpleRng::new(args.seed);
    swir_scene(&args, &mut rng)?;
    vis_nir_scene(&args, &mut rng)?;
    thermal_scene(&args, &args.out)?;
    Ok(())
}
