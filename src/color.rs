use eframe::egui::{Color32, ColorImage};
use palette::{Mix, Srgb};

use hyperspec_inspector::config::ColormapKind;
use hyperspec_inspector::data::display::DisplayImage;

// ---------------------------------------------------------------------------
// Colour stops
// ---------------------------------------------------------------------------

/// Samples of matplotlib's "inferno" map.
const INFERNO: [(f32, [u8; 3]); 9] = [
    (0.0, [0, 0, 4]),
    (0.125, [31, 12, 72]),
    (0.25, [85, 15, 109]),
    (0.375, [136, 34, 106]),
    (0.5, [186, 54, 85]),
    (0.625, [227, 89, 51]),
    (0.75, [249, 140, 10]),
    (0.875, [249, 201, 50]),
    (1.0, [252, 255, 164]),
];

const GRAY: [(f32, [u8; 3]); 2] = [(0.0, [0, 0, 0]), (1.0, [255, 255, 255])];

fn encoded(rgb: [u8; 3]) -> Srgb {
    Srgb::new(rgb[0], rgb[1], rgb[2]).into_format::<f32>()
}

/// Interpolate between stops in encoded sRGB, so a gray ramp stays
/// linear in display values.
fn interpolate(stops: &[(f32, [u8; 3])], t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let upper = stops
        .iter()
        .position(|(pos, _)| *pos >= t)
        .unwrap_or(stops.len() - 1)
        .max(1);
    let (p0, c0) = stops[upper - 1];
    let (p1, c1) = stops[upper];
    let f = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };

    let srgb: Srgb<u8> = encoded(c0).mix(encoded(c1), f).into_format();
    Color32::from_rgb(srgb.red, srgb.green, srgb.blue)
}

// ---------------------------------------------------------------------------
// Colormap: 8-bit value → Color32
// ---------------------------------------------------------------------------

/// Lookup table turning display values into colours.
#[derive(Debug, Clone)]
pub struct Colormap {
    pub kind: ColormapKind,
    lut: Vec<Color32>,
}

impl Colormap {
    pub fn new(kind: ColormapKind) -> Self {
        let stops: &[(f32, [u8; 3])] = match kind {
            ColormapKind::Grayscale => &GRAY,
            ColormapKind::Inferno => &INFERNO,
        };
        let lut = (0..=255u16)
            .map(|v| interpolate(stops, v as f32 / 255.0))
            .collect();
        Colormap { kind, lut }
    }

    pub fn color_for(&self, value: u8) -> Color32 {
        self.lut[value as usize]
    }

    /// Colourise a rendered band into an egui image.
    pub fn colorize(&self, image: &DisplayImage) -> ColorImage {
        let rgb: Vec<u8> = image
            .values
            .iter()
            .flat_map(|&v| {
                let c = self.color_for(v);
                [c.r(), c.g(), c.b()]
            })
            .collect();
        ColorImage::from_rgb([image.width, image.height], &rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_endpoints() {
        let cm = Colormap::new(ColormapKind::Grayscale);
        assert_eq!(cm.color_for(0), Color32::from_rgb(0, 0, 0));
        assert_eq!(cm.color_for(255), Color32::from_rgb(255, 255, 255));
    }

    #[test]
    fn test_gray_is_identity() {
        let cm = Colormap::new(ColormapKind::Grayscale);
        for v in [1u8, 64, 128, 200, 254] {
            assert_eq!(cm.color_for(v), Color32::from_rgb(v, v, v));
        }
    }

    #[test]
    fn test_inferno_endpoints() {
        let cm = Colormap::new(ColormapKind::Inferno);
        assert_eq!(cm.color_for(0), Color32::from_rgb(0, 0, 4));
        assert_eq!(cm.color_for(255), Color32::from_rgb(252, 255, 164));
    }

    #[test]
    fn test_inferno_warms_up() {
        let cm = Colormap::new(ColormapKind::Inferno);
        let lum = |c: Color32| c.r() as u32 + c.g() as u32 + c.b() as u32;
        assert!(lum(cm.color_for(200)) > lum(cm.color_for(50)));
    }
}
