/// Data layer: cube types, loading, calibration and display preparation.
///
/// Architecture:
/// ```text
///  .hdr/.img  .tif  .bmp/.png
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → ImageCube (Cube + WavelengthTable)
///   └──────────┘
///        │
///        ├──────────────────────┐
///        ▼                      ▼
///   ┌─────────────┐       ┌──────────┐
///   │ calibration │       │ display  │  band → 8-bit image
///   └─────────────┘       └──────────┘
///     pixel → reflectance spectrum
/// ```

pub mod calibration;
pub mod display;
pub mod envi;
pub mod loader;
pub mod model;
