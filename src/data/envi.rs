use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use super::model::{Cube, CubeKind, ImageCube, WavelengthTable};

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Sample layout of the binary file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interleave {
    Bsq,
    Bil,
    Bip,
}

/// ENVI `data type` codes that we can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    U8,
    I16,
    I32,
    F32,
    F64,
    U16,
    U32,
    I64,
    U64,
}

impl DataType {
    fn from_code(code: u32) -> Result<Self> {
        Ok(match code {
            1 => DataType::U8,
            2 => DataType::I16,
            3 => DataType::I32,
            4 => DataType::F32,
            5 => DataType::F64,
            12 => DataType::U16,
            13 => DataType::U32,
            14 => DataType::I64,
            15 => DataType::U64,
            6 | 9 => bail!("complex ENVI data (type {code}) is not supported"),
            other => bail!("unknown ENVI data type {other}"),
        })
    }

    fn code(&self) -> u32 {
        match self {
            DataType::U8 => 1,
            DataType::I16 => 2,
            DataType::I32 => 3,
            DataType::F32 => 4,
            DataType::F64 => 5,
            DataType::U16 => 12,
            DataType::U32 => 13,
            DataType::I64 => 14,
            DataType::U64 => 15,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            DataType::U8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::I32 | DataType::U32 | DataType::F32 => 4,
            DataType::F64 | DataType::I64 | DataType::U64 => 8,
        }
    }

    fn decode(&self, bytes: &[u8], big_endian: bool) -> f32 {
        macro_rules! read {
            ($t:ty, $n:expr) => {{
                let mut buf = [0u8; $n];
                buf.copy_from_slice(&bytes[..$n]);
                if big_endian {
                    <$t>::from_be_bytes(buf) as f32
                } else {
                    <$t>::from_le_bytes(buf) as f32
                }
            }};
        }
        match self {
            DataType::U8 => bytes[0] as f32,
            DataType::I16 => read!(i16, 2),
            DataType::U16 => read!(u16, 2),
            DataType::I32 => read!(i32, 4),
            DataType::U32 => read!(u32, 4),
            DataType::F32 => read!(f32, 4),
            DataType::F64 => read!(f64, 8),
            DataType::I64 => read!(i64, 8),
            DataType::U64 => read!(u64, 8),
        }
    }
}

/// The parts of an ENVI header this tool understands.
#[derive(Debug, Clone, PartialEq)]
pub struct EnviHeader {
    pub samples: usize,
    pub lines: usize,
    pub bands: usize,
    pub header_offset: usize,
    pub data_type: DataType,
    pub interleave: Interleave,
    pub big_endian: bool,
    pub wavelengths: Option<Vec<f64>>,
}

/// Split an ENVI header into `key = value` fields. Brace-delimited values
/// may span several lines; keys are lower-cased.
pub fn parse_fields(text: &str) -> Result<BTreeMap<String, String>> {
    let mut lines = text.lines();
    match lines.next() {
        Some(first) if first.trim() == "ENVI" => {}
        _ => bail!("not an ENVI header (missing 'ENVI' magic line)"),
    }

    let mut fields = BTreeMap::new();
    let mut pending: Option<(String, String)> = None;

    for line in lines {
        if let Some((key, mut value)) = pending.take() {
            value.push(' ');
            value.push_str(line.trim());
            if value.contains('}') {
                fields.insert(key, value);
            } else {
                pending = Some((key, value));
            }
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim().to_string();
        if value.starts_with('{') && !value.contains('}') {
            pending = Some((key, value));
        } else {
            fields.insert(key, value);
        }
    }

    if let Some((key, _)) = pending {
        bail!("unterminated '{{' in header field '{key}'");
    }
    Ok(fields)
}

fn brace_list(value: &str) -> &str {
    value.trim().trim_start_matches('{').trim_end_matches('}')
}

impl EnviHeader {
    pub fn parse(text: &str) -> Result<Self> {
        let fields = parse_fields(text)?;

        let number = |key: &str| -> Result<usize> {
            fields
                .get(key)
                .with_context(|| format!("header missing '{key}'"))?
                .parse::<usize>()
                .with_context(|| format!("header field '{key}' is not an integer"))
        };

        let samples = number("samples")?;
        let lines = number("lines")?;
        let bands = number("bands")?;
        let header_offset = if fields.contains_key("header offset") {
            number("header offset")?
        } else {
            0
        };
        let data_type = DataType::from_code(number("data type")? as u32)?;

        let interleave = match fields
            .get("interleave")
            .map(|s| s.to_ascii_lowercase())
            .as_deref()
        {
            Some("bsq") | None => Interleave::Bsq,
            Some("bil") => Interleave::Bil,
            Some("bip") => Interleave::Bip,
            Some(other) => bail!("unknown interleave '{other}'"),
        };

        let big_endian = fields
            .get("byte order")
            .map(|s| s.trim() == "1")
            .unwrap_or(false);

        let wavelengths = match fields.get("wavelength") {
            Some(raw) => {
                let mut values = brace_list(raw)
                    .split(',')
                    .map(|tok| tok.trim())
                    .filter(|tok| !tok.is_empty())
                    .enumerate()
                    .map(|(i, tok)| {
                        tok.parse::<f64>()
                            .with_context(|| format!("wavelength[{i}]: '{tok}' is not a number"))
                    })
                    .collect::<Result<Vec<f64>>>()?;
                if values.len() != bands {
                    bail!(
                        "header lists {} wavelengths for {bands} bands",
                        values.len()
                    );
                }
                let units = fields
                    .get("wavelength units")
                    .map(|u| u.to_ascii_lowercase())
                    .unwrap_or_default();
                if units.starts_with("micro") || units == "um" {
                    values.iter_mut().for_each(|w| *w *= 1000.0);
                }
                Some(values)
            }
            None => None,
        };

        Ok(Self {
            samples,
            lines,
            bands,
            header_offset,
            data_type,
            interleave,
            big_endian,
            wavelengths,
        })
    }

    fn sample_count(&self) -> Result<usize> {
        self.samples
            .checked_mul(self.lines)
            .and_then(|n| n.checked_mul(self.bands))
            .with_context(|| {
                format!(
                    "cube size {} x {} x {} overflows",
                    self.lines, self.samples, self.bands
                )
            })
    }

    /// Decode the binary payload into a BIP cube.
    pub fn decode(&self, bytes: &[u8]) -> Result<Cube> {
        let size = self.data_type.size();
        let count = self.sample_count()?;
        let needed = count
            .checked_mul(size)
            .and_then(|n| n.checked_add(self.header_offset))
            .context("data size overflows")?;
        if bytes.len() < needed {
            bail!(
                "data file holds {} bytes, header requires {needed}",
                bytes.len()
            );
        }
        let payload = &bytes[self.header_offset..needed];

        let (s_n, l_n, b_n) = (self.samples, self.lines, self.bands);
        let mut data = vec![0.0f32; count];
        for (i, chunk) in payload.chunks_exact(size).enumerate() {
            let (line, sample, band) = match self.interleave {
                Interleave::Bsq => (i / s_n % l_n, i % s_n, i / (s_n * l_n)),
                Interleave::Bil => (i / (b_n * s_n), i % s_n, i / s_n % b_n),
                Interleave::Bip => (i / (s_n * b_n), i / b_n % s_n, i % b_n),
            };
            data[(line * s_n + sample) * b_n + band] =
                self.data_type.decode(chunk, self.big_endian);
        }
        Cube::new(l_n, s_n, b_n, data).context("building cube from ENVI data")
    }
}

// ---------------------------------------------------------------------------
// File pairing
// ---------------------------------------------------------------------------

const DATA_EXTENSIONS: &[&str] = &["img", "raw", "dat", "bil", "bsq", "bip"];

/// Given either the header or the data file, return `(header, data)`.
pub fn locate_pair(path: &Path) -> Result<(PathBuf, PathBuf)> {
    let is_header = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("hdr"))
        .unwrap_or(false);

    if is_header {
        let stem = path.with_extension("");
        let mut candidates = vec![stem.clone()];
        candidates.extend(DATA_EXTENSIONS.iter().map(|ext| stem.with_extension(ext)));
        let data = candidates
            .into_iter()
            .find(|c| c.is_file() && c != path)
            .with_context(|| format!("no data file found next to {}", path.display()))?;
        Ok((path.to_path_buf(), data))
    } else {
        let mut appended = path.as_os_str().to_owned();
        appended.push(".hdr");
        let candidates = [PathBuf::from(appended), path.with_extension("hdr")];
        let header = candidates
            .into_iter()
            .find(|c| c.is_file())
            .with_context(|| format!("no .hdr found for {}", path.display()))?;
        Ok((header, path.to_path_buf()))
    }
}

/// Open an ENVI cube from its header or data file.
pub fn load_envi(path: &Path) -> Result<ImageCube> {
    let (header_path, data_path) = locate_pair(path)?;
    let text = std::fs::read_to_string(&header_path)
        .with_context(|| format!("reading {}", header_path.display()))?;
    let header = EnviHeader::parse(&text)
        .with_context(|| format!("parsing {}", header_path.display()))?;
    let bytes = std::fs::read(&data_path)
        .with_context(|| format!("reading {}", data_path.display()))?;
    let cube = header.decode(&bytes)?;

    let wavelengths = match &header.wavelengths {
        Some(w) => WavelengthTable::new(w.clone()),
        None => {
            log::warn!(
                "{} has no wavelength list; using band numbers",
                header_path.display()
            );
            WavelengthTable::band_numbers(header.bands)
        }
    };
    Ok(ImageCube::new(cube, wavelengths, header_path, CubeKind::Envi)?)
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Write `cube` as a little-endian float32 BSQ pair `<stem>.hdr` + `<stem>.img`.
/// Returns the header path.
pub fn write_envi(stem: &Path, cube: &Cube, wavelengths: &WavelengthTable) -> Result<PathBuf> {
    let header_path = stem.with_extension("hdr");
    let data_path = stem.with_extension("img");
    let (rows, cols, bands) = cube.shape();

    let wl = wavelengths
        .as_slice()
        .iter()
        .map(|w| format!("{w:.2}"))
        .collect::<Vec<_>>()
        .join(", ");
    let header = format!(
        "ENVI\n\
         description = {{hyperspec-inspector export}}\n\
         samples = {cols}\n\
         lines = {rows}\n\
         bands = {bands}\n\
         header offset = 0\n\
         file type = ENVI Standard\n\
         data type = {}\n\
         interleave = bsq\n\
         byte order = 0\n\
         wavelength units = Nanometers\n\
         wavelength = {{{wl}}}\n",
        DataType::F32.code()
    );
    std::fs::write(&header_path, header)
        .with_context(|| format!("writing {}", header_path.display()))?;

    let file = std::fs::File::create(&data_path)
        .with_context(|| format!("creating {}", data_path.display()))?;
    let mut out = std::io::BufWriter::new(file);
    for b in 0..bands {
        for v in cube.band(b)? {
            out.write_all(&v.to_le_bytes())?;
        }
    }
    out.flush()?;
    Ok(header_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "ENVI
description = {
  test cube}
samples = 3
lines = 2
bands = 2
header offset = 0
data type = 12
interleave = bil
byte order = 0
wavelength = { 1510.0,
 1680.0 }
";

    #[test]
    fn test_parse_header() {
        let h = EnviHeader::parse(HEADER).unwrap();
        assert_eq!((h.samples, h.lines, h.bands), (3, 2, 2));
        assert_eq!(h.data_type, DataType::U16);
        assert_eq!(h.interleave, Interleave::Bil);
        assert_eq!(h.wavelengths, Some(vec![1510.0, 1680.0]));
    }

    #[test]
    fn test_missing_magic() {
        assert!(EnviHeader::parse("samples = 3\n").is_err());
    }

    #[test]
    fn test_micrometre_wavelengths() {
        let text = "ENVI\nsamples = 1\nlines = 1\nbands = 2\ndata type = 4\n\
                    wavelength units = Micrometers\nwavelength = {1.51, 1.68}\n";
        let h = EnviHeader::parse(text).unwrap();
        let w = h.wavelengths.unwrap();
        assert!((w[0] - 1510.0).abs() < 1e-9);
        assert!((w[1] - 1680.0).abs() < 1e-9);
    }

    #[test]
    fn test_oversized_header_is_an_error() {
        let text = "ENVI\nsamples = 4294967296\nlines = 4294967296\nbands = 2\ndata type = 4\n";
        let h = EnviHeader::parse(text).unwrap();
        let err = h.decode(&[0u8; 64]).unwrap_err();
        assert!(err.to_string().contains("overflows"));

        let text = "ENVI\nsamples = 2\nlines = 2\nbands = 2\ndata type = 4\n\
                    header offset = 18446744073709551615\n";
        let h = EnviHeader::parse(text).unwrap();
        assert!(h.decode(&[0u8; 64]).is_err());
    }

    #[test]
    fn test_decode_bil() {
        let h = EnviHeader::parse(HEADER).unwrap();
        // line 0: band0 [1,2,3], band1 [4,5,6]; line 1: band0 [7,8,9], band1 [10,11,12]
        let bytes: Vec<u8> = (1u16..=12).flat_map(|v| v.to_le_bytes()).collect();
        let cube = h.decode(&bytes).unwrap();
        assert_eq!(cube.spectrum(0, 0).unwrap(), vec![1.0, 4.0]);
        assert_eq!(cube.spectrum(1, 2).unwrap(), vec![9.0, 12.0]);
    }

    #[test]
    fn test_decode_layouts_agree() {
        // 2 lines x 2 samples x 3 bands; value = 100*line + 10*sample + band
        let value = |l: usize, s: usize, b: usize| (100 * l + 10 * s + b) as f32;
        let mut bsq = Vec::new();
        let mut bil = Vec::new();
        let mut bip = Vec::new();
        for b in 0..3 {
            for l in 0..2 {
                for s in 0..2 {
                    bsq.extend(value(l, s, b).to_le_bytes());
                }
            }
        }
        for l in 0..2 {
            for b in 0..3 {
                for s in 0..2 {
                    bil.extend(value(l, s, b).to_le_bytes());
                }
            }
            for s in 0..2 {
                for b in 0..3 {
                    bip.extend(value(l, s, b).to_le_bytes());
                }
            }
        }
        let mut cubes = Vec::new();
        for (layout, bytes) in [("bsq", bsq), ("bil", bil), ("bip", bip)] {
            let text = format!(
                "ENVI\nsamples = 2\nlines = 2\nbands = 3\ndata type = 4\ninterleave = {layout}\n"
            );
            cubes.push(EnviHeader::parse(&text).unwrap().decode(&bytes).unwrap());
        }
        assert_eq!(cubes[0], cubes[1]);
        assert_eq!(cubes[1], cubes[2]);
        assert_eq!(cubes[0].spectrum(1, 1).unwrap(), vec![110.0, 111.0, 112.0]);
    }

    #[test]
    fn test_big_endian() {
        let text = "ENVI\nsamples = 1\nlines = 1\nbands = 1\ndata type = 2\nbyte order = 1\n";
        let h = EnviHeader::parse(text).unwrap();
        let cube = h.decode(&(-300i16).to_be_bytes()).unwrap();
        assert_eq!(cube.spectrum(0, 0).unwrap(), vec![-300.0]);
    }

    #[test]
    fn test_short_payload() {
        let h = EnviHeader::parse(HEADER).unwrap();
        assert!(h.decode(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cube = Cube::new(2, 3, 2, (0..12).map(|v| v as f32 * 0.5).collect()).unwrap();
        let wl = WavelengthTable::new(vec![670.0, 798.0]);
        let hdr = write_envi(&dir.path().join("leaf"), &cube, &wl).unwrap();

        let loaded = load_envi(&hdr).unwrap();
        assert_eq!(loaded.cube, cube);
        assert_eq!(loaded.wavelengths, wl);

        // Opening the data file finds the same header.
        let via_data = load_envi(&dir.path().join("leaf.img")).unwrap();
        assert_eq!(via_data.cube, cube);
    }
}
