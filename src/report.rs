use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use crate::session::PixelReport;

/// Multi-line readout for the plot overlay and the console.
pub fn format_report(report: &PixelReport) -> String {
    let mut text = format!(
        "Pixel (column X, row Y): ({}, {})",
        report.col, report.row
    );

    match &report.index {
        Some(readout) => {
            let r = &readout.result;
            let _ = write!(
                text,
                "\n{} reflectance ({:.0} nm): {:.2}{}",
                readout.a_label, r.band_a_wavelength, r.band_a_value, report.unit
            );
            let _ = write!(
                text,
                "\n{} reflectance ({:.0} nm): {:.2}{}",
                readout.b_label, r.band_b_wavelength, r.band_b_value, report.unit
            );
            let _ = write!(text, "\n{}: {:.2} → {}", readout.name, r.index, r.label);
            if r.degenerate {
                text.push_str(" (degenerate ratio)");
            }
        }
        None => {
            if let [value] = report.values.as_slice() {
                let _ = write!(text, "\nValue: {value:.0} / 255");
            } else {
                let _ = write!(text, "\n{} bands", report.values.len());
            }
        }
    }
    text
}

/// The console form: the readout framed by separator lines.
pub fn console_block(text: &str) -> String {
    let rule = "=".repeat(30);
    format!("\n{rule}\n{text}\n{rule}\n")
}

/// Write the pixel spectrum as `wavelength_nm,value` rows.
pub fn export_spectrum_csv(path: &Path, report: &PixelReport) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer
        .write_record(["wavelength_nm", "value"])
        .context("writing CSV header")?;
    for (w, v) in report.wavelengths.iter().zip(&report.values) {
        writer
            .write_record([w.to_string(), v.to_string()])
            .context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}
