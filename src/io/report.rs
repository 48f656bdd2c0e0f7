//! Plain-text report writers.
//!
//! # Formats
//!
//! ## Summary table
//!
//! ```text
//! # metric: nrmse
//! # columns: label mean p5 p95
//! optimal_interpolation 0.42 0.31 0.55
//! neural_net 0.37 0.28 0.49
//! persistence nan nan nan
//! ```
//!
//! ## Error series
//!
//! ```text
//! # metric: grad_mse
//! step,date,value
//! 0,2017-01-01,0.012345
//! 1,2017-01-02,nan
//! ```
//!
//! The `date` column is left empty when the series carries no dates.
//!
//! ## Spectral curve
//!
//! ```text
//! wavenumber,wavelength,value
//! 3.906250e-3,2.560000e2,1.234567e1
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::analysis::{ErrorTimeSeries, SummaryTable};
use crate::spectral::SpectralCurve;

/// Error type for report writing.
#[derive(Debug, Error)]
pub enum ReportError {
    /// IO error writing the file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Format with `precision` decimals, writing `nan` for undefined values.
fn fixed(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{:.*}", precision, value)
    }
}

fn scientific(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{:.6e}", value)
    }
}

/// Write a summary table, one row per candidate in table order.
///
/// Labels containing whitespace have it replaced by `_` so each line keeps
/// four fields.
pub fn write_summary_table(path: &Path, table: &SummaryTable) -> Result<(), ReportError> {
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "# metric: {}", table.metric())?;
    writeln!(file, "# columns: label mean p5 p95")?;

    for (row, values) in table.rows().iter().zip(table.to_array().rows()) {
        let label: String = row
            .label()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        write!(file, "{}", label)?;
        for &v in values {
            write!(file, " {}", fixed(v, 2))?;
        }
        writeln!(file)?;
    }

    file.flush()?;
    Ok(())
}

/// Write a per-step error series.
pub fn write_error_series(path: &Path, series: &ErrorTimeSeries) -> Result<(), ReportError> {
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "# metric: {}", series.metric())?;
    writeln!(file, "step,date,value")?;

    let dates = series.dates();
    for (step, value) in series.values().into_iter().enumerate() {
        let date = dates
            .and_then(|d| d.get(step))
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        writeln!(file, "{},{},{}", step, date, fixed(value, 6))?;
    }

    file.flush()?;
    Ok(())
}

/// Write a spectral curve with its wavelengths.
pub fn write_spectral_curve(path: &Path, curve: &SpectralCurve) -> Result<(), ReportError> {
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "wavenumber,wavelength,value")?;
    for (k, v) in curve.iter() {
        writeln!(
            file,
            "{},{},{}",
            scientific(k),
            scientific(1.0 / k),
            scientific(v)
        )?;
    }

    file.flush()?;
    Ok(())
}
