//! Python bindings for spectrum computation and peak detection

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;

use super::to_py_err;
use crate::peaks::{self, PeakCriteria};
use crate::series::{Column, DataTable, TimeRange};
use crate::spectrum::{self, Averaging, PhaseConfig, SpectrumConfig, WelchScaling};
use crate::windows::WindowKind;

const TIME: &str = "Time";
const SIGNAL: &str = "Signal";

fn series_table(time: &PyReadonlyArray1<f64>, values: &PyReadonlyArray1<f64>) -> PyResult<DataTable> {
    Ok(DataTable::new()
        .with_column(TIME, Column::Numeric(time.as_slice()?.to_vec()))
        .with_column(SIGNAL, Column::Numeric(values.as_slice()?.to_vec())))
}

/// Magnitude spectrum of one sampled signal
///
/// Args:
///     time: Sample times in seconds
///     values: Signal values
///     averaging: "None", "Welch" or "Binning"
///     window: Window name used for Welch segments
///     detrend: Remove a linear trend first
///     n_exp: Keep at most 2**n_exp samples
///     bins_per_decade: Bin density for "Binning"
///     density: Welch density (True) or power spectrum (False) scaling
///     start_time, end_time: Inclusive time range
///
/// Returns:
///     (freq, magnitude) as numpy arrays
#[pyfunction]
#[pyo3(signature = (
    time, values, averaging="None", window="hamming", detrend=false, n_exp=None,
    bins_per_decade=10, density=true, start_time=None, end_time=None
))]
#[allow(clippy::too_many_arguments)]
pub fn compute_spectrum<'py>(
    py: Python<'py>,
    time: PyReadonlyArray1<f64>,
    values: PyReadonlyArray1<f64>,
    averaging: &str,
    window: &str,
    detrend: bool,
    n_exp: Option<u32>,
    bins_per_decade: usize,
    density: bool,
    start_time: Option<f64>,
    end_time: Option<f64>,
) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>)> {
    let config = SpectrumConfig {
        averaging: averaging.parse::<Averaging>().map_err(to_py_err)?,
        window: WindowKind::from_name(window).map_err(to_py_err)?,
        detrend,
        n_exp,
        bins_per_decade,
        scaling: if density {
            WelchScaling::Density
        } else {
            WelchScaling::Spectrum
        },
    };

    let table = series_table(&time, &values)?;
    let result = spectrum::compute_spectrum(
        &table,
        SIGNAL,
        TIME,
        TimeRange::new(start_time, end_time),
        &config,
    )
    .map_err(to_py_err)?;

    Ok((
        PyArray1::from_vec(py, result.freq),
        PyArray1::from_vec(py, result.magnitude),
    ))
}

/// Direct-transform magnitude and unwrapped phase of one sampled signal
///
/// Returns:
///     (freq, magnitude, phase) as numpy arrays
#[pyfunction]
#[pyo3(signature = (time, values, detrend=false, n_exp=None, start_time=None, end_time=None))]
pub fn compute_phase_spectrum<'py>(
    py: Python<'py>,
    time: PyReadonlyArray1<f64>,
    values: PyReadonlyArray1<f64>,
    detrend: bool,
    n_exp: Option<u32>,
    start_time: Option<f64>,
    end_time: Option<f64>,
) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>, &'py PyArray1<f64>)> {
    let table = series_table(&time, &values)?;
    let result = spectrum::compute_phase_spectrum(
        &table,
        SIGNAL,
        TIME,
        TimeRange::new(start_time, end_time),
        &PhaseConfig { detrend, n_exp },
    )
    .map_err(to_py_err)?;

    Ok((
        PyArray1::from_vec(py, result.freq),
        PyArray1::from_vec(py, result.magnitude),
        PyArray1::from_vec(py, result.phase),
    ))
}

/// Find peaks in a magnitude spectrum
///
/// Returns:
///     (indices, frequencies, magnitudes) as numpy arrays
#[pyfunction]
#[pyo3(signature = (freq, magnitude, prominence=Some(0.1), width=None, height=None, threshold=None))]
pub fn find_peaks<'py>(
    py: Python<'py>,
    freq: PyReadonlyArray1<f64>,
    magnitude: PyReadonlyArray1<f64>,
    prominence: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    threshold: Option<f64>,
) -> PyResult<(&'py PyArray1<usize>, &'py PyArray1<f64>, &'py PyArray1<f64>)> {
    let criteria = PeakCriteria {
        prominence,
        width,
        height,
        threshold,
    };
    let peaks = peaks::find_peaks(freq.as_slice()?, magnitude.as_slice()?, &criteria)
        .map_err(to_py_err)?;

    Ok((
        PyArray1::from_vec(py, peaks.indices),
        PyArray1::from_vec(py, peaks.frequencies),
        PyArray1::from_vec(py, peaks.magnitudes),
    ))
}
