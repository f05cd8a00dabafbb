//! High-level spectrum computation
//!
//! Ties preparation, the transform and the selected averaging mode together
//! for one (source, signal) trace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::binning::log_bin;
use super::fft::FftEngine;
use super::phase::unwrap_phase;
use super::welch::{segment_length, welch, WelchScaling};
use crate::error::{Result, SpectralError};
use crate::series::{detrend_linear, prepare, PreparedSeries, SampleTable, TimeRange};
use crate::windows::WindowKind;

/// Default logarithmic bin density
pub const DEFAULT_BINS_PER_DECADE: usize = 10;

/// Averaging applied to the spectrum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Averaging {
    /// Single transform over the whole series
    #[default]
    #[serde(alias = "none")]
    None,
    /// Averaged overlapping segments
    #[serde(alias = "welch")]
    Welch,
    /// Direct transform averaged into logarithmic bins
    #[serde(alias = "binning")]
    Binning,
}

impl Averaging {
    pub fn name(&self) -> &'static str {
        match self {
            Averaging::None => "None",
            Averaging::Welch => "Welch",
            Averaging::Binning => "Binning",
        }
    }
}

impl fmt::Display for Averaging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Averaging {
    type Err = SpectralError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Averaging::None),
            "welch" => Ok(Averaging::Welch),
            "binning" => Ok(Averaging::Binning),
            _ => Err(SpectralError::UnknownAveraging(s.to_string())),
        }
    }
}

/// Magnitude spectrum configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumConfig {
    pub averaging: Averaging,
    /// Segment window, used by Welch averaging
    pub window: WindowKind,
    pub detrend: bool,
    /// Keep at most 2^n_exp samples; also sets the Welch segment length
    pub n_exp: Option<u32>,
    pub bins_per_decade: usize,
    pub scaling: WelchScaling,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            averaging: Averaging::None,
            window: WindowKind::Hamming,
            detrend: false,
            n_exp: None,
            bins_per_decade: DEFAULT_BINS_PER_DECADE,
            scaling: WelchScaling::Density,
        }
    }
}

/// Phase spectrum configuration
///
/// Phase always comes from the direct transform, so there is no averaging
/// axis here.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseConfig {
    pub detrend: bool,
    pub n_exp: Option<u32>,
}

impl TryFrom<&SpectrumConfig> for PhaseConfig {
    type Error = SpectralError;

    fn try_from(config: &SpectrumConfig) -> Result<Self> {
        match config.averaging {
            Averaging::None => Ok(Self {
                detrend: config.detrend,
                n_exp: config.n_exp,
            }),
            other => Err(SpectralError::UnsupportedPhase(other)),
        }
    }
}

/// What produced a spectral result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrumMetadata {
    pub signal: String,
    pub averaging: Averaging,
    /// Window in effect; `None` for phase spectra
    pub window: Option<WindowKind>,
    pub detrend: bool,
    /// Samples used after preparation
    pub n_points: usize,
    pub dt: f64,
    pub fs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nperseg: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bins_per_decade: Option<usize>,
}

/// Magnitude spectrum, optionally with phase
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralResult {
    pub freq: Vec<f64>,
    pub magnitude: Vec<f64>,
    pub phase: Option<Vec<f64>>,
    /// Bin spacing; `None` on a non-uniform (binned) axis
    pub frequency_resolution: Option<f64>,
    pub max_frequency: f64,
    pub metadata: SpectrumMetadata,
}

impl SpectralResult {
    pub fn len(&self) -> usize {
        self.freq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freq.is_empty()
    }
}

/// Direct-transform spectrum with unwrapped phase
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSpectralResult {
    pub freq: Vec<f64>,
    pub magnitude: Vec<f64>,
    pub phase: Vec<f64>,
    pub frequency_resolution: f64,
    pub max_frequency: f64,
    pub metadata: SpectrumMetadata,
}

impl From<PhaseSpectralResult> for SpectralResult {
    fn from(result: PhaseSpectralResult) -> Self {
        Self {
            freq: result.freq,
            magnitude: result.magnitude,
            phase: Some(result.phase),
            frequency_resolution: Some(result.frequency_resolution),
            max_frequency: result.max_frequency,
            metadata: result.metadata,
        }
    }
}

/// Spectrum analyzer for prepared series
pub struct SpectrumAnalyzer {
    config: SpectrumConfig,
}

impl SpectrumAnalyzer {
    pub fn new(config: SpectrumConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SpectrumConfig {
        &self.config
    }

    /// Magnitude spectrum of an already prepared series
    pub fn analyze(&self, series: &PreparedSeries, signal: &str) -> Result<SpectralResult> {
        let dt = series.sampling_interval()?;
        let fs = 1.0 / dt;
        let config = &self.config;

        let mut metadata = SpectrumMetadata {
            signal: signal.to_string(),
            averaging: config.averaging,
            window: Some(config.window),
            detrend: config.detrend,
            n_points: series.len(),
            dt,
            fs,
            nperseg: None,
            bins_per_decade: None,
        };

        let (freq, magnitude, frequency_resolution) = match config.averaging {
            Averaging::None => {
                let (freq, magnitude) = direct_amplitude(&series.value, dt, config.detrend)?;
                (freq, magnitude, Some(fs / series.len() as f64))
            }
            Averaging::Welch => {
                let nperseg = segment_length(series.len(), config.n_exp);
                let estimate = welch(
                    &series.value,
                    dt,
                    nperseg,
                    config.window,
                    config.detrend,
                    config.scaling,
                )?;
                metadata.nperseg = Some(estimate.nperseg);
                (
                    estimate.freq,
                    estimate.amplitude,
                    Some(fs / estimate.nperseg as f64),
                )
            }
            Averaging::Binning => {
                let (freq, amplitude) = direct_amplitude(&series.value, dt, config.detrend)?;
                let power: Vec<f64> = amplitude.iter().map(|a| a * a).collect();
                let (freq, power) = log_bin(&freq, &power, config.bins_per_decade);
                metadata.bins_per_decade = Some(config.bins_per_decade);
                (freq, power.into_iter().map(f64::sqrt).collect(), None)
            }
        };

        let max_frequency = freq.last().copied().unwrap_or(0.0);
        Ok(SpectralResult {
            freq,
            magnitude,
            phase: None,
            frequency_resolution,
            max_frequency,
            metadata,
        })
    }
}

/// One-sided amplitude of the whole series, optionally detrended
fn direct_amplitude(values: &[f64], dt: f64, detrend: bool) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut values = values.to_vec();
    if detrend {
        detrend_linear(&mut values);
    }
    let mut engine = FftEngine::new(values.len());
    let amplitude = engine.compute_amplitude(&values)?;
    Ok((engine.frequency_axis(dt), amplitude))
}

/// Magnitude spectrum of one signal column
///
/// # Arguments
/// * `table` - Data source holding both columns
/// * `signal` - Signal column name
/// * `time_column` - Time column name
/// * `range` - Inclusive time range to analyze
/// * `config` - Averaging, window, detrend and truncation settings
pub fn compute_spectrum<T>(
    table: &T,
    signal: &str,
    time_column: &str,
    range: TimeRange,
    config: &SpectrumConfig,
) -> Result<SpectralResult>
where
    T: SampleTable + ?Sized,
{
    let (time, values) = table.numeric_pair(time_column, signal)?;
    let series = prepare(time, values, range, config.n_exp)?;
    SpectrumAnalyzer::new(config.clone()).analyze(&series, signal)
}

/// Direct-transform magnitude and unwrapped phase of one signal column
pub fn compute_phase_spectrum<T>(
    table: &T,
    signal: &str,
    time_column: &str,
    range: TimeRange,
    config: &PhaseConfig,
) -> Result<PhaseSpectralResult>
where
    T: SampleTable + ?Sized,
{
    let (time, values) = table.numeric_pair(time_column, signal)?;
    let series = prepare(time, values, range, config.n_exp)?;
    let dt = series.sampling_interval()?;

    let mut values = series.value.clone();
    if config.detrend {
        detrend_linear(&mut values);
    }
    let mut engine = FftEngine::new(values.len());
    let (magnitude, angle) = engine.compute_polar(&values)?;
    let freq = engine.frequency_axis(dt);

    let frequency_resolution = if freq.len() > 1 { freq[1] - freq[0] } else { 0.0 };
    let max_frequency = freq.last().copied().unwrap_or(0.0);

    Ok(PhaseSpectralResult {
        phase: unwrap_phase(&angle),
        freq,
        magnitude,
        frequency_resolution,
        max_frequency,
        metadata: SpectrumMetadata {
            signal: signal.to_string(),
            averaging: Averaging::None,
            window: None,
            detrend: config.detrend,
            n_points: series.len(),
            dt,
            fs: 1.0 / dt,
            nperseg: None,
            bins_per_decade: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{Column, DataTable};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    fn sine_table(n: usize, dt: f64, freq: f64) -> DataTable {
        let time: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();
        let value: Vec<f64> = time.iter().map(|t| (2.0 * PI * freq * t).sin()).collect();
        DataTable::new()
            .with_column("Time", Column::Numeric(time))
            .with_column("Fx", Column::Numeric(value))
    }

    fn peak_frequency(result: &SpectralResult) -> f64 {
        let (index, _) = result
            .magnitude
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .unwrap();
        result.freq[index]
    }

    #[test]
    fn test_averaging_parsing() {
        assert_eq!("welch".parse::<Averaging>().unwrap(), Averaging::Welch);
        assert_eq!("None".parse::<Averaging>().unwrap(), Averaging::None);
        assert_eq!(" BINNING ".parse::<Averaging>().unwrap(), Averaging::Binning);
        assert!(matches!(
            "median".parse::<Averaging>(),
            Err(SpectralError::UnknownAveraging(_))
        ));
        assert_eq!(Averaging::Welch.to_string(), "Welch");
    }

    #[test]
    fn test_direct_spectrum_finds_sinusoid() {
        let table = sine_table(4000, 0.001, 25.0);
        let result =
            compute_spectrum(&table, "Fx", "Time", TimeRange::all(), &SpectrumConfig::default())
                .unwrap();

        let df = result.frequency_resolution.unwrap();
        assert!((df - 0.25).abs() < 1e-9);
        assert_eq!(result.freq.len(), result.magnitude.len());
        assert!((peak_frequency(&result) - 25.0).abs() <= df);
        assert!((result.max_frequency - 500.0).abs() < 1e-9);
        assert_eq!(result.metadata.n_points, 4000);
        assert!(result.phase.is_none());
    }

    #[test]
    fn test_welch_spectrum_finds_sinusoid() {
        let table = sine_table(8192, 0.001, 40.0);
        let config = SpectrumConfig {
            averaging: Averaging::Welch,
            n_exp: Some(10),
            ..Default::default()
        };
        let result = compute_spectrum(&table, "Fx", "Time", TimeRange::all(), &config).unwrap();

        assert_eq!(result.metadata.n_points, 1024);
        assert_eq!(result.metadata.nperseg, Some(512));
        let df = result.frequency_resolution.unwrap();
        assert!((peak_frequency(&result) - 40.0).abs() <= df);
    }

    #[test]
    fn test_welch_smooths_noise() {
        let mut rng = StdRng::seed_from_u64(11);
        let n = 16384;
        let time: Vec<f64> = (0..n).map(|i| i as f64 * 0.01).collect();
        let value: Vec<f64> = (0..n).map(|_| rng.random_range(-1.0..1.0)).collect();
        let table = DataTable::new()
            .with_column("Time", Column::Numeric(time))
            .with_column("Noise", Column::Numeric(value));

        let spread = |config: &SpectrumConfig| {
            let result = compute_spectrum(&table, "Noise", "Time", TimeRange::all(), config).unwrap();
            let body = &result.magnitude[1..result.magnitude.len() - 1];
            let mean = body.iter().sum::<f64>() / body.len() as f64;
            let var = body.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / body.len() as f64;
            var.sqrt() / mean
        };

        let direct = spread(&SpectrumConfig::default());
        let averaged = spread(&SpectrumConfig {
            averaging: Averaging::Welch,
            ..Default::default()
        });
        assert!(averaged < direct / 2.0, "welch {averaged} vs direct {direct}");
    }

    #[test]
    fn test_binned_spectrum() {
        let table = sine_table(4096, 0.001, 50.0);
        let config = SpectrumConfig {
            averaging: Averaging::Binning,
            ..Default::default()
        };
        let direct =
            compute_spectrum(&table, "Fx", "Time", TimeRange::all(), &SpectrumConfig::default())
                .unwrap();
        let binned = compute_spectrum(&table, "Fx", "Time", TimeRange::all(), &config).unwrap();

        assert!(binned.len() <= direct.len());
        assert_eq!(binned.freq[0], 0.0);
        assert!((binned.magnitude[0] - direct.magnitude[0]).abs() < 1e-12);
        assert!(binned.frequency_resolution.is_none());
        assert_eq!(binned.metadata.bins_per_decade, Some(10));
        assert_eq!(binned.max_frequency, *binned.freq.last().unwrap());
    }

    #[test]
    fn test_phase_spectrum() {
        let table = sine_table(1024, 0.01, 5.0);
        let result =
            compute_phase_spectrum(&table, "Fx", "Time", TimeRange::all(), &PhaseConfig::default())
                .unwrap();

        assert_eq!(result.freq.len(), result.magnitude.len());
        assert_eq!(result.freq.len(), result.phase.len());
        assert!(result
            .phase
            .windows(2)
            .all(|w| (w[1] - w[0]).abs() <= PI + 1e-12));

        let merged = SpectralResult::from(result);
        assert_eq!(merged.phase.as_ref().map(Vec::len), Some(merged.freq.len()));
    }

    #[test]
    fn test_phase_rejects_averaging() {
        let config = SpectrumConfig {
            averaging: Averaging::Welch,
            ..Default::default()
        };
        assert!(matches!(
            PhaseConfig::try_from(&config),
            Err(SpectralError::UnsupportedPhase(Averaging::Welch))
        ));
        assert!(PhaseConfig::try_from(&SpectrumConfig::default()).is_ok());
    }

    #[test]
    fn test_input_errors() {
        let config = SpectrumConfig::default();

        let empty = DataTable::new();
        assert!(matches!(
            compute_spectrum(&empty, "Fx", "Time", TimeRange::all(), &config),
            Err(SpectralError::EmptyInput)
        ));

        let single = DataTable::new()
            .with_column("Time", Column::Numeric(vec![0.0]))
            .with_column("Fx", Column::Numeric(vec![1.0]));
        assert!(matches!(
            compute_spectrum(&single, "Fx", "Time", TimeRange::all(), &config),
            Err(SpectralError::InsufficientData { found: 1 })
        ));

        // 2^0 leaves a single sample out of many rows
        let truncated = SpectrumConfig {
            averaging: Averaging::Welch,
            n_exp: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            compute_spectrum(&sine_table(10, 0.1, 1.0), "Fx", "Time", TimeRange::all(), &truncated),
            Err(SpectralError::InsufficientData { found: 1 })
        ));

        let text = DataTable::new()
            .with_column("Time", Column::Numeric(vec![0.0, 1.0]))
            .with_column("Fx", Column::Text(vec!["a".into(), "b".into()]));
        assert!(matches!(
            compute_spectrum(&text, "Fx", "Time", TimeRange::all(), &config),
            Err(SpectralError::NonNumeric(name)) if name == "Fx"
        ));

        assert!(matches!(
            compute_phase_spectrum(&text, "Fy", "Time", TimeRange::all(), &PhaseConfig::default()),
            Err(SpectralError::MissingColumns(names)) if names == vec!["Fy".to_string()]
        ));
    }
}
