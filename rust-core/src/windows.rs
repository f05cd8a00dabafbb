//! Window functions for spectral analysis
//!
//! The three named kinds are symmetric (end points included), which is what
//! Welch segments use. Anything else goes through the generic catalog, whose
//! windows are periodic like a `get_window` lookup.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectralError};

/// Window kinds reachable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WindowKind {
    /// w[n] = 1 (no windowing)
    Rectangular,

    /// w[n] = 0.54 - 0.46*cos(2πn/(M-1))
    /// Sidelobe attenuation: ~53 dB
    Hamming,

    /// w[n] = 0.5 - 0.5*cos(2πn/(M-1))
    /// Sidelobe attenuation: ~44 dB
    Hann,

    /// Fallback lookup for less common windows
    Generic(GenericWindow),
}

/// Windows only available through the generic lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericWindow {
    Blackman,
    Bartlett,
    BlackmanHarris,
    FlatTop,
}

impl GenericWindow {
    fn name(&self) -> &'static str {
        match self {
            GenericWindow::Blackman => "blackman",
            GenericWindow::Bartlett => "bartlett",
            GenericWindow::BlackmanHarris => "blackmanharris",
            GenericWindow::FlatTop => "flattop",
        }
    }

    fn lookup(name: &str) -> Option<Self> {
        match name {
            "blackman" => Some(GenericWindow::Blackman),
            "bartlett" | "triangle" => Some(GenericWindow::Bartlett),
            "blackmanharris" => Some(GenericWindow::BlackmanHarris),
            "flattop" => Some(GenericWindow::FlatTop),
            _ => None,
        }
    }

    /// Symmetric coefficient at position `n` of a window with `m` points
    fn coefficient(&self, n: usize, m: usize) -> f64 {
        let x = 2.0 * PI * n as f64 / (m - 1) as f64;
        match self {
            GenericWindow::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
            GenericWindow::Bartlett => {
                let half = (m - 1) as f64 / 2.0;
                1.0 - ((n as f64 - half) / half).abs()
            }
            GenericWindow::BlackmanHarris => {
                0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos()
                    - 0.01168 * (3.0 * x).cos()
            }
            GenericWindow::FlatTop => {
                0.21557895 - 0.41663158 * x.cos() + 0.277263158 * (2.0 * x).cos()
                    - 0.083578947 * (3.0 * x).cos()
                    + 0.006947368 * (4.0 * x).cos()
            }
        }
    }
}

impl WindowKind {
    /// Look a window up by name (case-insensitive).
    ///
    /// `rectangular`, `hamming` and `hann` map to the named kinds; `boxcar`
    /// and `hanning` are accepted as aliases. Other names go through the
    /// generic catalog.
    pub fn from_name(name: &str) -> Result<Self> {
        let key = name.trim().to_ascii_lowercase();
        match key.as_str() {
            "rectangular" | "boxcar" => Ok(WindowKind::Rectangular),
            "hamming" => Ok(WindowKind::Hamming),
            "hann" | "hanning" => Ok(WindowKind::Hann),
            other => GenericWindow::lookup(other)
                .map(WindowKind::Generic)
                .ok_or_else(|| SpectralError::UnknownWindow(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WindowKind::Rectangular => "rectangular",
            WindowKind::Hamming => "hamming",
            WindowKind::Hann => "hann",
            WindowKind::Generic(generic) => generic.name(),
        }
    }

    /// Generate `length` window coefficients
    pub fn coefficients(&self, length: usize) -> Result<Vec<f64>> {
        generate_window(*self, length)
    }
}

impl Default for WindowKind {
    fn default() -> Self {
        WindowKind::Hamming
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowKind {
    type Err = SpectralError;

    fn from_str(s: &str) -> Result<Self> {
        WindowKind::from_name(s)
    }
}

impl TryFrom<String> for WindowKind {
    type Error = SpectralError;

    fn try_from(value: String) -> Result<Self> {
        WindowKind::from_name(&value)
    }
}

impl From<WindowKind> for String {
    fn from(kind: WindowKind) -> Self {
        kind.name().to_string()
    }
}

/// Generate window coefficients
///
/// # Arguments
/// * `kind` - Window to generate
/// * `length` - Number of samples (M), at least 1
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..M-1
pub fn generate_window(kind: WindowKind, length: usize) -> Result<Vec<f64>> {
    if length < 1 {
        return Err(SpectralError::InvalidWindowLength);
    }
    if length == 1 {
        return Ok(vec![1.0]);
    }

    let m = length as f64;
    let window = match kind {
        WindowKind::Rectangular => vec![1.0; length],

        WindowKind::Hamming => (0..length)
            .map(|n| 0.54 - 0.46 * (2.0 * PI * n as f64 / (m - 1.0)).cos())
            .collect(),

        WindowKind::Hann => (0..length)
            .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / (m - 1.0)).cos())
            .collect(),

        // Periodic: symmetric window of M+1 points with the last one dropped
        WindowKind::Generic(generic) => (0..length)
            .map(|n| generic.coefficient(n, length + 1))
            .collect(),
    };

    Ok(window)
}
