//! Transform settings and preference persistence
//!
//! Preferences are exchanged as JSON with a [`PreferenceStore`]. Keys follow
//! the layout the desktop front end already writes (`fft_settings`,
//! `custom_annotations`); keys this crate does not know are carried through
//! unchanged.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::annotations::Annotation;
use crate::spectrum::welch::WelchScaling;
use crate::spectrum::{Averaging, PhaseConfig, SpectrumConfig};
use crate::windows::WindowKind;

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("preference serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("preference storage failed: {0}")]
    Storage(String),
}

/// Frequency axis scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

/// How traces of different signals are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotLayout {
    #[default]
    Overlay,
    Separate,
}

/// Spectrum settings as chosen in the front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSettings {
    pub averaging: Averaging,
    #[serde(rename = "windowing")]
    pub window: WindowKind,
    pub n_exp: Option<u32>,
    pub detrend: bool,
    pub bins_per_decade: usize,
    pub scaling: WelchScaling,
    /// Upper frequency shown, in Hz
    pub x_limit: Option<f64>,
    #[serde(rename = "xscale")]
    pub x_scale: AxisScale,
    #[serde(rename = "plot_style")]
    pub plot_layout: PlotLayout,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            averaging: Averaging::Welch,
            window: WindowKind::Hamming,
            n_exp: Some(15),
            detrend: true,
            bins_per_decade: 10,
            scaling: WelchScaling::Density,
            x_limit: Some(5.0),
            x_scale: AxisScale::Linear,
            plot_layout: PlotLayout::Overlay,
        }
    }
}

impl TransformSettings {
    pub fn spectrum_config(&self) -> SpectrumConfig {
        SpectrumConfig {
            averaging: self.averaging,
            window: self.window,
            detrend: self.detrend,
            n_exp: self.n_exp,
            bins_per_decade: self.bins_per_decade,
            scaling: self.scaling,
        }
    }

    /// Phase settings
    ///
    /// Phase only comes from the direct transform; an averaging choice is
    /// reported and then dropped.
    pub fn phase_config(&self) -> PhaseConfig {
        PhaseConfig::try_from(&self.spectrum_config()).unwrap_or_else(|e| {
            warn!("{e}; computing phase without averaging");
            PhaseConfig {
                detrend: self.detrend,
                n_exp: self.n_exp,
            }
        })
    }
}

/// Everything persisted between sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    #[serde(rename = "fft_settings")]
    pub transform: TransformSettings,
    #[serde(rename = "custom_annotations")]
    pub annotations: Vec<Annotation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Preferences {
    /// Load from `store`, falling back to defaults when nothing usable is
    /// stored
    pub fn load_from(store: &dyn PreferenceStore) -> Self {
        let value = match store.load() {
            Ok(Some(value)) => value,
            Ok(None) => return Self::default(),
            Err(e) => {
                warn!("could not load preferences, using defaults: {e}");
                return Self::default();
            }
        };

        serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("stored preferences are malformed, using defaults: {e}");
            Self::default()
        })
    }

    pub fn save_to(&self, store: &mut dyn PreferenceStore) -> Result<(), PreferenceError> {
        let value = serde_json::to_value(self)?;
        store.save(&value)
    }
}

/// Where preferences live between sessions
pub trait PreferenceStore {
    /// Stored document, `None` if nothing was saved yet
    fn load(&self) -> Result<Option<Value>, PreferenceError>;

    fn save(&mut self, value: &Value) -> Result<(), PreferenceError>;
}

/// Store that keeps the document in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    value: Option<Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: Value) -> Self {
        Self { value: Some(value) }
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> Result<Option<Value>, PreferenceError> {
        Ok(self.value.clone())
    }

    fn save(&mut self, value: &Value) -> Result<(), PreferenceError> {
        self.value = Some(value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = TransformSettings::default();
        assert_eq!(settings.averaging, Averaging::Welch);
        assert_eq!(settings.window, WindowKind::Hamming);
        assert_eq!(settings.n_exp, Some(15));
        assert!(settings.detrend);

        let config = settings.spectrum_config();
        assert_eq!(config.averaging, Averaging::Welch);
        assert_eq!(settings.phase_config().n_exp, Some(15));
    }

    #[test]
    fn test_phase_config_drops_averaging() {
        let welch = TransformSettings {
            n_exp: Some(12),
            detrend: false,
            ..Default::default()
        };
        let direct = TransformSettings {
            averaging: Averaging::None,
            ..welch.clone()
        };

        let expected = PhaseConfig {
            detrend: false,
            n_exp: Some(12),
        };
        assert_eq!(welch.phase_config(), expected);
        assert_eq!(direct.phase_config(), expected);
    }

    #[test]
    fn test_missing_keys_fall_back() {
        let store = MemoryStore::with_value(json!({
            "fft_settings": {"averaging": "None", "windowing": "hann", "xscale": "log"},
            "recent_files": ["/tmp/a.out"]
        }));
        let prefs = Preferences::load_from(&store);

        assert_eq!(prefs.transform.averaging, Averaging::None);
        assert_eq!(prefs.transform.window, WindowKind::Hann);
        assert_eq!(prefs.transform.x_scale, AxisScale::Log);
        assert_eq!(prefs.transform.n_exp, Some(15));
        assert_eq!(prefs.transform.plot_layout, PlotLayout::Overlay);
        assert!(prefs.annotations.is_empty());
        assert_eq!(prefs.extra.get("recent_files"), Some(&json!(["/tmp/a.out"])));
    }

    #[test]
    fn test_round_trip_through_store() {
        let mut prefs = Preferences::default();
        prefs.annotations.push(Annotation::new(0.2, "1P"));
        prefs.transform.averaging = Averaging::Binning;

        let mut store = MemoryStore::new();
        prefs.save_to(&mut store).unwrap();

        let saved = store.value().unwrap();
        assert_eq!(saved["fft_settings"]["averaging"], json!("Binning"));
        assert_eq!(saved["custom_annotations"][0]["freq"], json!(0.2));
        assert_eq!(Preferences::load_from(&store), prefs);
    }

    #[test]
    fn test_malformed_document_gives_defaults() {
        let store = MemoryStore::with_value(json!({"fft_settings": {"averaging": "median"}}));
        assert_eq!(Preferences::load_from(&store), Preferences::default());
        assert_eq!(Preferences::load_from(&MemoryStore::new()), Preferences::default());
    }
}
