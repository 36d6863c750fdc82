//! Remix parameters chosen by the user: two continuous levels and a style.

use crate::api::{InputArtifact, RemixRequest};
use crate::error::NrxError;

pub const MIN_LEVEL: f64 = 0.5;
pub const MAX_LEVEL: f64 = 2.0;
pub const DEFAULT_LEVEL: f64 = 1.0;

/// Styles offered by the service, in the order it listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleCatalog {
    styles: Vec<String>,
}

impl StyleCatalog {
    pub fn new(styles: Vec<String>) -> Self {
        Self { styles }
    }

    pub fn contains(&self, style: &str) -> bool {
        self.styles.iter().any(|s| s == style)
    }

    pub fn first(&self) -> Option<&str> {
        self.styles.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// `lofi_chill` → `Lofi Chill`.
pub fn style_display_name(style: &str) -> String {
    style
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn energy_label(value: f64) -> &'static str {
    if value < 0.8 {
        "Calm"
    } else if value > 1.2 {
        "Intense"
    } else {
        "Normal"
    }
}

pub fn brightness_label(value: f64) -> &'static str {
    if value < 0.8 {
        "Dark/Warm"
    } else if value > 1.2 {
        "Bright/Clear"
    } else {
        "Balanced"
    }
}

/// Current energy, brightness and style selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterState {
    energy: f64,
    brightness: f64,
    style: Option<String>,
    catalog: StyleCatalog,
}

impl Default for ParameterState {
    fn default() -> Self {
        Self {
            energy: DEFAULT_LEVEL,
            brightness: DEFAULT_LEVEL,
            style: None,
            catalog: StyleCatalog::default(),
        }
    }
}

impl ParameterState {
    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    /// Set energy, clamped to `[0.5, 2.0]`. Returns the value now held.
    pub fn set_energy(&mut self, value: f64) -> f64 {
        if let Some(level) = clamp_level(value) {
            self.energy = level;
        }
        self.energy
    }

    /// Set brightness, clamped to `[0.5, 2.0]`. Returns the value now held.
    pub fn set_brightness(&mut self, value: f64) -> f64 {
        if let Some(level) = clamp_level(value) {
            self.brightness = level;
        }
        self.brightness
    }

    /// Select a style from the catalog. Unknown styles leave the selection as is.
    pub fn set_style(&mut self, style: &str) -> Result<(), NrxError> {
        if !self.catalog.contains(style) {
            return Err(NrxError::UnknownStyle(style.to_string()));
        }
        self.style = Some(style.to_string());
        Ok(())
    }

    /// Replace the catalog. Keeps a selection that is still offered, otherwise
    /// falls back to the first style.
    pub fn set_catalog(&mut self, styles: Vec<String>) {
        self.catalog = StyleCatalog::new(styles);
        let still_offered = self
            .style
            .as_deref()
            .is_some_and(|s| self.catalog.contains(s));
        if !still_offered {
            self.style = self.catalog.first().map(String::from);
        }
    }

    pub fn build_request(&self, artifact: &InputArtifact) -> Result<RemixRequest, NrxError> {
        let style = self.style.clone().ok_or(NrxError::NoStyleSelected)?;
        Ok(RemixRequest {
            artifact_id: artifact.artifact_id.clone(),
            style_id: style,
            energy: self.energy,
            brightness: self.brightness,
        })
    }
}

fn clamp_level(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value.clamp(MIN_LEVEL, MAX_LEVEL))
    } else {
        tracing::debug!(value, "Ignoring non-finite parameter value");
        None
    }
}
