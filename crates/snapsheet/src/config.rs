#![forbid(unsafe_code)]

//! Sheet configuration as data.
//!
//! Every tunable of the engine lives in [`SheetConfig`]. With the `config`
//! feature it can be loaded from TOML or JSON:
//!
//! ```toml
//! initial = { fraction = 0.5 }
//! content_mode = "resize_to_visible_area"
//! velocity_threshold = 500.0
//!
//! [[snap_points]]
//! fraction = 1.0
//!
//! [[snap_points]]
//! fraction = 0.5
//!
//! [[snap_points]]
//! from_bottom = -8.0
//! ```
//!
//! ```rust,ignore
//! let config = SheetConfig::from_toml_file("sheet.toml")?;
//! ```
//!
//! Loaders validate after parsing, so a loaded config is always usable.

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use snapsheet_core::animation::SpringProfile;
use snapsheet_core::gesture::DEFAULT_DRAG_THRESHOLD;

use crate::animation_driver::SettleTuning;
use crate::error::SheetError;
use crate::host::ContentMode;
use crate::resolver;
use crate::snap_point::SnapPoint;

/// Release speed (points/sec) beyond which the fling direction decides
/// the target.
pub const DEFAULT_VELOCITY_THRESHOLD: f64 = 400.0;

/// Cap on the normalized settle seed velocity.
pub const DEFAULT_MAX_SEED_VELOCITY: f64 = 20.0;

/// Fraction of overtravel applied as a height adjustment.
pub const DEFAULT_RUBBER_BAND_FACTOR: f64 = 0.1;

#[cfg(feature = "config")]
#[derive(Serialize, Deserialize)]
#[serde(remote = "SpringProfile")]
struct SpringProfileDef {
    damping_ratio: f64,
    response: f64,
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct SheetConfig {
    /// Resting positions, in any order. Must not be empty.
    pub snap_points: Vec<SnapPoint>,
    /// Where to rest after the first layout. Defaults to the first point.
    #[cfg_attr(feature = "config", serde(skip_serializing_if = "Option::is_none"))]
    pub initial: Option<SnapPoint>,
    /// How the host sizes content while the sheet moves.
    pub content_mode: ContentMode,
    pub velocity_threshold: f64,
    pub max_seed_velocity: f64,
    pub rubber_band_factor: f64,
    /// Deadzone in points before a touch counts as a drag.
    pub drag_threshold: f64,
    #[cfg_attr(feature = "config", serde(with = "SpringProfileDef"))]
    pub resize_spring: SpringProfile,
    #[cfg_attr(feature = "config", serde(with = "SpringProfileDef"))]
    pub no_resize_spring: SpringProfile,
}

impl Default for SheetConfig {
    fn default() -> Self {
        let tuning = SettleTuning::default();
        Self {
            snap_points: vec![SnapPoint::FULL, SnapPoint::HALF, SnapPoint::HIDDEN],
            initial: None,
            content_mode: ContentMode::default(),
            velocity_threshold: DEFAULT_VELOCITY_THRESHOLD,
            max_seed_velocity: DEFAULT_MAX_SEED_VELOCITY,
            rubber_band_factor: DEFAULT_RUBBER_BAND_FACTOR,
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
            resize_spring: tuning.resize,
            no_resize_spring: tuning.no_resize,
        }
    }
}

impl SheetConfig {
    /// A default config with the given snap points.
    #[must_use]
    pub fn with_snap_points(snap_points: impl IntoIterator<Item = SnapPoint>) -> Self {
        Self {
            snap_points: snap_points.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Set the initial snap point (builder pattern).
    #[must_use]
    pub fn initial(mut self, point: SnapPoint) -> Self {
        self.initial = Some(point);
        self
    }

    /// Set the content mode (builder pattern).
    #[must_use]
    pub fn content_mode(mut self, mode: ContentMode) -> Self {
        self.content_mode = mode;
        self
    }

    /// Set the deadzone (builder pattern).
    #[must_use]
    pub fn drag_threshold(mut self, threshold: f64) -> Self {
        self.drag_threshold = threshold;
        self
    }

    /// Spring tuning for the animation driver.
    #[must_use]
    pub fn tuning(&self) -> SettleTuning {
        SettleTuning {
            resize: self.resize_spring,
            no_resize: self.no_resize_spring,
            max_seed_velocity: self.max_seed_velocity,
        }
    }

    /// Check every parameter.
    pub fn validate(&self) -> Result<(), SheetError> {
        resolver::validate(&self.snap_points)?;
        if let Some(initial) = self.initial
            && !self.snap_points.contains(&initial)
        {
            return Err(SheetError::UnknownSnapPoint(initial));
        }
        let scalars = [
            ("velocity_threshold", self.velocity_threshold),
            ("max_seed_velocity", self.max_seed_velocity),
            ("rubber_band_factor", self.rubber_band_factor),
            ("drag_threshold", self.drag_threshold),
            ("resize_spring.damping_ratio", self.resize_spring.damping_ratio),
            ("resize_spring.response", self.resize_spring.response),
            ("no_resize_spring.damping_ratio", self.no_resize_spring.damping_ratio),
            ("no_resize_spring.response", self.no_resize_spring.response),
        ];
        for (name, value) in scalars {
            if !value.is_finite() || value < 0.0 {
                return Err(SheetError::InvalidParameter(name));
            }
        }
        if self.resize_spring.response <= 0.0 {
            return Err(SheetError::InvalidParameter("resize_spring.response"));
        }
        if self.no_resize_spring.response <= 0.0 {
            return Err(SheetError::InvalidParameter("no_resize_spring.response"));
        }
        Ok(())
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Serialize to TOML.
    #[cfg(feature = "config")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(ConfigError::TomlSerialize)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from loading or saving a [`SheetConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// TOML serialization error.
    #[cfg(feature = "config")]
    TomlSerialize(toml::ser::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Parsed, but failed validation.
    Invalid(SheetError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::TomlSerialize(e) => write!(f, "TOML serialize error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Invalid(e) => write!(f, "invalid sheet config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::TomlSerialize(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Invalid(e) => Some(e),
        }
    }
}

impl From<SheetError> for ConfigError {
    fn from(e: SheetError) -> Self {
        Self::Invalid(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid_and_matches_driver_defaults() {
        let config = SheetConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.tuning(), SettleTuning::default());
        assert_eq!(config.velocity_threshold, 400.0);
        assert_eq!(config.rubber_band_factor, 0.1);
        assert_eq!(config.no_resize_spring.damping_ratio, 0.9);
        assert_eq!(config.snap_points.len(), 3);
    }

    #[test]
    fn initial_must_be_configured() {
        let config = SheetConfig::with_snap_points([SnapPoint::FULL]).initial(SnapPoint::HALF);
        assert_eq!(
            config.validate(),
            Err(SheetError::UnknownSnapPoint(SnapPoint::HALF))
        );
    }

    #[test]
    fn rejects_bad_scalars() {
        let mut config = SheetConfig::default();
        config.velocity_threshold = f64::NAN;
        assert_eq!(
            config.validate(),
            Err(SheetError::InvalidParameter("velocity_threshold"))
        );

        let mut config = SheetConfig::default();
        config.rubber_band_factor = -0.1;
        assert_eq!(
            config.validate(),
            Err(SheetError::InvalidParameter("rubber_band_factor"))
        );

        let mut config = SheetConfig::default();
        config.no_resize_spring.response = 0.0;
        assert_eq!(
            config.validate(),
            Err(SheetError::InvalidParameter("no_resize_spring.response"))
        );
    }

    #[test]
    fn rejects_empty_snap_points() {
        let config = SheetConfig::with_snap_points([]);
        assert_eq!(config.validate(), Err(SheetError::EmptySnapPoints));
    }

    #[test]
    fn error_display_and_source() {
        let err = ConfigError::from(SheetError::EmptySnapPoints);
        assert!(err.to_string().contains("at least one snap point"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[cfg(feature = "config")]
    #[test]
    fn parses_toml_with_defaults() {
        let config = SheetConfig::from_toml_str(
            r#"
            content_mode = "resize_to_visible_area"

            [[snap_points]]
            fraction = 1.0

            [[snap_points]]
            from_top = 120.0
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.content_mode, ContentMode::ResizeToVisibleArea);
        assert_eq!(
            config.snap_points,
            vec![SnapPoint::FULL, SnapPoint::FromTop(120.0)]
        );
        assert_eq!(config.velocity_threshold, DEFAULT_VELOCITY_THRESHOLD);
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_validates_after_parse() {
        let err = SheetConfig::from_json_str(r#"{ "snap_points": [] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(SheetError::EmptySnapPoints)));

        let config =
            SheetConfig::from_json_str(r#"{ "snap_points": ["auto_fit", { "fraction": 0.25 }] }"#)
                .expect("valid json");
        assert_eq!(
            config.snap_points,
            vec![SnapPoint::AutoFit, SnapPoint::Fraction(0.25)]
        );
    }
}
