//! Script configuration persistence and validation
//!
//! Holds the tunable parameters of the lyric scroll effect. A raw
//! [`ScriptConfig`] is what the user edits (file, CLI flags); only a
//! [`ValidConfig`] produced by [`ScriptConfig::validated`] is accepted by the
//! engine, the render driver and the script emitter.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Horizontal anchor of every lyric line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Anchored at 10% of the frame width, text grows to the right
    #[default]
    Left,
    /// Anchored at the horizontal centre
    Center,
}

impl Alignment {
    /// Horizontal anchor position as a fraction of the frame width
    pub fn x_fraction(self) -> f64 {
        match self {
            Alignment::Left => 0.1,
            Alignment::Center => 0.5,
        }
    }
}

impl std::fmt::Display for Alignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alignment::Left => write!(f, "left"),
            Alignment::Center => write!(f, "center"),
        }
    }
}

impl FromStr for Alignment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "center" | "centre" => Ok(Alignment::Center),
            other => Err(ConfigError::invalid(
                "alignment",
                format!("expected `left` or `center`, got `{}`", other),
            )),
        }
    }
}

/// 8-bit RGB colour, written as `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
    /// Default colour of non-active lines (roughly 0.53 grey)
    pub const DIM_GREY: Rgb = Rgb::new(0x87, 0x87, 0x87);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels normalised to 0.0 - 1.0
    pub fn to_unit(self) -> [f64; 3] {
        [
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        ]
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ConfigError;

    /// Accepts `#RRGGBB` and the short `#RGB` form, `#` optional
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bad = || ConfigError::invalid("color", format!("`{}` is not a #RRGGBB colour", s));

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(bad());
        }

        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| bad());
        match hex.len() {
            6 => Ok(Rgb::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                // #abc == #aabbcc
                let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Rgb::new(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(bad()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// Scroll effect and export parameters
///
/// Field names follow the exported script (`camelCase` in JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptConfig {
    /// Composition name created in the host
    pub comp_name: String,
    /// Composition width in pixels
    pub width: u32,
    /// Composition height in pixels
    pub height: u32,
    /// Composition frame rate
    pub fps: f64,
    /// Composition duration in seconds
    pub duration: f64,
    /// Font size in pixels
    pub font_size: f64,
    /// Font family name (must be installed on the host machine)
    pub font_name: String,
    /// Colour of the active line
    pub text_color: Rgb,
    /// Colour of every other line
    pub inactive_color: Rgb,
    /// Vertical distance between adjacent lines in pixels
    pub spacing: f64,
    /// Blur radius applied to unfocused lines
    pub blur_max: f64,
    /// Scale of the active line, e.g. 1.1 for 110%
    pub active_scale: f64,
    /// Reserved. Carried and exported but never applied: lines outside the
    /// emphasis band always render at scale 1.0.
    pub inactive_scale: f64,
    /// Settle speed of the scroll transition, larger settles faster
    pub damping: f64,
    /// Horizontal anchor of the lines
    pub alignment: Alignment,
    /// Upward shift of every text layer in the host, in pixels
    pub text_lift: f64,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            comp_name: "歌词层".to_string(),
            width: 1920,
            height: 1920,
            fps: 30.0,
            duration: 300.0,
            font_size: 90.0,
            font_name: "Microsoft YaHei".to_string(),
            text_color: Rgb::WHITE,
            inactive_color: Rgb::DIM_GREY,
            spacing: 180.0,
            blur_max: 20.0,
            active_scale: 1.1,
            inactive_scale: 1.0,
            damping: 0.8,
            alignment: Alignment::Left,
            text_lift: 10.0,
        }
    }
}

impl ScriptConfig {
    /// Get the default config file path
    pub fn file_path() -> Option<PathBuf> {
        crate::utils::config_dir().map(|dir| dir.join("config.json"))
    }

    /// Load the config from the default file, or defaults if there is none
    pub fn load() -> Result<Self, ConfigError> {
        match Self::file_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load the config from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save the config to a specific file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Check every per-field invariant and freeze the config
    pub fn validated(self) -> Result<ValidConfig, ConfigError> {
        positive("fontSize", self.font_size)?;
        positive("spacing", self.spacing)?;
        non_negative("blurMax", self.blur_max)?;
        positive("activeScale", self.active_scale)?;
        positive("damping", self.damping)?;
        positive("fps", self.fps)?;
        positive("duration", self.duration)?;
        finite("textLift", self.text_lift)?;

        finite("inactiveScale", self.inactive_scale)?;
        if self.inactive_scale <= 0.0 || self.inactive_scale > 1.0 {
            return Err(ConfigError::invalid(
                "inactiveScale",
                format!("must be in (0, 1], got {}", self.inactive_scale),
            ));
        }
        if self.width == 0 {
            return Err(ConfigError::invalid("width", "must be greater than 0"));
        }
        if self.height == 0 {
            return Err(ConfigError::invalid("height", "must be greater than 0"));
        }
        if self.comp_name.trim().is_empty() {
            return Err(ConfigError::invalid("compName", "must not be empty"));
        }
        if self.font_name.trim().is_empty() {
            return Err(ConfigError::invalid("fontName", "must not be empty"));
        }
        if self.active_scale < 1.0 {
            tracing::warn!(
                "activeScale {} is below 1.0, the active line will shrink",
                self.active_scale
            );
        }

        Ok(ValidConfig(self))
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be finite, got {}", value)))
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be greater than 0, got {}", value)))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must not be negative, got {}", value)))
    }
}

/// A [`ScriptConfig`] whose invariants have been checked
///
/// Immutable; read access goes through `Deref`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidConfig(ScriptConfig);

impl Deref for ValidConfig {
    type Target = ScriptConfig;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Default for ValidConfig {
    fn default() -> Self {
        // The defaults satisfy every invariant (covered by tests)
        ValidConfig(ScriptConfig::default())
    }
}

/// Errors that can occur with the configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A field violates its invariant
    Invalid { field: &'static str, reason: String },
    Io(String),
    Parse(String),
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid { field, reason } => write!(f, "Invalid {}: {}", field, reason),
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScriptConfig::default().validated().unwrap();
        assert_eq!(config.spacing, 180.0);
        assert_eq!(config.text_color, Rgb::WHITE);
        assert_eq!(config.inactive_color.to_string(), "#878787");
        assert_eq!(config.alignment, Alignment::Left);
        assert_eq!(config.clone(), ValidConfig::default());
    }

    #[test]
    fn test_rejects_non_positive_spacing_and_font_size() {
        for spacing in [0.0, -10.0, f64::NAN] {
            let config = ScriptConfig {
                spacing,
                ..Default::default()
            };
            match config.validated() {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "spacing"),
                other => panic!("spacing {} should be rejected, got {:?}", spacing, other),
            }
        }

        let config = ScriptConfig {
            font_size: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validated(),
            Err(ConfigError::Invalid { field: "fontSize", .. })
        ));
    }

    #[test]
    fn test_blur_max_zero_is_allowed_but_negative_is_not() {
        let zero = ScriptConfig {
            blur_max: 0.0,
            ..Default::default()
        };
        assert!(zero.validated().is_ok());

        let negative = ScriptConfig {
            blur_max: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            negative.validated(),
            Err(ConfigError::Invalid { field: "blurMax", .. })
        ));
    }

    #[test]
    fn test_inactive_scale_range() {
        for (value, ok) in [(1.0, true), (0.5, true), (0.0, false), (1.2, false)] {
            let config = ScriptConfig {
                inactive_scale: value,
                ..Default::default()
            };
            assert_eq!(config.validated().is_ok(), ok, "inactiveScale {}", value);
        }
    }

    #[test]
    fn test_rgb_parsing() {
        assert_eq!("#FFFFFF".parse::<Rgb>().unwrap(), Rgb::WHITE);
        assert_eq!("878787".parse::<Rgb>().unwrap(), Rgb::DIM_GREY);
        assert_eq!("#fa0".parse::<Rgb>().unwrap(), Rgb::new(0xFF, 0xAA, 0x00));
        assert_eq!("#ff00aa".parse::<Rgb>().unwrap().to_string(), "#FF00AA");
        assert!("#GG0000".parse::<Rgb>().is_err());
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#ÿÿÿ".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_rgb_to_unit() {
        assert_eq!(Rgb::WHITE.to_unit(), [1.0, 1.0, 1.0]);
        assert_eq!(Rgb::new(0, 0, 0).to_unit(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_alignment_parsing() {
        assert_eq!("Left".parse::<Alignment>().unwrap(), Alignment::Left);
        assert_eq!("center".parse::<Alignment>().unwrap(), Alignment::Center);
        assert!("right".parse::<Alignment>().is_err());
        assert_eq!(Alignment::Left.x_fraction(), 0.1);
        assert_eq!(Alignment::Center.x_fraction(), 0.5);
    }

    #[test]
    fn test_json_uses_camel_case_and_hex_colors() {
        let json = serde_json::to_value(ScriptConfig::default()).unwrap();
        assert_eq!(json["textColor"], "#FFFFFF");
        assert_eq!(json["blurMax"], 20.0);
        assert_eq!(json["alignment"], "left");
        assert_eq!(json["compName"], "歌词层");
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: ScriptConfig =
            serde_json::from_str(r##"{ "spacing": 120, "textColor": "#00ff00" }"##).unwrap();
        assert_eq!(config.spacing, 120.0);
        assert_eq!(config.text_color, Rgb::new(0, 0xFF, 0));
        assert_eq!(config.blur_max, 20.0);
    }

    #[test]
    fn test_bad_color_in_json_is_a_parse_error() {
        let result: Result<ScriptConfig, _> = serde_json::from_str(r#"{ "textColor": "white" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = ScriptConfig {
            spacing: 150.0,
            alignment: Alignment::Center,
            ..Default::default()
        };

        config.save_to_file(&path).unwrap();
        let loaded = ScriptConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ScriptConfig::load_from_file(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
