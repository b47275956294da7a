//! Configuration system
//!
//! Visualizer defaults are plain serde structs loadable from TOML or RON,
//! selected by file extension.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

use crate::foundation::math::utils;
use crate::geometry::DEFAULT_ANGULAR_RESOLUTION;
use crate::render::{Color, Material};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;

        match format {
            ConfigFormat::Toml => Self::from_toml_str(&contents),
            ConfigFormat::Ron => Self::from_ron_str(&contents),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Parse configuration from TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse configuration from RON text
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Defaults applied by the sensor visualizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Angular step between generated arc directions, in degrees
    pub angular_resolution_degrees: f64,
    /// Lateral surface material when an entity sets none
    pub default_material: Material,
    /// Intersection line color when an entity sets none
    pub default_intersection_color: Color,
    /// Intersection line width when an entity sets none
    pub default_intersection_width: f64,
    /// Whether the intersection line is drawn when an entity does not say
    pub default_show_intersection: bool,
    /// Whether volumes show through the globe when an entity does not say
    pub default_show_through_ellipsoid: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            angular_resolution_degrees: 5.0,
            default_material: Material::default(),
            default_intersection_color: Color::WHITE,
            default_intersection_width: 1.0,
            default_show_intersection: true,
            default_show_through_ellipsoid: false,
        }
    }
}

impl Config for SensorConfig {}

/// Finest angular resolution accepted from configuration, in degrees
pub const MIN_ANGULAR_RESOLUTION_DEGREES: f64 = 0.1;

impl SensorConfig {
    /// Angular resolution in radians
    ///
    /// Falls back to the default when not strictly positive and is raised to
    /// [`MIN_ANGULAR_RESOLUTION_DEGREES`] when finer.
    pub fn angular_resolution(&self) -> f64 {
        let degrees = self.angular_resolution_degrees;
        if degrees.is_finite() && degrees > 0.0 {
            utils::deg_to_rad(degrees.max(MIN_ANGULAR_RESOLUTION_DEGREES))
        } else {
            DEFAULT_ANGULAR_RESOLUTION
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_resolution() {
        let config = SensorConfig::default();
        assert_eq!(config.angular_resolution_degrees, 5.0);
        assert_relative_eq!(config.angular_resolution(), DEFAULT_ANGULAR_RESOLUTION, epsilon = 1e-15);
    }

    #[test]
    fn test_invalid_resolution_falls_back() {
        let config = SensorConfig {
            angular_resolution_degrees: 0.0,
            ..SensorConfig::default()
        };
        assert_eq!(config.angular_resolution(), DEFAULT_ANGULAR_RESOLUTION);
    }

    #[test]
    fn test_resolution_has_a_floor() {
        let config = SensorConfig {
            angular_resolution_degrees: 1e-6,
            ..SensorConfig::default()
        };
        assert_relative_eq!(
            config.angular_resolution(),
            utils::deg_to_rad(MIN_ANGULAR_RESOLUTION_DEGREES),
            epsilon = 1e-15
        );

        let coarse = SensorConfig {
            angular_resolution_degrees: 2.0,
            ..SensorConfig::default()
        };
        assert_relative_eq!(coarse.angular_resolution(), utils::deg_to_rad(2.0), epsilon = 1e-15);
    }

    #[test]
    fn test_default_material_is_translucent() {
        assert!(SensorConfig::default().default_material.is_translucent());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SensorConfig::from_toml_str(
            "angular_resolution_degrees = 2.5\ndefault_show_intersection = false\n",
        )
        .unwrap();
        assert_eq!(config.angular_resolution_degrees, 2.5);
        assert!(!config.default_show_intersection);
        assert_eq!(config.default_intersection_width, 1.0);
        assert_eq!(config.default_material, Material::default());
    }

    #[test]
    fn test_ron_parse() {
        let config = SensorConfig::from_ron_str("(default_intersection_width: 3.0)").unwrap();
        assert_eq!(config.default_intersection_width, 3.0);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = SensorConfig::load_from_file("sensors.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
        assert!(matches!(
            SensorConfig::default().save_to_file("sensors.yaml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("sensor_config_{}.ron", std::process::id()));
        let config = SensorConfig {
            angular_resolution_degrees: 1.0,
            default_material: Material::color(Color::RED.with_alpha(0.5)),
            ..SensorConfig::default()
        };

        config.save_to_file(&path).unwrap();
        let loaded = SensorConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
