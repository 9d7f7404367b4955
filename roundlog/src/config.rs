//! Configuration types for the record store and the generator.
//!
//! Both structs are plain data with a validating constructor. Configuration
//! happens once at startup and fixes the memory footprint of the store: the
//! slot array is allocated up front and never grows.

use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default number of slots in the store.
pub const DEFAULT_CAPACITY: usize = 100;

/// Default generator tick interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Default size of the per-tick image draw space.
pub const DEFAULT_IMAGE_DRAWS: u32 = 20;

/// Default number of draws that attach an image.
pub const DEFAULT_IMAGE_CANDIDATES: u32 = 10;

/// Default base URL that image names are appended to.
pub const DEFAULT_IMAGE_BASE_URL: &str = "http://localhost:8080/cambrian001/static";

/// Default `chrono` format for record timestamps.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sizing for a [`CircularStore`](crate::store::CircularStore).
///
/// # Example
///
/// ```rust
/// use roundlog::config::StoreConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = StoreConfig::new(3)?;
/// assert_eq!(config.capacity, 3);
/// assert!(StoreConfig::new(0).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Number of slots in one round.
    pub capacity: usize,
}

impl StoreConfig {
    /// Creates a new store configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        let config = Self { capacity };
        config.validate()?;
        Ok(config)
    }

    /// Validates the store configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation fails.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity {
                capacity: self.capacity,
            }
            .into());
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Tick and payload policy for the [`Generator`](crate::generator::Generator).
///
/// Each tick draws a uniform integer in `0..image_draws`. Draws below
/// `image_candidates` attach `"{image_base_url}/test{draw}.png"` to the
/// record; the rest produce no image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Time between two appends.
    #[serde(with = "duration_serde")]
    pub interval: Duration,

    /// Size of the per-tick draw space.
    pub image_draws: u32,

    /// Number of draws that map to an image.
    pub image_candidates: u32,

    /// URL prefix for generated image references, without trailing slash.
    pub image_base_url: String,

    /// `chrono` format string for record timestamps.
    pub timestamp_format: String,
}

impl GeneratorConfig {
    /// Creates a generator configuration with default payload settings and
    /// the given tick interval.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidInterval`] if `interval` is zero.
    pub fn with_interval(interval: Duration) -> Result<Self> {
        let config = Self {
            interval,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the generator configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation fails.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(ConfigError::InvalidInterval {
                interval: self.interval,
            }
            .into());
        }

        if self.image_draws == 0 || self.image_candidates > self.image_draws {
            return Err(ConfigError::InvalidImageDraws {
                candidates: self.image_candidates,
                draws: self.image_draws,
            }
            .into());
        }

        if StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidTimestampFormat {
                format: self.timestamp_format.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// Returns the image URL for a draw, or `None` if the draw attaches no image.
    pub fn image_url(&self, draw: u32) -> Option<String> {
        (draw < self.image_candidates)
            .then(|| format!("{}/test{draw}.png", self.image_base_url.trim_end_matches('/')))
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            image_draws: DEFAULT_IMAGE_DRAWS,
            image_candidates: DEFAULT_IMAGE_CANDIDATES,
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

/// Serde helper for Duration serialization.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoundlogError;

    #[test]
    fn test_store_config_validation() {
        assert!(StoreConfig::new(1).is_ok());
        assert_eq!(StoreConfig::default().capacity, 100);

        let err = StoreConfig::new(0).unwrap_err();
        assert!(matches!(
            err,
            RoundlogError::Config(ConfigError::InvalidCapacity { capacity: 0 })
        ));
    }

    #[test]
    fn test_generator_config_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.image_draws, 20);
        assert_eq!(config.image_candidates, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generator_config_rejects_zero_interval() {
        let err = GeneratorConfig::with_interval(Duration::ZERO).unwrap_err();
        assert!(matches!(
            err,
            RoundlogError::Config(ConfigError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_generator_config_rejects_bad_draw_space() {
        let mut config = GeneratorConfig::default();
        config.image_draws = 0;
        config.image_candidates = 0;
        assert!(config.validate().is_err());

        config.image_draws = 5;
        config.image_candidates = 6;
        assert!(config.validate().is_err());

        // Every draw attaches an image.
        config.image_candidates = 5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generator_config_rejects_bad_timestamp_format() {
        let config = GeneratorConfig {
            timestamp_format: "%Y-%m-%d %Q".to_string(),
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            RoundlogError::Config(ConfigError::InvalidTimestampFormat { .. })
        ));
    }

    #[test]
    fn test_image_url() {
        let config = GeneratorConfig {
            image_base_url: "http://robot:9981/cambrian001/static/".to_string(),
            ..GeneratorConfig::default()
        };

        assert_eq!(
            config.image_url(0).as_deref(),
            Some("http://robot:9981/cambrian001/static/test0.png")
        );
        assert_eq!(
            config.image_url(9).as_deref(),
            Some("http://robot:9981/cambrian001/static/test9.png")
        );
        assert_eq!(config.image_url(10), None);
        assert_eq!(config.image_url(19), None);
    }

    #[test]
    fn test_generator_config_serde() {
        let config = GeneratorConfig::with_interval(Duration::from_millis(250)).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"interval\":0.25"));

        let back: GeneratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
