use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("visibility band must satisfy 0 <= top < bottom <= 1 (got {top}..{bottom})")]
    Band { top: f64, bottom: f64 },
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },
}

/// Tunables for the three viewport-driven components.
///
/// Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FolioConfig {
    /// Upper edge of the visibility band, as a fraction of viewport height.
    pub band_top: f64,
    /// Lower edge of the visibility band.
    pub band_bottom: f64,
    /// Minimum wall-clock gap between two thumbnail captures.
    pub capture_interval_ms: f64,
    /// Idle-slot deadline for capture triggers.
    pub capture_idle_timeout_ms: u32,
    /// Idle-slot deadline for the capture queued on mount.
    pub initial_capture_delay_ms: u32,
    pub min_indicator_px: f64,
    pub capture_max_width: f64,
    pub capture_max_height: f64,
    pub capture_pixel_ratio: f64,
    /// Minimap opacity while a capture is in flight.
    pub capture_busy_opacity: String,
    pub reveal_threshold: f64,
    pub reveal_root_margin: String,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            band_top: 0.1,
            band_bottom: 0.9,
            capture_interval_ms: 3000.0,
            capture_idle_timeout_ms: 1200,
            initial_capture_delay_ms: 300,
            min_indicator_px: 8.0,
            capture_max_width: 1920.0,
            capture_max_height: 8000.0,
            capture_pixel_ratio: 0.3,
            capture_busy_opacity: "0.5".to_string(),
            reveal_threshold: 0.1,
            reveal_root_margin: "0px 0px -50px 0px".to_string(),
        }
    }
}

impl FolioConfig {
    /// Parse and validate a JSON config object.
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let config: FolioConfig = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (top, bottom) = (self.band_top, self.band_bottom);
        if !(0.0..=1.0).contains(&top) || !(0.0..=1.0).contains(&bottom) || top >= bottom {
            return Err(ConfigError::Band { top, bottom });
        }
        if self.capture_interval_ms <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "captureIntervalMs",
            });
        }
        if self.capture_pixel_ratio <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "capturePixelRatio",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        let config = FolioConfig::from_json("{}").unwrap_or_default();
        assert_eq!(config, FolioConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = FolioConfig::from_json(r#"{"captureIntervalMs": 500, "bandTop": 0.2}"#);
        let config = config.unwrap_or_default();
        assert_eq!(config.capture_interval_ms, 500.0);
        assert_eq!(config.band_top, 0.2);
        assert_eq!(config.band_bottom, 0.9);
    }

    #[test]
    fn inverted_band_is_rejected() {
        let err = FolioConfig::from_json(r#"{"bandTop": 0.9, "bandBottom": 0.1}"#);
        assert!(matches!(err, Err(ConfigError::Band { .. })));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = FolioConfig::from_json(r#"{"captureIntervalMs": 0}"#);
        assert!(matches!(err, Err(ConfigError::NotPositive { .. })));
    }
}
