use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    camera::{MAX_FOV_Y, MIN_FOV_Y},
    error::{TracerError, TracerResult},
};

pub const MIN_BOUNCES: u32 = 1;
pub const MAX_BOUNCES: u32 = 16;

/// Runtime configuration, read from an optional JSON file.
///
/// Every field has a default so a partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TracerConfig {
    /// Any integer; negative seeds are reinterpreted bit for bit.
    pub seed: i64,
    pub sphere_count_max: u32,
    pub radius_range: RadiusRange,
    pub placement_radius: f32,
    /// Signed so that out of range values can be clamped instead of failing
    /// deserialization.
    pub max_bounces: i64,
    pub camera: CameraConfig,
    pub light: LightConfig,
    /// Equirectangular environment image (PNG or HDR). A gradient sky is
    /// generated when absent.
    pub skybox: Option<PathBuf>,
    pub window_title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RadiusRange {
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraConfig {
    pub position: [f32; 3],
    /// Degrees.
    pub yaw: f32,
    /// Degrees.
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub movement_speed: f32,
    pub sensitivity: f32,
    pub shift_multiplier: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LightConfig {
    /// Degrees.
    pub yaw: f32,
    /// Degrees, negative points downwards.
    pub pitch: f32,
    pub intensity: f32,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            sphere_count_max: 100,
            radius_range: RadiusRange { min: 3.0, max: 8.0 },
            placement_radius: 100.0,
            max_bounces: 8,
            camera: CameraConfig::default(),
            light: LightConfig::default(),
            skybox: None,
            window_title: "progressive-tracer".to_owned(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 25.0, 130.0],
            yaw: 0.0,
            pitch: -12.0,
            fov_y: 60.0,
            movement_speed: 10.0,
            sensitivity: 0.1,
            shift_multiplier: 2.0,
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            yaw: 30.0,
            pitch: -50.0,
            intensity: 1.0,
        }
    }
}

impl TracerConfig {
    /// Load from `path`, falling back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> TracerResult<Self> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                tracing::info!("loading configuration from {}", path.display());
                serde_json::from_str::<TracerConfig>(&text)?
            }
            None => TracerConfig::default(),
        };
        config.validated()
    }

    /// Reject inconsistent geometry and clamp the bounce depth.
    pub fn validated(mut self) -> TracerResult<Self> {
        let RadiusRange { min, max } = self.radius_range;
        if !min.is_finite() || !max.is_finite() {
            return Err(TracerError::config("radiusRange bounds must be finite"));
        }
        if min <= 0.0 {
            return Err(TracerError::config(format!(
                "radiusRange.min must be positive, got {min}"
            )));
        }
        if min > max {
            return Err(TracerError::config(format!(
                "radiusRange.min ({min}) is greater than radiusRange.max ({max})"
            )));
        }
        if !self.placement_radius.is_finite() || self.placement_radius < 0.0 {
            return Err(TracerError::config(format!(
                "placementRadius must be a non-negative number, got {}",
                self.placement_radius
            )));
        }
        if !(MIN_FOV_Y..=MAX_FOV_Y).contains(&self.camera.fov_y) {
            return Err(TracerError::config(format!(
                "camera.fovY must be within {MIN_FOV_Y}..{MAX_FOV_Y} degrees, got {}",
                self.camera.fov_y
            )));
        }

        let clamped = clamp_bounces(self.max_bounces);
        if i64::from(clamped) != self.max_bounces {
            tracing::warn!(
                "maxBounces {} outside [{MIN_BOUNCES}, {MAX_BOUNCES}], clamped to {clamped}",
                self.max_bounces
            );
            self.max_bounces = i64::from(clamped);
        }

        Ok(self)
    }

    /// Bounce depth after validation.
    pub fn bounces(&self) -> u32 {
        clamp_bounces(self.max_bounces)
    }
}

pub fn clamp_bounces(bounces: i64) -> u32 {
    bounces.clamp(i64::from(MIN_BOUNCES), i64::from(MAX_BOUNCES)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TracerConfig::default().validated().unwrap();
        assert_eq!(config.bounces(), 8);
        assert_eq!(config.sphere_count_max, 100);
    }

    #[test]
    fn inverted_radius_range_is_rejected() {
        let config = TracerConfig {
            radius_range: RadiusRange { min: 8.0, max: 3.0 },
            ..Default::default()
        };
        assert!(matches!(config.validated(), Err(TracerError::Config(_))));
    }

    #[test]
    fn zero_radius_is_rejected() {
        let config = TracerConfig {
            radius_range: RadiusRange { min: 0.0, max: 3.0 },
            ..Default::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn negative_placement_radius_is_rejected() {
        let config = TracerConfig {
            placement_radius: -1.0,
            ..Default::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn bounces_are_clamped() {
        let high = TracerConfig {
            max_bounces: 40,
            ..Default::default()
        };
        assert_eq!(high.validated().unwrap().bounces(), MAX_BOUNCES);

        let low = TracerConfig {
            max_bounces: -3,
            ..Default::default()
        };
        assert_eq!(low.validated().unwrap().bounces(), MIN_BOUNCES);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: TracerConfig =
            serde_json::from_str(r#"{ "seed": 42, "radiusRange": { "min": 1.0, "max": 2.0 } }"#)
                .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.radius_range, RadiusRange { min: 1.0, max: 2.0 });
        assert_eq!(config.placement_radius, 100.0);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn negative_seed_is_accepted() {
        let config: TracerConfig = serde_json::from_str(r#"{ "seed": -5 }"#).unwrap();
        assert_eq!(config.seed, -5);
    }
}
