//! Engine configuration.
//!
//! Defaults reproduce the reference demo: an 800x600 view, 60 degree FOV and
//! free-look movement starting in the open cell at (1.5, 1.5).

use crate::camera::{MovementPolicy, Pose, StepMode};
use crate::error::{Error, Result};
use crate::raymarch::MarchConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Internal framebuffer width in pixels
    pub viewport_width: usize,
    /// Internal framebuffer height in pixels
    pub viewport_height: usize,
    /// Horizontal field of view in degrees
    pub fov: f32,
    pub march: MarchConfig,
    pub policy: MovementPolicy,
    pub start: Pose,
    /// Minimap pixels per grid cell
    pub cell_px: usize,
    /// Minimap camera marker radius in pixels
    pub marker_radius: usize,
    /// Minimap heading line length in pixels
    pub heading_len: f32,
    pub show_minimap: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_policy(MovementPolicy::free_look())
    }
}

impl EngineConfig {
    /// Default configuration adjusted for a movement policy.
    ///
    /// Discrete stepping keeps the pose on cell corners, so the eye is pushed
    /// to the cell centre with a half-cell offset.
    pub fn for_policy(policy: MovementPolicy) -> Self {
        let (start, eye_offset) = match policy.step_mode {
            StepMode::Continuous => (Pose::new([1.5, 1.5], 0.0), [0.0, 0.0]),
            StepMode::Discrete => (Pose::new([1.0, 1.0], 0.0), [0.5, 0.5]),
        };

        Self {
            viewport_width: 800,
            viewport_height: 600,
            fov: 60.0,
            march: MarchConfig {
                eye_offset,
                ..MarchConfig::default()
            },
            policy,
            start,
            cell_px: 32,
            marker_radius: 5,
            heading_len: 20.0,
            show_minimap: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(Error::InvalidConfig(format!(
                "viewport must be non-empty, got {}x{}",
                self.viewport_width, self.viewport_height
            )));
        }
        if !(self.fov > 0.0 && self.fov < 360.0) {
            return Err(Error::InvalidConfig(format!(
                "fov must be in (0, 360), got {}",
                self.fov
            )));
        }
        if !(self.policy.step_size.is_finite() && self.policy.step_size > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "step_size must be positive, got {}",
                self.policy.step_size
            )));
        }
        if !(self.policy.turn_size.is_finite() && self.policy.turn_size > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "turn_size must be positive, got {}",
                self.policy.turn_size
            )));
        }
        if self.cell_px == 0 {
            return Err(Error::InvalidConfig("cell_px must be non-zero".into()));
        }
        self.march.validate()
    }

    /// Number of rays per frame. With the minimap shown the 3D view fills
    /// the right half of the screen at two pixels per ray.
    #[inline]
    pub fn columns(&self, show_minimap: bool) -> usize {
        if show_minimap {
            self.viewport_width / 4
        } else {
            self.viewport_width
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.columns(true), 200);
        assert_eq!(config.columns(false), 800);
    }

    #[test]
    fn test_grid_step_uses_cell_corner_pose() {
        let config = EngineConfig::for_policy(MovementPolicy::grid_step());
        assert_eq!(config.start.pos, [1.0, 1.0]);
        assert_eq!(config.march.eye_offset, [0.5, 0.5]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_fov_rejected() {
        for fov in [0.0, -10.0, 360.0, f32::NAN] {
            let config = EngineConfig {
                fov,
                ..EngineConfig::default()
            };
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_bad_march_step_rejected() {
        let mut config = EngineConfig::default();
        config.march.step = 0.0;
        assert_eq!(config.validate(), Err(Error::InvalidStep(0.0)));
    }
}
