//! Fixed-step ray marching through the occupancy grid.
//!
//! Each screen column gets one ray. Rays are spaced evenly in angle across the
//! field of view rather than evenly across a projection plane, so wide FOVs show
//! a fish-eye bulge.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::trace;

use crate::camera::{Pose, normalize_degrees};
use crate::error::{Error, Result};
use crate::grid::{Cell, Grid};

/// Distance advanced per march step, in cells. Must stay well below one cell
/// or a ray can jump over a one-cell-thick wall.
pub const DEFAULT_STEP: f32 = 1.0 / 32.0;
/// Rays that travel this far without hitting anything count as open space.
pub const DEFAULT_MAX_DISTANCE: f32 = 20.0;
/// Empirical slab height scale. Not derived from a projection-plane distance.
pub const DEFAULT_WALL_HEIGHT_SCALE: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarchConfig {
    pub step: f32,
    pub max_distance: f32,
    pub wall_height_scale: f32,
    pub eye_offset: [f32; 2], // added to the pose position to get the ray origin
}

impl Default for MarchConfig {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            max_distance: DEFAULT_MAX_DISTANCE,
            wall_height_scale: DEFAULT_WALL_HEIGHT_SCALE,
            eye_offset: [0.0, 0.0],
        }
    }
}

impl MarchConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(Error::InvalidStep(self.step));
        }
        if !(self.max_distance.is_finite() && self.max_distance > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "max_distance must be positive, got {}",
                self.max_distance
            )));
        }
        if !(self.wall_height_scale.is_finite() && self.wall_height_scale > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "wall_height_scale must be positive, got {}",
                self.wall_height_scale
            )));
        }
        if !self.eye_offset.iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidConfig("eye_offset must be finite".into()));
        }
        Ok(())
    }

    /// Step budget after which a march is treated as a contract violation.
    #[inline]
    fn max_steps(&self) -> usize {
        (self.max_distance / self.step).ceil() as usize + 2
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Escape {
    OutOfBounds, // left the grid, drawn as void
    MaxDistance, // still inside the grid, drawn as open floor
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hit {
    Wall { cell: [usize; 2] },
    Escaped(Escape),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaySample {
    pub column: usize,
    pub angle: f32, // degrees, normalized
    pub distance: f32,
    pub hit: Hit,
}

impl RaySample {
    #[inline]
    pub fn is_wall(&self) -> bool {
        matches!(self.hit, Hit::Wall { .. })
    }

    /// Screen-space slab height for a wall hit, `None` for escaped rays.
    #[inline]
    pub fn wall_height(&self, viewport_height: f32, scale: f32) -> Option<f32> {
        self.is_wall()
            .then(|| wall_height(self.distance, viewport_height, scale))
    }
}

#[inline]
pub fn wall_height(distance: f32, viewport_height: f32, scale: f32) -> f32 {
    (viewport_height / distance) * scale
}

/// One position along a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarchStep {
    pub pos: [f32; 2],
    pub distance: f32, // Euclidean, measured from the march origin
}

/// Unbounded sequence of march positions. Position `n` is computed as
/// `origin + n * delta` so rounding does not accumulate.
#[derive(Clone, Debug)]
pub struct MarchSteps {
    origin: [f32; 2],
    delta: [f32; 2],
    n: u32,
}

impl MarchSteps {
    pub fn new(origin: [f32; 2], angle_deg: f32, step: f32) -> Self {
        let rad = angle_deg.to_radians();
        Self {
            origin,
            delta: [rad.cos() * step, rad.sin() * step],
            n: 0,
        }
    }
}

impl Iterator for MarchSteps {
    type Item = MarchStep;

    fn next(&mut self) -> Option<MarchStep> {
        self.n = self.n.checked_add(1)?;
        let k = self.n as f32;
        let pos = [
            self.origin[0] + self.delta[0] * k,
            self.origin[1] + self.delta[1] * k,
        ];
        let dx = pos[0] - self.origin[0];
        let dy = pos[1] - self.origin[1];
        Some(MarchStep {
            pos,
            distance: (dx * dx + dy * dy).sqrt(),
        })
    }
}

/// Casts rays for a grid with a validated configuration.
#[derive(Clone, Debug)]
pub struct RayMarcher<'a> {
    grid: &'a Grid,
    config: MarchConfig,
}

impl<'a> RayMarcher<'a> {
    pub fn new(grid: &'a Grid, config: MarchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { grid, config })
    }

    #[inline]
    pub fn config(&self) -> &MarchConfig {
        &self.config
    }

    /// Ray origin for a pose, i.e. the pose position shifted by the eye offset.
    #[inline]
    pub fn origin(&self, pose: &Pose) -> [f32; 2] {
        [
            pose.pos[0] + self.config.eye_offset[0],
            pose.pos[1] + self.config.eye_offset[1],
        ]
    }

    /// Angle of the ray for `column` out of `columns` spanning `fov` degrees.
    #[inline]
    pub fn ray_angle(pose: &Pose, fov: f32, column: usize, columns: usize) -> f32 {
        pose.angle - fov / 2.0 + column as f32 * (fov / columns as f32)
    }

    pub fn steps(&self, origin: [f32; 2], angle_deg: f32) -> MarchSteps {
        MarchSteps::new(origin, angle_deg, self.config.step)
    }

    /// March one ray. Each step checks, in order: leaving the grid, entering a
    /// wall, exceeding the max distance.
    pub fn march(&self, origin: [f32; 2], angle_deg: f32, column: usize) -> Result<RaySample> {
        let max = self.config.max_distance;
        let max_steps = self.config.max_steps();
        let sample = |distance, hit| RaySample {
            column,
            angle: normalize_degrees(angle_deg),
            distance,
            hit,
        };

        for step in self.steps(origin, angle_deg).take(max_steps) {
            let [x, y] = step.pos;
            if !self.grid.contains(x, y) {
                return Ok(sample(step.distance, Hit::Escaped(Escape::OutOfBounds)));
            }
            if step.distance < max && self.grid.cell_under(x, y) == Some(Cell::Wall) {
                let cell = [x.floor() as usize, y.floor() as usize];
                return Ok(sample(step.distance, Hit::Wall { cell }));
            }
            if step.distance >= max {
                return Ok(sample(max, Hit::Escaped(Escape::MaxDistance)));
            }
        }

        Err(Error::MarchUnresolved {
            column,
            steps: max_steps,
        })
    }

    /// March every column for this frame. Columns run in parallel; the result
    /// is ordered by column index.
    pub fn cast_frame(&self, pose: &Pose, fov: f32, columns: usize) -> Result<Vec<RaySample>> {
        trace!(columns, angle = pose.angle, "casting frame");
        let origin = self.origin(pose);
        (0..columns)
            .into_par_iter()
            .map(|column| {
                let angle = Self::ray_angle(pose, fov, column, columns);
                self.march(origin, angle, column)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> Grid {
        Grid::reference().unwrap()
    }

    #[test]
    fn test_straight_east_hits_border() {
        let grid = grid();
        let marcher = RayMarcher::new(&grid, MarchConfig::default()).unwrap();
        let sample = marcher.march([1.5, 1.5], 0.0, 0).unwrap();
        assert_eq!(sample.hit, Hit::Wall { cell: [7, 1] });
        assert_relative_eq!(sample.distance, 5.5, epsilon = DEFAULT_STEP);
    }

    #[test]
    fn test_straight_south_hits_interior_wall() {
        let grid = grid();
        let marcher = RayMarcher::new(&grid, MarchConfig::default()).unwrap();
        // column x = 2 has an interior wall at y = 2
        let sample = marcher.march([2.5, 1.5], 90.0, 0).unwrap();
        assert_eq!(sample.hit, Hit::Wall { cell: [2, 2] });
        assert_relative_eq!(sample.distance, 0.5, epsilon = DEFAULT_STEP);
    }

    #[test]
    fn test_escape_without_border() {
        let grid = Grid::from_rows(&["000", "000", "000"]).unwrap();
        let marcher = RayMarcher::new(&grid, MarchConfig::default()).unwrap();
        let sample = marcher.march([1.5, 1.5], 180.0, 3).unwrap();
        assert_eq!(sample.column, 3);
        assert_eq!(sample.hit, Hit::Escaped(Escape::OutOfBounds));
        assert_relative_eq!(sample.distance, 1.5, epsilon = 2.0 * DEFAULT_STEP);
        assert_eq!(sample.wall_height(600.0, 2.0), None);
    }

    #[test]
    fn test_max_distance_in_open_field() {
        let rows = vec!["0".repeat(64); 3];
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let grid = Grid::from_rows(&rows).unwrap();
        let config = MarchConfig {
            max_distance: 10.0,
            ..MarchConfig::default()
        };
        let marcher = RayMarcher::new(&grid, config).unwrap();
        let sample = marcher.march([0.5, 1.5], 0.0, 0).unwrap();
        assert_eq!(sample.hit, Hit::Escaped(Escape::MaxDistance));
        assert_eq!(sample.distance, 10.0);
    }

    #[test]
    fn test_invalid_step_rejected() {
        let grid = grid();
        for step in [0.0, -0.1, f32::NAN, f32::INFINITY] {
            let config = MarchConfig {
                step,
                ..MarchConfig::default()
            };
            assert!(matches!(
                RayMarcher::new(&grid, config),
                Err(Error::InvalidStep(_))
            ));
        }
    }

    #[test]
    fn test_wall_height_scale() {
        assert_relative_eq!(wall_height(2.0, 600.0, 2.0), 600.0);
        assert_relative_eq!(wall_height(4.0, 600.0, 2.0), 300.0);
    }

    #[test]
    fn test_cast_frame_order_and_spacing() {
        let grid = grid();
        let marcher = RayMarcher::new(&grid, MarchConfig::default()).unwrap();
        let pose = Pose::new([1.5, 1.5], 0.0);
        let samples = marcher.cast_frame(&pose, 60.0, 400).unwrap();
        assert_eq!(samples.len(), 400);
        for (i, s) in samples.iter().enumerate() {
            assert_eq!(s.column, i);
        }
        assert_relative_eq!(samples[0].angle, 330.0, epsilon = 1e-3);
        assert_relative_eq!(samples[200].angle, 0.0, epsilon = 1e-3);
        assert!(samples.iter().all(RaySample::is_wall));
    }

    #[test]
    fn test_cast_frame_empty() {
        let grid = grid();
        let marcher = RayMarcher::new(&grid, MarchConfig::default()).unwrap();
        let pose = Pose::new([1.5, 1.5], 0.0);
        assert!(marcher.cast_frame(&pose, 60.0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_eye_offset_moves_origin() {
        let grid = grid();
        let config = MarchConfig {
            eye_offset: [0.5, 0.5],
            ..MarchConfig::default()
        };
        let marcher = RayMarcher::new(&grid, config).unwrap();
        let pose = Pose::new([1.0, 1.0], 0.0);
        assert_eq!(marcher.origin(&pose), [1.5, 1.5]);
        let samples = marcher.cast_frame(&pose, 0.0, 1).unwrap();
        assert_relative_eq!(samples[0].distance, 5.5, epsilon = DEFAULT_STEP);
    }
}
