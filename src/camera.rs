use tracing::debug;

use crate::grid::Grid;

/// Wrap an angle in degrees into `[0, 360)`.
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Round a heading to the nearest multiple of 90 degrees.
///
/// The heading is offset by 45 degrees so each cardinal direction owns the
/// sector centred on it, then truncated to the sector start.
#[inline]
pub fn snap_degrees(angle: f32) -> f32 {
    let shifted = normalize_degrees(normalize_degrees(angle) + 45.0);
    let sector = (shifted / 90.0).floor() as u32 % 4;
    sector as f32 * 90.0
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub pos: [f32; 2], // (x, y) in grid units, y grows down the rows
    pub angle: f32,    // degrees in [0, 360), 0 = east, 90 = south
}

impl Pose {
    pub fn new(pos: [f32; 2], angle: f32) -> Self {
        Self {
            pos,
            angle: normalize_degrees(angle),
        }
    }

    /// Unit heading vector `(cos, sin)`.
    #[inline]
    pub fn direction(&self) -> [f32; 2] {
        let rad = self.angle.to_radians();
        [rad.cos(), rad.sin()]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepMode {
    Continuous, // step_size is cells per second, scaled by dt
    Discrete,   // step_size cells per press along the cardinal heading
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnMode {
    Continuous, // turn_size is degrees per second, scaled by dt
    Discrete,   // turn_size degrees per press
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDir {
    Forward,
    Backward,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnDir {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementPolicy {
    pub step_mode: StepMode,
    pub turn_mode: TurnMode,
    pub step_size: f32,
    pub turn_size: f32,
}

impl MovementPolicy {
    /// Held-key walking and turning at 5 cells/s and 90 deg/s.
    pub fn free_look() -> Self {
        Self {
            step_mode: StepMode::Continuous,
            turn_mode: TurnMode::Continuous,
            step_size: 5.0,
            turn_size: 90.0,
        }
    }

    /// Held-key walking, heading changes in 90 degree presses.
    pub fn cardinal_turn() -> Self {
        Self {
            step_mode: StepMode::Continuous,
            turn_mode: TurnMode::Discrete,
            step_size: 5.0,
            turn_size: 90.0,
        }
    }

    /// One cell per press, 90 degrees per press.
    pub fn grid_step() -> Self {
        Self {
            step_mode: StepMode::Discrete,
            turn_mode: TurnMode::Discrete,
            step_size: 1.0,
            turn_size: 90.0,
        }
    }

    /// Discrete stepping only moves along grid axes.
    #[inline]
    pub fn requires_cardinal_heading(&self) -> bool {
        self.step_mode == StepMode::Discrete
    }
}

impl Default for MovementPolicy {
    fn default() -> Self {
        Self::free_look()
    }
}

/// Owns the camera pose and commits moves that land on walkable cells.
///
/// Turns accumulate into an unsnapped `heading`. When the policy needs
/// cardinal headings, the pose angle is the snapped heading, so slow
/// continuous turns still rotate once they cross a 45 degree sector edge.
#[derive(Clone, Debug)]
pub struct Controller {
    pose: Pose,
    heading: f32,
    policy: MovementPolicy,
}

impl Controller {
    pub fn new(pose: Pose, policy: MovementPolicy) -> Self {
        let mut controller = Self {
            pose,
            heading: pose.angle,
            policy,
        };
        if policy.requires_cardinal_heading() {
            controller.snap_to_cardinal();
        }
        controller
    }

    #[inline]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    #[inline]
    pub fn policy(&self) -> &MovementPolicy {
        &self.policy
    }

    /// Try to move along the heading. Returns false and leaves the pose
    /// untouched when the target is outside the grid or inside a wall.
    pub fn try_move(&mut self, grid: &Grid, dir: MoveDir, dt: f32) -> bool {
        let sign = match dir {
            MoveDir::Forward => 1.0,
            MoveDir::Backward => -1.0,
        };

        let (unit, distance) = match self.policy.step_mode {
            StepMode::Continuous => (self.pose.direction(), self.policy.step_size * dt),
            StepMode::Discrete => (cardinal_unit(self.pose.angle), self.policy.step_size),
        };

        let candidate = [
            self.pose.pos[0] + unit[0] * distance * sign,
            self.pose.pos[1] + unit[1] * distance * sign,
        ];

        if grid.is_walkable(candidate[0], candidate[1]) {
            self.pose.pos = candidate;
            true
        } else {
            debug!(
                from = ?self.pose.pos,
                to = ?candidate,
                "move rejected"
            );
            false
        }
    }

    /// Rotate the heading. Left turns decrease the angle, which is a
    /// counter-clockwise turn on a map with y pointing down.
    pub fn turn(&mut self, dir: TurnDir, dt: f32) {
        let sign = match dir {
            TurnDir::Left => -1.0,
            TurnDir::Right => 1.0,
        };
        let amount = match self.policy.turn_mode {
            TurnMode::Continuous => self.policy.turn_size * dt,
            TurnMode::Discrete => self.policy.turn_size,
        };
        self.heading = normalize_degrees(self.heading + sign * amount);
        self.pose.angle = if self.policy.requires_cardinal_heading() {
            snap_degrees(self.heading)
        } else {
            self.heading
        };
    }

    /// Round the heading to the nearest cardinal direction, discarding any
    /// partial turn accumulated so far.
    pub fn snap_to_cardinal(&mut self) {
        self.pose.angle = snap_degrees(self.pose.angle);
        self.heading = self.pose.angle;
    }
}

/// Exact axis-aligned unit vector for the cardinal sector of `angle`.
#[inline]
fn cardinal_unit(angle: f32) -> [f32; 2] {
    match (snap_degrees(angle) / 90.0) as u32 {
        0 => [1.0, 0.0],
        1 => [0.0, 1.0],
        2 => [-1.0, 0.0],
        _ => [0.0, -1.0],
    }
}
