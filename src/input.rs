//! Keyboard state and per-frame command resolution.

use std::collections::HashSet;

use winit::keyboard::KeyCode;

use crate::camera::{Controller, MoveDir, StepMode, TurnDir, TurnMode};
use crate::grid::Grid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    ToggleMap,
    CyclePolicy,
}

impl Action {
    pub fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => Some(Action::Forward),
            KeyCode::KeyS | KeyCode::ArrowDown => Some(Action::Backward),
            KeyCode::KeyA | KeyCode::ArrowLeft => Some(Action::TurnLeft),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(Action::TurnRight),
            KeyCode::KeyM => Some(Action::ToggleMap),
            KeyCode::KeyP => Some(Action::CyclePolicy),
            _ => None,
        }
    }
}

/// Held keys plus keys that went down since the last frame.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    held: HashSet<Action>,
    pressed: HashSet<Action>,
}

impl InputState {
    pub fn press(&mut self, action: Action) {
        // OS key repeat sends Pressed again while held; only the first counts
        if self.held.insert(action) {
            self.pressed.insert(action);
        }
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(&action);
    }

    #[inline]
    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    #[inline]
    pub fn was_pressed(&self, action: Action) -> bool {
        self.pressed.contains(&action)
    }

    /// Drop edge events once the frame has consumed them.
    pub fn end_frame(&mut self) {
        self.pressed.clear();
    }

    /// Continuous axes follow held keys, discrete axes follow fresh presses.
    fn active(&self, action: Action, continuous: bool) -> bool {
        if continuous {
            self.is_held(action)
        } else {
            self.was_pressed(action)
        }
    }

    /// Resolve at most one move for this frame. Opposing keys cancel out.
    pub fn move_command(&self, step_mode: StepMode) -> Option<MoveDir> {
        let continuous = step_mode == StepMode::Continuous;
        match (
            self.active(Action::Forward, continuous),
            self.active(Action::Backward, continuous),
        ) {
            (true, false) => Some(MoveDir::Forward),
            (false, true) => Some(MoveDir::Backward),
            _ => None,
        }
    }

    /// Resolve at most one turn for this frame. Opposing keys cancel out.
    pub fn turn_command(&self, turn_mode: TurnMode) -> Option<TurnDir> {
        let continuous = turn_mode == TurnMode::Continuous;
        match (
            self.active(Action::TurnLeft, continuous),
            self.active(Action::TurnRight, continuous),
        ) {
            (true, false) => Some(TurnDir::Left),
            (false, true) => Some(TurnDir::Right),
            _ => None,
        }
    }

    /// Apply this frame's turn, then its move, to the controller.
    pub fn apply(&self, controller: &mut Controller, grid: &Grid, dt: f32) {
        let policy = *controller.policy();
        if let Some(dir) = self.turn_command(policy.turn_mode) {
            controller.turn(dir, dt);
        }
        if let Some(dir) = self.move_command(policy.step_mode) {
            controller.try_move(grid, dir, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{MovementPolicy, Pose};

    #[test]
    fn test_key_mapping() {
        assert_eq!(Action::from_key(KeyCode::KeyW), Some(Action::Forward));
        assert_eq!(Action::from_key(KeyCode::ArrowLeft), Some(Action::TurnLeft));
        assert_eq!(Action::from_key(KeyCode::KeyM), Some(Action::ToggleMap));
        assert_eq!(Action::from_key(KeyCode::KeyZ), None);
    }

    #[test]
    fn test_repeat_press_is_not_an_edge() {
        let mut input = InputState::default();
        input.press(Action::TurnLeft);
        assert!(input.was_pressed(Action::TurnLeft));
        input.end_frame();
        input.press(Action::TurnLeft);
        assert!(!input.was_pressed(Action::TurnLeft));
        assert!(input.is_held(Action::TurnLeft));
        input.release(Action::TurnLeft);
        input.press(Action::TurnLeft);
        assert!(input.was_pressed(Action::TurnLeft));
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let mut input = InputState::default();
        input.press(Action::Forward);
        input.press(Action::Backward);
        assert_eq!(input.move_command(StepMode::Continuous), None);
        input.release(Action::Backward);
        assert_eq!(
            input.move_command(StepMode::Continuous),
            Some(MoveDir::Forward)
        );
    }

    #[test]
    fn test_discrete_axes_need_fresh_press() {
        let grid = Grid::reference().unwrap();
        let mut ctl = Controller::new(Pose::new([1.0, 1.0], 0.0), MovementPolicy::grid_step());
        let mut input = InputState::default();

        input.press(Action::Forward);
        input.apply(&mut ctl, &grid, 0.016);
        assert_eq!(ctl.pose().pos, [2.0, 1.0]);
        input.end_frame();

        // still held, but no new press
        input.apply(&mut ctl, &grid, 0.016);
        assert_eq!(ctl.pose().pos, [2.0, 1.0]);
    }

    #[test]
    fn test_continuous_axes_follow_held_keys() {
        let grid = Grid::reference().unwrap();
        let mut ctl = Controller::new(Pose::new([1.5, 1.5], 0.0), MovementPolicy::free_look());
        let mut input = InputState::default();
        input.press(Action::Forward);
        input.end_frame();
        input.apply(&mut ctl, &grid, 0.1);
        assert!(ctl.pose().pos[0] > 1.5);
    }
}
