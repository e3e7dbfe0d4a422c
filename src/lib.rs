//! Grid ray-marching renderer.
//!
//! A camera moves over a 2D occupancy grid and, each frame, one ray per screen
//! column is marched through the grid at a fixed step. The hit distances become
//! vertical wall slabs in a software framebuffer.

pub mod camera;
pub mod config;
pub mod error;
pub mod grid;
pub mod input;
pub mod raymarch;
pub mod renderer;
pub mod scaler;

pub use camera::{Controller, MoveDir, MovementPolicy, Pose, StepMode, TurnDir, TurnMode};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use grid::{Cell, Grid};
pub use raymarch::{Escape, Hit, MarchConfig, RayMarcher, RaySample};
