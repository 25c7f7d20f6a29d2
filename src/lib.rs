pub mod error;
pub mod io;
pub mod kernel;
pub mod lattice;
pub mod microphone;
pub mod monitor;
pub mod recording;
pub mod scene;
pub mod signal;
pub mod simulator;
pub mod snapshot;
pub mod speaker;

pub use error::{Error, Result};

/// Audio sample as it crosses the boundary of the simulation.
pub type Sample = f32;

/// 2D double precision vector used for every node quantity.
///
/// `perp_dot` is the 2D cross product.
pub type Vector2 = glam::DVec2;
