//! # Utilities Module
//!
//! Distance mathematics and A* pathfinding over the map grid.

pub mod math;
pub mod pathfinding;

pub use math::*;
pub use pathfinding::*;
