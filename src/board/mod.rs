pub mod cozy;
pub mod svg;

pub use cozy::{NotationError, Outcome, Position, PositionError};
