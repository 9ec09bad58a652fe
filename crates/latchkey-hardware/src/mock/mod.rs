//! Mock lines and a simulated board for testing and development.
//!
//! Every mock line comes paired with a handle that observes or drives it
//! from outside the profile that owns the line.

pub mod board;
pub mod line;

// Re-export commonly used types
pub use board::SimulatedBoard;
pub use line::{MockInput, MockLineHandle, MockOutput};
