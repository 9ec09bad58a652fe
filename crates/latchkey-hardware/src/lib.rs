//! Hardware abstraction layer for the latchkey barrier controller.
//!
//! The barrier controller is written against one capability set,
//! [`HardwareProfile`]: it issues abstract [`Command`]s, shows an
//! [`IndicatorState`], and reads an [`InputSnapshot`] once per tick. This
//! crate maps that onto physical lines for the two supported barriers:
//!
//! - [`MagneticLockProfile`]: lock MOSFET, two-colour reader LED, buzzer,
//!   door position sensor, emergency release, optional exit button.
//! - [`RollerShutterProfile`]: raise/lower motor logic, the relay that
//!   connects the operator switch, switch and status LEDs, and remote
//!   raise/lower triggers.
//!
//! # Layers
//!
//! ```text
//! BarrierController
//!        │  Command / IndicatorState / InputSnapshot
//!        ▼
//! AnyProfile ──► MagneticLockProfile | RollerShutterProfile
//!        │  asserted / deasserted, debounced
//!        ▼
//! BoundOutput / BoundInput (PinBinding: pin + polarity)
//!        │  Level
//!        ▼
//! OutputLine / InputLine  ◄── LineProvider (board bootstrap, SimulatedBoard)
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] with a
//! [`HardwareError`]. The controller treats a failed write during an
//! actuation as an actuation failure and a failed read as "no input this
//! tick".
//!
//! # Mock Implementations
//!
//! [`mock::SimulatedBoard`] hands out mock lines whose levels tests can
//! drive and observe, so both profiles and the controller run without
//! hardware.

pub mod button;
pub mod config;
pub mod debounce;
pub mod devices;
pub mod error;
pub mod mock;
pub mod pins;
pub mod profiles;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{MagneticLockConfig, PinBinding, ProfileConfig, RollerShutterConfig};
pub use devices::AnyProfile;
pub use error::{HardwareError, Result};
pub use profiles::{MagneticLockProfile, RollerShutterProfile};
pub use traits::{HardwareProfile, InputLine, LineProvider, OutputLine};
pub use types::{
    ButtonEdge, ButtonSource, Command, IndicatorState, InputSnapshot, Level, ProfileKind,
};
