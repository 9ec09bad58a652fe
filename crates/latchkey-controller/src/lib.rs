//! Barrier control for the latchkey access controller.
//!
//! [`BarrierController`] ties the other crates together: it drains Wiegand
//! edges into the decoder, checks reads against the
//! [`CredentialStore`](latchkey_storage::CredentialStore), records every
//! decision in the [`EventLog`](latchkey_storage::EventLog) and drives a
//! [`HardwareProfile`](latchkey_hardware::HardwareProfile) through the
//! [`BarrierState`] machine.
//!
//! # Timers
//!
//! | Timer   | Armed                    | Cleared by           | Default |
//! |---------|--------------------------|----------------------|---------|
//! | initial | unlock by credential     | first button press   | 10 s    |
//! | button  | every button release     | next button press    | 5 s     |
//! | sanity  | unlock (never re-armed)  | locking              | 30 s    |
//!
//! The sanity timer locks the barrier even while the button is held.
//!
//! # Running
//!
//! [`runtime::run`] drives [`BarrierController::tick`] from a tokio
//! interval until a watch channel signals shutdown. Tests call `tick`
//! directly with timestamps from a [`ManualClock`](latchkey_core::ManualClock).

pub mod config;
pub mod controller;
pub mod runtime;
pub mod state_machine;

pub use config::{Config, TimerConfig};
pub use controller::{BarrierController, Edges};
pub use state_machine::{BarrierState, LockState, StateTransition, Verdict};
