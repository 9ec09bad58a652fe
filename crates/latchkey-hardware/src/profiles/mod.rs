//! Concrete hardware profiles.

pub mod magnetic_lock;
pub mod roller_shutter;

pub use magnetic_lock::MagneticLockProfile;
pub use roller_shutter::RollerShutterProfile;

use latchkey_core::Timestamp;
use latchkey_core::constants::FAULT_BLINK_HALF_PERIOD_MS;

/// Phase of the fault blink at `now`: `true` for the second half-period.
pub(crate) fn blink_phase(now: Timestamp) -> bool {
    (now.as_millis() / FAULT_BLINK_HALF_PERIOD_MS) % 2 == 1
}
