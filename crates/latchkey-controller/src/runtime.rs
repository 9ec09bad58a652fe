//! Async control loop.
//!
//! The controller itself is synchronous; this module only decides when to
//! call [`BarrierController::tick`]. Ticks come from a
//! [`tokio::time::interval`] that skips missed ticks instead of bursting
//! them, so a stalled loop resumes at its normal cadence and timers are
//! still judged against the clock, not the tick count.

use crate::controller::BarrierController;
use latchkey_core::Clock;
use latchkey_hardware::HardwareProfile;
use latchkey_storage::StorageBackend;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Tick `controller` every `tick` until `shutdown` becomes `true` (or its
/// sender is dropped), then lock the barrier and hand the controller back.
pub async fn run<P, B, C>(
    mut controller: BarrierController<P, B>,
    clock: C,
    tick: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> BarrierController<P, B>
where
    P: HardwareProfile,
    B: StorageBackend,
    C: Clock,
{
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(
        tick_ms = u64::try_from(tick.as_millis()).unwrap_or(u64::MAX),
        "Control loop started"
    );

    let mut ticks: u64 = 0;
    loop {
        if *shutdown.borrow_and_update() {
            break;
        }
        tokio::select! {
            _ = interval.tick() => {
                ticks += 1;
                for transition in controller.tick(clock.now()) {
                    debug!(from = %transition.from, to = %transition.to, "Barrier transition");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    controller.shutdown(clock.now());
    info!(ticks, "Control loop stopped");
    controller
}
