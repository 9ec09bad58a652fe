//! End-to-end barrier scenarios: Wiegand edges in, pins and audit log out.

mod common;

use common::*;
use latchkey_controller::LockState;
use latchkey_core::{Credential, CredentialId};
use latchkey_hardware::{IndicatorState, Level};
use latchkey_storage::{EventKind, StorageError, TimerKind};
use latchkey_wiegand::{DataLine, WiegandFormat};

// ============================================================================
// Credential decisions
// ============================================================================

#[test]
fn test_enabled_card_unlocks() {
    let mut bench = Bench::new(magnetic_lock());
    let at = bench.present(ALICE);

    assert_eq!(bench.state(), LockState::Unlocked);
    let path: Vec<_> = bench.transitions.iter().map(|t| (t.from, t.to)).collect();
    assert_eq!(
        path,
        vec![
            (LockState::Locked, LockState::Unlocking),
            (LockState::Unlocking, LockState::Unlocked),
        ]
    );
    assert!(bench.transitions.iter().all(|t| t.at == at));

    let entries = bench.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EventKind::Granted);
    assert_eq!(entries[0].credential, Some(ALICE));

    assert_eq!(bench.level(LOCK_DRIVE), Level::High);
    // Active-low LED: green is low.
    assert_eq!(bench.level(DOOR_LED), Level::Low);
    assert_eq!(bench.controller.indicator(), Some(IndicatorState::Granted));
}

#[test]
fn test_bad_parity_is_denied_without_credential() {
    let mut bench = Bench::new(magnetic_lock());
    let mut lines = WiegandFormat::Wiegand26.encode(ALICE).unwrap();
    lines[0] = match lines[0] {
        DataLine::D0 => DataLine::D1,
        DataLine::D1 => DataLine::D0,
    };
    bench.present_lines(&lines);

    assert_eq!(bench.state(), LockState::Locked);
    assert!(bench.transitions.is_empty());
    let entries = bench.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EventKind::DecodeError);
    assert_eq!(entries[0].credential, None);
    assert_eq!(bench.level(LOCK_DRIVE), Level::Low);
}

#[test]
fn test_short_frame_is_denied() {
    let mut bench = Bench::new(magnetic_lock());
    bench.present_lines(&[DataLine::D1; 8]);
    assert_eq!(bench.state(), LockState::Locked);
    assert_eq!(bench.kinds(), vec![EventKind::DecodeError]);
}

#[test]
fn test_unknown_card_is_denied() {
    let mut bench = Bench::new(magnetic_lock());
    bench.present(CredentialId::new(0x123456));

    assert_eq!(bench.state(), LockState::Locked);
    let entries = bench.entries();
    assert_eq!(entries[0].kind, EventKind::UnknownCredential);
    assert_eq!(entries[0].credential, Some(CredentialId::new(0x123456)));
}

#[test]
fn test_disabled_card_is_denied_with_feedback() {
    let mut bench = Bench::new(magnetic_lock());
    let at = bench.present(BOB);

    assert_eq!(bench.state(), LockState::Locked);
    assert_eq!(bench.kinds(), vec![EventKind::Denied]);
    assert_eq!(bench.controller.indicator(), Some(IndicatorState::Denied));
    // Active-low buzzer sounds while denied.
    assert_eq!(bench.level(BUZZER), Level::Low);

    bench.run_until(at.as_millis() + 1_000);
    assert_eq!(bench.controller.indicator(), Some(IndicatorState::Idle));
    assert_eq!(bench.level(BUZZER), Level::High);
}

#[test]
fn test_wiegand34_card_unlocks() {
    let mut bench = Bench::new(magnetic_lock());
    let id = CredentialId::new(0x1234_5678);
    bench
        .controller
        .credentials_mut()
        .upsert(Credential::new(id))
        .unwrap();

    let lines = WiegandFormat::Wiegand34.encode(id).unwrap();
    bench.present_lines(&lines);
    assert_eq!(bench.state(), LockState::Unlocked);
}

#[test]
fn test_card_removed_while_running_is_denied() {
    let mut bench = Bench::new(magnetic_lock());
    bench.controller.credentials_mut().remove(ALICE).unwrap();
    bench.present(ALICE);
    assert_eq!(bench.state(), LockState::Locked);
    assert_eq!(bench.kinds(), vec![EventKind::UnknownCredential]);
}

#[test]
fn test_failed_admin_persist_keeps_controller_running() {
    let mut bench = Bench::new(magnetic_lock());
    bench.storage.fail_next_rename();
    let result = bench.controller.credentials_mut().remove(ALICE);
    assert!(matches!(result, Err(StorageError::PersistFailed { .. })));

    bench.present(ALICE);
    assert_eq!(bench.state(), LockState::Unlocked);
}

// ============================================================================
// Timers
// ============================================================================

#[test]
fn test_initial_timer_locks() {
    let mut bench = Bench::new(magnetic_lock());
    let unlocked = bench.present(ALICE);

    let locked = bench.run_until_state(LockState::Locked, 15_000).unwrap();
    assert_eq!(locked.as_millis(), unlocked.as_millis() + 10_000);
    assert_eq!(bench.level(LOCK_DRIVE), Level::Low);

    let last = bench.entries().pop().unwrap();
    assert_eq!(last.kind, EventKind::TimeoutLock);
    assert_eq!(last.timer, Some(TimerKind::Initial));
    assert_eq!(bench.controller.indicator(), Some(IndicatorState::Idle));
}

#[test]
fn test_button_release_starts_button_timer() {
    let mut bench = Bench::new(magnetic_lock());
    let unlocked = bench.present(ALICE).as_millis();

    bench.run_until(unlocked + 2_000);
    bench.drive(EXIT_BUTTON, true);
    bench.step();
    assert_eq!(bench.state(), LockState::HoldOpen);

    // Held past the initial deadline.
    bench.run_until(unlocked + 15_000);
    assert_eq!(bench.state(), LockState::HoldOpen);

    bench.drive(EXIT_BUTTON, false);
    bench.step();
    let released = bench.now.as_millis();
    assert_eq!(bench.state(), LockState::Unlocked);

    let locked = bench.run_until_state(LockState::Locked, 10_000).unwrap();
    assert_eq!(locked.as_millis(), released + 5_000);
    assert_eq!(bench.entries().pop().unwrap().timer, Some(TimerKind::Button));
}

#[test]
fn test_sanity_timer_locks_while_button_held() {
    let mut bench = Bench::new(magnetic_lock());
    let unlocked = bench.present(ALICE).as_millis();

    bench.drive(EXIT_BUTTON, true);
    bench.step();
    assert_eq!(bench.state(), LockState::HoldOpen);

    let locked = bench.run_until_state(LockState::Locked, 40_000).unwrap();
    assert_eq!(locked.as_millis(), unlocked + 30_000);
    assert_eq!(bench.entries().pop().unwrap().timer, Some(TimerKind::Sanity));

    // The eventual release does nothing while locked.
    bench.drive(EXIT_BUTTON, false);
    bench.step();
    assert_eq!(bench.state(), LockState::Locked);
}

#[test]
fn test_button_ignored_while_locked() {
    let mut bench = Bench::new(magnetic_lock());
    bench.drive(EXIT_BUTTON, true);
    bench.step();
    bench.drive(EXIT_BUTTON, false);
    bench.step();
    assert_eq!(bench.state(), LockState::Locked);
    assert!(bench.transitions.is_empty());
}

#[test]
fn test_second_grant_extends_initial_timer() {
    let mut bench = Bench::new(magnetic_lock());
    bench.present(ALICE);
    bench.run_until(bench.now.as_millis() + 5_000);
    let regranted = bench.present(ALICE).as_millis();

    let locked = bench.run_until_state(LockState::Locked, 20_000).unwrap();
    assert_eq!(locked.as_millis(), regranted + 10_000);
    assert_eq!(
        bench.kinds(),
        vec![EventKind::Granted, EventKind::Granted, EventKind::TimeoutLock]
    );
}

#[test]
fn test_denial_while_unlocked_keeps_state() {
    let mut bench = Bench::new(magnetic_lock());
    bench.present(ALICE);
    bench.present(BOB);
    assert_eq!(bench.state(), LockState::Unlocked);
    assert_eq!(bench.kinds(), vec![EventKind::Granted, EventKind::Denied]);
}

// ============================================================================
// Magnetic lock inputs
// ============================================================================

#[test]
fn test_emergency_unlocks_with_sanity_only() {
    let mut bench = Bench::new(magnetic_lock());
    bench.run_until(1_000);
    bench.drive(EMERGENCY, true);
    bench.step();
    let at = bench.now;

    assert_eq!(bench.state(), LockState::Unlocked);
    assert_eq!(bench.kinds(), vec![EventKind::Emergency]);
    let state = bench.controller.state();
    assert!(state.is_emergency());
    assert_eq!(state.deadline(TimerKind::Initial), None);
    assert_eq!(
        state.deadline(TimerKind::Sanity),
        Some(ms(at.as_millis() + 30_000))
    );
    assert_eq!(bench.controller.indicator(), Some(IndicatorState::Emergency));

    // Still asserted: no second trigger.
    bench.step();
    assert_eq!(bench.kinds(), vec![EventKind::Emergency]);

    let locked = bench.run_until_state(LockState::Locked, 40_000).unwrap();
    assert_eq!(locked.as_millis(), at.as_millis() + 30_000);
    assert_eq!(bench.entries().pop().unwrap().timer, Some(TimerKind::Sanity));
}

#[test]
fn test_emergency_while_unlocked_drops_initial_timer() {
    let mut bench = Bench::new(magnetic_lock());
    let unlocked = bench.present(ALICE).as_millis();
    bench.drive(EMERGENCY, true);
    bench.step();

    assert_eq!(bench.state(), LockState::Unlocked);
    assert!(bench.controller.state().is_emergency());
    let locked = bench.run_until_state(LockState::Locked, 40_000).unwrap();
    assert_eq!(locked.as_millis(), unlocked + 30_000);
}

#[test]
fn test_door_events_are_audit_only() {
    let mut bench = Bench::new(magnetic_lock());
    bench.drive(DOOR_SENSE, true);
    bench.step();
    bench.drive(DOOR_SENSE, false);
    bench.step();

    assert_eq!(bench.state(), LockState::Locked);
    assert!(bench.transitions.is_empty());
    assert_eq!(bench.kinds(), vec![EventKind::DoorOpened, EventKind::DoorClosed]);
}

// ============================================================================
// Roller shutter
// ============================================================================

#[test]
fn test_roller_grant_connects_switch() {
    let mut bench = Bench::new(roller_shutter());
    bench.present(ALICE);
    assert_eq!(bench.state(), LockState::Unlocked);
    assert_eq!(bench.level(BUTTON_RELAY), Level::High);
}

#[test]
fn test_roller_remote_raise_drives_motor_until_release() {
    let mut bench = Bench::new(roller_shutter());
    let unlocked = bench.present(ALICE).as_millis();

    bench.drive(REMOTE_RAISE, true);
    bench.step();
    assert_eq!(bench.state(), LockState::HoldOpen);
    assert_eq!(bench.level(RAISE), Level::High);

    bench.run_until(unlocked + 3_000);
    bench.drive(REMOTE_RAISE, false);
    bench.step();
    let released = bench.now.as_millis();
    assert_eq!(bench.state(), LockState::Unlocked);
    assert_eq!(bench.level(RAISE), Level::Low);

    let locked = bench.run_until_state(LockState::Locked, 10_000).unwrap();
    assert_eq!(locked.as_millis(), released + 5_000);
    assert_eq!(bench.level(BUTTON_RELAY), Level::Low);
}

#[test]
fn test_roller_local_button_counts_without_motion() {
    let mut bench = Bench::new(roller_shutter());
    bench.present(ALICE);
    bench.drive(BUTTON_SENSE, true);
    bench.step();
    assert_eq!(bench.state(), LockState::HoldOpen);
    assert_eq!(bench.level(RAISE), Level::Low);
    assert_eq!(bench.level(LOWER), Level::Low);
}

#[test]
fn test_roller_sanity_stops_motion_before_release() {
    let mut bench = Bench::new(roller_shutter());
    let unlocked = bench.present(ALICE).as_millis();
    bench.drive(REMOTE_LOWER, true);
    bench.step();
    assert_eq!(bench.level(LOWER), Level::High);

    let locked = bench.run_until_state(LockState::Locked, 40_000).unwrap();
    assert_eq!(locked.as_millis(), unlocked + 30_000);
    assert_eq!(bench.level(LOWER), Level::Low);
    assert_eq!(bench.level(BUTTON_RELAY), Level::Low);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_energize_failure_returns_to_locked_with_fault() {
    let mut bench = Bench::new(magnetic_lock());
    bench.board.handle(LOCK_DRIVE).unwrap().fail_next();
    bench.present(ALICE);

    assert_eq!(bench.state(), LockState::Locked);
    let path: Vec<_> = bench.transitions.iter().map(|t| t.to).collect();
    assert_eq!(
        path,
        vec![LockState::Unlocking, LockState::Locking, LockState::Locked]
    );
    assert_eq!(bench.controller.indicator(), Some(IndicatorState::Fault));
    assert_eq!(bench.level(LOCK_DRIVE), Level::Low);
}

#[test]
fn test_log_failure_does_not_block_unlock() {
    let mut bench = Bench::new(magnetic_lock());
    bench.storage.fail_next_append();
    let at = bench.present(ALICE);

    assert_eq!(bench.state(), LockState::Unlocked);
    assert!(bench.controller.is_log_degraded());
    assert!(bench.entries().is_empty());

    // Locked with a degraded log shows fault.
    let locked = bench.run_until_state(LockState::Locked, 15_000).unwrap();
    assert_eq!(locked.as_millis(), at.as_millis() + 10_000);
    // The timeout entry went through, so logging recovered.
    assert!(!bench.controller.is_log_degraded());
    assert_eq!(bench.kinds(), vec![EventKind::TimeoutLock]);
    assert_eq!(bench.controller.indicator(), Some(IndicatorState::Idle));
}

#[test]
fn test_degraded_log_shows_fault_while_locked() {
    let mut bench = Bench::new(magnetic_lock());
    bench.storage.fail_next_append();
    let at = bench.present(CredentialId::new(0x42));
    assert_eq!(bench.controller.indicator(), Some(IndicatorState::Denied));

    bench.run_until(at.as_millis() + 1_000);
    assert_eq!(bench.controller.indicator(), Some(IndicatorState::Fault));
}

#[test]
fn test_store_fault_shows_fault_while_locked() {
    let mut bench = Bench::with_store_fault(magnetic_lock());
    assert_eq!(bench.controller.indicator(), Some(IndicatorState::Fault));

    // Unlocking still works and shows the grant.
    bench.present(ALICE);
    assert_eq!(bench.controller.indicator(), Some(IndicatorState::Granted));
}

#[test]
fn test_shutdown_locks_open_barrier() {
    let mut bench = Bench::new(magnetic_lock());
    bench.present(ALICE);
    let transitions = bench.controller.shutdown(bench.now);

    assert_eq!(transitions.last().map(|t| t.to), Some(LockState::Locked));
    assert_eq!(bench.level(LOCK_DRIVE), Level::Low);
    assert_eq!(bench.kinds().last(), Some(&EventKind::ShutdownLock));

    // Nothing to do when already locked.
    assert!(bench.controller.shutdown(bench.now).is_empty());
}
