//! Control loop tests on tokio's paused clock.

mod common;

use common::*;
use latchkey_controller::{BarrierController, Config, LockState, runtime};
use latchkey_core::constants::EDGE_QUEUE_CAPACITY;
use latchkey_core::{Clock, Credential, Timestamp};
use latchkey_hardware::devices::AnyProfile;
use latchkey_hardware::mock::SimulatedBoard;
use latchkey_hardware::Level;
use latchkey_storage::{CredentialStore, EventKind, EventLog, MemoryStorage};
use latchkey_wiegand::{EdgeSender, WiegandFormat, channel, frame_edges};
use std::time::Duration;
use tokio::sync::watch;

/// Clock on tokio's (pausable) timeline.
#[derive(Debug, Clone, Copy)]
struct TokioClock(tokio::time::Instant);

impl Clock for TokioClock {
    fn now(&self) -> Timestamp {
        let micros = u64::try_from(self.0.elapsed().as_micros()).unwrap_or(u64::MAX);
        Timestamp::from_micros(micros)
    }
}

type Controller = BarrierController<AnyProfile, MemoryStorage>;

fn setup() -> (Controller, EdgeSender<EDGE_QUEUE_CAPACITY>, SimulatedBoard) {
    let config = Config {
        profile: magnetic_lock(),
        ..Config::default()
    };
    let storage = MemoryStorage::new();
    let mut store = CredentialStore::load(storage.clone(), "cards.dat", "cards.tmp").unwrap();
    store.upsert(Credential::new(ALICE)).unwrap();
    let log = EventLog::open(storage, "log.dat").unwrap();

    let mut board = SimulatedBoard::new();
    let profile = AnyProfile::from_config(&config.profile, &mut board).unwrap();
    let (edges, receiver) = channel::<EDGE_QUEUE_CAPACITY>();
    let controller = BarrierController::new(&config, receiver, store, log, profile);
    (controller, edges, board)
}

fn swipe(edges: &mut EdgeSender<EDGE_QUEUE_CAPACITY>, clock: &TokioClock) {
    let lines = WiegandFormat::Wiegand26.encode(ALICE).unwrap();
    for edge in frame_edges(&lines, clock.now(), Duration::from_millis(2)) {
        assert!(edges.push(edge));
    }
}

fn kinds(controller: &Controller) -> Vec<EventKind> {
    controller
        .event_log()
        .read_all()
        .unwrap()
        .iter()
        .map(|e| e.kind)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_loop_unlocks_and_times_out() {
    let (controller, mut edges, board) = setup();
    let clock = TokioClock(tokio::time::Instant::now());
    let (tx, rx) = watch::channel(false);

    swipe(&mut edges, &clock);
    let driver = async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(board.level(LOCK_DRIVE).unwrap(), Level::High);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(board.level(LOCK_DRIVE).unwrap(), Level::Low);
        tx.send(true).unwrap();
    };

    let (controller, ()) = tokio::join!(
        runtime::run(controller, clock, Duration::from_millis(10), rx),
        driver
    );

    assert_eq!(controller.lock_state(), LockState::Locked);
    assert_eq!(kinds(&controller), vec![EventKind::Granted, EventKind::TimeoutLock]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_locks_open_barrier() {
    let (controller, mut edges, board) = setup();
    let clock = TokioClock(tokio::time::Instant::now());
    let (tx, rx) = watch::channel(false);

    swipe(&mut edges, &clock);
    let driver = async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(board.level(LOCK_DRIVE).unwrap(), Level::High);
        tx.send(true).unwrap();
    };

    let (controller, ()) = tokio::join!(
        runtime::run(controller, clock, Duration::from_millis(10), rx),
        driver
    );

    assert_eq!(controller.lock_state(), LockState::Locked);
    assert_eq!(board.level(LOCK_DRIVE).unwrap(), Level::Low);
    assert_eq!(kinds(&controller), vec![EventKind::Granted, EventKind::ShutdownLock]);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_sender_stops_loop() {
    let (controller, _edges, _board) = setup();
    let clock = TokioClock(tokio::time::Instant::now());
    let (tx, rx) = watch::channel(false);

    let driver = async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(tx);
    };
    let (controller, ()) = tokio::join!(
        runtime::run(controller, clock, Duration::from_millis(10), rx),
        driver
    );
    assert_eq!(controller.lock_state(), LockState::Locked);
    assert!(kinds(&controller).is_empty());
}
