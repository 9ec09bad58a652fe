//! Shared harness for controller integration tests.
//!
//! A [`Bench`] wires a real [`BarrierController`] to a [`SimulatedBoard`]
//! and in-memory storage, and steps it in 10 ms ticks the way the runtime
//! would. Inputs are debounced with a zero window so a driven pin is seen on
//! the next tick.

#![allow(dead_code)]

use latchkey_controller::{BarrierController, Config, LockState, StateTransition};
use latchkey_core::constants::EDGE_QUEUE_CAPACITY;
use latchkey_core::{Credential, CredentialId, Timestamp};
use latchkey_hardware::devices::AnyProfile;
use latchkey_hardware::mock::SimulatedBoard;
use latchkey_hardware::{
    Level, MagneticLockConfig, PinBinding, ProfileConfig, RollerShutterConfig,
};
use latchkey_storage::{CredentialStore, EventKind, EventLog, LogEntry, MemoryStorage};
use latchkey_wiegand::{DataLine, EdgeSender, WiegandFormat, channel, frame_edges};
use std::time::Duration;

pub const TICK_MS: u64 = 10;

/// Magnetic lock pins.
pub const LOCK_DRIVE: u8 = 16;
pub const DOOR_LED: u8 = 5;
pub const BUZZER: u8 = 4;
pub const DOOR_SENSE: u8 = 14;
pub const EMERGENCY: u8 = 15;
pub const EXIT_BUTTON: u8 = 17;

/// Roller shutter pins.
pub const BUTTON_RELAY: u8 = 7;
pub const RAISE: u8 = 2;
pub const LOWER: u8 = 3;
pub const BUTTON_SENSE: u8 = 4;
pub const REMOTE_RAISE: u8 = 0;
pub const REMOTE_LOWER: u8 = 1;

pub const ALICE: CredentialId = CredentialId::new(0xABCDE1);
pub const BOB: CredentialId = CredentialId::new(0x00B0B0);

pub fn magnetic_lock() -> ProfileConfig {
    ProfileConfig::MagneticLock(MagneticLockConfig {
        debounce_ms: 0,
        exit_button: Some(PinBinding::new(EXIT_BUTTON)),
        ..MagneticLockConfig::default()
    })
}

pub fn roller_shutter() -> ProfileConfig {
    ProfileConfig::RollerShutter(RollerShutterConfig {
        debounce_ms: 0,
        ..RollerShutterConfig::default()
    })
}

pub fn ms(ms: u64) -> Timestamp {
    Timestamp::from_millis(ms)
}

pub struct Bench {
    pub controller: BarrierController<AnyProfile, MemoryStorage>,
    pub edges: EdgeSender<EDGE_QUEUE_CAPACITY>,
    pub board: SimulatedBoard,
    pub storage: MemoryStorage,
    pub config: Config,
    pub now: Timestamp,
    pub transitions: Vec<StateTransition>,
}

impl Bench {
    /// Alice enabled, Bob disabled.
    pub fn new(profile: ProfileConfig) -> Self {
        Self::with_config(Config {
            profile,
            ..Config::default()
        })
    }

    /// As [`new`](Self::new), but with the credential file reported
    /// corrupt at startup.
    pub fn with_store_fault(profile: ProfileConfig) -> Self {
        Self::build(
            Config {
                profile,
                ..Config::default()
            },
            true,
        )
    }

    pub fn with_config(config: Config) -> Self {
        Self::build(config, false)
    }

    fn build(config: Config, store_fault: bool) -> Self {
        let storage = MemoryStorage::new();
        let mut store = CredentialStore::load(storage.clone(), "cards.dat", "cards.tmp").unwrap();
        store.upsert(Credential::new(ALICE).with_label("Alice").unwrap()).unwrap();
        store.upsert(Credential::new(BOB).with_enabled(false)).unwrap();
        let log = EventLog::open(storage.clone(), "log.dat").unwrap();

        let mut board = SimulatedBoard::new();
        let profile = AnyProfile::from_config(&config.profile, &mut board).unwrap();
        let (edges, receiver) = channel::<EDGE_QUEUE_CAPACITY>();
        let controller = BarrierController::new(&config, receiver, store, log, profile)
            .with_store_fault(store_fault);

        let mut bench = Self {
            controller,
            edges,
            board,
            storage,
            config,
            now: ms(0),
            transitions: Vec::new(),
        };
        bench.step();
        bench
    }

    /// Run one tick at `now + TICK_MS`.
    pub fn step(&mut self) -> Vec<StateTransition> {
        self.now = self.now + Duration::from_millis(TICK_MS);
        let transitions = self.controller.tick(self.now);
        self.transitions.extend(transitions.iter().copied());
        transitions
    }

    /// Tick until `now` reaches `target` (milliseconds).
    pub fn run_until(&mut self, target: u64) {
        while self.now < ms(target) {
            self.step();
        }
    }

    /// Tick until the barrier is in `state`, giving up after `limit_ms`.
    /// Returns the time it got there.
    pub fn run_until_state(&mut self, state: LockState, limit_ms: u64) -> Option<Timestamp> {
        let limit = self.now + Duration::from_millis(limit_ms);
        while self.now < limit {
            self.step();
            if self.controller.lock_state() == state {
                return Some(self.now);
            }
        }
        None
    }

    /// Queue the line pulses of a frame, 2 ms apart, starting now.
    pub fn send_lines(&mut self, lines: &[DataLine]) {
        for edge in frame_edges(lines, self.now, Duration::from_millis(2)) {
            assert!(self.edges.push(edge), "edge queue full");
        }
    }

    /// Present a card as a 26-bit frame and tick until the frame has been
    /// handled. Returns the time the controller acted on it.
    pub fn present(&mut self, id: CredentialId) -> Timestamp {
        let lines = WiegandFormat::Wiegand26.encode(id).unwrap();
        self.present_lines(&lines)
    }

    pub fn present_lines(&mut self, lines: &[DataLine]) -> Timestamp {
        let before = self.frames_closed();
        self.send_lines(lines);
        for _ in 0..20 {
            self.step();
            if self.frames_closed() > before {
                return self.now;
            }
        }
        panic!("frame was never handled");
    }

    fn frames_closed(&self) -> u64 {
        let stats = self.controller.decoder().stats();
        stats.frames_decoded + stats.decode_errors
    }

    pub fn drive(&self, pin: u8, high: bool) {
        self.board.drive(pin, Level::from(high)).unwrap();
    }

    pub fn level(&self, pin: u8) -> Level {
        self.board.level(pin).unwrap()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.controller.event_log().read_all().unwrap()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.entries().iter().map(|e| e.kind).collect()
    }

    pub fn state(&self) -> LockState {
        self.controller.lock_state()
    }
}
