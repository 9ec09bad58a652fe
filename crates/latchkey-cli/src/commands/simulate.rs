//! `latchkey simulate` - Run the controller against a simulated board
//!
//! The configured credential files are copied into memory, so a simulation
//! never touches the real store or audit log. An unreadable store shows up as
//! the fault indication, as it would on the device.

use anyhow::{Context, Result, anyhow};
use clap::Args;
use latchkey_controller::{BarrierController, Config, runtime};
use latchkey_core::constants::EDGE_QUEUE_CAPACITY;
use latchkey_core::{Clock, CredentialId, MonotonicClock};
use latchkey_hardware::devices::AnyProfile;
use latchkey_hardware::mock::SimulatedBoard;
use latchkey_hardware::{Level, PinBinding, ProfileConfig};
use latchkey_storage::{CredentialStore, EventLog, MemoryStorage, StorageBackend};
use latchkey_wiegand::{DataLine, Edge, EdgeSender, channel};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, warn};

/// Gap between Wiegand pulses, as a typical reader sends them.
const PULSE_INTERVAL: Duration = Duration::from_millis(2);

/// How long after the card the button is pressed.
const PRESS_DELAY: Duration = Duration::from_millis(500);

#[derive(Args)]
pub struct SimulateArgs {
    /// Credential to present, decimal or 0x-prefixed hex
    #[arg(long, value_name = "ID")]
    pub card: CredentialId,

    /// Total run time before shutdown
    #[arg(long, value_name = "N", default_value_t = 15)]
    pub seconds: u64,

    /// Hold the exit/operator button for this long after the card
    #[arg(long, value_name = "MS")]
    pub hold_ms: Option<u64>,
}

pub async fn handle(args: &SimulateArgs, config: &Config) -> Result<()> {
    let lines = config
        .wiegand
        .formats
        .iter()
        .find_map(|format| format.encode(args.card))
        .ok_or_else(|| anyhow!("credential {} fits no enabled Wiegand format", args.card))?;

    let memory = MemoryStorage::new();
    let (store, store_fault) = load_credentials(config, &memory)?;
    let log = EventLog::open(memory, &config.storage.log_file)?;

    let mut board = SimulatedBoard::new();
    let profile = AnyProfile::from_config(&config.profile, &mut board)
        .context("failed to build hardware profile")?;
    let (sender, receiver) = channel::<EDGE_QUEUE_CAPACITY>();
    let controller =
        BarrierController::new(config, receiver, store, log, profile).with_store_fault(store_fault);

    let button = args.hold_ms.and_then(|ms| {
        let binding = button_binding(&config.profile);
        if binding.is_none() {
            warn!("Profile has no exit button, ignoring --hold-ms");
        }
        binding.map(|b| (b, Duration::from_millis(ms)))
    });

    let clock = MonotonicClock::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let run_for = Duration::from_secs(args.seconds);
    info!(card = %args.card, seconds = args.seconds, "Starting simulation");

    let driver = async move {
        let deadline = Instant::now() + run_for;
        swipe(sender, &lines, &clock).await;

        if let Some((binding, hold)) = button {
            tokio::time::sleep(PRESS_DELAY).await;
            press(&board, binding, true);
            tokio::time::sleep(hold).await;
            press(&board, binding, false);
        }

        tokio::time::sleep_until(deadline).await;
        let _ = shutdown_tx.send(true);
    };

    let (controller, ()) = tokio::join!(
        runtime::run(controller, clock, config.tick(), shutdown_rx),
        driver
    );

    for entry in controller.event_log().read_all()? {
        println!("{entry}");
    }
    println!("Final state: {}", controller.lock_state());
    Ok(())
}

/// Copy the configured credential files into `memory` and load them there.
///
/// Returns whether the store was unreadable. Corrupt files are moved aside
/// in memory only.
fn load_credentials(
    config: &Config,
    memory: &MemoryStorage,
) -> Result<(CredentialStore<MemoryStorage>, bool)> {
    let storage = &config.storage;
    let disk = storage.backend().with_context(|| {
        format!("failed to open data directory {}", storage.data_dir.display())
    })?;
    for name in [&storage.credentials_file, &storage.staging_file] {
        let bytes = disk
            .read(name)
            .with_context(|| format!("failed to read {}", disk.location(name)))?;
        if let Some(bytes) = bytes {
            memory.insert(name, bytes);
        }
    }

    let (store, fault) = CredentialStore::load_or_empty(
        memory.clone(),
        &storage.credentials_file,
        &storage.staging_file,
    )?;
    if let Some(fault) = &fault {
        warn!(error = %fault, "Credential file is unreadable, simulating with an empty store");
    }
    Ok((store, fault.is_some()))
}

async fn swipe(
    mut sender: EdgeSender<EDGE_QUEUE_CAPACITY>,
    lines: &[DataLine],
    clock: &MonotonicClock,
) {
    for &line in lines {
        if !sender.push(Edge::new(line, clock.now())) {
            warn!("Edge queue full, pulse dropped");
        }
        tokio::time::sleep(PULSE_INTERVAL).await;
    }
}

fn button_binding(profile: &ProfileConfig) -> Option<PinBinding> {
    match profile {
        ProfileConfig::MagneticLock(c) => c.exit_button,
        ProfileConfig::RollerShutter(c) => Some(c.button_sense),
    }
}

fn press(board: &SimulatedBoard, binding: PinBinding, asserted: bool) {
    let level = Level::from(asserted != binding.active_low);
    if let Err(error) = board.drive(binding.pin, level) {
        warn!(pin = binding.pin, %error, "Failed to drive simulated button");
    }
}
