//! The barrier controller: one deterministic tick per loop iteration.
//!
//! Each [`tick`](BarrierController::tick) runs three phases in a fixed
//! order, so a credential and a timer expiry landing in the same tick are
//! resolved in favour of the credential:
//!
//! 1. drain the edge queue into the decoder and act on finished frames,
//! 2. poll the hardware profile for door, emergency and button changes,
//! 3. lock the barrier if a timer deadline has passed.
//!
//! The indicator is refreshed last.
//!
//! Storage failures never stop the barrier. A failed audit append marks
//! logging as degraded (shown as `fault` while locked) and the actuation
//! that was decided still happens.

use crate::config::{Config, TimerConfig};
use crate::state_machine::{BarrierState, LockState, StateTransition, Verdict};
use latchkey_core::constants::EDGE_QUEUE_CAPACITY;
use latchkey_core::{Authorization, Timestamp};
use latchkey_hardware::{
    ButtonEdge, ButtonSource, Command, HardwareProfile, IndicatorState, InputSnapshot,
};
use latchkey_storage::{AuditEvent, CredentialStore, EventLog, StorageBackend};
use latchkey_wiegand::{DecodeResult, EdgeReceiver, WiegandDecoder};
use tracing::{debug, error, info, warn};

/// Receiving end of the edge queue the controller drains.
pub type Edges = EdgeReceiver<EDGE_QUEUE_CAPACITY>;

/// Drives one barrier from credential reads, inputs and timers.
#[derive(Debug)]
pub struct BarrierController<P, B> {
    timers: TimerConfig,
    edges: Edges,
    decoder: WiegandDecoder,
    store: CredentialStore<B>,
    log: EventLog<B>,
    profile: P,
    state: BarrierState,
    /// Indicator last written to the profile.
    shown: Option<IndicatorState>,
    feedback: Option<(IndicatorState, Timestamp)>,
    log_degraded: bool,
    store_fault: bool,
    /// Motor drive started by a remote trigger, stopped on release or lock.
    motion: Option<Command>,
    door_open: Option<bool>,
    emergency_input: bool,
}

impl<P: HardwareProfile, B: StorageBackend> BarrierController<P, B> {
    /// Assemble a controller around already opened collaborators.
    ///
    /// The barrier is assumed locked; the profile drives its outputs to the
    /// locked state when it is built.
    pub fn new(
        config: &Config,
        edges: Edges,
        store: CredentialStore<B>,
        log: EventLog<B>,
        profile: P,
    ) -> Self {
        info!(
            profile = %profile.kind(),
            credentials = store.len(),
            "Barrier controller ready"
        );
        Self {
            timers: config.timers,
            edges,
            decoder: WiegandDecoder::new(config.wiegand.clone()),
            store,
            log,
            profile,
            state: BarrierState::new(),
            shown: None,
            feedback: None,
            log_degraded: false,
            store_fault: false,
            motion: None,
            door_open: None,
            emergency_input: false,
        }
    }

    /// Show `fault` while locked because the credential file was found
    /// corrupt at startup.
    #[must_use]
    pub fn with_store_fault(mut self, fault: bool) -> Self {
        self.store_fault = fault;
        self
    }

    #[must_use]
    pub fn state(&self) -> &BarrierState {
        &self.state
    }

    #[must_use]
    pub fn lock_state(&self) -> LockState {
        self.state.current()
    }

    #[must_use]
    pub fn profile(&self) -> &P {
        &self.profile
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialStore<B> {
        &self.store
    }

    /// Administer credentials while running. A failed persist is returned
    /// by the store call and leaves the in-memory set unchanged.
    pub fn credentials_mut(&mut self) -> &mut CredentialStore<B> {
        &mut self.store
    }

    #[must_use]
    pub fn event_log(&self) -> &EventLog<B> {
        &self.log
    }

    #[must_use]
    pub fn decoder(&self) -> &WiegandDecoder {
        &self.decoder
    }

    /// Whether the last audit append failed.
    #[must_use]
    pub fn is_log_degraded(&self) -> bool {
        self.log_degraded
    }

    /// Indicator state last shown.
    #[must_use]
    pub fn indicator(&self) -> Option<IndicatorState> {
        self.shown
    }

    /// Run one control-loop iteration at `now`.
    ///
    /// Returns the state transitions it caused, in order.
    pub fn tick(&mut self, now: Timestamp) -> Vec<StateTransition> {
        let mut transitions = Vec::new();

        let drained = self.decoder.drain_from(&mut self.edges);
        if drained > 0 {
            debug!(edges = drained, "Drained Wiegand edges");
        }
        self.decoder.poll(now);
        while let Some(result) = self.decoder.next_result() {
            self.on_read(result, now, &mut transitions);
        }

        match self.profile.poll_inputs(now) {
            Ok(snapshot) => self.on_inputs(snapshot, now, &mut transitions),
            Err(e) => warn!("Input poll failed: {}", e),
        }

        if let Some(timer) = self.state.expired_timer(now) {
            info!(%timer, "Timer expired");
            self.lock(now, AuditEvent::TimeoutLock(timer), &mut transitions);
        }

        self.refresh_indicator(now);
        transitions
    }

    /// Lock the barrier if it is open, as the loop stops.
    pub fn shutdown(&mut self, now: Timestamp) -> Vec<StateTransition> {
        let mut transitions = Vec::new();
        if self.state.current().is_open() {
            info!("Locking barrier for shutdown");
            self.lock(now, AuditEvent::ShutdownLock, &mut transitions);
            self.refresh_indicator(now);
        }
        transitions
    }

    fn on_read(&mut self, result: DecodeResult, now: Timestamp, out: &mut Vec<StateTransition>) {
        let read = match result {
            Ok(read) => read,
            Err(e) => {
                warn!("Rejected Wiegand frame: {}", e);
                self.state.record_verdict(Verdict::DecodeError);
                self.audit(AuditEvent::DecodeError, now);
                self.show_feedback(IndicatorState::Denied, now);
                return;
            }
        };

        let id = read.id;
        match self.store.check(id) {
            Authorization::Granted => {
                info!(%id, format = %read.format, "Access granted");
                self.state.record_verdict(Verdict::Granted);
                self.audit(AuditEvent::Granted(id), now);
                self.show_feedback(IndicatorState::Granted, now);
                if self.state.current() == LockState::Locked {
                    self.unlock(now, false, out);
                } else {
                    self.state.regrant(now, &self.timers);
                }
            }
            Authorization::Disabled => {
                warn!(%id, "Access denied: credential disabled");
                self.state.record_verdict(Verdict::Denied);
                self.audit(AuditEvent::Denied(id), now);
                self.show_feedback(IndicatorState::Denied, now);
            }
            Authorization::Unknown => {
                warn!(%id, "Access denied: unknown credential");
                self.state.record_verdict(Verdict::UnknownCredential);
                self.audit(AuditEvent::UnknownCredential(id), now);
                self.show_feedback(IndicatorState::Denied, now);
            }
        }
    }

    fn on_inputs(
        &mut self,
        snapshot: InputSnapshot,
        now: Timestamp,
        out: &mut Vec<StateTransition>,
    ) {
        if let Some(open) = snapshot.door_open {
            if let Some(was_open) = self.door_open
                && was_open != open
            {
                if open {
                    if self.state.current() == LockState::Locked {
                        warn!("Door opened while locked");
                    } else {
                        debug!("Door opened");
                    }
                    self.audit(AuditEvent::DoorOpened, now);
                } else {
                    debug!("Door closed");
                    self.audit(AuditEvent::DoorClosed, now);
                }
            }
            self.door_open = Some(open);
        }

        if let Some(active) = snapshot.emergency {
            let rising = active && !self.emergency_input;
            self.emergency_input = active;
            if rising {
                self.on_emergency(now, out);
            }
        }

        match snapshot.button {
            ButtonEdge::None => {}
            ButtonEdge::Pressed(source) => self.on_press(source, now, out),
            ButtonEdge::Released => self.on_release(now, out),
        }
    }

    fn on_emergency(&mut self, now: Timestamp, out: &mut Vec<StateTransition>) {
        warn!("Emergency release triggered");
        self.audit(AuditEvent::Emergency, now);
        match self.state.current() {
            LockState::Locked => self.unlock(now, true, out),
            LockState::Unlocked | LockState::HoldOpen => self.state.enter_emergency(),
            LockState::Unlocking | LockState::Locking => {}
        }
    }

    fn on_press(&mut self, source: ButtonSource, now: Timestamp, out: &mut Vec<StateTransition>) {
        if self.state.current() != LockState::Unlocked {
            debug!(?source, state = %self.state.current(), "Ignoring button press");
            return;
        }
        if !self.transition(LockState::HoldOpen, now, out) {
            return;
        }
        self.state.press();

        let motion = match source {
            ButtonSource::Local => None,
            ButtonSource::RemoteRaise => Some(Command::Raise),
            ButtonSource::RemoteLower => Some(Command::Lower),
        };
        if let Some(command) = motion {
            match self.profile.apply_command(command) {
                Ok(()) => self.motion = Some(command),
                Err(e) => warn!(%command, "Motion command failed: {}", e),
            }
        }
    }

    fn on_release(&mut self, now: Timestamp, out: &mut Vec<StateTransition>) {
        if self.state.current() != LockState::HoldOpen {
            return;
        }
        self.stop_motion();
        if self.transition(LockState::Unlocked, now, out) {
            self.state.release(now, &self.timers);
        }
    }

    fn unlock(&mut self, now: Timestamp, emergency: bool, out: &mut Vec<StateTransition>) {
        if !self.transition(LockState::Unlocking, now, out) {
            return;
        }

        if let Err(e) = self.profile.apply_command(Command::Energize) {
            error!("Unlock actuation failed: {}", e);
            self.transition(LockState::Locking, now, out);
            self.release_barrier(now);
            self.transition(LockState::Locked, now, out);
            self.show_feedback(IndicatorState::Fault, now);
            return;
        }

        if self.transition(LockState::Unlocked, now, out) {
            self.state.arm_unlock(now, &self.timers, emergency);
            let sanity = now + self.timers.sanity();
            info!(emergency, %sanity, "Barrier unlocked");
        }
    }

    fn lock(&mut self, now: Timestamp, event: AuditEvent, out: &mut Vec<StateTransition>) {
        if !self.transition(LockState::Locking, now, out) {
            return;
        }
        self.stop_motion();
        self.release_barrier(now);
        self.transition(LockState::Locked, now, out);
        self.audit(event, now);
        info!(reason = %event.kind(), "Barrier locked");
    }

    fn release_barrier(&mut self, now: Timestamp) {
        if let Err(e) = self.profile.apply_command(Command::Release) {
            error!("Lock actuation failed: {}", e);
            self.show_feedback(IndicatorState::Fault, now);
        }
    }

    fn stop_motion(&mut self) {
        if let Some(command) = self.motion.take() {
            debug!(%command, "Stopping motion");
            if let Err(e) = self.profile.apply_command(Command::Stop) {
                warn!("Stop command failed: {}", e);
            }
        }
    }

    fn transition(&mut self, to: LockState, now: Timestamp, out: &mut Vec<StateTransition>) -> bool {
        match self.state.transition_to(to, now) {
            Ok(transition) => {
                debug!(from = %transition.from, to = %transition.to, "State transition");
                out.push(transition);
                true
            }
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }

    fn audit(&mut self, event: AuditEvent, now: Timestamp) {
        match self.log.append(event, now) {
            Ok(_) if self.log_degraded => {
                info!("Event log writable again");
                self.log_degraded = false;
            }
            Ok(_) => {}
            Err(_) => self.log_degraded = true,
        }
    }

    fn show_feedback(&mut self, indicator: IndicatorState, now: Timestamp) {
        self.feedback = Some((indicator, now + self.timers.feedback()));
    }

    fn base_indicator(&self) -> IndicatorState {
        if self.state.current().is_open() {
            if self.state.is_emergency() {
                IndicatorState::Emergency
            } else {
                IndicatorState::Granted
            }
        } else if self.log_degraded || self.store_fault {
            IndicatorState::Fault
        } else {
            IndicatorState::Idle
        }
    }

    fn refresh_indicator(&mut self, now: Timestamp) {
        let wanted = match self.feedback {
            Some((indicator, until)) if !now.has_reached(until) => indicator,
            _ => {
                self.feedback = None;
                self.base_indicator()
            }
        };
        if self.shown == Some(wanted) {
            return;
        }
        match self.profile.set_indicator(wanted) {
            Ok(()) => {
                debug!(indicator = %wanted, "Indicator changed");
                self.shown = Some(wanted);
            }
            Err(e) => warn!(indicator = %wanted, "Indicator update failed: {}", e),
        }
    }
}
