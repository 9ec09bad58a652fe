//! Role-bound lines: a raw line plus its polarity.

use crate::Result;
use crate::config::PinBinding;
use crate::debounce::Debouncer;
use crate::traits::{InputLine, LineProvider, OutputLine};
use crate::types::Level;
use latchkey_core::Timestamp;
use std::time::Duration;
use tracing::trace;

/// An output line that speaks "asserted" rather than high/low.
#[derive(Debug)]
pub struct BoundOutput {
    role: &'static str,
    binding: PinBinding,
    line: Box<dyn OutputLine>,
    asserted: bool,
}

impl BoundOutput {
    /// Claim the pin and drive it deasserted.
    pub fn claim<P: LineProvider + ?Sized>(
        provider: &mut P,
        role: &'static str,
        binding: PinBinding,
    ) -> Result<Self> {
        let mut output = Self {
            role,
            binding,
            line: provider.output(binding.pin)?,
            asserted: false,
        };
        output.set(false)?;
        Ok(output)
    }

    pub fn set(&mut self, asserted: bool) -> Result<()> {
        let level = Level::from(asserted != self.binding.active_low);
        trace!(role = self.role, pin = self.binding.pin, ?level, "Driving output");
        self.line.set(level)?;
        self.asserted = asserted;
        Ok(())
    }

    /// Write only if the requested state differs from the last write.
    pub fn set_if_changed(&mut self, asserted: bool) -> Result<()> {
        if asserted == self.asserted {
            return Ok(());
        }
        self.set(asserted)
    }

    #[must_use]
    pub fn is_asserted(&self) -> bool {
        self.asserted
    }
}

/// A debounced input line.
#[derive(Debug)]
pub struct BoundInput {
    binding: PinBinding,
    line: Box<dyn InputLine>,
    debouncer: Debouncer,
}

impl BoundInput {
    pub fn claim<P: LineProvider + ?Sized>(
        provider: &mut P,
        binding: PinBinding,
        debounce: Duration,
    ) -> Result<Self> {
        Ok(Self {
            binding,
            line: provider.input(binding.pin)?,
            debouncer: Debouncer::new(debounce),
        })
    }

    /// Sample the line. Returns the new debounced state on a change.
    pub fn sample(&mut self, now: Timestamp) -> Result<Option<bool>> {
        let raw = self.line.read()?.is_high() != self.binding.active_low;
        Ok(self.debouncer.update(raw, now))
    }

    #[must_use]
    pub fn is_asserted(&self) -> bool {
        self.debouncer.is_asserted()
    }
}
