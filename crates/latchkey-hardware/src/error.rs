//! Error types for hardware operations.
//!
//! Covers line I/O faults, pin assignment problems and commands a profile
//! cannot perform.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while driving or reading hardware lines.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The active profile has no actuator for this command.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Reading or writing a line failed.
    #[error("Line fault on pin {pin}: {message}")]
    LineFault { pin: u8, message: String },

    /// The pin does not exist or is already claimed by another role.
    #[error("Pin {pin} unavailable: {reason}")]
    PinUnavailable { pin: u8, reason: String },

    /// Invalid profile configuration.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl HardwareError {
    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a new line fault error.
    pub fn line_fault(pin: u8, message: impl Into<String>) -> Self {
        Self::LineFault {
            pin,
            message: message.into(),
        }
    }

    /// Create a new pin unavailable error.
    pub fn pin_unavailable(pin: u8, reason: impl Into<String>) -> Self {
        Self::PinUnavailable {
            pin,
            reason: reason.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_error() {
        let error = HardwareError::unsupported("raise");
        assert!(matches!(error, HardwareError::Unsupported { .. }));
        assert_eq!(error.to_string(), "Unsupported operation: raise");
    }

    #[test]
    fn test_line_fault_error() {
        let error = HardwareError::line_fault(16, "write failed");
        assert_eq!(error.to_string(), "Line fault on pin 16: write failed");
    }

    #[test]
    fn test_pin_unavailable_error() {
        let error = HardwareError::pin_unavailable(4, "already claimed");
        assert!(matches!(error, HardwareError::PinUnavailable { pin: 4, .. }));
        assert_eq!(error.to_string(), "Pin 4 unavailable: already claimed");
    }

    #[test]
    fn test_configuration_error() {
        let error = HardwareError::configuration("pin 5 bound twice");
        assert_eq!(error.to_string(), "Configuration error: pin 5 bound twice");
    }
}
