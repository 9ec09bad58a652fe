use crate::{
    Result,
    constants::{CREDENTIAL_DISPLAY_DIGITS, MAX_LABEL_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credential identifier decoded from a Wiegand frame.
///
/// The value is the data portion of the frame with the parity bits
/// stripped: 24 bits for the 26-bit format, 32 bits for the 34-bit format.
///
/// # Examples
///
/// ```
/// use latchkey_core::CredentialId;
///
/// let id: CredentialId = "0xABCDE1".parse().unwrap();
/// assert_eq!(id.as_u32(), 0xABCDE1);
/// assert_eq!(id.to_string(), "0xABCDE1");
///
/// let id: CredentialId = "42".parse().unwrap();
/// assert_eq!(id.to_string(), "0x00002A");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(u32);

impl CredentialId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        CredentialId(id)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl From<u32> for CredentialId {
    fn from(id: u32) -> Self {
        CredentialId(id)
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:0width$X}", self.0, width = CREDENTIAL_DISPLAY_DIGITS)
    }
}

impl std::str::FromStr for CredentialId {
    type Err = Error;

    /// Parse decimal (`11259361`) or `0x`-prefixed hex (`0xABCDE1`).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => s.parse::<u32>(),
        };
        parsed
            .map(CredentialId)
            .map_err(|_| Error::InvalidCredential(format!("Invalid credential id: {s}")))
    }
}

/// An authorized credential and its metadata.
///
/// Only `enabled` may change once a credential is stored; relabelling is an
/// upsert of a new record with the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    id: CredentialId,
    label: Option<String>,
    enabled: bool,
}

impl Credential {
    /// Create an enabled credential with no label.
    #[must_use]
    pub fn new(id: CredentialId) -> Self {
        Self {
            id,
            label: None,
            enabled: true,
        }
    }

    /// Attach a display label.
    ///
    /// The label is trimmed; an empty label means "no label".
    ///
    /// # Errors
    /// Returns `Error::InvalidCredential` if the trimmed label is longer than
    /// [`MAX_LABEL_LENGTH`] bytes.
    pub fn with_label(mut self, label: impl AsRef<str>) -> Result<Self> {
        let label = label.as_ref().trim();
        if label.len() > MAX_LABEL_LENGTH {
            return Err(Error::InvalidCredential(format!(
                "Label must be at most {MAX_LABEL_LENGTH} bytes, got {}",
                label.len()
            )));
        }
        self.label = (!label.is_empty()).then(|| label.to_string());
        Ok(self)
    }

    /// Set the enabled flag.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn id(&self) -> CredentialId {
        self.id
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(label) = &self.label {
            write!(f, " ({label})")?;
        }
        if !self.enabled {
            write!(f, " [disabled]")?;
        }
        Ok(())
    }
}

/// Outcome of looking a credential up in the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Authorization {
    /// Known and enabled.
    Granted,
    /// Known but disabled.
    Disabled,
    /// Not in the store.
    Unknown,
}

impl Authorization {
    /// Returns `true` only for [`Authorization::Granted`].
    #[inline]
    #[must_use]
    pub fn is_granted(self) -> bool {
        matches!(self, Authorization::Granted)
    }
}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Authorization::Granted => write!(f, "granted"),
            Authorization::Disabled => write!(f, "disabled"),
            Authorization::Unknown => write!(f, "unknown"),
        }
    }
}
