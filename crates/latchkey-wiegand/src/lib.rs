//! Wiegand reader input for the latchkey controller.
//!
//! A Wiegand reader transmits a credential as a burst of short low pulses on
//! two data lines: a pulse on DATA0 is a `0` bit, a pulse on DATA1 is a `1`.
//! There is no clock and no length prefix, so a frame ends when both lines
//! have been quiet for a few milliseconds.
//!
//! # Pipeline
//!
//! ```text
//! ┌────────────┐ push  ┌──────────────┐ drain ┌────────────────┐ next_result ┌────────────┐
//! │ line IRQs  │──────►│ edge queue   │──────►│ WiegandDecoder │────────────►│ controller │
//! │ (stamp)    │       │ (SPSC, lock- │       │ (frame + parity│             │            │
//! └────────────┘       │  free ring)  │       │  validation)   │             └────────────┘
//!                      └──────────────┘       └────────────────┘
//! ```
//!
//! Interrupt handlers do nothing but stamp the edge and push it into the
//! [`queue`]; frame assembly and parity checking run on the main loop in
//! [`WiegandDecoder`].
//!
//! # Formats
//!
//! [`WiegandFormat::Wiegand26`] (24 data bits) and [`WiegandFormat::Wiegand34`]
//! (32 data bits) are supported. Both carry a leading even-parity bit over
//! the first half of the data and a trailing odd-parity bit over the second
//! half. A frame whose parity does not check out is reported as a
//! [`DecodeError`], never as a credential.
//!
//! # Examples
//!
//! ```
//! use latchkey_core::{CredentialId, Timestamp};
//! use latchkey_wiegand::{WiegandConfig, WiegandDecoder, WiegandFormat, frame_edges};
//! use std::time::Duration;
//!
//! let mut decoder = WiegandDecoder::new(WiegandConfig::default());
//!
//! let lines = WiegandFormat::Wiegand26.encode(CredentialId::new(0xABCDE1)).unwrap();
//! for edge in frame_edges(&lines, Timestamp::ZERO, Duration::from_millis(2)) {
//!     decoder.feed(edge);
//! }
//!
//! // Nothing until the lines have been idle for the inter-bit timeout.
//! decoder.poll(Timestamp::from_millis(100));
//! let read = decoder.next_result().unwrap().unwrap();
//! assert_eq!(read.id, CredentialId::new(0xABCDE1));
//! ```

pub mod decoder;
pub mod edge;
pub mod error;
pub mod format;
pub mod frame;
pub mod queue;

pub use decoder::{CredentialRead, DecodeResult, DecoderStats, WiegandConfig, WiegandDecoder};
pub use edge::{DataLine, Edge, frame_edges};
pub use error::{DecodeError, ParityHalf};
pub use format::WiegandFormat;
pub use frame::WiegandFrame;
pub use queue::{EdgeReceiver, EdgeSender, channel};
