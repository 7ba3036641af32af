//! Data model of the recording/decoder boundary.
//!
//! A file-format decoder (ABF or otherwise) produces [`Sweep`] records and
//! file-level metadata through the [`RecordingSource`] trait. The analysis
//! engine consumes only these decoded arrays and never touches a file layout.

pub mod source;
pub mod sweep;

pub use source::{RecordingError, RecordingSource, SyntheticRecording};
pub use sweep::{ChannelInfo, ProtocolInfo, Sweep};
