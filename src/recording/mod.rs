//! Recorder widget internals.
//!
//! The lifecycle controller, elapsed-time ticker, capture primitive, final
//! recording assembly and the terminal presentation surface.

pub mod blob;
pub mod capture;
pub mod session;
pub mod ticker;
pub mod ui;

pub use blob::BlobStore;
pub use capture::{CaptureEvent, MicCapture};
pub use session::{FragmentOutcome, RecordingSession};
pub use ticker::ElapsedTicker;
pub use ui::{RecorderTui, WidgetCommand};
