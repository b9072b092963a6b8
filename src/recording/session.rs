//! Recording session lifecycle.
//!
//! A session moves Idle → Recording → Idle. The flip back to Idle on stop is
//! synchronous and user-visible; finalization of the captured audio is not.
//! Between the stop signal and the finalize-complete notification the stopped
//! session lives on as a pending record that still accepts its own in-flight
//! fragments, so the concatenation at finalize time always sees the live,
//! up-to-date fragment sequence rather than a snapshot taken at stop.

use std::time::Instant;

/// One chunk of captured mono PCM, as delivered by the capture callback.
pub type Fragment = Vec<i16>;

/// Invalid lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// `start()` while a recording is already in progress.
    AlreadyRecording,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRecording => write!(f, "a recording is already in progress"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Whether a delivered fragment was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentOutcome {
    Accepted,
    /// Arrived after its session finalized (or carries an unknown session id).
    Late,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Recording { started_at: Instant },
}

/// A stopped session waiting for the capture side's finalize-complete
/// notification. Keeps accepting fragments that were emitted before the
/// finalize signal but are still in flight on the event channel.
#[derive(Debug)]
struct PendingFinalize {
    epoch: u64,
    fragments: Vec<Fragment>,
}

/// The recording lifecycle controller.
///
/// Each session is numbered by an epoch, and fragments carry the epoch of the
/// session they were captured in. That is what lets the controller tell a
/// current fragment from a late straggler of a finished session.
#[derive(Debug)]
pub struct RecordingSession {
    phase: Phase,
    epoch: u64,
    fragments: Vec<Fragment>,
    pending: Vec<PendingFinalize>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            epoch: 0,
            fragments: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.phase, Phase::Recording { .. })
    }

    /// Start instant of the current recording, if one is in progress.
    pub fn started_at(&self) -> Option<Instant> {
        match self.phase {
            Phase::Recording { started_at } => Some(started_at),
            Phase::Idle => None,
        }
    }

    /// The epoch the next session will get. Capture is acquired and tagged
    /// with this value before `start()` commits the transition, so a failed
    /// microphone request leaves the session untouched.
    pub fn next_epoch(&self) -> u64 {
        self.epoch + 1
    }

    /// Begins a new session: clears the fragment sequence, bumps the epoch
    /// and records the start instant. Valid only from Idle.
    pub fn start(&mut self, now: Instant) -> Result<u64, SessionError> {
        if self.is_recording() {
            return Err(SessionError::AlreadyRecording);
        }
        self.epoch += 1;
        self.fragments.clear();
        self.phase = Phase::Recording { started_at: now };
        tracing::debug!("Recording session {} started", self.epoch);
        Ok(self.epoch)
    }

    /// Stops the current session. The visible state change is immediate: the
    /// phase flips to Idle before this returns. The fragment sequence moves
    /// into a pending record that waits for finalize-complete.
    ///
    /// Returns the stopped session's epoch, or `None` when already Idle
    /// (stop while Idle is a no-op).
    pub fn stop(&mut self) -> Option<u64> {
        if !self.is_recording() {
            return None;
        }
        self.phase = Phase::Idle;
        self.pending.push(PendingFinalize {
            epoch: self.epoch,
            fragments: std::mem::take(&mut self.fragments),
        });
        tracing::debug!("Recording session {} stopped, awaiting finalize", self.epoch);
        Some(self.epoch)
    }

    /// Appends one fragment in arrival order.
    ///
    /// Kept when the epoch names the current recording or a session still
    /// awaiting finalize; anything else is late and dropped.
    pub fn push_fragment(&mut self, epoch: u64, fragment: Fragment) -> FragmentOutcome {
        if self.is_recording() && epoch == self.epoch {
            self.fragments.push(fragment);
            return FragmentOutcome::Accepted;
        }
        if let Some(pending) = self.pending.iter_mut().find(|p| p.epoch == epoch) {
            pending.fragments.push(fragment);
            return FragmentOutcome::Accepted;
        }
        FragmentOutcome::Late
    }

    /// Consumes the pending record for `epoch`, yielding its fragments in
    /// arrival order. Yields at most once per stopped session; a second call
    /// for the same epoch returns `None`.
    pub fn finalize_complete(&mut self, epoch: u64) -> Option<Vec<Fragment>> {
        let index = self.pending.iter().position(|p| p.epoch == epoch)?;
        let pending = self.pending.remove(index);
        tracing::debug!(
            "Recording session {} finalized with {} fragments",
            epoch,
            pending.fragments.len()
        );
        Some(pending.fragments)
    }

    /// True while any stopped session still awaits finalize-complete.
    pub fn has_pending_finalize(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(byte: i16) -> Fragment {
        vec![byte; 4]
    }

    #[test]
    fn starts_idle_with_no_start_instant() {
        let session = RecordingSession::new();
        assert!(!session.is_recording());
        assert!(session.started_at().is_none());
        assert!(!session.has_pending_finalize());
    }

    #[test]
    fn start_records_instant_and_epoch() {
        let mut session = RecordingSession::new();
        let now = Instant::now();
        let epoch = session.start(now).unwrap();
        assert_eq!(epoch, 1);
        assert!(session.is_recording());
        assert_eq!(session.started_at(), Some(now));
    }

    #[test]
    fn start_while_recording_is_rejected_without_resetting_fragments() {
        let mut session = RecordingSession::new();
        let epoch = session.start(Instant::now()).unwrap();
        session.push_fragment(epoch, frag(1));

        assert_eq!(
            session.start(Instant::now()),
            Err(SessionError::AlreadyRecording)
        );

        // The in-progress session is untouched.
        session.stop();
        let fragments = session.finalize_complete(epoch).unwrap();
        assert_eq!(fragments, vec![frag(1)]);
    }

    #[test]
    fn stop_while_idle_is_a_noop() {
        let mut session = RecordingSession::new();
        assert_eq!(session.stop(), None);
        assert!(!session.has_pending_finalize());
    }

    #[test]
    fn stop_flips_to_idle_immediately() {
        let mut session = RecordingSession::new();
        session.start(Instant::now()).unwrap();
        let epoch = session.stop().unwrap();
        // Visible state changes before finalize-complete ever arrives.
        assert!(!session.is_recording());
        assert!(session.started_at().is_none());
        assert_eq!(epoch, 1);
        assert!(session.has_pending_finalize());
    }

    #[test]
    fn finalize_yields_fragments_in_arrival_order_exactly_once() {
        let mut session = RecordingSession::new();
        let epoch = session.start(Instant::now()).unwrap();
        session.push_fragment(epoch, frag(1));
        session.push_fragment(epoch, frag(2));
        session.push_fragment(epoch, frag(3));
        session.stop();

        let fragments = session.finalize_complete(epoch).unwrap();
        assert_eq!(fragments, vec![frag(1), frag(2), frag(3)]);

        // Exactly one FinalRecording per stop.
        assert_eq!(session.finalize_complete(epoch), None);
        assert!(!session.has_pending_finalize());
    }

    #[test]
    fn in_flight_fragments_after_stop_are_still_included() {
        // Capture stop is asynchronous: fragments emitted before the finalize
        // signal may be delivered after stop() has already returned.
        let mut session = RecordingSession::new();
        let epoch = session.start(Instant::now()).unwrap();
        session.push_fragment(epoch, frag(1));
        session.stop();

        assert_eq!(session.push_fragment(epoch, frag(2)), FragmentOutcome::Accepted);

        let fragments = session.finalize_complete(epoch).unwrap();
        assert_eq!(fragments, vec![frag(1), frag(2)]);
    }

    #[test]
    fn fragments_after_finalize_complete_are_late() {
        let mut session = RecordingSession::new();
        let epoch = session.start(Instant::now()).unwrap();
        session.stop();
        session.finalize_complete(epoch).unwrap();

        assert_eq!(session.push_fragment(epoch, frag(9)), FragmentOutcome::Late);
    }

    #[test]
    fn fragments_with_unknown_epoch_are_late() {
        let mut session = RecordingSession::new();
        let epoch = session.start(Instant::now()).unwrap();
        assert_eq!(session.push_fragment(epoch + 7, frag(9)), FragmentOutcome::Late);
        session.stop();
        let fragments = session.finalize_complete(epoch).unwrap();
        assert!(fragments.is_empty());
    }

    #[test]
    fn new_session_does_not_bleed_into_a_pending_finalize() {
        let mut session = RecordingSession::new();
        let first = session.start(Instant::now()).unwrap();
        session.push_fragment(first, frag(1));
        session.stop();

        // Restart before the first session's finalize-complete arrives.
        let second = session.start(Instant::now()).unwrap();
        assert_ne!(first, second);
        session.push_fragment(second, frag(2));

        // Stragglers of the first session still land in its pending record.
        session.push_fragment(first, frag(3));

        assert_eq!(session.finalize_complete(first).unwrap(), vec![frag(1), frag(3)]);

        session.stop();
        assert_eq!(session.finalize_complete(second).unwrap(), vec![frag(2)]);
    }

    #[test]
    fn start_clears_fragments_of_the_previous_session() {
        let mut session = RecordingSession::new();
        let first = session.start(Instant::now()).unwrap();
        session.push_fragment(first, frag(1));
        session.stop();
        session.finalize_complete(first).unwrap();

        let second = session.start(Instant::now()).unwrap();
        session.stop();
        let fragments = session.finalize_complete(second).unwrap();
        assert!(fragments.is_empty());
    }
}
