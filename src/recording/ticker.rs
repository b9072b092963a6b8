//! Elapsed-time ticker for the recorder readout.
//!
//! Runs only while a recording is in progress: once per second it recomputes
//! `now − start` and republishes the zero-padded "MM:SS" string. Stopping
//! resets the readout to "00:00" immediately, whatever the last tick showed.

use std::time::{Duration, Instant};

/// The readout shown while idle and immediately after stop.
pub const IDLE_DISPLAY: &str = "00:00";

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Formats an elapsed duration as "MM:SS".
///
/// Minutes and seconds are floored independently, so 1.9s reads "00:01" and
/// the minutes field keeps growing past 99.
pub fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    format!("{minutes:02}:{seconds:02}")
}

/// Periodic republisher of the elapsed-time readout.
#[derive(Debug)]
pub struct ElapsedTicker {
    next_tick: Option<Instant>,
    display: String,
}

impl ElapsedTicker {
    pub fn new() -> Self {
        Self {
            next_tick: None,
            display: IDLE_DISPLAY.to_string(),
        }
    }

    /// The current "MM:SS" readout.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Begins ticking; the first tick is due one period after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_tick = Some(now + TICK_PERIOD);
    }

    /// Cancels ticking and resets the readout to "00:00".
    pub fn reset(&mut self) {
        self.next_tick = None;
        self.display = IDLE_DISPLAY.to_string();
    }

    /// Fires at most one tick if one is due. Returns whether the readout was
    /// republished.
    ///
    /// An absent start instant is treated as "started just now" (elapsed 0)
    /// rather than faulting.
    pub fn poll(&mut self, started_at: Option<Instant>, now: Instant) -> bool {
        let Some(due) = self.next_tick else {
            return false;
        };
        if now < due {
            return false;
        }
        let elapsed = started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or(Duration::ZERO);
        self.display = format_elapsed(elapsed);
        // Snap forward after a stall so a long gap yields one tick, not a burst.
        let mut next = due + TICK_PERIOD;
        if next <= now {
            next = now + TICK_PERIOD;
        }
        self.next_tick = Some(next);
        true
    }
}

impl Default for ElapsedTicker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_floored_minutes_and_seconds() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00");
        assert_eq!(format_elapsed(Duration::from_millis(999)), "00:00");
        assert_eq!(format_elapsed(Duration::from_millis(1_900)), "00:01");
        assert_eq!(format_elapsed(Duration::from_secs(59)), "00:59");
        assert_eq!(format_elapsed(Duration::from_secs(60)), "01:00");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "02:05");
        assert_eq!(format_elapsed(Duration::from_secs(59 * 60 + 59)), "59:59");
        // The minutes field outgrows two digits rather than wrapping.
        assert_eq!(format_elapsed(Duration::from_secs(100 * 60 + 5)), "100:05");
    }

    #[test]
    fn does_not_tick_unless_started() {
        let mut ticker = ElapsedTicker::new();
        let now = Instant::now();
        assert!(!ticker.poll(None, now + Duration::from_secs(5)));
        assert_eq!(ticker.display(), IDLE_DISPLAY);
    }

    #[test]
    fn republishes_once_per_second() {
        let mut ticker = ElapsedTicker::new();
        let start = Instant::now();
        ticker.start(start);

        assert!(!ticker.poll(Some(start), start + Duration::from_millis(500)));

        assert!(ticker.poll(Some(start), start + Duration::from_millis(1_050)));
        assert_eq!(ticker.display(), "00:01");

        // Same second again: nothing due yet.
        assert!(!ticker.poll(Some(start), start + Duration::from_millis(1_200)));

        assert!(ticker.poll(Some(start), start + Duration::from_secs(62)));
        assert_eq!(ticker.display(), "01:02");
    }

    #[test]
    fn reset_cancels_ticking_and_zeroes_the_readout() {
        let mut ticker = ElapsedTicker::new();
        let start = Instant::now();
        ticker.start(start);
        ticker.poll(Some(start), start + Duration::from_secs(42));
        assert_ne!(ticker.display(), IDLE_DISPLAY);

        ticker.reset();
        assert_eq!(ticker.display(), IDLE_DISPLAY);
        assert!(!ticker.poll(Some(start), start + Duration::from_secs(60)));
    }

    #[test]
    fn absent_start_instant_reads_as_zero() {
        let mut ticker = ElapsedTicker::new();
        let start = Instant::now();
        ticker.start(start);
        assert!(ticker.poll(None, start + Duration::from_secs(3)));
        assert_eq!(ticker.display(), "00:00");
    }
}
