use slideshow_common::cue::Cue;
use tracing::debug;

use super::traits::SubtitleSignal;

/// Fires once for each subtitle cue, at the first tick whose timestamp
/// reaches the cue's (offset) start time.
pub struct CueSignal {
    /// Cue start times with the dialogue offset applied, ascending.
    starts: Vec<i64>,
    /// Index of the first start not yet reported.
    next: usize,
}

impl CueSignal {
    pub fn new(cues: &[Cue], dialogue_offset_ms: i64) -> Self {
        let mut starts: Vec<i64> = cues
            .iter()
            .map(|c| c.start_ms.saturating_add(dialogue_offset_ms))
            .collect();
        starts.sort_unstable();
        Self { starts, next: 0 }
    }

    /// Cues not yet reported.
    pub fn remaining(&self) -> usize {
        self.starts.len() - self.next
    }
}

impl SubtitleSignal for CueSignal {
    fn events_at(&mut self, pts_ms: i64) -> u32 {
        let pending = &self.starts[self.next..];
        let due = pending.partition_point(|&start| start <= pts_ms);
        self.next += due;
        if due > 0 {
            debug!(pts_ms, due, remaining = self.remaining(), "subtitle cues reached");
        }
        u32::try_from(due).unwrap_or(u32::MAX)
    }

    fn name(&self) -> &str {
        "webvtt-cues"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(start_ms: i64) -> Cue {
        Cue {
            start_ms,
            end_ms: start_ms + 1000,
            text: String::new(),
        }
    }

    #[test]
    fn fires_once_per_cue() {
        let mut signal = CueSignal::new(&[cue(100), cue(200)], 0);
        assert_eq!(signal.events_at(0), 0);
        assert_eq!(signal.events_at(99), 0);
        assert_eq!(signal.events_at(100), 1);
        assert_eq!(signal.events_at(150), 0);
        assert_eq!(signal.events_at(240), 1);
        assert_eq!(signal.events_at(300), 0);
        assert_eq!(signal.remaining(), 0);
    }

    #[test]
    fn cues_between_ticks_are_counted_together() {
        let mut signal = CueSignal::new(&[cue(10), cue(20), cue(30)], 0);
        assert_eq!(signal.events_at(40), 3);
    }

    #[test]
    fn cue_at_zero_fires_on_first_frame() {
        let mut signal = CueSignal::new(&[cue(0)], 0);
        assert_eq!(signal.events_at(0), 1);
    }

    #[test]
    fn unsorted_cues_are_ordered() {
        let mut signal = CueSignal::new(&[cue(500), cue(100)], 0);
        assert_eq!(signal.events_at(100), 1);
        assert_eq!(signal.events_at(500), 1);
    }

    #[test]
    fn dialogue_offset_shifts_starts() {
        let mut signal = CueSignal::new(&[cue(1000)], 250);
        assert_eq!(signal.events_at(1000), 0);
        assert_eq!(signal.events_at(1250), 1);

        let mut early = CueSignal::new(&[cue(1000)], -500);
        assert_eq!(early.events_at(500), 1);
    }

    #[test]
    fn going_backwards_does_not_refire() {
        let mut signal = CueSignal::new(&[cue(100)], 0);
        assert_eq!(signal.events_at(200), 1);
        assert_eq!(signal.events_at(50), 0);
        assert_eq!(signal.events_at(200), 0);
    }

    #[test]
    fn no_cues_never_fires() {
        let mut signal = CueSignal::new(&[], 0);
        assert_eq!(signal.events_at(i64::MAX), 0);
    }
}
