use tracing::debug;

use super::traits::SubtitleSignal;

/// Caps how long one frame is held: once `max_hold_ms` has passed since the
/// last event, emits an extra event so the current frame is anchored again.
///
/// Nothing is emitted before the inner signal's first event, so the stream
/// still passes through untouched until the first subtitle.
pub struct MaxHold<S> {
    inner: S,
    max_hold_ms: Option<u64>,
    last_event_ms: Option<i64>,
}

impl<S: SubtitleSignal> MaxHold<S> {
    /// `None` disables the cap and forwards the inner signal unchanged.
    pub fn new(inner: S, max_hold_ms: Option<u64>) -> Self {
        Self {
            inner,
            max_hold_ms,
            last_event_ms: None,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn hold_expired(&self, pts_ms: i64) -> bool {
        match (self.max_hold_ms, self.last_event_ms) {
            (Some(max), Some(last)) => {
                let held = pts_ms.saturating_sub(last);
                held >= 0 && held as u64 >= max
            }
            _ => false,
        }
    }
}

impl<S: SubtitleSignal> SubtitleSignal for MaxHold<S> {
    fn events_at(&mut self, pts_ms: i64) -> u32 {
        let events = self.inner.events_at(pts_ms);
        if events > 0 {
            self.last_event_ms = Some(pts_ms);
            return events;
        }
        if self.hold_expired(pts_ms) {
            debug!(pts_ms, last_event_ms = ?self.last_event_ms, "hold limit reached, re-anchoring");
            self.last_event_ms = Some(pts_ms);
            return 1;
        }
        0
    }

    fn name(&self) -> &str {
        if self.max_hold_ms.is_some() {
            "max-hold"
        } else {
            self.inner.name()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::CueSignal;
    use slideshow_common::cue::Cue;

    fn cues(starts: &[i64]) -> CueSignal {
        let cues: Vec<Cue> = starts
            .iter()
            .map(|&start_ms| Cue {
                start_ms,
                end_ms: start_ms + 500,
                text: String::new(),
            })
            .collect();
        CueSignal::new(&cues, 0)
    }

    #[test]
    fn long_hold_is_split() {
        let mut signal = MaxHold::new(cues(&[1000]), Some(3000));
        assert_eq!(signal.events_at(0), 0);
        assert_eq!(signal.events_at(1000), 1);
        assert_eq!(signal.events_at(3999), 0);
        assert_eq!(signal.events_at(4000), 1);
        assert_eq!(signal.events_at(6000), 0);
        assert_eq!(signal.events_at(7000), 1);
    }

    #[test]
    fn cue_resets_hold_timer() {
        let mut signal = MaxHold::new(cues(&[0, 2000]), Some(3000));
        assert_eq!(signal.events_at(0), 1);
        assert_eq!(signal.events_at(2000), 1);
        assert_eq!(signal.events_at(4500), 0);
        assert_eq!(signal.events_at(5000), 1);
    }

    #[test]
    fn nothing_before_first_cue() {
        let mut signal = MaxHold::new(cues(&[10_000]), Some(1000));
        assert_eq!(signal.events_at(0), 0);
        assert_eq!(signal.events_at(5000), 0);
        assert_eq!(signal.events_at(9999), 0);
    }

    #[test]
    fn disabled_forwards_inner() {
        let mut signal = MaxHold::new(cues(&[100]), None);
        assert_eq!(signal.events_at(100), 1);
        assert_eq!(signal.events_at(1_000_000), 0);
        assert_eq!(signal.name(), "webvtt-cues");
        assert_eq!(signal.inner().remaining(), 0);
    }
}
