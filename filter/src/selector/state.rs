use tracing::{debug, info, warn};

use super::alloc::FrameAllocator;

#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error("failed to allocate selector state: {0}")]
    Allocation(String),
    #[error("failed to clone frame: {0}")]
    CloneFailure(String),
}

/// Whether the selector currently holds an anchor frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    /// No subtitle event seen yet. Input frames pass straight through.
    Empty,
    /// An anchor is held and substituted for every input frame.
    Holding,
}

/// Running counters, for the end-of-stream summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectorStats {
    /// Ticks that carried an input frame.
    pub frames: u64,
    pub passed_through: u64,
    /// Ticks answered with a copy of the anchor.
    pub held: u64,
    /// Ticks whose subtitle signal replaced the anchor.
    pub events: u64,
    pub clone_failures: u64,
}

/// Turns a video stream into a slideshow by freezing on the frame where each
/// new subtitle appears.
///
/// Until the first subtitle event, frames pass through untouched. From then
/// on every output is a copy of the anchor frame, which is replaced by a copy
/// of the current input each time the subtitle signal fires.
pub struct SlideshowSelector<A: FrameAllocator> {
    anchor: Option<A::Frame>,
    allocator: A,
    stats: SelectorStats,
}

impl<A: FrameAllocator> SlideshowSelector<A> {
    /// Prepare a selector instance. On error the instance must not be used.
    pub fn open(mut allocator: A) -> Result<Self, SelectorError> {
        allocator.open()?;
        info!(allocator = allocator.name(), "slideshow selector opened");
        Ok(Self {
            anchor: None,
            allocator,
            stats: SelectorStats::default(),
        })
    }

    /// Select the output for one tick.
    ///
    /// `subtitle_events` is the number of new subtitle events at this tick.
    /// An absent input yields an absent output and leaves the anchor alone.
    /// On [`SelectorError::CloneFailure`] the anchor is unchanged and this
    /// tick has no output; the selector stays usable.
    pub fn process(
        &mut self,
        input: Option<A::Frame>,
        subtitle_events: u32,
    ) -> Result<Option<A::Frame>, SelectorError> {
        let Some(input) = input else {
            debug!(subtitle_events, "no input frame, nothing to select");
            return Ok(None);
        };
        self.stats.frames += 1;

        match self.select(input, subtitle_events) {
            Ok(output) => Ok(Some(output)),
            Err(e) => {
                self.stats.clone_failures += 1;
                warn!(error = %e, frame = self.stats.frames, "dropping output for this tick");
                Err(e)
            }
        }
    }

    fn select(&mut self, input: A::Frame, subtitle_events: u32) -> Result<A::Frame, SelectorError> {
        if subtitle_events > 0 {
            // Both copies are made before the anchor is touched.
            let fresh = self.allocator.clone_frame(&input)?;
            let output = self.allocator.clone_frame(&fresh)?;
            let was_holding = self.anchor.replace(fresh).is_some();
            self.stats.events += 1;
            self.stats.held += 1;
            info!(
                subtitle_events,
                frame = self.stats.frames,
                replaced = was_holding,
                "new subtitle, anchoring current frame"
            );
            return Ok(output);
        }

        match &self.anchor {
            Some(anchor) => {
                let output = self.allocator.clone_frame(anchor)?;
                self.stats.held += 1;
                debug!(frame = self.stats.frames, "holding anchor frame");
                Ok(output)
            }
            None => {
                self.stats.passed_through += 1;
                debug!(frame = self.stats.frames, "no anchor yet, passing frame through");
                Ok(input)
            }
        }
    }

    /// Release the anchor. Safe to call more than once.
    pub fn close(&mut self) {
        if self.anchor.take().is_some() {
            info!(
                frames = self.stats.frames,
                events = self.stats.events,
                "slideshow selector closed, anchor released"
            );
        } else {
            debug!("slideshow selector closed with no anchor held");
        }
    }

    pub fn state(&self) -> SelectorState {
        if self.anchor.is_some() {
            SelectorState::Holding
        } else {
            SelectorState::Empty
        }
    }

    pub fn anchor(&self) -> Option<&A::Frame> {
        self.anchor.as_ref()
    }

    pub fn stats(&self) -> SelectorStats {
        self.stats
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }
}
