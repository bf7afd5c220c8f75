use slideshow_common::frame::VideoFrame;
use tracing::debug;

use super::state::SelectorError;

/// Frame duplication capability supplied by the host.
///
/// Releasing a frame is dropping it. Implementations only need to say how a
/// frame is copied and whether that copy can be allocated.
pub trait FrameAllocator {
    type Frame;

    /// Prepare per-instance resources. Called once when the selector opens.
    fn open(&mut self) -> Result<(), SelectorError> {
        Ok(())
    }

    /// Produce an independent copy of `frame`.
    fn clone_frame(&mut self, frame: &Self::Frame) -> Result<Self::Frame, SelectorError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Deep-copies [`VideoFrame`]s on the heap.
///
/// Buffers are reserved fallibly, so running out of memory shows up as
/// [`SelectorError::CloneFailure`] rather than an abort.
pub struct HeapAllocator {
    /// Size of the frames this instance will be asked to copy.
    frame_len: usize,
    /// Clones larger than this fail. `None` means unlimited.
    max_frame_bytes: Option<usize>,
    clones: u64,
}

impl HeapAllocator {
    pub fn new(frame_len: usize, max_frame_bytes: Option<usize>) -> Self {
        Self {
            frame_len,
            max_frame_bytes,
            clones: 0,
        }
    }

    /// Total successful clones so far.
    pub fn clones(&self) -> u64 {
        self.clones
    }

    fn check_limit(&self, len: usize) -> Result<(), String> {
        match self.max_frame_bytes {
            Some(max) if len > max => Err(format!("{len} bytes exceeds ceiling of {max}")),
            _ => Ok(()),
        }
    }
}

impl FrameAllocator for HeapAllocator {
    type Frame = VideoFrame;

    fn open(&mut self) -> Result<(), SelectorError> {
        // A ceiling below the stream's frame size would fail every clone.
        self.check_limit(self.frame_len)
            .map_err(SelectorError::Allocation)
    }

    fn clone_frame(&mut self, frame: &VideoFrame) -> Result<VideoFrame, SelectorError> {
        let len = frame.payload_size();
        self.check_limit(len).map_err(SelectorError::CloneFailure)?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| SelectorError::CloneFailure(e.to_string()))?;
        data.extend_from_slice(&frame.data);

        self.clones += 1;
        debug!(seq = frame.seq, bytes = data.len(), "cloned frame");

        Ok(VideoFrame {
            data,
            width: frame.width,
            height: frame.height,
            format: frame.format,
            pts_ms: frame.pts_ms,
            seq: frame.seq,
        })
    }

    fn name(&self) -> &str {
        "heap"
    }
}
