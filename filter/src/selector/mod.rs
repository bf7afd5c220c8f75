pub mod alloc;
pub mod state;

pub use alloc::{FrameAllocator, HeapAllocator};
pub use state::{SelectorError, SelectorStats, SlideshowSelector};
