pub mod cues;
pub mod hold;
pub mod traits;

pub use cues::CueSignal;
pub use hold::MaxHold;
pub use traits::SubtitleSignal;
