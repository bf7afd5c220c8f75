pub mod config;
pub mod cue;
pub mod frame;
