/// Source of the per-tick subtitle signal.
///
/// Implementations report how many new subtitle events begin at or before
/// the given presentation time that have not been reported yet.
pub trait SubtitleSignal {
    /// Number of new subtitle events at this tick. Zero means no new text.
    fn events_at(&mut self, pts_ms: i64) -> u32;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}
