use crate::frame::FrameInfo;

/// Frame clock - yields one [`FrameInfo`] per rendered frame.
///
/// Sources are infinite; `next()` returning `None` ends the render loop.
pub trait FrameSource: Iterator<Item = FrameInfo> {
    /// Delta of the most recently yielded frame, in seconds
    fn delta_time(&self) -> f32;

    /// Number of frames yielded so far
    fn frame_count(&self) -> u64;
}
