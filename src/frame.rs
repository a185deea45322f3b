use std::time::Instant;

use crate::traits::FrameSource;

/// Frame metadata - carries frame number and timing info
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub number: u64,
    pub time: f32,
    pub delta: f32,
}

impl FrameInfo {
    pub fn new(number: u64, time: f32, delta: f32) -> Self {
        Self { number, time, delta }
    }
}

/// Wall-clock frame source.
/// Each `next()` measures the time since the previous frame.
pub struct FrameIterator {
    frame_number: u64,
    start_time: Instant,
    last_frame_time: Instant,
    last_delta: f32,
}

impl FrameIterator {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            frame_number: 0,
            start_time: now,
            last_frame_time: now,
            last_delta: 0.0,
        }
    }

    pub fn time(&self) -> f32 {
        self.start_time.elapsed().as_secs_f32()
    }

    /// Restart delta measurement from now, e.g. after a long blocking load
    pub fn reset(&mut self) {
        self.last_frame_time = Instant::now();
    }
}

impl Default for FrameIterator {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for FrameIterator {
    type Item = FrameInfo;

    fn next(&mut self) -> Option<FrameInfo> {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time).as_secs_f32();
        let time = now.duration_since(self.start_time).as_secs_f32();

        let info = FrameInfo::new(self.frame_number, time, delta);

        self.frame_number += 1;
        self.last_frame_time = now;
        self.last_delta = delta;

        Some(info)
    }
}

impl FrameSource for FrameIterator {
    fn delta_time(&self) -> f32 {
        self.last_delta
    }

    fn frame_count(&self) -> u64 {
        self.frame_number
    }
}

/// Deterministic frame source with a constant delta.
/// Used for headless replay and tests.
#[derive(Debug, Clone)]
pub struct FixedFrames {
    delta: f32,
    frame_number: u64,
}

impl FixedFrames {
    pub fn new(delta: f32) -> Self {
        Self { delta, frame_number: 0 }
    }

    pub fn at_hz(hz: f32) -> Self {
        Self::new(1.0 / hz)
    }
}

impl Iterator for FixedFrames {
    type Item = FrameInfo;

    fn next(&mut self) -> Option<FrameInfo> {
        let info = FrameInfo::new(
            self.frame_number,
            self.frame_number as f32 * self.delta,
            self.delta,
        );
        self.frame_number += 1;
        Some(info)
    }
}

impl FrameSource for FixedFrames {
    fn delta_time(&self) -> f32 {
        self.delta
    }

    fn frame_count(&self) -> u64 {
        self.frame_number
    }
}

/// Frame source that yields a recorded sequence of deltas, then ends.
/// Drives replays so every step sees the delta it had live.
#[derive(Debug, Clone)]
pub struct RecordedFrames {
    deltas: Vec<f32>,
    frame_number: u64,
    time: f32,
}

impl RecordedFrames {
    pub fn new(deltas: Vec<f32>) -> Self {
        Self {
            deltas,
            frame_number: 0,
            time: 0.0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.deltas.len().saturating_sub(self.frame_number as usize)
    }
}

impl Iterator for RecordedFrames {
    type Item = FrameInfo;

    fn next(&mut self) -> Option<FrameInfo> {
        let delta = *self.deltas.get(self.frame_number as usize)?;
        let info = FrameInfo::new(self.frame_number, self.time, delta);
        self.frame_number += 1;
        self.time += delta;
        Some(info)
    }
}

impl FrameSource for RecordedFrames {
    fn delta_time(&self) -> f32 {
        match self.frame_number {
            0 => 0.0,
            n => self.deltas[n as usize - 1],
        }
    }

    fn frame_count(&self) -> u64 {
        self.frame_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn frame_iterator_measures_delta() {
        let mut frames = FrameIterator::new();

        thread::sleep(Duration::from_millis(10));
        let frame = frames.next().unwrap();

        assert_eq!(frame.number, 0);
        assert!(frame.delta >= 0.009 && frame.delta <= 0.050);
        assert_eq!(frames.frame_count(), 1);
        assert_eq!(frames.delta_time(), frame.delta);
    }

    #[test]
    fn frame_iterator_reset() {
        let mut frames = FrameIterator::new();

        thread::sleep(Duration::from_millis(10));
        frames.reset();

        let frame = frames.next().unwrap();
        assert!(frame.delta < 0.005);
    }

    #[test]
    fn fixed_frames_are_constant() {
        let frames: Vec<_> = FixedFrames::at_hz(50.0).take(3).collect();
        assert_eq!(frames.len(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.number, i as u64);
            assert!((frame.delta - 0.02).abs() < 1e-7);
        }
        assert!((frames[2].time - 0.04).abs() < 1e-6);
    }

    #[test]
    fn recorded_frames_replay_deltas_then_end() {
        let mut frames = RecordedFrames::new(vec![0.01, 0.03, 0.02]);
        assert_eq!(frames.delta_time(), 0.0);

        let deltas: Vec<f32> = frames.by_ref().map(|f| f.delta).collect();
        assert_eq!(deltas, vec![0.01, 0.03, 0.02]);
        assert_eq!(frames.frame_count(), 3);
        assert_eq!(frames.delta_time(), 0.02);
        assert_eq!(frames.remaining(), 0);
        assert_eq!(frames.next(), None);
    }
}
