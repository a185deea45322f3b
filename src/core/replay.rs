//! Input recording and deterministic replay.
//!
//! A recording captures the starting [`VehicleState`], the tuning in effect
//! and, for every integration step, the [`ControlInput`] together with the
//! frame delta it was stepped with. Replaying the pairs reproduces the
//! recorded trajectory exactly, in both step modes.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::TuningConstants;
use crate::frame::RecordedFrames;

use super::controller::ControlInput;
use super::integrator::MotionIntegrator;
use super::vehicle::VehicleState;

/// One integration step as it happened live
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub input: ControlInput,
    /// Seconds the step covered
    pub delta: f32,
}

/// Serialized input log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRecording {
    pub initial: VehicleState,
    pub tuning: TuningConstants,
    pub frames: Vec<RecordedFrame>,
}

impl InputRecording {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// States after each recorded frame, stepping with the recorded deltas
    pub fn replay(&self) -> Vec<VehicleState> {
        let integrator = MotionIntegrator::new(self.tuning);
        self.frames
            .iter()
            .scan(self.initial, |state, frame| {
                integrator.step(state, &frame.input, frame.delta);
                Some(*state)
            })
            .collect()
    }

    /// Final state after replaying every frame
    pub fn final_state(&self) -> VehicleState {
        self.replay().last().copied().unwrap_or(self.initial)
    }

    /// Frame clock yielding the recorded deltas, ending with the recording
    pub fn frame_source(&self) -> RecordedFrames {
        RecordedFrames::new(self.frames.iter().map(|f| f.delta).collect())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string(self).context("Failed to serialize input recording")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write input recording: {:?}", path))
    }

    /// Load a recording and validate its tuning and start state
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input recording: {:?}", path))?;
        let recording: InputRecording = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse input recording: {:?}", path))?;
        recording.tuning.validate()?;
        recording
            .tuning
            .validate_state(&recording.initial)
            .with_context(|| format!("Invalid start state in recording: {:?}", path))?;
        Ok(recording)
    }
}

/// Accumulates per-frame input while the loop runs
#[derive(Debug, Clone)]
pub struct InputRecorder {
    recording: InputRecording,
}

impl InputRecorder {
    pub fn new(initial: VehicleState, tuning: TuningConstants) -> Self {
        Self {
            recording: InputRecording {
                initial,
                tuning,
                frames: Vec::new(),
            },
        }
    }

    pub fn record(&mut self, input: ControlInput, delta: f32) {
        self.recording.frames.push(RecordedFrame { input, delta });
    }

    pub fn frame_count(&self) -> usize {
        self.recording.frames.len()
    }

    pub fn finish(self) -> InputRecording {
        self.recording
    }
}

/// Input source that plays back a recording one frame at a time
#[derive(Debug, Clone)]
pub struct InputPlayback {
    frames: Vec<ControlInput>,
    cursor: usize,
}

impl InputPlayback {
    pub fn new(recording: &InputRecording) -> Self {
        Self {
            frames: recording.frames.iter().map(|f| f.input).collect(),
            cursor: 0,
        }
    }

    /// Input for the next frame; `None` once the recording is exhausted
    pub fn next_input(&mut self) -> Option<ControlInput> {
        let input = self.frames.get(self.cursor).copied();
        if input.is_some() {
            self.cursor += 1;
        }
        input
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.frames.len()
    }
}
