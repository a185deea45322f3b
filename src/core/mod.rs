pub mod controller;
pub mod gpu_context;
pub mod input_adapter;
pub mod integrator;
pub mod render_loop;
pub mod replay;
pub mod timer;
pub mod vehicle;

pub use controller::{ControlInput, Intent};
pub use gpu_context::GpuContext;
pub use input_adapter::{KeyBindings, KeyboardInput};
pub use integrator::MotionIntegrator;
pub use render_loop::{LoopStatus, RenderLoop, StopHandle};
pub use replay::{InputPlayback, InputRecorder, InputRecording, RecordedFrame};
pub use timer::{FpsCounter, Throttled};
pub use vehicle::VehicleState;
