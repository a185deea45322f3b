pub mod camera;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod frame;
pub mod hud;
pub mod loaders;
pub mod renderer;
pub mod scene;
pub mod traits;
pub mod types;

pub use config::{StepMode, TuningConstants};
pub use self::core::{ControlInput, Intent, MotionIntegrator, RenderLoop, StopHandle, VehicleState};
pub use error::{AssetError, ConfigError, RenderError};
