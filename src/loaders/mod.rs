pub mod draco;
pub mod gltf;
pub mod parts;

pub use self::draco::DRACO_EXTENSION;
pub use self::gltf::{load_model, load_model_async, ModelAsset, PrimitiveGeometry, WHEEL_PATTERN};
pub use self::parts::{Part, PartRegistry};
