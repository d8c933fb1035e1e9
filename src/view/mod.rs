// VIEW: What the external renderer consumes
pub mod snapshot;

pub use snapshot::{CameraView, FrameSnapshot, LightView, NodeLook, NodeView};
