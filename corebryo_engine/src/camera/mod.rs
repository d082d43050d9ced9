//! Camera module - the fly camera that supplies view/projection to the frame.

mod camera;

pub use camera::{Camera, MAX_PITCH, flip_clip_y};
