pub mod camera_bridge;
pub mod diagnostics;
pub mod object_orienter;
