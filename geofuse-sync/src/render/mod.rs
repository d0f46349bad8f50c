//! Contracts of the two renderers the core synchronizes, plus headless
//! implementations of both used by tests and the headless runner.

pub mod globe;
pub mod mesh_renderer;
pub mod perspective_camera;
pub mod scene;

use geofuse_common::{GeodeticRect, Size};
use glam::{DQuat, DVec3};

use crate::common::convention::MatrixLayout;

pub use globe::GlobeEntityId;

/// RGBA, each channel in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const RED: Color = Color {
        r: 1.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

pub trait GlobeCamera {
    /// World to camera space.
    fn view_matrix(&self) -> [f64; 16];
    /// Camera to world space.
    fn inverse_view_matrix(&self) -> [f64; 16];
    /// Radians.
    fn vertical_fov(&self) -> f64;
    fn matrix_layout(&self) -> MatrixLayout;
}

pub trait GlobeRenderer {
    type Camera: GlobeCamera;

    fn camera(&self) -> &Self::Camera;
    fn render(&mut self);
    fn add_outline(&mut self, footprint: GeodeticRect, color: Color) -> GlobeEntityId;
    fn remove_entity(&mut self, id: GlobeEntityId) -> bool;
}

pub trait MeshCamera {
    fn world_matrix(&self) -> [f64; 16];
    fn set_world_matrix(&mut self, elements: [f64; 16]);
    fn world_inverse_matrix(&self) -> [f64; 16];
    fn set_world_inverse_matrix(&mut self, elements: [f64; 16]);
    /// Radians.
    fn vertical_fov(&self) -> f64;
    fn set_vertical_fov(&mut self, fov: f64);
    fn aspect(&self) -> f64;
    fn set_aspect(&mut self, aspect: f64);
    fn recompute_projection(&mut self);
    fn look_at(&mut self, target: DVec3);
    /// When disabled the renderer must not rebuild the world matrices from
    /// position and orientation.
    fn set_matrix_auto_update(&mut self, enabled: bool);
    fn matrix_layout(&self) -> MatrixLayout;
}

pub trait ObjectTransform {
    fn position(&self) -> DVec3;
    fn set_position(&mut self, position: DVec3);
    fn up(&self) -> DVec3;
    fn set_up(&mut self, up: DVec3);
    /// Turns the object's +Z towards `target`, keeping its `up` as close as
    /// possible to the stored up vector.
    fn look_at(&mut self, target: DVec3);
    fn orientation(&self) -> DQuat;
}

pub trait MeshRenderer {
    type Camera: MeshCamera;
    type Handle: Copy;
    type Transform: ObjectTransform;

    fn camera(&self) -> &Self::Camera;
    fn camera_mut(&mut self) -> &mut Self::Camera;
    fn transform_mut(&mut self, handle: Self::Handle) -> Option<&mut Self::Transform>;
    fn drawing_surface_size(&self) -> Size<u32>;
    fn render(&mut self);
}
