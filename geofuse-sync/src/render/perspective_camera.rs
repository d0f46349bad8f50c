use glam::{DMat3, DMat4, DQuat, DVec3};

use crate::common::convention::MatrixLayout;

use super::MeshCamera;

const LAYOUT: MatrixLayout = MatrixLayout::RowMajor;

/// Headless mesh-renderer camera. World matrices are stored as row-major
/// element arrays, the way they are handed over by `set_world_matrix`.
#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveCamera {
    pub position: DVec3,
    pub quaternion: DQuat,
    pub up: DVec3,
    fov_y: f64,
    aspect: f64,
    near: f64,
    far: f64,
    world: [f64; 16],
    world_inverse: [f64; 16],
    projection: DMat4,
    matrix_auto_update: bool,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(45.0_f64.to_radians(), 1.0, 1.0, 10_000_000.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov_y: f64, aspect: f64, near: f64, far: f64) -> Self {
        let identity = LAYOUT.encode(&DMat4::IDENTITY);
        let mut camera = Self {
            position: DVec3::ZERO,
            quaternion: DQuat::IDENTITY,
            up: DVec3::Y,
            fov_y,
            aspect,
            near,
            far,
            world: identity,
            world_inverse: identity,
            projection: DMat4::IDENTITY,
            matrix_auto_update: true,
        };
        camera.recompute_projection();
        camera
    }

    pub fn near(&self) -> f64 {
        self.near
    }

    pub fn far(&self) -> f64 {
        self.far
    }

    pub fn projection_matrix(&self) -> DMat4 {
        self.projection
    }

    pub fn world(&self) -> DMat4 {
        LAYOUT.decode(&self.world)
    }

    pub fn world_inverse(&self) -> DMat4 {
        LAYOUT.decode(&self.world_inverse)
    }

    pub fn matrix_auto_update(&self) -> bool {
        self.matrix_auto_update
    }

    /// Rebuilds the world matrices from position and orientation, unless
    /// automatic updates were switched off.
    pub fn update_matrix_world(&mut self) {
        if !self.matrix_auto_update {
            return;
        }
        let world = DMat4::from_rotation_translation(self.quaternion, self.position);
        self.world = LAYOUT.encode(&world);
        self.world_inverse = LAYOUT.encode(&world.inverse());
    }

    /// World point to normalized device coordinates.
    pub fn project_point(&self, point: DVec3) -> DVec3 {
        (self.projection * self.world_inverse()).project_point3(point)
    }

    pub fn forward(&self) -> DVec3 {
        self.quaternion * DVec3::NEG_Z
    }
}

impl MeshCamera for PerspectiveCamera {
    fn world_matrix(&self) -> [f64; 16] {
        self.world
    }

    fn set_world_matrix(&mut self, elements: [f64; 16]) {
        self.world = elements;
        self.position = self.world().w_axis.truncate();
    }

    fn world_inverse_matrix(&self) -> [f64; 16] {
        self.world_inverse
    }

    fn set_world_inverse_matrix(&mut self, elements: [f64; 16]) {
        self.world_inverse = elements;
    }

    fn vertical_fov(&self) -> f64 {
        self.fov_y
    }

    fn set_vertical_fov(&mut self, fov: f64) {
        self.fov_y = fov;
    }

    fn aspect(&self) -> f64 {
        self.aspect
    }

    fn set_aspect(&mut self, aspect: f64) {
        self.aspect = aspect;
    }

    fn recompute_projection(&mut self) {
        self.projection = DMat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far);
    }

    fn look_at(&mut self, target: DVec3) {
        // camera looks down its own -Z
        let z = (self.position - target).normalize_or_zero();
        let x = self.up.cross(z).normalize_or_zero();
        if z == DVec3::ZERO || x == DVec3::ZERO {
            log::debug!("Camera look-at skipped: target coincides with or aligns to up");
            return;
        }
        let y = z.cross(x);

        self.quaternion = DQuat::from_mat3(&DMat3::from_cols(x, y, z));
        self.update_matrix_world();
    }

    fn set_matrix_auto_update(&mut self, enabled: bool) {
        self.matrix_auto_update = enabled;
    }

    fn matrix_layout(&self) -> MatrixLayout {
        LAYOUT
    }
}
