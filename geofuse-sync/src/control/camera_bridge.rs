use geofuse_common::Size;
use glam::DVec3;

use crate::{
    common::convention::FrameConvention,
    error::SyncError,
    render::{GlobeCamera, MeshCamera},
};

const MIN_DETERMINANT: f64 = 1e-12;

/// What a single [`CameraBridge::sync`] managed to write.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraOutcome {
    pub fov: Result<(), SyncError>,
    pub aspect: Result<(), SyncError>,
    pub pose: Result<(), SyncError>,
}

impl CameraOutcome {
    pub fn errors(&self) -> impl Iterator<Item = &SyncError> {
        [&self.fov, &self.aspect, &self.pose]
            .into_iter()
            .filter_map(|result| result.as_ref().err())
    }

    pub fn is_complete(&self) -> bool {
        self.errors().next().is_none()
    }
}

/// Copies the globe camera's pose and vertical field of view onto the mesh
/// camera. Everything is recomputed from the globe's current matrices on each
/// call; nothing is carried over between frames except what a failed step
/// leaves untouched on the mesh camera.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CameraBridge {
    convention: FrameConvention,
}

impl CameraBridge {
    pub fn new(convention: FrameConvention) -> Self {
        Self { convention }
    }

    pub fn convention(&self) -> &FrameConvention {
        &self.convention
    }

    /// Hands control of the mesh camera's world matrices to the bridge.
    pub fn attach(&self, camera: &mut impl MeshCamera) {
        camera.set_matrix_auto_update(false);
    }

    pub fn sync(
        &self,
        globe: &impl GlobeCamera,
        camera: &mut impl MeshCamera,
        viewport: Size<u32>,
    ) -> CameraOutcome {
        let fov = Self::sync_fov(globe, camera);
        let aspect = Self::sync_aspect(camera, viewport);
        if aspect.is_ok() {
            camera.recompute_projection();
        }
        let pose = self.transplant_pose(globe, camera);

        CameraOutcome { fov, aspect, pose }
    }

    fn sync_fov(globe: &impl GlobeCamera, camera: &mut impl MeshCamera) -> Result<(), SyncError> {
        let fov = globe.vertical_fov();
        if !fov.is_finite() || fov <= 0.0 || fov >= std::f64::consts::PI {
            return Err(SyncError::InvalidCameraState("vertical field of view"));
        }
        camera.set_vertical_fov(fov);
        Ok(())
    }

    fn sync_aspect(camera: &mut impl MeshCamera, viewport: Size<u32>) -> Result<(), SyncError> {
        let zero_viewport = SyncError::ZeroViewport {
            width: viewport.width,
            height: viewport.height,
        };
        let aspect = viewport.aspect_ratio().ok_or(zero_viewport)?;
        camera.set_aspect(aspect);
        Ok(())
    }

    fn transplant_pose(
        &self,
        globe: &impl GlobeCamera,
        camera: &mut impl MeshCamera,
    ) -> Result<(), SyncError> {
        let view = globe.view_matrix();
        let inverse_view = globe.inverse_view_matrix();
        let finite = |elements: &[f64; 16]| elements.iter().all(|e| e.is_finite());
        if !finite(&view) || !finite(&inverse_view) {
            return Err(SyncError::InvalidCameraState("non-finite view matrix"));
        }

        let view = self.convention.decode_globe(&view);
        let inverse_view = self.convention.decode_globe(&inverse_view);
        if inverse_view.determinant().abs() < MIN_DETERMINANT
            || view.determinant().abs() < MIN_DETERMINANT
        {
            return Err(SyncError::InvalidCameraState("singular view matrix"));
        }

        let world = self.convention.world_to_mesh(inverse_view);
        let world_inverse = self.convention.inverse_to_mesh(view);
        camera.set_world_matrix(self.convention.encode_mesh(&world));
        camera.set_world_inverse_matrix(self.convention.encode_mesh(&world_inverse));
        camera.look_at(self.convention.point_to_mesh(DVec3::ZERO));

        Ok(())
    }
}
