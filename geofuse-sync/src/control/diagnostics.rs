use glam::{DMat4, DVec3};

use crate::{
    common::convention::FrameConvention,
    render::{GlobeCamera, MeshCamera, perspective_camera::PerspectiveCamera},
};

/// Screen-space disagreement between the two cameras for one world point:
/// the distance in normalized device coordinates between where the globe
/// would draw it and where the mesh camera draws it. The globe projection
/// borrows the mesh camera's aspect and clip planes, so only the pose and the
/// field of view are compared.
pub fn alignment_error(
    globe: &impl GlobeCamera,
    mesh: &PerspectiveCamera,
    convention: &FrameConvention,
    point: DVec3,
) -> f64 {
    let view = convention.decode_globe(&globe.view_matrix());
    let fov = globe.vertical_fov();
    let projection = DMat4::perspective_rh_gl(fov, mesh.aspect(), mesh.near(), mesh.far());
    let globe_ndc = (projection * view).project_point3(point);
    let mesh_ndc = mesh.project_point(convention.point_to_mesh(point));

    globe_ndc.truncate().distance(mesh_ndc.truncate())
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_4;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::{control::camera_bridge::CameraBridge, render::globe::GlobeCameraState};

    #[test]
    fn synced_cameras_agree() {
        let eye = DVec3::new(6_500_000.0, 100_000.0, 300_000.0);
        let target = DVec3::new(6_300_000.0, 0.0, 0.0);
        let view = DMat4::look_at_rh(eye, target, DVec3::Z);
        let globe = GlobeCameraState::from_inverse_view(view.inverse(), FRAC_PI_4);
        let bridge = CameraBridge::default();
        let mut camera = PerspectiveCamera::default();
        bridge.attach(&mut camera);

        let landmark = DVec3::new(6_310_000.0, 20_000.0, 10_000.0);
        assert!(alignment_error(&globe, &camera, bridge.convention(), landmark) > 1e-3);

        bridge.sync(&globe, &mut camera, (1600, 900).into());
        assert_abs_diff_eq!(
            alignment_error(&globe, &camera, bridge.convention(), landmark),
            0.0,
            epsilon = 1e-9
        );
        assert_eq!(camera.vertical_fov(), FRAC_PI_4);
    }
}
