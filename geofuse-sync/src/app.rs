use geofuse_common::GeodeticRect;
use slotmap::SecondaryMap;

use crate::{
    common::{convention::ConventionError, projection::GeodeticProjector},
    control::{
        camera_bridge::{CameraBridge, CameraOutcome},
        object_orienter::{ObjectOrienter, OrientReport},
    },
    data::{
        registry::{PlacedObject, PlacedObjectId, Registry},
        settings::SyncSettings,
    },
    error::SyncError,
    render::{Color, GlobeCamera, GlobeEntityId, GlobeRenderer, MeshCamera, MeshRenderer},
};

#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub camera: CameraOutcome,
    pub objects: OrientReport,
}

/// Owns both renderers and everything the per-frame synchronization needs.
/// One [`FusionContext::tick`] renders the globe, aligns the mesh camera with
/// the globe camera, re-places every registered object and finally renders the
/// mesh scene on top.
pub struct FusionContext<G, M: MeshRenderer, P> {
    globe: G,
    mesh: M,
    projector: P,
    registry: Registry<M::Handle>,
    outlines: SecondaryMap<PlacedObjectId, GlobeEntityId>,
    bridge: CameraBridge,
    orienter: ObjectOrienter,
    settings: SyncSettings,
    frame: u64,
}

impl<G, M, P> FusionContext<G, M, P>
where
    G: GlobeRenderer,
    M: MeshRenderer,
    P: GeodeticProjector,
{
    pub fn new(
        globe: G,
        mut mesh: M,
        projector: P,
        settings: SyncSettings,
    ) -> Result<Self, ConventionError> {
        settings.convention.validate_against(
            globe.camera().matrix_layout(),
            mesh.camera().matrix_layout(),
        )?;
        log::info!(
            "Frame convention: globe {}, mesh {}, axes {:?}",
            settings.convention.globe_layout,
            settings.convention.mesh_layout,
            settings.convention.axes.0
        );

        let bridge = CameraBridge::new(settings.convention);
        bridge.attach(mesh.camera_mut());
        let orienter =
            ObjectOrienter::new(settings.orienter.normal_sample_height, settings.convention);

        Ok(Self {
            globe,
            mesh,
            projector,
            registry: Registry::new(),
            outlines: SecondaryMap::new(),
            bridge,
            orienter,
            settings,
            frame: 0,
        })
    }

    pub fn place(&mut self, handle: M::Handle, footprint: GeodeticRect) -> PlacedObjectId {
        let id = self.registry.register(handle, footprint);
        if self.settings.outline_footprints {
            let fill = Color::RED.with_alpha(0.2);
            let outline = self.globe.add_outline(footprint, fill);
            self.outlines.insert(id, outline);
        }
        log::debug!("Placed object {id:?} on {footprint:?}");
        id
    }

    pub fn remove(&mut self, id: PlacedObjectId) -> Option<PlacedObject<M::Handle>> {
        if let Some(outline) = self.outlines.remove(id) {
            self.globe.remove_entity(outline);
        }
        self.registry.unregister(id)
    }

    /// Runs one frame. Objects whose mesh node has vanished are reported as
    /// [`SyncError::StaleHandle`] and unregistered before the frame ends.
    pub fn tick(&mut self) -> FrameReport {
        self.frame += 1;

        self.globe.render();

        let viewport = self.mesh.drawing_surface_size();
        let globe_camera = self.globe.camera();
        let mesh_camera = self.mesh.camera_mut();
        let camera = self.bridge.sync(globe_camera, mesh_camera, viewport);
        for err in camera.errors() {
            log::warn!("Frame {}: camera sync skipped a step: {err}", self.frame);
        }

        let orienter = &self.orienter;
        let objects = orienter.orient(&self.projector, &self.registry, &mut self.mesh);
        for (id, err) in &objects.skipped {
            if matches!(err, SyncError::StaleHandle) {
                log::warn!(
                    "Frame {}: object {id:?} lost its mesh node, unregistering it",
                    self.frame
                );
                self.remove(*id);
            } else {
                log::debug!(
                    "Frame {}: object {id:?} kept its last pose: {err}",
                    self.frame
                );
            }
        }

        self.mesh.render();

        FrameReport {
            frame: self.frame,
            camera,
            objects,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn globe(&self) -> &G {
        &self.globe
    }

    pub fn globe_mut(&mut self) -> &mut G {
        &mut self.globe
    }

    pub fn mesh(&self) -> &M {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut M {
        &mut self.mesh
    }

    pub fn projector(&self) -> &P {
        &self.projector
    }

    pub fn registry(&self) -> &Registry<M::Handle> {
        &self.registry
    }

    pub fn bridge(&self) -> &CameraBridge {
        &self.bridge
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use std::{f64::consts::FRAC_PI_3, time::Duration};

    use approx::assert_relative_eq;
    use geofuse_common::GeoCoord;
    use glam::DMat4;

    use super::*;
    use crate::{
        common::{
            convention::{FrameConvention, MatrixLayout},
            projection::EllipsoidProjector,
        },
        control::diagnostics::alignment_error,
        render::{
            ObjectTransform,
            globe::{CameraPose, GlobeCameraState, HeadingPitchRoll, SimulatedGlobe},
            mesh_renderer::HeadlessMeshRenderer,
            perspective_camera::PerspectiveCamera,
            scene::{NodeId, SceneNode},
        },
    };

    type Globe = SimulatedGlobe<EllipsoidProjector>;
    type Context = FusionContext<Globe, HeadlessMeshRenderer, EllipsoidProjector>;

    fn context() -> Context {
        let pose = CameraPose {
            destination: GeoCoord::new(115.5, 39.5),
            height: 200_000.0,
            orientation: HeadingPitchRoll::from_degrees(0.0, -60.0, 0.0),
        };
        let globe = SimulatedGlobe::new(
            EllipsoidProjector::default(),
            pose,
            FRAC_PI_3,
            Duration::from_millis(16),
        );
        let mesh = HeadlessMeshRenderer::new(PerspectiveCamera::default(), (1920, 1080).into());
        let settings = SyncSettings::default();
        FusionContext::new(globe, mesh, EllipsoidProjector::default(), settings).unwrap()
    }

    fn footprint() -> GeodeticRect {
        GeodeticRect::new(115.0, 39.5, 116.0, 41.5).unwrap()
    }

    fn add_node(context: &mut Context) -> NodeId {
        context.mesh_mut().add(SceneNode::new("lathe"))
    }

    #[test]
    fn end_to_end_tick() {
        let mut context = context();
        let node = add_node(&mut context);
        context.place(node, footprint());

        let report = context.tick();
        assert_eq!(report.frame, 1);
        assert!(report.camera.is_complete());
        assert_eq!(report.objects.oriented, 1);

        let projector = EllipsoidProjector::default();
        let transform = context.mesh().scene().get(node).unwrap();
        assert_eq!(transform.position(), projector.project(115.5, 40.5, 0.0));
        let south_west = projector.project(115.0, 39.5, 0.0);
        let north_west = projector.project(115.0, 41.5, 0.0);
        assert_eq!(transform.up(), (south_west - north_west).normalize());

        let camera = context.mesh().camera();
        assert_eq!(camera.vertical_fov(), FRAC_PI_3);
        assert_eq!(camera.aspect(), 1920.0 / 1080.0);
        assert_eq!(
            camera.world(),
            DMat4::from_cols_array(&context.globe().camera().inverse_view_matrix())
        );
    }

    #[test]
    fn mesh_render_observes_this_frames_pose() {
        let mut context = context();
        let node = add_node(&mut context);
        context.place(node, footprint());
        context.tick();

        let camera = context.mesh().camera();
        let position = context.mesh().scene().get(node).unwrap().position();
        let rendered = context.mesh().last_frame().unwrap().nodes[&node];
        assert_eq!(rendered.ndc, camera.project_point(position));
        assert!(rendered.in_frustum);

        let error = alignment_error(
            context.globe().camera(),
            camera,
            context.bridge().convention(),
            position,
        );
        assert!(error < 1e-9, "misaligned by {error}");
    }

    #[test]
    fn camera_follows_fly_to_within_the_same_tick() {
        let mut context = context();
        let destination = CameraPose {
            destination: GeoCoord::new(20.2, 49.3),
            height: 50_000.0,
            orientation: HeadingPitchRoll::from_degrees(45.0, -30.0, 0.0),
        };
        let duration = Duration::from_millis(32);
        context.globe_mut().fly_to(destination, duration);
        context.tick();
        context.tick();

        let eye = context.mesh().camera().world().w_axis.truncate();
        let expected = EllipsoidProjector::default().project(20.2, 49.3, 50_000.0);
        assert_relative_eq!(eye, expected, epsilon = 1e-6);
    }

    #[test]
    fn nan_frame_is_skipped_and_recovered() {
        let mut context = context();
        context.tick();
        let good_world = context.mesh().camera().world_matrix();

        let camera = *context.globe().camera();
        let mut inverse_view = camera.inverse_view_matrix();
        inverse_view[0] = f64::NAN;
        *context.globe_mut().camera_mut() =
            GlobeCameraState::from_raw(camera.view_matrix(), inverse_view, FRAC_PI_3);
        // the simulated globe only rewrites its camera while flying, so the broken
        // state survives its render step
        let report = context.tick();
        assert!(matches!(report.camera.pose, Err(SyncError::InvalidCameraState(_))));
        assert_eq!(context.mesh().camera().world_matrix(), good_world);

        *context.globe_mut().camera_mut() = camera;
        let report = context.tick();
        assert!(report.camera.is_complete());
        assert_eq!(report.frame, 3);
    }

    #[test]
    fn place_and_remove_manage_outlines() {
        let mut context = context();
        let node = add_node(&mut context);
        let id = context.place(node, footprint());
        assert_eq!(context.globe().entities().count(), 1);
        assert_eq!(context.registry().len(), 1);

        let removed = context.remove(id).unwrap();
        assert_eq!(removed.handle, node);
        assert_eq!(context.globe().entities().count(), 0);
        assert!(context.registry().is_empty());
        assert!(context.remove(id).is_none());
    }

    #[test]
    fn objects_with_vanished_nodes_are_unregistered() {
        let mut context = context();
        let node = add_node(&mut context);
        let id = context.place(node, footprint());
        context.mesh_mut().scene_mut().remove(node);

        let report = context.tick();
        assert_eq!(report.objects.skipped, vec![(id, SyncError::StaleHandle)]);
        assert!(context.registry().is_empty());
        assert_eq!(context.globe().entities().count(), 0);

        let report = context.tick();
        assert!(report.objects.skipped.is_empty());
    }

    #[test]
    fn outlines_can_be_disabled() {
        let pose = CameraPose {
            destination: GeoCoord::new(0.0, 0.0),
            height: 1_000_000.0,
            orientation: HeadingPitchRoll::from_degrees(0.0, -90.0, 0.0),
        };
        let globe = SimulatedGlobe::new(EllipsoidProjector::default(), pose, 1.0, Duration::ZERO);
        let mesh = HeadlessMeshRenderer::new(PerspectiveCamera::default(), (4, 3).into());
        let settings = SyncSettings {
            outline_footprints: false,
            ..Default::default()
        };
        let mut context =
            FusionContext::new(globe, mesh, EllipsoidProjector::default(), settings).unwrap();
        let node = context.mesh_mut().add(SceneNode::new("n"));
        context.place(node, footprint());
        assert_eq!(context.globe().entities().count(), 0);
    }

    #[test]
    fn mismatched_convention_is_rejected_at_startup() {
        let pose = CameraPose {
            destination: GeoCoord::new(0.0, 0.0),
            height: 1_000.0,
            orientation: HeadingPitchRoll::default(),
        };
        let globe = SimulatedGlobe::new(EllipsoidProjector::default(), pose, 1.0, Duration::ZERO);
        let mesh = HeadlessMeshRenderer::new(PerspectiveCamera::default(), (4, 3).into());
        let settings = SyncSettings {
            convention: FrameConvention {
                mesh_layout: MatrixLayout::ColumnMajor,
                ..Default::default()
            },
            ..Default::default()
        };

        let result = FusionContext::new(globe, mesh, EllipsoidProjector::default(), settings);
        assert!(matches!(result, Err(ConventionError::MeshLayoutMismatch { .. })));
    }

    #[test]
    fn context_takes_over_mesh_camera_matrices() {
        let context = context();
        assert!(!context.mesh().camera().matrix_auto_update());
    }
}
