mod settings;

use std::f64::consts::FRAC_PI_2;

use color_eyre::{Result, eyre::OptionExt};
use geofuse_common::GeoCoord;
use geofuse_sync::{
    EllipsoidProjector, FusionContext,
    control::diagnostics::alignment_error,
    render::{
        GlobeRenderer, MeshRenderer, ObjectTransform,
        globe::{CameraPose, HeadingPitchRoll, SimulatedGlobe},
        mesh_renderer::HeadlessMeshRenderer,
        perspective_camera::PerspectiveCamera,
        scene::SceneNode,
    },
};
use glam::{DQuat, DVec3};

use settings::HeadlessSettings;

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = HeadlessSettings::load("Settings")?;
    if settings.objects.is_empty() {
        log::warn!("No objects configured, only the cameras will be synchronized");
    }

    let projector = EllipsoidProjector::default();
    let frame_interval = settings.frame_interval()?;
    let fly_to_duration = settings.fly_to.duration()?;
    let fov_y = settings.fov_degrees.to_radians();

    let start = CameraPose {
        destination: settings.start,
        height: settings.start_height,
        orientation: HeadingPitchRoll::from_degrees(0.0, -90.0, 0.0),
    };
    let mut globe = SimulatedGlobe::new(projector, start, fov_y, frame_interval);
    if let Some(first) = settings.objects.first() {
        let center = first.footprint.center();
        let latitude = center.latitude + settings.fly_to.latitude_offset;
        let view = settings.fly_to.view;
        let destination = CameraPose {
            destination: GeoCoord::new(center.longitude, latitude),
            height: view.height,
            orientation: HeadingPitchRoll::from_degrees(view.heading, view.pitch, view.roll),
        };
        globe.fly_to(destination, fly_to_duration);
    }

    let camera = PerspectiveCamera::new(
        fov_y,
        settings.viewport.aspect_ratio().unwrap_or(1.0),
        settings.sync.camera.near,
        settings.sync.camera.far,
    );
    let mut mesh = HeadlessMeshRenderer::new(camera, settings.viewport);

    // every mesh hangs below a group that the orienter moves; the mesh itself is
    // lifted along the group's outward axis and turned so its own +Y points outward
    let mut groups = Vec::with_capacity(settings.objects.len());
    for object in &settings.objects {
        let group = mesh.add(SceneNode::new(object.name.clone()));
        let child = SceneNode::new(format!("{}-mesh", object.name))
            .with_scale(DVec3::splat(object.scale))
            .with_position(DVec3::new(0.0, 0.0, object.lift))
            .with_rotation(DQuat::from_rotation_x(FRAC_PI_2));
        mesh.scene_mut()
            .add_child(group, child)
            .ok_or_eyre("Mesh group vanished before its child was added")?;
        groups.push((object, group));
    }

    let mut context = FusionContext::new(globe, mesh, projector, settings.sync)?;
    for (object, group) in &groups {
        context.place(*group, object.footprint);
    }

    let mut incomplete_frames = 0;
    let mut skipped_objects = 0;
    for _ in 0..settings.ticks {
        let report = context.tick();
        if !report.camera.is_complete() {
            incomplete_frames += 1;
        }
        skipped_objects += report.objects.skipped.len();
    }
    log::info!(
        "Ran {} frames, {} with incomplete camera sync, {} skipped object updates",
        context.frame(),
        incomplete_frames,
        skipped_objects
    );
    log::debug!(
        "Globe rendered {} frames, mesh rendered {}",
        context.globe().frames_rendered(),
        context.mesh().frames_rendered()
    );

    let camera = context.mesh().camera();
    let world = camera.world();
    log::info!(
        "Mesh camera at {:.1} looking {:.4}",
        world.w_axis.truncate(),
        -world.z_axis.truncate()
    );

    let last_frame = context.mesh().last_frame();
    for (object, group) in &groups {
        let Some(node) = context.mesh().scene().get(*group) else {
            continue;
        };
        let error = alignment_error(
            context.globe().camera(),
            camera,
            context.bridge().convention(),
            node.position(),
        );
        let on_screen = last_frame
            .and_then(|frame| frame.nodes.get(group))
            .map(|rendered| rendered.in_frustum)
            .unwrap_or(false);
        log::info!(
            "{}: position {:.1}, forward {:.4}, up {:.4}",
            object.name,
            node.position(),
            node.orientation() * DVec3::Z,
            node.orientation() * DVec3::Y
        );
        log::info!(
            "{}: on screen: {on_screen}, alignment error {error:.3e}",
            object.name
        );
    }

    Ok(())
}
