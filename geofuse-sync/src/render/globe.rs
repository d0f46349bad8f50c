use std::{f64::consts::TAU, time::Duration};

use geofuse_common::{GeoCoord, GeodeticRect};
use glam::{DMat4, DVec3};
use slotmap::{SlotMap, new_key_type};

use crate::common::{convention::MatrixLayout, projection::GeodeticProjector};

use super::{Color, GlobeCamera, GlobeRenderer};

new_key_type! {
    pub struct GlobeEntityId;
}

/// Camera orientation relative to the local east/north/up frame, radians.
/// Heading turns clockwise from north, negative pitch looks down.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HeadingPitchRoll {
    pub heading: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl HeadingPitchRoll {
    pub fn from_degrees(heading: f64, pitch: f64, roll: f64) -> Self {
        Self {
            heading: heading.to_radians(),
            pitch: pitch.to_radians(),
            roll: roll.to_radians(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraPose {
    pub destination: GeoCoord,
    pub height: f64,
    pub orientation: HeadingPitchRoll,
}

impl CameraPose {
    /// Camera-to-world matrix, camera looking down its -Z with +Y up.
    pub fn inverse_view(&self, projector: &impl GeodeticProjector) -> DMat4 {
        let GeoCoord {
            longitude,
            latitude,
        } = self.destination;
        let position = projector.project(longitude, latitude, self.height);
        let enu = projector.east_north_up(longitude, latitude);

        let HeadingPitchRoll {
            heading,
            pitch,
            roll,
        } = self.orientation;
        let (sin_heading, cos_heading) = heading.sin_cos();
        let local_direction = DVec3::new(
            sin_heading * pitch.cos(),
            cos_heading * pitch.cos(),
            pitch.sin(),
        );
        let direction = enu * local_direction;
        let level_right = enu * DVec3::new(heading.cos(), -heading.sin(), 0.0);
        let level_up = level_right.cross(direction);
        let right = level_right * roll.cos() + level_up * roll.sin();
        let up = level_up * roll.cos() - level_right * roll.sin();

        DMat4::from_cols(
            right.extend(0.0),
            up.extend(0.0),
            (-direction).extend(0.0),
            position.extend(1.0),
        )
    }

    fn interpolate(&self, other: &CameraPose, t: f64) -> CameraPose {
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        let turn = |a: f64, b: f64, full_turn: f64| a + shortest_turn(a, b, full_turn) * t;

        let mut longitude = turn(
            self.destination.longitude,
            other.destination.longitude,
            360.0,
        );
        if longitude > 180.0 {
            longitude -= 360.0;
        } else if longitude < -180.0 {
            longitude += 360.0;
        }

        CameraPose {
            destination: GeoCoord::new(
                longitude,
                lerp(self.destination.latitude, other.destination.latitude),
            ),
            height: lerp(self.height, other.height),
            orientation: HeadingPitchRoll {
                heading: turn(self.orientation.heading, other.orientation.heading, TAU),
                pitch: lerp(self.orientation.pitch, other.orientation.pitch),
                roll: lerp(self.orientation.roll, other.orientation.roll),
            },
        }
    }
}

/// Signed angle from `from` to `to` the short way round, in `(-full_turn / 2, full_turn / 2]`.
fn shortest_turn(from: f64, to: f64, full_turn: f64) -> f64 {
    let delta = (to - from).rem_euclid(full_turn);
    if delta > full_turn / 2.0 {
        delta - full_turn
    } else {
        delta
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct FlyTo {
    from: CameraPose,
    to: CameraPose,
    duration: Duration,
    elapsed: Duration,
}

impl FlyTo {
    fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let t = (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }

    fn pose(&self) -> CameraPose {
        self.from.interpolate(&self.to, self.progress())
    }

    fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Globe camera state as exposed to the bridge: column-major matrices.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GlobeCameraState {
    view: [f64; 16],
    inverse_view: [f64; 16],
    fov_y: f64,
}

impl GlobeCameraState {
    pub fn from_inverse_view(inverse_view: DMat4, fov_y: f64) -> Self {
        Self {
            view: inverse_view.inverse().to_cols_array(),
            inverse_view: inverse_view.to_cols_array(),
            fov_y,
        }
    }

    pub fn from_raw(view: [f64; 16], inverse_view: [f64; 16], fov_y: f64) -> Self {
        Self {
            view,
            inverse_view,
            fov_y,
        }
    }

    pub fn view(&self) -> DMat4 {
        DMat4::from_cols_array(&self.view)
    }

    pub fn set_fov_y(&mut self, fov_y: f64) {
        self.fov_y = fov_y;
    }

    /// World point to normalized device coordinates of the globe's own projection.
    pub fn project_point(&self, point: DVec3, aspect: f64, near: f64, far: f64) -> DVec3 {
        let projection = DMat4::perspective_rh_gl(self.fov_y, aspect, near, far);
        (projection * self.view()).project_point3(point)
    }
}

impl GlobeCamera for GlobeCameraState {
    fn view_matrix(&self) -> [f64; 16] {
        self.view
    }

    fn inverse_view_matrix(&self) -> [f64; 16] {
        self.inverse_view
    }

    fn vertical_fov(&self) -> f64 {
        self.fov_y
    }

    fn matrix_layout(&self) -> MatrixLayout {
        MatrixLayout::ColumnMajor
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GlobeEntity {
    pub footprint: GeodeticRect,
    pub color: Color,
    pub outline: [DVec3; 4],
}

/// Stand-in for the globe renderer: a camera that can fly between geodetic
/// poses on a fixed frame clock and a list of outline entities.
#[derive(Debug)]
pub struct SimulatedGlobe<P> {
    projector: P,
    pose: CameraPose,
    camera: GlobeCameraState,
    fly_to: Option<FlyTo>,
    frame_interval: Duration,
    frames_rendered: u64,
    entities: SlotMap<GlobeEntityId, GlobeEntity>,
}

impl<P: GeodeticProjector> SimulatedGlobe<P> {
    pub fn new(projector: P, pose: CameraPose, fov_y: f64, frame_interval: Duration) -> Self {
        let camera = GlobeCameraState::from_inverse_view(pose.inverse_view(&projector), fov_y);
        Self {
            projector,
            pose,
            camera,
            fly_to: None,
            frame_interval,
            frames_rendered: 0,
            entities: SlotMap::with_key(),
        }
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn set_pose(&mut self, pose: CameraPose) {
        self.fly_to = None;
        self.pose = pose;
        self.refresh_camera();
    }

    pub fn fly_to(&mut self, to: CameraPose, duration: Duration) {
        log::info!(
            "Flying to ({:.4}, {:.4}) at {:.0} m over {:?}",
            to.destination.longitude,
            to.destination.latitude,
            to.height,
            duration
        );
        self.fly_to = Some(FlyTo {
            from: self.pose,
            to,
            duration,
            elapsed: Duration::ZERO,
        });
    }

    pub fn is_flying(&self) -> bool {
        self.fly_to.is_some()
    }

    pub fn camera_mut(&mut self) -> &mut GlobeCameraState {
        &mut self.camera
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn entities(&self) -> impl Iterator<Item = (GlobeEntityId, &GlobeEntity)> {
        self.entities.iter()
    }

    fn refresh_camera(&mut self) {
        let fov_y = self.camera.fov_y;
        self.camera =
            GlobeCameraState::from_inverse_view(self.pose.inverse_view(&self.projector), fov_y);
    }
}

impl<P: GeodeticProjector> GlobeRenderer for SimulatedGlobe<P> {
    type Camera = GlobeCameraState;

    fn camera(&self) -> &GlobeCameraState {
        &self.camera
    }

    fn render(&mut self) {
        if let Some(fly_to) = self.fly_to.as_mut() {
            fly_to.elapsed += self.frame_interval;
            self.pose = fly_to.pose();
            if fly_to.is_finished() {
                log::debug!("Fly-to finished after {} frames", self.frames_rendered + 1);
                self.fly_to = None;
            }
            self.refresh_camera();
        }
        self.frames_rendered += 1;
    }

    fn add_outline(&mut self, footprint: GeodeticRect, color: Color) -> GlobeEntityId {
        let outline = footprint
            .corners()
            .map(|corner| self.projector.project_coord(corner, 0.0));
        self.entities.insert(GlobeEntity {
            footprint,
            color,
            outline,
        })
    }

    fn remove_entity(&mut self, id: GlobeEntityId) -> bool {
        self.entities.remove(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::common::projection::{EllipsoidProjector, FlatProjector};

    fn pose(lon: f64, lat: f64, height: f64, hpr: HeadingPitchRoll) -> CameraPose {
        CameraPose {
            destination: GeoCoord::new(lon, lat),
            height,
            orientation: hpr,
        }
    }

    #[test]
    fn straight_down_looks_at_the_surface_below() {
        let projector = EllipsoidProjector::default();
        let nadir = HeadingPitchRoll::from_degrees(0.0, -90.0, 0.0);
        let inverse_view = pose(20.0, 49.0, 10_000.0, nadir).inverse_view(&projector);

        let forward = -inverse_view.z_axis.truncate();
        let position = inverse_view.w_axis.truncate();
        let below = projector.project(20.0, 49.0, 0.0);
        assert_relative_eq!(forward, (below - position).normalize(), epsilon = 1e-6);
        assert_relative_eq!(inverse_view.determinant(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn level_heading_east_on_flat_earth() {
        let east = HeadingPitchRoll::from_degrees(90.0, 0.0, 0.0);
        let inverse_view = pose(0.0, 0.0, 100.0, east).inverse_view(&FlatProjector::default());
        assert_relative_eq!(-inverse_view.z_axis.truncate(), DVec3::X, epsilon = 1e-9);
        assert_relative_eq!(inverse_view.y_axis.truncate(), DVec3::Z, epsilon = 1e-9);
    }

    #[test]
    fn fly_to_reaches_destination() {
        let start = pose(0.0, 0.0, 1_000_000.0, HeadingPitchRoll::default());
        let tilted = HeadingPitchRoll::from_degrees(0.0, -60.0, 0.0);
        let end = pose(115.5, 39.5, 200_000.0, tilted);
        let mut globe = SimulatedGlobe::new(
            EllipsoidProjector::default(),
            start,
            std::f64::consts::FRAC_PI_3,
            Duration::from_millis(500),
        );
        globe.fly_to(end, Duration::from_secs(3));

        globe.render();
        assert!(globe.is_flying());
        let midway = globe.pose();
        assert!(midway.destination.longitude > 0.0 && midway.destination.longitude < 115.5);

        for _ in 0..5 {
            globe.render();
        }
        assert!(!globe.is_flying());
        assert_relative_eq!(globe.pose().height, end.height, epsilon = 1e-6);
        assert_relative_eq!(globe.pose().destination.longitude, 115.5, epsilon = 1e-9);
        assert_eq!(globe.frames_rendered(), 6);
    }

    #[test]
    fn fly_to_crosses_antimeridian_the_short_way() {
        let start = pose(170.0, 0.0, 1000.0, HeadingPitchRoll::default());
        let end = pose(-170.0, 0.0, 1000.0, HeadingPitchRoll::default());
        let halfway = start.interpolate(&end, 0.5);
        assert_relative_eq!(halfway.destination.longitude.abs(), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn heading_turns_the_short_way_through_north() {
        let west_of_north = HeadingPitchRoll::from_degrees(350.0, 0.0, 0.0);
        let east_of_north = HeadingPitchRoll::from_degrees(10.0, 0.0, 0.0);
        let start = pose(0.0, 0.0, 1000.0, west_of_north);
        let end = pose(0.0, 0.0, 1000.0, east_of_north);

        let halfway = start.interpolate(&end, 0.5).orientation.heading;
        assert_relative_eq!(halfway.sin(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(halfway.cos(), 1.0, epsilon = 1e-12);

        let arrived = start.interpolate(&end, 1.0).orientation.heading;
        assert_relative_eq!(arrived.sin(), 10.0_f64.to_radians().sin(), epsilon = 1e-12);
        assert_relative_eq!(arrived.cos(), 10.0_f64.to_radians().cos(), epsilon = 1e-12);
    }

    #[test]
    fn shortest_turn_picks_the_smaller_arc() {
        assert_relative_eq!(shortest_turn(350.0, 10.0, 360.0), 20.0, epsilon = 1e-12);
        assert_relative_eq!(shortest_turn(10.0, 350.0, 360.0), -20.0, epsilon = 1e-12);
        assert_relative_eq!(shortest_turn(170.0, -170.0, 360.0), 20.0, epsilon = 1e-12);
        assert_relative_eq!(shortest_turn(0.0, 90.0, 360.0), 90.0, epsilon = 1e-12);
    }

    #[test]
    fn matrices_are_inverse_of_each_other() {
        let tilted = HeadingPitchRoll::from_degrees(30.0, -20.0, 5.0);
        let globe = SimulatedGlobe::new(
            EllipsoidProjector::default(),
            pose(20.2, 49.3, 5000.0, tilted),
            1.0,
            Duration::from_millis(16),
        );
        let camera = globe.camera();
        let product = DMat4::from_cols_array(&camera.view_matrix())
            * DMat4::from_cols_array(&camera.inverse_view_matrix());
        assert_relative_eq!(product, DMat4::IDENTITY, epsilon = 1e-6);
    }

    #[test]
    fn outline_entities() {
        let mut globe = SimulatedGlobe::new(
            FlatProjector::default(),
            pose(0.0, 0.0, 1000.0, HeadingPitchRoll::default()),
            1.0,
            Duration::from_millis(16),
        );
        let rect = GeodeticRect::new(1.0, 2.0, 3.0, 4.0).unwrap();
        let id = globe.add_outline(rect, Color::RED.with_alpha(0.2));

        let (_, entity) = globe.entities().next().unwrap();
        let south_west = FlatProjector::default().project(1.0, 2.0, 0.0);
        assert_eq!(entity.outline[0], south_west);
        assert!(globe.remove_entity(id));
        assert!(!globe.remove_entity(id));
    }
}
