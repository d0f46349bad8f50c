use geofuse_common::GeodeticRect;
use glam::DVec3;

use crate::{
    common::{convention::FrameConvention, projection::GeodeticProjector},
    data::registry::{PlacedObject, PlacedObjectId, Registry},
    error::SyncError,
    render::{MeshRenderer, ObjectTransform},
};

const MIN_LENGTH: f64 = 1e-9;

/// Where an object sits and which way it faces, in the mesh world.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ObjectPose {
    pub position: DVec3,
    /// Point the object's +Z is turned towards.
    pub target: DVec3,
    pub up: DVec3,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrientReport {
    pub oriented: usize,
    pub skipped: Vec<(PlacedObjectId, SyncError)>,
}

/// Stands every placed object on the globe surface at the centre of its
/// footprint, facing away from the globe centre with its up axis fixed by the
/// footprint's western edge.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ObjectOrienter {
    normal_sample_height: f64,
    convention: FrameConvention,
}

impl Default for ObjectOrienter {
    fn default() -> Self {
        Self::new(1.0, FrameConvention::default())
    }
}

impl ObjectOrienter {
    pub fn new(normal_sample_height: f64, convention: FrameConvention) -> Self {
        Self {
            normal_sample_height,
            convention,
        }
    }

    pub fn compute_pose(
        &self,
        projector: &impl GeodeticProjector,
        footprint: &GeodeticRect,
    ) -> Result<ObjectPose, SyncError> {
        if footprint.is_degenerate() {
            return Err(SyncError::DegenerateGeometry("footprint has no extent"));
        }

        let center_coord = footprint.center();
        let center = projector.project_coord(center_coord, 0.0);
        let center_high = projector.project_coord(center_coord, self.normal_sample_height);
        let bottom_left = projector.project_coord(footprint.bottom_left(), 0.0);
        let top_left = projector.project_coord(footprint.top_left(), 0.0);

        let samples = [center, center_high, bottom_left, top_left];
        if !samples.iter().all(|p| p.is_finite()) {
            return Err(SyncError::DegenerateGeometry("non-finite projection"));
        }

        let up = (bottom_left - top_left).normalize_or_zero();
        if up == DVec3::ZERO {
            return Err(SyncError::DegenerateGeometry("zero-length up vector"));
        }
        let outward = center_high - center;
        if outward.length() < MIN_LENGTH {
            return Err(SyncError::DegenerateGeometry("zero-length outward direction"));
        }
        if outward.normalize().cross(up).length() < MIN_LENGTH {
            return Err(SyncError::DegenerateGeometry("up vector parallel to outward direction"));
        }

        Ok(ObjectPose {
            position: self.convention.point_to_mesh(center),
            target: self.convention.point_to_mesh(center_high),
            up: self.convention.direction_to_mesh(up),
        })
    }

    pub fn apply(pose: &ObjectPose, transform: &mut impl ObjectTransform) {
        transform.set_position(pose.position);
        transform.set_up(pose.up);
        transform.look_at(pose.target);
    }

    pub fn orient<M: MeshRenderer>(
        &self,
        projector: &impl GeodeticProjector,
        registry: &Registry<M::Handle>,
        mesh: &mut M,
    ) -> OrientReport {
        let mut report = OrientReport::default();
        for (id, object) in registry.iter() {
            match self.orient_object(projector, object, mesh) {
                Ok(()) => report.oriented += 1,
                Err(err) => report.skipped.push((id, err)),
            }
        }
        report
    }

    fn orient_object<M: MeshRenderer>(
        &self,
        projector: &impl GeodeticProjector,
        object: &PlacedObject<M::Handle>,
        mesh: &mut M,
    ) -> Result<(), SyncError> {
        let pose = self.compute_pose(projector, &object.footprint)?;
        let transform = mesh
            .transform_mut(object.handle)
            .ok_or(SyncError::StaleHandle)?;
        Self::apply(&pose, transform);
        Ok(())
    }
}
