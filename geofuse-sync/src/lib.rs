pub mod app;
pub mod common;
pub mod control;
pub mod data;
pub mod error;
pub mod render;

pub use app::{FrameReport, FusionContext};
pub use common::convention::{AxisPermutation, FrameConvention, MatrixLayout, SignedAxis};
pub use common::projection::{
    Ellipsoid, EllipsoidProjector, FlatProjector, GeodeticProjector, SphereProjector,
};
pub use data::registry::{PlacedObject, PlacedObjectId, Registry};
pub use data::settings::SyncSettings;
pub use error::SyncError;
