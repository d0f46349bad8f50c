use geofuse_common::GeoCoord;
use glam::{DMat3, DVec3};

pub const R0: f64 = 6_371_000.0;

const NORMAL_SAMPLE_HEIGHT: f64 = 1.0;
const NORTH_SAMPLE_DEGREES: f64 = 1e-6;

/// Maps geodetic coordinates (degrees, metres above the reference surface) into
/// the Cartesian frame shared by both renderers.
pub trait GeodeticProjector {
    fn project(&self, longitude_deg: f64, latitude_deg: f64, height: f64) -> DVec3;

    fn project_surface(&self, longitude_deg: f64, latitude_deg: f64) -> DVec3 {
        self.project(longitude_deg, latitude_deg, 0.0)
    }

    fn project_coord(&self, coord: GeoCoord, height: f64) -> DVec3 {
        self.project(coord.longitude, coord.latitude, height)
    }

    /// Local east/north/up frame as matrix columns, sampled from the projection
    /// itself so every projector yields a frame consistent with its own surface.
    fn east_north_up(&self, longitude_deg: f64, latitude_deg: f64) -> DMat3 {
        let origin = self.project_surface(longitude_deg, latitude_deg);
        let above = self.project(longitude_deg, latitude_deg, NORMAL_SAMPLE_HEIGHT);
        let up = (above - origin).normalize_or(DVec3::Z);

        // sample towards the equator at the north pole so the difference stays finite
        let (north_lat, sign) = if latitude_deg + NORTH_SAMPLE_DEGREES > 90.0 {
            (latitude_deg - NORTH_SAMPLE_DEGREES, -1.0)
        } else {
            (latitude_deg + NORTH_SAMPLE_DEGREES, 1.0)
        };
        let towards_north = sign * (self.project_surface(longitude_deg, north_lat) - origin);
        let north = (towards_north - up * towards_north.dot(up)).normalize_or(DVec3::Y);
        let east = north.cross(up);

        DMat3::from_cols(east, north, up)
    }
}

/// Reference ellipsoid given by its semi-axes in metres.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ellipsoid {
    pub semimajor_axis: f64,
    pub semiminor_axis: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        semimajor_axis: 6_378_137.0,
        semiminor_axis: 6_356_752.314_245_179,
    };

    pub fn eccentricity_squared(&self) -> f64 {
        let a2 = self.semimajor_axis * self.semimajor_axis;
        let b2 = self.semiminor_axis * self.semiminor_axis;
        (a2 - b2) / a2
    }
}

/// Geodetic to Earth-centered, Earth-fixed coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EllipsoidProjector {
    ellipsoid: Ellipsoid,
}

impl Default for EllipsoidProjector {
    fn default() -> Self {
        Self::new(Ellipsoid::WGS84)
    }
}

impl EllipsoidProjector {
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        Self { ellipsoid }
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }
}

impl GeodeticProjector for EllipsoidProjector {
    fn project(&self, longitude_deg: f64, latitude_deg: f64, height: f64) -> DVec3 {
        let longitude = longitude_deg.to_radians();
        let latitude = latitude_deg.to_radians();
        let e2 = self.ellipsoid.eccentricity_squared();
        let a = self.ellipsoid.semimajor_axis;
        let sin_lat = latitude.sin();
        let prime_vertical = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();

        let x = (prime_vertical + height) * latitude.cos() * longitude.cos();
        let y = (prime_vertical + height) * latitude.cos() * longitude.sin();
        let z = (prime_vertical * (1.0 - e2) + height) * sin_lat;
        DVec3::new(x, y, z)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SphereProjector {
    pub radius: f64,
}

impl Default for SphereProjector {
    fn default() -> Self {
        Self { radius: R0 }
    }
}

impl GeodeticProjector for SphereProjector {
    fn project(&self, longitude_deg: f64, latitude_deg: f64, height: f64) -> DVec3 {
        let r = self.radius + height;
        let longitude = longitude_deg.to_radians();
        let latitude = latitude_deg.to_radians();
        let x = r * latitude.cos() * longitude.cos();
        let y = r * latitude.cos() * longitude.sin();
        let z = r * latitude.sin();
        DVec3::new(x, y, z)
    }
}

/// Equirectangular flat earth: east is +X, north is +Y, height is +Z.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlatProjector {
    pub metres_per_degree: f64,
}

impl Default for FlatProjector {
    fn default() -> Self {
        Self {
            metres_per_degree: 111_320.0,
        }
    }
}

impl GeodeticProjector for FlatProjector {
    fn project(&self, longitude_deg: f64, latitude_deg: f64, height: f64) -> DVec3 {
        DVec3::new(
            longitude_deg * self.metres_per_degree,
            latitude_deg * self.metres_per_degree,
            height,
        )
    }
}
