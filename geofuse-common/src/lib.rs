use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeodeticRectError {
    #[error("longitude {0} outside of [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("latitude {0} outside of [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("inverted bounds: min ({min_lon}, {min_lat}) exceeds max ({max_lon}, {max_lat})")]
    Inverted {
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    },
}

/// Geodetic position in degrees, longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoCoord {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoCoord {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct RawGeodeticRect {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

/// Bounding rectangle of a placed object, degrees.
///
/// Bounds may coincide on an axis (a degenerate footprint); consumers that need
/// a direction across the rectangle have to check [`GeodeticRect::is_degenerate`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawGeodeticRect")]
pub struct GeodeticRect {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

impl TryFrom<RawGeodeticRect> for GeodeticRect {
    type Error = GeodeticRectError;

    fn try_from(raw: RawGeodeticRect) -> Result<Self, Self::Error> {
        Self::new(raw.min_lon, raw.min_lat, raw.max_lon, raw.max_lat)
    }
}

impl GeodeticRect {
    pub fn new(
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> Result<Self, GeodeticRectError> {
        for lon in [min_lon, max_lon] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(GeodeticRectError::LongitudeOutOfRange(lon));
            }
        }
        for lat in [min_lat, max_lat] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(GeodeticRectError::LatitudeOutOfRange(lat));
            }
        }
        if min_lon > max_lon || min_lat > max_lat {
            return Err(GeodeticRectError::Inverted {
                min_lon,
                min_lat,
                max_lon,
                max_lat,
            });
        }

        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    pub fn from_corners(min: GeoCoord, max: GeoCoord) -> Result<Self, GeodeticRectError> {
        Self::new(min.longitude, min.latitude, max.longitude, max.latitude)
    }

    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    pub fn center(&self) -> GeoCoord {
        GeoCoord::new(
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    pub fn bottom_left(&self) -> GeoCoord {
        GeoCoord::new(self.min_lon, self.min_lat)
    }

    pub fn top_left(&self) -> GeoCoord {
        GeoCoord::new(self.min_lon, self.max_lat)
    }

    /// Corners in counter-clockwise order starting at the south-west one.
    pub fn corners(&self) -> [GeoCoord; 4] {
        [
            GeoCoord::new(self.min_lon, self.min_lat),
            GeoCoord::new(self.max_lon, self.min_lat),
            GeoCoord::new(self.max_lon, self.max_lat),
            GeoCoord::new(self.min_lon, self.max_lat),
        ]
    }

    pub fn is_degenerate(&self) -> bool {
        self.min_lon == self.max_lon || self.min_lat == self.max_lat
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

impl<T> From<(T, T)> for Size<T> {
    fn from(value: (T, T)) -> Self {
        Size {
            width: value.0,
            height: value.1,
        }
    }
}

impl Size<u32> {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.width as f64 / self.height as f64)
        }
    }
}
