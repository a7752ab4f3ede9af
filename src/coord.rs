//! Coordinate value types
//!
//! This module provides the two canonical coordinate representations:
//! [`GeographicCoordinate`] (WGS84 latitude/longitude in degrees) and
//! [`GridCoordinate`] (OSGB36 National Grid easting/northing in metres).
//!
//! Both are immutable value types. Derived representations (grid coordinate,
//! formatted grid reference, display string) are computed on demand from the
//! canonical fields and never cached, so there is no stale state to
//! invalidate when a new coordinate is constructed.

use crate::{Result, greatcircle, gridref, projection};
use crate::greatcircle::Unit;

/// A WGS84 position in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeographicCoordinate {
    /// Latitude in degrees, positive north
    pub lat: f64,
    /// Longitude in degrees, positive east
    pub lon: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl GeographicCoordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Parse an alphanumeric grid reference and convert it to WGS84.
    ///
    /// Accepts the same forms as [`gridref::parse`]: `"NY341151"`,
    /// `"NY 341 151"`, lowercase, surrounding whitespace.
    pub fn from_gridref(text: &str) -> Result<Self> {
        Ok(gridref::parse(text)?.to_wgs84())
    }

    /// Project this position onto the National Grid (integer metres).
    #[inline]
    pub fn to_grid(self) -> GridCoordinate {
        projection::wgs84_to_grid(self)
    }

    /// 10-digit (1 m precision) display grid reference, e.g. `NY 34100 15100`.
    pub fn osgb10(self) -> String {
        gridref::format_spaced(&self.to_grid(), 5)
    }

    /// 6-digit (100 m precision) compact grid reference, e.g. `NY341151`.
    pub fn osgb6(self) -> String {
        gridref::format(&self.to_grid(), 3)
    }

    /// Great-circle distance to another point in the requested unit.
    #[inline]
    pub fn distance_to(self, other: GeographicCoordinate, unit: Unit) -> f64 {
        greatcircle::distance(self, other, unit)
    }

    /// Initial great-circle bearing to another point, degrees in `[0, 360)`.
    #[inline]
    pub fn bearing_to(self, other: GeographicCoordinate) -> f64 {
        greatcircle::bearing(self, other)
    }
}

impl From<geo::Point<f64>> for GeographicCoordinate {
    /// geo convention: x = longitude, y = latitude.
    fn from(p: geo::Point<f64>) -> Self {
        Self { lat: p.y(), lon: p.x() }
    }
}

impl From<GeographicCoordinate> for geo::Point<f64> {
    fn from(c: GeographicCoordinate) -> Self {
        geo::Point::new(c.lon, c.lat)
    }
}

impl std::fmt::Display for GeographicCoordinate {
    /// Degrees-and-decimal-minutes form, e.g. `N54 31.620 W003 00.990`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lat_deg = self.lat.abs().floor();
        let lat_min = (self.lat.abs() - lat_deg) * 60.0;
        let lon_deg = self.lon.abs().floor();
        let lon_min = (self.lon.abs() - lon_deg) * 60.0;
        write!(
            f,
            "{}{:02} {:06.3} {}{:03} {:06.3}",
            if self.lat >= 0.0 { 'N' } else { 'S' },
            lat_deg as u32,
            lat_min,
            if self.lon >= 0.0 { 'E' } else { 'W' },
            lon_deg as u32,
            lon_min,
        )
    }
}

/// An OSGB36 National Grid position in whole metres.
///
/// Non-negative within the defined UK extent (0–700 km east,
/// 0–1300 km north); values outside that range are representable but
/// correspond to nothing on the published grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridCoordinate {
    /// Metres east of the false origin
    pub easting: i64,
    /// Metres north of the false origin
    pub northing: i64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl GridCoordinate {
    pub fn new(easting: i64, northing: i64) -> Self {
        Self { easting, northing }
    }

    /// Parse an alphanumeric grid reference, e.g. `"NY341151"`.
    pub fn from_gridref(text: &str) -> Result<Self> {
        gridref::parse(text)
    }

    /// Unproject to WGS84 latitude/longitude.
    #[inline]
    pub fn to_wgs84(self) -> GeographicCoordinate {
        projection::grid_to_wgs84(&self)
    }

    /// Compact grid reference at the given per-axis digit count.
    pub fn gridref(self, digits_per_axis: usize) -> String {
        gridref::format(&self, digits_per_axis)
    }
}

impl std::fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{} N{}", self.easting, self.northing)
    }
}
