//! Great-circle distance and bearing
//!
//! Spherical-earth calculations between two WGS84 positions, using a single
//! mean radius throughout — no ellipsoidal maths leaks into this module.
//! Distances use the Haversine formula, which stays numerically stable for
//! the small angular separations typical of nearest-marker queries.

use crate::coord::GeographicCoordinate;

/// Mean earth radius, kilometres. The only radius used in this module.
pub const MEAN_EARTH_RADIUS_KM: f64 = 6371.0;

const KM_TO_MILES: f64 = 0.621_371;
const KM_TO_METRES: f64 = 1000.0;
const METRES_TO_YARDS: f64 = 1.093_61;

/// Distance display unit. Storage and ranking are always kilometres; a unit
/// is applied only when presenting a distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unit {
    Km,
    Miles,
    Metres,
    Yards,
}

impl Unit {
    /// Scale a kilometre value into this unit.
    #[inline]
    pub fn from_km(self, km: f64) -> f64 {
        match self {
            Unit::Km => km,
            Unit::Miles => km * KM_TO_MILES,
            Unit::Metres => km * KM_TO_METRES,
            Unit::Yards => km * KM_TO_METRES * METRES_TO_YARDS,
        }
    }

    /// Short suffix used when rendering a distance.
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Km => "km",
            Unit::Miles => "mi",
            Unit::Metres => "m",
            Unit::Yards => "yd",
        }
    }

    /// Render a kilometre distance as display text, e.g. `3.2km` or `850m`.
    /// Whole-unit counts for metres/yards, one decimal for km/miles.
    pub fn format(self, km: f64) -> String {
        let value = self.from_km(km);
        match self {
            Unit::Km | Unit::Miles => format!("{:.1}{}", value, self.suffix()),
            Unit::Metres | Unit::Yards => format!("{:.0}{}", value, self.suffix()),
        }
    }
}

/// Haversine distance between two points, scaled to the requested unit.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn distance(a: GeographicCoordinate, b: GeographicCoordinate, unit: Unit) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    unit.from_km(MEAN_EARTH_RADIUS_KM * c)
}

/// Initial bearing from `a` to `b`, degrees normalized into `[0, 360)`.
///
/// At coincident points `atan2(0, 0)` gives 0°; antipodal pairs are equally
/// degenerate. Neither case is special-cased.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bearing(a: GeographicCoordinate, b: GeographicCoordinate) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let y = d_lon.sin() * lat_b.cos();
    let x = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * d_lon.cos();

    let b = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid of a tiny negative angle rounds up to exactly 360.0
    if b >= 360.0 { 0.0 } else { b }
}

/// Distance when either endpoint may still be unknown (no location fix yet).
/// Absent input is "not ready", not an error.
#[inline]
pub fn distance_opt(
    a: Option<GeographicCoordinate>,
    b: Option<GeographicCoordinate>,
    unit: Unit,
) -> Option<f64> {
    Some(distance(a?, b?, unit))
}

/// Bearing when either endpoint may still be unknown.
#[inline]
pub fn bearing_opt(
    a: Option<GeographicCoordinate>,
    b: Option<GeographicCoordinate>,
) -> Option<f64> {
    Some(bearing(a?, b?))
}
