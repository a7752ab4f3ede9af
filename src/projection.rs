//! Transverse Mercator projection for the National Grid
//!
//! Maps OSGB36 latitude/longitude to and from National Grid
//! easting/northing using the Ordnance Survey's series expansions on the
//! Airy 1830 ellipsoid. The formulas are defined for every finite input but
//! are only meaningful within the British Isles; out-of-range input yields
//! finite but practically meaningless output.

use crate::coord::{GeographicCoordinate, GridCoordinate};
use crate::datum::{self, AIRY_1830};

/// National Grid scale factor on the central meridian.
pub const F0: f64 = 0.999_601_271_7;

/// True origin latitude, 49°N, radians.
const PHI0: f64 = 49.0 * std::f64::consts::PI / 180.0;

/// True origin longitude, 2°W, radians.
const LAMBDA0: f64 = -2.0 * std::f64::consts::PI / 180.0;

/// False origin easting, metres.
pub const E0: f64 = 400_000.0;

/// False origin northing, metres.
pub const N0: f64 = -100_000.0;

/// Footpoint-latitude iteration threshold, radians (well under a metre).
const FOOTPOINT_CONVERGENCE: f64 = 1e-6;

const FOOTPOINT_MAX_ITERATIONS: usize = 10;

#[inline]
fn sin_squared(x: f64) -> f64 {
    x.sin() * x.sin()
}

#[inline]
fn tan_squared(x: f64) -> f64 {
    x.tan() * x.tan()
}

/// Meridional arc length from the true origin latitude to `phi`, metres.
fn meridional_arc(phi: f64) -> f64 {
    let a = AIRY_1830.a;
    let b = AIRY_1830.b;
    let n = (a - b) / (a + b);
    let n2 = n * n;
    let n3 = n2 * n;

    (b * F0)
        * (((1.0 + n + (5.0 / 4.0) * n2 + (5.0 / 4.0) * n3) * (phi - PHI0))
            - ((3.0 * n + 3.0 * n2 + (21.0 / 8.0) * n3)
                * (phi - PHI0).sin()
                * (phi + PHI0).cos())
            + (((15.0 / 8.0) * n2 + (15.0 / 8.0) * n3)
                * (2.0 * (phi - PHI0)).sin()
                * (2.0 * (phi + PHI0)).cos())
            - ((35.0 / 24.0) * n3 * (3.0 * (phi - PHI0)).sin() * (3.0 * (phi + PHI0)).cos()))
}

/// Project an OSGB36 latitude/longitude (degrees) onto the National Grid,
/// rounding to whole metres.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn latlon_to_grid(osgb_lat: f64, osgb_lon: f64) -> GridCoordinate {
    let e2 = AIRY_1830.e_squared();
    let phi = osgb_lat.to_radians();
    let lambda = osgb_lon.to_radians();

    let nu = AIRY_1830.a * F0 * (1.0 - e2 * sin_squared(phi)).powf(-0.5);
    let rho = AIRY_1830.a * F0 * (1.0 - e2) * (1.0 - e2 * sin_squared(phi)).powf(-1.5);
    let eta2 = nu / rho - 1.0;

    let m = meridional_arc(phi);

    let i = m + N0;
    let ii = (nu / 2.0) * phi.sin() * phi.cos();
    let iii = (nu / 24.0)
        * phi.sin()
        * phi.cos().powi(3)
        * (5.0 - tan_squared(phi) + 9.0 * eta2);
    let iiia = (nu / 720.0)
        * phi.sin()
        * phi.cos().powi(5)
        * (61.0 - 58.0 * tan_squared(phi) + phi.tan().powi(4));
    let iv = nu * phi.cos();
    let v = (nu / 6.0) * phi.cos().powi(3) * ((nu / rho) - tan_squared(phi));
    let vi = (nu / 120.0)
        * phi.cos().powi(5)
        * (5.0 - 18.0 * tan_squared(phi)
            + phi.tan().powi(4)
            + 14.0 * eta2
            - 58.0 * tan_squared(phi) * eta2);

    let dl = lambda - LAMBDA0;
    let northing = i + ii * dl.powi(2) + iii * dl.powi(4) + iiia * dl.powi(6);
    let easting = E0 + iv * dl + v * dl.powi(3) + vi * dl.powi(5);

    GridCoordinate::new(easting.round() as i64, northing.round() as i64)
}

/// Unproject a National Grid position to OSGB36 latitude/longitude, degrees.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn grid_to_latlon(grid: &GridCoordinate) -> (f64, f64) {
    let e2 = AIRY_1830.e_squared();
    let easting = grid.easting as f64;
    let northing = grid.northing as f64;

    // Footpoint latitude: solve M(phi') = N - N0 by Newton-style updates
    let mut phi = (northing - N0) / (AIRY_1830.a * F0) + PHI0;
    for _ in 0..FOOTPOINT_MAX_ITERATIONS {
        let m = meridional_arc(phi);
        let delta = (northing - N0 - m) / (AIRY_1830.a * F0);
        phi += delta;
        if delta.abs() < FOOTPOINT_CONVERGENCE {
            break;
        }
    }

    let nu = AIRY_1830.a * F0 * (1.0 - e2 * sin_squared(phi)).powf(-0.5);
    let rho = AIRY_1830.a * F0 * (1.0 - e2) * (1.0 - e2 * sin_squared(phi)).powf(-1.5);
    let eta2 = nu / rho - 1.0;

    let tan_phi = phi.tan();
    let tan2 = tan_phi * tan_phi;
    let tan4 = tan2 * tan2;
    let tan6 = tan4 * tan2;
    let sec_phi = 1.0 / phi.cos();

    let vii = tan_phi / (2.0 * rho * nu);
    let viii = (tan_phi / (24.0 * rho * nu.powi(3)))
        * (5.0 + 3.0 * tan2 + eta2 - 9.0 * tan2 * eta2);
    let ix = (tan_phi / (720.0 * rho * nu.powi(5))) * (61.0 + 90.0 * tan2 + 45.0 * tan4);
    let x = sec_phi / nu;
    let xi = (sec_phi / (6.0 * nu.powi(3))) * ((nu / rho) + 2.0 * tan2);
    let xii = (sec_phi / (120.0 * nu.powi(5))) * (5.0 + 28.0 * tan2 + 24.0 * tan4);
    let xiia = (sec_phi / (5040.0 * nu.powi(7)))
        * (61.0 + 662.0 * tan2 + 1320.0 * tan4 + 720.0 * tan6);

    let de = easting - E0;
    let lat = phi - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
    let lon = LAMBDA0 + x * de - xi * de.powi(3) + xii * de.powi(5) - xiia * de.powi(7);

    (lat.to_degrees(), lon.to_degrees())
}

/// Project a WGS84 position onto the National Grid: datum shift to OSGB36,
/// then Transverse Mercator.
pub fn wgs84_to_grid(coord: GeographicCoordinate) -> GridCoordinate {
    let (osgb_lat, osgb_lon) = datum::wgs84_to_osgb36(coord);
    latlon_to_grid(osgb_lat, osgb_lon)
}

/// Unproject a National Grid position all the way back to WGS84.
pub fn grid_to_wgs84(grid: &GridCoordinate) -> GeographicCoordinate {
    let (osgb_lat, osgb_lon) = grid_to_latlon(grid);
    datum::osgb36_to_wgs84(osgb_lat, osgb_lon)
}
