//! Reference ellipsoids and datum transformation
//!
//! Converts 3D geodetic positions between the WGS84 ellipsoid and the
//! Airy 1830 ellipsoid (the OSGB36 reference surface) via the published
//! 7-parameter Helmert transform. All functions here are pure and defined
//! for every finite input; nothing in this module can fail.

use crate::coord::GeographicCoordinate;

/// A reference ellipsoid described by its semi-major and semi-minor axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis in metres
    pub a: f64,
    /// Semi-minor axis in metres
    pub b: f64,
}

impl Ellipsoid {
    /// First eccentricity squared, `(a² - b²) / a²`.
    #[inline]
    pub fn e_squared(&self) -> f64 {
        ((self.a * self.a) - (self.b * self.b)) / (self.a * self.a)
    }
}

/// WGS84 ellipsoid (GPS positions).
pub const WGS84: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    b: 6_356_752.3142,
};

/// Airy 1830 ellipsoid (OSGB36 positions).
pub const AIRY_1830: Ellipsoid = Ellipsoid {
    a: 6_377_563.396,
    b: 6_356_256.909,
};

/// Convergence threshold for the iterative latitude recovery, radians.
const LAT_CONVERGENCE_RAD: f64 = 1e-12;

/// Iteration cap for latitude recovery. UK-latitude inputs converge well
/// inside this bound.
const LAT_MAX_ITERATIONS: usize = 12;

/// Convert a geodetic position (radians, metres) to geocentric Cartesian
/// coordinates on the given ellipsoid.
pub fn to_cartesian(lat_rad: f64, lon_rad: f64, height: f64, ellipsoid: &Ellipsoid) -> [f64; 3] {
    let e2 = ellipsoid.e_squared();
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    // Transverse radius of curvature at this latitude
    let nu = ellipsoid.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();

    [
        (nu + height) * cos_lat * lon_rad.cos(),
        (nu + height) * cos_lat * lon_rad.sin(),
        ((1.0 - e2) * nu + height) * sin_lat,
    ]
}

/// Convert geocentric Cartesian coordinates back to a geodetic position
/// (radians, metres) on the given ellipsoid.
///
/// Latitude is recovered iteratively; the loop stops once the update falls
/// below [`LAT_CONVERGENCE_RAD`] or after [`LAT_MAX_ITERATIONS`] passes.
pub fn from_cartesian(xyz: [f64; 3], ellipsoid: &Ellipsoid) -> (f64, f64, f64) {
    let [x, y, z] = xyz;
    let e2 = ellipsoid.e_squared();

    let lon = y.atan2(x);
    let p = (x * x + y * y).sqrt();

    let mut lat = (z / (p * (1.0 - e2))).atan();
    let mut nu = ellipsoid.a;
    for _ in 0..LAT_MAX_ITERATIONS {
        let sin_lat = lat.sin();
        nu = ellipsoid.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let next = ((z + e2 * nu * sin_lat) / p).atan();
        let delta = (next - lat).abs();
        lat = next;
        if delta < LAT_CONVERGENCE_RAD {
            break;
        }
    }

    let height = p / lat.cos() - nu;
    (lat, lon, height)
}

/// 7-parameter Helmert similarity transform between two Cartesian frames.
///
/// Translations are metres, rotations arcseconds, scale parts-per-million —
/// the form in which the Ordnance Survey publishes them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Helmert {
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
    pub rx_arcsec: f64,
    pub ry_arcsec: f64,
    pub rz_arcsec: f64,
    pub scale_ppm: f64,
}

/// Published Ordnance Survey transform taking WGS84 Cartesian coordinates
/// into the OSGB36 frame.
pub const WGS84_TO_OSGB36: Helmert = Helmert {
    tx: -446.448,
    ty: 125.157,
    tz: -542.060,
    rx_arcsec: -0.1502,
    ry_arcsec: -0.2470,
    rz_arcsec: -0.8421,
    scale_ppm: 20.4894,
};

impl Helmert {
    /// The reverse transform: all seven parameters negated. Exact enough at
    /// these magnitudes; the residual is far below the transform's own
    /// accuracy.
    #[inline]
    pub fn inverse(&self) -> Helmert {
        Helmert {
            tx: -self.tx,
            ty: -self.ty,
            tz: -self.tz,
            rx_arcsec: -self.rx_arcsec,
            ry_arcsec: -self.ry_arcsec,
            rz_arcsec: -self.rz_arcsec,
            scale_ppm: -self.scale_ppm,
        }
    }

    /// Apply translation, small-angle rotation and scale to a Cartesian
    /// position.
    pub fn apply(&self, xyz: [f64; 3]) -> [f64; 3] {
        let [x, y, z] = xyz;
        let s = 1.0 + self.scale_ppm * 1e-6;
        let rx = (self.rx_arcsec / 3600.0).to_radians();
        let ry = (self.ry_arcsec / 3600.0).to_radians();
        let rz = (self.rz_arcsec / 3600.0).to_radians();

        [
            self.tx + s * x - rz * y + ry * z,
            self.ty + rz * x + s * y - rx * z,
            self.tz - ry * x + rx * y + s * z,
        ]
    }
}

/// Transform a WGS84 position to OSGB36 latitude/longitude in degrees.
pub fn wgs84_to_osgb36(coord: GeographicCoordinate) -> (f64, f64) {
    let xyz = to_cartesian(coord.lat.to_radians(), coord.lon.to_radians(), 0.0, &WGS84);
    let xyz = WGS84_TO_OSGB36.apply(xyz);
    let (lat, lon, _height) = from_cartesian(xyz, &AIRY_1830);
    (lat.to_degrees(), lon.to_degrees())
}

/// Transform an OSGB36 latitude/longitude (degrees) to a WGS84 position.
pub fn osgb36_to_wgs84(lat: f64, lon: f64) -> GeographicCoordinate {
    let xyz = to_cartesian(lat.to_radians(), lon.to_radians(), 0.0, &AIRY_1830);
    let xyz = WGS84_TO_OSGB36.inverse().apply(xyz);
    let (lat, lon, _height) = from_cartesian(xyz, &WGS84);
    GeographicCoordinate::new(lat.to_degrees(), lon.to_degrees())
}
