/// Length of one degree of latitude under the flat-earth approximation (meters).
pub const METERS_PER_DEG_LAT: f64 = 111_320.0;
/// Mean earth radius (meters), used for great-circle distances and mercator scale.
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_008.8;

/// Length of one degree of longitude at `lat_deg` (meters).
///
/// Flat-earth approximation: good for sub-kilometre footprints, degrades
/// beyond a few kilometres from the latitude it is evaluated at.
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    METERS_PER_DEG_LAT * lat_deg.to_radians().cos()
}

/// Geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct LonLat {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl LonLat {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }

    pub fn is_finite(self) -> bool {
        self.lon_deg.is_finite() && self.lat_deg.is_finite()
    }

    pub fn as_array(self) -> [f64; 2] {
        [self.lon_deg, self.lat_deg]
    }
}

/// Haversine distance between two geographic positions (meters).
pub fn great_circle_distance_m(a: LonLat, b: LonLat) -> f64 {
    let lat_a = a.lat_deg.to_radians();
    let lat_b = b.lat_deg.to_radians();
    let d_lat = lat_b - lat_a;
    let d_lon = (b.lon_deg - a.lon_deg).to_radians();

    let h = (d_lat * 0.5).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon * 0.5).sin().powi(2);
    2.0 * EARTH_MEAN_RADIUS_M * h.sqrt().min(1.0).asin()
}
