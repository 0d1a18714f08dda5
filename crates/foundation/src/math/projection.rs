//! Geographic degrees -> host plane units.
//!
//! Plane units belong to the host map, so the projection is always injected.
//! [`WebMercator`] matches the unit-square mercator space most web map hosts
//! render in; any `Fn(LonLat, f64) -> Vec3` can stand in for it.

use std::f64::consts::PI;

use super::geodesy::{EARTH_MEAN_RADIUS_M, LonLat, METERS_PER_DEG_LAT};
use super::vec::Vec3;

pub trait PlaneProjection {
    /// Project a geographic position at `alt_m` meters into plane units.
    fn project(&self, p: LonLat, alt_m: f64) -> Vec3;

    /// Plane units per local meter at `lat_deg`.
    ///
    /// The default measures one meter northwards through [`Self::project`].
    fn meters_to_plane_scale(&self, lat_deg: f64) -> f64 {
        let a = self.project(LonLat::new(0.0, lat_deg), 0.0);
        let b = self.project(LonLat::new(0.0, lat_deg + 1.0 / METERS_PER_DEG_LAT), 0.0);
        (b - a).length()
    }
}

impl<F> PlaneProjection for F
where
    F: Fn(LonLat, f64) -> Vec3,
{
    fn project(&self, p: LonLat, alt_m: f64) -> Vec3 {
        self(p, alt_m)
    }
}

/// Unit-square spherical mercator: `x` grows east, `y` grows south.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct WebMercator;

impl WebMercator {
    pub fn earth_circumference_m() -> f64 {
        2.0 * PI * EARTH_MEAN_RADIUS_M
    }

    pub fn unproject(&self, p: Vec3) -> LonLat {
        let lon = p.x * 360.0 - 180.0;
        let y2 = 180.0 - p.y * 360.0;
        let lat = 360.0 / PI * (y2 * PI / 180.0).exp().atan() - 90.0;
        LonLat::new(lon, lat)
    }
}

impl PlaneProjection for WebMercator {
    fn project(&self, p: LonLat, alt_m: f64) -> Vec3 {
        let x = (180.0 + p.lon_deg) / 360.0;
        let y = (180.0
            - (180.0 / PI) * (PI / 4.0 + p.lat_deg * PI / 360.0).tan().ln())
            / 360.0;
        let z = alt_m * self.meters_to_plane_scale(p.lat_deg);
        Vec3::new(x, y, z)
    }

    fn meters_to_plane_scale(&self, lat_deg: f64) -> f64 {
        1.0 / (Self::earth_circumference_m() * lat_deg.to_radians().cos())
    }
}
