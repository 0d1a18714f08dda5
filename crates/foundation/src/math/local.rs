//! Local facility meters <-> geographic degrees.
//!
//! Local space is anchored at a single geographic point: `+x` is east, `+y` is
//! north, both in meters. Two conventions exist and each has its own entry
//! point:
//!
//! - **footprint** ([`LocalFrame::footprint_to_geo`]): the origin is the
//!   south-west corner of a `width x depth` footprint centred on the anchor.
//!   Building, bay, conveyor and dock data use this.
//! - **centred** ([`LocalFrame::centered_to_geo`]): the origin is the anchor
//!   itself. Path data uses this.
//!
//! Degree lengths are evaluated once at the anchor latitude and held fixed.

use std::fmt;

use super::geodesy::{LonLat, METERS_PER_DEG_LAT, meters_per_deg_lon};
use super::vec::Vec2;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GeoError {
    InvalidAnchor { lat_deg: f64, lon_deg: f64 },
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::InvalidAnchor { lat_deg, lon_deg } => {
                write!(f, "invalid anchor: lat={lat_deg} lon={lon_deg}")
            }
        }
    }
}

impl std::error::Error for GeoError {}

/// Geographic origin of a facility's local coordinate space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Anchor {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl Anchor {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }

    pub fn lon_lat(self) -> LonLat {
        LonLat::new(self.lon_deg, self.lat_deg)
    }

    pub fn validate(self) -> Result<Self, GeoError> {
        let ok = self.lat_deg.is_finite()
            && self.lon_deg.is_finite()
            && self.lat_deg.abs() <= 90.0
            && self.lon_deg.abs() <= 180.0;
        if ok {
            Ok(self)
        } else {
            Err(GeoError::InvalidAnchor {
                lat_deg: self.lat_deg,
                lon_deg: self.lon_deg,
            })
        }
    }
}

/// Reference rectangle for the footprint convention.
///
/// `rotation_deg` turns the footprint clockwise (compass bearing) about its
/// centre.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct FootprintFrame {
    pub width_m: f64,
    pub depth_m: f64,
    pub rotation_deg: f64,
}

impl FootprintFrame {
    pub fn new(width_m: f64, depth_m: f64, rotation_deg: f64) -> Self {
        Self {
            width_m,
            depth_m,
            rotation_deg,
        }
    }

    /// Footprint meters (SW-corner origin) to anchor-centred meters.
    pub fn to_centered(&self, p: Vec2) -> Vec2 {
        let local = Vec2::new(p.x - self.width_m * 0.5, p.y - self.depth_m * 0.5);
        local.rotate(-self.rotation_deg.to_radians())
    }

    /// Anchor-centred meters to footprint meters (SW-corner origin).
    pub fn from_centered(&self, p: Vec2) -> Vec2 {
        let local = p.rotate(self.rotation_deg.to_radians());
        Vec2::new(local.x + self.width_m * 0.5, local.y + self.depth_m * 0.5)
    }
}

/// Flat-earth frame anchored at an [`Anchor`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LocalFrame {
    anchor: Anchor,
    m_per_deg_lon: f64,
}

impl LocalFrame {
    pub fn new(anchor: Anchor) -> Result<Self, GeoError> {
        let anchor = anchor.validate()?;
        // Clamp so a polar anchor never divides by zero.
        let m_per_deg_lon = meters_per_deg_lon(anchor.lat_deg).max(1e-6);
        Ok(Self {
            anchor,
            m_per_deg_lon,
        })
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn meters_per_deg_lon(&self) -> f64 {
        self.m_per_deg_lon
    }

    /// Anchor-centred meters to geographic degrees.
    pub fn centered_to_geo(&self, p: Vec2) -> LonLat {
        LonLat::new(
            self.anchor.lon_deg + p.x / self.m_per_deg_lon,
            self.anchor.lat_deg + p.y / METERS_PER_DEG_LAT,
        )
    }

    /// Geographic degrees to anchor-centred meters.
    pub fn geo_to_centered(&self, p: LonLat) -> Vec2 {
        Vec2::new(
            (p.lon_deg - self.anchor.lon_deg) * self.m_per_deg_lon,
            (p.lat_deg - self.anchor.lat_deg) * METERS_PER_DEG_LAT,
        )
    }

    /// Footprint meters (SW-corner origin) to geographic degrees.
    pub fn footprint_to_geo(&self, footprint: &FootprintFrame, p: Vec2) -> LonLat {
        self.centered_to_geo(footprint.to_centered(p))
    }

    /// Geographic degrees to footprint meters (SW-corner origin).
    pub fn geo_to_footprint(&self, footprint: &FootprintFrame, p: LonLat) -> Vec2 {
        footprint.from_centered(self.geo_to_centered(p))
    }
}
