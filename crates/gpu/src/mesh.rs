//! Solids -> renderer mesh descriptions.

use earcutr::earcut;
use foundation::math::{Mat4, Vec2, Vec3};
use scene::palette::Color;
use scene::solid::{Solid, SolidShape, VEHICLE_SIZE_M};

/// Geometry in local meters, before the object transform.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshGeometry {
    Box { size: Vec3 },
    Cylinder { radius: f64, height: f64 },
    /// Flat triangle list, three vertices per triangle.
    Triangles { positions: Vec<Vec3> },
    Line { points: Vec<Vec3> },
}

impl MeshGeometry {
    /// Procedural vehicle body.
    pub fn vehicle_placeholder() -> Self {
        MeshGeometry::Box {
            size: Vec3::new(VEHICLE_SIZE_M[0], VEHICLE_SIZE_M[1], VEHICLE_SIZE_M[2]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshDesc {
    pub label: &'static str,
    pub geometry: MeshGeometry,
    pub color: Color,
    pub opacity: f32,
    /// Local meters -> scene meters.
    pub transform: Mat4,
}

impl MeshDesc {
    /// `None` when the solid has nothing drawable (short polyline, plate
    /// that does not triangulate).
    pub fn from_solid(solid: &Solid) -> Option<Self> {
        let geometry = match &solid.shape {
            SolidShape::Box { size } => MeshGeometry::Box { size: *size },
            SolidShape::Cylinder { radius, height } => MeshGeometry::Cylinder {
                radius: *radius,
                height: *height,
            },
            SolidShape::Plate { ring } => {
                let positions = triangulate_ring(ring);
                if positions.is_empty() {
                    return None;
                }
                MeshGeometry::Triangles { positions }
            }
            SolidShape::Polyline { points } if points.len() >= 2 => MeshGeometry::Line {
                points: points.clone(),
            },
            SolidShape::Polyline { .. } => return None,
        };
        Some(Self {
            label: solid.kind.as_str(),
            geometry,
            color: solid.color,
            opacity: solid.opacity,
            transform: placement(solid.center, solid.yaw_rad),
        })
    }
}

/// Translate to `center`, then yaw about +z.
pub fn placement(center: Vec3, yaw_rad: f64) -> Mat4 {
    Mat4::translation(center).mul(&Mat4::rotation_z(yaw_rad))
}

/// Triangulate a simple polygon ring in the xy plane (z = 0).
pub fn triangulate_ring(ring: &[Vec2]) -> Vec<Vec3> {
    let mut pts: Vec<Vec2> = ring.to_vec();
    if pts.len() >= 2 {
        let first = pts[0];
        if pts.last().is_some_and(|last| (*last - first).length() < 1e-9) {
            pts.pop();
        }
    }
    if pts.len() < 3 {
        return Vec::new();
    }

    let coords: Vec<f64> = pts.iter().flat_map(|p| [p.x, p.y]).collect();
    let indices = match earcut(&coords, &[], 2) {
        Ok(ix) => ix,
        Err(_) => return Vec::new(),
    };
    indices
        .into_iter()
        .filter_map(|i| pts.get(i).map(|p| p.extend(0.0)))
        .collect()
}
