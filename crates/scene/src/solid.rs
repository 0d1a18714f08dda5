//! 3D primitives for the embedded renderer.
//!
//! Authored in anchor-centred meters (`+x` east, `+y` north, `+z` up) so a
//! single model transform places the whole facility in plane units.

use foundation::math::{Vec2, Vec3};
use formats::Design;

use crate::builder::{footprint_frame, footprint_ring, place_docks};
use crate::feature::FeatureKind;
use crate::palette::{self, Color};

pub const HALO_THICKNESS_M: f64 = 0.1;
pub const FLOOR_LIFT_M: f64 = 0.02;
pub const BAY_THICKNESS_M: f64 = 0.4;
pub const BAY_LIFT_M: f64 = 0.25;
pub const DOCK_RADIUS_M: f64 = 2.2;
pub const DOCK_HEIGHT_M: f64 = 3.0;
pub const DOCK_LIFT_M: f64 = 1.6;
/// Vehicle body length, width, height.
pub const VEHICLE_SIZE_M: [f64; 3] = [1.8, 0.9, 0.9];

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SolidOptions {
    pub halo_scale: f64,
    pub conveyor_altitude_m: f64,
    pub path_altitude_m: f64,
}

impl Default for SolidOptions {
    fn default() -> Self {
        Self {
            halo_scale: crate::builder::DEFAULT_HALO_SCALE,
            conveyor_altitude_m: 1.2,
            path_altitude_m: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolidShape {
    /// Axis-aligned box of `size`, before yaw.
    Box { size: Vec3 },
    /// Upright cylinder.
    Cylinder { radius: f64, height: f64 },
    /// Flat polygon at `center.z`; ring relative to `center`.
    Plate { ring: Vec<Vec2> },
    /// Polyline; points relative to `center`.
    Polyline { points: Vec<Vec3> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solid {
    pub kind: FeatureKind,
    pub shape: SolidShape,
    pub center: Vec3,
    /// Counter-clockwise about +z.
    pub yaw_rad: f64,
    pub color: Color,
    pub opacity: f32,
}

/// Static solids of a design. Vehicles are not included; they move.
pub fn derive_solids(design: &Design, options: &SolidOptions) -> Vec<Solid> {
    let mut out = Vec::new();
    let fp_frame = footprint_frame(design.footprint.as_ref());
    let yaw_rad = -fp_frame.rotation_deg.to_radians();
    let centred = |p: Vec2| fp_frame.to_centered(p);

    if let Some(fp) = &design.footprint {
        let halo_w = fp.width_m * options.halo_scale;
        let halo_d = fp.depth_m * options.halo_scale;
        out.push(Solid {
            kind: FeatureKind::Halo,
            shape: SolidShape::Box {
                size: Vec3::new(halo_w, halo_d, HALO_THICKNESS_M),
            },
            center: Vec3::new(0.0, 0.0, HALO_THICKNESS_M * 0.5),
            yaw_rad,
            color: palette::HALO,
            opacity: 0.35,
        });

        if fp.height_m > 0.0 {
            out.push(Solid {
                kind: FeatureKind::Building,
                shape: SolidShape::Box {
                    size: Vec3::new(fp.width_m, fp.depth_m, fp.height_m),
                },
                center: Vec3::new(0.0, 0.0, fp.height_m * 0.5),
                yaw_rad,
                color: palette::BUILDING,
                opacity: 1.0,
            });
        }

        let ring: Vec<Vec2> = footprint_ring(fp).into_iter().map(centred).collect();
        out.push(Solid {
            kind: FeatureKind::Building,
            shape: SolidShape::Plate { ring },
            center: Vec3::new(0.0, 0.0, FLOOR_LIFT_M),
            yaw_rad: 0.0,
            color: palette::FLOOR,
            opacity: 0.35,
        });

        for dock in place_docks(design, fp) {
            out.push(Solid {
                kind: FeatureKind::Dock,
                shape: SolidShape::Cylinder {
                    radius: DOCK_RADIUS_M,
                    height: DOCK_HEIGHT_M,
                },
                center: centred(dock.position).extend(DOCK_LIFT_M),
                yaw_rad: 0.0,
                color: palette::dock(dock.kind),
                opacity: 1.0,
            });
        }
    }

    for bay in &design.bays {
        let mid = Vec2::new(bay.x_m + bay.width_m * 0.5, bay.y_m + bay.height_m * 0.5);
        out.push(Solid {
            kind: FeatureKind::Bay,
            shape: SolidShape::Box {
                size: Vec3::new(bay.width_m, bay.height_m, BAY_THICKNESS_M),
            },
            center: centred(mid).extend(BAY_LIFT_M),
            yaw_rad,
            color: palette::BAY,
            opacity: 0.35,
        });
    }

    for conveyor in &design.conveyors {
        let points = conveyor.points.iter().map(|p| centred(*p)).collect::<Vec<_>>();
        out.push(polyline(
            FeatureKind::Conveyor,
            &points,
            options.conveyor_altitude_m,
            palette::conveyor(conveyor.conveyor_type),
        ));
    }

    for path in &design.paths {
        out.push(polyline(
            FeatureKind::Path,
            &path.points,
            options.path_altitude_m,
            palette::path(path.kind),
        ));
    }

    out
}

fn polyline(kind: FeatureKind, points: &[Vec2], altitude_m: f64, color: Color) -> Solid {
    Solid {
        kind,
        shape: SolidShape::Polyline {
            points: points.iter().map(|p| p.extend(0.0)).collect(),
        },
        center: Vec3::new(0.0, 0.0, altitude_m),
        yaw_rad: 0.0,
        color,
        opacity: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::{SolidOptions, SolidShape, derive_solids};
    use crate::feature::FeatureKind;
    use foundation::math::Vec3;
    use formats::Design;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn design() -> Design {
        Design::from_json_str(
            r#"{
            "anchor": { "lat": 22.94, "lon": 72.62 },
            "footprint": { "width": 120, "depth": 80, "height": 12 },
            "bays": [ { "rect": [0, 0, 20, 10] } ],
            "conveyors": [ { "points": [[0, 40], [120, 40]], "type": "mechanical" } ],
            "docks": [ { "side": "south", "type": "inbound" } ],
            "truckPaths": { "inbound": [[-50, -60], [0, -45]] }
        }"#,
        )
        .expect("design")
    }

    #[test]
    fn building_box_stands_on_the_ground() {
        let solids = derive_solids(&design(), &SolidOptions::default());
        let building = solids
            .iter()
            .find(|s| s.kind == FeatureKind::Building && matches!(s.shape, SolidShape::Box { .. }))
            .expect("building box");
        assert_eq!(building.center, Vec3::new(0.0, 0.0, 6.0));
        assert_eq!(
            building.shape,
            SolidShape::Box {
                size: Vec3::new(120.0, 80.0, 12.0)
            }
        );
    }

    #[test]
    fn bay_is_centred_relative_to_footprint() {
        let solids = derive_solids(&design(), &SolidOptions::default());
        let bay = solids.iter().find(|s| s.kind == FeatureKind::Bay).unwrap();
        // Footprint (10, 5) lies 50 m west and 35 m south of the centre.
        assert_close(bay.center.x, -50.0, 1e-9);
        assert_close(bay.center.y, -35.0, 1e-9);
    }

    #[test]
    fn dock_posts_sit_on_the_perimeter() {
        let solids = derive_solids(&design(), &SolidOptions::default());
        let dock = solids.iter().find(|s| s.kind == FeatureKind::Dock).unwrap();
        assert_close(dock.center.x, 0.0, 1e-9);
        assert_close(dock.center.y, -40.0, 1e-9);
        assert!(matches!(dock.shape, SolidShape::Cylinder { .. }));
    }

    #[test]
    fn paths_are_not_offset_by_the_footprint() {
        let solids = derive_solids(&design(), &SolidOptions::default());
        let path = solids.iter().find(|s| s.kind == FeatureKind::Path).unwrap();
        let SolidShape::Polyline { points } = &path.shape else {
            panic!("path should be a polyline");
        };
        assert_eq!(points[1], Vec3::new(0.0, -45.0, 0.0));
        assert_eq!(path.center.z, 0.8);
    }
}
