//! Design -> Feature list.
//!
//! A pure function of the design: the same design always yields the same
//! features, in insertion order (halo, building, bays, conveyors, docks,
//! paths, anchor). Malformed elements were already dropped during
//! normalization; the builder reports them and renders everything else.

use foundation::math::{FootprintFrame, LocalFrame, LonLat, Vec2};
use formats::{Design, Footprint, Side};
use tracing::{debug, warn};

use crate::error::SceneError;
use crate::feature::{Feature, FeatureKind, Geometry};
use crate::palette;

/// Default halo scale about the footprint centroid.
pub const DEFAULT_HALO_SCALE: f64 = 1.35;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BuildOptions {
    pub halo_scale: f64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            halo_scale: DEFAULT_HALO_SCALE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneBuild {
    pub features: Vec<Feature>,
    /// Non-fatal problems; the features above are still complete otherwise.
    pub issues: Vec<SceneError>,
}

impl SceneBuild {
    pub fn of_kind(&self, kind: FeatureKind) -> impl Iterator<Item = &Feature> + '_ {
        self.features.iter().filter(move |f| f.kind == kind)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    options: BuildOptions,
}

impl SceneBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn build(&self, design: &Design) -> SceneBuild {
        let frame = &design.frame;
        let mut out = SceneBuild {
            features: Vec::new(),
            issues: design.issues.iter().map(SceneError::from).collect(),
        };
        for issue in &out.issues {
            warn!("skipping design element: {issue}");
        }

        // Without a footprint, footprint-convention data is placed with the
        // south-west corner on the anchor.
        let fp_frame = footprint_frame(design.footprint.as_ref());

        if let Some(fp) = &design.footprint {
            let ring = footprint_ring(fp);
            let halo = scale_ring(&ring, self.options.halo_scale);
            out.features.push(
                Feature::new(
                    FeatureKind::Halo,
                    Geometry::Polygon {
                        ring: to_geo(frame, &fp_frame, &halo),
                    },
                )
                .with("color", palette::HALO.to_hex_string()),
            );
            out.features.push(
                Feature::new(
                    FeatureKind::Building,
                    Geometry::Volume {
                        ring: to_geo(frame, &fp_frame, &ring),
                        base_m: 0.0,
                        height_m: fp.height_m,
                    },
                )
                .with("color", palette::BUILDING.to_hex_string())
                .with("width", fp.width_m)
                .with("depth", fp.depth_m),
            );
        }

        for (index, bay) in design.bays.iter().enumerate() {
            let ring = rect_ring(bay.x_m, bay.y_m, bay.width_m, bay.height_m);
            out.features.push(
                Feature::new(
                    FeatureKind::Bay,
                    Geometry::Polygon {
                        ring: to_geo(frame, &fp_frame, &ring),
                    },
                )
                .with("bayType", bay.bay_type.as_str())
                .with("index", index)
                .with("color", palette::BAY.to_hex_string()),
            );
        }

        for (index, conveyor) in design.conveyors.iter().enumerate() {
            out.features.push(
                Feature::new(
                    FeatureKind::Conveyor,
                    Geometry::Line {
                        vertices: to_geo(frame, &fp_frame, &conveyor.points),
                    },
                )
                .with("conveyorType", conveyor.conveyor_type.as_str())
                .with("index", index)
                .with("color", palette::conveyor(conveyor.conveyor_type).to_hex_string()),
            );
        }

        match &design.footprint {
            Some(fp) => {
                for placed in place_docks(design, fp) {
                    out.features.push(
                        Feature::new(
                            FeatureKind::Dock,
                            Geometry::Point {
                                position: frame.footprint_to_geo(&fp_frame, placed.position),
                            },
                        )
                        .with("side", placed.side.as_str())
                        .with("dockKind", placed.kind.as_str())
                        .with("slot", placed.slot)
                        .with("color", palette::dock(placed.kind).to_hex_string()),
                    );
                }
            }
            None if !design.docks.is_empty() => {
                debug!("{} docks skipped: no footprint to place them on", design.docks.len());
            }
            None => {}
        }

        for path in &design.paths {
            let vertices: Vec<LonLat> = path
                .points
                .iter()
                .map(|p| frame.centered_to_geo(*p))
                .collect();
            out.features.push(
                Feature::new(FeatureKind::Path, Geometry::Line { vertices })
                    .with("pathId", path.id.as_str())
                    .with("flow", path.kind.as_str())
                    .with("color", palette::path(path.kind).to_hex_string()),
            );
        }

        out.features.push(
            Feature::new(
                FeatureKind::Anchor,
                Geometry::Point {
                    position: frame.anchor().lon_lat(),
                },
            )
            .with("color", palette::ANCHOR.to_hex_string()),
        );

        debug!(
            "built {} features ({} issues) for design {}",
            out.features.len(),
            out.issues.len(),
            design.content_hash
        );
        out
    }
}

pub fn footprint_frame(footprint: Option<&Footprint>) -> FootprintFrame {
    match footprint {
        Some(fp) => FootprintFrame::new(fp.width_m, fp.depth_m, fp.rotation_deg),
        None => FootprintFrame::default(),
    }
}

/// Closed footprint ring in footprint meters.
pub fn footprint_ring(fp: &Footprint) -> Vec<Vec2> {
    rect_ring(0.0, 0.0, fp.width_m, fp.depth_m)
}

/// Closed counter-clockwise ring of an axis-aligned rectangle.
pub fn rect_ring(x: f64, y: f64, w: f64, h: f64) -> Vec<Vec2> {
    vec![
        Vec2::new(x, y),
        Vec2::new(x + w, y),
        Vec2::new(x + w, y + h),
        Vec2::new(x, y + h),
        Vec2::new(x, y),
    ]
}

/// Scale a closed ring about the centroid of its distinct vertices.
pub fn scale_ring(ring: &[Vec2], factor: f64) -> Vec<Vec2> {
    let distinct = match ring {
        [rest @ .., last] if ring.len() > 1 && Some(last) == ring.first() => rest,
        _ => ring,
    };
    if distinct.is_empty() {
        return Vec::new();
    }
    let n = distinct.len() as f64;
    let sum = distinct.iter().fold(Vec2::ZERO, |acc, p| acc + *p);
    let c = sum.scale(1.0 / n);
    ring.iter().map(|p| c + (*p - c).scale(factor)).collect()
}

fn to_geo(frame: &LocalFrame, fp: &FootprintFrame, points: &[Vec2]) -> Vec<LonLat> {
    points.iter().map(|p| frame.footprint_to_geo(fp, *p)).collect()
}

/// A dock position on the footprint perimeter, in footprint meters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlacedDock {
    pub side: Side,
    pub kind: formats::FlowKind,
    /// 0-based position among the docks on the same side.
    pub slot: usize,
    pub position: Vec2,
}

/// Spread each side's docks evenly: `spacing = side_length / (count + 1)`.
pub fn place_docks(design: &Design, fp: &Footprint) -> Vec<PlacedDock> {
    let mut out = Vec::with_capacity(design.docks.len());
    for side in Side::ALL {
        let docks: Vec<_> = design.docks_on(side).collect();
        let count = docks.len();
        for (slot, dock) in docks.into_iter().enumerate() {
            out.push(PlacedDock {
                side,
                kind: dock.kind,
                slot,
                position: dock_offset(fp, side, slot, count),
            });
        }
    }
    out
}

fn dock_offset(fp: &Footprint, side: Side, slot: usize, count: usize) -> Vec2 {
    let along = |length: f64| (slot + 1) as f64 * length / (count + 1) as f64;
    match side {
        Side::North => Vec2::new(along(fp.width_m), fp.depth_m),
        Side::South => Vec2::new(along(fp.width_m), 0.0),
        Side::East => Vec2::new(fp.width_m, along(fp.depth_m)),
        Side::West => Vec2::new(0.0, along(fp.depth_m)),
    }
}
