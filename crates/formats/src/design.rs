//! Facility design documents.
//!
//! The JSON schema is loose (every field optional, unknown fields ignored,
//! elements of any shape). [`Design::from_json_str`] runs the one validation
//! pass: it returns a strongly-typed design plus a list of
//! [`DesignIssue`]s for every element it had to skip. Only an unusable anchor
//! fails the whole document.

use std::fmt;

use std::collections::BTreeSet;

use foundation::math::{Anchor, FootprintFrame, GeoError, LocalFrame, LonLat, Vec2};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug)]
pub enum DesignError {
    Parse(serde_json::Error),
    InvalidAnchor { lat_deg: f64, lon_deg: f64 },
}

impl fmt::Display for DesignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesignError::Parse(err) => write!(f, "design parse error: {err}"),
            DesignError::InvalidAnchor { lat_deg, lon_deg } => {
                write!(f, "invalid anchor: lat={lat_deg} lon={lon_deg}")
            }
        }
    }
}

impl std::error::Error for DesignError {}

impl From<GeoError> for DesignError {
    fn from(err: GeoError) -> Self {
        match err {
            GeoError::InvalidAnchor { lat_deg, lon_deg } => {
                DesignError::InvalidAnchor { lat_deg, lon_deg }
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Footprint,
    Bay,
    Conveyor,
    Dock,
    Path,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Footprint => "footprint",
            ElementKind::Bay => "bay",
            ElementKind::Conveyor => "conveyor",
            ElementKind::Dock => "dock",
            ElementKind::Path => "path",
        }
    }
}

/// An element that was skipped during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignIssue {
    pub element: ElementKind,
    pub index: Option<usize>,
    pub reason: String,
}

impl DesignIssue {
    fn new(element: ElementKind, index: Option<usize>, reason: impl Into<String>) -> Self {
        Self {
            element,
            index,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Footprint {
    pub width_m: f64,
    pub depth_m: f64,
    pub height_m: f64,
    /// Compass rotation, degrees clockwise.
    pub rotation_deg: f64,
}

/// Axis-aligned bay rectangle in footprint meters.
#[derive(Debug, Clone, PartialEq)]
pub struct Bay {
    pub x_m: f64,
    pub y_m: f64,
    pub width_m: f64,
    pub height_m: f64,
    pub bay_type: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ConveyorType {
    Mechanical,
    Manual,
}

impl ConveyorType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConveyorType::Mechanical => "mechanical",
            ConveyorType::Manual => "manual",
        }
    }
}

/// Conveyor polyline in footprint meters.
#[derive(Debug, Clone, PartialEq)]
pub struct Conveyor {
    pub points: Vec<Vec2>,
    pub conveyor_type: ConveyorType,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    North,
    South,
    East,
    West,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::North, Side::South, Side::East, Side::West];

    pub fn as_str(self) -> &'static str {
        match self {
            Side::North => "north",
            Side::South => "south",
            Side::East => "east",
            Side::West => "west",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" => Some(Side::North),
            "south" => Some(Side::South),
            "east" => Some(Side::East),
            "west" => Some(Side::West),
            _ => None,
        }
    }
}

/// Direction of travel for docks, paths and the vehicles on them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlowKind {
    Inbound,
    Outbound,
}

impl FlowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowKind::Inbound => "inbound",
            FlowKind::Outbound => "outbound",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inbound" => Some(FlowKind::Inbound),
            "outbound" => Some(FlowKind::Outbound),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Dock {
    pub side: Side,
    pub kind: FlowKind,
}

/// A vehicle route in anchor-centred meters.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSpec {
    pub id: String,
    pub kind: FlowKind,
    pub points: Vec<Vec2>,
    pub speed_mps: Option<f64>,
}

/// Coordinate space of path or conveyor points in the source document.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PointUnits {
    /// Local meters: anchor-centred for paths, footprint for conveyors.
    #[default]
    Local,
    /// `[lon, lat]` degrees.
    LonLat,
}

/// Normalized design. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Design {
    /// Local frame at the validated anchor.
    pub frame: LocalFrame,
    /// `None` when the document's footprint was missing or unusable.
    pub footprint: Option<Footprint>,
    pub bays: Vec<Bay>,
    pub conveyors: Vec<Conveyor>,
    pub docks: Vec<Dock>,
    pub paths: Vec<PathSpec>,
    pub issues: Vec<DesignIssue>,
    /// blake3 of the source document.
    pub content_hash: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDesign {
    #[serde(default)]
    anchor: Value,
    #[serde(default)]
    footprint: Value,
    #[serde(default)]
    bays: Value,
    #[serde(default)]
    conveyors: Value,
    #[serde(default)]
    docks: Value,
    #[serde(default)]
    truck_paths: Value,
    #[serde(default)]
    paths: Value,
    #[serde(default)]
    path_units: Value,
    #[serde(default)]
    conveyor_units: Value,
}

impl Design {
    pub fn from_json_str(payload: &str) -> Result<Self, DesignError> {
        let raw: RawDesign = serde_json::from_str(payload).map_err(DesignError::Parse)?;
        let hash = blake3::hash(payload.as_bytes()).to_hex().to_string();
        normalize(raw, hash)
    }

    pub fn anchor(&self) -> Anchor {
        self.frame.anchor()
    }

    pub fn docks_on(&self, side: Side) -> impl Iterator<Item = &Dock> + '_ {
        self.docks.iter().filter(move |d| d.side == side)
    }
}

fn normalize(raw: RawDesign, content_hash: String) -> Result<Design, DesignError> {
    let anchor = parse_anchor(&raw.anchor)?;
    let frame = LocalFrame::new(anchor)?;
    let mut issues = Vec::new();

    let footprint = match parse_footprint(&raw.footprint) {
        Ok(fp) => Some(fp),
        Err(reason) => {
            issues.push(DesignIssue::new(ElementKind::Footprint, None, reason));
            None
        }
    };

    let bays = collect(&raw.bays, ElementKind::Bay, &mut issues, parse_bay);
    let conveyor_units = parse_units(&raw.conveyor_units, ElementKind::Conveyor, &mut issues);
    let fp_frame = footprint
        .map(|fp| FootprintFrame::new(fp.width_m, fp.depth_m, fp.rotation_deg))
        .unwrap_or_default();
    let conveyors = collect(&raw.conveyors, ElementKind::Conveyor, &mut issues, |v| {
        parse_conveyor(v, conveyor_units, &frame, &fp_frame)
    });
    let docks = collect(&raw.docks, ElementKind::Dock, &mut issues, parse_dock);

    let units = parse_units(&raw.path_units, ElementKind::Path, &mut issues);
    let mut paths = Vec::new();
    parse_truck_paths(&raw.truck_paths, units, &frame, &mut paths, &mut issues);
    if let Some(items) = raw.paths.as_array() {
        for (index, item) in items.iter().enumerate() {
            match parse_path(item, index, units, &frame) {
                Ok(Some(path)) => paths.push(path),
                Ok(None) => {}
                Err(reason) => {
                    issues.push(DesignIssue::new(ElementKind::Path, Some(index), reason))
                }
            }
        }
    } else if !raw.paths.is_null() {
        issues.push(DesignIssue::new(ElementKind::Path, None, "paths must be an array"));
    }
    let paths = dedup_paths(paths, &mut issues);

    Ok(Design {
        frame,
        footprint,
        bays,
        conveyors,
        docks,
        paths,
        issues,
        content_hash,
    })
}

fn collect<T>(
    list: &Value,
    element: ElementKind,
    issues: &mut Vec<DesignIssue>,
    parse: impl Fn(&Value) -> Result<T, String>,
) -> Vec<T> {
    let Some(items) = list.as_array() else {
        if !list.is_null() {
            issues.push(DesignIssue::new(
                element,
                None,
                format!("{}s must be an array", element.as_str()),
            ));
        }
        return Vec::new();
    };

    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match parse(item) {
            Ok(v) => out.push(v),
            Err(reason) => issues.push(DesignIssue::new(element, Some(index), reason)),
        }
    }
    out
}

/// Reads a `pathUnits`/`conveyorUnits` switch. Anything but a string is
/// reported and treated as local meters.
fn parse_units(v: &Value, element: ElementKind, issues: &mut Vec<DesignIssue>) -> PointUnits {
    match v {
        Value::Null => PointUnits::Local,
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "lonlat" | "geographic" => PointUnits::LonLat,
            _ => PointUnits::Local,
        },
        other => {
            issues.push(DesignIssue::new(
                element,
                None,
                format!("{}Units {other} is not a string", element.as_str()),
            ));
            PointUnits::Local
        }
    }
}

fn number(v: &Value) -> Option<f64> {
    v.as_f64().filter(|n| n.is_finite())
}

fn optional_number(obj: &serde_json::Map<String, Value>, key: &str) -> Result<f64, String> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(0.0),
        Some(v) => number(v).ok_or_else(|| format!("{key} is not a finite number")),
    }
}

fn parse_anchor(v: &Value) -> Result<Anchor, DesignError> {
    let lat = v.get("lat").and_then(Value::as_f64).unwrap_or(f64::NAN);
    let lon = v.get("lon").and_then(Value::as_f64).unwrap_or(f64::NAN);
    Ok(Anchor::new(lat, lon).validate()?)
}

fn parse_footprint(v: &Value) -> Result<Footprint, String> {
    let obj = v.as_object().ok_or("footprint missing")?;
    let width_m = obj.get("width").and_then(number).ok_or("width missing")?;
    let depth_m = obj.get("depth").and_then(number).ok_or("depth missing")?;
    if width_m <= 0.0 || depth_m <= 0.0 {
        return Err(format!("non-positive size {width_m}x{depth_m}"));
    }
    let height_m = optional_number(obj, "height")?.max(0.0);
    let rotation_deg = optional_number(obj, "rotation")?;
    Ok(Footprint {
        width_m,
        depth_m,
        height_m,
        rotation_deg,
    })
}

fn parse_bay(v: &Value) -> Result<Bay, String> {
    let rect = v
        .get("rect")
        .and_then(Value::as_array)
        .ok_or("rect missing")?;
    if rect.len() != 4 {
        return Err(format!("rect has {} values, expected 4", rect.len()));
    }
    let mut r = [0.0; 4];
    for (slot, value) in r.iter_mut().zip(rect) {
        *slot = number(value).ok_or_else(|| format!("rect value {value} is not a number"))?;
    }
    let [x_m, y_m, width_m, height_m] = r;
    if width_m <= 0.0 || height_m <= 0.0 {
        return Err(format!("non-positive size {width_m}x{height_m}"));
    }
    let bay_type = v
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("bay")
        .to_string();
    Ok(Bay {
        x_m,
        y_m,
        width_m,
        height_m,
        bay_type,
    })
}

fn parse_points(v: Option<&Value>) -> Result<Vec<Vec2>, String> {
    let items = v.and_then(Value::as_array).ok_or("points missing")?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let pair = item.as_array().filter(|p| p.len() >= 2);
        let point = pair.and_then(|p| Some(Vec2::new(number(&p[0])?, number(&p[1])?)));
        out.push(point.ok_or_else(|| format!("point {item} is not an [x, y] pair"))?);
    }
    Ok(out)
}

fn parse_conveyor(
    v: &Value,
    units: PointUnits,
    frame: &LocalFrame,
    fp_frame: &FootprintFrame,
) -> Result<Conveyor, String> {
    let points = parse_points(v.get("points"))?;
    if points.len() < 2 {
        return Err(format!("{} points, need at least 2", points.len()));
    }
    let points = match units {
        PointUnits::Local => points,
        PointUnits::LonLat => points
            .into_iter()
            .map(|p| frame.geo_to_footprint(fp_frame, LonLat::new(p.x, p.y)))
            .collect(),
    };
    let conveyor_type = match v.get("type").and_then(Value::as_str) {
        Some(t) if t.eq_ignore_ascii_case("mechanical") => ConveyorType::Mechanical,
        _ => ConveyorType::Manual,
    };
    Ok(Conveyor {
        points,
        conveyor_type,
    })
}

fn parse_dock(v: &Value) -> Result<Dock, String> {
    let side_raw = v.get("side").and_then(Value::as_str).ok_or("side missing")?;
    let side = Side::parse(side_raw).ok_or_else(|| format!("unknown side {side_raw:?}"))?;
    let kind = v
        .get("type")
        .or_else(|| v.get("kind"))
        .and_then(Value::as_str)
        .and_then(FlowKind::parse)
        .unwrap_or(FlowKind::Outbound);
    Ok(Dock { side, kind })
}

fn to_local(points: Vec<Vec2>, units: PointUnits, frame: &LocalFrame) -> Vec<Vec2> {
    match units {
        PointUnits::Local => points,
        PointUnits::LonLat => points
            .into_iter()
            .map(|p| frame.geo_to_centered(LonLat::new(p.x, p.y)))
            .collect(),
    }
}

fn parse_truck_paths(
    v: &Value,
    units: PointUnits,
    frame: &LocalFrame,
    paths: &mut Vec<PathSpec>,
    issues: &mut Vec<DesignIssue>,
) {
    for kind in [FlowKind::Inbound, FlowKind::Outbound] {
        let Some(raw) = v.get(kind.as_str()) else {
            continue;
        };
        match parse_points(Some(raw)) {
            // Short paths are dropped, not reported.
            Ok(points) if points.len() < 2 => {}
            Ok(points) => paths.push(PathSpec {
                id: format!("truck-{}", kind.as_str()),
                kind,
                points: to_local(points, units, frame),
                speed_mps: None,
            }),
            Err(reason) => issues.push(DesignIssue::new(
                ElementKind::Path,
                None,
                format!("truckPaths.{}: {reason}", kind.as_str()),
            )),
        }
    }
}

fn parse_path(
    v: &Value,
    index: usize,
    units: PointUnits,
    frame: &LocalFrame,
) -> Result<Option<PathSpec>, String> {
    let points = parse_points(v.get("points"))?;
    if points.len() < 2 {
        return Ok(None);
    }
    let id = match v.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("path-{index}"),
    };
    let kind = v
        .get("kind")
        .or_else(|| v.get("type"))
        .and_then(Value::as_str)
        .and_then(FlowKind::parse)
        .unwrap_or(FlowKind::Inbound);
    let speed_mps = v.get("speed").and_then(number).filter(|s| *s > 0.0);
    Ok(Some(PathSpec {
        id,
        kind,
        points: to_local(points, units, frame),
        speed_mps,
    }))
}

/// Keeps the first path for each id. Later paths with the same id are
/// reported and dropped, so every id names exactly one route.
fn dedup_paths(paths: Vec<PathSpec>, issues: &mut Vec<DesignIssue>) -> Vec<PathSpec> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        if seen.contains(&path.id) {
            issues.push(DesignIssue::new(
                ElementKind::Path,
                None,
                format!("duplicate path id {:?}", path.id),
            ));
            continue;
        }
        seen.insert(path.id.clone());
        out.push(path);
    }
    out
}
